/*
 *  codec.rs
 *
 *  lot_gpiod - LOT platform channel bridge
 *  (c) 2020-26 Stuart Hunter
 *
 *  Standard method codec - binary wire encoding for calls and response
 *  envelopes
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

//! Wire format shared by convention with the host runtime:
//!
//! - every value starts with a one-byte type tag;
//! - sizes are expandable: `<254` in one byte, then `0xfe` + u16 LE,
//!   then `0xff` + u32 LE;
//! - multi-byte scalars are little-endian; `f64` payloads (and the
//!   64-bit typed buffers) are padded to 8-byte alignment from the
//!   start of the message, `i32` buffers to 4;
//! - a method call is `value(method-name) ++ value(arguments)`;
//! - a response envelope is `0x00 ++ value(result)` for success,
//!   `0x01 ++ value(code) ++ value(message) ++ value(details)` for an
//!   application error, and the empty message for not-implemented.

use std::collections::BTreeMap;

use crate::channel::{MethodCall, MethodResponse};
use crate::error::CodecError;
use crate::value::Value;

const TAG_NULL: u8 = 0;
const TAG_TRUE: u8 = 1;
const TAG_FALSE: u8 = 2;
const TAG_INT32: u8 = 3;
const TAG_INT64: u8 = 4;
const TAG_FLOAT64: u8 = 6;
const TAG_STRING: u8 = 7;
const TAG_UINT8_LIST: u8 = 8;
const TAG_INT32_LIST: u8 = 9;
const TAG_INT64_LIST: u8 = 10;
const TAG_FLOAT64_LIST: u8 = 11;
const TAG_LIST: u8 = 12;
const TAG_MAP: u8 = 13;

const ENVELOPE_SUCCESS: u8 = 0;
const ENVELOPE_ERROR: u8 = 1;

/// Encoder/decoder for the standard method codec.
pub struct StandardMethodCodec;

impl StandardMethodCodec {
    /// Encodes a method call as `value(name) ++ value(arguments)`.
    pub fn encode_call(call: &MethodCall) -> Vec<u8> {
        let mut buf = Vec::with_capacity(call.method.len() + 16);
        write_string(&mut buf, &call.method);
        write_value(&mut buf, &call.arguments);
        buf
    }

    pub fn decode_call(bytes: &[u8]) -> Result<MethodCall, CodecError> {
        let mut r = Reader::new(bytes);
        let method = match r.read_value()? {
            Value::String(s) => s,
            _ => return Err(CodecError::BadMethodName),
        };
        let arguments = r.read_value()?;
        r.finish()?;
        Ok(MethodCall { method, arguments })
    }

    /// Encodes a response envelope. Not-implemented is the empty
    /// message, matching the host convention of a null reply.
    pub fn encode_response(response: &MethodResponse) -> Vec<u8> {
        match response {
            MethodResponse::Success(value) => {
                let mut buf = vec![ENVELOPE_SUCCESS];
                write_value(&mut buf, value);
                buf
            }
            MethodResponse::Error { code, message, details } => {
                let mut buf = vec![ENVELOPE_ERROR];
                write_string(&mut buf, code);
                write_string(&mut buf, message);
                write_value(&mut buf, details);
                buf
            }
            MethodResponse::NotImplemented => Vec::new(),
        }
    }

    pub fn decode_response(bytes: &[u8]) -> Result<MethodResponse, CodecError> {
        if bytes.is_empty() {
            return Ok(MethodResponse::NotImplemented);
        }
        let mut r = Reader::new(bytes);
        let response = match r.read_u8()? {
            ENVELOPE_SUCCESS => MethodResponse::Success(r.read_value()?),
            ENVELOPE_ERROR => {
                let code = match r.read_value()? {
                    Value::String(s) => s,
                    _ => return Err(CodecError::BadErrorEnvelope),
                };
                let message = match r.read_value()? {
                    Value::String(s) => s,
                    // Hosts may send a null message.
                    Value::Null => String::new(),
                    _ => return Err(CodecError::BadErrorEnvelope),
                };
                let details = r.read_value()?;
                MethodResponse::Error { code, message, details }
            }
            tag => return Err(CodecError::InvalidEnvelope(tag)),
        };
        r.finish()?;
        Ok(response)
    }
}

fn write_size(buf: &mut Vec<u8>, n: usize) {
    if n < 254 {
        buf.push(n as u8);
    } else if n <= u16::MAX as usize {
        buf.push(254);
        buf.extend_from_slice(&(n as u16).to_le_bytes());
    } else {
        buf.push(255);
        buf.extend_from_slice(&(n as u32).to_le_bytes());
    }
}

fn pad_to(buf: &mut Vec<u8>, alignment: usize) {
    while buf.len() % alignment != 0 {
        buf.push(0);
    }
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    buf.push(TAG_STRING);
    write_size(buf, s.len());
    buf.extend_from_slice(s.as_bytes());
}

fn write_value(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => buf.push(TAG_NULL),
        Value::Bool(true) => buf.push(TAG_TRUE),
        Value::Bool(false) => buf.push(TAG_FALSE),
        Value::I32(n) => {
            buf.push(TAG_INT32);
            buf.extend_from_slice(&n.to_le_bytes());
        }
        Value::I64(n) => {
            buf.push(TAG_INT64);
            buf.extend_from_slice(&n.to_le_bytes());
        }
        Value::F64(x) => {
            buf.push(TAG_FLOAT64);
            pad_to(buf, 8);
            buf.extend_from_slice(&x.to_le_bytes());
        }
        Value::String(s) => write_string(buf, s),
        Value::Bytes(bytes) => {
            buf.push(TAG_UINT8_LIST);
            write_size(buf, bytes.len());
            buf.extend_from_slice(bytes);
        }
        Value::Int32List(ns) => {
            buf.push(TAG_INT32_LIST);
            write_size(buf, ns.len());
            pad_to(buf, 4);
            for n in ns {
                buf.extend_from_slice(&n.to_le_bytes());
            }
        }
        Value::Int64List(ns) => {
            buf.push(TAG_INT64_LIST);
            write_size(buf, ns.len());
            pad_to(buf, 8);
            for n in ns {
                buf.extend_from_slice(&n.to_le_bytes());
            }
        }
        Value::Float64List(xs) => {
            buf.push(TAG_FLOAT64_LIST);
            write_size(buf, xs.len());
            pad_to(buf, 8);
            for x in xs {
                buf.extend_from_slice(&x.to_le_bytes());
            }
        }
        Value::List(items) => {
            buf.push(TAG_LIST);
            write_size(buf, items.len());
            for item in items {
                write_value(buf, item);
            }
        }
        Value::Map(entries) => {
            buf.push(TAG_MAP);
            write_size(buf, entries.len());
            for (k, v) in entries {
                write_string(buf, k);
                write_value(buf, v);
            }
        }
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn read_u8(&mut self) -> Result<u8, CodecError> {
        let b = *self
            .buf
            .get(self.pos)
            .ok_or(CodecError::UnexpectedEof(self.pos))?;
        self.pos += 1;
        Ok(b)
    }

    fn read_exact(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        let end = self
            .pos
            .checked_add(n)
            .ok_or(CodecError::UnexpectedEof(self.pos))?;
        if end > self.buf.len() {
            return Err(CodecError::UnexpectedEof(self.pos));
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_size(&mut self) -> Result<usize, CodecError> {
        match self.read_u8()? {
            254 => {
                let bytes = self.read_exact(2)?;
                Ok(u16::from_le_bytes([bytes[0], bytes[1]]) as usize)
            }
            255 => {
                let bytes = self.read_exact(4)?;
                Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize)
            }
            n => Ok(n as usize),
        }
    }

    fn skip_padding(&mut self, alignment: usize) -> Result<(), CodecError> {
        while self.pos % alignment != 0 {
            self.read_u8()?;
        }
        Ok(())
    }

    fn read_value(&mut self) -> Result<Value, CodecError> {
        let tag_offset = self.pos;
        match self.read_u8()? {
            TAG_NULL => Ok(Value::Null),
            TAG_TRUE => Ok(Value::Bool(true)),
            TAG_FALSE => Ok(Value::Bool(false)),
            TAG_INT32 => {
                let b = self.read_exact(4)?;
                Ok(Value::I32(i32::from_le_bytes([b[0], b[1], b[2], b[3]])))
            }
            TAG_INT64 => {
                let b = self.read_exact(8)?;
                Ok(Value::I64(i64::from_le_bytes(b.try_into().unwrap())))
            }
            TAG_FLOAT64 => {
                self.skip_padding(8)?;
                let b = self.read_exact(8)?;
                Ok(Value::F64(f64::from_le_bytes(b.try_into().unwrap())))
            }
            TAG_STRING => {
                let len = self.read_size()?;
                let bytes = self.read_exact(len)?;
                let s = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;
                Ok(Value::String(s.to_string()))
            }
            TAG_UINT8_LIST => {
                let len = self.read_size()?;
                Ok(Value::Bytes(self.read_exact(len)?.to_vec()))
            }
            TAG_INT32_LIST => {
                let len = self.read_size()?;
                self.skip_padding(4)?;
                let mut ns = Vec::with_capacity(len.min(4096));
                for _ in 0..len {
                    let b = self.read_exact(4)?;
                    ns.push(i32::from_le_bytes([b[0], b[1], b[2], b[3]]));
                }
                Ok(Value::Int32List(ns))
            }
            TAG_INT64_LIST => {
                let len = self.read_size()?;
                self.skip_padding(8)?;
                let mut ns = Vec::with_capacity(len.min(4096));
                for _ in 0..len {
                    let b = self.read_exact(8)?;
                    ns.push(i64::from_le_bytes(b.try_into().unwrap()));
                }
                Ok(Value::Int64List(ns))
            }
            TAG_FLOAT64_LIST => {
                let len = self.read_size()?;
                self.skip_padding(8)?;
                let mut xs = Vec::with_capacity(len.min(4096));
                for _ in 0..len {
                    let b = self.read_exact(8)?;
                    xs.push(f64::from_le_bytes(b.try_into().unwrap()));
                }
                Ok(Value::Float64List(xs))
            }
            TAG_LIST => {
                let len = self.read_size()?;
                let mut items = Vec::with_capacity(len.min(4096));
                for _ in 0..len {
                    items.push(self.read_value()?);
                }
                Ok(Value::List(items))
            }
            TAG_MAP => {
                let len = self.read_size()?;
                let mut entries = BTreeMap::new();
                for _ in 0..len {
                    let key_offset = self.pos;
                    let key = match self.read_value()? {
                        Value::String(s) => s,
                        _ => return Err(CodecError::NonStringKey(key_offset)),
                    };
                    let value = self.read_value()?;
                    entries.insert(key, value);
                }
                Ok(Value::Map(entries))
            }
            tag => Err(CodecError::UnknownTag { tag, offset: tag_offset }),
        }
    }

    fn finish(&self) -> Result<(), CodecError> {
        if self.pos != self.buf.len() {
            return Err(CodecError::TrailingBytes);
        }
        Ok(())
    }
}
