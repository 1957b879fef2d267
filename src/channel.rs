use log::error;
use serde::{Deserialize, Serialize};

use crate::error::ChannelError;
use crate::value::Value;

/// A single named invocation with its arguments payload.
///
/// Immutable once built; consumed by exactly one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

/// Typed handler failure, carried back to the caller as a structured
/// error response the caller can branch on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Value::is_null", default)]
    pub details: Value,
}

impl MethodError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Value::Null,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

/// The one response every call terminates in.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    Success(Value),
    Error {
        code: String,
        message: String,
        details: Value,
    },
    /// The method name is not in the handler's supported set.
    NotImplemented,
}

impl MethodResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, MethodResponse::Success(_))
    }

    /// Payload of a success response, if this is one.
    pub fn result(&self) -> Option<&Value> {
        match self {
            MethodResponse::Success(v) => Some(v),
            _ => None,
        }
    }
}

impl From<MethodError> for MethodResponse {
    fn from(e: MethodError) -> Self {
        MethodResponse::Error {
            code: e.code,
            message: e.message,
            details: e.details,
        }
    }
}

/// Per-call lifecycle. `Responded` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallState {
    Idle,
    AwaitingHandler,
    Responded,
}

/// Tracks the exactly-once response contract for one call instance.
///
/// Created per call by the dispatcher. `respond` a second time is a
/// contract violation (`DoubleResponse`); dropping a responder that
/// never responded is a leak and is logged as such.
#[derive(Debug)]
pub struct Responder {
    method: String,
    state: CallState,
    response: Option<MethodResponse>,
}

impl Responder {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            state: CallState::Idle,
            response: None,
        }
    }

    /// Marks the handler as invoked for this call.
    pub fn begin(&mut self) {
        if self.state == CallState::Idle {
            self.state = CallState::AwaitingHandler;
        }
    }

    pub fn has_responded(&self) -> bool {
        self.state == CallState::Responded
    }

    /// Records the single response for this call.
    pub fn respond(&mut self, response: MethodResponse) -> Result<(), ChannelError> {
        if self.state == CallState::Responded {
            error!(
                "double response for method '{}' - second response dropped",
                self.method
            );
            return Err(ChannelError::DoubleResponse(self.method.clone()));
        }
        self.state = CallState::Responded;
        self.response = Some(response);
        Ok(())
    }

    /// Consumes the responder, yielding the recorded response.
    pub fn into_response(mut self) -> Option<MethodResponse> {
        self.response.take()
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        // A consumed responder has state Responded and an empty slot;
        // only a never-answered call trips this.
        if self.state != CallState::Responded {
            error!(
                "call '{}' dropped without a response - contract violation",
                self.method
            );
            debug_assert!(false, "call dropped without a response");
        }
    }
}
