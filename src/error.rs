use thiserror::Error;

/// Error type for channel registration, dispatch bookkeeping and the
/// capability publisher.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// A channel with this name is already registered on the messenger.
    #[error("channel '{0}' is already registered")]
    DuplicateChannel(String),

    /// A second response was produced for a call that already responded.
    /// This is a programming defect, not a recoverable runtime condition.
    #[error("method '{0}' already produced a response")]
    DoubleResponse(String),

    /// The OS could not report the path of the running executable.
    #[error("failed to determine location of executable: {0}")]
    ExecutableResolution(#[source] std::io::Error),

    /// The host OS system-identification query failed.
    #[error("OS version query failed: {0}")]
    OsQueryFailed(String),

    /// Wire encoding/decoding error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Decode-side errors for the standard method codec.
///
/// Malformed input always surfaces as one of these; the decoder never
/// panics on untrusted bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("unexpected end of message at offset {0}")]
    UnexpectedEof(usize),

    #[error("unknown type tag {tag:#04x} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },

    #[error("string value is not valid UTF-8")]
    InvalidUtf8,

    #[error("map key at offset {0} is not a string")]
    NonStringKey(usize),

    #[error("trailing bytes after message end")]
    TrailingBytes,

    #[error("invalid response envelope tag {0:#04x}")]
    InvalidEnvelope(u8),

    #[error("method name is not a string")]
    BadMethodName,

    #[error("error envelope code/message is not a string")]
    BadErrorEnvelope,
}
