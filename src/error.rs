use crate::prelude::*;

/// Represents an error while decoding a Standard Midi File.
///
/// This type wraps an `ErrorKind` describing the root cause, along with a chain of static context
/// messages describing what the decoder was doing when the error happened (innermost first).
///
/// Errors are fatal to the conversion of a single file, but never to a batch: callers driving
/// several files should report the error and move on.
#[derive(Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    context: Vec<&'static str>,
}
impl Error {
    /// Create a new error with the given `ErrorKind`.
    #[inline]
    pub fn new(kind: ErrorKind) -> Error {
        Error {
            kind,
            context: Vec::new(),
        }
    }

    /// The root cause of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The context messages attached while the error bubbled up, innermost first.
    #[inline]
    pub fn context(&self) -> &[&'static str] {
        &self.context
    }

    #[inline]
    fn chain_ctx(mut self, ctx: &'static str) -> Error {
        self.context.push(ctx);
        self
    }
}
impl From<ErrorKind> for Error {
    #[inline]
    fn from(kind: ErrorKind) -> Error {
        Error::new(kind)
    }
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)?;
        for ctx in self.context.iter().rev() {
            write!(f, " (while {})", ctx)?;
        }
        Ok(())
    }
}
impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for ctx in self.context.iter() {
            writeln!(f)?;
            write!(f, "  while {}", ctx)?;
        }
        Ok(())
    }
}
impl std::error::Error for Error {}

/// The type of error that occurred while decoding.
///
/// Only structural problems are errors. Data-quality anomalies such as unmatched note-offs or
/// repeated tempo events are resolved by a fallback policy and at most logged.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A chunk tag or a header field does not match the container format.
    ///
    /// It is likely that the file is not a MIDI file at all.
    MalformedContainer(&'static str),

    /// A read ran past the end of the buffer or of the enclosing chunk.
    TruncatedStream(&'static str),

    /// A status byte that is neither a channel message, a SysEx nor a meta event.
    ///
    /// Holds the offending status byte.
    UnknownEventType(u8),

    /// A variable-length integer had its continuation flag set on the 5th byte.
    ValueTooLarge,
}
impl ErrorKind {
    /// Get the informative message on what exact part of the MIDI format was not respected.
    #[inline]
    pub fn message(&self) -> &'static str {
        match *self {
            ErrorKind::MalformedContainer(msg) => msg,
            ErrorKind::TruncatedStream(msg) => msg,
            ErrorKind::UnknownEventType(_) => "unknown event type",
            ErrorKind::ValueTooLarge => "variable-length integer larger than 5 bytes",
        }
    }
}
impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::MalformedContainer(msg) => write!(f, "malformed container: {}", msg),
            ErrorKind::TruncatedStream(msg) => write!(f, "truncated stream: {}", msg),
            ErrorKind::UnknownEventType(status) => {
                write!(f, "unknown event type: status byte 0x{:02X}", status)
            }
            ErrorKind::ValueTooLarge => write!(f, "value too large: {}", self.message()),
        }
    }
}

macro_rules! err_malformed {
    ($msg:expr) => {{
        ErrorKind::MalformedContainer($msg)
    }};
}
macro_rules! err_truncated {
    ($msg:expr) => {{
        ErrorKind::TruncatedStream($msg)
    }};
}

pub(crate) trait ResultExt<T> {
    fn context(self, ctx: &'static str) -> StdResult<T, Error>;
}
impl<T> ResultExt<T> for StdResult<T, Error> {
    #[inline]
    fn context(self, ctx: &'static str) -> StdResult<T, Error> {
        self.map_err(|err| err.chain_ctx(ctx))
    }
}
impl<T> ResultExt<T> for StdResult<T, ErrorKind> {
    #[inline]
    fn context(self, ctx: &'static str) -> StdResult<T, Error> {
        self.map_err(|kind| Error::from(kind).chain_ctx(ctx))
    }
}

/// The result type used by the MIDI decoder.
pub type Result<T> = StdResult<T, Error>;
pub(crate) use core::result::Result as StdResult;
