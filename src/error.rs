use std::error::Error;
use std::fmt;
use std::fmt::Display;

use crate::phase::Phase;

/// Convenience alias used by every fallible API in this crate.
pub type SessionResult<T> = Result<T, SessionError>;

/// This enum contains all errors the session controller can return.
///
/// Protocol violations and client/server desyncs are not errors. They are reported
/// through [`telemetry`](crate::telemetry) and answered with a default reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The handler for a phase could not be built. The session cannot continue.
    HandlerConstruction {
        /// The phase whose handler failed to build.
        phase: Phase,
        /// Why the factory gave up.
        reason: String,
    },
    /// The session was terminated by an earlier fatal error and accepts no more work.
    Terminated,
    /// The host passed an argument the controller cannot act on.
    InvalidRequest {
        /// Further specifies why the request was invalid.
        info: String,
    },
    /// A configuration value was rejected by the [`SessionBuilder`](crate::SessionBuilder).
    InvalidConfiguration {
        /// Which setting was rejected and why.
        info: String,
    },
    /// Serialization or deserialization of persisted data failed.
    Serialization {
        /// A description of what failed to serialize/deserialize.
        context: String,
    },
}

impl Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::HandlerConstruction { phase, reason } => {
                write!(f, "Could not build the handler for phase {}: {}", phase, reason)
            },
            SessionError::Terminated => {
                write!(f, "The session has been terminated and accepts no further events.")
            },
            SessionError::InvalidRequest { info } => {
                write!(f, "Invalid Request: {}", info)
            },
            SessionError::InvalidConfiguration { info } => {
                write!(f, "Invalid configuration: {}", info)
            },
            SessionError::Serialization { context } => {
                write!(f, "Serialization error: {}", context)
            },
        }
    }
}

impl Error for SessionError {}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Serialization {
            context: err.to_string(),
        }
    }
}

/// Why a handler factory could not produce a handler.
///
/// Returned by [`HandlerFactory::build`](crate::HandlerFactory::build) and turned into a
/// fatal [`SessionError::HandlerConstruction`] by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerBuildError {
    /// A description of the missing resource.
    pub reason: String,
}

impl HandlerBuildError {
    /// Creates a build error with the given reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Display for HandlerBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl Error for HandlerBuildError {}

/// Errors raised while decoding a [`CfrPacket`](crate::cfr::CfrPacket).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CfrDecodeError {
    /// The kind code does not name any request this client understands.
    UnknownKind {
        /// The raw kind code.
        code: u16,
    },
    /// The kind is known but the payload does not have the expected shape.
    MalformedPayload {
        /// The raw kind code.
        code: u16,
        /// What was wrong with the payload.
        detail: String,
    },
}

impl Display for CfrDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CfrDecodeError::UnknownKind { code } => {
                write!(f, "Unknown feedback request kind {}", code)
            },
            CfrDecodeError::MalformedPayload { code, detail } => {
                write!(f, "Malformed payload for feedback request kind {}: {}", code, detail)
            },
        }
    }
}

impl Error for CfrDecodeError {}
