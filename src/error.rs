use thiserror::Error;

/// Errors produced by the Music Assistant client and connection layer.
///
/// Tool input validation never produces a `ClientError`: contradictory or
/// out-of-range parameters are resolved locally and returned to the host as
/// guidance text.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No server URL configured. Fatal, never retried.
    #[error("configuration error: {0}")]
    Config(String),

    /// WebSocket handshake or transport failure while establishing a session.
    #[error("connection error: {0}")]
    Connection(String),

    /// The session dropped underneath an in-flight command.
    #[error("connection to Music Assistant closed")]
    ConnectionClosed,

    /// The server rejected an otherwise well-formed command. Retrying a
    /// semantically invalid command cannot succeed, so these propagate as-is.
    #[error("server error ({code}): {message}")]
    Remote { code: String, message: String },

    /// A frame we could not make sense of.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ClientError {
    /// True for failures that a single reconnect-and-retry may fix.
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::ConnectionClosed)
    }
}
