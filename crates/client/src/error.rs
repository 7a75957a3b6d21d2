/// Client-side failures.
///
/// `Busy` and `EmptyInput` are rejections: the session is left untouched
/// and no request is made.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(String),

    #[error("HTTP error! status: {0}")]
    Status(u16),

    #[error("stream interrupted: {0}")]
    Stream(String),

    #[error("a message is already being sent")]
    Busy,

    #[error("message is empty")]
    EmptyInput,
}

impl ClientError {
    /// True for rejections that never reached the network.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ClientError::Busy | ClientError::EmptyInput)
    }
}
