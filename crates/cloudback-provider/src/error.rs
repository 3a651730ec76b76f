use std::fmt;

/// Failure reported by the Cloudback API or the transport underneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    Transport(String),
    Status {
        status_code: u16,
        status: String,
        body: String,
    },
    Decode(String),
}

impl RemoteError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Status { status, body, .. } if body.is_empty() => write!(f, "{status}"),
            Self::Status { status, body, .. } => write!(f, "{status}: {body}"),
            Self::Decode(msg) => write!(f, "failed to decode response: {msg}"),
        }
    }
}

#[derive(Debug)]
pub enum Error {
    MissingIdentity,
    Format { id: String },
    Remote(RemoteError),
    Msg(String),
}

impl Error {
    pub fn msg<M: Into<String>>(msg: M) -> Self {
        Self::Msg(msg.into())
    }

    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            Self::Remote(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingIdentity => write!(
                f,
                "either 'repository' or both 'subject_type' and 'subject_name' must be provided"
            ),
            Self::Format { id } => write!(
                f,
                "expected import identifier with format: platform/account/repository or platform/account/subject_type/subject_name, got: {id:?}"
            ),
            Self::Remote(e) => write!(f, "remote error: {e}"),
            Self::Msg(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<RemoteError> for Error {
    fn from(err: RemoteError) -> Self {
        Self::Remote(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::msg(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::msg(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::msg(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
