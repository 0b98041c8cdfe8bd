use std::fmt;

#[derive(Debug)]
pub enum BlamebotError {
    IoError(std::io::Error),
    /// Errors from invoking the git CLI that exited with a non-zero status
    GitCliError {
        code: Option<i32>,
        stderr: String,
        args: Vec<String>,
    },
    JsonError(serde_json::Error),
    Utf8Error(std::str::Utf8Error),
    FromUtf8Error(std::string::FromUtf8Error),
    /// No snapshot blob is stored under this hash
    BlobNotFound(String),
    InvalidLineSet(String),
    Generic(String),
}

impl fmt::Display for BlamebotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlamebotError::IoError(e) => write!(f, "IO error: {}", e),
            BlamebotError::GitCliError { code, stderr, args } => match code {
                Some(c) => write!(
                    f,
                    "Git CLI ({}) failed with exit code {}: {}",
                    args.join(" "),
                    c,
                    stderr
                ),
                None => write!(f, "Git CLI ({}) failed: {}", args.join(" "), stderr),
            },
            BlamebotError::JsonError(e) => write!(f, "JSON error: {}", e),
            BlamebotError::Utf8Error(e) => write!(f, "UTF-8 error: {}", e),
            BlamebotError::FromUtf8Error(e) => write!(f, "From UTF-8 error: {}", e),
            BlamebotError::BlobNotFound(sha) => write!(f, "Blob not found: {}", sha),
            BlamebotError::InvalidLineSet(e) => write!(f, "Invalid line set: {}", e),
            BlamebotError::Generic(e) => write!(f, "Generic error: {}", e),
        }
    }
}

impl std::error::Error for BlamebotError {}

impl From<std::io::Error> for BlamebotError {
    fn from(err: std::io::Error) -> Self {
        BlamebotError::IoError(err)
    }
}

impl From<serde_json::Error> for BlamebotError {
    fn from(err: serde_json::Error) -> Self {
        BlamebotError::JsonError(err)
    }
}

impl From<std::str::Utf8Error> for BlamebotError {
    fn from(err: std::str::Utf8Error) -> Self {
        BlamebotError::Utf8Error(err)
    }
}

impl From<std::string::FromUtf8Error> for BlamebotError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        BlamebotError::FromUtf8Error(err)
    }
}

impl Clone for BlamebotError {
    fn clone(&self) -> Self {
        match self {
            BlamebotError::IoError(e) => {
                BlamebotError::IoError(std::io::Error::new(e.kind(), e.to_string()))
            }
            BlamebotError::GitCliError { code, stderr, args } => BlamebotError::GitCliError {
                code: *code,
                stderr: stderr.clone(),
                args: args.clone(),
            },
            BlamebotError::JsonError(e) => BlamebotError::Generic(format!("JSON error: {}", e)),
            BlamebotError::Utf8Error(e) => BlamebotError::Utf8Error(*e),
            BlamebotError::FromUtf8Error(e) => BlamebotError::FromUtf8Error(e.clone()),
            BlamebotError::BlobNotFound(sha) => BlamebotError::BlobNotFound(sha.clone()),
            BlamebotError::InvalidLineSet(s) => BlamebotError::InvalidLineSet(s.clone()),
            BlamebotError::Generic(s) => BlamebotError::Generic(s.clone()),
        }
    }
}

impl BlamebotError {
    /// True when the error means "nothing stored here" rather than a broken store.
    pub fn is_not_found(&self) -> bool {
        match self {
            BlamebotError::BlobNotFound(_) => true,
            BlamebotError::IoError(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
