use std::{
    error::Error,
    fmt::{Debug, Display, Formatter},
};

/// Everything that can go wrong while resolving, fetching or collocating archive files.
pub enum CollocError {
    /// The archive could not be reached, or a listing or download failed.
    Transport(String),
    /// A filename did not parse into a start time, or loaded data has the wrong layout.
    Format(String),
    /// An invalid time range or window size was requested.
    Range(String),
    /// A file or an adjacent day listing the resolution logic depends on is missing.
    NotFound(String),
}

impl CollocError {
    pub fn transport(message: &str) -> Self {
        CollocError::Transport(message.into())
    }

    pub fn format(message: &str) -> Self {
        CollocError::Format(message.into())
    }

    pub fn range(message: &str) -> Self {
        CollocError::Range(message.into())
    }
}

impl Debug for CollocError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        Display::fmt(self, f)
    }
}

impl Display for CollocError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        match self {
            CollocError::Transport(msg) => write!(f, "transport error: {}", msg),
            CollocError::Format(msg) => write!(f, "format error: {}", msg),
            CollocError::Range(msg) => write!(f, "range error: {}", msg),
            CollocError::NotFound(msg) => write!(f, "not found: {}", msg),
        }
    }
}

impl Error for CollocError {}

impl From<std::io::Error> for CollocError {
    fn from(err: std::io::Error) -> Self {
        CollocError::Transport(err.to_string())
    }
}

impl From<reqwest::Error> for CollocError {
    fn from(err: reqwest::Error) -> Self {
        CollocError::Transport(err.to_string())
    }
}

impl From<suppaftp::FtpError> for CollocError {
    fn from(err: suppaftp::FtpError) -> Self {
        CollocError::Transport(err.to_string())
    }
}

impl From<strum::ParseError> for CollocError {
    fn from(err: strum::ParseError) -> Self {
        CollocError::Format(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_class() {
        assert_eq!(
            CollocError::range("t0 >= t1").to_string(),
            "range error: t0 >= t1"
        );
        assert_eq!(
            CollocError::format("bad name").to_string(),
            "format error: bad name"
        );
    }

    #[test]
    fn test_io_errors_are_transport_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: CollocError = io.into();
        assert!(matches!(err, CollocError::Transport(_)));
    }
}
