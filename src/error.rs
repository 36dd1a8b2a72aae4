use std::io;

/// Coarse error category, stable across releases.
///
/// The numeric codes group errors the same way the engine reports them
/// over its binding surfaces: configuration 1xx, runtime 2xx, network
/// 3xx, internal 4xx.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidConfig,
    ModelNotFound,
    UnsupportedLanguage,
    InvalidText,
    TextTooLong,
    NotInitialized,
    AlreadyInitialized,
    SynthesisFailed,
    Timeout,
    FetchFailed,
    ConnectionFailed,
    AuthFailed,
    Internal,
    OutOfMemory,
    FileWrite,
}

impl ErrorKind {
    pub fn code(self) -> u32 {
        match self {
            ErrorKind::InvalidConfig => 100,
            ErrorKind::ModelNotFound => 101,
            ErrorKind::UnsupportedLanguage => 103,
            ErrorKind::InvalidText => 104,
            ErrorKind::TextTooLong => 205,
            ErrorKind::NotInitialized => 200,
            ErrorKind::AlreadyInitialized => 201,
            ErrorKind::SynthesisFailed => 203,
            ErrorKind::Timeout => 204,
            ErrorKind::FetchFailed => 300,
            ErrorKind::ConnectionFailed => 301,
            ErrorKind::AuthFailed => 302,
            ErrorKind::Internal => 400,
            ErrorKind::OutOfMemory => 401,
            ErrorKind::FileWrite => 402,
        }
    }
}

/// All failures the engine can surface.
#[derive(thiserror::Error, Debug)]
pub enum TtsError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("model not found: {0}")]
    ModelNotFound(String),
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
    #[error("invalid text: {0}")]
    InvalidText(String),
    #[error("text too long: {0}")]
    TextTooLong(String),
    #[error("backend not initialized")]
    NotInitialized,
    #[error("backend already initialized")]
    AlreadyInitialized,
    #[error("synthesis failed: {0}")]
    SynthesisFailed(String),
    #[error("operation timed out")]
    Timeout,
    #[error("download failed: {0}")]
    FetchFailed(String),
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("authentication failed: {0}")]
    AuthFailed(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[error("out of memory")]
    OutOfMemory,
    #[error("file write failed: {0}")]
    FileWrite(String),
    #[error(
        "espeak-ng not found. Install: Linux: `sudo apt-get install espeak-ng`, \
         macOS: `brew install espeak-ng`, Windows: https://espeak-ng.org/download"
    )]
    EspeakNotFound,
    #[error("ONNX runtime error: {0}")]
    Ort(#[from] ort::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl TtsError {
    /// Classify the error into the stable taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TtsError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            TtsError::ModelNotFound(_) => ErrorKind::ModelNotFound,
            TtsError::UnsupportedLanguage(_) => ErrorKind::UnsupportedLanguage,
            TtsError::InvalidText(_) => ErrorKind::InvalidText,
            TtsError::TextTooLong(_) => ErrorKind::TextTooLong,
            TtsError::NotInitialized => ErrorKind::NotInitialized,
            TtsError::AlreadyInitialized => ErrorKind::AlreadyInitialized,
            TtsError::SynthesisFailed(_) | TtsError::Ort(_) => ErrorKind::SynthesisFailed,
            TtsError::Timeout => ErrorKind::Timeout,
            TtsError::FetchFailed(_) => ErrorKind::FetchFailed,
            TtsError::ConnectionFailed(_) => ErrorKind::ConnectionFailed,
            TtsError::AuthFailed(_) => ErrorKind::AuthFailed,
            TtsError::Internal(_) | TtsError::Shape(_) | TtsError::EspeakNotFound => {
                ErrorKind::Internal
            }
            TtsError::OutOfMemory => ErrorKind::OutOfMemory,
            TtsError::FileWrite(_) => ErrorKind::FileWrite,
            TtsError::Io(_) => ErrorKind::Internal,
        }
    }

    pub fn code(&self) -> u32 {
        self.kind().code()
    }
}

pub type Result<T> = std::result::Result<T, TtsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_stable_codes() {
        assert_eq!(TtsError::InvalidText("".into()).code(), 104);
        assert_eq!(TtsError::NotInitialized.code(), 200);
        assert_eq!(TtsError::AlreadyInitialized.code(), 201);
        assert_eq!(TtsError::SynthesisFailed("boom".into()).code(), 203);
        assert_eq!(TtsError::FetchFailed("404".into()).code(), 300);
    }

    #[test]
    fn io_errors_classify_as_internal() {
        let err = TtsError::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
