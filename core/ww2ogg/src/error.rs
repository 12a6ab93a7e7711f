//! Error types for Wwise Vorbis conversion.

use thiserror::Error;

/// Result type alias for conversion operations.
pub type Ww2OggResult<T> = Result<T, Ww2OggError>;

/// Errors that can occur while converting a Wwise Vorbis stream.
#[derive(Debug, Error)]
pub enum Ww2OggError {
    /// A required file could not be opened or found.
    #[error("Error opening {filename}")]
    FileOpen {
        /// The name of the file that could not be opened.
        filename: String,
    },

    /// The input contains invalid or malformed data.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parse error.
        message: String,
    },

    /// A stripped codebook's length disagrees with the declared library
    /// entry length. This typically means the wrong codebook library is in
    /// use.
    #[error("Parse error: expected {expected} bytes, read {actual} - likely wrong codebook")]
    SizeMismatch {
        /// The declared size in bytes.
        expected: u64,
        /// The number of bytes actually consumed.
        actual: u64,
    },

    /// A codebook id referenced by the setup packet is not present in the
    /// codebook library.
    #[error("Parse error: invalid codebook id {id}, try --inline-codebooks")]
    InvalidCodebookId {
        /// The out-of-range codebook id.
        id: i32,
    },

    /// Syntactically plausible data that is semantically inconsistent with
    /// the loaded codebook library.
    #[error("{message}")]
    Codebook {
        /// Description of the codebook error.
        message: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The bit source was exhausted mid-read.
    #[error("Unexpected end of stream: {message}")]
    EndOfStream {
        /// Description of where the end of stream occurred.
        message: String,
    },
}

impl Ww2OggError {
    /// Create a new parse error with the given message.
    pub fn parse(message: impl Into<String>) -> Self {
        Ww2OggError::Parse {
            message: message.into(),
        }
    }

    /// Create a new codebook error with the given message.
    pub fn codebook(message: impl Into<String>) -> Self {
        Ww2OggError::Codebook {
            message: message.into(),
        }
    }

    /// Create a new file open error.
    pub fn file_open(filename: impl Into<String>) -> Self {
        Ww2OggError::FileOpen {
            filename: filename.into(),
        }
    }

    /// Create a new size mismatch error.
    pub fn size_mismatch(expected: u64, actual: u64) -> Self {
        Ww2OggError::SizeMismatch { expected, actual }
    }

    /// Create a new invalid codebook id error.
    pub fn invalid_codebook_id(id: i32) -> Self {
        Ww2OggError::InvalidCodebookId { id }
    }

    /// Create a new end of stream error.
    pub fn end_of_stream(message: impl Into<String>) -> Self {
        Ww2OggError::EndOfStream {
            message: message.into(),
        }
    }

    /// True for errors that suggest the wrong codebook library rather than a
    /// broken input. Callers may retry these with a different library; they
    /// must not retry `Parse` or `FileOpen`.
    pub fn is_codebook_family(&self) -> bool {
        matches!(
            self,
            Ww2OggError::Codebook { .. }
                | Ww2OggError::SizeMismatch { .. }
                | Ww2OggError::InvalidCodebookId { .. }
        )
    }
}
