use thiserror::Error;

#[derive(Error, Debug)]
pub enum NmtError {
    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Unsupported language pair: {src} -> {tgt}")]
    UnsupportedLanguagePair { src: String, tgt: String },

    #[error("Queue overflow with {waiters} waiters")]
    QueueOverflow { waiters: usize },

    #[error("Service busy")]
    ServiceBusy,

    #[error("Translation timed out")]
    TranslationTimeout,

    #[error("Discovery error: {0}")]
    Discovery(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Value error: {0}")]
    ValueError(String),
}

impl From<std::io::Error> for NmtError {
    fn from(error: std::io::Error) -> Self {
        NmtError::IOError(error.to_string())
    }
}

impl From<reqwest::Error> for NmtError {
    fn from(error: reqwest::Error) -> Self {
        NmtError::Inference(error.to_string())
    }
}
