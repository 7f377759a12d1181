use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatSubsError {
    #[error("{0}")]
    Parse(String),
    #[error("No text_message entries in JSON.")]
    NoTextMessages,
    #[error("Invalid option: {0}")]
    InvalidOption(String),
}
