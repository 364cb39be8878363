use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmotionError {
    #[error("Failed to parse selector: {0}")]
    Selector(#[from] pest::error::Error<crate::parser::selector::Rule>),

    #[error("Failed to read emotion options: {0}")]
    InvalidOptions(#[from] serde_json::Error),

    #[error("Emotion size must be a positive pixel count (got {size})")]
    InvalidSize { size: i64 },

    #[error("Alt format \"{alt_format}\" has no {{id}} placeholder")]
    MissingPlaceholder { alt_format: String },
}
