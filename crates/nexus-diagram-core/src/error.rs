pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid rewrite pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: &'static str, message: String },

    #[error("Diagram source is {len} bytes, above the {limit} byte normalization limit")]
    InputTooLarge { len: usize, limit: usize },

    #[error("Invalid engine config JSON: {message}")]
    InvalidConfigJson { message: String },
}
