use polars::prelude::PolarsError;
use thiserror::Error;
use uuid::Uuid;

/// CSV 加载错误
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: PolarsError,
    },

    #[error("{file}: missing header row")]
    MissingHeaderRow { file: String },

    #[error(transparent)]
    Frame(#[from] PolarsError),

    #[error("Could not load the data. Check the CSV files.")]
    Incomplete,
}

/// 查询错误 (OpenRouter 调用)
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("No data loaded. Load the CSV files first.")]
    NoData,

    #[error("OpenRouter API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Error processing query: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Error processing query: {0}")]
    MalformedResponse(String),
}

/// 会话错误
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Please provide your OpenRouter API key to continue.")]
    MissingApiKey,

    #[error("Unknown model '{0}'")]
    UnknownModel(String),

    #[error("Session {0} not found")]
    NotFound(Uuid),
}
