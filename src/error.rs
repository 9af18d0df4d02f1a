use thiserror::Error;

/// Contract violations raised by the pipeline stages.
///
/// Empty inputs are never errors; these only signal a caller asking for
/// something the data or the stage cannot mean.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("unknown column `{column}` used as {context}")]
    UnknownColumn {
        column: String,
        context: &'static str,
    },

    #[error("column `{column}` is not present in the table (needed as {context})")]
    MissingColumn {
        column: &'static str,
        context: &'static str,
    },

    #[error("invalid grouping key `{0}`, expected `country` or `country,year`")]
    InvalidGroupKey(String),

    #[error("rank request needs k >= 1, got {0}")]
    InvalidRank(usize),

    #[error("{stage} expects rows grouped by {expected}, got {actual}")]
    WrongGrouping {
        stage: &'static str,
        expected: &'static str,
        actual: &'static str,
    },
}

pub type PipelineResult<T> = Result<T, PipelineError>;
