use thiserror::Error;

/// Errors raised while scanning a wiki document.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The cursor was read past the last line. This is a scanning bug, not bad input.
    #[error("line index {index} out of bounds (document has {len} lines)")]
    OutOfBounds { index: usize, len: usize },

    /// No override row and no shape heuristic matched the table.
    #[error("unrecognized table format for {name:?} ({year:?}): first row {first_row:?}")]
    UnrecognizedTableFormat {
        name: String,
        year: Option<i32>,
        first_row: String,
    },

    #[error("cannot decode an empty table")]
    EmptyTable,

    #[error("unknown decoder id {0:?}")]
    UnknownDecoder(String),

    #[error("invalid override table: {0}")]
    Overrides(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ParseError>;
