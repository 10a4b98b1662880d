/// Errors reported by the public entry points before any output is touched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("{op}: dimension mismatch, expected {expected} but found {found}")]
    DimensionMismatch {
        op: &'static str,
        expected: String,
        found: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid view: offset {offset}, {rows}x{cols} with leading dimension {ld} over {len} elements")]
    InvalidView {
        offset: usize,
        rows: usize,
        cols: usize,
        ld: usize,
        len: usize,
    },
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn mismatch(op: &'static str, expected: impl ToString, found: impl ToString) -> Error {
        Error::DimensionMismatch {
            op,
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
