use thiserror::Error;

/// Errors raised by the indexing and aggregation pipeline.
///
/// Every component fails fast at its boundary: no partial results are
/// returned, and the orchestrator surfaces the first failure from whichever
/// stage raised it. Non-fatal conditions (placeholder geometry, boundary
/// fallback) travel through [`crate::notice::Notice`] instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or empty required input, or a required grouping column absent.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A granularity, type, format, or aggregation-function value outside the
    /// supported set. The message enumerates the valid options.
    #[error("unsupported {kind} '{value}'. Valid options are: {valid}")]
    UnsupportedOption {
        kind: &'static str,
        value: String,
        valid: String,
    },

    /// A spatial value could not be converted to a geometry of the requested
    /// or detected type.
    #[error("could not construct geometry: {0}")]
    GeometryConstruction(String),

    /// A temporal value could not be parsed under any attempted strategy.
    #[error("could not parse temporal data: {0}")]
    TemporalParse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build an [`Error::UnsupportedOption`] from the list of valid options.
    pub fn unsupported(kind: &'static str, value: &str, valid: &[&str]) -> Self {
        Error::UnsupportedOption {
            kind,
            value: value.to_string(),
            valid: valid.join(", "),
        }
    }
}
