use std::fmt;

use crate::options::{SpatialGranularity, SpatialType};

/// A non-fatal diagnostic emitted alongside a usable-but-approximate result.
///
/// These replace ambient warnings: callers can inspect or assert on degraded
/// behavior instead of scraping log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Address geocoding / code lookup is an external collaborator; every
    /// record received the sentinel point (0, 0).
    PlaceholderGeometry { spatial_type: SpatialType },

    /// No administrative boundary data is available; the requested level fell
    /// back to the fixed grid partition. Per-administrative-unit correctness
    /// must not be assumed.
    AdminBoundaryFallback { granularity: SpatialGranularity },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::PlaceholderGeometry { spatial_type } => write!(
                f,
                "{} geometry lookup is not implemented; records carry placeholder points at (0, 0)",
                spatial_type
            ),
            Notice::AdminBoundaryFallback { granularity } => write!(
                f,
                "aggregation by {} has no boundary data; fell back to the 10x10 grid partition",
                granularity
            ),
        }
    }
}

/// A result value paired with the notices produced while computing it.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub notices: Vec<Notice>,
}

impl<T> Outcome<T> {
    /// Wrap a value produced without any diagnostics.
    pub fn clean(value: T) -> Self {
        Outcome {
            value,
            notices: Vec::new(),
        }
    }

    pub fn new(value: T, notices: Vec<Notice>) -> Self {
        Outcome { value, notices }
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn has_notices(&self) -> bool {
        !self.notices.is_empty()
    }
}
