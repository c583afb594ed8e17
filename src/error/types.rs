use thiserror::Error;

use crate::logging::LoggingError;

/// Unified result type for the viewport layout engine.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Which registry invariant a rejected region declaration violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegionConflict {
    #[error("name is already registered")]
    Name,
    #[error("z-index {z_index} is already held by `{existing}`")]
    ZIndex { existing: String, z_index: i32 },
}

/// Errors surfaced while configuring or driving the layout engine.
///
/// Only configuration-time variants are fatal; resolving a layout never fails.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("region `{name}` rejected: {conflict}")]
    DuplicateRegion {
        name: String,
        conflict: RegionConflict,
    },
    #[error("invalid breakpoint threshold at position {position}: {reason}")]
    InvalidThreshold { position: usize, reason: String },
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("renderer error: {0}")]
    Render(String),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LayoutError {
    pub(crate) fn duplicate_name(name: impl Into<String>) -> Self {
        Self::DuplicateRegion {
            name: name.into(),
            conflict: RegionConflict::Name,
        }
    }

    pub(crate) fn duplicate_z_index(
        name: impl Into<String>,
        existing: impl Into<String>,
        z_index: i32,
    ) -> Self {
        Self::DuplicateRegion {
            name: name.into(),
            conflict: RegionConflict::ZIndex {
                existing: existing.into(),
                z_index,
            },
        }
    }

    pub(crate) fn invalid_threshold(position: usize, reason: impl Into<String>) -> Self {
        Self::InvalidThreshold {
            position,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_z_index_message_names_both_regions() {
        let err = LayoutError::duplicate_z_index("coin", "footer", 5);
        assert_eq!(
            err.to_string(),
            "region `coin` rejected: z-index 5 is already held by `footer`"
        );
    }

    #[test]
    fn invalid_threshold_message_includes_position() {
        let err = LayoutError::invalid_threshold(2, "max_width must increase");
        assert!(err.to_string().contains("position 2"));
    }
}
