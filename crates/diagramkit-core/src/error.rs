//! Error types for diagram operations.

use crate::id::EntityId;
use thiserror::Error;

/// Result type for diagram operations.
pub type DiagramResult<T> = Result<T, DiagramError>;

/// Errors raised by the diagram model and the interaction controller.
///
/// Every variant is detected before the model is touched, so a failed
/// operation never leaves partial state behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiagramError {
    /// The operation referenced an entity that does not exist.
    #[error("Entity not found: {0}")]
    NotFound(EntityId),

    /// Width, height or grid cell size was not a positive finite number.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A connector could not be created between the given endpoints.
    #[error("Invalid connector: {0}")]
    InvalidConnector(String),

    /// A mode-specific gesture arrived in a mode that cannot interpret it.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

impl DiagramError {
    /// Check if this is a `NotFound` error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DiagramError::NotFound(_))
    }
}

/// Validate a width/height pair.
pub(crate) fn check_size(width: f64, height: f64) -> DiagramResult<()> {
    if !(width.is_finite() && width > 0.0) {
        return Err(DiagramError::InvalidGeometry(format!(
            "width must be positive, got {width}"
        )));
    }
    if !(height.is_finite() && height > 0.0) {
        return Err(DiagramError::InvalidGeometry(format!(
            "height must be positive, got {height}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_size() {
        assert!(check_size(10.0, 10.0).is_ok());
        assert!(check_size(0.0, 10.0).is_err());
        assert!(check_size(10.0, -1.0).is_err());
        assert!(check_size(f64::NAN, 10.0).is_err());
        assert!(check_size(10.0, f64::INFINITY).is_err());
    }
}
