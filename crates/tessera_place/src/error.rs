//! Error type of the placement engine.

use tessera_common::InternalError;
use tessera_config::ConfigError;

/// Errors returned by the placement entry points.
///
/// The first four variants describe problems with the inputs and are also
/// reported through the diagnostic sink. [`PlaceError::Internal`] means a
/// placer invariant broke and indicates a bug.
#[derive(Debug, thiserror::Error)]
pub enum PlaceError {
    /// The device cannot host the blocks of some type.
    #[error("block type '{block_type}' needs {demand} slots but the device offers {capacity}")]
    Infeasible {
        /// Name of the block type.
        block_type: String,
        /// Number of blocks that still need a slot.
        demand: usize,
        /// Number of free compatible slots.
        capacity: usize,
    },

    /// The supplied placement is not legal.
    #[error("invalid placement: {0}")]
    InvalidPlacement(String),

    /// A macro definition is malformed.
    #[error("invalid macro: {0}")]
    InvalidMacro(String),

    /// The placer settings are out of range.
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    /// A placer invariant was violated.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_infeasible() {
        let err = PlaceError::Infeasible {
            block_type: "dsp".into(),
            demand: 5,
            capacity: 4,
        };
        assert_eq!(
            format!("{err}"),
            "block type 'dsp' needs 5 slots but the device offers 4"
        );
    }

    #[test]
    fn internal_is_transparent() {
        let err: PlaceError = InternalError::new("queue corrupted").into();
        assert_eq!(format!("{err}"), "internal placer error: queue corrupted");
    }
}
