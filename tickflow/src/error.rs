//! Simulation errors.

use thiserror::Error;

/// Simulation error.
#[derive(Debug, Error)]
pub enum SimError {
    /// Combinational logic kept changing; the design has a combinational loop.
    #[error("combinational logic of `{scope}` did not settle within {passes} passes")]
    Unsettled {
        /// Composite module whose children did not settle.
        scope: String,
        /// Number of evaluation passes performed.
        passes: usize,
    },

    /// The awaited condition did not hold in time.
    #[error("condition not reached within {cycles} cycles")]
    Deadline {
        /// Number of cycles simulated while waiting.
        cycles: u64,
    },
}
