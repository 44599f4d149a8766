//! Cortical Learning Algorithm region.
//!
//! A `Region` takes a stream of binary input vectors and learns two things from it:
//! a sparse spatial encoding of every input (spatial pooling), and the temporal
//! transitions between those encodings, which it uses to predict upcoming activity
//! several steps ahead (temporal pooling).
//!
//! ```no_run
//! use cla_region::core::{config::RegionParams, region::Region};
//!
//! let params = RegionParams::hardcoded(250, 1, 1, 3, 4);
//! let mut region = Region::new(params)?;
//!
//! let mut input = vec![false; 250];
//! input[..25].iter_mut().for_each(|bit| *bit = true);
//! region.update_input(&input)?;
//! region.run_once();
//!
//! let accuracy = region.last_accuracy();
//! println!("{:.2} {:.2}", accuracy.activation, accuracy.prediction);
//! # Ok::<(), cla_region::HtmError>(())
//! ```

pub mod core;

/// Error types for the library.
pub mod error {
    use thiserror::Error;

    /// Main error type for region construction and input handling.
    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum HtmError {
        /// A hyperparameter is outside its valid range.
        #[error("Invalid parameter '{name}': {message}")]
        InvalidParameter {
            /// Name of the invalid parameter.
            name: &'static str,
            /// Description of the error.
            message: String,
        },

        /// An input vector does not match the region's input dimensions.
        #[error("Input size mismatch: expected {expected} bits, got {actual}")]
        InputSizeMismatch {
            /// Number of input bits the region was built for.
            expected: usize,
            /// Number of bits supplied.
            actual: usize,
        },
    }

    /// Result type alias using HtmError.
    pub type Result<T> = std::result::Result<T, HtmError>;
}

pub use error::{HtmError, Result};

/// Commonly used types.
pub mod prelude {
    pub use crate::core::{
        cell::CellAddress,
        config::{RegionConfig, RegionParams, Scheduler, SpatialTopology, SynapsePermanenceOptions},
        region::{Accuracy, Region},
        stats::RegionStats,
    };
    pub use crate::{HtmError, Result};
}
