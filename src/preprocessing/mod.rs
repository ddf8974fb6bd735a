//! Data preprocessing module
//!
//! Feature scalers fitted on a training partition and applied to any other
//! partition without refitting.

mod scaler;

pub use scaler::{Scaler, ScalerParams, ScalerType};
