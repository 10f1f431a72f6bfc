//! Numerical scaling.

mod numeric;

pub use numeric::{NumericScaler, ScalerParams};
