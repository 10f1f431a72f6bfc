//! Categorical encoding.
//!
//! One-hot encoding expands a column into `Int32` indicator columns, label
//! encoding maps each category to its `Int64` index. Categories are always
//! kept in sorted order so encodings do not depend on row order.

mod categorical;

pub use categorical::{CategoricalEncoder, EncodedColumn};
