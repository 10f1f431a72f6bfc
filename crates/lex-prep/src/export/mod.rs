//! Reading input data and writing results.
//!
//! CSV is the interchange format for datasets. The JSON artifact bundles a
//! processed dataset with the transformers that produced it so the same
//! preprocessing can be replayed later.

mod artifact;
mod csv;
mod table;

pub use artifact::PreprocessingArtifact;
pub use csv::{load_csv, load_csv_bytes, to_csv_string, write_csv};
pub use table::{ColumnValues, SerializedColumn, SerializedTable};
