//! Imputation module for handling missing values.
//!
//! Numerical columns are filled with their mean or median, categorical
//! columns with their most frequent value or a constant.

mod statistical;

pub use statistical::StatisticalImputer;
