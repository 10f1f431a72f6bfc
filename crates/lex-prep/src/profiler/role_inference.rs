//! Role inference logic for column analysis.

use crate::types::ColumnRole;
use crate::utils::{DtypeCategory, get_dtype_category};
use polars::prelude::*;

/// Infer the preprocessing role of a column from its dtype.
///
/// Numbers are numerical; text and booleans are categorical. Dates and
/// anything more exotic are left alone unless the user assigns a role.
pub(crate) fn infer_column_role(dtype: &DataType) -> ColumnRole {
    match get_dtype_category(dtype) {
        DtypeCategory::Numeric => ColumnRole::Numerical,
        DtypeCategory::String | DtypeCategory::Boolean => ColumnRole::Categorical,
        DtypeCategory::Datetime | DtypeCategory::Other => ColumnRole::Passthrough,
    }
}
