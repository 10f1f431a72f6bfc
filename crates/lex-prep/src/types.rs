use crate::profiler::infer_column_role;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

// ============================================================================
// Column roles
// ============================================================================

/// Role a column plays in preprocessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Imputed with a statistic and eligible for scaling.
    Numerical,
    /// Imputed with a category and eligible for encoding.
    Categorical,
    /// Copied through untouched.
    Passthrough,
}

impl ColumnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numerical => "numerical",
            Self::Categorical => "categorical",
            Self::Passthrough => "passthrough",
        }
    }
}

/// Partition of a dataset's columns into numerical and categorical roles.
///
/// A column appears in at most one role. Columns in neither role pass
/// through the pipeline unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRoles {
    pub numerical: Vec<String>,
    pub categorical: Vec<String>,
}

impl ColumnRoles {
    pub fn new(
        numerical: impl IntoIterator<Item = impl Into<String>>,
        categorical: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            numerical: numerical.into_iter().map(Into::into).collect(),
            categorical: categorical.into_iter().map(Into::into).collect(),
        }
    }

    /// Detect roles from column dtypes: numeric dtypes are numerical,
    /// string and boolean dtypes are categorical, anything else passes through.
    pub fn detect(df: &DataFrame) -> Self {
        let mut roles = Self::default();
        for column in df.get_columns() {
            let name = column.name().to_string();
            match infer_column_role(column.dtype()) {
                ColumnRole::Numerical => roles.numerical.push(name),
                ColumnRole::Categorical => roles.categorical.push(name),
                ColumnRole::Passthrough => {}
            }
        }
        roles
    }

    /// Role of a column under this partition.
    pub fn role_of(&self, column: &str) -> ColumnRole {
        if self.numerical.iter().any(|c| c == column) {
            ColumnRole::Numerical
        } else if self.categorical.iter().any(|c| c == column) {
            ColumnRole::Categorical
        } else {
            ColumnRole::Passthrough
        }
    }
}

// ============================================================================
// Profiling
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: String,
    pub detected_role: ColumnRole,
    pub unique_count: usize,
    pub null_count: usize,
    pub null_percentage: f64,
    pub sample_values: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub shape: (usize, usize),
    pub column_profiles: Vec<ColumnProfile>,
}

impl DatasetProfile {
    /// Names of the columns detected as a given role, in dataset order.
    pub fn columns_with_role(&self, role: ColumnRole) -> Vec<&str> {
        self.column_profiles
            .iter()
            .filter(|c| c.detected_role == role)
            .map(|c| c.name.as_str())
            .collect()
    }
}

// ============================================================================
// Preprocessing report
// ============================================================================

/// Human-readable account of what one pipeline run did.
///
/// This is what a UI collaborator shows as status messages after a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingReport {
    /// Number of rows (unchanged by the pipeline).
    pub rows: usize,
    /// Number of columns before preprocessing.
    pub columns_before: usize,
    /// Number of columns after preprocessing.
    pub columns_after: usize,
    /// Final column order of the transformed dataset.
    pub column_order: Vec<String>,
    /// Actions taken, in the order they were applied.
    pub actions: Vec<PreprocessingAction>,
    /// Things the caller should know about but that did not stop the run.
    pub warnings: Vec<String>,
}

impl PreprocessingReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_action(&mut self, action: PreprocessingAction) {
        self.actions.push(action);
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Actions of a single type.
    pub fn actions_of(&self, action_type: ActionType) -> impl Iterator<Item = &PreprocessingAction> {
        self.actions
            .iter()
            .filter(move |a| a.action_type == action_type)
    }

    /// Flatten actions and warnings into display lines.
    pub fn messages(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .actions
            .iter()
            .map(|a| format!("[{}] {}", a.action_type.display_name(), a.description))
            .collect();
        lines.extend(self.warnings.iter().map(|w| format!("[Warning] {}", w)));
        lines
    }
}

/// A single action taken during preprocessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingAction {
    /// Type of action performed.
    pub action_type: ActionType,
    /// Column the action applied to.
    pub target: String,
    /// Human-readable description of the action.
    pub description: String,
    /// Additional details (e.g., generated column names).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl PreprocessingAction {
    pub fn new(
        action_type: ActionType,
        target: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action_type,
            target: target.into(),
            description: description.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Types of actions that can be taken during preprocessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// A column's dtype was coerced to fit its role.
    TypeCoerced,
    /// Missing values were imputed.
    ValueImputed,
    /// Categories were encoded.
    CategoriesEncoded,
    /// Values were scaled.
    DataScaled,
}

impl ActionType {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::TypeCoerced => "Type Coerced",
            Self::ValueImputed => "Value Imputed",
            Self::CategoriesEncoded => "Categories Encoded",
            Self::DataScaled => "Data Scaled",
        }
    }
}
