//! Configuration types for the preprocessing pipeline.
//!
//! The pipeline is driven by four values: the column roles, the imputation
//! config, the encoding config and the scaling config. [`PipelineConfig`]
//! bundles them and offers a builder with validation, plus loading from a
//! JSON config file whose strategy names are parsed leniently (so
//! `"StandardScaler"`, `"standardize"` and `"Standardize"` all work).

use crate::error::{PrepError, Result, ResultExt};
use crate::pipeline::validation::check_no_duplicates;
use crate::types::ColumnRoles;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Default fill value for constant categorical imputation.
pub const DEFAULT_FILL_VALUE: &str = "missing";

/// Lowercase a strategy name and fold `-` and spaces into `_`.
fn normalize_name(name: &str) -> String {
    name.trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect()
}

/// Strategy for imputing missing numerical values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NumericImputation {
    /// Use the mean of non-missing values
    #[default]
    Mean,
    /// Use the median of non-missing values
    Median,
    /// Leave missing values in place
    None,
}

impl NumericImputation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::None => "none",
        }
    }
}

impl FromStr for NumericImputation {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_name(s).as_str() {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "none" => Ok(Self::None),
            _ => Err(PrepError::UnsupportedStrategy {
                kind: "numerical imputation strategy",
                value: s.to_string(),
                expected: "mean, median, none",
            }),
        }
    }
}

/// Strategy for imputing missing categorical values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalImputation {
    /// Use the most frequent value (mode)
    #[default]
    MostFrequent,
    /// Use the configured fill value
    Constant,
    /// Leave missing values in place
    None,
}

impl CategoricalImputation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MostFrequent => "most_frequent",
            Self::Constant => "constant",
            Self::None => "none",
        }
    }
}

impl FromStr for CategoricalImputation {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_name(s).as_str() {
            "most_frequent" | "mode" => Ok(Self::MostFrequent),
            "constant" => Ok(Self::Constant),
            "none" => Ok(Self::None),
            _ => Err(PrepError::UnsupportedStrategy {
                kind: "categorical imputation strategy",
                value: s.to_string(),
                expected: "most_frequent, constant, none",
            }),
        }
    }
}

/// Method for encoding categorical columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EncodingMethod {
    /// One indicator column per observed category
    OneHot,
    /// Integer code per category, sorted lexicographically
    Label,
    /// Leave columns unchanged
    #[default]
    None,
}

impl EncodingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneHot => "one_hot",
            Self::Label => "label",
            Self::None => "none",
        }
    }
}

impl FromStr for EncodingMethod {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_name(s).as_str() {
            "one_hot" | "onehot" | "one_hot_encode" => Ok(Self::OneHot),
            "label" | "label_encode" => Ok(Self::Label),
            "none" => Ok(Self::None),
            _ => Err(PrepError::UnsupportedStrategy {
                kind: "encoding method",
                value: s.to_string(),
                expected: "one_hot, label, none",
            }),
        }
    }
}

/// Method for scaling numerical columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMethod {
    /// Zero mean, unit (sample) standard deviation
    Standardize,
    /// Linear rescale into [0, 1]
    MinMax,
    /// Leave columns unchanged
    #[default]
    None,
}

impl ScalingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standardize => "standardize",
            Self::MinMax => "min_max",
            Self::None => "none",
        }
    }
}

impl FromStr for ScalingMethod {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_name(s).as_str() {
            "standardize" | "standard" | "standardscaler" | "standard_scaler" | "z_score" => {
                Ok(Self::Standardize)
            }
            "min_max" | "minmax" | "minmaxscaler" | "min_max_scaler" => Ok(Self::MinMax),
            "none" => Ok(Self::None),
            _ => Err(PrepError::UnsupportedStrategy {
                kind: "scaling method",
                value: s.to_string(),
                expected: "standardize, min_max, none",
            }),
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(
    NumericImputation,
    CategoricalImputation,
    EncodingMethod,
    ScalingMethod
);

/// How missing values are filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationConfig {
    /// Strategy applied to every numerical column.
    pub numerical: NumericImputation,
    /// Strategy applied to every categorical column.
    pub categorical: CategoricalImputation,
    /// Value used by [`CategoricalImputation::Constant`].
    pub fill_value: String,
}

impl Default for ImputationConfig {
    fn default() -> Self {
        Self {
            numerical: NumericImputation::default(),
            categorical: CategoricalImputation::default(),
            fill_value: DEFAULT_FILL_VALUE.to_string(),
        }
    }
}

/// Which categorical columns are encoded, and how.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodingConfig {
    pub columns: Vec<String>,
    pub method: EncodingMethod,
}

impl EncodingConfig {
    pub fn new(columns: impl IntoIterator<Item = impl Into<String>>, method: EncodingMethod) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            method,
        }
    }
}

/// Which numerical columns are scaled, and how.
///
/// The columns may include indicator columns produced by one-hot encoding,
/// named `<column>_<category>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalingConfig {
    pub columns: Vec<String>,
    pub method: ScalingMethod,
}

impl ScalingConfig {
    pub fn new(columns: impl IntoIterator<Item = impl Into<String>>, method: ScalingMethod) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            method,
        }
    }
}

/// User adjustments on top of the automatic role detection.
///
/// A role left as `None` keeps the detected columns for that role, minus any
/// column explicitly placed in the other role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleSelection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numerical: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categorical: Option<Vec<String>>,
}

impl RoleSelection {
    /// Resolve the final roles for a dataset.
    pub fn resolve(&self, df: &DataFrame) -> ColumnRoles {
        let detected = ColumnRoles::detect(df);

        let numerical = match &self.numerical {
            Some(cols) => cols.clone(),
            None => exclude(detected.numerical, self.categorical.as_deref()),
        };
        let categorical = match &self.categorical {
            Some(cols) => cols.clone(),
            None => exclude(detected.categorical, self.numerical.as_deref()),
        };

        ColumnRoles::new(numerical, categorical)
    }
}

fn exclude(columns: Vec<String>, excluded: Option<&[String]>) -> Vec<String> {
    match excluded {
        Some(excluded) => columns
            .into_iter()
            .filter(|c| !excluded.contains(c))
            .collect(),
        None => columns,
    }
}

/// Configuration for the preprocessing pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use lex_prep::config::*;
///
/// let config = PipelineConfig::builder()
///     .numeric_imputation(NumericImputation::Median)
///     .encode(["city"], EncodingMethod::OneHot)
///     .scale(["age"], ScalingMethod::Standardize)
///     .build()?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Role adjustments; unset roles come from dtype detection.
    #[serde(default)]
    pub roles: RoleSelection,
    #[serde(default)]
    pub imputation: ImputationConfig,
    #[serde(default)]
    pub encoding: EncodingConfig,
    #[serde(default)]
    pub scaling: ScalingConfig,
}

static_assertions::assert_impl_all!(PipelineConfig: Send, Sync);

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate everything that can be checked without seeing the data.
    pub fn validate(&self) -> Result<()> {
        if let (Some(numerical), Some(categorical)) =
            (&self.roles.numerical, &self.roles.categorical)
            && let Some(col) = numerical.iter().find(|c| categorical.contains(c))
        {
            return Err(PrepError::InvalidConfig(format!(
                "column '{}' is assigned to both the numerical and categorical roles",
                col
            )));
        }

        check_no_duplicates(&self.encoding.columns, "encoding")?;
        check_no_duplicates(&self.scaling.columns, "scaling")?;

        Ok(())
    }

    /// Parse a configuration from the JSON config-file format.
    ///
    /// See [`ConfigFile`] for the accepted keys.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(json)?;
        let config = Self::try_from(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(PrepError::from)
            .context(format!("Failed to read config file {}", path.display()))?;
        Self::from_json_str(&json).context(format!("Invalid config file {}", path.display()))
    }
}

/// On-disk configuration format.
///
/// Strategy names are plain strings so that an unknown name is reported as
/// [`PrepError::UnsupportedStrategy`] rather than a JSON error.
///
/// ```json
/// {
///   "categorical_columns": ["city"],
///   "numeric_imputation": "median",
///   "categorical_imputation": "constant",
///   "fill_value": "unknown",
///   "encode_columns": ["city"],
///   "encoding_method": "one-hot",
///   "scale_columns": ["age", "city_NY"],
///   "scaling_method": "min-max"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub numerical_columns: Option<Vec<String>>,
    pub categorical_columns: Option<Vec<String>>,
    pub numeric_imputation: String,
    pub categorical_imputation: String,
    pub fill_value: String,
    pub encode_columns: Vec<String>,
    pub encoding_method: String,
    pub scale_columns: Vec<String>,
    pub scaling_method: String,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            numerical_columns: None,
            categorical_columns: None,
            numeric_imputation: NumericImputation::default().to_string(),
            categorical_imputation: CategoricalImputation::default().to_string(),
            fill_value: DEFAULT_FILL_VALUE.to_string(),
            encode_columns: Vec::new(),
            encoding_method: EncodingMethod::default().to_string(),
            scale_columns: Vec::new(),
            scaling_method: ScalingMethod::default().to_string(),
        }
    }
}

impl TryFrom<ConfigFile> for PipelineConfig {
    type Error = PrepError;

    fn try_from(file: ConfigFile) -> Result<Self> {
        Ok(Self {
            roles: RoleSelection {
                numerical: file.numerical_columns,
                categorical: file.categorical_columns,
            },
            imputation: ImputationConfig {
                numerical: file.numeric_imputation.parse()?,
                categorical: file.categorical_imputation.parse()?,
                fill_value: file.fill_value,
            },
            encoding: EncodingConfig {
                columns: file.encode_columns,
                method: file.encoding_method.parse()?,
            },
            scaling: ScalingConfig {
                columns: file.scale_columns,
                method: file.scaling_method.parse()?,
            },
        })
    }
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    numerical_columns: Option<Vec<String>>,
    categorical_columns: Option<Vec<String>>,
    numeric_imputation: Option<NumericImputation>,
    categorical_imputation: Option<CategoricalImputation>,
    fill_value: Option<String>,
    encoding: Option<EncodingConfig>,
    scaling: Option<ScalingConfig>,
}

impl PipelineConfigBuilder {
    /// Override the detected numerical columns.
    pub fn numerical_columns(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.numerical_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Override the detected categorical columns.
    pub fn categorical_columns(
        mut self,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.categorical_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the numerical imputation strategy.
    pub fn numeric_imputation(mut self, strategy: NumericImputation) -> Self {
        self.numeric_imputation = Some(strategy);
        self
    }

    /// Set the categorical imputation strategy.
    pub fn categorical_imputation(mut self, strategy: CategoricalImputation) -> Self {
        self.categorical_imputation = Some(strategy);
        self
    }

    /// Set the value used by constant categorical imputation.
    pub fn fill_value(mut self, value: impl Into<String>) -> Self {
        self.fill_value = Some(value.into());
        self
    }

    /// Encode the given categorical columns.
    pub fn encode(
        mut self,
        columns: impl IntoIterator<Item = impl Into<String>>,
        method: EncodingMethod,
    ) -> Self {
        self.encoding = Some(EncodingConfig::new(columns, method));
        self
    }

    /// Scale the given numerical (or one-hot indicator) columns.
    pub fn scale(
        mut self,
        columns: impl IntoIterator<Item = impl Into<String>>,
        method: ScalingMethod,
    ) -> Self {
        self.scaling = Some(ScalingConfig::new(columns, method));
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig> {
        let config = PipelineConfig {
            roles: RoleSelection {
                numerical: self.numerical_columns,
                categorical: self.categorical_columns,
            },
            imputation: ImputationConfig {
                numerical: self.numeric_imputation.unwrap_or_default(),
                categorical: self.categorical_imputation.unwrap_or_default(),
                fill_value: self
                    .fill_value
                    .unwrap_or_else(|| DEFAULT_FILL_VALUE.to_string()),
            },
            encoding: self.encoding.unwrap_or_default(),
            scaling: self.scaling.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use polars::prelude::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.imputation.numerical, NumericImputation::Mean);
        assert_eq!(
            config.imputation.categorical,
            CategoricalImputation::MostFrequent
        );
        assert_eq!(config.imputation.fill_value, "missing");
        assert_eq!(config.encoding.method, EncodingMethod::None);
        assert_eq!(config.scaling.method, ScalingMethod::None);
    }

    #[test]
    fn test_strategy_aliases() {
        assert_eq!("Mean".parse::<NumericImputation>().unwrap(), NumericImputation::Mean);
        assert_eq!("None".parse::<NumericImputation>().unwrap(), NumericImputation::None);
        assert_eq!(
            "mode".parse::<CategoricalImputation>().unwrap(),
            CategoricalImputation::MostFrequent
        );
        assert_eq!(
            "One-Hot Encode".parse::<EncodingMethod>().unwrap(),
            EncodingMethod::OneHot
        );
        assert_eq!(
            "Label Encode".parse::<EncodingMethod>().unwrap(),
            EncodingMethod::Label
        );
        assert_eq!(
            "StandardScaler".parse::<ScalingMethod>().unwrap(),
            ScalingMethod::Standardize
        );
        assert_eq!(
            "min-max".parse::<ScalingMethod>().unwrap(),
            ScalingMethod::MinMax
        );
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let err = "knn".parse::<NumericImputation>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedStrategy);
        assert!(err.to_string().contains("knn"));

        let err = "robust".parse::<ScalingMethod>().unwrap_err();
        assert!(matches!(
            err,
            PrepError::UnsupportedStrategy { kind: "scaling method", .. }
        ));
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for method in [ScalingMethod::Standardize, ScalingMethod::MinMax, ScalingMethod::None] {
            assert_eq!(method.to_string().parse::<ScalingMethod>().unwrap(), method);
        }
        for method in [EncodingMethod::OneHot, EncodingMethod::Label, EncodingMethod::None] {
            assert_eq!(method.to_string().parse::<EncodingMethod>().unwrap(), method);
        }
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PipelineConfig::builder()
            .numeric_imputation(NumericImputation::Median)
            .categorical_imputation(CategoricalImputation::Constant)
            .fill_value("unknown")
            .encode(["city"], EncodingMethod::Label)
            .scale(["age"], ScalingMethod::MinMax)
            .build()
            .unwrap();

        assert_eq!(config.imputation.numerical, NumericImputation::Median);
        assert_eq!(config.imputation.fill_value, "unknown");
        assert_eq!(config.encoding.columns, vec!["city".to_string()]);
        assert_eq!(config.scaling.method, ScalingMethod::MinMax);
    }

    #[test]
    fn test_validation_rejects_overlapping_roles() {
        let err = PipelineConfig::builder()
            .numerical_columns(["age", "zip"])
            .categorical_columns(["zip"])
            .build()
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("zip"));
    }

    #[test]
    fn test_validation_rejects_duplicate_columns() {
        let err = PipelineConfig::builder()
            .scale(["age", "age"], ScalingMethod::Standardize)
            .build()
            .unwrap_err();
        assert!(matches!(err, PrepError::InvalidConfig(_)));
    }

    #[test]
    fn test_role_selection_overrides_detection() {
        let df = df![
            "age" => [25i64, 30, 35],
            "zip" => [10001i64, 90001, 10001],
            "city" => ["NY", "LA", "NY"],
        ]
        .unwrap();

        let detected = RoleSelection::default().resolve(&df);
        assert_eq!(detected.numerical, vec!["age", "zip"]);
        assert_eq!(detected.categorical, vec!["city"]);

        // Moving zip to categorical drops it from the detected numerical role
        let adjusted = RoleSelection {
            numerical: None,
            categorical: Some(vec!["city".to_string(), "zip".to_string()]),
        }
        .resolve(&df);
        assert_eq!(adjusted.numerical, vec!["age"]);
        assert_eq!(adjusted.categorical, vec!["city", "zip"]);
    }

    #[test]
    fn test_pipeline_config_from_json() {
        let json = r#"{
            "categorical_columns": ["city"],
            "numeric_imputation": "median",
            "categorical_imputation": "constant",
            "fill_value": "unknown",
            "encode_columns": ["city"],
            "encoding_method": "One-Hot Encode",
            "scale_columns": ["age"],
            "scaling_method": "MinMaxScaler"
        }"#;

        let config = PipelineConfig::from_json_str(json).expect("valid config file");

        assert_eq!(config.roles.numerical, None);
        assert_eq!(config.roles.categorical, Some(vec!["city".to_string()]));
        assert_eq!(config.imputation.numerical, NumericImputation::Median);
        assert_eq!(config.imputation.categorical, CategoricalImputation::Constant);
        assert_eq!(config.imputation.fill_value, "unknown");
        assert_eq!(config.encoding.method, EncodingMethod::OneHot);
        assert_eq!(config.scaling.method, ScalingMethod::MinMax);
    }

    #[test]
    fn test_config_file_unknown_strategy() {
        let err = PipelineConfig::from_json_str(r#"{"scaling_method": "log"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedStrategy);
    }

    #[test]
    fn test_config_file_unknown_key() {
        let err = PipelineConfig::from_json_str(r#"{"scaler": "standardize"}"#).unwrap_err();
        assert!(matches!(err, PrepError::Json(_)));
    }

    #[test]
    fn test_config_serialization() {
        let config = PipelineConfig::builder()
            .encode(["city"], EncodingMethod::OneHot)
            .build()
            .unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"one_hot\""));
        let deserialized: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
