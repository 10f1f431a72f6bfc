//! JSON-friendly representation of a DataFrame.

use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Values of one column, tagged with their dtype.
///
/// Narrow integer dtypes other than `Int32` widen to `Int64`, `Float32`
/// widens to `Float64`, and any other dtype is stored as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dtype", content = "values", rename_all = "snake_case")]
pub enum ColumnValues {
    Float64(Vec<Option<f64>>),
    Int32(Vec<Option<i32>>),
    Int64(Vec<Option<i64>>),
    Boolean(Vec<Option<bool>>),
    String(Vec<Option<String>>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedColumn {
    pub name: String,
    #[serde(flatten)]
    pub values: ColumnValues,
}

/// A dataset as plain column vectors, in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerializedTable {
    pub columns: Vec<SerializedColumn>,
}

impl SerializedTable {
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let columns = df
            .get_columns()
            .iter()
            .map(|column| {
                let series = column.as_materialized_series();
                Ok(SerializedColumn {
                    name: series.name().to_string(),
                    values: column_values(series)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { columns })
    }

    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let columns: Vec<Column> = self
            .columns
            .iter()
            .map(|c| {
                let name: PlSmallStr = c.name.as_str().into();
                let series = match &c.values {
                    ColumnValues::Float64(v) => Series::new(name, v),
                    ColumnValues::Int32(v) => Series::new(name, v),
                    ColumnValues::Int64(v) => Series::new(name, v),
                    ColumnValues::Boolean(v) => Series::new(name, v),
                    ColumnValues::String(v) => Series::new(name, v),
                };
                Column::from(series)
            })
            .collect();
        Ok(DataFrame::new(columns)?)
    }

    pub fn height(&self) -> usize {
        self.columns.first().map_or(0, |c| match &c.values {
            ColumnValues::Float64(v) => v.len(),
            ColumnValues::Int32(v) => v.len(),
            ColumnValues::Int64(v) => v.len(),
            ColumnValues::Boolean(v) => v.len(),
            ColumnValues::String(v) => v.len(),
        })
    }
}

fn column_values(series: &Series) -> Result<ColumnValues> {
    let values = match series.dtype() {
        DataType::Int32 => ColumnValues::Int32(series.i32()?.into_iter().collect()),
        DataType::Int8 | DataType::Int16 | DataType::Int64 | DataType::UInt8 | DataType::UInt16
        | DataType::UInt32 | DataType::UInt64 => {
            let cast = series.cast(&DataType::Int64)?;
            ColumnValues::Int64(cast.i64()?.into_iter().collect())
        }
        DataType::Float32 | DataType::Float64 => {
            let cast = series.cast(&DataType::Float64)?;
            ColumnValues::Float64(cast.f64()?.into_iter().collect())
        }
        DataType::Boolean => ColumnValues::Boolean(series.bool()?.into_iter().collect()),
        _ => {
            let cast = series.cast(&DataType::String)?;
            ColumnValues::String(
                cast.str()?
                    .into_iter()
                    .map(|v| v.map(str::to_string))
                    .collect(),
            )
        }
    };
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_table_roundtrip() {
        let df = df![
            "age" => [Some(-1.0), None, Some(1.0)],
            "city_LA" => [0i32, 1, 0],
            "code" => [Some(2i64), None, Some(0)],
            "member" => [true, false, true],
            "id" => [Some("a"), Some("b"), None],
        ]
        .unwrap();

        let table = SerializedTable::from_dataframe(&df).unwrap();
        assert_eq!(table.height(), 3);

        let json = serde_json::to_string(&table).unwrap();
        let restored: SerializedTable = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, table);
        assert!(restored.to_dataframe().unwrap().equals_missing(&df));
    }

    #[test]
    fn test_column_json_shape() {
        let df = df!["city_NY" => [1i32, 0]].unwrap();
        let table = SerializedTable::from_dataframe(&df).unwrap();
        let json = serde_json::to_value(&table).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "columns": [{ "name": "city_NY", "dtype": "int32", "values": [1, 0] }]
            })
        );
    }
}
