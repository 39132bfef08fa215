//! Column checks against the schema config.

use crate::config::SchemaConfig;
use crate::utils::is_numeric_dtype;
use polars::prelude::{DataFrame, DataType};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Storage a declared `columns` dtype requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeclaredKind {
    Numeric,
    Text,
}

/// Unrecognised dtype names are not type-checked.
fn declared_kind(dtype: &str) -> Option<DeclaredKind> {
    match dtype.to_ascii_lowercase().as_str() {
        "int" | "int32" | "int64" | "integer" | "float" | "float32" | "float64" | "number" => {
            Some(DeclaredKind::Numeric)
        }
        "category" | "object" | "str" | "string" => Some(DeclaredKind::Text),
        _ => None,
    }
}

fn has_kind(dtype: &DataType, kind: DeclaredKind) -> bool {
    match kind {
        DeclaredKind::Numeric => is_numeric_dtype(dtype),
        DeclaredKind::Text => matches!(dtype, DataType::String) || dtype.is_categorical(),
    }
}

/// True when the frame has exactly as many columns as the schema declares.
pub fn validate_column_count(df: &DataFrame, schema: &SchemaConfig) -> bool {
    df.width() == schema.column_count()
}

fn all_present(df: &DataFrame, columns: &[String], group: &str) -> bool {
    let mut status = true;
    for column in columns {
        if df.get_column_index(column).is_none() {
            info!("{} column - {} not found in dataframe", group, column);
            status = false;
        }
    }
    status
}

/// True when every column listed under `columns` is present.
pub fn declared_columns_exist(df: &DataFrame, schema: &SchemaConfig) -> bool {
    all_present(df, &schema.column_names(), "Declared")
}

/// True when every present declared column is stored with its declared type.
///
/// Numeric dtypes (`int`, `float`) need an integer or float column;
/// `category`/`object` need a string column. Missing columns are left to
/// [`declared_columns_exist`].
pub fn column_types_match(df: &DataFrame, schema: &SchemaConfig) -> bool {
    let mut status = true;
    for (name, declared) in schema.columns.iter().flatten() {
        let (Ok(column), Some(kind)) = (df.column(name), declared_kind(declared)) else {
            continue;
        };
        if !has_kind(column.dtype(), kind) {
            info!(
                "Column - {} is stored as {} but declared {}",
                name,
                column.dtype(),
                declared
            );
            status = false;
        }
    }
    status
}

/// True when every declared numerical column is present.
pub fn numerical_columns_exist(df: &DataFrame, schema: &SchemaConfig) -> bool {
    all_present(df, &schema.numerical_columns, "Numerical")
}

/// True when every declared categorical column is present.
pub fn categorical_columns_exist(df: &DataFrame, schema: &SchemaConfig) -> bool {
    all_present(df, &schema.categorical_columns, "Categorical")
}

/// Schema checks of one split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitChecks {
    pub column_count: bool,
    pub declared_columns: bool,
    pub column_types: bool,
    pub numerical_columns: bool,
    pub categorical_columns: bool,
}

impl SplitChecks {
    pub fn run(df: &DataFrame, schema: &SchemaConfig) -> Self {
        Self {
            column_count: validate_column_count(df, schema),
            declared_columns: declared_columns_exist(df, schema),
            column_types: column_types_match(df, schema),
            numerical_columns: numerical_columns_exist(df, schema),
            categorical_columns: categorical_columns_exist(df, schema),
        }
    }

    /// A split with every check passed.
    pub fn passing() -> Self {
        Self {
            column_count: true,
            declared_columns: true,
            column_types: true,
            numerical_columns: true,
            categorical_columns: true,
        }
    }

    pub fn passed(&self) -> bool {
        self.column_count
            && self.declared_columns
            && self.column_types
            && self.numerical_columns
            && self.categorical_columns
    }

    /// Names of the failed checks.
    pub fn failures(&self) -> Vec<&'static str> {
        [
            (self.column_count, "column count"),
            (self.declared_columns, "declared columns"),
            (self.column_types, "column types"),
            (self.numerical_columns, "numerical columns"),
            (self.categorical_columns, "categorical columns"),
        ]
        .into_iter()
        .filter(|(ok, _)| !ok)
        .map(|(_, name)| name)
        .collect()
    }
}
