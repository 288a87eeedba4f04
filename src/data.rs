//! # Input matrix
//!
//! The engine works on a row-major numeric view of the input plus one type tag
//! per column. Reading CSV/JSON files is left to the caller; this module only
//! turns string cells and type names into that view.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::error::{MoebaError, Result};

/// Declared type of an input column.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    String,
    Integer,
    Float,
    Boolean,
}

impl ColumnType {
    /// Parses a type name as found in column-type sidecar files.
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "string" | "str" => Ok(ColumnType::String),
            "int" | "integer" => Ok(ColumnType::Integer),
            "float" | "double" | "float64" => Ok(ColumnType::Float),
            "bool" | "boolean" => Ok(ColumnType::Boolean),
            other => Err(MoebaError::Data(format!(
                "unsupported column type: {}",
                other
            ))),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}

/// Resolves a name→type map into per-column types, in column order.
pub fn column_types_from_map(
    column_names: &[String],
    types: &HashMap<String, String>,
) -> Result<Vec<ColumnType>> {
    column_names
        .iter()
        .map(|name| {
            let raw = types
                .get(name)
                .ok_or_else(|| MoebaError::Data(format!("missing type for column {}", name)))?;
            ColumnType::parse(raw)
        })
        .collect()
}

/// Row-major numeric matrix with per-column type tags.
#[derive(Debug, Clone, PartialEq)]
pub struct DataMatrix {
    values: Vec<Vec<f64>>,
    types: Vec<ColumnType>,
}

impl DataMatrix {
    /// Wraps an already numeric matrix.
    pub fn new(values: Vec<Vec<f64>>, types: Vec<ColumnType>) -> Result<Self> {
        let num_cols = values.first().map_or(0, Vec::len);
        if values.is_empty() || num_cols == 0 {
            return Err(MoebaError::Data("the input matrix is empty".to_string()));
        }
        if let Some(i) = values.iter().position(|row| row.len() != num_cols) {
            return Err(MoebaError::Data(format!(
                "row {} has {} columns, expected {}",
                i,
                values[i].len(),
                num_cols
            )));
        }
        if types.len() != num_cols {
            return Err(MoebaError::Data(format!(
                "{} column types given for {} columns",
                types.len(),
                num_cols
            )));
        }
        Ok(Self { values, types })
    }

    /// Numeric matrix where every column is a float column.
    pub fn numeric(values: Vec<Vec<f64>>) -> Result<Self> {
        let num_cols = values.first().map_or(0, Vec::len);
        Self::new(values, vec![ColumnType::Float; num_cols])
    }

    /// Converts string cells column by column.
    ///
    /// Numeric columns are parsed, boolean columns map `"yes"` to 1.0 and
    /// anything else to 0.0, and string columns become category indices in
    /// order of first appearance.
    pub fn from_strings(cells: &[Vec<String>], types: Vec<ColumnType>) -> Result<Self> {
        let num_rows = cells.len();
        let num_cols = types.len();
        if let Some(i) = cells.iter().position(|row| row.len() != num_cols) {
            return Err(MoebaError::Data(format!(
                "row {} has {} cells, expected {}",
                i,
                cells[i].len(),
                num_cols
            )));
        }

        let columns: Vec<Vec<f64>> = types
            .par_iter()
            .enumerate()
            .map(|(j, column_type)| convert_column(cells, j, *column_type))
            .collect::<Result<_>>()?;

        let values = (0..num_rows)
            .map(|i| columns.iter().map(|column| column[i]).collect())
            .collect();
        Self::new(values, types)
    }

    pub fn num_rows(&self) -> usize {
        self.values.len()
    }

    pub fn num_cols(&self) -> usize {
        self.types.len()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row][col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row]
    }

    pub fn types(&self) -> &[ColumnType] {
        &self.types
    }

    pub fn all_numeric(&self) -> bool {
        self.types.iter().all(ColumnType::is_numeric)
    }
}

fn convert_column(cells: &[Vec<String>], col: usize, column_type: ColumnType) -> Result<Vec<f64>> {
    match column_type {
        ColumnType::Integer | ColumnType::Float => cells
            .iter()
            .map(|row| {
                row[col].trim().parse::<f64>().map_err(|e| {
                    MoebaError::Data(format!("column {}: {:?} is not numeric: {}", col, row[col], e))
                })
            })
            .collect(),
        ColumnType::Boolean => Ok(cells
            .iter()
            .map(|row| {
                if row[col].trim().eq_ignore_ascii_case("yes") {
                    1.0
                } else {
                    0.0
                }
            })
            .collect()),
        ColumnType::String => {
            let mut categories: HashMap<&str, f64> = HashMap::new();
            Ok(cells
                .iter()
                .map(|row| {
                    let next = categories.len() as f64;
                    *categories.entry(row[col].as_str()).or_insert(next)
                })
                .collect())
        }
    }
}
