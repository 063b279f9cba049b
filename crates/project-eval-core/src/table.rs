//! Named result tables and the ordered result set the engine returns.

use std::collections::HashSet;

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::ProjectEvalError;
use crate::period::{PeriodSeries, TimeHorizon};
use crate::types::Money;
use crate::ProjectEvalResult;

/// Marker rendered for a metric that could not be computed.
pub const NOT_AVAILABLE: &str = "N/A";

/// One cell of a result table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Value(Decimal),
    Text(String),
    NotAvailable,
}

impl Cell {
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Cell::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, Cell::NotAvailable)
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Value(v) => Serialize::serialize(v, serializer),
            Cell::Text(t) => serializer.serialize_str(t),
            Cell::NotAvailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

impl From<Decimal> for Cell {
    fn from(v: Decimal) -> Self {
        Cell::Value(v)
    }
}

impl From<Option<Decimal>> for Cell {
    fn from(v: Option<Decimal>) -> Self {
        v.map(Cell::Value).unwrap_or(Cell::NotAvailable)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub label: String,
    pub cells: Vec<Cell>,
}

/// A named table: one row per line item, one column per period label (or
/// per fixed heading for summary tables).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl ResultTable {
    /// Empty table whose columns are the horizon's period labels.
    pub fn periodic(name: &str, horizon: &TimeHorizon) -> Self {
        Self::with_columns(name, horizon.labels())
    }

    pub fn with_columns(name: &str, columns: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_series(&mut self, label: &str, series: &PeriodSeries) -> ProjectEvalResult<()> {
        self.push_row(label, series.iter().copied().map(Cell::Value).collect())
    }

    pub fn push_values(&mut self, label: &str, values: &[Money]) -> ProjectEvalResult<()> {
        self.push_row(label, values.iter().copied().map(Cell::Value).collect())
    }

    /// Append a row, enforcing one cell per column and unique labels.
    pub fn push_row(&mut self, label: &str, cells: Vec<Cell>) -> ProjectEvalResult<()> {
        if cells.len() != self.columns.len() {
            return Err(ProjectEvalError::invalid(
                format!("{}.{label}", self.name),
                format!(
                    "Row has {} cells for {} columns",
                    cells.len(),
                    self.columns.len()
                ),
            ));
        }
        if self.row(label).is_some() {
            return Err(ProjectEvalError::invalid(
                format!("{}.{label}", self.name),
                "Duplicate row label",
            ));
        }
        self.rows.push(TableRow {
            label: label.to_string(),
            cells,
        });
        Ok(())
    }

    pub fn row(&self, label: &str) -> Option<&TableRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    pub fn value(&self, row: &str, column: &str) -> Option<Decimal> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.row(row)?.cells.get(col)?.as_decimal()
    }

    pub fn cell(&self, row: &str, column: &str) -> Option<&Cell> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.row(row)?.cells.get(col)
    }

    pub fn is_rectangular(&self) -> bool {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .all(|r| r.cells.len() == self.columns.len() && seen.insert(r.label.as_str()))
    }
}

/// Ordered mapping from stable table name to table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet(IndexMap<String, ResultTable>);

impl ResultSet {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn insert(&mut self, table: ResultTable) {
        self.0.insert(table.name.clone(), table);
    }

    pub fn get(&self, name: &str) -> Option<&ResultTable> {
        self.0.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn tables(&self) -> impl Iterator<Item = &ResultTable> {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keep only the named tables, in the order given.
    pub fn select(&self, names: &[String]) -> ProjectEvalResult<ResultSet> {
        let mut selected = ResultSet::new();
        for name in names {
            let table = self.get(name).ok_or_else(|| {
                ProjectEvalError::invalid("table", format!("Unknown table '{name}'"))
            })?;
            selected.insert(table.clone());
        }
        Ok(selected)
    }

    /// Round every numeric cell to `dp` decimal places.
    pub fn rounded(&self, dp: u32) -> ResultSet {
        let mut out = self.clone();
        for table in out.0.values_mut() {
            for row in &mut table.rows {
                for cell in &mut row.cells {
                    if let Cell::Value(v) = cell {
                        *v = v.round_dp(dp);
                    }
                }
            }
        }
        out
    }
}
