//! Dense time-series table: rows are time steps, columns are quantities.
//!
//! Storage is column-major so that columns can be added, removed and renamed
//! while the network is being assembled.

use std::collections::HashMap;

use mc_core::{McError, McResult, Real};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    times: Vec<Real>,
    names: Vec<String>,
    index: HashMap<String, usize>,
    columns: Vec<Vec<Real>>,
}

impl DataTable {
    /// Create an empty table with the given time axis.
    pub fn new(times: Vec<Real>) -> Self {
        Self {
            times,
            ..Self::default()
        }
    }

    /// Rebuild a table from stored parts (e.g. when loading a persisted run).
    pub fn from_parts(
        times: Vec<Real>,
        names: Vec<String>,
        columns: Vec<Vec<Real>>,
    ) -> McResult<Self> {
        if names.len() != columns.len() {
            return Err(McError::IndexOob {
                what: "column names",
                index: names.len(),
                len: columns.len(),
            });
        }
        let mut table = Self::new(times);
        for (name, column) in names.into_iter().zip(columns) {
            if column.len() != table.n_rows() {
                return Err(McError::IndexOob {
                    what: "column length",
                    index: column.len(),
                    len: table.n_rows(),
                });
            }
            if table.index.contains_key(&name) {
                return Err(McError::InvalidArg {
                    what: "duplicate column name",
                });
            }
            table.index.insert(name.clone(), table.names.len());
            table.names.push(name);
            table.columns.push(column);
        }
        Ok(table)
    }

    pub fn n_rows(&self) -> usize {
        self.times.len()
    }

    pub fn n_cols(&self) -> usize {
        self.names.len()
    }

    pub fn times(&self) -> &[Real] {
        &self.times
    }

    /// Column names in column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn column(&self, col: usize) -> &[Real] {
        &self.columns[col]
    }

    pub fn column_mut(&mut self, col: usize) -> &mut [Real] {
        &mut self.columns[col]
    }

    pub fn column_by_name(&self, name: &str) -> Option<&[Real]> {
        self.column_index(name).map(|c| self.columns[c].as_slice())
    }

    pub fn get(&self, row: usize, col: usize) -> Real {
        self.columns[col][row]
    }

    pub fn set(&mut self, row: usize, col: usize, value: Real) {
        self.columns[col][row] = value;
    }

    /// Copy one row into `out` (length must equal `n_cols`).
    pub fn read_row(&self, row: usize, out: &mut [Real]) {
        for (slot, column) in out.iter_mut().zip(&self.columns) {
            *slot = column[row];
        }
    }

    pub fn row(&self, row: usize) -> Vec<Real> {
        let mut out = vec![0.0; self.n_cols()];
        self.read_row(row, &mut out);
        out
    }

    /// Overwrite one row from `values` (length must equal `n_cols`).
    pub fn write_row(&mut self, row: usize, values: &[Real]) {
        for (column, &v) in self.columns.iter_mut().zip(values) {
            column[row] = v;
        }
    }

    /// Keep only the first `n_rows` rows.
    pub fn truncate(&mut self, n_rows: usize) {
        self.times.truncate(n_rows);
        for column in &mut self.columns {
            column.truncate(n_rows);
        }
    }

    /// Append a zero-filled column and return its index.
    pub(crate) fn add_column(&mut self, name: &str) -> usize {
        let col = self.names.len();
        self.index.insert(name.to_string(), col);
        self.names.push(name.to_string());
        self.columns.push(vec![0.0; self.times.len()]);
        col
    }

    /// Remove a column, shifting later columns left.
    pub(crate) fn remove_column(&mut self, name: &str) -> Option<Vec<Real>> {
        let col = self.index.remove(name)?;
        self.names.remove(col);
        let data = self.columns.remove(col);
        for (i, n) in self.names.iter().enumerate().skip(col) {
            self.index.insert(n.clone(), i);
        }
        Some(data)
    }

    pub(crate) fn rename_column(&mut self, old: &str, new: &str) {
        if let Some(col) = self.index.remove(old) {
            self.names[col] = new.to_string();
            self.index.insert(new.to_string(), col);
        }
    }

    /// Replace the time axis and zero every column to the new length.
    pub(crate) fn reset(&mut self, times: Vec<Real>) {
        let n = times.len();
        self.times = times;
        for column in &mut self.columns {
            column.clear();
            column.resize(n, 0.0);
        }
    }
}
