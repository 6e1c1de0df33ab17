// crates/gliderproc-core/src/timeseries.rs

use polars::prelude::*;

use crate::error::{ProcessingError, Result};

/// Co-indexed named vectors over the master time base, backed by an eager
/// DataFrame of Float64 columns with NaN as the missing-value sentinel.
///
/// Every row operation (retain, reorder) goes through this wrapper and applies to
/// all fields at once, so the co-indexing invariant holds by construction.
#[derive(Debug, Clone, Default)]
pub struct TimeSeries {
    df: DataFrame,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self {
            df: DataFrame::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.df.get_columns().iter().any(|c| c.name().as_str() == name)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.df
            .get_columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Adds or replaces a field. The vector length must match the series length.
    pub fn set(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if self.df.get_columns().is_empty() {
            self.df = DataFrame::new(vec![Series::new(name.into(), values).into()])?;
            return Ok(());
        }
        if values.len() != self.df.height() {
            return Err(ProcessingError::LengthMismatch {
                column: name.to_string(),
                expected: self.df.height(),
                found: values.len(),
            });
        }
        self.df.with_column(Series::new(name.into(), values))?;
        Ok(())
    }

    /// Extracts a field as a plain vector; null slots (none are produced by this
    /// crate, but polars permits them) come back as NaN.
    pub fn values(&self, name: &str) -> Result<Vec<f64>> {
        let column = self
            .df
            .column(name)
            .map_err(|_| ProcessingError::MissingField(name.to_string()))?;
        let chunked = column.f64()?;
        Ok((0..chunked.len())
            .map(|idx| chunked.get(idx).unwrap_or(f64::NAN))
            .collect())
    }

    pub fn values_opt(&self, name: &str) -> Option<Vec<f64>> {
        self.values(name).ok()
    }

    pub fn remove(&mut self, name: &str) -> Result<()> {
        if self.contains(name) {
            self.df = self.df.drop(name)?;
        }
        Ok(())
    }

    /// Keeps only the rows flagged true, uniformly across every field.
    /// Returns the number of rows dropped.
    pub fn retain(&mut self, keep: &[bool]) -> Result<usize> {
        if keep.len() != self.df.height() {
            return Err(ProcessingError::LengthMismatch {
                column: "retain mask".to_string(),
                expected: self.df.height(),
                found: keep.len(),
            });
        }
        let mask = BooleanChunked::from_slice("keep".into(), keep);
        let before = self.df.height();
        self.df = self.df.filter(&mask)?;
        Ok(before - self.df.height())
    }

    /// Reorders every field by the given row permutation.
    pub fn reorder(&mut self, order: &[usize]) -> Result<()> {
        if order.len() != self.df.height() {
            return Err(ProcessingError::LengthMismatch {
                column: "reorder permutation".to_string(),
                expected: self.df.height(),
                found: order.len(),
            });
        }
        let indices: Vec<IdxSize> = order.iter().map(|&idx| idx as IdxSize).collect();
        let idx = IdxCa::from_vec("order".into(), indices);
        self.df = self.df.take(&idx)?;
        Ok(())
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }
}
