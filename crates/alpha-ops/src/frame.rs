//! Conversion between polars frames and panels.
//!
//! A wide frame has an optional `date` column followed by one numeric column
//! per instrument. Nulls become NaN on the way in; NaN is written back as a
//! float value, not a null.

use crate::{OperatorError, Result};
use chrono::NaiveDate;
use ndarray::{Array1, Array2};
use polars::prelude::*;

/// Name of the date label column.
pub const DATE_COLUMN: &str = "date";

// Days between 0001-01-01 and 1970-01-01, the epoch of polars dates.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// A `[dates, instruments]` panel with its row and column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledPanel {
    /// Row labels; empty when the frame had no date column
    pub dates: Vec<NaiveDate>,
    /// Column labels
    pub instruments: Vec<String>,
    /// Panel values, NaN for missing
    pub values: Array2<f64>,
}

impl LabeledPanel {
    /// Same labels with new values of the same shape.
    pub fn with_values(&self, values: Array2<f64>) -> Result<Self> {
        if values.shape() != self.values.shape() {
            return Err(OperatorError::ShapeMismatch {
                left: self.values.shape().to_vec(),
                right: values.shape().to_vec(),
            });
        }
        Ok(Self {
            dates: self.dates.clone(),
            instruments: self.instruments.clone(),
            values,
        })
    }
}

/// Read a wide frame into a labeled panel.
pub fn panel_from_frame(df: &DataFrame) -> Result<LabeledPanel> {
    let height = df.height();
    let mut dates = Vec::new();
    let mut instruments = Vec::new();
    let mut columns = Vec::new();

    for column in df.get_columns() {
        if column.name().as_str() == DATE_COLUMN {
            dates = read_dates(column)?;
        } else {
            instruments.push(column.name().to_string());
            columns.push(read_values(column)?);
        }
    }

    let mut values = Array2::from_elem((height, columns.len()), f64::NAN);
    for (j, col) in columns.into_iter().enumerate() {
        values.column_mut(j).assign(&col);
    }

    tracing::debug!(
        dates = dates.len(),
        instruments = instruments.len(),
        "read panel from frame"
    );
    Ok(LabeledPanel {
        dates,
        instruments,
        values,
    })
}

/// Write a labeled panel back to a wide frame.
pub fn panel_to_frame(panel: &LabeledPanel) -> Result<DataFrame> {
    let (rows, cols) = panel.values.dim();
    if panel.instruments.len() != cols {
        return Err(OperatorError::InvalidFrame(format!(
            "{} instrument labels for {cols} columns",
            panel.instruments.len()
        )));
    }
    if !panel.dates.is_empty() && panel.dates.len() != rows {
        return Err(OperatorError::InvalidFrame(format!(
            "{} date labels for {rows} rows",
            panel.dates.len()
        )));
    }

    let mut columns = Vec::with_capacity(cols + 1);
    if !panel.dates.is_empty() {
        columns.push(Column::new(DATE_COLUMN.into(), panel.dates.clone()));
    }
    for (name, values) in panel.instruments.iter().zip(panel.values.columns()) {
        columns.push(Column::new(name.as_str().into(), values.to_vec()));
    }
    Ok(DataFrame::new(columns)?)
}

fn read_values(column: &Column) -> Result<Array1<f64>> {
    let floats = match column.dtype() {
        DataType::Float64 => column.clone(),
        DataType::Float32
        | DataType::Int64
        | DataType::Int32
        | DataType::Int16
        | DataType::Int8
        | DataType::UInt64
        | DataType::UInt32
        | DataType::UInt16
        | DataType::UInt8 => column.cast(&DataType::Float64)?,
        dt => {
            return Err(OperatorError::InvalidFrame(format!(
                "column `{}` has non-numeric type {dt}",
                column.name()
            )));
        }
    };
    Ok(floats
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

fn read_dates(column: &Column) -> Result<Vec<NaiveDate>> {
    let missing = || OperatorError::InvalidFrame("missing date label".to_string());
    match column.dtype() {
        DataType::Date => {
            let days = column.cast(&DataType::Int32)?;
            days.i32()?
                .into_iter()
                .map(|d| {
                    d.and_then(|d| NaiveDate::from_num_days_from_ce_opt(d + EPOCH_DAYS_FROM_CE))
                        .ok_or_else(missing)
                })
                .collect()
        }
        DataType::String => column
            .str()?
            .into_iter()
            .map(|s| -> Result<NaiveDate> {
                let s = s.ok_or_else(missing)?;
                Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?)
            })
            .collect(),
        dt => Err(OperatorError::InvalidFrame(format!(
            "date column has type {dt}, expected Date or String"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_from_frame_with_string_dates() {
        let df = df![
            "date" => ["2024-01-02", "2024-01-03"],
            "AAPL" => [Some(1.5), None],
            "MSFT" => [3i64, 4],
        ]
        .unwrap();

        let panel = panel_from_frame(&df).unwrap();
        assert_eq!(panel.dates, vec![ymd(2024, 1, 2), ymd(2024, 1, 3)]);
        assert_eq!(panel.instruments, vec!["AAPL", "MSFT"]);
        assert_eq!(panel.values[[0, 0]], 1.5);
        assert!(panel.values[[1, 0]].is_nan());
        assert_eq!(panel.values.column(1).to_vec(), vec![3.0, 4.0]);
    }

    #[test]
    fn test_frame_without_dates() {
        let df = df!["a" => [1.0, 2.0], "b" => [3.0, 4.0]].unwrap();
        let panel = panel_from_frame(&df).unwrap();

        assert!(panel.dates.is_empty());
        assert_eq!(panel.values, arr2(&[[1.0, 3.0], [2.0, 4.0]]));
        let back = panel_to_frame(&panel).unwrap();
        let names: Vec<String> = back.get_columns().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_written_frame_reads_back() {
        let panel = LabeledPanel {
            dates: vec![ymd(2023, 12, 29), ymd(2024, 1, 2)],
            instruments: vec!["x".to_string(), "y".to_string()],
            values: arr2(&[[1.0, f64::NAN], [-2.0, 0.5]]),
        };

        let df = panel_to_frame(&panel).unwrap();
        assert_eq!(df.column(DATE_COLUMN).unwrap().dtype(), &DataType::Date);

        let read = panel_from_frame(&df).unwrap();
        assert_eq!(read.dates, panel.dates);
        assert_eq!(read.instruments, panel.instruments);
        assert!(read.values[[0, 1]].is_nan());
        assert_eq!(read.values[[1, 0]], -2.0);
    }

    #[test]
    fn test_rejects_text_instrument() {
        let df = df!["a" => [1.0], "b" => ["oops"]].unwrap();
        assert!(matches!(
            panel_from_frame(&df),
            Err(OperatorError::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_bad_date_string() {
        let df = df!["date" => ["01/02/2024"], "a" => [1.0]].unwrap();
        assert!(matches!(panel_from_frame(&df), Err(OperatorError::Date(_))));
    }

    #[test]
    fn test_with_values_checks_shape() {
        let panel = LabeledPanel {
            dates: Vec::new(),
            instruments: vec!["a".to_string()],
            values: arr2(&[[1.0]]),
        };
        assert!(panel.with_values(arr2(&[[1.0, 2.0]])).is_err());
        assert_eq!(panel.with_values(arr2(&[[5.0]])).unwrap().values[[0, 0]], 5.0);
    }
}
