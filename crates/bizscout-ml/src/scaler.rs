use serde::{Deserialize, Serialize};

use crate::error::MlError;

/// Per-column standardization: `(x - mean) / scale`.
///
/// Columns with zero variance keep a scale of 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    #[allow(clippy::cast_precision_loss)]
    pub fn fit<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, MlError> {
        let first = rows
            .first()
            .ok_or_else(|| MlError::InvalidInput("cannot fit scaler on zero rows".to_string()))?;
        let width = first.as_ref().len();
        let n = rows.len() as f64;

        let mut mean = vec![0.0; width];
        for row in rows {
            let row = check_width(row.as_ref(), width)?;
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut var = vec![0.0; width];
        for row in rows {
            for ((v, x), m) in var.iter_mut().zip(row.as_ref()).zip(&mean) {
                *v += (x - m).powi(2);
            }
        }
        let scale = var
            .into_iter()
            .map(|v| {
                let sd = (v / n).sqrt();
                if sd > f64::EPSILON {
                    sd
                } else {
                    1.0
                }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    pub fn width(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, MlError> {
        let row = check_width(row, self.width())?;
        Ok(row
            .iter()
            .zip(&self.mean)
            .zip(&self.scale)
            .map(|((x, m), s)| (x - m) / s)
            .collect())
    }
}

fn check_width(row: &[f64], expected: usize) -> Result<&[f64], MlError> {
    if row.len() == expected {
        Ok(row)
    } else {
        Err(MlError::FeatureMismatch {
            expected,
            got: row.len(),
        })
    }
}
