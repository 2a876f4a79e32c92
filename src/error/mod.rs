use thiserror::Error;

/// Errors raised by the decomposition routines.
///
/// Every error is raised at the point of detection and returned to the direct caller,
/// nothing in this crate retries or recovers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinalgError {
    #[error("Matrix with {rows} rows and {cols} cols is empty")]
    EmptyMatrix { rows: usize, cols: usize },

    #[error("Matrix with {rows} rows and {cols} cols is not square")]
    NotSquare { rows: usize, cols: usize },

    #[error("Parameter `{name}` must be within [{min}, {max}], got {value}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Number of components must be within [1, {max}], got {ncomp}")]
    InvalidComponents { ncomp: usize, max: usize },

    #[error("SVD did not converge after {sweeps} sweeps")]
    NoConvergence { sweeps: usize },

    #[error("Matrix is singular")]
    Singular,
}

pub type Result<T> = std::result::Result<T, LinalgError>;

pub(crate) fn check_non_empty(rows: usize, cols: usize) -> Result<()> {
    if rows == 0 || cols == 0 {
        return Err(LinalgError::EmptyMatrix { rows, cols });
    }
    Ok(())
}

pub(crate) fn check_range(name: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
    if !(min..=max).contains(&value) {
        return Err(LinalgError::InvalidParameter {
            name,
            value,
            min,
            max,
        });
    }
    Ok(())
}

pub(crate) fn check_components(ncomp: usize, max: usize) -> Result<()> {
    if ncomp == 0 || ncomp > max {
        return Err(LinalgError::InvalidComponents { ncomp, max });
    }
    Ok(())
}
