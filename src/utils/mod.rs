use ndarray::{Array2, ArrayBase, Data, Ix2};

/// Which triangle of a matrix may hold non-zero entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Triangle {
    Upper,
    Lower,
}

/// Structural predicates on dense matrices. All checks are exact: an entry counts as
/// zero only if it compares equal to `0.0`.
pub trait MatrixStructure {
    fn is_square(&self) -> bool;

    fn is_diagonal(&self) -> bool;

    fn is_triangular(&self, triangle: Triangle) -> bool;

    fn is_upper_triangular(&self) -> bool {
        self.is_triangular(Triangle::Upper)
    }

    fn is_lower_triangular(&self) -> bool {
        self.is_triangular(Triangle::Lower)
    }

    /// Product of the main diagonal entries.
    fn diagonal_product(&self) -> f64;
}

impl<S> MatrixStructure for ArrayBase<S, Ix2>
where
    S: Data<Elem = f64>,
{
    fn is_square(&self) -> bool {
        self.nrows() == self.ncols()
    }

    fn is_diagonal(&self) -> bool {
        self.indexed_iter()
            .all(|((i, j), &value)| i == j || value == 0.0)
    }

    fn is_triangular(&self, triangle: Triangle) -> bool {
        match triangle {
            Triangle::Upper => self
                .indexed_iter()
                .all(|((i, j), &value)| i <= j || value == 0.0),
            Triangle::Lower => self
                .indexed_iter()
                .all(|((i, j), &value)| i >= j || value == 0.0),
        }
    }

    fn diagonal_product(&self) -> f64 {
        self.diag().iter().product()
    }
}

/// Applies a plane rotation to columns `i` and `j`:
/// `col_i <- c*col_i + s*col_j`, `col_j <- -s*col_i + c*col_j`.
pub(crate) fn rotate_columns(matrix: &mut Array2<f64>, i: usize, j: usize, c: f64, s: f64) {
    for row in 0..matrix.nrows() {
        let a = matrix[[row, i]];
        let b = matrix[[row, j]];
        matrix[[row, i]] = c * a + s * b;
        matrix[[row, j]] = c * b - s * a;
    }
}

/// Row counterpart of [`rotate_columns`], restricted to columns `from..`.
pub(crate) fn rotate_rows(
    matrix: &mut Array2<f64>,
    i: usize,
    j: usize,
    c: f64,
    s: f64,
    from: usize,
) {
    for col in from..matrix.ncols() {
        let a = matrix[[i, col]];
        let b = matrix[[j, col]];
        matrix[[i, col]] = c * a + s * b;
        matrix[[j, col]] = c * b - s * a;
    }
}
