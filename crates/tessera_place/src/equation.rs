//! Sparse symmetric linear system `A x = b` with a conjugate gradient solver.
//!
//! Coefficients are stored per column as `(row, value)` pairs sorted by row,
//! which keeps repeated stamping into the same entry cheap and makes the
//! matrix-vector product a straight walk over the columns.

/// A sparse symmetric positive semi-definite system for one axis.
#[derive(Debug, Clone, Default)]
pub struct EquationSystem {
    columns: Vec<Vec<(usize, f64)>>,
    rhs: Vec<f64>,
}

impl EquationSystem {
    /// Creates a zeroed `rows x cols` system.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            columns: vec![Vec::new(); cols],
            rhs: vec![0.0; rows],
        }
    }

    /// Clears all coefficients and the right-hand side, keeping the dimensions.
    pub fn reset(&mut self) {
        self.columns.iter_mut().for_each(Vec::clear);
        self.rhs.iter_mut().for_each(|v| *v = 0.0);
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rhs.len()
    }

    /// Adds `value` to entry `(row, col)`.
    pub fn add_coeff(&mut self, row: usize, col: usize, value: f64) {
        let column = &mut self.columns[col];
        match column.binary_search_by_key(&row, |&(r, _)| r) {
            Ok(i) => column[i].1 += value,
            Err(i) => column.insert(i, (row, value)),
        }
    }

    /// Adds `value` to the right-hand side of `row`.
    pub fn add_rhs(&mut self, row: usize, value: f64) {
        self.rhs[row] += value;
    }

    /// Current value of entry `(row, col)`.
    pub fn coeff(&self, row: usize, col: usize) -> f64 {
        let column = &self.columns[col];
        column
            .binary_search_by_key(&row, |&(r, _)| r)
            .map_or(0.0, |i| column[i].1)
    }

    /// Current right-hand side of `row`.
    pub fn rhs(&self, row: usize) -> f64 {
        self.rhs[row]
    }

    fn multiply(&self, x: &[f64], out: &mut [f64]) {
        out.iter_mut().for_each(|v| *v = 0.0);
        for (col, entries) in self.columns.iter().enumerate() {
            let xc = x[col];
            for &(row, value) in entries {
                out[row] += value * xc;
            }
        }
    }

    fn inverse_diagonal(&self) -> Vec<f64> {
        (0..self.rows())
            .map(|i| {
                let d = if i < self.columns.len() { self.coeff(i, i) } else { 0.0 };
                if d != 0.0 {
                    1.0 / d
                } else {
                    1.0
                }
            })
            .collect()
    }

    /// Solves the system in place, starting from the current contents of `x`.
    ///
    /// Runs Jacobi-preconditioned conjugate gradient until the residual norm
    /// drops below `tolerance * |b|` or `2 * n` iterations have run. A
    /// best-effort answer is left in `x` when it does not converge. Returns the
    /// number of iterations performed.
    pub fn solve(&self, x: &mut [f64], tolerance: f64) -> usize {
        let n = x.len();
        if n == 0 {
            return 0;
        }
        debug_assert_eq!(n, self.rows());

        let dot = |a: &[f64], b: &[f64]| a.iter().zip(b).map(|(p, q)| p * q).sum::<f64>();
        let inv_diag = self.inverse_diagonal();

        let mut ap = vec![0.0; n];
        self.multiply(x, &mut ap);
        let mut r: Vec<f64> = self.rhs.iter().zip(&ap).map(|(b, a)| b - a).collect();

        let rhs_norm2 = dot(&self.rhs, &self.rhs);
        let threshold = (tolerance * tolerance * rhs_norm2).max(f64::MIN_POSITIVE);
        if dot(&r, &r) < threshold {
            return 0;
        }

        let mut p: Vec<f64> = r.iter().zip(&inv_diag).map(|(ri, d)| ri * d).collect();
        let mut z = vec![0.0; n];
        let mut abs_new = dot(&r, &p);

        let max_iterations = 2 * n;
        let mut iterations = 0;
        while iterations < max_iterations {
            self.multiply(&p, &mut ap);
            let curvature = dot(&p, &ap);
            if curvature <= 0.0 {
                // p lies in the null space of a singular system
                break;
            }
            let alpha = abs_new / curvature;
            for i in 0..n {
                x[i] += alpha * p[i];
                r[i] -= alpha * ap[i];
            }
            iterations += 1;

            if dot(&r, &r) < threshold {
                break;
            }

            for i in 0..n {
                z[i] = r[i] * inv_diag[i];
            }
            let abs_old = abs_new;
            abs_new = dot(&r, &z);
            let beta = abs_new / abs_old;
            for i in 0..n {
                p[i] = z[i] + beta * p[i];
            }
        }
        iterations
    }
}
