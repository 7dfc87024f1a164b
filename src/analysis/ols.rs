//! Ordinary least squares on a dense design matrix

use nalgebra::{DMatrix, DVector};

/// Result of an OLS fit
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub coefficients: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub sse: f64,
    pub sst: f64,
    pub r_squared: f64,
    pub n: usize,
    pub p: usize,
}

impl OlsFit {
    /// Residual degrees of freedom
    pub fn df_residual(&self) -> usize {
        self.n - self.p
    }

    /// Residual mean square
    pub fn mse(&self) -> f64 {
        self.sse / self.df_residual() as f64
    }
}

/// Smallest |R_jj| relative to the largest before the design counts as rank deficient
const RANK_TOLERANCE: f64 = 1e-10;

/// Per-column affine map applied before solving
///
/// A constant non-zero column is taken as the intercept and left as is.
/// With an intercept, every other column is centered; each one is then
/// scaled to unit norm so the magnitude of raw values does not matter.
struct Standardization {
    center: Vec<f64>,
    scale: Vec<f64>,
    intercept: Option<(usize, f64)>,
}

impl Standardization {
    fn of(x: &DMatrix<f64>) -> Self {
        let (n, p) = x.shape();
        let intercept = (0..p).find_map(|j| {
            let c = x[(0, j)];
            (c != 0.0 && x.column(j).iter().all(|&v| v == c)).then_some((j, c))
        });

        let mut center = vec![0.0; p];
        let mut scale = vec![1.0; p];
        for j in 0..p {
            if intercept.is_some_and(|(k, _)| k == j) {
                continue;
            }
            let col = x.column(j);
            let m = if intercept.is_some() {
                col.iter().sum::<f64>() / n as f64
            } else {
                0.0
            };
            let norm = col.iter().map(|v| (v - m).powi(2)).sum::<f64>().sqrt();
            center[j] = m;
            if norm > 0.0 && norm.is_finite() {
                scale[j] = norm;
            }
        }
        Self {
            center,
            scale,
            intercept,
        }
    }

    fn apply(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| {
            (x[(i, j)] - self.center[j]) / self.scale[j]
        })
    }

    /// Linear map from coefficients on the standardized columns to raw ones
    fn back_transform(&self) -> DMatrix<f64> {
        let p = self.scale.len();
        let mut t = DMatrix::<f64>::zeros(p, p);
        for j in 0..p {
            t[(j, j)] = 1.0 / self.scale[j];
        }
        if let Some((k, c)) = self.intercept {
            for j in (0..p).filter(|&j| j != k) {
                t[(k, j)] = -self.center[j] / (self.scale[j] * c);
            }
        }
        t
    }
}

/// Fit `y = X β` by least squares
///
/// `rows` holds one design row per observation and must include any
/// intercept column. Columns are standardized and the system is solved
/// through a QR decomposition. Returns `None` when n ≤ p or the design is
/// rank deficient.
pub fn fit(rows: &[Vec<f64>], y: &[f64]) -> Option<OlsFit> {
    let n = rows.len();
    let p = rows.first()?.len();
    if p == 0 || n <= p || y.len() != n || rows.iter().any(|r| r.len() != p) {
        return None;
    }

    let x = DMatrix::from_fn(n, p, |i, j| rows[i][j]);
    let yv = DVector::from_column_slice(y);

    let standardization = Standardization::of(&x);
    let z = standardization.apply(&x);

    let qr = z.clone().qr();
    let r = qr.r();
    let diag: Vec<f64> = (0..p).map(|j| r[(j, j)].abs()).collect();
    let largest = diag.iter().copied().fold(0.0, f64::max);
    let smallest = diag.iter().copied().fold(f64::INFINITY, f64::min);
    if !largest.is_finite() || largest <= 0.0 || smallest <= largest * RANK_TOLERANCE {
        tracing::warn!(smallest, largest, "design matrix is rank deficient");
        return None;
    }

    let r_inv = r.solve_upper_triangular(&DMatrix::<f64>::identity(p, p))?;
    let gamma = &r_inv * (qr.q().transpose() * &yv);

    let fitted = &z * &gamma;
    let sse: f64 = (&yv - &fitted).iter().map(|e| e * e).sum();

    let y_mean = y.iter().sum::<f64>() / n as f64;
    let sst: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let r_squared = if sst > 0.0 {
        (1.0 - sse / sst).clamp(0.0, 1.0)
    } else {
        0.0
    };

    // Cov(β) = σ² T (ZᵀZ)⁻¹ Tᵀ with (ZᵀZ)⁻¹ = R⁻¹R⁻ᵀ
    let t = standardization.back_transform();
    let beta = &t * &gamma;
    let mse = sse / (n - p) as f64;
    let t_r_inv = &t * &r_inv;
    let std_errors = (0..p)
        .map(|j| {
            let var: f64 = t_r_inv.row(j).iter().map(|v| v * v).sum();
            (mse * var).max(0.0).sqrt()
        })
        .collect();

    Some(OlsFit {
        coefficients: beta.iter().copied().collect(),
        std_errors,
        sse,
        sst,
        r_squared,
        n,
        p,
    })
}
