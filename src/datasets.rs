//! datasets — simulated two-way clustered data for PLR and PLIV models.
//!
//! Each generator draws one observation per cell `(i, j)` of an
//! `n_first × n_second` grid; observation `t = i·n_second + j` carries cluster
//! labels `(i, j)`. Every random component mixes a first-cluster effect, a
//! second-cluster effect, and idiosyncratic noise:
//!
//! ```text
//! w_ij = 0.25·a_i + 0.25·b_j + 0.5·e_ij,   a, b, e ~ N(0, 1) independent
//! ```
//!
//! so observations sharing either id are correlated. Covariate `k` (0-based)
//! enters outcome and treatment with coefficient `0.5^(k+1)`.
//!
//! - PLR: `D = Xβ + v`, `Y = θD + Xβ + ε`.
//! - PLIV: `Z = Xβ + ζ`, `D = Xβ + Z + v`, `Y = θD + Xβ + 0.5·v + u`, so `D`
//!   is endogenous while `Z` is a valid instrument.
use crate::data::{ClusterData, DataResult};
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::StandardNormal;

const FIRST_WEIGHT: f64 = 0.25;
const SECOND_WEIGHT: f64 = 0.25;
const IDIO_WEIGHT: f64 = 0.5;

/// Simulate a two-way clustered partially linear regression sample.
///
/// Parameters
/// ----------
/// - `n_first`, `n_second`: cluster counts `N` and `M`.
/// - `dim_x`: number of covariates (may be zero).
/// - `theta`: true treatment effect.
/// - `seed`: RNG seed; `None` draws from OS entropy.
///
/// Errors
/// ------
/// - `DataError::EmptyData` if `n_first` or `n_second` is zero.
pub fn make_plr_multiway_cluster(
    n_first: usize, n_second: usize, dim_x: usize, theta: f64, seed: Option<u64>,
) -> DataResult<ClusterData> {
    let mut rng = rng_from(seed);
    let x = covariates(&mut rng, n_first, n_second, dim_x);
    let signal = linear_signal(&x);

    let v = cluster_noise(&mut rng, n_first, n_second);
    let eps = cluster_noise(&mut rng, n_first, n_second);
    let d = &signal + &v;
    let y = &d * theta + &signal + &eps;

    ClusterData::new(y, d.insert_axis(Axis(1)), x, None, grid_labels(n_first, n_second))
}

/// Simulate a two-way clustered partially linear IV sample with one
/// instrument.
///
/// Same parameters and errors as [`make_plr_multiway_cluster`].
pub fn make_pliv_multiway_cluster(
    n_first: usize, n_second: usize, dim_x: usize, theta: f64, seed: Option<u64>,
) -> DataResult<ClusterData> {
    let mut rng = rng_from(seed);
    let x = covariates(&mut rng, n_first, n_second, dim_x);
    let signal = linear_signal(&x);

    let zeta = cluster_noise(&mut rng, n_first, n_second);
    let v = cluster_noise(&mut rng, n_first, n_second);
    let u = cluster_noise(&mut rng, n_first, n_second);

    let z = &signal + &zeta;
    let d = &signal + &z + &v;
    let y = &d * theta + &signal + &(&v * 0.5) + &u;

    ClusterData::new(
        y,
        d.insert_axis(Axis(1)),
        x,
        Some(z.insert_axis(Axis(1))),
        grid_labels(n_first, n_second),
    )
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// One draw of `0.25·a_i + 0.25·b_j + 0.5·e_ij` per grid cell.
fn cluster_noise<R: Rng>(rng: &mut R, n_first: usize, n_second: usize) -> Array1<f64> {
    let a: Vec<f64> = (0..n_first).map(|_| rng.sample(StandardNormal)).collect();
    let b: Vec<f64> = (0..n_second).map(|_| rng.sample(StandardNormal)).collect();
    Array1::from_iter((0..n_first * n_second).map(|t| {
        let e: f64 = rng.sample(StandardNormal);
        FIRST_WEIGHT * a[t / n_second] + SECOND_WEIGHT * b[t % n_second] + IDIO_WEIGHT * e
    }))
}

fn covariates<R: Rng>(rng: &mut R, n_first: usize, n_second: usize, dim_x: usize) -> Array2<f64> {
    let mut x = Array2::<f64>::zeros((n_first * n_second, dim_x));
    for mut column in x.columns_mut() {
        column.assign(&cluster_noise(rng, n_first, n_second));
    }
    x
}

/// `Xβ` with `β_k = 0.5^(k+1)`.
fn linear_signal(x: &Array2<f64>) -> Array1<f64> {
    let beta = Array1::from_iter((0..x.ncols()).map(|k| 0.5f64.powi(k as i32 + 1)));
    x.dot(&beta)
}

fn grid_labels(n_first: usize, n_second: usize) -> Array2<i64> {
    Array2::from_shape_fn((n_first * n_second, 2), |(t, col)| {
        if col == 0 { (t / n_second) as i64 } else { (t % n_second) as i64 }
    })
}
