//! Least-squares fits of outcome on exposure

use std::collections::BTreeSet;

use crate::models::FittedLine;

use super::{DegenerateInput, StatResult, check_sample, is_constant, mean};

/// Straight-line least-squares fit of `y` on `x`
pub fn linear_fit(x: &[f64], y: &[f64]) -> Result<FittedLine, DegenerateInput> {
    check_sample(x, y, 2)?;
    if is_constant(x) {
        return Err(DegenerateInput::ZeroVariance);
    }

    let mx = mean(x);
    let my = mean(y);
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx) * (a - mx);
    }
    if sxx == 0.0 {
        return Err(DegenerateInput::ZeroVariance);
    }

    let slope = sxy / sxx;
    Ok(FittedLine {
        intercept: my - slope * mx,
        slope,
    })
}

/// Least-squares slope of `y` on `x`
pub fn slope(x: &[f64], y: &[f64]) -> StatResult {
    linear_fit(x, y).map(|line| line.slope)
}

/// Coefficient of determination of a polynomial fit of `y` on `x`
///
/// `x` is standardised before building the design matrix. The degree is
/// lowered to one less than the number of distinct `x` values when there
/// are too few to support it.
pub fn polynomial_r2(x: &[f64], y: &[f64], degree: usize) -> StatResult {
    check_sample(x, y, degree.max(1) + 1)?;
    if is_constant(x) || is_constant(y) {
        return Err(DegenerateInput::ZeroVariance);
    }

    let mx = mean(x);
    let sd = (x.iter().map(|v| (v - mx).powi(2)).sum::<f64>() / x.len() as f64).sqrt();
    let z: Vec<f64> = x.iter().map(|v| (v - mx) / sd).collect();

    let distinct = z.iter().map(|v| v.to_bits()).collect::<BTreeSet<u64>>().len();
    let degree = degree.min(distinct - 1).max(1);
    let terms = degree + 1;

    // Normal equations: (VᵀV) c = Vᵀy over the Vandermonde matrix V
    let mut matrix = vec![vec![0.0; terms + 1]; terms];
    for (zi, yi) in z.iter().zip(y) {
        let powers: Vec<f64> = (0..terms).scan(1.0, |p, _| {
            let current = *p;
            *p *= zi;
            Some(current)
        })
        .collect();
        for row in 0..terms {
            for col in 0..terms {
                matrix[row][col] += powers[row] * powers[col];
            }
            matrix[row][terms] += powers[row] * yi;
        }
    }
    let coefficients = solve(matrix)?;

    let my = mean(y);
    let (mut ss_res, mut ss_tot) = (0.0, 0.0);
    for (zi, yi) in z.iter().zip(y) {
        let predicted = coefficients.iter().rev().fold(0.0, |acc, c| acc * zi + c);
        ss_res += (yi - predicted).powi(2);
        ss_tot += (yi - my).powi(2);
    }
    if ss_tot == 0.0 {
        return Err(DegenerateInput::ZeroVariance);
    }
    Ok(1.0 - ss_res / ss_tot)
}

/// Solve an augmented `n x (n+1)` system by Gaussian elimination with
/// partial pivoting
fn solve(mut matrix: Vec<Vec<f64>>) -> Result<Vec<f64>, DegenerateInput> {
    let n = matrix.len();
    let scale = matrix
        .iter()
        .flat_map(|row| row[..n].iter())
        .fold(0.0_f64, |m, v| m.max(v.abs()));
    let epsilon = scale * 1e-12;

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))
            .unwrap_or(col);
        if matrix[pivot][col].abs() <= epsilon {
            return Err(DegenerateInput::SingularSystem);
        }
        matrix.swap(col, pivot);

        for row in col + 1..n {
            let factor = matrix[row][col] / matrix[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..=n {
                matrix[row][k] -= factor * matrix[col][k];
            }
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| matrix[row][k] * solution[k]).sum();
        solution[row] = (matrix[row][n] - tail) / matrix[row][row];
    }
    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_quadratic_is_explained() {
        let x: Vec<f64> = (0..15).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 + 2.0 * v - 0.5 * v * v).collect();
        assert!((polynomial_r2(&x, &y, 2).unwrap() - 1.0).abs() < 1e-9);
        assert!((polynomial_r2(&x, &y, 3).unwrap() - 1.0).abs() < 1e-9);
        assert!(polynomial_r2(&x, &y, 1).unwrap() < 1.0);
    }

    #[test]
    fn higher_degree_never_fits_worse() {
        let x: Vec<f64> = (0..30).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| (v * 0.7).sin() * 10.0 + v).collect();
        let r2 = polynomial_r2(&x, &y, 2).unwrap();
        let r3 = polynomial_r2(&x, &y, 3).unwrap();
        assert!(r3 >= r2 - 1e-12);
        assert!((0.0..=1.0).contains(&r2));
    }

    #[test]
    fn degree_is_capped_by_distinct_values() {
        let x = [1.0, 1.0, 2.0, 2.0, 1.0, 2.0];
        let y = [1.0, 2.0, 5.0, 6.0, 1.5, 5.5];
        let r2 = polynomial_r2(&x, &y, 3).unwrap();
        assert!(r2 > 0.9 && r2 <= 1.0);
    }

    #[test]
    fn constant_inputs_are_degenerate() {
        let x: Vec<f64> = (0..12).map(f64::from).collect();
        assert_eq!(polynomial_r2(&[4.0; 12], &x, 2), Err(DegenerateInput::ZeroVariance));
        assert_eq!(polynomial_r2(&x, &[4.0; 12], 2), Err(DegenerateInput::ZeroVariance));
        assert_eq!(slope(&[4.0; 12], &x), Err(DegenerateInput::ZeroVariance));
    }

    #[test]
    fn line_through_points() {
        let line = linear_fit(&[0.0, 1.0, 2.0], &[1.0, 3.0, 5.0]).unwrap();
        assert!((line.slope - 2.0).abs() < 1e-12);
        assert!((line.intercept - 1.0).abs() < 1e-12);
        assert!((line.at(3.0) - 7.0).abs() < 1e-12);
    }
}
