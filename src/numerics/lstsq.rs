//! # 最小二乘求解
//!
//! 基于 SVD 的最小范数最小二乘解 `min ||A·x - b||`。奇异值低于
//! `max(m, n) · ε · σ_max` 的方向被丢弃（与 numpy `lstsq` 的默认截断一致），
//! 设计矩阵列近似共线时仍给出确定的结果，而不是报错。
//!
//! ## 依赖关系
//! - 被 `vacancy/extrapolate.rs` 使用
//! - 使用 `nalgebra` 的 SVD

use crate::error::{Result, VacancyError};

use nalgebra::{DMatrix, DVector};

/// 最小二乘解
#[derive(Debug, Clone)]
pub struct LeastSquares {
    /// 解向量
    pub coefficients: Vec<f64>,
    /// 数值秩
    pub rank: usize,
    /// 奇异值（降序）
    pub singular_values: Vec<f64>,
}

impl LeastSquares {
    /// 是否秩亏（数值秩小于未知数个数）
    pub fn is_rank_deficient(&self) -> bool {
        self.rank < self.coefficients.len()
    }
}

/// 求解 `A·x ≈ b`
pub fn solve(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<LeastSquares> {
    if a.nrows() == 0 || a.ncols() == 0 {
        return Err(VacancyError::InvalidArgument(
            "least-squares system has an empty design matrix".to_string(),
        ));
    }
    if a.nrows() != b.len() {
        return Err(VacancyError::InvalidArgument(format!(
            "design matrix has {} rows but {} observations were given",
            a.nrows(),
            b.len()
        )));
    }
    if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
        return Err(VacancyError::InvalidArgument(
            "least-squares system contains non-finite entries".to_string(),
        ));
    }

    let svd = a.clone().svd(true, true);
    let sigma_max = svd.singular_values.iter().copied().fold(0.0, f64::max);
    let cutoff = a.nrows().max(a.ncols()) as f64 * f64::EPSILON * sigma_max;

    let rank = svd.singular_values.iter().filter(|&&s| s > cutoff).count();
    let x = svd
        .solve(b, cutoff)
        .map_err(|e| VacancyError::SingularSystem(e.to_string()))?;

    let mut singular_values: Vec<f64> = svd.singular_values.iter().copied().collect();
    singular_values.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    Ok(LeastSquares {
        coefficients: x.iter().copied().collect(),
        rank,
        singular_values,
    })
}
