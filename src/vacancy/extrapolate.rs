//! # 尺寸外推
//!
//! 对连续的超胞尺寸窗口拟合反幂律模型
//!
//! ```text
//! value(L) = Σ_k c_k · L^(-orders[k])
//! ```
//!
//! 首项（orders[0] = 0 时）即 L → ∞ 的外推值。指定拟合在最大尺寸窗口上的首项系数
//! 作为结果；统计不确定度取备选拟合与之的最大偏差，再与系统不确定度平方和开方。
//! 未收敛样本的退化项由调用方通过 `ExtrapolationResult::account_for_degraded` 叠加。
//!
//! 最小二乘用 SVD 求最小范数解，秩亏的设计矩阵只给出警告，不中止计算。
//!
//! ## 依赖关系
//! - 被 `vacancy/pipeline.rs`, `commands/extrapolate.rs` 使用
//! - 使用 `numerics/lstsq.rs`, `config.rs`

use crate::config::{FitCatalog, FitSelection, FitSpec};
use crate::error::{Result, VacancyError};
use crate::models::{ExtrapolationResult, FitResult};
use crate::numerics::lstsq;
use crate::utils::output::print_warning;

use nalgebra::{DMatrix, DVector};

/// 检查尺寸序列严格递增且连续
pub fn validate_sizes(sizes: &[usize]) -> Result<()> {
    let contiguous = sizes.first().map_or(true, |&s| s >= 1)
        && sizes.windows(2).all(|w| w[1] == w[0] + 1);
    if contiguous {
        Ok(())
    } else {
        Err(VacancyError::NonContiguousSizes(sizes.to_vec()))
    }
}

/// 基于拟合目录的外推器
#[derive(Debug, Clone)]
pub struct SizeExtrapolator<'a> {
    catalog: &'a FitCatalog,
}

impl<'a> SizeExtrapolator<'a> {
    pub fn new(catalog: &'a FitCatalog) -> Self {
        SizeExtrapolator { catalog }
    }

    fn check_input(&self, sizes: &[usize], values: &[f64]) -> Result<()> {
        if sizes.len() != values.len() {
            return Err(VacancyError::InvalidArgument(format!(
                "{} sizes but {} values",
                sizes.len(),
                values.len()
            )));
        }
        if sizes.is_empty() {
            return Err(VacancyError::InvalidArgument(
                "no samples to extrapolate".to_string(),
            ));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(VacancyError::NonFiniteEnergy(format!(
                "sample value for size {}",
                sizes[i]
            )));
        }
        validate_sizes(sizes)?;
        self.catalog.validate()
    }

    /// 单个窗口的拟合
    fn fit_window(
        &self,
        fit_id: usize,
        spec: &FitSpec,
        sizes: &[usize],
        values: &[f64],
        start: usize,
    ) -> Result<FitResult> {
        let window = &sizes[start..start + spec.point_count];
        let rhs = &values[start..start + spec.point_count];

        let a = DMatrix::from_fn(window.len(), spec.orders.len(), |r, k| {
            (window[r] as f64).powi(-spec.orders[k])
        });
        let b = DVector::from_column_slice(rhs);
        let solution = lstsq::solve(&a, &b)?;

        if solution.is_rank_deficient() {
            let smallest = solution.singular_values.last().copied().unwrap_or(0.0);
            print_warning(&format!(
                "Fit #{} on sizes {:?} is rank deficient (rank {} of {}, smallest singular value {:.3e}), using the minimum-norm solution",
                fit_id,
                window,
                solution.rank,
                spec.orders.len(),
                smallest
            ));
        }

        Ok(FitResult {
            fit_id,
            window_start: start,
            sizes: window.to_vec(),
            leading: solution.coefficients[0],
            coefficients: solution.coefficients,
            rank: solution.rank,
        })
    }

    /// 目录中每个拟合在所有连续窗口上的结果
    ///
    /// 第 `i` 项对应目录第 `i` 个拟合；点数多于样本数的拟合为空。
    pub fn fit_all(&self, sizes: &[usize], values: &[f64]) -> Result<Vec<Vec<FitResult>>> {
        self.check_input(sizes, values)?;

        self.catalog
            .specs
            .iter()
            .enumerate()
            .map(|(fit_id, spec)| {
                if spec.point_count > sizes.len() {
                    return Ok(Vec::new());
                }
                (0..=sizes.len() - spec.point_count)
                    .map(|start| self.fit_window(fit_id, spec, sizes, values, start))
                    .collect()
            })
            .collect()
    }

    /// 拟合 `fit_id` 在最大尺寸窗口上的结果
    fn last_window(&self, fit_id: usize, sizes: &[usize], values: &[f64]) -> Result<FitResult> {
        let spec = self
            .catalog
            .specs
            .get(fit_id)
            .ok_or_else(|| VacancyError::InvalidFit {
                fit_id,
                reason: format!("catalog only has {} fits", self.catalog.specs.len()),
            })?;
        if spec.point_count > sizes.len() {
            return Err(VacancyError::InvalidFit {
                fit_id,
                reason: format!(
                    "needs {} sizes, only {} sampled",
                    spec.point_count,
                    sizes.len()
                ),
            });
        }
        self.fit_window(fit_id, spec, sizes, values, sizes.len() - spec.point_count)
    }

    /// 外推到无限尺寸
    pub fn extrapolate(
        &self,
        sizes: &[usize],
        values: &[f64],
        selection: &FitSelection,
        systematic: f64,
    ) -> Result<ExtrapolationResult> {
        self.check_input(sizes, values)?;

        let value = self.last_window(selection.value_fit, sizes, values)?.leading;

        let statistical = selection
            .uncert_fits
            .iter()
            .map(|&id| {
                self.last_window(id, sizes, values)
                    .map(|fit| (fit.leading - value).abs())
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .fold(0.0, f64::max);

        Ok(ExtrapolationResult {
            value,
            uncertainty: (statistical * statistical + systematic * systematic).sqrt(),
            statistical,
            systematic,
            degradation: 0.0,
            degraded: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(specs: Vec<FitSpec>, value_fit: usize, uncert_fits: Vec<usize>) -> FitCatalog {
        let selection = FitSelection {
            value_fit,
            uncert_fits,
        };
        FitCatalog {
            specs,
            formation: selection.clone(),
            migration: selection,
        }
    }

    #[test]
    fn test_constant_fit_is_mean() {
        let catalog = catalog(vec![FitSpec::new(3, vec![0])], 0, vec![]);
        let extrapolator = SizeExtrapolator::new(&catalog);
        let result = extrapolator
            .extrapolate(&[4, 5, 6], &[1.0, 2.0, 4.0], &catalog.migration, 0.0)
            .unwrap();

        assert!((result.value - 7.0 / 3.0).abs() < 1e-12);
        assert_eq!(result.statistical, 0.0);
        assert_eq!(result.uncertainty, 0.0);
    }

    #[test]
    fn test_inverse_cube_leading_term() {
        let sizes = [4, 5, 6];
        let values = [0.679147, 0.678775, 0.678732];
        let catalog = catalog(
            vec![FitSpec::new(3, vec![3]), FitSpec::new(3, vec![3])],
            0,
            vec![1],
        );
        let extrapolator = SizeExtrapolator::new(&catalog);
        let result = extrapolator
            .extrapolate(&sizes, &values, &catalog.migration, 0.0)
            .unwrap();

        // 单列最小二乘：c = Σ a_r b_r / Σ a_r²，a_r = L^-3
        let a: Vec<f64> = sizes.iter().map(|&l| (l as f64).powi(-3)).collect();
        let expected = a.iter().zip(&values).map(|(x, y)| x * y).sum::<f64>()
            / a.iter().map(|x| x * x).sum::<f64>();

        assert!((result.value - expected).abs() < 1e-8);
        assert_eq!(result.statistical, 0.0);
    }

    #[test]
    fn test_two_point_fit_is_exact() {
        // value(L) = 0.5 + 2 L^-3
        let sizes = [3, 4];
        let values: Vec<f64> = sizes.iter().map(|&l| 0.5 + 2.0 / (l as f64).powi(3)).collect();
        let catalog = catalog(vec![FitSpec::new(2, vec![0, 3])], 0, vec![]);
        let fits = SizeExtrapolator::new(&catalog).fit_all(&sizes, &values).unwrap();

        assert_eq!(fits[0].len(), 1);
        assert!((fits[0][0].leading - 0.5).abs() < 1e-10);
        assert!((fits[0][0].coefficients[1] - 2.0).abs() < 1e-8);
        assert!(!fits[0][0].is_ill_conditioned());
    }

    #[test]
    fn test_uncertainty_in_quadrature() {
        // 两个常数拟合：全部 3 点均值 vs 最后 2 点均值
        let sizes = [1, 2, 3];
        let values = [0.0, 0.003, 0.003];
        let catalog = catalog(
            vec![FitSpec::new(2, vec![0]), FitSpec::new(3, vec![0])],
            0,
            vec![1],
        );
        let result = SizeExtrapolator::new(&catalog)
            .extrapolate(&sizes, &values, &catalog.migration, 0.001)
            .unwrap();

        assert!((result.value - 0.003).abs() < 1e-12);
        assert!((result.statistical - 0.001).abs() < 1e-12);
        assert!((result.uncertainty - 0.001 * 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_quadrature_formula() {
        let catalog = catalog(
            vec![FitSpec::new(1, vec![0]), FitSpec::new(2, vec![0])],
            0,
            vec![1],
        );
        // 最后一点 0.004，后两点均值 0.002：统计不确定度 0.002
        let result = SizeExtrapolator::new(&catalog)
            .extrapolate(&[5, 6], &[0.0, 0.004], &catalog.migration, 0.001)
            .unwrap();

        assert!((result.statistical - 0.002).abs() < 1e-12);
        assert!((result.uncertainty - 0.002_236_067_977_499_79).abs() < 1e-12);
    }

    #[test]
    fn test_windows_cover_all_contiguous_runs() {
        let catalog = FitCatalog::default();
        let sizes = [3, 4, 5, 6];
        let values = [1.0, 0.9, 0.85, 0.83];
        let fits = SizeExtrapolator::new(&catalog).fit_all(&sizes, &values).unwrap();

        assert_eq!(fits.len(), 4);
        assert_eq!(fits[0].len(), 3);
        assert_eq!(fits[1].len(), 2);
        assert_eq!(fits[2].len(), 2);
        assert_eq!(fits[1][1].sizes, vec![4, 5, 6]);
        assert_eq!(fits[1][1].window_start, 1);
    }

    #[test]
    fn test_rank_deficient_fit_is_flagged() {
        // 两个点拟合三个系数
        let catalog = catalog(vec![FitSpec::new(2, vec![0, 3, 4])], 0, vec![]);
        let fits = SizeExtrapolator::new(&catalog)
            .fit_all(&[3, 4], &[1.0, 0.9])
            .unwrap();
        assert!(fits[0][0].is_ill_conditioned());
    }

    #[test]
    fn test_rejects_non_contiguous_sizes() {
        let catalog = FitCatalog::default();
        let extrapolator = SizeExtrapolator::new(&catalog);

        let gap = extrapolator.extrapolate(&[4, 6, 7], &[0.0; 3], &catalog.migration, 0.0);
        assert!(matches!(gap, Err(VacancyError::NonContiguousSizes(_))));

        let decreasing = extrapolator.extrapolate(&[6, 5, 4], &[0.0; 3], &catalog.migration, 0.0);
        assert!(matches!(decreasing, Err(VacancyError::NonContiguousSizes(_))));
    }

    #[test]
    fn test_rejects_fit_longer_than_samples() {
        let catalog = FitCatalog::default();
        let result = SizeExtrapolator::new(&catalog).extrapolate(
            &[4, 5],
            &[0.1, 0.2],
            &catalog.migration,
            0.0,
        );
        assert!(matches!(result, Err(VacancyError::InvalidFit { .. })));
    }

    #[test]
    fn test_mismatched_lengths() {
        let catalog = FitCatalog::default();
        let result =
            SizeExtrapolator::new(&catalog).extrapolate(&[4, 5, 6], &[0.1], &catalog.migration, 0.0);
        assert!(result.is_err());
    }

    #[test]
    fn test_deterministic() {
        let catalog = FitCatalog::default();
        let extrapolator = SizeExtrapolator::new(&catalog);
        let sizes = [3, 4, 5];
        let values = [0.71, 0.69, 0.685];

        let first = extrapolator
            .extrapolate(&sizes, &values, &catalog.formation, 0.0003)
            .unwrap();
        let second = extrapolator
            .extrapolate(&sizes, &values, &catalog.formation, 0.0003)
            .unwrap();
        assert_eq!(first, second);
    }
}
