//! # 计算参数配置
//!
//! 进程级默认常量，以及显式传入采样器和外推器的配置结构。
//!
//! - `VacancyConfig`: 弛豫与路径优化的精度和步数预算
//! - `FitCatalog`: 外推使用的反幂律模型目录，以及两个目标量各自的
//!   指定拟合与不确定度拟合
//!
//! ## 依赖关系
//! - 被 `cli/`, `commands/`, `vacancy/` 使用
//! - 使用 `serde_json` 读取自定义拟合目录

use crate::error::{Result, VacancyError};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ─────────────────────────────────────────────────────────────
// 精度相关常量
// ─────────────────────────────────────────────────────────────

/// 最大原子力收敛阈值 (eV/Å)
pub const FMAX_TOL: f64 = 10.0e-3;

/// 结构弛豫最大步数
pub const FIRE_MAX_STEPS: usize = 1000;

/// 路径优化最大步数
pub const MDMIN_MAX_STEPS: usize = 1000;

/// 收紧阈值再次弛豫（估计系统误差）的最大步数
pub const UNCERT_STEPS: usize = 1000;

/// 最小超胞的目标原子数
pub const MIN_ATOMS: usize = 100;

/// 迁移路径的中间映像数
pub const NEB_POINTS: usize = 12;

/// 估计弛豫残差时收紧力阈值的倍数
pub const EPS: f64 = 1.0e-6;

/// 连续超胞尺寸的个数
pub const NUM_SIZES: usize = 3;

/// 优先的迁移方向（惯用晶胞晶格向量为单位），在空位的最近邻中选取最接近此方向者
pub const MIGRATION: [f64; 3] = [1.0, 0.0, 0.0];

/// 鞍点搜索的函数值收敛阈值 (eV)
pub const FMIN_FTOL: f64 = 1e-8;

/// 鞍点搜索的位置收敛阈值（映像序号）
pub const FMIN_XTOL: f64 = 1e-4;

/// 鞍点搜索的最大迭代次数
pub const FMIN_MAX_ITER: usize = 200;

/// 判定同一近邻壳层的距离容差，相对于晶格常数
pub const SITE_MATCH_TOL: f64 = 1e-3;

/// 初末态最大位移低于此值 (Å) 视为路径退化
pub const DEGENERATE_PATH_TOL: f64 = 1e-6;

/// 超胞每个方向的最大重复次数
pub const MAX_SUPERCELL_SIZE: usize = 64;

// ─────────────────────────────────────────────────────────────
// 运行配置
// ─────────────────────────────────────────────────────────────

/// 空位采样的运行配置
#[derive(Debug, Clone, PartialEq)]
pub struct VacancyConfig {
    pub fmax: f64,
    pub relax_steps: usize,
    pub neb_steps: usize,
    pub uncert_steps: usize,
    pub min_atoms: usize,
    pub neb_points: usize,
    pub eps: f64,
    pub num_sizes: usize,
    pub migration: [f64; 3],
}

impl Default for VacancyConfig {
    fn default() -> Self {
        VacancyConfig {
            fmax: FMAX_TOL,
            relax_steps: FIRE_MAX_STEPS,
            neb_steps: MDMIN_MAX_STEPS,
            uncert_steps: UNCERT_STEPS,
            min_atoms: MIN_ATOMS,
            neb_points: NEB_POINTS,
            eps: EPS,
            num_sizes: NUM_SIZES,
            migration: MIGRATION,
        }
    }
}

impl VacancyConfig {
    /// 检查参数合法性
    pub fn validate(&self) -> Result<()> {
        if !(self.fmax > 0.0 && self.fmax.is_finite()) {
            return Err(VacancyError::InvalidArgument(format!(
                "force tolerance must be positive, got {}",
                self.fmax
            )));
        }
        if !(self.eps > 0.0 && self.eps <= 1.0) {
            return Err(VacancyError::InvalidArgument(format!(
                "tolerance tightening factor must lie in (0, 1], got {}",
                self.eps
            )));
        }
        if self.neb_points == 0 {
            return Err(VacancyError::InvalidArgument(
                "at least one interior path image is required".to_string(),
            ));
        }
        if self.num_sizes == 0 {
            return Err(VacancyError::InvalidArgument(
                "at least one supercell size is required".to_string(),
            ));
        }
        if self.migration.iter().any(|m| !m.is_finite()) {
            return Err(VacancyError::InvalidArgument(format!(
                "migration direction must be finite, got {:?}",
                self.migration
            )));
        }
        if self.min_atoms == 0 {
            return Err(VacancyError::InvalidArgument(
                "minimum atom count must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────
// 外推拟合目录
// ─────────────────────────────────────────────────────────────

/// 反幂律模型：value(L) = Σ c_k · L^(-orders[k])
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitSpec {
    /// 拟合使用的连续尺寸个数
    pub point_count: usize,
    /// 各项的幂次
    pub orders: Vec<i32>,
}

impl FitSpec {
    pub fn new(point_count: usize, orders: Vec<i32>) -> Self {
        FitSpec {
            point_count,
            orders,
        }
    }
}

/// 一个目标量的指定拟合与不确定度拟合
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitSelection {
    pub value_fit: usize,
    pub uncert_fits: Vec<usize>,
}

/// 外推拟合目录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitCatalog {
    pub specs: Vec<FitSpec>,
    pub formation: FitSelection,
    pub migration: FitSelection,
}

impl Default for FitCatalog {
    fn default() -> Self {
        FitCatalog {
            specs: vec![
                FitSpec::new(2, vec![0, 3]),
                FitSpec::new(3, vec![0, 3]),
                FitSpec::new(3, vec![0, 3, 4]),
                FitSpec::new(2, vec![0]),
            ],
            formation: FitSelection {
                value_fit: 0,
                uncert_fits: vec![1, 2],
            },
            migration: FitSelection {
                value_fit: 0,
                uncert_fits: vec![1, 2],
            },
        }
    }
}

impl FitCatalog {
    /// 从 JSON 文件读取
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| VacancyError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        let catalog: FitCatalog =
            serde_json::from_str(&text).map_err(|e| VacancyError::ParseError {
                format: "fit catalog".to_string(),
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// 目录自身的一致性检查
    pub fn validate(&self) -> Result<()> {
        for (fit_id, spec) in self.specs.iter().enumerate() {
            if spec.point_count == 0 {
                return Err(VacancyError::InvalidFit {
                    fit_id,
                    reason: "point count must be at least 1".to_string(),
                });
            }
            if spec.orders.is_empty() {
                return Err(VacancyError::InvalidFit {
                    fit_id,
                    reason: "a fit needs at least one order".to_string(),
                });
            }
        }
        for selection in [&self.formation, &self.migration] {
            for &fit_id in std::iter::once(&selection.value_fit).chain(&selection.uncert_fits) {
                if fit_id >= self.specs.len() {
                    return Err(VacancyError::InvalidFit {
                        fit_id,
                        reason: format!("catalog only has {} fits", self.specs.len()),
                    });
                }
            }
        }
        Ok(())
    }

    /// 目录中单个拟合所需的最多尺寸个数
    pub fn max_point_count(&self) -> usize {
        self.specs.iter().map(|s| s.point_count).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_constants() {
        let config = VacancyConfig::default();
        assert_eq!(config.fmax, FMAX_TOL);
        assert_eq!(config.neb_points, 12);
        assert_eq!(config.migration, [1.0, 0.0, 0.0]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_zero_images() {
        let config = VacancyConfig {
            neb_points: 0,
            ..VacancyConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_non_finite_values() {
        let infinite_fmax = VacancyConfig {
            fmax: f64::INFINITY,
            ..VacancyConfig::default()
        };
        assert!(infinite_fmax.validate().is_err());

        let nan_migration = VacancyConfig {
            migration: [f64::NAN, 0.0, 0.0],
            ..VacancyConfig::default()
        };
        assert!(nan_migration.validate().is_err());

        let zero_migration = VacancyConfig {
            migration: [0.0; 3],
            ..VacancyConfig::default()
        };
        assert!(zero_migration.validate().is_ok());
    }

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = FitCatalog::default();
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.max_point_count(), 3);
    }

    #[test]
    fn test_catalog_rejects_unknown_fit() {
        let mut catalog = FitCatalog::default();
        catalog.migration.uncert_fits.push(9);
        assert!(matches!(
            catalog.validate(),
            Err(VacancyError::InvalidFit { fit_id: 9, .. })
        ));
    }

    #[test]
    fn test_catalog_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fits.json");
        std::fs::write(
            &path,
            r#"{
                "specs": [{"point_count": 3, "orders": [3]}],
                "formation": {"value_fit": 0, "uncert_fits": [0]},
                "migration": {"value_fit": 0, "uncert_fits": []}
            }"#,
        )
        .unwrap();

        let catalog = FitCatalog::from_file(&path).unwrap();
        assert_eq!(catalog.specs[0], FitSpec::new(3, vec![3]));
        assert!(catalog.migration.uncert_fits.is_empty());
    }
}
