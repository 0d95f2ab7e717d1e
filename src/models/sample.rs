//! # 采样与外推数据模型
//!
//! - `SizeSample`: 单个超胞尺寸的计算结果，创建后不再修改
//! - `PathSample`: 离散迁移路径上各映像的能量
//! - `FitResult`: 单个拟合窗口的最小二乘结果
//! - `ExtrapolationResult`: 无限尺寸外推值及其不确定度
//!
//! ## 依赖关系
//! - 被 `vacancy/`, `report/`, `commands/` 使用
//! - 无外部模块依赖

use crate::error::{Result, VacancyError};

use serde::{Deserialize, Serialize};

/// 单个超胞尺寸的采样结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeSample {
    /// 超胞在每个方向上的重复次数
    pub size: usize,

    /// 迁移能 (eV)
    pub migration_energy: f64,

    /// 弛豫后的形成能 (eV)
    pub formation_energy: f64,

    /// 收紧力收敛阈值后再次弛豫的能量漂移 (eV)
    pub relaxation_residual: f64,

    /// 未弛豫的形成能 (eV)，仅供诊断
    #[serde(default)]
    pub unrelaxed_formation_energy: f64,

    /// 完整超胞的每原子结合能 (eV)
    #[serde(default)]
    pub cohesive_energy_per_atom: f64,

    /// 完整超胞原子数
    #[serde(default)]
    pub n_atoms: usize,

    /// 弛豫、路径优化或鞍点搜索未收敛
    #[serde(default)]
    pub degraded: bool,
}

/// 所有样本中最大的弛豫残差
pub fn max_relaxation_residual(samples: &[SizeSample]) -> f64 {
    samples
        .iter()
        .map(|s| s.relaxation_residual)
        .fold(0.0, f64::max)
}

/// 任一样本是否退化
pub fn any_degraded(samples: &[SizeSample]) -> bool {
    samples.iter().any(|s| s.degraded)
}

/// 离散迁移路径：参数为映像序号 0..=N+1
#[derive(Debug, Clone, PartialEq)]
pub struct PathSample {
    energies: Vec<f64>,
}

impl PathSample {
    /// 至少需要两个端点和一个中间映像
    pub fn new(energies: Vec<f64>) -> Result<Self> {
        if energies.len() < 3 {
            return Err(VacancyError::DegeneratePath(format!(
                "a path needs both endpoints and at least one interior image, got {} points",
                energies.len()
            )));
        }
        if let Some(i) = energies.iter().position(|e| !e.is_finite()) {
            return Err(VacancyError::NonFiniteEnergy(format!("path image {}", i)));
        }
        Ok(PathSample { energies })
    }

    pub fn len(&self) -> usize {
        self.energies.len()
    }

    /// 中间映像数
    pub fn interior_images(&self) -> usize {
        self.energies.len() - 2
    }

    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    /// 路径参数（映像序号）
    pub fn parameters(&self) -> Vec<f64> {
        (0..self.energies.len()).map(|i| i as f64).collect()
    }

    /// 鞍点搜索起点：中间映像的中点序号
    pub fn midpoint(&self) -> f64 {
        (self.interior_images() / 2 + 1) as f64
    }

    /// 采样点中能量最高者 (序号, 能量)
    pub fn max_sample(&self) -> (usize, f64) {
        self.energies
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, e)| {
                if e > best.1 {
                    (i, e)
                } else {
                    best
                }
            })
    }
}

/// 单个拟合窗口的结果
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    /// 拟合模型在目录中的编号
    pub fit_id: usize,
    /// 窗口起始位置（在尺寸序列中的下标）
    pub window_start: usize,
    /// 窗口内的尺寸
    pub sizes: Vec<usize>,
    /// 全部系数，顺序与模型阶数一致
    pub coefficients: Vec<f64>,
    /// 首项系数，即尺寸趋于无穷时的值
    pub leading: f64,
    /// 设计矩阵的数值秩
    pub rank: usize,
}

impl FitResult {
    pub fn is_ill_conditioned(&self) -> bool {
        self.rank < self.coefficients.len()
    }
}

/// 外推结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtrapolationResult {
    /// 指定拟合给出的外推值
    pub value: f64,
    /// 合成不确定度 sqrt(stat² + sys² + deg²)
    pub uncertainty: f64,
    /// 统计不确定度（备选拟合的最大偏差）
    pub statistical: f64,
    /// 系统不确定度
    pub systematic: f64,
    /// 退化样本带来的不确定度
    #[serde(default)]
    pub degradation: f64,
    /// 输入样本中存在未收敛的计算
    pub degraded: bool,
}

impl ExtrapolationResult {
    /// 计入未收敛样本
    ///
    /// 退化项取退化样本的取值与外推值的最大偏差，
    /// 再与统计、系统不确定度平方和开方。
    pub fn account_for_degraded(
        &mut self,
        samples: &[SizeSample],
        value_of: impl Fn(&SizeSample) -> f64,
    ) {
        self.degraded = any_degraded(samples);
        self.degradation = samples
            .iter()
            .filter(|s| s.degraded)
            .map(|s| (value_of(s) - self.value).abs())
            .fold(0.0, f64::max);
        self.uncertainty = (self.statistical.powi(2)
            + self.systematic.powi(2)
            + self.degradation.powi(2))
        .sqrt();
    }
}
