//! # 鞍点搜索
//!
//! 对迁移路径上的 (映像序号, 能量) 做三次样条插值，再用 Nelder-Mead
//! 最小化 -S(x) 求能量最高点。样条定义域外目标函数取 +∞。
//!
//! 起点取中间映像的中点序号；达到迭代上限时返回当前最优点并标记未收敛。
//!
//! ## 依赖关系
//! - 被 `vacancy/sampler.rs`, `commands/saddle.rs` 使用
//! - 使用 `numerics/spline.rs`, `numerics/nelder_mead.rs`

use crate::config::{FMIN_FTOL, FMIN_MAX_ITER, FMIN_XTOL};
use crate::error::Result;
use crate::models::PathSample;
use crate::numerics::{CubicSpline, NelderMead};
use crate::utils::output::print_warning;

use serde::Serialize;

/// 路径上的鞍点
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SaddlePoint {
    /// 路径参数（连续的映像序号）
    pub position: f64,
    /// 插值能量 (eV)
    pub energy: f64,
    pub converged: bool,
    pub iterations: usize,
}

/// 鞍点搜索的容差
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaddleSearch {
    pub xatol: f64,
    pub fatol: f64,
    pub max_iter: usize,
}

impl Default for SaddleSearch {
    fn default() -> Self {
        SaddleSearch {
            xatol: FMIN_XTOL,
            fatol: FMIN_FTOL,
            max_iter: FMIN_MAX_ITER,
        }
    }
}

/// 使用默认容差搜索鞍点
pub fn find_saddle(path: &PathSample) -> Result<SaddlePoint> {
    find_saddle_with(path, &SaddleSearch::default())
}

pub fn find_saddle_with(path: &PathSample, search: &SaddleSearch) -> Result<SaddlePoint> {
    let spline = CubicSpline::new(&path.parameters(), path.energies())?;

    let minimizer = NelderMead {
        xatol: search.xatol,
        fatol: search.fatol,
        max_iter: search.max_iter,
    };
    let objective = |x: &[f64]| match spline.eval(x[0]) {
        Some(e) => -e,
        None => f64::INFINITY,
    };
    let minimum = minimizer.minimize(objective, &[path.midpoint()]);

    if !minimum.converged {
        print_warning(&format!(
            "[ERR1049] Saddle search did not converge within {} iterations \
             ({} path evaluations, best x = {:.4})",
            search.max_iter, minimum.evaluations, minimum.x[0]
        ));
    }

    Ok(SaddlePoint {
        position: minimum.x[0],
        energy: -minimum.value,
        converged: minimum.converged,
        iterations: minimum.iterations,
    })
}
