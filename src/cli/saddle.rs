//! # saddle 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/saddle.rs`

use crate::config::{FMIN_FTOL, FMIN_MAX_ITER, FMIN_XTOL};

use clap::Args;

/// saddle 子命令参数
#[derive(Args, Debug)]
pub struct SaddleArgs {
    /// Image energies in eV including both endpoints (e.g. '0,0.4,0.7,0.4,0')
    #[arg(long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
    pub energies: Vec<f64>,

    /// Absolute tolerance on the path parameter
    #[arg(long, default_value_t = FMIN_XTOL)]
    pub xatol: f64,

    /// Absolute tolerance on the energy
    #[arg(long, default_value_t = FMIN_FTOL)]
    pub fatol: f64,

    /// Iteration budget
    #[arg(long, default_value_t = FMIN_MAX_ITER)]
    pub max_iter: usize,
}
