//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `compute`: 完整的多尺寸空位计算
//! - `extrapolate`: 从样本 CSV 重新外推
//! - `saddle`: 对给定的路径能量求鞍点
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: compute, extrapolate, saddle

pub mod compute;
pub mod extrapolate;
pub mod saddle;

use clap::{Parser, Subcommand};

/// vacancy - 空位形成能与迁移能计算
#[derive(Parser)]
#[command(name = "vacancy")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(
    about = "Vacancy formation and migration energies extrapolated to the infinite-crystal limit",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Only print warnings, errors and final results
    #[arg(short, long, global = true, default_value_t = false)]
    pub quiet: bool,

    /// Number of worker threads (0 = auto)
    #[arg(short, long, global = true, default_value_t = 0, env = "VACANCY_JOBS")]
    pub jobs: usize,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Sample increasingly large supercells and extrapolate both energies
    Compute(compute::ComputeArgs),

    /// Re-run the size extrapolation on a samples CSV
    Extrapolate(extrapolate::ExtrapolateArgs),

    /// Locate the saddle point of a discretised migration path
    Saddle(saddle::SaddleArgs),
}
