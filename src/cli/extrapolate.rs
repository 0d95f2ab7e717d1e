//! # extrapolate 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/extrapolate.rs`

use clap::Args;
use std::path::PathBuf;

/// extrapolate 子命令参数
#[derive(Args, Debug)]
pub struct ExtrapolateArgs {
    /// Samples CSV written by `compute --output-csv`
    pub input: PathBuf,

    /// JSON fit catalog replacing the built-in one
    #[arg(long)]
    pub fits: Option<PathBuf>,

    /// Relaxation residual in eV for the systematic uncertainty
    /// (defaults to the largest residual in the CSV)
    #[arg(long)]
    pub systematic: Option<f64>,

    /// Print every fit window
    #[arg(long, default_value_t = false)]
    pub show_fits: bool,

    /// Write the extrapolation summary as JSON
    #[arg(long)]
    pub output_json: Option<PathBuf>,

    /// Plot energies against L^-3 (PNG, or SVG by extension)
    #[arg(long)]
    pub plot: Option<PathBuf>,
}
