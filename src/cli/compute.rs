//! # compute 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/compute.rs`

use crate::config::{
    EPS, FIRE_MAX_STEPS, FMAX_TOL, MDMIN_MAX_STEPS, MIN_ATOMS, NEB_POINTS, NUM_SIZES,
    UNCERT_STEPS,
};

use clap::Args;
use std::path::PathBuf;

/// compute 子命令参数
#[derive(Args, Debug)]
pub struct ComputeArgs {
    // ─────────────────────────────────────────────────────────────
    // 晶体
    // ─────────────────────────────────────────────────────────────
    /// Chemical symbol of the host element
    #[arg(short, long)]
    pub element: String,

    /// Lattice type (sc, fcc, bcc, diamond, hcp)
    #[arg(short, long)]
    pub lattice: String,

    /// Lattice constants in Å (a for cubic lattices, a,c for hcp)
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub constants: Vec<f64>,

    // ─────────────────────────────────────────────────────────────
    // Lennard-Jones 参考势
    // ─────────────────────────────────────────────────────────────
    /// Well depth in eV
    #[arg(long, default_value_t = 0.0104)]
    pub epsilon: f64,

    /// Zero-crossing distance in Å
    #[arg(long, default_value_t = 3.40)]
    pub sigma: f64,

    /// Cutoff radius in Å
    #[arg(long, default_value_t = 6.8)]
    pub cutoff: f64,

    // ─────────────────────────────────────────────────────────────
    // 计算参数
    // ─────────────────────────────────────────────────────────────
    /// Force tolerance for relaxations and path optimisation (eV/Å)
    #[arg(long, default_value_t = FMAX_TOL)]
    pub fmax: f64,

    /// Step budget for each relaxation
    #[arg(long, default_value_t = FIRE_MAX_STEPS)]
    pub relax_steps: usize,

    /// Step budget for the tighter re-relaxation that measures the residual
    #[arg(long, default_value_t = UNCERT_STEPS)]
    pub uncert_steps: usize,

    /// Step budget for path optimisation
    #[arg(long, default_value_t = MDMIN_MAX_STEPS)]
    pub neb_steps: usize,

    /// Number of interior images on the migration path
    #[arg(long, default_value_t = NEB_POINTS)]
    pub neb_points: usize,

    /// Minimum number of atoms in the smallest supercell
    #[arg(long, default_value_t = MIN_ATOMS)]
    pub min_atoms: usize,

    /// Number of consecutive supercell sizes
    #[arg(long, default_value_t = NUM_SIZES)]
    pub num_sizes: usize,

    /// Preferred hop direction in units of the conventional lattice vectors;
    /// the nearest neighbour of the vacancy closest to it hops
    #[arg(long, value_delimiter = ',', default_value = "1,0,0", allow_hyphen_values = true)]
    pub migration: Vec<f64>,

    /// Factor applied to the force tolerance for the residual probe
    #[arg(long, default_value_t = EPS)]
    pub eps: f64,

    /// JSON fit catalog replacing the built-in one
    #[arg(long)]
    pub fits: Option<PathBuf>,

    // ─────────────────────────────────────────────────────────────
    // 输出
    // ─────────────────────────────────────────────────────────────
    /// Write the two result records as JSON
    #[arg(long)]
    pub output_json: Option<PathBuf>,

    /// Write the per-size samples as CSV
    #[arg(long)]
    pub output_csv: Option<PathBuf>,

    /// Plot energies against L^-3 (PNG, or SVG by extension)
    #[arg(long)]
    pub plot: Option<PathBuf>,
}
