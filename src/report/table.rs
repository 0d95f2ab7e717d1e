//! # 终端表格
//!
//! 用 `tabled` 打印各尺寸样本与外推结果。
//!
//! ## 依赖关系
//! - 被 `commands/compute.rs`, `commands/extrapolate.rs` 使用
//! - 使用 `models/sample.rs`

use crate::models::{ExtrapolationResult, FitResult, SizeSample};

use tabled::{Table, Tabled};

/// 单尺寸样本行
#[derive(Debug, Clone, Tabled)]
struct SampleRow {
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Atoms")]
    atoms: usize,
    #[tabled(rename = "E_mig (eV)")]
    migration: String,
    #[tabled(rename = "E_form (eV)")]
    formation: String,
    #[tabled(rename = "E_form unrelaxed (eV)")]
    unrelaxed: String,
    #[tabled(rename = "Residual (eV)")]
    residual: String,
    #[tabled(rename = "Converged")]
    converged: &'static str,
}

/// 外推结果行
#[derive(Debug, Clone, Tabled)]
struct ResultRow {
    #[tabled(rename = "Quantity")]
    quantity: &'static str,
    #[tabled(rename = "Value (eV)")]
    value: String,
    #[tabled(rename = "Uncertainty (eV)")]
    uncertainty: String,
    #[tabled(rename = "Statistical")]
    statistical: String,
    #[tabled(rename = "Systematic")]
    systematic: String,
    #[tabled(rename = "Degradation")]
    degradation: String,
}

/// 拟合窗口行
#[derive(Debug, Clone, Tabled)]
struct FitRow {
    #[tabled(rename = "Fit")]
    fit_id: usize,
    #[tabled(rename = "Sizes")]
    sizes: String,
    #[tabled(rename = "c0 (eV)")]
    leading: String,
    #[tabled(rename = "Rank")]
    rank: String,
}

pub fn samples_table(samples: &[SizeSample]) -> String {
    let rows: Vec<SampleRow> = samples
        .iter()
        .map(|s| SampleRow {
            size: format!("{0}x{0}x{0}", s.size),
            atoms: s.n_atoms,
            migration: format!("{:.6}", s.migration_energy),
            formation: format!("{:.6}", s.formation_energy),
            unrelaxed: format!("{:.6}", s.unrelaxed_formation_energy),
            residual: format!("{:.3e}", s.relaxation_residual),
            converged: if s.degraded { "no" } else { "yes" },
        })
        .collect();
    Table::new(&rows).to_string()
}

pub fn results_table(migration: &ExtrapolationResult, formation: &ExtrapolationResult) -> String {
    let row = |quantity, r: &ExtrapolationResult| ResultRow {
        quantity,
        value: format!("{:.6}", r.value),
        uncertainty: format!("{:.6}", r.uncertainty),
        statistical: format!("{:.6}", r.statistical),
        systematic: format!("{:.6}", r.systematic),
        degradation: format!("{:.6}", r.degradation),
    };
    let rows = vec![
        row("Migration energy", migration),
        row("Formation energy", formation),
    ];
    Table::new(&rows).to_string()
}

pub fn fits_table(fits: &[Vec<FitResult>]) -> String {
    let rows: Vec<FitRow> = fits
        .iter()
        .flatten()
        .map(|f| FitRow {
            fit_id: f.fit_id,
            sizes: format!("{:?}", f.sizes),
            leading: format!("{:.6}", f.leading),
            rank: if f.is_ill_conditioned() {
                format!("{}/{} (!)", f.rank, f.coefficients.len())
            } else {
                format!("{}/{}", f.rank, f.coefficients.len())
            },
        })
        .collect();
    Table::new(&rows).to_string()
}
