//! # extrapolate 子命令实现
//!
//! 读取 `compute --output-csv` 写出的样本表，重新做尺寸外推。
//! 便于在不重跑弛豫的情况下尝试其他拟合目录。
//!
//! ## 依赖关系
//! - 使用 `cli/extrapolate.rs` 定义的参数
//! - 使用 `vacancy/extrapolate.rs`, `report/`

use crate::cli::extrapolate::ExtrapolateArgs;
use crate::config::FitCatalog;
use crate::error::Result;
use crate::models::sample::max_relaxation_residual;
use crate::models::ExtrapolationResult;
use crate::report::{self, Series};
use crate::utils::output;
use crate::vacancy::SizeExtrapolator;

use serde::Serialize;

/// 外推摘要（JSON 输出）
#[derive(Debug, Serialize)]
struct Summary {
    sizes: Vec<usize>,
    residual: f64,
    migration: ExtrapolationResult,
    formation: ExtrapolationResult,
}

/// 执行外推
pub fn execute(args: ExtrapolateArgs) -> Result<()> {
    output::print_header("Size Extrapolation");

    let samples = report::samples_from_csv(&args.input)?;
    output::print_info(&format!(
        "Loaded {} samples from '{}'",
        samples.len(),
        args.input.display()
    ));

    let catalog = match &args.fits {
        Some(path) => FitCatalog::from_file(path)?,
        None => FitCatalog::default(),
    };

    let sizes: Vec<usize> = samples.iter().map(|s| s.size).collect();
    let migration_values: Vec<f64> = samples.iter().map(|s| s.migration_energy).collect();
    let formation_values: Vec<f64> = samples.iter().map(|s| s.formation_energy).collect();

    let residual = args
        .systematic
        .unwrap_or_else(|| max_relaxation_residual(&samples));

    let extrapolator = SizeExtrapolator::new(&catalog);
    let mut migration = extrapolator.extrapolate(
        &sizes,
        &migration_values,
        &catalog.migration,
        residual * std::f64::consts::SQRT_2,
    )?;
    let mut formation =
        extrapolator.extrapolate(&sizes, &formation_values, &catalog.formation, residual)?;
    migration.account_for_degraded(&samples, |s| s.migration_energy);
    formation.account_for_degraded(&samples, |s| s.formation_energy);

    if args.show_fits {
        output::print_info("Migration energy fits:");
        println!("{}", report::fits_table(&extrapolator.fit_all(&sizes, &migration_values)?));
        output::print_info("Formation energy fits:");
        println!("{}", report::fits_table(&extrapolator.fit_all(&sizes, &formation_values)?));
    }

    println!("\n{}", report::results_table(&migration, &formation));
    if migration.degraded {
        output::print_warning("Input contains unconverged samples; results are flagged as degraded");
    }

    if let Some(path) = &args.output_json {
        let summary = Summary {
            sizes,
            residual,
            migration,
            formation,
        };
        report::write_json(&summary, path)?;
        output::print_success(&format!("Summary written to '{}'", path.display()));
    }

    if let Some(path) = &args.plot {
        let series = [
            Series::migration(&samples, &migration),
            Series::formation(&samples, &formation),
        ];
        report::generate_extrapolation_plot(&series, path, "Size extrapolation")?;
        output::print_success(&format!("Plot saved to '{}'", path.display()));
    }

    Ok(())
}
