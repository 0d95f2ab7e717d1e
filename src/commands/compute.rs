//! # compute 子命令实现
//!
//! 用 Lennard-Jones / FIRE / NEB 参考引擎跑完整的空位计算流程。
//!
//! ## 功能
//! - 按原子数与截断半径确定超胞尺寸
//! - 逐尺寸采样形成能与迁移能
//! - 外推并打印结果表格
//! - 可选输出样本 CSV、结果记录 JSON 和外推图
//!
//! ## 依赖关系
//! - 使用 `cli/compute.rs` 定义的参数
//! - 使用 `vacancy/pipeline.rs`, `engine/`, `report/`
//! - 使用 `utils/output.rs`

use crate::cli::compute::ComputeArgs;
use crate::config::{FitCatalog, VacancyConfig};
use crate::engine::{Fire, LennardJones, Neb, Potential};
use crate::error::{Result, VacancyError};
use crate::models::{BasisSpec, LatticeType};
use crate::report::{self, Series};
use crate::utils::output;
use crate::vacancy::VacancyPipeline;

/// 执行完整计算
pub fn execute(args: ComputeArgs) -> Result<()> {
    output::print_header("Vacancy Formation & Migration Energy");

    let lattice: LatticeType = args.lattice.parse()?;
    let migration: [f64; 3] = args.migration.as_slice().try_into().map_err(|_| {
        VacancyError::InvalidArgument(format!(
            "migration vector needs 3 components, got {:?}",
            args.migration
        ))
    })?;

    let config = VacancyConfig {
        fmax: args.fmax,
        relax_steps: args.relax_steps,
        neb_steps: args.neb_steps,
        uncert_steps: args.uncert_steps,
        min_atoms: args.min_atoms,
        neb_points: args.neb_points,
        eps: args.eps,
        num_sizes: args.num_sizes,
        migration,
    };

    let catalog = match &args.fits {
        Some(path) => {
            output::print_info(&format!("Loading fit catalog from '{}'", path.display()));
            FitCatalog::from_file(path)?
        }
        None => FitCatalog::default(),
    };

    let potential = LennardJones::new(args.epsilon, args.sigma, args.cutoff)?;
    let relaxer = Fire::default();
    let path_optimizer = Neb::default();

    let spec = BasisSpec::new(args.element.clone(), lattice, args.constants.clone());
    let pipeline = VacancyPipeline::new(
        spec,
        &potential,
        &relaxer,
        &path_optimizer,
        config,
        catalog,
    )?;

    let sizes = pipeline.size_range()?;
    let n_basis = pipeline.basis().len();
    output::print_info("Inputs:");
    output::print_detail("Element", &args.element);
    output::print_detail("Lattice", &lattice.to_string());
    output::print_detail("Lattice constants", &format!("{:?} Å", args.constants));
    output::print_detail("Basis", &pipeline.basis().formula());
    output::print_detail("Potential", &potential.name());
    if lattice == LatticeType::Fcc {
        output::print_detail(
            "LJ fcc equilibrium a",
            &format!("{:.4} Å", potential.fcc_lattice_constant()),
        );
    }
    output::print_detail(
        "Supercell sizes",
        &format!("{} to {}", sizes.start(), sizes.end()),
    );
    output::print_detail(
        "System sizes",
        &format!(
            "{} to {} atoms",
            n_basis * sizes.start().pow(3),
            n_basis * sizes.end().pow(3)
        ),
    );

    output::print_separator();
    let results = pipeline.run()?;

    if !output::is_quiet() {
        println!("\n{}", report::samples_table(&results.samples));
    }
    println!("\n{}", report::results_table(&results.migration, &results.formation));
    output::print_detail(
        "Relaxation residual",
        &format!("{:.3e} eV", results.residual),
    );

    if results.migration.degraded {
        output::print_warning(
            "Some relaxations or path optimisations did not converge; results are flagged as degraded",
        );
    }

    if let Some(path) = &args.output_csv {
        report::samples_to_csv(&results.samples, path)?;
        output::print_success(&format!("Samples written to '{}'", path.display()));
    }

    if let Some(path) = &args.output_json {
        report::write_json(&results.records, path)?;
        output::print_success(&format!("Result records written to '{}'", path.display()));
    }

    if let Some(path) = &args.plot {
        let series = [
            Series::migration(&results.samples, &results.migration),
            Series::formation(&results.samples, &results.formation),
        ];
        let title = format!("{} ({}) vacancy", args.element, lattice);
        report::generate_extrapolation_plot(&series, path, &title)?;
        output::print_success(&format!("Plot saved to '{}'", path.display()));
    }

    output::print_done("Vacancy calculation finished");
    Ok(())
}
