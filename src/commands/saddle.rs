//! # saddle 子命令实现
//!
//! 对命令行给出的路径能量求鞍点。
//!
//! ## 依赖关系
//! - 使用 `cli/saddle.rs` 定义的参数
//! - 使用 `vacancy/saddle.rs`

use crate::cli::saddle::SaddleArgs;
use crate::error::Result;
use crate::models::PathSample;
use crate::utils::output;
use crate::vacancy::{find_saddle_with, SaddleSearch};

/// 执行鞍点搜索
pub fn execute(args: SaddleArgs) -> Result<()> {
    output::print_header("Saddle Point Search");

    let path = PathSample::new(args.energies)?;
    let search = SaddleSearch {
        xatol: args.xatol,
        fatol: args.fatol,
        max_iter: args.max_iter,
    };

    output::print_info(&format!(
        "{} images ({} interior), starting at x = {}",
        path.len(),
        path.interior_images(),
        path.midpoint()
    ));

    let saddle = find_saddle_with(&path, &search)?;
    let (max_index, max_energy) = path.max_sample();

    println!("Saddle position : {:.6}", saddle.position);
    println!("Saddle energy   : {:.6} eV", saddle.energy);
    println!("Barrier         : {:.6} eV", saddle.energy - path.energies()[0]);
    output::print_detail(
        "Highest image",
        &format!("#{} at {:.6} eV", max_index, max_energy),
    );
    output::print_detail("Iterations", &saddle.iterations.to_string());

    if saddle.converged {
        output::print_success("Saddle search converged");
    }

    Ok(())
}
