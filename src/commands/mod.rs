//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `vacancy/`, `engine/`, `report/`, `utils/`
//! - 子模块: compute, extrapolate, saddle

pub mod compute;
pub mod extrapolate;
pub mod saddle;

use crate::cli::Commands;
use crate::error::{Result, VacancyError};

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Compute(args) => compute::execute(args),
        Commands::Extrapolate(args) => extrapolate::execute(args),
        Commands::Saddle(args) => saddle::execute(args),
    }
}

/// 配置全局 rayon 线程池（0 = CPU 核数）
pub fn init_thread_pool(jobs: usize) -> Result<()> {
    let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
    rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build_global()
        .map_err(|e| {
            VacancyError::InvalidArgument(format!("cannot start {} worker threads: {}", jobs, e))
        })
}
