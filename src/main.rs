//! # vacancy - 单空位形成能与迁移能计算
//!
//! 在一系列超胞尺寸上弛豫空位结构、用 NEB 求迁移路径，
//! 再按 L^-n 拟合外推到无限尺寸。
//!
//! ## 子命令
//! - `compute`     - 完整流程（Lennard-Jones 参考势）
//! - `extrapolate` - 由已有样本 CSV 重新外推
//! - `saddle`      - 由路径能量序列求鞍点
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── vacancy/   (采样、鞍点、外推、流程编排)
//!   │     ├── engine/    (势函数、弛豫、NEB)
//!   │     ├── numerics/  (样条、Nelder-Mead、最小二乘)
//!   │     ├── models/    (数据模型)
//!   │     └── report/    (表格、CSV/JSON、绘图)
//!   ├── config.rs   (默认参数与拟合目录)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod cli;
mod commands;
mod config;
mod engine;
mod error;
mod models;
mod numerics;
mod report;
mod utils;
mod vacancy;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();
    utils::output::set_quiet(cli.quiet);

    let result = commands::init_thread_pool(cli.jobs).and_then(|_| commands::run(cli.command));
    if let Err(e) = result {
        utils::output::print_error(&format!("{}", e));
        if e.is_configuration() {
            utils::output::print_warning("Check the command-line arguments and fit catalog");
        }
        std::process::exit(1);
    }
}
