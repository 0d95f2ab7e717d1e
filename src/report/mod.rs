//! # 结果输出模块
//!
//! - `table`: 终端表格
//! - `export`: 样本 CSV 与结果记录 JSON
//! - `plot`: 外推图 (PNG/SVG)
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/`

pub mod export;
pub mod plot;
pub mod table;

pub use export::{samples_from_csv, samples_to_csv, write_json};
pub use plot::{generate_extrapolation_plot, Series};
pub use table::{fits_table, results_table, samples_table};
