//! # 空位形成能与迁移能
//!
//! - `sampler`: 单个超胞尺寸的形成能、迁移能与弛豫残差
//! - `saddle`: 迁移路径上的鞍点搜索
//! - `extrapolate`: 反幂律拟合外推到无限尺寸
//! - `pipeline`: 多尺寸采样、外推与结果记录
//!
//! 核心只通过 `engine` 中的 trait 调用物理计算。
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `engine/`, `numerics/`, `models/`, `config.rs`

pub mod extrapolate;
pub mod pipeline;
pub mod saddle;
pub mod sampler;

pub use extrapolate::SizeExtrapolator;
pub use pipeline::VacancyPipeline;
pub use saddle::{find_saddle_with, SaddleSearch};
