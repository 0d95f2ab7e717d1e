//! # 数据模型模块
//!
//! 定义晶体结构、采样结果和结果记录的数据模型。
//!
//! ## 依赖关系
//! - 被 `engine/`, `vacancy/`, `report/` 和 `commands/` 使用
//! - 子模块: structure, basis, sample, record

pub mod basis;
pub mod record;
pub mod sample;
pub mod structure;

pub use basis::{BasisSpec, CrystalInfo, LatticeType};
pub use record::{PropertyValue, RecordValue, ResultRecord};
pub use sample::{ExtrapolationResult, FitResult, PathSample, SizeSample};
pub use structure::Structure;
