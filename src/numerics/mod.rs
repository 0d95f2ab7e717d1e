//! # 数值工具模块
//!
//! 鞍点搜索与尺寸外推所需的数值算法。
//!
//! ## 依赖关系
//! - 被 `models/`, `engine/`, `vacancy/` 使用
//! - 子模块: vec3, spline, nelder_mead, lstsq

pub mod lstsq;
pub mod nelder_mead;
pub mod spline;
pub mod vec3;

pub use nelder_mead::NelderMead;
pub use spline::CubicSpline;
