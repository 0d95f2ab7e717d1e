//! # 统一错误处理模块
//!
//! 定义空位计算的所有错误类型，使用 `thiserror` 派生。
//!
//! 可恢复的数值退化（弛豫步数耗尽、鞍点搜索未收敛、拟合矩阵秩亏）
//! 不在这里表示，而是作为 `converged` / `degraded` 标志随结果传播。
//! 这里只有必须中止计算的错误。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// 空位计算统一错误类型
#[derive(Error, Debug)]
pub enum VacancyError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // 配置错误（致命）
    // ─────────────────────────────────────────────────────────────
    #[error("Unsupported lattice type: {0} (expected one of sc, fcc, bcc, diamond, hcp)")]
    UnsupportedLattice(String),

    #[error("Degenerate migration path: {0}")]
    DegeneratePath(String),

    #[error("Supercell sizes must be strictly increasing and contiguous, got {0:?}")]
    NonContiguousSizes(Vec<usize>),

    #[error("Invalid fit #{fit_id}: {reason}")]
    InvalidFit { fit_id: usize, reason: String },

    #[error("Cell is {width:.3} Å wide, needs more than twice the cutoff ({cutoff:.3} Å)")]
    CellTooSmall { width: f64, cutoff: f64 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // 数值错误
    // ─────────────────────────────────────────────────────────────
    #[error("Singular linear system: {0}")]
    SingularSystem(String),

    #[error("Non-finite energy encountered: {0}")]
    NonFiniteEnergy(String),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("Plot error: {0}")]
    PlotError(String),
}

impl VacancyError {
    /// 是否属于配置错误（对该输入必须中止）
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            VacancyError::UnsupportedLattice(_)
                | VacancyError::DegeneratePath(_)
                | VacancyError::NonContiguousSizes(_)
                | VacancyError::InvalidFit { .. }
                | VacancyError::CellTooSmall { .. }
                | VacancyError::InvalidArgument(_)
        )
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, VacancyError>;
