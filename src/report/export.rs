//! # 结果导出
//!
//! - CSV: 每个尺寸一行的样本表，可被 `extrapolate` 子命令读回
//! - JSON: 结果记录或外推摘要
//!
//! ## 依赖关系
//! - 被 `commands/compute.rs`, `commands/extrapolate.rs` 调用
//! - 使用 `csv`, `serde_json`

use crate::error::{Result, VacancyError};
use crate::models::SizeSample;

use serde::Serialize;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// 写出样本 CSV
pub fn samples_to_csv(samples: &[SizeSample], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    for sample in samples {
        wtr.serialize(sample)?;
    }

    wtr.flush().map_err(|e| VacancyError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// 读取样本 CSV，按尺寸排序
///
/// 至少需要 `size`, `migration_energy`, `formation_energy`, `relaxation_residual` 四列。
pub fn samples_from_csv(input_path: &Path) -> Result<Vec<SizeSample>> {
    if !input_path.exists() {
        return Err(VacancyError::FileNotFound {
            path: input_path.display().to_string(),
        });
    }

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(input_path)?;

    let mut samples = Vec::new();
    for (line, row) in rdr.deserialize::<SizeSample>().enumerate() {
        let sample = row.map_err(|e| VacancyError::ParseError {
            format: "CSV".to_string(),
            path: input_path.display().to_string(),
            reason: format!("row {}: {}", line + 1, e),
        })?;
        samples.push(sample);
    }

    if samples.is_empty() {
        return Err(VacancyError::ParseError {
            format: "CSV".to_string(),
            path: input_path.display().to_string(),
            reason: "no samples".to_string(),
        });
    }

    samples.sort_by_key(|s| s.size);
    Ok(samples)
}

/// 以缩进格式写出 JSON
pub fn write_json<T: Serialize + ?Sized>(value: &T, output_path: &Path) -> Result<()> {
    let file = File::create(output_path).map_err(|e| VacancyError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer).map_err(|e| VacancyError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;
    writer.flush().map_err(|e| VacancyError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}
