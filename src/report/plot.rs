//! # 外推图
//!
//! 使用 `plotters` 画出各尺寸的能量随 L^-3 的变化，以及 L^-3 = 0 处的外推值和误差棒。
//! 输出格式由扩展名决定（`.svg` 为 SVG，其余为 PNG）。
//!
//! ## 依赖关系
//! - 被 `commands/compute.rs`, `commands/extrapolate.rs` 调用
//! - 使用 `plotters` 渲染图表

use crate::error::{Result, VacancyError};
use crate::models::{ExtrapolationResult, SizeSample};

use plotters::prelude::*;
use std::path::Path;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 700;

/// 一条能量序列：(L^-3, E) 与外推点
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: &'static str,
    pub points: Vec<(f64, f64)>,
    pub extrapolated: ExtrapolationResult,
}

impl Series {
    pub fn migration(samples: &[SizeSample], result: &ExtrapolationResult) -> Self {
        Series {
            label: "Migration energy",
            points: samples
                .iter()
                .map(|s| (inverse_volume(s.size), s.migration_energy))
                .collect(),
            extrapolated: *result,
        }
    }

    pub fn formation(samples: &[SizeSample], result: &ExtrapolationResult) -> Self {
        Series {
            label: "Formation energy",
            points: samples
                .iter()
                .map(|s| (inverse_volume(s.size), s.formation_energy))
                .collect(),
            extrapolated: *result,
        }
    }

    /// 数据与误差棒覆盖的 y 范围，两端各留 10%
    fn y_range(&self) -> (f64, f64) {
        let e = &self.extrapolated;
        let (lo, hi) = self
            .points
            .iter()
            .map(|(_, y)| *y)
            .chain([e.value - e.uncertainty, e.value + e.uncertainty])
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
                (lo.min(y), hi.max(y))
            });
        let pad = ((hi - lo) * 0.1).max(1e-4);
        (lo - pad, hi + pad)
    }

    fn x_max(&self) -> f64 {
        let max = self.points.iter().map(|(x, _)| *x).fold(0.0, f64::max);
        if max > 0.0 {
            max * 1.1
        } else {
            1.0
        }
    }
}

fn inverse_volume(size: usize) -> f64 {
    (size as f64).powi(-3)
}

/// 把每条序列画在单独的子图中
pub fn generate_extrapolation_plot(series: &[Series], output_path: &Path, title: &str) -> Result<()> {
    let use_svg = output_path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("svg"))
        .unwrap_or(false);

    if use_svg {
        let root = SVGBackend::new(output_path, (WIDTH, HEIGHT)).into_drawing_area();
        draw(&root, series, title)?;
        root.present()
            .map_err(|e| VacancyError::PlotError(e.to_string()))?;
    } else {
        let root = BitMapBackend::new(output_path, (WIDTH, HEIGHT)).into_drawing_area();
        draw(&root, series, title)?;
        root.present()
            .map_err(|e| VacancyError::PlotError(e.to_string()))?;
    }
    Ok(())
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    series: &[Series],
    title: &str,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)
        .map_err(|e| VacancyError::PlotError(format!("{:?}", e)))?;
    let root = root
        .titled(title, ("sans-serif", 26))
        .map_err(|e| VacancyError::PlotError(format!("{:?}", e)))?;

    let panels = root.split_evenly((1, series.len().max(1)));
    let colors = [RGBColor(0, 102, 204), RGBColor(204, 51, 0)];

    for (i, (panel, s)) in panels.iter().zip(series).enumerate() {
        let color = colors[i % colors.len()];
        let (y_min, y_max) = s.y_range();

        let mut chart = ChartBuilder::on(panel)
            .caption(s.label, ("sans-serif", 20).into_font())
            .margin(20)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d(0.0..s.x_max(), y_min..y_max)
            .map_err(|e| VacancyError::PlotError(format!("{:?}", e)))?;

        chart
            .configure_mesh()
            .x_desc("L^-3")
            .y_desc("Energy (eV)")
            .x_label_formatter(&|x| format!("{:.1e}", x))
            .y_label_formatter(&|y| format!("{:.4}", y))
            .x_label_style(("sans-serif", 13))
            .y_label_style(("sans-serif", 13))
            .axis_desc_style(("sans-serif", 15))
            .draw()
            .map_err(|e| VacancyError::PlotError(format!("{:?}", e)))?;

        chart
            .draw_series(LineSeries::new(s.points.iter().copied(), color.stroke_width(1)))
            .map_err(|e| VacancyError::PlotError(format!("{:?}", e)))?;
        chart
            .draw_series(
                s.points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 5, color.filled())),
            )
            .map_err(|e| VacancyError::PlotError(format!("{:?}", e)))?;

        // L → ∞ 的外推值
        let e = &s.extrapolated;
        chart
            .draw_series(std::iter::once(ErrorBar::new_vertical(
                0.0,
                e.value - e.uncertainty,
                e.value,
                e.value + e.uncertainty,
                BLACK.stroke_width(2),
                12,
            )))
            .map_err(|e| VacancyError::PlotError(format!("{:?}", e)))?;
        chart
            .draw_series(std::iter::once(Text::new(
                format!("{:.4} ± {:.4} eV", e.value, e.uncertainty),
                (s.x_max() * 0.05, y_max - (y_max - y_min) * 0.05),
                ("sans-serif", 14).into_font().color(&BLACK),
            )))
            .map_err(|e| VacancyError::PlotError(format!("{:?}", e)))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<SizeSample> {
        [(4, 0.6458, 0.6791), (5, 0.6445, 0.6788), (6, 0.6441, 0.6787)]
            .iter()
            .map(|&(size, m, f)| SizeSample {
                size,
                migration_energy: m,
                formation_energy: f,
                relaxation_residual: 0.0,
                unrelaxed_formation_energy: 0.0,
                cohesive_energy_per_atom: 0.0,
                n_atoms: 0,
                degraded: false,
            })
            .collect()
    }

    fn result(value: f64, uncertainty: f64) -> ExtrapolationResult {
        ExtrapolationResult {
            value,
            uncertainty,
            statistical: uncertainty,
            systematic: 0.0,
            degradation: 0.0,
            degraded: false,
        }
    }

    #[test]
    fn test_series_uses_inverse_volume() {
        let series = Series::migration(&samples(), &result(0.6436, 0.0003));
        assert!((series.points[0].0 - 1.0 / 64.0).abs() < 1e-15);
        assert!((series.points[2].0 - 1.0 / 216.0).abs() < 1e-15);
        assert!((series.x_max() - 1.1 / 64.0).abs() < 1e-15);
    }

    #[test]
    fn test_y_range_covers_error_bar() {
        let series = Series::formation(&samples(), &result(0.6780, 0.002));
        let (lo, hi) = series.y_range();
        assert!(lo < 0.676);
        assert!(hi > 0.6791);
    }

    #[test]
    fn test_flat_series_has_nonzero_range() {
        let flat: Vec<SizeSample> = samples()
            .into_iter()
            .map(|mut s| {
                s.migration_energy = 0.5;
                s
            })
            .collect();
        let (lo, hi) = Series::migration(&flat, &result(0.5, 0.0)).y_range();
        assert!(hi - lo > 0.0);
    }
}
