//! # 三次样条插值
//!
//! 通过离散点 (x_i, y_i) 构造 C² 连续的三次样条。端点采用 not-a-knot
//! 条件（第二个和倒数第二个节点处三阶导数连续），与 scipy
//! `interp1d(kind="cubic")` 的行为一致；只有 3 个点时退化为过这三点的抛物线。
//!
//! ## 依赖关系
//! - 被 `vacancy/saddle.rs` 使用
//! - 使用 `nalgebra` 求解节点二阶导数的线性方程组

use crate::error::{Result, VacancyError};

use nalgebra::{DMatrix, DVector};

/// 三次样条
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// 各节点处的二阶导数
    m: Vec<f64>,
}

impl CubicSpline {
    /// 构造样条；`x` 必须严格递增且至少 3 个点
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self> {
        if x.len() != y.len() {
            return Err(VacancyError::InvalidArgument(format!(
                "spline needs equal-length inputs, got {} x and {} y",
                x.len(),
                y.len()
            )));
        }
        if x.len() < 3 {
            return Err(VacancyError::InvalidArgument(format!(
                "cubic spline needs at least 3 points, got {}",
                x.len()
            )));
        }
        if x.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(VacancyError::InvalidArgument(
                "spline abscissae must be strictly increasing".to_string(),
            ));
        }

        let m = if x.len() == 3 {
            // 抛物线：二阶导数处处相同
            let h0 = x[1] - x[0];
            let h1 = x[2] - x[1];
            let curvature = 2.0 * ((y[2] - y[1]) / h1 - (y[1] - y[0]) / h0) / (h0 + h1);
            vec![curvature; 3]
        } else {
            Self::not_a_knot_moments(x, y)?
        };

        Ok(CubicSpline {
            x: x.to_vec(),
            y: y.to_vec(),
            m,
        })
    }

    /// 求解 not-a-knot 条件下的节点二阶导数
    fn not_a_knot_moments(x: &[f64], y: &[f64]) -> Result<Vec<f64>> {
        let n = x.len();
        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

        let mut a = DMatrix::<f64>::zeros(n, n);
        let mut rhs = DVector::<f64>::zeros(n);

        // 第一行：x_1 处三阶导数连续
        a[(0, 0)] = h[1];
        a[(0, 1)] = -(h[0] + h[1]);
        a[(0, 2)] = h[0];

        for i in 1..n - 1 {
            a[(i, i - 1)] = h[i - 1];
            a[(i, i)] = 2.0 * (h[i - 1] + h[i]);
            a[(i, i + 1)] = h[i];
            rhs[i] = 6.0 * ((y[i + 1] - y[i]) / h[i] - (y[i] - y[i - 1]) / h[i - 1]);
        }

        // 最后一行：x_{n-2} 处三阶导数连续
        a[(n - 1, n - 3)] = h[n - 2];
        a[(n - 1, n - 2)] = -(h[n - 3] + h[n - 2]);
        a[(n - 1, n - 1)] = h[n - 3];

        let moments = a.lu().solve(&rhs).ok_or_else(|| {
            VacancyError::SingularSystem("not-a-knot spline system".to_string())
        })?;

        Ok(moments.iter().copied().collect())
    }

    /// 定义域 [x_0, x_{n-1}]
    pub fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    /// 求值；定义域之外返回 `None`
    pub fn eval(&self, t: f64) -> Option<f64> {
        let (lo, hi) = self.domain();
        if !(t >= lo && t <= hi) {
            return None;
        }

        // 所在区间 [x_i, x_{i+1}]
        let i = match self.x.iter().rposition(|&xi| xi <= t) {
            Some(i) if i >= self.x.len() - 1 => self.x.len() - 2,
            Some(i) => i,
            None => 0,
        };

        let h = self.x[i + 1] - self.x[i];
        let left = self.x[i + 1] - t;
        let right = t - self.x[i];

        Some(
            self.m[i] * left.powi(3) / (6.0 * h)
                + self.m[i + 1] * right.powi(3) / (6.0 * h)
                + (self.y[i] / h - self.m[i] * h / 6.0) * left
                + (self.y[i + 1] / h - self.m[i + 1] * h / 6.0) * right,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolates_knots() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [0.0, 0.3, 0.9, 1.0, 0.4, 0.1];
        let spline = CubicSpline::new(&x, &y).unwrap();

        for (xi, yi) in x.iter().zip(&y) {
            assert!((spline.eval(*xi).unwrap() - yi).abs() < 1e-12);
        }
    }

    #[test]
    fn test_reproduces_cubic_exactly() {
        // not-a-knot 样条对三次多项式精确
        let f = |t: f64| 0.5 * t.powi(3) - 2.0 * t * t + t - 1.0;
        let x: Vec<f64> = (0..6).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&t| f(t)).collect();
        let spline = CubicSpline::new(&x, &y).unwrap();

        for t in [0.25, 1.5, 2.75, 4.9] {
            assert!((spline.eval(t).unwrap() - f(t)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_three_points_parabola() {
        let spline = CubicSpline::new(&[0.0, 1.0, 2.0], &[0.0, 1.0, 0.0]).unwrap();
        // y = 1 - (x - 1)^2
        assert!((spline.eval(0.5).unwrap() - 0.75).abs() < 1e-12);
        assert!((spline.eval(1.0).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_domain() {
        let spline = CubicSpline::new(&[0.0, 1.0, 2.0, 3.0], &[0.0, 1.0, 1.0, 0.0]).unwrap();
        assert!(spline.eval(-0.1).is_none());
        assert!(spline.eval(3.1).is_none());
        assert!(spline.eval(f64::NAN).is_none());
        assert!(spline.eval(3.0).is_some());
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(CubicSpline::new(&[0.0, 1.0], &[0.0, 1.0]).is_err());
        assert!(CubicSpline::new(&[0.0, 2.0, 1.0], &[0.0, 1.0, 2.0]).is_err());
        assert!(CubicSpline::new(&[0.0, 1.0, 2.0], &[0.0, 1.0]).is_err());
    }
}
