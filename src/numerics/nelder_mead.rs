//! # Nelder-Mead 单纯形最小化
//!
//! 无导数最小化器，系数与初始单纯形遵循 scipy `fmin` 的约定：
//! 反射 1、扩张 2、收缩 0.5、收缩全体 0.5；初始顶点在各坐标上放大 5%
//! （坐标为 0 时取 0.00025）。
//!
//! 达到迭代上限时返回当前最优顶点，并把 `converged` 置为 false，
//! 由调用方决定如何处理。
//!
//! ## 依赖关系
//! - 被 `vacancy/saddle.rs` 使用
//! - 无外部模块依赖

/// 最小化器参数
#[derive(Debug, Clone, Copy)]
pub struct NelderMead {
    /// 单纯形顶点间距收敛阈值
    pub xatol: f64,
    /// 函数值收敛阈值
    pub fatol: f64,
    /// 最大迭代次数
    pub max_iter: usize,
}

/// 最小化结果
#[derive(Debug, Clone)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub converged: bool,
}

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;
const NONZERO_DELTA: f64 = 0.05;
const ZERO_DELTA: f64 = 0.00025;

impl Default for NelderMead {
    fn default() -> Self {
        NelderMead {
            xatol: 1e-4,
            fatol: 1e-4,
            max_iter: 200,
        }
    }
}

impl NelderMead {
    /// 从 `x0` 出发最小化 `f`
    pub fn minimize<F>(&self, mut f: F, x0: &[f64]) -> Minimum
    where
        F: FnMut(&[f64]) -> f64,
    {
        let n = x0.len();
        let mut evaluations = 0usize;
        let mut eval = |x: &[f64]| {
            evaluations += 1;
            f(x)
        };

        // 初始单纯形
        let mut sim: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
        sim.push(x0.to_vec());
        for k in 0..n {
            let mut y = x0.to_vec();
            y[k] = if y[k] != 0.0 {
                (1.0 + NONZERO_DELTA) * y[k]
            } else {
                ZERO_DELTA
            };
            sim.push(y);
        }
        let mut fsim: Vec<f64> = sim.iter().map(|x| eval(x)).collect();
        sort_simplex(&mut sim, &mut fsim);

        let mut iterations = 0usize;
        let mut converged = false;

        while iterations < self.max_iter {
            if self.is_converged(&sim, &fsim) {
                converged = true;
                break;
            }

            // 除最差顶点外的质心
            let mut xbar = vec![0.0; n];
            for vertex in &sim[..n] {
                for (c, v) in xbar.iter_mut().zip(vertex) {
                    *c += v / n as f64;
                }
            }
            let worst = sim[n].clone();
            let along = |t: f64| -> Vec<f64> {
                xbar.iter()
                    .zip(&worst)
                    .map(|(c, w)| (1.0 + t) * c - t * w)
                    .collect()
            };

            let xr = along(REFLECT);
            let fxr = eval(&xr);
            let mut shrink = false;

            if fxr < fsim[0] {
                let xe = along(REFLECT * EXPAND);
                let fxe = eval(&xe);
                if fxe < fxr {
                    sim[n] = xe;
                    fsim[n] = fxe;
                } else {
                    sim[n] = xr;
                    fsim[n] = fxr;
                }
            } else if fxr < fsim[n - 1] {
                sim[n] = xr;
                fsim[n] = fxr;
            } else if fxr < fsim[n] {
                // 外收缩
                let xc = along(CONTRACT * REFLECT);
                let fxc = eval(&xc);
                if fxc <= fxr {
                    sim[n] = xc;
                    fsim[n] = fxc;
                } else {
                    shrink = true;
                }
            } else {
                // 内收缩
                let xcc = along(-CONTRACT);
                let fxcc = eval(&xcc);
                if fxcc < fsim[n] {
                    sim[n] = xcc;
                    fsim[n] = fxcc;
                } else {
                    shrink = true;
                }
            }

            if shrink {
                let best = sim[0].clone();
                for j in 1..=n {
                    for (v, b) in sim[j].iter_mut().zip(&best) {
                        *v = b + SHRINK * (*v - b);
                    }
                    fsim[j] = eval(&sim[j]);
                }
            }

            iterations += 1;
            sort_simplex(&mut sim, &mut fsim);
        }

        if !converged && self.is_converged(&sim, &fsim) {
            converged = true;
        }

        Minimum {
            x: sim.swap_remove(0),
            value: fsim[0],
            iterations,
            evaluations,
            converged,
        }
    }

    fn is_converged(&self, sim: &[Vec<f64>], fsim: &[f64]) -> bool {
        let x_spread = sim[1..]
            .iter()
            .flat_map(|v| v.iter().zip(&sim[0]).map(|(a, b)| (a - b).abs()))
            .fold(0.0, f64::max);
        let f_spread = fsim[1..]
            .iter()
            .map(|f| (f - fsim[0]).abs())
            .fold(0.0, f64::max);
        x_spread <= self.xatol && f_spread <= self.fatol
    }
}

/// 按函数值升序排列顶点
fn sort_simplex(sim: &mut Vec<Vec<f64>>, fsim: &mut Vec<f64>) {
    let mut order: Vec<usize> = (0..fsim.len()).collect();
    order.sort_by(|&a, &b| {
        fsim[a]
            .partial_cmp(&fsim[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let new_sim: Vec<Vec<f64>> = order.iter().map(|&i| sim[i].clone()).collect();
    let new_fsim: Vec<f64> = order.iter().map(|&i| fsim[i]).collect();
    *sim = new_sim;
    *fsim = new_fsim;
}
