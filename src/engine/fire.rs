//! # FIRE 结构弛豫
//!
//! Fast Inertial Relaxation Engine (Bitzek et al., PRL 97, 170201)。
//! 参数取常用默认值；单步位移按整体模长限制在 `max_move` 以内。
//!
//! 收敛判据：最大单原子力模长 < fmax。
//!
//! ## 依赖关系
//! - 实现 `engine::Relaxer`
//! - 使用 `engine::Potential`

use crate::engine::{max_force, Potential, RelaxOutcome, Relaxer};
use crate::error::Result;
use crate::models::Structure;
use crate::numerics::vec3;

/// FIRE 参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fire {
    /// 初始时间步
    pub dt: f64,
    /// 最大时间步
    pub dt_max: f64,
    /// 沿力方向连续下降多少步后开始加速
    pub n_min: usize,
    pub f_inc: f64,
    pub f_dec: f64,
    /// 初始混合系数
    pub alpha: f64,
    pub f_alpha: f64,
    /// 单步最大位移 (Å)
    pub max_move: f64,
}

impl Default for Fire {
    fn default() -> Self {
        Fire {
            dt: 0.1,
            dt_max: 1.0,
            n_min: 5,
            f_inc: 1.1,
            f_dec: 0.5,
            alpha: 0.1,
            f_alpha: 0.99,
            max_move: 0.2,
        }
    }
}

fn global_dot(a: &[[f64; 3]], b: &[[f64; 3]]) -> f64 {
    a.iter().zip(b).map(|(x, y)| vec3::dot(x, y)).sum()
}

impl Relaxer for Fire {
    fn relax(
        &self,
        potential: &dyn Potential,
        structure: &mut Structure,
        fmax: f64,
        max_steps: usize,
    ) -> Result<RelaxOutcome> {
        let n = structure.len();
        let mut velocity = vec![[0.0; 3]; n];
        let mut dt = self.dt;
        let mut alpha = self.alpha;
        let mut downhill = 0usize;
        let mut step = 0usize;

        loop {
            let (energy, forces) = potential.energy_and_forces(structure)?;
            if max_force(&forces) < fmax {
                return Ok(RelaxOutcome {
                    energy,
                    steps: step,
                    converged: true,
                });
            }
            if step >= max_steps {
                return Ok(RelaxOutcome {
                    energy,
                    steps: step,
                    converged: false,
                });
            }

            let power = global_dot(&forces, &velocity);
            if power > 0.0 {
                let v_norm = global_dot(&velocity, &velocity).sqrt();
                let f_norm = global_dot(&forces, &forces).sqrt();
                for (v, f) in velocity.iter_mut().zip(&forces) {
                    *v = vec3::add(
                        &vec3::scale(v, 1.0 - alpha),
                        &vec3::scale(f, alpha * v_norm / f_norm),
                    );
                }
                if downhill > self.n_min {
                    dt = (dt * self.f_inc).min(self.dt_max);
                    alpha *= self.f_alpha;
                }
                downhill += 1;
            } else {
                velocity.iter_mut().for_each(|v| *v = [0.0; 3]);
                alpha = self.alpha;
                dt *= self.f_dec;
                downhill = 0;
            }

            // 欧拉积分
            let mut moves: Vec<[f64; 3]> = velocity
                .iter_mut()
                .zip(&forces)
                .map(|(v, f)| {
                    *v = vec3::add(v, &vec3::scale(f, dt));
                    vec3::scale(v, dt)
                })
                .collect();

            let length = global_dot(&moves, &moves).sqrt();
            if length > self.max_move {
                let factor = self.max_move / length;
                moves.iter_mut().for_each(|d| *d = vec3::scale(d, factor));
            }

            for (atom, d) in structure.atoms.iter_mut().zip(&moves) {
                atom.position = vec3::add(&atom.position, d);
            }
            step += 1;
        }
    }
}
