//! # 微动弹性带 (NEB)
//!
//! 改进切线 NEB (Henkelman & Jónsson, JCP 113, 9978)，用 MDMin 优化中间映像。
//! 端点固定不动；每一步各映像的能量与力用 rayon 并行计算。
//!
//! 收敛判据：所有中间映像上最大单原子 NEB 力模长 < fmax。
//!
//! ## 依赖关系
//! - 实现 `engine::PathOptimizer`
//! - 使用 `engine::Potential`, `rayon`

use crate::engine::{max_force, PathOptimizer, PathOutcome, Potential};
use crate::error::{Result, VacancyError};
use crate::models::Structure;
use crate::numerics::vec3;

use rayon::prelude::*;

/// NEB + MDMin 参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neb {
    /// 弹簧常数 (eV/Å²)
    pub spring: f64,
    /// MDMin 时间步
    pub dt: f64,
    /// 单原子单步最大位移 (Å)
    pub max_move: f64,
}

impl Default for Neb {
    fn default() -> Self {
        Neb {
            spring: 0.1,
            dt: 0.2,
            max_move: 0.2,
        }
    }
}

type Field = Vec<[f64; 3]>;

fn field_dot(a: &[Field], b: &[Field]) -> f64 {
    a.iter()
        .zip(b)
        .flat_map(|(x, y)| x.iter().zip(y))
        .map(|(p, q)| vec3::dot(p, q))
        .sum()
}

fn field_norm(a: &[[f64; 3]]) -> f64 {
    a.iter().map(|p| vec3::dot(p, p)).sum::<f64>().sqrt()
}

fn difference(a: &Structure, b: &Structure) -> Field {
    a.atoms
        .iter()
        .zip(&b.atoms)
        .map(|(p, q)| vec3::sub(&p.position, &q.position))
        .collect()
}

impl Neb {
    /// 中间映像 `i` 的切线（单位化）
    fn tangent(&self, images: &[Structure], energies: &[f64], i: usize) -> Field {
        let forward = difference(&images[i + 1], &images[i]);
        let backward = difference(&images[i], &images[i - 1]);
        let (e_prev, e, e_next) = (energies[i - 1], energies[i], energies[i + 1]);

        let tangent: Field = if e_next > e && e > e_prev {
            forward
        } else if e_next < e && e < e_prev {
            backward
        } else {
            let d_next = (e_next - e).abs();
            let d_prev = (e_prev - e).abs();
            let (w_max, w_min) = (d_next.max(d_prev), d_next.min(d_prev));
            let (w_fwd, w_bwd) = if e_next > e_prev {
                (w_max, w_min)
            } else {
                (w_min, w_max)
            };
            forward
                .iter()
                .zip(&backward)
                .map(|(f, b)| vec3::add(&vec3::scale(f, w_fwd), &vec3::scale(b, w_bwd)))
                .collect()
        };

        let norm = field_norm(&tangent);
        if norm > 0.0 {
            tangent.iter().map(|t| vec3::scale(t, 1.0 / norm)).collect()
        } else {
            tangent
        }
    }

    /// 中间映像上的 NEB 力：真实力的垂直分量 + 沿切线的弹簧力
    fn neb_forces(&self, images: &[Structure], energies: &[f64], forces: &[Field]) -> Vec<Field> {
        (1..images.len() - 1)
            .map(|i| {
                let tau = self.tangent(images, energies, i);
                let true_force = &forces[i];

                let parallel: f64 = true_force.iter().zip(&tau).map(|(f, t)| vec3::dot(f, t)).sum();
                let len_next = field_norm(&difference(&images[i + 1], &images[i]));
                let len_prev = field_norm(&difference(&images[i], &images[i - 1]));
                let spring = self.spring * (len_next - len_prev);

                true_force
                    .iter()
                    .zip(&tau)
                    .map(|(f, t)| vec3::add(f, &vec3::scale(t, spring - parallel)))
                    .collect()
            })
            .collect()
    }
}

fn evaluate(potential: &dyn Potential, images: &[Structure]) -> Result<(Vec<f64>, Vec<Field>)> {
    let results: Vec<(f64, Field)> = images
        .par_iter()
        .map(|image| potential.energy_and_forces(image))
        .collect::<Result<Vec<_>>>()?;
    Ok(results.into_iter().unzip())
}

impl PathOptimizer for Neb {
    fn optimize(
        &self,
        potential: &dyn Potential,
        images: &mut [Structure],
        fmax: f64,
        max_steps: usize,
    ) -> Result<PathOutcome> {
        if images.len() < 3 {
            return Err(VacancyError::DegeneratePath(format!(
                "NEB needs at least one interior image, got {} images in total",
                images.len()
            )));
        }

        let interior = images.len() - 2;
        let mut velocity: Vec<Field> = (1..=interior)
            .map(|i| vec![[0.0; 3]; images[i].len()])
            .collect();
        let mut previous: Option<Vec<Field>> = None;
        let mut step = 0usize;

        loop {
            let (energies, forces) = evaluate(potential, images)?;
            let neb = self.neb_forces(images, &energies, &forces);

            let residual = neb.iter().map(|f| max_force(f)).fold(0.0, f64::max);
            if residual < fmax || step >= max_steps {
                return Ok(PathOutcome {
                    energies,
                    steps: step,
                    converged: residual < fmax,
                });
            }

            // MDMin：速度只保留沿力方向的分量，反向时清零
            if let Some(old) = &previous {
                for ((v, f), f_old) in velocity.iter_mut().zip(&neb).zip(old) {
                    for ((vi, fi), oi) in v.iter_mut().zip(f).zip(f_old) {
                        *vi = vec3::add(vi, &vec3::scale(&vec3::add(fi, oi), 0.5 * self.dt));
                    }
                }
                let vf = field_dot(&velocity, &neb);
                let ff = field_dot(&neb, &neb);
                for (v, f) in velocity.iter_mut().zip(&neb) {
                    for (vi, fi) in v.iter_mut().zip(f) {
                        *vi = if vf < 0.0 || ff == 0.0 {
                            [0.0; 3]
                        } else {
                            vec3::scale(fi, vf / ff)
                        };
                    }
                }
            }

            let mut moves: Vec<Field> = velocity
                .iter()
                .zip(&neb)
                .map(|(v, f)| {
                    v.iter()
                        .zip(f)
                        .map(|(vi, fi)| {
                            vec3::scale(&vec3::add(vi, &vec3::scale(fi, 0.5 * self.dt)), self.dt)
                        })
                        .collect()
                })
                .collect();

            let longest = moves.iter().map(|m| max_force(m)).fold(0.0, f64::max);
            if longest > self.max_move {
                let factor = self.max_move / longest;
                moves
                    .iter_mut()
                    .flat_map(|m| m.iter_mut())
                    .for_each(|d| *d = vec3::scale(d, factor));
            }

            for (image, m) in images[1..=interior].iter_mut().zip(&moves) {
                for (atom, d) in image.atoms.iter_mut().zip(m) {
                    atom.position = vec3::add(&atom.position, d);
                }
            }

            previous = Some(neb);
            step += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::linear_interpolate;
    use crate::models::structure::{Atom, Lattice};

    /// 一维双势阱 V(x) = (x² - 1)²，对 y 方向为谐振势
    struct DoubleWell;

    impl Potential for DoubleWell {
        fn name(&self) -> String {
            "double-well".to_string()
        }

        fn cutoff(&self) -> f64 {
            1.0
        }

        fn energy_and_forces(&self, structure: &Structure) -> Result<(f64, Vec<[f64; 3]>)> {
            let [x, y, _] = structure.atoms[0].position;
            let energy = (x * x - 1.0).powi(2) + y * y;
            let force = [-4.0 * x * (x * x - 1.0), -2.0 * y, 0.0];
            Ok((energy, vec![force]))
        }
    }

    fn endpoint(x: f64) -> Structure {
        Structure::new(
            "well",
            Lattice::orthorhombic(10.0, 10.0, 10.0),
            vec![Atom::new("X", [x, 0.0, 0.0])],
        )
    }

    #[test]
    fn test_barrier_of_double_well() {
        let initial = endpoint(-1.0);
        let fin = endpoint(1.0);
        let mut images = vec![initial.clone()];
        images.extend(linear_interpolate(&initial, &fin, 5));
        images.push(fin);

        // 把中间映像推离直线，检验优化确实把它们拉回来
        for image in images[1..6].iter_mut() {
            image.atoms[0].position[1] = 0.3;
        }

        let outcome = Neb::default()
            .optimize(&DoubleWell, &mut images, 1e-3, 5000)
            .unwrap();

        assert!(outcome.converged);
        assert_eq!(outcome.energies.len(), 7);
        assert!((outcome.energies[3] - 1.0).abs() < 1e-3);
        assert!(outcome.energies[0].abs() < 1e-12);
        assert!(images[3].atoms[0].position[1].abs() < 1e-2);
    }

    #[test]
    fn test_endpoints_stay_fixed() {
        let initial = endpoint(-1.0);
        let fin = endpoint(1.0);
        let mut images = vec![initial.clone()];
        images.extend(linear_interpolate(&initial, &fin, 3));
        images.push(fin.clone());

        Neb::default()
            .optimize(&DoubleWell, &mut images, 1e-8, 20)
            .unwrap();

        assert_eq!(images[0], initial);
        assert_eq!(images[4], fin);
    }

    #[test]
    fn test_rejects_path_without_interior_images() {
        let mut images = vec![endpoint(-1.0), endpoint(1.0)];
        let result = Neb::default().optimize(&DoubleWell, &mut images, 1e-3, 10);
        assert!(matches!(result, Err(VacancyError::DegeneratePath(_))));
    }
}
