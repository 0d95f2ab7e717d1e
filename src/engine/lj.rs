//! # Lennard-Jones 对势
//!
//! 截断并平移的 12-6 对势：
//!
//! ```text
//! V(r) = 4ε[(σ/r)^12 - (σ/r)^6] - V(r_c),   r < r_c
//! ```
//!
//! 全原子对求和，正交晶胞最小镜像约定。为保证最小镜像有效，
//! 晶胞宽度必须大于截断半径的两倍。对原子 i 的求和按原子并行（rayon）。
//!
//! ## 依赖关系
//! - 实现 `engine::Potential`
//! - 使用 `rayon` 并行计算

use crate::engine::Potential;
use crate::error::{Result, VacancyError};
use crate::models::Structure;

use rayon::prelude::*;

/// Lennard-Jones 参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LennardJones {
    /// 势阱深度 ε (eV)
    pub epsilon: f64,
    /// 零点距离 σ (Å)
    pub sigma: f64,
    /// 截断半径 (Å)
    pub cutoff: f64,
}

impl Default for LennardJones {
    /// 氩的常用参数
    fn default() -> Self {
        LennardJones {
            epsilon: 0.0104,
            sigma: 3.40,
            cutoff: 6.8,
        }
    }
}

impl LennardJones {
    pub fn new(epsilon: f64, sigma: f64, cutoff: f64) -> Result<Self> {
        let valid = |v: f64| v > 0.0 && v.is_finite();
        if !(valid(epsilon) && valid(sigma) && valid(cutoff)) {
            return Err(VacancyError::InvalidArgument(format!(
                "Lennard-Jones parameters must be positive and finite (epsilon={}, sigma={}, cutoff={})",
                epsilon, sigma, cutoff
            )));
        }
        Ok(LennardJones {
            epsilon,
            sigma,
            cutoff,
        })
    }

    /// 未平移的对势
    fn raw_pair(&self, r_sq: f64) -> f64 {
        let s6 = (self.sigma * self.sigma / r_sq).powi(3);
        4.0 * self.epsilon * (s6 * s6 - s6)
    }

    /// fcc 平衡晶格常数的近似值 2^(1/6)·σ·√2
    pub fn fcc_lattice_constant(&self) -> f64 {
        2.0_f64.powf(1.0 / 6.0) * self.sigma * 2.0_f64.sqrt()
    }

    fn box_lengths(&self, structure: &Structure) -> Result<[f64; 3]> {
        let lattice = &structure.lattice;
        if !lattice.is_orthorhombic() {
            return Err(VacancyError::InvalidArgument(format!(
                "Lennard-Jones reference engine needs an orthorhombic cell ({})",
                structure.name
            )));
        }
        let width = lattice.min_width();
        if width <= 2.0 * self.cutoff {
            return Err(VacancyError::CellTooSmall {
                width,
                cutoff: self.cutoff,
            });
        }
        let m = &lattice.matrix;
        Ok([m[0][0].abs(), m[1][1].abs(), m[2][2].abs()])
    }
}

impl Potential for LennardJones {
    fn name(&self) -> String {
        format!(
            "LJ(epsilon={} eV, sigma={} Å, rc={} Å)",
            self.epsilon, self.sigma, self.cutoff
        )
    }

    fn cutoff(&self) -> f64 {
        self.cutoff
    }

    fn energy_and_forces(&self, structure: &Structure) -> Result<(f64, Vec<[f64; 3]>)> {
        let lengths = self.box_lengths(structure)?;
        let pbc = structure.pbc;
        let positions = structure.positions();
        let cutoff_sq = self.cutoff * self.cutoff;
        let shift = self.raw_pair(cutoff_sq);

        // 每个原子：一半的对能量与所受合力
        let per_atom: Vec<(f64, [f64; 3])> = (0..positions.len())
            .into_par_iter()
            .map(|i| {
                let pi = positions[i];
                let mut energy = 0.0;
                let mut force = [0.0; 3];

                for (j, pj) in positions.iter().enumerate() {
                    if i == j {
                        continue;
                    }
                    let mut d = [pj[0] - pi[0], pj[1] - pi[1], pj[2] - pi[2]];

                    // 最小镜像
                    for axis in 0..3 {
                        if pbc[axis] {
                            d[axis] -= lengths[axis] * (d[axis] / lengths[axis]).round();
                        }
                    }

                    let r_sq = d[0] * d[0] + d[1] * d[1] + d[2] * d[2];
                    if r_sq >= cutoff_sq {
                        continue;
                    }

                    let s6 = (self.sigma * self.sigma / r_sq).powi(3);
                    energy += 0.5 * (4.0 * self.epsilon * (s6 * s6 - s6) - shift);

                    // F_i = (24ε / r²)(s6 - 2 s12) · d
                    let coeff = 24.0 * self.epsilon * (s6 - 2.0 * s6 * s6) / r_sq;
                    for axis in 0..3 {
                        force[axis] += coeff * d[axis];
                    }
                }

                (energy, force)
            })
            .collect();

        let energy: f64 = per_atom.iter().map(|(e, _)| e).sum();
        if !energy.is_finite() {
            return Err(VacancyError::NonFiniteEnergy(structure.name.clone()));
        }
        let forces = per_atom.into_iter().map(|(_, f)| f).collect();

        Ok((energy, forces))
    }
}
