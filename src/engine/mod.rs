//! # 物理引擎接口
//!
//! 空位计算核心只通过这里的 trait 调用能量/力计算、结构弛豫和路径优化，
//! 替换物理引擎不影响外推逻辑。
//!
//! - `Potential`: 能量与原子力
//! - `Relaxer`: 弛豫到最大原子力低于阈值或耗尽步数
//! - `PathOptimizer`: 固定端点，优化中间映像以逼近最小能量路径
//!
//! 步数耗尽不是错误：结果中的 `converged` 为 false，调用方据此标记退化。
//!
//! ## 参考实现
//! - `lj`: 截断平移 Lennard-Jones 对势
//! - `fire`: FIRE 弛豫
//! - `neb`: 改进切线 NEB + MDMin
//!
//! ## 依赖关系
//! - 被 `vacancy/sampler.rs`, `commands/compute.rs` 使用
//! - 使用 `models/structure.rs`

pub mod fire;
pub mod lj;
pub mod neb;

pub use fire::Fire;
pub use lj::LennardJones;
pub use neb::Neb;

use crate::error::Result;
use crate::models::Structure;
use crate::numerics::vec3;

/// 能量与力的计算器
pub trait Potential: Sync {
    /// 势函数名称
    fn name(&self) -> String;

    /// 截断半径 (Å)
    fn cutoff(&self) -> f64;

    /// 总能量 (eV)
    fn energy(&self, structure: &Structure) -> Result<f64> {
        self.energy_and_forces(structure).map(|(e, _)| e)
    }

    /// 总能量 (eV) 与每个原子受力 (eV/Å)
    fn energy_and_forces(&self, structure: &Structure) -> Result<(f64, Vec<[f64; 3]>)>;
}

/// 单次弛豫的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxOutcome {
    /// 最终能量 (eV)
    pub energy: f64,
    /// 实际执行的步数
    pub steps: usize,
    /// 是否在步数预算内达到力阈值
    pub converged: bool,
}

/// 路径优化的结果
#[derive(Debug, Clone, PartialEq)]
pub struct PathOutcome {
    /// 每个映像（含端点）的最终能量
    pub energies: Vec<f64>,
    pub steps: usize,
    pub converged: bool,
}

/// 结构弛豫
pub trait Relaxer {
    fn relax(
        &self,
        potential: &dyn Potential,
        structure: &mut Structure,
        fmax: f64,
        max_steps: usize,
    ) -> Result<RelaxOutcome>;
}

/// 最小能量路径优化
pub trait PathOptimizer {
    /// `images` 首尾为固定端点
    fn optimize(
        &self,
        potential: &dyn Potential,
        images: &mut [Structure],
        fmax: f64,
        max_steps: usize,
    ) -> Result<PathOutcome>;
}

/// 每个原子受力模长的最大值
pub fn max_force(forces: &[[f64; 3]]) -> f64 {
    forces.iter().map(vec3::norm).fold(0.0, f64::max)
}

/// 在初末态之间线性插值出 `n` 个中间映像（不含端点）
pub fn linear_interpolate(initial: &Structure, fin: &Structure, n: usize) -> Vec<Structure> {
    let start = initial.positions();
    let end = fin.positions();

    (1..=n)
        .map(|i| {
            let t = i as f64 / (n + 1) as f64;
            let mut image = initial.clone();
            let positions: Vec<[f64; 3]> = start
                .iter()
                .zip(&end)
                .map(|(a, b)| vec3::add(a, &vec3::scale(&vec3::sub(b, a), t)))
                .collect();
            image.set_positions(&positions);
            image.name = format!("{}_image{}", initial.name, i);
            image
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::structure::{Atom, Lattice};

    #[test]
    fn test_max_force() {
        let forces = vec![[3.0, 4.0, 0.0], [0.0, 0.0, -1.0]];
        assert!((max_force(&forces) - 5.0).abs() < 1e-12);
        assert_eq!(max_force(&[]), 0.0);
    }

    #[test]
    fn test_linear_interpolate() {
        let lattice = Lattice::orthorhombic(10.0, 10.0, 10.0);
        let a = Structure::new("a", lattice.clone(), vec![Atom::new("Ar", [0.0, 0.0, 0.0])]);
        let b = Structure::new("b", lattice, vec![Atom::new("Ar", [4.0, 0.0, 0.0])]);

        let images = linear_interpolate(&a, &b, 3);
        assert_eq!(images.len(), 3);
        assert!((images[0].atoms[0].position[0] - 1.0).abs() < 1e-12);
        assert!((images[1].atoms[0].position[0] - 2.0).abs() < 1e-12);
        assert!((images[2].atoms[0].position[0] - 3.0).abs() < 1e-12);
    }
}
