//! # 单尺寸采样
//!
//! 对一个超胞尺寸计算空位形成能、迁移能和弛豫残差：
//!
//! 1. 构造超胞，计算完整晶体能量 E_coh
//! 2. 删除第 0 个原子得到空位结构
//! 3. 未弛豫形成能 E(空位) - E_coh·(N-1)/N（诊断用）
//! 4. 弛豫初态；再以收紧的力阈值弛豫一次，两次能量之差为弛豫残差
//! 5. 把空位最近邻中最接近迁移方向的原子移到空位上并弛豫，得到末态
//! 6. 弛豫形成能 E(初态) - E_coh·(N-1)/N
//! 7. 初末态之间线性插值，NEB 优化路径
//! 8. 样条插值求鞍点
//! 9. 迁移能 E(鞍点) - E(初态)
//!
//! 弛豫、路径优化、鞍点搜索未收敛时只打印警告并把样本标记为退化。
//!
//! ## 依赖关系
//! - 被 `vacancy/pipeline.rs` 使用
//! - 使用 `engine/`, `vacancy/saddle.rs`

use crate::config::{VacancyConfig, DEGENERATE_PATH_TOL, SITE_MATCH_TOL};
use crate::engine::{linear_interpolate, PathOptimizer, Potential, RelaxOutcome, Relaxer};
use crate::error::{Result, VacancyError};
use crate::models::{PathSample, SizeSample, Structure};
use crate::numerics::vec3;
use crate::utils::output::{print_detail, print_warning};
use crate::vacancy::saddle::find_saddle;

/// 单尺寸采样器
pub struct SizeSampler<'a> {
    basis: &'a Structure,
    potential: &'a dyn Potential,
    relaxer: &'a dyn Relaxer,
    path_optimizer: &'a dyn PathOptimizer,
    config: &'a VacancyConfig,
}

impl<'a> SizeSampler<'a> {
    pub fn new(
        basis: &'a Structure,
        potential: &'a dyn Potential,
        relaxer: &'a dyn Relaxer,
        path_optimizer: &'a dyn PathOptimizer,
        config: &'a VacancyConfig,
    ) -> Self {
        SizeSampler {
            basis,
            potential,
            relaxer,
            path_optimizer,
            config,
        }
    }

    /// 跳入空位的原子序号
    ///
    /// 候选为第 0 个原子的最近邻壳层，取位移与迁移矢量夹角最小者，
    /// 相同时取序号最小者。迁移矢量为零时即最近邻中序号最小的原子。
    pub fn hopping_atom(&self, supercell: &Structure) -> Result<usize> {
        if supercell.is_empty() {
            return Err(VacancyError::DegeneratePath("empty supercell".to_string()));
        }
        let a = self.basis.lattice.lengths()[0];
        let shell = supercell.nearest_shell(0, SITE_MATCH_TOL * a);

        let direction = self.basis.lattice.frac_to_cart(&self.config.migration);
        let length = vec3::norm(&direction);

        let mut best: Option<(usize, f64)> = None;
        for (index, d) in shell {
            let distance = vec3::norm(&d);
            if distance < DEGENERATE_PATH_TOL {
                return Err(VacancyError::DegeneratePath(format!(
                    "atom {} overlaps the vacancy site in {}",
                    index, supercell.name
                )));
            }
            let alignment = if length > 0.0 {
                vec3::dot(&d, &direction) / (distance * length)
            } else {
                0.0
            };
            match best {
                Some((_, best_alignment)) if alignment <= best_alignment + 1e-9 => {}
                _ => best = Some((index, alignment)),
            }
        }

        match best {
            Some((index, _)) => Ok(index),
            None => Err(VacancyError::DegeneratePath(format!(
                "the vacancy in {} has no neighbour to hop from",
                supercell.name
            ))),
        }
    }

    fn relax(&self, structure: &mut Structure, label: &str) -> Result<RelaxOutcome> {
        let outcome = self.relaxer.relax(
            self.potential,
            structure,
            self.config.fmax,
            self.config.relax_steps,
        )?;
        if !outcome.converged {
            print_warning(&format!(
                "[ERR1047] Relaxation of the {} exceeded {} steps; vacancy formation energy may not be accurate",
                label, self.config.relax_steps
            ));
        }
        Ok(outcome)
    }

    /// 计算一个尺寸的样本
    pub fn sample(&self, size: usize) -> Result<SizeSample> {
        let supercell = self.basis.supercell(size);
        let n_atoms = supercell.len();
        if n_atoms < 2 {
            return Err(VacancyError::InvalidArgument(format!(
                "a {0}x{0}x{0} supercell has only {1} atom(s)",
                size, n_atoms
            )));
        }

        let hop = self.hopping_atom(&supercell)?;
        let cohesive = self.potential.energy(&supercell)?;
        let reference = cohesive * (n_atoms - 1) as f64 / n_atoms as f64;

        let mut defect = supercell.clone();
        let removed = defect.remove_atom(0).ok_or_else(|| {
            VacancyError::InvalidArgument(format!("{} has no atom to remove", supercell.name))
        })?;
        defect.name = format!("{}_vacancy", supercell.name);

        let unrelaxed = self.potential.energy(&defect)?;
        let unrelaxed_formation = unrelaxed - reference;

        print_detail("Number of atoms", &n_atoms.to_string());
        print_detail("Cohesive energy per atom", &format!("{:.6} eV", cohesive / n_atoms as f64));
        print_detail("Unrelaxed formation energy", &format!("{:.6} eV", unrelaxed_formation));

        let mut degraded = false;

        // 初态
        let mut initial = defect.clone();
        initial.name = format!("{}_initial", supercell.name);
        let loose = self.relax(&mut initial, "initial state")?;
        degraded |= !loose.converged;
        let tight = self.relaxer.relax(
            self.potential,
            &mut initial,
            self.config.fmax * self.config.eps,
            self.config.uncert_steps,
        )?;
        let residual = (loose.energy - tight.energy).abs();
        let e_initial = tight.energy;

        // 末态：去掉第 0 个原子后序号整体前移一位
        let mut fin = defect.clone();
        fin.name = format!("{}_final", supercell.name);
        let moving = hop - 1;
        let start = fin.atoms[moving].position;
        let jump = fin.displacement(&start, &removed.position);
        fin.atoms[moving].position = vec3::add(&start, &jump);
        let final_outcome = self.relax(&mut fin, "final state")?;
        degraded |= !final_outcome.converged;

        let formation = e_initial - reference;

        if initial.max_displacement_from(&fin) < DEGENERATE_PATH_TOL {
            return Err(VacancyError::DegeneratePath(format!(
                "relaxed initial and final states of {} coincide",
                supercell.name
            )));
        }

        // 迁移路径
        let mut images = Vec::with_capacity(self.config.neb_points + 2);
        images.push(initial.clone());
        images.extend(linear_interpolate(&initial, &fin, self.config.neb_points));
        images.push(fin);

        let path = self.path_optimizer.optimize(
            self.potential,
            &mut images,
            self.config.fmax,
            self.config.neb_steps,
        )?;
        if !path.converged {
            print_warning(&format!(
                "[ERR1048] Path optimisation exceeded {} steps; vacancy migration energy may not be accurate",
                self.config.neb_steps
            ));
            degraded = true;
        }

        let saddle = find_saddle(&PathSample::new(path.energies)?)?;
        degraded |= !saddle.converged;
        let migration = saddle.energy - e_initial;

        print_detail("Formation energy", &format!("{:.6} eV", formation));
        print_detail("Migration energy", &format!("{:.6} eV", migration));
        print_detail("Relaxation residual", &format!("{:.3e} eV", residual));

        Ok(SizeSample {
            size,
            migration_energy: migration,
            formation_energy: formation,
            relaxation_residual: residual,
            unrelaxed_formation_energy: unrelaxed_formation,
            cohesive_energy_per_atom: cohesive / n_atoms as f64,
            n_atoms,
            degraded,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::engine::PathOutcome;
    use crate::models::{BasisSpec, LatticeType};

    use std::cell::RefCell;
    use std::f64::consts::PI;

    /// 每个原子 -1 eV，无受力
    pub(crate) struct CountingPotential;

    impl Potential for CountingPotential {
        fn name(&self) -> String {
            "counting".to_string()
        }

        fn cutoff(&self) -> f64 {
            0.5
        }

        fn energy_and_forces(&self, structure: &Structure) -> Result<(f64, Vec<[f64; 3]>)> {
            Ok((-(structure.len() as f64), vec![[0.0; 3]; structure.len()]))
        }
    }

    /// 常规阈值下降 0.1 eV，收紧阈值再降 0.002 eV
    pub(crate) struct ScriptedRelaxer {
        pub converged: bool,
        pub calls: RefCell<Vec<(f64, usize)>>,
    }

    impl ScriptedRelaxer {
        pub(crate) fn new(converged: bool) -> Self {
            ScriptedRelaxer {
                converged,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Relaxer for ScriptedRelaxer {
        fn relax(
            &self,
            potential: &dyn Potential,
            structure: &mut Structure,
            fmax: f64,
            max_steps: usize,
        ) -> Result<RelaxOutcome> {
            self.calls.borrow_mut().push((fmax, max_steps));
            let drop = if fmax < 1e-5 { 0.102 } else { 0.1 };
            Ok(RelaxOutcome {
                energy: potential.energy(structure)? - drop,
                steps: 1,
                converged: self.converged,
            })
        }
    }

    /// 能量沿路径为 0.5·sin(πi/(n-1)) 的驼峰
    pub(crate) struct BumpPath {
        pub converged: bool,
    }

    impl PathOptimizer for BumpPath {
        fn optimize(
            &self,
            potential: &dyn Potential,
            images: &mut [Structure],
            _fmax: f64,
            _max_steps: usize,
        ) -> Result<PathOutcome> {
            let n = images.len();
            let energies = images
                .iter()
                .enumerate()
                .map(|(i, image)| {
                    potential
                        .energy(image)
                        .map(|e| e - 0.102 + 0.5 * (PI * i as f64 / (n - 1) as f64).sin())
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(PathOutcome {
                energies,
                steps: 1,
                converged: self.converged,
            })
        }
    }

    fn sc_basis() -> Structure {
        BasisSpec::new("Po", LatticeType::Sc, vec![2.0]).build().unwrap()
    }

    fn test_config() -> VacancyConfig {
        VacancyConfig {
            neb_points: 5,
            ..VacancyConfig::default()
        }
    }

    #[test]
    fn test_sample_with_scripted_engine() {
        let basis = sc_basis();
        let config = test_config();
        let relaxer = ScriptedRelaxer::new(true);
        let path = BumpPath { converged: true };
        let sampler = SizeSampler::new(&basis, &CountingPotential, &relaxer, &path, &config);

        let sample = sampler.sample(3).unwrap();

        assert_eq!(sample.size, 3);
        assert_eq!(sample.n_atoms, 27);
        assert!(sample.unrelaxed_formation_energy.abs() < 1e-12);
        assert!((sample.formation_energy + 0.102).abs() < 1e-12);
        assert!((sample.relaxation_residual - 0.002).abs() < 1e-12);
        assert!((sample.migration_energy - 0.5).abs() < 1e-4);
        assert!((sample.cohesive_energy_per_atom + 1.0).abs() < 1e-12);
        assert!(!sample.degraded);
    }

    #[test]
    fn test_relaxation_policy() {
        let basis = sc_basis();
        let config = test_config();
        let relaxer = ScriptedRelaxer::new(true);
        let path = BumpPath { converged: true };
        let sampler = SizeSampler::new(&basis, &CountingPotential, &relaxer, &path, &config);
        sampler.sample(3).unwrap();

        let calls = relaxer.calls.borrow();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], (config.fmax, config.relax_steps));
        assert_eq!(calls[1], (config.fmax * config.eps, config.uncert_steps));
        assert_eq!(calls[2], (config.fmax, config.relax_steps));
    }

    #[test]
    fn test_unconverged_relaxation_marks_degraded() {
        let basis = sc_basis();
        let config = test_config();
        let relaxer = ScriptedRelaxer::new(false);
        let path = BumpPath { converged: true };
        let sampler = SizeSampler::new(&basis, &CountingPotential, &relaxer, &path, &config);

        let sample = sampler.sample(3).unwrap();
        assert!(sample.degraded);
        assert!(sample.formation_energy.is_finite());
    }

    #[test]
    fn test_unconverged_path_marks_degraded() {
        let basis = sc_basis();
        let config = test_config();
        let relaxer = ScriptedRelaxer::new(true);
        let path = BumpPath { converged: false };
        let sampler = SizeSampler::new(&basis, &CountingPotential, &relaxer, &path, &config);

        assert!(sampler.sample(3).unwrap().degraded);
    }

    #[test]
    fn test_hopping_atom_index() {
        let basis = sc_basis();
        let config = test_config();
        let relaxer = ScriptedRelaxer::new(true);
        let path = BumpPath { converged: true };
        let sampler = SizeSampler::new(&basis, &CountingPotential, &relaxer, &path, &config);

        // 晶胞 (1,0,0) 排在第 9 个
        assert_eq!(sampler.hopping_atom(&basis.supercell(3)).unwrap(), 9);
    }

    fn hop_vector(basis: &Structure, migration: [f64; 3], size: usize) -> [f64; 3] {
        let config = VacancyConfig {
            migration,
            ..test_config()
        };
        let relaxer = ScriptedRelaxer::new(true);
        let path = BumpPath { converged: true };
        let sampler = SizeSampler::new(basis, &CountingPotential, &relaxer, &path, &config);

        let supercell = basis.supercell(size);
        let hop = sampler.hopping_atom(&supercell).unwrap();
        supercell.displacement(&supercell.atoms[0].position, &supercell.atoms[hop].position)
    }

    #[test]
    fn test_hop_is_nearest_neighbour() {
        let cases = [
            (LatticeType::Sc, vec![2.0], 2.0),
            (LatticeType::Bcc, vec![3.0], 3.0 * 3.0_f64.sqrt() / 2.0),
            (LatticeType::Fcc, vec![5.26], 5.26 / 2.0_f64.sqrt()),
            (LatticeType::Diamond, vec![5.43], 5.43 * 3.0_f64.sqrt() / 4.0),
            (LatticeType::Hcp, vec![3.2, 5.5], 3.2),
        ];
        for (lattice, constants, nn) in cases {
            let basis = BasisSpec::new("X", lattice, constants).build().unwrap();
            let d = hop_vector(&basis, [1.0, 0.0, 0.0], 3);
            assert!((vec3::norm(&d) - nn).abs() < 1e-9, "{}: hop {:.4}", lattice, vec3::norm(&d));
        }
    }

    #[test]
    fn test_migration_direction_selects_neighbour() {
        let basis = BasisSpec::new("Cu", LatticeType::Fcc, vec![4.0]).build().unwrap();

        let d = hop_vector(&basis, [1.0, 1.0, 0.0], 3);
        assert!((d[0] - 2.0).abs() < 1e-9);
        assert!((d[1] - 2.0).abs() < 1e-9);
        assert!(d[2].abs() < 1e-9);

        // [100] 方向有 4 个等价近邻，都位于 x = a/2
        let d = hop_vector(&basis, [1.0, 0.0, 0.0], 3);
        assert!((d[0] - 2.0).abs() < 1e-9);
        assert!((vec3::norm(&d) - 2.0 * 2.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_zero_migration_takes_first_neighbour() {
        let basis = sc_basis();
        let config = VacancyConfig {
            migration: [0.0, 0.0, 0.0],
            ..test_config()
        };
        let relaxer = ScriptedRelaxer::new(true);
        let path = BumpPath { converged: true };
        let sampler = SizeSampler::new(&basis, &CountingPotential, &relaxer, &path, &config);

        // 晶胞 (0,0,1) 是序号最小的近邻
        assert_eq!(sampler.hopping_atom(&basis.supercell(3)).unwrap(), 1);
    }

    #[test]
    fn test_overlapping_neighbour_is_degenerate() {
        let basis = sc_basis();
        let config = test_config();
        let relaxer = ScriptedRelaxer::new(true);
        let path = BumpPath { converged: true };
        let sampler = SizeSampler::new(&basis, &CountingPotential, &relaxer, &path, &config);

        let mut supercell = basis.supercell(3);
        supercell.atoms[5].position = supercell.atoms[0].position;
        assert!(matches!(
            sampler.hopping_atom(&supercell),
            Err(VacancyError::DegeneratePath(_))
        ));

        let lone = basis.supercell(1);
        assert!(matches!(
            sampler.hopping_atom(&lone),
            Err(VacancyError::DegeneratePath(_))
        ));

        let empty = Structure::new("empty", basis.lattice.clone(), Vec::new());
        assert!(matches!(
            sampler.hopping_atom(&empty),
            Err(VacancyError::DegeneratePath(_))
        ));
    }

    /// 把所有原子压到同一点，初末态重合
    struct CollapsingRelaxer;

    impl Relaxer for CollapsingRelaxer {
        fn relax(
            &self,
            potential: &dyn Potential,
            structure: &mut Structure,
            _fmax: f64,
            _max_steps: usize,
        ) -> Result<RelaxOutcome> {
            let zeros = vec![[0.0; 3]; structure.len()];
            structure.set_positions(&zeros);
            Ok(RelaxOutcome {
                energy: potential.energy(structure)?,
                steps: 1,
                converged: true,
            })
        }
    }

    #[test]
    fn test_coincident_endpoints_are_degenerate() {
        let basis = sc_basis();
        let config = test_config();
        let path = BumpPath { converged: true };
        let sampler = SizeSampler::new(&basis, &CountingPotential, &CollapsingRelaxer, &path, &config);
        assert!(matches!(
            sampler.sample(3),
            Err(VacancyError::DegeneratePath(_))
        ));
    }
}
