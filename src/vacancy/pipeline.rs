//! # 空位计算流程
//!
//! 依次对连续递增的超胞尺寸采样，再分别外推迁移能和形成能，
//! 最后组装两条结果记录。
//!
//! 系统不确定度由所有样本的最大弛豫残差折叠得到：迁移能取残差·√2
//! （路径端点各带一份弛豫误差），形成能取残差本身。
//!
//! ## 依赖关系
//! - 被 `commands/compute.rs` 使用
//! - 使用 `vacancy/sampler.rs`, `vacancy/extrapolate.rs`, `models/`

use crate::config::{FitCatalog, VacancyConfig, MAX_SUPERCELL_SIZE};
use crate::engine::{PathOptimizer, Potential, Relaxer};
use crate::error::{Result, VacancyError};
use crate::models::record::{UNIT_ANGLE, UNIT_ENERGY, UNIT_LENGTH, UNIT_PRESSURE};
use crate::models::sample::max_relaxation_residual;
use crate::models::{
    BasisSpec, CrystalInfo, ExtrapolationResult, PropertyValue, RecordValue, ResultRecord,
    SizeSample, Structure,
};
use crate::utils::output::{is_quiet, print_info};
use crate::utils::progress::create_progress_bar;
use crate::vacancy::extrapolate::SizeExtrapolator;
use crate::vacancy::sampler::SizeSampler;

use indicatif::ProgressBar;

use std::ops::RangeInclusive;

pub const MIGRATION_PROPERTY_ID: &str = "monovacancy-neutral-migration-energy-crystal-npt";
pub const FORMATION_PROPERTY_ID: &str = "monovacancy-neutral-formation-free-energy-crystal-npt";

/// 完整计算的结果
#[derive(Debug, Clone)]
pub struct VacancyResults {
    pub samples: Vec<SizeSample>,
    pub migration: ExtrapolationResult,
    pub formation: ExtrapolationResult,
    /// 所有样本的最大弛豫残差 (eV)
    pub residual: f64,
    /// [迁移能记录, 形成能记录]
    pub records: Vec<ResultRecord>,
}

/// 空位计算流程
pub struct VacancyPipeline<'a> {
    spec: BasisSpec,
    basis: Structure,
    potential: &'a dyn Potential,
    relaxer: &'a dyn Relaxer,
    path_optimizer: &'a dyn PathOptimizer,
    config: VacancyConfig,
    catalog: FitCatalog,
}

impl<'a> VacancyPipeline<'a> {
    pub fn new(
        spec: BasisSpec,
        potential: &'a dyn Potential,
        relaxer: &'a dyn Relaxer,
        path_optimizer: &'a dyn PathOptimizer,
        config: VacancyConfig,
        catalog: FitCatalog,
    ) -> Result<Self> {
        config.validate()?;
        catalog.validate()?;
        if catalog.max_point_count() > config.num_sizes {
            return Err(VacancyError::InvalidArgument(format!(
                "fit catalog needs {} supercell sizes but only {} are sampled",
                catalog.max_point_count(),
                config.num_sizes
            )));
        }
        let basis = spec.build()?;
        Ok(VacancyPipeline {
            spec,
            basis,
            potential,
            relaxer,
            path_optimizer,
            config,
            catalog,
        })
    }

    pub fn basis(&self) -> &Structure {
        &self.basis
    }

    /// 采样的超胞尺寸
    ///
    /// 最小尺寸是满足原子数 ≥ `min_atoms` 的最小 n，并且超胞宽度必须大于
    /// 两倍截断半径。最大尺寸不得超过 `MAX_SUPERCELL_SIZE`。
    pub fn size_range(&self) -> Result<RangeInclusive<usize>> {
        let n_basis = self.basis.len().max(1);
        let mut size_min: usize = 1;
        while n_basis * size_min.pow(3) < self.config.min_atoms {
            size_min += 1;
            if size_min > MAX_SUPERCELL_SIZE {
                return Err(VacancyError::InvalidArgument(format!(
                    "{} atoms need more than {} cells per direction",
                    self.config.min_atoms, MAX_SUPERCELL_SIZE
                )));
            }
        }

        let width = self.basis.lattice.min_width();
        let cutoff = self.potential.cutoff();
        let ratio = 2.0 * cutoff / width;
        if !ratio.is_finite() || ratio >= MAX_SUPERCELL_SIZE as f64 {
            return Err(VacancyError::CellTooSmall {
                width: width * MAX_SUPERCELL_SIZE as f64,
                cutoff,
            });
        }
        // 宽度 n·w 必须严格大于 2·rc
        size_min = size_min.max(ratio.floor() as usize + 1);

        let size_max = size_min.saturating_add(self.config.num_sizes - 1);
        if size_max > MAX_SUPERCELL_SIZE {
            return Err(VacancyError::InvalidArgument(format!(
                "supercell sizes {} to {} exceed {} cells per direction",
                size_min, size_max, MAX_SUPERCELL_SIZE
            )));
        }
        Ok(size_min..=size_max)
    }

    fn sampler(&self) -> SizeSampler<'_> {
        SizeSampler::new(
            &self.basis,
            self.potential,
            self.relaxer,
            self.path_optimizer,
            &self.config,
        )
    }

    /// 依次计算所有尺寸并外推
    pub fn run(&self) -> Result<VacancyResults> {
        let sizes: Vec<usize> = self.size_range()?.collect();
        let sampler = self.sampler();

        let pb = if is_quiet() {
            ProgressBar::hidden()
        } else {
            create_progress_bar(sizes.len() as u64, "Sampling supercells")
        };

        let mut samples = Vec::with_capacity(sizes.len());
        for &size in &sizes {
            let n_atoms = self.basis.len() * size.pow(3);
            pb.set_message(format!("{0}x{0}x{0} ({1} atoms)", size, n_atoms));
            let sample = pb.suspend(|| {
                print_info(&format!("Calculating size {} ...", size));
                sampler.sample(size)
            })?;
            samples.push(sample);
            pb.inc(1);
        }
        pb.finish_and_clear();

        self.extrapolate(samples)
    }

    /// 从已有样本外推并组装记录
    pub fn extrapolate(&self, samples: Vec<SizeSample>) -> Result<VacancyResults> {
        let sizes: Vec<usize> = samples.iter().map(|s| s.size).collect();
        let migration_values: Vec<f64> = samples.iter().map(|s| s.migration_energy).collect();
        let formation_values: Vec<f64> = samples.iter().map(|s| s.formation_energy).collect();

        let residual = max_relaxation_residual(&samples);

        let extrapolator = SizeExtrapolator::new(&self.catalog);
        let mut migration = extrapolator.extrapolate(
            &sizes,
            &migration_values,
            &self.catalog.migration,
            residual * std::f64::consts::SQRT_2,
        )?;
        let mut formation = extrapolator.extrapolate(
            &sizes,
            &formation_values,
            &self.catalog.formation,
            residual,
        )?;
        migration.account_for_degraded(&samples, |s| s.migration_energy);
        formation.account_for_degraded(&samples, |s| s.formation_energy);

        let records = self.build_records(&samples, &migration, &formation)?;

        Ok(VacancyResults {
            samples,
            migration,
            formation,
            residual,
            records,
        })
    }

    fn build_records(
        &self,
        samples: &[SizeSample],
        migration: &ExtrapolationResult,
        formation: &ExtrapolationResult,
    ) -> Result<Vec<ResultRecord>> {
        let info = CrystalInfo::from_basis(&self.basis, &self.spec);
        let largest = samples.iter().max_by_key(|s| s.size);

        let hop = match largest {
            Some(sample) => self.sampler().hopping_atom(&self.basis.supercell(sample.size))?,
            None => 0,
        };

        let mut migration_record = ResultRecord::new();
        migration_record
            .plain("property-id", RecordValue::Text(MIGRATION_PROPERTY_ID.to_string()))
            .plain("instance-id", RecordValue::Int(1))
            .property(
                "vacancy-migration-energy",
                PropertyValue::measured(migration.value, UNIT_ENERGY, migration.uncertainty),
            )
            .property("host-missing-atom-start", PropertyValue::new(RecordValue::Int(1)))
            .property(
                "host-missing-atom-end",
                PropertyValue::new(RecordValue::Int(hop as i64 + 1)),
            )
            .plain("degraded", RecordValue::Bool(migration.degraded))
            .extend(&crystal_entries("host", &info));

        let mut formation_record = ResultRecord::new();
        formation_record
            .plain("property-id", RecordValue::Text(FORMATION_PROPERTY_ID.to_string()))
            .plain("instance-id", RecordValue::Int(2))
            .property(
                "relaxed-formation-potential-energy",
                PropertyValue::measured(formation.value, UNIT_ENERGY, formation.uncertainty),
            );
        if let Some(sample) = largest {
            formation_record.property(
                "unrelaxed-formation-potential-energy",
                PropertyValue::with_unit(
                    RecordValue::Float(sample.unrelaxed_formation_energy),
                    UNIT_ENERGY,
                ),
            );
        }
        formation_record
            .property("host-removed-atom", PropertyValue::new(RecordValue::Int(1)))
            .plain("degraded", RecordValue::Bool(formation.degraded))
            .extend(&crystal_entries("host", &info));
        if let Some(sample) = largest {
            formation_record.property(
                "reservoir-cohesive-potential-energy",
                PropertyValue::with_unit(
                    RecordValue::Float(sample.cohesive_energy_per_atom),
                    UNIT_ENERGY,
                ),
            );
        }
        formation_record.extend(&crystal_entries("reservoir", &info));

        Ok(vec![migration_record, formation_record])
    }
}

/// 晶体几何与对称性条目，键名以 `prefix-` 开头
fn crystal_entries(prefix: &str, info: &CrystalInfo) -> ResultRecord {
    let key = |name: &str| format!("{}-{}", prefix, name);
    let length = |v: f64| PropertyValue::with_unit(RecordValue::Float(v), UNIT_LENGTH);
    let angle = |v: f64| PropertyValue::with_unit(RecordValue::Float(v), UNIT_ANGLE);

    let mut record = ResultRecord::new();
    record
        .property(
            &key("cauchy-stress"),
            PropertyValue::with_unit(RecordValue::FloatList(vec![0.0; 6]), UNIT_PRESSURE),
        )
        .property(
            &key("short-name"),
            PropertyValue::new(RecordValue::TextList(vec![info.short_name.clone()])),
        )
        .property(&key("a"), length(info.a))
        .property(&key("b"), length(info.b))
        .property(&key("c"), length(info.c))
        .property(&key("alpha"), angle(info.alpha))
        .property(&key("beta"), angle(info.beta))
        .property(&key("gamma"), angle(info.gamma))
        .property(
            &key("space-group"),
            PropertyValue::new(RecordValue::Text(info.space_group.clone())),
        )
        .property(
            &key("wyckoff-multiplicity-and-letter"),
            PropertyValue::new(RecordValue::TextList(info.wyckoff_codes.clone())),
        )
        .property(
            &key("wyckoff-coordinates"),
            PropertyValue::new(RecordValue::Matrix(
                info.wyckoff_sites.iter().map(|s| s.to_vec()).collect(),
            )),
        )
        .property(
            &key("wyckoff-species"),
            PropertyValue::new(RecordValue::TextList(info.wyckoff_species.clone())),
        );
    record
}
