//! # 惯用晶胞与晶体信息
//!
//! 根据晶格类型和晶格常数构造惯用晶胞（基元结构），并提供结果记录所需的
//! 固定晶体学信息（空间群、Wyckoff 位置）。这些信息来自固定查找表，不做计算。
//!
//! ## 支持的晶格
//! - `sc`, `bcc`, `fcc`, `diamond`: 立方惯用晶胞
//! - `hcp`: 4 原子正交晶胞 (a, a√3, c)，保证可以使用正交最小镜像
//!
//! ## 依赖关系
//! - 被 `vacancy/pipeline.rs`, `commands/compute.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{Result, VacancyError};
use crate::models::structure::{Atom, Lattice, Structure};

use std::fmt;
use std::str::FromStr;

/// 晶格类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatticeType {
    Sc,
    Fcc,
    Bcc,
    Diamond,
    Hcp,
}

impl FromStr for LatticeType {
    type Err = VacancyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sc" => Ok(LatticeType::Sc),
            "fcc" => Ok(LatticeType::Fcc),
            "bcc" => Ok(LatticeType::Bcc),
            "diamond" => Ok(LatticeType::Diamond),
            "hcp" => Ok(LatticeType::Hcp),
            _ => Err(VacancyError::UnsupportedLattice(s.to_string())),
        }
    }
}

impl fmt::Display for LatticeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LatticeType::Sc => "sc",
            LatticeType::Fcc => "fcc",
            LatticeType::Bcc => "bcc",
            LatticeType::Diamond => "diamond",
            LatticeType::Hcp => "hcp",
        };
        write!(f, "{}", name)
    }
}

impl LatticeType {
    /// 空间群符号
    pub fn space_group(&self) -> &'static str {
        match self {
            LatticeType::Fcc => "Fm-3m",
            LatticeType::Bcc => "Im-3m",
            LatticeType::Sc => "Pm-3m",
            LatticeType::Diamond => "Fd-3m",
            LatticeType::Hcp => "P63/mmc",
        }
    }

    /// Wyckoff 多重度与字母
    pub fn wyckoff_codes(&self) -> &'static [&'static str] {
        match self {
            LatticeType::Fcc => &["4a"],
            LatticeType::Bcc => &["2a"],
            LatticeType::Sc => &["1a"],
            LatticeType::Diamond => &["8a"],
            LatticeType::Hcp => &["2d"],
        }
    }

    /// Wyckoff 位置的分数坐标
    pub fn wyckoff_sites(&self) -> Vec<[f64; 3]> {
        match self {
            LatticeType::Hcp => vec![[2.0 / 3.0, 1.0 / 3.0, 0.25]],
            _ => vec![[0.0, 0.0, 0.0]],
        }
    }

    /// 需要的晶格常数个数
    pub fn constant_count(&self) -> usize {
        match self {
            LatticeType::Hcp => 2,
            _ => 1,
        }
    }

    /// 惯用晶胞内原子的分数坐标
    fn fractional_sites(&self) -> Vec<[f64; 3]> {
        match self {
            LatticeType::Sc => vec![[0.0, 0.0, 0.0]],
            LatticeType::Bcc => vec![[0.0, 0.0, 0.0], [0.5, 0.5, 0.5]],
            LatticeType::Fcc => vec![
                [0.0, 0.0, 0.0],
                [0.0, 0.5, 0.5],
                [0.5, 0.0, 0.5],
                [0.5, 0.5, 0.0],
            ],
            LatticeType::Diamond => vec![
                [0.0, 0.0, 0.0],
                [0.25, 0.25, 0.25],
                [0.0, 0.5, 0.5],
                [0.25, 0.75, 0.75],
                [0.5, 0.0, 0.5],
                [0.75, 0.25, 0.75],
                [0.5, 0.5, 0.0],
                [0.75, 0.75, 0.25],
            ],
            LatticeType::Hcp => vec![
                [0.0, 0.0, 0.0],
                [0.5, 0.5, 0.0],
                [0.5, 1.0 / 6.0, 0.5],
                [0.0, 2.0 / 3.0, 0.5],
            ],
        }
    }
}

/// 基元结构的输入描述
#[derive(Debug, Clone, PartialEq)]
pub struct BasisSpec {
    /// 元素符号
    pub element: String,
    /// 晶格类型
    pub lattice: LatticeType,
    /// 晶格常数 (Å)：立方晶格为 [a]，hcp 为 [a, c]
    pub constants: Vec<f64>,
}

impl BasisSpec {
    pub fn new(element: impl Into<String>, lattice: LatticeType, constants: Vec<f64>) -> Self {
        BasisSpec {
            element: element.into(),
            lattice,
            constants,
        }
    }

    /// 构造惯用晶胞
    pub fn build(&self) -> Result<Structure> {
        let needed = self.lattice.constant_count();
        if self.constants.len() < needed {
            return Err(VacancyError::InvalidArgument(format!(
                "{} lattice needs {} lattice constant(s), got {}",
                self.lattice,
                needed,
                self.constants.len()
            )));
        }
        if let Some(bad) = self.constants.iter().find(|c| !(**c > 0.0)) {
            return Err(VacancyError::InvalidArgument(format!(
                "lattice constants must be positive, got {}",
                bad
            )));
        }

        let a = self.constants[0];
        let lattice = match self.lattice {
            LatticeType::Hcp => Lattice::orthorhombic(a, a * 3.0_f64.sqrt(), self.constants[1]),
            _ => Lattice::orthorhombic(a, a, a),
        };

        let atoms = self
            .lattice
            .fractional_sites()
            .iter()
            .map(|frac| Atom::new(self.element.clone(), lattice.frac_to_cart(frac)))
            .collect();

        Ok(Structure::new(
            format!("{}-{}", self.element, self.lattice),
            lattice,
            atoms,
        ))
    }
}

/// 宿主晶体信息
#[derive(Debug, Clone, PartialEq)]
pub struct CrystalInfo {
    pub short_name: String,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub space_group: String,
    pub wyckoff_codes: Vec<String>,
    pub wyckoff_sites: Vec<[f64; 3]>,
    pub wyckoff_species: Vec<String>,
}

impl CrystalInfo {
    pub fn from_basis(basis: &Structure, spec: &BasisSpec) -> Self {
        let (a, b, c, alpha, beta, gamma) = basis.lattice.parameters();
        let codes: Vec<String> = spec
            .lattice
            .wyckoff_codes()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let species = vec![spec.element.clone(); codes.len()];

        CrystalInfo {
            short_name: spec.lattice.to_string(),
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
            space_group: spec.lattice.space_group().to_string(),
            wyckoff_codes: codes,
            wyckoff_sites: spec.lattice.wyckoff_sites(),
            wyckoff_species: species,
        }
    }
}
