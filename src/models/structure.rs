//! # 周期结构数据模型
//!
//! 原子位置、周期晶胞和周期性标志。空位计算的每一步都复制结构后再修改，
//! 已经弛豫好的状态因此始终可以作为参照。
//!
//! 原子位置使用笛卡尔坐标 (Å)。
//!
//! ## 依赖关系
//! - 被 `models/basis.rs`, `engine/`, `vacancy/` 使用
//! - 使用 `numerics/vec3.rs`

use crate::numerics::vec3;

use serde::{Deserialize, Serialize};

/// 晶格参数表示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，行向量表示 a, b, c
    /// [[a1, a2, a3], [b1, b2, b3], [c1, c2, c3]]
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// 正交晶格
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Self {
        Lattice {
            matrix: [[a, 0.0, 0.0], [0.0, b, 0.0], [0.0, 0.0, c]],
        }
    }

    /// 晶格向量长度 (a, b, c)
    pub fn lengths(&self) -> [f64; 3] {
        [
            vec3::norm(&self.matrix[0]),
            vec3::norm(&self.matrix[1]),
            vec3::norm(&self.matrix[2]),
        ]
    }

    /// 晶格角 (alpha, beta, gamma)，单位：度
    pub fn angles(&self) -> [f64; 3] {
        let m = &self.matrix;
        [
            vec3::angle_degrees(&m[1], &m[2]),
            vec3::angle_degrees(&m[2], &m[0]),
            vec3::angle_degrees(&m[0], &m[1]),
        ]
    }

    /// 获取晶格参数 (a, b, c, alpha, beta, gamma)
    pub fn parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        let [a, b, c] = self.lengths();
        let [alpha, beta, gamma] = self.angles();
        (a, b, c, alpha, beta, gamma)
    }

    /// 计算晶格体积
    pub fn volume(&self) -> f64 {
        let m = &self.matrix;
        vec3::dot(&m[0], &vec3::cross(&m[1], &m[2]))
    }

    /// 三个方向上相对晶面之间的距离中的最小值
    pub fn min_width(&self) -> f64 {
        let m = &self.matrix;
        let volume = self.volume().abs();
        [
            vec3::norm(&vec3::cross(&m[1], &m[2])),
            vec3::norm(&vec3::cross(&m[2], &m[0])),
            vec3::norm(&vec3::cross(&m[0], &m[1])),
        ]
        .iter()
        .map(|area| volume / area)
        .fold(f64::INFINITY, f64::min)
    }

    /// 晶格向量是否两两正交
    pub fn is_orthorhombic(&self) -> bool {
        let m = &self.matrix;
        let tol = 1e-10 * self.lengths().iter().fold(1.0_f64, |acc, l| acc.max(*l));
        vec3::dot(&m[0], &m[1]).abs() < tol
            && vec3::dot(&m[1], &m[2]).abs() < tol
            && vec3::dot(&m[2], &m[0]).abs() < tol
    }

    /// 整体缩放
    pub fn scaled(&self, factor: f64) -> Self {
        let mut matrix = self.matrix;
        for row in matrix.iter_mut() {
            *row = vec3::scale(row, factor);
        }
        Lattice { matrix }
    }

    /// 分数坐标转笛卡尔坐标
    pub fn frac_to_cart(&self, frac: &[f64; 3]) -> [f64; 3] {
        let m = &self.matrix;
        [
            frac[0] * m[0][0] + frac[1] * m[1][0] + frac[2] * m[2][0],
            frac[0] * m[0][1] + frac[1] * m[1][1] + frac[2] * m[2][1],
            frac[0] * m[0][2] + frac[1] * m[1][2] + frac[2] * m[2][2],
        ]
    }

    /// 笛卡尔坐标转分数坐标
    pub fn cart_to_frac(&self, cart: &[f64; 3]) -> [f64; 3] {
        // r = f · M  =>  f_i = r · (a_j × a_k) / V
        let m = &self.matrix;
        let volume = self.volume();
        [
            vec3::dot(cart, &vec3::cross(&m[1], &m[2])) / volume,
            vec3::dot(cart, &vec3::cross(&m[2], &m[0])) / volume,
            vec3::dot(cart, &vec3::cross(&m[0], &m[1])) / volume,
        ]
    }
}

/// 原子信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    /// 元素符号
    pub element: String,

    /// 笛卡尔坐标 [x, y, z] (Å)
    pub position: [f64; 3],
}

impl Atom {
    pub fn new(element: impl Into<String>, position: [f64; 3]) -> Self {
        Atom {
            element: element.into(),
            position,
        }
    }
}

/// 周期结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    /// 结构名称
    pub name: String,

    /// 晶胞
    pub lattice: Lattice,

    /// 原子列表
    pub atoms: Vec<Atom>,

    /// 三个方向的周期性
    pub pbc: [bool; 3],
}

impl Structure {
    pub fn new(name: impl Into<String>, lattice: Lattice, atoms: Vec<Atom>) -> Self {
        Structure {
            name: name.into(),
            lattice,
            atoms,
            pbc: [true; 3],
        }
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// 所有原子的笛卡尔坐标
    pub fn positions(&self) -> Vec<[f64; 3]> {
        self.atoms.iter().map(|a| a.position).collect()
    }

    /// 按顺序覆盖原子坐标
    pub fn set_positions(&mut self, positions: &[[f64; 3]]) {
        debug_assert_eq!(positions.len(), self.atoms.len());
        for (atom, pos) in self.atoms.iter_mut().zip(positions) {
            atom.position = *pos;
        }
    }

    /// 沿每个晶格方向复制 `size` 次得到超胞
    ///
    /// 晶胞序号在外层、基元原子在内层，超胞的第 0 个原子就是
    /// (0,0,0) 晶胞中的第 0 个基元原子。
    pub fn supercell(&self, size: usize) -> Structure {
        let mut atoms = Vec::with_capacity(self.atoms.len() * size * size * size);

        for i in 0..size {
            for j in 0..size {
                for k in 0..size {
                    let shift = self
                        .lattice
                        .frac_to_cart(&[i as f64, j as f64, k as f64]);
                    for atom in &self.atoms {
                        atoms.push(Atom::new(
                            atom.element.clone(),
                            vec3::add(&atom.position, &shift),
                        ));
                    }
                }
            }
        }

        Structure {
            name: format!("{}_{}x{}x{}", self.name, size, size, size),
            lattice: self.lattice.scaled(size as f64),
            atoms,
            pbc: self.pbc,
        }
    }

    /// 删除一个原子并返回它
    pub fn remove_atom(&mut self, index: usize) -> Option<Atom> {
        if index < self.atoms.len() {
            Some(self.atoms.remove(index))
        } else {
            None
        }
    }

    /// 最小镜像约定下的位移向量
    pub fn minimum_image(&self, d: &[f64; 3]) -> [f64; 3] {
        let mut frac = self.lattice.cart_to_frac(d);
        for (axis, f) in frac.iter_mut().enumerate() {
            if self.pbc[axis] {
                *f -= f.round();
            }
        }
        self.lattice.frac_to_cart(&frac)
    }

    /// 从 `from` 指向 `to` 的最小镜像位移
    pub fn displacement(&self, from: &[f64; 3], to: &[f64; 3]) -> [f64; 3] {
        self.minimum_image(&vec3::sub(to, from))
    }

    /// 第 `index` 个原子的最近邻壳层：(序号, 最小镜像位移)，按序号排列
    ///
    /// 距离与最近距离相差不超过 `tol` 的原子都算作同一壳层。
    pub fn nearest_shell(&self, index: usize, tol: f64) -> Vec<(usize, [f64; 3])> {
        let center = match self.atoms.get(index) {
            Some(atom) => atom.position,
            None => return Vec::new(),
        };

        let neighbours: Vec<(usize, [f64; 3], f64)> = self
            .atoms
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(i, atom)| {
                let d = self.displacement(&center, &atom.position);
                (i, d, vec3::norm(&d))
            })
            .collect();

        let closest = neighbours.iter().map(|n| n.2).fold(f64::INFINITY, f64::min);
        neighbours
            .into_iter()
            .filter(|n| n.2 <= closest + tol)
            .map(|(i, d, _)| (i, d))
            .collect()
    }

    /// 与另一结构逐原子比较的最大位移
    pub fn max_displacement_from(&self, other: &Structure) -> f64 {
        self.atoms
            .iter()
            .zip(&other.atoms)
            .map(|(a, b)| vec3::norm(&self.displacement(&b.position, &a.position)))
            .fold(0.0, f64::max)
    }

    /// 计算化学式
    pub fn formula(&self) -> String {
        use std::collections::BTreeMap;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

        for atom in &self.atoms {
            *counts.entry(atom.element.as_str()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|(el, count)| {
                if count == 1 {
                    el.to_string()
                } else {
                    format!("{}{}", el, count)
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_cubic(a: f64) -> Structure {
        Structure::new(
            "sc",
            Lattice::orthorhombic(a, a, a),
            vec![Atom::new("Ar", [0.0, 0.0, 0.0])],
        )
    }

    #[test]
    fn test_lattice_parameters_cubic() {
        let lattice = Lattice::orthorhombic(5.0, 5.0, 5.0);
        let (a, b, c, alpha, beta, gamma) = lattice.parameters();

        assert!((a - 5.0).abs() < 1e-6);
        assert!((b - 5.0).abs() < 1e-6);
        assert!((c - 5.0).abs() < 1e-6);
        assert!((alpha - 90.0).abs() < 1e-6);
        assert!((beta - 90.0).abs() < 1e-6);
        assert!((gamma - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_lattice_volume_and_width() {
        let lattice = Lattice::orthorhombic(2.0, 3.0, 4.0);
        assert!((lattice.volume() - 24.0).abs() < 1e-12);
        assert!((lattice.min_width() - 2.0).abs() < 1e-12);
        assert!(lattice.is_orthorhombic());
    }

    #[test]
    fn test_lattice_hexagonal_not_orthorhombic() {
        let s3 = 3.0_f64.sqrt();
        let lattice = Lattice::from_vectors([[3.0, 0.0, 0.0], [-1.5, 1.5 * s3, 0.0], [0.0, 0.0, 5.0]]);
        let (_, _, _, _, _, gamma) = lattice.parameters();
        assert!((gamma - 120.0).abs() < 1e-6);
        assert!(!lattice.is_orthorhombic());
    }

    #[test]
    fn test_frac_cart_roundtrip() {
        let lattice = Lattice::from_vectors([[4.0, 0.0, 0.0], [1.0, 3.0, 0.0], [0.5, 0.5, 6.0]]);
        let frac = [0.25, 0.5, 0.75];
        let back = lattice.cart_to_frac(&lattice.frac_to_cart(&frac));
        for i in 0..3 {
            assert!((back[i] - frac[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_supercell_ordering_and_count() {
        let basis = Structure::new(
            "bcc",
            Lattice::orthorhombic(3.0, 3.0, 3.0),
            vec![
                Atom::new("Fe", [0.0, 0.0, 0.0]),
                Atom::new("Fe", [1.5, 1.5, 1.5]),
            ],
        );
        let sc = basis.supercell(3);

        assert_eq!(sc.len(), 54);
        assert_eq!(sc.atoms[0].position, [0.0, 0.0, 0.0]);
        assert_eq!(sc.atoms[1].position, [1.5, 1.5, 1.5]);
        assert!((sc.lattice.volume() - 27.0 * 27.0).abs() < 1e-9);
        assert_eq!(sc.formula(), "Fe54");
    }

    #[test]
    fn test_minimum_image_wraps() {
        let s = simple_cubic(10.0);
        let d = s.minimum_image(&[9.0, -6.0, 4.0]);
        assert!((d[0] - (-1.0)).abs() < 1e-12);
        assert!((d[1] - 4.0).abs() < 1e-12);
        assert!((d[2] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_nearest_shell_across_boundary() {
        let sc = simple_cubic(2.0).supercell(3);
        let shell = sc.nearest_shell(0, 1e-6);

        // 简单立方 6 个近邻，其中 3 个跨过边界
        assert_eq!(shell.len(), 6);
        for (_, d) in &shell {
            assert!((vec3::norm(d) - 2.0).abs() < 1e-12);
        }
        let (index, d) = shell[0];
        assert_eq!(index, 1);
        assert!((d[2] - 2.0).abs() < 1e-12);
        assert!(shell.iter().any(|(i, d)| *i == 2 && (d[2] + 2.0).abs() < 1e-12));

        assert!(sc.nearest_shell(sc.len(), 1e-6).is_empty());
    }

    #[test]
    fn test_remove_atom() {
        let mut sc = simple_cubic(2.0).supercell(2);
        let removed = sc.remove_atom(0).unwrap();
        assert_eq!(removed.position, [0.0, 0.0, 0.0]);
        assert_eq!(sc.len(), 7);
        assert!(sc.remove_atom(100).is_none());
    }

    #[test]
    fn test_max_displacement() {
        let a = simple_cubic(2.0).supercell(2);
        let mut b = a.clone();
        b.atoms[3].position[1] += 0.3;
        assert!((b.max_displacement_from(&a) - 0.3).abs() < 1e-12);
        assert_eq!(a.max_displacement_from(&a), 0.0);
    }
}
