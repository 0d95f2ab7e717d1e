//! # 三维向量工具
//!
//! `[f64; 3]` 上的基本运算。

/// 向量点积
pub fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// 向量叉积
pub fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn norm(a: &[f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

pub fn add(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub fn sub(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn scale(a: &[f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

/// 两向量夹角（度，0-180）；零向量返回 0
pub fn angle_degrees(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let cos = dot(a, b) / (norm(a) * norm(b));
    let angle = cos.clamp(-1.0, 1.0).acos();
    if angle.is_nan() {
        return 0.0;
    }
    angle.to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_and_dot() {
        let x = [1.0, 0.0, 0.0];
        let y = [0.0, 1.0, 0.0];
        assert_eq!(cross(&x, &y), [0.0, 0.0, 1.0]);
        assert_eq!(dot(&x, &y), 0.0);
    }

    #[test]
    fn test_angle_degrees() {
        assert!((angle_degrees(&[1.0, 0.0, 0.0], &[0.0, 2.0, 0.0]) - 90.0).abs() < 1e-12);
        assert!((angle_degrees(&[1.0, 1.0, 0.0], &[1.0, 0.0, 0.0]) - 45.0).abs() < 1e-12);
        assert_eq!(angle_degrees(&[0.0; 3], &[1.0, 0.0, 0.0]), 0.0);
    }
}
