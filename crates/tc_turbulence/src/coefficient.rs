// crates/tc_turbulence/src/coefficient.rs

//! 系数混合
//!
//! `blend(f, a, b) = f·a + (1-f)·b`，f = 1 取内层系数 a，f = 0 取外层系数 b。

use crate::blend::BlendField;

/// 线性混合，结果截断在 [min(a,b), max(a,b)] 内
#[inline]
pub fn blend(f: f64, a: f64, b: f64) -> f64 {
    let value = f * a + (1.0 - f) * b;
    value.clamp(a.min(b), a.max(b))
}

/// 按单元混合的模型系数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoefficientBlender {
    name: &'static str,
    inner: f64,
    outer: f64,
}

impl CoefficientBlender {
    /// `inner` 对应 f = 1，`outer` 对应 f = 0
    pub fn new(name: &'static str, inner: f64, outer: f64) -> Self {
        Self { name, inner, outer }
    }

    /// 系数名称
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 单点混合
    #[inline]
    pub fn value(&self, f: f64) -> f64 {
        blend(f, self.inner, self.outer)
    }

    /// 在混合函数场上逐单元混合
    pub fn blend_field(&self, f: &BlendField) -> Vec<f64> {
        f.values().iter().map(|&fi| self.value(fi)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        assert_eq!(blend(0.0, 0.0829, 0.1127), 0.1127);
        assert_eq!(blend(1.0, 0.0829, 0.1127), 0.0829);
    }

    #[test]
    fn test_bounded_between_endpoints() {
        let c = CoefficientBlender::new("sigmaR", 0.72, 1.0);
        for i in 0..=20 {
            let f = i as f64 / 20.0;
            let v = c.value(f);
            assert!((0.72..=1.0).contains(&v));
        }
        let field = BlendField::uniform(3, 0.5);
        for v in c.blend_field(&field) {
            assert!((v - 0.86).abs() < 1e-12);
        }
        assert_eq!(c.name(), "sigmaR");
    }
}
