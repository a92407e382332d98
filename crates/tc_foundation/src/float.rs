// crates/tc_foundation/src/float.rs

//! 数值下限常量与安全运算
//!
//! 比值公式中的分母统一按下限截断，不以错误形式上报。
//! 各常量是可调的数值保护量，不承载物理含义。

// ============================================================================
// 数值常量
// ============================================================================

/// 小量，用于应变率、涡量等频率量的下限
pub const SMALL: f64 = 1e-15;

/// 混合函数参数分母的下限
pub const ARG_FLOOR: f64 = 1e-20;

/// 单元体积下限（立方米），开立方前截断
pub const MIN_VOLUME: f64 = 1e-30;

/// 安全除法阈值
pub const SAFE_DIV_EPSILON: f64 = 1e-14;

// ============================================================================
// 函数
// ============================================================================

/// 平方
#[inline]
pub fn sqr(x: f64) -> f64 {
    x * x
}

/// 立方
#[inline]
pub fn pow3(x: f64) -> f64 {
    x * x * x
}

/// 四次方
#[inline]
pub fn pow4(x: f64) -> f64 {
    let x2 = x * x;
    x2 * x2
}

/// 六次方
#[inline]
pub fn pow6(x: f64) -> f64 {
    pow3(x) * pow3(x)
}

/// 下限截断，NaN 也截断为下限
#[inline]
pub fn bound_below(x: f64, floor: f64) -> f64 {
    if x >= floor {
        x
    } else {
        floor
    }
}

/// 安全除法
///
/// 分母绝对值小于 [`SAFE_DIV_EPSILON`] 或结果非有限时返回 `fallback`。
#[inline]
pub fn safe_div(a: f64, b: f64, fallback: f64) -> f64 {
    if b.abs() < SAFE_DIV_EPSILON {
        fallback
    } else {
        let result = a / b;
        if result.is_finite() {
            result
        } else {
            fallback
        }
    }
}

/// 就地下限截断，返回被截断的元素个数
pub fn bound_slice_below(values: &mut [f64], floor: f64) -> usize {
    let mut clipped = 0;
    for v in values.iter_mut() {
        if !(*v >= floor) {
            *v = floor;
            clipped += 1;
        }
    }
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_below_handles_nan() {
        assert_eq!(bound_below(f64::NAN, 0.0), 0.0);
        assert_eq!(bound_below(-1.0, 0.0), 0.0);
        assert_eq!(bound_below(2.0, 0.0), 2.0);
    }

    #[test]
    fn test_bound_slice() {
        let mut v = vec![-1.0, 0.5, f64::NAN, 3.0];
        let n = bound_slice_below(&mut v, 1e-10);
        assert_eq!(n, 2);
        assert!(v.iter().all(|&x| x >= 1e-10));
    }

    #[test]
    fn test_safe_div() {
        assert_eq!(safe_div(1.0, 0.0, 7.0), 7.0);
        assert!((safe_div(1.0, 4.0, 0.0) - 0.25).abs() < 1e-15);
        assert_eq!(safe_div(1.0, 1e-300, 1.0), 1.0);
    }

    #[test]
    fn test_powers() {
        assert!((pow4(2.0) - 16.0).abs() < 1e-14);
        assert!((pow6(2.0) - 64.0).abs() < 1e-14);
    }
}
