// crates/tc_foundation/src/dimension.rs

//! 物理量纲
//!
//! 湍流量只涉及质量、长度、时间三个基本量纲，用整数指数表示。
//! 场在组装方程时检查量纲一致性，量纲错误属于宿主误用。

use crate::error::{TcError, TcResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Div, Mul};

/// 量纲指数 `[M^m L^l T^t]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UnitDim {
    /// 质量指数
    pub m: i8,
    /// 长度指数
    pub l: i8,
    /// 时间指数
    pub t: i8,
}

impl UnitDim {
    /// 无量纲
    pub const DIMENSIONLESS: Self = Self::new(0, 0, 0);
    /// 长度 m
    pub const LENGTH: Self = Self::new(0, 1, 0);
    /// 体积 m^3
    pub const VOLUME: Self = Self::new(0, 3, 0);
    /// 频率 1/s（应变率、涡量、比耗散率）
    pub const FREQUENCY: Self = Self::new(0, 0, -1);
    /// 速度 m/s
    pub const VELOCITY: Self = Self::new(0, 1, -1);
    /// 运动粘度 m^2/s
    pub const KINEMATIC_VISCOSITY: Self = Self::new(0, 2, -1);
    /// 湍动能 m^2/s^2
    pub const K: Self = Self::new(0, 2, -2);
    /// 耗散率 m^2/s^3
    pub const EPSILON: Self = Self::new(0, 2, -3);
    /// 湍动能乘长度 kL：m^3/s^2
    pub const K_LENGTH: Self = Self::new(0, 3, -2);
    /// 密度 kg/m^3
    pub const DENSITY: Self = Self::new(1, -3, 0);

    /// 由指数构造
    pub const fn new(m: i8, l: i8, t: i8) -> Self {
        Self { m, l, t }
    }

    /// 是否无量纲
    pub fn is_dimensionless(self) -> bool {
        self == Self::DIMENSIONLESS
    }

    /// 整数次幂
    pub fn powi(self, n: i8) -> Self {
        Self::new(self.m * n, self.l * n, self.t * n)
    }

    /// 检查与期望量纲一致
    pub fn expect_eq(self, expected: Self, context: &str) -> TcResult<()> {
        if self == expected {
            Ok(())
        } else {
            Err(TcError::dimension_mismatch(context, expected, self))
        }
    }
}

impl Mul for UnitDim {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(self.m + rhs.m, self.l + rhs.l, self.t + rhs.t)
    }
}

impl Div for UnitDim {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Self::new(self.m - rhs.m, self.l - rhs.l, self.t - rhs.t)
    }
}

impl fmt::Display for UnitDim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "1");
        }
        let mut parts = Vec::new();
        for (sym, exp) in [("kg", self.m), ("m", self.l), ("s", self.t)] {
            match exp {
                0 => {}
                1 => parts.push(sym.to_string()),
                e => parts.push(format!("{sym}^{e}")),
            }
        }
        write!(f, "{}", parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_products() {
        assert_eq!(UnitDim::KINEMATIC_VISCOSITY * UnitDim::FREQUENCY, UnitDim::K);
        assert_eq!(UnitDim::K * UnitDim::FREQUENCY, UnitDim::EPSILON);
        assert_eq!(UnitDim::K * UnitDim::LENGTH, UnitDim::K_LENGTH);
        assert_eq!(UnitDim::K / UnitDim::K, UnitDim::DIMENSIONLESS);
        assert_eq!(UnitDim::LENGTH.powi(3), UnitDim::VOLUME);
    }

    #[test]
    fn test_display() {
        assert_eq!(UnitDim::DIMENSIONLESS.to_string(), "1");
        assert_eq!(UnitDim::KINEMATIC_VISCOSITY.to_string(), "m^2 s^-1");
        assert_eq!(UnitDim::DENSITY.to_string(), "kg m^-3");
    }

    #[test]
    fn test_expect_eq() {
        assert!(UnitDim::K.expect_eq(UnitDim::K, "k").is_ok());
        assert!(UnitDim::K.expect_eq(UnitDim::EPSILON, "k").is_err());
    }

    #[test]
    fn test_serde() {
        let json = serde_json::to_string(&UnitDim::K_LENGTH).unwrap();
        let back: UnitDim = serde_json::from_str(&json).unwrap();
        assert_eq!(back, UnitDim::K_LENGTH);
    }
}
