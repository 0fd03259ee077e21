//! # 単位変換
//!
//! 内部単位は m, s, rad, m/s です。外部単位付きの設定値はこのモジュールで内部単位へ変換します。

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 認識できない単位名
#[derive(Debug, Clone, PartialEq, Error)]
#[error("未知の単位: {0}")]
pub struct UnitError(pub String);

/// 物理単位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Meter,
    Foot,
    NauticalMile,
    Kilometer,
    Second,
    Minute,
    Hour,
    Knot,
    FeetPerMinute,
    MeterPerSecond,
    Degree,
    Radian,
}

impl Unit {
    /// 1 単位あたりの内部単位量
    pub fn factor(self) -> f64 {
        match self {
            Unit::Meter => 1.0,
            Unit::Foot => 0.3048,
            Unit::NauticalMile => 1852.0,
            Unit::Kilometer => 1000.0,
            Unit::Second => 1.0,
            Unit::Minute => 60.0,
            Unit::Hour => 3600.0,
            Unit::Knot => 1852.0 / 3600.0,
            Unit::FeetPerMinute => 0.3048 / 60.0,
            Unit::MeterPerSecond => 1.0,
            Unit::Degree => std::f64::consts::PI / 180.0,
            Unit::Radian => 1.0,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Meter => "m",
            Unit::Foot => "ft",
            Unit::NauticalMile => "nmi",
            Unit::Kilometer => "km",
            Unit::Second => "s",
            Unit::Minute => "min",
            Unit::Hour => "h",
            Unit::Knot => "kn",
            Unit::FeetPerMinute => "fpm",
            Unit::MeterPerSecond => "m/s",
            Unit::Degree => "deg",
            Unit::Radian => "rad",
        }
    }
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "m" => Ok(Unit::Meter),
            "ft" => Ok(Unit::Foot),
            "nmi" | "nm" => Ok(Unit::NauticalMile),
            "km" => Ok(Unit::Kilometer),
            "s" => Ok(Unit::Second),
            "min" => Ok(Unit::Minute),
            "h" | "hr" => Ok(Unit::Hour),
            "kn" | "knot" | "kts" => Ok(Unit::Knot),
            "fpm" | "ft/min" => Ok(Unit::FeetPerMinute),
            "m/s" | "mps" => Ok(Unit::MeterPerSecond),
            "deg" => Ok(Unit::Degree),
            "rad" => Ok(Unit::Radian),
            _ => Err(UnitError(s.to_string())),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// 外部単位の値を内部単位へ変換
pub fn from_unit(unit: Unit, value: f64) -> f64 {
    value * unit.factor()
}

/// 内部単位の値を外部単位へ変換
pub fn to_unit(unit: Unit, value: f64) -> f64 {
    value / unit.factor()
}

/// 単位名（文字列）で変換
pub fn from_str_unit(unit: &str, value: f64) -> Result<f64, UnitError> {
    Ok(from_unit(unit.parse()?, value))
}

pub fn to_str_unit(unit: &str, value: f64) -> Result<f64, UnitError> {
    Ok(to_unit(unit.parse()?, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_from_str() {
        assert_eq!("ft".parse::<Unit>(), Ok(Unit::Foot));
        assert_eq!("NMI".parse::<Unit>(), Ok(Unit::NauticalMile));
        assert_eq!("kn".parse::<Unit>(), Ok(Unit::Knot));
        assert!("furlong".parse::<Unit>().is_err());
    }

    #[test]
    fn test_conversions() {
        assert_eq!(from_unit(Unit::NauticalMile, 1.0), 1852.0);
        assert!((from_unit(Unit::Foot, 1000.0) - 304.8).abs() < 1.0e-9);
        assert!((to_unit(Unit::Knot, from_unit(Unit::Knot, 250.0)) - 250.0).abs() < 1.0e-9);
        assert!((from_unit(Unit::FeetPerMinute, 6000.0) - 30.48).abs() < 1.0e-9);
    }

    #[test]
    fn test_str_unit_error() {
        assert!(from_str_unit("deg", 180.0).is_ok());
        assert_eq!(from_str_unit("parsec", 1.0), Err(UnitError("parsec".to_string())));
    }
}
