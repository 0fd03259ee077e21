//! # 垂直ソルバー
//!
//! 水平ソルバーの1次元版です。高さ `H` の垂直スラブ境界に対する進入・離脱時刻と、
//! 垂直速度のみの回避解を求めます。

use std::fmt;

use super::horizontal::{delta, theta_d};
use super::{ENTRY, EXIT};
use crate::geometry::util::{almost_equals, sign};
use crate::geometry::{Vect2, Vect3};

/// 垂直回避解
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Vertical {
    #[default]
    NoSolution,
    /// 昇降率 [m/s]
    Speed(f64),
}

impl Vertical {
    pub fn undef(&self) -> bool {
        matches!(self, Vertical::NoSolution)
    }

    pub fn speed(&self) -> Option<f64> {
        match self {
            Vertical::Speed(vz) => Some(*vz),
            Vertical::NoSolution => None,
        }
    }

    /// 解がある場合に昇降率を加算
    fn add(self, vz: f64) -> Self {
        match self {
            Vertical::Speed(nvz) => Vertical::Speed(nvz + vz),
            Vertical::NoSolution => Vertical::NoSolution,
        }
    }
}

impl fmt::Display for Vertical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vertical::NoSolution => write!(f, "Undef"),
            Vertical::Speed(vz) => write!(f, "{:.4}", vz),
        }
    }
}

/// スラブ境界 `±H` への進入（`eps = -1`）／離脱（`eps = +1`）時刻
///
/// `vz = 0` では NaN を返します。
pub fn theta_h(sz: f64, vz: f64, eps: i32, h: f64) -> f64 {
    if vz == 0.0 {
        return f64::NAN;
    }
    (eps as f64 * sign(vz) as f64 * h - sz) / vz
}

/// 同高度になるまでの時間
pub fn time_coalt(sz: f64, vz: f64) -> f64 {
    if sz == 0.0 { 0.0 } else { -sz / vz }
}

/// 境界を除いた垂直方向の LoS
pub fn almost_vertical_los(sz: f64, h: f64) -> bool {
    let abs_sz = sz.abs();
    !almost_equals(abs_sz, h) && abs_sz < h
}

pub fn vertical_sep(sz: f64, h: f64) -> bool {
    sz.abs() >= h
}

/// 時刻 `t` に高さ `eps·H` へ到達する相対昇降率
pub fn vs_at(sz: f64, t: f64, eps: i32, h: f64) -> Vertical {
    if t == 0.0 {
        return Vertical::NoSolution;
    }
    Vertical::Speed((eps as f64 * h - sz) / t)
}

/// 水平方向の時刻 `t` を基準にした相対昇降率
pub fn vs_only(s: &Vect3, v2: &Vect2, t: f64, eps: i32, d: f64, h: f64) -> Vertical {
    let s2 = s.vect2();
    if eps as f64 * s.z < h && s2.sqv() > d * d && delta(&s2, v2, d) > 0.0 {
        return vs_at(s.z, theta_d(&s2, v2, ENTRY, d), eps, h);
    }
    if eps as f64 * s.z >= h && t > 0.0 {
        return vs_at(s.z, t, eps, h);
    }
    Vertical::NoSolution
}

/// 垂直速度のみの回避解（絶対昇降率）
///
/// 水平速度が一致し、すでに `eps` 側で垂直分離している場合は侵入機の昇降率に合わせます。
pub fn vs_circle(s: &Vect3, vo: &Vect3, vi: &Vect3, eps: i32, d: f64, h: f64) -> Vertical {
    let v = *vo - *vi;
    let v2 = v.vect2();
    let s2 = s.vect2();
    let nvz = if vo.vect2().almost_equals(&vi.vect2()) && eps as f64 * s.z >= h {
        Vertical::Speed(0.0)
    } else if delta(&s2, &v2, d) > 0.0 {
        vs_only(s, &v2, theta_d(&s2, &v2, EXIT, d), eps, d, h)
    } else {
        Vertical::NoSolution
    };
    nvz.add(vi.z)
}
