//! # TCAS 水平判定
//!
//! 修正タウ（modified tau）による水平方向の RA 判定と、その成立区間を求めます。

use super::horizontal::{delta, tcpa, theta_d};
use super::loss_data::LossData;
use super::EXIT;
use crate::geometry::util::{almost_equals, discr, sq, sqrt_safe};
use crate::geometry::Vect2;

/// 修正タウ `(DMOD² - |s|²) / (s·v)`
///
/// `s·v` がほぼ 0 のときは 0 を返します。
pub fn tau_mod(s: &Vect2, v: &Vect2, dmod: f64) -> f64 {
    let sdotv = s.dot(v);
    if almost_equals(sdotv, 0.0) {
        return 0.0;
    }
    (sq(dmod) - s.sqv()) / sdotv
}

/// 時刻 0 での水平 RA 判定
pub fn horizontal_ra(dmod: f64, tau: f64, s: &Vect2, v: &Vect2) -> bool {
    if s.dot(v) >= 0.0 {
        return s.sqv() <= sq(dmod);
    }
    s.sqv() <= sq(dmod) || tau_mod(s, v, dmod) <= tau
}

/// 区間 `[b, t]` で水平 RA が成立する区間
///
/// `tau_mod(s + τv) <= TAU` は `|v|²τ² + (2s·v + TAU|v|²)τ + |s|² + TAU·s·v - DMOD² <= 0`
/// と同値になります（接近中に限る）。
pub fn ra2d_interval(dmod: f64, tau: f64, b: f64, t: f64, s: &Vect2, vo: &Vect2, vi: &Vect2) -> LossData {
    let v = *vo - *vi;
    let a = v.sqv();
    let sdotv = s.dot(&v);
    let inside = s.sqv() <= sq(dmod);

    if almost_equals(a, 0.0) {
        return if inside { LossData::new(b, t) } else { LossData::new(t, b) };
    }

    let exit = if delta(s, &v, dmod) >= 0.0 {
        theta_d(s, &v, EXIT, dmod)
    } else {
        tcpa(s, &v)
    };

    if inside {
        return LossData::new(b, t.min(exit));
    }
    if sdotv >= 0.0 {
        return LossData::new(t, b);
    }

    let qb = 2.0 * sdotv + tau * a;
    let qc = s.sqv() + tau * sdotv - sq(dmod);
    let d = discr(a, qb, qc);
    if d < 0.0 {
        return LossData::new(t, b);
    }
    let t1 = (-qb - sqrt_safe(d)) / (2.0 * a);
    let t2 = (-qb + sqrt_safe(d)) / (2.0 * a);
    let tout = if delta(s, &v, dmod) >= 0.0 { exit } else { t2 };
    let tin = b.max(t1);
    let tout = t.min(tout);
    if tin > tout {
        return LossData::new(t, b);
    }
    LossData::new(tin, tout)
}

/// 区間 `[b, t]` で修正タウが最小となる時刻
///
/// 離反中や相対速度がない場合は `b` を返します。
pub fn time_of_min_tau(dmod: f64, b: f64, t: f64, s: &Vect2, v: &Vect2) -> f64 {
    let a = v.sqv();
    if s.dot(v) >= 0.0 || almost_equals(a, 0.0) {
        return b;
    }
    let d = delta(s, v, dmod);
    let tm = if d < 0.0 {
        (-sqrt_safe(-d) - s.dot(v)) / a
    } else {
        tcpa(s, v)
    };
    tm.max(b).min(t)
}

/// 区間 `[b, t]` に水平 RA が存在するか
pub fn ra2d(dmod: f64, tau: f64, b: f64, t: f64, s: &Vect2, vo: &Vect2, vi: &Vect2) -> bool {
    ra2d_interval(dmod, tau, b, t, s, vo, vi).conflict()
}
