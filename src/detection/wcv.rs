//! # Well-Clear 検知器（修正タウ）
//!
//! 水平は `DTHR` と修正タウ `TTHR`、垂直は `ZTHR` と同高度到達時間 `TCOA` で判定します。

use std::fmt;

use serde::{Deserialize, Serialize};

use super::cd3d;
use super::horizontal::{dcpa, delta, theta_d};
use super::loss_data::{ConflictData, LossData};
use super::vertical::{theta_h, time_coalt};
use super::{id_prefix, Detection3D, ENTRY, EXIT};
use crate::geometry::units::{from_unit, to_unit};
use crate::geometry::util::{almost_equals, discr, sq, sqrt_safe};
use crate::geometry::{Unit, Vect2, Vect3, Velocity};

/// Well-Clear 閾値（内部単位）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WcvTable {
    /// 水平距離閾値 [m]
    pub dthr: f64,
    /// 垂直距離閾値 [m]
    pub zthr: f64,
    /// 修正タウ閾値 [s]
    pub tthr: f64,
    /// 同高度到達時間閾値 [s]
    pub tcoa: f64,
}

impl WcvTable {
    pub fn new(dthr: f64, zthr: f64, tthr: f64, tcoa: f64) -> Self {
        Self {
            dthr: dthr.abs(),
            zthr: zthr.abs(),
            tthr: tthr.abs(),
            tcoa: tcoa.abs(),
        }
    }

    pub fn dthr_in(&self, unit: Unit) -> f64 {
        to_unit(unit, self.dthr)
    }

    pub fn zthr_in(&self, unit: Unit) -> f64 {
        to_unit(unit, self.zthr)
    }

    pub fn set_dthr_in(&mut self, val: f64, unit: Unit) {
        self.dthr = from_unit(unit, val).abs();
    }

    pub fn set_zthr_in(&mut self, val: f64, unit: Unit) {
        self.zthr = from_unit(unit, val).abs();
    }

    pub fn set_tthr_in(&mut self, val: f64, unit: Unit) {
        self.tthr = from_unit(unit, val).abs();
    }

    pub fn set_tcoa_in(&mut self, val: f64, unit: Unit) {
        self.tcoa = from_unit(unit, val).abs();
    }

    /// すべての閾値が `other` 以上なら真
    pub fn contains(&self, other: &WcvTable) -> bool {
        self.dthr >= other.dthr && self.zthr >= other.zthr && self.tthr >= other.tthr && self.tcoa >= other.tcoa
    }
}

impl Default for WcvTable {
    /// DTHR 4000 ft, ZTHR 450 ft, TTHR 35 s, TCOA 0 s
    fn default() -> Self {
        Self::new(from_unit(Unit::Foot, 4000.0), from_unit(Unit::Foot, 450.0), 35.0, 0.0)
    }
}

impl fmt::Display for WcvTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DTHR = {:.4} [ft], ZTHR = {:.4} [ft], TTHR = {:.4} [s], TCOA = {:.4} [s]",
            self.dthr_in(Unit::Foot),
            self.zthr_in(Unit::Foot),
            self.tthr,
            self.tcoa
        )
    }
}

/// 修正タウ `(DTHR² - |s|²) / (s·v)`（離反中は -1）
pub fn horizontal_tvar(s: &Vect2, v: &Vect2, dthr: f64) -> f64 {
    let sdotv = s.dot(v);
    if sdotv < 0.0 {
        return (sq(dthr) - s.sqv()) / sdotv;
    }
    -1.0
}

/// 時刻 0 での水平 Well-Clear 違反
pub fn horizontal_wcv(table: &WcvTable, s: &Vect2, v: &Vect2) -> bool {
    if s.norm() <= table.dthr {
        return true;
    }
    if dcpa(s, v) <= table.dthr {
        let tvar = horizontal_tvar(s, v, table.dthr);
        return 0.0 <= tvar && tvar <= table.tthr;
    }
    false
}

/// 区間 `[0, t]` の水平違反区間
pub fn horizontal_wcv_interval(table: &WcvTable, t: f64, s: &Vect2, v: &Vect2) -> LossData {
    let sqs = s.sqv();
    let sdotv = s.dot(v);
    let sqd = sq(table.dthr);
    let a = v.sqv();

    if almost_equals(a, 0.0) && sqs <= sqd {
        return LossData::new(0.0, t);
    }
    if almost_equals(a, 0.0) || delta(s, v, table.dthr) < 0.0 {
        return LossData::new(t, 0.0);
    }
    let exit = theta_d(s, v, EXIT, table.dthr);
    if sqs <= sqd {
        return LossData::new(0.0, t.min(exit));
    }
    if sdotv >= 0.0 {
        return LossData::new(t, 0.0);
    }
    // |s + τv|² + TTHR·(s + τv)·v - DTHR² = 0 の小さい根
    let qb = 2.0 * sdotv + table.tthr * a;
    let qc = sqs + table.tthr * sdotv - sqd;
    let d = discr(a, qb, qc);
    if d < 0.0 {
        return LossData::new(t, 0.0);
    }
    let entry = (-qb - sqrt_safe(d)) / (2.0 * a);
    let tin = entry.max(0.0);
    let tout = t.min(exit);
    if tin > tout {
        return LossData::new(t, 0.0);
    }
    LossData::new(tin, tout)
}

/// 時刻 0 での垂直 Well-Clear 違反（TCOA）
pub fn vertical_wcv(zthr: f64, tcoa: f64, sz: f64, vz: f64) -> bool {
    sz.abs() <= zthr || (!almost_equals(vz, 0.0) && sz * vz <= 0.0 && time_coalt(sz, vz) <= tcoa)
}

/// 区間 `[b, t]` の垂直違反区間
pub fn vertical_wcv_interval(zthr: f64, tcoa: f64, b: f64, t: f64, sz: f64, vz: f64) -> LossData {
    if almost_equals(vz, 0.0) {
        return if sz.abs() <= zthr { LossData::new(b, t) } else { LossData::new(t, b) };
    }
    let act_h = zthr.max(vz.abs() * tcoa);
    let tentry = theta_h(sz, vz, ENTRY, act_h);
    let texit = theta_h(sz, vz, EXIT, zthr);
    if t < tentry || texit < b {
        return LossData::new(t, b);
    }
    LossData::new(tentry.max(b), texit.min(t))
}

/// Well-Clear 検知器
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WellClearDetector {
    table: WcvTable,
    id: String,
}

impl WellClearDetector {
    pub fn new(table: WcvTable) -> Self {
        Self {
            table,
            id: String::new(),
        }
    }

    pub fn table(&self) -> &WcvTable {
        &self.table
    }

    pub fn set_table(&mut self, table: WcvTable) {
        self.table = table;
    }

    /// 区間 `[b, t]` の3次元違反区間
    ///
    /// 垂直区間を先に求め、その区間内で水平区間を重ねます。
    pub fn wcv3d_interval(&self, so: &Vect3, vo: &Velocity, si: &Vect3, vi: &Velocity, b: f64, t: f64) -> LossData {
        let s = *so - *si;
        let v = *vo - *vi;
        let ii = vertical_wcv_interval(self.table.zthr, self.table.tcoa, b, t, s.z, v.z);
        let low = ii.raw_time_in();
        let high = ii.raw_time_out();
        if low > high {
            return LossData::new(t, b);
        }
        let s2 = s.vect2();
        let v2 = v.vect2();
        if almost_equals(low, high) {
            let sp = v2.scal_add(low, &s2);
            if horizontal_wcv(&self.table, &sp, &v2) {
                return LossData::new(low, high);
            }
            return LossData::new(t, b);
        }
        let step = v2.scal_add(low, &s2);
        let ld = horizontal_wcv_interval(&self.table, high - low, &step, &v2);
        LossData::new(ld.raw_time_in() + low, ld.raw_time_out() + low)
    }
}

impl Detection3D for WellClearDetector {
    fn violation(&self, so: &Vect3, vo: &Velocity, si: &Vect3, vi: &Velocity) -> bool {
        let s = *so - *si;
        let v = *vo - *vi;
        horizontal_wcv(&self.table, &s.vect2(), &v.vect2()) && vertical_wcv(self.table.zthr, self.table.tcoa, s.z, v.z)
    }

    fn conflict_detection(
        &self,
        so: &Vect3,
        vo: &Velocity,
        si: &Vect3,
        vi: &Velocity,
        b: f64,
        t: f64,
    ) -> ConflictData {
        let s = *so - *si;
        let v = *vo - *vi;
        let ld = self.wcv3d_interval(so, vo, si, vi, b, t);
        let t_crit = if ld.conflict() {
            0.5 * (ld.time_in() + ld.time_out())
        } else {
            cd3d::tccpa(&s, vo, vi, self.table.dthr, self.table.zthr, b, t)
        };
        let d_crit = s.linear(&v, t_crit).cyl_norm(self.table.dthr, self.table.zthr);
        ConflictData::new(ld, t_crit, d_crit, s, v)
    }

    fn identifier(&self) -> &str {
        &self.id
    }

    fn set_identifier(&mut self, id: &str) {
        self.id = id.to_string();
    }

    fn simple_class_name(&self) -> &'static str {
        "WCV_TAUMOD"
    }

    fn contains(&self, other: &Self) -> bool {
        self.table.contains(&other.table)
    }
}

impl fmt::Display for WellClearDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}: {{{}}}", id_prefix(&self.id), self.simple_class_name(), self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn table() -> WcvTable {
        WcvTable::new(1200.0, 130.0, 35.0, 0.0)
    }

    #[test]
    fn test_default_table() {
        let t = WcvTable::default();
        assert_relative_eq!(t.dthr_in(Unit::Foot), 4000.0, epsilon = 1.0e-9);
        assert_relative_eq!(t.zthr_in(Unit::Foot), 450.0, epsilon = 1.0e-9);
        assert_eq!(t.tthr, 35.0);
        assert_eq!(t.tcoa, 0.0);
    }

    #[test]
    fn test_horizontal_tvar() {
        let s = Vect2::new(5000.0, 0.0);
        let v = Vect2::new(-100.0, 0.0);
        assert_relative_eq!(horizontal_tvar(&s, &v, 1200.0), (2.5e7 - 1.44e6) / 5.0e5);
        assert_eq!(horizontal_tvar(&s, &(-v), 1200.0), -1.0);
    }

    #[test]
    fn test_horizontal_wcv() {
        let tab = table();
        let v = Vect2::new(-100.0, 0.0);
        assert!(horizontal_wcv(&tab, &Vect2::new(1000.0, 0.0), &(-v)));
        assert!(!horizontal_wcv(&tab, &Vect2::new(5000.0, 0.0), &v));
        assert!(horizontal_wcv(&tab, &Vect2::new(3500.0, 0.0), &v));
        // 修正タウは小さいが最接近距離が DTHR を超える
        assert!(!horizontal_wcv(&tab, &Vect2::new(3500.0, 1500.0), &v));
    }

    #[test]
    fn test_horizontal_wcv_interval_matches_point_test() {
        let tab = table();
        let s = Vect2::new(8000.0, 300.0);
        let v = Vect2::new(-150.0, 0.0);
        let ld = horizontal_wcv_interval(&tab, 120.0, &s, &v);
        assert!(ld.conflict());
        let at = |t: f64| horizontal_wcv(&tab, &v.scal_add(t, &s), &v);
        assert!(at(ld.time_in() + 0.01));
        assert!(!at(ld.time_in() - 0.01));
        assert!(at(ld.time_out() - 0.01));
        assert!(!at(ld.time_out() + 0.01));
    }

    #[test]
    fn test_vertical_wcv() {
        assert!(vertical_wcv(140.0, 0.0, 100.0, 5.0));
        assert!(!vertical_wcv(140.0, 0.0, 300.0, -5.0));
        assert!(vertical_wcv(140.0, 30.0, 300.0, -15.0));
        assert!(!vertical_wcv(140.0, 30.0, 300.0, 15.0));
    }

    #[test]
    fn test_vertical_wcv_interval() {
        let ld = vertical_wcv_interval(140.0, 0.0, 0.0, 100.0, 300.0, -5.0);
        assert_relative_eq!(ld.time_in(), 32.0, epsilon = 1.0e-9);
        assert_relative_eq!(ld.time_out(), 88.0, epsilon = 1.0e-9);
        // TCOA により進入が早まる
        let ld = vertical_wcv_interval(140.0, 40.0, 0.0, 100.0, 300.0, -5.0);
        assert_relative_eq!(ld.time_in(), 20.0, epsilon = 1.0e-9);
        assert!(!vertical_wcv_interval(140.0, 0.0, 0.0, 100.0, 300.0, 0.0).conflict());
    }

    #[test]
    fn test_violation_agrees_with_interval_at_zero() {
        let wcv = WellClearDetector::new(table());
        let si = Vect3::ZERO;
        let vi = Vect3::new(100.0, 0.0, 0.0);
        let cases = [
            (Vect3::new(3000.0, 0.0, 50.0), Vect3::new(-100.0, 0.0, 0.0)),
            (Vect3::new(9000.0, 0.0, 0.0), Vect3::new(-100.0, 0.0, 0.0)),
            (Vect3::new(1000.0, 200.0, 20.0), Vect3::new(150.0, 0.0, 0.0)),
            (Vect3::new(3000.0, 0.0, 400.0), Vect3::new(-100.0, 0.0, 0.0)),
        ];
        for (so, vo) in cases {
            let ld = wcv.wcv3d_interval(&so, &vo, &si, &vi, 0.0, 100.0);
            let at_zero = ld.conflict() && ld.time_in() == 0.0;
            assert_eq!(wcv.violation(&so, &vo, &si, &vi), at_zero, "so = {}", so);
        }
    }

    #[test]
    fn test_conflict_detection_critical_time() {
        let wcv = WellClearDetector::new(table());
        let so = Vect3::new(10000.0, 0.0, 0.0);
        let vo = Vect3::new(-100.0, 0.0, 0.0);
        let si = Vect3::ZERO;
        let vi = Vect3::new(100.0, 0.0, 0.0);
        let cd = wcv.conflict_detection(&so, &vo, &si, &vi, 0.0, 100.0);
        assert!(cd.conflict());
        assert_relative_eq!(cd.critical_time(), 0.5 * (cd.time_in() + cd.time_out()));
        assert_relative_eq!(cd.time_out(), 56.0, epsilon = 1.0e-9);

        let far = Vect3::new(10000.0, 0.0, 1000.0);
        let cd = wcv.conflict_detection(&far, &vo, &si, &vi, 0.0, 100.0);
        assert!(!cd.conflict());
        assert_relative_eq!(cd.critical_time(), 50.0, epsilon = 1.0e-9);
    }

    #[test]
    fn test_contains() {
        let small = WellClearDetector::new(table());
        let big = WellClearDetector::default();
        assert!(big.contains(&small));
        assert!(!small.contains(&big));
        assert!(big.to_string().starts_with("WCV_TAUMOD: {DTHR = 4000.0000 [ft]"));
    }
}
