//! # TCAS II 検知器
//!
//! 自機高度から感度レベルを決め、そのレベルの閾値で水平 RA と垂直 RA を判定します。
//! 先読み区間内で感度レベルの境界を跨ぐ場合は、レベルごとに区間を求めて合併します。

use std::fmt;

use super::horizontal::{delta, theta_d};
use super::loss_data::{ConflictData, LossData};
use super::tcas2d;
use super::tcas_table::TcasTable;
use super::vertical::{theta_h, time_coalt};
use super::{id_prefix, Detection3D, ENTRY, EXIT};
use crate::geometry::util::{almost_equals, almost_less, sq};
use crate::geometry::{Vect2, Vect3, Velocity};

/// 時刻 0 での垂直 RA 判定
pub fn vertical_ra(sz: f64, vz: f64, zthr: f64, tcoa: f64) -> bool {
    if sz.abs() <= zthr {
        return true;
    }
    if almost_equals(vz, 0.0) {
        return false;
    }
    let t = time_coalt(sz, vz);
    0.0 <= t && t <= tcoa
}

/// 時刻 `t` 以降に HMD 円の内側にいるか
pub fn cd2d_tcas_after(hmd: f64, s: &Vect2, vo: &Vect2, vi: &Vect2, t: f64) -> bool {
    let v = *vo - *vi;
    (vo.almost_equals(vi) && s.sqv() <= sq(hmd))
        || (v.sqv() > 0.0 && delta(s, &v, hmd) >= 0.0 && theta_d(s, &v, EXIT, hmd) >= t)
}

pub fn cd2d_tcas(hmd: f64, s: &Vect2, vo: &Vect2, vi: &Vect2) -> bool {
    cd2d_tcas_after(hmd, s, vo, vi, 0.0)
}

/// 1つの感度レベルで求めた区間
struct LevelInterval {
    time_in: f64,
    time_out: f64,
    time_min_tau: f64,
}

/// TCAS II 検知器（RA 表または TA 表）
#[derive(Debug, Clone, PartialEq)]
pub struct TcasDetector {
    table: TcasTable,
    id: String,
}

impl TcasDetector {
    pub fn new(table: TcasTable) -> Self {
        Self {
            table,
            id: String::new(),
        }
    }

    /// 標準 RA 表の検知器
    pub fn tcasii_ra() -> Self {
        Self::new(TcasTable::tcasii(true))
    }

    /// 標準 TA 表の検知器
    pub fn tcasii_ta() -> Self {
        Self::new(TcasTable::tcasii(false))
    }

    pub fn table(&self) -> &TcasTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut TcasTable {
        &mut self.table
    }

    pub fn set_table(&mut self, table: TcasTable) {
        self.table = table;
    }

    pub fn set_default_tcasii_thresholds(&mut self, ra: bool) {
        self.table.set_default_tcasii_thresholds(ra);
    }

    /// 時刻 0 で RA 状態か
    pub fn tcasii_ra_state(&self, so: &Vect3, vo: &Velocity, si: &Vect3, vi: &Velocity) -> bool {
        let s2 = so.vect2() - si.vect2();
        let vo2 = vo.vect2();
        let vi2 = vi.vect2();
        let v2 = vo2 - vi2;
        let sl = self.table.sensitivity_level(so.z);
        let hmd = self.table.hmd(sl);

        (!self.table.hmd_filter() || cd2d_tcas(hmd, &s2, &vo2, &vi2))
            && tcas2d::horizontal_ra(self.table.dmod(sl), self.table.tau(sl), &s2, &v2)
            && vertical_ra(so.z - si.z, vo.z - vi.z, self.table.zthr(sl), self.table.tcoa(sl))
    }

    /// 感度レベル `sl` の閾値で区間 `[b, t]` の RA 区間を求める
    #[allow(clippy::too_many_arguments)]
    fn ra3d_interval(&self, sl: i32, so: &Vect3, vo: &Vect3, si: &Vect3, vi: &Vect3, b: f64, t: f64) -> LevelInterval {
        let s2 = so.vect2() - si.vect2();
        let vo2 = vo.vect2();
        let vi2 = vi.vect2();
        let v2 = vo2 - vi2;
        let sz = so.z - si.z;
        let vz = vo.z - vi.z;
        let use_hmdf = self.table.hmd_filter();
        let tau = self.table.tau(sl);
        let tcoa = self.table.tcoa(sl);
        let dmod = self.table.dmod(sl);
        let hmd = self.table.hmd(sl);
        let zthr = self.table.zthr(sl);

        let no_ra = LevelInterval {
            time_in: t,
            time_out: b,
            time_min_tau: tcas2d::time_of_min_tau(dmod, b, t, &s2, &v2),
        };

        if use_hmdf && !cd2d_tcas_after(hmd, &s2, &vo2, &vi2, b) {
            return no_ra;
        }
        let vertical_match = almost_equals(vo.z, vi.z);
        if vertical_match && sz.abs() > zthr {
            return no_ra;
        }

        let (tentry, texit) = if vertical_match {
            (b, t)
        } else {
            let act_h = zthr.max(vz.abs() * tcoa);
            (theta_h(sz, vz, ENTRY, act_h), theta_h(sz, vz, EXIT, zthr))
        };
        if texit < b || t < tentry {
            return no_ra;
        }

        let ventry = v2.scal_add(tentry, &s2);
        let exit_at_centry = ventry.dot(&v2) >= 0.0;
        let los_at_centry = ventry.sqv() <= sq(hmd);
        let tin = b.max(tentry);
        let tout = t.min(texit);
        let ra2d = tcas2d::ra2d_interval(dmod, tau, tin, tout, &s2, &vo2, &vi2);
        let ra_in = ra2d.raw_time_in();
        let ra_out = ra2d.raw_time_out();
        let ra_in_lookahead = tin.max(tout.min(ra_in));
        let ra_out_lookahead = tin.max(tout.min(ra_out));

        let filtered = use_hmdf && hmd < dmod;
        if ra_in > ra_out || ra_out < tin || ra_in > tout || (filtered && exit_at_centry && !los_at_centry) {
            return no_ra;
        }

        if filtered {
            let exit_theta = if v2.sqv() > 0.0 {
                b.max(theta_d(&s2, &v2, EXIT, hmd).min(t))
            } else {
                t
            };
            let min_ra_out = ra_out_lookahead.min(exit_theta);
            let time_min_tau = if ra_in_lookahead <= min_ra_out {
                tcas2d::time_of_min_tau(dmod, ra_in_lookahead, min_ra_out, &s2, &v2)
            } else {
                no_ra.time_min_tau
            };
            return LevelInterval {
                time_in: ra_in_lookahead,
                time_out: min_ra_out,
                time_min_tau,
            };
        }

        LevelInterval {
            time_in: ra_in_lookahead,
            time_out: ra_out_lookahead,
            time_min_tau: tcas2d::time_of_min_tau(dmod, ra_in_lookahead, ra_out_lookahead, &s2, &v2),
        }
    }

    /// 区間 `[b, t]` の RA 区間（感度レベルの境界を跨ぐ場合はレベルごとに合併）
    pub fn ra3d(&self, so: &Vect3, vo: &Velocity, si: &Vect3, vi: &Velocity, b: f64, t: f64) -> ConflictData {
        let s = *so - *si;
        let v = *vo - *vi;
        let max_sl = self.table.max_sensitivity_level();
        let dmod_max = self.table.dmod(max_sl);
        let zthr_max = self.table.zthr(max_sl);

        let sl_first = self.table.sensitivity_level(so.z + b * vo.z);
        let sl_last = self.table.sensitivity_level(so.z + t * vo.z);

        let (time_in, time_out, time_min) = if sl_first == sl_last || almost_equals(vo.z, 0.0) {
            let ii = self.ra3d_interval(sl_first, so, vo, si, vi, b, t);
            (ii.time_in, ii.time_out, ii.time_min_tau)
        } else {
            self.ra3d_by_level(sl_first, sl_last, so, vo, si, vi, b, t)
        };

        let time_crit = if time_min.is_finite() { time_min } else { b };
        let dist_crit = s.linear(&v, time_crit).cyl_norm(dmod_max, zthr_max);
        ConflictData::new(LossData::new(time_in, time_out), time_crit, dist_crit, s, v)
    }

    /// レベル境界ごとに区間を分割して合併
    #[allow(clippy::too_many_arguments)]
    fn ra3d_by_level(
        &self,
        sl_first: i32,
        sl_last: i32,
        so: &Vect3,
        vo: &Vect3,
        si: &Vect3,
        vi: &Vect3,
        b: f64,
        t: f64,
    ) -> (f64, f64, f64) {
        let climbing = sl_first < sl_last;
        let mut tin = f64::INFINITY;
        let mut tout = f64::NEG_INFINITY;
        let mut tmin = f64::INFINITY;
        let mut t_b = b;

        let steps = (sl_last - sl_first).unsigned_abs() + 1;
        for k in 0..steps as i32 {
            let sl = if climbing { sl_first + k } else { sl_first - k };
            if t_b >= t || !self.table.is_valid_sensitivity_level(sl) {
                break;
            }
            let level = if climbing {
                self.table.level_altitude_upper_bound(sl)
            } else {
                self.table.level_altitude_lower_bound(sl)
            };
            let t_level = if level.is_finite() {
                (level - so.z) / vo.z
            } else {
                f64::INFINITY
            };
            let ii = self.ra3d_interval(sl, so, vo, si, vi, t_b, t_level.min(t));
            if almost_less(ii.time_in, ii.time_out) {
                tin = tin.min(ii.time_in);
                tout = tout.max(ii.time_out);
            }
            tmin = tmin.min(ii.time_min_tau);
            t_b = t_level;
        }
        (tin, tout, tmin)
    }
}

impl Default for TcasDetector {
    fn default() -> Self {
        Self::tcasii_ra()
    }
}

impl Detection3D for TcasDetector {
    fn violation(&self, so: &Vect3, vo: &Velocity, si: &Vect3, vi: &Velocity) -> bool {
        self.tcasii_ra_state(so, vo, si, vi)
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
        self.ra3d(so, vo, si, vi, b, t)
    }

    fn identifier(&self) -> &str {
        &self.id
    }

    fn set_identifier(&mut self, id: &str) {
        self.id = id.to_string();
    }

    fn simple_class_name(&self) -> &'static str {
        "TCAS3D"
    }

    fn contains(&self, other: &Self) -> bool {
        self.table.contains(&other.table)
    }
}

impl fmt::Display for TcasDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}: {{{}}}", id_prefix(&self.id), self.simple_class_name(), self.table)
    }
}
