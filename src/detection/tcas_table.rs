//! # TCAS 感度レベル表
//!
//! 高度帯（感度レベル）ごとに `TAU`, `TCOA`, `DMOD`, `ZTHR`, `HMD` を保持します。
//! レベルは 1 始まりで、最上位レベルは上限なしです。
//! 無効なレベルに対する取得は -1 を返します。

use std::fmt;

use crate::geometry::units::{from_unit, to_unit};
use crate::geometry::util::almost_equals;
use crate::geometry::Unit;

/// 標準レベルの上限高度 [ft]（レベル 1〜7）
const DEFAULT_LEVELS_FT: [f64; 7] = [0.0, 1000.0, 2350.0, 5000.0, 10000.0, 20000.0, 42000.0];

const RA_TAU: [f64; 8] = [0.0, 0.0, 15.0, 20.0, 25.0, 30.0, 35.0, 35.0];
const TA_TAU: [f64; 8] = [0.0, 20.0, 25.0, 30.0, 40.0, 45.0, 48.0, 48.0];

/// [nmi]
const RA_DMOD_NMI: [f64; 8] = [0.0, 0.0, 0.2, 0.35, 0.55, 0.8, 1.1, 1.1];
const TA_DMOD_NMI: [f64; 8] = [0.0, 0.30, 0.33, 0.48, 0.75, 1.0, 1.3, 1.3];

/// [ft]
const RA_ZTHR_FT: [f64; 8] = [0.0, 0.0, 600.0, 600.0, 600.0, 600.0, 700.0, 800.0];
const TA_ZTHR_FT: [f64; 8] = [0.0, 850.0, 850.0, 850.0, 850.0, 850.0, 850.0, 1200.0];

/// [ft]
const RA_HMD_FT: [f64; 8] = [0.0, 0.0, 1215.0, 2126.0, 3342.0, 4861.0, 6683.0, 6683.0];

/// 無効なレベルを表す値
const INVALID: f64 = -1.0;

/// 感度レベルごとの閾値表
#[derive(Debug, Clone, PartialEq)]
pub struct TcasTable {
    /// 各レベルの上限高度 [m]（最上位レベルを除く）
    levels: Vec<f64>,
    tau: Vec<f64>,
    tcoa: Vec<f64>,
    dmod: Vec<f64>,
    zthr: Vec<f64>,
    hmd: Vec<f64>,
    hmd_filter: bool,
}

impl TcasTable {
    /// 上限なしの1レベルだけを持つ空の表（閾値はすべて 0）
    pub fn empty() -> Self {
        let mut table = Self {
            levels: Vec::new(),
            tau: Vec::new(),
            tcoa: Vec::new(),
            dmod: Vec::new(),
            zthr: Vec::new(),
            hmd: Vec::new(),
            hmd_filter: false,
        };
        table.add_zeros();
        table
    }

    /// 標準 TCAS II 表（`ra` が真なら RA 表、偽なら TA 表）
    pub fn tcasii(ra: bool) -> Self {
        let mut table = Self::empty();
        table.set_default_tcasii_thresholds(ra);
        table
    }

    fn add_zeros(&mut self) {
        self.tau.push(0.0);
        self.tcoa.push(0.0);
        self.dmod.push(0.0);
        self.zthr.push(0.0);
        self.hmd.push(0.0);
    }

    /// すべてのレベルを削除して空の表に戻す
    pub fn clear(&mut self) {
        self.levels.clear();
        self.tau.clear();
        self.tcoa.clear();
        self.dmod.clear();
        self.zthr.clear();
        self.hmd.clear();
        self.add_zeros();
    }

    /// 標準 TCAS II の閾値を設定
    pub fn set_default_tcasii_thresholds(&mut self, ra: bool) {
        self.clear();
        for alt in DEFAULT_LEVELS_FT {
            self.add_sensitivity_level_in(alt, Unit::Foot);
        }
        self.hmd_filter = ra;
        for i in 0..8 {
            let (tau, dmod, zthr) = if ra {
                (RA_TAU[i], RA_DMOD_NMI[i], RA_ZTHR_FT[i])
            } else {
                (TA_TAU[i], TA_DMOD_NMI[i], TA_ZTHR_FT[i])
            };
            self.tau[i] = tau;
            self.tcoa[i] = tau;
            self.dmod[i] = from_unit(Unit::NauticalMile, dmod);
            self.zthr[i] = from_unit(Unit::Foot, zthr);
            // TA 表の HMD は DMOD と同じ
            self.hmd[i] = if ra { from_unit(Unit::Foot, RA_HMD_FT[i]) } else { self.dmod[i] };
        }
    }

    /// 高度 `alt` [m] に対応する感度レベル（1 始まり）
    pub fn sensitivity_level(&self, alt: f64) -> i32 {
        self.levels
            .iter()
            .position(|&upper| alt <= upper)
            .map_or(self.max_sensitivity_level(), |i| i as i32 + 1)
    }

    pub fn sensitivity_level_in(&self, alt: f64, unit: Unit) -> i32 {
        self.sensitivity_level(from_unit(unit, alt))
    }

    pub fn is_valid_sensitivity_level(&self, sl: i32) -> bool {
        1 <= sl && sl <= self.max_sensitivity_level()
    }

    pub fn max_sensitivity_level(&self) -> i32 {
        self.levels.len() as i32 + 1
    }

    /// レベル `sl` の下限高度（開区間）
    ///
    /// 上限高度が 0 のレベルは飛ばして、直下の非ゼロ上限を返します。
    pub fn level_altitude_lower_bound(&self, sl: i32) -> f64 {
        if !self.is_valid_sensitivity_level(sl) {
            return INVALID;
        }
        self.levels[..(sl - 1) as usize]
            .iter()
            .rev()
            .find(|&&upper| upper != 0.0)
            .copied()
            .unwrap_or(0.0)
    }

    /// レベル `sl` の上限高度（閉区間、最上位レベルは +∞）
    pub fn level_altitude_upper_bound(&self, sl: i32) -> f64 {
        if !self.is_valid_sensitivity_level(sl) {
            return INVALID;
        }
        if sl == self.max_sensitivity_level() {
            f64::INFINITY
        } else {
            self.levels[(sl - 1) as usize]
        }
    }

    pub fn level_altitude_lower_bound_in(&self, sl: i32, unit: Unit) -> f64 {
        to_unit(unit, self.level_altitude_lower_bound(sl))
    }

    pub fn level_altitude_upper_bound_in(&self, sl: i32, unit: Unit) -> f64 {
        to_unit(unit, self.level_altitude_upper_bound(sl))
    }

    fn get(&self, values: &[f64], sl: i32) -> f64 {
        if self.is_valid_sensitivity_level(sl) {
            values[(sl - 1) as usize]
        } else {
            INVALID
        }
    }

    /// TAU 閾値 [s]
    pub fn tau(&self, sl: i32) -> f64 {
        self.get(&self.tau, sl)
    }

    /// TCOA 閾値 [s]
    pub fn tcoa(&self, sl: i32) -> f64 {
        self.get(&self.tcoa, sl)
    }

    pub fn dmod(&self, sl: i32) -> f64 {
        self.get(&self.dmod, sl)
    }

    pub fn dmod_in(&self, sl: i32, unit: Unit) -> f64 {
        to_unit(unit, self.dmod(sl))
    }

    pub fn zthr(&self, sl: i32) -> f64 {
        self.get(&self.zthr, sl)
    }

    pub fn zthr_in(&self, sl: i32, unit: Unit) -> f64 {
        to_unit(unit, self.zthr(sl))
    }

    pub fn hmd(&self, sl: i32) -> f64 {
        self.get(&self.hmd, sl)
    }

    pub fn hmd_in(&self, sl: i32, unit: Unit) -> f64 {
        to_unit(unit, self.hmd(sl))
    }

    /// 値を 0 以上に切り詰めて設定し、レベルが有効なら真を返す
    fn set(sl: i32, max_sl: i32, values: &mut [f64], val: f64) -> bool {
        if 1 <= sl && sl <= max_sl {
            values[(sl - 1) as usize] = val.max(0.0);
            true
        } else {
            false
        }
    }

    pub fn set_tau(&mut self, sl: i32, val: f64) -> bool {
        let max_sl = self.max_sensitivity_level();
        Self::set(sl, max_sl, &mut self.tau, val)
    }

    pub fn set_tcoa(&mut self, sl: i32, val: f64) -> bool {
        let max_sl = self.max_sensitivity_level();
        Self::set(sl, max_sl, &mut self.tcoa, val)
    }

    pub fn set_dmod(&mut self, sl: i32, val: f64) -> bool {
        let max_sl = self.max_sensitivity_level();
        Self::set(sl, max_sl, &mut self.dmod, val)
    }

    pub fn set_dmod_in(&mut self, sl: i32, val: f64, unit: Unit) -> bool {
        self.set_dmod(sl, from_unit(unit, val))
    }

    pub fn set_zthr(&mut self, sl: i32, val: f64) -> bool {
        let max_sl = self.max_sensitivity_level();
        Self::set(sl, max_sl, &mut self.zthr, val)
    }

    pub fn set_zthr_in(&mut self, sl: i32, val: f64, unit: Unit) -> bool {
        self.set_zthr(sl, from_unit(unit, val))
    }

    pub fn set_hmd(&mut self, sl: i32, val: f64) -> bool {
        let max_sl = self.max_sensitivity_level();
        Self::set(sl, max_sl, &mut self.hmd, val)
    }

    pub fn set_hmd_in(&mut self, sl: i32, val: f64, unit: Unit) -> bool {
        self.set_hmd(sl, from_unit(unit, val))
    }

    pub fn hmd_filter(&self) -> bool {
        self.hmd_filter
    }

    pub fn set_hmd_filter(&mut self, flag: bool) {
        self.hmd_filter = flag;
    }

    /// 上限高度 `alt` [m] のレベルを追加
    ///
    /// 既存の最上位上限より高い場合のみ追加し、新しい最大レベルを返します。追加できなければ 0。
    pub fn add_sensitivity_level(&mut self, alt: f64) -> i32 {
        if self.levels.last().is_none_or(|&last| alt > last) {
            self.levels.push(alt);
            self.add_zeros();
            self.max_sensitivity_level()
        } else {
            0
        }
    }

    pub fn add_sensitivity_level_in(&mut self, alt: f64, unit: Unit) -> i32 {
        self.add_sensitivity_level(from_unit(unit, alt))
    }

    fn matches_standard(&self, ra: bool) -> bool {
        self.levels.len() == DEFAULT_LEVELS_FT.len() && self.hmd_filter == ra && *self == Self::tcasii(ra)
    }

    /// 標準 RA 表と一致するか
    pub fn is_ra_standard(&self) -> bool {
        self.matches_standard(true)
    }

    /// 標準 TA 表と一致するか
    pub fn is_ta_standard(&self) -> bool {
        self.matches_standard(false)
    }

    /// レベル構成が同じで、すべての閾値が `other` 以上なら真
    pub fn contains(&self, other: &TcasTable) -> bool {
        if self.levels.len() != other.levels.len() || self.hmd_filter != other.hmd_filter {
            return false;
        }
        let same_levels = self
            .levels
            .iter()
            .zip(&other.levels)
            .all(|(a, b)| almost_equals(*a, *b));
        same_levels
            && (0..self.tau.len()).all(|i| {
                self.tau[i] >= other.tau[i]
                    && self.tcoa[i] >= other.tcoa[i]
                    && self.dmod[i] >= other.dmod[i]
                    && self.zthr[i] >= other.zthr[i]
                    && self.hmd[i] >= other.hmd[i]
            })
    }
}

impl Default for TcasTable {
    /// 標準 RA 表
    fn default() -> Self {
        Self::tcasii(true)
    }
}

fn list_in(unit: Unit, values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{:.4} [{}]", to_unit(unit, *v), unit))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for TcasTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HMDFilter: {}", self.hmd_filter)?;
        if self.is_ra_standard() {
            write!(f, "; (RA vals) ")?;
        } else if self.is_ta_standard() {
            write!(f, "; (TA vals) ")?;
        }
        write!(
            f,
            "; levels: {}; TAU: {}; TCOA: {}; DMOD: {}; ZTHR: {}; HMD: {}",
            list_in(Unit::Foot, &self.levels),
            list_in(Unit::Second, &self.tau),
            list_in(Unit::Second, &self.tcoa),
            list_in(Unit::NauticalMile, &self.dmod),
            list_in(Unit::Foot, &self.zthr),
            list_in(Unit::Foot, &self.hmd)
        )
    }
}
