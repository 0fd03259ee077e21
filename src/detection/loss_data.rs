use std::fmt;

use super::horizontal;
use crate::geometry::util::almost_equals;
use crate::geometry::Vect3;

/// 分離違反が継続する時間区間 `(time_in, time_out)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossData {
    time_in: f64,
    time_out: f64,
}

impl LossData {
    pub fn new(time_in: f64, time_out: f64) -> Self {
        Self { time_in, time_out }
    }

    /// 違反なし
    pub fn empty() -> Self {
        Self {
            time_in: f64::INFINITY,
            time_out: f64::NEG_INFINITY,
        }
    }

    /// 区間が空でなければ真（端点がほぼ等しい区間は空とみなす）
    pub fn conflict(&self) -> bool {
        self.time_in < self.time_out && !almost_equals(self.time_in, self.time_out)
    }

    /// 継続時間が `thr` 以上の違反
    pub fn conflict_longer_than(&self, thr: f64) -> bool {
        self.conflict() && self.time_out - self.time_in >= thr
    }

    /// 違反開始時刻（違反なしなら +∞）
    pub fn time_in(&self) -> f64 {
        if self.conflict() { self.time_in } else { f64::INFINITY }
    }

    /// 違反終了時刻（違反なしなら -∞）
    pub fn time_out(&self) -> f64 {
        if self.conflict() { self.time_out } else { f64::NEG_INFINITY }
    }

    pub fn raw_time_in(&self) -> f64 {
        self.time_in
    }

    pub fn raw_time_out(&self) -> f64 {
        self.time_out
    }
}

impl Default for LossData {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for LossData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[time_in: {:.3}, time_out: {:.3}]", self.time_in, self.time_out)
    }
}

/// 検知結果
///
/// 違反区間に加え、検知器ごとに定義される比較用の時刻 `time_crit` と
/// 正規化された深刻度 `dist_crit`（0: 一致, 1: 保護領域境界）を持ちます。
/// `time_crit` は最接近時刻とは限りません。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConflictData {
    loss: LossData,
    time_crit: f64,
    dist_crit: f64,
    s: Vect3,
    v: Vect3,
}

impl ConflictData {
    pub fn new(loss: LossData, time_crit: f64, dist_crit: f64, s: Vect3, v: Vect3) -> Self {
        Self { loss, time_crit, dist_crit, s, v }
    }

    pub fn loss_data(&self) -> &LossData {
        &self.loss
    }

    pub fn conflict(&self) -> bool {
        self.loss.conflict()
    }

    pub fn conflict_longer_than(&self, thr: f64) -> bool {
        self.loss.conflict_longer_than(thr)
    }

    pub fn time_in(&self) -> f64 {
        self.loss.time_in()
    }

    pub fn time_out(&self) -> f64 {
        self.loss.time_out()
    }

    pub fn critical_time(&self) -> f64 {
        self.time_crit
    }

    pub fn distance_at_critical_time(&self) -> f64 {
        self.dist_crit
    }

    /// 検知時の相対位置
    pub fn relative_position(&self) -> Vect3 {
        self.s
    }

    /// 検知時の相対速度
    pub fn relative_velocity(&self) -> Vect3 {
        self.v
    }

    /// 先読み時間 `t` 以内の水平ミス距離
    pub fn hmd(&self, t: f64) -> f64 {
        horizontal::hmd(&self.s.vect2(), &self.v.vect2(), t)
    }

    /// 先読み時間 `t` 以内の垂直ミス距離
    pub fn vmd(&self, t: f64) -> f64 {
        if self.s.z * self.v.z < 0.0 {
            let tca = (-self.s.z / self.v.z).min(t);
            (self.s.z + tca * self.v.z).abs()
        } else {
            self.s.z.abs()
        }
    }

    /// 水平接近率（正なら接近）
    pub fn horizontal_closure_rate(&self) -> f64 {
        let s2 = self.s.vect2();
        if s2.is_zero() {
            return self.v.vect2().norm();
        }
        -s2.dot(&self.v.vect2()) / s2.norm()
    }

    /// 垂直接近率（正なら接近）
    pub fn vertical_closure_rate(&self) -> f64 {
        if self.s.z == 0.0 {
            return self.v.z.abs();
        }
        -self.s.z.signum() * self.v.z
    }
}

impl fmt::Display for ConflictData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [time_crit: {:.3}, dist_crit: {:.4}, s: {}, v: {}]",
            self.loss, self.time_crit, self.dist_crit, self.s, self.v
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loss_data_conflict() {
        let ld = LossData::new(10.0, 20.0);
        assert!(ld.conflict());
        assert_eq!(ld.time_in(), 10.0);
        assert_eq!(ld.time_out(), 20.0);
        assert!(ld.conflict_longer_than(10.0));
        assert!(!ld.conflict_longer_than(10.5));
    }

    #[test]
    fn test_loss_data_empty_maps_to_infinity() {
        let ld = LossData::new(20.0, 10.0);
        assert!(!ld.conflict());
        assert_eq!(ld.time_in(), f64::INFINITY);
        assert_eq!(ld.time_out(), f64::NEG_INFINITY);
        assert_eq!(ld.raw_time_in(), 20.0);
        assert!(!LossData::empty().conflict());
        assert_eq!(LossData::default(), LossData::empty());
    }

    #[test]
    fn test_degenerate_interval_is_not_conflict() {
        let ld = LossData::new(5.0, 5.0 + 1.0e-15);
        assert!(!ld.conflict());
    }

    #[test]
    fn test_conflict_data_miss_distances() {
        let cd = ConflictData::new(
            LossData::new(0.0, 10.0),
            5.0,
            0.5,
            Vect3::new(-1000.0, 300.0, 100.0),
            Vect3::new(100.0, 0.0, -5.0),
        );
        assert_eq!(cd.hmd(100.0), 300.0);
        assert_eq!(cd.hmd(5.0), Vect3::new(-500.0, 300.0, 0.0).vect2().norm());
        assert_eq!(cd.vmd(100.0), 0.0);
        assert_eq!(cd.vmd(10.0), 50.0);
        assert_eq!(cd.horizontal_closure_rate(), 100.0 * 1000.0 / cd.relative_position().vect2().norm());
        assert_eq!(cd.vertical_closure_rate(), 5.0);
        assert_eq!(cd.critical_time(), 5.0);
        assert_eq!(cd.distance_at_critical_time(), 0.5);
    }
}
