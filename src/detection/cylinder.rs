use std::fmt;

use super::cd3d;
use super::loss_data::ConflictData;
use super::{id_prefix, Detection3D};
use crate::geometry::units::{from_unit, to_unit};
use crate::geometry::{Unit, Vect3, Velocity};

/// 円柱保護領域の検知器
#[derive(Debug, Clone, PartialEq)]
pub struct CylinderDetector {
    d: f64,
    h: f64,
    id: String,
}

impl CylinderDetector {
    /// # 引数
    ///
    /// * `d` - 水平分離距離 [m]
    /// * `h` - 垂直分離距離 [m]
    pub fn new(d: f64, h: f64) -> Self {
        Self {
            d: d.abs(),
            h: h.abs(),
            id: String::new(),
        }
    }

    /// 単位を指定して生成
    pub fn with_units(d: f64, dunit: Unit, h: f64, hunit: Unit) -> Self {
        Self::new(from_unit(dunit, d), from_unit(hunit, h))
    }

    pub fn horizontal_separation(&self) -> f64 {
        self.d
    }

    pub fn horizontal_separation_in(&self, unit: Unit) -> f64 {
        to_unit(unit, self.d)
    }

    pub fn vertical_separation(&self) -> f64 {
        self.h
    }

    pub fn vertical_separation_in(&self, unit: Unit) -> f64 {
        to_unit(unit, self.h)
    }

    pub fn set_horizontal_separation(&mut self, d: f64) {
        self.d = d.abs();
    }

    pub fn set_horizontal_separation_in(&mut self, d: f64, unit: Unit) {
        self.set_horizontal_separation(from_unit(unit, d));
    }

    pub fn set_vertical_separation(&mut self, h: f64) {
        self.h = h.abs();
    }

    pub fn set_vertical_separation_in(&mut self, h: f64, unit: Unit) {
        self.set_vertical_separation(from_unit(unit, h));
    }
}

impl Default for CylinderDetector {
    /// 5 nmi / 1000 ft
    fn default() -> Self {
        Self::with_units(5.0, Unit::NauticalMile, 1000.0, Unit::Foot)
    }
}

impl Detection3D for CylinderDetector {
    fn violation(&self, so: &Vect3, _vo: &Velocity, si: &Vect3, _vi: &Velocity) -> bool {
        cd3d::los(&(*so - *si), self.d, self.h)
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
        let loss = cd3d::detection(&s, vo, vi, self.d, self.h, b, t);
        let t_crit = cd3d::tccpa(&s, vo, vi, self.d, self.h, b, t);
        let d_crit = s.linear(&v, t_crit).cyl_norm(self.d, self.h);
        ConflictData::new(loss, t_crit, d_crit, s, v)
    }

    fn identifier(&self) -> &str {
        &self.id
    }

    fn set_identifier(&mut self, id: &str) {
        self.id = id.to_string();
    }

    fn simple_class_name(&self) -> &'static str {
        "CDCylinder"
    }

    fn contains(&self, other: &Self) -> bool {
        self.d >= other.d && self.h >= other.h
    }
}

impl fmt::Display for CylinderDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}: {{D = {:.4} [nmi], H = {:.4} [ft]}}",
            id_prefix(&self.id),
            self.simple_class_name(),
            self.horizontal_separation_in(Unit::NauticalMile),
            self.vertical_separation_in(Unit::Foot)
        )
    }
}
