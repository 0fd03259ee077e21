// 水平・垂直ソルバーと接線
pub mod horizontal;
pub mod tangent_line;
pub mod vertical;

// 検知結果
pub mod loss_data;

// 保護領域ごとの検知器
pub mod cd3d;
pub mod cylinder;
pub mod tcas2d;
pub mod tcas3d;
pub mod tcas_table;
pub mod wcv;

use std::fmt;

use crate::geometry::{Vect3, Velocity};

// 便利な re-export
pub use cylinder::CylinderDetector;
pub use horizontal::Horizontal;
pub use loss_data::{ConflictData, LossData};
pub use tangent_line::TangentLine;
pub use tcas3d::TcasDetector;
pub use tcas_table::TcasTable;
pub use vertical::Vertical;
pub use wcv::{WcvTable, WellClearDetector};

/// 境界への進入方向
pub const ENTRY: i32 = -1;
/// 境界からの離脱方向
pub const EXIT: i32 = 1;

/// 保護領域検知器の共通インターフェース
///
/// 引数はすべて絶対位置・絶対速度（内部単位）です。
/// 実装は呼び出し間で状態を持たず、同じ入力には同じ結果を返します。
pub trait Detection3D {
    /// 時刻 0 で保護領域の内側にあるか
    fn violation(&self, so: &Vect3, vo: &Velocity, si: &Vect3, vi: &Velocity) -> bool;

    /// 時間区間 `[b, t]` のどこかで違反が生じるか
    fn conflict(&self, so: &Vect3, vo: &Velocity, si: &Vect3, vi: &Velocity, b: f64, t: f64) -> bool {
        self.conflict_detection(so, vo, si, vi, b, t).conflict()
    }

    /// 違反区間と深刻度
    ///
    /// # 引数
    ///
    /// * `so`, `vo` - 自機の位置と速度
    /// * `si`, `vi` - 侵入機の位置と速度
    /// * `b`, `t` - 先読み区間（`0 <= b < t`）
    fn conflict_detection(
        &self,
        so: &Vect3,
        vo: &Velocity,
        si: &Vect3,
        vi: &Velocity,
        b: f64,
        t: f64,
    ) -> ConflictData;

    fn identifier(&self) -> &str;

    fn set_identifier(&mut self, id: &str);

    fn simple_class_name(&self) -> &'static str;

    /// この保護領域の閾値が `other` 以上であれば真
    fn contains(&self, other: &Self) -> bool
    where
        Self: Sized;
}

/// 検知器の値型ラッパー
#[derive(Debug, Clone, PartialEq)]
pub enum Detector {
    Cylinder(CylinderDetector),
    Tcas(TcasDetector),
    WellClear(WellClearDetector),
}

impl Detector {
    fn inner(&self) -> &dyn Detection3D {
        match self {
            Detector::Cylinder(d) => d,
            Detector::Tcas(d) => d,
            Detector::WellClear(d) => d,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Detection3D {
        match self {
            Detector::Cylinder(d) => d,
            Detector::Tcas(d) => d,
            Detector::WellClear(d) => d,
        }
    }
}

impl Detection3D for Detector {
    fn violation(&self, so: &Vect3, vo: &Velocity, si: &Vect3, vi: &Velocity) -> bool {
        self.inner().violation(so, vo, si, vi)
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
        self.inner().conflict_detection(so, vo, si, vi, b, t)
    }

    fn identifier(&self) -> &str {
        self.inner().identifier()
    }

    fn set_identifier(&mut self, id: &str) {
        self.inner_mut().set_identifier(id);
    }

    fn simple_class_name(&self) -> &'static str {
        self.inner().simple_class_name()
    }

    /// 種類が異なる検知器同士は包含関係を持ちません
    fn contains(&self, other: &Self) -> bool {
        match (self, other) {
            (Detector::Cylinder(a), Detector::Cylinder(b)) => a.contains(b),
            (Detector::Tcas(a), Detector::Tcas(b)) => a.contains(b),
            (Detector::WellClear(a), Detector::WellClear(b)) => a.contains(b),
            _ => false,
        }
    }
}

impl From<CylinderDetector> for Detector {
    fn from(d: CylinderDetector) -> Self {
        Detector::Cylinder(d)
    }
}

impl From<TcasDetector> for Detector {
    fn from(d: TcasDetector) -> Self {
        Detector::Tcas(d)
    }
}

impl From<WellClearDetector> for Detector {
    fn from(d: WellClearDetector) -> Self {
        Detector::WellClear(d)
    }
}

impl fmt::Display for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Detector::Cylinder(d) => d.fmt(f),
            Detector::Tcas(d) => d.fmt(f),
            Detector::WellClear(d) => d.fmt(f),
        }
    }
}

/// `"id = "` 接頭辞（識別子が空なら空文字）
pub(crate) fn id_prefix(id: &str) -> String {
    if id.is_empty() { String::new() } else { format!("{} = ", id) }
}
