use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use super::util::{almost_equals, atan2_safe, sq};

/// 2次元ベクトル（x: 東, y: 北）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vect2 {
    pub x: f64,
    pub y: f64,
}

impl Vect2 {
    pub const ZERO: Vect2 = Vect2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// 成分ごとの近似等価
    pub fn almost_equals(&self, other: &Vect2) -> bool {
        almost_equals(self.x, other.x) && almost_equals(self.y, other.y)
    }

    /// 二乗ノルム
    pub fn sqv(&self) -> f64 {
        sq(self.x) + sq(self.y)
    }

    pub fn norm(&self) -> f64 {
        self.sqv().sqrt()
    }

    pub fn dot(&self, other: &Vect2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// 2次元外積（行列式）
    pub fn det(&self, other: &Vect2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn scal(&self, k: f64) -> Vect2 {
        Vect2::new(k * self.x, k * self.y)
    }

    /// `k·self + w`
    pub fn scal_add(&self, k: f64, w: &Vect2) -> Vect2 {
        Vect2::new(k * self.x + w.x, k * self.y + w.y)
    }

    /// `self + k·w`
    pub fn add_scal(&self, k: f64, w: &Vect2) -> Vect2 {
        Vect2::new(self.x + k * w.x, self.y + k * w.y)
    }

    /// 単位ベクトル（ゼロベクトルはそのまま）
    pub fn hat(&self) -> Vect2 {
        let n = self.norm();
        if n == 0.0 { *self } else { self.scal(1.0 / n) }
    }

    /// 時計回りに90度回転
    pub fn perp_r(&self) -> Vect2 {
        Vect2::new(self.y, -self.x)
    }

    /// 反時計回りに90度回転
    pub fn perp_l(&self) -> Vect2 {
        Vect2::new(-self.y, self.x)
    }

    /// 真北から時計回りの方位角 [rad]
    pub fn trk(&self) -> f64 {
        atan2_safe(self.x, self.y)
    }

    /// `vo` からの偏差が `v` 以下か
    pub fn leq(&self, v: &Vect2, vo: &Vect2) -> bool {
        (*self - *vo).sqv() <= (*v - *vo).sqv()
    }
}

impl Add for Vect2 {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Vect2::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vect2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Vect2::new(self.x - other.x, self.y - other.y)
    }
}

impl Neg for Vect2 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Vect2::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Vect2 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        self.scal(scalar)
    }
}

impl fmt::Display for Vect2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.x, self.y)
    }
}

/// 3次元ベクトル（x: 東, y: 北, z: 上）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vect3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// 速度ベクトル [m/s]
pub type Velocity = Vect3;

impl Vect3 {
    pub const ZERO: Vect3 = Vect3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn from_vect2(v: Vect2, z: f64) -> Self {
        Self { x: v.x, y: v.y, z }
    }

    /// 方位角・対地速度・昇降率から速度ベクトルを生成
    ///
    /// # 引数
    ///
    /// * `trk` - 真北から時計回りの方位角 [rad]
    /// * `gs` - 対地速度 [m/s]
    /// * `vs` - 昇降率 [m/s]
    pub fn from_trk_gs_vs(trk: f64, gs: f64, vs: f64) -> Self {
        Self::new(gs * trk.sin(), gs * trk.cos(), vs)
    }

    pub fn vect2(&self) -> Vect2 {
        Vect2::new(self.x, self.y)
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    pub fn almost_equals(&self, other: &Vect3) -> bool {
        almost_equals(self.x, other.x) && almost_equals(self.y, other.y) && almost_equals(self.z, other.z)
    }

    pub fn sqv(&self) -> f64 {
        sq(self.x) + sq(self.y) + sq(self.z)
    }

    pub fn norm(&self) -> f64 {
        self.sqv().sqrt()
    }

    pub fn dot(&self, other: &Vect3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn scal(&self, k: f64) -> Vect3 {
        Vect3::new(k * self.x, k * self.y, k * self.z)
    }

    /// `k·self + w`
    pub fn scal_add(&self, k: f64, w: &Vect3) -> Vect3 {
        Vect3::new(k * self.x + w.x, k * self.y + w.y, k * self.z + w.z)
    }

    /// `self + k·w`
    pub fn add_scal(&self, k: f64, w: &Vect3) -> Vect3 {
        Vect3::new(self.x + k * w.x, self.y + k * w.y, self.z + k * w.z)
    }

    /// 速度 `v` で時間 `t` だけ進めた位置
    pub fn linear(&self, v: &Vect3, t: f64) -> Vect3 {
        self.add_scal(t, v)
    }

    pub fn hat(&self) -> Vect3 {
        let n = self.norm();
        if n == 0.0 { *self } else { self.scal(1.0 / n) }
    }

    /// 円柱ノルム `max(|v_xy|²/d², (z/h)²)`
    ///
    /// 半径 `d`、半高 `h` の円柱境界上で 1 になります。
    pub fn cyl_norm(&self, d: f64, h: f64) -> f64 {
        (self.vect2().sqv() / sq(d)).max(sq(self.z / h))
    }

    /// 方位角 [rad]
    pub fn trk(&self) -> f64 {
        self.vect2().trk()
    }

    /// 対地速度 [m/s]
    pub fn gs(&self) -> f64 {
        self.vect2().norm()
    }

    /// 昇降率 [m/s]
    pub fn vs(&self) -> f64 {
        self.z
    }
}

impl Add for Vect3 {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Vect3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vect3 {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Vect3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Neg for Vect3 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Vect3::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for Vect3 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        self.scal(scalar)
    }
}

impl fmt::Display for Vect3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4}, {:.4})", self.x, self.y, self.z)
    }
}
