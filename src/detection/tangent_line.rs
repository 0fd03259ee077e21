use crate::geometry::Vect2;
use crate::geometry::util::{almost_equals, sq};

/// 保護円への接線方向
///
/// 相対位置 `s` から半径 `D` の円に引いた接線のうち、符号 `eps` で選ばれた側の方向ベクトルです。
/// 水平ソルバーはこの方向を基準軸 `nv` として解を求めます。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TangentLine {
    dir: Vect2,
    eps: i32,
}

impl TangentLine {
    /// # 引数
    ///
    /// * `s` - 相対位置
    /// * `d` - 保護円の半径
    /// * `eps` - 接線の側（±1）
    pub fn new(s: &Vect2, d: f64, eps: i32) -> Self {
        let dir = if almost_equals(s.sqv(), sq(d)) {
            // 境界上では s の垂線
            s.perp_r().scal(eps as f64)
        } else {
            tangent_point(s, d, eps) - *s
        };
        Self { dir, eps }
    }

    pub fn vect(&self) -> Vect2 {
        self.dir
    }

    pub fn eps(&self) -> i32 {
        self.eps
    }

    /// `v` が接線の選択された側にあるか
    pub fn horizontal_criterion(&self, v: &Vect2) -> bool {
        self.eps as f64 * self.dir.det(v) >= 0.0
    }
}

/// 円上の接点（円の内側ではゼロベクトル）
fn tangent_point(s: &Vect2, d: f64, eps: i32) -> Vect2 {
    let sq_s = s.sqv();
    let sq_d = sq(d);
    let delta = sq_s - sq_d;
    if delta < 0.0 {
        return Vect2::ZERO;
    }
    let alpha = sq_d / sq_s;
    let beta = d * delta.sqrt() / sq_s;
    let e = eps as f64;
    Vect2::new(alpha * s.x + e * beta * s.y, alpha * s.y - e * beta * s.x)
}
