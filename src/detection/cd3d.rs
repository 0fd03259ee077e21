//! # 円柱保護領域の幾何
//!
//! 半径 `D`、半高 `H` の円柱に対する違反判定と違反区間を閉形式で求めます。
//! 引数はすべて相対位置 `s = so - si` と各機の速度です。

use super::horizontal::{almost_horizontal_los, delta, tcpa, theta_d};
use super::loss_data::LossData;
use super::vertical::{almost_vertical_los, theta_h};
use super::{ENTRY, EXIT};
use crate::geometry::util::{almost_equals, root2b, sq};
use crate::geometry::Vect3;

/// 境界を除いた円柱内部か
pub fn los(s: &Vect3, d: f64, h: f64) -> bool {
    almost_horizontal_los(&s.vect2(), d) && almost_vertical_los(s.z, h)
}

/// 先読み区間 `[0, ∞)` での衝突判定
pub fn cd3d(s: &Vect3, vo: &Vect3, vi: &Vect3, d: f64, h: f64) -> bool {
    detection(s, vo, vi, d, h, 0.0, f64::INFINITY).conflict()
}

/// 区間 `[b, t]` への切り詰め（進入側）
fn clamp_in(x: f64, b: f64, t: f64) -> f64 {
    x.max(b).min(t)
}

/// 区間 `[b, t]` への切り詰め（離脱側）
fn clamp_out(x: f64, b: f64, t: f64) -> f64 {
    x.min(t).max(b)
}

/// 区間 `[b, t]` における円柱の違反区間
///
/// 水平速度がほぼ等しい場合、水平条件は時間によらないため垂直の進入・離脱時刻だけで決まります。
/// それ以外では水平の進入・離脱と垂直の進入・離脱を重ね合わせます。
pub fn detection(s: &Vect3, vo: &Vect3, vi: &Vect3, d: f64, h: f64, b: f64, t: f64) -> LossData {
    let s2 = s.vect2();
    let vo2 = vo.vect2();
    let vi2 = vi.vect2();
    let v2 = vo2 - vi2;
    let vz = vo.z - vi.z;
    let vertical_match = almost_equals(vo.z, vi.z);

    if vo2.almost_equals(&vi2) && almost_horizontal_los(&s2, d) {
        if !vertical_match {
            let tin = theta_h(s.z, vz, ENTRY, h);
            let tout = theta_h(s.z, vz, EXIT, h);
            return LossData::new(clamp_in(tin, b, t), clamp_out(tout, b, t));
        }
        if !almost_vertical_los(s.z, h) {
            return LossData::new(t, b);
        }
        return LossData::new(b, t);
    }

    if delta(&s2, &v2, d) > 0.0 {
        let td1 = theta_d(&s2, &v2, ENTRY, d);
        let td2 = theta_d(&s2, &v2, EXIT, d);
        if vertical_match && almost_vertical_los(s.z, h) {
            return LossData::new(clamp_in(td1, b, t), clamp_out(td2, b, t));
        }
        if !vertical_match {
            let tin = td1.max(theta_h(s.z, vz, ENTRY, h));
            let tout = td2.min(theta_h(s.z, vz, EXIT, h));
            return LossData::new(clamp_in(tin, b, t), clamp_out(tout, b, t));
        }
    }
    LossData::new(t, b)
}

/// 円柱ノルムが最小となる時刻（区間 `[b, t]` 内）
///
/// 円柱ノルムは2つの凸二次関数の最大値なので、最小点は各二次関数の頂点、
/// 2つの二次関数の交点、区間端のいずれかにあります。
pub fn tccpa(s: &Vect3, vo: &Vect3, vi: &Vect3, d: f64, h: f64, b: f64, t: f64) -> f64 {
    let v = *vo - *vi;
    let s2 = s.vect2();
    let v2 = v.vect2();

    let mut candidates = vec![b, t];
    if !v2.is_zero() {
        candidates.push(clamp_in(tcpa(&s2, &v2), b, t));
    }
    if v.z != 0.0 {
        candidates.push(clamp_in(-s.z / v.z, b, t));
    }
    // |s2 + τ·v2|²/D² = (sz + τ·vz)²/H²
    let qa = v2.sqv() / sq(d) - sq(v.z / h);
    let qb = s2.dot(&v2) / sq(d) - s.z * v.z / sq(h);
    let qc = s2.sqv() / sq(d) - sq(s.z / h);
    for eps in [ENTRY, EXIT] {
        let r = root2b(qa, qb, qc, eps);
        if r.is_finite() {
            candidates.push(clamp_in(r, b, t));
        }
    }

    let mut best_t = b;
    let mut best_n = f64::INFINITY;
    for tc in candidates.into_iter().filter(|tc| tc.is_finite()) {
        let n = s.linear(&v, tc).cyl_norm(d, h);
        if n < best_n {
            best_n = n;
            best_t = tc;
        }
    }
    best_t
}
