//! # 水平ソルバー
//!
//! 相対座標系（侵入機を原点に固定）での円と直線の交差を解き、
//! 水平方向の回避解（方位のみ・対地速度のみ・最適）を求めます。
//!
//! 記法:
//! - `s`  : 自機の相対位置
//! - `vo` : 自機速度
//! - `vi` : 侵入機速度
//! - `D`  : 保護円の半径
//! - `nv` : 接線方向（[`TangentLine`]）

use std::fmt;

use super::tangent_line::TangentLine;
use super::vertical::theta_h;
use super::{ENTRY, EXIT};
use crate::geometry::util::{almost_equals, root2b, sign, sq};
use crate::geometry::{Vect2, Vect3};

/// 水平回避解
///
/// 解なしは明示的なバリアントで表します。計算結果がちょうどゼロベクトル（停止）になった場合も
/// 解なしとして扱います。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Horizontal {
    #[default]
    NoSolution,
    /// 自機の新しい水平速度と補助スカラー `k`
    Velocity { nvo: Vect2, k: f64 },
}

impl Horizontal {
    /// `k = 1` の解
    pub fn new(nvo: Vect2) -> Self {
        Self::with_k(1.0, nvo)
    }

    fn with_k(k: f64, nvo: Vect2) -> Self {
        if nvo.is_zero() {
            Horizontal::NoSolution
        } else {
            Horizontal::Velocity { nvo, k }
        }
    }

    pub fn undef(&self) -> bool {
        matches!(self, Horizontal::NoSolution)
    }

    pub fn velocity(&self) -> Option<Vect2> {
        match self {
            Horizontal::Velocity { nvo, .. } => Some(*nvo),
            Horizontal::NoSolution => None,
        }
    }

    pub fn k(&self) -> Option<f64> {
        match self {
            Horizontal::Velocity { k, .. } => Some(*k),
            Horizontal::NoSolution => None,
        }
    }

    /// `k < 0`（後退方向）の解を棄却
    fn feasible(self) -> Self {
        match self {
            Horizontal::Velocity { k, .. } if k < 0.0 => Horizontal::NoSolution,
            other => other,
        }
    }
}

impl fmt::Display for Horizontal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Horizontal::NoSolution => write!(f, "Undef"),
            Horizontal::Velocity { nvo, .. } => write!(f, "{}", nvo),
        }
    }
}

/// 2つの候補のうち現在速度 `vo` に近い方を選ぶ（同距離なら `v1`）
pub fn best_horizontal(vo: &Vect2, v1: Horizontal, v2: Horizontal) -> Horizontal {
    match (v1.velocity(), v2.velocity()) {
        (None, _) => v2,
        (Some(_), None) => v1,
        (Some(a), Some(b)) => {
            if a.leq(&b, vo) {
                v1
            } else {
                v2
            }
        }
    }
}

/// 最接近時刻
pub fn tcpa(s: &Vect2, v: &Vect2) -> f64 {
    if v.is_zero() { 0.0 } else { -s.dot(v) / v.sqv() }
}

/// 最接近距離
pub fn dcpa(s: &Vect2, v: &Vect2) -> f64 {
    v.scal_add(tcpa(s, v), s).norm()
}

/// 先読み時間 `t` 以内の水平ミス距離
pub fn hmd(s: &Vect2, v: &Vect2, t: f64) -> f64 {
    let tm = if s.dot(v) < 0.0 { tcpa(s, v).min(t) } else { 0.0 };
    v.scal_add(tm, s).norm()
}

/// 直線と円の交差判別式 `D²·|v|² − (s×v)²`
pub fn delta(s: &Vect2, v: &Vect2, d: f64) -> f64 {
    sq(d) * v.sqv() - sq(s.det(v))
}

/// 円への進入（`eps = -1`）／離脱（`eps = +1`）時刻
///
/// 実根がない場合は NaN を返します。
pub fn theta_d(s: &Vect2, v: &Vect2, eps: i32, d: f64) -> f64 {
    let a = v.sqv();
    let b = s.dot(v);
    let c = s.sqv() - sq(d);
    root2b(a, b, c, eps)
}

/// 境界を除いた水平方向の LoS
pub fn almost_horizontal_los(s: &Vect2, d: f64) -> bool {
    let sqs = s.sqv();
    let sqd = sq(d);
    !almost_equals(sqs, sqd) && sqs < sqd
}

pub fn horizontal_sep(s: &Vect2, d: f64) -> bool {
    s.sqv() >= sq(d)
}

pub fn horizontal_dir(s: &Vect2, v: &Vect2, dir: i32) -> bool {
    dir as f64 * s.dot(v) >= 0.0
}

pub fn horizontal_dir_at(s: &Vect2, v: &Vect2, t: f64, dir: i32) -> bool {
    let sp = v.scal_add(t, s);
    horizontal_dir(&sp, v, dir)
}

pub fn horizontal_entry(s: &Vect2, v: &Vect2) -> bool {
    horizontal_dir(s, v, ENTRY)
}

/// `s` に垂直で `v` と同じ側を向く方向
pub fn vdir(s: &Vect2, v: &Vect2) -> Vect2 {
    let ps = s.perp_r();
    ps.scal(sign(ps.dot(v)) as f64)
}

pub fn w0(s: &Vect2, j: f64) -> Vect2 {
    if s.is_zero() { Vect2::ZERO } else { s.scal(j / s.sqv()) }
}

/// `k·nv = l·vo − vi` を `(k, l)` について解く（対地速度のみ）
pub fn gs_only_line(nv: &Vect2, vo: &Vect2, vi: &Vect2) -> Horizontal {
    let det_vo_v = vo.det(nv);
    if det_vo_v == 0.0 {
        return Horizontal::NoSolution;
    }
    let l = vi.det(nv) / det_vo_v;
    if l < 0.0 {
        return Horizontal::NoSolution;
    }
    let k = vi.det(vo) / det_vo_v;
    Horizontal::with_k(k, vo.scal(l))
}

pub fn gs_line(nv: &Vect2, vo: &Vect2, vi: &Vect2) -> Horizontal {
    gs_only_line(nv, vo, vi).feasible()
}

pub fn gs_only_dot(u: &Vect2, vo: &Vect2, vi: &Vect2, j: f64) -> Horizontal {
    gs_only_line(&vdir(u, &(*vo - *vi)), vo, &(*vi + w0(u, j)))
}

/// 進入点 `s + td·v` を時刻 `th` で通過する対地速度解
pub fn gs_only_vertical(s: &Vect2, vo: &Vect2, vi: &Vect2, th: f64, dir: i32, d: f64) -> Horizontal {
    let v = *vo - *vi;
    if delta(s, &v, d) > 0.0 {
        let td = theta_d(s, &v, dir, d);
        if td > 0.0 {
            let p = v.scal_add(td, s);
            return gs_only_dot(&p.scal(th), vo, vi, sq(d) - s.dot(&p));
        }
    }
    Horizontal::NoSolution
}

/// 垂直方向の進入・離脱時刻 `t` を求め、水平解が有効となる条件を確認する
fn vertical_anchor(s: &Vect3, vo: &Vect3, vi: &Vect3, epsv: i32, h: f64) -> Option<(f64, i32)> {
    if almost_equals(vo.z, vi.z) {
        return None;
    }
    let v = *vo - *vi;
    let dir = if s.z.abs() >= h { epsv * sign(s.z) } else { ENTRY };
    let t = theta_h(s.z, v.z, -dir, h);
    if t > 0.0 && epsv == sign(s.z + t * v.z) {
        Some((t, dir))
    } else {
        None
    }
}

/// 候補が LoS 中、または接線の側に沿っている場合のみ採用
fn accept_on_tangent_side(nvo2: Horizontal, s2: &Vect2, vo2: &Vect2, l: &TangentLine, d: f64) -> Horizontal {
    match nvo2.velocity() {
        Some(nv) if almost_horizontal_los(s2, d) || l.horizontal_criterion(&(nv - *vo2)) => nvo2,
        _ => Horizontal::NoSolution,
    }
}

pub fn gs_vertical(s: &Vect3, vo: &Vect3, vi: &Vect3, l: &TangentLine, epsv: i32, d: f64, h: f64) -> Horizontal {
    let Some((t, dir)) = vertical_anchor(s, vo, vi, epsv, h) else {
        return Horizontal::NoSolution;
    };
    let nvo2 = gs_only_vertical(&s.vect2(), &vo.vect2(), &vi.vect2(), t, dir, d);
    accept_on_tangent_side(nvo2, &s.vect2(), &vo.vect2(), l, d)
}

/// 対地速度のみの回避解
pub fn gs_only(nv: &TangentLine, s: &Vect3, vo: &Vect3, vi: &Vect3, epsv: i32, d: f64, h: f64) -> Horizontal {
    best_horizontal(
        &vo.vect2(),
        gs_line(&nv.vect(), &vo.vect2(), &vi.vect2()),
        gs_vertical(s, vo, vi, nv, epsv, d, h),
    )
}

/// 時刻 `t` に円周上へ到達する対地速度解
pub fn gs_only_circle(s: &Vect2, vo: &Vect2, vi: &Vect2, t: f64, dir: i32, irt: i32, d: f64) -> Horizontal {
    let w = *s - vi.scal(t);
    let a = sq(t) * vo.sqv();
    let b = t * w.dot(vo);
    let c = w.sqv() - sq(d);
    let l = root2b(a, b, c, irt);
    if l.is_nan() {
        return Horizontal::NoSolution;
    }
    let nvo = vo.scal(l.max(0.0));
    if horizontal_dir_at(s, &(nvo - *vi), t, dir) {
        Horizontal::new(nvo)
    } else {
        Horizontal::NoSolution
    }
}

pub fn gs_circle(s: &Vect3, vo: &Vect3, vi: &Vect3, dir: i32, irt: i32, d: f64, h: f64) -> Horizontal {
    if almost_equals(vo.z, vi.z) {
        return Horizontal::NoSolution;
    }
    let t = theta_h(s.z, vo.z - vi.z, -dir, h);
    gs_only_circle(&s.vect2(), &vo.vect2(), &vi.vect2(), t, dir, irt, d)
}

/// `|k·nv + vi| = |vo|` を `k` について解く（方位のみ）
pub fn trk_only_line_irt(nv: &Vect2, vo: &Vect2, vi: &Vect2, irt: i32) -> Horizontal {
    let a = nv.sqv();
    let b = nv.dot(vi);
    let c = vi.sqv() - vo.sqv();
    let k = root2b(a, b, c, irt);
    if k.is_nan() {
        return Horizontal::NoSolution;
    }
    Horizontal::with_k(k, nv.scal_add(k, vi))
}

pub fn trk_only_line(nv: &Vect2, vo: &Vect2, vi: &Vect2) -> Horizontal {
    best_horizontal(vo, trk_only_line_irt(nv, vo, vi, EXIT), trk_only_line_irt(nv, vo, vi, ENTRY))
}

pub fn trk_line_irt(nv: &Vect2, vo: &Vect2, vi: &Vect2, irt: i32) -> Horizontal {
    trk_only_line_irt(nv, vo, vi, irt).feasible()
}

pub fn trk_line(nv: &Vect2, vo: &Vect2, vi: &Vect2) -> Horizontal {
    best_horizontal(vo, trk_line_irt(nv, vo, vi, EXIT), trk_line_irt(nv, vo, vi, ENTRY))
}

pub fn trk_only_dot(u: &Vect2, vo: &Vect2, vi: &Vect2, j: f64, irt: i32) -> Horizontal {
    trk_only_line_irt(&vdir(u, &(*vo - *vi)), vo, &(*vi + w0(u, j)), irt)
}

pub fn trk_only_vertical(s: &Vect2, vo: &Vect2, vi: &Vect2, th: f64, dir: i32, irt: i32, d: f64) -> Horizontal {
    let v = *vo - *vi;
    if delta(s, &v, d) > 0.0 {
        let td = theta_d(s, &v, dir, d);
        if td > 0.0 {
            let p = v.scal_add(td, s);
            return trk_only_dot(&p.scal(th), vo, vi, sq(d) - s.dot(&p), irt);
        }
    }
    Horizontal::NoSolution
}

pub fn trk_vertical_irt(
    s: &Vect3,
    vo: &Vect3,
    vi: &Vect3,
    l: &TangentLine,
    epsv: i32,
    irt: i32,
    d: f64,
    h: f64,
) -> Horizontal {
    let Some((t, dir)) = vertical_anchor(s, vo, vi, epsv, h) else {
        return Horizontal::NoSolution;
    };
    let nvo2 = trk_only_vertical(&s.vect2(), &vo.vect2(), &vi.vect2(), t, dir, irt, d);
    accept_on_tangent_side(nvo2, &s.vect2(), &vo.vect2(), l, d)
}

pub fn trk_vertical(s: &Vect3, vo: &Vect3, vi: &Vect3, l: &TangentLine, epsv: i32, d: f64, h: f64) -> Horizontal {
    best_horizontal(
        &vo.vect2(),
        trk_vertical_irt(s, vo, vi, l, epsv, EXIT, d, h),
        trk_vertical_irt(s, vo, vi, l, epsv, ENTRY, d, h),
    )
}

/// 方位のみの回避解
pub fn trk_only(nv: &TangentLine, s: &Vect3, vo: &Vect3, vi: &Vect3, epsv: i32, d: f64, h: f64) -> Horizontal {
    best_horizontal(
        &vo.vect2(),
        trk_line(&nv.vect(), &vo.vect2(), &vi.vect2()),
        trk_vertical(s, vo, vi, nv, epsv, d, h),
    )
}

pub fn trk_only_circle(s: &Vect2, vo: &Vect2, vi: &Vect2, t: f64, dir: i32, irt: i32, d: f64) -> Horizontal {
    if t <= 0.0 || s.almost_equals(&vi.scal(t)) {
        return Horizontal::NoSolution;
    }
    let w = s.add_scal(-t, vi);
    let e = (sq(d) - s.sqv() - sq(t) * (vo.sqv() - vi.sqv())) / (2.0 * t);
    let nvo = trk_only_dot(&w, vo, vi, e, irt);
    match nvo.velocity() {
        Some(v) if horizontal_dir_at(s, &(v - *vi), t, dir) => nvo,
        _ => Horizontal::NoSolution,
    }
}

pub fn trk_circle(s: &Vect3, vo: &Vect3, vi: &Vect3, dir: i32, irt: i32, d: f64, h: f64) -> Horizontal {
    if almost_equals(vo.z, vi.z) {
        return Horizontal::NoSolution;
    }
    let t = theta_h(s.z, vo.z - vi.z, -dir, h);
    trk_only_circle(&s.vect2(), &vo.vect2(), &vi.vect2(), t, dir, irt, d)
}

/// `nv·(k·nv − (vo − vi)) = 0` の射影解（最適）
pub fn opt_trk_gs_line(nv: &Vect2, vo: &Vect2, vi: &Vect2) -> Horizontal {
    if nv.is_zero() {
        return Horizontal::NoSolution;
    }
    let v = *vo - *vi;
    let k = nv.dot(&v) / nv.sqv();
    Horizontal::with_k(k, nv.scal_add(k, vi))
}

pub fn opt_line(nv: &Vect2, vo: &Vect2, vi: &Vect2) -> Horizontal {
    opt_trk_gs_line(nv, vo, vi).feasible()
}

pub fn opt_trk_gs_dot(u: &Vect2, vo: &Vect2, vi: &Vect2, j: f64) -> Horizontal {
    opt_trk_gs_line(&vdir(u, &(*vo - *vi)), vo, &(*vi + w0(u, j)))
}

pub fn opt_trk_gs_vertical(s: &Vect2, vo: &Vect2, vi: &Vect2, th: f64, dir: i32, d: f64) -> Horizontal {
    let v = *vo - *vi;
    if delta(s, &v, d) > 0.0 {
        let td = theta_d(s, &v, dir, d);
        if td > 0.0 {
            let p = v.scal_add(td, s);
            return opt_trk_gs_dot(&p.scal(th), vo, vi, sq(d) - s.dot(&p));
        }
    }
    Horizontal::NoSolution
}

pub fn opt_vertical(s: &Vect3, vo: &Vect3, vi: &Vect3, l: &TangentLine, epsv: i32, d: f64, h: f64) -> Horizontal {
    let Some((t, dir)) = vertical_anchor(s, vo, vi, epsv, h) else {
        return Horizontal::NoSolution;
    };
    let nvo2 = opt_trk_gs_vertical(&s.vect2(), &vo.vect2(), &vi.vect2(), t, dir, d);
    accept_on_tangent_side(nvo2, &s.vect2(), &vo.vect2(), l, d)
}

/// 方位・対地速度を同時に変える最適回避解
///
/// 直線解には `k < 0` を除く [`opt_line`] を使います（[`opt_trk_gs_line`] は無条件）。
pub fn opt_trk_gs(nv: &TangentLine, s: &Vect3, vo: &Vect3, vi: &Vect3, epsv: i32, d: f64, h: f64) -> Horizontal {
    best_horizontal(
        &vo.vect2(),
        opt_line(&nv.vect(), &vo.vect2(), &vi.vect2()),
        opt_vertical(s, vo, vi, nv, epsv, d, h),
    )
}

/// 水平協調符号が反転する方位 [rad]
///
/// 相対速度が `s` と平行になる自機方位です。存在しない場合は `None`。
pub fn epsilon_critical_point_track(s: &Vect2, vo: &Vect2, vi: &Vect2, irt: i32) -> Option<f64> {
    trk_only_dot(&s.perp_r(), vo, vi, 0.0, irt).velocity().map(|v| v.trk())
}

/// 水平協調符号が反転する対地速度 [m/s]
pub fn epsilon_critical_point_gs(s: &Vect2, vo: &Vect2, vi: &Vect2) -> Option<f64> {
    gs_only_dot(&s.perp_r(), vo, vi, 0.0).velocity().map(|v| v.norm())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head_on() -> (Vect3, Vect3, Vect3) {
        (
            Vect3::new(10000.0, 0.0, 0.0),
            Vect3::new(-50.0, 0.0, 0.0),
            Vect3::new(50.0, 0.0, 0.0),
        )
    }

    #[test]
    fn test_tcpa_and_dcpa() {
        let s = Vect2::new(-1000.0, 500.0);
        let v = Vect2::new(100.0, 0.0);
        assert_eq!(tcpa(&s, &v), 10.0);
        assert_eq!(dcpa(&s, &v), 500.0);
        assert_eq!(tcpa(&s, &Vect2::ZERO), 0.0);
        assert_eq!(hmd(&s, &v, 5.0), Vect2::new(-500.0, 500.0).norm());
    }

    #[test]
    fn test_theta_d_head_on() {
        let s = Vect2::new(10000.0, 0.0);
        let v = Vect2::new(-100.0, 0.0);
        assert!(delta(&s, &v, 1852.0) > 0.0);
        assert!((theta_d(&s, &v, ENTRY, 1852.0) - 81.48).abs() < 1.0e-9);
        assert!((theta_d(&s, &v, EXIT, 1852.0) - 118.52).abs() < 1.0e-9);
    }

    #[test]
    fn test_theta_d_miss() {
        let s = Vect2::new(10000.0, 3000.0);
        let v = Vect2::new(-100.0, 0.0);
        assert!(delta(&s, &v, 1852.0) < 0.0);
        assert!(theta_d(&s, &v, ENTRY, 1852.0).is_nan());
    }

    #[test]
    fn test_almost_horizontal_los_boundary() {
        let d = 1852.0;
        assert!(!almost_horizontal_los(&Vect2::new(d, 0.0), d));
        assert!(almost_horizontal_los(&Vect2::new(d - 1.0e-3, 0.0), d));
        assert!(horizontal_sep(&Vect2::new(d, 0.0), d));
    }

    #[test]
    fn test_best_horizontal_ordering() {
        let vo = Vect2::new(100.0, 0.0);
        let near = Horizontal::new(Vect2::new(90.0, 10.0));
        let far = Horizontal::new(Vect2::new(0.0, 100.0));
        assert_eq!(best_horizontal(&vo, far, near), near);
        assert_eq!(best_horizontal(&vo, near, far), near);
        assert_eq!(best_horizontal(&vo, Horizontal::NoSolution, far), far);
        assert_eq!(best_horizontal(&vo, far, Horizontal::NoSolution), far);
        // 同距離なら第1候補
        let mirrored = Horizontal::new(Vect2::new(90.0, -10.0));
        assert_eq!(best_horizontal(&vo, mirrored, near), mirrored);
    }

    #[test]
    fn test_zero_velocity_is_no_solution() {
        assert!(Horizontal::new(Vect2::ZERO).undef());
        assert_eq!(Horizontal::new(Vect2::new(1.0, 0.0)).k(), Some(1.0));
    }

    #[test]
    fn test_trk_only_keeps_speed_and_clears_circle() {
        let (s, vo, vi) = head_on();
        let d = 1852.0;
        let nv = TangentLine::new(&s.vect2(), d, 1);
        let trk = trk_only(&nv, &s, &vo, &vi, 1, d, 150.0);
        let nvo = trk.velocity().expect("track solution");
        assert!((nvo.norm() - vo.vect2().norm()).abs() < 1.0e-6);
        let rel = nvo - vi.vect2();
        assert!(dcpa(&s.vect2(), &rel) >= d - 1.0e-6);
    }

    #[test]
    fn test_gs_only_is_parallel_to_vo() {
        // 直交する航路での衝突コース
        let s = Vect3::new(10000.0, 10000.0, 0.0);
        let vo = Vect3::new(-100.0, 0.0, 0.0);
        let vi = Vect3::new(0.0, 100.0, 0.0);
        let d = 1852.0;
        let eps = sign((vo.vect2() - vi.vect2()).det(&s.vect2()));
        let nv = TangentLine::new(&s.vect2(), d, eps);
        let gs = gs_only(&nv, &s, &vo, &vi, 1, d, 150.0);
        let nvo = gs.velocity().expect("ground speed solution");
        assert!(nvo.det(&vo.vect2()).abs() < 1.0e-6);
        assert!(nvo.dot(&vo.vect2()) > 0.0);
        assert!(gs.k().is_some_and(|k| k >= 0.0));
        let rel = nvo - vi.vect2();
        assert!(dcpa(&s.vect2(), &rel) >= d - 1.0e-3);
    }

    #[test]
    fn test_opt_is_projection() {
        let (s, vo, vi) = head_on();
        let d = 1852.0;
        let nv = TangentLine::new(&s.vect2(), d, 1);
        let opt = opt_trk_gs(&nv, &s, &vo, &vi, 1, d, 150.0);
        let nvo = opt.velocity().expect("optimal solution");
        // 相対速度の変化量は接線方向に直交
        let dv = (nvo - vi.vect2()) - (vo.vect2() - vi.vect2());
        assert!(dv.dot(&nv.vect()).abs() < 1.0e-6);
    }

    #[test]
    fn test_gs_line_rejects_negative_k() {
        let nv = Vect2::new(1.0, 0.0);
        let vo = Vect2::new(0.0, 1.0);
        let vi = Vect2::new(1.0, -1.0);
        // l = -1
        assert!(gs_only_line(&nv, &vo, &vi).undef());
        let vi = Vect2::new(1.0, 1.0);
        // l = 1, k = -1
        assert_eq!(gs_only_line(&nv, &vo, &vi).k(), Some(-1.0));
        assert!(gs_line(&nv, &vo, &vi).undef());
    }

    #[test]
    fn test_vertical_bias_requires_different_rates() {
        let (s, vo, vi) = head_on();
        let nv = TangentLine::new(&s.vect2(), 1852.0, 1);
        assert!(gs_vertical(&s, &vo, &vi, &nv, 1, 1852.0, 150.0).undef());
        assert!(trk_vertical(&s, &vo, &vi, &nv, 1, 1852.0, 150.0).undef());
        assert!(opt_vertical(&s, &vo, &vi, &nv, 1, 1852.0, 150.0).undef());
    }

    #[test]
    fn test_vertical_bias_delays_entry_until_slab_exit() {
        // 水平進入 11.48 s、垂直離脱 30 s
        let s = Vect3::new(3000.0, 0.0, 0.0);
        let vo = Vect3::new(-90.0, 0.0, 5.0);
        let vi = Vect3::new(10.0, 0.0, 0.0);
        let d = 1852.0;
        let h = 150.0;
        let nv = TangentLine::new(&s.vect2(), d, 1);
        let entry = Vect2::new(d, 0.0);

        let gs = gs_vertical(&s, &vo, &vi, &nv, 1, d, h).velocity().expect("gs vertical");
        let trk = trk_vertical(&s, &vo, &vi, &nv, 1, d, h).velocity().expect("trk vertical");
        for nvo in [gs, trk] {
            let at = (nvo - vi.vect2()).scal_add(30.0, &s.vect2());
            assert!((entry.dot(&at) - d * d).abs() < 1.0e-3);
        }
        assert!((trk.norm() - 90.0).abs() < 1.0e-6);
        assert!(trk.y < 0.0);
        assert!(gs.det(&vo.vect2()).abs() < 1.0e-6);
    }

    #[test]
    fn test_trk_only_circle_reaches_boundary() {
        let s = Vect2::new(5000.0, 0.0);
        let vo = Vect2::new(-100.0, 0.0);
        let vi = Vect2::ZERO;
        let d = 1852.0;
        let t = 40.0;
        for irt in [ENTRY, EXIT] {
            let nvo = trk_only_circle(&s, &vo, &vi, t, ENTRY, irt, d)
                .velocity()
                .expect("circle solution");
            let p = (nvo - vi).scal_add(t, &s);
            assert!((p.norm() - d).abs() < 1.0e-6);
            assert!((nvo.norm() - 100.0).abs() < 1.0e-6);
        }
    }

    #[test]
    fn test_gs_only_circle_reaches_boundary() {
        let s = Vect2::new(5000.0, 1000.0);
        let vo = Vect2::new(-50.0, 0.0);
        let vi = Vect2::ZERO;
        let d = 1852.0;
        let t = 60.0;
        let nvo = gs_only_circle(&s, &vo, &vi, t, ENTRY, ENTRY, d)
            .velocity()
            .expect("circle solution");
        let p = nvo.scal_add(t, &s);
        assert!((p.norm() - d).abs() < 1.0e-6);
        assert!(nvo.det(&vo).abs() < 1.0e-9);
    }

    /// 下方 300 m から上昇する自機（H = 150 m では 90 s 後に垂直分離を抜ける）
    fn climbing_ownship() -> (Vect3, Vect3, Vect3) {
        (
            Vect3::new(10000.0, 0.0, -300.0),
            Vect3::new(-100.0, 0.0, 5.0),
            Vect3::ZERO,
        )
    }

    #[test]
    fn test_gs_circle_enters_at_vertical_exit() {
        let (s, vo, vi) = climbing_ownship();
        let (d, h) = (1852.0, 150.0);
        let t = theta_h(s.z, vo.z - vi.z, EXIT, h);
        assert_eq!(t, 90.0);

        let nvo = gs_circle(&s, &vo, &vi, ENTRY, ENTRY, d, h)
            .velocity()
            .expect("gs circle solution");
        let p = (nvo - vi.vect2()).scal_add(t, &s.vect2());
        assert!((p.norm() - d).abs() < 1.0e-6);
        assert!(p.dot(&(nvo - vi.vect2())) < 0.0);
        assert!(nvo.det(&vo.vect2()).abs() < 1.0e-9);
        assert!((nvo.norm() - 90.0 - 8.0 / 15.0).abs() < 1.0e-9);

        // 遠い側の根は円から出ていく
        assert!(gs_circle(&s, &vo, &vi, ENTRY, EXIT, d, h).undef());
    }

    #[test]
    fn test_gs_only_circle_clamps_backward_speed() {
        // 自機は円から遠ざかっており、根はどちらも負
        let s = Vect2::new(-5000.0, 0.0);
        let vo = Vect2::new(-100.0, 0.0);
        for irt in [ENTRY, EXIT] {
            assert!(gs_only_circle(&s, &vo, &Vect2::ZERO, 90.0, ENTRY, irt, 1852.0).undef());
        }
    }

    #[test]
    fn test_trk_circle_enters_at_vertical_exit() {
        let (s, vo, vi) = climbing_ownship();
        let (d, h) = (1852.0, 150.0);
        let t = theta_h(s.z, vo.z - vi.z, EXIT, h);

        for irt in [ENTRY, EXIT] {
            let nvo = trk_circle(&s, &vo, &vi, ENTRY, irt, d, h)
                .velocity()
                .expect("trk circle solution");
            let p = (nvo - vi.vect2()).scal_add(t, &s.vect2());
            assert!((p.norm() - d).abs() < 1.0e-6);
            assert!(p.dot(&(nvo - vi.vect2())) < 0.0);
            assert!((nvo.norm() - 100.0).abs() < 1.0e-6);
        }
    }

    #[test]
    fn test_circle_needs_vertical_closure() {
        let (d, h) = (1852.0, 150.0);
        let (s, vo, _) = climbing_ownship();
        // 昇降率が等しいと垂直境界の時刻が決まらない
        let vi = Vect3::new(0.0, 0.0, 5.0);
        assert!(gs_circle(&s, &vo, &vi, ENTRY, ENTRY, d, h).undef());
        assert!(trk_circle(&s, &vo, &vi, ENTRY, ENTRY, d, h).undef());

        // 上方から遠ざかる場合は境界時刻が負
        let above = Vect3::new(10000.0, 0.0, 300.0);
        assert!(theta_h(above.z, vo.z, EXIT, h) < 0.0);
        assert!(trk_circle(&above, &vo, &Vect3::ZERO, ENTRY, ENTRY, d, h).undef());
        assert!(trk_only_circle(&above.vect2(), &vo.vect2(), &Vect2::ZERO, 0.0, ENTRY, ENTRY, d).undef());
    }

    #[test]
    fn test_epsilon_critical_points() {
        let s = Vect2::new(10000.0, 0.0);
        let vo = Vect2::new(0.0, 100.0);
        let vi = Vect2::new(-50.0, 50.0);
        // 相対速度が s と平行になる方位
        for irt in [ENTRY, EXIT] {
            let t = epsilon_critical_point_track(&s, &vo, &vi, irt).expect("critical track");
            let nvo = Vect2::new(100.0 * t.sin(), 100.0 * t.cos());
            assert!((nvo - vi).det(&s).abs() < 1.0e-6);
        }
        let gs = epsilon_critical_point_gs(&s, &vo, &vi).expect("critical gs");
        assert!((gs - 50.0).abs() < 1.0e-9);
    }
}
