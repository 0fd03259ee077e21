//! # 協調・斥力判定
//!
//! 2機が独立に回避解を選んでも互いに矛盾しないための協調判定（水平・垂直の符号 `eps`）と、
//! 新しい速度が分離を悪化させないかを調べる斥力判定です。
//!
//! 記法は水平ソルバーと同じく `s` が相対位置、`vo`/`vi` が自機・侵入機速度、
//! `nvo` が自機の新しい速度です。

use serde::{Deserialize, Serialize};

use crate::detection::cd3d;
use crate::detection::horizontal::{delta, horizontal_sep, tcpa, theta_d};
use crate::detection::ENTRY;
use crate::geometry::units::from_unit;
use crate::geometry::util::{almost_equals, less_or_equal, sign, sq, sqrt_safe};
use crate::geometry::{Unit, Vect2, Vect3, Velocity};

/// 水平斥力判定の版
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepulsiveCriterion {
    Old,
    #[default]
    New,
}

/// 水平協調符号 `sign(v × s)`
pub fn horizontal_coordination(s: &Vect2, v: &Vect2) -> i32 {
    sign(v.det(s))
}

/// 垂直協調符号
///
/// 円柱内では NMAC 円柱 `nmac = (D, H)` を使った垂直決定ベクトルで、
/// それ以外では相対運動の代数判定で決めます。決まらない場合は [`break_symmetry`] に委ねます。
#[allow(clippy::too_many_arguments)]
pub fn vertical_coordination(
    s: &Vect3,
    vo: &Vect3,
    vi: &Vect3,
    d: f64,
    h: f64,
    ownship: &str,
    traffic: &str,
    nmac: (f64, f64),
) -> i32 {
    if cd3d::los(s, d, h) {
        let (ca_d, ca_h) = nmac;
        break_symmetry(&vertical_decision_vect(s, vo, vi, ca_d, ca_h), ownship, traffic)
    } else {
        vertical_coordination_conflict(s, &(*vo - *vi), d, ownship, traffic)
    }
}

fn vertical_coordination_conflict(s: &Vect3, v: &Vect3, d: f64, ownship: &str, traffic: &str) -> i32 {
    let s2 = s.vect2();
    let v2 = v.vect2();
    let a = v2.sqv();
    let b = s2.dot(&v2);
    let c = s2.sqv() - sq(d);
    let dd = sq(b) - a * c;
    let e = s.z * a - v.z * b;
    if almost_equals(v.z, 0.0) || v2.is_zero() || dd < 0.0 || eq(v.z, dd, e) {
        return break_symmetry(s, ownship, traffic);
    }
    if gt(v.z, dd, e) {
        return -1;
    }
    1
}

/// `a·√b == e`
fn eq(a: f64, b: f64, e: f64) -> bool {
    a * e >= 0.0 && sq(a) * b == sq(e)
}

/// `a·√b > e`
fn gt(a: f64, b: f64, e: f64) -> bool {
    if a >= 0.0 {
        e < 0.0 || sq(a) * b > sq(e)
    } else {
        e < 0.0 && sq(a) * b < sq(e)
    }
}

/// 対称性の破れ
///
/// 高度差があればその符号を、なければ逆順にした識別子の辞書順で決めます。
/// 2機の識別子が異なれば両機の結果は必ず逆符号になります。
pub fn break_symmetry(s: &Vect3, ownship: &str, traffic: &str) -> i32 {
    if almost_equals(s.z, 0.0) {
        let own: String = ownship.chars().rev().collect();
        let traf: String = traffic.chars().rev().collect();
        if less_or_equal(&own, &traf) { 1 } else { -1 }
    } else {
        sign(s.z)
    }
}

/// 垂直決定ベクトル
///
/// 円柱 `(ca_d, ca_h)` と衝突するか高度変化率が等しければ `s`、
/// それ以外で接近中なら水平最接近時点の相対位置を返します。
pub fn vertical_decision_vect(s: &Vect3, vo: &Vect3, vi: &Vect3, ca_d: f64, ca_h: f64) -> Vect3 {
    let v = *vo - *vi;
    let s2 = s.vect2();
    let vo2 = vo.vect2();
    let vi2 = vi.vect2();
    if (!s.is_zero() && cd3d::cd3d(s, vo, vi, ca_d, ca_h)) || almost_equals(vo.z, vi.z) {
        *s
    } else if vo2.almost_equals(&vi2) || s.is_zero() {
        v
    } else if s2.dot(&v.vect2()) <= 0.0 {
        s.add_scal(tcpa(&s2, &(vo2 - vi2)), &v)
    } else {
        *s
    }
}

fn r(sp: &Vect2, d: f64) -> f64 {
    sqrt_safe(sp.sqv() - sq(d)) / d
}

/// 水平判定（接線の `eps` 側へ向かう相対速度か）
pub fn horizontal_criterion(sp: &Vect2, v: &Vect2, d: f64, eps: i32) -> bool {
    sp.dot(v) >= r(sp, d) * eps as f64 * sp.det(v)
}

fn closed_region_3d(s: &Vect3, p: &Vect3, eps: i32, dir: i32, v: &Vect3, d: f64, h: f64) -> bool {
    let s2 = s.vect2();
    let p2 = p.vect2();
    let v2 = v.vect2();
    let vp = v2.dot(&p2);
    if vp == 0.0 {
        return false;
    }
    let t = (sq(d) - s2.dot(&p2)) / vp;
    let eps_f = eps as f64;
    sign(vp) == dir
        && t >= 0.0
        && eps_f * (s.z + t * v.z) >= h
        && ((s.z.abs() >= h && dir == eps * sign(s.z)) || (s.z.abs() < h && dir == -1))
}

/// 垂直判定
///
/// 新しい相対速度 `nv` が、現在の相対速度 `v` で円柱境界に達する点の `epsv` 側を通るか。
pub fn vertical_criterion(epsv: i32, s: &Vect3, v: &Vect3, nv: &Vect3, d: f64, h: f64) -> bool {
    let dir = if s.z.abs() >= h { epsv * sign(s.z) } else { ENTRY };
    let s2 = s.vect2();
    let v2 = v.vect2();
    let th = theta_d(&s2, &v2, dir, d);
    let p = Vect3::from_vect2(s2 + v2 * th, epsv as f64 * h);
    (v2.is_zero() && epsv as f64 * nv.z >= 0.0 && epsv as f64 * s.z >= h)
        || (delta(&s2, &v2, d) > 0.0 && th > 0.0 && closed_region_3d(s, &p, epsv, dir, nv, d, h))
}

fn horizontal_criterion_0(sp: &Vect2, eps: i32, v: &Vect2, d: f64) -> bool {
    let v = if almost_equals(v.norm(), 0.0) { Vect2::ZERO } else { *v };
    horizontal_criterion(sp, &v, d, eps)
}

fn horizontal_los(s: &Vect2, d: f64) -> bool {
    s.sqv() < sq(d)
}

fn vertical_los(sz: f64, h: f64) -> bool {
    sz.abs() < h
}

/// 3次元の協調判定
///
/// 水平に分離していれば水平判定のみ、そうでなければ垂直判定と
/// 水平判定（あるいは水平 LoS）の組み合わせで判定します。
pub fn criterion_3d(sp: &Vect3, v: &Velocity, eps_h: i32, eps_v: i32, nv: &Velocity, d: f64, h: f64) -> bool {
    let sp2 = sp.vect2();
    (horizontal_sep(&sp2, d) && horizontal_criterion_0(&sp2, eps_h, &nv.vect2(), d))
        || (vertical_criterion(eps_v, sp, v, nv, d, h)
            && (horizontal_los(&sp2, d) || horizontal_criterion_0(&sp2, eps_h, &(*nv - *v).vect2(), d)))
}

/// 旧版の水平斥力判定
pub fn horizontal_old_repulsive_criterion(s: &Vect2, vo: &Vect2, vi: &Vect2, nvo: &Vect2, eps: i32) -> bool {
    let v = *vo - *vi;
    let nv = *nvo - *vi;
    let e = eps as f64;
    !s.is_zero()
        && !nv.is_zero()
        && e * s.det(&v) <= 0.0
        && e * s.det(&nv) <= 0.0
        && ((s.dot(&v) < 0.0 && e * nv.det(&v) < 0.0)
            || (s.dot(&v) >= 0.0
                && (!v.is_zero() || s.dot(&nv) >= 0.0)
                && (v.is_zero() || s.dot(&nv) > s.dot(&v))))
}

/// 新版の水平斥力判定
///
/// 旧版より厳しく、新しい相対速度が `s` に平行な場合や回転方向が逆の場合を除外します。
pub fn horizontal_new_repulsive_criterion(s: &Vect2, vo: &Vect2, vi: &Vect2, nvo: &Vect2, eps: i32) -> bool {
    let v = *vo - *vi;
    let nv = *nvo - *vi;
    let e = eps as f64;
    !s.is_zero()
        && !nv.is_zero()
        && e * s.det(&v) <= 0.0
        && e * s.det(&nv) < 0.0
        && ((s.dot(&v) < 0.0 && e * nv.det(&v) < 0.0)
            || (s.dot(&v) >= 0.0
                && (!v.is_zero() || s.dot(&nv) >= 0.0)
                && (v.is_zero() || s.dot(&nv) > s.dot(&v))
                && e * nv.det(&v) <= 0.0))
}

/// 水平斥力判定
pub fn horizontal_repulsive_criterion(
    s: &Vect2,
    vo: &Vect2,
    vi: &Vect2,
    nvo: &Vect2,
    eps: i32,
    crit: RepulsiveCriterion,
) -> bool {
    match crit {
        RepulsiveCriterion::New => horizontal_new_repulsive_criterion(s, vo, vi, nvo, eps),
        RepulsiveCriterion::Old => horizontal_old_repulsive_criterion(s, vo, vi, nvo, eps),
    }
}

fn vs_bound_crit(v: &Vect3, nv: &Vect3, eps: i32) -> bool {
    let e = eps as f64;
    let v2 = v.vect2();
    if e * v.z > 0.0 {
        e * nv.z > e * v.z && -e * v.z * nv.vect2().dot(&v2) + e * nv.z * v2.sqv() >= 0.0
    } else {
        e * nv.z >= 0.0
    }
}

fn min_rel_vert_speed(vz: f64, minrelvs: f64, eps: i32) -> f64 {
    if eps as f64 * vz <= 0.0 { minrelvs } else { minrelvs.max(vz.abs()) }
}

/// 新版の垂直斥力判定
pub fn vertical_new_repulsive_criterion(vo: &Vect3, vi: &Vect3, nvo: &Vect3, eps: i32) -> bool {
    let v = *vo - *vi;
    let nv = *nvo - *vi;
    let e = eps as f64;
    let v2 = v.vect2();
    e * nv.z > e * v.z && -e * v.z * nv.vect2().dot(&v2) + e * nv.z * v2.sqv() >= 0.0
}

/// 旧版の垂直斥力判定（垂直 LoS 中のみ成立）
pub fn vertical_old_repulsive_criterion(
    s: &Vect3,
    vo: &Vect3,
    vi: &Vect3,
    nvo: &Vect3,
    eps: i32,
    h: f64,
    minrelvs: f64,
) -> bool {
    let v = *vo - *vi;
    let nv = *nvo - *vi;
    s.z.abs() < h && vs_bound_crit(&v, &nv, eps) && eps as f64 * nv.z >= min_rel_vert_speed(v.z, minrelvs, eps)
}

/// 垂直斥力判定
#[allow(clippy::too_many_arguments)]
pub fn vertical_repulsive_criterion(
    s: &Vect3,
    vo: &Vect3,
    vi: &Vect3,
    nvo: &Vect3,
    h: f64,
    minrelvs: f64,
    eps: i32,
    crit: RepulsiveCriterion,
) -> bool {
    match crit {
        RepulsiveCriterion::New => vertical_new_repulsive_criterion(vo, vi, nvo, eps),
        RepulsiveCriterion::Old => vertical_old_repulsive_criterion(s, vo, vi, nvo, eps, h, minrelvs),
    }
}

fn trk_changed(vo: &Velocity, nvo: &Velocity) -> bool {
    (vo.trk() - nvo.trk()).abs() > from_unit(Unit::Degree, 0.001)
}

fn gs_changed(vo: &Velocity, nvo: &Velocity) -> bool {
    (vo.gs() - nvo.gs()).abs() > from_unit(Unit::Knot, 0.001)
}

fn vs_changed(vo: &Velocity, nvo: &Velocity) -> bool {
    (vo.vs() - nvo.vs()).abs() > from_unit(Unit::FeetPerMinute, 0.001)
}

/// 新しい速度 `nvo` が協調条件を満たすか
///
/// 円柱内では変化した成分（水平・垂直）の斥力判定を、
/// それ以外では [`criterion_3d`] を使います。
///
/// # 引数
///
/// * `min_rel_vs` - LoS 脱出時の最小相対昇降率（旧版の垂直斥力判定で使用）
/// * `epsh`, `epsv` - 水平・垂直協調符号
#[allow(clippy::too_many_arguments)]
pub fn criteria(
    s: &Vect3,
    vo: &Velocity,
    vi: &Velocity,
    nvo: &Velocity,
    min_rel_vs: f64,
    d: f64,
    h: f64,
    epsh: i32,
    epsv: i32,
    crit: RepulsiveCriterion,
) -> bool {
    if horizontal_los(&s.vect2(), d) && vertical_los(s.z, h) {
        let horiz_change = trk_changed(vo, nvo) || gs_changed(vo, nvo);
        let vert_change = vs_changed(vo, nvo);
        let vlc = vertical_repulsive_criterion(s, vo, vi, nvo, h, min_rel_vs, epsv, crit);
        let hlc = horizontal_repulsive_criterion(&s.vect2(), &vo.vect2(), &vi.vect2(), &nvo.vect2(), epsh, crit);
        match (horiz_change, vert_change) {
            (true, true) => hlc && vlc,
            (true, false) => hlc,
            (false, true) => vlc,
            (false, false) => hlc || vlc,
        }
    } else {
        criterion_3d(s, &(*vo - *vi), epsh, epsv, &(*nvo - *vi), d, h)
    }
}

/// `vo` を `dir` 方向に `step` [rad] 回転した速度
pub fn incr_trk_vect(vo: &Vect2, step: f64, dir: i32) -> Vect2 {
    let a = dir as f64 * step;
    *vo * a.cos() + vo.perp_r() * a.sin()
}

/// 方位探索で斥力的な回転方向（なければ 0）
pub fn losr_trk_iter_dir(s: &Vect2, vo: &Vect2, vi: &Vect2, step: f64, eps: i32, crit: RepulsiveCriterion) -> i32 {
    if horizontal_repulsive_criterion(s, vo, vi, &incr_trk_vect(vo, step, 1), eps, crit) {
        1
    } else if horizontal_repulsive_criterion(s, vo, vi, &incr_trk_vect(vo, step, -1), eps, crit) {
        -1
    } else {
        0
    }
}

/// 1度刻みでの方位探索方向
pub fn trk_search_direction(s: &Vect3, vo: &Vect3, vi: &Vect3, eps: i32, crit: RepulsiveCriterion) -> i32 {
    losr_trk_iter_dir(&s.vect2(), &vo.vect2(), &vi.vect2(), from_unit(Unit::Degree, 1.0), eps, crit)
}

/// 対地速度を `dir` 方向に `step` 変えた速度（`vo` は非ゼロ）
pub fn incr_gs_vect(vo: &Vect2, step: f64, dir: i32) -> Vect2 {
    let norm = vo.norm();
    *vo * ((norm + dir as f64 * step) / norm)
}

/// 対地速度探索で斥力的な増減方向（なければ 0）
#[allow(clippy::too_many_arguments)]
pub fn losr_gs_iter_dir(
    s: &Vect2,
    vo: &Vect2,
    vi: &Vect2,
    min_gs: f64,
    max_gs: f64,
    step: f64,
    eps: i32,
    crit: RepulsiveCriterion,
) -> i32 {
    let norm = vo.norm();
    if norm + step <= max_gs && horizontal_repulsive_criterion(s, vo, vi, &incr_gs_vect(vo, step, 1), eps, crit) {
        1
    } else if norm - step >= min_gs
        && horizontal_repulsive_criterion(s, vo, vi, &incr_gs_vect(vo, step, -1), eps, crit)
    {
        -1
    } else {
        0
    }
}

/// 1 kn 刻みでの対地速度探索方向（速度範囲の制約なし）
pub fn gs_search_direction(s: &Vect3, vo: &Vect3, vi: &Vect3, eps: i32, crit: RepulsiveCriterion) -> i32 {
    losr_gs_iter_dir(
        &s.vect2(),
        &vo.vect2(),
        &vi.vect2(),
        0.0,
        f64::MAX,
        from_unit(Unit::Knot, 1.0),
        eps,
        crit,
    )
}

/// 昇降率探索方向
pub fn vs_search_direction(epsv: i32) -> i32 {
    epsv
}

/// 侵入機の現在の昇降傾向 `vs_rate` に合わせた垂直協調符号
pub fn data_vs_rate_epsilon(epsv: i32, vs_rate: f64) -> i32 {
    let abs_dir = if vs_rate >= 0.0 { 1 } else { -1 };
    if abs_dir == vs_search_direction(epsv) { epsv } else { -epsv }
}

/// 侵入機の現在の旋回方向 `track_rate` に合わせた水平協調符号
pub fn data_turn_epsilon(
    s: &Vect3,
    vo: &Velocity,
    vi: &Velocity,
    epsh: i32,
    track_rate: f64,
    crit: RepulsiveCriterion,
) -> i32 {
    let traf_dir = trk_search_direction(&(-*s), vi, vo, epsh, crit);
    let abs_dir = if track_rate >= 0.0 { 1 } else { -1 };
    if abs_dir == traf_dir { epsh } else { -epsh }
}

/// 水平に離反しつつ相対速度が `min_rel` を超えるか
pub fn divergent_horiz_gt(s: &Vect2, v: &Vect2, min_rel: f64) -> bool {
    s.dot(v) > 0.0 && v.norm() > min_rel
}

/// 3次元の最接近時刻（相対速度がほぼ 0 なら `f64::MAX`）
pub fn tau(s: &Vect3, vo: &Vect3, vi: &Vect3) -> f64 {
    let v = *vo - *vi;
    let nv = v.norm();
    if almost_equals(nv, 0.0) { f64::MAX } else { -s.dot(&v) / sq(nv) }
}

/// 最接近時刻での距離
///
/// `future_only` が真で最接近が過去なら現在の距離を返します。
pub fn dist_at_tau(s: &Vect3, vo: &Vect3, vi: &Vect3, future_only: bool) -> f64 {
    let t = tau(s, vo, vi);
    if t < 0.0 && future_only {
        s.norm()
    } else {
        s.add_scal(t, &(*vo - *vi)).norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const D: f64 = 1852.0;
    const H: f64 = 150.0;

    #[test]
    fn test_horizontal_coordination() {
        let s = Vect2::new(1000.0, 0.0);
        assert_eq!(horizontal_coordination(&s, &Vect2::new(-100.0, 10.0)), -1);
        assert_eq!(horizontal_coordination(&s, &Vect2::new(-100.0, -10.0)), 1);
    }

    #[test]
    fn test_break_symmetry() {
        assert_eq!(break_symmetry(&Vect3::new(0.0, 0.0, 100.0), "AC1", "AC2"), 1);
        assert_eq!(break_symmetry(&Vect3::new(0.0, 0.0, -100.0), "AC1", "AC2"), -1);
        let s = Vect3::new(500.0, 0.0, 0.0);
        let own = break_symmetry(&s, "AC1", "AC2");
        let traf = break_symmetry(&(-s), "AC2", "AC1");
        assert_eq!(own, -traf);
    }

    #[test]
    fn test_vertical_coordination_level_relative_motion() {
        // 高度変化がなければ高度差の符号
        let s = Vect3::new(10000.0, 0.0, 200.0);
        let vo = Vect3::new(-100.0, 0.0, 0.0);
        let vi = Vect3::new(100.0, 0.0, 0.0);
        assert_eq!(vertical_coordination(&s, &vo, &vi, D, H, "own", "traf", (152.4, 30.48)), 1);
        let s = Vect3::new(10000.0, 0.0, -200.0);
        assert_eq!(vertical_coordination(&s, &vo, &vi, D, H, "own", "traf", (152.4, 30.48)), -1);
    }

    #[test]
    fn test_vertical_coordination_conflict_follows_relative_descent() {
        let s = Vect3::new(10000.0, 0.0, 0.0);
        let vo = Vect3::new(-100.0, 0.0, -5.0);
        let vi = Vect3::new(100.0, 0.0, 0.0);
        assert_eq!(vertical_coordination(&s, &vo, &vi, D, H, "own", "traf", (152.4, 30.48)), -1);
    }

    #[test]
    fn test_vertical_coordination_los_uses_decision_vector() {
        let vo = Vect3::new(-100.0, 0.0, 0.0);
        let vi = Vect3::new(100.0, 0.0, 0.0);
        let up = Vect3::new(100.0, 0.0, 10.0);
        let down = Vect3::new(100.0, 0.0, -10.0);
        assert_eq!(vertical_coordination(&up, &vo, &vi, D, H, "own", "traf", (152.4, 30.48)), 1);
        assert_eq!(vertical_coordination(&down, &vo, &vi, D, H, "own", "traf", (152.4, 30.48)), -1);
    }

    #[test]
    fn test_vertical_decision_vect_at_closest_approach() {
        // 水平最接近時点の相対位置
        let s = Vect3::new(10000.0, 0.0, 0.0);
        let vo = Vect3::new(-100.0, 0.0, 2.0);
        let vi = Vect3::new(100.0, 0.0, 0.0);
        let p = vertical_decision_vect(&s, &vo, &vi, 152.4, 30.48);
        assert_relative_eq!(p.x, 0.0, epsilon = 1.0e-9);
        assert_relative_eq!(p.z, 100.0, epsilon = 1.0e-9);
    }

    #[test]
    fn test_horizontal_new_repulsive_criterion() {
        let s = Vect2::new(1000.0, 0.0);
        let vo = Vect2::new(-100.0, 0.0);
        let vi = Vect2::ZERO;
        let right = Vect2::new(-99.0, -10.0);
        let left = Vect2::new(-99.0, 10.0);
        assert!(horizontal_new_repulsive_criterion(&s, &vo, &vi, &right, 1));
        assert!(!horizontal_new_repulsive_criterion(&s, &vo, &vi, &left, 1));
        assert!(horizontal_new_repulsive_criterion(&s, &vo, &vi, &left, -1));
    }

    #[test]
    fn test_old_criterion_accepts_parallel_exit() {
        // 離反中に同じ向きへ速度を上げる場合、旧版のみ成立
        let s = Vect2::new(1000.0, 0.0);
        let vo = Vect2::new(100.0, 0.0);
        let nvo = Vect2::new(150.0, 0.0);
        assert!(horizontal_old_repulsive_criterion(&s, &vo, &Vect2::ZERO, &nvo, 1));
        assert!(!horizontal_new_repulsive_criterion(&s, &vo, &Vect2::ZERO, &nvo, 1));
    }

    #[test]
    fn test_vertical_repulsive_criteria() {
        let vo = Vect3::new(-100.0, 0.0, 0.0);
        let vi = Vect3::new(100.0, 0.0, 0.0);
        let climb = Vect3::new(-100.0, 0.0, 5.0);
        let s = Vect3::new(100.0, 0.0, 10.0);
        assert!(vertical_new_repulsive_criterion(&vo, &vi, &climb, 1));
        assert!(!vertical_new_repulsive_criterion(&vo, &vi, &climb, -1));
        assert!(vertical_old_repulsive_criterion(&s, &vo, &vi, &climb, 1, H, 5.0));
        assert!(!vertical_old_repulsive_criterion(&s, &vo, &vi, &climb, 1, H, 5.08));
    }

    #[test]
    fn test_criteria_los_vertical_change_only() {
        let s = Vect3::new(100.0, 0.0, 10.0);
        let vo = Vect3::new(-100.0, 0.0, 0.0);
        let vi = Vect3::new(100.0, 0.0, 0.0);
        let nvo = Vect3::new(-100.0, 0.0, 5.0);
        assert!(criteria(&s, &vo, &vi, &nvo, 5.0, D, H, 1, 1, RepulsiveCriterion::New));
        assert!(!criteria(&s, &vo, &vi, &nvo, 5.0, D, H, 1, -1, RepulsiveCriterion::New));
    }

    #[test]
    fn test_criterion_3d_diverging_is_always_fine() {
        let s = Vect3::new(10000.0, 0.0, 0.0);
        let v = Vect3::new(-200.0, 0.0, 0.0);
        let nv = Vect3::new(100.0, 0.0, 0.0);
        assert!(criterion_3d(&s, &v, 1, 1, &nv, D, H));
        assert!(criterion_3d(&s, &v, -1, 1, &nv, D, H));
    }

    #[test]
    fn test_criterion_3d_vertical_escape() {
        let s = Vect3::new(10000.0, 0.0, 0.0);
        let v = Vect3::new(-200.0, 0.0, 0.0);
        // 境界到達時（約 40.7 秒後）に H を越える上昇
        let nv = Vect3::new(-200.0, 0.0, 10.0);
        assert!(criterion_3d(&s, &v, 1, 1, &nv, D, H));
        assert!(!criterion_3d(&s, &v, 1, -1, &nv, D, H));
        // 相対速度そのままでは成立しない
        assert!(!criterion_3d(&s, &v, 1, 1, &v, D, H));
    }

    #[test]
    fn test_losr_trk_iter_dir() {
        let s = Vect2::new(1000.0, 0.0);
        let vo = Vect2::new(-100.0, 0.0);
        let step = from_unit(Unit::Degree, 1.0);
        // perp_r 側（+1）は y 正方向への回転
        assert_eq!(losr_trk_iter_dir(&s, &vo, &Vect2::ZERO, step, 1, RepulsiveCriterion::New), -1);
        assert_eq!(losr_trk_iter_dir(&s, &vo, &Vect2::ZERO, step, -1, RepulsiveCriterion::New), 1);
    }

    #[test]
    fn test_incr_vectors() {
        let vo = Vect2::new(0.0, 100.0);
        let turned = incr_trk_vect(&vo, std::f64::consts::FRAC_PI_2, 1);
        assert_relative_eq!(turned.x, 100.0, epsilon = 1.0e-9);
        assert_relative_eq!(turned.y, 0.0, epsilon = 1.0e-9);
        let faster = incr_gs_vect(&vo, 10.0, 1);
        assert_relative_eq!(faster.y, 110.0, epsilon = 1.0e-9);
        assert_relative_eq!(incr_gs_vect(&vo, 10.0, -1).norm(), 90.0, epsilon = 1.0e-9);
    }

    #[test]
    fn test_losr_gs_iter_dir_respects_bounds() {
        let s = Vect2::new(0.0, 1000.0);
        let vo = Vect2::new(10.0, 100.0);
        let vi = Vect2::new(0.0, 150.0);
        // 侵入機が後方から追いつく状況。加速が斥力的
        let dir = losr_gs_iter_dir(&s, &vo, &vi, 0.0, 1000.0, 1.0, 1, RepulsiveCriterion::Old);
        let capped = losr_gs_iter_dir(&s, &vo, &vi, 0.0, vo.norm(), 1.0, 1, RepulsiveCriterion::Old);
        assert_eq!(dir, 1);
        assert_ne!(capped, 1);
    }

    #[test]
    fn test_gs_search_direction() {
        // 後方から速い侵入機が追いつく。加速が斥力的
        let s = Vect3::new(0.0, 1000.0, 0.0);
        let vo = Vect3::new(10.0, 100.0, 0.0);
        let vi = Vect3::new(0.0, 150.0, 0.0);
        assert_eq!(gs_search_direction(&s, &vo, &vi, 1, RepulsiveCriterion::New), 1);
        // 逆の協調符号ではどちらに変えても斥力的にならない
        assert_eq!(gs_search_direction(&s, &vo, &vi, -1, RepulsiveCriterion::New), 0);

        // 前方の遅い侵入機に追いつく。減速が斥力的
        let s = Vect3::new(0.0, -1000.0, 0.0);
        let vo = Vect3::new(10.0, 150.0, 0.0);
        let vi = Vect3::new(0.0, 100.0, 0.0);
        assert_eq!(gs_search_direction(&s, &vo, &vi, -1, RepulsiveCriterion::New), -1);
    }

    #[test]
    fn test_data_turn_epsilon_follows_intruder_turn() {
        // 侵入機から見た斥力的な旋回方向は epsh = 1 で -1、epsh = -1 で +1
        let s = Vect3::new(-1000.0, 0.0, 0.0);
        let vo = Vect3::ZERO;
        let vi = Vect3::new(-100.0, 0.0, 0.0);
        let crit = RepulsiveCriterion::New;
        assert_eq!(trk_search_direction(&(-s), &vi, &vo, 1, crit), -1);

        assert_eq!(data_turn_epsilon(&s, &vo, &vi, 1, -0.01, crit), 1);
        assert_eq!(data_turn_epsilon(&s, &vo, &vi, 1, 0.01, crit), -1);
        assert_eq!(data_turn_epsilon(&s, &vo, &vi, -1, 0.01, crit), -1);
        assert_eq!(data_turn_epsilon(&s, &vo, &vi, -1, -0.01, crit), 1);
    }

    #[test]
    fn test_data_epsilons() {
        assert_eq!(data_vs_rate_epsilon(1, 2.0), 1);
        assert_eq!(data_vs_rate_epsilon(1, -2.0), -1);
        assert_eq!(data_vs_rate_epsilon(-1, -2.0), -1);
        assert_eq!(vs_search_direction(-1), -1);
    }

    #[test]
    fn test_tau_and_dist_at_tau() {
        let s = Vect3::new(1000.0, 300.0, 0.0);
        let vo = Vect3::new(-100.0, 0.0, 0.0);
        assert_relative_eq!(tau(&s, &vo, &Vect3::ZERO), 10.0);
        assert_relative_eq!(dist_at_tau(&s, &vo, &Vect3::ZERO, true), 300.0, epsilon = 1.0e-9);
        // 離反中
        assert_relative_eq!(dist_at_tau(&s, &(-vo), &Vect3::ZERO, true), s.norm());
        assert_eq!(tau(&s, &vo, &vo), f64::MAX);
        assert!(divergent_horiz_gt(&s.vect2(), &Vect2::new(100.0, 0.0), 50.0));
        assert!(!divergent_horiz_gt(&s.vect2(), &Vect2::new(100.0, 0.0), 150.0));
    }
}
