//! # 3次元回避解の合成
//!
//! 円柱保護領域に対する回避解（方位のみ・対地速度のみ・最適・昇降率のみ）を求めます。
//! すでに保護領域内（LoS）にある場合は、斥力判定を満たす方向へ少しずつ速度を変える
//! 反復探索で脱出解を求めます。

use std::fmt;

use serde::{Deserialize, Serialize};

use super::criteria::{
    divergent_horiz_gt, dist_at_tau, horizontal_repulsive_criterion, incr_gs_vect, incr_trk_vect, losr_gs_iter_dir,
    losr_trk_iter_dir, tau, RepulsiveCriterion,
};
use crate::detection::horizontal::{gs_only, opt_trk_gs, trk_only};
use crate::detection::vertical::vs_circle;
use crate::detection::{cd3d, Horizontal, TangentLine, Vertical};
use crate::geometry::units::from_unit;
use crate::geometry::util::{almost_equals, sign};
use crate::geometry::{Unit, Vect3, Velocity};

/// 回避解の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    /// 回避解なし
    None,
    /// 衝突がないため回避不要
    Unnecessary,
    /// 将来の衝突に対する回避解
    Conflict,
    /// LoS 中（接近中）からの脱出解
    LosConvergent,
    /// LoS 中（離反中）からの脱出解
    LosDivergent,
}

impl ResolutionKind {
    /// 数値コード（`None` = -1 ... `LosDivergent` = 3）
    pub fn code(self) -> i32 {
        match self {
            ResolutionKind::None => -1,
            ResolutionKind::Unnecessary => 0,
            ResolutionKind::Conflict => 1,
            ResolutionKind::LosConvergent => 2,
            ResolutionKind::LosDivergent => 3,
        }
    }

    /// 何らかの解（回避不要を含む）が得られたか
    pub fn is_solved(self) -> bool {
        self != ResolutionKind::None
    }
}

impl fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolutionKind::None => "None",
            ResolutionKind::Unnecessary => "Unnecessary",
            ResolutionKind::Conflict => "Conflict",
            ResolutionKind::LosConvergent => "LoSConv",
            ResolutionKind::LosDivergent => "LoSDivg",
        };
        write!(f, "{}", name)
    }
}

/// 回避解の探索パラメータ（内部単位）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionParams {
    /// NMAC 円柱の半径 [m]
    pub nmac_d: f64,
    /// NMAC 円柱の半高 [m]
    pub nmac_h: f64,
    /// LoS 脱出時の最小水平相対速度 [m/s]
    pub min_horizontal_exit_speed: f64,
    /// LoS 脱出時の最小垂直相対速度 [m/s]
    pub min_vertical_exit_speed: f64,
    pub min_gs: f64,
    pub max_gs: f64,
    pub max_vs: f64,
    /// 対地速度探索でこの距離以内に最接近する解を捨てる [m]
    pub gs_search_los_discard: f64,
    /// 方位探索の刻み [rad]
    pub trk_step: f64,
    /// 方位探索の最大変化量 [rad]
    pub trk_max: f64,
    /// 対地速度探索の刻み [m/s]
    pub gs_step: f64,
    pub repulsive_criterion: RepulsiveCriterion,
}

impl Default for ResolutionParams {
    fn default() -> Self {
        Self {
            nmac_d: from_unit(Unit::Foot, 500.0),
            nmac_h: from_unit(Unit::Foot, 100.0),
            min_horizontal_exit_speed: from_unit(Unit::Knot, 100.0),
            min_vertical_exit_speed: from_unit(Unit::FeetPerMinute, 1000.0),
            min_gs: from_unit(Unit::Knot, 150.0),
            max_gs: from_unit(Unit::Knot, 700.0),
            max_vs: from_unit(Unit::FeetPerMinute, 5000.0),
            gs_search_los_discard: from_unit(Unit::NauticalMile, 1.0),
            trk_step: from_unit(Unit::Degree, 1.0),
            trk_max: from_unit(Unit::Degree, 90.0),
            gs_step: from_unit(Unit::Knot, 10.0),
            repulsive_criterion: RepulsiveCriterion::New,
        }
    }
}

/// 回避解の合成器
///
/// 直近の計算結果（方位・対地速度・最適・昇降率）を保持します。
/// 計算のたびにすべての結果は上書きされます。
#[derive(Debug, Clone, Default)]
pub struct ConflictResolver {
    params: ResolutionParams,
    trk: Horizontal,
    gs: Horizontal,
    opt: Horizontal,
    vs: Vertical,
}

impl ConflictResolver {
    pub fn new(params: ResolutionParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn params(&self) -> &ResolutionParams {
        &self.params
    }

    pub fn set_params(&mut self, params: ResolutionParams) {
        self.params = params;
    }

    /// 方位のみの解
    pub fn trk(&self) -> Horizontal {
        self.trk
    }

    /// 対地速度のみの解
    pub fn gs(&self) -> Horizontal {
        self.gs
    }

    /// 最適（方位と対地速度の同時変更）解
    pub fn opt(&self) -> Horizontal {
        self.opt
    }

    /// 昇降率のみの解
    pub fn vs(&self) -> Vertical {
        self.vs
    }

    fn reset(&mut self) {
        self.trk = Horizontal::NoSolution;
        self.gs = Horizontal::NoSolution;
        self.opt = Horizontal::NoSolution;
        self.vs = Vertical::NoSolution;
    }

    /// 将来の衝突に対する回避解
    ///
    /// いずれかの解が得られれば真を返します。
    ///
    /// # 引数
    ///
    /// * `s` - 相対位置
    /// * `vo`, `vi` - 自機・侵入機速度
    /// * `d`, `h` - 円柱の半径と半高
    /// * `epsh`, `epsv` - 水平・垂直協調符号
    #[allow(clippy::too_many_arguments)]
    pub fn cr(&mut self, s: &Vect3, vo: &Velocity, vi: &Velocity, d: f64, h: f64, epsh: i32, epsv: i32) -> bool {
        self.reset();
        let nv = TangentLine::new(&s.vect2(), d, epsh);
        self.trk = trk_only(&nv, s, vo, vi, epsv, d, h);
        self.gs = gs_only(&nv, s, vo, vi, epsv, d, h);
        self.opt = opt_trk_gs(&nv, s, vo, vi, epsv, d, h);
        self.vs = vs_circle(s, vo, vi, epsv, d, h);
        self.any_defined()
    }

    /// LoS からの脱出解
    ///
    /// 水平相対位置が 0 の場合は水平探索を行いません。昇降率の解は常に求めます。
    pub fn losr_repulsive(&mut self, s: &Vect3, vo: &Velocity, vi: &Velocity, epsh: i32, epsv: i32) -> bool {
        self.reset();
        let p = &self.params;
        if !s.vect2().is_zero() {
            self.trk = losr_trk_iter(
                s,
                vo,
                vi,
                p.min_horizontal_exit_speed,
                p.trk_max,
                p.trk_step,
                epsh,
                p.repulsive_criterion,
            );
            self.gs = losr_gs_iter(s, vo, vi, &self.params, epsh);
        }
        let p = &self.params;
        self.vs = losr_vs_new(s, vo, vi, p.min_vertical_exit_speed, p.max_vs, p.nmac_d, p.nmac_h, epsv);
        self.any_defined()
    }

    /// 状況に応じた回避解
    ///
    /// 円柱 `(d, h)` で `[0, ∞)` の衝突判定を行い、LoS 中なら脱出解、
    /// 将来の衝突なら [`cr`](Self::cr)、衝突がなければ現在の速度をそのまま解とします。
    #[allow(clippy::too_many_arguments)]
    pub fn cr3d_repulsive(
        &mut self,
        s: &Vect3,
        vo: &Velocity,
        vi: &Velocity,
        d: f64,
        h: f64,
        epsh: i32,
        epsv: i32,
    ) -> ResolutionKind {
        self.reset();
        let vo2 = vo.vect2();
        if vo2.is_zero() || vi.vect2().is_zero() {
            return ResolutionKind::None;
        }
        let ld = cd3d::detection(s, vo, vi, d, h, 0.0, f64::INFINITY);
        if !ld.conflict() {
            self.trk = Horizontal::new(vo2);
            self.gs = Horizontal::new(vo2);
            self.opt = Horizontal::new(vo2);
            self.vs = Vertical::Speed(vo.z);
            return ResolutionKind::Unnecessary;
        }
        if almost_equals(ld.time_in(), 0.0) {
            return self.cr3d_repulsive_los(s, vo, vi, epsh, epsv);
        }
        if self.cr(s, vo, vi, d, h, epsh, epsv) {
            ResolutionKind::Conflict
        } else {
            ResolutionKind::None
        }
    }

    /// LoS からの脱出解のみを求める
    pub fn cr3d_repulsive_los(&mut self, s: &Vect3, vo: &Velocity, vi: &Velocity, epsh: i32, epsv: i32) -> ResolutionKind {
        if !self.losr_repulsive(s, vo, vi, epsh, epsv) {
            return ResolutionKind::None;
        }
        if s.dot(&(*vo - *vi)) > 0.0 {
            ResolutionKind::LosDivergent
        } else {
            ResolutionKind::LosConvergent
        }
    }

    fn any_defined(&self) -> bool {
        !self.trk.undef() || !self.gs.undef() || !self.opt.undef() || !self.vs.undef()
    }
}

/// 方位の反復探索
///
/// 斥力的な回転方向へ `step` ずつ方位を変え、水平に離反して相対速度が `minrelgs` を超えるか、
/// 斥力判定が崩れるか、変化量が `maxtrk` に達した時点の速度を返します。
#[allow(clippy::too_many_arguments)]
pub fn losr_trk_iter(
    s: &Vect3,
    vo: &Vect3,
    vi: &Vect3,
    minrelgs: f64,
    maxtrk: f64,
    step: f64,
    epsh: i32,
    crit: RepulsiveCriterion,
) -> Horizontal {
    if step <= 0.0 {
        return Horizontal::NoSolution;
    }
    let s2 = s.vect2();
    let vo2 = vo.vect2();
    let vi2 = vi.vect2();
    let dir = losr_trk_iter_dir(&s2, &vo2, &vi2, step, epsh, crit);
    if dir == 0 {
        return Horizontal::NoSolution;
    }
    let mut nvo = incr_trk_vect(&vo2, step, dir);
    if !horizontal_repulsive_criterion(&s2, &vo2, &vi2, &nvo, epsh, crit) {
        return Horizontal::NoSolution;
    }
    let steps = (maxtrk / step).ceil().max(1.0) as usize;
    for i in 1..=steps {
        let nvop = incr_trk_vect(&nvo, step, dir);
        if i as f64 * step >= maxtrk || !horizontal_repulsive_criterion(&s2, &nvo, &vi2, &nvop, epsh, crit) {
            return Horizontal::new(nvo);
        }
        if divergent_horiz_gt(&s2, &(nvop - vi2), minrelgs) {
            return Horizontal::new(nvop);
        }
        nvo = nvop;
    }
    Horizontal::new(nvo)
}

/// 対地速度の反復探索
///
/// 探索範囲は `[max(|vo|/2, min_gs), min(2|vo|, max_gs)]` です（`|vo|` は3次元の速さ）。得られた解でも、
/// 将来の最接近距離が `gs_search_los_discard` 以下なら捨てます。
pub fn losr_gs_iter(s: &Vect3, vo: &Vect3, vi: &Vect3, params: &ResolutionParams, epsh: i32) -> Horizontal {
    const GS_LOS_FACTOR: f64 = 2.0;
    let min_gs = (vo.norm() / GS_LOS_FACTOR).max(params.min_gs);
    let max_gs = (GS_LOS_FACTOR * vo.norm()).min(params.max_gs);
    let nvo = losr_gs_iter_aux(
        s,
        vo,
        vi,
        params.min_horizontal_exit_speed,
        min_gs,
        max_gs,
        params.gs_step,
        epsh,
        params.repulsive_criterion,
    );
    let Some(nvo2) = nvo.velocity() else {
        return nvo;
    };
    let nvo3 = Vect3::from_vect2(nvo2, vo.z);
    if tau(s, &nvo3, vi) <= 0.0 || dist_at_tau(s, &nvo3, vi, true) > params.gs_search_los_discard {
        nvo
    } else {
        Horizontal::NoSolution
    }
}

#[allow(clippy::too_many_arguments)]
fn losr_gs_iter_aux(
    s: &Vect3,
    vo: &Vect3,
    vi: &Vect3,
    minrelgs: f64,
    min_gs: f64,
    max_gs: f64,
    step: f64,
    epsh: i32,
    crit: RepulsiveCriterion,
) -> Horizontal {
    if step <= 0.0 {
        return Horizontal::NoSolution;
    }
    let s2 = s.vect2();
    let vo2 = vo.vect2();
    let vi2 = vi.vect2();
    let dir = losr_gs_iter_dir(&s2, &vo2, &vi2, min_gs, max_gs, step, epsh, crit);
    if dir == 0 {
        return Horizontal::NoSolution;
    }
    let mut nvo = incr_gs_vect(&vo2, step, dir);
    if !horizontal_repulsive_criterion(&s2, &vo2, &vi2, &nvo, epsh, crit) {
        return Horizontal::NoSolution;
    }
    let steps = ((max_gs - min_gs) / step).max(0.0).ceil() as usize + 1;
    for _ in 0..steps {
        let nvop = incr_gs_vect(&nvo, step, dir);
        let nnorm = nvo.norm() + dir as f64 * step;
        if nnorm > max_gs || nnorm < min_gs || !horizontal_repulsive_criterion(&s2, &nvo, &vi2, &nvop, epsh, crit) {
            return Horizontal::new(nvo);
        }
        if divergent_horiz_gt(&s2, &(nvop - vi2), minrelgs) {
            return Horizontal::new(nvop);
        }
        nvo = nvop;
    }
    Horizontal::new(nvo)
}

/// LoS 脱出用の昇降率
///
/// NMAC 円柱（半高は `2·ca_h` に拡大）との衝突が残る場合はそれを避ける昇降率を、
/// それ以外は最小相対昇降率 `minrelvs` を確保する昇降率を返します。いずれも `maxvs` で制限します。
#[allow(clippy::too_many_arguments)]
pub fn losr_vs_new(
    s: &Vect3,
    vo: &Velocity,
    vi: &Velocity,
    minrelvs: f64,
    maxvs: f64,
    ca_d: f64,
    ca_h: f64,
    epsv: i32,
) -> Vertical {
    const ALG_INNER_FACTOR: f64 = 2.0;
    let v = *vo - *vi;
    let e = epsv as f64;
    let nvz = if e * v.z <= 0.0 {
        e * minrelvs
    } else {
        e * minrelvs.max(v.z.abs())
    };
    let voz = nvz + vi.z;
    let voz = sign(voz) as f64 * voz.abs().min(maxvs);
    if !cd3d::cd3d(s, vo, vi, ca_d, ALG_INNER_FACTOR * ca_h) {
        return Vertical::Speed(voz);
    }
    if cd3d::los(s, ca_d, ca_h) {
        return Vertical::Speed(e * maxvs);
    }
    match vs_circle(s, vo, vi, epsv, ca_d, ALG_INNER_FACTOR * ca_h) {
        Vertical::NoSolution => Vertical::Speed(e * maxvs),
        Vertical::Speed(vz) if vz.abs() > maxvs => Vertical::Speed(sign(vz) as f64 * maxvs),
        Vertical::Speed(vz) if (vz - vi.z).abs() <= minrelvs => Vertical::Speed(voz),
        vso => vso,
    }
}
