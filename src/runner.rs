//! # Runner モジュール
//!
//! シナリオ内の各遭遇に対して、設定されたすべての検知器と回避解の合成器を実行します。
//!
//! ## 処理順序
//!
//! 遭遇ごとに以下を順に行います。
//!
//! 1. **状態の変換**: 表示単位の位置・速度を内部単位の相対状態へ変換
//! 2. **検知**: 各検知器で現在の違反と先読み区間内の衝突を判定
//! 3. **協調符号**: 水平・垂直の協調符号を決定
//! 4. **回避**: 回避用の円柱に対して回避解を合成
//!
//! 遭遇は互いに独立で、逐次的に評価します。

use tracing::{debug, info, trace, warn};

use crate::detection::{ConflictData, Detection3D, Detector, Horizontal, Vertical};
use crate::geometry::units::to_unit;
use crate::geometry::Vect3;
use crate::resolution::criteria::{horizontal_coordination, vertical_coordination};
use crate::resolution::{ConflictResolver, ResolutionKind};
use crate::scenario::{EncounterConfig, ResolvedUnits, ScenarioConfig, ScenarioError};

/// 1検知器の判定結果
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionOutcome {
    pub detector: String,
    pub violation: bool,
    pub data: ConflictData,
}

/// 回避解の合成結果
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionOutcome {
    pub kind: ResolutionKind,
    pub epsh: i32,
    pub epsv: i32,
    pub trk: Horizontal,
    pub gs: Horizontal,
    pub opt: Horizontal,
    pub vs: Vertical,
}

/// 1遭遇の評価結果
#[derive(Debug, Clone, PartialEq)]
pub struct EncounterReport {
    pub id: String,
    pub detections: Vec<DetectionOutcome>,
    pub resolution: ResolutionOutcome,
}

impl EncounterReport {
    /// いずれかの検知器が衝突を検知したか
    pub fn any_conflict(&self) -> bool {
        self.detections.iter().any(|d| d.data.conflict())
    }
}

pub struct EncounterRunner {
    scenario: ScenarioConfig,
    detectors: Vec<Detector>,
    resolver: ConflictResolver,
    units: ResolvedUnits,
    verbose_level: u8,
}

impl EncounterRunner {
    /// シナリオから評価器を生成
    ///
    /// 表示単位の解析に失敗した場合はエラーを返します。
    pub fn new(scenario: ScenarioConfig, verbose_level: u8) -> Result<Self, ScenarioError> {
        let units = scenario.report_units.resolve()?;
        let detectors = scenario.build_detectors();
        let resolver = ConflictResolver::new(scenario.resolution.to_params());
        Ok(Self {
            scenario,
            detectors,
            resolver,
            units,
            verbose_level,
        })
    }

    pub fn detectors(&self) -> &[Detector] {
        &self.detectors
    }

    /// 全遭遇を評価
    pub fn run(&mut self) -> Vec<EncounterReport> {
        info!(
            scenario = %self.scenario.meta.name,
            encounters = self.scenario.encounters.len(),
            detectors = self.detectors.len(),
            lookahead_b = self.scenario.lookahead.b_s,
            lookahead_t = self.scenario.lookahead.t_s,
            "RUN_STARTED: 遭遇評価を開始します"
        );

        let encounters = self.scenario.encounters.clone();
        let reports: Vec<EncounterReport> = encounters.iter().map(|enc| self.evaluate(enc)).collect();

        let conflicts = reports.iter().filter(|r| r.any_conflict()).count();
        info!(
            scenario = %self.scenario.meta.name,
            encounters = reports.len(),
            conflicts,
            "RUN_COMPLETED: 遭遇評価が完了しました"
        );
        reports
    }

    /// 1遭遇を評価
    pub fn evaluate(&mut self, enc: &EncounterConfig) -> EncounterReport {
        let so = enc.ownship.position();
        let vo = enc.ownship.velocity();
        let si = enc.intruder.position();
        let vi = enc.intruder.velocity();
        let s = so - si;
        let (b, t) = (self.scenario.lookahead.b_s, self.scenario.lookahead.t_s);

        if self.verbose_level > 1 {
            trace!(
                encounter_id = %enc.id,
                relative_x = s.x,
                relative_y = s.y,
                relative_z = s.z,
                ownship_velocity = %vo,
                intruder_velocity = %vi,
                "ENCOUNTER_STATE: 相対状態"
            );
        }

        let detections = self
            .detectors
            .iter()
            .map(|det| {
                let violation = det.violation(&so, &vo, &si, &vi);
                let data = det.conflict_detection(&so, &vo, &si, &vi, b, t);
                self.log_detection(&enc.id, det, violation, &data);
                DetectionOutcome {
                    detector: det.to_string(),
                    violation,
                    data,
                }
            })
            .collect();

        let resolution = self.resolve(enc, &s, &vo, &vi);

        EncounterReport {
            id: enc.id.clone(),
            detections,
            resolution,
        }
    }

    fn resolve(&mut self, enc: &EncounterConfig, s: &Vect3, vo: &Vect3, vi: &Vect3) -> ResolutionOutcome {
        let cyl = self.scenario.resolution_cylinder();
        let (d, h) = (cyl.horizontal_separation(), cyl.vertical_separation());
        let params = self.resolver.params();
        let nmac = (params.nmac_d, params.nmac_h);

        let epsh = horizontal_coordination(&s.vect2(), &(*vo - *vi).vect2());
        let epsv = vertical_coordination(s, vo, vi, d, h, &enc.ownship.id, &enc.intruder.id, nmac);
        debug!(encounter_id = %enc.id, epsh, epsv, "COORDINATION: 協調符号を決定しました");

        let kind = self.resolver.cr3d_repulsive(s, vo, vi, d, h, epsh, epsv);
        let outcome = ResolutionOutcome {
            kind,
            epsh,
            epsv,
            trk: self.resolver.trk(),
            gs: self.resolver.gs(),
            opt: self.resolver.opt(),
            vs: self.resolver.vs(),
        };
        self.log_resolution(&enc.id, &outcome);
        outcome
    }

    fn log_detection(&self, encounter_id: &str, det: &Detector, violation: bool, data: &ConflictData) {
        let u = &self.units;
        if violation {
            warn!(
                encounter_id = %encounter_id,
                detector = det.simple_class_name(),
                detector_id = det.identifier(),
                horizontal_distance = to_unit(u.distance, data.hmd(0.0)),
                vertical_distance = to_unit(u.altitude, data.vmd(0.0)),
                "LOSS_OF_SEPARATION: 保護領域内にあります"
            );
        }
        if data.conflict() {
            info!(
                encounter_id = %encounter_id,
                detector = det.simple_class_name(),
                detector_id = det.identifier(),
                time_in = data.time_in(),
                time_out = data.time_out(),
                critical_time = data.critical_time(),
                horizontal_miss_distance = to_unit(u.distance, data.hmd(data.critical_time())),
                vertical_miss_distance = to_unit(u.altitude, data.vmd(data.critical_time())),
                horizontal_closure_rate = to_unit(u.speed, data.horizontal_closure_rate()),
                vertical_closure_rate = to_unit(u.vertical_speed, data.vertical_closure_rate()),
                "CONFLICT_DETECTED: 先読み区間内に衝突があります"
            );
        } else if self.verbose_level > 0 {
            debug!(
                encounter_id = %encounter_id,
                detector = det.simple_class_name(),
                detector_id = det.identifier(),
                "NO_CONFLICT: 衝突はありません"
            );
        }
    }

    fn log_resolution(&self, encounter_id: &str, r: &ResolutionOutcome) {
        let u = &self.units;
        let speed = |h: &Horizontal| h.velocity().map(|v| to_unit(u.speed, v.norm()));
        let track = |h: &Horizontal| h.velocity().map(|v| v.trk().to_degrees().rem_euclid(360.0));
        match r.kind {
            ResolutionKind::None => {
                warn!(
                    encounter_id = %encounter_id,
                    epsh = r.epsh,
                    epsv = r.epsv,
                    "NO_RESOLUTION: 回避解が見つかりません"
                );
            }
            ResolutionKind::Unnecessary => {
                debug!(encounter_id = %encounter_id, "RESOLUTION_UNNECESSARY: 回避は不要です");
            }
            kind => {
                info!(
                    encounter_id = %encounter_id,
                    kind = %kind,
                    code = kind.code(),
                    epsh = r.epsh,
                    epsv = r.epsv,
                    trk_deg = ?track(&r.trk),
                    gs = ?speed(&r.gs),
                    opt_trk_deg = ?track(&r.opt),
                    opt_gs = ?speed(&r.opt),
                    vs = ?r.vs.speed().map(|vz| to_unit(u.vertical_speed, vz)),
                    "RESOLUTION_COMPUTED: 回避解を合成しました"
                );
            }
        }
    }
}

/// 評価結果の要約を表示
pub fn print_reports(reports: &[EncounterReport]) {
    println!("=== 評価結果 ===");
    for r in reports {
        println!("遭遇 {}:", r.id);
        for d in &r.detections {
            if d.data.conflict() {
                println!(
                    "  {} -> 衝突 [{:.2}, {:.2}] 秒{}",
                    d.detector,
                    d.data.time_in(),
                    d.data.time_out(),
                    if d.violation { " (違反中)" } else { "" }
                );
            } else {
                println!("  {} -> 衝突なし", d.detector);
            }
        }
        let res = &r.resolution;
        println!(
            "  回避: {} (trk = {}, gs = {}, opt = {}, vs = {})",
            res.kind, res.trk, res.gs, res.opt, res.vs
        );
    }
}
