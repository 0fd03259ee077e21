//! # シナリオ設定
//!
//! 遭遇シナリオ（YAML）の読み込みと検証を行います。
//! シナリオ内の値はすべて表示単位（nmi, ft, kn, fpm, deg）で記述し、
//! 検知器や回避パラメータを生成する時点で内部単位へ変換します。

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::{CylinderDetector, Detection3D, Detector, TcasDetector, WcvTable, WellClearDetector};
use crate::geometry::units::{from_unit, to_unit};
use crate::geometry::{Unit, UnitError, Vect3, Velocity};
use crate::resolution::{RepulsiveCriterion, ResolutionParams};

/// シナリオメタデータ
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub version: String,
}

/// 先読み区間 `[b_s, t_s]`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct LookaheadConfig {
    pub b_s: f64,
    pub t_s: f64,
}

impl Default for LookaheadConfig {
    fn default() -> Self {
        Self { b_s: 0.0, t_s: 180.0 }
    }
}

/// ログ出力に使う表示単位
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportUnits {
    pub distance: String,
    pub altitude: String,
    pub speed: String,
    pub vertical_speed: String,
}

impl Default for ReportUnits {
    fn default() -> Self {
        Self {
            distance: "nmi".to_string(),
            altitude: "ft".to_string(),
            speed: "kn".to_string(),
            vertical_speed: "fpm".to_string(),
        }
    }
}

/// 解析済みの表示単位
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedUnits {
    pub distance: Unit,
    pub altitude: Unit,
    pub speed: Unit,
    pub vertical_speed: Unit,
}

impl ReportUnits {
    pub fn resolve(&self) -> Result<ResolvedUnits, ScenarioError> {
        Ok(ResolvedUnits {
            distance: self.distance.parse()?,
            altitude: self.altitude.parse()?,
            speed: self.speed.parse()?,
            vertical_speed: self.vertical_speed.parse()?,
        })
    }
}

/// TCAS の閾値表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TcasTableKind {
    Ra,
    Ta,
}

/// 検知器設定
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetectorConfig {
    Cylinder {
        #[serde(default)]
        id: String,
        d_nmi: f64,
        h_ft: f64,
    },
    Tcas {
        #[serde(default)]
        id: String,
        table: TcasTableKind,
    },
    WellClear {
        #[serde(default)]
        id: String,
        dthr_ft: f64,
        zthr_ft: f64,
        tthr_s: f64,
        #[serde(default)]
        tcoa_s: f64,
    },
}

impl DetectorConfig {
    /// 内部単位の検知器を生成
    pub fn build(&self) -> Detector {
        let (mut det, id): (Detector, &str) = match self {
            DetectorConfig::Cylinder { id, d_nmi, h_ft } => (
                CylinderDetector::with_units(*d_nmi, Unit::NauticalMile, *h_ft, Unit::Foot).into(),
                id,
            ),
            DetectorConfig::Tcas { id, table } => {
                let tcas = match table {
                    TcasTableKind::Ra => TcasDetector::tcasii_ra(),
                    TcasTableKind::Ta => TcasDetector::tcasii_ta(),
                };
                (tcas.into(), id)
            }
            DetectorConfig::WellClear {
                id,
                dthr_ft,
                zthr_ft,
                tthr_s,
                tcoa_s,
            } => {
                let table = WcvTable::new(
                    from_unit(Unit::Foot, *dthr_ft),
                    from_unit(Unit::Foot, *zthr_ft),
                    *tthr_s,
                    *tcoa_s,
                );
                (WellClearDetector::new(table).into(), id)
            }
        };
        det.set_identifier(id);
        det
    }

    fn validate(&self) -> Result<(), ScenarioError> {
        match self {
            DetectorConfig::Cylinder { d_nmi, h_ft, .. } => {
                if !(*d_nmi > 0.0 && *h_ft > 0.0) {
                    return Err(ScenarioError::Validation(format!(
                        "cylinder thresholds must be positive (d_nmi = {}, h_ft = {})",
                        d_nmi, h_ft
                    )));
                }
            }
            DetectorConfig::Tcas { .. } => {}
            DetectorConfig::WellClear {
                dthr_ft,
                zthr_ft,
                tthr_s,
                tcoa_s,
                ..
            } => {
                if !(*dthr_ft > 0.0 && *zthr_ft > 0.0 && *tthr_s >= 0.0 && *tcoa_s >= 0.0) {
                    return Err(ScenarioError::Validation(
                        "well_clear thresholds must be non-negative and DTHR/ZTHR positive".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// 回避パラメータの上書き（表示単位）
///
/// 指定のない項目は [`ResolutionParams::default`] の値を使います。
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolutionConfig {
    pub nmac_d_ft: Option<f64>,
    pub nmac_h_ft: Option<f64>,
    pub min_horizontal_exit_speed_kn: Option<f64>,
    pub min_vertical_exit_speed_fpm: Option<f64>,
    pub min_gs_kn: Option<f64>,
    pub max_gs_kn: Option<f64>,
    pub max_vs_fpm: Option<f64>,
    pub gs_search_los_discard_nmi: Option<f64>,
    pub trk_step_deg: Option<f64>,
    pub trk_max_deg: Option<f64>,
    pub gs_step_kn: Option<f64>,
    pub repulsive_criterion: Option<RepulsiveCriterion>,
}

impl ResolutionConfig {
    /// 内部単位のパラメータへ変換
    pub fn to_params(&self) -> ResolutionParams {
        let mut p = ResolutionParams::default();
        let set = |dst: &mut f64, val: Option<f64>, unit: Unit| {
            if let Some(v) = val {
                *dst = from_unit(unit, v);
            }
        };
        set(&mut p.nmac_d, self.nmac_d_ft, Unit::Foot);
        set(&mut p.nmac_h, self.nmac_h_ft, Unit::Foot);
        set(&mut p.min_horizontal_exit_speed, self.min_horizontal_exit_speed_kn, Unit::Knot);
        set(&mut p.min_vertical_exit_speed, self.min_vertical_exit_speed_fpm, Unit::FeetPerMinute);
        set(&mut p.min_gs, self.min_gs_kn, Unit::Knot);
        set(&mut p.max_gs, self.max_gs_kn, Unit::Knot);
        set(&mut p.max_vs, self.max_vs_fpm, Unit::FeetPerMinute);
        set(&mut p.gs_search_los_discard, self.gs_search_los_discard_nmi, Unit::NauticalMile);
        set(&mut p.trk_step, self.trk_step_deg, Unit::Degree);
        set(&mut p.trk_max, self.trk_max_deg, Unit::Degree);
        set(&mut p.gs_step, self.gs_step_kn, Unit::Knot);
        if let Some(crit) = self.repulsive_criterion {
            p.repulsive_criterion = crit;
        }
        p
    }

    fn validate(&self) -> Result<(), ScenarioError> {
        let positive = [
            ("trk_step_deg", self.trk_step_deg),
            ("trk_max_deg", self.trk_max_deg),
            ("gs_step_kn", self.gs_step_kn),
            ("max_gs_kn", self.max_gs_kn),
            ("max_vs_fpm", self.max_vs_fpm),
        ];
        for (name, val) in positive {
            if val.is_some_and(|v| !(v.is_finite() && v > 0.0)) {
                return Err(ScenarioError::Validation(format!("{} must be finite and positive", name)));
            }
        }
        let non_negative = [
            ("nmac_d_ft", self.nmac_d_ft),
            ("nmac_h_ft", self.nmac_h_ft),
            ("min_horizontal_exit_speed_kn", self.min_horizontal_exit_speed_kn),
            ("min_vertical_exit_speed_fpm", self.min_vertical_exit_speed_fpm),
            ("min_gs_kn", self.min_gs_kn),
            ("gs_search_los_discard_nmi", self.gs_search_los_discard_nmi),
        ];
        for (name, val) in non_negative {
            if val.is_some_and(|v| !(v.is_finite() && v >= 0.0)) {
                return Err(ScenarioError::Validation(format!("{} must be finite and non-negative", name)));
            }
        }
        // 省略された側は既定値と比べる
        let p = self.to_params();
        if p.min_gs > p.max_gs {
            return Err(ScenarioError::Validation(format!(
                "min_gs_kn {} exceeds max_gs_kn {}",
                to_unit(Unit::Knot, p.min_gs),
                to_unit(Unit::Knot, p.max_gs)
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PositionConfig {
    pub x_m: f64,
    pub y_m: f64,
    pub z_m: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VelocityConfig {
    pub trk_deg: f64,
    pub gs_kn: f64,
    #[serde(default)]
    pub vs_fpm: f64,
}

/// 航空機の状態
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AircraftConfig {
    pub id: String,
    pub position: PositionConfig,
    pub velocity: VelocityConfig,
}

impl AircraftConfig {
    pub fn position(&self) -> Vect3 {
        Vect3::new(self.position.x_m, self.position.y_m, self.position.z_m)
    }

    /// 内部単位の速度ベクトル
    pub fn velocity(&self) -> Velocity {
        Vect3::from_trk_gs_vs(
            from_unit(Unit::Degree, self.velocity.trk_deg),
            from_unit(Unit::Knot, self.velocity.gs_kn),
            from_unit(Unit::FeetPerMinute, self.velocity.vs_fpm),
        )
    }
}

/// 遭遇（自機と侵入機の組）
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EncounterConfig {
    pub id: String,
    pub ownship: AircraftConfig,
    pub intruder: AircraftConfig,
}

/// 完全なシナリオ設定
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    #[serde(default)]
    pub lookahead: LookaheadConfig,
    #[serde(default)]
    pub report_units: ReportUnits,
    pub detectors: Vec<DetectorConfig>,
    #[serde(default)]
    pub resolution: ResolutionConfig,
    pub encounters: Vec<EncounterConfig>,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path).map_err(|e| ScenarioError::Io(path.to_path_buf(), e))?;

        let config: ScenarioConfig =
            serde_yaml::from_str(&contents).map_err(|e| ScenarioError::Parse(path.to_path_buf(), e))?;

        config.validate()?;

        Ok(config)
    }

    /// YAML文字列から読み込み（検証込み）
    pub fn from_yaml_str(contents: &str) -> Result<Self, ScenarioError> {
        let config: ScenarioConfig =
            serde_yaml::from_str(contents).map_err(|e| ScenarioError::Parse(PathBuf::from("<string>"), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// 設定の検証
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let la = &self.lookahead;
        if !(la.b_s >= 0.0) {
            return Err(ScenarioError::Validation(format!("lookahead b_s must be >= 0 (got {})", la.b_s)));
        }
        if !(la.t_s > la.b_s) {
            return Err(ScenarioError::Validation(format!(
                "lookahead t_s {} must be greater than b_s {}",
                la.t_s, la.b_s
            )));
        }

        self.report_units.resolve()?;

        if self.detectors.is_empty() {
            return Err(ScenarioError::Validation("at least one detector is required".to_string()));
        }
        for det in &self.detectors {
            det.validate()?;
        }

        self.resolution.validate()?;

        let mut ids = HashSet::new();
        for enc in &self.encounters {
            if !ids.insert(enc.id.as_str()) {
                return Err(ScenarioError::Validation(format!("duplicate encounter id: {}", enc.id)));
            }
            if enc.ownship.id == enc.intruder.id {
                return Err(ScenarioError::Validation(format!(
                    "encounter {}: ownship and intruder share id {}",
                    enc.id, enc.ownship.id
                )));
            }
            if enc.ownship.velocity.gs_kn < 0.0 || enc.intruder.velocity.gs_kn < 0.0 {
                return Err(ScenarioError::Validation(format!(
                    "encounter {}: ground speed must be non-negative",
                    enc.id
                )));
            }
        }

        Ok(())
    }

    /// 設定された検知器を生成
    pub fn build_detectors(&self) -> Vec<Detector> {
        self.detectors.iter().map(DetectorConfig::build).collect()
    }

    /// 回避計算に使う円柱（最初の円柱検知器、なければ既定値）
    pub fn resolution_cylinder(&self) -> CylinderDetector {
        self.build_detectors()
            .into_iter()
            .find_map(|d| match d {
                Detector::Cylinder(c) => Some(c),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== 先読み区間 ===");
        println!("[{:.1}, {:.1}] 秒", self.lookahead.b_s, self.lookahead.t_s);
        println!();

        println!("=== 検知器 ===");
        for det in self.build_detectors() {
            println!("  {}", det);
        }
        println!();

        println!("=== 遭遇 ===");
        println!("遭遇数: {}", self.encounters.len());
        for enc in &self.encounters {
            println!("  {}: {} vs {}", enc.id, enc.ownship.id, enc.intruder.id);
        }
    }
}

/// シナリオ読み込みエラー
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("シナリオファイルが見つかりません: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("ファイル読み込みエラー {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("YAML解析エラー {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] serde_yaml::Error),
    #[error("設定検証エラー: {0}")]
    Validation(String),
    #[error("単位エラー: {0}")]
    UnknownUnit(#[from] UnitError),
}
