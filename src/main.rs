use std::process::ExitCode;

use clap::{Arg, ArgAction, Command};
use tracing::{error, info};

use daasim::logging::{init_logging, level_from_verbosity, LogConfig, LogOutput};
use daasim::runner::{print_reports, EncounterRunner};
use daasim::scenario::ScenarioConfig;

fn main() -> ExitCode {
    // コマンドライン引数の解析
    let matches = Command::new("daasim")
        .version(env!("CARGO_PKG_VERSION"))
        .about("衝突検知・回避評価 (Detect and Avoid)")
        .long_about(
            "遭遇シナリオに対して保護領域（円柱・TCAS・Well Clear）の衝突検知を行い、\n\
             協調的な回避解（方位・対地速度・昇降率）を合成します。",
        )
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
                .required(true),
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("詳細出力レベル (-v: 詳細, -vv: トレース)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .help("ログレベル（-v より優先）"),
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("TARGET")
                .value_parser(["console", "file", "both"])
                .default_value("console")
                .help("ログ出力先"),
        )
        .arg(
            Arg::new("log-dir")
                .long("log-dir")
                .value_name("DIR")
                .default_value("logs")
                .help("ログファイルのディレクトリ"),
        )
        .get_matches();

    let verbose_level = matches.get_count("verbose");
    let output = matches
        .get_one::<String>("log-output")
        .and_then(|s| s.parse::<LogOutput>().ok())
        .unwrap_or(LogOutput::Console);
    let log_config = LogConfig {
        level: level_from_verbosity(verbose_level, matches.get_one::<String>("log-level").map(String::as_str)),
        output,
        log_dir: matches
            .get_one::<String>("log-dir")
            .cloned()
            .unwrap_or_else(|| "logs".to_string()),
        ..LogConfig::default()
    };

    // ガードはプロセス終了まで保持
    let _guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("ログ初期化エラー: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let Some(scenario_path) = matches.get_one::<String>("scenario") else {
        return ExitCode::FAILURE;
    };

    match run_scenario(scenario_path, matches.get_flag("info"), verbose_level) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "SCENARIO_FAILED: シナリオ実行に失敗しました");
            eprintln!("エラー: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// シナリオファイルを読み込んで実行
fn run_scenario(scenario_path: &str, info_only: bool, verbose_level: u8) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = ScenarioConfig::from_file(scenario_path)?;
    info!(path = %scenario_path, name = %scenario.meta.name, "SCENARIO_LOADED: シナリオを読み込みました");

    if info_only {
        scenario.print_summary();
        return Ok(());
    }

    let mut runner = EncounterRunner::new(scenario, verbose_level)?;
    let reports = runner.run();
    print_reports(&reports);

    Ok(())
}
