//! CLI entry point for `cdgen` (§6.4): renders a scored song to a `.cdg`
//! byte stream.
//!
//! ```text
//! cdgen <score.json> [<out.cdg>] [duration_seconds] [reserved_start] [reference.cdg]
//! ```
//!
//! Exit codes: `0` success, `2` usage or invalid input.

use std::process::ExitCode;
use std::time::Instant;

use cdgen_core::config::{Config, PreludeMode};
use cdgen_core::score::Score;

fn usage() -> ! {
    eprintln!("usage: cdgen <score.json> [<out.cdg>] [duration_seconds] [reserved_start] [reference.cdg]");
    std::process::exit(2);
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::try_init().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        usage();
    }

    let score_path = &args[0];
    let out_path = args.get(1).cloned().unwrap_or_else(|| "out.cdg".to_string());
    let duration_seconds: f64 = args.get(2).map_or(Ok(60.0), |s| s.parse()).unwrap_or_else(|_| usage());
    let reference_cdg_path = args.get(4).cloned();

    tracing::info!(score = %score_path, out = %out_path, duration_seconds, "starting render");

    let score_text = match std::fs::read_to_string(score_path) {
        Ok(text) => text,
        Err(err) => {
            tracing::error!(%err, path = %score_path, "failed to read score file");
            return ExitCode::from(2);
        }
    };

    let score: Score = match serde_json::from_str(&score_text) {
        Ok(score) => score,
        Err(err) => {
            tracing::error!(%err, "failed to parse score JSON");
            return ExitCode::from(2);
        }
    };

    let mut config = Config::default();
    if reference_cdg_path.is_some() {
        config.prelude_mode = PreludeMode::CopyReference;
        config.reference_cdg_path = reference_cdg_path;
    }

    let duration_ms = (duration_seconds * 1000.0).round() as u64;
    let started = Instant::now();

    let bytes = match cdgen_core::render_to_bytes(&score, &config, duration_ms) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!(%err, "render failed");
            return ExitCode::from(2);
        }
    };

    if let Err(err) = std::fs::write(&out_path, &bytes) {
        tracing::error!(%err, path = %out_path, "failed to write output file");
        return ExitCode::from(2);
    }

    tracing::info!(
        packets = bytes.len() / 24,
        bytes = bytes.len(),
        elapsed_ms = started.elapsed().as_millis(),
        "render finished"
    );

    ExitCode::SUCCESS
}
