use std::io;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

mod config;
mod error;
mod input;
mod models;
mod pipeline;
mod progress;
mod qr;
mod render;
mod run;
mod util;
mod ytdlp;

use crate::config::AppConfig;
use crate::error::TubeQrError;
use crate::models::RunSummary;
use crate::qr::PngQrRenderer;
use crate::ytdlp::YtDlp;

const USAGE: &str = "\
Usage: tubeqr [--config FILE] [--output DIR] [--strict] [URL]

  URL            YouTube playlist or video link (prompted for when omitted)
  --config FILE  TOML config file (default: tubeqr.toml, optional)
  --output DIR   Output root (default: youtube_qr_codes)
  --strict       Exit with code 2 when any QR code fails
  -h, --help     Show this help";

#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    strict: bool,
    url: Option<String>,
    help: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => parsed.help = true,
            "--strict" => parsed.strict = true,
            "--config" => {
                let v = args.next().ok_or_else(|| anyhow!("--config needs a value"))?;
                parsed.config = Some(PathBuf::from(v));
            }
            "--output" => {
                let v = args.next().ok_or_else(|| anyhow!("--output needs a value"))?;
                parsed.output = Some(PathBuf::from(v));
            }
            s if s.starts_with("--") => return Err(anyhow!("unknown option: {}", s)),
            _ if parsed.url.is_some() => return Err(anyhow!("more than one URL given")),
            _ => parsed.url = Some(arg),
        }
    }

    Ok(parsed)
}

async fn run(cfg: &AppConfig, url_arg: Option<String>) -> Result<RunSummary, TubeQrError> {
    let url = match url_arg {
        Some(u) => input::normalize_url(&u)?,
        None => input::read_url(&mut io::stdin().lock(), &mut io::stdout())?,
    };

    let ytdlp = YtDlp::new(cfg);
    let qr = PngQrRenderer::from_config(cfg);
    let report = pipeline::run(cfg, &ytdlp, &qr, &url, io::stdout()).await?;
    log::debug!("run directory: {}", report.context.run_dir.display());
    Ok(report.summary)
}

// Per-entry failures only count when strict; fatal errors always do.
fn exit_code(result: &Result<RunSummary, TubeQrError>, strict: bool) -> i32 {
    match result {
        Ok(summary) if strict && !summary.all_succeeded() => 2,
        Ok(_) => 0,
        Err(_) => 1,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{:#}\n\n{}", e, USAGE);
            std::process::exit(1);
        }
    };
    if args.help {
        println!("{}", USAGE);
        return;
    }

    let explicit = args.config.is_some();
    let cfg_path = args
        .config
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_PATH));
    let mut cfg = match AppConfig::load_or_default(&cfg_path, explicit) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[CONFIG] Failed to load {}: {:#}", cfg_path.display(), e);
            std::process::exit(1);
        }
    };
    if let Some(out) = args.output {
        cfg.output_root = out;
    }
    cfg.strict |= args.strict;

    println!();
    println!("{}", "=".repeat(60));
    println!("TubeQR - YouTube Playlist QR Code Generator");
    println!("{}", "=".repeat(60));

    let result = run(&cfg, args.url).await;
    match &result {
        Ok(summary) => {
            println!();
            println!("{}", "=".repeat(60));
            if summary.all_succeeded() {
                println!("✨ All QR codes have been created!");
            } else {
                println!("⚠️  Completed with {} failed QR code(s)", summary.failed);
            }
            println!("{}", "=".repeat(60));
        }
        Err(e) => eprintln!("\n❌ {}", e),
    }

    let code = exit_code(&result, cfg.strict);
    std::process::exit(code);
}
