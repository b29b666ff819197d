use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use qrcode::EcLevel;
use serde::Deserialize;

use crate::util;

pub const DEFAULT_CONFIG_PATH: &str = "tubeqr.toml";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub output_root: PathBuf,

    pub ytdlp_bin: PathBuf,
    pub ytdlp_path: String,
    // Explicit yt-dlp proxy (e.g. socks5://127.0.0.1:7890).
    pub ytdlp_proxy: Option<String>,
    // Whether to let yt-dlp inherit http_proxy/https_proxy from our environment.
    pub inherit_proxy_env: bool,

    // At most one of these is set; only needed for private playlists.
    pub cookies_file: Option<PathBuf>,
    pub cookies_browser: Option<String>,

    // Pixels per QR module.
    pub qr_module_size: u32,
    pub qr_ec_level: EcLevel,

    // In characters; util::MAX_TITLE_BYTES caps the byte length as well.
    pub max_title_len: usize,
    pub empty_title_fallback: String,

    pub strict: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AppConfigFile {
    output_root: Option<String>,

    ytdlp_bin: Option<String>,
    ytdlp_path: Option<String>,
    ytdlp_proxy: Option<String>,
    inherit_proxy_env: Option<bool>,

    cookies_file: Option<String>,
    cookies_browser: Option<String>,

    qr_module_size: Option<u32>,
    qr_ec_level: Option<String>,

    max_title_len: Option<usize>,
    empty_title_fallback: Option<String>,

    strict: Option<bool>,
}

fn default_ytdlp_path() -> String {
    // Inherit PATH so a yt-dlp installed via pip/brew is found; override in the config file.
    std::env::var("PATH").unwrap_or_else(|_| {
        "/opt/homebrew/bin:/usr/local/bin:/usr/bin:/bin:/usr/sbin:/sbin".to_string()
    })
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.and_then(|s| {
        let s = s.trim().to_string();
        if s.is_empty() { None } else { Some(s) }
    })
}

fn parse_ec_level(s: &str) -> Result<EcLevel> {
    match s.trim().to_ascii_uppercase().as_str() {
        "L" => Ok(EcLevel::L),
        "M" => Ok(EcLevel::M),
        "Q" => Ok(EcLevel::Q),
        "H" => Ok(EcLevel::H),
        other => Err(anyhow!("Invalid qr_ec_level: {} (expected: L|M|Q|H)", other)),
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).with_context(|| {
            format!(
                "Failed to read config file: {}",
                path.to_string_lossy().as_ref()
            )
        })?;

        Self::parse(&raw)
            .with_context(|| format!("Failed to parse {}", path.to_string_lossy().as_ref()))
    }

    /// Loads `path` if it exists. A missing file is only an error when the
    /// user named it explicitly; otherwise built-in defaults are used.
    pub fn load_or_default(path: impl AsRef<Path>, explicit: bool) -> Result<Self> {
        let path = path.as_ref();
        if !explicit && !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Self::from_file(AppConfigFile::default());
        }
        Self::load(path)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let file: AppConfigFile = toml::from_str(raw).context("Invalid TOML")?;
        Self::from_file(file)
    }

    fn from_file(file: AppConfigFile) -> Result<Self> {
        let qr_ec_level = match file.qr_ec_level.as_deref() {
            Some(s) => parse_ec_level(s)?,
            None => EcLevel::M,
        };

        let cfg = Self {
            output_root: PathBuf::from(
                non_empty(file.output_root).unwrap_or_else(|| "youtube_qr_codes".to_string()),
            ),

            ytdlp_bin: PathBuf::from(file.ytdlp_bin.unwrap_or_else(|| "yt-dlp".to_string())),
            ytdlp_path: file.ytdlp_path.unwrap_or_else(default_ytdlp_path),
            ytdlp_proxy: non_empty(file.ytdlp_proxy),
            inherit_proxy_env: file.inherit_proxy_env.unwrap_or(false),

            cookies_file: non_empty(file.cookies_file).map(PathBuf::from),
            cookies_browser: non_empty(file.cookies_browser),

            qr_module_size: file.qr_module_size.unwrap_or(10),
            qr_ec_level,

            max_title_len: file.max_title_len.unwrap_or(100),
            empty_title_fallback: file
                .empty_title_fallback
                .unwrap_or_else(|| "untitled".to_string()),

            strict: file.strict.unwrap_or(false),
        };

        if cfg.cookies_file.is_some() && cfg.cookies_browser.is_some() {
            return Err(anyhow!(
                "cookies_file and cookies_browser are mutually exclusive"
            ));
        }
        if cfg.qr_module_size == 0 {
            return Err(anyhow!("qr_module_size must be at least 1"));
        }
        if cfg.max_title_len == 0 {
            return Err(anyhow!("max_title_len must be at least 1"));
        }
        // The fallback is used as-is in filenames, so it must survive sanitizing unchanged.
        let fallback = &cfg.empty_title_fallback;
        if fallback.is_empty()
            || util::sanitize_filename_component(fallback, cfg.max_title_len, "") != *fallback
        {
            return Err(anyhow!(
                "Invalid empty_title_fallback: {:?} (must be a non-empty, filename-safe string)",
                fallback
            ));
        }

        Ok(cfg)
    }
}
