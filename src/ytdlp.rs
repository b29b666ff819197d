use std::collections::VecDeque;
use std::process::{Output, Stdio};

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::AppConfig;
use crate::error::FetchError;
use crate::models::{FlatEntry, VideoEntry};
use crate::util;

const STDERR_TAIL_LINES: usize = 50;

/// Lists the videos behind a playlist or video URL.
///
/// Implementations return entries in playlist order with 1-based indices.
/// An empty list is not an error at this level; the pipeline rejects it.
#[async_trait]
pub trait MetadataSource {
    async fn fetch_entries(&self, url: &str) -> Result<Vec<VideoEntry>, FetchError>;
}

pub struct YtDlp<'a> {
    cfg: &'a AppConfig,
}

impl<'a> YtDlp<'a> {
    pub fn new(cfg: &'a AppConfig) -> Self {
        Self { cfg }
    }

    fn base_command(&self) -> Command {
        let cfg = self.cfg;
        let mut cmd = Command::new(&cfg.ytdlp_bin);
        cmd.env("PATH", &cfg.ytdlp_path);

        if !cfg.inherit_proxy_env {
            // Avoid being accidentally bound to a dead local proxy (common in shell env).
            cmd.env_remove("http_proxy")
                .env_remove("https_proxy")
                .env_remove("HTTP_PROXY")
                .env_remove("HTTPS_PROXY")
                .env_remove("no_proxy")
                .env_remove("NO_PROXY");
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn flat_playlist_command(&self, url: &str) -> Command {
        let cfg = self.cfg;
        let mut cmd = self.base_command();

        if let Some(p) = &cfg.ytdlp_proxy {
            cmd.arg("--proxy").arg(p);
        }
        if let Some(f) = &cfg.cookies_file {
            cmd.arg("--cookies").arg(f);
        }
        if let Some(b) = &cfg.cookies_browser {
            cmd.arg("--cookies-from-browser").arg(b);
        }

        // --flat-playlist lists entries without resolving any stream.
        cmd.arg("--flat-playlist")
            .arg("--dump-json")
            .arg("--no-warnings")
            .arg("--")
            .arg(url);
        cmd
    }

    async fn run(&self, mut cmd: Command) -> Result<Output, FetchError> {
        log::debug!("running {:?}", cmd.as_std());
        let out = cmd.output().await.map_err(|source| FetchError::Spawn {
            bin: self.cfg.ytdlp_bin.display().to_string(),
            source,
        })?;

        if !out.status.success() {
            return Err(FetchError::Failed {
                status: out.status.to_string(),
                stderr_tail: stderr_tail(&out.stderr),
            });
        }
        Ok(out)
    }

    pub async fn version(&self) -> Result<String, FetchError> {
        let mut cmd = self.base_command();
        cmd.arg("--version");
        let out = self.run(cmd).await?;
        Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
    }
}

#[async_trait]
impl MetadataSource for YtDlp<'_> {
    async fn fetch_entries(&self, url: &str) -> Result<Vec<VideoEntry>, FetchError> {
        let version = self.version().await?;
        log::info!("using yt-dlp {}", version);

        let out = self.run(self.flat_playlist_command(url)).await?;
        parse_flat_playlist(&String::from_utf8_lossy(&out.stdout))
    }
}

pub fn parse_flat_playlist(stdout: &str) -> Result<Vec<VideoEntry>, FetchError> {
    let mut entries = Vec::new();

    for (n, line) in stdout.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let flat: FlatEntry =
            serde_json::from_str(line).map_err(|source| FetchError::Parse { line: n + 1, source })?;

        let Some(url) = canonical_url(&flat) else {
            log::warn!("skipping entry without id or url on line {}", n + 1);
            continue;
        };

        let index = entries.len() + 1;
        entries.push(VideoEntry {
            index,
            title: flat.title.unwrap_or_else(|| format!("Video {}", index)),
            url,
        });
    }

    Ok(entries)
}

fn is_youtube_entry(flat: &FlatEntry) -> bool {
    let key = flat.ie_key.as_deref().or(flat.extractor_key.as_deref());
    match key {
        Some(k) => k.to_ascii_lowercase().starts_with("youtube"),
        None => true,
    }
}

fn canonical_url(flat: &FlatEntry) -> Option<String> {
    if is_youtube_entry(flat) {
        if let Some(id) = flat.id.as_deref().filter(|id| !id.is_empty()) {
            return Some(util::watch_url(id));
        }
    }

    let raw = flat
        .webpage_url
        .as_deref()
        .or(flat.url.as_deref())
        .filter(|u| !u.trim().is_empty())?;

    if is_youtube_entry(flat) {
        if let Some(id) = util::video_id_from_url(raw) {
            return Some(util::watch_url(&id));
        }
    }
    Some(raw.trim().to_string())
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let mut tail: VecDeque<&str> = VecDeque::with_capacity(STDERR_TAIL_LINES);
    for line in text.lines().map(str::trim_end).filter(|l| !l.is_empty()) {
        if tail.len() >= STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }

    if tail.is_empty() {
        return "no stderr output captured".to_string();
    }
    tail.into_iter().collect::<Vec<_>>().join("\n")
}
