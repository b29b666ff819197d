use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

use crate::error::TubeQrError;

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
pub const QR_SUBDIR: &str = "qr_codes";
pub const OVERVIEW_FILE: &str = "overview.txt";

#[derive(Debug, Clone)]
pub struct RunContext {
    pub output_root: PathBuf,
    pub timestamp: String,
    pub run_dir: PathBuf,
    pub qr_dir: PathBuf,
    pub overview_path: PathBuf,
}

impl RunContext {
    // Second granularity: two runs in the same second share a directory.
    pub fn create<Tz: TimeZone>(root: &Path, now: &DateTime<Tz>) -> Result<Self, TubeQrError>
    where
        Tz::Offset: std::fmt::Display,
    {
        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        let run_dir = root.join(format!("playlist_{}", timestamp));
        let qr_dir = run_dir.join(QR_SUBDIR);

        fs::create_dir_all(&qr_dir).map_err(|source| TubeQrError::Directory {
            path: qr_dir.clone(),
            source,
        })?;
        log::debug!("created {}", qr_dir.display());

        Ok(Self {
            output_root: root.to_path_buf(),
            timestamp,
            overview_path: run_dir.join(OVERVIEW_FILE),
            run_dir,
            qr_dir,
        })
    }
}
