use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TubeQrError {
    #[error("no URL given")]
    EmptyInput,

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("cannot create output directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write overview file {}: {source}", path.display())]
    Overview {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("cannot run {bin} ({source}); install it with: pip install yt-dlp")]
    Spawn {
        bin: String,
        source: std::io::Error,
    },

    #[error("yt-dlp exited with error (status={status}): {stderr_tail}")]
    Failed { status: String, stderr_tail: String },

    #[error("cannot parse yt-dlp output line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },

    #[error("no videos found")]
    NoEntries,
}

// Per-entry; the run continues with the next one.
#[derive(Error, Debug)]
pub enum EntryError {
    #[error("QR encoding failed: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("cannot write image: {0}")]
    Image(#[from] image::ImageError),
}
