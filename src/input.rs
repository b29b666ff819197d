use std::io::{BufRead, Write};

use crate::error::TubeQrError;
use crate::util;

pub const PROMPT: &str = "Please enter the YouTube link (playlist or single video): ";

pub fn normalize_url(raw: &str) -> Result<String, TubeQrError> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(TubeQrError::EmptyInput);
    }
    if !util::is_youtube_url(url) {
        log::warn!("{} does not look like a YouTube link; trying anyway", url);
    }
    Ok(url.to_string())
}

pub fn read_url<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<String, TubeQrError> {
    // A broken terminal is treated like no input at all.
    let _ = write!(output, "\n{}", PROMPT);
    let _ = output.flush();

    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => Err(TubeQrError::EmptyInput),
        Ok(_) => normalize_url(&line),
    }
}
