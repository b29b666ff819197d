use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoEntry {
    // 1-based, playlist order.
    pub index: usize,
    pub title: String,
    pub url: String,
}

// One line of `yt-dlp --flat-playlist --dump-json`; yt-dlp emits many more fields.
#[derive(Debug, Clone, Deserialize)]
pub struct FlatEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub webpage_url: Option<String>,
    // "Youtube" on flat playlist entries; full extractions set extractor_key instead.
    pub ie_key: Option<String>,
    pub extractor_key: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}
