use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::config::AppConfig;
use crate::error::{EntryError, TubeQrError};
use crate::models::VideoEntry;
use crate::qr::QrRenderer;
use crate::util;

#[derive(Debug)]
pub struct EntryOutcome {
    pub index: usize,
    pub filename: String,
    pub result: Result<(), EntryError>,
}

// `# ` header lines, then one `filename\ttitle\turl\tstatus` record per entry.
pub struct OverviewWriter {
    path: PathBuf,
    file: BufWriter<File>,
}

impl OverviewWriter {
    pub fn create(
        path: &Path,
        source_url: &str,
        total: usize,
        created: &DateTime<Local>,
    ) -> Result<Self, TubeQrError> {
        let file = File::create(path).map_err(|source| TubeQrError::Overview {
            path: path.to_path_buf(),
            source,
        })?;
        let mut w = Self {
            path: path.to_path_buf(),
            file: BufWriter::new(file),
        };

        let header = format!(
            "# TubeQR - YouTube Playlist QR Codes\n\
             # Created: {}\n\
             # Source: {}\n\
             # Number of videos: {}\n\
             # filename\ttitle\turl\tstatus\n",
            created.format("%Y-%m-%d %H:%M:%S"),
            util::single_line(source_url),
            total
        );
        w.write(&header)?;
        Ok(w)
    }

    fn write(&mut self, s: &str) -> Result<(), TubeQrError> {
        self.file
            .write_all(s.as_bytes())
            .map_err(|source| TubeQrError::Overview {
                path: self.path.clone(),
                source,
            })
    }

    pub fn record(&mut self, outcome: &EntryOutcome, entry: &VideoEntry) -> Result<(), TubeQrError> {
        let status = match &outcome.result {
            Ok(()) => "ok".to_string(),
            Err(e) => format!("error: {}", util::single_line(&e.to_string())),
        };
        let line = format!(
            "{}\t{}\t{}\t{}\n",
            outcome.filename,
            util::single_line(&entry.title),
            util::single_line(&entry.url),
            status
        );
        self.write(&line)
    }

    pub fn finish(mut self) -> Result<(), TubeQrError> {
        self.file.flush().map_err(|source| TubeQrError::Overview {
            path: self.path.clone(),
            source,
        })
    }
}

pub struct EntryRenderer<'a, R: QrRenderer + ?Sized> {
    qr: &'a R,
    qr_dir: &'a Path,
    max_title_len: usize,
    fallback: &'a str,
    width: usize,
}

impl<'a, R: QrRenderer + ?Sized> EntryRenderer<'a, R> {
    pub fn new(qr: &'a R, qr_dir: &'a Path, cfg: &'a AppConfig, total: usize) -> Self {
        Self {
            qr,
            qr_dir,
            max_title_len: cfg.max_title_len,
            fallback: &cfg.empty_title_fallback,
            width: util::index_width(total),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn filename(&self, entry: &VideoEntry) -> String {
        let title =
            util::sanitize_filename_component(&entry.title, self.max_title_len, self.fallback);
        util::qr_filename(entry.index, self.width, &title)
    }

    pub fn render(&self, entry: &VideoEntry) -> EntryOutcome {
        let filename = self.filename(entry);
        let path = self.qr_dir.join(&filename);
        let result = self.qr.render(&entry.url, &path);
        if let Err(e) = &result {
            log::debug!("entry {} ({}) failed: {:?}", entry.index, entry.url, e);
        }
        EntryOutcome {
            index: entry.index,
            filename,
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qr::PngQrRenderer;

    fn entry(index: usize, title: &str) -> VideoEntry {
        VideoEntry {
            index,
            title: title.to_string(),
            url: format!("https://www.youtube.com/watch?v=vid{index}"),
        }
    }

    #[test]
    fn filenames_follow_index_and_title() {
        let cfg = AppConfig::parse("").unwrap();
        let qr = PngQrRenderer::from_config(&cfg);
        let dir = tempfile::tempdir().unwrap();
        let r = EntryRenderer::new(&qr, dir.path(), &cfg, 3);
        assert_eq!(r.filename(&entry(1, "A/B")), "01_A_B.png");
        assert_eq!(r.filename(&entry(2, "Normal")), "02_Normal.png");
        assert_eq!(r.filename(&entry(3, "")), "03_untitled.png");

        let wide = EntryRenderer::new(&qr, dir.path(), &cfg, 150);
        assert_eq!(wide.width(), 3);
        assert_eq!(wide.filename(&entry(5, "x")), "005_x.png");
    }

    #[test]
    fn renders_into_qr_dir() {
        let cfg = AppConfig::parse("qr_module_size = 2").unwrap();
        let qr = PngQrRenderer::from_config(&cfg);
        let dir = tempfile::tempdir().unwrap();
        let r = EntryRenderer::new(&qr, dir.path(), &cfg, 1);

        let outcome = r.render(&entry(1, "Song: Live"));
        assert!(outcome.result.is_ok());
        assert_eq!(outcome.filename, "01_Song_ Live.png");
        assert!(dir.path().join("01_Song_ Live.png").is_file());
    }

    #[test]
    fn long_multi_byte_title_still_renders() {
        let cfg = AppConfig::parse("qr_module_size = 1").unwrap();
        let qr = PngQrRenderer::from_config(&cfg);
        let dir = tempfile::tempdir().unwrap();
        let r = EntryRenderer::new(&qr, dir.path(), &cfg, 1);

        let outcome = r.render(&entry(1, &"日本語のとても長い動画タイトル".repeat(10)));
        assert!(outcome.filename.len() <= 255, "{} bytes", outcome.filename.len());
        assert!(outcome.result.is_ok(), "{:?}", outcome.result);
        assert!(dir.path().join(&outcome.filename).is_file());
    }

    #[test]
    fn overview_has_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overview.txt");
        let mut w = OverviewWriter::create(&path, "https://youtu.be/x", 2, &Local::now()).unwrap();

        let ok = EntryOutcome {
            index: 1,
            filename: "01_a.png".into(),
            result: Ok(()),
        };
        let failed = EntryOutcome {
            index: 2,
            filename: "02_b.png".into(),
            result: Err(EntryError::Encode(qrcode::types::QrError::DataTooLong)),
        };
        w.record(&ok, &entry(1, "multi\nline\ttitle")).unwrap();
        w.record(&failed, &entry(2, "b")).unwrap();
        w.finish().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let records: Vec<&str> = text.lines().filter(|l| !l.starts_with("# ")).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            "01_a.png\tmulti line title\thttps://www.youtube.com/watch?v=vid1\tok"
        );
        let fields: Vec<&str> = records[1].split('\t').collect();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0], "02_b.png");
        assert!(fields[3].starts_with("error: "));
        assert!(text.contains("# Number of videos: 2"));
    }
}
