use std::io::Write;

use chrono::Local;

use crate::config::AppConfig;
use crate::error::{FetchError, TubeQrError};
use crate::models::RunSummary;
use crate::progress::Progress;
use crate::qr::QrRenderer;
use crate::render::{EntryRenderer, OverviewWriter};
use crate::run::RunContext;
use crate::ytdlp::MetadataSource;

#[derive(Debug)]
pub struct RunReport {
    pub context: RunContext,
    pub summary: RunSummary,
}

/// Fetches the entries behind `url` and renders one QR code per entry.
///
/// Nothing is written to disk until the fetch has produced at least one
/// entry. A failing entry is reported and skipped; only fetch, directory and
/// overview errors abort the run.
pub async fn run<S, R, W>(
    cfg: &AppConfig,
    source: &S,
    qr: &R,
    url: &str,
    mut out: W,
) -> Result<RunReport, TubeQrError>
where
    S: MetadataSource + ?Sized + Sync,
    R: QrRenderer + ?Sized,
    W: Write,
{
    let _ = writeln!(out, "\n📋 Fetching playlist information...");
    let entries = source.fetch_entries(url).await?;
    if entries.is_empty() {
        return Err(FetchError::NoEntries.into());
    }
    let _ = writeln!(out, "✅ {} video(s) found", entries.len());

    let now = Local::now();
    let context = RunContext::create(&cfg.output_root, &now)?;
    log::info!(
        "run {} writing under {}",
        context.timestamp,
        context.output_root.display()
    );

    let total = entries.len();
    let renderer = EntryRenderer::new(qr, &context.qr_dir, cfg, total);
    let mut overview = OverviewWriter::create(&context.overview_path, url, total, &now)?;

    let _ = writeln!(out, "\n🔄 Generating QR codes...");
    let mut progress = Progress::new(&mut out, total, renderer.width());
    for entry in &entries {
        let outcome = renderer.render(entry);
        overview.record(&outcome, entry)?;
        progress.entry(&outcome);
    }
    overview.finish()?;
    let summary = progress.finish();

    let _ = writeln!(out, "\n📁 Output:");
    let _ = writeln!(out, "   - QR Codes: {}", context.qr_dir.display());
    let _ = writeln!(out, "   - Overview: {}", context.overview_path.display());

    Ok(RunReport { context, summary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::fs;
    use std::path::Path;

    use async_trait::async_trait;

    use crate::error::EntryError;
    use crate::models::VideoEntry;
    use crate::qr::PngQrRenderer;

    struct FixedSource(Vec<(&'static str, &'static str)>);

    #[async_trait]
    impl MetadataSource for FixedSource {
        async fn fetch_entries(&self, _url: &str) -> Result<Vec<VideoEntry>, FetchError> {
            Ok(self
                .0
                .iter()
                .enumerate()
                .map(|(i, (title, url))| VideoEntry {
                    index: i + 1,
                    title: title.to_string(),
                    url: url.to_string(),
                })
                .collect())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl MetadataSource for FailingSource {
        async fn fetch_entries(&self, _url: &str) -> Result<Vec<VideoEntry>, FetchError> {
            Err(FetchError::Failed {
                status: "exit status: 1".into(),
                stderr_tail: "ERROR: playlist does not exist".into(),
            })
        }
    }

    /// Fails on the n-th call (1-based), renders normally otherwise.
    struct FailNth {
        inner: PngQrRenderer,
        n: usize,
        calls: Cell<usize>,
    }

    impl QrRenderer for FailNth {
        fn render(&self, text: &str, path: &Path) -> Result<(), EntryError> {
            self.calls.set(self.calls.get() + 1);
            if self.calls.get() == self.n {
                return Err(EntryError::Encode(qrcode::types::QrError::DataTooLong));
            }
            self.inner.render(text, path)
        }
    }

    fn cfg_in(root: &Path) -> AppConfig {
        let mut cfg = AppConfig::parse("qr_module_size = 2").unwrap();
        cfg.output_root = root.join("youtube_qr_codes");
        cfg
    }

    fn three_videos() -> FixedSource {
        FixedSource(vec![
            ("A/B", "https://www.youtube.com/watch?v=aaaaaaaaaaa"),
            ("Normal", "https://www.youtube.com/watch?v=bbbbbbbbbbb"),
            ("", "https://www.youtube.com/watch?v=ccccccccccc"),
        ])
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn overview_records(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .filter(|l| !l.starts_with("# "))
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn renders_every_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = cfg_in(tmp.path());
        let qr = PngQrRenderer::from_config(&cfg);
        let mut console = Vec::new();

        let url = "https://youtube.com/playlist?list=PL1";
        let report = run(&cfg, &three_videos(), &qr, url, &mut console)
            .await
            .unwrap();

        assert_eq!(
            report.summary,
            RunSummary {
                total: 3,
                succeeded: 3,
                failed: 0
            }
        );
        assert!(report
            .context
            .run_dir
            .starts_with(tmp.path().join("youtube_qr_codes")));
        assert_eq!(
            file_names(&report.context.qr_dir),
            ["01_A_B.png", "02_Normal.png", "03_untitled.png"]
        );

        let records = overview_records(&report.context.overview_path);
        assert_eq!(records.len(), 3);
        assert!(records[0].starts_with("01_A_B.png\tA/B\t"));
        assert!(records[2].starts_with("03_untitled.png\t\t"));

        let console = String::from_utf8(console).unwrap();
        assert!(console.contains("✅ [01/3] 01_A_B.png"));
        assert!(console.contains("3 succeeded, 0 failed (3 total)"));
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_run() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = cfg_in(tmp.path());
        let qr = FailNth {
            inner: PngQrRenderer::from_config(&cfg),
            n: 2,
            calls: Cell::new(0),
        };
        let mut console = Vec::new();

        let report = run(&cfg, &three_videos(), &qr, "url", &mut console).await.unwrap();

        assert_eq!(report.summary.succeeded, 2);
        assert_eq!(report.summary.failed, 1);
        assert!(!report.summary.all_succeeded());
        assert_eq!(
            file_names(&report.context.qr_dir),
            ["01_A_B.png", "03_untitled.png"]
        );

        let records = overview_records(&report.context.overview_path);
        assert_eq!(records.len(), 3);
        assert!(records[1].starts_with("02_Normal.png\t"));
        assert!(records[1].contains("\terror: "));

        let console = String::from_utf8(console).unwrap();
        assert!(console.contains("❌ [02/3] 02_Normal.png"));
        assert!(console.contains("2 succeeded, 1 failed (3 total)"));
    }

    #[tokio::test]
    async fn empty_playlist_creates_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = cfg_in(tmp.path());
        let qr = PngQrRenderer::from_config(&cfg);

        let err = run(&cfg, &FixedSource(vec![]), &qr, "url", Vec::new())
            .await
            .unwrap_err();

        assert!(matches!(err, TubeQrError::Fetch(FetchError::NoEntries)));
        assert!(!cfg.output_root.exists());
    }

    #[tokio::test]
    async fn fetch_failure_creates_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = cfg_in(tmp.path());
        let qr = PngQrRenderer::from_config(&cfg);

        let err = run(&cfg, &FailingSource, &qr, "url", Vec::new())
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("fetch failed: "));
        assert!(!cfg.output_root.exists());
    }

    #[tokio::test]
    async fn many_entries_get_wider_indices() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = cfg_in(tmp.path());
        let qr = PngQrRenderer::from_config(&cfg);
        let videos: Vec<(&'static str, &'static str)> =
            vec![("same", "https://youtu.be/x"); 100];

        let report = run(&cfg, &FixedSource(videos), &qr, "url", Vec::new())
            .await
            .unwrap();

        let names = file_names(&report.context.qr_dir);
        assert_eq!(names.len(), 100);
        assert_eq!(names[0], "001_same.png");
        assert_eq!(names[99], "100_same.png");
        assert_eq!(report.summary.total, 100);
    }
}
