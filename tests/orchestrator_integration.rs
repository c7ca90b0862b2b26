//! Integration tests for naming passes over a scan folder.

use async_trait::async_trait;
use scan_namer::describe::{ContentDescriber, DocumentImage, PdfRasterizer};
use scan_namer::error::DescribeError;
use scan_namer::naming::MAX_TITLE_BYTES;
use scan_namer::orchestrator::NamingOrchestrator;
use scan_namer::scan::ScanFile;
use scan_namer::storage::{Outcome, ProcessedFileLedger, MAX_FAILED_ATTEMPTS};
use scan_namer::Config;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Describer answering by page content; unknown pages fail.
struct ScriptedDescriber {
    titles: HashMap<Vec<u8>, String>,
    calls: AtomicUsize,
}

impl ScriptedDescriber {
    fn new(titles: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            titles: titles
                .iter()
                .map(|(content, title)| (content.as_bytes().to_vec(), (*title).to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentDescriber for ScriptedDescriber {
    async fn describe(&self, image: &DocumentImage) -> Result<String, DescribeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.titles
            .get(&image.bytes)
            .cloned()
            .ok_or_else(|| DescribeError::Request("connection reset".to_string()))
    }
}

/// Rasterizer handing back the PDF bytes as the page image.
struct PassthroughRasterizer;

#[async_trait]
impl PdfRasterizer for PassthroughRasterizer {
    async fn first_page(&self, pdf: &Path) -> Result<DocumentImage, DescribeError> {
        let bytes = tokio::fs::read(pdf)
            .await
            .map_err(|e| DescribeError::Rasterize(e.to_string()))?;
        Ok(DocumentImage::new(bytes, "image/jpeg"))
    }
}

struct Fixture {
    tmp: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("scans")).unwrap();
        Self { tmp }
    }

    fn folder(&self) -> PathBuf {
        self.tmp.path().join("scans")
    }

    fn config(&self) -> Config {
        let mut config = Config::new(self.folder());
        config.data_dir = self.tmp.path().join("data");
        config
    }

    fn scan(&self, name: &str, content: &str) -> PathBuf {
        let path = self.folder().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn orchestrator(&self, describer: Arc<ScriptedDescriber>) -> NamingOrchestrator {
        NamingOrchestrator::new(self.config(), describer, Arc::new(PassthroughRasterizer))
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.folder())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn read(&self, name: &str) -> String {
        fs::read_to_string(self.folder().join(name)).unwrap()
    }
}

#[tokio::test]
async fn test_multi_page_invoice() {
    let fx = Fixture::new();
    fx.scan("3_28_25, 12_50 PM Microsoft Lens.jpg", "invoice-1");
    fx.scan("3_28_25, 12_51 PM Microsoft Lens.jpg", "invoice-2");

    let describer = ScriptedDescriber::new(&[("invoice-1", "Invoice ABC Company")]);
    let mut agent = fx.orchestrator(describer.clone());
    let report = agent.run_pass(false).await;

    assert_eq!(report.files_matched, 2);
    assert_eq!(report.groups, 1);
    assert_eq!(report.files_renamed, 2);
    assert_eq!(describer.calls(), 1);
    assert_eq!(
        fx.names(),
        ["Invoice_ABC_Company_page_01.jpg", "Invoice_ABC_Company_page_02.jpg"]
    );
    assert_eq!(fx.read("Invoice_ABC_Company_page_01.jpg"), "invoice-1");
    assert_eq!(fx.read("Invoice_ABC_Company_page_02.jpg"), "invoice-2");
}

#[tokio::test]
async fn test_single_pdf() {
    let fx = Fixture::new();
    fx.scan("4_1_25, 9_00 AM Microsoft Lens.pdf", "lease");

    let describer = ScriptedDescriber::new(&[("lease", "Lease Agreement")]);
    let report = fx.orchestrator(describer).run_pass(false).await;

    assert_eq!(report.files_renamed, 1);
    assert_eq!(fx.names(), ["Lease_Agreement.pdf"]);
}

#[tokio::test]
async fn test_pdfs_are_never_grouped() {
    let fx = Fixture::new();
    fx.scan("4_1_25, 9_00 AM Microsoft Lens.pdf", "lease");
    fx.scan("4_1_25, 9_00 AM Microsoft Lens (1).pdf", "deed");

    let describer = ScriptedDescriber::new(&[("lease", "Lease Agreement"), ("deed", "Deed")]);
    let report = fx.orchestrator(describer.clone()).run_pass(false).await;

    assert_eq!(report.groups, 2);
    assert_eq!(describer.calls(), 2);
    assert_eq!(fx.names(), ["Deed.pdf", "Lease_Agreement.pdf"]);
}

#[tokio::test]
async fn test_long_multibyte_title_still_renames() {
    let fx = Fixture::new();
    fx.scan("3_28_25, 12_50 PM Microsoft Lens.jpg", "invoice-1");
    fx.scan("3_28_25, 12_51 PM Microsoft Lens.jpg", "invoice-2");

    let title = "請求書".repeat(40);
    let describer = ScriptedDescriber::new(&[("invoice-1", &title)]);
    let report = fx.orchestrator(describer).run_pass(false).await;

    assert_eq!(report.files_failed, 0);
    assert_eq!(report.files_renamed, 2);
    let stem = &title[..MAX_TITLE_BYTES];
    assert_eq!(
        fx.names(),
        [format!("{stem}_page_01.jpg"), format!("{stem}_page_02.jpg")]
    );
}

#[tokio::test]
async fn test_existing_name_gets_numbered() {
    let fx = Fixture::new();
    fx.scan("Receipt.jpg", "older receipt");
    fx.scan("3_28_25, 3_15 PM Microsoft Lens.jpg", "receipt");

    let describer = ScriptedDescriber::new(&[("receipt", "Receipt")]);
    let report = fx.orchestrator(describer).run_pass(false).await;

    assert_eq!(report.files_found, 2);
    assert_eq!(report.files_matched, 1);
    assert_eq!(fx.names(), ["Receipt.jpg", "Receipt_2.jpg"]);
    assert_eq!(fx.read("Receipt.jpg"), "older receipt");
    assert_eq!(fx.read("Receipt_2.jpg"), "receipt");
}

#[tokio::test]
async fn test_same_title_across_groups_never_overwrites() {
    let fx = Fixture::new();
    fx.scan("3_28_25, 9_00 AM Microsoft Lens.jpg", "first");
    fx.scan("3_28_25, 11_00 AM Microsoft Lens.jpg", "second");

    let describer = ScriptedDescriber::new(&[("first", "Receipt"), ("second", "Receipt")]);
    let report = fx.orchestrator(describer).run_pass(false).await;

    assert_eq!(report.files_renamed, 2);
    assert_eq!(fx.names(), ["Receipt.jpg", "Receipt_2.jpg"]);
    assert_eq!(fx.read("Receipt.jpg"), "first");
}

#[tokio::test]
async fn test_same_minute_pages_follow_modification_time() {
    let fx = Fixture::new();
    let later = fx.scan("3_28_25, 12_50 PM Microsoft Lens.jpg", "page-b");
    let earlier = fx.scan("3_28_25, 12_50 PM Microsoft Lens(1).jpg", "page-a");
    filetime::set_file_mtime(&later, filetime::FileTime::from_unix_time(1_743_166_300, 0)).unwrap();
    filetime::set_file_mtime(&earlier, filetime::FileTime::from_unix_time(1_743_166_200, 0)).unwrap();

    let describer = ScriptedDescriber::new(&[("page-a", "Contract")]);
    fx.orchestrator(describer).run_pass(false).await;

    assert_eq!(fx.read("Contract_page_01.jpg"), "page-a");
    assert_eq!(fx.read("Contract_page_02.jpg"), "page-b");
}

#[tokio::test]
async fn test_second_run_renames_nothing() {
    let fx = Fixture::new();
    fx.scan("3_28_25, 12_50 PM Microsoft Lens.jpg", "invoice-1");
    fx.scan("4_1_25, 9_00 AM Microsoft Lens.pdf", "lease");
    fx.scan("notes.txt", "not a scan");

    let describer =
        ScriptedDescriber::new(&[("invoice-1", "Invoice"), ("lease", "Lease Agreement")]);
    fx.orchestrator(describer.clone()).run_pass(false).await;
    let names = fx.names();

    let report = fx.orchestrator(describer.clone()).run_pass(false).await;

    assert_eq!(report.files_renamed, 0);
    assert_eq!(describer.calls(), 2);
    assert_eq!(fx.names(), names);
}

#[tokio::test]
async fn test_ledger_skips_and_force_reprocesses() {
    let fx = Fixture::new();
    let path = fx.scan("4_1_25, 9_00 AM Microsoft Lens.pdf", "lease");

    let mut ledger = ProcessedFileLedger::load(fx.config().ledger_path());
    ledger.record(&ScanFile::discover(&path).unwrap(), Outcome::skipped("kept by user"));
    ledger.flush().unwrap();
    drop(ledger);

    let describer = ScriptedDescriber::new(&[("lease", "Lease Agreement")]);
    let mut agent = fx.orchestrator(describer.clone());

    let report = agent.run_pass(false).await;
    assert_eq!(report.groups_skipped, 1);
    assert_eq!(describer.calls(), 0);
    assert_eq!(fx.names(), ["4_1_25, 9_00 AM Microsoft Lens.pdf"]);

    let report = agent.run_pass(true).await;
    assert_eq!(report.groups_skipped, 0);
    assert_eq!(report.files_renamed, 1);
    assert_eq!(describer.calls(), 1);
    assert_eq!(fx.names(), ["Lease_Agreement.pdf"]);
}

#[tokio::test]
async fn test_describe_failure_is_isolated() {
    let fx = Fixture::new();
    fx.scan("4_1_25, 9_00 AM Microsoft Lens.pdf", "unreadable");
    fx.scan("4_2_25, 10_30 AM Microsoft Lens.jpg", "receipt");

    let describer = ScriptedDescriber::new(&[("receipt", "Receipt")]);
    let mut agent = fx.orchestrator(describer);
    let report = agent.run_pass(false).await;

    assert_eq!(report.groups, 2);
    assert_eq!(report.groups_failed, 1);
    assert_eq!(report.files_failed, 1);
    assert_eq!(report.files_renamed, 1);
    assert_eq!(fx.names(), ["4_1_25, 9_00 AM Microsoft Lens.pdf", "Receipt.jpg"]);

    let failed = agent
        .ledger()
        .entries()
        .find(|e| e.outcome.is_failure())
        .unwrap();
    assert_eq!(failed.attempts, 1);
    assert!(failed.original_path.ends_with("Microsoft Lens.pdf"));
}

#[tokio::test]
async fn test_failures_stop_retrying_until_file_changes() {
    let fx = Fixture::new();
    let path = fx.scan("4_1_25, 9_00 AM Microsoft Lens.pdf", "unreadable");
    filetime::set_file_mtime(&path, filetime::FileTime::from_unix_time(1_743_500_000, 0)).unwrap();

    let describer = ScriptedDescriber::new(&[]);
    let mut agent = fx.orchestrator(describer.clone());

    for _ in 0..MAX_FAILED_ATTEMPTS {
        agent.run_pass(false).await;
    }
    assert_eq!(describer.calls(), MAX_FAILED_ATTEMPTS as usize);

    let report = agent.run_pass(false).await;
    assert_eq!(report.groups_skipped, 1);
    assert_eq!(describer.calls(), MAX_FAILED_ATTEMPTS as usize);

    filetime::set_file_mtime(&path, filetime::FileTime::from_unix_time(1_743_600_000, 0)).unwrap();
    let report = agent.run_pass(false).await;
    assert_eq!(report.groups_skipped, 0);
    assert_eq!(describer.calls(), MAX_FAILED_ATTEMPTS as usize + 1);
}

#[tokio::test]
async fn test_corrupt_ledger_does_not_block() {
    let fx = Fixture::new();
    let ledger_path = fx.config().ledger_path();
    fs::create_dir_all(ledger_path.parent().unwrap()).unwrap();
    fs::write(&ledger_path, "not a ledger database\n".repeat(200)).unwrap();
    fx.scan("4_1_25, 9_00 AM Microsoft Lens.pdf", "lease");

    let describer = ScriptedDescriber::new(&[("lease", "Lease Agreement")]);
    let report = fx.orchestrator(describer).run_pass(false).await;

    assert_eq!(report.files_renamed, 1);
    assert_eq!(fx.names(), ["Lease_Agreement.pdf"]);

    let quarantined = fs::read_dir(ledger_path.parent().unwrap())
        .unwrap()
        .filter_map(|e| e.ok())
        .any(|e| e.file_name().to_string_lossy().starts_with("ledger.db-corrupt-"));
    assert!(quarantined);

    let reloaded = ProcessedFileLedger::load(&ledger_path);
    assert_eq!(reloaded.len(), 1);
}

#[tokio::test]
async fn test_subdirectories_are_ignored() {
    let fx = Fixture::new();
    let nested = fx.folder().join("archive");
    fs::create_dir(&nested).unwrap();
    fs::write(nested.join("3_28_25, 12_50 PM Microsoft Lens.jpg"), "old").unwrap();

    let describer = ScriptedDescriber::new(&[("old", "Old")]);
    let report = fx.orchestrator(describer.clone()).run_pass(false).await;

    assert_eq!(report.files_found, 0);
    assert_eq!(describer.calls(), 0);
    assert!(nested.join("3_28_25, 12_50 PM Microsoft Lens.jpg").exists());
}
