//! Partitioning of scan files into documents.
//!
//! Pages of one document are scanned in physical order, a few seconds to a
//! minute apart, so a single left-to-right walk over the capture times is
//! enough: a new document starts whenever the extension changes or the gap
//! to the previous page exceeds the grouping window.

use std::time::Duration;

use super::models::{DocumentGroup, ScanFile};

/// Maximum gap between consecutive pages of one document.
pub const GROUPING_WINDOW: Duration = Duration::from_secs(60);

/// Splits scan files into ordered document groups.
#[derive(Debug, Clone, Copy)]
pub struct DocumentGrouper {
    window: Duration,
}

impl Default for DocumentGrouper {
    fn default() -> Self {
        Self::new(GROUPING_WINDOW)
    }
}

impl DocumentGrouper {
    /// Create a grouper with a custom window.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self { window }
    }

    /// Window used to chain consecutive pages.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Partition `files` into document groups.
    ///
    /// PDFs are always singletons. Images are chained in capture order.
    /// Groups come back ordered by their first page.
    #[must_use]
    pub fn group(&self, files: Vec<ScanFile>) -> Vec<DocumentGroup> {
        let (pdfs, mut images): (Vec<_>, Vec<_>) = files.into_iter().partition(ScanFile::is_pdf);

        let mut groups: Vec<DocumentGroup> = pdfs.into_iter().map(DocumentGroup::new).collect();

        images.sort_by(|a, b| {
            a.captured_at
                .cmp(&b.captured_at)
                .then(a.modified.cmp(&b.modified))
                .then_with(|| a.path.cmp(&b.path))
        });

        let mut current: Option<DocumentGroup> = None;
        for file in images {
            match current.as_mut() {
                Some(group) if self.continues(group.last(), &file) => group.push(file),
                _ => {
                    if let Some(done) = current.replace(DocumentGroup::new(file)) {
                        groups.push(done);
                    }
                }
            }
        }
        groups.extend(current);

        groups.sort_by(|a, b| {
            a.first()
                .captured_at
                .cmp(&b.first().captured_at)
                .then_with(|| a.first().path.cmp(&b.first().path))
        });

        tracing::debug!(groups = groups.len(), "Grouped scan files");
        groups
    }

    /// Whether `next` belongs to the same document as `prev`.
    fn continues(&self, prev: &ScanFile, next: &ScanFile) -> bool {
        if prev.extension != next.extension {
            return false;
        }
        let gap = next.captured_at - prev.captured_at;
        gap.to_std().is_ok_and(|gap| gap <= self.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 28)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn scan(name: &str, offset_secs: i64) -> ScanFile {
        ScanFile::new(
            format!("/scans/{name}"),
            base() + TimeDelta::seconds(offset_secs),
            1,
            0,
        )
    }

    fn names(group: &DocumentGroup) -> Vec<&str> {
        group.files().iter().map(|f| f.file_name.as_str()).collect()
    }

    #[test]
    fn test_files_within_window_form_one_group() {
        let files = vec![scan("c.jpg", 120), scan("a.jpg", 0), scan("b.jpg", 60)];
        let groups = DocumentGrouper::default().group(files);

        assert_eq!(groups.len(), 1);
        assert_eq!(names(&groups[0]), vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn test_gap_beyond_window_splits() {
        let files = vec![scan("a.jpg", 0), scan("b.jpg", 61), scan("c.jpg", 300)];
        let groups = DocumentGrouper::default().group(files);

        assert_eq!(groups.len(), 3);
        for group in &groups {
            assert_eq!(group.len(), 1);
        }
    }

    #[test]
    fn test_gap_is_measured_from_previous_page() {
        // Total span is 150s but every consecutive gap is within the window.
        let files = vec![scan("a.jpg", 0), scan("b.jpg", 50), scan("c.jpg", 100), scan("d.jpg", 150)];
        let groups = DocumentGrouper::default().group(files);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 4);
    }

    #[test]
    fn test_extension_change_splits() {
        let files = vec![scan("a.jpg", 0), scan("b.png", 10), scan("c.png", 20)];
        let groups = DocumentGrouper::default().group(files);

        assert_eq!(groups.len(), 2);
        assert_eq!(names(&groups[0]), vec!["a.jpg"]);
        assert_eq!(names(&groups[1]), vec!["b.png", "c.png"]);
    }

    #[test]
    fn test_pdfs_are_always_singletons() {
        let files = vec![scan("a.pdf", 0), scan("b.pdf", 0), scan("c.pdf", 5)];
        let groups = DocumentGrouper::default().group(files);

        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.len() == 1 && g.extension() == "pdf"));
    }

    #[test]
    fn test_pdf_between_images_does_not_break_image_run() {
        let files = vec![scan("a.jpg", 0), scan("m.pdf", 20), scan("b.jpg", 40)];
        let groups = DocumentGrouper::default().group(files);

        assert_eq!(groups.len(), 2);
        assert_eq!(names(&groups[0]), vec!["a.jpg", "b.jpg"]);
        assert_eq!(names(&groups[1]), vec!["m.pdf"]);
    }

    #[test]
    fn test_equal_timestamps_join() {
        let files = vec![scan("b.jpg", 0), scan("a.jpg", 0)];
        let groups = DocumentGrouper::default().group(files);

        assert_eq!(groups.len(), 1);
        assert_eq!(names(&groups[0]), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_equal_timestamps_ordered_by_mtime() {
        let mut late = scan("a.jpg", 0);
        late.modified = 20;
        let mut early = scan("b.jpg", 0);
        early.modified = 10;

        let groups = DocumentGrouper::default().group(vec![late, early]);
        assert_eq!(names(&groups[0]), vec!["b.jpg", "a.jpg"]);
    }

    #[test]
    fn test_custom_window() {
        let files = vec![scan("a.jpg", 0), scan("b.jpg", 30)];
        let grouper = DocumentGrouper::new(Duration::from_secs(10));
        assert_eq!(grouper.window(), Duration::from_secs(10));
        assert_eq!(grouper.group(files).len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(DocumentGrouper::default().group(Vec::new()).is_empty());
    }
}
