//! Target names for the pages of one document.

use std::path::PathBuf;

use super::sanitizer::sanitize_title;
use crate::scan::DocumentGroup;

/// Desired final paths for one document group, before conflict resolution.
#[derive(Debug, Clone)]
pub struct NamingDecision {
    group: DocumentGroup,
    title: String,
    targets: Vec<PathBuf>,
}

impl NamingDecision {
    /// Build the decision for `group` from the describer's raw title.
    ///
    /// A single page becomes `<title>.<ext>`; pages of a larger group become
    /// `<title>_page_<NN>.<ext>` in capture order, each keeping its own
    /// extension. Targets live next to their source files.
    #[must_use]
    pub fn new(group: DocumentGroup, raw_title: &str) -> Self {
        let title = sanitize_title(raw_title);
        let width = group.len().to_string().len().max(2);
        let multi_page = group.len() > 1;

        let targets = group
            .files()
            .iter()
            .enumerate()
            .map(|(i, file)| {
                let name = if multi_page {
                    format!("{title}_page_{:0width$}.{}", i + 1, file.extension)
                } else {
                    format!("{title}.{}", file.extension)
                };
                file.path.with_file_name(name)
            })
            .collect();

        Self {
            group,
            title,
            targets,
        }
    }

    /// Sanitized title shared by every page.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The group this decision names.
    #[must_use]
    pub const fn group(&self) -> &DocumentGroup {
        &self.group
    }

    /// Desired target paths, one per page.
    #[must_use]
    pub fn targets(&self) -> &[PathBuf] {
        &self.targets
    }
}
