//! First-page PDF rasterization through poppler's `pdftoppm`.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use super::{DocumentImage, PdfRasterizer};
use crate::error::DescribeError;

/// Default rendering resolution.
pub const DEFAULT_DPI: u32 = 200;

/// Rasterizer that shells out to `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PopplerRasterizer {
    program: PathBuf,
    dpi: u32,
}

impl Default for PopplerRasterizer {
    fn default() -> Self {
        Self {
            program: PathBuf::from("pdftoppm"),
            dpi: DEFAULT_DPI,
        }
    }
}

impl PopplerRasterizer {
    /// Rasterizer using `pdftoppm` from `PATH` at 200 dpi.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific `pdftoppm` binary.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Render at `dpi`.
    #[must_use]
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    fn args(&self, pdf: &Path) -> Vec<OsString> {
        let dpi = self.dpi.to_string();
        let mut args: Vec<OsString> = ["-jpeg", "-r", dpi.as_str(), "-f", "1", "-l", "1", "-singlefile"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(pdf.as_os_str().to_owned());
        args
    }
}

#[async_trait]
impl PdfRasterizer for PopplerRasterizer {
    async fn first_page(&self, pdf: &Path) -> Result<DocumentImage, DescribeError> {
        let output = tokio::process::Command::new(&self.program)
            .args(self.args(pdf))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                tracing::warn!(
                    program = %self.program.display(),
                    "Could not run pdftoppm; install poppler-utils to process PDF scans"
                );
                DescribeError::Rasterize(format!("failed to run {}: {e}", self.program.display()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DescribeError::Rasterize(format!(
                "pdftoppm exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        if output.stdout.is_empty() {
            return Err(DescribeError::Rasterize(format!(
                "no page rendered from {}",
                pdf.display()
            )));
        }

        Ok(DocumentImage::new(output.stdout, "image/jpeg"))
    }
}
