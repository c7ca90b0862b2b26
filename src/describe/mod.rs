//! Content describer and PDF rasterizer collaborators.
//!
//! This module provides:
//! - The [`ContentDescriber`] and [`PdfRasterizer`] capability traits
//! - An OpenAI vision implementation of the describer
//! - A poppler (`pdftoppm`) implementation of the rasterizer
//! - Image loading and downscaling before upload

mod openai;
mod pdf;
mod upload;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;

use crate::error::DescribeError;

pub use openai::{OpenAiDescriber, NAMING_PROMPT};
pub use pdf::PopplerRasterizer;
pub use upload::{
    load_image, load_representative, mime_type_for, prepare_image, MAX_DIMENSION, MAX_UPLOAD_BYTES,
};

/// Encoded image handed to the describer.
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentImage {
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`.
    pub mime_type: &'static str,
}

impl DocumentImage {
    /// Create an image from encoded bytes.
    #[must_use]
    pub const fn new(bytes: Vec<u8>, mime_type: &'static str) -> Self {
        Self { bytes, mime_type }
    }

    /// `data:` URL carrying the base64 encoded image.
    #[must_use]
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

impl std::fmt::Debug for DocumentImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentImage")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Proposes a short descriptive title for a document image.
#[async_trait]
pub trait ContentDescriber: Send + Sync {
    /// Describe `image`, returning the raw proposed title.
    async fn describe(&self, image: &DocumentImage) -> Result<String, DescribeError>;
}

/// Renders the first page of a PDF.
#[async_trait]
pub trait PdfRasterizer: Send + Sync {
    /// Render page one of `pdf` as an image.
    async fn first_page(&self, pdf: &Path) -> Result<DocumentImage, DescribeError>;
}
