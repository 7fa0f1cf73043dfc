//! Document adapter (PDF, plain text, markdown).

use super::models::{ContentMetadata, ContentPackage, SourceType};
use super::segment::segment_text;
use crate::error::{PodsmithError, Result};
use async_trait::async_trait;
use lopdf::{Dictionary, Document, Object};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Reads document bytes.
#[async_trait]
pub trait DocumentReader: Send + Sync {
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;
}

/// Reads documents from the local filesystem.
#[derive(Debug, Default, Clone)]
pub struct FsDocumentReader;

#[async_trait]
impl DocumentReader for FsDocumentReader {
    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .map_err(|e| PodsmithError::Ingestion(format!("Cannot read {}: {}", path.display(), e)))
    }
}

/// Text and metadata pulled out of a PDF.
#[derive(Debug, Default)]
struct PdfContent {
    pages: Vec<String>,
    page_count: usize,
    info: PdfInfo,
}

#[derive(Debug, Default, PartialEq)]
struct PdfInfo {
    title: Option<String>,
    author: Option<String>,
    creation_date: Option<String>,
    producer: Option<String>,
    creator: Option<String>,
}

/// Adapter turning a document into a [`ContentPackage`].
pub struct DocumentAdapter {
    reader: Arc<dyn DocumentReader>,
    max_block_chars: usize,
}

impl DocumentAdapter {
    pub fn new(reader: Arc<dyn DocumentReader>, max_block_chars: usize) -> Self {
        Self {
            reader,
            max_block_chars,
        }
    }

    pub async fn normalize(&self, path: &Path) -> Result<ContentPackage> {
        info!("Reading document: {}", path.display());
        let bytes = self.reader.read(path).await?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned());

        let mut metadata = ContentMetadata::default().with_title(stem.as_deref());
        metadata.insert_extra("fileName", file_name.clone());
        metadata.insert_extra("fileSize", bytes.len());

        let content = if is_pdf(path, &bytes) {
            let pdf = tokio::task::spawn_blocking(move || extract_pdf(&bytes))
                .await
                .map_err(|e| PodsmithError::Ingestion(format!("PDF extraction task failed: {}", e)))??;

            metadata = metadata
                .with_title(pdf.info.title.as_deref())
                .with_author(pdf.info.author.as_deref())
                .with_published(pdf.info.creation_date.as_deref());
            metadata.insert_extra("pageCount", pdf.page_count);
            if let Some(producer) = pdf.info.producer {
                metadata.insert_extra("producer", producer);
            }
            if let Some(creator) = pdf.info.creator {
                metadata.insert_extra("creator", creator);
            }

            pdf.pages
                .iter()
                .flat_map(|page| segment_text(page, self.max_block_chars))
                .collect()
        } else {
            let text = String::from_utf8(bytes).map_err(|_| {
                PodsmithError::Ingestion(format!("{} is neither a PDF nor UTF-8 text", file_name))
            })?;
            segment_text(&text, self.max_block_chars)
        };

        debug!(file = %file_name, blocks = content.len(), "Normalized document");
        Ok(ContentPackage::new(SourceType::Document, content, metadata, vec![file_name]))
    }
}

fn is_pdf(path: &Path, bytes: &[u8]) -> bool {
    let by_extension = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    by_extension || bytes.starts_with(b"%PDF")
}

fn extract_pdf(bytes: &[u8]) -> Result<PdfContent> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| PodsmithError::Ingestion(format!("Failed to parse PDF: {}", e)))?;

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    let mut pages = Vec::with_capacity(page_numbers.len());

    for number in &page_numbers {
        match doc.extract_text(&[*number]) {
            Ok(text) => pages.push(text),
            Err(e) => warn!("Skipping PDF page {}: {}", number, e),
        }
    }

    Ok(PdfContent {
        pages,
        page_count: page_numbers.len(),
        info: read_info(&doc),
    })
}

fn read_info(doc: &Document) -> PdfInfo {
    let info = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => doc.get_object(*id).and_then(Object::as_dict).ok(),
        Ok(Object::Dictionary(dict)) => Some(dict),
        _ => None,
    };

    let Some(info) = info else {
        return PdfInfo::default();
    };

    PdfInfo {
        title: info_string(info, b"Title"),
        author: info_string(info, b"Author"),
        creation_date: info_string(info, b"CreationDate").map(|d| format_pdf_date(&d)),
        producer: info_string(info, b"Producer"),
        creator: info_string(info, b"Creator"),
    }
}

fn info_string(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key) {
        Ok(Object::String(bytes, _)) => {
            let s = decode_pdf_string(bytes);
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE with BOM, otherwise byte-per-char.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// `D:YYYYMMDDHHmmSS...` to `YYYY-MM-DD`; anything else is returned as-is.
fn format_pdf_date(raw: &str) -> String {
    let digits = raw.strip_prefix("D:").unwrap_or(raw);
    if digits.len() >= 8 && digits[..8].chars().all(|c| c.is_ascii_digit()) {
        format!("{}-{}-{}", &digits[..4], &digits[4..6], &digits[6..8])
    } else {
        raw.to_string()
    }
}
