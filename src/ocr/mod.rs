//! Text extraction from images
//!
//! OCR is an external collaborator: the crate only needs plain text back,
//! plus progress as a fraction between 0 and 1 while it works.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Image not found: {0}")]
    ImageNotFound(PathBuf),

    #[error("OCR engine '{0}' is not installed")]
    NotInstalled(String),

    #[error("OCR failed: {0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Progress callback, called with values in `0.0..=1.0`
pub type Progress = dyn Fn(f32) + Send + Sync;

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, image: &Path, progress: &Progress) -> Result<String, OcrError>;
}

/// Runs the `tesseract` command line tool
pub struct TesseractExtractor {
    command: String,
    language: String,
}

impl Default for TesseractExtractor {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

impl TesseractExtractor {
    pub fn new(command: &str, language: &str) -> Self {
        Self {
            command: command.to_string(),
            language: language.to_string(),
        }
    }
}

#[async_trait]
impl TextExtractor for TesseractExtractor {
    async fn extract_text(&self, image: &Path, progress: &Progress) -> Result<String, OcrError> {
        if !image.is_file() {
            return Err(OcrError::ImageNotFound(image.to_path_buf()));
        }
        progress(0.0);

        let output = Command::new(&self.command)
            .arg(image)
            .arg("stdout")
            .args(["-l", &self.language])
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => OcrError::NotInstalled(self.command.clone()),
                _ => OcrError::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            log::warn!("ocr: {} failed on {}: {}", self.command, image.display(), stderr);
            return Err(OcrError::Failed(stderr.trim().to_string()));
        }

        progress(1.0);
        let text = String::from_utf8_lossy(&output.stdout);
        // Tesseract ends pages with a form feed
        let text = text.trim_end_matches(['\n', '\u{c}', ' ']).to_string();
        log::info!("ocr: extracted {} characters from {}", text.len(), image.display());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_image() {
        let extractor = TesseractExtractor::default();
        let result = extractor
            .extract_text(Path::new("/definitely/not/here.png"), &|_| {})
            .await;
        assert!(matches!(result, Err(OcrError::ImageNotFound(_))));
    }

    #[tokio::test]
    async fn test_missing_engine() {
        let temp = TempDir::new().unwrap();
        let image = temp.path().join("page.png");
        std::fs::write(&image, b"not really a png").unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let extractor = TesseractExtractor::new("mapmynotes-no-such-ocr-engine", "eng");
        let result = extractor
            .extract_text(&image, &move |p| sink.lock().unwrap().push(p))
            .await;
        assert!(matches!(result, Err(OcrError::NotInstalled(_))));
        assert_eq!(*seen.lock().unwrap(), vec![0.0]);
    }
}
