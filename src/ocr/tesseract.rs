// SPDX-License-Identifier: GPL-3.0-only

//! Tesseract subprocess adapter
//!
//! Drives the system `tesseract` binary in TSV mode: the image is piped
//! in as PNG on stdin, word rows come back on stdout with bounding boxes
//! and confidences. Availability is probed once at construction; each
//! `recognize` call is a fresh short-lived process, so the engine is
//! stateless from the pipeline's point of view.

use super::{Candidate, TextRecognizer};
use crate::errors::OcrError;
use image::{DynamicImage, GrayImage, ImageFormat};
use std::io::{Cursor, Write};
use std::process::{Command, Stdio};
use tracing::{debug, trace};

/// TSV row level for words (page=1, block=2, para=3, line=4, word=5)
const WORD_LEVEL: &str = "5";

/// Recognizer backed by the system `tesseract` binary
pub struct TesseractRecognizer {
    /// Language pack passed via `-l`
    lang: String,
    /// Page segmentation mode passed via `--psm`. 6 ("assume a single
    /// uniform block of text") behaves well on ID cards.
    psm: u8,
}

impl TesseractRecognizer {
    /// Probe the binary and build a recognizer with the default language
    pub fn new() -> Result<Self, OcrError> {
        Self::with_lang("spa")
    }

    /// Probe the binary and build a recognizer for a specific language
    /// pack (e.g. "spa", "eng")
    pub fn with_lang(lang: &str) -> Result<Self, OcrError> {
        let output = Command::new("tesseract")
            .arg("--version")
            .output()
            .map_err(|e| OcrError::EngineUnavailable(e.to_string()))?;

        if !output.status.success() {
            return Err(OcrError::EngineUnavailable(
                "tesseract --version returned a failure status".to_string(),
            ));
        }

        let version = String::from_utf8_lossy(&output.stdout);
        debug!(version = %version.lines().next().unwrap_or(""), "Tesseract available");

        Ok(Self {
            lang: lang.to_string(),
            psm: 6,
        })
    }

    fn run_tesseract(&self, png: &[u8]) -> Result<String, OcrError> {
        let mut child = Command::new("tesseract")
            .arg("stdin")
            .arg("stdout")
            .arg("-l")
            .arg(&self.lang)
            .arg("--psm")
            .arg(self.psm.to_string())
            .arg("tsv")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| OcrError::InvocationFailed(e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(png)
                .map_err(|e| OcrError::InvocationFailed(e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| OcrError::InvocationFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(OcrError::InvocationFailed(format!(
                "tesseract exited with {}",
                output.status
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| OcrError::MalformedOutput(e.to_string()))
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &GrayImage) -> Result<Vec<Candidate>, OcrError> {
        let mut png = Vec::new();
        DynamicImage::ImageLuma8(image.clone())
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| OcrError::InvocationFailed(e.to_string()))?;

        let tsv = self.run_tesseract(&png)?;
        let candidates = parse_tsv(&tsv);
        trace!(count = candidates.len(), "Tesseract returned candidates");
        Ok(candidates)
    }
}

/// Parse tesseract's TSV output into candidates.
///
/// Word rows carry: level, page, block, para, line, word, left, top,
/// width, height, conf (0-100, -1 for structural rows), text. Rows that
/// do not parse cleanly are skipped rather than failing the whole call.
fn parse_tsv(tsv: &str) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for line in tsv.lines().skip(1) {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < 12 || columns[0] != WORD_LEVEL {
            continue;
        }

        let text = columns[11].trim();
        if text.is_empty() {
            continue;
        }

        let parsed = (
            columns[6].parse::<f32>(),
            columns[7].parse::<f32>(),
            columns[8].parse::<f32>(),
            columns[9].parse::<f32>(),
            columns[10].parse::<f32>(),
        );
        let (Ok(left), Ok(top), Ok(width), Ok(height), Ok(conf)) = parsed else {
            continue;
        };
        if conf < 0.0 {
            continue;
        }

        candidates.push(Candidate {
            polygon: Candidate::rect_polygon(left, top, width, height),
            text: text.to_string(),
            confidence: (conf / 100.0).clamp(0.0, 1.0),
        });
    }

    candidates
}
