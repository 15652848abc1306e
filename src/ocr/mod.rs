// SPDX-License-Identifier: GPL-3.0-only

//! Text-recognition engine interface
//!
//! The pipeline consumes the engine through [`TextRecognizer`] only. The
//! engine is stateless per call; any initialization cost (model loading,
//! binary probing) is paid once when the implementation is constructed,
//! before the pipeline starts.

pub mod tesseract;

pub use tesseract::TesseractRecognizer;

use crate::errors::OcrError;
use image::GrayImage;

/// One raw result from the recognition engine, before filtering
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Bounding polygon in the coordinate space of the recognized image,
    /// clockwise from the top-left corner
    pub polygon: [(f32, f32); 4],
    /// Raw recognized text
    pub text: String,
    /// Engine confidence in [0, 1]
    pub confidence: f32,
}

impl Candidate {
    /// Polygon for an axis-aligned bounding box
    pub fn rect_polygon(left: f32, top: f32, width: f32, height: f32) -> [(f32, f32); 4] {
        [
            (left, top),
            (left + width, top),
            (left + width, top + height),
            (left, top + height),
        ]
    }
}

/// A text-recognition engine
pub trait TextRecognizer: Send + Sync {
    /// Recognize text regions in a grayscale image, returning zero or
    /// more candidates in the order the engine produced them.
    fn recognize(&self, image: &GrayImage) -> Result<Vec<Candidate>, OcrError>;
}
