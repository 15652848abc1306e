// SPDX-License-Identifier: GPL-3.0-only

//! Visual feedback for accepted candidates
//!
//! Draws the accepted candidate's bounding polygon on a copy of the most
//! recent frame so the preview stream shows where the match was found.

use crate::backends::camera::CameraFrame;
use image::Rgb;
use imageproc::drawing::draw_line_segment_mut;
use std::sync::Arc;

const OUTLINE: Rgb<u8> = Rgb([0, 255, 0]);

/// Return a copy of `frame` with the polygon outlined.
///
/// Coordinates are in the frame's own pixel space; out-of-bounds segments
/// are clipped by the drawing routine. Returns `None` if the frame's
/// pixel data is inconsistent.
pub fn outline_polygon(frame: &CameraFrame, polygon: &[(f32, f32); 4]) -> Option<CameraFrame> {
    let mut image = frame.to_rgb_image()?;

    for i in 0..polygon.len() {
        let start = polygon[i];
        let end = polygon[(i + 1) % polygon.len()];
        draw_line_segment_mut(&mut image, start, end, OUTLINE);
    }

    Some(CameraFrame {
        width: frame.width,
        height: frame.height,
        data: Arc::from(image.into_raw().into_boxed_slice()),
        captured_at: frame.captured_at,
    })
}
