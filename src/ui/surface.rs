use std::sync::MutexGuard;

use image::{codecs::jpeg::JpegEncoder, RgbImage};
use log::error;
use moodcam_vision::EmotionLabel;

use super::state::{Panel, ScorePoint, SharedPanel};

/// The three independently updatable display regions of the UI: image,
/// glyph text, and confidence chart. Each supports overwrite; `clear_all`
/// empties all of them. Tests substitute a recording implementation.
pub trait DisplaySurface {
    fn show_frame(&self, frame: &RgbImage);
    fn show_glyph(&self, glyph: &str);
    fn show_chart(&self, scores: &[(EmotionLabel, f32)]);
    fn clear_all(&self);
}

/// Publishes into the shared panel served by the HTTP preview server.
pub struct WebSurface {
    panel: SharedPanel,
    jpeg_quality: u8,
}

impl WebSurface {
    pub fn new(panel: SharedPanel, jpeg_quality: u8) -> Self {
        Self {
            panel,
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    pub fn set_status(&self, status: &str) {
        self.lock().status = status.to_string();
    }

    pub fn set_running(&self, running: bool) {
        self.lock().running = running;
    }

    fn lock(&self) -> MutexGuard<'_, Panel> {
        // A panicked server thread must not wedge the capture loop
        self.panel.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DisplaySurface for WebSurface {
    fn show_frame(&self, frame: &RgbImage) {
        let mut jpeg = Vec::new();
        if let Err(err) =
            JpegEncoder::new_with_quality(&mut jpeg, self.jpeg_quality).encode_image(frame)
        {
            error!("jpeg encode failed: {err}");
            return;
        }
        let mut panel = self.lock();
        panel.jpeg = Some(jpeg);
        panel.frame_number += 1;
    }

    fn show_glyph(&self, glyph: &str) {
        self.lock().glyph = glyph.to_string();
    }

    fn show_chart(&self, scores: &[(EmotionLabel, f32)]) {
        self.lock().scores = scores
            .iter()
            .map(|(label, confidence)| ScorePoint {
                label: label.to_string(),
                confidence: *confidence,
            })
            .collect();
    }

    fn clear_all(&self) {
        let mut panel = self.lock();
        panel.jpeg = None;
        panel.glyph.clear();
        panel.scores.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::state::shared_panel;

    #[test]
    fn test_show_frame_overwrites_and_counts() {
        let panel = shared_panel();
        let surface = WebSurface::new(panel.clone(), 80);
        surface.show_frame(&RgbImage::new(4, 4));
        surface.show_frame(&RgbImage::new(4, 4));

        let guard = panel.lock().unwrap();
        assert!(guard.jpeg.is_some());
        assert_eq!(guard.frame_number, 2);
    }

    #[test]
    fn test_clear_all_empties_every_region() {
        let panel = shared_panel();
        let surface = WebSurface::new(panel.clone(), 80);
        surface.show_frame(&RgbImage::new(4, 4));
        surface.show_glyph("😊");
        surface.show_chart(&[(EmotionLabel::Happy, 90.0)]);
        surface.clear_all();

        let guard = panel.lock().unwrap();
        assert!(guard.jpeg.is_none());
        assert!(guard.glyph.is_empty());
        assert!(guard.scores.is_empty());
    }
}
