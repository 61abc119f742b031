use std::time::{Duration, Instant};

use image::RgbImage;
use log::{debug, warn};
use moodcam_vision::{overlay, AnalyzeError, EmotionAnalyzer, EmotionLabel};

use crate::emoji::EmojiTable;

/// Output of one detection pass over a frame.
pub struct StepOutput {
    pub glyph: &'static str,
    pub scores: Vec<(EmotionLabel, f32)>,
}

const FAILURE_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Counts analyzer breakage across a session and logs it at most once per
/// interval, so a persistently broken model shows up in the logs without
/// flooding them at frame rate.
#[derive(Default)]
pub struct FailureTracker {
    failures: u64,
    last_logged: Option<Instant>,
}

impl FailureTracker {
    pub fn failures(&self) -> u64 {
        self.failures
    }

    fn record(&mut self, err: &AnalyzeError) {
        self.failures += 1;
        let due = self
            .last_logged
            .map_or(true, |at| at.elapsed() >= FAILURE_LOG_INTERVAL);
        if due {
            warn!(
                "emotion analysis failed ({} failure(s) this session): {err}",
                self.failures
            );
            self.last_logged = Some(Instant::now());
        }
    }
}

/// Run the analyzer on one frame, annotate every face it reports, and pick
/// the glyph and score table for publication.
///
/// When several faces are present the published glyph and chart follow the
/// last face in detection order; every face still gets its box and caption.
/// A frame with no faces, or an analyzer failure, yields the idle glyph, an
/// empty table, and the untouched frame; failures are tracked, never
/// propagated.
pub fn detect_step<A: EmotionAnalyzer + ?Sized>(
    analyzer: &mut A,
    frame: &mut RgbImage,
    emojis: &EmojiTable,
    failures: &mut FailureTracker,
) -> StepOutput {
    let mut glyph = emojis.idle();
    let mut scores = Vec::new();

    match analyzer.analyze(frame) {
        Ok(faces) => {
            for face in &faces {
                glyph = emojis.glyph_for(face.dominant.as_str());
                scores = face.scores.to_table();
                overlay::draw_face(frame, face, glyph);
            }
        }
        Err(AnalyzeError::NoFaceDetected) => {
            debug!("no face in frame");
        }
        Err(err) => failures.record(&err),
    }

    StepOutput { glyph, scores }
}
