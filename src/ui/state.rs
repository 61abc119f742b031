use std::sync::{Arc, Mutex};

use serde::Serialize;

/// One bar of the confidence chart.
#[derive(Debug, Clone, Serialize)]
pub struct ScorePoint {
    pub label: String,
    pub confidence: f32,
}

/// Everything the browser page renders: the latest annotated frame (as
/// JPEG), the current glyph, the chart rows, and a status line. Overwritten
/// in place each iteration; no history is kept.
#[derive(Debug, Default)]
pub struct Panel {
    pub jpeg: Option<Vec<u8>>,
    pub glyph: String,
    pub scores: Vec<ScorePoint>,
    pub status: String,
    pub running: bool,
    pub frame_number: u64,
}

/// Serializable view of the panel sent over the event stream.
#[derive(Debug, Serialize)]
pub struct PanelSnapshot {
    pub glyph: String,
    pub scores: Vec<ScorePoint>,
    pub status: String,
    pub running: bool,
    pub frame_number: u64,
}

impl Panel {
    pub fn snapshot(&self) -> PanelSnapshot {
        PanelSnapshot {
            glyph: self.glyph.clone(),
            scores: self.scores.clone(),
            status: self.status.clone(),
            running: self.running,
            frame_number: self.frame_number,
        }
    }
}

pub type SharedPanel = Arc<Mutex<Panel>>;

pub fn shared_panel() -> SharedPanel {
    Arc::new(Mutex::new(Panel::default()))
}
