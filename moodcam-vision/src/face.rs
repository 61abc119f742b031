use std::fmt;

/// Emotion categories the classifier recognizes, in model output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmotionLabel {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl EmotionLabel {
    pub const ALL: [EmotionLabel; 7] = [
        EmotionLabel::Angry,
        EmotionLabel::Disgust,
        EmotionLabel::Fear,
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Surprise,
        EmotionLabel::Neutral,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EmotionLabel::Angry => "angry",
            EmotionLabel::Disgust => "disgust",
            EmotionLabel::Fear => "fear",
            EmotionLabel::Happy => "happy",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Surprise => "surprise",
            EmotionLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Face bounding region in frame pixel coordinates. The origin may be
/// negative when the detector places a box partially outside the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl FaceRegion {
    /// Region covering the entire frame, used as the candidate region when
    /// no face is localized and detection enforcement is disabled.
    pub fn full_frame(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// Clamp the region to the frame, returning `(x, y, w, h)` of the
    /// intersection or `None` when the region lies entirely outside.
    pub fn intersect(&self, frame_width: u32, frame_height: u32) -> Option<(u32, u32, u32, u32)> {
        let left = self.x.max(0) as u32;
        let top = self.y.max(0) as u32;
        let right = (self.x + self.width as i32).min(frame_width as i32);
        let bottom = (self.y + self.height as i32).min(frame_height as i32);
        if left >= frame_width || top >= frame_height {
            return None;
        }
        if right <= left as i32 || bottom <= top as i32 {
            return None;
        }
        Some((left, top, right as u32 - left, bottom as u32 - top))
    }
}

/// Per-label confidence, 0-100. Covers every category the classifier
/// recognizes, not just the dominant one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmotionScores {
    values: [f32; 7],
}

impl EmotionScores {
    /// Build from probabilities in [0, 1], scaling to percentages.
    pub fn from_probabilities(probabilities: [f32; 7]) -> Self {
        let mut values = probabilities;
        for v in values.iter_mut() {
            *v *= 100.0;
        }
        Self { values }
    }

    pub fn get(&self, label: EmotionLabel) -> f32 {
        self.values[label as usize]
    }

    /// Highest-confidence label; ties resolve to the earliest in label order.
    pub fn dominant(&self) -> EmotionLabel {
        let mut best = EmotionLabel::ALL[0];
        for &label in &EmotionLabel::ALL[1..] {
            if self.get(label) > self.get(best) {
                best = label;
            }
        }
        best
    }

    /// Ordered (label, confidence) table for chart display.
    pub fn to_table(&self) -> Vec<(EmotionLabel, f32)> {
        EmotionLabel::ALL
            .iter()
            .map(|&label| (label, self.get(label)))
            .collect()
    }
}

/// One analyzed face: where it is, what it most likely expresses, and the
/// full confidence table.
#[derive(Debug, Clone)]
pub struct FaceEmotion {
    pub region: FaceRegion,
    pub dominant: EmotionLabel,
    pub scores: EmotionScores,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominant_picks_peak() {
        let mut probs = [0.1; 7];
        probs[EmotionLabel::Surprise as usize] = 0.4;
        let scores = EmotionScores::from_probabilities(probs);
        assert_eq!(scores.dominant(), EmotionLabel::Surprise);
        assert!((scores.get(EmotionLabel::Surprise) - 40.0).abs() < 1e-4);
    }

    #[test]
    fn test_dominant_tie_prefers_label_order() {
        let scores = EmotionScores::from_probabilities([0.2; 7]);
        assert_eq!(scores.dominant(), EmotionLabel::Angry);
    }

    #[test]
    fn test_table_is_ordered_and_complete() {
        let scores = EmotionScores::from_probabilities([0.0, 0.1, 0.2, 0.3, 0.2, 0.1, 0.1]);
        let table = scores.to_table();
        assert_eq!(table.len(), 7);
        for (i, (label, value)) in table.iter().enumerate() {
            assert_eq!(*label, EmotionLabel::ALL[i]);
            assert!((value - scores.get(*label)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_intersect_clamps_to_frame() {
        let region = FaceRegion {
            x: -10,
            y: 20,
            width: 50,
            height: 200,
        };
        let (x, y, w, h) = region.intersect(100, 100).unwrap();
        assert_eq!((x, y, w, h), (0, 20, 40, 80));
    }

    #[test]
    fn test_intersect_outside_frame() {
        let region = FaceRegion {
            x: 200,
            y: 200,
            width: 10,
            height: 10,
        };
        assert!(region.intersect(100, 100).is_none());

        let negative = FaceRegion {
            x: -50,
            y: -50,
            width: 20,
            height: 20,
        };
        assert!(negative.intersect(100, 100).is_none());
    }
}
