use std::collections::HashMap;

/// Emotion label to display glyph. Built once at startup and handed to the
/// detection step rather than consulted as a global.
pub struct EmojiTable {
    glyphs: HashMap<&'static str, &'static str>,
    fallback: &'static str,
    idle: &'static str,
}

impl EmojiTable {
    pub fn builtin() -> Self {
        let glyphs = HashMap::from([
            ("happy", "😊"),
            ("sad", "😢"),
            ("angry", "😠"),
            ("surprise", "😲"),
            ("fear", "😨"),
            ("disgust", "🤢"),
            ("neutral", "😐"),
        ]);
        Self {
            glyphs,
            fallback: "🙂",
            idle: "😐",
        }
    }

    /// Glyph for a label. Matching is case-insensitive; unrecognized labels
    /// get the fallback glyph.
    pub fn glyph_for(&self, label: &str) -> &'static str {
        self.glyphs
            .get(label.to_lowercase().as_str())
            .copied()
            .unwrap_or(self.fallback)
    }

    /// Glyph shown before any face has produced a reading.
    pub fn idle(&self) -> &'static str {
        self.idle
    }
}
