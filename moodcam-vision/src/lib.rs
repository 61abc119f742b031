pub mod analyzer;
pub mod face;
pub mod model;
pub mod overlay;
pub mod video;
pub mod yunet;

// Re-export commonly used types
pub use analyzer::{AnalyzeError, Analyzer, AnalyzerOptions, EmotionAnalyzer};
pub use face::{EmotionLabel, EmotionScores, FaceEmotion, FaceRegion};
pub use video::{Camera, FrameSource};
