pub mod config;
pub mod detect;
pub mod emoji;
pub mod runner;
pub mod ui;

// Re-export vision types for convenience
pub use moodcam_vision::{
    AnalyzeError, Analyzer, AnalyzerOptions, Camera, EmotionAnalyzer, EmotionLabel, FaceEmotion,
    FaceRegion, FrameSource,
};
