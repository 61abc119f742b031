use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{error, info, warn};
use moodcam_vision::{Analyzer, Camera, EmotionAnalyzer, FrameSource};

use crate::config::Config;
use crate::detect::{detect_step, FailureTracker};
use crate::emoji::EmojiTable;
use crate::ui::{self, DisplaySurface, WebSurface};

const IDLE_POLL: Duration = Duration::from_millis(50);

/// Start/stop controls shared between the UI server and the capture loop.
///
/// Stop is polled once per iteration, so cancellation latency is bounded by
/// one frame capture plus one inference call.
#[derive(Default)]
pub struct Signals {
    start: AtomicBool,
    stop: AtomicBool,
}

impl Signals {
    pub fn request_start(&self) {
        self.start.store(true, Ordering::SeqCst);
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    fn take_start(&self) -> bool {
        self.start.swap(false, Ordering::SeqCst)
    }

    fn take_stop(&self) -> bool {
        self.stop.swap(false, Ordering::SeqCst)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames: u64,
    pub analyzer_failures: u64,
}

/// Drive one capture session: read, analyze, annotate, publish, until the
/// stop signal is observed or the source fails.
///
/// The source is consumed, so the device is released exactly once no matter
/// how the session ends. A read failure is the only hard error path.
pub fn run_session<S, A, D>(
    mut source: S,
    analyzer: &mut A,
    surface: &D,
    emojis: &EmojiTable,
    signals: &Signals,
) -> Result<SessionStats>
where
    S: FrameSource,
    A: EmotionAnalyzer + ?Sized,
    D: DisplaySurface,
{
    let mut stats = SessionStats::default();
    let mut failures = FailureTracker::default();

    loop {
        let mut frame = source
            .next_frame()
            .context("reading frame from capture device")?;

        let step = detect_step(analyzer, &mut frame, emojis, &mut failures);

        surface.show_frame(&frame);
        surface.show_glyph(step.glyph);
        if !step.scores.is_empty() {
            surface.show_chart(&step.scores);
        }

        stats.frames += 1;
        if signals.take_stop() {
            break;
        }
    }

    stats.analyzer_failures = failures.failures();
    Ok(stats)
}

/// Supervisor: serve the UI, then alternate between waiting for a start
/// signal and running a capture session. Runs until the process exits.
pub fn run(cfg: Config) -> Result<()> {
    let emojis = EmojiTable::builtin();
    let signals = Arc::new(Signals::default());
    let panel = ui::state::shared_panel();

    ui::server::spawn(&cfg.bind, panel.clone(), signals.clone())
        .context("starting preview server")?;
    info!("UI available at http://{}", cfg.bind);

    let mut analyzer =
        Analyzer::new(cfg.analyzer_options()).context("initializing emotion analyzer")?;
    let surface = WebSurface::new(panel, cfg.jpeg_quality);

    loop {
        while !signals.take_start() {
            thread::sleep(IDLE_POLL);
        }
        // Discard a stop left over from the idle period
        signals.take_stop();

        info!("opening camera {}", cfg.camera);
        let camera = match Camera::open(&cfg.camera) {
            Ok(camera) => camera,
            Err(err) => {
                error!("cannot open camera: {err:#}");
                surface.set_status(&format!("Cannot open camera: {err:#}"));
                continue;
            }
        };

        surface.set_running(true);
        surface.set_status("Detecting emotions...");

        match run_session(camera, &mut analyzer, &surface, &emojis, &signals) {
            Ok(stats) => {
                if stats.analyzer_failures > 0 {
                    warn!(
                        "session ended with {} analyzer failure(s)",
                        stats.analyzer_failures
                    );
                }
                info!("webcam stopped after {} frame(s)", stats.frames);
                surface.clear_all();
                surface.set_status("Webcam stopped. Thanks for trying!");
            }
            Err(err) => {
                error!("capture failed: {err:#}");
                surface.clear_all();
                surface.set_status("Cannot read from webcam.");
            }
        }
        surface.set_running(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use image::RgbImage;
    use moodcam_vision::{AnalyzeError, EmotionLabel, FaceEmotion};
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    struct ScriptedSource {
        frames: VecDeque<Result<RgbImage>>,
        reads: Arc<AtomicUsize>,
        released: Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        fn new(frames: Vec<Result<RgbImage>>) -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
            let reads = Arc::new(AtomicUsize::new(0));
            let released = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    frames: frames.into(),
                    reads: reads.clone(),
                    released: released.clone(),
                },
                reads,
                released,
            )
        }
    }

    impl FrameSource for ScriptedSource {
        fn next_frame(&mut self) -> Result<RgbImage> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.frames
                .pop_front()
                .unwrap_or_else(|| Err(anyhow!("script exhausted")))
        }
    }

    impl Drop for ScriptedSource {
        fn drop(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct CountingAnalyzer {
        calls: usize,
    }

    impl EmotionAnalyzer for CountingAnalyzer {
        fn analyze(&mut self, _frame: &RgbImage) -> Result<Vec<FaceEmotion>, AnalyzeError> {
            self.calls += 1;
            Ok(vec![])
        }
    }

    /// Records published regions; optionally requests a stop the first time
    /// a frame is shown, simulating a click mid-iteration.
    #[derive(Default)]
    struct RecordingSurface {
        frames: AtomicUsize,
        glyphs: Mutex<Vec<String>>,
        charts: AtomicUsize,
        stop_on_first_frame: Option<Arc<Signals>>,
    }

    impl DisplaySurface for RecordingSurface {
        fn show_frame(&self, _frame: &RgbImage) {
            if self.frames.fetch_add(1, Ordering::SeqCst) == 0 {
                if let Some(signals) = &self.stop_on_first_frame {
                    signals.request_stop();
                }
            }
        }

        fn show_glyph(&self, glyph: &str) {
            self.glyphs.lock().unwrap().push(glyph.to_string());
        }

        fn show_chart(&self, _scores: &[(EmotionLabel, f32)]) {
            self.charts.fetch_add(1, Ordering::SeqCst);
        }

        fn clear_all(&self) {}
    }

    fn frame() -> Result<RgbImage> {
        Ok(RgbImage::new(8, 8))
    }

    #[test]
    fn test_read_failure_ends_session_and_releases_device() {
        let (source, reads, released) =
            ScriptedSource::new(vec![frame(), frame(), Err(anyhow!("device unplugged"))]);
        let mut analyzer = CountingAnalyzer::default();
        let surface = RecordingSurface::default();
        let signals = Signals::default();
        let emojis = EmojiTable::builtin();

        let result = run_session(source, &mut analyzer, &surface, &emojis, &signals);

        assert!(result.is_err());
        // Two good frames analyzed, none after the failed read
        assert_eq!(analyzer.calls, 2);
        assert_eq!(reads.load(Ordering::SeqCst), 3);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_during_iteration_prevents_next_capture() {
        let (source, reads, released) =
            ScriptedSource::new(vec![frame(), frame(), frame(), frame()]);
        let mut analyzer = CountingAnalyzer::default();
        let signals = Arc::new(Signals::default());
        let surface = RecordingSurface {
            stop_on_first_frame: Some(signals.clone()),
            ..Default::default()
        };
        let emojis = EmojiTable::builtin();

        let stats = run_session(source, &mut analyzer, &surface, &emojis, &signals).unwrap();

        assert_eq!(stats.frames, 1);
        assert_eq!(reads.load(Ordering::SeqCst), 1);
        assert_eq!(analyzer.calls, 1);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_scores_skip_the_chart() {
        let (source, _reads, _released) = ScriptedSource::new(vec![frame()]);
        let mut analyzer = CountingAnalyzer::default();
        let signals = Signals::default();
        signals.request_stop();
        let surface = RecordingSurface::default();
        let emojis = EmojiTable::builtin();

        let stats = run_session(source, &mut analyzer, &surface, &emojis, &signals).unwrap();

        assert_eq!(stats.frames, 1);
        assert_eq!(surface.charts.load(Ordering::SeqCst), 0);
        // Idle glyph still published every iteration
        let glyphs = surface.glyphs.lock().unwrap();
        assert_eq!(glyphs.len(), 1);
        assert_eq!(glyphs[0], "😐");
    }
}
