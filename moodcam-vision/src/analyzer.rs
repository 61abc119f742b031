use std::path::PathBuf;

use anyhow::{anyhow, Result};
use image::{imageops, DynamicImage, RgbImage};
use ndarray::Array4;
use ort::{session::Session, value::Value};
use thiserror::Error;

use crate::face::{EmotionScores, FaceEmotion, FaceRegion};
use crate::model;
use crate::yunet;

/// Failure modes of a single analysis call. An absent face is an expected
/// outcome; model breakage is not, and callers treat the two differently.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("no face detected")]
    NoFaceDetected,
    #[error("analyzer inference failed: {0}")]
    Inference(#[source] anyhow::Error),
}

/// Analyzer boundary: one frame in, a list of analyzed faces out.
pub trait EmotionAnalyzer {
    fn analyze(&mut self, frame: &RgbImage) -> Result<Vec<FaceEmotion>, AnalyzeError>;
}

#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    pub detector_model: PathBuf,
    pub emotion_model: PathBuf,
    pub score_threshold: f32,
    pub nms_threshold: f32,
    /// When false, a frame without a localized face is scored whole-frame
    /// instead of reported as `NoFaceDetected`.
    pub enforce_detection: bool,
}

/// Two-stage analyzer: YuNet face detection followed by per-face emotion
/// classification (48x48 grayscale crops).
pub struct Analyzer {
    detector: Session,
    classifier: Session,
    options: AnalyzerOptions,
}

const CLASSIFY_SIZE: u32 = 48;

impl Analyzer {
    pub fn new(options: AnalyzerOptions) -> Result<Self> {
        Ok(Self {
            detector: model::detector_session(&options.detector_model)?,
            classifier: model::emotion_session(&options.emotion_model)?,
            options,
        })
    }

    fn detect_regions(&mut self, frame: &RgbImage) -> Result<Vec<FaceRegion>> {
        let target = yunet::INPUT_SIZE as u32;
        let (frame_w, frame_h) = frame.dimensions();

        // Letterbox onto a square canvas so the detector sees no distortion
        let scale = target as f32 / frame_w.max(frame_h) as f32;
        let scaled_w = (frame_w as f32 * scale) as u32;
        let scaled_h = (frame_h as f32 * scale) as u32;
        let resized = DynamicImage::ImageRgb8(frame.clone()).resize_exact(
            scaled_w,
            scaled_h,
            imageops::FilterType::Triangle,
        );
        let mut canvas = DynamicImage::new_rgb8(target, target);
        let pad_x = (target - scaled_w) / 2;
        let pad_y = (target - scaled_h) / 2;
        imageops::overlay(&mut canvas, &resized, pad_x as i64, pad_y as i64);

        let input = bgr_planes(&canvas.to_rgb8());
        let input_array = Array4::from_shape_vec(
            (1, 3, yunet::INPUT_SIZE, yunet::INPUT_SIZE),
            input,
        )?;
        let input_tensor = Value::from_array(input_array)?;
        let outputs = self.detector.run(ort::inputs![input_tensor])?;

        let mut raw: Vec<(Vec<i64>, Vec<f32>)> = Vec::new();
        for (_name, output) in outputs.iter() {
            let (shape, data) = output.try_extract_tensor::<f32>()?;
            raw.push((shape.iter().copied().collect(), data.to_vec()));
        }

        let candidates = yunet::decode_outputs(&raw, self.options.score_threshold)?;
        let kept = yunet::nms(candidates, self.options.nms_threshold);

        // Map normalized canvas coordinates back into frame pixels
        Ok(kept
            .into_iter()
            .map(|face| {
                let x = (face.bbox[0] * target as f32 - pad_x as f32) / scale;
                let y = (face.bbox[1] * target as f32 - pad_y as f32) / scale;
                let w = face.bbox[2] * target as f32 / scale;
                let h = face.bbox[3] * target as f32 / scale;
                FaceRegion {
                    x: x.round() as i32,
                    y: y.round() as i32,
                    width: w.round().max(1.0) as u32,
                    height: h.round().max(1.0) as u32,
                }
            })
            .collect())
    }

    fn classify_region(&mut self, frame: &RgbImage, region: &FaceRegion) -> Result<EmotionScores> {
        let (x, y, w, h) = region
            .intersect(frame.width(), frame.height())
            .ok_or_else(|| anyhow!("face region lies outside the frame"))?;
        let crop = imageops::crop_imm(frame, x, y, w, h).to_image();
        let gray = DynamicImage::ImageRgb8(crop)
            .resize_exact(CLASSIFY_SIZE, CLASSIFY_SIZE, imageops::FilterType::Triangle)
            .to_luma8();

        let mut input = Vec::with_capacity((CLASSIFY_SIZE * CLASSIFY_SIZE) as usize);
        for pixel in gray.pixels() {
            input.push(pixel[0] as f32 / 255.0);
        }
        let input_array = Array4::from_shape_vec(
            (1, CLASSIFY_SIZE as usize, CLASSIFY_SIZE as usize, 1),
            input,
        )?;
        let input_tensor = Value::from_array(input_array)?;
        let outputs = self.classifier.run(ort::inputs![input_tensor])?;

        let (_shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        if data.len() < 7 {
            anyhow::bail!("emotion model returned {} values, expected 7", data.len());
        }
        let mut logits = [0.0f32; 7];
        logits.copy_from_slice(&data[..7]);
        Ok(EmotionScores::from_probabilities(softmax(logits)))
    }
}

impl EmotionAnalyzer for Analyzer {
    fn analyze(&mut self, frame: &RgbImage) -> Result<Vec<FaceEmotion>, AnalyzeError> {
        let mut regions = self
            .detect_regions(frame)
            .map_err(AnalyzeError::Inference)?;

        if regions.is_empty() {
            if self.options.enforce_detection {
                return Err(AnalyzeError::NoFaceDetected);
            }
            // Permissive mode: score the whole frame as one candidate region
            regions.push(FaceRegion::full_frame(frame.width(), frame.height()));
        }

        let mut faces = Vec::with_capacity(regions.len());
        for region in regions {
            let scores = self
                .classify_region(frame, &region)
                .map_err(AnalyzeError::Inference)?;
            faces.push(FaceEmotion {
                region,
                dominant: scores.dominant(),
                scores,
            });
        }
        Ok(faces)
    }
}

/// Planar BGR float layout the detector expects, values in [0, 255].
fn bgr_planes(img: &RgbImage) -> Vec<f32> {
    let pixel_count = (img.width() * img.height()) as usize;
    let mut planes = vec![0.0f32; 3 * pixel_count];
    let (blue, rest) = planes.split_at_mut(pixel_count);
    let (green, red) = rest.split_at_mut(pixel_count);
    for (i, pixel) in img.pixels().enumerate() {
        red[i] = pixel[0] as f32;
        green[i] = pixel[1] as f32;
        blue[i] = pixel[2] as f32;
    }
    planes
}

fn softmax(mut values: [f32; 7]) -> [f32; 7] {
    let max = values.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    if sum > 0.0 {
        for v in values.iter_mut() {
            *v /= sum;
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_softmax_normalizes() {
        let probs = softmax([1.0, 2.0, 3.0, 0.0, -1.0, 0.5, 2.5]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        // Highest logit keeps the highest probability
        let peak = probs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        assert_eq!(peak, Some(2));
    }

    #[test]
    fn test_softmax_handles_large_logits() {
        let probs = softmax([500.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert!(probs[0] > 0.999);
        assert!(probs.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_bgr_planes_layout() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([10, 20, 30]));
        img.put_pixel(1, 0, Rgb([40, 50, 60]));
        let planes = bgr_planes(&img);
        // B plane, then G, then R
        assert_eq!(planes, vec![30.0, 60.0, 20.0, 50.0, 10.0, 40.0]);
    }
}
