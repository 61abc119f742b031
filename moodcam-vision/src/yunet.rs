//! YuNet detector post-processing.
//!
//! YuNet is an anchor-free face detector. For each stride (8, 16, 32) it
//! emits per-grid-cell tensors, twelve outputs in total:
//! cls_8, cls_16, cls_32, obj_8, obj_16, obj_32, bbox_8, bbox_16, bbox_32,
//! kps_8, kps_16, kps_32.
//!
//! A cell decodes directly from its grid position:
//! cx = (col + dx) * stride, cy = (row + dy) * stride,
//! w = dw * stride, h = dh * stride, all normalized by the input size.
//! The confidence is sigmoid(cls * obj). Landmark outputs are ignored here;
//! emotion classification crops from the bounding box alone.

use anyhow::{bail, Result};

/// Fixed square input size of the detector model.
pub const INPUT_SIZE: usize = 640;

const STRIDES: [usize; 3] = [8, 16, 32];

/// One decoded candidate, bbox as (x, y, w, h) normalized to [0, 1].
#[derive(Debug, Clone)]
pub struct RawFace {
    pub bbox: [f32; 4],
    pub score: f32,
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Decode the model outputs into candidates above `score_threshold`.
///
/// `outputs` holds the twelve (shape, data) tensors in model output order.
pub fn decode_outputs(
    outputs: &[(Vec<i64>, Vec<f32>)],
    score_threshold: f32,
) -> Result<Vec<RawFace>> {
    if outputs.len() < 9 {
        bail!("expected at least 9 detector outputs, got {}", outputs.len());
    }

    let mut faces = Vec::new();
    for (scale, &stride) in STRIDES.iter().enumerate() {
        let grid = INPUT_SIZE / stride;
        let cells = grid * grid;
        let cls = tensor_data(outputs, scale, cells, 1)?;
        let obj = tensor_data(outputs, scale + 3, cells, 1)?;
        let boxes = tensor_data(outputs, scale + 6, cells, 4)?;

        for row in 0..grid {
            for col in 0..grid {
                let idx = row * grid + col;
                let score = sigmoid(cls[idx] * obj[idx]);
                if score < score_threshold {
                    continue;
                }

                let dx = boxes[idx * 4];
                let dy = boxes[idx * 4 + 1];
                let dw = boxes[idx * 4 + 2];
                let dh = boxes[idx * 4 + 3];

                let cx = (col as f32 + dx) * stride as f32 / INPUT_SIZE as f32;
                let cy = (row as f32 + dy) * stride as f32 / INPUT_SIZE as f32;
                let w = dw * stride as f32 / INPUT_SIZE as f32;
                let h = dh * stride as f32 / INPUT_SIZE as f32;

                faces.push(RawFace {
                    bbox: [cx - w / 2.0, cy - h / 2.0, w, h],
                    score,
                });
            }
        }
    }

    Ok(faces)
}

fn tensor_data<'a>(
    outputs: &'a [(Vec<i64>, Vec<f32>)],
    index: usize,
    cells: usize,
    channels: i64,
) -> Result<&'a [f32]> {
    let Some((shape, data)) = outputs.get(index) else {
        bail!("missing detector output at index {index}");
    };
    if shape.as_slice() != [1, cells as i64, channels].as_slice() {
        bail!(
            "unexpected shape {:?} at output {}, expected [1, {}, {}]",
            shape,
            index,
            cells,
            channels
        );
    }
    Ok(data)
}

/// Non-maximum suppression over decoded candidates.
pub fn nms(candidates: Vec<RawFace>, iou_threshold: f32) -> Vec<RawFace> {
    if iou_threshold >= 1.0 {
        return candidates;
    }
    let mut sorted = candidates;
    sorted.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut keep: Vec<RawFace> = Vec::new();
    for candidate in sorted {
        if keep
            .iter()
            .all(|kept| iou(&kept.bbox, &candidate.bbox) <= iou_threshold)
        {
            keep.push(candidate);
        }
    }
    keep
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = (a[0] + a[2]).min(b[0] + b[2]);
    let y2 = (a[1] + a[3]).min(b[1] + b[3]);

    if x2 <= x1 || y2 <= y1 {
        return 0.0;
    }

    let inter = (x2 - x1) * (y2 - y1);
    inter / (a[2] * a[3] + b[2] * b[3] - inter)
}
