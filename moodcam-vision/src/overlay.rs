//! Frame annotation: bounding boxes and label captions drawn with a small
//! 5x7 bitmap font. Characters without a bitmap (the emoji glyph included)
//! still advance the cursor so spacing stays stable.

use image::{Rgb, RgbImage};

use crate::face::{FaceEmotion, FaceRegion};

pub const BOX_COLOR: Rgb<u8> = Rgb([102, 255, 102]);
pub const TEXT_COLOR: Rgb<u8> = Rgb([255, 102, 0]);

const BOX_THICKNESS: i32 = 2;
const CHAR_ADVANCE: i32 = 6;
const CAPTION_OFFSET: i32 = 10;

/// Draw the bounding box and the "<label> <glyph>" caption for one face.
pub fn draw_face(frame: &mut RgbImage, face: &FaceEmotion, glyph: &str) {
    draw_box(frame, &face.region);
    let caption = format!("{} {}", face.dominant, glyph);
    draw_text(
        frame,
        face.region.x,
        face.region.y - CAPTION_OFFSET,
        &caption,
    );
}

/// Rectangle outline, clipped to the frame.
pub fn draw_box(frame: &mut RgbImage, region: &FaceRegion) {
    let right = region.x + region.width as i32 - 1;
    let bottom = region.y + region.height as i32 - 1;
    for t in 0..BOX_THICKNESS {
        hline(frame, region.x, right, region.y + t);
        hline(frame, region.x, right, bottom - t);
        vline(frame, region.y, bottom, region.x + t);
        vline(frame, region.y, bottom, right - t);
    }
}

pub fn draw_text(frame: &mut RgbImage, x: i32, y: i32, text: &str) {
    let mut cursor = x;
    for ch in text.chars().flat_map(|c| c.to_uppercase()) {
        if let Some(rows) = glyph_rows(ch) {
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..5 {
                    if (bits >> (4 - col)) & 1 == 1 {
                        put(frame, cursor + col, y + row as i32, TEXT_COLOR);
                    }
                }
            }
        }
        cursor += CHAR_ADVANCE;
    }
}

fn hline(frame: &mut RgbImage, x0: i32, x1: i32, y: i32) {
    for x in x0..=x1 {
        put(frame, x, y, BOX_COLOR);
    }
}

fn vline(frame: &mut RgbImage, y0: i32, y1: i32, x: i32) {
    for y in y0..=y1 {
        put(frame, x, y, BOX_COLOR);
    }
}

fn put(frame: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < frame.width() && (y as u32) < frame.height() {
        frame.put_pixel(x as u32, y as u32, color);
    }
}

fn glyph_rows(ch: char) -> Option<[u8; 7]> {
    match ch {
        'A' => Some([
            0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001,
        ]),
        'D' => Some([
            0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110,
        ]),
        'E' => Some([
            0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b11111,
        ]),
        'F' => Some([
            0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b10000,
        ]),
        'G' => Some([
            0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01110,
        ]),
        'H' => Some([
            0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001,
        ]),
        'I' => Some([
            0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110,
        ]),
        'L' => Some([
            0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111,
        ]),
        'N' => Some([
            0b10001, 0b11001, 0b10101, 0b10101, 0b10011, 0b10001, 0b10001,
        ]),
        'P' => Some([
            0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000,
        ]),
        'R' => Some([
            0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001,
        ]),
        'S' => Some([
            0b01111, 0b10000, 0b01110, 0b00001, 0b00001, 0b10001, 0b01110,
        ]),
        'T' => Some([
            0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100,
        ]),
        'U' => Some([
            0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110,
        ]),
        'Y' => Some([
            0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100,
        ]),
        ' ' => Some([0, 0, 0, 0, 0, 0, 0]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::{EmotionLabel, EmotionScores};

    fn black_frame(w: u32, h: u32) -> RgbImage {
        RgbImage::new(w, h)
    }

    #[test]
    fn test_box_corners_colored() {
        let mut frame = black_frame(100, 100);
        let region = FaceRegion {
            x: 10,
            y: 20,
            width: 30,
            height: 40,
        };
        draw_box(&mut frame, &region);
        assert_eq!(*frame.get_pixel(10, 20), BOX_COLOR);
        assert_eq!(*frame.get_pixel(39, 59), BOX_COLOR);
        // Interior untouched
        assert_eq!(*frame.get_pixel(25, 40), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_box_clipped_off_frame() {
        let mut frame = black_frame(50, 50);
        let region = FaceRegion {
            x: -10,
            y: -10,
            width: 200,
            height: 200,
        };
        // Must not panic; every side falls outside the frame
        draw_box(&mut frame, &region);
    }

    #[test]
    fn test_text_paints_known_glyphs() {
        let mut frame = black_frame(100, 20);
        draw_text(&mut frame, 2, 2, "HAPPY");
        let painted = frame.pixels().filter(|p| **p == TEXT_COLOR).count();
        assert!(painted > 0);
    }

    #[test]
    fn test_text_skips_unknown_glyphs() {
        let mut frame = black_frame(40, 20);
        draw_text(&mut frame, 2, 2, "😊");
        let painted = frame.pixels().filter(|p| **p == TEXT_COLOR).count();
        assert_eq!(painted, 0);
    }

    #[test]
    fn test_caption_above_top_edge_is_safe() {
        let mut frame = black_frame(60, 60);
        let mut probs = [0.0; 7];
        probs[EmotionLabel::Happy as usize] = 1.0;
        let scores = EmotionScores::from_probabilities(probs);
        let face = FaceEmotion {
            region: FaceRegion {
                x: 5,
                y: 3,
                width: 20,
                height: 20,
            },
            dominant: scores.dominant(),
            scores,
        };
        // Caption lands above y=0; drawing must clip, not panic
        draw_face(&mut frame, &face, "😊");
        assert_eq!(*frame.get_pixel(5, 3), BOX_COLOR);
    }
}
