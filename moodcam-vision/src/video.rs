use anyhow::{Context, Result};
use image::RgbImage;
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, Format, FourCC};

/// Source of RGB frames. The webcam implements this; tests substitute
/// scripted sources.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<RgbImage>;
}

/// V4L2 webcam. The device is held for the lifetime of the value and
/// released on drop.
pub struct Camera {
    stream: Stream<'static>,
    width: u32,
    height: u32,
    fourcc: FourCC,
}

impl Camera {
    pub fn open(device: &str) -> Result<Self> {
        let dev = Device::with_path(device).context("open camera")?;
        let current = dev.format().context("get format")?;
        let fmt = negotiate_format(current, |wanted| dev.set_format(wanted).ok());
        let stream = Stream::with_buffers(&dev, Type::VideoCapture, 4).context("stream")?;
        Ok(Self {
            stream,
            width: fmt.width,
            height: fmt.height,
            fourcc: fmt.fourcc,
        })
    }
}

impl FrameSource for Camera {
    fn next_frame(&mut self) -> Result<RgbImage> {
        let (data, meta) = self.stream.next().context("capture frame")?;
        log::debug!(
            "captured frame: width={} height={} fourcc={:?} seq={:?} len={}",
            self.width,
            self.height,
            self.fourcc,
            meta.sequence,
            data.len()
        );
        let rgb = match self.fourcc {
            f if f == FourCC::new(b"RGB3") => data.to_vec(),
            f if f == FourCC::new(b"YUYV") => yuyv_to_rgb(self.width, self.height, data)?,
            f if f == FourCC::new(b"GREY") => grey_to_rgb(self.width, self.height, data)?,
            other => {
                log::warn!(
                    "unexpected pixel format {:?}, passing through raw len={}",
                    other,
                    data.len()
                );
                data.to_vec()
            }
        };
        let expected = (self.width * self.height * 3) as usize;
        if rgb.len() < expected {
            anyhow::bail!(
                "frame buffer too small: got {}, expected {} (fourcc {:?})",
                rgb.len(),
                expected,
                self.fourcc
            );
        }
        RgbImage::from_raw(self.width, self.height, rgb)
            .ok_or_else(|| anyhow::anyhow!("failed to build image buffer"))
    }
}

/// Prefer RGB, fall back to YUYV, else keep whatever the device offers.
///
/// `try_set` reports the format the driver actually adopted; drivers may
/// substitute a different fourcc than the one requested.
fn negotiate_format<F>(mut fmt: Format, mut try_set: F) -> Format
where
    F: FnMut(&Format) -> Option<Format>,
{
    let rgb = FourCC::new(b"RGB3");
    let desired = Format::new(fmt.width, fmt.height, rgb);
    fmt = try_set(&desired).unwrap_or(fmt);
    if fmt.fourcc != rgb {
        let yuyv = Format::new(fmt.width, fmt.height, FourCC::new(b"YUYV"));
        fmt = try_set(&yuyv).unwrap_or(fmt);
    }
    fmt
}

fn yuyv_to_rgb(width: u32, height: u32, data: &[u8]) -> Result<Vec<u8>> {
    let expected = (width * height * 2) as usize;
    if data.len() < expected {
        anyhow::bail!("short YUYV buffer: {} < {}", data.len(), expected);
    }
    let mut out = Vec::with_capacity((width * height * 3) as usize);
    for chunk in data[..expected].chunks_exact(4) {
        let u = chunk[1] as f32 - 128.0;
        let v = chunk[3] as f32 - 128.0;
        for &y in &[chunk[0], chunk[2]] {
            let y = y as f32;
            out.push(clamp(y + 1.402 * v));
            out.push(clamp(y - 0.344136 * u - 0.714136 * v));
            out.push(clamp(y + 1.772 * u));
        }
    }
    Ok(out)
}

fn grey_to_rgb(width: u32, height: u32, data: &[u8]) -> Result<Vec<u8>> {
    let expected = (width * height) as usize;
    if data.len() < expected {
        anyhow::bail!("short GREY buffer: {} < {}", data.len(), expected);
    }
    let mut out = Vec::with_capacity(expected * 3);
    for &y in &data[..expected] {
        out.extend_from_slice(&[y, y, y]);
    }
    Ok(out)
}

fn clamp(v: f32) -> u8 {
    v.max(0.0).min(255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(fourcc: &[u8; 4]) -> Format {
        Format::new(640, 480, FourCC::new(fourcc))
    }

    fn accept(wanted: &Format) -> Option<Format> {
        Some(Format::new(wanted.width, wanted.height, wanted.fourcc))
    }

    #[test]
    fn test_negotiation_prefers_rgb() {
        // A camera supporting both formats must end at RGB3, not YUYV
        let got = negotiate_format(fmt(b"YUYV"), accept);
        assert_eq!(got.fourcc, FourCC::new(b"RGB3"));
    }

    #[test]
    fn test_negotiation_keeps_rgb_when_already_set() {
        let got = negotiate_format(fmt(b"RGB3"), accept);
        assert_eq!(got.fourcc, FourCC::new(b"RGB3"));
    }

    #[test]
    fn test_negotiation_falls_back_to_yuyv() {
        let got = negotiate_format(fmt(b"MJPG"), |wanted| {
            if wanted.fourcc == FourCC::new(b"RGB3") {
                None
            } else {
                accept(wanted)
            }
        });
        assert_eq!(got.fourcc, FourCC::new(b"YUYV"));
    }

    #[test]
    fn test_negotiation_keeps_device_format_when_both_fail() {
        let got = negotiate_format(fmt(b"MJPG"), |_| None);
        assert_eq!(got.fourcc, FourCC::new(b"MJPG"));
    }

    #[test]
    fn test_negotiation_handles_driver_substitution() {
        // The RGB3 request "succeeds" but the driver reports another fourcc
        let got = negotiate_format(fmt(b"MJPG"), |wanted| {
            if wanted.fourcc == FourCC::new(b"RGB3") {
                Some(Format::new(wanted.width, wanted.height, FourCC::new(b"MJPG")))
            } else {
                accept(wanted)
            }
        });
        assert_eq!(got.fourcc, FourCC::new(b"YUYV"));
    }

    #[test]
    fn test_grey_expansion() {
        let rgb = grey_to_rgb(2, 1, &[0, 255]).unwrap();
        assert_eq!(rgb, vec![0, 0, 0, 255, 255, 255]);
    }

    #[test]
    fn test_yuyv_short_buffer() {
        assert!(yuyv_to_rgb(4, 4, &[0; 8]).is_err());
    }

    #[test]
    fn test_yuyv_grey_pixel() {
        // Y=128, U=V=128 decodes to mid grey on both pixels of the pair
        let rgb = yuyv_to_rgb(2, 1, &[128, 128, 128, 128]).unwrap();
        assert_eq!(rgb, vec![128, 128, 128, 128, 128, 128]);
    }
}
