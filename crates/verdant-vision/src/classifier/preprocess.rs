//! Image preprocessing matching the training pipeline

use crate::error::{Error, Result};
use image::imageops::FilterType;

/// Side length of the square model input
pub const INPUT_SIZE: u32 = 160;

/// Decode, resize and scale an image into an NHWC `f32` buffer.
///
/// The layout is `[1, size, size, 3]` flattened row-major, RGB, with
/// MobileNetV2 scaling (`x / 127.5 - 1`, so values lie in `[-1, 1]`).
pub fn preprocess(bytes: &[u8], size: u32) -> Result<Vec<f32>> {
    let decoded = image::load_from_memory(bytes).map_err(|e| Error::Image(e.to_string()))?;
    let rgb = decoded
        .resize_exact(size, size, FilterType::Nearest)
        .to_rgb8();

    Ok(rgb
        .pixels()
        .flat_map(|pixel| pixel.0)
        .map(|channel| f32::from(channel) / 127.5 - 1.0)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn encode(image: RgbImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut buf), format)
            .unwrap();
        buf
    }

    #[test]
    fn test_shape_and_scaling() {
        let png = encode(RgbImage::from_pixel(10, 7, Rgb([255, 0, 128])), ImageFormat::Png);
        let input = preprocess(&png, INPUT_SIZE).unwrap();

        assert_eq!(input.len(), (INPUT_SIZE * INPUT_SIZE * 3) as usize);
        assert!((input[0] - 1.0).abs() < 1e-6);
        assert!((input[1] + 1.0).abs() < 1e-6);
        assert!((input[2] - (128.0 / 127.5 - 1.0)).abs() < 1e-6);
        assert!(input.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn test_bmp_is_supported() {
        let bmp = encode(RgbImage::from_pixel(4, 4, Rgb([0, 0, 0])), ImageFormat::Bmp);
        let input = preprocess(&bmp, 8).unwrap();
        assert_eq!(input.len(), 8 * 8 * 3);
        assert!(input.iter().all(|v| (*v + 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_garbage_is_image_error() {
        assert!(matches!(preprocess(b"definitely not an image", 160), Err(Error::Image(_))));
        assert!(matches!(preprocess(&[], 160), Err(Error::Image(_))));
    }
}
