use exif::{In, Reader, Tag};
use image::{imageops, DynamicImage};
use std::io::Cursor;

/// Camera orientation correction (rotation and flipping)
pub struct ImageOrientation;

impl ImageOrientation {
    /// Read the EXIF orientation tag (1-8). Images without EXIF data, or
    /// with an unreadable tag, report 1 (upright).
    pub fn read_exif_orientation(data: &[u8]) -> u8 {
        let mut cursor = Cursor::new(data);
        let Ok(exif) = Reader::new().read_from_container(&mut cursor) else {
            return 1;
        };

        exif.get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .and_then(|value| u8::try_from(value).ok())
            .filter(|value| (1..=8).contains(value))
            .unwrap_or(1)
    }

    /// Rotation and flips needed for an EXIF orientation.
    /// Returns (rotate_angle, flip_horizontal, flip_vertical)
    pub fn transforms_for(orientation: u8) -> (Option<u16>, bool, bool) {
        match orientation {
            2 => (None, true, false),
            3 => (Some(180), false, false),
            4 => (None, false, true),
            5 => (Some(270), true, false),
            6 => (Some(90), false, false),
            7 => (Some(90), true, false),
            8 => (Some(270), false, false),
            _ => (None, false, false),
        }
    }

    /// Bring a decoded image upright using the orientation stored in `data`.
    pub fn normalize(mut img: DynamicImage, data: &[u8]) -> DynamicImage {
        let orientation = Self::read_exif_orientation(data);
        if orientation == 1 {
            return img;
        }

        let (rotate, flip_h, flip_v) = Self::transforms_for(orientation);
        tracing::debug!(
            orientation = orientation,
            rotate = ?rotate,
            flip_horizontal = flip_h,
            flip_vertical = flip_v,
            "Applying EXIF orientation"
        );

        if let Some(angle) = rotate {
            img = Self::rotate(img, angle);
        }
        if flip_h {
            img = DynamicImage::ImageRgb8(imageops::flip_horizontal(&img.to_rgb8()));
        }
        if flip_v {
            img = DynamicImage::ImageRgb8(imageops::flip_vertical(&img.to_rgb8()));
        }
        img
    }

    /// Clockwise rotation by 90, 180 or 270 degrees; other angles are ignored.
    pub fn rotate(img: DynamicImage, angle: u16) -> DynamicImage {
        match angle {
            90 => DynamicImage::ImageRgb8(imageops::rotate90(&img.to_rgb8())),
            180 => DynamicImage::ImageRgb8(imageops::rotate180(&img.to_rgb8())),
            270 => DynamicImage::ImageRgb8(imageops::rotate270(&img.to_rgb8())),
            _ => img,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    #[test]
    fn test_no_exif_is_upright() {
        assert_eq!(ImageOrientation::read_exif_orientation(b""), 1);
        assert_eq!(ImageOrientation::read_exif_orientation(b"not an image"), 1);
    }

    #[test]
    fn test_quarter_turns_swap_dimensions() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 2, Rgb([0, 0, 255])));

        assert_eq!(ImageOrientation::rotate(img.clone(), 90).dimensions(), (2, 4));
        assert_eq!(ImageOrientation::rotate(img.clone(), 180).dimensions(), (4, 2));
        assert_eq!(ImageOrientation::rotate(img.clone(), 270).dimensions(), (2, 4));
        assert_eq!(ImageOrientation::rotate(img, 45).dimensions(), (4, 2));
    }

    #[test]
    fn test_transforms_table() {
        assert_eq!(ImageOrientation::transforms_for(1), (None, false, false));
        assert_eq!(ImageOrientation::transforms_for(6), (Some(90), false, false));
        assert_eq!(ImageOrientation::transforms_for(8), (Some(270), false, false));
        assert_eq!(ImageOrientation::transforms_for(0), (None, false, false));
        assert_eq!(ImageOrientation::transforms_for(9), (None, false, false));
    }

    #[test]
    fn test_normalize_without_exif_keeps_pixels() {
        let mut buffer = RgbImage::new(3, 1);
        buffer.put_pixel(0, 0, Rgb([255, 0, 0]));
        let img = DynamicImage::ImageRgb8(buffer);

        let out = ImageOrientation::normalize(img, b"");
        assert_eq!(out.dimensions(), (3, 1));
        assert_eq!(out.to_rgb8().get_pixel(0, 0), &Rgb([255, 0, 0]));
    }
}
