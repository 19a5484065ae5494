use crate::error::IconError;
use crate::icon::RenderedIcon;

/// A device-independent RGBA image.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct IconRaster {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA pixels, `width * height` of them.
    pub pixels: Vec<[u8; 4]>,
}

impl IconRaster {
    /// Builds a raster, rejecting empty dimensions and mismatched pixel counts.
    pub fn new(width: u32, height: u32, pixels: Vec<[u8; 4]>) -> Option<Self> {
        let raster = Self {
            width,
            height,
            pixels,
        };
        raster.is_well_formed().then_some(raster)
    }

    pub fn is_well_formed(&self) -> bool {
        self.width > 0
            && self.height > 0
            && (self.width as usize).checked_mul(self.height as usize) == Some(self.pixels.len())
    }

    /// Flattens the pixels into RGBA bytes.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flatten().copied().collect()
    }
}

/// Interprets a rendered bitmap's BGRA bytes as an RGBA raster.
///
/// The fourth byte is passed through untouched: it may be real alpha or just
/// padding, which is for the alpha reconstruction step to sort out.
pub fn convert(rendered: &RenderedIcon) -> Result<IconRaster, IconError> {
    let bitmap = &rendered.bitmap;

    let (width, height) = match (u32::try_from(bitmap.width), u32::try_from(bitmap.height)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
        _ => {
            return Err(IconError::FormatUnsupported(format!(
                "bitmap reports {}x{}",
                bitmap.width, bitmap.height
            )));
        }
    };

    if bitmap.bits_per_pixel != 32 {
        tracing::debug!(
            "Bitmap reports {} bits per pixel, reading it as 32",
            bitmap.bits_per_pixel
        );
    }
    if !rendered.metadata.has_color {
        tracing::debug!("Icon has no color bitmap, reading the monochrome layout as 32 bit");
    }

    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4));
    if expected != Some(bitmap.bytes.len()) {
        return Err(IconError::FormatUnsupported(format!(
            "{} bytes for a {}x{} bitmap",
            bitmap.bytes.len(),
            width,
            height
        )));
    }

    let pixels = bitmap
        .bytes
        .chunks_exact(4)
        .map(|bgra| [bgra[2], bgra[1], bgra[0], bgra[3]])
        .collect();

    Ok(IconRaster {
        width,
        height,
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icon::IconMetadata;
    use crate::pal::DeviceBitmap;

    fn rendered(width: i32, height: i32, bytes: Vec<u8>) -> RenderedIcon {
        RenderedIcon {
            bitmap: DeviceBitmap {
                width,
                height,
                bits_per_pixel: 32,
                bytes,
            },
            metadata: IconMetadata {
                has_color: true,
                has_mask: true,
            },
        }
    }

    #[test]
    fn swaps_blue_and_red() {
        let raster = convert(&rendered(2, 1, vec![1, 2, 3, 4, 10, 20, 30, 0])).unwrap();
        assert_eq!(raster.width, 2);
        assert_eq!(raster.height, 1);
        assert_eq!(raster.pixels, vec![[3, 2, 1, 4], [30, 20, 10, 0]]);
    }

    #[test]
    fn rejects_short_buffers() {
        let result = convert(&rendered(2, 2, vec![0; 12]));
        assert!(matches!(result, Err(IconError::FormatUnsupported(_))));
    }

    #[test]
    fn rejects_empty_dimensions() {
        assert!(convert(&rendered(0, 4, Vec::new())).is_err());
        assert!(convert(&rendered(4, -4, vec![0; 64])).is_err());
    }

    #[test]
    fn legacy_layout_is_read_the_same_way() {
        let mut input = rendered(1, 1, vec![9, 8, 7, 255]);
        input.bitmap.bits_per_pixel = 1;
        input.metadata.has_color = false;
        let raster = convert(&input).unwrap();
        assert_eq!(raster.pixels, vec![[7, 8, 9, 255]]);
    }

    #[test]
    fn raster_constructor_checks_pixel_count() {
        assert!(IconRaster::new(2, 2, vec![[0; 4]; 3]).is_none());
        assert!(IconRaster::new(0, 0, Vec::new()).is_none());
        assert!(IconRaster::new(1, 2, vec![[0; 4]; 2]).is_some());
    }
}
