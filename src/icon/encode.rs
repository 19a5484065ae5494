use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::ImageEncoder;
use image::codecs::png::PngEncoder;

use crate::error::IconError;
use crate::icon::IconRaster;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum IconFormat {
    Png,
}

impl IconFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            IconFormat::Png => "image/png",
        }
    }
}

/// A compressed icon image.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct EncodedIcon {
    format: IconFormat,
    bytes: Vec<u8>,
}

impl EncodedIcon {
    pub fn format(&self) -> IconFormat {
        self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Standard base64 of the image bytes.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.format.mime_type(), self.to_base64())
    }
}

/// Compresses `raster` to PNG.
pub fn encode_png(raster: &IconRaster) -> Result<EncodedIcon, IconError> {
    if !raster.is_well_formed() {
        return Err(IconError::Encoding(format!(
            "{} pixels for a {}x{} raster",
            raster.pixels.len(),
            raster.width,
            raster.height
        )));
    }

    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(
            &raster.to_rgba_bytes(),
            raster.width,
            raster.height,
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| IconError::Encoding(e.to_string()))?;

    Ok(EncodedIcon {
        format: IconFormat::Png,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icon::alpha::TRANSPARENT;

    fn decode(icon: &EncodedIcon) -> image::RgbaImage {
        image::load_from_memory_with_format(icon.bytes(), image::ImageFormat::Png)
            .unwrap()
            .to_rgba8()
    }

    #[test]
    fn round_trips_opaque_and_keyed_pixels() {
        let pixels = vec![[200, 10, 30, 255], TRANSPARENT, [0, 0, 0, 255], TRANSPARENT];
        let raster = IconRaster::new(2, 2, pixels.clone()).unwrap();

        let icon = encode_png(&raster).unwrap();
        assert_eq!(icon.format(), IconFormat::Png);

        let decoded = decode(&icon);
        assert_eq!(decoded.dimensions(), (2, 2));
        let decoded: Vec<[u8; 4]> = decoded.pixels().map(|p| p.0).collect();
        assert_eq!(decoded, pixels);
    }

    #[test]
    fn malformed_raster_is_rejected() {
        let raster = IconRaster {
            width: 3,
            height: 3,
            pixels: vec![[0; 4]; 4],
        };
        assert!(matches!(encode_png(&raster), Err(IconError::Encoding(_))));
    }

    #[test]
    fn data_uri_carries_base64_payload() {
        let raster = IconRaster::new(1, 1, vec![[1, 2, 3, 255]]).unwrap();
        let icon = encode_png(&raster).unwrap();
        let uri = icon.to_data_uri();
        assert!(uri.starts_with("data:image/png;base64,"));
        assert_eq!(
            BASE64.decode(uri.trim_start_matches("data:image/png;base64,")).unwrap(),
            icon.bytes()
        );
    }
}
