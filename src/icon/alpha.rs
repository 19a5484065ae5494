//! Transparency recovery for bitmaps whose fourth channel can't be trusted.

use crate::icon::IconRaster;

/// The value every pixel judged transparent is normalized to.
pub const TRANSPARENT: [u8; 4] = [255, 255, 255, 0];

/// Channels above this count as "near white".
pub const NEAR_WHITE: u8 = 250;

/// Produces a raster with normalized transparency from a freshly converted one.
pub trait AlphaStrategy {
    fn reconstruct(&self, raster: &IconRaster) -> IconRaster;
}

/// Keys out pixels that are either flagged fully transparent or are near
/// white while claiming full opacity.
///
/// This is an approximation. Opaque white artwork becomes transparent, and a
/// pixel with zero alpha loses its color even when the zero was real.
#[derive(Debug, Default, Copy, Clone)]
pub struct WhiteKeyAlpha;

impl WhiteKeyAlpha {
    pub fn pixel(rgba: [u8; 4]) -> [u8; 4] {
        let [r, g, b, a] = rgba;
        if a == 0 {
            return TRANSPARENT;
        }
        if a == 255 && r > NEAR_WHITE && g > NEAR_WHITE && b > NEAR_WHITE {
            return TRANSPARENT;
        }
        rgba
    }
}

impl AlphaStrategy for WhiteKeyAlpha {
    fn reconstruct(&self, raster: &IconRaster) -> IconRaster {
        IconRaster {
            width: raster.width,
            height: raster.height,
            pixels: raster.pixels.iter().copied().map(Self::pixel).collect(),
        }
    }
}

/// Trusts the fourth channel as real alpha.
#[derive(Debug, Default, Copy, Clone)]
pub struct Passthrough;

impl AlphaStrategy for Passthrough {
    fn reconstruct(&self, raster: &IconRaster) -> IconRaster {
        raster.clone()
    }
}
