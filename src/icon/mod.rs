//! Icon extraction: locate, extract, render, convert, reconstruct alpha, encode.

pub mod alpha;
mod encode;
mod handle;
mod location;
mod raster;
mod render;

pub use alpha::{AlphaStrategy, Passthrough, WhiteKeyAlpha};
pub use encode::{EncodedIcon, IconFormat, encode_png};
pub use handle::{OwnedIcon, extract};
pub use location::{IconLocation, RawIconLocation, expand_env_vars};
pub use raster::{IconRaster, convert};
pub use render::{IconMetadata, RenderedIcon, ResourceScope, render};

use crate::error::IconError;
use crate::pal::{HostEnvironment, IconSubsystem};

/// Runs the whole extraction for one icon location at a time.
///
/// Each call acquires its own handles and device contexts and releases all of
/// them before returning.
pub struct IconPipeline<'p> {
    subsystem: &'p dyn IconSubsystem,
    alpha: Box<dyn AlphaStrategy + 'p>,
}

impl<'p> IconPipeline<'p> {
    pub fn new(subsystem: &'p dyn IconSubsystem) -> Self {
        Self {
            subsystem,
            alpha: Box::new(WhiteKeyAlpha),
        }
    }

    /// Replaces the default [`WhiteKeyAlpha`] transparency heuristic.
    pub fn with_alpha_strategy(mut self, strategy: impl AlphaStrategy + 'p) -> Self {
        self.alpha = Box::new(strategy);
        self
    }

    pub fn try_extract(&self, location: &IconLocation) -> Result<EncodedIcon, IconError> {
        let icon = extract(self.subsystem, location)?;
        let rendered = render(self.subsystem, &icon);
        icon.release();

        let raster = convert(&rendered?)?;
        let raster = self.alpha.reconstruct(&raster);
        encode_png(&raster)
    }

    /// Extracts the icon at `location` as base64 encoded PNG, or `None` if any
    /// stage fails.
    pub fn extract_icon(&self, location: &IconLocation) -> Option<String> {
        self.extract_encoded(location).map(|icon| icon.to_base64())
    }

    pub fn extract_encoded(&self, location: &IconLocation) -> Option<EncodedIcon> {
        match self.try_extract(location) {
            Ok(icon) => {
                tracing::debug!(
                    "Icon OK: {} [{}] ({} bytes)",
                    location.file_path().display(),
                    location.resource_index(),
                    icon.bytes().len()
                );
                Some(icon)
            }
            Err(err) => {
                tracing::warn!(
                    "Icon FAIL: {} [{}] -> {}",
                    location.file_path().display(),
                    location.resource_index(),
                    err
                );
                None
            }
        }
    }

    /// Resolves a raw descriptor location and extracts its icon.
    pub fn extract_raw(
        &self,
        raw: &RawIconLocation,
        env: &dyn HostEnvironment,
    ) -> Option<EncodedIcon> {
        let location = IconLocation::resolve(raw, env).ok()?;
        self.extract_encoded(&location)
    }
}
