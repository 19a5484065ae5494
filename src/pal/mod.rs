//! Host platform primitives used by the icon pipeline.
//!
//! Every handle-producing call here has a matching release call. The pipeline
//! never releases a handle it did not acquire through this layer, which keeps
//! the pairing checkable with an instrumented implementation.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[cfg(windows)]
#[path = "windows.rs"]
mod platform;

#[cfg(windows)]
pub use platform::Win32;

/// Owned icon handle (`HICON` on Windows).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct IconHandle(pub isize);

/// Device context handle, either the screen's or an in-memory one.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DcHandle(pub isize);

/// Bitmap handle (`HBITMAP` on Windows).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BitmapHandle(pub isize);

/// Object that was selected into a device context before ours.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct GdiObject(pub isize);

/// Result of extracting a single icon index; either side may be missing.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct IconPair {
    pub large: Option<IconHandle>,
    pub small: Option<IconHandle>,
}

/// Sub-bitmaps owned by an icon's info block. Both must be deleted by the caller.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct IconInfo {
    pub color: Option<BitmapHandle>,
    pub mask: Option<BitmapHandle>,
}

/// Snapshot of a device bitmap's pixels, read as 4 bytes per pixel in BGRA order,
/// top-down rows.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DeviceBitmap {
    pub width: i32,
    pub height: i32,
    /// Bit depth the device reported for the bitmap itself.
    pub bits_per_pixel: u16,
    pub bytes: Vec<u8>,
}

/// Icon and GDI primitives of the host.
pub trait IconSubsystem {
    /// Number of icons embedded in `file`.
    fn icon_count(&self, file: &Path) -> Result<u32, PlatformError>;

    /// Extracts the icon at `index`, asking for both the large and small variant.
    fn extract_icon_pair(&self, file: &Path, index: u32) -> Result<IconPair, PlatformError>;

    fn destroy_icon(&self, icon: IconHandle);

    /// Standard icon width and height of the system.
    fn standard_icon_size(&self) -> (i32, i32);

    fn screen_dc(&self) -> Result<DcHandle, PlatformError>;

    fn release_screen_dc(&self, dc: DcHandle);

    fn create_memory_dc(&self, screen: DcHandle) -> Result<DcHandle, PlatformError>;

    fn delete_memory_dc(&self, dc: DcHandle);

    /// Creates a bitmap compatible with `screen`.
    fn create_bitmap(
        &self,
        screen: DcHandle,
        width: i32,
        height: i32,
    ) -> Result<BitmapHandle, PlatformError>;

    fn delete_bitmap(&self, bitmap: BitmapHandle);

    /// Selects `bitmap` into `dc`, returning whatever was selected before.
    fn select_bitmap(&self, dc: DcHandle, bitmap: BitmapHandle) -> Result<GdiObject, PlatformError>;

    fn restore_selection(&self, dc: DcHandle, previous: GdiObject);

    /// Draws `icon` at the origin of `dc` using the normal draw mode.
    fn draw_icon(
        &self,
        dc: DcHandle,
        icon: IconHandle,
        width: i32,
        height: i32,
    ) -> Result<(), PlatformError>;

    fn icon_info(&self, icon: IconHandle) -> Result<IconInfo, PlatformError>;

    /// Reads the pixels of `bitmap`. The bitmap must not be selected into any
    /// device context at this point.
    fn read_bitmap(&self, dc: DcHandle, bitmap: BitmapHandle) -> Result<DeviceBitmap, PlatformError>;
}

/// Process environment and file system queries needed to resolve icon locations.
pub trait HostEnvironment {
    fn var(&self, name: &str) -> Option<String>;

    fn exists(&self, path: &Path) -> bool;

    /// Directory holding the system's own resource containers.
    fn system_root(&self) -> Option<PathBuf>;
}

/// [`HostEnvironment`] backed by the current process.
#[derive(Debug, Default, Copy, Clone)]
pub struct ProcessEnvironment;

impl HostEnvironment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn system_root(&self) -> Option<PathBuf> {
        self.var("SystemRoot")
            .or_else(|| self.var("windir"))
            .map(PathBuf::from)
            .or_else(|| cfg!(windows).then(|| PathBuf::from(r"C:\Windows")))
    }
}

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("{message} ({code:#010x})")]
    Win32 { code: i32, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0} failed")]
    CallFailed(&'static str),

    #[error("operation not supported on this platform")]
    Unsupported,
}
