use std::ffi::{OsStr, c_void};
use std::mem::size_of;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;

use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{
    BI_RGB, BITMAP, BITMAPINFO, BITMAPINFOHEADER, CreateCompatibleBitmap, CreateCompatibleDC,
    DIB_RGB_COLORS, DeleteDC, DeleteObject, GetDC, GetDIBits, GetObjectW, HBITMAP, HDC, HGDIOBJ,
    ReleaseDC, SelectObject,
};
use windows::Win32::Storage::FileSystem::WIN32_FIND_DATAW;
use windows::Win32::System::Com::{
    CLSCTX_INPROC_SERVER, COINIT_APARTMENTTHREADED, CoCreateInstance, CoInitializeEx,
    CoUninitialize, IPersistFile, STGM_READ,
};
use windows::Win32::UI::Shell::{ExtractIconExW, IShellLinkW, ShellLink};
use windows::Win32::UI::WindowsAndMessaging::{
    DI_NORMAL, DestroyIcon, DrawIconEx, GetIconInfo, GetSystemMetrics, HICON, ICONINFO, SM_CXICON,
    SM_CYICON,
};
use windows::core::{ComInterface, PCWSTR};

use super::{
    BitmapHandle, DcHandle, DeviceBitmap, GdiObject, IconHandle, IconInfo, IconPair,
    IconSubsystem, PlatformError,
};
use crate::catalog::{ShortcutDescriptor, ShortcutReader};
use crate::icon::RawIconLocation;

const MAX_PATH: usize = 260;
const INFOTIPSIZE: usize = 1024;

impl From<windows::core::Error> for PlatformError {
    fn from(err: windows::core::Error) -> Self {
        PlatformError::Win32 {
            code: err.code().0,
            message: err.message().to_string(),
        }
    }
}

/// The real Win32 icon, GDI and shell-link implementation.
#[derive(Debug, Default, Copy, Clone)]
pub struct Win32;

impl Win32 {
    pub fn new() -> Self {
        Self
    }
}

fn to_wide(s: &OsStr) -> Vec<u16> {
    s.encode_wide().chain(std::iter::once(0)).collect()
}

fn from_wide(buffer: &[u16]) -> String {
    let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    String::from_utf16_lossy(&buffer[..len])
}

impl IconSubsystem for Win32 {
    fn icon_count(&self, file: &Path) -> Result<u32, PlatformError> {
        let wide_path = to_wide(file.as_os_str());
        // Index -1 without output buffers asks for the total count
        let count = unsafe { ExtractIconExW(PCWSTR(wide_path.as_ptr()), -1, None, None, 0) };
        if count == u32::MAX {
            return Err(PlatformError::CallFailed("ExtractIconExW"));
        }
        Ok(count)
    }

    fn extract_icon_pair(&self, file: &Path, index: u32) -> Result<IconPair, PlatformError> {
        let wide_path = to_wide(file.as_os_str());
        let index = i32::try_from(index).map_err(|_| PlatformError::CallFailed("ExtractIconExW"))?;
        let mut large = HICON::default();
        let mut small = HICON::default();

        let extracted = unsafe {
            ExtractIconExW(
                PCWSTR(wide_path.as_ptr()),
                index,
                Some(&mut large as *mut HICON),
                Some(&mut small as *mut HICON),
                1,
            )
        };
        if extracted == u32::MAX {
            return Err(windows::core::Error::from_win32().into());
        }

        Ok(IconPair {
            large: (!large.is_invalid()).then_some(IconHandle(large.0)),
            small: (!small.is_invalid()).then_some(IconHandle(small.0)),
        })
    }

    fn destroy_icon(&self, icon: IconHandle) {
        if let Err(err) = unsafe { DestroyIcon(HICON(icon.0)) } {
            tracing::warn!("Failed to destroy icon {:?}: {}", icon, err);
        }
    }

    fn standard_icon_size(&self) -> (i32, i32) {
        unsafe { (GetSystemMetrics(SM_CXICON), GetSystemMetrics(SM_CYICON)) }
    }

    fn screen_dc(&self) -> Result<DcHandle, PlatformError> {
        let hdc = unsafe { GetDC(HWND::default()) };
        if hdc.is_invalid() {
            return Err(PlatformError::CallFailed("GetDC"));
        }
        Ok(DcHandle(hdc.0))
    }

    fn release_screen_dc(&self, dc: DcHandle) {
        if unsafe { ReleaseDC(HWND::default(), HDC(dc.0)) } == 0 {
            tracing::warn!("Failed to release screen DC {:?}", dc);
        }
    }

    fn create_memory_dc(&self, screen: DcHandle) -> Result<DcHandle, PlatformError> {
        let hdc = unsafe { CreateCompatibleDC(HDC(screen.0)) };
        if hdc.is_invalid() {
            return Err(PlatformError::CallFailed("CreateCompatibleDC"));
        }
        Ok(DcHandle(hdc.0))
    }

    fn delete_memory_dc(&self, dc: DcHandle) {
        if !unsafe { DeleteDC(HDC(dc.0)) }.as_bool() {
            tracing::warn!("Failed to delete memory DC {:?}", dc);
        }
    }

    fn create_bitmap(
        &self,
        screen: DcHandle,
        width: i32,
        height: i32,
    ) -> Result<BitmapHandle, PlatformError> {
        let hbm = unsafe { CreateCompatibleBitmap(HDC(screen.0), width, height) };
        if hbm.is_invalid() {
            return Err(PlatformError::CallFailed("CreateCompatibleBitmap"));
        }
        Ok(BitmapHandle(hbm.0))
    }

    fn delete_bitmap(&self, bitmap: BitmapHandle) {
        if !unsafe { DeleteObject(HBITMAP(bitmap.0)) }.as_bool() {
            tracing::warn!("Failed to delete bitmap {:?}", bitmap);
        }
    }

    fn select_bitmap(&self, dc: DcHandle, bitmap: BitmapHandle) -> Result<GdiObject, PlatformError> {
        let previous = unsafe { SelectObject(HDC(dc.0), HBITMAP(bitmap.0)) };
        if previous.is_invalid() {
            return Err(PlatformError::CallFailed("SelectObject"));
        }
        Ok(GdiObject(previous.0))
    }

    fn restore_selection(&self, dc: DcHandle, previous: GdiObject) {
        let replaced = unsafe { SelectObject(HDC(dc.0), HGDIOBJ(previous.0)) };
        if replaced.is_invalid() {
            tracing::warn!("Failed to restore selection of DC {:?}", dc);
        }
    }

    fn draw_icon(
        &self,
        dc: DcHandle,
        icon: IconHandle,
        width: i32,
        height: i32,
    ) -> Result<(), PlatformError> {
        unsafe {
            DrawIconEx(
                HDC(dc.0),
                0,
                0,
                HICON(icon.0),
                width,
                height,
                0,
                None,
                DI_NORMAL,
            )?;
        }
        Ok(())
    }

    fn icon_info(&self, icon: IconHandle) -> Result<IconInfo, PlatformError> {
        let mut info = ICONINFO::default();
        unsafe { GetIconInfo(HICON(icon.0), &mut info) }?;

        Ok(IconInfo {
            color: (!info.hbmColor.is_invalid()).then_some(BitmapHandle(info.hbmColor.0)),
            mask: (!info.hbmMask.is_invalid()).then_some(BitmapHandle(info.hbmMask.0)),
        })
    }

    fn read_bitmap(&self, dc: DcHandle, bitmap: BitmapHandle) -> Result<DeviceBitmap, PlatformError> {
        let hbm = HBITMAP(bitmap.0);

        let mut header = BITMAP::default();
        let written = unsafe {
            GetObjectW(
                hbm,
                size_of::<BITMAP>() as i32,
                Some(&mut header as *mut BITMAP as *mut c_void),
            )
        };
        if written == 0 {
            return Err(PlatformError::CallFailed("GetObjectW"));
        }

        let (width, height) = (header.bmWidth, header.bmHeight);
        if width <= 0 || height <= 0 {
            return Ok(DeviceBitmap {
                width,
                height,
                bits_per_pixel: header.bmBitsPixel,
                bytes: Vec::new(),
            });
        }

        // Ask for 32-bit BGRA, top-down
        let mut bmi = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                biHeight: -height,
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                biSizeImage: 0,
                biXPelsPerMeter: 0,
                biYPelsPerMeter: 0,
                biClrUsed: 0,
                biClrImportant: 0,
            },
            bmiColors: [Default::default()],
        };

        let mut bytes = vec![0u8; width as usize * height as usize * 4];
        let lines = unsafe {
            GetDIBits(
                HDC(dc.0),
                hbm,
                0,
                height as u32,
                Some(bytes.as_mut_ptr() as *mut c_void),
                &mut bmi,
                DIB_RGB_COLORS,
            )
        };
        if lines == 0 {
            return Err(PlatformError::CallFailed("GetDIBits"));
        }

        Ok(DeviceBitmap {
            width,
            height,
            bits_per_pixel: header.bmBitsPixel,
            bytes,
        })
    }
}

/// Keeps COM initialized on this thread for as long as it lives.
struct ComGuard {
    initialized: bool,
}

impl ComGuard {
    fn new() -> Self {
        let initialized = unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) }.is_ok();
        Self { initialized }
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        if self.initialized {
            unsafe { CoUninitialize() };
        }
    }
}

impl ShortcutReader for Win32 {
    fn read(&self, link: &Path) -> Result<ShortcutDescriptor, PlatformError> {
        let _com = ComGuard::new();

        unsafe {
            let shell_link: IShellLinkW = CoCreateInstance(&ShellLink, None, CLSCTX_INPROC_SERVER)?;
            let persist_file: IPersistFile = shell_link.cast()?;

            let wide_path = to_wide(link.as_os_str());
            persist_file.Load(PCWSTR(wide_path.as_ptr()), STGM_READ)?;

            let mut target = [0u16; MAX_PATH];
            let mut find_data = WIN32_FIND_DATAW::default();
            shell_link.GetPath(&mut target, &mut find_data, 0)?;

            let mut icon_path = [0u16; MAX_PATH];
            let mut icon_index = 0i32;
            shell_link.GetIconLocation(&mut icon_path, &mut icon_index)?;

            // Description and arguments are optional on a link
            let mut description = [0u16; INFOTIPSIZE];
            let _ = shell_link.GetDescription(&mut description);
            let mut arguments = [0u16; MAX_PATH];
            let _ = shell_link.GetArguments(&mut arguments);

            Ok(ShortcutDescriptor {
                target_path: from_wide(&target),
                arguments: from_wide(&arguments),
                description: from_wide(&description),
                icon_location: RawIconLocation {
                    path: from_wide(&icon_path),
                    index: icon_index,
                },
            })
        }
    }
}
