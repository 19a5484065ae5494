#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use shortcut_icons::pal::{
    BitmapHandle, DcHandle, DeviceBitmap, GdiObject, HostEnvironment, IconHandle, IconInfo,
    IconPair, IconSubsystem, PlatformError,
};

pub const ICON_SIZE: i32 = 4;

/// Platform call that can be made to fail.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Step {
    Count,
    Extract,
    ScreenDc,
    MemoryDc,
    Bitmap,
    Select,
    Draw,
    IconInfo,
    ReadBitmap,
}

pub const ALL_STEPS: [Step; 9] = [
    Step::Count,
    Step::Extract,
    Step::ScreenDc,
    Step::MemoryDc,
    Step::Bitmap,
    Step::Select,
    Step::Draw,
    Step::IconInfo,
    Step::ReadBitmap,
];

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
enum Kind {
    Icon,
    ScreenDc,
    MemoryDc,
    Bitmap,
    Selection,
}

#[derive(Debug, Copy, Clone)]
pub struct FakeFile {
    pub icons: u32,
    pub large: bool,
    pub small: bool,
    pub has_color: bool,
}

impl FakeFile {
    pub fn with_icons(icons: u32) -> Self {
        Self {
            icons,
            large: true,
            small: true,
            has_color: true,
        }
    }
}

/// Icon subsystem double that tracks every live handle.
#[derive(Default)]
pub struct FakeSubsystem {
    files: HashMap<PathBuf, FakeFile>,
    failing: Option<Step>,
    /// Standard icon size override
    icon_size: Option<(i32, i32)>,
    next_handle: Cell<isize>,
    live: RefCell<HashSet<(Kind, isize)>>,
    acquired: Cell<usize>,
    released: Cell<usize>,
    bad_releases: Cell<usize>,
    /// Icon index each icon handle was extracted from, and whether it has color
    icon_index: RefCell<HashMap<isize, (u32, bool)>>,
    /// Bitmap currently selected into each memory DC
    selected: RefCell<HashMap<isize, isize>>,
    /// Icon index drawn into each bitmap
    drawn: RefCell<HashMap<isize, u32>>,
    extracted_indices: RefCell<Vec<u32>>,
}

impl FakeSubsystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, file: FakeFile) -> Self {
        self.files.insert(path.into(), file);
        self
    }

    pub fn failing_at(mut self, step: Step) -> Self {
        self.failing = Some(step);
        self
    }

    pub fn with_icon_size(mut self, width: i32, height: i32) -> Self {
        self.icon_size = Some((width, height));
        self
    }

    pub fn acquired(&self) -> usize {
        self.acquired.get()
    }

    pub fn released(&self) -> usize {
        self.released.get()
    }

    pub fn live_handles(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn bad_releases(&self) -> usize {
        self.bad_releases.get()
    }

    pub fn extracted_indices(&self) -> Vec<u32> {
        self.extracted_indices.borrow().clone()
    }

    fn fail(&self, step: Step) -> Result<(), PlatformError> {
        if self.failing == Some(step) {
            return Err(PlatformError::CallFailed("injected"));
        }
        Ok(())
    }

    fn acquire(&self, kind: Kind) -> isize {
        let handle = self.next_handle.get() + 1;
        self.next_handle.set(handle);
        self.live.borrow_mut().insert((kind, handle));
        self.acquired.set(self.acquired.get() + 1);
        handle
    }

    fn release(&self, kind: Kind, handle: isize) {
        if self.live.borrow_mut().remove(&(kind, handle)) {
            self.released.set(self.released.get() + 1);
        } else {
            self.bad_releases.set(self.bad_releases.get() + 1);
        }
    }

    /// Pixel pattern of an icon: BGRA bytes that depend on its index.
    pub fn pattern(index: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        for i in 0..(ICON_SIZE * ICON_SIZE) as u32 {
            let pixel = match i % 4 {
                // Transparent corner
                0 => [0, 0, 0, 0],
                // White background claiming to be opaque
                1 => [255, 255, 255, 255],
                // Artwork
                _ => [(10 * index + i) as u8, 100, 200, 255],
            };
            bytes.extend_from_slice(&pixel);
        }
        bytes
    }
}

impl IconSubsystem for FakeSubsystem {
    fn icon_count(&self, file: &Path) -> Result<u32, PlatformError> {
        self.fail(Step::Count)?;
        Ok(self.files.get(file).map(|f| f.icons).unwrap_or(0))
    }

    fn extract_icon_pair(&self, file: &Path, index: u32) -> Result<IconPair, PlatformError> {
        self.fail(Step::Extract)?;
        self.extracted_indices.borrow_mut().push(index);

        let Some(spec) = self.files.get(file).copied() else {
            return Ok(IconPair::default());
        };
        if index >= spec.icons {
            return Ok(IconPair::default());
        }

        let make = |present: bool| {
            present.then(|| {
                let handle = self.acquire(Kind::Icon);
                self.icon_index
                    .borrow_mut()
                    .insert(handle, (index, spec.has_color));
                IconHandle(handle)
            })
        };
        let large = make(spec.large);
        let small = make(spec.small);
        Ok(IconPair { large, small })
    }

    fn destroy_icon(&self, icon: IconHandle) {
        self.release(Kind::Icon, icon.0);
    }

    fn standard_icon_size(&self) -> (i32, i32) {
        self.icon_size.unwrap_or((ICON_SIZE, ICON_SIZE))
    }

    fn screen_dc(&self) -> Result<DcHandle, PlatformError> {
        self.fail(Step::ScreenDc)?;
        Ok(DcHandle(self.acquire(Kind::ScreenDc)))
    }

    fn release_screen_dc(&self, dc: DcHandle) {
        self.release(Kind::ScreenDc, dc.0);
    }

    fn create_memory_dc(&self, _screen: DcHandle) -> Result<DcHandle, PlatformError> {
        self.fail(Step::MemoryDc)?;
        Ok(DcHandle(self.acquire(Kind::MemoryDc)))
    }

    fn delete_memory_dc(&self, dc: DcHandle) {
        self.release(Kind::MemoryDc, dc.0);
    }

    fn create_bitmap(
        &self,
        _screen: DcHandle,
        _width: i32,
        _height: i32,
    ) -> Result<BitmapHandle, PlatformError> {
        self.fail(Step::Bitmap)?;
        Ok(BitmapHandle(self.acquire(Kind::Bitmap)))
    }

    fn delete_bitmap(&self, bitmap: BitmapHandle) {
        // Deleting a bitmap that is still selected leaks it
        if self.selected.borrow().values().any(|&b| b == bitmap.0) {
            self.bad_releases.set(self.bad_releases.get() + 1);
        }
        self.release(Kind::Bitmap, bitmap.0);
    }

    fn select_bitmap(&self, dc: DcHandle, bitmap: BitmapHandle) -> Result<GdiObject, PlatformError> {
        self.fail(Step::Select)?;
        self.selected.borrow_mut().insert(dc.0, bitmap.0);
        Ok(GdiObject(self.acquire(Kind::Selection)))
    }

    fn restore_selection(&self, dc: DcHandle, previous: GdiObject) {
        self.selected.borrow_mut().remove(&dc.0);
        self.release(Kind::Selection, previous.0);
    }

    fn draw_icon(
        &self,
        dc: DcHandle,
        icon: IconHandle,
        _width: i32,
        _height: i32,
    ) -> Result<(), PlatformError> {
        self.fail(Step::Draw)?;
        let bitmap = self.selected.borrow().get(&dc.0).copied();
        let index = self.icon_index.borrow().get(&icon.0).copied();
        match (bitmap, index) {
            (Some(bitmap), Some((index, _))) => {
                self.drawn.borrow_mut().insert(bitmap, index);
                Ok(())
            }
            _ => Err(PlatformError::CallFailed("DrawIconEx")),
        }
    }

    fn icon_info(&self, icon: IconHandle) -> Result<IconInfo, PlatformError> {
        self.fail(Step::IconInfo)?;
        let Some((_, has_color)) = self.icon_index.borrow().get(&icon.0).copied() else {
            return Err(PlatformError::CallFailed("GetIconInfo"));
        };
        let color = has_color.then(|| BitmapHandle(self.acquire(Kind::Bitmap)));
        let mask = Some(BitmapHandle(self.acquire(Kind::Bitmap)));
        Ok(IconInfo { color, mask })
    }

    fn read_bitmap(&self, _dc: DcHandle, bitmap: BitmapHandle) -> Result<DeviceBitmap, PlatformError> {
        self.fail(Step::ReadBitmap)?;
        if self.selected.borrow().values().any(|&b| b == bitmap.0) {
            return Err(PlatformError::CallFailed("GetDIBits on a selected bitmap"));
        }
        let index = self
            .drawn
            .borrow()
            .get(&bitmap.0)
            .copied()
            .ok_or(PlatformError::CallFailed("GetDIBits on an empty bitmap"))?;

        Ok(DeviceBitmap {
            width: ICON_SIZE,
            height: ICON_SIZE,
            bits_per_pixel: 32,
            bytes: Self::pattern(index),
        })
    }
}

/// Environment double with a fixed set of files and variables.
#[derive(Default)]
pub struct FakeEnv {
    pub vars: HashMap<String, String>,
    pub files: HashSet<PathBuf>,
    pub system_root: Option<PathBuf>,
}

impl FakeEnv {
    pub fn with_files<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            system_root: Some(PathBuf::from(r"C:\Windows")),
            ..Default::default()
        }
    }
}

impl HostEnvironment for FakeEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    fn system_root(&self) -> Option<PathBuf> {
        self.system_root.clone()
    }
}
