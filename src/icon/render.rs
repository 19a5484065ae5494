use crate::error::IconError;
use crate::icon::OwnedIcon;
use crate::pal::{
    BitmapHandle, DcHandle, DeviceBitmap, GdiObject, IconInfo, IconSubsystem, PlatformError,
};

/// What the icon's info block told us about its layout.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct IconMetadata {
    /// The icon has its own color bitmap next to the mask.
    pub has_color: bool,
    pub has_mask: bool,
}

/// Pixels of a rendered icon, detached from every device resource.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RenderedIcon {
    pub bitmap: DeviceBitmap,
    pub metadata: IconMetadata,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Resource {
    ScreenDc(DcHandle),
    MemoryDc(DcHandle),
    Bitmap(BitmapHandle),
    Selection { dc: DcHandle, previous: GdiObject },
}

/// Owns every device resource acquired while rendering.
///
/// Resources are released strictly in reverse order of acquisition, either by
/// [`ResourceScope::close`] or when the scope is dropped on an error path.
pub struct ResourceScope<'p> {
    subsystem: &'p dyn IconSubsystem,
    held: Vec<Resource>,
}

impl<'p> ResourceScope<'p> {
    pub fn new(subsystem: &'p dyn IconSubsystem) -> Self {
        Self {
            subsystem,
            held: Vec::new(),
        }
    }

    pub fn screen_dc(&mut self) -> Result<DcHandle, PlatformError> {
        let dc = self.subsystem.screen_dc()?;
        self.held.push(Resource::ScreenDc(dc));
        Ok(dc)
    }

    pub fn memory_dc(&mut self, screen: DcHandle) -> Result<DcHandle, PlatformError> {
        let dc = self.subsystem.create_memory_dc(screen)?;
        self.held.push(Resource::MemoryDc(dc));
        Ok(dc)
    }

    pub fn bitmap(
        &mut self,
        screen: DcHandle,
        width: i32,
        height: i32,
    ) -> Result<BitmapHandle, PlatformError> {
        let bitmap = self.subsystem.create_bitmap(screen, width, height)?;
        self.held.push(Resource::Bitmap(bitmap));
        Ok(bitmap)
    }

    pub fn select(&mut self, dc: DcHandle, bitmap: BitmapHandle) -> Result<(), PlatformError> {
        let previous = self.subsystem.select_bitmap(dc, bitmap)?;
        self.held.push(Resource::Selection { dc, previous });
        Ok(())
    }

    /// Queries the icon info and takes ownership of its sub-bitmaps.
    pub fn icon_info(&mut self, icon: &OwnedIcon<'_>) -> Result<IconInfo, PlatformError> {
        let info = self.subsystem.icon_info(icon.handle())?;
        self.held.extend(info.color.map(Resource::Bitmap));
        self.held.extend(info.mask.map(Resource::Bitmap));
        Ok(info)
    }

    /// Puts back whatever `dc` had selected before our bitmap. Returns false if
    /// nothing of ours was selected into it.
    pub fn deselect(&mut self, dc: DcHandle) -> bool {
        let position = self
            .held
            .iter()
            .rposition(|r| matches!(r, Resource::Selection { dc: d, .. } if *d == dc));

        match position {
            Some(position) => {
                let resource = self.held.remove(position);
                self.release(resource);
                true
            }
            None => false,
        }
    }

    /// Releases everything still held.
    pub fn close(mut self) {
        self.release_all();
    }

    fn release_all(&mut self) {
        while let Some(resource) = self.held.pop() {
            self.release(resource);
        }
    }

    fn release(&self, resource: Resource) {
        tracing::trace!("Releasing {:?}", resource);
        match resource {
            Resource::ScreenDc(dc) => self.subsystem.release_screen_dc(dc),
            Resource::MemoryDc(dc) => self.subsystem.delete_memory_dc(dc),
            Resource::Bitmap(bitmap) => self.subsystem.delete_bitmap(bitmap),
            Resource::Selection { dc, previous } => self.subsystem.restore_selection(dc, previous),
        }
    }
}

impl Drop for ResourceScope<'_> {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// Draws `icon` onto an off-screen bitmap of the system's standard icon size
/// and reads the result back.
pub fn render(
    subsystem: &dyn IconSubsystem,
    icon: &OwnedIcon<'_>,
) -> Result<RenderedIcon, IconError> {
    let (width, height) = subsystem.standard_icon_size();
    if width <= 0 || height <= 0 {
        tracing::warn!("System reports a standard icon size of {}x{}", width, height);
        return Err(IconError::Render(PlatformError::CallFailed("GetSystemMetrics")));
    }

    let mut scope = ResourceScope::new(subsystem);
    let rendered = draw(&mut scope, icon, width, height).map_err(IconError::Render);
    scope.close();

    rendered
}

fn draw(
    scope: &mut ResourceScope<'_>,
    icon: &OwnedIcon<'_>,
    width: i32,
    height: i32,
) -> Result<RenderedIcon, PlatformError> {
    let screen = scope.screen_dc()?;
    let memory = scope.memory_dc(screen)?;
    let bitmap = scope.bitmap(screen, width, height)?;
    scope.select(memory, bitmap)?;

    scope.subsystem.draw_icon(memory, icon.handle(), width, height)?;
    let info = scope.icon_info(icon)?;

    // The bitmap has to leave the memory DC before its bits can be read
    scope.deselect(memory);
    let bitmap = scope.subsystem.read_bitmap(screen, bitmap)?;

    Ok(RenderedIcon {
        bitmap,
        metadata: IconMetadata {
            has_color: info.color.is_some(),
            has_mask: info.mask.is_some(),
        },
    })
}
