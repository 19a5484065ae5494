use crate::error::IconError;
use crate::icon::IconLocation;
use crate::pal::{IconHandle, IconSubsystem};

/// An icon handle owned by the pipeline; destroyed when dropped.
pub struct OwnedIcon<'p> {
    subsystem: &'p dyn IconSubsystem,
    handle: IconHandle,
}

impl<'p> OwnedIcon<'p> {
    pub fn new(subsystem: &'p dyn IconSubsystem, handle: IconHandle) -> Self {
        Self { subsystem, handle }
    }

    pub fn handle(&self) -> IconHandle {
        self.handle
    }

    /// Destroys the icon now instead of at the end of the scope.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for OwnedIcon<'_> {
    fn drop(&mut self) {
        self.subsystem.destroy_icon(self.handle);
    }
}

impl std::fmt::Debug for OwnedIcon<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnedIcon")
            .field("handle", &self.handle)
            .finish()
    }
}

/// Extracts the icon at `location`, degrading an out of range index to the
/// file's first icon.
pub fn extract<'p>(
    subsystem: &'p dyn IconSubsystem,
    location: &IconLocation,
) -> Result<OwnedIcon<'p>, IconError> {
    let path = location.file_path();
    let requested = location.resource_index();
    let failure = |index: u32, reason: String| IconError::HandleExtraction {
        path: path.to_path_buf(),
        index,
        reason,
    };

    let count = subsystem
        .icon_count(path)
        .map_err(|err| failure(requested, err.to_string()))?;
    if count == 0 {
        return Err(failure(requested, "file carries no icons".to_string()));
    }

    let index = if requested >= count {
        let err = IconError::IndexOutOfRange {
            path: path.to_path_buf(),
            requested,
            count,
        };
        tracing::warn!("{}, using index 0", err);
        0
    } else {
        requested
    };

    let pair = subsystem
        .extract_icon_pair(path, index)
        .map_err(|err| failure(index, err.to_string()))?;
    tracing::trace!("Extracted {:?} from {} at {}", pair, path.display(), index);

    match (pair.large, pair.small) {
        (Some(large), small) => {
            if let Some(small) = small {
                subsystem.destroy_icon(small);
            }
            Ok(OwnedIcon::new(subsystem, large))
        }
        (None, Some(small)) => Ok(OwnedIcon::new(subsystem, small)),
        (None, None) => Err(failure(index, "no icon handle returned".to_string())),
    }
}
