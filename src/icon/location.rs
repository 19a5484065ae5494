use std::path::{Path, PathBuf};

use crate::error::IconError;
use crate::pal::HostEnvironment;

/// Icon location exactly as a link descriptor stores it: a path that may
/// contain `%VAR%` references, and a signed resource index.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct RawIconLocation {
    pub path: String,
    pub index: i32,
}

impl RawIconLocation {
    pub fn new(path: impl Into<String>, index: i32) -> Self {
        Self {
            path: path.into(),
            index,
        }
    }
}

/// A validated icon location: a non-empty file path and a resource index.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct IconLocation {
    file_path: PathBuf,
    resource_index: u32,
}

impl IconLocation {
    pub fn new(file_path: impl Into<PathBuf>, resource_index: u32) -> Result<Self, IconError> {
        let file_path = file_path.into();
        if file_path.as_os_str().is_empty() {
            return Err(IconError::LocationInvalid("empty icon path".to_string()));
        }

        Ok(Self {
            file_path,
            resource_index,
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn resource_index(&self) -> u32 {
        self.resource_index
    }

    /// Turns a raw descriptor location into a usable one.
    ///
    /// Environment references are expanded first. A path that does not exist is
    /// still accepted when it points into the system root, since system
    /// resource containers are not always visible as plain files.
    pub fn resolve(raw: &RawIconLocation, env: &dyn HostEnvironment) -> Result<Self, IconError> {
        if raw.path.trim().is_empty() {
            return Err(IconError::LocationInvalid("empty icon path".to_string()));
        }

        let expanded = expand_env_vars(&raw.path, |name| env.var(name));
        if expanded.trim().is_empty() {
            return Err(IconError::LocationInvalid(format!(
                "icon path {:?} expands to nothing",
                raw.path
            )));
        }

        let path = PathBuf::from(&expanded);
        if !env.exists(&path) {
            let system_root = env.system_root();
            let in_system_root = system_root
                .as_deref()
                .is_some_and(|root| is_under(&expanded, root));
            if !in_system_root {
                tracing::warn!("Icon file {} does not exist", expanded);
                return Err(IconError::LocationInvalid(format!(
                    "{} does not exist",
                    expanded
                )));
            }
            tracing::debug!("Icon file {} not visible, assuming system resource", expanded);
        }

        // Negative indices are resource ids, which are not addressable here
        let index = u32::try_from(raw.index).unwrap_or_else(|_| {
            tracing::debug!(
                "Icon index {} of {} is a resource id, using index 0",
                raw.index,
                expanded
            );
            0
        });

        Self::new(path, index)
    }
}

/// Expands `%NAME%` references. Unknown variables and unmatched `%` are kept
/// verbatim.
pub fn expand_env_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        match after.find('%') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                match lookup(name) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push('%');
                        out.push_str(name);
                        out.push('%');
                    }
                }
                rest = &after[end + 1..];
            }
            Some(_) => {
                // "%%" is not a reference
                out.push('%');
                rest = after;
            }
            None => {
                out.push('%');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn normalize(path: &str) -> String {
    path.replace('/', "\\")
        .trim_end_matches('\\')
        .to_lowercase()
}

fn is_under(path: &str, root: &Path) -> bool {
    let root = normalize(&root.to_string_lossy());
    if root.is_empty() {
        return false;
    }

    let path = normalize(path);
    path == root
        || path
            .strip_prefix(&root)
            .is_some_and(|rest| rest.starts_with('\\'))
}
