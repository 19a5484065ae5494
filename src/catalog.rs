//! Composes listing entries out of link descriptors, icons and categories.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::process::Command;

use crate::classify::{CategoryClassifier, ClassificationInput};
use crate::icon::{IconPipeline, RawIconLocation};
use crate::pal::{HostEnvironment, PlatformError};

/// What a link descriptor tells us about its target.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct ShortcutDescriptor {
    pub target_path: String,
    pub arguments: String,
    pub description: String,
    pub icon_location: RawIconLocation,
}

/// Reads link descriptor files.
pub trait ShortcutReader {
    fn read(&self, link: &Path) -> Result<ShortcutDescriptor, PlatformError>;
}

/// Starts a target detached from this process.
pub trait Launcher {
    fn launch(&self, target: &Path) -> Result<(), PlatformError>;
}

/// Launches through the shell so link files resolve like a double click.
#[derive(Debug, Default, Copy, Clone)]
pub struct CommandLauncher;

impl Launcher for CommandLauncher {
    fn launch(&self, target: &Path) -> Result<(), PlatformError> {
        if !target.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", target.display()),
            )
            .into());
        }

        let mut command = if cfg!(windows) {
            let mut command = Command::new("cmd");
            command.args(["/C", "start", ""]).arg(target);
            command
        } else {
            Command::new(target)
        };

        command.spawn()?;
        tracing::debug!("Launched {}", target.display());
        Ok(())
    }
}

/// One launchable entry with its optional icon.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct AppEntry {
    pub name: String,
    pub path: String,
    pub target_path: String,
    pub arguments: String,
    pub description: String,
    pub category: String,
    /// `data:image/png;base64,...`
    pub icon: Option<String>,
    /// Successful launches through this tool, kept by the app store.
    #[serde(default)]
    pub open_count: u32,
}

pub struct Catalog<'a> {
    reader: &'a dyn ShortcutReader,
    env: &'a dyn HostEnvironment,
    icons: &'a IconPipeline<'a>,
    classifier: &'a CategoryClassifier,
}

impl<'a> Catalog<'a> {
    pub fn new(
        reader: &'a dyn ShortcutReader,
        env: &'a dyn HostEnvironment,
        icons: &'a IconPipeline<'a>,
        classifier: &'a CategoryClassifier,
    ) -> Self {
        Self {
            reader,
            env,
            icons,
            classifier,
        }
    }

    /// Builds the entry for a `.lnk` or `.exe` file. Returns `None` for other
    /// files and for links that cannot be read.
    pub fn entry(&self, file: &Path) -> Option<AppEntry> {
        let extension = file
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)?;
        let name = file.file_stem()?.to_string_lossy().into_owned();
        let path = file.to_string_lossy().into_owned();

        let descriptor = match extension.as_str() {
            "lnk" => match self.reader.read(file) {
                Ok(descriptor) => descriptor,
                Err(err) => {
                    tracing::warn!("Failed to read shortcut {}: {}", file.display(), err);
                    return None;
                }
            },
            "exe" => ShortcutDescriptor {
                target_path: path.clone(),
                icon_location: RawIconLocation::new(path.clone(), 0),
                ..Default::default()
            },
            _ => return None,
        };

        // Links without their own icon show the target's
        let mut icon_location = descriptor.icon_location.clone();
        if icon_location.path.trim().is_empty() && !descriptor.target_path.is_empty() {
            icon_location = RawIconLocation::new(descriptor.target_path.clone(), 0);
        }

        let icon = self
            .icons
            .extract_raw(&icon_location, self.env)
            .map(|icon| icon.to_data_uri());

        let category = self
            .classifier
            .classify(&ClassificationInput::new(
                name.as_str(),
                descriptor.target_path.as_str(),
                descriptor.description.as_str(),
            ))
            .to_string();

        Some(AppEntry {
            name,
            path,
            target_path: descriptor.target_path,
            arguments: descriptor.arguments,
            description: descriptor.description,
            category,
            icon,
            open_count: 0,
        })
    }

    /// Lists every `.lnk` and `.exe` file directly inside `dir`, sorted by name.
    pub fn scan(&self, dir: &Path) -> std::io::Result<Vec<AppEntry>> {
        let mut files: Vec<_> = fs::read_dir(dir)?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        let entries: Vec<AppEntry> = files.iter().filter_map(|f| self.entry(f)).collect();
        tracing::debug!("Found {} entries in {}", entries.len(), dir.display());
        Ok(entries)
    }
}
