//! Extracts the icons embedded in executables, libraries and shortcuts and
//! turns them into transparent PNG images.

pub mod catalog;
pub mod classify;
pub mod config;
pub mod error;
pub mod icon;
pub mod pal;
pub mod store;

pub use classify::{CategoryClassifier, CategoryKeywordTable, ClassificationInput};
pub use error::{ConfigError, IconError};
pub use icon::{EncodedIcon, IconLocation, IconPipeline, IconRaster, RawIconLocation};
pub use store::AppStore;
