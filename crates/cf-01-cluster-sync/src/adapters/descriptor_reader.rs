//! File Descriptor Reader Adapter
//!
//! Implements `DescriptorReader` for `file:` locations. A location may point
//! at a unit archive (`.jar`, read through `zip`), at an exploded unit
//! directory (`META-INF/MANIFEST.MF` inside it) or at a descriptor file
//! directly.

use async_trait::async_trait;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::algorithms::{descriptor_from_headers, parse_headers};
use crate::domain::{SyncError, UnitDescriptor};
use crate::ports::outbound::DescriptorReader;

/// Descriptor path inside a unit archive or an exploded unit.
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// Local file header signature of a zip archive.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Reads descriptors from the local filesystem.
#[derive(Debug, Default, Clone)]
pub struct FileDescriptorReader;

impl FileDescriptorReader {
    /// Create a reader.
    pub fn new() -> Self {
        Self
    }

    fn path_of(location: &Url) -> Result<PathBuf, SyncError> {
        if location.scheme() != "file" {
            return Err(SyncError::InvalidLocation {
                location: location.to_string(),
                reason: format!("unsupported scheme {}", location.scheme()),
            });
        }
        location
            .to_file_path()
            .map_err(|()| SyncError::InvalidLocation {
                location: location.to_string(),
                reason: "not a local path".to_string(),
            })
    }

    /// Manifest text stored in a unit archive. `None` when the archive has no
    /// manifest entry.
    fn manifest_from_archive(location: &Url, bytes: Vec<u8>) -> Result<Option<String>, SyncError> {
        let invalid = |reason: String| SyncError::InvalidDescriptor {
            location: location.to_string(),
            reason,
        };

        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| invalid(e.to_string()))?;
        let mut entry = match archive.by_name(MANIFEST_PATH) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(invalid(e.to_string())),
        };

        let mut text = String::new();
        entry
            .read_to_string(&mut text)
            .map_err(|e| invalid(format!("{MANIFEST_PATH}: {e}")))?;
        Ok(Some(text))
    }

    fn manifest_from_text(location: &Url, path: &Path, bytes: Vec<u8>) -> Result<String, SyncError> {
        String::from_utf8(bytes).map_err(|_| SyncError::InvalidDescriptor {
            location: location.to_string(),
            reason: format!("{} is neither an archive nor a manifest", path.display()),
        })
    }
}

#[async_trait]
impl DescriptorReader for FileDescriptorReader {
    async fn read_descriptor(&self, location: &Url) -> Result<Option<UnitDescriptor>, SyncError> {
        let mut path = Self::path_of(location)?;

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SyncError::Runtime(format!("{}: {e}", path.display()))),
        };
        if metadata.is_dir() {
            path.push(MANIFEST_PATH);
        }

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SyncError::Runtime(format!("{}: {e}", path.display()))),
        };

        let text = if bytes.starts_with(ZIP_MAGIC) {
            match Self::manifest_from_archive(location, bytes)? {
                Some(text) => text,
                None => {
                    debug!(path = %path.display(), "Unit archive has no manifest");
                    return Ok(None);
                }
            }
        } else {
            Self::manifest_from_text(location, &path, bytes)?
        };

        debug!(path = %path.display(), "Read unit descriptor");
        Ok(Some(descriptor_from_headers(&parse_headers(&text))))
    }
}
