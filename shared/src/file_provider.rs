//! Image file naming and provider-issued file handles.
//!
//! The camera app and the mail client never see raw filesystem paths. The core
//! hands them a [`FileHandle`] scoped to the provider authority, and the shell maps
//! it onto the platform's own provider (a `FileProvider` on Android).

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::path::{Component, Path};
use thiserror::Error;
use url::Url;

pub const DEFAULT_PROVIDER_AUTHORITY: &str = "com.email.image_sender.fileprovider";
pub const DEFAULT_IMAGE_PREFIX: &str = "JPEG_";
pub const DEFAULT_IMAGE_SUFFIX: &str = ".jpg";
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

const CONTENT_SCHEME: &str = "content";

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum HandleError {
    #[error("invalid provider authority: {authority:?}")]
    InvalidAuthority { authority: String },

    #[error("path is not absolute: {path}")]
    RelativePath { path: String },

    #[error("handle issued by {found}, expected {expected}")]
    ForeignAuthority { expected: String, found: String },
}

/// Absolute location of an image file created for a capture.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PhotoPath(String);

impl PhotoPath {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.as_path().is_absolute()
    }

    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.as_path().file_name().and_then(|n| n.to_str())
    }
}

impl fmt::Display for PhotoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rule for naming capture destinations: `<prefix><timestamp>_<unique><suffix>`.
///
/// The core only decides the rule. The shell reads its own clock and picks the
/// unique part when it creates the file, the same way `File.createTempFile` does.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageNaming {
    pub prefix: String,
    pub timestamp_format: String,
    pub suffix: String,
}

impl Default for ImageNaming {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_IMAGE_PREFIX.to_string(),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            suffix: DEFAULT_IMAGE_SUFFIX.to_string(),
        }
    }
}

impl ImageNaming {
    /// Everything before the unique part, e.g. `JPEG_20240101_120000_`.
    ///
    /// An invalid timestamp format yields the prefix with an empty timestamp.
    #[must_use]
    pub fn file_prefix(&self, at: NaiveDateTime) -> String {
        let mut timestamp = String::new();
        if !self.has_valid_timestamp_format()
            || write!(timestamp, "{}", at.format(&self.timestamp_format)).is_err()
        {
            timestamp.clear();
        }
        format!("{}{}_", self.prefix, timestamp)
    }

    #[must_use]
    pub fn file_name(&self, at: NaiveDateTime, unique: u64) -> String {
        format!("{}{}{}", self.file_prefix(at), unique, self.suffix)
    }

    #[must_use]
    pub fn has_valid_timestamp_format(&self) -> bool {
        if self.timestamp_format.is_empty()
            || StrftimeItems::new(&self.timestamp_format).any(|item| matches!(item, Item::Error))
        {
            return false;
        }
        // Offset specifiers parse fine but cannot render a naive timestamp.
        let mut probe = String::new();
        write!(probe, "{}", NaiveDateTime::default().format(&self.timestamp_format)).is_ok()
    }

    /// True when `file_name` could have been produced by this rule.
    #[must_use]
    pub fn matches(&self, file_name: &str) -> bool {
        let Some(rest) = file_name.strip_prefix(&self.prefix) else {
            return false;
        };
        let Some(middle) = rest.strip_suffix(&self.suffix) else {
            return false;
        };
        let Some((timestamp, unique)) = middle.rsplit_once('_') else {
            return false;
        };

        !unique.is_empty()
            && unique.bytes().all(|b| b.is_ascii_digit())
            && NaiveDateTime::parse_from_str(timestamp, &self.timestamp_format).is_ok()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HandleAccess {
    Read,
    ReadWrite,
}

/// Opaque, provider-scoped reference to a file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileHandle {
    authority: String,
    path: PhotoPath,
    access: HandleAccess,
}

impl FileHandle {
    #[must_use]
    pub fn authority(&self) -> &str {
        &self.authority
    }

    #[must_use]
    pub fn access(&self) -> HandleAccess {
        self.access
    }

    #[must_use]
    pub fn is_writable(&self) -> bool {
        matches!(self.access, HandleAccess::ReadWrite)
    }

    /// The underlying path. Only the issuing side should look at this.
    #[must_use]
    pub fn path(&self) -> &PhotoPath {
        &self.path
    }

    /// `content://<authority>/<path segments>`.
    pub fn content_uri(&self) -> Result<Url, HandleError> {
        let invalid = || HandleError::InvalidAuthority {
            authority: self.authority.clone(),
        };

        let mut uri = Url::parse(&format!("{CONTENT_SCHEME}://{}", self.authority))
            .map_err(|_| invalid())?;
        {
            let mut segments = uri.path_segments_mut().map_err(|()| invalid())?;
            segments.clear();
            for component in self.path.as_path().components() {
                if let Component::Normal(part) = component {
                    segments.push(&part.to_string_lossy());
                }
            }
        }
        Ok(uri)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileProvider {
    authority: String,
}

impl Default for FileProvider {
    fn default() -> Self {
        Self {
            authority: DEFAULT_PROVIDER_AUTHORITY.to_string(),
        }
    }
}

impl FileProvider {
    pub fn new(authority: impl Into<String>) -> Result<Self, HandleError> {
        let authority = authority.into();
        if !is_valid_authority(&authority) {
            return Err(HandleError::InvalidAuthority { authority });
        }
        Ok(Self { authority })
    }

    #[must_use]
    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn issue(&self, path: &PhotoPath, access: HandleAccess) -> Result<FileHandle, HandleError> {
        if !path.is_absolute() {
            return Err(HandleError::RelativePath {
                path: path.to_string(),
            });
        }
        Ok(FileHandle {
            authority: self.authority.clone(),
            path: path.clone(),
            access,
        })
    }

    pub fn resolve<'h>(&self, handle: &'h FileHandle) -> Result<&'h PhotoPath, HandleError> {
        if handle.authority != self.authority {
            return Err(HandleError::ForeignAuthority {
                expected: self.authority.clone(),
                found: handle.authority.clone(),
            });
        }
        Ok(&handle.path)
    }
}

pub(crate) fn is_valid_authority(authority: &str) -> bool {
    !authority.is_empty()
        && authority
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    fn absolute(p: &str) -> PhotoPath {
        if cfg!(windows) {
            PhotoPath::new(format!("C:{p}"))
        } else {
            PhotoPath::new(p)
        }
    }

    #[test]
    fn test_file_prefix_uses_timestamp_layout() {
        let naming = ImageNaming::default();
        assert_eq!(naming.file_prefix(at(2024, 1, 1, 12, 0, 0)), "JPEG_20240101_120000_");
        assert_eq!(
            naming.file_name(at(2024, 1, 1, 12, 0, 0), 1234),
            "JPEG_20240101_120000_1234.jpg"
        );
    }

    #[test]
    fn test_matches_accepts_generated_names() {
        let naming = ImageNaming::default();
        assert!(naming.matches("JPEG_20240101_120000_1234.jpg"));
        assert!(naming.matches("JPEG_19991231_235959_0.jpg"));
    }

    #[test]
    fn test_matches_rejects_foreign_names() {
        let naming = ImageNaming::default();
        assert!(!naming.matches("PNG_20240101_120000_1234.jpg"));
        assert!(!naming.matches("JPEG_20240101_120000_1234.png"));
        assert!(!naming.matches("JPEG_20240101_120000_.jpg"));
        assert!(!naming.matches("JPEG_20241301_120000_12.jpg"));
        assert!(!naming.matches("JPEG_20240101_120000_12a.jpg"));
        assert!(!naming.matches("JPEG_.jpg"));
    }

    #[test]
    fn test_invalid_timestamp_format_is_detected() {
        let naming = ImageNaming {
            timestamp_format: "%Q".into(),
            ..ImageNaming::default()
        };
        assert!(!naming.has_valid_timestamp_format());
        assert_eq!(naming.file_prefix(at(2024, 1, 1, 0, 0, 0)), "JPEG__");
        assert!(ImageNaming::default().has_valid_timestamp_format());

        let offset = ImageNaming {
            timestamp_format: "%Y%z".into(),
            ..ImageNaming::default()
        };
        assert!(!offset.has_valid_timestamp_format());
    }

    #[test]
    fn test_provider_rejects_bad_authority() {
        assert!(FileProvider::new("").is_err());
        assert!(FileProvider::new("com/evil").is_err());
        assert!(FileProvider::new("com.email.image_sender.fileprovider").is_ok());
    }

    #[test]
    fn test_issue_rejects_relative_path() {
        let provider = FileProvider::default();
        let err = provider
            .issue(&PhotoPath::new("Pictures/x.jpg"), HandleAccess::Read)
            .unwrap_err();
        assert!(matches!(err, HandleError::RelativePath { .. }));
    }

    #[test]
    fn test_resolve_refuses_foreign_handles() {
        let ours = FileProvider::default();
        let theirs = FileProvider::new("org.other.provider").unwrap();
        let handle = theirs
            .issue(&absolute("/data/x.jpg"), HandleAccess::Read)
            .unwrap();

        assert!(matches!(
            ours.resolve(&handle),
            Err(HandleError::ForeignAuthority { .. })
        ));
    }

    #[test]
    fn test_content_uri_carries_authority_and_file_name() {
        let provider = FileProvider::default();
        let path = absolute("/storage/emulated/0/Pictures/JPEG_20240101_120000_1234.jpg");
        let handle = provider.issue(&path, HandleAccess::ReadWrite).unwrap();
        let uri = handle.content_uri().unwrap();

        assert_eq!(uri.scheme(), "content");
        assert_eq!(uri.host_str(), Some(DEFAULT_PROVIDER_AUTHORITY));
        assert!(uri.as_str().ends_with("/Pictures/JPEG_20240101_120000_1234.jpg"));
        assert!(handle.is_writable());
    }

    proptest! {
        #[test]
        fn test_handle_resolves_to_issued_path(segments in prop::collection::vec("[A-Za-z0-9_]{1,12}", 1..6)) {
            let provider = FileProvider::default();
            let path = absolute(&format!("/{}", segments.join("/")));
            let handle = provider.issue(&path, HandleAccess::Read).unwrap();

            prop_assert_eq!(provider.resolve(&handle).unwrap(), &path);
        }

        #[test]
        fn test_generated_names_always_match(
            secs in 0i64..4_102_444_800,
            unique in any::<u64>(),
        ) {
            let naming = ImageNaming::default();
            let when = chrono::DateTime::from_timestamp(secs, 0).unwrap().naive_utc();
            let name = naming.file_name(when, unique);

            prop_assert!(naming.matches(&name), "{} did not match", name);
        }
    }
}
