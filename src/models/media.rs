use std::{fmt, path::Path};

use bytes::Bytes;
use image::ImageFormat;
use serde::Serialize;

use crate::{Error, Result};

/// Image types the composer accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MediaType {
    Jpeg,
    Png,
}

impl MediaType {
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Sniffs the magic bytes of `bytes`.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            _ => None,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// A file picked on the client, held in memory until published or dropped.
#[derive(Clone)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, content_type: Option<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type,
            bytes: bytes.into(),
        }
    }

    /// The JPEG or PNG type found in the bytes.
    ///
    /// A declared `image/*` type has to agree with the bytes. Generic declarations
    /// such as `application/octet-stream` are ignored.
    pub fn media_type(&self) -> Result<MediaType> {
        let sniffed = MediaType::sniff(&self.bytes).ok_or_else(|| {
            Error::Validation(format!("{} is not a JPEG or PNG image", self.name))
        })?;

        if let Some(declared) = self.content_type.as_deref() {
            let is_image = declared.trim().to_ascii_lowercase().starts_with("image/");
            if is_image && MediaType::from_mime(declared) != Some(sniffed) {
                return Err(Error::Validation(format!(
                    "{} was declared as {} but contains {}",
                    self.name, declared, sniffed
                )));
            }
        }

        Ok(sniffed)
    }

    /// Last path component of the client-supplied name, safe to embed in a storage key.
    pub fn file_name(&self) -> String {
        let name = Path::new(self.name.trim())
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .replace(['/', '\\'], "_");

        if name.is_empty() {
            "upload".to_string()
        } else {
            name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG_MAGIC: &[u8] = b"\xFF\xD8\xFF\xE0\0\x10JFIF\0";

    #[test]
    fn sniffs_png_and_jpeg() {
        assert_eq!(MediaType::sniff(PNG_MAGIC), Some(MediaType::Png));
        assert_eq!(MediaType::sniff(JPEG_MAGIC), Some(MediaType::Jpeg));
        assert_eq!(MediaType::sniff(b"GIF89a......"), None);
    }

    #[test]
    fn declared_type_must_match_contents() {
        let file = SelectedFile::new("cat.png", Some("image/jpeg".into()), PNG_MAGIC.to_vec());
        assert!(matches!(file.media_type(), Err(Error::Validation(_))));

        let file = SelectedFile::new("cat.png", Some("image/png".into()), PNG_MAGIC.to_vec());
        assert_eq!(file.media_type().unwrap(), MediaType::Png);
    }

    #[test]
    fn generic_declared_type_defers_to_contents() {
        let file = SelectedFile::new(
            "cat.png",
            Some("application/octet-stream".into()),
            PNG_MAGIC.to_vec(),
        );
        assert_eq!(file.media_type().unwrap(), MediaType::Png);

        let file = SelectedFile::new("dog.jpg", Some(String::new()), JPEG_MAGIC.to_vec());
        assert_eq!(file.media_type().unwrap(), MediaType::Jpeg);

        let file = SelectedFile::new("cat.png", Some("image/gif".into()), PNG_MAGIC.to_vec());
        assert!(matches!(file.media_type(), Err(Error::Validation(_))));
    }

    #[test]
    fn file_name_strips_directories() {
        let file = SelectedFile::new("../../etc/passwd.png", None, Bytes::new());
        assert_eq!(file.file_name(), "passwd.png");

        let file = SelectedFile::new("  ", None, Bytes::new());
        assert_eq!(file.file_name(), "upload");
    }
}
