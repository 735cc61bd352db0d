//! id3kit - An ID3 tag reading and writing library
//!
//! Parses the two incompatible ID3 wire formats into one [`Tag`]
//! representation and serializes it back:
//!
//! - ID3v1 / ID3v1.1, the fixed 128-byte block at the end of a file;
//! - ID3v2.3 / ID3v2.4, the frame-based block at the start of a file.
//!
//! ```no_run
//! use id3kit::{Tag, Version};
//!
//! let mut tag = Tag::new(Version::Id3v2 { major: 3, revision: 0 });
//! tag.set("title", "Hello");
//! let bytes = tag.serialize(Version::Id3v2 { major: 3, revision: 0 })?;
//! # Ok::<(), id3kit::Error>(())
//! ```

use std::fmt;
use std::io;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Serialize, Serializer};

mod field_mapping;
mod id3;
mod utils;

pub use field_mapping::{frame_id, human_name};
pub use id3::flags::{FrameFlags, TagFlags};
pub use id3::frames::{picture_type_name, Frame, FrameBody, FrameKind};
pub use id3::genres;
pub use id3::tag::{Tag, Version};
pub use utils::encoding::TextEncoding;

/// Which tag format a source carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Id3v1,
    Id3v2,
}

/// Errors surfaced while parsing or serializing a tag.
///
/// Header-level errors are terminal for the whole parse; frame-level
/// errors also abort the whole parse rather than skipping the offending
/// frame. An absent tag is never an error.
#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    /// Header major version or revision outside the supported set.
    UnsupportedVersion { major: u8, revision: u8 },
    /// Fewer than 10 bytes where a tag header was expected.
    TruncatedHeader,
    /// Encoding selector byte outside the four defined entries.
    UnsupportedEncoding(u8),
    /// A required sub-field was short or a required terminator missing.
    MalformedFrame(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::UnsupportedVersion { major, revision } => {
                write!(f, "unsupported tag version 2.{}.{}", major, revision)
            }
            Error::TruncatedHeader => write!(f, "truncated tag header"),
            Error::UnsupportedEncoding(byte) => {
                write!(f, "unsupported text encoding selector {}", byte)
            }
            Error::MalformedFrame(msg) => write!(f, "malformed frame: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::Io(e)
    }
}

/// Non-fatal findings recorded while parsing, carried on the parsed
/// [`Tag`] instead of being logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// ID3v1 genre byte outside both the table and the 255 "none"
    /// sentinel.
    UnknownGenre(u8),
    /// A valid frame identifier with no entry in the human-name table.
    UnmappedFrameId(String),
    /// A link payload began with a byte that doubles as an encoding
    /// selector; the description+link layout was assumed.
    AmbiguousLinkLayout(String),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnknownGenre(byte) => write!(f, "unknown genre index {}", byte),
            Warning::UnmappedFrameId(id) => write!(f, "no human name for frame {}", id),
            Warning::AmbiguousLinkLayout(id) => {
                write!(f, "ambiguous layout in link frame {}, assumed described form", id)
            }
        }
    }
}

/// Flattened view of a tag's common fields.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Metadata {
    pub file_type: String,
    pub version: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<String>,
    pub track: Option<String>,
    pub genre: Option<String>,
    pub comment: Option<String>,
    pub cover: Option<CoverArt>,
}

impl Metadata {
    /// Render the view as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Metadata(file_type={}, version={}, title={}, artist={}, album={})",
            self.file_type,
            self.version,
            self.title.as_deref().unwrap_or("None"),
            self.artist.as_deref().unwrap_or("None"),
            self.album.as_deref().unwrap_or("None")
        )
    }
}

/// Attached picture as exposed on the [`Metadata`] view. The image
/// bytes serialize as base64.
#[derive(Debug, Clone, Serialize)]
pub struct CoverArt {
    pub mime_type: String,
    pub picture_type: u8,
    pub description: String,
    #[serde(serialize_with = "serialize_base64")]
    pub data: Vec<u8>,
}

impl CoverArt {
    /// Human-readable name of the picture type byte.
    pub fn picture_type_name(&self) -> Option<&'static str> {
        picture_type_name(self.picture_type)
    }
}

impl fmt::Display for CoverArt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CoverArt(mime_type={}, type={}, {} bytes)",
            self.mime_type,
            self.picture_type_name().unwrap_or("Unknown"),
            self.data.len()
        )
    }
}

fn serialize_base64<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&BASE64.encode(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_json() {
        let mut tag = Tag::new(Version::Id3v2 { major: 4, revision: 0 });
        tag.set("title", "Song");
        tag.set_picture("image/jpeg", 3, "", vec![0xFF, 0xD8, 0xFF]);

        let json = tag.metadata().to_json().unwrap();
        assert!(json.contains("\"title\": \"Song\""));
        assert!(json.contains("\"file_type\": \"ID3v2\""));
        // 0xFF 0xD8 0xFF in base64
        assert!(json.contains("\"data\": \"/9j/\""));
    }

    #[test]
    fn test_error_display() {
        let err = Error::UnsupportedVersion { major: 5, revision: 0 };
        assert_eq!(err.to_string(), "unsupported tag version 2.5.0");
        assert_eq!(
            Error::UnsupportedEncoding(9).to_string(),
            "unsupported text encoding selector 9"
        );
    }

    #[test]
    fn test_warning_display() {
        assert_eq!(
            Warning::UnknownGenre(200).to_string(),
            "unknown genre index 200"
        );
    }

    #[test]
    fn test_metadata_display() {
        let metadata = Metadata {
            file_type: "ID3v2".to_string(),
            version: "2.3.0".to_string(),
            title: Some("Song".to_string()),
            ..Metadata::default()
        };
        let rendered = metadata.to_string();
        assert!(rendered.contains("title=Song"));
        assert!(rendered.contains("artist=None"));
    }
}
