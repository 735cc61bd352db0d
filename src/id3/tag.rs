// The tag aggregate shared by both wire formats

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek};
use std::path::Path;

use crate::field_mapping;
use crate::id3::flags::TagFlags;
use crate::id3::frames::{Frame, FrameBody, FrameKind};
use crate::id3::{v1, v2};
use crate::utils::encoding::TextEncoding;
use crate::{CoverArt, Error, FormatKind, Metadata, Warning};

/// Tag version identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// The legacy trailing 128-byte format; minor 1 adds a track number.
    Id3v1 { minor: u8 },
    /// The frame-based format; majors 3 and 4 are supported, revision
    /// is always 0.
    Id3v2 { major: u8, revision: u8 },
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Id3v1 { minor } => write!(f, "1.{}", minor),
            Version::Id3v2 { major, revision } => write!(f, "2.{}.{}", major, revision),
        }
    }
}

/// One metadata container bound to an audio file.
///
/// Frames keep their insertion order; serialization writes them in that
/// order, while lookups return the first match.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub version: Version,
    pub flags: TagFlags,
    /// Byte length of the tag body as encoded in the header: always 128
    /// for ID3v1, the header size field for ID3v2. Recomputed on
    /// serialization.
    pub declared_size: u32,
    pub frames: Vec<Frame>,
    /// Non-fatal findings recorded while parsing.
    pub warnings: Vec<Warning>,
}

impl Tag {
    /// An empty tag to populate, ready for [`Tag::set`] and
    /// [`Tag::serialize`].
    pub fn new(version: Version) -> Tag {
        Tag {
            version,
            flags: TagFlags::default(),
            declared_size: 0,
            frames: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Probe the source for a supported tag format. The read position
    /// is restored afterwards; `None` is the normal outcome for a
    /// source with no tag.
    pub fn detect<R: Read + Seek>(
        reader: &mut R,
        total_size: u64,
    ) -> io::Result<Option<FormatKind>> {
        if v2::detect(reader, total_size)? {
            return Ok(Some(FormatKind::Id3v2));
        }
        if v1::detect(reader)? {
            return Ok(Some(FormatKind::Id3v1));
        }
        Ok(None)
    }

    /// Parse whichever tag format the source carries. `Ok(None)` when
    /// neither format matches — an absent tag is not an error.
    pub fn parse<R: Read + Seek>(reader: &mut R, total_size: u64) -> Result<Option<Tag>, Error> {
        if v2::detect(reader, total_size)? {
            return v2::parse(reader);
        }
        if v1::detect(reader)? {
            return v1::parse(reader).map(Some);
        }
        Ok(None)
    }

    /// Open a file and parse its tag.
    pub fn parse_path<P: AsRef<Path>>(path: P) -> Result<Option<Tag>, Error> {
        let file = File::open(path)?;
        let total_size = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        Tag::parse(&mut reader, total_size)
    }

    /// Look up a frame by human name ("title") or frame identifier
    /// ("TIT2"). First match in insertion order.
    pub fn get(&self, name: &str) -> Option<&Frame> {
        let id = field_mapping::frame_id(name).unwrap_or(name);
        self.frames.iter().find(|frame| frame.id == id)
    }

    /// Mutable variant of [`Tag::get`].
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Frame> {
        let id = field_mapping::frame_id(name).unwrap_or(name);
        self.frames.iter_mut().find(|frame| frame.id == id)
    }

    /// Upsert a text-addressable field by human name or identifier.
    ///
    /// An existing frame is mutated in place; otherwise a new frame of
    /// the variant appropriate to the name is appended with the
    /// version's default encoding. User-defined text always appends.
    /// Returns `None` when the name resolves to nothing settable (an
    /// unknown human name, or a picture/private slot — see
    /// [`Tag::set_picture`]).
    pub fn set(&mut self, name: &str, value: &str) -> Option<&mut Frame> {
        let id = resolve_id(name)?;
        let encoding = self.default_encoding();

        if id == "TXXX" {
            self.frames
                .push(Frame::with_user_text("", value, encoding));
            return self.frames.last_mut();
        }

        if let Some(at) = self.frames.iter().position(|frame| frame.id == id) {
            let frame = &mut self.frames[at];
            frame.set_text(value);
            return Some(frame);
        }

        let frame = match FrameKind::for_id(&id) {
            FrameKind::Text => Frame::with_text(&id, value, encoding),
            FrameKind::Comment => Frame::with_comment(&id, *b"eng", "", value, encoding),
            FrameKind::Link => Frame::with_link(&id, value),
            FrameKind::UserText => Frame::with_user_text("", value, encoding),
            FrameKind::Picture | FrameKind::Private => return None,
        };
        self.frames.push(frame);
        self.frames.last_mut()
    }

    /// Upsert the attached picture.
    pub fn set_picture(
        &mut self,
        mime_type: &str,
        picture_type: u8,
        description: &str,
        data: Vec<u8>,
    ) -> &mut Frame {
        let encoding = self.default_encoding();
        let frame = Frame::with_picture(mime_type, picture_type, description, data, encoding);
        let at = match self.frames.iter().position(|f| f.id == "APIC") {
            Some(at) => {
                self.frames[at] = frame;
                at
            }
            None => {
                self.frames.push(frame);
                self.frames.len() - 1
            }
        };
        &mut self.frames[at]
    }

    /// Append a user-defined text (TXXX) frame. Multiple instances per
    /// tag are expected.
    pub fn add_user_text(&mut self, description: &str, value: &str) -> &mut Frame {
        let encoding = self.default_encoding();
        self.frames
            .push(Frame::with_user_text(description, value, encoding));
        let at = self.frames.len() - 1;
        &mut self.frames[at]
    }

    /// Serialize the tag for the given target version.
    pub fn serialize(&self, version: Version) -> Result<Vec<u8>, Error> {
        match version {
            Version::Id3v1 { minor } => Ok(v1::serialize(self, minor)),
            Version::Id3v2 { major, revision } => {
                if !v2::SUPPORTED_MAJORS.contains(&major) || revision != 0 {
                    return Err(Error::UnsupportedVersion { major, revision });
                }
                Ok(v2::serialize(self, major, revision))
            }
        }
    }

    /// Total on-wire byte length of the tag as parsed, header included.
    /// This is how many leading (ID3v2) or trailing (ID3v1) bytes a
    /// caller must drop to strip the tag from its file.
    pub fn byte_length(&self) -> u64 {
        match self.version {
            Version::Id3v1 { .. } => v1::TAG_SIZE as u64,
            Version::Id3v2 { .. } => {
                let mut length = u64::from(self.declared_size) + v2::HEADER_SIZE as u64;
                if self.flags.footer_present {
                    length += v2::HEADER_SIZE as u64;
                }
                length
            }
        }
    }

    /// Flatten the common fields into a [`Metadata`] view.
    pub fn metadata(&self) -> Metadata {
        let text = |name: &str| {
            self.get(name)
                .and_then(|frame| frame.text())
                .map(str::to_string)
        };

        let mut metadata = Metadata::default();
        metadata.file_type = match self.version {
            Version::Id3v1 { .. } => "ID3v1".to_string(),
            Version::Id3v2 { .. } => "ID3v2".to_string(),
        };
        metadata.version = self.version.to_string();
        metadata.title = text("title");
        metadata.artist = text("artist");
        metadata.album = text("album");
        metadata.year = text("year").or_else(|| text("date"));
        metadata.track = text("track");
        metadata.genre = text("genre");
        metadata.comment = text("comment");
        metadata.cover = self.frames.iter().find_map(|frame| match &frame.body {
            FrameBody::Picture {
                mime_type,
                picture_type,
                description,
                data,
            } => Some(CoverArt {
                mime_type: mime_type.clone(),
                picture_type: *picture_type,
                description: description.clone(),
                data: data.clone(),
            }),
            _ => None,
        });
        metadata
    }

    // Newly constructed text frames follow the version's customary
    // encoding: raw Latin-1 for v1 fields, UTF-16 for v2.3, UTF-8 for
    // v2.4.
    fn default_encoding(&self) -> Option<TextEncoding> {
        match self.version {
            Version::Id3v1 { .. } => None,
            Version::Id3v2 { major, .. } => Some(if major >= 4 {
                TextEncoding::Utf8
            } else {
                TextEncoding::Utf16
            }),
        }
    }
}

fn resolve_id(name: &str) -> Option<String> {
    if let Some(id) = field_mapping::frame_id(name) {
        return Some(id.to_string());
    }
    if name.len() == 4 && Frame::is_valid_id(name.as_bytes()) {
        return Some(name.to_string());
    }
    None
}
