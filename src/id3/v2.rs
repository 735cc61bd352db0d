// ID3v2.3 / ID3v2.4: header codec, frame loop and serializer

use std::io::{self, Read, Seek, SeekFrom};

use crate::id3::flags::{FrameFlags, TagFlags};
use crate::id3::frames::Frame;
use crate::id3::tag::{Tag, Version};
use crate::utils::io::read_be_u32;
use crate::{Error, Warning};

pub const HEADER_SIZE: usize = 10;
pub const FRAME_HEADER_SIZE: usize = 10;
pub const TAG_ID: &[u8; 3] = b"ID3";
pub const SUPPORTED_MAJORS: [u8; 2] = [3, 4];

/// The 10-byte ID3v2 header.
///
/// The size field is read and written as a plain big-endian integer,
/// matching the tags this library writes itself. Other writers commonly
/// use the 7-bits-per-byte "synchsafe" representation for this field;
/// such tags will misparse here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub major: u8,
    pub revision: u8,
    pub flags: TagFlags,
    /// Byte length of the tag body, the header itself excluded.
    pub size: u32,
}

impl Header {
    /// Read the header at the current position. `Ok(None)` means the
    /// magic is absent, i.e. there is no ID3v2 tag here at all.
    pub fn read<R: Read>(reader: &mut R) -> Result<Option<Self>, Error> {
        let mut buffer = [0u8; HEADER_SIZE];
        if let Err(e) = reader.read_exact(&mut buffer) {
            return match e.kind() {
                io::ErrorKind::UnexpectedEof => Err(Error::TruncatedHeader),
                _ => Err(Error::Io(e)),
            };
        }
        if &buffer[0..3] != TAG_ID {
            return Ok(None);
        }

        let major = buffer[3];
        let revision = buffer[4];
        if !SUPPORTED_MAJORS.contains(&major) || revision != 0 {
            return Err(Error::UnsupportedVersion { major, revision });
        }

        Ok(Some(Header {
            major,
            revision,
            flags: TagFlags::from_byte(buffer[5], major),
            size: u32::from_be_bytes([buffer[6], buffer[7], buffer[8], buffer[9]]),
        }))
    }

    /// Append the 10-byte header. The flag byte is written as zero;
    /// tag-level flags are not round-tripped on write.
    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(TAG_ID);
        out.push(self.major);
        out.push(self.revision);
        out.push(0);
        out.extend_from_slice(&self.size.to_be_bytes());
    }
}

/// Check for a supported ID3v2 header at the start of the source
/// without moving the read position. `total_size` guards against size
/// fields pointing past the end of the file.
pub fn detect<R: Read + Seek>(reader: &mut R, total_size: u64) -> io::Result<bool> {
    let pos = reader.stream_position()?;
    reader.seek(SeekFrom::Start(0))?;

    let mut buffer = [0u8; HEADER_SIZE];
    let found = match reader.read_exact(&mut buffer) {
        Ok(()) => {
            let size = u32::from_be_bytes([buffer[6], buffer[7], buffer[8], buffer[9]]);
            &buffer[0..3] == TAG_ID
                && SUPPORTED_MAJORS.contains(&buffer[3])
                && buffer[4] == 0
                && u64::from(size) <= total_size
        }
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => false,
        Err(e) => return Err(e),
    };

    reader.seek(SeekFrom::Start(pos))?;
    Ok(found)
}

/// Parse the tag at the start of the source. `Ok(None)` when the magic
/// is absent; typed errors for unsupported or malformed tags.
pub(crate) fn parse<R: Read + Seek>(reader: &mut R) -> Result<Option<Tag>, Error> {
    reader.seek(SeekFrom::Start(0))?;
    let header = match Header::read(reader)? {
        Some(header) => header,
        None => return Ok(None),
    };

    let mut tag = Tag::new(Version::Id3v2 {
        major: header.major,
        revision: header.revision,
    });
    tag.flags = header.flags;
    tag.declared_size = header.size;

    let mut remaining = u64::from(header.size);
    loop {
        // Fewer than a frame header's worth of declared size left is padding
        if remaining < FRAME_HEADER_SIZE as u64 {
            break;
        }
        let mut raw_header = [0u8; FRAME_HEADER_SIZE];
        match reader.read_exact(&mut raw_header) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(Error::Io(e)),
        }
        remaining -= FRAME_HEADER_SIZE as u64;

        // A non-identifier byte sequence means the frames are over
        if !Frame::is_valid_id(&raw_header[0..4]) {
            break;
        }
        let id = String::from_utf8_lossy(&raw_header[0..4]).to_string();
        let size = u32::from_be_bytes([raw_header[4], raw_header[5], raw_header[6], raw_header[7]]);
        let raw_flags = u16::from_be_bytes([raw_header[8], raw_header[9]]);
        let flags = FrameFlags::from_raw(raw_flags, header.major);

        if flags.compression {
            // A compressed frame carries its decompressed size ahead of
            // the payload; the payload itself is taken as it sits on
            // the wire.
            if remaining < 4 {
                break;
            }
            let _decompressed_size = read_be_u32(reader)?;
            remaining -= 4;
        }

        if u64::from(size) > remaining {
            break;
        }
        let mut payload = vec![0u8; size as usize];
        match reader.read_exact(&mut payload) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(Error::Io(e)),
        }
        remaining -= u64::from(size);

        // A payload that fails to decode aborts the whole parse; frames
        // already collected are dropped along with the tag.
        let frame = Frame::decode(&id, flags, &payload, &mut tag.warnings)?;
        if frame.human_name().is_none() {
            tag.warnings.push(Warning::UnmappedFrameId(id));
        }
        tag.frames.push(frame);
    }

    Ok(Some(tag))
}

/// Serialize a tag into the ID3v2 layout for the given major version.
/// Frame flag fields and the tag flag byte are written as zero, and all
/// sizes are recomputed from the encoded payloads.
pub(crate) fn serialize(tag: &Tag, major: u8, revision: u8) -> Vec<u8> {
    let mut body = Vec::new();
    for frame in &tag.frames {
        let payload = frame.encode_payload();
        body.extend_from_slice(frame.id.as_bytes());
        body.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        body.extend_from_slice(&0u16.to_be_bytes());
        body.extend_from_slice(&payload);
    }

    let header = Header {
        major,
        revision,
        flags: TagFlags::default(),
        size: body.len() as u32,
    };
    let mut out = Vec::with_capacity(HEADER_SIZE + body.len());
    header.write(&mut out);
    out.extend_from_slice(&body);
    out
}
