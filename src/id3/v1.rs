// ID3v1 and ID3v1.1: the fixed 128-byte trailing tag

use std::io::{self, Read, Seek, SeekFrom};

use crate::id3::frames::Frame;
use crate::id3::genres;
use crate::id3::tag::{Tag, Version};
use crate::utils::encoding::{self, TextEncoding};
use crate::utils::io::check_signature;
use crate::{Error, Warning};

pub const TAG_SIZE: usize = 128;
pub const TAG_ID: &[u8; 3] = b"TAG";

/// Check for the trailing 128-byte tag without moving the read position.
pub fn detect<R: Read + Seek>(reader: &mut R) -> io::Result<bool> {
    let pos = reader.stream_position()?;
    if reader.seek(SeekFrom::End(-(TAG_SIZE as i64))).is_err() {
        // File shorter than a tag
        reader.seek(SeekFrom::Start(pos))?;
        return Ok(false);
    }
    let found = check_signature(reader, TAG_ID)?;
    reader.seek(SeekFrom::Start(pos))?;
    Ok(found)
}

/// Parse the trailing 128-byte block. The caller has already verified
/// the magic through [`detect`].
pub(crate) fn parse<R: Read + Seek>(reader: &mut R) -> Result<Tag, Error> {
    reader.seek(SeekFrom::End(-(TAG_SIZE as i64)))?;
    let mut buffer = [0u8; TAG_SIZE];
    reader.read_exact(&mut buffer)?;

    // A NUL at byte 125 followed by a non-NUL, non-space byte marks the
    // v1.1 layout with a track number in the comment field's tail.
    let v11 = buffer[125] == 0 && buffer[126] != 0 && buffer[126] != b' ';
    let (comment_end, track, minor) = if v11 {
        (125, Some(buffer[126]), 1)
    } else {
        (127, None, 0)
    };

    let mut tag = Tag::new(Version::Id3v1 { minor });
    tag.declared_size = TAG_SIZE as u32;

    push_text(&mut tag, "TIT2", &buffer[3..33]);
    push_text(&mut tag, "TPE1", &buffer[33..63]);
    push_text(&mut tag, "TALB", &buffer[63..93]);
    push_text(&mut tag, "TYER", &buffer[93..97]);

    let comment = field(&buffer[97..comment_end]);
    if !comment.is_empty() {
        tag.frames
            .push(Frame::with_comment("COMM", *b"eng", "", &comment, None));
    }

    if let Some(track) = track {
        tag.frames
            .push(Frame::with_text("TRCK", &track.to_string(), None));
    }

    let genre_byte = buffer[127];
    match genres::name(genre_byte) {
        Some(genre) => tag.frames.push(Frame::with_text("TCON", genre, None)),
        None => {
            if genre_byte != genres::NONE_GENRE {
                tag.warnings.push(Warning::UnknownGenre(genre_byte));
            }
        }
    }

    Ok(tag)
}

/// Serialize a tag into the 128-byte v1 layout. `minor` selects between
/// the plain 30-byte comment (1.0) and the track-bearing layout (1.1).
pub(crate) fn serialize(tag: &Tag, minor: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(TAG_SIZE);
    out.extend_from_slice(TAG_ID);
    push_field(&mut out, tag.get("title"), 30);
    push_field(&mut out, tag.get("artist"), 30);
    push_field(&mut out, tag.get("album"), 30);
    push_field(&mut out, tag.get("year"), 4);

    let mut comment = field_bytes(tag.get("comment"), 30);
    if minor >= 1 {
        if let Some(track) = tag.get("track").and_then(|f| f.text()).and_then(parse_track) {
            comment.truncate(28);
            comment.resize(28, 0);
            comment.push(0);
            comment.push(track);
        }
    }
    out.extend_from_slice(&comment);

    let genre = tag
        .get("genre")
        .and_then(|f| f.text())
        .and_then(genres::index)
        .unwrap_or(genres::NONE_GENRE);
    out.push(genre);
    out
}

fn field(bytes: &[u8]) -> String {
    encoding::trim_padding(&encoding::decode_text(bytes, TextEncoding::Iso8859_1)).to_string()
}

fn push_text(tag: &mut Tag, id: &str, bytes: &[u8]) {
    let text = field(bytes);
    if !text.is_empty() {
        tag.frames.push(Frame::with_text(id, &text, None));
    }
}

fn push_field(out: &mut Vec<u8>, frame: Option<&Frame>, width: usize) {
    out.extend_from_slice(&field_bytes(frame, width));
}

fn field_bytes(frame: Option<&Frame>, width: usize) -> Vec<u8> {
    let mut bytes = match frame.and_then(|f| f.text()) {
        Some(text) => encoding::encode_text(text, TextEncoding::Iso8859_1),
        None => Vec::new(),
    };
    bytes.truncate(width);
    bytes.resize(width, 0);
    bytes
}

// "7" and "7/12" both mean track 7; anything that does not parse into
// 0..=255 is left out of the comment field.
fn parse_track(text: &str) -> Option<u8> {
    text.split('/')
        .next()?
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|&track| track <= 255)
        .map(|track| track as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn raw_tag(title: &str, comment: &str, track: Option<u8>, genre: u8) -> [u8; TAG_SIZE] {
        let mut raw = [0u8; TAG_SIZE];
        raw[0..3].copy_from_slice(TAG_ID);
        raw[3..3 + title.len()].copy_from_slice(title.as_bytes());
        raw[97..97 + comment.len()].copy_from_slice(comment.as_bytes());
        if let Some(track) = track {
            raw[125] = 0;
            raw[126] = track;
        }
        raw[127] = genre;
        raw
    }

    #[test]
    fn test_detect_restores_position() {
        let mut data = vec![0u8; 64];
        data.extend_from_slice(&raw_tag("Song", "", None, 255));
        let mut cursor = Cursor::new(data);
        assert!(detect(&mut cursor).unwrap());
        assert_eq!(cursor.position(), 0);

        let mut cursor = Cursor::new(vec![0u8; 256]);
        assert!(!detect(&mut cursor).unwrap());
        assert_eq!(cursor.position(), 0);

        // Too short for a tag at all
        let mut cursor = Cursor::new(vec![0u8; 16]);
        assert!(!detect(&mut cursor).unwrap());
    }

    #[test]
    fn test_parse_fields() {
        let mut cursor = Cursor::new(raw_tag("Title", "a comment", Some(7), 17).to_vec());
        let tag = parse(&mut cursor).unwrap();

        assert_eq!(tag.version, Version::Id3v1 { minor: 1 });
        assert_eq!(tag.get("title").and_then(|f| f.text()), Some("Title"));
        assert_eq!(tag.get("comment").and_then(|f| f.text()), Some("a comment"));
        assert_eq!(tag.get("track").and_then(|f| f.text()), Some("7"));
        assert_eq!(tag.get("genre").and_then(|f| f.text()), Some("Rock"));
        assert!(tag.warnings.is_empty());
    }

    #[test]
    fn test_parse_without_track() {
        // Byte 126 left at NUL means plain v1.0
        let mut cursor = Cursor::new(raw_tag("Title", "", None, 255).to_vec());
        let tag = parse(&mut cursor).unwrap();
        assert_eq!(tag.version, Version::Id3v1 { minor: 0 });
        assert!(tag.get("track").is_none());
        // 255 is the defined "none", not a warning
        assert!(tag.get("genre").is_none());
        assert!(tag.warnings.is_empty());
    }

    #[test]
    fn test_unknown_genre_warns() {
        let mut cursor = Cursor::new(raw_tag("Title", "", None, 200).to_vec());
        let tag = parse(&mut cursor).unwrap();
        assert!(tag.get("genre").is_none());
        assert_eq!(tag.warnings, vec![Warning::UnknownGenre(200)]);
    }

    #[test]
    fn test_serialize_truncates_long_fields() {
        let mut tag = Tag::new(Version::Id3v1 { minor: 0 });
        let long_title = "x".repeat(40);
        tag.frames.push(Frame::with_text("TIT2", &long_title, None));
        tag.frames.push(Frame::with_text("TYER", "1999", None));

        let raw = serialize(&tag, 0);
        assert_eq!(raw.len(), TAG_SIZE);
        assert_eq!(&raw[3..33], "x".repeat(30).as_bytes());
        assert_eq!(&raw[93..97], b"1999");

        let mut cursor = Cursor::new(raw);
        let parsed = parse(&mut cursor).unwrap();
        assert_eq!(
            parsed.get("title").and_then(|f| f.text()),
            Some("x".repeat(30).as_str())
        );
        assert_eq!(parsed.get("year").and_then(|f| f.text()), Some("1999"));
    }

    #[test]
    fn test_serialize_v11_track() {
        let mut tag = Tag::new(Version::Id3v1 { minor: 1 });
        tag.frames.push(Frame::with_comment("COMM", *b"eng", "", "hi", None));
        tag.frames.push(Frame::with_text("TRCK", "7", None));

        let raw = serialize(&tag, 1);
        assert_eq!(&raw[97..99], b"hi");
        assert_eq!(raw[125], 0x00);
        assert_eq!(raw[126], 0x07);

        let mut cursor = Cursor::new(raw);
        let parsed = parse(&mut cursor).unwrap();
        assert_eq!(parsed.version, Version::Id3v1 { minor: 1 });
        assert_eq!(parsed.get("track").and_then(|f| f.text()), Some("7"));
        assert_eq!(parsed.get("comment").and_then(|f| f.text()), Some("hi"));
    }

    #[test]
    fn test_serialize_track_of_pair() {
        let mut tag = Tag::new(Version::Id3v1 { minor: 1 });
        tag.frames.push(Frame::with_text("TRCK", "3/12", None));
        let raw = serialize(&tag, 1);
        assert_eq!(raw[126], 3);
    }

    #[test]
    fn test_serialize_genre() {
        let mut tag = Tag::new(Version::Id3v1 { minor: 0 });
        tag.frames.push(Frame::with_text("TCON", "Rock", None));
        assert_eq!(serialize(&tag, 0)[127], 17);

        let mut tag = Tag::new(Version::Id3v1 { minor: 0 });
        tag.frames.push(Frame::with_text("TCON", "Shoegaze", None));
        assert_eq!(serialize(&tag, 0)[127], genres::NONE_GENRE);

        let tag = Tag::new(Version::Id3v1 { minor: 0 });
        assert_eq!(serialize(&tag, 0)[127], genres::NONE_GENRE);
    }

    #[test]
    fn test_long_comment_truncated() {
        let mut tag = Tag::new(Version::Id3v1 { minor: 0 });
        let long_comment = "c".repeat(64);
        tag.frames
            .push(Frame::with_comment("COMM", *b"eng", "", &long_comment, None));
        let raw = serialize(&tag, 0);
        assert_eq!(&raw[97..127], "c".repeat(30).as_bytes());
        assert_eq!(raw.len(), TAG_SIZE);
    }
}
