// ID3 frame variants
//
// Each payload shape gets one decode/encode strategy; the identifier
// picks the shape through a static dispatch table. Decoded frames keep
// their raw payload bytes around for debugging.

use crate::field_mapping;
use crate::id3::flags::FrameFlags;
use crate::utils::encoding::{self, TextEncoding};
use crate::{Error, Warning};

/// The payload shapes a frame identifier can dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Text,
    Comment,
    Picture,
    UserText,
    Private,
    Link,
}

impl FrameKind {
    /// Resolve the payload shape for a frame identifier.
    ///
    /// COMM and USLT share the language/description/body layout; any
    /// identifier starting with "W" is a link; everything else decodes
    /// as plain text.
    pub fn for_id(id: &str) -> FrameKind {
        match id {
            "APIC" => FrameKind::Picture,
            "COMM" | "USLT" => FrameKind::Comment,
            "TXXX" => FrameKind::UserText,
            "PRIV" => FrameKind::Private,
            _ if id.starts_with('W') => FrameKind::Link,
            _ => FrameKind::Text,
        }
    }
}

/// Decoded frame payload.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameBody {
    Text {
        text: String,
    },
    Comment {
        language: [u8; 3],
        description: String,
        text: String,
    },
    Picture {
        mime_type: String,
        picture_type: u8,
        description: String,
        data: Vec<u8>,
    },
    UserText {
        description: String,
        value: String,
    },
    Private {
        owner: String,
        data: Vec<u8>,
    },
    Link {
        description: Option<String>,
        url: String,
    },
}

/// One metadata field.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// 4-character identifier; ID3v1 fields carry the identifier of
    /// their ID3v2 counterpart.
    pub id: String,
    /// Frame attributes; only meaningful for ID3v2 frames.
    pub flags: FrameFlags,
    /// Text encoding of the payload, where the shape carries one.
    pub encoding: Option<TextEncoding>,
    pub body: FrameBody,
    /// Undecoded payload bytes as read from the source; empty for
    /// frames constructed in memory.
    pub raw: Vec<u8>,
}

impl Frame {
    /// A plain text frame.
    pub fn with_text(id: &str, text: &str, encoding: Option<TextEncoding>) -> Frame {
        Frame {
            id: id.to_string(),
            flags: FrameFlags::default(),
            encoding,
            body: FrameBody::Text {
                text: text.to_string(),
            },
            raw: Vec::new(),
        }
    }

    /// A comment (COMM) or lyrics (USLT) frame.
    pub fn with_comment(
        id: &str,
        language: [u8; 3],
        description: &str,
        text: &str,
        encoding: Option<TextEncoding>,
    ) -> Frame {
        Frame {
            id: id.to_string(),
            flags: FrameFlags::default(),
            encoding,
            body: FrameBody::Comment {
                language,
                description: description.to_string(),
                text: text.to_string(),
            },
            raw: Vec::new(),
        }
    }

    /// An attached picture (APIC) frame.
    pub fn with_picture(
        mime_type: &str,
        picture_type: u8,
        description: &str,
        data: Vec<u8>,
        encoding: Option<TextEncoding>,
    ) -> Frame {
        Frame {
            id: "APIC".to_string(),
            flags: FrameFlags::default(),
            encoding,
            body: FrameBody::Picture {
                mime_type: mime_type.to_string(),
                picture_type,
                description: description.to_string(),
                data,
            },
            raw: Vec::new(),
        }
    }

    /// A user-defined text (TXXX) frame.
    pub fn with_user_text(
        description: &str,
        value: &str,
        encoding: Option<TextEncoding>,
    ) -> Frame {
        Frame {
            id: "TXXX".to_string(),
            flags: FrameFlags::default(),
            encoding,
            body: FrameBody::UserText {
                description: description.to_string(),
                value: value.to_string(),
            },
            raw: Vec::new(),
        }
    }

    /// A bare URL link frame.
    pub fn with_link(id: &str, url: &str) -> Frame {
        Frame {
            id: id.to_string(),
            flags: FrameFlags::default(),
            encoding: None,
            body: FrameBody::Link {
                description: None,
                url: url.to_string(),
            },
            raw: Vec::new(),
        }
    }

    /// Check a frame identifier: uppercase letters and digits only.
    /// Anything else at a frame-header position is padding, not an
    /// error.
    pub fn is_valid_id(id: &[u8]) -> bool {
        !id.is_empty() && id.iter().all(|&b| b.is_ascii_uppercase() || b.is_ascii_digit())
    }

    /// Human name of this frame's identifier, if one is defined.
    pub fn human_name(&self) -> Option<&'static str> {
        field_mapping::human_name(&self.id)
    }

    /// The frame's primary text: the text of a text frame, the body of
    /// a comment, the value of a user-defined field, the target of a
    /// link. Pictures and private frames have none.
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            FrameBody::Text { text } => Some(text),
            FrameBody::Comment { text, .. } => Some(text),
            FrameBody::UserText { value, .. } => Some(value),
            FrameBody::Link { url, .. } => Some(url),
            FrameBody::Picture { .. } | FrameBody::Private { .. } => None,
        }
    }

    /// Replace the frame's primary text in place, leaving the other
    /// payload fields untouched. Pictures and private frames are not
    /// text-addressable and are left unchanged.
    pub fn set_text(&mut self, value: &str) {
        match &mut self.body {
            FrameBody::Text { text } => *text = value.to_string(),
            FrameBody::Comment { text, .. } => *text = value.to_string(),
            FrameBody::UserText { value: v, .. } => *v = value.to_string(),
            FrameBody::Link { url, .. } => *url = value.to_string(),
            FrameBody::Picture { .. } | FrameBody::Private { .. } => {}
        }
    }

    /// Decode a frame payload read from an ID3v2 tag.
    pub fn decode(
        id: &str,
        flags: FrameFlags,
        payload: &[u8],
        warnings: &mut Vec<Warning>,
    ) -> Result<Frame, Error> {
        let (encoding, body) = match FrameKind::for_id(id) {
            FrameKind::Text => decode_text(payload)?,
            FrameKind::Comment => decode_comment(payload)?,
            FrameKind::Picture => decode_picture(payload)?,
            FrameKind::UserText => decode_user_text(payload)?,
            FrameKind::Private => decode_private(payload)?,
            FrameKind::Link => decode_link(id, payload, warnings)?,
        };
        Ok(Frame {
            id: id.to_string(),
            flags,
            encoding,
            body,
            raw: payload.to_vec(),
        })
    }

    /// Encode the frame payload: the structural inverse of
    /// [`Frame::decode`]. Frames without an encoding are written as
    /// Latin-1.
    pub fn encode_payload(&self) -> Vec<u8> {
        let enc = self.encoding.unwrap_or(TextEncoding::Iso8859_1);
        match &self.body {
            FrameBody::Text { text } => {
                let mut out = vec![enc as u8];
                out.extend(encoding::encode_text(text, enc));
                out.extend_from_slice(enc.terminator());
                out
            }
            FrameBody::Comment {
                language,
                description,
                text,
            } => {
                let mut out = vec![enc as u8];
                out.extend_from_slice(language);
                out.extend(encoding::encode_text(description, enc));
                out.extend_from_slice(enc.terminator());
                out.extend(encoding::encode_text(text, enc));
                out
            }
            FrameBody::Picture {
                mime_type,
                picture_type,
                description,
                data,
            } => {
                let mut out = vec![enc as u8];
                out.extend(encoding::encode_text(mime_type, TextEncoding::Iso8859_1));
                out.push(0);
                out.push(*picture_type);
                out.extend(encoding::encode_text(description, enc));
                out.extend_from_slice(enc.terminator());
                out.extend_from_slice(data);
                out
            }
            FrameBody::UserText { description, value } => {
                let mut out = vec![enc as u8];
                out.extend(encoding::encode_text(description, enc));
                out.extend_from_slice(enc.terminator());
                out.extend(encoding::encode_text(value, enc));
                out.extend_from_slice(enc.terminator());
                out
            }
            FrameBody::Private { owner, data } => {
                let mut out = encoding::encode_text(owner, TextEncoding::Iso8859_1);
                out.push(0);
                out.extend_from_slice(data);
                out
            }
            FrameBody::Link { description, url } => match (self.encoding, description) {
                (Some(enc), Some(description)) => {
                    let mut out = vec![enc as u8];
                    out.extend(encoding::encode_text(description, enc));
                    out.extend_from_slice(enc.terminator());
                    out.extend(encoding::encode_text(url, enc));
                    out
                }
                // Bare layout: the payload is the link itself
                _ => encoding::encode_text(url, TextEncoding::Iso8859_1),
            },
        }
    }
}

fn split_encoding(payload: &[u8]) -> Result<(TextEncoding, &[u8]), Error> {
    let (&selector, rest) = payload
        .split_first()
        .ok_or_else(|| Error::MalformedFrame("empty frame payload".to_string()))?;
    Ok((TextEncoding::from_byte(selector)?, rest))
}

fn decode_string(bytes: &[u8], enc: TextEncoding) -> String {
    encoding::trim_padding(&encoding::decode_text(bytes, enc)).to_string()
}

fn decode_text(payload: &[u8]) -> Result<(Option<TextEncoding>, FrameBody), Error> {
    let (enc, rest) = split_encoding(payload)?;
    Ok((
        Some(enc),
        FrameBody::Text {
            text: decode_string(rest, enc),
        },
    ))
}

fn decode_comment(payload: &[u8]) -> Result<(Option<TextEncoding>, FrameBody), Error> {
    let (enc, rest) = split_encoding(payload)?;
    if rest.len() < 3 {
        return Err(Error::MalformedFrame(
            "language code shorter than 3 bytes".to_string(),
        ));
    }
    let language = [rest[0], rest[1], rest[2]];
    let rest = &rest[3..];
    let (description, rest) = encoding::split_terminated(rest, enc).ok_or_else(|| {
        Error::MalformedFrame("comment description is unterminated".to_string())
    })?;
    Ok((
        Some(enc),
        FrameBody::Comment {
            language,
            description: decode_string(description, enc),
            text: decode_string(rest, enc),
        },
    ))
}

fn decode_picture(payload: &[u8]) -> Result<(Option<TextEncoding>, FrameBody), Error> {
    let (enc, rest) = split_encoding(payload)?;
    // The MIME type is Latin-1 and single-byte terminated regardless of
    // the text encoding of the description.
    let (mime, rest) = encoding::split_terminated(rest, TextEncoding::Iso8859_1)
        .ok_or_else(|| Error::MalformedFrame("picture MIME type is unterminated".to_string()))?;
    let (&picture_type, rest) = rest
        .split_first()
        .ok_or_else(|| Error::MalformedFrame("picture type byte missing".to_string()))?;
    let (description, rest) = encoding::split_terminated(rest, enc).ok_or_else(|| {
        Error::MalformedFrame("picture description is unterminated".to_string())
    })?;
    Ok((
        Some(enc),
        FrameBody::Picture {
            mime_type: decode_string(mime, TextEncoding::Iso8859_1),
            picture_type,
            description: decode_string(description, enc),
            data: rest.to_vec(),
        },
    ))
}

fn decode_user_text(payload: &[u8]) -> Result<(Option<TextEncoding>, FrameBody), Error> {
    let (enc, rest) = split_encoding(payload)?;
    let (description, rest) = encoding::split_terminated(rest, enc).ok_or_else(|| {
        Error::MalformedFrame("user text description is unterminated".to_string())
    })?;
    // A trailing terminator on the value is optional
    let value = match encoding::find_terminator(rest, enc) {
        Some(at) => &rest[..at],
        None => rest,
    };
    Ok((
        Some(enc),
        FrameBody::UserText {
            description: decode_string(description, enc),
            value: decode_string(value, enc),
        },
    ))
}

fn decode_private(payload: &[u8]) -> Result<(Option<TextEncoding>, FrameBody), Error> {
    let (owner, rest) = encoding::split_terminated(payload, TextEncoding::Iso8859_1)
        .ok_or_else(|| Error::MalformedFrame("private owner is unterminated".to_string()))?;
    Ok((
        None,
        FrameBody::Private {
            owner: decode_string(owner, TextEncoding::Iso8859_1),
            data: rest.to_vec(),
        },
    ))
}

// A link payload is either the bare link bytes or an encoding byte
// followed by a terminated description and the link. The two layouts
// cannot be told apart reliably: a bare link could begin with a byte
// that is also a valid encoding selector. When that happens the
// described layout is assumed and the guess is recorded as a warning.
fn decode_link(
    id: &str,
    payload: &[u8],
    warnings: &mut Vec<Warning>,
) -> Result<(Option<TextEncoding>, FrameBody), Error> {
    match payload.first() {
        Some(&selector) if selector <= 3 => {
            warnings.push(Warning::AmbiguousLinkLayout(id.to_string()));
            let (enc, rest) = split_encoding(payload)?;
            let (description, rest) = encoding::split_terminated(rest, enc).ok_or_else(|| {
                Error::MalformedFrame("link description is unterminated".to_string())
            })?;
            Ok((
                Some(enc),
                FrameBody::Link {
                    description: Some(decode_string(description, enc)),
                    url: decode_string(rest, enc),
                },
            ))
        }
        _ => Ok((
            None,
            FrameBody::Link {
                description: None,
                url: decode_string(payload, TextEncoding::Iso8859_1),
            },
        )),
    }
}

/// Human-readable name for an APIC picture-type byte.
pub fn picture_type_name(picture_type: u8) -> Option<&'static str> {
    match picture_type {
        0x00 => Some("Other"),
        0x01 => Some("32x32 pixels 'file icon' (PNG only)"),
        0x02 => Some("Other file icon"),
        0x03 => Some("Cover (front)"),
        0x04 => Some("Cover (back)"),
        0x05 => Some("Leaflet page"),
        0x06 => Some("Media (e.g. label side of CD)"),
        0x07 => Some("Lead artist/lead performer/soloist"),
        0x08 => Some("Artist/performer"),
        0x09 => Some("Conductor"),
        0x0A => Some("Band/Orchestra"),
        0x0B => Some("Composer"),
        0x0C => Some("Lyricist/text writer"),
        0x0D => Some("Recording Location"),
        0x0E => Some("During recording"),
        0x0F => Some("During performance"),
        0x10 => Some("Movie/video screen capture"),
        0x11 => Some("A bright coloured fish"),
        0x12 => Some("Illustration"),
        0x13 => Some("Band/artist logotype"),
        0x14 => Some("Publisher/Studio logotype"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(id: &str, payload: &[u8]) -> Result<Frame, Error> {
        let mut warnings = Vec::new();
        Frame::decode(id, FrameFlags::default(), payload, &mut warnings)
    }

    #[test]
    fn test_dispatch() {
        assert_eq!(FrameKind::for_id("APIC"), FrameKind::Picture);
        assert_eq!(FrameKind::for_id("COMM"), FrameKind::Comment);
        assert_eq!(FrameKind::for_id("USLT"), FrameKind::Comment);
        assert_eq!(FrameKind::for_id("TXXX"), FrameKind::UserText);
        assert_eq!(FrameKind::for_id("PRIV"), FrameKind::Private);
        assert_eq!(FrameKind::for_id("WOAR"), FrameKind::Link);
        assert_eq!(FrameKind::for_id("TIT2"), FrameKind::Text);
        assert_eq!(FrameKind::for_id("ZZZZ"), FrameKind::Text);
    }

    #[test]
    fn test_valid_ids() {
        assert!(Frame::is_valid_id(b"TIT2"));
        assert!(Frame::is_valid_id(b"TXXX"));
        assert!(!Frame::is_valid_id(b"\0\0\0\0"));
        assert!(!Frame::is_valid_id(b"ti t"));
        assert!(!Frame::is_valid_id(b""));
    }

    #[test]
    fn test_text_frame_round_trip_utf16() {
        let frame = Frame::with_text("TIT2", "Hello", Some(TextEncoding::Utf16));
        let payload = frame.encode_payload();
        assert_eq!(payload[0], 1);
        assert_eq!(&payload[1..3], &[0xFF, 0xFE]);

        let decoded = decode("TIT2", &payload).unwrap();
        assert_eq!(decoded.encoding, Some(TextEncoding::Utf16));
        assert_eq!(decoded.text(), Some("Hello"));
    }

    #[test]
    fn test_text_frame_unsupported_encoding() {
        assert!(matches!(
            decode("TIT2", &[0x09, b'x']),
            Err(Error::UnsupportedEncoding(9))
        ));
    }

    #[test]
    fn test_comment_decode() {
        let mut payload = vec![0x00];
        payload.extend_from_slice(b"eng");
        payload.extend_from_slice(b"desc\0");
        payload.extend_from_slice(b"hello there");

        let frame = decode("COMM", &payload).unwrap();
        match &frame.body {
            FrameBody::Comment {
                language,
                description,
                text,
            } => {
                assert_eq!(language, b"eng");
                assert_eq!(description, "desc");
                assert_eq!(text, "hello there");
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_comment_short_language() {
        assert!(matches!(
            decode("COMM", &[0x00, b'e', b'n']),
            Err(Error::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_comment_round_trip_utf16() {
        let frame = Frame::with_comment(
            "COMM",
            *b"eng",
            "short",
            "body text",
            Some(TextEncoding::Utf16),
        );
        let decoded = decode("COMM", &frame.encode_payload()).unwrap();
        match &decoded.body {
            FrameBody::Comment {
                language,
                description,
                text,
            } => {
                assert_eq!(language, b"eng");
                assert_eq!(description, "short");
                assert_eq!(text, "body text");
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_picture_decode() {
        let mut payload = vec![0x00];
        payload.extend_from_slice(b"image/jpeg\0");
        payload.push(0x03);
        payload.push(0x00);
        payload.extend_from_slice(&[0xAB; 100]);

        let frame = decode("APIC", &payload).unwrap();
        match &frame.body {
            FrameBody::Picture {
                mime_type,
                picture_type,
                description,
                data,
            } => {
                assert_eq!(mime_type, "image/jpeg");
                assert_eq!(*picture_type, 3);
                assert_eq!(description, "");
                assert_eq!(data.len(), 100);
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_picture_round_trip_utf16_description() {
        let frame = Frame::with_picture(
            "image/png",
            3,
            "front",
            vec![0x89, 0x50, 0x4E, 0x47],
            Some(TextEncoding::Utf16),
        );
        let decoded = decode("APIC", &frame.encode_payload()).unwrap();
        match &decoded.body {
            FrameBody::Picture {
                mime_type,
                picture_type,
                description,
                data,
            } => {
                assert_eq!(mime_type, "image/png");
                assert_eq!(*picture_type, 3);
                assert_eq!(description, "front");
                assert_eq!(data, &[0x89, 0x50, 0x4E, 0x47]);
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_user_text_round_trip_utf16() {
        let frame =
            Frame::with_user_text("replaygain", "-6.1 dB", Some(TextEncoding::Utf16));
        let decoded = decode("TXXX", &frame.encode_payload()).unwrap();
        match &decoded.body {
            FrameBody::UserText { description, value } => {
                assert_eq!(description, "replaygain");
                assert_eq!(value, "-6.1 dB");
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_user_text_value_without_trailing_terminator() {
        let frame = decode("TXXX", b"\x00desc\0value").unwrap();
        match &frame.body {
            FrameBody::UserText { description, value } => {
                assert_eq!(description, "desc");
                assert_eq!(value, "value");
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_private_round_trip() {
        let frame = decode("PRIV", b"com.example\0\x01\x02\x03").unwrap();
        assert_eq!(frame.encoding, None);
        match &frame.body {
            FrameBody::Private { owner, data } => {
                assert_eq!(owner, "com.example");
                assert_eq!(data, &[1, 2, 3]);
            }
            other => panic!("unexpected body {other:?}"),
        }
        let payload = frame.encode_payload();
        assert_eq!(payload, b"com.example\0\x01\x02\x03");
    }

    #[test]
    fn test_bare_link() {
        let mut warnings = Vec::new();
        let frame = Frame::decode(
            "WOAR",
            FrameFlags::default(),
            b"http://example.com",
            &mut warnings,
        )
        .unwrap();
        assert!(warnings.is_empty());
        assert_eq!(frame.text(), Some("http://example.com"));
        assert_eq!(frame.encode_payload(), b"http://example.com");
    }

    #[test]
    fn test_described_link_is_flagged() {
        let mut warnings = Vec::new();
        let frame = Frame::decode(
            "WCOM",
            FrameFlags::default(),
            b"\x00store\0http://example.com/buy",
            &mut warnings,
        )
        .unwrap();
        assert_eq!(
            warnings,
            vec![Warning::AmbiguousLinkLayout("WCOM".to_string())]
        );
        match &frame.body {
            FrameBody::Link { description, url } => {
                assert_eq!(description.as_deref(), Some("store"));
                assert_eq!(url, "http://example.com/buy");
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_empty_payload() {
        assert!(matches!(decode("TIT2", &[]), Err(Error::MalformedFrame(_))));
    }

    #[test]
    fn test_picture_type_names() {
        assert_eq!(picture_type_name(0x03), Some("Cover (front)"));
        assert_eq!(picture_type_name(0x11), Some("A bright coloured fish"));
        assert_eq!(picture_type_name(0x40), None);
    }
}
