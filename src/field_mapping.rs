// Frame identifier <-> human field name mapping
//
// One authoritative table consulted in both directions, so parsing,
// lookup and upserts can never disagree about what a frame is called.

/// Frame identifiers paired with their stable human-readable names.
///
/// The id column is the ID3v2 spelling; ID3v1 fields are stored under the
/// id of their ID3v2 counterpart so lookups work the same for both
/// generations.
const FRAME_NAMES: &[(&str, &str)] = &[
    ("TIT2", "title"),
    ("TPE1", "artist"),
    ("TALB", "album"),
    ("TYER", "year"),
    ("COMM", "comment"),
    ("TRCK", "track"),
    ("TCON", "genre"),
    ("TPOS", "disc"),
    ("APIC", "cover"),
    ("TPE2", "albumArtist"),
    ("TPUB", "publisher"),
    ("PRIV", "private"),
    ("TXXX", "userDefined"),
    ("TDRC", "date"),
    ("TCOP", "copyright"),
    ("TDEN", "creationTime"),
    ("TSSE", "encoder"),
    ("TDRL", "podcastReleased"),
    ("TCAT", "podcastCategory"),
    ("TGID", "podcastIdentifier"),
    ("WFED", "podcastFeed"),
    ("PCST", "podcastDescription"),
    ("USLT", "lyrics"),
];

/// Human name for a frame identifier, if one is defined.
pub fn human_name(frame_id: &str) -> Option<&'static str> {
    FRAME_NAMES
        .iter()
        .find(|(id, _)| *id == frame_id)
        .map(|(_, name)| *name)
}

/// Frame identifier for a human field name, if one is defined.
pub fn frame_id(human: &str) -> Option<&'static str> {
    FRAME_NAMES
        .iter()
        .find(|(_, name)| *name == human)
        .map(|(id, _)| *id)
}
