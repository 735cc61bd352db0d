// I/O helpers for reading tag structures

use std::io::{Read, Seek, SeekFrom};

/// Read a big-endian 32-bit integer.
pub fn read_be_u32<R: Read>(reader: &mut R) -> std::io::Result<u32> {
    let mut buffer = [0u8; 4];
    reader.read_exact(&mut buffer)?;
    Ok(u32::from_be_bytes(buffer))
}

/// Check whether `signature` sits at the current position, restoring the
/// position afterwards regardless of the outcome.
pub fn check_signature<R: Read + Seek>(reader: &mut R, signature: &[u8]) -> std::io::Result<bool> {
    let pos = reader.stream_position()?;
    let mut buffer = vec![0u8; signature.len()];
    let matched = match reader.read_exact(&mut buffer) {
        Ok(()) => buffer == signature,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => false,
        Err(e) => return Err(e),
    };
    reader.seek(SeekFrom::Start(pos))?;
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_be_u32() {
        let mut cursor = Cursor::new([0x00, 0x00, 0x01, 0x02]);
        assert_eq!(read_be_u32(&mut cursor).unwrap(), 258);
    }

    #[test]
    fn test_check_signature_restores_position() {
        let mut cursor = Cursor::new(b"ID3rest".to_vec());
        assert!(check_signature(&mut cursor, b"ID3").unwrap());
        assert_eq!(cursor.position(), 0);
        assert!(!check_signature(&mut cursor, b"TAG").unwrap());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_check_signature_short_input() {
        let mut cursor = Cursor::new(b"ID".to_vec());
        assert!(!check_signature(&mut cursor, b"ID3").unwrap());
        assert_eq!(cursor.position(), 0);
    }
}
