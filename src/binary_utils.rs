use std::io::{self, Cursor, Read, Seek, SeekFrom};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

/// Bytes left between the cursor position and the end of the buffer
pub fn remaining(cursor: &Cursor<&[u8]>) -> usize {
    let len = cursor.get_ref().len() as u64;
    len.saturating_sub(cursor.position()) as usize
}

fn ensure_available(cursor: &Cursor<&[u8]>, length: usize, what: &str) -> io::Result<()> {
    let available = remaining(cursor);
    if available < length {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "Not enough bytes for {} at 0x{:x} (need {}, have {})",
                what,
                cursor.position(),
                length,
                available
            ),
        ));
    }
    Ok(())
}

pub fn read_u8(cursor: &mut Cursor<&[u8]>) -> io::Result<u8> {
    ensure_available(cursor, 1, "u8")?;
    cursor.read_u8()
}

pub fn read_u16_be(cursor: &mut Cursor<&[u8]>) -> io::Result<u16> {
    ensure_available(cursor, 2, "u16")?;
    cursor.read_u16::<BigEndian>()
}

pub fn read_i16_be(cursor: &mut Cursor<&[u8]>) -> io::Result<i16> {
    ensure_available(cursor, 2, "i16")?;
    cursor.read_i16::<BigEndian>()
}

pub fn read_u32_be(cursor: &mut Cursor<&[u8]>) -> io::Result<u32> {
    ensure_available(cursor, 4, "u32")?;
    cursor.read_u32::<BigEndian>()
}

pub fn read_i32_be(cursor: &mut Cursor<&[u8]>) -> io::Result<i32> {
    ensure_available(cursor, 4, "i32")?;
    cursor.read_i32::<BigEndian>()
}

pub fn read_u32_le(cursor: &mut Cursor<&[u8]>) -> io::Result<u32> {
    ensure_available(cursor, 4, "u32")?;
    cursor.read_u32::<LittleEndian>()
}

pub fn read_bytes(cursor: &mut Cursor<&[u8]>, length: usize) -> io::Result<Vec<u8>> {
    ensure_available(cursor, length, "byte block")?;
    let mut buffer = vec![0u8; length];
    cursor.read_exact(&mut buffer)?;
    Ok(buffer)
}

/// Reads a NUL-padded fixed-width string; bytes are interpreted as Latin-1
pub fn read_fixed_string(cursor: &mut Cursor<&[u8]>, length: usize) -> io::Result<String> {
    let raw = read_bytes(cursor, length)?;
    Ok(latin1_until_nul(&raw))
}

pub fn latin1_until_nul(raw: &[u8]) -> String {
    raw.iter()
        .take_while(|&&b| b != 0)
        .map(|&b| b as char)
        .collect::<String>()
        .trim()
        .to_string()
}

pub fn skip(cursor: &mut Cursor<&[u8]>, length: usize) -> io::Result<()> {
    ensure_available(cursor, length, "skipped block")?;
    cursor.seek(SeekFrom::Current(length as i64))?;
    Ok(())
}

pub fn seek_to(cursor: &mut Cursor<&[u8]>, position: u64) -> io::Result<()> {
    if position > cursor.get_ref().len() as u64 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Cannot seek to position {} (buffer length: {})",
                position,
                cursor.get_ref().len()
            ),
        ));
    }

    cursor.seek(SeekFrom::Start(position))?;
    Ok(())
}

/// Bytes needed to bring `size` up to the next multiple of `alignment`
pub fn padding_for(size: usize, alignment: usize) -> usize {
    if alignment <= 1 {
        return 0;
    }
    (alignment - size % alignment) % alignment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_values() {
        let data: &[u8] = &[0x12, 0x34, 0xFF, 0xFE, 0x00, 0x00, 0x01, 0x00];
        let mut cursor = Cursor::new(data);
        assert_eq!(read_u16_be(&mut cursor).unwrap(), 0x1234);
        assert_eq!(read_i16_be(&mut cursor).unwrap(), -2);
        assert_eq!(read_u32_be(&mut cursor).unwrap(), 0x100);
        assert_eq!(remaining(&cursor), 0);
    }

    #[test]
    fn short_reads_fail_without_moving() {
        let data: &[u8] = &[0x01, 0x02, 0x03];
        let mut cursor = Cursor::new(data);
        let err = read_u32_be(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn fixed_strings_stop_at_nul() {
        let data: &[u8] = b"ARTEMPLE\0\0garbage";
        let mut cursor = Cursor::new(data);
        assert_eq!(read_fixed_string(&mut cursor, 16).unwrap(), "ARTEMPLE");
        assert_eq!(cursor.position(), 16);
    }

    #[test]
    fn padding_rounds_to_alignment() {
        assert_eq!(padding_for(16, 4), 0);
        assert_eq!(padding_for(17, 4), 3);
        assert_eq!(padding_for(62, 4), 2);
        assert_eq!(padding_for(5, 1), 0);
    }
}
