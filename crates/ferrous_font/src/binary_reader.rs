//! Big-endian primitive readers used by the table and glyph parsers.

use std::io::{self, Read};

/// Read a single unsigned byte.
pub fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a single signed byte.
pub fn read_i8<R: Read>(reader: &mut R) -> io::Result<i8> {
    Ok(read_u8(reader)? as i8)
}

/// Read an unsigned 16-bit big-endian value from the cursor.
pub fn read_u16_be<R: Read>(reader: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

/// Read a signed 16-bit big-endian value.
pub fn read_i16_be<R: Read>(reader: &mut R) -> io::Result<i16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(i16::from_be_bytes(buf))
}

/// Read an unsigned 32-bit big-endian value.
pub fn read_u32_be<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// Read a signed 32-bit big-endian value.
pub fn read_i32_be<R: Read>(reader: &mut R) -> io::Result<i32> {
    Ok(read_u32_be(reader)? as i32)
}

/// Read a signed 2.14 fixed point number (`F2Dot14`), as used by composite
/// glyph scale factors.
pub fn read_f2dot14<R: Read>(reader: &mut R) -> io::Result<f64> {
    Ok(read_i16_be(reader)? as f64 / 16384.0)
}

/// Read a big-endian u16 at `offset` inside `slice`, `None` when out of bounds.
pub fn u16_at(slice: &[u8], offset: usize) -> Option<u16> {
    let bytes = slice.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// Read a big-endian i16 at `offset` inside `slice`.
pub fn i16_at(slice: &[u8], offset: usize) -> Option<i16> {
    u16_at(slice, offset).map(|v| v as i16)
}

/// Read a big-endian u32 at `offset` inside `slice`.
pub fn u32_at(slice: &[u8], offset: usize) -> Option<u32> {
    let bytes = slice.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
