// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Endian-aware typed reads and writes layered over any [Read]/[Write] stream.
//!
//! Mirrors the extension-trait style used throughout `lce_util`: no bespoke cursor
//! type, just blanket impls over the standard streaming traits. Endianness is chosen
//! per call via the `byteorder` marker types (`BE`/`LE`), not a runtime mode switch.

use byteorder::{ReadBytesExt, WriteBytesExt, BE, LE};
use std::io::{self, Read, Seek, SeekFrom, Write};
use util::StringEx;

/// Extension trait adding LCE-specific typed reads on top of [Read].
pub trait ReadCursorExt: Read {
    /// Read a big-endian 24-bit unsigned integer, returned widened to [u32].
    fn read_u24_be(&mut self) -> io::Result<u32> {
        let mut buf = [0; 3];
        self.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes([0, buf[0], buf[1], buf[2]]))
    }

    /// Read a little-endian 24-bit unsigned integer, returned widened to [u32].
    fn read_u24_le(&mut self) -> io::Result<u32> {
        let mut buf = [0; 3];
        self.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes([buf[0], buf[1], buf[2], 0]))
    }

    /// Read `len` bytes into a freshly allocated buffer.
    fn read_exact_vec(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read a length-prefixed (big-endian `u16` count of UTF-16 code units) wide
    /// string, as used by the STFS display name field.
    fn read_wstring_u16_prefixed(&mut self) -> io::Result<String> {
        let len = self.read_u16::<BE>()? as usize;
        let mut units = Vec::with_capacity(len);
        for _ in 0..len {
            units.push(self.read_u16::<BE>()?);
        }

        String::from_utf16(&units)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }

    /// Read a fixed-size, NUL-padded UTF-16 big-endian string occupying
    /// `byte_len` bytes on disk (`byte_len` must be even).
    fn read_wstring_fixed_be(&mut self, byte_len: usize) -> io::Result<String> {
        assert_eq!(byte_len % 2, 0);

        let units_len = byte_len / 2;
        let mut units = Vec::with_capacity(units_len);
        for _ in 0..units_len {
            units.push(self.read_u16::<BE>()?);
        }

        let nul_at = units.iter().position(|&unit| unit == 0).unwrap_or(units.len());
        String::from_utf16(&units[..nul_at])
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }

    /// Read a fixed-size, NUL-padded UTF-16 little-endian string occupying
    /// `byte_len` bytes on disk (`byte_len` must be even), as used by the archive
    /// directory and the WiiU FileInfo header.
    fn read_wstring_fixed_le(&mut self, byte_len: usize) -> io::Result<String> {
        assert_eq!(byte_len % 2, 0);

        let units_len = byte_len / 2;
        let mut units = Vec::with_capacity(units_len);
        for _ in 0..units_len {
            units.push(self.read_u16::<LE>()?);
        }

        let nul_at = units.iter().position(|&unit| unit == 0).unwrap_or(units.len());
        String::from_utf16(&units[..nul_at])
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }

    /// Read a fixed-size, NUL-padded UTF-32 little-endian string occupying
    /// `byte_len` bytes on disk (`byte_len` must be a multiple of 4), as used by the
    /// Switch FileInfo header.
    fn read_wstring_fixed_u32_le(&mut self, byte_len: usize) -> io::Result<String> {
        assert_eq!(byte_len % 4, 0);

        let mut scalars = Vec::new();
        let mut terminated = false;
        for _ in 0..(byte_len / 4) {
            let unit = self.read_u32::<LE>()?;
            if unit == 0 {
                terminated = true;
                continue;
            }

            if terminated {
                continue;
            }

            let ch = char::from_u32(unit)
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "invalid UTF-32 scalar"))?;
            scalars.push(ch);
        }

        Ok(scalars.into_iter().collect())
    }

    /// Read a NUL-terminated UTF-32 little-endian string, stopping at the first
    /// all-zero code unit. Used by the Switch FileInfo header.
    fn read_wstring_u32_nul_terminated(&mut self) -> io::Result<String> {
        let mut scalars = Vec::new();
        loop {
            let unit = self.read_u32::<LE>()?;
            if unit == 0 {
                break;
            }

            let ch = char::from_u32(unit)
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "invalid UTF-32 scalar"))?;
            scalars.push(ch);
        }

        Ok(scalars.into_iter().collect())
    }

    /// Read a fixed-size buffer and trim it at the first NUL byte, decoding the rest
    /// as UTF-8.
    fn read_ascii_fixed(&mut self, len: usize) -> io::Result<String> {
        let buf = self.read_exact_vec(len)?;
        String::from_null_terminated_bytes(&buf)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }
}

impl<T: ?Sized + Read> ReadCursorExt for T {}

/// Extension trait adding LCE-specific typed writes on top of [Write].
pub trait WriteCursorExt: Write {
    /// Write a 24-bit unsigned integer in big-endian order, taking the low 3 bytes of
    /// `value`.
    fn write_u24_be(&mut self, value: u32) -> io::Result<()> {
        let bytes = value.to_be_bytes();
        self.write_all(&bytes[1..4])
    }

    /// Write a 24-bit unsigned integer in little-endian order, taking the low 3 bytes
    /// of `value`.
    fn write_u24_le(&mut self, value: u32) -> io::Result<()> {
        let bytes = value.to_le_bytes();
        self.write_all(&bytes[0..3])
    }

    /// Write a length-prefixed (big-endian `u16` count) UTF-16 big-endian string.
    fn write_wstring_u16_prefixed(&mut self, value: &str) -> io::Result<()> {
        let units: Vec<u16> = value.encode_utf16().collect();
        self.write_u16::<BE>(units.len() as u16)?;
        for unit in units {
            self.write_u16::<BE>(unit)?;
        }

        Ok(())
    }

    /// Write a fixed-size, NUL-padded UTF-16 big-endian string occupying exactly
    /// `byte_len` bytes.
    fn write_wstring_fixed_be(&mut self, value: &str, byte_len: usize) -> io::Result<()> {
        assert_eq!(byte_len % 2, 0);

        let units: Vec<u16> = value.encode_utf16().collect();
        assert!(units.len() * 2 <= byte_len);

        for unit in &units {
            self.write_u16::<BE>(*unit)?;
        }

        for _ in units.len()..(byte_len / 2) {
            self.write_u16::<BE>(0)?;
        }

        Ok(())
    }

    /// Write a NUL-terminated UTF-32 little-endian string (the terminator is written,
    /// the caller pads the remainder of any fixed-size field separately).
    fn write_wstring_u32_nul_terminated(&mut self, value: &str) -> io::Result<()> {
        for ch in value.chars() {
            self.write_u32::<LE>(ch as u32)?;
        }
        self.write_u32::<LE>(0)
    }

    /// Write a fixed-size, NUL-padded UTF-16 little-endian string occupying exactly
    /// `byte_len` bytes, as used by the archive directory and the WiiU FileInfo
    /// header.
    fn write_wstring_fixed_le(&mut self, value: &str, byte_len: usize) -> io::Result<()> {
        assert_eq!(byte_len % 2, 0);

        let units: Vec<u16> = value.encode_utf16().collect();
        assert!(units.len() * 2 <= byte_len);

        for unit in &units {
            self.write_u16::<LE>(*unit)?;
        }

        for _ in units.len()..(byte_len / 2) {
            self.write_u16::<LE>(0)?;
        }

        Ok(())
    }

    /// Write a fixed-size, NUL-padded UTF-32 little-endian string occupying exactly
    /// `byte_len` bytes, as used by the Switch FileInfo header.
    fn write_wstring_fixed_u32_le(&mut self, value: &str, byte_len: usize) -> io::Result<()> {
        assert_eq!(byte_len % 4, 0);

        let scalars: Vec<char> = value.chars().collect();
        assert!(scalars.len() * 4 <= byte_len);

        for ch in &scalars {
            self.write_u32::<LE>(*ch as u32)?;
        }

        for _ in scalars.len()..(byte_len / 4) {
            self.write_u32::<LE>(0)?;
        }

        Ok(())
    }
}

impl<T: ?Sized + Write> WriteCursorExt for T {}

/// Extension trait adding position/remaining-length helpers on top of [Seek].
pub trait SeekCursorExt: Seek {
    /// Total length of the underlying stream.
    fn total_len(&mut self) -> io::Result<u64> {
        let current = self.stream_position()?;
        let end = self.seek(SeekFrom::End(0))?;
        self.seek(SeekFrom::Start(current))?;
        Ok(end)
    }

    /// Number of bytes remaining between the current position and the end of the
    /// stream.
    fn remaining(&mut self) -> io::Result<u64> {
        let len = self.total_len()?;
        let pos = self.stream_position()?;
        Ok(len.saturating_sub(pos))
    }

    /// Whether the cursor is at (or past) the end of the stream.
    fn eof(&mut self) -> io::Result<bool> {
        Ok(self.remaining()? == 0)
    }
}

impl<T: ?Sized + Seek> SeekCursorExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_u24_be_roundtrip() {
        let mut buf: Vec<u8> = Vec::new();
        buf.write_u24_be(0x00AB_CDEF & 0x00FF_FFFF).unwrap();
        let mut cursor = Cursor::new(buf);
        assert_eq!(cursor.read_u24_be().unwrap(), 0x00AB_CDEF & 0x00FF_FFFF);
    }

    #[test]
    fn read_u24_le_roundtrip() {
        let mut buf: Vec<u8> = Vec::new();
        buf.write_u24_le(0x00120304).unwrap();
        let mut cursor = Cursor::new(buf);
        assert_eq!(cursor.read_u24_le().unwrap(), 0x00120304);
    }

    #[test]
    fn wstring_u16_prefixed_roundtrip() {
        let mut buf: Vec<u8> = Vec::new();
        buf.write_wstring_u16_prefixed("hello").unwrap();
        let mut cursor = Cursor::new(buf);
        assert_eq!(cursor.read_wstring_u16_prefixed().unwrap(), "hello");
    }

    #[test]
    fn wstring_fixed_be_trims_padding() {
        let mut buf: Vec<u8> = Vec::new();
        buf.write_wstring_fixed_be("hi", 10).unwrap();
        assert_eq!(buf.len(), 10);

        let mut cursor = Cursor::new(buf);
        assert_eq!(cursor.read_wstring_fixed_be(10).unwrap(), "hi");
    }

    #[test]
    fn wstring_fixed_le_trims_padding() {
        let mut buf: Vec<u8> = Vec::new();
        buf.write_wstring_fixed_le("hi", 10).unwrap();
        assert_eq!(buf.len(), 10);

        let mut cursor = Cursor::new(buf);
        assert_eq!(cursor.read_wstring_fixed_le(10).unwrap(), "hi");
    }

    #[test]
    fn wstring_fixed_u32_le_trims_padding() {
        let mut buf: Vec<u8> = Vec::new();
        buf.write_wstring_fixed_u32_le("hi", 16).unwrap();
        assert_eq!(buf.len(), 16);

        let mut cursor = Cursor::new(buf);
        assert_eq!(cursor.read_wstring_fixed_u32_le(16).unwrap(), "hi");
    }

    #[test]
    fn wstring_u32_nul_terminated_roundtrip() {
        let mut buf: Vec<u8> = Vec::new();
        buf.write_wstring_u32_nul_terminated("abc").unwrap();

        let mut cursor = Cursor::new(buf);
        assert_eq!(cursor.read_wstring_u32_nul_terminated().unwrap(), "abc");
    }

    #[test]
    fn remaining_and_eof() {
        let mut cursor = Cursor::new(vec![1, 2, 3, 4]);
        assert_eq!(cursor.remaining().unwrap(), 4);
        assert!(!cursor.eof().unwrap());

        cursor.seek(SeekFrom::End(0)).unwrap();
        assert!(cursor.eof().unwrap());
    }

    #[test]
    fn read_ascii_fixed_trims_at_nul() {
        let mut cursor = Cursor::new(b"abc\0\0\0".to_vec());
        assert_eq!(cursor.read_ascii_fixed(6).unwrap(), "abc");
    }
}
