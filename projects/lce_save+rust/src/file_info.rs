// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The FileInfo preview envelope: a per-console fixed header (on WiiU/Switch) wrapping
//! the same [ThumbnailMetadata] PNG `tEXt` payload every console carries.

use crate::console::Console;
use crate::cursor::{ReadCursorExt, WriteCursorExt};
use crate::thumbnail::{ThumbnailError, ThumbnailMetadata};
use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use std::io::{self, Read, Seek, Write};
use thiserror::Error;

const WIIU_HEADER_BYTES: usize = 256;
const SWITCH_HEADER_BYTES: usize = 512;

/// A companion preview file: the thumbnail metadata, plus whatever per-console fixed
/// header precedes it.
#[derive(Debug, Clone, Default)]
pub struct FileInfo {
    /// Human-readable name carried in the WiiU/Switch header; unused (and left empty)
    /// on consoles with no header.
    pub base_save_name: String,

    /// The Switch header's second `u32`, whose purpose is unknown; preserved verbatim
    /// from whatever was read so a later write round-trips it unchanged rather than
    /// synthesizing zero.
    pub switch_unknown: u32,

    /// The PNG `tEXt` metadata shared by every console's preview file.
    pub thumbnail: ThumbnailMetadata,
}

impl FileInfo {
    /// Parse a FileInfo envelope for the given target console.
    pub fn new<T: Read + Seek>(console: Console, mut stream: T) -> Result<Self, FileInfoError> {
        let mut info = Self::default();

        match console {
            Console::WiiU => {
                info.base_save_name = stream.read_wstring_fixed_le(WIIU_HEADER_BYTES)?;
            }
            Console::Switch => {
                info.base_save_name = stream.read_wstring_fixed_u32_le(SWITCH_HEADER_BYTES)?;
                info.switch_unknown = stream.read_u32::<LE>()?;
                let _zero = stream.read_u32::<LE>()?;
            }
            _ => {}
        }

        info.thumbnail = ThumbnailMetadata::new(&mut stream)?;
        Ok(info)
    }

    /// Emit a FileInfo envelope for the given target console.
    pub fn dump<T: Write>(&self, console: Console, mut stream: T) -> Result<(), FileInfoError> {
        match console {
            Console::WiiU => {
                stream.write_wstring_fixed_le(&self.base_save_name, WIIU_HEADER_BYTES)?;
            }
            Console::Switch => {
                stream.write_wstring_fixed_u32_le(&self.base_save_name, SWITCH_HEADER_BYTES)?;
                stream.write_u32::<LE>(self.switch_unknown)?;
                stream.write_u32::<LE>(0)?;
            }
            _ => {}
        }

        let include_base_save_name = !matches!(console, Console::WiiU | Console::Switch | Console::Vita);
        self.thumbnail.dump(&mut stream, include_base_save_name)?;
        Ok(())
    }
}

/// Errors raised while reading or writing a [FileInfo] envelope.
#[derive(Error, Debug)]
pub enum FileInfoError {
    /// IO error while reading or writing the envelope.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The embedded thumbnail metadata failed to parse.
    #[error(transparent)]
    Thumbnail(#[from] ThumbnailError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&[0; 13]);
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes
    }

    #[test]
    fn wiiu_roundtrips_base_save_name() {
        let info = FileInfo {
            base_save_name: "My World".to_string(),
            switch_unknown: 0,
            thumbnail: ThumbnailMetadata {
                png_prefix: png_bytes(),
                ..Default::default()
            },
        };

        let mut buf = Vec::new();
        info.dump(Console::WiiU, Cursor::new(&mut buf)).unwrap();
        assert_eq!(&buf[WIIU_HEADER_BYTES..WIIU_HEADER_BYTES + 8], &png_bytes()[0..8]);

        let parsed = FileInfo::new(Console::WiiU, Cursor::new(buf)).unwrap();
        assert_eq!(parsed.base_save_name, "My World");
    }

    #[test]
    fn switch_preserves_unknown_field_verbatim() {
        let info = FileInfo {
            base_save_name: "Another World".to_string(),
            switch_unknown: 0xDEADBEEF,
            thumbnail: ThumbnailMetadata {
                png_prefix: png_bytes(),
                ..Default::default()
            },
        };

        let mut buf = Vec::new();
        info.dump(Console::Switch, Cursor::new(&mut buf)).unwrap();

        let parsed = FileInfo::new(Console::Switch, Cursor::new(buf)).unwrap();
        assert_eq!(parsed.switch_unknown, 0xDEADBEEF);
        assert_eq!(parsed.base_save_name, "Another World");
    }

    #[test]
    fn other_consoles_have_no_header() {
        let info = FileInfo {
            base_save_name: String::new(),
            switch_unknown: 0,
            thumbnail: ThumbnailMetadata {
                png_prefix: png_bytes(),
                ..Default::default()
            },
        };

        let mut buf = Vec::new();
        info.dump(Console::Ps3, Cursor::new(&mut buf)).unwrap();
        assert_eq!(&buf[0..8], &png_bytes()[0..8]);
    }
}
