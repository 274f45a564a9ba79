// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The fixed-offset fields of an Xbox 360 STFS BIN header.

use crate::cursor::ReadCursorExt;
use crate::stfs::volume_descriptor::StfsVolumeDescriptor;
use crate::stfs::StfsError;
use byteorder::{ReadBytesExt, BE};
use std::io::{Read, Seek, SeekFrom};

const OFFSET_HEADER_SIZE: u64 = 0x0340;
const OFFSET_CONTENT_TYPE: u64 = 0x0344;
const OFFSET_FILE_SYSTEM: u64 = 0x03A9;
const OFFSET_VOLUME_DESCRIPTOR: u64 = 0x0379;
const OFFSET_DISPLAY_NAME: u64 = 0x0411;
const OFFSET_THUMBNAIL: u64 = 0x1712;
const OFFSET_TITLE_THUMBNAIL: u64 = 0x571A;

const SAVEGAME_CONTENT_TYPE: u32 = 1;
const STFS_FILE_SYSTEM: u32 = 0;

/// The fixed-offset header fields of an STFS BIN file, parsed ahead of the hash-tree
/// geometry that depends on [Self::header_size] and [StfsVolumeDescriptor].
#[derive(Debug, Clone)]
pub struct BinHeader {
    /// Size of the header region preceding the first hash table.
    pub header_size: u32,

    /// Package-wide geometry parameters.
    pub volume_descriptor: StfsVolumeDescriptor,

    /// Display name shown by the Xbox 360 dashboard.
    pub display_name: String,

    /// Thumbnail PNG bytes, if present (in-game thumbnail, falling back to the title
    /// thumbnail).
    pub thumbnail: Vec<u8>,
}

impl BinHeader {
    /// Parse the header from a stream positioned at the start of the BIN file.
    pub fn new<T: Read + Seek>(mut stream: T) -> Result<Self, StfsError> {
        stream.seek(SeekFrom::Start(OFFSET_HEADER_SIZE))?;
        let header_size = stream.read_u32::<BE>()?;

        stream.seek(SeekFrom::Start(OFFSET_CONTENT_TYPE))?;
        let content_type = stream.read_u32::<BE>()?;
        if content_type != SAVEGAME_CONTENT_TYPE {
            return Err(StfsError::NotASavegame);
        }

        stream.seek(SeekFrom::Start(OFFSET_FILE_SYSTEM))?;
        let file_system = stream.read_u32::<BE>()?;
        if file_system != STFS_FILE_SYSTEM {
            return Err(StfsError::NotStfs);
        }

        stream.seek(SeekFrom::Start(OFFSET_VOLUME_DESCRIPTOR))?;
        let volume_descriptor = StfsVolumeDescriptor::new(&mut stream)?;

        stream.seek(SeekFrom::Start(OFFSET_DISPLAY_NAME))?;
        let display_name = stream.read_wstring_u16_prefixed()?;

        stream.seek(SeekFrom::Start(OFFSET_THUMBNAIL))?;
        let thumbnail_size = stream.read_u32::<BE>()?;
        let thumbnail = if thumbnail_size != 0 {
            stream.seek(SeekFrom::Current(4))?;
            stream.read_exact_vec(thumbnail_size as usize)?
        } else {
            let title_thumbnail_size = stream.read_u32::<BE>()?;
            if title_thumbnail_size != 0 {
                stream.seek(SeekFrom::Start(OFFSET_TITLE_THUMBNAIL))?;
                stream.read_exact_vec(title_thumbnail_size as usize)?
            } else {
                Vec::new()
            }
        };

        Ok(Self {
            header_size,
            volume_descriptor,
            display_name,
            thumbnail,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Cursor;

    fn minimal_bin_bytes() -> Vec<u8> {
        let mut bytes = vec![0u8; 0x1716];

        (&mut bytes[0x0340..0x0344]).write_u32::<BE>(0x3000).unwrap();
        (&mut bytes[0x0344..0x0348]).write_u32::<BE>(1).unwrap();
        (&mut bytes[0x03A9..0x03AD]).write_u32::<BE>(0).unwrap();

        bytes[0x0379] = 0x24; // size
        bytes[0x037B] = 0x01; // block separation
        (&mut bytes[0x037C..0x037E])
            .write_u16::<byteorder::LE>(1)
            .unwrap();
        bytes[0x037E..0x0381].copy_from_slice(&[0x10, 0x00, 0x00]);
        (&mut bytes[0x039D..0x03A1])
            .write_u32::<byteorder::LE>(100)
            .unwrap();
        (&mut bytes[0x03A1..0x03A5])
            .write_u32::<byteorder::LE>(5)
            .unwrap();

        (&mut bytes[0x0411..0x0413]).write_u16::<BE>(0).unwrap();

        (&mut bytes[0x1712..0x1716]).write_u32::<BE>(0).unwrap();

        bytes
    }

    #[test]
    fn parses_minimal_header() {
        let bytes = minimal_bin_bytes();
        let header = BinHeader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(header.header_size, 0x3000);
        assert_eq!(header.volume_descriptor.allocated_block_count, 100);
        assert!(header.thumbnail.is_empty());
    }

    #[test]
    fn rejects_non_savegame_content_type() {
        let mut bytes = minimal_bin_bytes();
        (&mut bytes[0x0344..0x0348]).write_u32::<BE>(2).unwrap();

        let err = BinHeader::new(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, StfsError::NotASavegame));
    }

    #[test]
    fn rejects_non_stfs_file_system() {
        let mut bytes = minimal_bin_bytes();
        (&mut bytes[0x03A9..0x03AD]).write_u32::<BE>(1).unwrap();

        let err = BinHeader::new(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, StfsError::NotStfs));
    }
}
