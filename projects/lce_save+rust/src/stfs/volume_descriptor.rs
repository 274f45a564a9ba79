// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

use crate::cursor::ReadCursorExt;
use byteorder::{ReadBytesExt, BE, LE};
use std::io::{self, Read, Seek, SeekFrom};

/// STFS volume descriptor: package-wide geometry parameters.
#[derive(Debug, Clone, Copy)]
pub struct StfsVolumeDescriptor {
    /// Size of this descriptor, as stored on disk (unused beyond validation).
    pub size: u8,

    /// Selects the block-spacing constant set via its low bit.
    pub block_separation: u8,

    /// Number of blocks occupied by the file table.
    pub file_table_block_count: u16,

    /// Starting block number of the file table.
    pub file_table_block_num: u32,

    /// Total blocks allocated to the package.
    pub allocated_block_count: u32,

    /// Blocks allocated but not yet used.
    pub unallocated_block_count: u32,
}

impl StfsVolumeDescriptor {
    /// Parse a volume descriptor from the current stream position.
    pub fn new<T: Read + Seek>(mut stream: T) -> io::Result<Self> {
        let size = stream.read_u8()?;
        stream.seek(SeekFrom::Current(1))?; // reserved
        let block_separation = stream.read_u8()?;
        let file_table_block_count = stream.read_u16::<BE>()?;
        let file_table_block_num = stream.read_u24_be()?;

        stream.seek(SeekFrom::Current(0x14))?; // top hash table hash, unvalidated

        let allocated_block_count = stream.read_u32::<LE>()?;
        let unallocated_block_count = stream.read_u32::<LE>()?;

        Ok(Self {
            size,
            block_separation,
            file_table_block_count,
            file_table_block_num,
            allocated_block_count,
            unallocated_block_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_fixed_layout() {
        let mut bytes = vec![0u8; 0x24];
        bytes[0] = 0x24; // size
        bytes[2] = 0x01; // block separation (male)
        bytes[3..5].copy_from_slice(&1u16.to_be_bytes());
        bytes[5..8].copy_from_slice(&[0x00, 0x00, 0x10]);
        bytes[0x1C..0x20].copy_from_slice(&100u32.to_le_bytes());
        bytes[0x20..0x24].copy_from_slice(&5u32.to_le_bytes());

        let vd = StfsVolumeDescriptor::new(Cursor::new(bytes)).unwrap();
        assert_eq!(vd.size, 0x24);
        assert_eq!(vd.block_separation, 1);
        assert_eq!(vd.file_table_block_count, 1);
        assert_eq!(vd.file_table_block_num, 0x10);
        assert_eq!(vd.allocated_block_count, 100);
        assert_eq!(vd.unallocated_block_count, 5);
    }
}
