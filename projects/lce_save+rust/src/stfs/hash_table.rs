// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The 24-byte hash entries that make up each level of an STFS package's hash tree.

use crate::cursor::ReadCursorExt;
use byteorder::ReadBytesExt;
use std::io::{self, Read, Seek, SeekFrom};

/// Size on disk of one [HashEntry]: a 20-byte hash, a status byte, and a 24-bit next
/// block pointer.
pub const HASH_ENTRY_SIZE: u64 = 0x18;

/// One entry of an STFS hash table. The block hash itself is not validated by this
/// crate (see the crate-level Non-goals).
#[derive(Debug, Clone, Copy)]
pub struct HashEntry {
    /// SHA-1 hash of the data block this entry hashes. Never checked against the data.
    pub hash: [u8; 20],

    /// Status byte; bit 6 selects which of two hash-table copies is live.
    pub status: u8,

    /// The next block in this block's chain, for non-consecutive files.
    pub next_block: u32,
}

impl HashEntry {
    /// Read one hash entry from the current stream position.
    pub fn new<T: Read>(mut stream: T) -> io::Result<Self> {
        let mut hash = [0; 20];
        stream.read_exact(&mut hash)?;
        let status = stream.read_u8()?;
        let next_block = stream.read_u24_be()?;

        Ok(Self {
            hash,
            status,
            next_block,
        })
    }

    /// Read a hash entry positioned at `address` in `stream`.
    pub fn at<T: Read + Seek>(mut stream: T, address: u64) -> io::Result<Self> {
        stream.seek(SeekFrom::Start(address))?;
        Self::new(&mut stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_fixed_layout() {
        let mut bytes = vec![0xAB; 20];
        bytes.push(0x40);
        bytes.extend_from_slice(&[0x00, 0x01, 0x02]);

        let entry = HashEntry::new(Cursor::new(bytes)).unwrap();
        assert_eq!(entry.hash, [0xAB; 20]);
        assert_eq!(entry.status, 0x40);
        assert_eq!(entry.next_block, 0x000102);
    }
}
