// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! An Xbox 360 STFS BIN package: header, hash tree, file listing, and block
//! extraction over a single owned in-memory buffer.

use crate::cursor::ReadCursorExt;
use crate::stfs::block_math::{Gender, Geometry, TopLevel};
use crate::stfs::file_entry::{StfsEntryFlags, StfsFileEntry, StfsFileListing};
use crate::stfs::hash_table::HashEntry;
use crate::stfs::header::BinHeader;
use crate::stfs::StfsError;
use byteorder::{ReadBytesExt, BE};
use std::io::{Cursor, Seek, SeekFrom};
use tracing::{debug, trace};

const BLOCK_SIZE: u64 = 0x1000;
const ENTRIES_PER_TABLE_BLOCK: u32 = 0x40;
const SAVEGAME_FILE_NAME: &str = "savegame.dat";
const CONSECUTIVE_STRIPE_SIZE: u32 = 0xAA000;

/// A parsed STFS package: geometry, hash tree, and file listing over a whole BIN file
/// held in memory.
#[derive(Debug)]
pub struct StfsPackage {
    data: Vec<u8>,
    header: BinHeader,
    geometry: Geometry,
    top_level: TopLevel,
    top_table: Vec<HashEntry>,

    /// The package's reconstructed file listing tree.
    pub listing: StfsFileListing,
}

impl StfsPackage {
    /// Parse a whole STFS BIN file held in memory.
    pub fn new(data: Vec<u8>) -> Result<Self, StfsError> {
        let header = BinHeader::new(Cursor::new(&data))?;

        let vd = &header.volume_descriptor;
        let gender = Gender::from_block_separation(vd.block_separation);
        let first_hash_table_address = ((header.header_size as u64) + 0xFFF) & !0xFFF;
        let geometry = Geometry {
            gender,
            first_hash_table_address,
        };

        let top_level = TopLevel::for_allocated_blocks(vd.allocated_block_count)
            .map_err(StfsError::BlockMath)?;
        let entry_count = top_level.entry_count(vd.allocated_block_count);

        let top_table_address = geometry.hash_table_address_for_level(0, top_level as u8)
            + (((vd.block_separation & 2) as u64) << 0xB);

        let mut cursor = Cursor::new(&data);
        cursor.seek(SeekFrom::Start(top_table_address))?;
        let mut top_table = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            top_table.push(HashEntry::new(&mut cursor)?);
        }

        let mut package = Self {
            data,
            header,
            geometry,
            top_level,
            top_table,
            listing: StfsFileListing::from_flat_entries(&[]),
        };

        let entries = package.read_file_table()?;
        package.listing = StfsFileListing::from_flat_entries(&entries);

        Ok(package)
    }

    /// The package's display name, as shown on the Xbox 360 dashboard.
    pub fn display_name(&self) -> &str {
        &self.header.display_name
    }

    /// The thumbnail PNG bytes carried in the header, if any.
    pub fn thumbnail(&self) -> &[u8] {
        &self.header.thumbnail
    }

    fn read_file_table(&mut self) -> Result<Vec<StfsFileEntry>, StfsError> {
        let vd = &self.header.volume_descriptor;
        let mut entries = Vec::new();
        let mut block = vd.file_table_block_num;

        for table_block_index in 0..vd.file_table_block_count as u32 {
            let block_address = self.geometry.block_to_address(block).map_err(StfsError::BlockMath)?;

            let mut cursor = Cursor::new(&self.data);
            cursor.seek(SeekFrom::Start(block_address))?;

            for slot in 0..ENTRIES_PER_TABLE_BLOCK {
                let entry_address = block_address + (slot as u64) * 0x40;
                cursor.seek(SeekFrom::Start(entry_address))?;

                let name = cursor.read_ascii_fixed(40)?;
                let name_len = cursor.read_u8()?;

                if name_len & 0x3F == 0 {
                    continue;
                }
                if name.is_empty() {
                    break;
                }

                let blocks_for_file = cursor.read_u24_le()?;
                cursor.seek(SeekFrom::Current(3))?;
                let starting_block_num = cursor.read_u24_le()?;
                let path_indicator = cursor.read_u16::<BE>()?;
                let file_size = cursor.read_u32::<BE>()?;
                let created_timestamp = cursor.read_u32::<BE>()?;
                let access_timestamp = cursor.read_u32::<BE>()?;

                entries.push(StfsFileEntry {
                    entry_index: table_block_index * ENTRIES_PER_TABLE_BLOCK + slot,
                    name,
                    flags: StfsEntryFlags::from_bits_truncate(name_len >> 6),
                    blocks_for_file,
                    starting_block_num,
                    path_indicator,
                    file_size,
                    created_timestamp,
                    access_timestamp,
                    file_entry_address: entry_address as u32,
                });
            }

            block = self.block_hash_entry(block)?.next_block;
        }

        Ok(entries)
    }

    fn hash_entry_address(&self, block_num: u32) -> Result<u64, StfsError> {
        if block_num >= self.header.volume_descriptor.allocated_block_count {
            return Err(StfsError::InvalidBlock(block_num));
        }

        let mut address = self.geometry.hash_table_address_for_level(block_num, 0)
            + self.geometry.hash_entry_offset_in_table(block_num);

        match self.top_level {
            TopLevel::Zero => {
                address += ((self.header.volume_descriptor.block_separation & 2) as u64) << 0xB;
            }
            TopLevel::One => {
                let status = self.top_table_status((block_num / 0xAA) as usize);
                address += ((status & 0x40) as u64) << 6;
            }
            TopLevel::Two => {
                let level1_status = self.top_table_status((block_num / 0x70E4) as usize);
                let level1_offset = ((level1_status & 0x40) as u64) << 6;
                let pos = self.geometry.hash_table_address_for_level(block_num, 1)
                    + level1_offset
                    + self.geometry.hash_entry_offset_in_table(block_num);

                let status_byte = *self
                    .data
                    .get((pos + 0x14) as usize)
                    .ok_or(StfsError::InvalidBlock(block_num))?;
                address += ((status_byte & 0x40) as u64) << 6;
            }
        }

        Ok(address)
    }

    fn top_table_status(&self, index: usize) -> u8 {
        self.top_table.get(index).map(|entry| entry.status).unwrap_or(0)
    }

    fn block_hash_entry(&self, block_num: u32) -> Result<HashEntry, StfsError> {
        let address = self.hash_entry_address(block_num)?;
        Ok(HashEntry::at(Cursor::new(&self.data), address)?)
    }

    /// Extract a file entry's content by walking its block chain (or reading its
    /// consecutive stripe, skipping interleaved hash tables).
    pub fn extract(&self, entry: &StfsFileEntry) -> Result<Vec<u8>, StfsError> {
        if entry.file_size == 0 {
            return Ok(Vec::new());
        }

        if entry.is_consecutive() {
            self.extract_consecutive(entry)
        } else {
            self.extract_chained(entry)
        }
    }

    fn extract_consecutive(&self, entry: &StfsFileEntry) -> Result<Vec<u8>, StfsError> {
        let start_address = self
            .geometry
            .block_to_address(entry.starting_block_num)
            .map_err(StfsError::BlockMath)?;

        let mut cursor = Cursor::new(&self.data);
        cursor.seek(SeekFrom::Start(start_address))?;

        let level0_block = self.geometry.level0_backing_hash_block_number(entry.starting_block_num);
        let relative_block = (start_address - self.geometry.first_hash_table_address) / BLOCK_SIZE;
        let blocks_before_boundary =
            (level0_block + self.geometry.gender.block_step_0()) - relative_block as u32;

        let mut out = Vec::with_capacity(entry.file_size as usize);

        if entry.blocks_for_file <= blocks_before_boundary {
            out.extend(cursor.read_exact_vec(entry.file_size as usize)?);
            return Ok(out);
        }

        let prefix_len = blocks_before_boundary << 0xC;
        out.extend(cursor.read_exact_vec(prefix_len as usize)?);

        let mut remaining = entry.file_size - prefix_len;
        while remaining >= CONSECUTIVE_STRIPE_SIZE {
            let pos = cursor.stream_position()?;
            let skip = self.geometry.hash_table_skip_size(pos);
            cursor.seek(SeekFrom::Current(skip as i64))?;

            out.extend(cursor.read_exact_vec(CONSECUTIVE_STRIPE_SIZE as usize)?);
            remaining -= CONSECUTIVE_STRIPE_SIZE;
        }

        if remaining != 0 {
            let pos = cursor.stream_position()?;
            let skip = self.geometry.hash_table_skip_size(pos);
            cursor.seek(SeekFrom::Current(skip as i64))?;

            out.extend(cursor.read_exact_vec(remaining as usize)?);
        }

        Ok(out)
    }

    fn extract_chained(&self, entry: &StfsFileEntry) -> Result<Vec<u8>, StfsError> {
        let mut out = Vec::with_capacity(entry.file_size as usize);

        let full_blocks = entry.file_size / BLOCK_SIZE as u32;
        let remainder = entry.file_size - full_blocks * BLOCK_SIZE as u32;

        let mut block = entry.starting_block_num;
        for _ in 0..full_blocks {
            let address = self.geometry.block_to_address(block).map_err(StfsError::BlockMath)?;
            let mut cursor = Cursor::new(&self.data);
            cursor.seek(SeekFrom::Start(address))?;
            out.extend(cursor.read_exact_vec(BLOCK_SIZE as usize)?);

            block = self.block_hash_entry(block)?.next_block;
        }

        if remainder != 0 {
            let address = self.geometry.block_to_address(block).map_err(StfsError::BlockMath)?;
            let mut cursor = Cursor::new(&self.data);
            cursor.seek(SeekFrom::Start(address))?;
            out.extend(cursor.read_exact_vec(remainder as usize)?);
        }

        Ok(out)
    }

    /// Depth-first search for `savegame.dat` and extract its content.
    pub fn extract_savegame(&self) -> Result<Vec<u8>, StfsError> {
        let entry = self
            .listing
            .find_by_name(SAVEGAME_FILE_NAME)
            .ok_or(StfsError::NoSavegame)?;

        debug!(size = entry.file_size, "extracting savegame.dat from STFS package");
        trace!(entry_index = entry.entry_index, "savegame.dat entry located");

        self.extract(entry)
    }
}
