// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Block-number and hash-address arithmetic for the STFS three-level hash tree.
//!
//! Pure integer functions; no I/O. Grounded directly on the original package's block
//! arithmetic, which is the authoritative source for operator grouping where the
//! distilled description is ambiguous.

const BLOCKS_PER_HASH_TABLE: u32 = 0xAA;
const BLOCKS_PER_LEVEL1_TABLE: u32 = 0x70E4;
const MAX_BLOCKS_LEVEL2: u32 = 0x4AF768;

/// Which of the two block-spacing constant sets a package uses, derived from
/// `blockSeparation & 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    /// `blockSeparation & 1 == 0`.
    Female,
    /// `blockSeparation & 1 == 1`.
    Male,
}

impl Gender {
    /// Derive the gender from the volume descriptor's `blockSeparation` byte.
    pub fn from_block_separation(block_separation: u8) -> Self {
        if (!block_separation) & 1 == 1 {
            Self::Male
        } else {
            Self::Female
        }
    }

    fn shift(self) -> u32 {
        match self {
            Self::Female => 0,
            Self::Male => 1,
        }
    }

    /// Spacing, in blocks, between level-0 hash tables.
    pub fn block_step_0(self) -> u32 {
        match self {
            Self::Female => 0xAB,
            Self::Male => 0xAC,
        }
    }

    /// Spacing, in blocks, between level-1 hash tables.
    pub fn block_step_1(self) -> u32 {
        match self {
            Self::Female => 0x718F,
            Self::Male => 0x723A,
        }
    }
}

/// The topmost populated hash table level for a package, fixed by how many blocks it
/// has allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopLevel {
    /// Up to [BLOCKS_PER_HASH_TABLE] blocks: a single level-0 table suffices.
    Zero,
    /// Up to [BLOCKS_PER_LEVEL1_TABLE] blocks.
    One,
    /// Up to [MAX_BLOCKS_LEVEL2] blocks.
    Two,
}

impl TopLevel {
    /// Choose the top level for a package with `allocated_block_count` blocks.
    pub fn for_allocated_blocks(allocated_block_count: u32) -> Result<Self, BlockMathError> {
        if allocated_block_count <= BLOCKS_PER_HASH_TABLE {
            Ok(Self::Zero)
        } else if allocated_block_count <= BLOCKS_PER_LEVEL1_TABLE {
            Ok(Self::One)
        } else if allocated_block_count <= MAX_BLOCKS_LEVEL2 {
            Ok(Self::Two)
        } else {
            Err(BlockMathError::TooManyBlocks(allocated_block_count))
        }
    }

    /// Number of entries that may appear in the top-level hash table.
    pub fn entry_count(self, allocated_block_count: u32) -> u32 {
        let divisor = match self {
            Self::Zero => 1,
            Self::One => BLOCKS_PER_HASH_TABLE,
            Self::Two => BLOCKS_PER_LEVEL1_TABLE,
        };

        allocated_block_count.div_ceil(divisor).min(BLOCKS_PER_HASH_TABLE)
    }
}

/// The package-wide geometry parameters block arithmetic is computed relative to.
#[derive(Debug, Clone, Copy)]
pub struct Geometry {
    /// Block spacing constants.
    pub gender: Gender,

    /// Byte address of the first (level-0) hash table, `(headerSize + 0xFFF) &
    /// !0xFFF`.
    pub first_hash_table_address: u64,
}

impl Geometry {
    /// Compute the backing data-block number for logical block `block_num`, i.e. the
    /// block number including interleaved hash blocks.
    pub fn backing_data_block_number(self, block_num: u32) -> u32 {
        let g = self.gender.shift();
        let base = (((block_num + BLOCKS_PER_HASH_TABLE) / BLOCKS_PER_HASH_TABLE) << g) + block_num;

        if block_num < BLOCKS_PER_HASH_TABLE {
            base
        } else if block_num < BLOCKS_PER_LEVEL1_TABLE {
            base + (((block_num + BLOCKS_PER_LEVEL1_TABLE) / BLOCKS_PER_LEVEL1_TABLE) << g)
        } else {
            (1 << g) + base + (((block_num + BLOCKS_PER_LEVEL1_TABLE) / BLOCKS_PER_LEVEL1_TABLE) << g)
        }
    }

    /// Byte address of the data block for logical block `block_num`.
    pub fn block_to_address(self, block_num: u32) -> Result<u64, BlockMathError> {
        if block_num >= 0xFFFFFF {
            return Err(BlockMathError::InvalidBlock(block_num));
        }

        Ok((self.backing_data_block_number(block_num) as u64) * 0x1000 + self.first_hash_table_address)
    }

    /// The level-0 hash block number that hashes data block `block_num`.
    pub fn level0_backing_hash_block_number(self, block_num: u32) -> u32 {
        if block_num < BLOCKS_PER_HASH_TABLE {
            return 0;
        }

        let g = self.gender.shift();
        let n = (block_num / BLOCKS_PER_HASH_TABLE) * self.gender.block_step_0()
            + (((block_num / BLOCKS_PER_LEVEL1_TABLE) + 1) << g);

        if block_num / BLOCKS_PER_LEVEL1_TABLE == 0 {
            n
        } else {
            n + (1 << g)
        }
    }

    fn level1_backing_hash_block_number(self, block_num: u32) -> u32 {
        if block_num < BLOCKS_PER_LEVEL1_TABLE {
            self.gender.block_step_0()
        } else {
            let g = self.gender.shift();
            (1 << g) + (block_num / BLOCKS_PER_LEVEL1_TABLE) * self.gender.block_step_1()
        }
    }

    fn level2_backing_hash_block_number(self) -> u32 {
        self.gender.block_step_1()
    }

    /// Byte address of the hash entry for data block `block_num` at the given hash
    /// table `level` (0, 1 or 2), not including the level-dependent status-bit
    /// adjustment (callers must add that after inspecting the parent table, see
    /// [crate::stfs::package::StfsPackage::hash_entry_address]).
    pub fn hash_table_address_for_level(self, block_num: u32, level: u8) -> u64 {
        let backing_hash_block = match level {
            0 => self.level0_backing_hash_block_number(block_num),
            1 => self.level1_backing_hash_block_number(block_num),
            _ => self.level2_backing_hash_block_number(),
        };

        (backing_hash_block as u64) * 0x1000 + self.first_hash_table_address
    }

    /// Byte offset of a block's hash entry within its level-0 hash table.
    pub fn hash_entry_offset_in_table(self, block_num: u32) -> u64 {
        (block_num % BLOCKS_PER_HASH_TABLE) as u64 * 0x18
    }

    /// Number of bytes to skip after crossing into a hash table while reading
    /// consecutively-allocated blocks, given the absolute address currently reached.
    pub fn hash_table_skip_size(self, address: u64) -> u64 {
        let g = self.gender.shift();
        let mut relative_block = (address - self.first_hash_table_address) / 0x1000;

        if relative_block == 0 {
            return 0x1000 << g;
        }

        if relative_block as u32 == self.gender.block_step_1() {
            return 0x3000 << g;
        } else if relative_block as u32 > self.gender.block_step_1() {
            relative_block -= (self.gender.block_step_1() + (1 << g)) as u64;
        }

        if relative_block as u32 == self.gender.block_step_0()
            || relative_block as u32 % self.gender.block_step_1() == 0
        {
            return 0x2000 << g;
        }

        0x1000 << g
    }
}

/// Errors raised by the block arithmetic layer.
#[derive(thiserror::Error, Debug)]
pub enum BlockMathError {
    /// A block number is out of the representable 24-bit range.
    #[error("invalid STFS block number: {0:#X}")]
    InvalidBlock(u32),

    /// The package allocates more blocks than a three-level hash tree can address.
    #[error("STFS package allocates too many blocks: {0}")]
    TooManyBlocks(u32),
}
