// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! A single STFS file-table entry and the tree built from a flat run of them.

use bitflags::bitflags;

/// The synthetic `pathIndicator`/`entryIndex` used for the file listing's root.
pub const ROOT_ENTRY_INDEX: u16 = 0xFFFF;

bitflags! {
    /// The top two bits of the on-disk `nameLen` byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StfsEntryFlags: u8 {
        /// This file's blocks are allocated consecutively on disk.
        const CONSECUTIVE = 1 << 0;
        /// This entry is a directory rather than a file.
        const DIRECTORY = 1 << 1;
    }
}

/// One row of the STFS file table.
#[derive(Debug, Clone)]
pub struct StfsFileEntry {
    /// Index of this entry within the flat file table (`blockIndex * 0x40 + slot`).
    pub entry_index: u32,

    /// Entry name, trimmed of trailing NULs (at most 40 bytes on disk).
    pub name: String,

    /// Consecutive/directory flags, the top two bits of the on-disk `nameLen` byte.
    pub flags: StfsEntryFlags,

    /// Number of blocks allocated to this file.
    pub blocks_for_file: u32,

    /// The first block of this file's data.
    pub starting_block_num: u32,

    /// `entryIndex` of this entry's parent folder, or [ROOT_ENTRY_INDEX] for the root.
    pub path_indicator: u16,

    /// Size of the file's content in bytes.
    pub file_size: u32,

    /// FAT32-packed creation timestamp.
    pub created_timestamp: u32,

    /// FAT32-packed last-access timestamp.
    pub access_timestamp: u32,

    /// Absolute byte address of this entry within the file table.
    pub file_entry_address: u32,
}

impl StfsFileEntry {
    fn root() -> Self {
        Self {
            entry_index: ROOT_ENTRY_INDEX as u32,
            name: "Root".to_string(),
            flags: StfsEntryFlags::DIRECTORY,
            blocks_for_file: 0,
            starting_block_num: 0,
            path_indicator: ROOT_ENTRY_INDEX,
            file_size: 0,
            created_timestamp: 0,
            access_timestamp: 0,
            file_entry_address: 0,
        }
    }

    /// Whether this entry names a directory rather than a file.
    pub fn is_directory(&self) -> bool {
        self.flags.contains(StfsEntryFlags::DIRECTORY)
    }

    /// Whether this file's blocks are allocated consecutively.
    pub fn is_consecutive(&self) -> bool {
        self.flags.contains(StfsEntryFlags::CONSECUTIVE)
    }
}

/// A node of the STFS file listing tree: one folder entry, its direct child files, and
/// its direct child folder subtrees.
#[derive(Debug, Clone)]
pub struct StfsFileListing {
    /// The folder entry this node represents (synthetic for the root).
    pub folder: StfsFileEntry,

    /// Files directly inside this folder.
    pub file_entries: Vec<StfsFileEntry>,

    /// Subfolders directly inside this folder.
    pub folder_entries: Vec<StfsFileListing>,
}

impl StfsFileListing {
    /// Build the tree from a flat run of entries read off disk, seeding the root with
    /// the synthetic entry index [ROOT_ENTRY_INDEX].
    pub fn from_flat_entries(entries: &[StfsFileEntry]) -> Self {
        let mut root = Self {
            folder: StfsFileEntry::root(),
            file_entries: Vec::new(),
            folder_entries: Vec::new(),
        };

        root.populate(entries);
        root
    }

    fn populate(&mut self, entries: &[StfsFileEntry]) {
        for entry in entries {
            if entry.path_indicator != self.folder.entry_index as u16 {
                continue;
            }

            if entry.is_directory() {
                if entry.entry_index as u16 == self.folder.entry_index as u16 {
                    continue;
                }

                self.folder_entries.push(Self {
                    folder: entry.clone(),
                    file_entries: Vec::new(),
                    folder_entries: Vec::new(),
                });
            } else {
                self.file_entries.push(entry.clone());
            }
        }

        for folder in &mut self.folder_entries {
            folder.populate(entries);
        }
    }

    /// Depth-first search for the first file entry with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<&StfsFileEntry> {
        if let Some(entry) = self.file_entries.iter().find(|entry| entry.name == name) {
            return Some(entry);
        }

        self.folder_entries
            .iter()
            .find_map(|folder| folder.find_by_name(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(entry_index: u32, name: &str, path_indicator: u16) -> StfsFileEntry {
        StfsFileEntry {
            entry_index,
            name: name.to_string(),
            flags: StfsEntryFlags::empty(),
            blocks_for_file: 1,
            starting_block_num: 0,
            path_indicator,
            file_size: 10,
            created_timestamp: 0,
            access_timestamp: 0,
            file_entry_address: 0,
        }
    }

    fn folder(entry_index: u32, name: &str, path_indicator: u16) -> StfsFileEntry {
        StfsFileEntry {
            flags: StfsEntryFlags::DIRECTORY,
            ..file(entry_index, name, path_indicator)
        }
    }

    #[test]
    fn builds_tree_from_flat_entries() {
        let entries = vec![
            folder(0, "data", ROOT_ENTRY_INDEX),
            file(1, "savegame.dat", ROOT_ENTRY_INDEX),
            file(2, "map_0.dat", 0),
        ];

        let tree = StfsFileListing::from_flat_entries(&entries);
        assert_eq!(tree.file_entries.len(), 1);
        assert_eq!(tree.file_entries[0].name, "savegame.dat");
        assert_eq!(tree.folder_entries.len(), 1);
        assert_eq!(tree.folder_entries[0].folder.name, "data");
        assert_eq!(tree.folder_entries[0].file_entries.len(), 1);
        assert_eq!(tree.folder_entries[0].file_entries[0].name, "map_0.dat");
    }

    #[test]
    fn find_by_name_recurses_into_folders() {
        let entries = vec![
            folder(0, "data", ROOT_ENTRY_INDEX),
            file(1, "savegame.dat", 0),
        ];

        let tree = StfsFileListing::from_flat_entries(&entries);
        assert!(tree.find_by_name("savegame.dat").is_some());
        assert!(tree.find_by_name("missing.dat").is_none());
    }
}
