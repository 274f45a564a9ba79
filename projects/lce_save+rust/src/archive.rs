// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The console-agnostic inner archive format: a directory of named blobs (level data,
//! regions, players, maps...) that every outer per-console container ultimately wraps.

use crate::cursor::{ReadCursorExt, WriteCursorExt};
use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use std::io::{self, Read, Seek, SeekFrom, Write};
use thiserror::Error;
use tracing::{debug, warn};

const DIRECTORY_ENTRY_SIZE: u64 = 144;
const NAME_FIELD_BYTES: usize = 128;

/// A single file inside the archive.
#[derive(Debug, Clone)]
pub struct ArchiveFile {
    /// The file's path as stored in the archive (forward-slash separated).
    pub name: String,

    /// Last-modified timestamp, in whatever epoch the originating console used.
    pub timestamp: u64,

    /// File content.
    pub data: Vec<u8>,
}

impl ArchiveFile {
    fn size(&self) -> u32 {
        self.data.len() as u32
    }
}

/// Which typed bucket an [ArchiveFile] was classified into, in addition to always
/// being retained in [ArchiveListing::all_files].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFileKind {
    /// Overworld region (`r*.mcr`).
    OverworldRegion,
    /// Nether region (`DIM-1*.mcr`).
    NetherRegion,
    /// End region (`DIM1*.mcr`).
    EndRegion,
    /// `level.dat`.
    Level,
    /// `data/map_*`.
    Map,
    /// `data/villages.dat`.
    Village,
    /// Other `data/*` structure files.
    Structure,
    /// `*.grf` files.
    Grf,
    /// `players/*`, or any top-level file with no `/` in its name.
    Player,
    /// Recognized as a region file but not matching any known dimension prefix, or not
    /// matching any other known bucket. Kept only in `all_files`.
    Unclassified,
}

/// The inner archive: a directory plus the file content it indexes.
#[derive(Debug, Clone, Default)]
pub struct ArchiveListing {
    /// Oldest game version this save has been loaded with.
    pub oldest_version: u16,

    /// Current game version.
    pub current_version: u16,

    /// Every file in the archive, in on-disk directory order.
    pub all_files: Vec<ArchiveFile>,
}

impl ArchiveListing {
    /// Parse an archive from a stream positioned at its start.
    pub fn new<T: Read + Seek>(mut stream: T) -> Result<Self, ArchiveError> {
        let index_offset = stream.read_u32::<LE>()? as u64;
        let file_count = stream.read_u32::<LE>()?;
        let oldest_version = stream.read_u16::<LE>()?;
        let current_version = stream.read_u16::<LE>()?;

        let mut all_files = Vec::with_capacity(file_count as usize);

        for file_index in 0..file_count {
            stream.seek(SeekFrom::Start(
                index_offset + file_index as u64 * DIRECTORY_ENTRY_SIZE,
            ))?;

            let name = stream.read_wstring_fixed_le(NAME_FIELD_BYTES)?;
            let size = stream.read_u32::<LE>()?;
            let offset = stream.read_u32::<LE>()?;
            let timestamp = stream.read_u64::<LE>()?;

            if size == 0 {
                debug!(name = %name, "skipping empty archive file entry");
                continue;
            }

            stream.seek(SeekFrom::Start(offset as u64))?;
            let data = stream.read_exact_vec(size as usize)?;

            all_files.push(ArchiveFile {
                name,
                timestamp,
                data,
            });
        }

        Ok(Self {
            oldest_version,
            current_version,
            all_files,
        })
    }

    /// Write the archive out as a single contiguous blob: header, payloads in
    /// [Self::all_files] order, then the directory.
    pub fn dump<T: Write + Seek>(&self, mut stream: T) -> Result<(), ArchiveError> {
        for file in &self.all_files {
            if file.name.encode_utf16().count() > NAME_FIELD_BYTES / 2 {
                return Err(ArchiveError::NameTooLong(file.name.clone()));
            }
        }

        let file_data_size: u64 = self.all_files.iter().map(|f| f.size() as u64).sum();
        let file_info_offset = 12 + file_data_size;

        stream.write_u32::<LE>(file_info_offset as u32)?;
        stream.write_u32::<LE>(self.all_files.len() as u32)?;
        stream.write_u16::<LE>(self.oldest_version)?;
        stream.write_u16::<LE>(self.current_version)?;

        let mut offsets = Vec::with_capacity(self.all_files.len());
        let mut cursor = 12u64;
        for file in &self.all_files {
            offsets.push(cursor);
            stream.write_all(&file.data)?;
            cursor += file.size() as u64;
        }

        for (file, offset) in self.all_files.iter().zip(offsets) {
            stream.write_wstring_fixed_le(&file.name, NAME_FIELD_BYTES)?;
            stream.write_u32::<LE>(file.size())?;
            stream.write_u32::<LE>(offset as u32)?;
            stream.write_u64::<LE>(file.timestamp)?;
        }

        Ok(())
    }

    /// Classify every file by name, per the fixed precedence order: region files are
    /// checked before any other bucket.
    pub fn classify(&self) -> Vec<(ArchiveFileKind, &ArchiveFile)> {
        self.all_files
            .iter()
            .map(|file| (classify_one(&file.name), file))
            .collect()
    }

    /// Files classified as overworld regions, in directory order.
    pub fn overworld_regions(&self) -> impl Iterator<Item = &ArchiveFile> {
        self.classify_filtered(ArchiveFileKind::OverworldRegion)
    }

    /// Files classified as nether regions, in directory order.
    pub fn nether_regions(&self) -> impl Iterator<Item = &ArchiveFile> {
        self.classify_filtered(ArchiveFileKind::NetherRegion)
    }

    /// Files classified as end regions, in directory order.
    pub fn end_regions(&self) -> impl Iterator<Item = &ArchiveFile> {
        self.classify_filtered(ArchiveFileKind::EndRegion)
    }

    /// The single `level.dat` entry, if present.
    pub fn level(&self) -> Option<&ArchiveFile> {
        self.all_files
            .iter()
            .find(|f| classify_one(&f.name) == ArchiveFileKind::Level)
    }

    fn classify_filtered(&self, kind: ArchiveFileKind) -> impl Iterator<Item = &ArchiveFile> {
        self.all_files
            .iter()
            .filter(move |f| classify_one(&f.name) == kind)
    }
}

fn classify_one(name: &str) -> ArchiveFileKind {
    if name.ends_with(".mcr") {
        return if name.starts_with("DIM-1") {
            ArchiveFileKind::NetherRegion
        } else if name.starts_with("DIM1") {
            ArchiveFileKind::EndRegion
        } else if name.starts_with('r') {
            ArchiveFileKind::OverworldRegion
        } else {
            warn!(name, "region file not from any known dimension");
            ArchiveFileKind::Unclassified
        };
    }

    if name == "level.dat" {
        return ArchiveFileKind::Level;
    }

    if name.starts_with("data/map_") {
        return ArchiveFileKind::Map;
    }

    if name == "data/villages.dat" {
        return ArchiveFileKind::Village;
    }

    if name.starts_with("data/") {
        return ArchiveFileKind::Structure;
    }

    if name.ends_with(".grf") {
        return ArchiveFileKind::Grf;
    }

    if name.starts_with("players/") || !name.contains('/') {
        return ArchiveFileKind::Player;
    }

    warn!(name, "unknown file kind");
    ArchiveFileKind::Unclassified
}

/// Errors raised while reading or writing an [ArchiveListing].
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// IO error while reading or writing the archive blob.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A file name is too long to fit in the fixed 128-byte directory field.
    #[error("file name is too long to encode: {0}")]
    NameTooLong(String),
}
