// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Parsing and writing library for
//! [Minecraft: Legacy Console Edition](https://minecraft.wiki/w/Legacy_Console_Edition)
//! save archives.
//!
//! Covers the per-console outer containers (Xbox 360 STFS and flat `.dat`,
//! PlayStation 3/4/Vita, Wii U, Switch), the console-agnostic inner archive format, the
//! thumbnail PNG `tEXt` metadata carried alongside a save, and the FileInfo preview
//! envelope used by some consoles. World content itself (NBT, chunks, regions) is out
//! of scope; see [collaborators] for the trait boundaries a caller must supply.

pub mod archive;
pub mod collaborators;
pub mod console;
pub mod cursor;
pub mod dispatcher;
pub mod fat_timestamp;
pub mod file_info;
pub mod stfs;
pub mod thumbnail;

pub use archive::{ArchiveError, ArchiveFile, ArchiveListing};
pub use console::{Console, ConsoleError, DetectorInput, WriteOptions};
pub use cursor::{ReadCursorExt, WriteCursorExt};
pub use dispatcher::{DispatchError, LceArchive};
pub use fat_timestamp::{fat_to_timestamp, timestamp_to_fat, FatTimestampError};
pub use file_info::{FileInfo, FileInfoError};
pub use stfs::{StfsError, StfsPackage};
pub use thumbnail::{ThumbnailError, ThumbnailMetadata};
