// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Top-level entry point: detects a save archive's console container, unwraps it down
//! to the inner [ArchiveListing], and wraps a listing back up for a target console on
//! the way out.

use crate::archive::{ArchiveError, ArchiveListing};
use crate::collaborators::RegionRleCodec;
use crate::console::{detect_console, Console, ConsoleError, WriteOptions};
use crate::file_info::{FileInfo, FileInfoError};
use crate::stfs::{StfsError, StfsPackage};
use byteorder::{ReadBytesExt, WriteBytesExt, BE, LE};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{self, Cursor, Read, Write};
use thiserror::Error;

const VITA_ADJUSTED_SIZE_BIAS: u32 = 0x0900;
const XBOX360_DAT_RESERVED: u32 = 0x0000_0003;
const XBOX360_DAT_FILE_COUNT: u32 = 1;

/// Facade tying the console detector, per-console envelope codecs, and the inner
/// archive codec together. Parameterized over the caller-supplied Vita RLE codec,
/// which this crate does not implement (see [crate::collaborators]).
pub struct LceArchive<R: RegionRleCodec> {
    vita_codec: R,
}

impl<R: RegionRleCodec> LceArchive<R> {
    /// Build a dispatcher that uses `vita_codec` whenever a Vita container needs
    /// (de)compressing.
    pub fn new(vita_codec: R) -> Self {
        Self { vita_codec }
    }

    /// Detect the console container, unwrap it, and parse the inner archive listing.
    ///
    /// `declared_dest_size` disambiguates WiiU from Switch/PS4 (see
    /// [crate::console::detect_console]).
    pub fn read(
        &self,
        bytes: Vec<u8>,
        parent_dir_name: &str,
        declared_dest_size: u64,
    ) -> Result<(Console, ArchiveListing, Option<FileInfo>), DispatchError> {
        let console = detect_console(&bytes, parent_dir_name, declared_dest_size)?;
        let archive_bytes = self.unwrap_container(console, &bytes)?;
        let listing = ArchiveListing::new(Cursor::new(archive_bytes))?;

        Ok((console, listing, None))
    }

    /// Emit an archive listing wrapped for `target`. The `FileInfo` companion file, if
    /// any, is the caller's responsibility to persist separately (see §4.H).
    pub fn write(
        &self,
        listing: &ArchiveListing,
        target: Console,
        options: &WriteOptions,
    ) -> Result<Vec<u8>, DispatchError> {
        let _ = &options.parent_dir_name;

        let mut archive_bytes = Vec::new();
        listing.dump(Cursor::new(&mut archive_bytes))?;

        self.wrap_container(target, &archive_bytes)
    }

    fn unwrap_container(&self, console: Console, bytes: &[u8]) -> Result<Vec<u8>, DispatchError> {
        match console {
            Console::WiiU | Console::Switch | Console::Ps4 => {
                Ok(read_size_prefixed(bytes, true)?)
            }
            Console::Ps3 => Ok(read_size_prefixed(bytes, true)?),
            Console::Rpcs3 => Ok(read_size_prefixed(bytes, false)?),
            Console::Vita => self.read_vita(bytes),
            Console::Xbox360Dat => {
                let mut cursor = Cursor::new(bytes);
                cursor.read_u32::<BE>()?;
                cursor.read_u32::<BE>()?;
                let mut archive_bytes = Vec::new();
                cursor.read_to_end(&mut archive_bytes)?;
                Ok(archive_bytes)
            }
            Console::Xbox360Bin => {
                let package = StfsPackage::new(bytes.to_vec())?;
                Ok(package.extract_savegame()?)
            }
        }
    }

    fn wrap_container(&self, console: Console, archive_bytes: &[u8]) -> Result<Vec<u8>, DispatchError> {
        match console {
            Console::WiiU | Console::Switch | Console::Ps4 => {
                Ok(write_size_prefixed(archive_bytes, true)?)
            }
            Console::Ps3 => Ok(write_size_prefixed(archive_bytes, true)?),
            Console::Rpcs3 => Ok(write_size_prefixed(archive_bytes, false)?),
            Console::Vita => self.write_vita(archive_bytes),
            Console::Xbox360Dat => {
                let mut out = Vec::with_capacity(8 + archive_bytes.len());
                out.write_u32::<BE>(XBOX360_DAT_RESERVED)?;
                out.write_u32::<BE>(XBOX360_DAT_FILE_COUNT)?;
                out.extend_from_slice(archive_bytes);
                Ok(out)
            }
            Console::Xbox360Bin => Err(DispatchError::Console(ConsoleError::Unsupported(
                "writing a full STFS BIN package",
            ))),
        }
    }

    fn read_vita(&self, bytes: &[u8]) -> Result<Vec<u8>, DispatchError> {
        if bytes.len() < 8 {
            return Err(DispatchError::Console(ConsoleError::InvalidArgument(
                "Vita envelope shorter than its 8-byte header".to_string(),
            )));
        }

        let compressed = &bytes[8..];
        self.vita_codec
            .decompress(compressed)
            .map_err(|err| DispatchError::Console(ConsoleError::DecompressFailed(err.to_string())))
    }

    fn write_vita(&self, archive_bytes: &[u8]) -> Result<Vec<u8>, DispatchError> {
        let compressed = self
            .vita_codec
            .compress(archive_bytes)
            .map_err(|err| DispatchError::Console(ConsoleError::DecompressFailed(err.to_string())))?;

        if compressed.len() < 4 {
            return Err(DispatchError::Console(ConsoleError::InvalidArgument(
                "Vita RLE codec produced fewer than 4 bytes".to_string(),
            )));
        }

        let adjusted_size = LE::read_u32(&compressed[0..4]).wrapping_add(VITA_ADJUSTED_SIZE_BIAS);

        let mut out = Vec::with_capacity(8 + compressed.len());
        out.write_u32::<LE>(0)?;
        out.write_u32::<LE>(adjusted_size)?;
        out.extend_from_slice(&compressed);
        Ok(out)
    }
}

fn read_size_prefixed(bytes: &[u8], compressed: bool) -> io::Result<Vec<u8>> {
    let mut cursor = Cursor::new(bytes);
    let original_size = cursor.read_u64::<BE>()? as usize;
    let payload = &bytes[8..];

    if compressed {
        let mut decoder = ZlibDecoder::new(payload);
        let mut out = Vec::with_capacity(original_size);
        decoder.read_to_end(&mut out)?;
        Ok(out)
    } else {
        Ok(payload[..original_size.min(payload.len())].to_vec())
    }
}

fn write_size_prefixed(archive_bytes: &[u8], compressed: bool) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    out.write_u64::<BE>(archive_bytes.len() as u64)?;

    if compressed {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(archive_bytes)?;
        out.extend(encoder.finish()?);
    } else {
        out.extend_from_slice(archive_bytes);
    }

    Ok(out)
}

/// Errors raised by the top-level read/write dispatch, aggregating every component's
/// error type.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// IO error while reading or writing a container envelope.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The console container could not be classified or configured.
    #[error(transparent)]
    Console(#[from] ConsoleError),

    /// The inner archive listing failed to parse or encode.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// The STFS package (Xbox 360 BIN) failed to parse.
    #[error(transparent)]
    Stfs(#[from] StfsError),

    /// The FileInfo companion envelope failed to parse or encode.
    #[error(transparent)]
    FileInfo(#[from] FileInfoError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveFile;
    use std::convert::Infallible;

    struct IdentityRle;

    impl RegionRleCodec for IdentityRle {
        type Error = Infallible;

        fn compress(&self, bytes: &[u8]) -> Result<Vec<u8>, Self::Error> {
            Ok(bytes.to_vec())
        }

        fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>, Self::Error> {
            Ok(bytes.to_vec())
        }
    }

    fn sample_listing() -> ArchiveListing {
        ArchiveListing {
            oldest_version: 1,
            current_version: 1,
            all_files: vec![ArchiveFile {
                name: "level.dat".to_string(),
                timestamp: 0,
                data: vec![1, 2, 3, 4],
            }],
        }
    }

    #[test]
    fn wiiu_roundtrip_via_size_prefixed_zlib() {
        let dispatcher = LceArchive::new(IdentityRle);
        let listing = sample_listing();

        let wrapped = dispatcher
            .write(&listing, Console::WiiU, &WriteOptions::default())
            .unwrap();

        let (console, parsed, _) = dispatcher.read(wrapped, "whatever", 0).unwrap();
        assert_eq!(console, Console::WiiU);
        assert_eq!(parsed.all_files.len(), 1);
        assert_eq!(parsed.all_files[0].data, vec![1, 2, 3, 4]);
    }

    #[test]
    fn rpcs3_roundtrip_uncompressed() {
        let dispatcher = LceArchive::new(IdentityRle);
        let listing = sample_listing();

        let wrapped = dispatcher
            .write(&listing, Console::Rpcs3, &WriteOptions::default())
            .unwrap();

        let archive_bytes = read_size_prefixed(&wrapped, false).unwrap();
        let parsed = ArchiveListing::new(Cursor::new(archive_bytes)).unwrap();
        assert_eq!(parsed.all_files[0].data, vec![1, 2, 3, 4]);
    }

    #[test]
    fn xbox360_bin_write_is_unsupported() {
        let dispatcher = LceArchive::new(IdentityRle);
        let listing = sample_listing();

        let err = dispatcher
            .write(&listing, Console::Xbox360Bin, &WriteOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Console(ConsoleError::Unsupported(_))
        ));
    }

    #[test]
    fn vita_roundtrip_through_injected_codec() {
        let dispatcher = LceArchive::new(IdentityRle);
        let listing = sample_listing();

        let wrapped = dispatcher
            .write(&listing, Console::Vita, &WriteOptions::default())
            .unwrap();

        let archive_bytes = dispatcher.read_vita(&wrapped).unwrap();
        let parsed = ArchiveListing::new(Cursor::new(archive_bytes)).unwrap();
        assert_eq!(parsed.all_files[0].data, vec![1, 2, 3, 4]);
    }
}
