// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! PNG `tEXt` chunk codec for the 4J-specific save metadata carried alongside a
//! save's thumbnail image.

use byteorder::{ReadBytesExt, WriteBytesExt, BE};
use crc::{Crc, CRC_32_ISO_HDLC};
use std::io::{self, Read, Seek, SeekFrom, Write};
use thiserror::Error;

const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const IEND: [u8; 12] = [0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82];
const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

const KEY_SEED: &str = "4J_SEED";
const KEY_HOST_OPTIONS: &str = "4J_HOSTOPTIONS";
const KEY_TEXTURE_PACK: &str = "4J_TEXTUREPACK";
const KEY_EXTRA_DATA: &str = "4J_EXTRADATA";
const KEY_LOADS: &str = "4J_#LOADS";
const KEY_EXPLORED_CHUNKS: &str = "4J_EXPLOREDCHUNKS";
const KEY_BASE_SAVE_NAME: &str = "4J_BASESAVENAME";

/// The 4J save metadata embedded in a save's thumbnail PNG via a `tEXt` chunk, plus
/// the opaque PNG bytes (header through the last chunk before `IEND`) that carry it.
#[derive(Debug, Clone, Default)]
pub struct ThumbnailMetadata {
    /// World seed.
    pub seed: i64,

    /// Number of times the world has been loaded.
    pub num_loads: i64,

    /// Host (multiplayer) options, bitpacked.
    pub host_options: i64,

    /// Selected resource pack, bitpacked.
    pub texture_pack: i64,

    /// Opaque extra-data bitfield.
    pub extra_data: i64,

    /// Number of chunks explored, if tracked (0 if absent).
    pub num_explored_chunks: i64,

    /// Human-readable name the save was converted from/to.
    pub base_save_name: String,

    /// PNG bytes from the header up to (but excluding) the final `IEND` chunk.
    pub png_prefix: Vec<u8>,
}

impl ThumbnailMetadata {
    /// Parse a PNG stream, extracting the `tEXt`-carried 4J metadata.
    ///
    /// `emit_base_save_name` mirrors the write side's per-console decision of whether
    /// `4J_BASESAVENAME` is present at all (WiiU/Switch/Vita never carry it); on read
    /// the key is simply read if present, regardless of console.
    pub fn new<T: Read + Seek>(mut stream: T) -> Result<Self, ThumbnailError> {
        let mut magic = [0; 8];
        stream.read_exact(&mut magic)?;
        if magic != PNG_MAGIC {
            return Err(ThumbnailError::NotAPng);
        }

        let mut metadata = Self::default();
        let png_start = stream.stream_position()? - 8;

        loop {
            let chunk_start = stream.stream_position()?;
            let length = stream.read_u32::<BE>()?;

            let mut chunk_type = [0; 4];
            stream.read_exact(&mut chunk_type)?;

            if &chunk_type == b"IEND" {
                metadata.png_prefix = read_span(&mut stream, png_start, chunk_start)?;
                break;
            }

            if &chunk_type != b"tEXt" {
                stream.seek(SeekFrom::Current(length as i64 + 4))?;
                continue;
            }

            metadata.png_prefix = read_span(&mut stream, png_start, chunk_start)?;

            stream.seek(SeekFrom::Start(chunk_start + 8))?;
            let chunk_end = chunk_start + 8 + length as u64;

            while stream.stream_position()? < chunk_end {
                let keyword = read_nul_terminated_run(&mut stream, chunk_end)?;
                if keyword.is_empty() {
                    break;
                }

                let text = read_nul_terminated_run(&mut stream, chunk_end)?;

                match keyword.as_str() {
                    KEY_SEED => metadata.seed = parse_decimal(&text),
                    KEY_HOST_OPTIONS => metadata.host_options = parse_hex(&text),
                    KEY_TEXTURE_PACK => metadata.texture_pack = parse_hex(&text),
                    KEY_EXTRA_DATA => metadata.extra_data = parse_hex(&text),
                    KEY_LOADS => metadata.num_loads = parse_decimal(&text),
                    KEY_EXPLORED_CHUNKS => metadata.num_explored_chunks = parse_decimal(&text),
                    KEY_BASE_SAVE_NAME => metadata.base_save_name = text,
                    _ => {}
                }
            }

            stream.seek(SeekFrom::Start(chunk_end + 4))?;
            break;
        }

        Ok(metadata)
    }

    /// Emit the PNG prefix followed by a fresh `tEXt` chunk carrying this metadata and
    /// a canonical `IEND`.
    ///
    /// `include_base_save_name` should be `false` for WiiU/Switch/Vita targets, `true`
    /// otherwise, matching the per-console emission rule.
    pub fn dump<T: Write>(
        &self,
        mut stream: T,
        include_base_save_name: bool,
    ) -> io::Result<()> {
        stream.write_all(&self.png_prefix)?;

        let mut payload = Vec::new();
        write_pair(&mut payload, KEY_SEED, &self.seed.to_string());
        write_pair(&mut payload, KEY_HOST_OPTIONS, &format_hex(self.host_options));
        write_pair(&mut payload, KEY_TEXTURE_PACK, &format_hex(self.texture_pack));
        write_pair(&mut payload, KEY_EXTRA_DATA, &format_hex(self.extra_data));
        write_pair_no_trailing_nul(&mut payload, KEY_LOADS, &self.num_loads.to_string());

        if self.num_explored_chunks != 0 {
            payload.push(0);
            write_pair_no_trailing_nul(
                &mut payload,
                KEY_EXPLORED_CHUNKS,
                &self.num_explored_chunks.to_string(),
            );
        }

        if include_base_save_name {
            payload.push(0);
            write_pair_no_trailing_nul(&mut payload, KEY_BASE_SAVE_NAME, &self.base_save_name);
        }

        let mut chunk = Vec::with_capacity(4 + payload.len());
        chunk.extend_from_slice(b"tEXt");
        chunk.extend_from_slice(&payload);

        stream.write_u32::<BE>(payload.len() as u32)?;
        stream.write_all(&chunk)?;
        stream.write_u32::<BE>(CRC32.checksum(&chunk))?;

        stream.write_all(&IEND)?;

        Ok(())
    }
}

fn read_span<T: Read + Seek>(stream: &mut T, start: u64, end: u64) -> io::Result<Vec<u8>> {
    stream.seek(SeekFrom::Start(start))?;
    let mut buf = vec![0; (end - start) as usize];
    stream.read_exact(&mut buf)?;
    Ok(buf)
}

fn write_pair(buf: &mut Vec<u8>, key: &str, value: &str) {
    buf.extend_from_slice(key.as_bytes());
    buf.push(0);
    buf.extend_from_slice(value.as_bytes());
    buf.push(0);
}

fn write_pair_no_trailing_nul(buf: &mut Vec<u8>, key: &str, value: &str) {
    buf.extend_from_slice(key.as_bytes());
    buf.push(0);
    buf.extend_from_slice(value.as_bytes());
}

fn format_hex(value: i64) -> String {
    if value == 0 {
        "0".to_string()
    } else {
        format!("{value:x}")
    }
}

fn parse_hex(text: &str) -> i64 {
    text.chars().fold(0i64, |acc, c| {
        let digit = c.to_digit(16).unwrap_or(0) as i64;
        acc * 16 + digit
    })
}

fn parse_decimal(text: &str) -> i64 {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let value = digits.chars().fold(0i64, |acc, c| {
        let digit = c.to_digit(10).unwrap_or(0) as i64;
        acc * 10 + digit
    });

    if negative {
        -value
    } else {
        value
    }
}

fn read_nul_terminated_run<T: Read>(stream: &mut T, chunk_end: u64) -> io::Result<String>
where
    T: Seek,
{
    let mut bytes = Vec::new();
    loop {
        if stream.stream_position()? >= chunk_end {
            break;
        }

        let byte = stream.read_u8()?;
        if byte == 0 {
            if !bytes.is_empty() {
                break;
            }
            continue;
        }

        bytes.push(byte);
    }

    String::from_utf8(bytes).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

/// Errors raised while reading or writing a thumbnail's `tEXt` metadata.
#[derive(Error, Debug)]
pub enum ThumbnailError {
    /// IO error while walking the PNG chunk stream.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The stream did not start with the PNG magic bytes.
    #[error("not a PNG file")]
    NotAPng,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_png_prefix() -> Vec<u8> {
        let mut bytes = PNG_MAGIC.to_vec();
        // A single minimal IHDR chunk so the reader has something to skip over.
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&[0; 13]);
        bytes.extend_from_slice(&0u32.to_be_bytes()); // CRC placeholder
        bytes
    }

    #[test]
    fn dump_then_read_roundtrips_fields() {
        let metadata = ThumbnailMetadata {
            seed: -1234567890,
            num_loads: 5,
            host_options: 0x1A2B,
            texture_pack: 0,
            extra_data: 0,
            num_explored_chunks: 0,
            base_save_name: "converted by lce-rs".to_string(),
            png_prefix: sample_png_prefix(),
        };

        let mut buf = Vec::new();
        metadata.dump(&mut buf, true).unwrap();

        let parsed = ThumbnailMetadata::new(Cursor::new(buf)).unwrap();
        assert_eq!(parsed.seed, -1234567890);
        assert_eq!(parsed.num_loads, 5);
        assert_eq!(parsed.host_options, 0x1A2B);
        assert_eq!(parsed.base_save_name, "converted by lce-rs");
        assert_eq!(parsed.num_explored_chunks, 0);
    }

    #[test]
    fn exact_text_chunk_emission_order() {
        let metadata = ThumbnailMetadata {
            seed: -1234567890,
            num_loads: 5,
            host_options: 0x1A2B,
            texture_pack: 0,
            extra_data: 0,
            num_explored_chunks: 0,
            base_save_name: String::new(),
            png_prefix: Vec::new(),
        };

        let mut buf = Vec::new();
        metadata.dump(&mut buf, false).unwrap();

        let expected_payload =
            b"4J_SEED\0-1234567890\04J_HOSTOPTIONS\01a2b\04J_TEXTUREPACK\00\04J_EXTRADATA\00\04J_#LOADS\05";

        let length = u32::from_be_bytes(buf[0..4].try_into().unwrap());
        assert_eq!(length as usize, expected_payload.len());
        assert_eq!(&buf[8..8 + expected_payload.len()], expected_payload);
    }

    #[test]
    fn explored_chunks_only_emitted_when_nonzero() {
        let metadata = ThumbnailMetadata {
            num_explored_chunks: 42,
            ..Default::default()
        };

        let mut buf = Vec::new();
        metadata.dump(&mut buf, false).unwrap();

        let payload_len = u32::from_be_bytes(buf[0..4].try_into().unwrap()) as usize;
        let payload = &buf[8..8 + payload_len];
        assert!(payload
            .windows(KEY_EXPLORED_CHUNKS.len())
            .any(|w| w == KEY_EXPLORED_CHUNKS.as_bytes()));
    }

    #[test]
    fn rejects_non_png_stream() {
        let err = ThumbnailMetadata::new(Cursor::new(vec![0; 16])).unwrap_err();
        assert!(matches!(err, ThumbnailError::NotAPng));
    }
}
