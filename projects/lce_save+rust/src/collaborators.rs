// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Narrow interfaces for functionality this crate consumes but does not implement:
//! NBT, chunk-version transforms and region-level chunk/RLE codecs. A caller wires a
//! concrete implementation of these traits in; this crate only ever moves opaque
//! bytes across them.

use std::error::Error;

/// Decodes and re-encodes the NBT tag tree embedded in a chunk or player file.
///
/// This crate never interprets NBT content; it only locates the byte ranges that
/// contain it and hands them across this boundary.
pub trait NbtCodec {
    /// The owned, in-memory representation of a decoded NBT document.
    type Document;

    /// Error type surfaced by a failed decode or encode.
    type Error: Error + Send + Sync + 'static;

    /// Decode a complete NBT document from `bytes`.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Document, Self::Error>;

    /// Encode a document back into its binary form.
    fn encode(&self, document: &Self::Document) -> Result<Vec<u8>, Self::Error>;
}

/// Transforms chunk payload bytes between Minecraft chunk-format versions.
///
/// Chunk-version semantics (NBT layout migrations, block-ID remapping across game
/// versions) live entirely on the caller's side of this boundary.
pub trait RegionChunkCodec {
    /// Error type surfaced by a failed transform.
    type Error: Error + Send + Sync + 'static;

    /// Re-encode a single chunk's payload for a different target version, leaving its
    /// semantic content equivalent.
    fn transform(&self, chunk_bytes: &[u8], target_version: u8) -> Result<Vec<u8>, Self::Error>;
}

/// Compresses and decompresses the PlayStation Vita's whole-archive RLE container
/// payload.
///
/// This is distinct from any per-chunk compression inside a region file; it operates
/// on the entire archive blob that the Vita outer container wraps.
pub trait RegionRleCodec {
    /// Error type surfaced by a failed (de)compression.
    type Error: Error + Send + Sync + 'static;

    /// Compress `bytes` with the Vita RLE scheme.
    fn compress(&self, bytes: &[u8]) -> Result<Vec<u8>, Self::Error>;

    /// Decompress an RLE-compressed blob back to its original bytes.
    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>, Self::Error>;
}
