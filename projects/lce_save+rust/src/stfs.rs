// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The Xbox 360 STFS container: a hash-tree block filesystem wrapping the
//! console-agnostic [crate::archive] format.

pub mod block_math;
pub mod file_entry;
pub mod hash_table;
pub mod header;
pub mod package;
pub mod volume_descriptor;

use std::io;
use thiserror::Error;

pub use package::StfsPackage;

/// Errors raised while parsing or walking an STFS package.
#[derive(Error, Debug)]
pub enum StfsError {
    /// IO error while reading the package.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The header's content type field does not mark this as a savegame package.
    #[error("not a savegame STFS package")]
    NotASavegame,

    /// The header's file system field does not mark this as an STFS volume.
    #[error("not an STFS file system")]
    NotStfs,

    /// Hash-tree block arithmetic failed.
    #[error("STFS block arithmetic error: {0}")]
    BlockMath(#[from] block_math::BlockMathError),

    /// A referenced block number falls outside the package's allocated range.
    #[error("STFS block {0:#X} is out of the package's allocated range")]
    InvalidBlock(u32),

    /// No `savegame.dat` entry was found anywhere in the file listing.
    #[error("no savegame.dat entry found in STFS package")]
    NoSavegame,
}
