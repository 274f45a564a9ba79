// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! FAT32-style packed timestamps, as used by STFS file entries.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// A timestamp packed as `second/2 | minute<<5 | hour<<11 | day<<16 | month<<21 |
/// (year-1980)<<25`, the encoding MS-DOS (and STFS) use for file entry times.
pub fn fat_to_timestamp(packed: u32) -> Result<NaiveDateTime, FatTimestampError> {
    let second = (packed & 0x1F) * 2;
    let minute = (packed >> 5) & 0x3F;
    let hour = (packed >> 11) & 0x1F;
    let day = (packed >> 16) & 0x1F;
    let month = (packed >> 21) & 0x0F;
    let year = ((packed >> 25) & 0x7F) + 1980;

    let date = NaiveDate::from_ymd_opt(year as i32, month, day)
        .ok_or(FatTimestampError::InvalidDate(packed))?;

    date.and_hms_opt(hour, minute, second)
        .ok_or(FatTimestampError::InvalidTime(packed))
}

/// Pack a [NaiveDateTime] into the FAT32 timestamp encoding.
///
/// Years outside `1980..=2107` cannot be represented and are rejected.
pub fn timestamp_to_fat(timestamp: &NaiveDateTime) -> Result<u32, FatTimestampError> {
    use chrono::{Datelike, Timelike};

    let year = timestamp.year();
    if !(1980..=2107).contains(&year) {
        return Err(FatTimestampError::YearOutOfRange(year));
    }

    let packed = (timestamp.second() / 2)
        | (timestamp.minute() << 5)
        | (timestamp.hour() << 11)
        | (timestamp.day() << 16)
        | (timestamp.month() << 21)
        | ((year as u32 - 1980) << 25);

    Ok(packed)
}

/// Errors raised when packing or unpacking a FAT32 timestamp.
#[derive(Error, Debug)]
pub enum FatTimestampError {
    /// The packed value encodes an impossible calendar date (month 0, day 32, ...).
    #[error("packed FAT timestamp {0:#010X} encodes an invalid date")]
    InvalidDate(u32),

    /// The packed value encodes an impossible time of day.
    #[error("packed FAT timestamp {0:#010X} encodes an invalid time")]
    InvalidTime(u32),

    /// The timestamp's year cannot be represented in the 7-bit FAT year field.
    #[error("year {0} is outside the representable FAT range (1980-2107)")]
    YearOutOfRange(i32),
}
