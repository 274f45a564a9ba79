// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

use super::*;
use byteorder::ReadBytesExt;
use std::io::Cursor;

#[test]
fn seek_relative_forward() {
    let buffer = Cursor::new(vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);

    let mut view = View::new(buffer, 5).unwrap();
    let new_position = view.seek(SeekFrom::Current(2)).unwrap();

    assert_eq!(new_position, 2);
    assert_eq!(view.read_u8().unwrap(), 3);
}

#[test]
fn seek_relative_negative_offset_before_view() {
    let buffer = Cursor::new(vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);

    let mut view = View::new(buffer, 5).unwrap();
    assert!(view.seek(SeekFrom::Current(-1)).is_err());
}
