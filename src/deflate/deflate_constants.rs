/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

/// Size of the sliding window, a match may never reach further back than this.
pub const MAX_MATCH_OFFSET: i32 = 1 << 15;

/// The maximum length of a single match token.
pub const MAX_MATCH_LENGTH: i32 = 258;

/// The minimum length of a match, match lengths are stored relative to this.
pub const BASE_MATCH_LENGTH: i32 = 3;

/// The minimum distance of a match, distances are stored relative to this.
pub const BASE_MATCH_OFFSET: i32 = 1;

/// Largest block the surrounding block writer hands to an encoder in one call.
pub const MAX_STORE_BLOCK_SIZE: i32 = 65535;

pub const LEN_CODE_COUNT: usize = 29;
pub const DIST_CODE_COUNT: usize = 30;

/// first length (minus BASE_MATCH_LENGTH) covered by each length code
#[rustfmt::skip]
pub const LENGTH_BASE_TABLE: [u8; LEN_CODE_COUNT] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 10, 12, 14, 16, 20, 24, 28,
    32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 255,
];

/// first distance (minus BASE_MATCH_OFFSET) covered by each distance code
#[rustfmt::skip]
pub const DIST_BASE_TABLE: [u16; DIST_CODE_COUNT] = [
    0, 1, 2, 3, 4, 6, 8, 12, 16, 24, 32, 48, 64, 96, 128, 192,
    256, 384, 512, 768, 1024, 1536, 2048, 3072, 4096, 6144, 8192, 12288, 16384, 24576,
];

/// returns the length code (0 based, so 257 has to be added for the symbol) for a
/// match length that already has BASE_MATCH_LENGTH subtracted
pub fn quantize_length(xlength: u32) -> usize {
    debug_assert!(xlength <= (MAX_MATCH_LENGTH - BASE_MATCH_LENGTH) as u32);
    LENGTH_BASE_TABLE.partition_point(|&b| u32::from(b) <= xlength) - 1
}

/// returns the distance code for a distance that already has BASE_MATCH_OFFSET subtracted
pub fn quantize_distance(xoffset: u32) -> usize {
    debug_assert!(xoffset < MAX_MATCH_OFFSET as u32);
    DIST_BASE_TABLE.partition_point(|&b| u32::from(b) <= xoffset) - 1
}

#[test]
fn test_quantize_length() {
    assert_eq!(quantize_length(0), 0);
    assert_eq!(quantize_length(7), 7);
    assert_eq!(quantize_length(8), 8);
    assert_eq!(quantize_length(9), 8);
    assert_eq!(quantize_length(10), 9);
    // 257 and 258 are the two last codes
    assert_eq!(quantize_length(254), 27);
    assert_eq!(quantize_length(255), 28);
}

#[test]
fn test_quantize_distance() {
    assert_eq!(quantize_distance(0), 0);
    assert_eq!(quantize_distance(3), 3);
    assert_eq!(quantize_distance(4), 4);
    assert_eq!(quantize_distance(5), 4);
    assert_eq!(quantize_distance(6), 5);
    assert_eq!(quantize_distance(24575), 28);
    assert_eq!(quantize_distance(24576), 29);
    assert_eq!(quantize_distance(32767), 29);
}
