/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

use default_boxed::DefaultBoxed;

use crate::hash_algorithm::TABLE_SIZE;

/// The two most recent positions that hashed to a slot of the chained table.
/// `prev` holds whatever `cur` was before the last insert.
#[derive(Default, Copy, Clone, Eq, PartialEq, Debug)]
pub struct ChainEntry {
    pub cur: i32,
    pub prev: i32,
}

/// Position tables of the match finder. All positions are absolute, ie the index in the
/// history buffer plus the window's `cur` at the time of insertion. Zero means empty, which
/// is always too far away from the scan position to be used.
#[derive(DefaultBoxed)]
struct PositionTables {
    /// single candidate per hash of the first 4 bytes
    short: [i32; TABLE_SIZE],

    /// two deep chain per hash of the first 7 bytes
    long: [ChainEntry; TABLE_SIZE],
}

pub struct HashTables {
    tables: Box<PositionTables>,
}

impl Default for HashTables {
    fn default() -> Self {
        Self::new()
    }
}

impl HashTables {
    pub fn new() -> Self {
        HashTables {
            tables: PositionTables::default_boxed(),
        }
    }

    #[inline(always)]
    pub fn short(&self, hash: usize) -> i32 {
        self.tables.short[hash]
    }

    #[inline(always)]
    pub fn long(&self, hash: usize) -> ChainEntry {
        self.tables.long[hash]
    }

    #[inline(always)]
    pub fn insert_short(&mut self, hash: usize, pos: i32) {
        self.tables.short[hash] = pos;
    }

    /// pushes `pos` onto the chain, the old `cur` becomes `prev` and the old `prev` is dropped
    #[inline(always)]
    pub fn insert_long(&mut self, hash: usize, pos: i32) {
        let e = &mut self.tables.long[hash];
        e.prev = e.cur;
        e.cur = pos;
    }

    #[inline(always)]
    pub fn insert(&mut self, short_hash: usize, long_hash: usize, pos: i32) {
        self.insert_short(short_hash, pos);
        self.insert_long(long_hash, pos);
    }

    pub fn clear(&mut self) {
        self.tables.short.fill(0);
        self.tables.long.fill(ChainEntry::default());
    }

    /// Remaps every stored position after the window origin moved. Positions at or before
    /// `min_off` can no longer be matched and are set to empty, everything else has
    /// `shift` subtracted.
    pub fn rebase(&mut self, min_off: i32, shift: i32) {
        let remap = |v: i32| if v <= min_off { 0 } else { v - shift };

        for v in self.tables.short.iter_mut() {
            *v = remap(*v);
        }

        for e in self.tables.long.iter_mut() {
            if e.cur <= min_off {
                *e = ChainEntry::default();
            } else {
                e.cur -= shift;
                e.prev = remap(e.prev);
            }
        }
    }
}
