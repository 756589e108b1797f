/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

use byteorder::{ByteOrder, LittleEndian};

use crate::deflate::deflate_constants::{MAX_MATCH_LENGTH, MAX_MATCH_OFFSET, MAX_STORE_BLOCK_SIZE};

/// Bytes reserved for the history up front. Once full, the history slides down to the last
/// MAX_MATCH_OFFSET bytes instead of growing.
pub const ALLOC_HISTORY: i32 = MAX_STORE_BLOCK_SIZE * 5;

/// Once `cur` reaches this value the hash tables are rebased. Blocks larger than
/// MAX_STORE_BLOCK_SIZE can force a rebase earlier, see `HistoryWindow::end_after`.
pub const BUFFER_RESET: i32 = i32::MAX - ALLOC_HISTORY - MAX_STORE_BLOCK_SIZE;

/// All the bytes that were fed to an encoder, plus the offset that turns an index into
/// this buffer into the absolute position stored in the hash tables.
pub struct HistoryWindow {
    hist: Vec<u8>,

    /// absolute position of hist[0]
    cur: i32,
}

impl std::fmt::Debug for HistoryWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "HistoryWindow {{ cur: {}, hist: len={} }}",
            self.cur,
            self.hist.len()
        )
    }
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryWindow {
    pub fn new() -> Self {
        HistoryWindow {
            hist: Vec::with_capacity(ALLOC_HISTORY as usize),
            cur: MAX_STORE_BLOCK_SIZE,
        }
    }

    pub fn cur(&self) -> i32 {
        self.cur
    }

    pub fn set_cur(&mut self, cur: i32) {
        debug_assert!(cur >= 0);
        self.cur = cur;
    }

    pub fn data(&self) -> &[u8] {
        &self.hist
    }

    pub fn len(&self) -> usize {
        self.hist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hist.is_empty()
    }

    /// Slides the history down if `incoming` more bytes would not fit the reservation.
    /// Leaves `cur + len()` unchanged, and `len()` is at most ALLOC_HISTORY afterwards.
    pub fn make_room(&mut self, incoming: usize) {
        if self.hist.len() + incoming > ALLOC_HISTORY as usize
            && self.hist.len() > MAX_MATCH_OFFSET as usize
        {
            // keep only what can still be referenced, and move cur so that
            // the bytes we keep still have the same absolute position
            let offset = self.hist.len() - MAX_MATCH_OFFSET as usize;
            self.hist.drain(..offset);
            self.cur += offset as i32;

            log::debug!("history slid down by {} bytes, cur={}", offset, self.cur);
        }
    }

    /// Appends without sliding, returns the index in the history where `src` starts.
    pub fn append(&mut self, src: &[u8]) -> i32 {
        let s = self.hist.len() as i32;
        self.hist.extend_from_slice(src);
        s
    }

    /// Absolute position one past the last buffered byte once `incoming` more bytes are
    /// appended. Computed in i64 since this is what must stay inside an i32.
    pub fn end_after(&self, incoming: usize) -> i64 {
        i64::from(self.cur) + self.hist.len() as i64 + incoming as i64
    }

    /// Forgets all history. The hash tables must be cleared along with this since
    /// their positions would otherwise point into the next stream.
    pub fn reset(&mut self) {
        self.hist.clear();
        self.cur = MAX_STORE_BLOCK_SIZE;
    }
}

#[inline(always)]
pub fn load_u32(src: &[u8], i: i32) -> u32 {
    LittleEndian::read_u32(&src[i as usize..])
}

#[inline(always)]
pub fn load_u64(src: &[u8], i: i32) -> u64 {
    LittleEndian::read_u64(&src[i as usize..])
}

/// Number of equal bytes at `s` and `t`, stopping early so that a match that
/// already covers 4 bytes never exceeds MAX_MATCH_LENGTH.
#[inline]
pub fn match_len(src: &[u8], s: i32, t: i32) -> i32 {
    let end = std::cmp::min(s as usize + (MAX_MATCH_LENGTH - 4) as usize, src.len());
    common_prefix(&src[s as usize..end], &src[t as usize..]) as i32
}

/// Number of equal bytes at `s` and `t` without any limit besides the end of the history.
#[inline]
pub fn match_len_long(src: &[u8], s: i32, t: i32) -> i32 {
    common_prefix(&src[s as usize..], &src[t as usize..]) as i32
}

/// length of the common prefix of a and b, b has to be at least as long as a
fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    let mut checked = 0;

    for (x, y) in a.chunks_exact(8).zip(b.chunks_exact(8)) {
        let diff = LittleEndian::read_u64(x) ^ LittleEndian::read_u64(y);
        if diff != 0 {
            return checked + (diff.trailing_zeros() >> 3) as usize;
        }
        checked += 8;
    }

    let b = &b[checked..];
    for (i, &x) in a[checked..].iter().enumerate() {
        if x != b[i] {
            return checked + i;
        }
    }

    a.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_block(w: &mut HistoryWindow, src: &[u8]) -> i32 {
        w.make_room(src.len());
        w.append(src)
    }

    #[test]
    fn add_block_returns_start() {
        let mut w = HistoryWindow::new();
        assert_eq!(add_block(&mut w, b"abc"), 0);
        assert_eq!(add_block(&mut w, b"defg"), 3);
        assert_eq!(w.data(), b"abcdefg");
        assert_eq!(w.cur(), MAX_STORE_BLOCK_SIZE);

        w.reset();
        assert!(w.is_empty());
        assert_eq!(w.cur(), MAX_STORE_BLOCK_SIZE);
    }

    #[test]
    fn slide_preserves_absolute_positions() {
        let mut w = HistoryWindow::new();
        let block: Vec<u8> = (0..60000u32).map(|i| (i * 7 % 251) as u8).collect();

        let mut total = 0i64;
        for _ in 0..12 {
            let start = add_block(&mut w, &block);
            total += block.len() as i64;

            // the end of the history always sits at the same absolute position
            assert_eq!(i64::from(w.cur()) + w.len() as i64, total + i64::from(MAX_STORE_BLOCK_SIZE));
            assert_eq!(&w.data()[start as usize..], &block[..]);
            assert!(w.len() <= ALLOC_HISTORY as usize + block.len());
        }

        // we slid at least once, and kept a full window in front of the last block
        assert!(w.cur() > MAX_STORE_BLOCK_SIZE);
        assert!(w.len() >= MAX_MATCH_OFFSET as usize + block.len());
    }

    #[test]
    fn make_room_bounds_history() {
        let mut w = HistoryWindow::new();
        add_block(&mut w, &vec![1u8; 300_000]);

        let end = w.end_after(1_000_000);
        w.make_room(1_000_000);
        assert_eq!(w.len(), MAX_MATCH_OFFSET as usize);
        assert_eq!(w.end_after(1_000_000), end);

        // a short history is never slid, no matter how much is coming
        let mut w = HistoryWindow::new();
        add_block(&mut w, &vec![2u8; 1000]);
        w.make_room(10_000_000);
        assert_eq!(w.len(), 1000);
        assert_eq!(w.cur(), MAX_STORE_BLOCK_SIZE);
    }

    #[test]
    fn common_prefix_lengths() {
        let a = b"0123456789abcdefghij";
        let mut b = *a;
        assert_eq!(common_prefix(a, &b), 20);

        b[13] = b'X';
        assert_eq!(common_prefix(a, &b), 13);

        b[3] = b'X';
        assert_eq!(common_prefix(a, &b), 3);
        assert_eq!(common_prefix(&a[..0], &b), 0);
    }

    #[test]
    fn match_len_is_capped() {
        let src = vec![b'z'; 1000];

        assert_eq!(match_len(&src, 5, 4), MAX_MATCH_LENGTH - 4);
        assert_eq!(match_len_long(&src, 5, 4), 995);

        // near the end the cap is the end of the data
        assert_eq!(match_len(&src, 990, 0), 10);
    }

    #[test]
    fn loads_are_little_endian() {
        let src = [1u8, 2, 3, 4, 5, 6, 7, 8, 9];
        assert_eq!(load_u32(&src, 1), 0x0504_0302);
        assert_eq!(load_u64(&src, 1), 0x0908_0706_0504_0302);
    }
}
