/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

//! Level 5 match finder with randomized parsing. Works like a regular greedy fast encoder
//! with a 4 byte hash table and a 2 deep 7 byte hash chain, but whenever two candidates are
//! equally good a coin flip decides, and matches are occasionally shortened by a byte.
//! The result is a different (but always valid) token stream on every run.

use crate::{
    deflate::{
        deflate_constants::{
            BASE_MATCH_LENGTH, BASE_MATCH_OFFSET, MAX_MATCH_LENGTH, MAX_MATCH_OFFSET,
        },
        deflate_token::TokenSink,
    },
    flate_error::Result,
    hash_algorithm::{Hash4, Hash7, PrefixHash},
    hash_table::HashTables,
    history_window::{
        load_u32, load_u64, match_len, match_len_long, HistoryWindow, ALLOC_HISTORY,
        BUFFER_RESET,
    },
    random_bits::{os_seed, RandomBits},
    EncoderConfig,
};

/// bytes at the end of the history that are never used as a match start, this lets
/// us do 8 byte loads anywhere in the scan without bounds worries
const INPUT_MARGIN: i32 = 12 - 1;

/// blocks smaller than this are not worth searching and are stored as literals
pub const MIN_NON_LITERAL_BLOCK_SIZE: usize = 1 + 1 + INPUT_MARGIN as usize;

/// when nothing matches, the step size grows by 1 for every 2^SKIP_LOG bytes since the last emit
const SKIP_LOG: i32 = 6;
const DO_EVERY: i32 = 1;

/// only look for a better match at the end of the current one if it is shorter than this
const LOOK_AHEAD_MAX_LEN: i32 = 30;

/// stride used when filling in hashes for positions covered by a match
const HASH_EVERY: i32 = 3;

/// absolute positions up to the end of the history must stay at or below this
const POSITION_LIMIT: i32 = i32::MAX - MAX_MATCH_OFFSET;

/// Largest block that can be searched. Even right after a rebase the history starts at
/// MAX_MATCH_OFFSET and may hold up to ALLOC_HISTORY bytes, the block has to fit on top.
pub const MAX_BLOCK_LEN: usize = (POSITION_LIMIT - MAX_MATCH_OFFSET - ALLOC_HISTORY) as usize;

/// What the caller has to do with a block after `encode` returned.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlockOutcome {
    /// the block was appended to the sink as literals and matches
    Tokenized,

    /// nothing was written to the sink, the caller should store these
    /// many input bytes as literals (or as a stored block)
    Literal(usize),
}

/// Level 5 LZ77 encoder that varies its parse between runs. One instance compresses one
/// stream, block by block, and keeps the last MAX_MATCH_OFFSET bytes around so matches can
/// reach into previous blocks. Instances share nothing and can be used on separate threads.
pub struct NondeterministicEncoder {
    window: HistoryWindow,
    tables: HashTables,
    rng: RandomBits,
    config: EncoderConfig,
}

impl std::fmt::Debug for NondeterministicEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "NondeterministicEncoder {{ window: {:?}, rng: {:?}, config: {:?} }}",
            self.window, self.rng, self.config
        )
    }
}

impl NondeterministicEncoder {
    /// Creates an encoder and seeds its random bits. Fails only if no fixed seed was
    /// configured and the operating system cannot supply one.
    pub fn new(config: EncoderConfig) -> Result<Self> {
        let seed = match config.fixed_seed {
            Some(seed) => seed,
            None => os_seed()?,
        };

        log::debug!("new nondeterministic encoder, seed={:02x?}", seed);

        Ok(NondeterministicEncoder {
            window: HistoryWindow::new(),
            tables: HashTables::new(),
            rng: RandomBits::from_seed(seed),
            config,
        })
    }

    /// Starts a new independent stream: forgets the history, empties the hash tables and
    /// draws a new seed (or restarts the fixed one).
    pub fn reset(&mut self) -> Result<()> {
        let seed = match self.config.fixed_seed {
            Some(seed) => seed,
            None => os_seed()?,
        };

        self.window.reset();
        self.tables.clear();
        self.rng.reseed(seed);

        log::debug!("encoder reset, seed={:02x?}", seed);
        Ok(())
    }

    /// true if `cur` is past the rebase threshold, or if appending `incoming` bytes would
    /// push the positions of the history past POSITION_LIMIT
    fn needs_rebase(&self, incoming: usize) -> bool {
        self.window.cur() >= BUFFER_RESET
            || self.window.end_after(incoming) > i64::from(POSITION_LIMIT)
    }

    /// Moves the origin of the absolute positions back down before `cur` or the positions
    /// of the next `incoming` bytes can get anywhere near overflowing.
    fn protect_cur_wraparound(&mut self, incoming: usize) {
        debug_assert!(self.window.cur() >= 0, "cur < 0: {}", self.window.cur());
        debug_assert!(self.window.len() <= ALLOC_HISTORY as usize);

        while self.needs_rebase(incoming) {
            if self.window.is_empty() {
                self.tables.clear();
                self.window.set_cur(MAX_MATCH_OFFSET);
                log::debug!("cur reached {}, tables cleared", self.window.cur());
                break;
            }

            // everything at or before min_off is too far away to ever be matched again
            let cur = self.window.cur();
            let min_off = cur + self.window.len() as i32 - MAX_MATCH_OFFSET;
            self.tables.rebase(min_off, cur - MAX_MATCH_OFFSET);
            self.window.set_cur(MAX_MATCH_OFFSET);

            log::debug!(
                "rebased hash tables from cur={} to {}, incoming={}",
                cur,
                MAX_MATCH_OFFSET,
                incoming
            );
        }

        debug_assert!(!self.needs_rebase(incoming));
    }

    /// A block too large to address is left to the caller. Only its tail can still be
    /// referenced, so that becomes the whole history, with empty tables.
    fn skip_oversized(&mut self, src: &[u8]) {
        self.window.reset();
        self.tables.clear();
        self.window.append(&src[src.len() - MAX_MATCH_OFFSET as usize..]);

        log::debug!("block of {} bytes is too large to search", src.len());
    }

    /// Appends `src` to the history and writes its tokens to `dst`.
    ///
    /// Matches may reference anything still inside the window from earlier calls. For
    /// small blocks, blocks longer than MAX_BLOCK_LEN, or blocks where not a single match
    /// was found, nothing is written and `BlockOutcome::Literal` tells the caller to handle
    /// the bytes itself.
    pub fn encode(&mut self, dst: &mut impl TokenSink, src: &[u8]) -> BlockOutcome {
        if src.len() > MAX_BLOCK_LEN {
            self.skip_oversized(src);
            return BlockOutcome::Literal(src.len());
        }

        self.window.make_room(src.len());
        self.protect_cur_wraparound(src.len());

        let start = self.window.append(src);

        if src.len() < MIN_NON_LITERAL_BLOCK_SIZE {
            return BlockOutcome::Literal(src.len());
        }

        let tokens_before = dst.token_count();

        let Self {
            window,
            tables,
            rng,
            ..
        } = self;

        let next_emit = scan(window, tables, rng, dst, start);

        let hist = window.data();
        if (next_emit as usize) < hist.len() {
            if dst.token_count() == tokens_before {
                return BlockOutcome::Literal(src.len());
            }

            dst.add_literals(&hist[next_emit as usize..]);
        }

        BlockOutcome::Tokenized
    }
}

/// `t` is a usable candidate for a match at `s`
#[inline(always)]
fn in_window(s: i32, t: i32) -> bool {
    let dist = s - t;
    t >= 0 && dist > 0 && dist < MAX_MATCH_OFFSET
}

/// The main loop. Scans the history from `s` and emits literals and matches, returns the
/// position up to which everything has been emitted.
fn scan(
    window: &HistoryWindow,
    tables: &mut HashTables,
    rng: &mut RandomBits,
    dst: &mut impl TokenSink,
    mut s: i32,
) -> i32 {
    let src = window.data();
    let cur = window.cur();

    // src[next_emit..s] has not been emitted yet
    let mut next_emit = s;

    // stop looking for matches here, the remainder is emitted as literals
    let s_limit = src.len() as i32 - INPUT_MARGIN;

    let mut cv = load_u64(src, s);

    loop {
        let mut next_s = s;

        // look for a position with a 4 byte match, l is zero if the length is yet to be determined
        let (t, l) = loop {
            let mut next_hash_s = Hash4::hash(cv);
            let mut next_hash_l = Hash7::hash(cv);

            s = next_s;
            next_s = s + DO_EVERY + ((s - next_emit) >> SKIP_LOG);
            if next_s > s_limit {
                return next_emit;
            }

            let s_candidate = tables.short(next_hash_s);
            let l_candidate = tables.long(next_hash_l);
            let next = load_u64(src, next_s);
            tables.insert(next_hash_s, next_hash_l, s + cur);

            next_hash_s = Hash4::hash(next);
            next_hash_l = Hash7::hash(next);

            let t = l_candidate.cur - cur;
            if in_window(s, t) {
                if cv as u32 == load_u32(src, t) {
                    tables.insert(next_hash_s, next_hash_l, next_s + cur);

                    let t2 = l_candidate.prev - cur;
                    if in_window(s, t2) && cv as u32 == load_u32(src, t2) {
                        let l = match_len(src, s + 4, t + 4) + 4;
                        let ml = match_len(src, s + 4, t2 + 4) + 4;

                        if ml > l || (ml == l && rng.next_bit()) {
                            break (t2, ml);
                        }
                        break (t, l);
                    }
                    break (t, 0);
                }

                let t = l_candidate.prev - cur;
                if in_window(s, t) && cv as u32 == load_u32(src, t) {
                    tables.insert(next_hash_s, next_hash_l, next_s + cur);
                    break (t, 0);
                }
            }

            let t = s_candidate - cur;
            if in_window(s, t) && cv as u32 == load_u32(src, t) {
                let l = match_len(src, s + 4, t + 4) + 4;

                let l_candidate = tables.long(next_hash_l);
                tables.insert(next_hash_s, next_hash_l, next_s + cur);

                // a long match starting at the next position beats a short one here
                let t2 = l_candidate.cur - cur;
                if in_window(next_s, t2) {
                    if load_u32(src, t2) == next as u32 {
                        let ml = match_len(src, next_s + 4, t2 + 4) + 4;
                        if ml > l || (ml == l && rng.next_bit()) {
                            s = next_s;
                            break (t2, ml);
                        }
                    }

                    let t2 = l_candidate.prev - cur;
                    if in_window(next_s, t2) && load_u32(src, t2) == next as u32 {
                        let ml = match_len(src, next_s + 4, t2 + 4) + 4;
                        if ml > l || (ml == l && rng.next_bit()) {
                            s = next_s;
                            break (t2, ml);
                        }
                    }
                }
                break (t, l);
            }

            cv = next;
        };

        let mut t = t;
        let mut l = l;

        if l == 0 {
            l = match_len_long(src, s + 4, t + 4) + 4;
        } else if l == MAX_MATCH_LENGTH {
            l += match_len_long(src, s + l, t + l);
        }

        // try to locate a better match by checking the end of the match we have
        let s_at = s + l;
        if l < LOOK_AHEAD_MAX_LEN && s_at < s_limit {
            let e_long = tables.long(Hash7::hash(load_u64(src, s_at))).cur;
            let t2 = e_long - cur - l;
            let off = s - t2;
            if t2 >= 0 && off < MAX_MATCH_OFFSET && off > 0 {
                let l2 = match_len_long(src, s, t2);
                if l2 > l {
                    t = t2;
                    l = l2;
                }
            }
        }

        // extend backwards over bytes we haven't emitted yet
        while t > 0 && s > next_emit && src[(t - 1) as usize] == src[(s - 1) as usize] {
            s -= 1;
            t -= 1;
            l += 1;
        }

        if l > BASE_MATCH_LENGTH + 1 && rng.next_bit() {
            if rng.next_bit() {
                // turn the first byte of the match into a literal
                s += 1;
                t += 1;
                l -= 1;
            } else {
                // drop the last byte, it gets picked up by the next literal run or match
                l -= 1;
            }
        }

        if next_emit < s {
            dst.add_literals(&src[next_emit as usize..s as usize]);
        }

        debug_assert!(t < s, "s-t {} {}", s, t);
        debug_assert!(s - t <= MAX_MATCH_OFFSET, "mmo {}", s - t);
        debug_assert!(l >= BASE_MATCH_LENGTH, "bml {}", l);
        debug_assert!((s + l) as usize <= src.len());

        let off = (s - t - BASE_MATCH_OFFSET) as u32;
        let mut to_emit = l;
        next_emit = s + l;

        while to_emit > 0 {
            if to_emit > MAX_MATCH_LENGTH + BASE_MATCH_LENGTH {
                if !rng.next_bit() {
                    // slip in a literal, the rest of the match continues one byte later
                    dst.add_literal(src[s as usize]);
                    s += 1;
                    to_emit -= 1;
                }
                dst.add_match((MAX_MATCH_LENGTH - BASE_MATCH_LENGTH) as u32, off);
                to_emit -= MAX_MATCH_LENGTH;
                s += MAX_MATCH_LENGTH;
            } else {
                dst.add_match_long(to_emit as u32, off);
                break;
            }
        }

        s = next_emit;
        if next_s >= s {
            s = next_s + 1;
        }

        if s >= s_limit {
            return next_emit;
        }

        // store every 3rd hash in-between, so that the area covered by the match
        // can still be found by later matches
        let mut i = s - l + 1;
        if i < s - 1 {
            let mut cv = load_u64(src, i);
            let mut pos = i + cur;
            tables.insert(Hash4::hash(cv), Hash7::hash(cv), pos);

            cv >>= 8;
            pos += 1;
            tables.insert_long(Hash7::hash(cv), pos);

            // only enough bytes left for a short hash at i+2
            cv >>= 8;
            pos += 1;
            tables.insert_short(Hash4::hash(cv), pos);

            // skip one, otherwise we risk hitting s
            i += 4;
            while i < s - 1 {
                if rng.next_bit() {
                    let cv = load_u64(src, i);
                    let pos = i + cur;
                    tables.insert_long(Hash7::hash(cv), pos);
                    tables.insert_short(Hash4::hash_u32((cv >> 8) as u32), pos + 1);
                }
                i += HASH_EVERY;
            }
        }

        // s itself is hashed at the top of the loop, s-1 has to be done here
        let x = load_u64(src, s - 1);
        tables.insert(Hash4::hash(x), Hash7::hash(x), cur + s - 1);
        cv = x >> 8;
    }
}
