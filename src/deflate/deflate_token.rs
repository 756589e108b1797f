/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

use super::deflate_constants::{
    quantize_distance, quantize_length, BASE_MATCH_LENGTH, BASE_MATCH_OFFSET, DIST_CODE_COUNT,
    LEN_CODE_COUNT, MAX_MATCH_LENGTH, MAX_MATCH_OFFSET,
};

/// In an LZ77 stream, tokens are either literals (bytes) or references to previous bytes
/// with a distance and length.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Token {
    Literal(u8),
    Match(TokenMatch),
}

/// In the case of a match, the length is the number of bytes to copy from the
/// previous bytes, and the distance is the number of bytes back to start copying from.
///
/// Both are stored with their base subtracted, which is how the entropy coder wants them.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TokenMatch {
    xlength: u8,
    xoffset: u16,
}

impl TokenMatch {
    /// `xlength` is the length minus BASE_MATCH_LENGTH, `xoffset` the distance minus BASE_MATCH_OFFSET
    pub fn new(xlength: u32, xoffset: u32) -> TokenMatch {
        debug_assert!(xlength <= (MAX_MATCH_LENGTH - BASE_MATCH_LENGTH) as u32);
        debug_assert!(xoffset < MAX_MATCH_OFFSET as u32);

        TokenMatch {
            xlength: xlength as u8,
            xoffset: xoffset as u16,
        }
    }

    pub fn len(&self) -> u32 {
        u32::from(self.xlength) + BASE_MATCH_LENGTH as u32
    }

    pub fn dist(&self) -> u32 {
        u32::from(self.xoffset) + BASE_MATCH_OFFSET as u32
    }

    pub fn encoded_length(&self) -> u32 {
        u32::from(self.xlength)
    }

    pub fn encoded_offset(&self) -> u32 {
        u32::from(self.xoffset)
    }
}

/// Used to track the frequency of symbols in the token stream
/// which are later used to build the huffman encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenFrequency {
    pub literal_codes: [u32; 256],
    pub length_codes: [u32; LEN_CODE_COUNT],
    pub distance_codes: [u32; DIST_CODE_COUNT],
}

impl Default for TokenFrequency {
    fn default() -> Self {
        TokenFrequency {
            literal_codes: [0; 256],
            length_codes: [0; LEN_CODE_COUNT],
            distance_codes: [0; DIST_CODE_COUNT],
        }
    }
}

impl TokenFrequency {
    pub fn commit_token(&mut self, token: &Token) {
        match token {
            Token::Literal(lit) => {
                self.literal_codes[usize::from(*lit)] += 1;
            }
            Token::Match(m) => {
                self.length_codes[quantize_length(m.encoded_length())] += 1;
                self.distance_codes[quantize_distance(m.encoded_offset())] += 1;
            }
        }
    }

    /// number of literal tokens that were counted
    pub fn literal_count(&self) -> u64 {
        self.literal_codes.iter().map(|&c| u64::from(c)).sum()
    }
}

/// Destination of the match finder. The encoder only ever appends; it never reads
/// tokens back or clears the sink.
pub trait TokenSink {
    fn add_literal(&mut self, lit: u8);

    /// adds a match whose length and distance already have their bases subtracted,
    /// so `xlength` can be at most MAX_MATCH_LENGTH - BASE_MATCH_LENGTH
    fn add_match(&mut self, xlength: u32, xoffset: u32);

    /// number of tokens currently held
    fn token_count(&self) -> usize;

    fn add_literals(&mut self, lits: &[u8]) {
        for &lit in lits {
            self.add_literal(lit);
        }
    }

    /// adds a match that may be longer than MAX_MATCH_LENGTH. Unlike `add_match` the length
    /// is the real length, only the offset has its base subtracted.
    fn add_match_long(&mut self, mut length: u32, xoffset: u32) {
        const MAX_LEN: u32 = MAX_MATCH_LENGTH as u32;
        const BASE_LEN: u32 = BASE_MATCH_LENGTH as u32;

        debug_assert!(length >= BASE_LEN);

        while length > 0 {
            let mut chunk = length;
            if chunk > MAX_LEN {
                // leave at least BASE_LEN bytes over for the next chunk
                if chunk > MAX_LEN + BASE_LEN {
                    chunk = MAX_LEN;
                } else {
                    chunk = MAX_LEN - BASE_LEN;
                }
            }
            length -= chunk;
            self.add_match(chunk - BASE_LEN, xoffset);
        }
    }
}

/// The token list for one block together with its symbol statistics.
#[derive(Debug, Default, Clone)]
pub struct Tokens {
    tokens: Vec<Token>,
    frequency: TokenFrequency,
}

impl Tokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Tokens {
            tokens: Vec::with_capacity(capacity),
            frequency: TokenFrequency::default(),
        }
    }

    /// empties the token list and statistics so the allocation can be reused for the next block
    pub fn reset(&mut self) {
        self.tokens.clear();
        self.frequency = TokenFrequency::default();
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> + '_ {
        self.tokens.iter()
    }

    pub fn frequency(&self) -> &TokenFrequency {
        &self.frequency
    }

    /// histogram of the literal bytes, indexed by byte value
    pub fn literal_histogram(&self) -> &[u32; 256] {
        &self.frequency.literal_codes
    }

    /// total number of plain text bytes the tokens expand to
    pub fn uncompressed_len(&self) -> u64 {
        self.tokens
            .iter()
            .map(|t| match t {
                Token::Literal(_) => 1,
                Token::Match(m) => u64::from(m.len()),
            })
            .sum()
    }

    fn push(&mut self, token: Token) {
        self.frequency.commit_token(&token);
        self.tokens.push(token);
    }
}

impl TokenSink for Tokens {
    #[inline]
    fn add_literal(&mut self, lit: u8) {
        self.push(Token::Literal(lit));
    }

    #[inline]
    fn add_match(&mut self, xlength: u32, xoffset: u32) {
        self.push(Token::Match(TokenMatch::new(xlength, xoffset)));
    }

    fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

#[test]
fn test_token_match_bases() {
    let m = TokenMatch::new(0, 0);
    assert_eq!(m.len(), 3);
    assert_eq!(m.dist(), 1);

    let m = TokenMatch::new(255, 32767);
    assert_eq!(m.len(), 258);
    assert_eq!(m.dist(), 32768);
}

#[test]
fn test_add_match_long_splits() {
    let mut t = Tokens::new();
    t.add_match_long(258 * 2 + 2, 9);

    // 518 = 258 + 260, and 260 must not leave a 2 byte tail
    let lens: Vec<u32> = t
        .iter()
        .map(|x| match x {
            Token::Match(m) => {
                assert_eq!(m.dist(), 10);
                m.len()
            }
            Token::Literal(_) => panic!("unexpected literal"),
        })
        .collect();

    assert_eq!(lens, [258, 255, 5]);
    assert_eq!(t.uncompressed_len(), 518);
    assert_eq!(t.frequency().distance_codes[quantize_distance(9)], 3);
}

#[test]
fn test_add_match_long_exact() {
    for len in [3, 4, 100, 258, 259, 260, 261, 262, 1000] {
        let mut t = Tokens::new();
        t.add_match_long(len, 0);
        assert_eq!(t.uncompressed_len(), u64::from(len));
        assert!(t.iter().all(|x| matches!(x, Token::Match(m) if m.len() >= 3)));
    }
}

#[test]
fn test_literal_histogram() {
    let mut t = Tokens::new();
    t.add_literals(b"hello");
    t.add_match(2, 3);

    assert_eq!(t.literal_histogram()[usize::from(b'l')], 2);
    assert_eq!(t.literal_histogram()[usize::from(b'h')], 1);
    assert_eq!(t.frequency().literal_count(), 5);
    assert_eq!(t.token_count(), 6);

    t.reset();
    assert!(t.is_empty());
    assert_eq!(t.frequency().literal_count(), 0);
}
