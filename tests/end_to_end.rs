/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

use ndflate::{
    BlockOutcome, EncoderConfig, NondeterministicEncoder, Token, Tokens, MAX_MATCH_LENGTH,
    MAX_MATCH_OFFSET, MAX_STORE_BLOCK_SIZE, MIN_NON_LITERAL_BLOCK_SIZE,
};
use rand::{Rng, RngCore, SeedableRng};

/// Plain LZ77 reconstruction of a token stream, on top of the output of the previous blocks.
fn decode_block(tokens: &Tokens, out: &mut Vec<u8>) {
    let block_start = out.len();

    for t in tokens.iter() {
        match t {
            Token::Literal(lit) => out.push(*lit),
            Token::Match(m) => {
                let dist = m.dist() as usize;
                assert!(m.len() >= 3 && m.len() <= MAX_MATCH_LENGTH as u32);
                assert!(dist > 0 && dist <= MAX_MATCH_OFFSET as usize);
                assert!(dist <= out.len(), "reference before start of stream");

                let start = out.len() - dist;
                for i in 0..m.len() as usize {
                    out.push(out[start + i]);
                }
            }
        }
    }

    assert_eq!(
        tokens.uncompressed_len(),
        (out.len() - block_start) as u64
    );
}

/// splits `data` into blocks the way a block writer would, encodes them and checks the
/// result decodes back to the input
fn verifyresult(enc: &mut NondeterministicEncoder, data: &[u8], block_size: usize) -> usize {
    let mut out = Vec::new();
    let mut tokens = Tokens::with_capacity(block_size);
    let mut token_count = 0;

    for block in data.chunks(block_size) {
        tokens.reset();
        match enc.encode(&mut tokens, block) {
            BlockOutcome::Tokenized => {
                let literals = tokens
                    .iter()
                    .filter(|t| matches!(t, Token::Literal(_)))
                    .count();
                assert_eq!(tokens.frequency().literal_count(), literals as u64);

                decode_block(&tokens, &mut out);
                token_count += tokens.len();
            }
            BlockOutcome::Literal(n) => {
                assert_eq!(n, block.len());
                assert!(tokens.is_empty());
                out.extend_from_slice(block);
                token_count += n;
            }
        }
    }

    assert!(out == data);
    token_count
}

fn sample_text(len: usize, seed: u64) -> Vec<u8> {
    const WORDS: [&str; 12] = [
        "deflate ", "window ", "match ", "literal ", "hash ", "chain ", "the ", "of ",
        "distance ", "length ", "token ", "\n",
    ];

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut v = Vec::with_capacity(len + 16);
    while v.len() < len {
        v.extend_from_slice(WORDS[rng.gen_range(0..WORDS.len())].as_bytes());
    }
    v.truncate(len);
    v
}

#[test]
fn end_to_end_empty_and_tiny() {
    let mut enc = NondeterministicEncoder::new(EncoderConfig::default()).unwrap();

    for len in 0..MIN_NON_LITERAL_BLOCK_SIZE {
        let mut tokens = Tokens::new();
        let data = vec![0x42; len];
        assert_eq!(enc.encode(&mut tokens, &data), BlockOutcome::Literal(len));
        assert_eq!(tokens.len(), 0);
    }
}

#[test]
fn end_to_end_repeated_byte() {
    let data = [b'A'; 64];

    for _ in 0..50 {
        let mut enc = NondeterministicEncoder::new(EncoderConfig::default()).unwrap();
        let mut tokens = Tokens::new();
        assert_eq!(enc.encode(&mut tokens, &data), BlockOutcome::Tokenized);

        let mut out = Vec::new();
        decode_block(&tokens, &mut out);
        assert_eq!(out, data);

        for t in tokens.iter() {
            if let Token::Match(m) = t {
                assert_eq!(m.dist(), 1);
            }
        }
    }
}

#[test]
fn end_to_end_text() {
    let data = sample_text(1024 * 1024, 1);
    let mut enc = NondeterministicEncoder::new(EncoderConfig::default()).unwrap();

    let tokens = verifyresult(&mut enc, &data, MAX_STORE_BLOCK_SIZE as usize);
    println!("text: {} bytes into {} tokens", data.len(), tokens);
    assert!(tokens < data.len() / 2);
}

#[test]
fn end_to_end_incompressible() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x1234);
    let mut data = vec![0u8; 300_000];
    rng.fill_bytes(&mut data);

    let mut enc = NondeterministicEncoder::new(EncoderConfig::default()).unwrap();
    verifyresult(&mut enc, &data, MAX_STORE_BLOCK_SIZE as usize);
}

#[test]
fn end_to_end_odd_block_sizes() {
    let data = sample_text(200_000, 7);

    for block_size in [1, 5, 13, 14, 100, 4097, 65535, 200_000] {
        let mut enc = NondeterministicEncoder::new(EncoderConfig::default()).unwrap();
        verifyresult(&mut enc, &data[..(block_size * 20).min(data.len())], block_size);
    }
}

#[test]
fn end_to_end_mixed_content() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(555);
    let mut data = Vec::new();

    for _ in 0..200 {
        match rng.gen_range(0..4) {
            0 => {
                let mut r = vec![0u8; rng.gen_range(1..3000)];
                rng.fill_bytes(&mut r);
                data.extend_from_slice(&r);
            }
            1 => {
                let b: u8 = rng.gen();
                data.extend(std::iter::repeat(b).take(rng.gen_range(1..2000)));
            }
            2 if data.len() > 10 => {
                // copy from somewhere earlier, sometimes out of window
                let len = rng.gen_range(1..1000).min(data.len());
                let from = rng.gen_range(0..=data.len() - len);
                let copy = data[from..from + len].to_vec();
                data.extend_from_slice(&copy);
            }
            _ => data.extend_from_slice(&sample_text(rng.gen_range(1..5000), rng.gen())),
        }
    }

    let mut enc = NondeterministicEncoder::new(EncoderConfig::default()).unwrap();
    verifyresult(&mut enc, &data, 32768);
}

#[test]
fn end_to_end_reset_between_streams() {
    let data = sample_text(100_000, 3);
    let mut enc = NondeterministicEncoder::new(EncoderConfig::default()).unwrap();

    for _ in 0..3 {
        // each stream decodes on its own, so nothing may refer to the previous one
        verifyresult(&mut enc, &data, 16384);
        enc.reset().unwrap();
    }
}

#[test]
fn end_to_end_seeds_give_different_parses() {
    let data = sample_text(50_000, 11);

    let encode_with = |seed: [u8; 4]| {
        let mut enc = NondeterministicEncoder::new(EncoderConfig {
            fixed_seed: Some(seed),
        })
        .unwrap();
        let mut tokens = Tokens::new();
        assert_eq!(enc.encode(&mut tokens, &data), BlockOutcome::Tokenized);

        let mut out = Vec::new();
        decode_block(&tokens, &mut out);
        assert!(out == data);
        tokens
    };

    let a = encode_with([0x01, 0x23, 0x45, 0x67]);
    let b = encode_with([0x89, 0xab, 0xcd, 0xef]);
    let a2 = encode_with([0x01, 0x23, 0x45, 0x67]);

    assert_ne!(a.tokens(), b.tokens());
    assert_eq!(a.tokens(), a2.tokens());
}
