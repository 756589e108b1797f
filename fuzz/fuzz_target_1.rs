#![no_main]

use libfuzzer_sys::fuzz_target;

use ndflate::{BlockOutcome, EncoderConfig, NondeterministicEncoder, Token, Tokens};

// first byte picks the block size, the next four the seed, the rest is the data
fuzz_target!(|data: &[u8]| {
    if data.len() < 5 {
        return;
    }

    let block_size = usize::from(data[0]) * 97 + 1;
    let seed = [data[1], data[2], data[3], data[4]];
    let data = &data[5..];

    let mut enc = NondeterministicEncoder::new(EncoderConfig {
        fixed_seed: Some(seed),
    })
    .unwrap();

    let mut out = Vec::new();
    let mut tokens = Tokens::new();

    for block in data.chunks(block_size) {
        tokens.reset();
        match enc.encode(&mut tokens, block) {
            BlockOutcome::Tokenized => {
                for t in tokens.iter() {
                    match t {
                        Token::Literal(lit) => out.push(*lit),
                        Token::Match(m) => {
                            let start = out.len() - m.dist() as usize;
                            for i in 0..m.len() as usize {
                                out.push(out[start + i]);
                            }
                        }
                    }
                }
            }
            BlockOutcome::Literal(n) => {
                assert_eq!(n, block.len());
                out.extend_from_slice(block);
            }
        }
    }

    assert!(out == data);
});
