/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

// forbid lints that we already have eliminated from the codebase so they don't show up in the future
#![forbid(unsafe_code)]
#![forbid(trivial_casts)]
#![forbid(non_ascii_idents)]
#![forbid(unused_extern_crates)]
#![forbid(unused_import_braces)]
#![forbid(unused_lifetimes)]
#![forbid(unused_macro_rules)]
#![forbid(macro_use_extern_crate)]

mod deflate;
mod flate_error;
mod hash_algorithm;
mod hash_table;
mod history_window;
mod nondeterministic_encoder;
mod random_bits;

pub use deflate::deflate_constants::{
    BASE_MATCH_LENGTH, BASE_MATCH_OFFSET, MAX_MATCH_LENGTH, MAX_MATCH_OFFSET, MAX_STORE_BLOCK_SIZE,
};
pub use deflate::deflate_token::{Token, TokenFrequency, TokenMatch, TokenSink, Tokens};
pub use flate_error::ExitCode;
pub use flate_error::{FlateError, Result};
pub use hash_algorithm::TABLE_BITS;
pub use history_window::BUFFER_RESET;
pub use nondeterministic_encoder::{
    BlockOutcome, NondeterministicEncoder, MAX_BLOCK_LEN, MIN_NON_LITERAL_BLOCK_SIZE,
};
pub use random_bits::RNG_SEED_BYTES;

/// Configure the nondeterministic encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncoderConfig {
    /// Seed for the tie breaking bits. With `None` every encoder (and every reset) draws a
    /// fresh seed from the operating system, which is the point of this encoder. A fixed
    /// seed makes the output repeatable, which is useful to reproduce a particular parse
    /// found by a test or fuzzer.
    pub fixed_seed: Option<[u8; RNG_SEED_BYTES]>,
}

#[cfg(test)]
static INIT: std::sync::Once = std::sync::Once::new();

/// Initialize the logger for tests. This is a no-op if the logger is already initialized.
#[cfg(test)]
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}
