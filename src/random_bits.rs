/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

use crate::flate_error::Result;

/// Number of random bytes drawn per seeding. Must be a power of two since the seed is
/// tiled over the whole table.
pub const RNG_SEED_BYTES: usize = 4;

/// Cheap stream of coin flips used to break ties between equally good matches and to
/// perturb the parse. The bits are only meant to vary the output between runs, they are
/// not suitable for anything where unpredictability matters.
#[derive(Clone)]
pub struct RandomBits {
    table: [u8; 256],
    pos: u8,
    bit: u8,
}

impl std::fmt::Debug for RandomBits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RandomBits {{ pos: {}, bit: {} }}", self.pos, self.bit)
    }
}

impl RandomBits {
    pub fn from_seed(seed: [u8; RNG_SEED_BYTES]) -> Self {
        let mut r = RandomBits {
            table: [0; 256],
            pos: 0,
            bit: 0,
        };
        r.reseed(seed);
        r
    }

    pub fn reseed(&mut self, seed: [u8; RNG_SEED_BYTES]) {
        for (i, v) in self.table.iter_mut().enumerate() {
            *v = seed[i & (RNG_SEED_BYTES - 1)];
        }
        self.pos = 0;
        self.bit = 0;
    }

    #[inline(always)]
    pub fn next_bit(&mut self) -> bool {
        let b = (self.table[usize::from(self.pos)] >> self.bit) & 1;
        self.bit += 1;
        if self.bit >= 8 {
            self.bit = 0;
            self.pos = self.pos.wrapping_add(1);
        }
        b != 0
    }
}

/// draws a seed from the operating system. Failure is returned to the caller rather than
/// falling back to some fixed seed.
pub fn os_seed() -> Result<[u8; RNG_SEED_BYTES]> {
    let mut seed = [0u8; RNG_SEED_BYTES];
    getrandom::getrandom(&mut seed)?;
    Ok(seed)
}
