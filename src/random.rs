/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! Sources of random bytes for the `RND` instruction.

use rand::{self, Rng, SeedableRng, ThreadRng, XorShiftRng};

/// Something that can produce random bytes.
pub trait RandomSource {
    /// Returns the next byte.
    fn next_byte(&mut self) -> u8;
}

/// Random bytes from the thread-local generator.
pub struct ThreadRandom(ThreadRng);

impl ThreadRandom {
    pub fn new() -> Self {
        ThreadRandom(rand::thread_rng())
    }
}

impl RandomSource for ThreadRandom {
    fn next_byte(&mut self) -> u8 {
        self.0.gen()
    }
}

/// A reproducible stream of random bytes.
pub struct SeededRandom(XorShiftRng);

impl SeededRandom {
    /// Returns a generator for the given seed.
    ///
    /// Equal seeds give equal streams.
    pub fn new(seed: u32) -> Self {
        // The generator rejects an all-zero seed, so the constant words make
        // sure there is always a set bit.
        SeededRandom(XorShiftRng::from_seed([seed, 0x193A_6754, 0xA8A7_D469, 0x9783_0E05]))
    }
}

impl RandomSource for SeededRandom {
    fn next_byte(&mut self) -> u8 {
        self.0.gen()
    }
}

/// Replays a fixed sequence of bytes, starting over once it runs out.
#[derive(Debug, Clone)]
pub struct Sequence {
    bytes: Vec<u8>,
    pos: usize,
}

impl Sequence {
    /// Returns a source that replays `bytes`.  An empty sequence always
    /// yields zero.
    pub fn new(bytes: &[u8]) -> Self {
        Sequence {
            bytes: bytes.to_vec(),
            pos: 0,
        }
    }
}

impl RandomSource for Sequence {
    fn next_byte(&mut self) -> u8 {
        if self.bytes.is_empty() {
            return 0;
        }
        let b = self.bytes[self.pos];
        self.pos = (self.pos + 1) % self.bytes.len();
        b
    }
}
