/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! The Chip-8's main memory.
//!
//! All accesses are bounds-checked; an access that falls (even partly)
//! outside of memory is rejected as a whole rather than wrapped or
//! truncated.  The font sprites at the bottom of memory can only be written
//! by `reset`.

use std::fmt;

use FONT_END;
use FONT_START;
use MEM_SIZE;
use PROG_SIZE;
use PROG_START;
use display::{FONT_HEIGHT, FONT_SPRITES};
use error::VmError;
use instruction::Opcode;

/// The Chip-8's 4 KiB of memory.
pub struct Memory {
    bytes: [u8; MEM_SIZE],
}

impl Memory {
    /// Returns a freshly reset memory.
    pub fn new() -> Self {
        let mut mem = Memory {
            bytes: [0; MEM_SIZE],
        };
        mem.reset();
        mem
    }

    /// Zeroes all of memory and copies the font sprites into place.
    pub(crate) fn reset(&mut self) {
        self.bytes = [0; MEM_SIZE];
        for (i, sprite) in FONT_SPRITES.iter().enumerate() {
            let start = FONT_START + i * FONT_HEIGHT;
            self.bytes[start..start + FONT_HEIGHT].copy_from_slice(sprite);
        }
    }

    /// Copies a program image into memory at `PROG_START`.
    ///
    /// Nothing is written if the program is too large.
    pub(crate) fn load_program(&mut self, program: &[u8]) -> Result<(), VmError> {
        if program.len() > PROG_SIZE {
            return Err(VmError::too_large(program.len()));
        }
        self.bytes[PROG_START..PROG_START + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Returns the whole of memory.
    pub fn bytes(&self) -> &[u8; MEM_SIZE] {
        &self.bytes
    }

    /// Returns `len` bytes starting at `addr`.
    pub fn slice(&self, addr: usize, len: usize) -> Result<&[u8], VmError> {
        check_range(addr, len)?;
        Ok(&self.bytes[addr..addr + len])
    }

    /// Returns the big-endian opcode at the given address.
    pub fn opcode(&self, addr: usize) -> Result<Opcode, VmError> {
        let word = self.slice(addr, 2)?;
        Ok(Opcode::from_bytes(word[0], word[1]))
    }

    /// Writes `data` to memory starting at `addr`.
    ///
    /// Either all of `data` is written or none of it is.
    pub fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), VmError> {
        check_range(addr, data.len())?;
        if addr < FONT_END && !data.is_empty() {
            return Err(VmError::ReadOnlyAddress(addr));
        }
        self.bytes[addr..addr + data.len()].copy_from_slice(data);
        Ok(())
    }
}

impl Default for Memory {
    fn default() -> Self {
        Memory::new()
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let used = self.bytes[PROG_START..]
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |i| i + 1);
        write!(f, "Memory {{ program: {} bytes }}", used)
    }
}

/// Checks that `len` bytes starting at `addr` are all addressable.
fn check_range(addr: usize, len: usize) -> Result<(), VmError> {
    match addr.checked_add(len) {
        Some(end) if end <= MEM_SIZE => Ok(()),
        _ => Err(VmError::AddressOutOfBounds(addr.saturating_add(len) - 1)),
    }
}
