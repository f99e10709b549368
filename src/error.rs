/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! Errors reported by the virtual machine.
//!
//! None of these are fatal from the machine's point of view: the operation
//! that detects one refuses to do anything and hands it back to the caller,
//! which can then decide whether to log it, halt, or carry on.

use PROG_SIZE;
use instruction::Opcode;

/// An error detected while loading or running a program.
#[derive(Debug, Fail, Clone, PartialEq, Eq)]
pub enum VmError {
    /// The program image does not fit in memory.
    #[fail(display = "program is too large: {} bytes (maximum is {})", size, max)]
    LoadTooLarge { size: usize, max: usize },
    /// A subroutine call would exceed the maximum stack depth.
    #[fail(display = "stack overflow in call at {:#05X}", pc)]
    StackOverflow { pc: u16 },
    /// A return was attempted outside of any subroutine.
    #[fail(display = "no subroutine to return from at {:#05X}", pc)]
    StackUnderflow { pc: u16 },
    /// The fetched opcode does not correspond to any instruction.
    #[fail(display = "unknown opcode: {}", _0)]
    UnknownOpcode(Opcode),
    /// A memory access fell outside of the addressable range.
    #[fail(display = "address out of bounds: {:#05X}", _0)]
    AddressOutOfBounds(usize),
    /// A write targeted the built-in font area.
    #[fail(display = "address is read-only: {:#05X}", _0)]
    ReadOnlyAddress(usize),
    /// A key code outside of `0x0`-`0xF` was given.
    #[fail(display = "invalid key code: {:#04X}", _0)]
    InvalidKey(u8),
}

impl VmError {
    /// Returns the error for a program of the given size.
    pub fn too_large(size: usize) -> Self {
        VmError::LoadTooLarge {
            size,
            max: PROG_SIZE,
        }
    }
}
