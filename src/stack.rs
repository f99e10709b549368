/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! The call stack.

use STACK_DEPTH;
use error::VmError;

/// A fixed-depth stack of return addresses.
///
/// Unlike a `Vec`, this never grows: pushing onto a full stack (or popping
/// from an empty one) fails and leaves the stack as it was.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallStack {
    entries: [u16; STACK_DEPTH],
    depth: usize,
}

impl CallStack {
    /// Returns an empty call stack.
    pub fn new() -> Self {
        CallStack::default()
    }

    /// Pushes the address of a `CALL`, failing with `StackOverflow` if the
    /// stack is full.
    pub fn push(&mut self, addr: u16) -> Result<(), VmError> {
        if self.depth == STACK_DEPTH {
            return Err(VmError::StackOverflow { pc: addr });
        }
        self.entries[self.depth] = addr;
        self.depth += 1;
        Ok(())
    }

    /// Pops the most recently pushed address.
    ///
    /// `pc` is the address of the `RET` doing the popping; it is reported in
    /// the `StackUnderflow` error if the stack is empty.
    pub fn pop(&mut self, pc: u16) -> Result<u16, VmError> {
        if self.depth == 0 {
            return Err(VmError::StackUnderflow { pc });
        }
        self.depth -= 1;
        Ok(self.entries[self.depth])
    }

    /// Returns the number of addresses on the stack.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the addresses on the stack, oldest first.
    pub fn entries(&self) -> &[u16] {
        &self.entries[..self.depth]
    }

    /// Empties the stack.
    pub fn clear(&mut self) {
        *self = CallStack::default();
    }
}
