/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! A Chip-8 virtual machine.
//!
//! The `Interpreter` owns the whole machine state (memory, registers, call
//! stack, display, keypad and timers).  A front-end drives it by calling
//! `step` at whatever instruction rate it likes and `tick` at 60 Hz.

#[macro_use]
extern crate enum_primitive;
extern crate failure;
#[macro_use]
extern crate failure_derive;
#[macro_use]
extern crate log;
extern crate num;
extern crate rand;
extern crate time;

/// The size of the Chip-8's memory, in bytes.
pub const MEM_SIZE: usize = 0x1000;
/// The address where programs should be loaded.
pub const PROG_START: usize = 0x200;
/// The maximum size of a Chip-8 program, in bytes.
pub const PROG_SIZE: usize = MEM_SIZE - PROG_START;
/// The address of the first built-in font sprite.
pub const FONT_START: usize = 0x0;
/// The address just past the last built-in font sprite.
pub const FONT_END: usize = FONT_START + 16 * display::FONT_HEIGHT;
/// The maximum depth of the call stack.
pub const STACK_DEPTH: usize = 16;

pub mod display;
pub mod error;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod memory;
pub mod random;
pub mod stack;
pub mod timer;

pub use error::VmError;
pub use instruction::{Instruction, Opcode, Register};
pub use interpreter::{Interpreter, Options};
