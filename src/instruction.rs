// Copyright 2018 Ian Johnson

// This file is part of Chip-8.

// Chip-8 is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Chip-8 is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Chip-8.  If not, see <http://www.gnu.org/licenses/>.

//! Chip-8 instructions and opcodes.
//!
//! An `Opcode` is a raw instruction word together with accessors for each of
//! its fields; decoding it never fails.  `Instruction::from_opcode` is the
//! dispatch table which maps those fields onto the typed `Instruction` that
//! the interpreter actually executes, and it is the only place where an
//! opcode can turn out to be unknown.

use std::fmt;

use num::FromPrimitive;

use error::VmError;

enum_from_primitive! {
/// A Chip-8 register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    V0 = 0,
    V1,
    V2,
    V3,
    V4,
    V5,
    V6,
    V7,
    V8,
    V9,
    VA,
    VB,
    VC,
    VD,
    VE,
    VF,
}
}

impl Register {
    /// Returns the register numbered by the lowest four bits of `n`.
    pub fn from_nibble(n: u8) -> Register {
        // Every 4-bit value names a register.
        Register::from_u8(n & 0xF).unwrap()
    }

    /// Returns the registers `V0` through `self`, inclusive.
    pub fn up_to(self) -> impl Iterator<Item = Register> {
        (0..self as u8 + 1).map(Register::from_nibble)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", *self)
    }
}

/// A Chip-8 opcode.
///
/// Having this as a wrapper around an ordinary `u16` allows for some nice
/// helper methods to be implemented, which make decoding opcodes much easier.
/// None of the accessors guarantee that the result is actually meaningful for
/// the instruction in question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode(pub u16);

impl Opcode {
    /// Assembles an opcode from its big-endian bytes.
    pub fn from_bytes(high: u8, low: u8) -> Self {
        Opcode((high as u16) << 8 | low as u16)
    }

    /// The top nibble, which selects the kind of operation.
    pub fn operation(&self) -> u8 {
        (self.0 >> 12) as u8
    }

    /// The low 12 bits (`nnn`), an address or literal.
    pub fn nnn(&self) -> u16 {
        self.0 & 0xFFF
    }

    /// The low byte (`nn`).
    pub fn nn(&self) -> u8 {
        self.0 as u8
    }

    /// The low nibble (`n`).
    pub fn n(&self) -> u8 {
        self.0 as u8 & 0xF
    }

    /// The register index in bits 8-11 (`x`).
    pub fn x(&self) -> u8 {
        ((self.0 & 0x0F00) >> 8) as u8
    }

    /// The register index in bits 4-7 (`y`).
    pub fn y(&self) -> u8 {
        ((self.0 & 0x00F0) >> 4) as u8
    }

    /// Returns the `Vx` register corresponding to this opcode.
    pub fn vx(&self) -> Register {
        Register::from_nibble(self.x())
    }

    /// Returns the `Vy` register corresponding to this opcode.
    pub fn vy(&self) -> Register {
        Register::from_nibble(self.y())
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{:04X}", self.0)
    }
}

/// A Chip-8 instruction.
///
/// Only the base Chip-8 instruction set is represented.  Mnemonics follow
/// Cowgod's reference and are used when tracing execution.
///
/// # Examples
///
/// ```
/// use chip8vm::{Instruction, Opcode, Register};
///
/// let instr = Instruction::from_opcode(Opcode(0x7510)).unwrap();
/// assert_eq!(instr, Instruction::AddByte(Register::V5, 0x10));
/// assert!(Instruction::from_opcode(Opcode(0x5121)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `CLS` (`00E0`).
    Cls,
    /// `RET` (`00EE`).
    Ret,
    /// `JP addr` (`1nnn`).
    Jp(u16),
    /// `CALL addr` (`2nnn`).
    Call(u16),
    /// `SE Vx, byte` (`3xkk`).
    SeByte(Register, u8),
    /// `SNE Vx, byte` (`4xkk`).
    SneByte(Register, u8),
    /// `SE Vx, Vy` (`5xy0`).
    SeReg(Register, Register),
    /// `LD Vx, byte` (`6xkk`).
    LdByte(Register, u8),
    /// `ADD Vx, byte` (`7xkk`).
    AddByte(Register, u8),
    /// `LD Vx, Vy` (`8xy0`).
    LdReg(Register, Register),
    /// `OR Vx, Vy` (`8xy1`).
    Or(Register, Register),
    /// `AND Vx, Vy` (`8xy2`).
    And(Register, Register),
    /// `XOR Vx, Vy` (`8xy3`).
    Xor(Register, Register),
    /// `ADD Vx, Vy` (`8xy4`).
    AddReg(Register, Register),
    /// `SUB Vx, Vy` (`8xy5`).
    Sub(Register, Register),
    /// `SHR Vx` (`8xy6`); `Vy` is ignored.
    Shr(Register),
    /// `SUBN Vx, Vy` (`8xy7`).
    Subn(Register, Register),
    /// `SHL Vx` (`8xyE`); `Vy` is ignored.
    Shl(Register),
    /// `SNE Vx, Vy` (`9xy0`).
    SneReg(Register, Register),
    /// `LD I, addr` (`Annn`).
    LdI(u16),
    /// `JP V0, addr` (`Bnnn`).
    JpV0(u16),
    /// `RND Vx, byte` (`Cxkk`).
    Rnd(Register, u8),
    /// `DRW Vx, Vy, nibble` (`Dxyn`).
    Drw(Register, Register, u8),
    /// `SKP Vx` (`Ex9E`).
    Skp(Register),
    /// `SKNP Vx` (`ExA1`).
    Sknp(Register),
    /// `LD Vx, DT` (`Fx07`).
    LdRegDt(Register),
    /// `LD Vx, K` (`Fx0A`).
    LdKey(Register),
    /// `LD DT, Vx` (`Fx15`).
    LdDtReg(Register),
    /// `LD ST, Vx` (`Fx18`).
    LdSt(Register),
    /// `ADD I, Vx` (`Fx1E`).
    AddI(Register),
    /// `LD F, Vx` (`Fx29`).
    LdF(Register),
    /// `LD B, Vx` (`Fx33`).
    LdB(Register),
    /// `LD [I], Vx` (`Fx55`).
    LdDerefIReg(Register),
    /// `LD Vx, [I]` (`Fx65`).
    LdRegDerefI(Register),
}

impl Instruction {
    /// Returns the instruction corresponding to the given opcode, or
    /// `VmError::UnknownOpcode` if there is none.
    pub fn from_opcode(opcode: Opcode) -> Result<Self, VmError> {
        use self::Instruction::*;

        let unknown = VmError::UnknownOpcode(opcode);
        let (x, y) = (opcode.vx(), opcode.vy());

        Ok(match opcode.operation() {
            0x0 => match opcode.0 {
                0x00E0 => Cls,
                0x00EE => Ret,
                _ => return Err(unknown),
            },
            0x1 => Jp(opcode.nnn()),
            0x2 => Call(opcode.nnn()),
            0x3 => SeByte(x, opcode.nn()),
            0x4 => SneByte(x, opcode.nn()),
            0x5 if opcode.n() == 0 => SeReg(x, y),
            0x6 => LdByte(x, opcode.nn()),
            0x7 => AddByte(x, opcode.nn()),
            0x8 => match opcode.n() {
                0x0 => LdReg(x, y),
                0x1 => Or(x, y),
                0x2 => And(x, y),
                0x3 => Xor(x, y),
                0x4 => AddReg(x, y),
                0x5 => Sub(x, y),
                0x6 => Shr(x),
                0x7 => Subn(x, y),
                0xE => Shl(x),
                _ => return Err(unknown),
            },
            0x9 if opcode.n() == 0 => SneReg(x, y),
            0xA => LdI(opcode.nnn()),
            0xB => JpV0(opcode.nnn()),
            0xC => Rnd(x, opcode.nn()),
            0xD => Drw(x, y, opcode.n()),
            0xE => match opcode.nn() {
                0x9E => Skp(x),
                0xA1 => Sknp(x),
                _ => return Err(unknown),
            },
            0xF => match opcode.nn() {
                0x07 => LdRegDt(x),
                0x0A => LdKey(x),
                0x15 => LdDtReg(x),
                0x18 => LdSt(x),
                0x1E => AddI(x),
                0x29 => LdF(x),
                0x33 => LdB(x),
                0x55 => LdDerefIReg(x),
                0x65 => LdRegDerefI(x),
                _ => return Err(unknown),
            },
            _ => return Err(unknown),
        })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::Instruction::*;

        match *self {
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Jp(addr) => write!(f, "JP {:#05X}", addr),
            Call(addr) => write!(f, "CALL {:#05X}", addr),
            SeByte(reg, b) => write!(f, "SE {}, #{:02X}", reg, b),
            SneByte(reg, b) => write!(f, "SNE {}, #{:02X}", reg, b),
            SeReg(reg1, reg2) => write!(f, "SE {}, {}", reg1, reg2),
            LdByte(reg, b) => write!(f, "LD {}, #{:02X}", reg, b),
            AddByte(reg, b) => write!(f, "ADD {}, #{:02X}", reg, b),
            LdReg(reg1, reg2) => write!(f, "LD {}, {}", reg1, reg2),
            Or(reg1, reg2) => write!(f, "OR {}, {}", reg1, reg2),
            And(reg1, reg2) => write!(f, "AND {}, {}", reg1, reg2),
            Xor(reg1, reg2) => write!(f, "XOR {}, {}", reg1, reg2),
            AddReg(reg1, reg2) => write!(f, "ADD {}, {}", reg1, reg2),
            Sub(reg1, reg2) => write!(f, "SUB {}, {}", reg1, reg2),
            Shr(reg) => write!(f, "SHR {}", reg),
            Subn(reg1, reg2) => write!(f, "SUBN {}, {}", reg1, reg2),
            Shl(reg) => write!(f, "SHL {}", reg),
            SneReg(reg1, reg2) => write!(f, "SNE {}, {}", reg1, reg2),
            LdI(addr) => write!(f, "LD I, {:#05X}", addr),
            JpV0(addr) => write!(f, "JP V0, {:#05X}", addr),
            Rnd(reg, b) => write!(f, "RND {}, #{:02X}", reg, b),
            Drw(reg1, reg2, n) => write!(f, "DRW {}, {}, {}", reg1, reg2, n),
            Skp(reg) => write!(f, "SKP {}", reg),
            Sknp(reg) => write!(f, "SKNP {}", reg),
            LdRegDt(reg) => write!(f, "LD {}, DT", reg),
            LdKey(reg) => write!(f, "LD {}, K", reg),
            LdDtReg(reg) => write!(f, "LD DT, {}", reg),
            LdSt(reg) => write!(f, "LD ST, {}", reg),
            AddI(reg) => write!(f, "ADD I, {}", reg),
            LdF(reg) => write!(f, "LD F, {}", reg),
            LdB(reg) => write!(f, "LD B, {}", reg),
            LdDerefIReg(reg) => write!(f, "LD [I], {}", reg),
            LdRegDerefI(reg) => write!(f, "LD {}, [I]", reg),
        }
    }
}
