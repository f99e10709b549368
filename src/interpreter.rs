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

//! The Chip-8 interpreter.
//!
//! The main focus of this module is the `Interpreter` struct, which contains
//! the state of a Chip-8 machine and provides the main interface to be used
//! by the front-end.  The interpreter has no notion of time: the front-end
//! calls `step` once per instruction, at whatever rate it likes, and `tick`
//! at 60 Hz to count the timers down.
//!
//! Every instruction is carried out in two halves.  The instruction itself
//! mutates registers, memory and so on, and says how the program counter
//! should move (a `Flow`); `execute` then applies that movement.  An
//! instruction which fails does so before changing anything, so the
//! program counter is left pointing at it.

use std::default::Default;
use std::io::Read;

use failure::Error;

use FONT_START;
use MEM_SIZE;
use PROG_START;
use display::{self, FONT_HEIGHT};
use error::VmError;
use input::{self, Key};
use instruction::{Instruction, Opcode, Register};
use memory::Memory;
use random::{RandomSource, SeededRandom, Sequence, ThreadRandom};
use stack::CallStack;
use timer::Timers;

/// The address at which execution starts.
const START_PC: u16 = PROG_START as u16;

/// Options for the interpreter.
pub struct Options {
    /// Where `RND` gets its random bytes from (default: the thread-local
    /// generator).
    pub random: Box<dyn RandomSource>,
}

impl Options {
    /// Returns the default set of options.
    pub fn new() -> Self {
        Options {
            random: Box::new(ThreadRandom::new()),
        }
    }

    /// Returns a set of options whose random bytes are determined by `seed`.
    pub fn seeded(seed: u32) -> Self {
        Options {
            random: Box::new(SeededRandom::new(seed)),
        }
    }

    /// Returns a set of options useful for testing, where `RND` replays the
    /// given bytes.
    pub fn testing(random: &[u8]) -> Self {
        Options {
            random: Box::new(Sequence::new(random)),
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Options::new()
    }
}

/// How the program counter moves once an instruction has executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Go on to the following instruction.
    Next,
    /// Skip the following instruction.
    Skip,
    /// Continue at the given address.
    Jump(u16),
    /// Stay put, so that the same instruction runs again.
    Stall,
}

impl Flow {
    /// Returns a skip if `cond` holds.
    fn skip_if(cond: bool) -> Flow {
        if cond {
            Flow::Skip
        } else {
            Flow::Next
        }
    }
}

/// A Chip-8 interpreter.
///
/// This struct contains the entire state of a Chip-8 machine and provides
/// all the expected methods for interacting with it, such as stepping
/// through execution and inspecting the internal state.
pub struct Interpreter {
    /// The internal memory.
    mem: Memory,
    /// The display buffer.
    display: display::Buffer,
    /// The input state.
    input: input::State,
    /// The general-purpose registers `V0`-`VF`.
    regs: [u8; 16],
    /// The special register `I`.
    reg_i: u16,
    /// The delay and sound timers.
    timers: Timers,
    /// The program counter.
    pc: u16,
    /// The call stack (for returning from subroutines).
    call_stack: CallStack,
    /// The source of random bytes for `RND`.
    random: Box<dyn RandomSource>,
}

impl Interpreter {
    /// Returns a new interpreter with the default options.
    pub fn new() -> Self {
        Interpreter::with_options(Options::default())
    }

    /// Returns a new interpreter using the given options.
    pub fn with_options(options: Options) -> Self {
        Interpreter {
            mem: Memory::new(),
            display: display::Buffer::new(),
            input: input::State::new(),
            regs: [0; 16],
            reg_i: 0,
            timers: Timers::new(),
            pc: START_PC,
            call_stack: CallStack::new(),
            random: options.random,
        }
    }

    /// Resets the whole machine, as if it had just been created.
    ///
    /// Memory is cleared apart from the font sprites, so a program has to be
    /// loaded again afterwards.  The random source is kept.
    pub fn initialize(&mut self) {
        self.mem.reset();
        self.display = display::Buffer::new();
        self.input = input::State::new();
        self.regs = [0; 16];
        self.reg_i = 0;
        self.timers = Timers::new();
        self.pc = START_PC;
        self.call_stack.clear();
        debug!("machine reset");
    }

    /// Copies the given program into memory at the program start address.
    ///
    /// A program which doesn't fit is rejected and nothing is written.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), VmError> {
        self.mem.load_program(program)?;
        debug!("loaded program of {} bytes", program.len());
        Ok(())
    }

    /// Loads program data from the specified source.
    pub fn load_rom<R: Read>(&mut self, input: &mut R) -> Result<(), Error> {
        let mut program = Vec::new();
        input.read_to_end(&mut program)?;
        self.load_program(&program)?;
        Ok(())
    }

    /// Returns a reference to the display buffer.
    pub fn display(&self) -> &display::Buffer {
        &self.display
    }

    /// Returns a mutable reference to the display buffer.
    pub fn display_mut(&mut self) -> &mut display::Buffer {
        &mut self.display
    }

    /// Sets the state of the key with the given code (`0x0`-`0xF`).
    pub fn set_key(&mut self, code: u8, pressed: bool) -> Result<(), VmError> {
        self.input.set_key(code, pressed)
    }

    /// Returns whether the interpreter is blocked on an `LD Vx, K`.
    pub fn waiting_for_key(&self) -> bool {
        self.input.waiting()
    }

    /// Returns a reference to the internal memory.
    pub fn mem(&self) -> &[u8; MEM_SIZE] {
        self.mem.bytes()
    }

    /// Returns a mutable reference to the internal memory.
    ///
    /// Only `Memory::write` is available through this; resetting memory and
    /// loading programs go through `initialize` and `load_program`.
    ///
    /// ```compile_fail
    /// let mut interpreter = chip8vm::Interpreter::new();
    /// interpreter.memory_mut().reset();
    /// ```
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.mem
    }

    /// Returns the value of register `I`.
    pub fn i(&self) -> u16 {
        self.reg_i
    }

    /// Sets the value of register `I`.
    pub fn set_i(&mut self, val: u16) {
        self.reg_i = val;
    }

    /// Returns the value of the delay timer.
    pub fn dt(&self) -> u8 {
        self.timers.delay
    }

    /// Returns the value of the sound timer.
    pub fn st(&self) -> u8 {
        self.timers.sound
    }

    /// Returns whether the buzzer should be sounding.
    pub fn sound_active(&self) -> bool {
        self.timers.sound > 0
    }

    /// Counts the delay and sound timers down by one.
    ///
    /// This should be called at 60 Hz, independently of `step`.
    pub fn tick(&mut self) {
        self.timers.tick();
    }

    /// Returns the value in the given register.
    pub fn register(&self, reg: Register) -> u8 {
        self.regs[reg as usize]
    }

    /// Sets the given register to the given value.
    pub fn set_register(&mut self, reg: Register, val: u8) {
        self.regs[reg as usize] = val
    }

    /// Returns the value of the program counter.
    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Returns the call stack.
    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    /// Returns the opcode at the program counter.
    pub fn current_opcode(&self) -> Result<Opcode, VmError> {
        self.mem.opcode(self.pc as usize)
    }

    /// Returns the instruction at the program counter.
    pub fn current_instruction(&self) -> Result<Instruction, VmError> {
        Instruction::from_opcode(self.current_opcode()?)
    }

    /// Performs a single execution step.
    ///
    /// On error, the machine is left exactly as it was.
    pub fn step(&mut self) -> Result<(), VmError> {
        let instr = self.current_instruction()?;
        trace!("{:#05X}: {}", self.pc, instr);
        self.execute(instr)
    }

    /// Executes the given instruction in the current interpreter context.
    ///
    /// The interpreter will behave as if the given instruction were executed
    /// at the current program location in memory.
    pub fn execute(&mut self, ins: Instruction) -> Result<(), VmError> {
        match self.run(ins)? {
            Flow::Next => self.pc = self.pc.wrapping_add(2),
            Flow::Skip => self.pc = self.pc.wrapping_add(4),
            Flow::Jump(addr) => self.pc = addr,
            Flow::Stall => {}
        }
        Ok(())
    }

    /// Carries out everything but the program counter update for `ins`.
    fn run(&mut self, ins: Instruction) -> Result<Flow, VmError> {
        use self::Instruction::*;

        Ok(match ins {
            Cls => {
                self.display.clear();
                Flow::Next
            }
            Ret => {
                let addr = self.call_stack.pop(self.pc)?;
                // Resume after the CALL.
                Flow::Jump(addr.wrapping_add(2))
            }
            Jp(addr) => Flow::Jump(addr),
            Call(addr) => {
                self.call_stack.push(self.pc)?;
                Flow::Jump(addr)
            }
            SeByte(reg, b) => Flow::skip_if(self.register(reg) == b),
            SneByte(reg, b) => Flow::skip_if(self.register(reg) != b),
            SeReg(reg1, reg2) => Flow::skip_if(self.register(reg1) == self.register(reg2)),
            LdByte(reg, b) => {
                self.set_register(reg, b);
                Flow::Next
            }
            AddByte(reg, b) => {
                let r = self.register(reg);
                self.set_register(reg, r.wrapping_add(b));
                Flow::Next
            }
            LdReg(reg1, reg2) => {
                let r2 = self.register(reg2);
                self.set_register(reg1, r2);
                Flow::Next
            }
            Or(reg1, reg2) => self.logic(reg1, reg2, |a, b| a | b),
            And(reg1, reg2) => self.logic(reg1, reg2, |a, b| a & b),
            Xor(reg1, reg2) => self.logic(reg1, reg2, |a, b| a ^ b),
            AddReg(reg1, reg2) => {
                let (r1, r2) = (self.register(reg1), self.register(reg2));
                let (sum, carry) = r1.overflowing_add(r2);
                self.set_with_flag(reg1, sum, carry)
            }
            Sub(reg1, reg2) => {
                let (r1, r2) = (self.register(reg1), self.register(reg2));
                self.set_with_flag(reg1, r1.wrapping_sub(r2), r1 >= r2)
            }
            Shr(reg) => {
                let r = self.register(reg);
                self.set_with_flag(reg, r >> 1, r & 1 != 0)
            }
            Subn(reg1, reg2) => {
                let (r1, r2) = (self.register(reg1), self.register(reg2));
                self.set_with_flag(reg1, r2.wrapping_sub(r1), r2 >= r1)
            }
            Shl(reg) => {
                let r = self.register(reg);
                self.set_with_flag(reg, r << 1, r & 0x80 != 0)
            }
            SneReg(reg1, reg2) => Flow::skip_if(self.register(reg1) != self.register(reg2)),
            LdI(addr) => {
                self.reg_i = addr;
                Flow::Next
            }
            JpV0(addr) => Flow::Jump(addr + self.register(Register::V0) as u16),
            Rnd(reg, b) => {
                let r = self.random.next_byte();
                self.set_register(reg, r & b);
                Flow::Next
            }
            Drw(reg1, reg2, n) => self.drw(reg1, reg2, n)?,
            Skp(reg) => Flow::skip_if(self.key_pressed(reg) == Some(true)),
            Sknp(reg) => Flow::skip_if(self.key_pressed(reg) == Some(false)),
            LdRegDt(reg) => {
                let dt = self.timers.delay;
                self.set_register(reg, dt);
                Flow::Next
            }
            LdKey(reg) => match self.input.poll_wait() {
                Some(key) => {
                    self.set_register(reg, key as u8);
                    Flow::Next
                }
                None => Flow::Stall,
            },
            LdDtReg(reg) => {
                self.timers.delay = self.register(reg);
                Flow::Next
            }
            LdSt(reg) => {
                self.timers.sound = self.register(reg);
                Flow::Next
            }
            AddI(reg) => {
                self.reg_i = self.reg_i.wrapping_add(self.register(reg) as u16);
                Flow::Next
            }
            LdF(reg) => {
                let digit = (self.register(reg) & 0xF) as usize;
                self.reg_i = (FONT_START + FONT_HEIGHT * digit) as u16;
                Flow::Next
            }
            LdB(reg) => {
                let val = self.register(reg);
                let digits = [val / 100, val / 10 % 10, val % 10];
                self.mem.write(self.reg_i as usize, &digits)?;
                Flow::Next
            }
            LdDerefIReg(reg) => {
                let n = reg as usize + 1;
                self.mem.write(self.reg_i as usize, &self.regs[..n])?;
                Flow::Next
            }
            LdRegDerefI(reg) => {
                let n = reg as usize + 1;
                let data = self.mem.slice(self.reg_i as usize, n)?;
                self.regs[..n].copy_from_slice(data);
                Flow::Next
            }
        })
    }

    /// Sets `reg1` to `op(reg1, reg2)`.
    fn logic<F>(&mut self, reg1: Register, reg2: Register, op: F) -> Flow
    where
        F: FnOnce(u8, u8) -> u8,
    {
        let (r1, r2) = (self.register(reg1), self.register(reg2));
        self.set_register(reg1, op(r1, r2));
        Flow::Next
    }

    /// Sets `reg` to `val` and then `VF` to `flag`, so the flag wins when
    /// `reg` is `VF`.
    fn set_with_flag(&mut self, reg: Register, val: u8, flag: bool) -> Flow {
        self.set_register(reg, val);
        self.set_register(Register::VF, flag as u8);
        Flow::Next
    }

    /// Returns whether the key named by `reg` is pressed, or `None` if the
    /// register doesn't hold a key code.
    fn key_pressed(&self, reg: Register) -> Option<bool> {
        let code = self.register(reg);
        match Key::from_code(code) {
            Some(key) => Some(self.input.is_pressed(key)),
            None => {
                warn!("{} holds {:#04X}, which is not a key; not skipping", reg, code);
                None
            }
        }
    }

    /// Implements the `DRW` operation.
    fn drw(&mut self, reg1: Register, reg2: Register, n: u8) -> Result<Flow, VmError> {
        let x = self.register(reg1) as usize;
        let y = self.register(reg2) as usize;
        let sprite = self.mem.slice(self.reg_i as usize, n as usize)?;

        let collision = self.display.draw_sprite(sprite, x, y);
        self.set_register(Register::VF, collision as u8);
        Ok(Flow::Next)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::u8;

    use PROG_SIZE;
    use instruction::Instruction;
    use interpreter::{Interpreter, Options};
    use error::VmError;
    use Register;

    fn interpreter() -> Interpreter {
        Interpreter::with_options(Options::testing(&[]))
    }

    /// Tests the `ADD` operation (both `ADD Vx, byte` and `ADD Vx, Vy`).
    #[test]
    fn instruction_add() {
        use Register::*;

        // Test cases, in the format (Vx, Vy, b1, b2).
        let cases = [
            (V0, V1, 24u8, 67u8),
            (V5, VD, 54u8, 102u8),
            (V7, VE, 255u8, 255u8),
            (V2, V4, 1u8, 255u8),
            (V5, V6, 0u8, 78u8),
            (V3, V9, 0xFF, 0x01),
            (V3, V9, 0x01, 0x01),
        ];
        let mut interpreter = interpreter();

        for &(vx, vy, b1, b2) in cases.iter() {
            let case = (vx, vy, b1, b2);
            let sum = b1.wrapping_add(b2);
            let carry = b1 as u32 + b2 as u32 > u8::MAX as u32;

            // Test `ADD Vx, byte`, which leaves `VF` alone.
            interpreter.set_register(VF, 0x55);
            interpreter.set_register(vx, b1);
            interpreter.execute(Instruction::AddByte(vx, b2)).unwrap();
            assert_eq!(interpreter.register(vx), sum, "case {:?}", case);
            assert_eq!(interpreter.register(VF), 0x55, "case {:?}", case);

            // Test `ADD Vx, Vy`.
            interpreter.set_register(vx, b1);
            interpreter.set_register(vy, b2);
            interpreter.execute(Instruction::AddReg(vx, vy)).unwrap();
            assert_eq!(interpreter.register(vx), sum, "case {:?}", case);
            assert_eq!(interpreter.register(VF), carry as u8, "case {:?}", case);
        }
    }

    /// Tests the `AND`, `OR` and `XOR` operations.
    #[test]
    fn instruction_bitwise() {
        use Register::*;

        // Test cases, in the format (Vx, Vy, b1, b2).
        let cases = [
            (V7, V2, 0x75, 0xF2),
            (V3, V8, 0x01, 0xFF),
            (VA, VE, 0x6A, 0x32),
            (VF, VC, 0x78, 0xFD),
            (V0, V1, 0xF0, 0x0F),
        ];
        let mut interpreter = interpreter();

        for &(vx, vy, b1, b2) in cases.iter() {
            let case = (vx, vy, b1, b2);

            interpreter.set_register(vx, b1);
            interpreter.set_register(vy, b2);
            interpreter.execute(Instruction::Or(vx, vy)).unwrap();
            assert_eq!(interpreter.register(vx), b1 | b2, "case {:?}", case);

            interpreter.set_register(vx, b1);
            interpreter.set_register(vy, b2);
            interpreter.execute(Instruction::And(vx, vy)).unwrap();
            assert_eq!(interpreter.register(vx), b1 & b2, "case {:?}", case);

            interpreter.set_register(vx, b1);
            interpreter.set_register(vy, b2);
            interpreter.execute(Instruction::Xor(vx, vy)).unwrap();
            assert_eq!(interpreter.register(vx), b1 ^ b2, "case {:?}", case);
        }
    }

    /// Tests the `LD B, Vx` operation.
    #[test]
    fn instruction_ld_b() {
        use Register::*;

        // Test cases, in the format (Vx, n1, n2, n3), where the three digits
        // to be stored are n1, n2 and n3 (in that order).
        let cases = [
            (V5, 1, 2, 3),
            (VD, 0, 0, 1),
            (VE, 1, 0, 0),
            (V2, 2, 5, 5),
            (V6, 0, 0, 0),
            (V8, 0, 6, 4),
            (V0, 2, 3, 4),
        ];
        let mut interpreter = interpreter();
        interpreter.set_i(0x300);

        for &(vx, n1, n2, n3) in cases.iter() {
            let case = (vx, n1, n2, n3);
            let n = 100 * n1 + 10 * n2 + n3;

            interpreter.set_register(vx, n);
            interpreter.execute(Instruction::LdB(vx)).unwrap();
            let i = interpreter.i() as usize;
            assert_eq!(interpreter.mem()[i], n1, "case {:?}", case);
            assert_eq!(interpreter.mem()[i + 1], n2, "case {:?}", case);
            assert_eq!(interpreter.mem()[i + 2], n3, "case {:?}", case);
        }
    }

    #[test]
    fn instruction_ld_b_out_of_bounds() {
        let mut interpreter = interpreter();
        interpreter.set_i(0xFFE);
        interpreter.set_register(Register::V1, 123);

        assert_eq!(
            interpreter.execute(Instruction::LdB(Register::V1)),
            Err(VmError::AddressOutOfBounds(0x1000))
        );
        assert_eq!(interpreter.mem()[0xFFE], 0);
        assert_eq!(interpreter.pc(), 0x200);
    }

    /// Tests the `SUB` and `SUBN` operations.
    #[test]
    fn instruction_sub() {
        use Register::*;

        // Test cases, in the format (Vx, Vy, b1, b2).
        let cases = [
            (V9, V8, 70u8, 35u8),
            (V6, V2, 56u8, 2u8),
            (V0, V1, 0u8, 0u8),
            (VE, VA, 255u8, 255u8),
            (V3, V7, 1u8, 255u8),
            (V3, V7, 0x05, 0x0A),
            (V3, V7, 0x0A, 0x05),
        ];
        let mut interpreter = interpreter();

        for &(vx, vy, b1, b2) in cases.iter() {
            let case = (vx, vy, b1, b2);
            let sub = b1.wrapping_sub(b2);
            let subn = b2.wrapping_sub(b1);
            let borrow = b2 > b1;
            let borrown = b1 > b2;

            // Test `SUB Vx, Vy`.
            interpreter.set_register(vx, b1);
            interpreter.set_register(vy, b2);
            interpreter.execute(Instruction::Sub(vx, vy)).unwrap();
            assert_eq!(interpreter.register(vx), sub, "case {:?}", case);
            assert_eq!(interpreter.register(VF), !borrow as u8, "case {:?}", case);

            // Test `SUBN Vx, Vy`.
            interpreter.set_register(vx, b1);
            interpreter.set_register(vy, b2);
            interpreter.execute(Instruction::Subn(vx, vy)).unwrap();
            assert_eq!(interpreter.register(vx), subn, "case {:?}", case);
            assert_eq!(interpreter.register(VF), !borrown as u8, "case {:?}", case);
        }
    }

    #[test]
    fn subtraction_examples() {
        use Register::*;
        let mut interpreter = interpreter();

        interpreter.set_register(V1, 0x05);
        interpreter.set_register(V2, 0x0A);
        interpreter.execute(Instruction::Sub(V1, V2)).unwrap();
        assert_eq!(interpreter.register(V1), 0xFB);
        assert_eq!(interpreter.register(VF), 0);

        interpreter.set_register(V1, 0x0A);
        interpreter.set_register(V2, 0x05);
        interpreter.execute(Instruction::Sub(V1, V2)).unwrap();
        assert_eq!(interpreter.register(V1), 0x05);
        assert_eq!(interpreter.register(VF), 1);
    }

    /// Tests `SHR` and `SHL`, which only ever look at `Vx`.
    #[test]
    fn instruction_shift() {
        use Register::*;
        let mut interpreter = interpreter();

        interpreter.set_register(V4, 0b1000_0001);
        interpreter.set_register(V5, 0b0111_1110);
        interpreter.execute(Instruction::from_opcode(::Opcode(0x8456)).unwrap()).unwrap();
        assert_eq!(interpreter.register(V4), 0b0100_0000);
        assert_eq!(interpreter.register(VF), 1);

        interpreter.set_register(V4, 0b1000_0010);
        interpreter.execute(Instruction::from_opcode(::Opcode(0x845E)).unwrap()).unwrap();
        assert_eq!(interpreter.register(V4), 0b0000_0100);
        assert_eq!(interpreter.register(VF), 1);

        interpreter.set_register(V4, 0b0100_0010);
        interpreter.execute(Instruction::Shl(V4)).unwrap();
        assert_eq!(interpreter.register(V4), 0b1000_0100);
        assert_eq!(interpreter.register(VF), 0);

        interpreter.execute(Instruction::Shr(V4)).unwrap();
        assert_eq!(interpreter.register(V4), 0b0100_0010);
        assert_eq!(interpreter.register(VF), 0);
    }

    /// When `VF` is both the operand and the flag, the flag wins.
    #[test]
    fn flag_overrides_vf_result() {
        use Register::*;
        let mut interpreter = interpreter();

        interpreter.set_register(VF, 0xFF);
        interpreter.set_register(V1, 0x02);
        interpreter.execute(Instruction::AddReg(VF, V1)).unwrap();
        assert_eq!(interpreter.register(VF), 1);

        interpreter.set_register(VF, 0x10);
        interpreter.execute(Instruction::Shr(VF)).unwrap();
        assert_eq!(interpreter.register(VF), 0);
    }

    #[test]
    fn skips() {
        use Register::*;
        let mut interpreter = interpreter();
        interpreter.set_register(V1, 0x42);
        interpreter.set_register(V2, 0x42);
        interpreter.set_register(V3, 0x07);

        // Test cases, in the format (instruction, skipped).
        let cases = [
            (Instruction::SeByte(V1, 0x42), true),
            (Instruction::SeByte(V1, 0x43), false),
            (Instruction::SneByte(V1, 0x42), false),
            (Instruction::SneByte(V1, 0x43), true),
            (Instruction::SeReg(V1, V2), true),
            (Instruction::SeReg(V1, V3), false),
            (Instruction::SneReg(V1, V2), false),
            (Instruction::SneReg(V1, V3), true),
        ];

        for &(ins, skipped) in cases.iter() {
            let pc = interpreter.pc();
            interpreter.execute(ins).unwrap();
            let expected = if skipped { pc + 4 } else { pc + 2 };
            assert_eq!(interpreter.pc(), expected, "case {:?}", ins);
        }
    }

    #[test]
    fn jumps() {
        let mut interpreter = interpreter();

        interpreter.execute(Instruction::Jp(0x345)).unwrap();
        assert_eq!(interpreter.pc(), 0x345);

        interpreter.set_register(Register::V0, 0x10);
        interpreter.execute(Instruction::JpV0(0x300)).unwrap();
        assert_eq!(interpreter.pc(), 0x310);
    }

    #[test]
    fn call_and_return() {
        let mut interpreter = interpreter();

        interpreter.execute(Instruction::Call(0x400)).unwrap();
        assert_eq!(interpreter.pc(), 0x400);
        assert_eq!(interpreter.call_stack().entries(), &[0x200]);

        interpreter.execute(Instruction::Ret).unwrap();
        assert_eq!(interpreter.pc(), 0x202);
        assert_eq!(interpreter.call_stack().depth(), 0);
    }

    #[test]
    fn stack_overflow_and_underflow() {
        let mut interpreter = interpreter();

        for _ in 0..16 {
            interpreter.execute(Instruction::Call(0x200)).unwrap();
        }
        assert_eq!(
            interpreter.execute(Instruction::Call(0x300)),
            Err(VmError::StackOverflow { pc: 0x200 })
        );
        assert_eq!(interpreter.pc(), 0x200);
        assert_eq!(interpreter.call_stack().depth(), 16);

        for _ in 0..16 {
            interpreter.execute(Instruction::Ret).unwrap();
            interpreter.execute(Instruction::Jp(0x200)).unwrap();
        }
        assert_eq!(
            interpreter.execute(Instruction::Ret),
            Err(VmError::StackUnderflow { pc: 0x200 })
        );
        assert_eq!(interpreter.pc(), 0x200);
    }

    #[test]
    fn instruction_rnd() {
        use Register::*;
        let mut interpreter = Interpreter::with_options(Options::testing(&[0xAB, 0xFF]));

        interpreter.execute(Instruction::Rnd(V3, 0x0F)).unwrap();
        assert_eq!(interpreter.register(V3), 0x0B);
        interpreter.execute(Instruction::Rnd(V3, 0xF0)).unwrap();
        assert_eq!(interpreter.register(V3), 0xF0);
        interpreter.execute(Instruction::Rnd(V3, 0x00)).unwrap();
        assert_eq!(interpreter.register(V3), 0x00);
    }

    #[test]
    fn draw_collision() {
        use Register::*;
        let mut interpreter = interpreter();
        interpreter.memory_mut().write(0x300, &[0x80]).unwrap();
        interpreter.set_i(0x300);
        interpreter.set_register(V1, 12);
        interpreter.set_register(V2, 7);

        interpreter.execute(Instruction::Drw(V1, V2, 1)).unwrap();
        assert!(interpreter.display().pixel(12, 7));
        assert_eq!(interpreter.register(VF), 0);
        assert!(interpreter.display().needs_refresh());

        interpreter.execute(Instruction::Drw(V1, V2, 1)).unwrap();
        assert!(!interpreter.display().pixel(12, 7));
        assert_eq!(interpreter.register(VF), 1);
    }

    #[test]
    fn draw_wraps_coordinates() {
        use Register::*;
        let mut interpreter = interpreter();
        interpreter.set_register(V0, 0xF);
        interpreter.execute(Instruction::LdF(V0)).unwrap();
        interpreter.set_register(V1, 64 + 62);
        interpreter.set_register(V2, 32 + 30);

        interpreter.execute(Instruction::Drw(V1, V2, 5)).unwrap();
        // The top row of "F" is 0xF0: x = 62, 63, 0, 1.
        for &x in [62, 63, 0, 1].iter() {
            assert!(interpreter.display().pixel(x, 30), "x = {}", x);
        }
        // The third row wraps to the top of the screen.
        assert!(interpreter.display().pixel(0, 0));
        assert_eq!(interpreter.register(VF), 0);
    }

    #[test]
    fn draw_out_of_memory() {
        use Register::*;
        let mut interpreter = interpreter();
        interpreter.set_i(0xFFE);

        assert_eq!(
            interpreter.execute(Instruction::Drw(V0, V0, 3)),
            Err(VmError::AddressOutOfBounds(0x1000))
        );
        assert!(!interpreter.display().needs_refresh());
    }

    #[test]
    fn clear_screen() {
        use Register::*;
        let mut interpreter = interpreter();
        interpreter.execute(Instruction::Drw(V0, V0, 5)).unwrap();
        assert!(interpreter.display().lit_pixels().count() > 0);

        interpreter.execute(Instruction::Cls).unwrap();
        assert_eq!(interpreter.display().lit_pixels().count(), 0);
    }

    #[test]
    fn keys() {
        use Register::*;
        let mut interpreter = interpreter();
        interpreter.set_register(V1, 0xB);
        interpreter.set_key(0xB, true).unwrap();

        interpreter.execute(Instruction::Skp(V1)).unwrap();
        assert_eq!(interpreter.pc(), 0x204);
        interpreter.execute(Instruction::Sknp(V1)).unwrap();
        assert_eq!(interpreter.pc(), 0x206);

        interpreter.set_key(0xB, false).unwrap();
        interpreter.execute(Instruction::Skp(V1)).unwrap();
        assert_eq!(interpreter.pc(), 0x208);
        interpreter.execute(Instruction::Sknp(V1)).unwrap();
        assert_eq!(interpreter.pc(), 0x20C);
    }

    #[test]
    fn keys_out_of_range() {
        use Register::*;
        let mut interpreter = interpreter();
        interpreter.set_register(V1, 0x10);

        interpreter.execute(Instruction::Skp(V1)).unwrap();
        assert_eq!(interpreter.pc(), 0x202);
        interpreter.execute(Instruction::Sknp(V1)).unwrap();
        assert_eq!(interpreter.pc(), 0x204);
    }

    #[test]
    fn wait_for_key() {
        use Register::*;
        let mut interpreter = interpreter();

        for _ in 0..3 {
            interpreter.execute(Instruction::LdKey(V6)).unwrap();
            assert_eq!(interpreter.pc(), 0x200);
            assert!(interpreter.waiting_for_key());
        }

        interpreter.set_key(0x9, true).unwrap();
        interpreter.execute(Instruction::LdKey(V6)).unwrap();
        assert_eq!(interpreter.register(V6), 0x9);
        assert_eq!(interpreter.pc(), 0x202);
        assert!(!interpreter.waiting_for_key());
    }

    #[test]
    fn wait_for_key_ignores_held_key() {
        use Register::*;
        let mut interpreter = interpreter();

        interpreter.set_key(0x3, true).unwrap();
        interpreter.execute(Instruction::LdKey(V4)).unwrap();
        assert!(interpreter.waiting_for_key());

        // Another press with no release in between, as key repeat sends.
        interpreter.set_key(0x3, true).unwrap();
        interpreter.execute(Instruction::LdKey(V4)).unwrap();
        assert_eq!(interpreter.pc(), 0x200);
        assert_eq!(interpreter.register(V4), 0);
        assert!(interpreter.waiting_for_key());

        interpreter.set_key(0x3, false).unwrap();
        interpreter.set_key(0x3, true).unwrap();
        interpreter.execute(Instruction::LdKey(V4)).unwrap();
        assert_eq!(interpreter.register(V4), 0x3);
        assert_eq!(interpreter.pc(), 0x202);
    }

    #[test]
    fn timers() {
        use Register::*;
        let mut interpreter = interpreter();
        interpreter.set_register(V1, 2);
        interpreter.set_register(V2, 1);

        interpreter.execute(Instruction::LdDtReg(V1)).unwrap();
        interpreter.execute(Instruction::LdSt(V2)).unwrap();
        assert_eq!((interpreter.dt(), interpreter.st()), (2, 1));
        assert!(interpreter.sound_active());

        // Executing instructions doesn't count the timers down.
        interpreter.execute(Instruction::LdRegDt(V3)).unwrap();
        assert_eq!(interpreter.register(V3), 2);

        interpreter.tick();
        assert_eq!((interpreter.dt(), interpreter.st()), (1, 0));
        assert!(!interpreter.sound_active());
        interpreter.tick();
        interpreter.tick();
        assert_eq!((interpreter.dt(), interpreter.st()), (0, 0));
    }

    #[test]
    fn index_register() {
        use Register::*;
        let mut interpreter = interpreter();

        interpreter.execute(Instruction::LdI(0xFFF)).unwrap();
        interpreter.set_register(V2, 0x02);
        interpreter.execute(Instruction::AddI(V2)).unwrap();
        assert_eq!(interpreter.i(), 0x1001);

        interpreter.set_register(V2, 0x3A);
        interpreter.execute(Instruction::LdF(V2)).unwrap();
        assert_eq!(interpreter.i(), 0xA * 5);
        assert_eq!(interpreter.mem()[interpreter.i() as usize], 0xF0);
    }

    #[test]
    fn store_and_load_registers() {
        use Register::*;
        let mut interpreter = interpreter();
        interpreter.set_i(0x400);
        for (i, reg) in V3.up_to().enumerate() {
            interpreter.set_register(reg, i as u8 + 1);
        }
        interpreter.set_register(V4, 0x99);

        interpreter.execute(Instruction::LdDerefIReg(V3)).unwrap();
        assert_eq!(&interpreter.mem()[0x400..0x405], &[1, 2, 3, 4, 0]);
        assert_eq!(interpreter.i(), 0x400);

        for reg in VF.up_to() {
            interpreter.set_register(reg, 0);
        }
        interpreter.execute(Instruction::LdRegDerefI(V3)).unwrap();
        let regs: Vec<u8> = V4.up_to().map(|r| interpreter.register(r)).collect();
        assert_eq!(regs, vec![1, 2, 3, 4, 0]);
        assert_eq!(interpreter.i(), 0x400);
    }

    #[test]
    fn store_into_font_is_rejected() {
        let mut interpreter = interpreter();
        interpreter.set_i(0x10);

        assert_eq!(
            interpreter.execute(Instruction::LdDerefIReg(Register::V0)),
            Err(VmError::ReadOnlyAddress(0x10))
        );
        assert_eq!(interpreter.pc(), 0x200);
    }

    #[test]
    fn step_unknown_opcode() {
        let mut interpreter = interpreter();
        interpreter.load_program(&[0x51, 0x21]).unwrap();

        assert_eq!(
            interpreter.step(),
            Err(VmError::UnknownOpcode(::Opcode(0x5121)))
        );
        assert_eq!(interpreter.pc(), 0x200);
    }

    #[test]
    fn step_past_end_of_memory() {
        let mut interpreter = interpreter();
        interpreter.execute(Instruction::Jp(0xFFF)).unwrap();

        assert_eq!(interpreter.step(), Err(VmError::AddressOutOfBounds(0x1000)));
    }

    #[test]
    fn load_rom() {
        let mut interpreter = interpreter();

        let mut rom = Cursor::new(vec![0x60, 0x2A]);
        interpreter.load_rom(&mut rom).unwrap();
        interpreter.step().unwrap();
        assert_eq!(interpreter.register(Register::V0), 0x2A);

        let mut rom = Cursor::new(vec![0; PROG_SIZE + 1]);
        let err = interpreter.load_rom(&mut rom).unwrap_err();
        assert_eq!(
            err.downcast::<VmError>().unwrap(),
            VmError::too_large(PROG_SIZE + 1)
        );
    }

    #[test]
    fn initialize_resets_everything() {
        use Register::*;
        let mut interpreter = interpreter();
        interpreter.load_program(&[0x22, 0x00]).unwrap();
        interpreter.step().unwrap();
        interpreter.set_register(V7, 7);
        interpreter.set_i(0x321);
        interpreter.execute(Instruction::LdDtReg(V7)).unwrap();
        interpreter.execute(Instruction::Drw(V0, V0, 5)).unwrap();
        interpreter.execute(Instruction::LdKey(V0)).unwrap();

        interpreter.initialize();
        assert_eq!(interpreter.pc(), 0x200);
        assert_eq!(interpreter.i(), 0);
        assert_eq!(interpreter.register(V7), 0);
        assert_eq!(interpreter.dt(), 0);
        assert_eq!(interpreter.call_stack().depth(), 0);
        assert_eq!(interpreter.display().lit_pixels().count(), 0);
        assert!(!interpreter.waiting_for_key());
        assert!(interpreter.mem()[0x200..].iter().all(|&b| b == 0));
        assert_eq!(interpreter.mem()[0], 0xF0);
    }
}
