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

//! Input handling for the Chip-8 interpreter.

use std::default::Default;

use num::traits::FromPrimitive;

use error::VmError;

/// The number of keys on the Chip-8 controller.
const N_KEYS: usize = 16;

enum_from_primitive!{
/// The keys on the Chip-8 controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    K0 = 0,
    K1,
    K2,
    K3,
    K4,
    K5,
    K6,
    K7,
    K8,
    K9,
    KA,
    KB,
    KC,
    KD,
    KE,
    KF
}
}

impl Key {
    /// Returns the key with the given code, if there is one.
    pub fn from_code(code: u8) -> Option<Key> {
        Key::from_u8(code)
    }
}

/// Represents the state of the input device.
///
/// Besides the key states, this tracks the `LD Vx, K` wait: while the
/// interpreter is waiting, the first key pressed is captured so that the
/// interpreter can pick it up on its next step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    /// The key states (`true` means "pressed").
    keys: [bool; N_KEYS],
    /// Whether the interpreter is blocked waiting for a key.
    waiting: bool,
    /// The key pressed since the wait began, if any.
    captured: Option<Key>,
}

impl State {
    /// Returns a new input state with all keys unpressed.
    pub fn new() -> Self {
        State::default()
    }

    /// Sets the state of the key with the given code.
    ///
    /// Codes above `0xF` are rejected without changing anything.
    pub fn set_key(&mut self, code: u8, pressed: bool) -> Result<(), VmError> {
        let key = Key::from_code(code).ok_or(VmError::InvalidKey(code))?;
        if pressed {
            self.press(key);
        } else {
            self.release(key);
        }
        Ok(())
    }

    /// Presses the given key.
    ///
    /// Only a key going from released to pressed can end a key wait; pressing
    /// a key which is already held (e.g. by key repeat) changes nothing.
    pub fn press(&mut self, key: Key) {
        let was_pressed = self.keys[key as usize];
        self.keys[key as usize] = true;
        if !was_pressed && self.waiting && self.captured.is_none() {
            self.captured = Some(key);
        }
    }

    /// Releases the given key.
    pub fn release(&mut self, key: Key) {
        self.keys[key as usize] = false;
    }

    /// Returns whether the given key is pressed.
    pub fn is_pressed(&self, key: Key) -> bool {
        self.keys[key as usize]
    }

    /// Returns whether a key wait is in progress.
    pub fn waiting(&self) -> bool {
        self.waiting
    }

    /// Resolves a key wait.
    ///
    /// If a key has been captured since the wait began, the wait ends and the
    /// key is returned.  Otherwise the wait is started (or continued) and
    /// `None` is returned.
    pub fn poll_wait(&mut self) -> Option<Key> {
        match self.captured.take() {
            Some(key) => {
                self.waiting = false;
                Some(key)
            }
            None => {
                self.waiting = true;
                None
            }
        }
    }
}
