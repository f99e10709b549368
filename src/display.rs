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

//! The Chip-8 framebuffer and built-in font.

use std::default::Default;
use std::fmt;

use failure::Fail;

/// The width of the display.
pub const WIDTH: usize = 64;
/// The height of the display.
pub const HEIGHT: usize = 32;

/// The height of a font sprite.
pub const FONT_HEIGHT: usize = 5;

/// The hex digit sprites, in order from `0` to `F`.
pub const FONT_SPRITES: [[u8; FONT_HEIGHT]; 16] = [
    [0xF0, 0x90, 0x90, 0x90, 0xF0],
    [0x20, 0x60, 0x20, 0x20, 0x70],
    [0xF0, 0x10, 0xF0, 0x80, 0xF0],
    [0xF0, 0x10, 0xF0, 0x10, 0xF0],
    [0x90, 0x90, 0xF0, 0x10, 0x10],
    [0xF0, 0x80, 0xF0, 0x10, 0xF0],
    [0xF0, 0x80, 0xF0, 0x90, 0xF0],
    [0xF0, 0x10, 0x20, 0x40, 0x40],
    [0xF0, 0x90, 0xF0, 0x90, 0xF0],
    [0xF0, 0x90, 0xF0, 0x10, 0xF0],
    [0xF0, 0x90, 0xF0, 0x90, 0x90],
    [0xE0, 0x90, 0xE0, 0x90, 0xE0],
    [0xF0, 0x80, 0x80, 0x80, 0xF0],
    [0xE0, 0x90, 0x90, 0x90, 0xE0],
    [0xF0, 0x80, 0xF0, 0x80, 0xF0],
    [0xF0, 0x80, 0xF0, 0x80, 0x80],
];

/// A Chip-8 display buffer.
///
/// Pixels are stored row by row, so the pixel at `(x, y)` lives at index
/// `x + WIDTH * y`.  Coordinates given to any method wrap around the edges.
pub struct Buffer {
    /// The underlying pixel data.
    data: [bool; WIDTH * HEIGHT],
    /// Whether the display needs to be refreshed.
    needs_refresh: bool,
}

impl Buffer {
    /// Returns a new display buffer with all pixels clear.
    pub fn new() -> Self {
        Buffer {
            data: [false; WIDTH * HEIGHT],
            needs_refresh: false,
        }
    }

    /// Clears the display.
    pub fn clear(&mut self) {
        for elem in self.data.iter_mut() {
            *elem = false;
        }
        self.needs_refresh = true;
    }

    /// Returns a reference to the underlying pixel data.
    pub fn data(&self) -> &[bool; WIDTH * HEIGHT] {
        &self.data
    }

    /// Returns whether the given pixel is on.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.data[index(x, y)]
    }

    /// Returns the coordinates of every pixel that is on.
    pub fn lit_pixels<'a>(&'a self) -> impl Iterator<Item = (usize, usize)> + 'a {
        self.data
            .iter()
            .enumerate()
            .filter(|&(_, &on)| on)
            .map(|(i, _)| (i % WIDTH, i / WIDTH))
    }

    /// Flips the on/off state of the given pixel, returning its previous
    /// state.
    pub fn flip_pixel(&mut self, x: usize, y: usize) -> bool {
        let i = index(x, y);
        let old = self.data[i];
        self.data[i] = !old;
        old
    }

    /// Draws the given sprite at the given position, one row per byte with
    /// the most significant bit leftmost.
    ///
    /// Returns whether any pixel was turned off.  Pixels are flipped in
    /// order, so a sprite which overlaps itself after wrapping sees its own
    /// earlier flips.
    pub fn draw_sprite(&mut self, sprite: &[u8], x: usize, y: usize) -> bool {
        let mut collision = false;

        for (j, row) in sprite.iter().enumerate() {
            for i in 0..8 {
                if row & (1 << (7 - i)) != 0 && self.flip_pixel(x + i, y + j) {
                    collision = true;
                }
            }
        }
        self.needs_refresh = true;

        collision
    }

    /// Forces a refresh on the next call to `refresh`, even if no draw
    /// operation has been performed.
    pub fn force_refresh(&mut self) {
        self.needs_refresh = true;
    }

    /// Returns whether a redraw has been requested since the last refresh.
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    /// Refreshes the display using the given refresh function.
    ///
    /// If a refresh is unnecessary, nothing will be done.  The refresh
    /// function receives a "snapshot" of the display, and should draw that to
    /// whatever user-facing display buffer is currently being used.  The
    /// request is only cleared if the function succeeds.
    pub fn refresh<F, E>(&mut self, f: F) -> Result<(), E>
    where
        F: FnOnce(&Self) -> Result<(), E>,
        E: Fail,
    {
        if self.needs_refresh {
            f(self)?;
            self.needs_refresh = false;
        }
        Ok(())
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Buffer::new()
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in self.data.chunks(WIDTH) {
            let line: String = row.iter().map(|&on| if on { '#' } else { '.' }).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Returns the index of the given pixel, wrapping around the edges.
fn index(x: usize, y: usize) -> usize {
    x % WIDTH + WIDTH * (y % HEIGHT)
}
