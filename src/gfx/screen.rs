use super::Drawable;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::fmt;

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;

#[serde_as]
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
/// The monochrome frame buffer: 32 rows of 64 single-bit pixels.
/// It can be queried by pixel or iterated over
/// but can only be modified via `Drawable`.
pub struct Screen {
    // Row-major: pixels[y][x].
    #[serde_as(as = "[[_; 64]; 32]")]
    pixels: [[bool; SCREEN_WIDTH]; SCREEN_HEIGHT],
}

/// Iterator for a Screen that only returns (x, y) of pixels that are set.
pub struct ScreenIterator<'a> {
    screen: &'a Screen,
    // Linear index of the next pixel to look at.
    next: usize,
}

impl Iterator for ScreenIterator<'_> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < SCREEN_WIDTH * SCREEN_HEIGHT {
            let (x, y) = (self.next % SCREEN_WIDTH, self.next / SCREEN_WIDTH);
            self.next += 1;
            if self.screen.pixels[y][x] {
                return Some((x, y));
            }
        }

        None
    }
}

// Allow converting references of Screens to iterators
// for easy for loop iteration (but without consuming the Screen object itself).
impl<'a> IntoIterator for &'a Screen {
    type Item = (usize, usize);
    type IntoIter = ScreenIterator<'a>;

    fn into_iter(self) -> ScreenIterator<'a> {
        ScreenIterator {
            screen: self,
            next: 0,
        }
    }
}

impl Screen {
    pub fn new() -> Screen {
        Screen {
            pixels: [[false; SCREEN_WIDTH]; SCREEN_HEIGHT],
        }
    }

    /// Rows of the frame buffer, top to bottom.
    pub fn rows(&self) -> &[[bool; SCREEN_WIDTH]; SCREEN_HEIGHT] {
        &self.pixels
    }

    pub fn is_clear(&self) -> bool {
        self.pixels.iter().all(|row| row.iter().all(|&p| !p))
    }
}

impl Drawable for Screen {
    // Setters.
    fn clear_all_pixels(&mut self) {
        self.pixels.iter_mut().for_each(|row| row.fill(false));
    }

    fn xor_pixel(&mut self, x: usize, y: usize, bit: bool) -> bool {
        let (x, y) = (x % SCREEN_WIDTH, y % SCREEN_HEIGHT);
        let pixel = &mut self.pixels[y][x];
        let collided = *pixel && bit;
        *pixel ^= bit;
        collided
    }

    // Getters.
    fn get_pixel(&self, x: usize, y: usize) -> bool {
        self.in_bounds(x, y) && self.pixels[y][x]
    }

    // Info.
    fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < SCREEN_WIDTH && y < SCREEN_HEIGHT
    }
}

// Mostly useful for debugging.
impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in self.pixels.iter() {
            let line: String = row.iter().map(|&p| if p { '#' } else { '.' }).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Screen {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Screen({} set)", self.into_iter().count())
    }
}

impl Default for Screen {
    fn default() -> Screen {
        Screen::new()
    }
}
