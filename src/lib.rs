//! A CHIP-8 interpreter.
//!
//! `arch` holds the machine itself and the loop that drives it;
//! `gfx` holds the display buffer and the hardware it is shown on.

pub mod arch;
pub mod gfx;
