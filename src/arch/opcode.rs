use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result};

// Don't allow initialization of an Opcode outside of this crate.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
/// A single decoded instruction word.
///
/// Every field is extracted from `value` by `Opcode::new()`, which is a pure
/// function of the 16-bit word. Fields that a given instruction does not use
/// are still populated; the dispatcher decides which ones matter.
pub struct Opcode {
    // The raw numerical value of the instruction.
    pub value: u16,
    // The 'X' register named in the instruction (second nibble).
    // Registers are usize because rust forces indexing to be as usize,
    // even when the indexes are of a smaller type and thus are in
    // (compile-time) bounds.
    pub xreg: usize,
    // The 'Y' register named in the instruction (third nibble).
    pub yreg: usize,
    // The last three hex digits of our instruction, usually an address.
    pub literal: u16,
    // The low byte of our instruction.
    pub byte: u8,
    // The low nibble of our instruction.
    pub nibble: u8,
}

impl Opcode {
    /// Create a new `Opcode` from a numerical value.
    ///
    /// It is up to the caller to ensure this value represents
    /// a valid instruction for the emulator to execute.
    pub fn new(value: u16) -> Opcode {
        Opcode {
            value,
            xreg: x_field(value),
            yreg: y_field(value),
            literal: address_field(value),
            byte: byte_field(value),
            nibble: nibble_field(value),
        }
    }

    /// Build an opcode from the two bytes it is stored as (big-endian).
    pub fn from_bytes(high: u8, low: u8) -> Opcode {
        Opcode::new(u16::from_be_bytes([high, low]))
    }

    /// The high nibble, which selects the instruction group.
    pub fn group(&self) -> u8 {
        (self.value >> 12) as u8
    }
}

fn x_field(value: u16) -> usize {
    ((value >> 8) & 0xF) as usize
}

fn y_field(value: u16) -> usize {
    ((value >> 4) & 0xF) as usize
}

fn address_field(value: u16) -> u16 {
    value & 0xFFF
}

fn byte_field(value: u16) -> u8 {
    (value & 0xFF) as u8
}

fn nibble_field(value: u16) -> u8 {
    (value & 0xF) as u8
}

impl Display for Opcode {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(
            f,
            "#{:04X} NNN #{:03X} KK #{:02X} N #{:01X} X #{:01X} Y #{:01X}",
            self.value, self.literal, self.byte, self.nibble, self.xreg, self.yreg
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields() {
        let op = Opcode::new(0xABCD);
        assert_eq!(op.group(), 0xA);
        assert_eq!(op.xreg, 0xB);
        assert_eq!(op.yreg, 0xC);
        assert_eq!(op.nibble, 0xD);
        assert_eq!(op.byte, 0xCD);
        assert_eq!(op.literal, 0xBCD);
    }

    #[test]
    fn from_bytes_is_big_endian() {
        assert_eq!(Opcode::from_bytes(0xD1, 0x25), Opcode::new(0xD125));
    }

    #[test]
    fn display() {
        let text = Opcode::new(0x8AB4).to_string();
        assert_eq!(text, "#8AB4 NNN #AB4 KK #B4 N #4 X #A Y #B");
    }
}
