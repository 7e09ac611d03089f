use super::opcode::Opcode;
use serde::Serialize;
use std::fmt::{Display, Formatter, Result};

/// Log target used for per-instruction trace records.
pub const TRACE_TARGET: &str = "chip8::trace";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
/// A snapshot of one fetched instruction and the machine around it,
/// taken after PC has been advanced and before the instruction runs.
pub struct TraceRecord {
    pub opcode: Opcode,
    pub index_reg: u16,
    pub vx: u8,
    pub vy: u8,
    pub registers: [u8; 16],
    pub sp: u16,
    pub pc: u16,
    pub cycles: u64,
}

impl Display for TraceRecord {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(
            f,
            "{} I #{:03X} VX #{:02X} VY #{:02X} SP #{:02X} PC #{:04X} CYCLES {} V {:02X?}",
            self.opcode,
            self.index_reg,
            self.vx,
            self.vy,
            self.sp,
            self.pc,
            self.cycles,
            self.registers
        )
    }
}
