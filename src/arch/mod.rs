pub mod chip8;
mod emulator;
mod error;
mod instruction_set;
mod opcode;
pub mod runner;
mod timers;
mod trace;

pub use chip8::{Chip8, Quirks, StepStatus};
pub use emulator::Emulator;
pub use error::Chip8Error;
pub use opcode::Opcode;
pub use runner::{FrameOutcome, RunOutcome, Runner};
pub use timers::{ToneCue, SOUND_STARTUP, SOUND_THRESHOLD};
pub use trace::{TraceRecord, TRACE_TARGET};
