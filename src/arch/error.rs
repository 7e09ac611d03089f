use thiserror::Error;

/// Everything that can go wrong while loading or running a program.
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("program is too large ({size} bytes), max size is {max} bytes")]
    ProgramTooLarge { size: usize, max: usize },

    #[error("program is empty")]
    EmptyProgram,

    #[error("undecodable opcode {opcode:#06X} at {pc:#05X}")]
    UndecodableOpcode { opcode: u16, pc: u16 },

    #[error("memory access out of bounds at address {address:#06X}")]
    OutOfBounds { address: usize },

    #[error("fontset must be 80 bytes, got {size}")]
    InvalidFontset { size: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("save state error: {0}")]
    State(#[from] serde_json::Error),

    #[error("hardware error: {0}")]
    Hardware(String),
}
