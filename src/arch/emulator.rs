use super::error::Chip8Error;
use super::runner::RunOutcome;
use std::path::Path;

pub trait Emulator {
    fn load_game(&mut self, path: &Path) -> Result<(), Chip8Error>;
    fn run(&mut self) -> Result<RunOutcome, Chip8Error>; // Returns when game or user quits.
}
