use super::screen::Screen;
use crate::arch::Chip8Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetKeysResult {
    ShouldContinue,
    ShouldExit,
    ShouldSaveState,
    ShouldReset,
}

pub trait Interactible {
    fn init(&mut self) -> Result<(), Chip8Error>;
    fn set_title(&mut self, title: &str) -> Result<(), Chip8Error>;
    fn update_display(&mut self, screen: &Screen) -> Result<(), Chip8Error>;

    fn set_keys(&mut self) -> SetKeysResult;
    fn get_keys(&self) -> &[bool; 16]; // true if pressed, false otherwise
}
