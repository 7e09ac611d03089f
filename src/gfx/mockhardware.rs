use super::audible::Audible;
use super::interactible::{Interactible, SetKeysResult};
use super::screen::Screen;
use crate::arch::{Chip8Error, ToneCue};
use std::collections::VecDeque;

#[derive(Default)]
/// A stand-in for Hardware that is useful during testing
/// when we cannot call any SDL methods (since our test runner
/// may not run our tests on the main thread, which SDL strictly requires).
///
/// Each call to `set_keys` consumes one scripted frame; once the script
/// runs out the mock asks the runner to exit.
pub struct MockHardware {
    script: VecDeque<(SetKeysResult, [bool; 16])>,
    keyboard: [bool; 16],
    pub initialized: bool,
    pub title: String,
    pub frames_presented: usize,
    pub last_frame: Option<Screen>,
    pub cues: Vec<ToneCue>,
}

impl MockHardware {
    pub fn new() -> MockHardware {
        MockHardware::default()
    }

    /// Queue a frame with no keys pressed.
    pub fn idle_frame(mut self) -> MockHardware {
        self.script
            .push_back((SetKeysResult::ShouldContinue, [false; 16]));
        self
    }

    /// Queue `count` frames with no keys pressed.
    pub fn idle_frames(mut self, count: usize) -> MockHardware {
        for _ in 0..count {
            self = self.idle_frame();
        }
        self
    }

    /// Queue a frame with `key` held down.
    pub fn key_frame(mut self, key: u8) -> MockHardware {
        let mut keys = [false; 16];
        keys[(key & 0xF) as usize] = true;
        self.script.push_back((SetKeysResult::ShouldContinue, keys));
        self
    }

    /// Queue a frame whose poll returns `result`.
    pub fn event_frame(mut self, result: SetKeysResult) -> MockHardware {
        self.script.push_back((result, [false; 16]));
        self
    }
}

impl Interactible for MockHardware {
    fn init(&mut self) -> Result<(), Chip8Error> {
        self.initialized = true;
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<(), Chip8Error> {
        self.title = title.to_string();
        Ok(())
    }

    fn update_display(&mut self, screen: &Screen) -> Result<(), Chip8Error> {
        self.frames_presented += 1;
        self.last_frame = Some(screen.clone());
        Ok(())
    }

    fn set_keys(&mut self) -> SetKeysResult {
        match self.script.pop_front() {
            Some((result, keys)) => {
                self.keyboard = keys;
                result
            }
            None => SetKeysResult::ShouldExit,
        }
    }

    fn get_keys(&self) -> &[bool; 16] {
        &self.keyboard
    }
}

impl Audible for MockHardware {
    fn play_tone(&mut self, cue: ToneCue) {
        if cue != ToneCue::None {
            self.cues.push(cue);
        }
    }
}
