use serde::{Deserialize, Serialize};

/// Value the sound timer holds right after a reset; counting it down is the boot chime.
pub const SOUND_STARTUP: u8 = 14;
/// Sound timer value at which an ordinary countdown requests a tone.
pub const SOUND_THRESHOLD: u8 = 4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
/// A request for the host to play a tone, produced by `Timers::tick()`.
pub enum ToneCue {
    #[default]
    None,
    Normal,
    Fatal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
/// The delay and sound timers, plus the latch that keeps
/// each countdown run from requesting more than one tone.
pub struct Timers {
    pub delay: u8,
    sound: u8,
    // True between a reset and the first time a program sets the sound timer.
    startup_run: bool,
    // True once this countdown run has produced a cue.
    cue_fired: bool,
}

impl Timers {
    /// Timers as they are right after a reset: the sound timer is loaded
    /// with the startup value so the first countdown plays the boot chime.
    pub fn after_reset() -> Timers {
        Timers {
            delay: 0,
            sound: SOUND_STARTUP,
            startup_run: true,
            cue_fired: false,
        }
    }

    pub fn sound(&self) -> u8 {
        self.sound
    }

    /// Load the sound timer from program logic. A fresh countdown run only
    /// starts once the previous one has reached 0; reloading mid-run keeps
    /// the latch so the run cannot cue twice.
    pub fn set_sound(&mut self, value: u8) {
        if self.sound == 0 {
            self.cue_fired = false;
        }
        self.sound = value;
        self.startup_run = false;
    }

    /// Decrement both timers by one (never below zero) and
    /// report the tone cue this tick produced, if any.
    pub fn tick(&mut self) -> ToneCue {
        self.delay = self.delay.saturating_sub(1);

        if self.sound == 0 {
            return ToneCue::None;
        }

        let previous = self.sound;
        self.sound -= 1;

        if self.cue_fired {
            return ToneCue::None;
        }

        let cue = if self.startup_run && previous == SOUND_STARTUP {
            ToneCue::Fatal
        } else if self.sound == SOUND_THRESHOLD {
            ToneCue::Normal
        } else {
            ToneCue::None
        };

        if cue != ToneCue::None {
            self.cue_fired = true;
            self.startup_run = false;
        }
        cue
    }
}
