use super::chip8::{Chip8, StepStatus};
use super::emulator::Emulator;
use super::error::Chip8Error;
use crate::gfx::{Audible, Interactible, SetKeysResult};

use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub const DEFAULT_CYCLES_PER_FRAME: u32 = 10;
pub const DEFAULT_FRAME_DURATION: Duration = Duration::from_nanos(1_000_000_000 / 60);
pub const DEFAULT_STATE_PATH: &str = "chip8-state.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Continue,
    Exit,
    Faulted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Quit,
    Faulted,
}

/// Drives a `Chip8` against some hardware at a fixed frame rate:
/// poll input, run a batch of instructions, tick the timers once,
/// play any tone and present the display.
pub struct Runner<H> {
    chip8: Chip8,
    hardware: H,
    title: String,
    cycles_per_frame: u32,
    frame_duration: Duration,
    state_path: PathBuf,
}

impl<H: Interactible + Audible> Runner<H> {
    pub fn new(chip8: Chip8, hardware: H) -> Runner<H> {
        Runner {
            chip8,
            hardware,
            title: String::from("CHIP-8 Emulator"),
            cycles_per_frame: DEFAULT_CYCLES_PER_FRAME,
            frame_duration: DEFAULT_FRAME_DURATION,
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
        }
    }

    pub fn with_cycles_per_frame(mut self, cycles_per_frame: u32) -> Runner<H> {
        self.cycles_per_frame = cycles_per_frame;
        self
    }

    pub fn with_frame_duration(mut self, frame_duration: Duration) -> Runner<H> {
        self.frame_duration = frame_duration;
        self
    }

    /// Where a save-state request from the hardware is written.
    pub fn with_state_path(mut self, state_path: PathBuf) -> Runner<H> {
        self.state_path = state_path;
        self
    }

    pub fn chip8(&self) -> &Chip8 {
        &self.chip8
    }

    pub fn chip8_mut(&mut self) -> &mut Chip8 {
        &mut self.chip8
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Run a single 60 Hz frame.
    pub fn run_frame(&mut self) -> Result<FrameOutcome, Chip8Error> {
        match self.hardware.set_keys() {
            SetKeysResult::ShouldContinue => {}
            SetKeysResult::ShouldExit => return Ok(FrameOutcome::Exit),
            SetKeysResult::ShouldReset => {
                info!("resetting");
                self.chip8.reset();
            }
            SetKeysResult::ShouldSaveState => {
                if let Err(err) = self.chip8.save_state(&self.state_path) {
                    warn!("could not save state: {err}");
                }
            }
        }
        self.chip8.set_keys(*self.hardware.get_keys());

        let mut outcome = FrameOutcome::Continue;
        for _ in 0..self.cycles_per_frame {
            match self.chip8.step() {
                Ok(StepStatus::Executed) => {}
                Ok(StepStatus::AwaitingKey) => break,
                Ok(StepStatus::Halted) => {
                    outcome = FrameOutcome::Faulted;
                    break;
                }
                Err(err) => {
                    error!("stopping: {err}");
                    outcome = FrameOutcome::Faulted;
                    break;
                }
            }
        }

        let cue = self.chip8.tick_timers();
        if cue != super::ToneCue::None {
            debug!("tone cue {cue:?}");
        }
        self.hardware.play_tone(cue);

        if self.chip8.take_draw_flag() {
            self.hardware.update_display(self.chip8.screen())?;
        }

        Ok(outcome)
    }
}

impl<H: Interactible + Audible> Emulator for Runner<H> {
    fn load_game(&mut self, path: &Path) -> Result<(), Chip8Error> {
        let program = std::fs::read(path)?;
        self.chip8.load_program(&program)?;

        if let Some(name) = path.file_name() {
            self.title = format!("CHIP-8 Emulator - {}", name.to_string_lossy());
        }
        Ok(())
    }

    fn run(&mut self) -> Result<RunOutcome, Chip8Error> {
        self.hardware.init()?;
        self.hardware.set_title(&self.title)?;

        loop {
            let started = Instant::now();
            match self.run_frame()? {
                FrameOutcome::Continue => {}
                FrameOutcome::Exit => return Ok(RunOutcome::Quit),
                FrameOutcome::Faulted => return Ok(RunOutcome::Faulted),
            }

            if let Some(rest) = self.frame_duration.checked_sub(started.elapsed()) {
                std::thread::sleep(rest);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::ToneCue;
    use crate::gfx::{Drawable, MockHardware};

    fn runner(program: &[u16], hardware: MockHardware) -> Runner<MockHardware> {
        let mut chip8 = Chip8::with_seed(0);
        let bytes: Vec<u8> = program.iter().flat_map(|op| op.to_be_bytes()).collect();
        chip8.load_program(&bytes).unwrap();
        Runner::new(chip8, hardware).with_frame_duration(Duration::ZERO)
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("chip8-vm-{}-{name}", std::process::id()))
    }

    #[test]
    fn runs_until_hardware_exits() {
        // Draw the "0" glyph then spin.
        let mut runner = runner(&[0xD005, 0x1202], MockHardware::new().idle_frames(3));

        assert_eq!(runner.run().unwrap(), RunOutcome::Quit);
        let hardware = runner.hardware();
        assert!(hardware.initialized);
        assert_eq!(hardware.title, "CHIP-8 Emulator");
        assert_eq!(hardware.frames_presented, 1, "only changed frames are presented");
        assert!(hardware.last_frame.as_ref().unwrap().get_pixel(0, 0));
        assert_eq!(hardware.cues, vec![ToneCue::Fatal], "boot chime on the first tick");
    }

    #[test]
    fn waits_for_key_across_frames() {
        // LD V0, K; JP self
        let hardware = MockHardware::new().idle_frames(2).key_frame(0x9);
        let mut runner = runner(&[0xF00A, 0x1202], hardware);

        assert_eq!(runner.run_frame().unwrap(), FrameOutcome::Continue);
        assert_eq!(runner.chip8().pc(), 0x200);
        assert_eq!(runner.run_frame().unwrap(), FrameOutcome::Continue);
        assert_eq!(runner.chip8().pc(), 0x200);

        runner.run_frame().unwrap();
        assert_eq!(runner.chip8().registers()[0], 0x9);
        assert_eq!(runner.chip8().pc(), 0x202);
    }

    #[test]
    fn timers_tick_once_per_frame() {
        // LD V0, 30; LD DT, V0; JP self
        let mut runner = runner(&[0x601E, 0xF015, 0x1204], MockHardware::new().idle_frames(11));

        runner.run_frame().unwrap();
        assert_eq!(runner.chip8().delay_timer(), 29);
        for _ in 0..10 {
            runner.run_frame().unwrap();
        }
        assert_eq!(runner.chip8().delay_timer(), 19);
    }

    #[test]
    fn stops_on_fault() {
        let mut runner = runner(&[0x6001, 0x5121], MockHardware::new().idle_frames(5));

        assert_eq!(runner.run().unwrap(), RunOutcome::Faulted);
        assert!(runner.chip8().is_faulted());
        assert_eq!(runner.chip8().registers()[0], 1);
    }

    #[test]
    fn reset_request() {
        let hardware = MockHardware::new()
            .idle_frame()
            .event_frame(SetKeysResult::ShouldReset);
        // ADD V0, 1; JP 0x200
        let mut runner = runner(&[0x7001, 0x1200], hardware).with_cycles_per_frame(4);

        runner.run_frame().unwrap();
        assert_eq!(runner.chip8().registers()[0], 2);

        runner.run_frame().unwrap();
        assert_eq!(runner.chip8().registers()[0], 2, "reset, then ran two more adds");
        assert_eq!(runner.chip8().cycle_count(), 10);
    }

    #[test]
    fn save_state_request() {
        let path = temp_path("save-request.json");
        let hardware = MockHardware::new().event_frame(SetKeysResult::ShouldSaveState);
        let mut runner = runner(&[0x6A42, 0x1202], hardware).with_state_path(path.clone());

        runner.run_frame().unwrap();

        let mut restored = Chip8::with_seed(3);
        restored.load_state(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        // Saved before this frame's instructions ran.
        assert_eq!(restored.pc(), 0x200);
        assert_eq!(restored.memory()[0x200], 0x6A);
    }

    #[test]
    fn load_game_from_file() {
        let path = temp_path("game.ch8");
        std::fs::write(&path, [0x6Au8, 0x42]).unwrap();

        let mut runner = Runner::new(Chip8::with_seed(0), MockHardware::new());
        runner.load_game(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(runner.chip8().memory()[0x200], 0x6A);
        assert!(runner.title().ends_with("game.ch8"));
    }

    #[test]
    fn load_game_errors() {
        let mut runner = Runner::new(Chip8::with_seed(0), MockHardware::new());
        assert!(matches!(
            runner.load_game(&temp_path("missing.ch8")),
            Err(Chip8Error::Io(_))
        ));

        let path = temp_path("empty.ch8");
        std::fs::write(&path, b"").unwrap();
        let result = runner.load_game(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(Chip8Error::EmptyProgram)));
    }
}
