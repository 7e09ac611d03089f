use sdl2::audio::{AudioCVT, AudioFormat, AudioQueue, AudioSpecDesired, AudioSpecWAV};
use sdl2::event::Event;
use sdl2::joystick::Joystick;
use sdl2::keyboard::Scancode;
use sdl2::pixels::Color;
use sdl2::rect::Rect;
use sdl2::render::Canvas;
use sdl2::video::Window;
use sdl2::{EventPump, JoystickSubsystem, Sdl};

use log::{debug, info, warn};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::audible::Audible;
use super::interactible::{Interactible, SetKeysResult};
use super::screen::{Screen, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::arch::{Chip8Error, ToneCue};

const KEYBOARD_LAYOUT: [Scancode; 16] = [
    Scancode::Num0,
    Scancode::Num1,
    Scancode::Num2,
    Scancode::Num3,
    Scancode::Num4,
    Scancode::Num5,
    Scancode::Num6,
    Scancode::Num7,
    Scancode::Num8,
    Scancode::Num9,
    Scancode::A,
    Scancode::B,
    Scancode::C,
    Scancode::D,
    Scancode::E,
    Scancode::F,
];

// Arrow keys double as the directional keys most games use.
const ARROW_LAYOUT: [(Scancode, usize); 4] = [
    (Scancode::Up, 0x2),
    (Scancode::Left, 0x4),
    (Scancode::Right, 0x6),
    (Scancode::Down, 0x8),
];

const JOYSTICK_DEAD_ZONE: i16 = 8000;
const JOYSTICK_FIRE_BUTTON: u8 = 0;
const JOYSTICK_RESET_BUTTON: u8 = 2;
const JOYSTICK_QUIT_BUTTONS: [u8; 3] = [8, 9, 10];

const BACKGROUND: Color = Color::RGB(0, 0, 0);
const FOREGROUND: Color = Color::RGB(255, 255, 255);

const SAMPLE_RATE: i32 = 22050;
const TONE_VOLUME: i16 = 3000;

/// Hz and length of each tone cue.
fn tone_shape(cue: ToneCue) -> Option<(u32, Duration)> {
    match cue {
        ToneCue::None => None,
        ToneCue::Normal => Some((880, Duration::from_millis(120))),
        ToneCue::Fatal => Some((220, Duration::from_millis(400))),
    }
}

fn square_wave(frequency: u32, duration: Duration, sample_rate: i32) -> Vec<i16> {
    let total = (sample_rate as u128 * duration.as_millis() / 1000) as usize;
    let period = ((sample_rate as u32) / frequency.max(1)).max(2) as usize;
    (0..total)
        .map(|sample| {
            if sample % period < period / 2 {
                TONE_VOLUME
            } else {
                -TONE_VOLUME
            }
        })
        .collect()
}

/// Decode a WAV file into signed 16-bit samples at the queue's rate and channel count.
fn load_wav(path: &Path, freq: i32, channels: u8) -> Result<Vec<i16>, String> {
    let wav = AudioSpecWAV::load_wav(path)?;
    let cvt = AudioCVT::new(
        wav.format,
        wav.channels,
        wav.freq,
        AudioFormat::s16_sys(),
        channels,
        freq,
    )?;
    Ok(samples_from_bytes(&cvt.convert(wav.buffer().to_vec())))
}

fn samples_from_bytes(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_ne_bytes([pair[0], pair[1]]))
        .collect()
}

fn sdl_error(err: impl ToString) -> Chip8Error {
    Chip8Error::Hardware(err.to_string())
}

/// Window, keyboard, joystick and speaker, all through SDL2.
pub struct Hardware {
    scale: u32,
    title: String,
    #[allow(dead_code)] // Owns the SDL context for as long as the window lives.
    sdl: Option<Sdl>,
    canvas: Option<Canvas<Window>>,
    events: Option<EventPump>,
    audio: Option<AudioQueue<i16>>,
    normal_sound: Option<PathBuf>,
    fatal_sound: Option<PathBuf>,
    // Decoded sound files; a cue without one falls back to a square wave.
    normal_samples: Option<Vec<i16>>,
    fatal_samples: Option<Vec<i16>>,
    joystick_subsystem: Option<JoystickSubsystem>,
    joysticks: Vec<Joystick>,
    keyboard: [bool; 16], // True if a key is pressed.
    joypad: [bool; 16],
}

impl Hardware {
    pub fn new(scale: u32, title: &str) -> Hardware {
        Hardware {
            scale: scale.max(1),
            title: title.to_string(),
            sdl: None,
            canvas: None,
            events: None,
            audio: None,
            normal_sound: None,
            fatal_sound: None,
            normal_samples: None,
            fatal_samples: None,
            joystick_subsystem: None,
            joysticks: Vec::new(),
            keyboard: [false; 16],
            joypad: [false; 16],
        }
    }

    /// WAV files to play for the normal and fatal tone cues.
    pub fn with_sounds(mut self, normal: Option<PathBuf>, fatal: Option<PathBuf>) -> Hardware {
        self.normal_sound = normal;
        self.fatal_sound = fatal;
        self
    }

    fn load_sounds(&mut self) {
        let Some((freq, channels)) = self
            .audio
            .as_ref()
            .map(|queue| (queue.spec().freq, queue.spec().channels))
        else {
            return;
        };
        let decode = |file: &Option<PathBuf>| {
            let path = file.as_deref()?;
            match load_wav(path, freq, channels) {
                Ok(samples) => {
                    info!("loaded sound {}", path.display());
                    Some(samples)
                }
                Err(err) => {
                    warn!("could not load sound {}: {err}", path.display());
                    None
                }
            }
        };
        self.normal_samples = decode(&self.normal_sound);
        self.fatal_samples = decode(&self.fatal_sound);
    }

    fn cue_samples(&self, cue: ToneCue) -> Option<Cow<'_, [i16]>> {
        let loaded = match cue {
            ToneCue::None => return None,
            ToneCue::Normal => self.normal_samples.as_deref(),
            ToneCue::Fatal => self.fatal_samples.as_deref(),
        };
        match loaded {
            Some(samples) => Some(Cow::Borrowed(samples)),
            None => tone_shape(cue)
                .map(|(frequency, duration)| Cow::Owned(square_wave(frequency, duration, SAMPLE_RATE))),
        }
    }

    fn open_joystick(&mut self, which: u32) {
        let Some(subsystem) = self.joystick_subsystem.as_ref() else {
            return;
        };
        match subsystem.open(which) {
            Ok(joystick) => {
                info!("joystick connected: {}", joystick.name());
                self.joysticks.push(joystick);
            }
            Err(err) => warn!("could not open joystick {which}: {err}"),
        }
    }

    fn axis_motion(&mut self, axis: u8, value: i16) {
        let (negative, positive) = match axis {
            0 => (0x4, 0x6),
            1 => (0x2, 0x8),
            _ => return,
        };
        self.joypad[negative] = value < -JOYSTICK_DEAD_ZONE;
        self.joypad[positive] = value > JOYSTICK_DEAD_ZONE;
    }

    fn handle_event(&mut self, event: Event) -> SetKeysResult {
        match event {
            Event::Quit { .. } => SetKeysResult::ShouldExit,
            Event::KeyDown {
                scancode: Some(scancode),
                repeat: false,
                ..
            } => match scancode {
                Scancode::Escape | Scancode::Q => SetKeysResult::ShouldExit,
                Scancode::R => SetKeysResult::ShouldReset,
                Scancode::F5 => SetKeysResult::ShouldSaveState,
                _ => SetKeysResult::ShouldContinue,
            },
            Event::JoyDeviceAdded { which, .. } => {
                self.open_joystick(which);
                SetKeysResult::ShouldContinue
            }
            Event::JoyDeviceRemoved { which, .. } => {
                self.joysticks.retain(|joystick| joystick.instance_id() != which);
                self.joypad = [false; 16];
                SetKeysResult::ShouldContinue
            }
            Event::JoyAxisMotion {
                axis_idx, value, ..
            } => {
                self.axis_motion(axis_idx, value);
                SetKeysResult::ShouldContinue
            }
            Event::JoyButtonDown { button_idx, .. } => match button_idx {
                JOYSTICK_FIRE_BUTTON => {
                    self.joypad[0xF] = true;
                    SetKeysResult::ShouldContinue
                }
                JOYSTICK_RESET_BUTTON => SetKeysResult::ShouldReset,
                button if JOYSTICK_QUIT_BUTTONS.contains(&button) => SetKeysResult::ShouldExit,
                _ => SetKeysResult::ShouldContinue,
            },
            Event::JoyButtonUp {
                button_idx: JOYSTICK_FIRE_BUTTON,
                ..
            } => {
                self.joypad[0xF] = false;
                SetKeysResult::ShouldContinue
            }
            _ => SetKeysResult::ShouldContinue,
        }
    }
}

impl Interactible for Hardware {
    fn init(&mut self) -> Result<(), Chip8Error> {
        let sdl_context = sdl2::init().map_err(sdl_error)?;
        let video_sbsys = sdl_context.video().map_err(sdl_error)?;

        let window = video_sbsys
            .window(
                &self.title,
                SCREEN_WIDTH as u32 * self.scale,
                SCREEN_HEIGHT as u32 * self.scale,
            )
            .position_centered()
            .build()
            .map_err(sdl_error)?;
        let mut canvas = window.into_canvas().build().map_err(sdl_error)?;
        canvas.set_draw_color(BACKGROUND);
        canvas.clear();
        canvas.present();

        self.events = Some(sdl_context.event_pump().map_err(sdl_error)?);

        // Sound and joysticks are optional extras; run without them if missing.
        let desired = AudioSpecDesired {
            freq: Some(SAMPLE_RATE),
            channels: Some(1),
            samples: None,
        };
        match sdl_context
            .audio()
            .and_then(|audio| audio.open_queue::<i16, _>(None, &desired))
        {
            Ok(queue) => {
                queue.resume();
                self.audio = Some(queue);
            }
            Err(err) => warn!("sound disabled: {err}"),
        }
        self.load_sounds();
        match sdl_context.joystick() {
            Ok(subsystem) => self.joystick_subsystem = Some(subsystem),
            Err(err) => warn!("joysticks disabled: {err}"),
        }

        self.sdl = Some(sdl_context);
        self.canvas = Some(canvas);
        debug!("SDL initialized at scale {}", self.scale);
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<(), Chip8Error> {
        self.title = title.to_string();
        match self.canvas.as_mut() {
            Some(canvas) => canvas.window_mut().set_title(title).map_err(sdl_error),
            None => Ok(()),
        }
    }

    fn update_display(&mut self, screen: &Screen) -> Result<(), Chip8Error> {
        let canvas = self
            .canvas
            .as_mut()
            .ok_or_else(|| Chip8Error::Hardware("display used before init".to_string()))?;
        canvas.set_draw_color(BACKGROUND);
        canvas.clear();

        canvas.set_draw_color(FOREGROUND);
        for (x, y) in screen {
            let xcoord = (x as u32 * self.scale) as i32;
            let ycoord = (y as u32 * self.scale) as i32;
            let rect = Rect::new(xcoord, ycoord, self.scale, self.scale);
            canvas.fill_rect(rect).map_err(sdl_error)?;
        }

        canvas.present();
        Ok(())
    }

    fn set_keys(&mut self) -> SetKeysResult {
        let Some(events) = self.events.as_mut() else {
            return SetKeysResult::ShouldExit;
        };
        let pending: Vec<Event> = events.poll_iter().collect();

        let mut result = SetKeysResult::ShouldContinue;
        for event in pending {
            match self.handle_event(event) {
                SetKeysResult::ShouldContinue => {}
                SetKeysResult::ShouldExit => return SetKeysResult::ShouldExit,
                other => result = other,
            }
        }

        let Some(events) = self.events.as_ref() else {
            return SetKeysResult::ShouldExit;
        };
        let state = events.keyboard_state();
        let mut keyboard = self.joypad;
        for (index, key) in KEYBOARD_LAYOUT.into_iter().enumerate() {
            keyboard[index] |= state.is_scancode_pressed(key);
        }
        for (key, index) in ARROW_LAYOUT {
            keyboard[index] |= state.is_scancode_pressed(key);
        }
        self.keyboard = keyboard;

        result
    }

    fn get_keys(&self) -> &[bool; 16] {
        &self.keyboard
    }
}

impl Audible for Hardware {
    fn play_tone(&mut self, cue: ToneCue) {
        let (Some(queue), Some(samples)) = (self.audio.as_ref(), self.cue_samples(cue)) else {
            return;
        };
        queue.clear();
        if let Err(err) = queue.queue_audio(&samples) {
            warn!("could not play tone: {err}");
        }
    }
}
