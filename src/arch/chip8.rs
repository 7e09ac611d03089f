use crate::arch::error::Chip8Error;
use crate::arch::instruction_set::InstructionSet;
use crate::arch::opcode::Opcode;
use crate::arch::timers::{Timers, ToneCue};
use crate::arch::trace::{TraceRecord, TRACE_TARGET};
use crate::gfx::{Drawable, Screen};

use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

pub const MEMORY_SIZE: usize = 4096;
pub const ADDRESS_MASK: u16 = 0xFFF;
pub const PROGRAM_START: u16 = 0x200;
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;
pub const FONTSET_SIZE: usize = 80;
const FONT_GLYPH_SIZE: u16 = 5;

pub const FONTSET: [u8; FONTSET_SIZE] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Optional deviations from the default instruction semantics.
pub struct Quirks {
    /// Mask the result of 8XY4 with 0xF0 after the carry is computed,
    /// as some historical interpreters did.
    pub add_nibble_mask: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// What a call to `Chip8::step()` did.
pub enum StepStatus {
    /// One instruction ran to completion.
    Executed,
    /// FX0A is waiting for a key; PC still points at it.
    AwaitingKey,
    /// The machine is faulted and nothing changed.
    Halted,
}

fn entropy_rng() -> Box<dyn RngCore> {
    Box::new(StdRng::from_entropy())
}

#[serde_as]
#[derive(Serialize, Deserialize)]
pub struct Chip8 {
    // Core structural components.
    opcode: Opcode,
    #[serde_as(as = "[_; 4096]")]
    memory: [u8; MEMORY_SIZE],
    registers: [u8; 16],
    index_reg: u16,
    pc: u16,
    timers: Timers,
    stack: [u16; 16],
    sp: u16,
    #[serde(skip, default = "entropy_rng")]
    rng: Box<dyn RngCore>,

    // Interactive components.
    screen: Screen,
    keys: [bool; 16],
    #[serde_as(as = "[_; 80]")]
    fontset: [u8; FONTSET_SIZE],
    draw_flag: bool,

    // Configuration and bookkeeping.
    quirks: Quirks,
    faulted: bool,
    cycles: u64,
    #[serde(skip)]
    trace: bool,
}

/// Machine cycles charged for an instruction once it has completed.
fn cycle_cost(opcode: &Opcode) -> u64 {
    match opcode.group() {
        0x0 => match opcode.value {
            0x00E0 | 0x00EE => 2,
            _ => 6,
        },
        0x1 | 0xA | 0xD | 0xF => 3,
        0x6 | 0xE => 1,
        0xB => 4,
        _ => 2,
    }
}

impl Chip8 {
    /// A freshly reset machine whose random numbers come from system entropy.
    pub fn new() -> Chip8 {
        Chip8::with_boxed_rng(entropy_rng())
    }

    /// A freshly reset machine with a reproducible random number sequence.
    pub fn with_seed(seed: u64) -> Chip8 {
        Chip8::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: impl RngCore + 'static) -> Chip8 {
        Chip8::with_boxed_rng(Box::new(rng))
    }

    fn with_boxed_rng(rng: Box<dyn RngCore>) -> Chip8 {
        let mut c8 = Chip8 {
            opcode: Opcode::default(),
            memory: [0; MEMORY_SIZE],
            registers: [0; 16],
            index_reg: 0,
            pc: PROGRAM_START,
            timers: Timers::default(),
            stack: [0; 16],
            sp: 0,
            rng,
            screen: Screen::new(),
            keys: [false; 16],
            fontset: FONTSET,
            draw_flag: false,
            quirks: Quirks::default(),
            faulted: false,
            cycles: 0,
            trace: false,
        };
        c8.reset();
        c8
    }

    /// Return the machine to its power-on state. The program region
    /// is left alone, so a loaded program starts over.
    pub fn reset(&mut self) {
        self.memory[..FONTSET_SIZE].copy_from_slice(&self.fontset);
        self.opcode = Opcode::default();
        self.registers = [0; 16];
        self.index_reg = 0;
        self.pc = PROGRAM_START;
        self.timers = Timers::after_reset();
        self.stack = [0; 16];
        self.sp = 0;
        self.screen.clear_all_pixels();
        self.keys = [false; 16];
        self.draw_flag = true;
        self.faulted = false;
        self.cycles = 0;
        debug!("machine reset");
    }

    /// Copy a program into memory at 0x200. Nothing else is touched.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), Chip8Error> {
        if program.is_empty() {
            return Err(Chip8Error::EmptyProgram);
        }
        if program.len() > MAX_PROGRAM_SIZE {
            return Err(Chip8Error::ProgramTooLarge {
                size: program.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }

        let start = PROGRAM_START as usize;
        self.memory[start..start + program.len()].copy_from_slice(program);
        info!("loaded {} byte program at {:#05X}", program.len(), start);
        Ok(())
    }

    /// Replace the built-in hex font. Takes effect immediately and on every reset.
    pub fn set_fontset(&mut self, fontset: &[u8]) -> Result<(), Chip8Error> {
        self.fontset = fontset
            .try_into()
            .map_err(|_| Chip8Error::InvalidFontset {
                size: fontset.len(),
            })?;
        self.memory[..FONTSET_SIZE].copy_from_slice(&self.fontset);
        Ok(())
    }

    pub fn set_quirks(&mut self, quirks: Quirks) {
        self.quirks = quirks;
    }

    pub fn quirks(&self) -> Quirks {
        self.quirks
    }

    /// Emit a `TraceRecord` for every instruction fetched.
    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    /// Fetch, decode and execute exactly one instruction.
    pub fn step(&mut self) -> Result<StepStatus, Chip8Error> {
        if self.faulted {
            return Ok(StepStatus::Halted);
        }

        self.opcode = match self.fetch() {
            Ok(opcode) => opcode,
            Err(err) => {
                self.fault(&err);
                return Err(err);
            }
        };
        self.increment_pc();

        if self.trace {
            trace!(target: TRACE_TARGET, "{}", self.trace_record());
        }

        match self.decode_execute() {
            Ok(StepStatus::Executed) => {
                self.cycles += cycle_cost(&self.opcode);
                Ok(StepStatus::Executed)
            }
            Ok(status) => Ok(status),
            Err(err) => {
                self.fault(&err);
                Err(err)
            }
        }
    }

    /// Advance both timers by one tick (60 Hz) and report any tone cue.
    pub fn tick_timers(&mut self) -> ToneCue {
        if self.faulted {
            return ToneCue::None;
        }
        self.timers.tick()
    }

    pub fn set_keys(&mut self, keys: [bool; 16]) {
        self.keys = keys;
    }

    pub fn set_key(&mut self, key: u8, pressed: bool) {
        self.keys[(key & 0xF) as usize] = pressed;
    }

    pub fn keys(&self) -> &[bool; 16] {
        &self.keys
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// True if the display changed since the last call.
    pub fn take_draw_flag(&mut self) -> bool {
        std::mem::take(&mut self.draw_flag)
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycles
    }

    pub fn registers(&self) -> &[u8; 16] {
        &self.registers
    }

    pub fn index_reg(&self) -> u16 {
        self.index_reg
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn sp(&self) -> u16 {
        self.sp
    }

    pub fn delay_timer(&self) -> u8 {
        self.timers.delay
    }

    pub fn sound_timer(&self) -> u8 {
        self.timers.sound()
    }

    pub fn memory(&self) -> &[u8; MEMORY_SIZE] {
        &self.memory
    }

    pub fn save_state_to(&self, writer: impl Write) -> Result<(), Chip8Error> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Replace the whole machine with a saved one. The random number
    /// generator and trace setting are kept.
    pub fn load_state_from(&mut self, reader: impl Read) -> Result<(), Chip8Error> {
        let mut restored: Chip8 = serde_json::from_reader(reader)?;
        std::mem::swap(&mut restored.rng, &mut self.rng);
        restored.trace = self.trace;
        restored.draw_flag = true;
        *self = restored;
        Ok(())
    }

    pub fn save_state(&self, path: &Path) -> Result<(), Chip8Error> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.save_state_to(&mut writer)?;
        writer.flush()?;
        info!("saved state to {}", path.display());
        Ok(())
    }

    pub fn load_state(&mut self, path: &Path) -> Result<(), Chip8Error> {
        self.load_state_from(BufReader::new(File::open(path)?))?;
        info!("loaded state from {}", path.display());
        Ok(())
    }

    fn fetch(&self) -> Result<Opcode, Chip8Error> {
        let address = (self.pc & ADDRESS_MASK) as usize;
        let high = self.memory[address];
        let low = *self
            .memory
            .get(address + 1)
            .ok_or(Chip8Error::OutOfBounds {
                address: address + 1,
            })?;
        Ok(Opcode::from_bytes(high, low))
    }

    fn fault(&mut self, err: &Chip8Error) {
        self.faulted = true;
        warn!("machine faulted: {err}");
    }

    fn trace_record(&self) -> TraceRecord {
        TraceRecord {
            opcode: self.opcode,
            index_reg: self.index_reg,
            vx: self.registers[self.opcode.xreg],
            vy: self.registers[self.opcode.yreg],
            registers: self.registers,
            sp: self.sp,
            pc: self.pc,
            cycles: self.cycles,
        }
    }

    fn read_byte(&self, address: u16) -> u8 {
        self.memory[(address & ADDRESS_MASK) as usize]
    }

    fn write_byte(&mut self, address: u16, value: u8) {
        self.memory[(address & ADDRESS_MASK) as usize] = value;
    }

    fn increment_pc(&mut self) {
        self.pc = self.pc.wrapping_add(2);
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.increment_pc();
        }
    }

    fn undecodable(&self) -> Chip8Error {
        Chip8Error::UndecodableOpcode {
            opcode: self.opcode.value,
            pc: self.pc.wrapping_sub(2) & ADDRESS_MASK,
        }
    }

    fn decode_execute(&mut self) -> Result<StepStatus, Chip8Error> {
        let value = self.opcode.value;

        match self.opcode.group() {
            0x0 => match value {
                0x00E0 => self.clear_screen(),
                0x00EE => self.r#return(),
                _ if value & 0xFF00 == 0 && value != 0 => return Err(self.undecodable()),
                _ => self.sys(),
            },
            0x1 => self.jump(),
            0x2 => self.call(),
            0x3 => self.skip_if_eq_literal(),
            0x4 => self.skip_if_ne_literal(),
            0x5 => match self.opcode.nibble {
                0x0 => self.skip_if_eq_reg(),
                _ => return Err(self.undecodable()),
            },
            0x6 => self.set_reg_to_literal(),
            0x7 => self.add(),
            0x8 => match self.opcode.nibble {
                0x0 => self.set_reg_to_reg(),
                0x1 => self.or(),
                0x2 => self.and(),
                0x3 => self.xor(),
                0x4 => self.add_with_carry(),
                0x5 => self.sub_y_from_x(),
                0x6 => self.shift_right(),
                0x7 => self.sub_x_from_y(),
                0xE => self.shift_left(),
                _ => return Err(self.undecodable()),
            },
            0x9 => match self.opcode.nibble {
                0x0 => self.skip_if_ne_reg(),
                _ => return Err(self.undecodable()),
            },
            0xA => self.set_index(),
            0xB => self.jump_with_offset(),
            0xC => self.set_reg_to_random(),
            0xD => self.draw_sprite(),
            0xE => match self.opcode.byte {
                0x9E => self.skip_if_key_pressed(),
                0xA1 => self.skip_if_key_not_pressed(),
                _ => return Err(self.undecodable()),
            },
            0xF => match self.opcode.byte {
                0x07 => self.get_delay_timer(),
                0x0A => {
                    if !self.wait_for_key() {
                        return Ok(StepStatus::AwaitingKey);
                    }
                }
                0x15 => self.set_delay_timer(),
                0x18 => self.set_sound_timer(),
                0x1E => self.add_to_index(),
                0x29 => self.set_index_to_font(),
                0x33 => self.store_bcd(),
                0x55 => self.save_registers(),
                0x65 => self.restore_registers(),
                _ => return Err(self.undecodable()),
            },
            _ => return Err(self.undecodable()),
        }

        Ok(StepStatus::Executed)
    }
}

impl InstructionSet for Chip8 {
    fn sys(&mut self) {
        self.pc = self.opcode.literal;
    }

    fn call(&mut self) {
        // The stack is a ring: the 17th nested call overwrites the oldest entry.
        self.stack[(self.sp & 0xF) as usize] = self.pc;
        self.sp = (self.sp + 1) & 0xF;
        self.pc = self.opcode.literal;
    }

    fn r#return(&mut self) {
        self.sp = self.sp.wrapping_sub(1) & 0xF;
        self.pc = self.stack[self.sp as usize];
    }

    fn jump(&mut self) {
        self.pc = self.opcode.literal;
    }

    fn jump_with_offset(&mut self) {
        self.pc = self.opcode.literal + self.registers[0] as u16;
    }

    fn skip_if_eq_literal(&mut self) {
        self.skip_if(self.registers[self.opcode.xreg] == self.opcode.byte);
    }

    fn skip_if_ne_literal(&mut self) {
        self.skip_if(self.registers[self.opcode.xreg] != self.opcode.byte);
    }

    fn skip_if_eq_reg(&mut self) {
        self.skip_if(self.registers[self.opcode.xreg] == self.registers[self.opcode.yreg]);
    }

    fn skip_if_ne_reg(&mut self) {
        self.skip_if(self.registers[self.opcode.xreg] != self.registers[self.opcode.yreg]);
    }

    fn skip_if_key_pressed(&mut self) {
        let key = (self.registers[self.opcode.xreg] & 0xF) as usize;
        self.skip_if(self.keys[key]);
    }

    fn skip_if_key_not_pressed(&mut self) {
        let key = (self.registers[self.opcode.xreg] & 0xF) as usize;
        self.skip_if(!self.keys[key]);
    }

    fn set_reg_to_literal(&mut self) {
        self.registers[self.opcode.xreg] = self.opcode.byte;
    }

    fn set_reg_to_reg(&mut self) {
        self.registers[self.opcode.xreg] = self.registers[self.opcode.yreg];
    }

    fn set_reg_to_random(&mut self) {
        let random: u8 = self.rng.gen();
        self.registers[self.opcode.xreg] = random & self.opcode.byte;
    }

    fn add(&mut self) {
        let x = self.opcode.xreg;
        self.registers[x] = self.registers[x].wrapping_add(self.opcode.byte);
    }

    fn add_with_carry(&mut self) {
        let (sum, overflowed) =
            self.registers[self.opcode.xreg].overflowing_add(self.registers[self.opcode.yreg]);

        self.registers[self.opcode.xreg] = if self.quirks.add_nibble_mask {
            sum & 0xF0
        } else {
            sum
        };
        self.registers[0xF] = overflowed as u8;
    }

    fn or(&mut self) {
        let opcode = &self.opcode;
        self.registers[opcode.xreg] |= self.registers[opcode.yreg];
    }

    fn and(&mut self) {
        let opcode = &self.opcode;
        self.registers[opcode.xreg] &= self.registers[opcode.yreg];
    }

    fn xor(&mut self) {
        let opcode = &self.opcode;
        self.registers[opcode.xreg] ^= self.registers[opcode.yreg];
    }

    fn sub_x_from_y(&mut self) {
        let (diff, underflowed) =
            self.registers[self.opcode.yreg].overflowing_sub(self.registers[self.opcode.xreg]);

        self.registers[self.opcode.xreg] = diff;
        self.registers[0xF] = !underflowed as u8; // inverted, save 0 on underflow
    }

    fn sub_y_from_x(&mut self) {
        let (diff, underflowed) =
            self.registers[self.opcode.xreg].overflowing_sub(self.registers[self.opcode.yreg]);

        self.registers[self.opcode.xreg] = diff;
        self.registers[0xF] = !underflowed as u8; // inverted, save 0 on underflow
    }

    fn shift_right(&mut self) {
        let val = self.registers[self.opcode.xreg];

        // Set VF to least significant bit of Xreg before shifting.
        self.registers[self.opcode.xreg] = val >> 1;
        self.registers[0xF] = val & 0x1;
    }

    fn shift_left(&mut self) {
        let val = self.registers[self.opcode.xreg];

        // Set VF to most significant bit of Xreg before shifting.
        self.registers[self.opcode.xreg] = val << 1;
        self.registers[0xF] = (val >> 7) & 0x1;
    }

    fn set_index(&mut self) {
        self.index_reg = self.opcode.literal;
    }

    fn add_to_index(&mut self) {
        self.index_reg = self
            .index_reg
            .wrapping_add(self.registers[self.opcode.xreg] as u16);
    }

    fn set_index_to_font(&mut self) {
        self.index_reg = FONT_GLYPH_SIZE * self.registers[self.opcode.xreg] as u16;
    }

    fn store_bcd(&mut self) {
        let val = self.registers[self.opcode.xreg];
        let index = self.index_reg;

        self.write_byte(index, val / 100);
        self.write_byte(index.wrapping_add(1), (val / 10) % 10);
        self.write_byte(index.wrapping_add(2), val % 10);
    }

    fn save_registers(&mut self) {
        let last = self.opcode.xreg;
        for reg in 0..=last {
            self.write_byte(self.index_reg.wrapping_add(reg as u16), self.registers[reg]);
        }
        self.index_reg = self.index_reg.wrapping_add(last as u16 + 1);
    }

    fn restore_registers(&mut self) {
        let last = self.opcode.xreg;
        for reg in 0..=last {
            self.registers[reg] = self.read_byte(self.index_reg.wrapping_add(reg as u16));
        }
        self.index_reg = self.index_reg.wrapping_add(last as u16 + 1);
    }

    fn get_delay_timer(&mut self) {
        self.registers[self.opcode.xreg] = self.timers.delay;
    }

    fn set_delay_timer(&mut self) {
        self.timers.delay = self.registers[self.opcode.xreg];
    }

    fn set_sound_timer(&mut self) {
        self.timers.set_sound(self.registers[self.opcode.xreg]);
    }

    fn clear_screen(&mut self) {
        self.screen.clear_all_pixels();
        self.draw_flag = true;
    }

    fn draw_sprite(&mut self) {
        // Coordinates are latched before VF is cleared, so drawing at VF works.
        let x = self.registers[self.opcode.xreg] as usize;
        let y = self.registers[self.opcode.yreg] as usize;
        let height = self.opcode.nibble as usize;

        self.registers[0xF] = 0;
        for row in 0..height {
            let sprite = self.read_byte(self.index_reg.wrapping_add(row as u16));
            for bit in 0..8 {
                let set = (sprite >> bit) & 0x1 == 1;
                if self.screen.xor_pixel(x + (7 - bit), y + row, set) {
                    self.registers[0xF] = 1;
                }
            }
        }
        self.draw_flag = true;
    }

    fn wait_for_key(&mut self) -> bool {
        match self.keys.iter().position(|&pressed| pressed) {
            Some(key) => {
                self.registers[self.opcode.xreg] = key as u8;
                true
            }
            None => {
                // Rewind so the same instruction runs on the next step.
                self.pc = self.pc.wrapping_sub(2);
                false
            }
        }
    }
}

impl Default for Chip8 {
    fn default() -> Chip8 {
        Chip8::new()
    }
}
