use chip8_vm::arch::runner::DEFAULT_STATE_PATH;
use chip8_vm::arch::{Chip8, Chip8Error, Emulator, Quirks, RunOutcome, Runner};
use chip8_vm::gfx::Hardware;

use clap::Parser;
use log::{error, info, LevelFilter};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Path to the game to load
    #[arg(short, long)]
    path: PathBuf,

    /// Whether or not to turn on debug logging
    #[arg(short, long)]
    debug: bool,

    /// Log every executed instruction (implies debug logging)
    #[arg(short, long)]
    trace: bool,

    /// Window pixels per CHIP-8 pixel
    #[arg(short, long, default_value_t = 10)]
    scale: u32,

    /// Instructions executed per 60 Hz frame
    #[arg(short, long, default_value_t = 10)]
    cycles_per_frame: u32,

    /// Replace the built-in font with an 80-byte fontset file
    #[arg(long)]
    fontset: Option<PathBuf>,

    /// Seed for the random number generator
    #[arg(long)]
    seed: Option<u64>,

    /// Mask Vx with 0xF0 after 8xy4 additions, as some interpreters do
    #[arg(long)]
    quirk_add_mask: bool,

    /// Restore a save state before running
    #[arg(long)]
    load_state: Option<PathBuf>,

    /// Where F5 writes the save state
    #[arg(long, default_value = DEFAULT_STATE_PATH)]
    save_state: PathBuf,

    /// WAV file played when the sound timer counts down to 4
    #[arg(long)]
    normal_sound: Option<PathBuf>,

    /// WAV file played for the boot chime
    #[arg(long)]
    fatal_sound: Option<PathBuf>,
}

fn main() -> Result<(), Chip8Error> {
    let args = Args::parse();

    let level = if args.trace {
        LevelFilter::Trace
    } else if args.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let mut chip8 = match args.seed {
        Some(seed) => Chip8::with_seed(seed),
        None => Chip8::new(),
    };
    chip8.set_trace(args.trace);
    chip8.set_quirks(Quirks {
        add_nibble_mask: args.quirk_add_mask,
    });
    if let Some(fontset) = &args.fontset {
        chip8.set_fontset(&std::fs::read(fontset)?)?;
    }

    let hardware =
        Hardware::new(args.scale, "CHIP-8 Emulator").with_sounds(args.normal_sound, args.fatal_sound);
    let mut emulator = Runner::new(chip8, hardware)
        .with_cycles_per_frame(args.cycles_per_frame)
        .with_state_path(args.save_state);
    emulator.load_game(&args.path)?;
    if let Some(state) = &args.load_state {
        emulator.chip8_mut().load_state(state)?;
    }

    match emulator.run()? {
        RunOutcome::Quit => info!("quitting"),
        RunOutcome::Faulted => error!("the program stopped on a fault"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["chip8-vm", "-p", "pong.ch8"]).unwrap();
        assert_eq!(args.path, PathBuf::from("pong.ch8"));
        assert_eq!(args.scale, 10);
        assert_eq!(args.cycles_per_frame, 10);
        assert_eq!(args.save_state, PathBuf::from(DEFAULT_STATE_PATH));
        assert!(args.normal_sound.is_none());
        assert!(args.fatal_sound.is_none());
    }

    #[test]
    fn sound_files() {
        let args = Args::try_parse_from([
            "chip8-vm",
            "--path",
            "pong.ch8",
            "--normal-sound",
            "sfx/normal.wav",
            "--fatal-sound",
            "sfx/fatal.wav",
        ])
        .unwrap();
        assert_eq!(args.normal_sound, Some(PathBuf::from("sfx/normal.wav")));
        assert_eq!(args.fatal_sound, Some(PathBuf::from("sfx/fatal.wav")));
    }

    #[test]
    fn path_is_required() {
        assert!(Args::try_parse_from(["chip8-vm"]).is_err());
    }
}
