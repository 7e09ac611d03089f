use crate::arch::ToneCue;

/// Something that can turn tone cues into sound.
pub trait Audible {
    fn play_tone(&mut self, cue: ToneCue);
}
