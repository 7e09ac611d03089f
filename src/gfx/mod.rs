mod audible;
mod drawable;
#[cfg(feature = "sdl")]
mod hardware;
mod interactible;
mod mockhardware;
mod screen;

pub use audible::Audible;
pub use drawable::Drawable;
#[cfg(feature = "sdl")]
pub use hardware::Hardware;
pub use interactible::Interactible;
pub use interactible::SetKeysResult;
pub use mockhardware::MockHardware;
pub use screen::{Screen, ScreenIterator, SCREEN_HEIGHT, SCREEN_WIDTH};
