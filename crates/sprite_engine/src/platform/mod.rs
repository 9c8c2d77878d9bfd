//! Platform shells
//!
//! A [`Shell`] owns the window (or canvas), the GPU context and the native
//! event source. The engine only talks to this trait; the concrete shell is
//! chosen at build time:
//!
//! | target            | [`NativeShell`]              |
//! |-------------------|------------------------------|
//! | desktop           | GLFW window, OpenGL 2.1      |
//! | `wasm32`          | canvas element, WebGL 1      |
//! | Android           | stub reporting `Unsupported` |
//!
//! [`headless::HeadlessShell`] runs everywhere and drives the engine from
//! scripted events for tests and tools.

use crate::assets::{AssetReader, FsReader};
use crate::config::AssetConfig;
use crate::input::InputEvent;
use crate::render::Gpu;

pub mod headless;

#[cfg(not(any(target_arch = "wasm32", target_os = "android")))]
pub mod desktop;

#[cfg(target_arch = "wasm32")]
pub mod browser;

#[cfg(target_os = "android")]
pub mod android;

/// The shell for the current build target
#[cfg(not(any(target_arch = "wasm32", target_os = "android")))]
pub type NativeShell = desktop::GlfwShell;

/// The shell for the current build target
#[cfg(target_arch = "wasm32")]
pub type NativeShell = browser::CanvasShell;

/// The shell for the current build target
#[cfg(target_os = "android")]
pub type NativeShell = android::AndroidShell;

/// Window, GPU context and event source for one engine instance
pub trait Shell {
    /// Handle to the GPU device of this shell's context
    fn gpu(&self) -> Gpu;

    /// Drawable size in logical pixels
    fn size(&self) -> (u32, u32);

    /// Framebuffer pixels per logical pixel
    fn device_pixel_ratio(&self) -> f32 {
        1.0
    }

    /// Monotonic time in seconds
    fn now(&self) -> f64;

    /// Move pending events into `events`, in arrival order
    fn poll_events(&mut self, events: &mut Vec<InputEvent>);

    /// Show the frame just rendered
    fn present(&mut self);

    /// Whether the user asked to close the window
    fn close_requested(&self) -> bool;

    /// Ask the shell to close at the end of the frame
    fn request_close(&mut self);

    /// Reader for queued assets
    fn asset_reader(&self, config: &AssetConfig) -> Box<dyn AssetReader> {
        Box::new(FsReader::new(config.root.clone()))
    }
}
