//! Android placeholder
//!
//! There is no Android shell yet; opening one reports
//! [`EngineError::Unsupported`] so games fail at startup instead of at the
//! first frame. [`HeadlessShell`](super::headless::HeadlessShell) still works
//! on Android for tests.

use crate::config::WindowConfig;
use crate::engine::EngineError;
use crate::input::InputEvent;
use crate::platform::Shell;
use crate::render::Gpu;

/// Uninhabited Android shell
#[derive(Debug)]
pub enum AndroidShell {}

impl AndroidShell {
    /// Always fails with [`EngineError::Unsupported`]
    pub fn open(_config: &WindowConfig) -> Result<Self, EngineError> {
        log::error!("No Android shell is available");
        Err(EngineError::Unsupported("android"))
    }
}

impl Shell for AndroidShell {
    fn gpu(&self) -> Gpu {
        match *self {}
    }

    fn size(&self) -> (u32, u32) {
        match *self {}
    }

    fn now(&self) -> f64 {
        match *self {}
    }

    fn poll_events(&mut self, _events: &mut Vec<InputEvent>) {
        match *self {}
    }

    fn present(&mut self) {
        match *self {}
    }

    fn close_requested(&self) -> bool {
        match *self {}
    }

    fn request_close(&mut self) {
        match *self {}
    }
}
