//! Windowless shell driven by scripted events
//!
//! Renders into a [`RecordingDevice`], advances time by a fixed step per
//! presented frame and can stop itself after a frame limit. Used by the
//! engine tests and handy for running a game in CI.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::assets::{AssetReader, FsReader, MemoryReader};
use crate::config::AssetConfig;
use crate::input::InputEvent;
use crate::platform::Shell;
use crate::render::headless::RecordingDevice;
use crate::render::Gpu;

/// Shell without a window
#[derive(Debug)]
pub struct HeadlessShell {
    device: Rc<RefCell<RecordingDevice>>,
    size: (u32, u32),
    time_step: f64,
    presented: u64,
    frame_limit: Option<u64>,
    script: VecDeque<Vec<InputEvent>>,
    reader: Option<MemoryReader>,
    close_requested: bool,
}

impl HeadlessShell {
    /// Create a `width` x `height` shell running at 60 frames per second
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            device: Rc::new(RefCell::new(RecordingDevice::new())),
            size: (width, height),
            time_step: 1.0 / 60.0,
            presented: 0,
            frame_limit: None,
            script: VecDeque::new(),
            reader: None,
            close_requested: false,
        }
    }

    /// Seconds that pass per presented frame
    pub fn with_time_step(mut self, seconds: f64) -> Self {
        self.time_step = seconds;
        self
    }

    /// Report a close request once `frames` frames have been presented
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    /// Serve assets from memory instead of the asset root
    pub fn with_reader(mut self, reader: MemoryReader) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Script the events one poll delivers
    ///
    /// Each call scripts one frame; polls consume frames in order and get
    /// nothing once the script runs out.
    pub fn script_frame(mut self, events: Vec<InputEvent>) -> Self {
        self.script.push_back(events);
        self
    }

    /// The recording device behind [`Shell::gpu`]
    pub fn device(&self) -> Rc<RefCell<RecordingDevice>> {
        self.device.clone()
    }

    /// Frames presented so far
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl Shell for HeadlessShell {
    fn gpu(&self) -> Gpu {
        self.device.clone()
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn now(&self) -> f64 {
        self.presented as f64 * self.time_step
    }

    fn poll_events(&mut self, events: &mut Vec<InputEvent>) {
        let Some(frame) = self.script.pop_front() else {
            return;
        };
        for event in frame {
            if let InputEvent::Resize { width, height } = event {
                self.size = (width, height);
            }
            events.push(event);
        }
    }

    fn present(&mut self) {
        self.presented += 1;
    }

    fn close_requested(&self) -> bool {
        self.close_requested || self.frame_limit.is_some_and(|limit| self.presented >= limit)
    }

    fn request_close(&mut self) {
        self.close_requested = true;
    }

    fn asset_reader(&self, config: &AssetConfig) -> Box<dyn AssetReader> {
        match &self.reader {
            Some(reader) => Box::new(reader.clone()),
            None => Box::new(FsReader::new(config.root.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Action, Key, Modifiers};

    #[test]
    fn test_scripted_frames_in_order() {
        let key = InputEvent::Key {
            key: Key::Space,
            modifiers: Modifiers::empty(),
            action: Action::Press,
        };
        let mut shell = HeadlessShell::new(100, 100)
            .script_frame(vec![InputEvent::Resize { width: 50, height: 40 }])
            .script_frame(vec![key]);

        let mut events = Vec::new();
        shell.poll_events(&mut events);
        assert_eq!(shell.size(), (50, 40));
        shell.poll_events(&mut events);
        shell.poll_events(&mut events);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], key);
    }

    #[test]
    fn test_frame_limit_and_time() {
        let mut shell = HeadlessShell::new(10, 10).with_time_step(0.5).with_frame_limit(2);
        assert!(!shell.close_requested());
        shell.present();
        shell.present();
        assert!(shell.close_requested());
        assert!((shell.now() - 1.0).abs() < f64::EPSILON);
    }
}
