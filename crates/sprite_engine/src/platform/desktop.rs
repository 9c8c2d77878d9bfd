//! Desktop shell: a GLFW window with an OpenGL 2.1 context

#![allow(unsafe_code)]

use std::cell::RefCell;
use std::rc::Rc;

use glfw::{Context as _, Glfw, GlfwReceiver, PWindow, WindowEvent, WindowHint, WindowMode};

use crate::config::WindowConfig;
use crate::engine::EngineError;
use crate::input::{Action, InputEvent};
use crate::platform::Shell;
use crate::render::gl::GlDevice;
use crate::render::{Gpu, GpuDevice};

type Window = (PWindow, GlfwReceiver<(f64, WindowEvent)>);

/// GLFW window and OpenGL context
pub struct GlfwShell {
    // Dropped first so GL objects are released while the context is alive
    gpu: Gpu,
    window: PWindow,
    events: GlfwReceiver<(f64, WindowEvent)>,
    glfw: Glfw,
    size: (u32, u32),
}

impl GlfwShell {
    /// Create the window, make its context current and load OpenGL
    pub fn open(config: &WindowConfig) -> Result<Self, EngineError> {
        let mut glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|e| EngineError::InitializationFailed(format!("GLFW: {e:?}")))?;

        glfw.window_hint(WindowHint::ContextVersion(2, 1));

        let (mut window, events) = if config.fullscreen {
            Self::create_fullscreen(&mut glfw, &config.title)
        } else {
            Self::create_windowed(&mut glfw, config)
        }
        .ok_or_else(|| EngineError::InitializationFailed("window creation failed".to_string()))?;

        window.make_current();
        if config.vsync {
            glfw.set_swap_interval(glfw::SwapInterval::Sync(1));
        }
        window.set_all_polling(true);

        let gl = unsafe {
            glow::Context::from_loader_function(|symbol| window.get_proc_address(symbol) as *const _)
        };
        let mut device = GlDevice::new(gl);
        let (fb_width, fb_height) = window.get_framebuffer_size();
        device.viewport(0, 0, fb_width, fb_height);
        let gpu: Gpu = Rc::new(RefCell::new(device));

        let (width, height) = window.get_size();
        log::info!("Opened {width}x{height} window \"{}\"", config.title);

        Ok(Self {
            gpu,
            window,
            events,
            glfw,
            size: (width.max(0) as u32, height.max(0) as u32),
        })
    }

    fn create_fullscreen(glfw: &mut Glfw, title: &str) -> Option<Window> {
        glfw.window_hint(WindowHint::Decorated(false));
        glfw.with_primary_monitor(|glfw, monitor| {
            let monitor = monitor?;
            let mode = monitor.get_video_mode()?;
            glfw.create_window(mode.width, mode.height, title, WindowMode::FullScreen(monitor))
        })
    }

    fn create_windowed(glfw: &mut Glfw, config: &WindowConfig) -> Option<Window> {
        let screen = glfw.with_primary_monitor(|_, monitor| {
            monitor
                .and_then(|m| m.get_video_mode())
                .map(|mode| (mode.width, mode.height))
        });

        let (mut window, events) =
            glfw.create_window(config.width, config.height, &config.title, WindowMode::Windowed)?;

        if let Some((screen_width, screen_height)) = screen {
            let x = (i64::from(screen_width) - i64::from(config.width)) / 2;
            let y = (i64::from(screen_height) - i64::from(config.height)) / 2;
            window.set_pos(x as i32, y as i32);
        }
        Some((window, events))
    }

    fn translate(&mut self, event: WindowEvent, out: &mut Vec<InputEvent>) {
        match event {
            WindowEvent::FramebufferSize(fb_width, fb_height) => {
                self.gpu.borrow_mut().viewport(0, 0, fb_width, fb_height);
                let (width, height) = self.window.get_size();
                self.size = (width.max(0) as u32, height.max(0) as u32);
                out.push(InputEvent::Resize {
                    width: self.size.0,
                    height: self.size.1,
                });
            }
            WindowEvent::Key(key, _, action, modifiers) => out.push(InputEvent::Key {
                key: key.into(),
                modifiers: modifiers.into(),
                action: action.into(),
            }),
            WindowEvent::Char(ch) => out.push(InputEvent::Type(ch)),
            WindowEvent::CursorPos(x, y) => out.push(InputEvent::Mouse {
                x: x as f32,
                y: y as f32,
                action: Action::Move,
            }),
            WindowEvent::MouseButton(_, action, _) => {
                let (x, y) = self.window.get_cursor_pos();
                let action = if action == glfw::Action::Press {
                    Action::Press
                } else {
                    Action::Release
                };
                out.push(InputEvent::Mouse {
                    x: x as f32,
                    y: y as f32,
                    action,
                });
            }
            WindowEvent::Scroll(_, dy) => out.push(InputEvent::Scroll(dy as f32)),
            _ => {}
        }
    }
}

impl Shell for GlfwShell {
    fn gpu(&self) -> Gpu {
        self.gpu.clone()
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn device_pixel_ratio(&self) -> f32 {
        let (fb_width, _) = self.window.get_framebuffer_size();
        if self.size.0 == 0 {
            1.0
        } else {
            fb_width as f32 / self.size.0 as f32
        }
    }

    fn now(&self) -> f64 {
        self.glfw.get_time()
    }

    fn poll_events(&mut self, events: &mut Vec<InputEvent>) {
        self.glfw.poll_events();
        let pending: Vec<WindowEvent> = glfw::flush_messages(&self.events)
            .map(|(_, event)| event)
            .collect();
        for event in pending {
            self.translate(event, events);
        }
    }

    fn present(&mut self) {
        self.window.swap_buffers();
    }

    fn close_requested(&self) -> bool {
        self.window.should_close()
    }

    fn request_close(&mut self) {
        self.window.set_should_close(true);
    }
}
