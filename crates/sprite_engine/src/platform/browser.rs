//! Browser shell: a canvas element with a WebGL 1 context
//!
//! The canvas is appended to the element whose id equals the window title,
//! or to `<body>` when no such element exists. DOM events are queued by
//! listeners and drained once per animation frame.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlCanvasElement, KeyboardEvent, MouseEvent, WebGlRenderingContext, WheelEvent};

use crate::assets::{AssetError, AssetReader};
use crate::config::{AssetConfig, WindowConfig};
use crate::engine::EngineError;
use crate::input::{wheel_scroll, Action, InputEvent, Key, Modifiers};
use crate::platform::Shell;
use crate::render::gl::GlDevice;
use crate::render::Gpu;

type Queue = Rc<RefCell<VecDeque<InputEvent>>>;

fn js_error(context: &str, value: JsValue) -> EngineError {
    EngineError::InitializationFailed(format!("{context}: {value:?}"))
}

fn px(value: f64) -> String {
    format!("{}px", value.round())
}

/// Canvas, WebGL context and DOM event listeners
pub struct CanvasShell {
    gpu: Gpu,
    window: web_sys::Window,
    canvas: HtmlCanvasElement,
    queue: Queue,
    closed: Rc<Cell<bool>>,
    fullscreen: bool,
    size: (u32, u32),
    ratio: f64,
    listeners: Vec<(web_sys::EventTarget, &'static str, Closure<dyn FnMut(web_sys::Event)>)>,
}

impl CanvasShell {
    /// Create the canvas and its WebGL context
    pub fn open(config: &WindowConfig) -> Result<Self, EngineError> {
        let window = web_sys::window()
            .ok_or_else(|| EngineError::InitializationFailed("no window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| EngineError::InitializationFailed("no document".to_string()))?;

        let canvas = document
            .create_element("canvas")
            .map_err(|e| js_error("create canvas", e))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|e| js_error("create canvas", e.into()))?;

        let parent: web_sys::Node = match document.get_element_by_id(&config.title) {
            Some(element) => element.into(),
            None => document
                .body()
                .ok_or_else(|| EngineError::InitializationFailed("no body".to_string()))?
                .into(),
        };
        parent
            .append_child(&canvas)
            .map_err(|e| js_error("append canvas", e))?;

        let attributes = js_sys::Object::new();
        for (name, value) in [
            ("alpha", false),
            ("depth", false),
            ("premultipliedAlpha", false),
            ("preserveDrawingBuffer", false),
            ("antialias", false),
        ] {
            js_sys::Reflect::set(&attributes, &name.into(), &value.into())
                .map_err(|e| js_error("context attributes", e))?;
        }

        let context = canvas
            .get_context_with_context_options("webgl", &attributes)
            .map_err(|e| js_error("webgl context", e))?
            .ok_or_else(|| EngineError::InitializationFailed("WebGL is not available".to_string()))?
            .dyn_into::<WebGlRenderingContext>()
            .map_err(|e| js_error("webgl context", e.into()))?;

        let gl = glow::Context::from_webgl1_context(context);
        let gpu: Gpu = Rc::new(RefCell::new(GlDevice::new(gl)));

        let mut shell = Self {
            gpu,
            window,
            canvas,
            queue: Rc::new(RefCell::new(VecDeque::new())),
            closed: Rc::new(Cell::new(false)),
            fullscreen: config.fullscreen,
            size: (config.width, config.height),
            ratio: 1.0,
            listeners: Vec::new(),
        };

        shell
            .canvas
            .style()
            .set_property("display", "block")
            .map_err(|e| js_error("canvas style", e))?;
        shell.layout()?;
        shell.listen()?;

        log::info!("Opened {}x{} canvas", shell.size.0, shell.size.1);
        Ok(shell)
    }

    fn inner_size(&self) -> (f64, f64) {
        let width = self.window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let height = self.window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        (width, height)
    }

    /// Size and centre the canvas, then match the backing store and viewport
    fn layout(&mut self) -> Result<(), EngineError> {
        let (inner_width, inner_height) = self.inner_size();
        if self.fullscreen {
            self.size = (inner_width.max(1.0) as u32, inner_height.max(1.0) as u32);
        }
        let (width, height) = (f64::from(self.size.0), f64::from(self.size.1));

        let style = self.canvas.style();
        let margins = if self.fullscreen {
            (0.0, 0.0)
        } else {
            (((inner_width - width) / 2.0).max(0.0), ((inner_height - height) / 2.0).max(0.0))
        };
        for (property, value) in [
            ("margin-left", px(margins.0)),
            ("margin-top", px(margins.1)),
            ("width", px(width)),
            ("height", px(height)),
        ] {
            style
                .set_property(property, &value)
                .map_err(|e| js_error("canvas style", e))?;
        }

        self.ratio = self.window.device_pixel_ratio().max(1.0);
        let backing_width = (width * self.ratio) as u32;
        let backing_height = (height * self.ratio) as u32;
        self.canvas.set_width(backing_width);
        self.canvas.set_height(backing_height);
        self.gpu
            .borrow_mut()
            .viewport(0, 0, backing_width as i32, backing_height as i32);
        Ok(())
    }

    fn add_listener<F>(&mut self, target: web_sys::EventTarget, name: &'static str, handler: F) -> Result<(), EngineError>
    where
        F: FnMut(web_sys::Event) + 'static,
    {
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
        target
            .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
            .map_err(|e| js_error(name, e))?;
        self.listeners.push((target, name, closure));
        Ok(())
    }

    fn listen(&mut self) -> Result<(), EngineError> {
        let window: web_sys::EventTarget = self.window.clone().into();
        let canvas: web_sys::EventTarget = self.canvas.clone().into();

        for (name, release) in [("keydown", false), ("keyup", true)] {
            let queue = self.queue.clone();
            self.add_listener(window.clone(), name, move |event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                let action = match (release, event.repeat()) {
                    (true, _) => Action::Release,
                    (false, true) => Action::Repeat,
                    (false, false) => Action::Press,
                };
                let mut queue = queue.borrow_mut();
                queue.push_back(InputEvent::Key {
                    key: Key::from_code(&event.code()),
                    modifiers: modifiers(event),
                    action,
                });
                if !release {
                    let typed = event.key();
                    let mut chars = typed.chars();
                    if let (Some(ch), None) = (chars.next(), chars.next()) {
                        queue.push_back(InputEvent::Type(ch));
                    }
                }
            })?;
        }

        for (name, action) in [
            ("mousemove", Action::Move),
            ("mousedown", Action::Press),
            ("mouseup", Action::Release),
        ] {
            let queue = self.queue.clone();
            self.add_listener(canvas.clone(), name, move |event| {
                if let Some(event) = event.dyn_ref::<MouseEvent>() {
                    queue.borrow_mut().push_back(InputEvent::Mouse {
                        x: event.offset_x() as f32,
                        y: event.offset_y() as f32,
                        action,
                    });
                }
            })?;
        }

        let queue = self.queue.clone();
        self.add_listener(canvas, "wheel", move |event| {
            if let Some(dy) = event.dyn_ref::<WheelEvent>().and_then(|e| wheel_scroll(e.delta_y())) {
                queue.borrow_mut().push_back(InputEvent::Scroll(dy));
            }
        })?;

        // Placeholder size; poll_events re-runs the layout and fills it in
        let queue = self.queue.clone();
        self.add_listener(window.clone(), "resize", move |_| {
            queue.borrow_mut().push_back(InputEvent::Resize { width: 0, height: 0 });
        })?;

        let closed = self.closed.clone();
        self.add_listener(window, "unload", move |_| closed.set(true))?;
        Ok(())
    }
}

fn modifiers(event: &KeyboardEvent) -> Modifiers {
    let mut mods = Modifiers::empty();
    mods.set(Modifiers::SHIFT, event.shift_key());
    mods.set(Modifiers::CONTROL, event.ctrl_key());
    mods.set(Modifiers::ALT, event.alt_key());
    mods.set(Modifiers::SUPER, event.meta_key());
    mods
}

impl Shell for CanvasShell {
    fn gpu(&self) -> Gpu {
        self.gpu.clone()
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.ratio as f32
    }

    fn now(&self) -> f64 {
        self.window
            .performance()
            .map_or(0.0, |performance| performance.now() / 1000.0)
    }

    fn poll_events(&mut self, events: &mut Vec<InputEvent>) {
        let pending: Vec<InputEvent> = self.queue.borrow_mut().drain(..).collect();
        for event in pending {
            match event {
                InputEvent::Resize { .. } => {
                    if let Err(err) = self.layout() {
                        log::warn!("Failed to resize canvas: {err}");
                        continue;
                    }
                    events.push(InputEvent::Resize {
                        width: self.size.0,
                        height: self.size.1,
                    });
                }
                other => events.push(other),
            }
        }
    }

    fn present(&mut self) {}

    fn close_requested(&self) -> bool {
        self.closed.get()
    }

    fn request_close(&mut self) {
        self.closed.set(true);
    }

    fn asset_reader(&self, config: &AssetConfig) -> Box<dyn AssetReader> {
        Box::new(HttpReader::new(config.root.clone()))
    }
}

impl Drop for CanvasShell {
    fn drop(&mut self) {
        for (target, name, closure) in self.listeners.drain(..) {
            let _ = target.remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        }
    }
}

/// Fetches assets over HTTP relative to a URL prefix
///
/// Requests are synchronous so loading completes before `setup` like on
/// the desktop. Binary bodies are read through the `x-user-defined` charset,
/// which maps every byte to one UTF-16 code unit.
#[derive(Debug, Clone)]
pub struct HttpReader {
    root: String,
}

impl HttpReader {
    /// Resolve paths against `root`
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    fn url(&self, path: &str) -> String {
        if self.root.is_empty() {
            path.to_string()
        } else {
            format!("{}/{path}", self.root.trim_end_matches('/'))
        }
    }
}

impl AssetReader for HttpReader {
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        let url = self.url(path);
        let failed = |message: String| AssetError::Io {
            path: url.clone(),
            source: std::io::Error::new(std::io::ErrorKind::Other, message),
        };

        let request = web_sys::XmlHttpRequest::new().map_err(|e| failed(format!("{e:?}")))?;
        request
            .open_with_async("GET", &url, false)
            .map_err(|e| failed(format!("{e:?}")))?;
        request
            .override_mime_type("text/plain; charset=x-user-defined")
            .map_err(|e| failed(format!("{e:?}")))?;
        request.send().map_err(|e| failed(format!("{e:?}")))?;

        let status = request.status().map_err(|e| failed(format!("{e:?}")))?;
        if !(200..300).contains(&status) {
            return Err(failed(format!("HTTP status {status}")));
        }

        let body = request
            .response_text()
            .map_err(|e| failed(format!("{e:?}")))?
            .unwrap_or_default();
        Ok(body.chars().map(|c| (c as u32 & 0xff) as u8).collect())
    }
}

/// Call `frame` on every animation frame until it returns `false`
pub fn run_animation_frames<F>(mut frame: F) -> Result<(), EngineError>
where
    F: FnMut() -> bool + 'static,
{
    let window = web_sys::window()
        .ok_or_else(|| EngineError::InitializationFailed("no window".to_string()))?;

    let callback: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let next = callback.clone();
    let raf_window = window.clone();
    *callback.borrow_mut() = Some(Closure::new(move || {
        if !frame() {
            return;
        }
        if let Some(closure) = next.borrow().as_ref() {
            if let Err(err) = raf_window.request_animation_frame(closure.as_ref().unchecked_ref()) {
                log::error!("requestAnimationFrame failed: {err:?}");
            }
        }
    }));

    let first = callback.borrow();
    let Some(closure) = first.as_ref() else {
        return Ok(());
    };
    window
        .request_animation_frame(closure.as_ref().unchecked_ref())
        .map_err(|e| js_error("requestAnimationFrame", e))?;
    Ok(())
}
