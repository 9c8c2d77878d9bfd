//! Core engine implementation
//!
//! [`Engine`] drives a [`Game`] through its lifecycle on top of a
//! [`Shell`]:
//!
//! ```text
//! Created -> Preload -> Loading -> Setup -> Running -> Closing -> Disposed
//! ```
//!
//! Each running frame polls input and dispatches it to the game, updates,
//! clears to the background colour, renders, presents and ticks the clock.
//! The loop ends when the shell reports a close request or the game calls
//! [`Context::exit`]. A failing callback ends it too; the error is returned
//! after [`Game::close`] has run.

use std::collections::HashMap;

use thiserror::Error;

use crate::application::{AppError, Game};
use crate::assets::{AssetCache, AssetError, Image};
use crate::config::{ConfigError, EngineConfig};
use crate::foundation::math::rgb_to_f32;
use crate::foundation::time::FrameClock;
use crate::input::InputEvent;
use crate::platform::Shell;
use crate::render::{Batch, Gpu, RenderError, RenderResult, Texture, TextureFilter};

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// The window, GPU context or platform could not be set up
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// The build target has no shell
    #[error("Platform not supported: {0}")]
    Unsupported(&'static str),

    /// Asset loading failed
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// Rendering failed outside a game callback
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Configuration was rejected
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A game callback failed
    #[error("Application error in {stage}: {source}")]
    Application {
        /// Callback that failed
        stage: &'static str,
        /// Error returned by the game
        source: AppError,
    },
}

/// Lifecycle state of an [`Engine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopState {
    /// Constructed, not started
    Created,
    /// Running [`Game::preload`]
    Preload,
    /// Loading queued assets
    Loading,
    /// Running [`Game::setup`]
    Setup,
    /// Running frames
    Running,
    /// Running [`Game::close`]
    Closing,
    /// Finished; no further frames run
    Disposed,
}

/// Per-engine state handed to every game callback
pub struct Context {
    assets: AssetCache,
    gpu: Gpu,
    clock: FrameClock,
    size: (u32, u32),
    pixel_ratio: f32,
    background: u32,
    textures: HashMap<String, Texture>,
    filter: TextureFilter,
    batch_capacity: usize,
    exit_requested: bool,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("assets", &self.assets)
            .field("clock", &self.clock)
            .field("size", &self.size)
            .field("background", &self.background)
            .field("textures", &self.textures.len())
            .field("exit_requested", &self.exit_requested)
            .finish_non_exhaustive()
    }
}

impl Context {
    fn new(shell: &dyn Shell, config: &EngineConfig) -> Self {
        Self {
            assets: AssetCache::new(shell.asset_reader(&config.assets)),
            gpu: shell.gpu(),
            clock: FrameClock::starting_at(shell.now()),
            size: shell.size(),
            pixel_ratio: shell.device_pixel_ratio(),
            background: config.background,
            textures: HashMap::new(),
            filter: config.assets.filter,
            batch_capacity: config.batch.capacity,
            exit_requested: false,
        }
    }

    /// Asset cache
    pub fn assets(&self) -> &AssetCache {
        &self.assets
    }

    /// Mutable asset cache, for queuing assets in [`Game::preload`]
    pub fn assets_mut(&mut self) -> &mut AssetCache {
        &mut self.assets
    }

    /// GPU handle of the shell's context
    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    /// Frame clock
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Viewport width in logical pixels
    pub fn width(&self) -> u32 {
        self.size.0
    }

    /// Viewport height in logical pixels
    pub fn height(&self) -> u32 {
        self.size.1
    }

    /// Framebuffer pixels per logical pixel
    pub fn device_pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Clear colour as `0xRRGGBB`
    pub fn background(&self) -> u32 {
        self.background
    }

    /// Change the clear colour
    pub fn set_background(&mut self, rgb: u32) {
        self.background = rgb & 0xff_ff_ff;
    }

    /// End the loop after the current frame
    pub fn exit(&mut self) {
        log::info!("Exit requested");
        self.exit_requested = true;
    }

    /// Whether [`Context::exit`] was called
    pub fn is_exiting(&self) -> bool {
        self.exit_requested
    }

    /// Texture for a loaded asset, uploaded on first use
    pub fn texture(&mut self, key: &str) -> Result<Texture, AppError> {
        if let Some(texture) = self.textures.get(key) {
            return Ok(*texture);
        }
        let image = self.assets.get(key)?;
        let texture = Texture::upload(&self.gpu, &image, self.filter)?;
        log::debug!("Uploaded texture {key} ({}x{})", texture.width(), texture.height());
        self.textures.insert(key.to_string(), texture);
        Ok(texture)
    }

    /// Upload an image that does not come from the asset cache
    pub fn upload(&self, image: &Image) -> RenderResult<Texture> {
        Texture::upload(&self.gpu, image, self.filter)
    }

    /// Batch with the configured capacity and a projection for the viewport
    pub fn new_batch(&self) -> RenderResult<Batch> {
        let mut batch = Batch::new(&self.gpu, self.batch_capacity)?;
        batch.set_projection(self.size.0 as f32, self.size.1 as f32);
        Ok(batch)
    }

    fn release_textures(&mut self) {
        let mut gpu = self.gpu.borrow_mut();
        for (_, texture) in self.textures.drain() {
            gpu.delete_texture(texture.id());
        }
    }
}

/// Drives a [`Game`] on a [`Shell`]
pub struct Engine<S: Shell, G: Game> {
    game: G,
    context: Context,
    shell: S,
    state: LoopState,
    setup_done: bool,
    events: Vec<InputEvent>,
}

impl<S: Shell, G: Game> Engine<S, G> {
    /// Create an engine; nothing runs until [`Engine::start`]
    pub fn new(shell: S, config: &EngineConfig, game: G) -> Result<Self, EngineError> {
        config.validate()?;
        let context = Context::new(&shell, config);
        Ok(Self {
            game,
            context,
            shell,
            state: LoopState::Created,
            setup_done: false,
            events: Vec::new(),
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// The game
    pub fn game(&self) -> &G {
        &self.game
    }

    /// Callback context
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The shell
    pub fn shell(&self) -> &S {
        &self.shell
    }

    fn enter(&mut self, state: LoopState) {
        log::debug!("{:?} -> {state:?}", self.state);
        self.state = state;
    }

    /// Run preload, load assets and run setup
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.state != LoopState::Created {
            log::warn!("Engine already started ({:?})", self.state);
            return Ok(());
        }
        let result = self.start_inner();
        if result.is_err() {
            self.shutdown();
        }
        result
    }

    fn start_inner(&mut self) -> Result<(), EngineError> {
        self.enter(LoopState::Preload);
        self.game
            .preload(&mut self.context)
            .map_err(|source| EngineError::Application { stage: "preload", source })?;

        self.enter(LoopState::Loading);
        let mut loaded = false;
        self.context.assets.load(|| loaded = true)?;
        if !loaded {
            return Err(EngineError::InitializationFailed("asset loading did not finish".to_string()));
        }

        self.enter(LoopState::Setup);
        self.game
            .setup(&mut self.context)
            .map_err(|source| EngineError::Application { stage: "setup", source })?;
        self.setup_done = true;

        self.enter(LoopState::Running);
        log::info!("Game running");
        Ok(())
    }

    /// Run one frame; `Ok(false)` once the loop has ended
    pub fn frame(&mut self) -> Result<bool, EngineError> {
        if self.state != LoopState::Running {
            return Ok(false);
        }
        let result = self.frame_inner();
        if result.is_err() || self.should_stop() {
            self.shutdown();
        }
        result.map(|()| self.state == LoopState::Running)
    }

    fn should_stop(&self) -> bool {
        self.context.exit_requested || self.shell.close_requested()
    }

    fn frame_inner(&mut self) -> Result<(), EngineError> {
        let mut events = std::mem::take(&mut self.events);
        self.shell.poll_events(&mut events);
        for event in events.drain(..) {
            self.dispatch(event);
        }
        self.events = events;

        if self.should_stop() {
            return Ok(());
        }

        let dt = self.context.clock.delta();
        self.game
            .update(&mut self.context, dt)
            .map_err(|source| EngineError::Application { stage: "update", source })?;

        self.context.gpu.borrow_mut().clear(rgb_to_f32(self.context.background));
        self.game
            .render(&mut self.context)
            .map_err(|source| EngineError::Application { stage: "render", source })?;

        self.shell.present();
        self.context.clock.tick_at(self.shell.now());
        Ok(())
    }

    fn dispatch(&mut self, event: InputEvent) {
        let ctx = &mut self.context;
        match event {
            InputEvent::Resize { width, height } => {
                ctx.size = (width, height);
                ctx.pixel_ratio = self.shell.device_pixel_ratio();
                self.game.resize(ctx, width, height);
            }
            InputEvent::Key { key, modifiers, action } => self.game.key(ctx, key, modifiers, action),
            InputEvent::Mouse { x, y, action } => self.game.mouse(ctx, x, y, action),
            InputEvent::Scroll(dy) => self.game.scroll(ctx, dy),
            InputEvent::Type(ch) => self.game.typed(ctx, ch),
        }
    }

    fn shutdown(&mut self) {
        if matches!(self.state, LoopState::Closing | LoopState::Disposed) {
            return;
        }
        self.enter(LoopState::Closing);
        if self.setup_done {
            self.game.close(&mut self.context);
        }
        self.context.release_textures();
        self.shell.request_close();
        self.enter(LoopState::Disposed);
        log::info!("Engine shutdown complete after {} frames", self.context.clock.frames());
    }

    /// Start and run frames until the loop ends
    pub fn run(&mut self) -> Result<(), EngineError> {
        self.start()?;
        while self.frame()? {}
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
impl<S: Shell + 'static, G: Game + 'static> Engine<S, G> {
    /// Start, then run one frame per browser animation frame
    ///
    /// Returns once the first frame is scheduled.
    pub fn run_in_browser(mut self) -> Result<(), EngineError> {
        self.start()?;
        crate::platform::browser::run_animation_frames(move || match self.frame() {
            Ok(running) => running,
            Err(err) => {
                log::error!("{err}");
                false
            }
        })
    }
}

/// Open the platform shell and run `game` with `config`
///
/// Installs the logger with the configured level as default filter. On
/// desktop this blocks until the game ends; in the browser it returns after
/// scheduling the first animation frame.
pub fn open<G: Game + 'static>(config: EngineConfig, game: G) -> Result<(), EngineError> {
    crate::foundation::logging::init(&config.log_level);
    config.validate()?;

    let shell = crate::platform::NativeShell::open(&config.window)?;
    #[allow(unused_mut)]
    let mut engine = Engine::new(shell, &config, game)?;

    #[cfg(target_arch = "wasm32")]
    return engine.run_in_browser();

    #[cfg(not(target_arch = "wasm32"))]
    engine.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryReader;
    use crate::input::{Action, Key, Modifiers};
    use crate::platform::headless::HeadlessShell;
    use crate::render::headless::GpuCommand;
    use crate::render::Font;
    use ::image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[derive(Default)]
    struct Recorder {
        log: Vec<String>,
        assets: Vec<(&'static str, &'static str)>,
        fail_in: Option<&'static str>,
        exit_after_updates: Option<usize>,
        updates: Vec<f32>,
    }

    impl Recorder {
        fn fail(&self, stage: &'static str) -> Result<(), AppError> {
            if self.fail_in == Some(stage) {
                Err(AppError::Custom(format!("{stage} failed")))
            } else {
                Ok(())
            }
        }
    }

    impl Game for Recorder {
        fn preload(&mut self, ctx: &mut Context) -> Result<(), AppError> {
            self.log.push("preload".into());
            for (key, path) in &self.assets {
                ctx.assets_mut().add(*key, *path);
            }
            self.fail("preload")
        }

        fn setup(&mut self, _ctx: &mut Context) -> Result<(), AppError> {
            self.log.push("setup".into());
            self.fail("setup")
        }

        fn update(&mut self, ctx: &mut Context, dt: f32) -> Result<(), AppError> {
            self.log.push("update".into());
            self.updates.push(dt);
            if self.exit_after_updates == Some(self.updates.len()) {
                ctx.exit();
            }
            self.fail("update")
        }

        fn render(&mut self, _ctx: &mut Context) -> Result<(), AppError> {
            self.log.push("render".into());
            self.fail("render")
        }

        fn resize(&mut self, _ctx: &mut Context, width: u32, height: u32) {
            self.log.push(format!("resize {width}x{height}"));
        }

        fn key(&mut self, _ctx: &mut Context, key: Key, _modifiers: Modifiers, action: Action) {
            self.log.push(format!("key {key:?} {action:?}"));
        }

        fn mouse(&mut self, _ctx: &mut Context, x: f32, y: f32, action: Action) {
            self.log.push(format!("mouse {x} {y} {action:?}"));
        }

        fn scroll(&mut self, _ctx: &mut Context, dy: f32) {
            self.log.push(format!("scroll {dy}"));
        }

        fn typed(&mut self, _ctx: &mut Context, ch: char) {
            self.log.push(format!("typed {ch}"));
        }

        fn close(&mut self, _ctx: &mut Context) {
            self.log.push("close".into());
        }
    }

    fn engine(shell: HeadlessShell, game: Recorder) -> Engine<HeadlessShell, Recorder> {
        Engine::new(shell, &EngineConfig::new("test", 320, 200), game).unwrap()
    }

    #[test]
    fn test_lifecycle_and_dispatch_order() {
        let shell = HeadlessShell::new(320, 200).with_frame_limit(2).script_frame(vec![
            InputEvent::Resize { width: 640, height: 400 },
            InputEvent::Key {
                key: Key::Space,
                modifiers: Modifiers::empty(),
                action: Action::Press,
            },
            InputEvent::Mouse { x: 3.0, y: 4.0, action: Action::Move },
            InputEvent::Scroll(1.0),
            InputEvent::Type('a'),
        ]);
        let mut engine = engine(shell, Recorder::default());

        engine.run().unwrap();

        assert_eq!(
            engine.game().log,
            vec![
                "preload",
                "setup",
                "resize 640x400",
                "key Space Press",
                "mouse 3 4 Move",
                "scroll 1",
                "typed a",
                "update",
                "render",
                "update",
                "render",
                "close",
            ]
        );
        assert_eq!(engine.state(), LoopState::Disposed);
        assert_eq!(engine.context().width(), 640);
        assert_eq!(engine.shell().presented(), 2);
        assert_eq!(engine.context().clock().frames(), 2);
    }

    #[test]
    fn test_frame_after_dispose_does_nothing() {
        let mut engine = engine(HeadlessShell::new(10, 10).with_frame_limit(1), Recorder::default());
        engine.run().unwrap();

        assert!(!engine.frame().unwrap());
        engine.start().unwrap();
        assert_eq!(engine.game().log.iter().filter(|l| *l == "close").count(), 1);
        assert_eq!(engine.game().log.iter().filter(|l| *l == "setup").count(), 1);
    }

    #[test]
    fn test_exit_from_update_ends_after_the_frame() {
        let game = Recorder {
            exit_after_updates: Some(1),
            ..Recorder::default()
        };
        let mut engine = engine(HeadlessShell::new(10, 10), game);

        engine.run().unwrap();

        assert_eq!(engine.game().log, vec!["preload", "setup", "update", "render", "close"]);
        assert_eq!(engine.shell().presented(), 1);
        assert!(engine.shell().close_requested());
    }

    #[test]
    fn test_update_receives_previous_frame_delta() {
        let shell = HeadlessShell::new(10, 10).with_time_step(0.5).with_frame_limit(3);
        let mut engine = engine(shell, Recorder::default());

        engine.run().unwrap();

        assert_eq!(engine.game().updates, vec![0.0, 0.5, 0.5]);
    }

    #[test]
    fn test_asset_failure_aborts_before_setup() {
        let game = Recorder {
            assets: vec![("ghost", "ghost.png")],
            ..Recorder::default()
        };
        let shell = HeadlessShell::new(10, 10).with_reader(MemoryReader::new());
        let mut engine = engine(shell, game);

        let err = engine.run().unwrap_err();

        assert!(matches!(err, EngineError::Asset(AssetError::Io { .. })));
        assert_eq!(engine.game().log, vec!["preload"]);
        assert_eq!(engine.state(), LoopState::Disposed);
    }

    #[test]
    fn test_callback_error_still_closes_once() {
        let game = Recorder {
            fail_in: Some("render"),
            ..Recorder::default()
        };
        let mut engine = engine(HeadlessShell::new(10, 10), game);

        let err = engine.run().unwrap_err();

        assert!(matches!(err, EngineError::Application { stage: "render", .. }));
        assert_eq!(engine.game().log, vec!["preload", "setup", "update", "render", "close"]);
        assert!(!engine.frame().unwrap());
    }

    #[test]
    fn test_setup_error_skips_close() {
        let game = Recorder {
            fail_in: Some("setup"),
            ..Recorder::default()
        };
        let mut engine = engine(HeadlessShell::new(10, 10), game);

        assert!(engine.run().is_err());
        assert_eq!(engine.game().log, vec!["preload", "setup"]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig::new("bad", 0, 10);
        let result = Engine::new(HeadlessShell::new(10, 10), &config, Recorder::default());
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    struct Hello {
        font: Option<Font>,
        batch: Option<Batch>,
        texture: Option<Texture>,
    }

    impl Game for Hello {
        fn preload(&mut self, ctx: &mut Context) -> Result<(), AppError> {
            ctx.assets_mut().add("bot", "bot.png");
            ctx.assets_mut().add("font", "font.png");
            Ok(())
        }

        fn setup(&mut self, ctx: &mut Context) -> Result<(), AppError> {
            ctx.set_background(0x336699);
            let bot = ctx.texture("bot")?;
            assert_eq!(ctx.texture("bot")?, bot);
            self.texture = Some(bot);
            self.font = Some(Font::grid(ctx.texture("font")?, 20, 20)?);
            self.batch = Some(ctx.new_batch()?);
            Ok(())
        }

        fn render(&mut self, _ctx: &mut Context) -> Result<(), AppError> {
            let (Some(batch), Some(font), Some(bot)) = (&mut self.batch, &self.font, self.texture) else {
                return Err(AppError::Custom("not set up".into()));
            };
            batch.begin()?;
            batch.draw(&bot, 10.0, 10.0, 0.5, 0.5, 1.0, 1.0, 0.0, 0xffffff, 1.0)?;
            batch.print(font, "Hi", 0.0, 0.0, 0xffffff)?;
            batch.end()?;
            Ok(())
        }
    }

    #[test]
    fn test_context_caches_textures_and_clears_to_background() {
        let reader = MemoryReader::new()
            .with("bot.png", png(16, 16))
            .with("font.png", png(320, 160));
        let shell = HeadlessShell::new(320, 200).with_frame_limit(1).with_reader(reader);
        let device = shell.device();
        let game = Hello { font: None, batch: None, texture: None };
        let mut engine = Engine::new(shell, &EngineConfig::new("hello", 320, 200), game).unwrap();

        engine.run().unwrap();

        let device = device.borrow();
        let created = device
            .commands()
            .iter()
            .filter(|c| matches!(c, GpuCommand::CreateTexture { .. }))
            .count();
        assert_eq!(created, 2);
        assert_eq!(device.draw_calls(), 2);
        assert!(device.commands().contains(&GpuCommand::Clear(rgb_to_f32(0x336699))));
        // Cached textures are released on shutdown
        assert_eq!(device.texture_count(), 0);
    }
}
