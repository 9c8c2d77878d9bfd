//! Hello demo
//!
//! Spins a bot sprite in the middle of the window and prints the frame
//! rate with a bitmap font. Escape quits. Settings are read from
//! `hello.toml` when it exists.

use sprite_engine::config::ConfigError;
use sprite_engine::foundation::logging;
use sprite_engine::prelude::*;

const CONFIG_PATH: &str = "hello.toml";
const DEGREES_PER_SECOND: f32 = 90.0;

#[derive(Default)]
struct Hello {
    batch: Option<Batch>,
    font: Option<Font>,
    bot: Option<Sprite>,
}

impl Game for Hello {
    fn preload(&mut self, ctx: &mut Context) -> Result<(), AppError> {
        ctx.assets_mut().add("bot", "icon.png");
        ctx.assets_mut().add("font", "font.png");
        Ok(())
    }

    fn setup(&mut self, ctx: &mut Context) -> Result<(), AppError> {
        let bot = ctx.texture("bot")?;
        let font = ctx.texture("font")?;

        let (cx, cy) = (ctx.width() as f32 / 2.0, ctx.height() as f32 / 2.0);
        self.bot = Some(Sprite::new(Region::full(bot), cx, cy).with_anchor(0.5, 0.5));
        self.font = Some(Font::grid(font, 20, 20)?);
        self.batch = Some(ctx.new_batch()?);

        log::info!("Hello demo ready at {}x{}", ctx.width(), ctx.height());
        Ok(())
    }

    fn update(&mut self, _ctx: &mut Context, dt: f32) -> Result<(), AppError> {
        if let Some(bot) = &mut self.bot {
            bot.rotation = (bot.rotation + DEGREES_PER_SECOND * dt) % 360.0;
        }
        Ok(())
    }

    fn render(&mut self, ctx: &mut Context) -> Result<(), AppError> {
        let (Some(batch), Some(font), Some(bot)) = (&mut self.batch, &self.font, &self.bot) else {
            return Ok(());
        };

        batch.begin()?;
        bot.render(batch)?;
        let fps = format!("FPS: {:.0}", ctx.clock().fps());
        font.print(batch, &fps, 10.0, 10.0, 0xffffff)?;
        batch.end()?;
        Ok(())
    }

    fn resize(&mut self, _ctx: &mut Context, width: u32, height: u32) {
        if let Some(batch) = &mut self.batch {
            batch.set_projection(width as f32, height as f32);
        }
        if let Some(bot) = &mut self.bot {
            bot.position = Vec2::new(width as f32 / 2.0, height as f32 / 2.0);
        }
    }

    fn key(&mut self, ctx: &mut Context, key: Key, _modifiers: Modifiers, action: Action) {
        if key == Key::Escape && action == Action::Press {
            ctx.exit();
        }
    }

    fn close(&mut self, _ctx: &mut Context) {
        self.batch = None;
        log::info!("Goodbye");
    }
}

fn default_config() -> EngineConfig {
    EngineConfig::new("Hello", 1024, 640).with_background(0x362d38)
}

/// Read `hello.toml`, falling back to defaults when it is absent or broken
fn load_config() -> (EngineConfig, Option<ConfigError>) {
    if !std::path::Path::new(CONFIG_PATH).exists() {
        return (default_config(), None);
    }

    match EngineConfig::load_from_file(CONFIG_PATH) {
        Ok(config) => (config, None),
        Err(e) => (default_config(), Some(e)),
    }
}

fn main() -> Result<(), EngineError> {
    let (config, error) = load_config();
    logging::init(&config.log_level);
    if let Some(e) = error {
        log::warn!("Ignoring {CONFIG_PATH}: {e}");
    }

    sprite_engine::open(config, Hello::default())
}
