//! # Sprite Engine
//!
//! A small 2D game engine: batched sprite rendering over OpenGL 2.1 on the
//! desktop and WebGL 1 in the browser, from one game codebase.
//!
//! ## Features
//!
//! - **Sprite Batching**: quads are staged in one vertex buffer and submitted
//!   with a draw call per texture run
//! - **Atlases and Fonts**: texture regions and fixed-cell bitmap fonts
//! - **Asset Cache**: images queued in `preload`, loaded before `setup`
//! - **Frame Loop**: delta time, frames per second and input callbacks
//! - **Cross-Platform**: GLFW on Windows, Linux and macOS; a canvas in the
//!   browser; a headless shell for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sprite_engine::prelude::*;
//!
//! #[derive(Default)]
//! struct Hello {
//!     batch: Option<Batch>,
//!     bot: Option<Texture>,
//! }
//!
//! impl Game for Hello {
//!     fn preload(&mut self, ctx: &mut Context) -> Result<(), AppError> {
//!         ctx.assets_mut().add("bot", "icon.png");
//!         Ok(())
//!     }
//!
//!     fn setup(&mut self, ctx: &mut Context) -> Result<(), AppError> {
//!         self.bot = Some(ctx.texture("bot")?);
//!         self.batch = Some(ctx.new_batch()?);
//!         Ok(())
//!     }
//!
//!     fn render(&mut self, _ctx: &mut Context) -> Result<(), AppError> {
//!         if let (Some(batch), Some(bot)) = (&mut self.batch, self.bot) {
//!             batch.begin()?;
//!             batch.draw(&bot, 512.0, 320.0, 0.5, 0.5, 1.0, 1.0, 0.0, 0xffffff, 1.0)?;
//!             batch.end()?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), EngineError> {
//!     sprite_engine::open(EngineConfig::new("Hello", 1024, 640), Hello::default())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod assets;
pub mod render;
pub mod input;
pub mod platform;

mod application;
mod engine;

pub use application::{AppError, Game};
pub use engine::{open, Context, Engine, EngineError, LoopState};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        open, AppError, Context, Engine, EngineError, Game, LoopState,
        assets::{AssetCache, AssetError, Image},
        config::{Config, EngineConfig},
        foundation::{
            math::{Mat4, Point2, Vec2},
            time::FrameClock,
        },
        input::{Action, InputEvent, Key, Modifiers},
        platform::Shell,
        render::{Batch, BatchStats, Drawable, Font, Region, RenderError, Sprite, Texture, TextureFilter},
    };
}
