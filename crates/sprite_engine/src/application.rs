//! Game trait and lifecycle callbacks

use crate::assets::AssetError;
use crate::config::ConfigError;
use crate::engine::Context;
use crate::input::{Action, Key, Modifiers};
use crate::render::RenderError;
use thiserror::Error;

/// Game lifecycle trait
///
/// Implement this trait and hand the game to [`crate::open`]. The engine
/// calls the callbacks in this order:
///
/// 1. [`Game::preload`] once; queue assets with `ctx.assets_mut().add(..)`
/// 2. the queued assets are loaded
/// 3. [`Game::setup`] once; create textures, sprites, fonts and batches
/// 4. every frame: input callbacks for pending events, [`Game::update`],
///    then [`Game::render`] into a freshly cleared frame
/// 5. [`Game::close`] once when the loop ends
pub trait Game {
    /// Queue assets to load before [`Game::setup`]
    fn preload(&mut self, _ctx: &mut Context) -> Result<(), AppError> {
        Ok(())
    }

    /// Build game state once assets are loaded
    fn setup(&mut self, ctx: &mut Context) -> Result<(), AppError>;

    /// Advance the game by `dt` seconds
    fn update(&mut self, _ctx: &mut Context, _dt: f32) -> Result<(), AppError> {
        Ok(())
    }

    /// Draw the current frame
    fn render(&mut self, ctx: &mut Context) -> Result<(), AppError>;

    /// The drawable area changed size (logical pixels)
    fn resize(&mut self, _ctx: &mut Context, _width: u32, _height: u32) {}

    /// A key was pressed, released or repeated
    fn key(&mut self, _ctx: &mut Context, _key: Key, _modifiers: Modifiers, _action: Action) {}

    /// The pointer moved or a mouse button changed state
    fn mouse(&mut self, _ctx: &mut Context, _x: f32, _y: f32, _action: Action) {}

    /// The mouse wheel moved
    fn scroll(&mut self, _ctx: &mut Context, _dy: f32) {}

    /// A character was typed
    fn typed(&mut self, _ctx: &mut Context, _ch: char) {}

    /// The loop ended; release anything the game holds
    fn close(&mut self, _ctx: &mut Context) {}
}

/// Errors returned by game callbacks
#[derive(Error, Debug)]
pub enum AppError {
    /// Rendering failed
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// An asset was missing or unreadable
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// Configuration was rejected
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),
}
