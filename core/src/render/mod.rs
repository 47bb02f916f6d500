//! This module contains all the data structures used to render the CD+G display.
pub mod color;
pub mod glyph;
pub mod tile;
pub mod vram;

/// CD+G screen width, in pixels.
pub const SCREEN_WIDTH: usize = 300;

/// CD+G screen height, in pixels.
pub const SCREEN_HEIGHT: usize = 216;

/// Tile width, in pixels.
pub const TILE_WIDTH: usize = 6;

/// Tile height, in pixels.
pub const TILE_HEIGHT: usize = 12;

/// Number of tile columns across the screen.
pub const BLOCKS_X: usize = SCREEN_WIDTH / TILE_WIDTH;

/// Number of tile rows down the screen.
pub const BLOCKS_Y: usize = SCREEN_HEIGHT / TILE_HEIGHT;

/// Number of palette slots.
pub const PALETTE_SIZE: usize = 16;
