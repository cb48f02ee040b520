//! Pyramid level selection.
//!
//! A slide decoder exposes the image as a pyramid of progressively smaller
//! levels. Decoding the full-resolution level just to produce a small preview
//! is wasteful, so callers first ask [`choose_level`] for the cheapest level
//! that can still be downsampled (never upsampled) to the size they want.

mod level;

pub use level::{choose_level, LevelSelector, PyramidLevel};
