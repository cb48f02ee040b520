//! Pyramid levels and the level selector.
//!
//! # Selection Rule
//!
//! Among all levels at least as wide as the target, the narrowest one wins.
//! Decoding cost grows with level size, while any level narrower than the
//! target would have to be upsampled. Levels sharing the same width resolve to
//! the smallest index.
//!
//! Levels are conventionally ordered so that width decreases as the index
//! grows. The selector does not rely on that ordering: it compares widths
//! directly and only logs a warning when the convention is broken.

use tracing::{debug, warn};

use crate::error::PyramidError;

// =============================================================================
// PyramidLevel
// =============================================================================

/// A single resolution tier of a slide.
///
/// Level 0 is the full-resolution image; higher indices are coarser. Indices
/// reported by a decoder are not required to be contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PyramidLevel {
    /// Level index as reported by the slide decoder
    pub index: usize,

    /// Level width in pixels
    pub width: u32,
}

impl PyramidLevel {
    pub const fn new(index: usize, width: u32) -> Self {
        Self { index, width }
    }
}

// =============================================================================
// LevelSelector
// =============================================================================

/// Validated set of pyramid levels.
///
/// Construction rejects empty sets, zero widths and duplicated indices, so
/// [`LevelSelector::choose`] only has to deal with the target width.
#[derive(Debug, Clone)]
pub struct LevelSelector {
    /// Levels sorted by index
    levels: Vec<PyramidLevel>,
}

impl LevelSelector {
    /// Validate a level set.
    pub fn new<I>(levels: I) -> Result<Self, PyramidError>
    where
        I: IntoIterator<Item = PyramidLevel>,
    {
        let mut levels: Vec<PyramidLevel> = levels.into_iter().collect();

        if levels.is_empty() {
            return Err(PyramidError::InvalidPyramid {
                reason: "no levels".to_string(),
            });
        }

        levels.sort_by_key(|level| level.index);

        for pair in levels.windows(2) {
            if pair[0].index == pair[1].index {
                return Err(PyramidError::InvalidPyramid {
                    reason: format!("level {} appears more than once", pair[0].index),
                });
            }
        }

        if let Some(level) = levels.iter().find(|level| level.width == 0) {
            return Err(PyramidError::InvalidPyramid {
                reason: format!("level {} has zero width", level.index),
            });
        }

        if let Some(pair) = levels.windows(2).find(|pair| pair[1].width > pair[0].width) {
            warn!(
                "Pyramid widths do not decrease with index: level {} is {}px, level {} is {}px",
                pair[0].index, pair[0].width, pair[1].index, pair[1].width
            );
        }

        Ok(Self { levels })
    }

    /// Build a level set from the `index -> width` mapping a slide decoder exposes.
    pub fn from_widths<I>(widths: I) -> Result<Self, PyramidError>
    where
        I: IntoIterator<Item = (usize, u32)>,
    {
        Self::new(
            widths
                .into_iter()
                .map(|(index, width)| PyramidLevel::new(index, width)),
        )
    }

    /// Levels sorted by index.
    pub fn levels(&self) -> &[PyramidLevel] {
        &self.levels
    }

    /// Width of the widest level.
    pub fn max_width(&self) -> u32 {
        // Non-empty by construction
        self.levels.iter().map(|level| level.width).max().unwrap_or(0)
    }

    /// Width of the level with the given index, if present.
    pub fn width_of(&self, index: usize) -> Option<u32> {
        self.levels
            .iter()
            .find(|level| level.index == index)
            .map(|level| level.width)
    }

    /// Select the narrowest level whose width is at least `target_width`.
    ///
    /// # Errors
    ///
    /// - [`PyramidError::InvalidTargetWidth`] if `target_width` is 0
    /// - [`PyramidError::NoSuitableLevel`] if every level is narrower than the target
    pub fn choose(&self, target_width: u32) -> Result<usize, PyramidError> {
        if target_width == 0 {
            return Err(PyramidError::InvalidTargetWidth);
        }

        let chosen = self
            .levels
            .iter()
            .filter(|level| level.width >= target_width)
            .min_by_key(|level| (level.width, level.index))
            .ok_or(PyramidError::NoSuitableLevel {
                target_width,
                max_width: self.max_width(),
            })?;

        debug!(
            "Selected level {} ({}px) for target width {}",
            chosen.index, chosen.width, target_width
        );

        Ok(chosen.index)
    }
}

/// Select the decode level for a target width.
///
/// Convenience wrapper around [`LevelSelector::new`] followed by
/// [`LevelSelector::choose`].
///
/// # Example
///
/// ```
/// use slide_ome::pyramid::{choose_level, PyramidLevel};
///
/// let levels = [
///     PyramidLevel::new(0, 10000),
///     PyramidLevel::new(1, 2000),
///     PyramidLevel::new(2, 500),
/// ];
/// assert_eq!(choose_level(&levels, 1024).unwrap(), 1);
/// ```
pub fn choose_level(levels: &[PyramidLevel], target_width: u32) -> Result<usize, PyramidError> {
    LevelSelector::new(levels.iter().copied())?.choose(target_width)
}

// =============================================================================
// Tests
// =============================================================================
