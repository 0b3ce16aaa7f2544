//! Generation parameter constants, clamping and validation.
//!
//! Raw form input ([`GenerationInput`]) is normalized into a
//! [`GenerationRequest`]. Out-of-range numbers are clamped to the nearest
//! bound; only malformed input (non-finite numbers, unknown ratios,
//! oversized prompts) is rejected, with the offending field named.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Parameter bounds
// ---------------------------------------------------------------------------

/// Minimum number of images per generation.
pub const MIN_COUNT: u8 = 1;
/// Maximum number of images per generation.
pub const MAX_COUNT: u8 = 4;
/// Minimum sampler steps.
pub const MIN_STEPS: u8 = 5;
/// Maximum sampler steps.
pub const MAX_STEPS: u8 = 50;
/// Minimum classifier-free guidance scale.
pub const MIN_CFG: f64 = 0.0;
/// Maximum classifier-free guidance scale.
pub const MAX_CFG: f64 = 15.0;
/// Maximum prompt / negative prompt length in characters.
pub const MAX_PROMPT_CHARS: u64 = 2000;

// ---------------------------------------------------------------------------
// Form defaults
// ---------------------------------------------------------------------------

/// Default sampler steps (kept low for quick previews).
pub const DEFAULT_STEPS: f64 = 20.0;
/// Default CFG scale.
pub const DEFAULT_CFG: f64 = 7.0;
/// Default batch size.
pub const DEFAULT_COUNT: f64 = 4.0;
/// Default locked seed shown in a fresh form.
pub const DEFAULT_SEED: i64 = 123_456;

// ---------------------------------------------------------------------------
// Ratio
// ---------------------------------------------------------------------------

/// Output aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Ratio {
    /// 4:5 portrait (poster).
    #[default]
    #[serde(rename = "4:5")]
    Portrait,
    /// 1:1 square.
    #[serde(rename = "1:1")]
    Square,
    /// 16:9 landscape (banner).
    #[serde(rename = "16:9")]
    Wide,
}

/// All supported ratios.
pub const ALL_RATIOS: &[Ratio] = &[Ratio::Portrait, Ratio::Square, Ratio::Wide];

impl Ratio {
    /// Return the `w:h` label of a ratio.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Portrait => "4:5",
            Self::Square => "1:1",
            Self::Wide => "16:9",
        }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ratio {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_RATIOS
            .iter()
            .copied()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| {
                CoreError::invalid_field(
                    "ratio",
                    format!("unknown ratio '{s}', expected one of: 4:5, 1:1, 16:9"),
                )
            })
    }
}

/// Pixel dimensions of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

/// Map an aspect ratio to its render size.
pub fn ratio_to_size(ratio: Ratio) -> Size {
    match ratio {
        Ratio::Square => Size { w: 768, h: 768 },
        Ratio::Wide => Size { w: 1024, h: 576 },
        Ratio::Portrait => Size { w: 768, h: 960 },
    }
}

// ---------------------------------------------------------------------------
// Clamping
// ---------------------------------------------------------------------------

/// Clamp a batch size: `max(1, min(4, floor(c)))`. NaN maps to the minimum.
pub fn clamp_count(c: f64) -> u8 {
    clamp_floor(c, MIN_COUNT, MAX_COUNT)
}

/// Clamp sampler steps into `[5, 50]`, flooring fractions.
pub fn clamp_steps(steps: f64) -> u8 {
    clamp_floor(steps, MIN_STEPS, MAX_STEPS)
}

/// Clamp CFG into `[0, 15]`. Fractions are kept. NaN maps to the minimum.
pub fn clamp_cfg(cfg: f64) -> f64 {
    if cfg.is_nan() {
        return MIN_CFG;
    }
    cfg.clamp(MIN_CFG, MAX_CFG)
}

fn clamp_floor(value: f64, min: u8, max: u8) -> u8 {
    if value.is_nan() {
        return min;
    }
    value.floor().clamp(f64::from(min), f64::from(max)) as u8
}

// ---------------------------------------------------------------------------
// Seed field
// ---------------------------------------------------------------------------

/// Interpretation of the free-text seed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedField {
    /// Field was blank.
    Empty,
    /// Field held an integer.
    Value(i64),
    /// Field held something that is not an integer.
    Unparseable,
}

impl SeedField {
    /// The parsed seed, if any. Empty and unparseable fields both yield `None`.
    pub fn value(self) -> Option<i64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Empty | Self::Unparseable => None,
        }
    }
}

/// Parse the raw seed field text.
pub fn parse_seed_field(raw: &str) -> SeedField {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return SeedField::Empty;
    }
    trimmed
        .parse::<i64>()
        .map(SeedField::Value)
        .unwrap_or(SeedField::Unparseable)
}

// ---------------------------------------------------------------------------
// Input and request
// ---------------------------------------------------------------------------

/// Raw, unvalidated generation form state.
///
/// Numbers arrive as `f64` the way a number input hands them over; the seed
/// is kept as the text the user typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GenerationInput {
    #[validate(length(max = 2000))]
    pub prompt: String,
    #[validate(length(max = 2000))]
    pub negative_prompt: String,
    pub ratio: String,
    pub steps: f64,
    pub cfg: f64,
    pub count: f64,
    pub seed: String,
    pub lock_seed: bool,
}

impl Default for GenerationInput {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            negative_prompt: String::new(),
            ratio: Ratio::default().as_str().to_string(),
            steps: DEFAULT_STEPS,
            cfg: DEFAULT_CFG,
            count: DEFAULT_COUNT,
            seed: DEFAULT_SEED.to_string(),
            lock_seed: true,
        }
    }
}

impl GenerationInput {
    /// Classify the seed field text.
    pub fn seed_field(&self) -> SeedField {
        parse_seed_field(&self.seed)
    }

    /// Normalize into a [`GenerationRequest`].
    ///
    /// Numeric fields are clamped; the seed is dropped when `lock_seed` is
    /// off. Infinities clamp to the nearest bound. Fails with
    /// [`CoreError::InvalidField`] on oversized prompts, unknown ratios and
    /// NaN.
    pub fn validate_request(&self) -> Result<GenerationRequest, CoreError> {
        self.validate().map_err(|errors| {
            let field = errors
                .field_errors()
                .keys()
                .map(|k| k.to_string())
                .min()
                .unwrap_or_else(|| "prompt".to_string());
            CoreError::invalid_field(
                field,
                format!("must be at most {MAX_PROMPT_CHARS} characters"),
            )
        })?;

        let ratio: Ratio = self.ratio.parse()?;
        require_number("steps", self.steps)?;
        require_number("cfg", self.cfg)?;
        require_number("count", self.count)?;

        let size = ratio_to_size(ratio);
        let seed = if self.lock_seed {
            self.seed_field().value()
        } else {
            None
        };

        Ok(GenerationRequest {
            prompt: self.prompt.clone(),
            negative_prompt: self.negative_prompt.clone(),
            ratio,
            width: size.w,
            height: size.h,
            steps: clamp_steps(self.steps),
            cfg: clamp_cfg(self.cfg),
            count: clamp_count(self.count),
            seed,
            lock_seed: self.lock_seed,
        })
    }
}

fn require_number(field: &str, value: f64) -> Result<(), CoreError> {
    if value.is_nan() {
        Err(CoreError::invalid_field(field, "must be a number"))
    } else {
        Ok(())
    }
}

/// Normalized generation parameters.
///
/// Invariants: `count` in `[1, 4]`, `steps` in `[5, 50]`, `cfg` in
/// `[0, 15]`, `seed` is `None` whenever `lock_seed` is false, and
/// `width`/`height` match [`ratio_to_size`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub negative_prompt: String,
    pub ratio: Ratio,
    pub width: u32,
    pub height: u32,
    pub steps: u8,
    pub cfg: f64,
    pub count: u8,
    pub seed: Option<i64>,
    pub lock_seed: bool,
}

impl GenerationRequest {
    /// Turn a request back into form state (used when replaying history).
    pub fn to_input(&self) -> GenerationInput {
        GenerationInput {
            prompt: self.prompt.clone(),
            negative_prompt: self.negative_prompt.clone(),
            ratio: self.ratio.as_str().to_string(),
            steps: f64::from(self.steps),
            cfg: self.cfg,
            count: f64::from(self.count),
            seed: self.seed.map(|s| s.to_string()).unwrap_or_default(),
            lock_seed: self.lock_seed,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
