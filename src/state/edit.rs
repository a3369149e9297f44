/// Live tone and color adjustments
///
/// The viewer never writes pixels back; these values only drive the
/// render pipeline. They serialize to JSON so a set of adjustments can be
/// copied from one photo and pasted onto another.
use serde::{Deserialize, Serialize};

/// Number of scalar adjustments
pub const LIGHTING_FIELDS: usize = 11;

/// All lighting adjustments for the displayed image
///
/// Additive parameters default to 0, multiplicative ones (contrast,
/// saturation) default to 1.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct LightingParams {
    // ========== Tone ==========
    /// Exposure in stops (-5.0 to +5.0)
    pub exposure: f32,

    /// Contrast multiplier around mid-grey (0.0 to 2.0)
    pub contrast: f32,

    // ========== Color ==========
    /// Saturation multiplier (0.0 = grayscale, 1.0 = original)
    pub saturation: f32,

    /// Saturation boost weighted towards muted colors (-1.0 to +1.0)
    pub vibrance: f32,

    // ========== Tone regions ==========
    /// Bright areas (-1.0 to +1.0)
    pub highlights: f32,

    /// Dark areas (-1.0 to +1.0)
    pub shadows: f32,

    /// White point (-1.0 to +1.0)
    pub whites: f32,

    /// Black point (-1.0 to +1.0)
    pub blacks: f32,

    // ========== White Balance ==========
    /// Green (-) to magenta (+) shift (-1.0 to +1.0)
    pub tint: f32,

    /// Cool (-) to warm (+) shift (-1.0 to +1.0)
    pub temperature: f32,

    /// Hue rotation in degrees (-180.0 to +180.0)
    pub hue: f32,
}

impl Default for LightingParams {
    fn default() -> Self {
        Self {
            exposure: 0.0,
            contrast: 1.0,
            saturation: 1.0,
            vibrance: 0.0,
            highlights: 0.0,
            shadows: 0.0,
            whites: 0.0,
            blacks: 0.0,
            tint: 0.0,
            temperature: 0.0,
            hue: 0.0,
        }
    }
}

impl LightingParams {
    /// Values in uniform-buffer order
    pub fn to_array(&self) -> [f32; LIGHTING_FIELDS] {
        [
            self.exposure,
            self.contrast,
            self.saturation,
            self.vibrance,
            self.highlights,
            self.shadows,
            self.whites,
            self.blacks,
            self.tint,
            self.temperature,
            self.hue,
        ]
    }

    /// Exact bit patterns, used as part of a result-cache key
    pub fn bits(&self) -> [u32; LIGHTING_FIELDS] {
        self.to_array().map(f32::to_bits)
    }

    /// Convert to JSON string for copy/paste
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from JSON string; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check if every value is at its default
    pub fn is_unedited(&self) -> bool {
        *self == Self::default()
    }

    /// Reset all adjustments to default
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// One adjustable scalar, for building slider panels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightingField {
    Exposure,
    Contrast,
    Saturation,
    Vibrance,
    Highlights,
    Shadows,
    Whites,
    Blacks,
    Tint,
    Temperature,
    Hue,
}

impl LightingField {
    pub const ALL: [LightingField; LIGHTING_FIELDS] = [
        LightingField::Exposure,
        LightingField::Contrast,
        LightingField::Saturation,
        LightingField::Vibrance,
        LightingField::Highlights,
        LightingField::Shadows,
        LightingField::Whites,
        LightingField::Blacks,
        LightingField::Tint,
        LightingField::Temperature,
        LightingField::Hue,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LightingField::Exposure => "Exposure",
            LightingField::Contrast => "Contrast",
            LightingField::Saturation => "Saturation",
            LightingField::Vibrance => "Vibrance",
            LightingField::Highlights => "Highlights",
            LightingField::Shadows => "Shadows",
            LightingField::Whites => "Whites",
            LightingField::Blacks => "Blacks",
            LightingField::Tint => "Tint",
            LightingField::Temperature => "Temperature",
            LightingField::Hue => "Hue",
        }
    }

    /// Slider range
    pub fn range(self) -> std::ops::RangeInclusive<f32> {
        match self {
            LightingField::Exposure => -5.0..=5.0,
            LightingField::Contrast | LightingField::Saturation => 0.0..=2.0,
            LightingField::Hue => -180.0..=180.0,
            _ => -1.0..=1.0,
        }
    }

    pub fn get(self, params: &LightingParams) -> f32 {
        params.to_array()[self as usize]
    }

    pub fn set(self, params: &mut LightingParams, value: f32) {
        let slot = match self {
            LightingField::Exposure => &mut params.exposure,
            LightingField::Contrast => &mut params.contrast,
            LightingField::Saturation => &mut params.saturation,
            LightingField::Vibrance => &mut params.vibrance,
            LightingField::Highlights => &mut params.highlights,
            LightingField::Shadows => &mut params.shadows,
            LightingField::Whites => &mut params.whites,
            LightingField::Blacks => &mut params.blacks,
            LightingField::Tint => &mut params.tint,
            LightingField::Temperature => &mut params.temperature,
            LightingField::Hue => &mut params.hue,
        };
        *slot = value;
    }
}
