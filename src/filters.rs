//! Declarative filter composition
//!
//! The seven filter parameters map one-to-one onto CSS `filter` functions.
//! Pixels are never touched here; the rendering layer applies the string.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterParam {
    Brightness,
    Contrast,
    Saturation,
    Sepia,
    Grayscale,
    HueRotate,
    Blur,
}

impl FilterParam {
    pub const ALL: [FilterParam; 7] = [
        FilterParam::Brightness,
        FilterParam::Contrast,
        FilterParam::Saturation,
        FilterParam::Sepia,
        FilterParam::Grayscale,
        FilterParam::HueRotate,
        FilterParam::Blur,
    ];

    /// Inclusive `(min, max)` range accepted by the sliders.
    pub fn range(self) -> (f64, f64) {
        match self {
            FilterParam::Brightness | FilterParam::Contrast | FilterParam::Saturation => {
                (0.0, 200.0)
            }
            FilterParam::Sepia | FilterParam::Grayscale => (0.0, 100.0),
            FilterParam::HueRotate => (0.0, 360.0),
            FilterParam::Blur => (0.0, 10.0),
        }
    }

    /// Value that leaves the image unchanged.
    pub fn identity(self) -> f64 {
        match self {
            FilterParam::Brightness | FilterParam::Contrast | FilterParam::Saturation => 100.0,
            _ => 0.0,
        }
    }

    pub fn clamp(self, value: f64) -> f64 {
        let (min, max) = self.range();
        if value.is_nan() {
            self.identity()
        } else {
            value.clamp(min, max)
        }
    }

    fn css_function(self) -> &'static str {
        match self {
            FilterParam::Brightness => "brightness",
            FilterParam::Contrast => "contrast",
            FilterParam::Saturation => "saturate",
            FilterParam::Sepia => "sepia",
            FilterParam::Grayscale => "grayscale",
            FilterParam::HueRotate => "hue-rotate",
            FilterParam::Blur => "blur",
        }
    }

    fn css_unit(self) -> &'static str {
        match self {
            FilterParam::HueRotate => "deg",
            FilterParam::Blur => "px",
            _ => "%",
        }
    }
}

impl fmt::Display for FilterParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterParam::Brightness => "brightness",
            FilterParam::Contrast => "contrast",
            FilterParam::Saturation => "saturation",
            FilterParam::Sepia => "sepia",
            FilterParam::Grayscale => "grayscale",
            FilterParam::HueRotate => "hueRotate",
            FilterParam::Blur => "blur",
        };
        f.write_str(name)
    }
}

/// Slider values for one image. Missing fields deserialize to identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSettings {
    pub brightness: f64,
    pub contrast: f64,
    pub saturation: f64,
    pub sepia: f64,
    pub grayscale: f64,
    pub hue_rotate: f64,
    pub blur: f64,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            sepia: 0.0,
            grayscale: 0.0,
            hue_rotate: 0.0,
            blur: 0.0,
        }
    }
}

impl FilterSettings {
    pub fn get(&self, param: FilterParam) -> f64 {
        match param {
            FilterParam::Brightness => self.brightness,
            FilterParam::Contrast => self.contrast,
            FilterParam::Saturation => self.saturation,
            FilterParam::Sepia => self.sepia,
            FilterParam::Grayscale => self.grayscale,
            FilterParam::HueRotate => self.hue_rotate,
            FilterParam::Blur => self.blur,
        }
    }

    /// Set one parameter, clamped into its range.
    pub fn set(&mut self, param: FilterParam, value: f64) {
        let value = param.clamp(value);
        let slot = match param {
            FilterParam::Brightness => &mut self.brightness,
            FilterParam::Contrast => &mut self.contrast,
            FilterParam::Saturation => &mut self.saturation,
            FilterParam::Sepia => &mut self.sepia,
            FilterParam::Grayscale => &mut self.grayscale,
            FilterParam::HueRotate => &mut self.hue_rotate,
            FilterParam::Blur => &mut self.blur,
        };
        *slot = value;
    }

    pub fn clamped(&self) -> Self {
        let mut out = *self;
        for param in FilterParam::ALL {
            out.set(param, self.get(param));
        }
        out
    }

    pub fn is_identity(&self) -> bool {
        FilterParam::ALL
            .iter()
            .all(|&p| self.get(p) == p.identity())
    }

    /// CSS `filter` property value, e.g. `brightness(110%) ... blur(0px)`.
    pub fn css(&self) -> String {
        FilterParam::ALL
            .iter()
            .map(|&p| format!("{}({}{})", p.css_function(), self.get(p), p.css_unit()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
