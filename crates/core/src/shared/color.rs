use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::constants::DEFAULT_COLOR;

/// An RGB display color, serialized as `[r, g, b]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn to_array(self) -> [u8; 3] {
        [self.0, self.1, self.2]
    }
}

impl Default for Rgb {
    fn default() -> Self {
        DEFAULT_COLOR
    }
}

/// Maps class labels to display colors.
///
/// Labels without an explicit entry use `default`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorPalette {
    pub default: Rgb,
    pub by_label: HashMap<String, Rgb>,
}

impl ColorPalette {
    pub fn new(default: Rgb) -> Self {
        Self {
            default,
            by_label: HashMap::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>, color: Rgb) -> Self {
        self.by_label.insert(label.into(), color);
        self
    }

    pub fn color_for(&self, label: &str) -> Rgb {
        self.by_label.get(label).copied().unwrap_or(self.default)
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::new(DEFAULT_COLOR)
    }
}
