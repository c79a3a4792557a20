//! Color theme for CLI output

use crate::domain::upgrade::Classification;
use comfy_table::Color as TableColor;

/// Color theme for terminal output
#[derive(Debug, Clone)]
pub struct ColorTheme {
    pub success: TableColor,
    pub warning: TableColor,
    pub error: TableColor,
    pub info: TableColor,
    pub muted: TableColor,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            success: TableColor::Green,
            warning: TableColor::Yellow,
            error: TableColor::Red,
            info: TableColor::Cyan,
            muted: TableColor::DarkGrey,
        }
    }
}

impl ColorTheme {
    /// Minor upgrades are staged, so they are highlighted
    pub fn classification_color(&self, classification: Classification) -> TableColor {
        match classification {
            Classification::Patch => self.success,
            Classification::Minor => self.warning,
        }
    }

    /// Color for a version source relative to the effective current version
    pub fn source_color(&self, is_current: bool) -> TableColor {
        if is_current {
            self.info
        } else {
            self.muted
        }
    }
}
