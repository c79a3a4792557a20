//! Status icons for CLI output

use crate::domain::upgrade::Classification;

/// Status icons for different states
pub struct StatusIcon;

impl StatusIcon {
    pub const SUCCESS: &'static str = "✓";

    pub const WARNING: &'static str = "⚠";

    /// Rejected transition
    pub const ERROR: &'static str = "✗";

    /// Step still to run
    pub const PENDING: &'static str = "⏳";

    pub fn for_classification(classification: Classification) -> &'static str {
        match classification {
            Classification::Patch => Self::SUCCESS,
            Classification::Minor => Self::WARNING,
        }
    }

    pub fn describe(classification: Classification) -> &'static str {
        match classification {
            Classification::Patch => "Patch upgrade",
            Classification::Minor => "Minor upgrade (staged)",
        }
    }
}
