//! Loss classification for conversions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How much of the source survives a conversion, from best to worst.
///
/// The derived ordering is the policy ordering: `L0 < L1 < L2 < L3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum LossClass {
    /// Byte-identical round-trip.
    #[default]
    L0,
    /// Structure and all locators preserved; formatting regenerated.
    L1,
    /// Partial structural loss.
    L2,
    /// Only linear text and locators survive.
    L3,
}

impl LossClass {
    pub fn as_str(self) -> &'static str {
        match self {
            LossClass::L0 => "L0",
            LossClass::L1 => "L1",
            LossClass::L2 => "L2",
            LossClass::L3 => "L3",
        }
    }
}

impl fmt::Display for LossClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a conversion kept and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LossReport {
    pub source_format: String,
    pub target_format: String,
    pub loss_class: LossClass,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl LossReport {
    pub fn new(
        source_format: impl Into<String>,
        target_format: impl Into<String>,
        loss_class: LossClass,
    ) -> Self {
        Self {
            source_format: source_format.into(),
            target_format: target_format.into(),
            loss_class,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}
