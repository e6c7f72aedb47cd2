//! Adapter registry.
//!
//! The host builds a [`Registry`] and adds adapters to it explicitly; there
//! is no process-wide registration. Lookup is by format name, or by asking
//! each adapter in registration order whether it detects a file.
//!
//! ```
//! use bibleir::{ConvertConfig, Registry};
//!
//! let registry = Registry::with_defaults(ConvertConfig::default());
//! assert!(registry.has("osis"));
//! assert!(registry.get("usfm").is_err());
//! ```

use std::path::Path;

use serde::Serialize;

use crate::adapter::{Adapter, Detection};
use crate::config::ConvertConfig;
use crate::error::{Error, Result};
use crate::formats::Format;
use crate::model::LossClass;

/// What an adapter declares about its IR operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IrSupport {
    pub extract: bool,
    pub emit: bool,
    /// Class reported when regenerating the format without a raw payload.
    pub regeneration_class: LossClass,
}

/// Registration record for one adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginManifest {
    pub id: String,
    pub version: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ir_support: Option<IrSupport>,
}

impl PluginManifest {
    fn for_format(format: Format) -> Self {
        let name = format.name().to_string();
        let ir_support = format.supports_ir().then(|| IrSupport {
            extract: true,
            emit: true,
            regeneration_class: format.regeneration_class(),
        });
        let (inputs, outputs) = if format.supports_ir() {
            (vec![name.clone(), "ir".to_string()], vec!["ir".to_string(), name.clone()])
        } else {
            (vec![name.clone()], Vec::new())
        };
        Self {
            id: format!("format-{}", name),
            version: env!("CARGO_PKG_VERSION").to_string(),
            inputs,
            outputs,
            ir_support,
        }
    }
}

/// Registry of format adapters, in registration order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    adapters: Vec<Adapter>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in format.
    pub fn with_defaults(config: ConvertConfig) -> Self {
        let mut registry = Self::new();
        for format in Format::ALL {
            registry.register(Adapter::new(format).with_config(config.clone()));
        }
        registry
    }

    /// Register an adapter, replacing any with the same format.
    pub fn register(&mut self, adapter: Adapter) {
        match self
            .adapters
            .iter_mut()
            .find(|a| a.format() == adapter.format())
        {
            Some(existing) => *existing = adapter,
            None => self.adapters.push(adapter),
        }
    }

    /// Get an adapter by format name.
    pub fn get(&self, name: &str) -> Result<&Adapter> {
        self.adapters
            .iter()
            .find(|a| a.format().name().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::UnknownFormat(name.to_string()))
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    /// Registered format names, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.format().name()).collect()
    }

    /// First adapter that detects `path`, with its verdict.
    pub fn detect(&self, path: &Path) -> Option<(&Adapter, Detection)> {
        self.adapters.iter().find_map(|adapter| {
            let detection = adapter.detect(path);
            detection.detected.then_some((adapter, detection))
        })
    }

    pub fn manifests(&self) -> Vec<PluginManifest> {
        self.adapters
            .iter()
            .map(|a| PluginManifest::for_format(a.format()))
            .collect()
    }
}
