//! Conversion configuration.

/// Configuration shared by every adapter.
///
/// # Example
///
/// ```
/// use bibleir::{Adapter, ConvertConfig, Format};
///
/// let config = ConvertConfig {
///     preserve_raw: false,
///     ..ConvertConfig::default()
/// };
/// let adapter = Adapter::new(Format::Osis).with_config(config);
/// assert!(!adapter.config().preserve_raw);
/// ```
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Keep the original bytes in the corpus attributes so the same format
    /// can be re-emitted byte for byte (L0).
    pub preserve_raw: bool,
    /// Pretty-print persisted IR JSON.
    pub pretty_ir: bool,
    /// Version string stamped on extracted corpora.
    pub corpus_version: String,
    /// Module type tag stamped on extracted corpora.
    pub module_type: String,
    /// Versification used when the source declares none.
    pub default_versification: String,
    /// Language used when the source declares none.
    pub default_language: String,
    /// Number of leading bytes inspected by `detect`.
    pub sniff_bytes: usize,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            preserve_raw: true,
            pretty_ir: true,
            corpus_version: "1.0.0".to_string(),
            module_type: "bible".to_string(),
            default_versification: "KJV".to_string(),
            default_language: "und".to_string(),
            sniff_bytes: 4096,
        }
    }
}
