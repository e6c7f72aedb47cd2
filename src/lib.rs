//! # bibleir
//!
//! Convert Bible texts between markup dialects through one shared
//! intermediate representation.
//!
//! ## Features
//!
//! - Content-addressable storage of source files
//! - OSIS, Zefania, JSON verse lists, plain text and HTML
//! - Byte-identical round-trips when the raw payload is preserved
//! - Loss classes (L0 through L3) reported for every conversion
//!
//! ## Quick Start
//!
//! ```no_run
//! use bibleir::{Adapter, Format};
//!
//! let extracted = Adapter::new(Format::Osis)
//!     .extract_ir("kjv.osis.xml".as_ref(), "out".as_ref())
//!     .unwrap();
//! let emitted = Adapter::new(Format::Json)
//!     .emit_native(&extracted.ir_path, "out".as_ref())
//!     .unwrap();
//! assert_eq!(emitted.format, "json");
//! ```
//!
//! ## Working with a Corpus
//!
//! ```
//! use bibleir::{Adapter, Format};
//!
//! let corpus = Adapter::new(Format::Text)
//!     .extract_corpus(b"Gen 1:1 In the beginning\nGen 1:2 And the earth\n", "kjv")
//!     .unwrap();
//! assert_eq!(corpus.documents[0].id, "Gen");
//! assert_eq!(corpus.verse_count(), 2);
//! ```

pub mod adapter;
pub mod compiler;
pub mod config;
pub mod error;
pub mod export;
pub mod formats;
pub mod markup;
pub mod model;
pub mod registry;
pub mod store;
pub mod tree;
pub(crate) mod util;

pub use adapter::{Adapter, Detection, Emitted, Entry, Extracted, Ingested};
pub use config::ConvertConfig;
pub use error::{Error, Result};
pub use formats::Format;
pub use model::{
    Anchor, ContentBlock, Corpus, Document, LossClass, LossReport, Ref, Span, SpanType,
    format_ref, parse_ref,
};
pub use registry::{PluginManifest, Registry};
pub use store::{BlobRef, BlobStore};
