//! Core data model for corpus conversion.
//!
//! This module contains:
//! - The IR graph (corpus, documents, content blocks, anchors, spans)
//! - Canonical verse locators and the book-code table
//! - Loss classification

mod corpus;
mod loss;
pub mod reference;

pub use corpus::{Anchor, ContentBlock, Corpus, Document, Span, SpanType};
pub use loss::{LossClass, LossReport};
pub use reference::{BOOK_CODES, Ref, format_ref, is_book_code, parse_ref};
