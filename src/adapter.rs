//! The five-operation conversion contract.
//!
//! An [`Adapter`] binds one [`Format`] to the shared core: blob store,
//! structural parser, structural emitter and loss policy.
//!
//! ```no_run
//! use bibleir::{Adapter, Format};
//!
//! # fn main() -> bibleir::Result<()> {
//! let osis = Adapter::new(Format::Osis);
//! let extracted = osis.extract_ir("kjv.osis.xml".as_ref(), "out".as_ref())?;
//! let emitted = Adapter::new(Format::Zefania).emit_native(&extracted.ir_path, "out".as_ref())?;
//! println!("{} ({})", emitted.output_path.display(), emitted.loss_class);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::compiler::{CorpusHeader, compile_corpus};
use crate::config::ConvertConfig;
use crate::error::{Error, Result};
use crate::formats::Format;
use crate::model::{Corpus, LossClass, LossReport};
use crate::store::BlobStore;
use crate::util::{extension, file_stem, write_atomic};

/// Outcome of [`Adapter::detect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub detected: bool,
    pub format: String,
    pub reason: String,
}

/// Outcome of [`Adapter::ingest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingested {
    pub artifact_id: String,
    pub blob_digest: String,
    pub size_bytes: u64,
    pub metadata: BTreeMap<String, String>,
}

/// One logical member of an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub is_dir: bool,
}

/// Outcome of [`Adapter::extract_ir`].
#[derive(Debug, Clone)]
pub struct Extracted {
    pub ir_path: PathBuf,
    pub loss_class: LossClass,
    pub loss_report: LossReport,
}

/// Outcome of [`Adapter::emit_native`].
#[derive(Debug, Clone)]
pub struct Emitted {
    pub output_path: PathBuf,
    pub format: String,
    pub loss_class: LossClass,
    pub loss_report: LossReport,
}

/// A format bound to a conversion configuration.
#[derive(Debug, Clone)]
pub struct Adapter {
    format: Format,
    config: ConvertConfig,
}

impl Adapter {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            config: ConvertConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ConvertConfig) -> Self {
        self.config = config;
        self
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Decide whether `path` is in this adapter's format.
    ///
    /// File-system problems are reported as a negative result, never as an
    /// error.
    pub fn detect(&self, path: &Path) -> Detection {
        let verdict = self.sniff_path(path);
        let (detected, reason) = match verdict {
            Ok(reason) => (true, reason),
            Err(reason) => (false, reason),
        };
        debug!(format = %self.format, path = %path.display(), detected, %reason, "detect");
        Detection {
            detected,
            format: self.format.name().to_string(),
            reason,
        }
    }

    fn sniff_path(&self, path: &Path) -> std::result::Result<String, String> {
        let meta = match fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err("file does not exist".into());
            }
            Err(e) => return Err(format!("cannot stat file: {}", e)),
        };
        if meta.is_dir() {
            return Err("path is a directory".into());
        }

        let head = read_head(path, self.config.sniff_bytes)
            .map_err(|e| format!("cannot read file: {}", e))?;
        let ext = extension(path);
        self.format.sniff(ext.as_deref(), &head)
    }

    /// Store the file's bytes and describe the artifact.
    pub fn ingest(&self, path: &Path, output_dir: &Path) -> Result<Ingested> {
        let bytes = fs::read(path).map_err(|e| Error::unreadable(path, e))?;
        let blob = BlobStore::new(output_dir).ingest(&bytes)?;

        let stem = file_stem(path);
        let info = self.format.read(&bytes).ok().map(|s| s.info);
        let artifact_id = info
            .as_ref()
            .and_then(|i| i.id.clone())
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| stem.clone());

        let mut metadata = BTreeMap::new();
        metadata.insert("format".to_string(), self.format.name().to_string());
        if let Some(name) = path.file_name() {
            metadata.insert("filename".to_string(), name.to_string_lossy().into_owned());
        }
        if let Some(info) = info {
            if let Some(title) = info.title {
                metadata.insert("title".to_string(), title);
            }
            if let Some(language) = info.language {
                metadata.insert("language".to_string(), language);
            }
        }

        info!(
            format = %self.format,
            %artifact_id,
            digest = %blob.digest,
            created = blob.created,
            "ingested"
        );
        Ok(Ingested {
            artifact_id,
            blob_digest: blob.digest,
            size_bytes: blob.size_bytes,
            metadata,
        })
    }

    /// List the members of an artifact. A file is its own single member; a
    /// directory lists its immediate children in name order.
    pub fn enumerate(&self, path: &Path) -> Result<Vec<Entry>> {
        let meta = fs::metadata(path).map_err(|e| Error::unreadable(path, e))?;
        if !meta.is_dir() {
            return Ok(vec![Entry {
                path: path.to_path_buf(),
                size_bytes: meta.len(),
                is_dir: false,
            }]);
        }

        let mut entries = Vec::new();
        for dirent in fs::read_dir(path).map_err(|e| Error::unreadable(path, e))? {
            let dirent = dirent.map_err(|e| Error::unreadable(path, e))?;
            let meta = dirent
                .metadata()
                .map_err(|e| Error::unreadable(dirent.path(), e))?;
            entries.push(Entry {
                path: dirent.path(),
                size_bytes: if meta.is_dir() { 0 } else { meta.len() },
                is_dir: meta.is_dir(),
            });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    /// Parse `path` and write its IR as `<output_dir>/<id>.ir.json`.
    pub fn extract_ir(&self, path: &Path, output_dir: &Path) -> Result<Extracted> {
        if !self.format.supports_ir() {
            return Err(self.format.unsupported("ExtractIR"));
        }
        let raw = fs::read(path).map_err(|e| Error::unreadable(path, e))?;
        let corpus = self.extract_corpus(&raw, &file_stem(path))?;
        let json = corpus.to_json_vec(self.config.pretty_ir)?;

        let ir_path = output_dir.join(format!("{}.ir.json", safe_file_name(&corpus.id)));
        write_output(&ir_path, &json)?;

        let mut report = LossReport::new(self.format.name(), "ir", corpus.loss_class);
        if !self.config.preserve_raw {
            report = report.with_warning(
                "raw payload not preserved; re-emission regenerates markup from the IR",
            );
        }
        if self.format == Format::Text {
            report = report.with_warning("plain text carries no structure beyond book and verse locators");
        }

        info!(
            format = %self.format,
            ir = %ir_path.display(),
            documents = corpus.documents.len(),
            blocks = corpus.block_count(),
            loss = %corpus.loss_class,
            "extracted IR"
        );
        Ok(Extracted {
            ir_path,
            loss_class: corpus.loss_class,
            loss_report: report,
        })
    }

    /// Parse an in-memory payload into a corpus. `fallback_id` names the
    /// corpus and any book when the source declares none.
    pub fn extract_corpus(&self, raw: &[u8], fallback_id: &str) -> Result<Corpus> {
        if !self.format.supports_ir() {
            return Err(self.format.unsupported("ExtractIR"));
        }
        let source = self.format.read(raw)?;
        let info = source.info;

        let id = info
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| fallback_id.to_string());
        let header = CorpusHeader {
            title: info.title.unwrap_or_else(|| id.clone()),
            language: info
                .language
                .unwrap_or_else(|| self.config.default_language.clone()),
            versification: info
                .versification
                .unwrap_or_else(|| self.config.default_versification.clone()),
            source_format: self.format.name().to_string(),
            module_type: self.config.module_type.clone(),
            version: self.config.corpus_version.clone(),
            loss_class: if self.config.preserve_raw {
                LossClass::L0
            } else {
                self.format.regeneration_class()
            },
            fallback_document_id: fallback_id.to_string(),
            id,
        };

        let mut corpus = compile_corpus(&source.roots, raw, header);
        if self.config.preserve_raw {
            corpus.set_raw_payload(self.format.raw_key(), raw);
        }
        Ok(corpus)
    }

    /// Load IR from `ir_path` and write this format to
    /// `<output_dir>/<id>.<ext>`.
    pub fn emit_native(&self, ir_path: &Path, output_dir: &Path) -> Result<Emitted> {
        if !self.format.supports_ir() {
            return Err(self.format.unsupported("EmitNative"));
        }
        let bytes = fs::read(ir_path).map_err(|e| Error::unreadable(ir_path, e))?;
        let corpus = Corpus::from_json_slice(&bytes)?;
        let (output, report) = self.render(&corpus)?;

        let output_path = output_dir.join(format!(
            "{}.{}",
            safe_file_name(&corpus.id),
            self.format.extension()
        ));
        write_output(&output_path, &output)?;

        info!(
            format = %self.format,
            output = %output_path.display(),
            loss = %report.loss_class,
            "emitted"
        );
        Ok(Emitted {
            output_path,
            format: self.format.name().to_string(),
            loss_class: report.loss_class,
            loss_report: report,
        })
    }

    /// Produce this format's bytes for `corpus`, replaying a preserved raw
    /// payload of the same format when there is one.
    pub fn render(&self, corpus: &Corpus) -> Result<(Vec<u8>, LossReport)> {
        if !self.format.supports_ir() {
            return Err(self.format.unsupported("EmitNative"));
        }
        if let Some(raw) = corpus.raw_payload(&self.format.raw_key())?
            && !raw.is_empty()
        {
            debug!(format = %self.format, bytes = raw.len(), "replaying raw payload");
            let report = LossReport::new(&corpus.source_format, self.format.name(), LossClass::L0);
            return Ok((raw, report));
        }

        debug!(format = %self.format, "regenerating from IR");
        let output = self.format.write(corpus)?;
        let class = self.format.regeneration_class().max(corpus.loss_class);
        let mut report = LossReport::new(&corpus.source_format, self.format.name(), class);
        match class {
            LossClass::L3 => {
                report = report.with_warning(
                    "structure dropped; only book, chapter:verse locators and text survive",
                )
            }
            LossClass::L1 | LossClass::L2 => {
                report = report.with_warning(
                    "markup regenerated from IR; formatting not carried by the IR was dropped",
                )
            }
            LossClass::L0 => {}
        }
        Ok((output, report))
    }
}

fn read_head(path: &Path, limit: usize) -> io::Result<Vec<u8>> {
    let mut head = Vec::with_capacity(limit.min(64 * 1024));
    File::open(path)?.take(limit as u64).read_to_end(&mut head)?;
    Ok(head)
}

fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| Error::unwritable(dir, e))?;
    }
    write_atomic(path, data).map_err(|e| Error::unwritable(path, e))
}

/// Make an identifier usable as a single path component.
fn safe_file_name(id: &str) -> String {
    let name: String = id
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let name = name.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if name.is_empty() {
        "untitled".to_string()
    } else {
        name.to_string()
    }
}
