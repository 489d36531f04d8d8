//! Directory extraction.
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, trace, warn};
use walkdir::WalkDir;

use crate::bundle;
use crate::compression;
use crate::constants::*;
use crate::error::{self, DecryptError};
use crate::keys::{ResourceKey, BUILTIN_RESOURCE_KEYS};
use crate::platform::Platform;
use crate::resource::ResourceDecoder;
use crate::sound;

/// Settings shared by every file of one run.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    pub platform: Platform,
    /// Salt forced onto every resource archive, bypassing the path rules.
    pub salt: Option<u32>,
    /// Keep resource payloads compressed.
    pub raw: bool,
    /// Resource key pairs registered on top of the built-in table.
    pub resource_keys: Vec<ResourceKey>,
}

/// What a file was recognised as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Bundle,
    Resource,
    Sound,
}

/// Salt and post-processing for one resource archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRule {
    pub salt: u32,
    pub inflate: bool,
}

/// Counters reported at the end of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub decrypted: usize,
    /// Recognised but not protected, written unchanged.
    pub copied: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Pick salt and decompression for a resource archive from its location.
///
/// `path` is relative to the input root, so only the dump's own layout is
/// considered.
pub fn resource_rule(path: &Path) -> ResourceRule {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let lower = file_name.to_ascii_lowercase();
    let in_dir = |dir: &str| {
        path.parent()
            .map(|parent| parent.iter().any(|c| c.to_str().map_or(false, |c| c.eq_ignore_ascii_case(dir))))
            .unwrap_or(false)
    };

    if file_name.eq_ignore_ascii_case(RES_MAP_FILE_NAME) {
        ResourceRule { salt: SALT_RES_MAP, inflate: true }
    } else if in_dir(LANGUAGE_MAP_DIR)
        || in_dir(DATABINS_DIR)
        || lower.starts_with("languagemap")
        || lower.starts_with("databin")
    {
        ResourceRule { salt: SALT_TABLE_DATA, inflate: true }
    } else if in_dir(LUA_DIR) || lower.starts_with("lua") {
        ResourceRule { salt: SALT_STREAM, inflate: false }
    } else {
        ResourceRule { salt: SALT_RES_MAP, inflate: true }
    }
}

fn has_extension(path: &Path, exts: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| exts.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Runs the decryption pipelines over files and directory trees.
pub struct Extractor {
    options: ExtractOptions,
    keys: Vec<ResourceKey>,
}

impl Extractor {
    pub fn new(options: ExtractOptions) -> Self {
        let mut keys = BUILTIN_RESOURCE_KEYS.to_vec();
        keys.extend(options.resource_keys.iter().copied());
        Self { options, keys }
    }

    pub fn platform(&self) -> Platform {
        self.options.platform
    }

    /// Resource rule for `path` with the command line overrides applied.
    pub fn resource_rule(&self, path: &Path) -> ResourceRule {
        let mut rule = resource_rule(path);
        if let Some(salt) = self.options.salt {
            rule.salt = salt;
        }
        if self.options.raw {
            rule.inflate = false;
        }
        rule
    }

    /// Recognise a file by content first, then by extension.
    pub fn classify(&self, path: &Path, data: &[u8]) -> Option<FileKind> {
        if data.starts_with(BUNDLE_SIGNATURE.as_bytes()) || has_extension(path, &[BUNDLE_EXT]) {
            Some(FileKind::Bundle)
        } else if ResourceDecoder::new(&self.keys).is_resource_archive(data) {
            Some(FileKind::Resource)
        } else if has_extension(path, SOUND_EXTS) || sound::is_sound_archive(data) {
            Some(FileKind::Sound)
        } else if has_extension(path, &[RESOURCE_EXT]) {
            Some(FileKind::Resource)
        } else {
            None
        }
    }

    /// Decrypt one file's contents.
    ///
    /// [`DecryptError::FormatMismatch`] means the file is not protected.
    pub fn decode(&self, kind: FileKind, path: &Path, data: &[u8]) -> error::Result<Vec<u8>> {
        match kind {
            FileKind::Bundle => bundle::decrypt_bundle(data, self.options.platform),
            FileKind::Resource => {
                let rule = self.resource_rule(path);
                trace!("{}: salt {:08X}, inflate {}", path.display(), rule.salt, rule.inflate);

                let payload = ResourceDecoder::new(&self.keys).try_decrypt(rule.salt, data)?;
                if rule.inflate && !payload.is_empty() {
                    compression::inflate(&payload)
                } else {
                    Ok(payload)
                }
            }
            FileKind::Sound => {
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
                sound::decrypt_sound(self.options.platform, name, data)
            }
        }
    }

    /// Extract `input`, a single file or a directory, into `output`, mirroring
    /// relative paths.
    pub fn extract(&self, input: &Path, output: &Path) -> Result<Summary> {
        let mut summary = Summary::default();

        if input.is_file() {
            let name = input
                .file_name()
                .ok_or_else(|| anyhow!("input has no file name: {}", input.display()))?;
            let rel = PathBuf::from(name);
            self.extract_file(input, &rel, output, &mut summary)?;
            return Ok(summary);
        }

        // Compare canonical roots so an output directory inside the input
        // tree is never walked, however either path is spelled.
        fs::create_dir_all(output).with_context(|| format!("creating {}", output.display()))?;
        let input = input
            .canonicalize()
            .with_context(|| format!("resolving {}", input.display()))?;
        let output = output
            .canonicalize()
            .with_context(|| format!("resolving {}", output.display()))?;

        let walker = WalkDir::new(&input)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !entry.path().starts_with(&output));

        for entry in walker {
            let dir_entry = entry?;
            if !dir_entry.file_type().is_file() {
                continue;
            }
            let rel = dir_entry.path().strip_prefix(&input)?;
            self.extract_file(dir_entry.path(), rel, &output, &mut summary)?;
        }

        Ok(summary)
    }

    fn extract_file(&self, path: &Path, rel: &Path, output: &Path, summary: &mut Summary) -> Result<()> {
        let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;

        let Some(kind) = self.classify(rel, &data) else {
            trace!("skipping {}", rel.display());
            summary.skipped += 1;
            return Ok(());
        };

        let out = match self.decode(kind, rel, &data) {
            Ok(out) => {
                info!("Decrypted {:?} {}", kind, rel.display());
                summary.decrypted += 1;
                out
            }
            Err(DecryptError::FormatMismatch) => {
                debug!("{} is not protected, copying", rel.display());
                summary.copied += 1;
                data
            }
            Err(e) => {
                warn!("{}: {}", rel.display(), e);
                summary.failed += 1;
                return Ok(());
            }
        };

        write_file(&output.join(rel), &out)
    }
}

fn write_file(out_path: &Path, buf: &[u8]) -> Result<()> {
    if let Some(parent_path) = out_path.parent() {
        fs::create_dir_all(parent_path).with_context(|| format!("creating {}", parent_path.display()))?;
    }

    let mut out_file = fs::File::create(out_path).with_context(|| format!("creating {}", out_path.display()))?;
    out_file
        .write_all(buf)
        .with_context(|| format!("writing {}", out_path.display()))?;

    Ok(())
}
