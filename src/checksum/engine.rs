use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{MirrorDnaError, Result};

use super::canonical::canonical_json;

const FILE_CHUNK_SIZE: usize = 8192;

/// Verification input with an explicit, caller-chosen discriminator.
///
/// A string that happens to name an existing file is still hashed as text
/// when passed as `Text`; the caller decides, never the value shape.
#[derive(Debug, Clone, Copy)]
pub enum ChecksumInput<'a> {
    File(&'a Path),
    Text(&'a str),
    State(&'a Value),
}

/// String-typed kind discriminator for collaborator surfaces (CLI, config).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    File,
    Text,
    State,
}

impl ChecksumKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChecksumKind::File => "file",
            ChecksumKind::Text => "text",
            ChecksumKind::State => "state",
        }
    }
}

impl FromStr for ChecksumKind {
    type Err = MirrorDnaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(ChecksumKind::File),
            "text" => Ok(ChecksumKind::Text),
            "state" => Ok(ChecksumKind::State),
            other => Err(MirrorDnaError::UnsupportedKind(other.to_string())),
        }
    }
}

/// SHA-256 checksum engine for files, text payloads, and structured state.
///
/// All digests are rendered as 64 lowercase hex characters. Stateless;
/// construct one per caller and pass it in rather than sharing a global.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChecksumEngine;

impl ChecksumEngine {
    pub fn new() -> Self {
        Self
    }

    /// Streams the file in fixed-size chunks so memory stays bounded
    /// regardless of file size.
    pub fn checksum_file(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MirrorDnaError::NotFound(path.display().to_string()));
        }

        let mut file = File::open(path).map_err(|e| {
            MirrorDnaError::ComputationFailed(format!(
                "failed to open {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut hasher = Sha256::new();
        let mut buf = [0u8; FILE_CHUNK_SIZE];
        loop {
            let read = file.read(&mut buf).map_err(|e| {
                MirrorDnaError::ComputationFailed(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                ))
            })?;
            if read == 0 {
                break;
            }
            hasher.update(&buf[..read]);
        }

        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Hashes the canonical form of a structured document. The digest is
    /// independent of key-insertion order and of serializer configuration.
    pub fn checksum_state(&self, doc: &Value) -> String {
        sha256_hex(canonical_json(doc).as_bytes())
    }

    /// Hashes the UTF-8 bytes of `text` directly, no canonicalization.
    pub fn checksum_text(&self, text: &str) -> String {
        sha256_hex(text.as_bytes())
    }

    /// Recomputes the checksum for `input` and compares it against
    /// `expected`, case-insensitively.
    pub fn verify(&self, input: ChecksumInput<'_>, expected: &str) -> Result<bool> {
        let actual = match input {
            ChecksumInput::File(path) => self.checksum_file(path)?,
            ChecksumInput::Text(text) => self.checksum_text(text),
            ChecksumInput::State(doc) => self.checksum_state(doc),
        };
        Ok(actual.eq_ignore_ascii_case(expected))
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
