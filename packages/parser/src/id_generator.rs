use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

/// CRC32 of the source text, hex-encoded. Two loads of the same file get
/// the same document id, so node ids are stable across reloads.
pub fn get_document_id(source: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential id generator for nodes within a document.
///
/// Ids are minted once at node creation and never regenerated; the
/// `Document` keeps its generator so post-parse mutations (capture, new
/// table cells, ...) continue the same sequence without ever reusing an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdGenerator {
    seed: String, // Document id (CRC32)
    count: u32,   // Sequential counter
}

impl IdGenerator {
    pub fn new(source: &str) -> Self {
        Self {
            seed: get_document_id(source),
            count: 0,
        }
    }

    pub fn from_seed(seed: String) -> Self {
        Self { seed, count: 0 }
    }

    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}
