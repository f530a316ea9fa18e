//! Content fingerprints for change detection.
//!
//! A file's fingerprint is the SHA-256 hex digest of its raw bytes. A
//! multi-file survey is fingerprinted by hashing the concatenation of its
//! member fingerprints, taken in file-name order so that the result does
//! not depend on the order the directory happened to list them in.
//!
//! Fingerprints are used only to notice that content changed between runs.

use sha2::{Digest, Sha256};

use crate::models::SourceFile;

/// SHA-256 hex digest of `bytes`.
pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Fingerprint for a group of files.
///
/// Member fingerprints are sorted by file name ascending and their hex
/// digests hashed in that order. A single file keeps its own fingerprint.
pub fn combined_fingerprint(files: &[SourceFile]) -> String {
    if let [only] = files {
        return only.fingerprint.clone();
    }

    let mut members: Vec<(&str, &str)> = files
        .iter()
        .map(|f| (f.name.as_str(), f.fingerprint.as_str()))
        .collect();
    members.sort_by(|a, b| a.0.cmp(b.0));

    let mut hasher = Sha256::new();
    for (_, fingerprint) in members {
        hasher.update(fingerprint.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
