//! Document fingerprints for the processing log.

use sha2::{Digest, Sha256};

/// SHA-256 of the raw document bytes, lowercase hex.
///
/// Identical bytes always give the same fingerprint, so a re-sent file can
/// be recognised in the log even under a different name.
pub fn fingerprint(bytes: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(bytes);
  hex::encode(hasher.finalize())
}
