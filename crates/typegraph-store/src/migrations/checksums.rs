//! SHA-256 checksums of migration SQL
//!
//! The checksum recorded in `schema_version` must keep matching the
//! embedded SQL; an edited migration is refused rather than re-applied.

use sha2::{Digest, Sha256};

use crate::errors::{checksum_mismatch, Result};

/// Hex-encoded SHA-256 of `content`
pub fn compute_checksum(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Compare a recorded checksum against the embedded SQL
///
/// Rows written before checksums were recorded carry `None` and pass.
pub fn verify_checksum(migration_id: &str, recorded: Option<&str>, sql: &str) -> Result<()> {
    let actual = compute_checksum(sql);
    match recorded {
        Some(expected) if expected != actual => {
            Err(checksum_mismatch(migration_id, expected, &actual))
        }
        _ => Ok(()),
    }
}
