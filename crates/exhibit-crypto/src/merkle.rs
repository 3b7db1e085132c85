//! # Merkle Aggregator
//!
//! Folds an ordered list of hex digests into one root by pairwise SHA-256.
//! Leaves are the digests as given; they are not re-hashed.
//!
//! ```text
//!   level 0:  a        b        c
//!   level 1:  H(a∥b)   H(c∥c)
//!   root:     H(H(a∥b) ∥ H(c∥c))
//! ```
//!
//! `∥` concatenates the lowercase hex *text* and `H` is SHA-256 rendered as
//! lowercase hex. An odd level pairs its last element with itself.
//!
//! ## Proof Format
//!
//! The order of constituents is part of the proof format. Reordering
//! [`PROOF_MERKLE_ORDER`] changes every root and requires a new
//! [`PROOF_FORMAT_VERSION`].

use exhibit_core::sha256_hex;

/// Current integrity-proof format version.
pub const PROOF_FORMAT_VERSION: u32 = 1;

/// Fingerprint fields aggregated into a proof's Merkle root, in order.
pub const PROOF_MERKLE_ORDER: [&str; 4] = ["sha256", "sha1", "md5", "metadata_hash"];

/// Root of `ordered`. Empty input gives `""` and a single digest is its own root.
pub fn calculate_root<S: AsRef<str>>(ordered: &[S]) -> String {
    let mut level: Vec<String> = ordered.iter().map(|d| d.as_ref().to_string()).collect();
    if level.is_empty() {
        return String::new();
    }
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = &pair[0];
                hash_pair(left, pair.get(1).unwrap_or(left))
            })
            .collect();
    }
    level.pop().unwrap_or_default()
}

fn hash_pair(left: &str, right: &str) -> String {
    let mut joined = String::with_capacity(left.len() + right.len());
    joined.push_str(left);
    joined.push_str(right);
    sha256_hex(joined.as_bytes())
}
