//! # Fingerprint Determinism
//!
//! `generate(B, M)` must reproduce identical digests for the same content and
//! metadata on every run. These properties are the foundation every proof and
//! verification in the stack relies on.

use exhibit_core::fingerprint::{custom_hash, generate};
use proptest::prelude::*;

fn metadata_strategy() -> impl Strategy<Value = Option<serde_json::Value>> {
    prop::option::of(
        prop::collection::btree_map("[a-z]{1,8}", "[ -~]{0,16}", 0..6)
            .prop_map(|m| serde_json::to_value(m).unwrap_or(serde_json::Value::Null)),
    )
}

proptest! {
    #[test]
    fn same_input_same_digests(
        content in prop::collection::vec(any::<u8>(), 0..2048),
        metadata in metadata_strategy(),
    ) {
        let a = generate(Some(content.as_slice()), metadata.as_ref()).unwrap();
        let b = generate(Some(content.as_slice()), metadata.as_ref()).unwrap();
        prop_assert!(a.same_digests(&b));
    }

    #[test]
    fn custom_hash_tracks_content_digests(content in prop::collection::vec(any::<u8>(), 0..512)) {
        let fp = generate(Some(content.as_slice()), None).unwrap();
        prop_assert_eq!(&fp.custom_hash, &custom_hash(&fp.sha256, &fp.sha1, &fp.md5, &fp.crc32));
    }

    #[test]
    fn digests_are_lowercase_hex_of_fixed_width(content in prop::collection::vec(any::<u8>(), 0..256)) {
        let fp = generate(Some(content.as_slice()), None).unwrap();
        prop_assert_eq!(fp.sha256.len(), 64);
        prop_assert_eq!(fp.sha1.len(), 40);
        prop_assert_eq!(fp.md5.len(), 32);
        prop_assert_eq!(fp.crc32.len(), 8);
        for d in [&fp.sha256, &fp.sha1, &fp.md5, &fp.crc32, &fp.custom_hash, &fp.metadata_hash] {
            prop_assert!(d.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
        }
    }
}

#[test]
fn one_mebibyte_buffer_is_fingerprinted() {
    let content = vec![0x5au8; 1 << 20];
    let fp = generate(Some(content.as_slice()), None).unwrap();
    assert_eq!(fp.sha256.len(), 64);
}
