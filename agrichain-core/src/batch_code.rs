//! Batch and order code generation
//!
//! Codes are opaque unique strings; the demo convention is a prefix,
//! a UTC timestamp and a short random suffix, so codes sort roughly by
//! creation time and survive being read out loud.

use chrono::Utc;
use rand::Rng;

const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const SUFFIX_LEN: usize = 6;

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..SUFFIX_ALPHABET.len());
            SUFFIX_ALPHABET[idx] as char
        })
        .collect()
}

/// New batch code, e.g. `AGB-20260807142512-K7M2PQ`
pub fn new_batch_code() -> String {
    format!(
        "AGB-{}-{}",
        Utc::now().format("%Y%m%d%H%M%S"),
        random_suffix()
    )
}

/// New order number, e.g. `ORD-20260807142512-X4Tx..`
pub fn new_order_number() -> String {
    format!(
        "ORD-{}-{}",
        Utc::now().format("%Y%m%d%H%M%S"),
        random_suffix()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn batch_codes_have_expected_shape() {
        let code = new_batch_code();
        assert!(code.starts_with("AGB-"));
        let parts: Vec<&str> = code.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].len(), 14);
        assert_eq!(parts[2].len(), SUFFIX_LEN);
    }

    #[test]
    fn codes_do_not_collide_in_a_small_sample() {
        let codes: HashSet<String> = (0..200).map(|_| new_batch_code()).collect();
        assert_eq!(codes.len(), 200);
    }
}
