//! Natural-key canonicalization and surrogate key minting.
//!
//! Both the dimension and the fact builders go through [`canonicalize`] and
//! [`KeyGenerator::key`]; a fact row resolves to a dimension member only because the
//! two sides produce byte-identical canonical text.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use transit_star_types::{CanonicalRule, Value};

/// Key reserved for null or empty natural values; never produced for a real member
pub const NULL_KEY: i64 = -1;

/// Reduce a natural value to its canonical text, or `None` for null and blank values.
pub fn canonicalize(value: &Value, rule: CanonicalRule) -> Option<String> {
    if value.is_null() {
        return None;
    }
    match rule {
        CanonicalRule::Text => Some(value.to_string().trim().to_lowercase()),
        CanonicalRule::Numeric => Some(match value {
            Value::Int(v) => v.to_string(),
            Value::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e15 => {
                format!("{}", *v as i64)
            }
            other => {
                let text = other.to_string();
                let text = text.trim();
                integer_text(text).unwrap_or_else(|| text.to_lowercase())
            }
        }),
    }
}

/// Plain decimal form of `^[+-]?\d+([.,]0*)?$`, without leading zeros.
fn integer_text(text: &str) -> Option<String> {
    let (negative, unsigned) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let (digits, fraction) = match unsigned.find(|c: char| c == '.' || c == ',') {
        Some(pos) => (&unsigned[..pos], &unsigned[pos + 1..]),
        None => (unsigned, ""),
    };
    if digits.is_empty()
        || !digits.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b == b'0')
    {
        return None;
    }
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        return Some("0".to_string());
    }
    Some(if negative {
        format!("-{}", trimmed)
    } else {
        trimmed.to_string()
    })
}

/// SHA-256 of `bytes`, read as a big-endian integer, reduced modulo `modulus`.
fn digest_mod(bytes: &[u8], modulus: u64) -> u64 {
    let modulus = modulus as u128;
    Sha256::digest(bytes)
        .iter()
        .fold(0u128, |acc, b| (acc * 256 + *b as u128) % modulus) as u64
}

/// Deterministic natural-key to surrogate-key function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyGenerator {
    key_space: u64,
}

impl KeyGenerator {
    pub fn new(key_space: u64) -> Self {
        KeyGenerator {
            key_space: key_space.clamp(2, i64::MAX as u64),
        }
    }

    pub fn key_space(&self) -> u64 {
        self.key_space
    }

    /// Key for already-canonical text; empty text maps to [`NULL_KEY`].
    pub fn key_for_canonical(&self, canonical: &str) -> i64 {
        if canonical.is_empty() {
            return NULL_KEY;
        }
        digest_mod(canonical.as_bytes(), self.key_space) as i64
    }

    /// Canonicalize `value` under `rule` and mint its key.
    pub fn key(&self, value: &Value, rule: CanonicalRule) -> i64 {
        canonicalize(value, rule)
            .map(|canonical| self.key_for_canonical(&canonical))
            .unwrap_or(NULL_KEY)
    }
}

/// Two or more canonical natural keys that minted the same surrogate key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCollision {
    pub key: i64,
    pub natural_keys: Vec<String>,
}

/// Group `(natural, key)` members by key and report every key shared by distinct naturals.
pub fn find_collisions<'a, I>(members: I) -> Vec<KeyCollision>
where
    I: IntoIterator<Item = (&'a str, i64)>,
{
    let mut by_key: BTreeMap<i64, Vec<String>> = BTreeMap::new();
    for (natural, key) in members {
        let naturals = by_key.entry(key).or_default();
        if !naturals.iter().any(|n| n == natural) {
            naturals.push(natural.to_string());
        }
    }
    by_key
        .into_iter()
        .filter(|(_, naturals)| naturals.len() > 1)
        .map(|(key, mut natural_keys)| {
            natural_keys.sort();
            KeyCollision { key, natural_keys }
        })
        .collect()
}
