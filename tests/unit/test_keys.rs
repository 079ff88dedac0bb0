use transit_star::core::keys::{canonicalize, find_collisions, KeyGenerator, NULL_KEY};
use transit_star_types::{CanonicalRule, Value};

#[test]
fn test_key_is_deterministic() {
    let a = KeyGenerator::new(100_000_000);
    let b = KeyGenerator::new(100_000_000);
    for natural in ["38", "9204", "viação sorriso", "a12"] {
        assert_eq!(a.key_for_canonical(natural), a.key_for_canonical(natural));
        assert_eq!(a.key_for_canonical(natural), b.key_for_canonical(natural));
    }
}

#[test]
fn test_null_and_empty_share_the_sentinel() {
    let generator = KeyGenerator::new(100_000_000);
    assert_eq!(generator.key(&Value::Null, CanonicalRule::Numeric), NULL_KEY);
    assert_eq!(generator.key(&Value::text(""), CanonicalRule::Numeric), NULL_KEY);
    assert_eq!(generator.key(&Value::text("   "), CanonicalRule::Text), NULL_KEY);
    assert_eq!(generator.key_for_canonical(""), NULL_KEY);
}

#[test]
fn test_keys_stay_inside_key_space() {
    let generator = KeyGenerator::new(1000);
    for n in 0..500 {
        let key = generator.key_for_canonical(&n.to_string());
        assert!((0..1000).contains(&key));
    }
}

#[test]
fn test_equivalent_representations_share_a_key() {
    let generator = KeyGenerator::new(100_000_000);
    let rule = CanonicalRule::Numeric;
    let expected = generator.key(&Value::Int(38), rule);
    for value in [
        Value::text("038"),
        Value::text(" 38 "),
        Value::text("38.0"),
        Value::text("38,00"),
        Value::Float(38.0),
    ] {
        assert_eq!(generator.key(&value, rule), expected, "{:?}", value);
    }
    assert_ne!(generator.key(&Value::text("38A"), rule), expected);
}

#[test]
fn test_canonical_forms() {
    assert_eq!(canonicalize(&Value::text("000"), CanonicalRule::Numeric).as_deref(), Some("0"));
    assert_eq!(canonicalize(&Value::text("-007"), CanonicalRule::Numeric).as_deref(), Some("-7"));
    assert_eq!(canonicalize(&Value::text("A12 "), CanonicalRule::Numeric).as_deref(), Some("a12"));
    assert_eq!(canonicalize(&Value::Float(1.5), CanonicalRule::Numeric).as_deref(), Some("1.5"));
    assert_eq!(canonicalize(&Value::text("038"), CanonicalRule::Text).as_deref(), Some("038"));
    assert_eq!(canonicalize(&Value::Null, CanonicalRule::Text), None);
}

#[test]
fn test_collisions_are_found_in_a_small_key_space() {
    let generator = KeyGenerator::new(2);
    let naturals = ["1", "2", "3"];
    let members: Vec<(&str, i64)> = naturals
        .iter()
        .map(|n| (*n, generator.key_for_canonical(n)))
        .collect();

    let collisions = find_collisions(members.iter().copied());
    assert!(!collisions.is_empty());
    for collision in &collisions {
        assert!(collision.natural_keys.len() >= 2);
        for natural in &collision.natural_keys {
            assert_eq!(generator.key_for_canonical(natural), collision.key);
        }
    }
}

#[test]
fn test_no_collisions_reported_for_distinct_keys() {
    let collisions = find_collisions([("38", 1), ("38", 1), ("9204", 2)]);
    assert!(collisions.is_empty());
}
