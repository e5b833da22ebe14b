use super::*;
use crate::Error;

#[test]
fn test_hset_overwrites() {
    let mut s = MemoryStore::new();
    s.hset("k:hash", "AAA", 1).unwrap();
    s.hset("k:hash", "AAA", 2).unwrap();
    s.hset("k:hash", "BBB", 3).unwrap();
    assert_eq!(s.hash_len("k:hash"), 2);
    assert_eq!(s.hget("k:hash", "AAA").unwrap(), "2");
    assert_eq!(s.hget("k:hash", "BBB").unwrap(), "3");
}

#[test]
fn test_hget_missing() {
    let mut s = MemoryStore::new();
    match s.hget("k:hash", "AAA") {
        Err(Error::FieldMissing { key, field }) => {
            assert_eq!(key, "k:hash");
            assert_eq!(field, "AAA");
        }
        other => panic!("unexpected {:?}", other),
    }
    s.hset("k:hash", "BBB", 1).unwrap();
    assert!(matches!(
        s.hget("k:hash", "AAA"),
        Err(Error::FieldMissing { .. })
    ));
}

#[test]
fn test_zadd_pairs() {
    let mut s = MemoryStore::new();
    s.zadd("k:list", 2.0, "10.5").unwrap();
    s.zadd("k:list", 1.0, "10.5").unwrap();
    s.zadd("k:list", 1.0, "10.5").unwrap();
    s.zadd("k:list", 1.0, "7").unwrap();
    assert_eq!(
        s.entries("k:list"),
        vec![
            (1.0, "10.5".to_string()),
            (1.0, "7".to_string()),
            (2.0, "10.5".to_string())
        ]
    );
    assert!(matches!(
        s.zadd("k:list", f64::NAN, "1"),
        Err(Error::InvalidScore(_))
    ));
    assert_eq!(s.set_len("k:list"), 3);
}

#[test]
fn test_zrem_single_score() {
    let mut s = MemoryStore::new();
    s.zadd("k:list", 1.0, "a").unwrap();
    s.zadd("k:list", 2.0, "b").unwrap();
    s.zadd("k:list", 2.0, "c").unwrap();
    s.zadd("k:list", 3.0, "d").unwrap();
    assert_eq!(s.zrem_range_by_score("k:list", "2", "2").unwrap(), 2);
    assert_eq!(
        s.entries("k:list"),
        vec![(1.0, "a".to_string()), (3.0, "d".to_string())]
    );
    assert_eq!(s.zrem_range_by_score("k:list", "2", "2").unwrap(), 0);
    assert_eq!(s.zrem_range_by_score("missing", "0", "9").unwrap(), 0);
}

#[test]
fn test_zrem_bounds() {
    let mut s = MemoryStore::new();
    for (i, m) in ["a", "b", "c", "d"].iter().enumerate() {
        s.zadd("k", i as f64, m).unwrap();
    }
    assert_eq!(s.count_by_score("k", "-inf", "+inf").unwrap(), 4);
    assert_eq!(s.zrem_range_by_score("k", "(0", "(2").unwrap(), 1);
    assert_eq!(s.count_by_score("k", "1", "2").unwrap(), 1);
    assert_eq!(s.zrem_range_by_score("k", "-inf", "+inf").unwrap(), 3);
    assert_eq!(s.set_len("k"), 0);
}

#[test]
fn test_zrem_rejects_non_numeric() {
    let mut s = MemoryStore::new();
    s.zadd("k", 1.0, "a").unwrap();
    assert!(matches!(
        s.zrem_range_by_score("k", "abc", "abc"),
        Err(Error::InvalidScore(_))
    ));
    assert!(matches!(
        s.zrem_range_by_score("k", "nan", "1"),
        Err(Error::InvalidScore(_))
    ));
    assert_eq!(s.set_len("k"), 1);
}

#[test]
fn test_nanosecond_scores_match_their_text() {
    // large integer scores lose precision as f64; the text form read back from
    // the hash must still select the entry written with `score as f64`
    let mut s = MemoryStore::new();
    let score: i64 = 1_729_000_000_000_000_123;
    s.hset_zadd("k:hash", "AAA", "k:list", score, "10.5").unwrap();
    let text = s.hget("k:hash", "AAA").unwrap();
    assert_eq!(text, "1729000000000000123");
    assert_eq!(s.count_by_score("k:list", &text, &text).unwrap(), 1);
    assert_eq!(s.zrem_range_by_score("k:list", &text, &text).unwrap(), 1);
}

#[test]
fn test_parse_bound() {
    assert_eq!(parse_bound("1.5").unwrap(), Bound::Included(1.5));
    assert_eq!(parse_bound("(1.5").unwrap(), Bound::Excluded(1.5));
    assert_eq!(parse_bound("-inf").unwrap(), Bound::Included(f64::NEG_INFINITY));
    assert_eq!(parse_bound("+inf").unwrap(), Bound::Included(f64::INFINITY));
    assert!(parse_bound("").is_err());
    assert!(parse_bound("((1").is_err());
}
