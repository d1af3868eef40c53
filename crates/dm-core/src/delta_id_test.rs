use super::*;

#[test]
fn test_parse_number() {
    assert_eq!(DeltaId::parse("42").unwrap(), DeltaId::Number(42));
    assert_eq!(DeltaId::parse(" 007 ").unwrap(), DeltaId::Number(7));
}

#[test]
fn test_parse_label() {
    let id = DeltaId::parse("2024.03-add_index").unwrap();
    assert_eq!(id, DeltaId::Label("2024.03-add_index".to_string()));
    assert_eq!(id.as_number(), None);
}

#[test]
fn test_parse_rejects_garbage() {
    assert!(DeltaId::parse("").is_err());
    assert!(DeltaId::parse("   ").is_err());
    assert!(DeltaId::parse("../etc").is_err());
    assert!(DeltaId::parse("a/b").is_err());
    assert!(DeltaId::parse(".hidden").is_err());
}

#[test]
fn test_numeric_order_is_not_lexical() {
    let nine = DeltaId::parse("9").unwrap();
    let ten = DeltaId::parse("10").unwrap();
    assert!(nine < ten);
}

#[test]
fn test_numbers_sort_before_labels() {
    let mut ids = vec![
        DeltaId::parse("beta").unwrap(),
        DeltaId::parse("100").unwrap(),
        DeltaId::parse("alpha").unwrap(),
        DeltaId::parse("3").unwrap(),
    ];
    ids.sort();
    let rendered: Vec<String> = ids.iter().map(ToString::to_string).collect();
    assert_eq!(rendered, vec!["3", "100", "alpha", "beta"]);
}

#[test]
fn test_display_roundtrips_through_from_str() {
    let id: DeltaId = "release-7".parse().unwrap();
    assert_eq!(id.to_string().parse::<DeltaId>().unwrap(), id);
}

#[test]
fn test_serde_accepts_numbers_and_strings() {
    let from_number: DeltaId = serde_json::from_str("12").unwrap();
    let from_string: DeltaId = serde_json::from_str("\"12\"").unwrap();
    assert_eq!(from_number, DeltaId::Number(12));
    assert_eq!(from_number, from_string);

    assert_eq!(serde_json::to_string(&DeltaId::Number(12)).unwrap(), "\"12\"");
    assert!(serde_json::from_str::<DeltaId>("\"\"").is_err());
}
