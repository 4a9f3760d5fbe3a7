use rstest::*;

use crate::prelude::Label;

#[rstest]
#[case("ROVER", "ROVER")]
#[case("  BASE-01 ", "BASE-01")]
#[case("", "")]
#[case("ABCDEFGHIJKLMNOPQRST", "ABCDEFGHIJKLMNOPQRST")]
#[case("ABCDEFGHIJKLMNOPQRSTUVWXYZ", "ABCDEFGHIJKLMNOPQRST")]
#[case("éééééééééééééééééééééé", "éééééééééééééééééééé")]
fn label_truncation(#[case] description: &str, #[case] expected: &str) {
    let label = Label::new(description);
    assert_eq!(label.as_str(), expected);
    assert!(label.as_str().chars().count() <= Label::MAX_LEN);
}

#[test]
fn label_serdes() {
    let label = Label::from("SN-1234567");

    let json = serde_json::to_string(&label).unwrap();
    assert_eq!(json, "\"SN-1234567\"");

    // deserialization applies the same policy
    let parsed: Label = serde_json::from_str("\"0123456789012345678901234\"").unwrap();
    assert_eq!(parsed.as_str(), "01234567890123456789");
}
