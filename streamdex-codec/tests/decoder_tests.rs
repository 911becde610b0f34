use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use streamdex_codec::{
    DecodeError, RESERVED_FIELDS, decode, decode_json, decode_record, parse_number,
    sanitize_field_name,
};
use streamdex_types::{AttributeMap, TaggedValue};

fn decoded(wire: Value, force_numeric: bool) -> Value {
    decode_json(&wire, force_numeric).unwrap()
}

// ── Scalars ──────────────────────────────────────────────────────

#[test]
fn null_is_null_regardless_of_flag() {
    assert_eq!(decoded(json!({"NULL": true}), true), Value::Null);
    assert_eq!(decoded(json!({"NULL": true}), false), Value::Null);
}

#[test]
fn string_and_bool_verbatim() {
    assert_eq!(decoded(json!({"S": "hi"}), true), json!("hi"));
    assert_eq!(decoded(json!({"S": "42"}), true), json!("42"));
    assert_eq!(decoded(json!({"BOOL": true}), false), json!(true));
}

#[test]
fn number_forced_to_integer() {
    let v = decoded(json!({"N": "42"}), true);
    assert_eq!(v, json!(42));
    assert!(v.is_i64());
}

#[test]
fn number_forced_to_float() {
    let v = decoded(json!({"N": "4.5"}), true);
    assert_eq!(v, json!(4.5));
    assert!(v.is_f64());
}

#[test]
fn number_unforced_stays_text() {
    assert_eq!(decoded(json!({"N": "42"}), false), json!("42"));
}

#[test]
fn negative_and_exponent_numbers() {
    assert_eq!(decoded(json!({"N": "-7"}), true), json!(-7));
    assert_eq!(decoded(json!({"N": "1e3"}), true), json!(1000.0));
    assert_eq!(decoded(json!({"N": "-0.25"}), true), json!(-0.25));
}

// ── Collections ──────────────────────────────────────────────────

#[test]
fn list_members_decode_unforced() {
    let v = decoded(json!({"L": [{"S": "a"}, {"N": "1"}, {"BOOL": false}]}), true);
    assert_eq!(v, json!(["a", "1", false]));
}

#[test]
fn maps_inside_lists_type_their_numbers() {
    let v = decoded(json!({"L": [{"M": {"qty": {"N": "2"}}}]}), false);
    assert_eq!(v, json!([{"qty": 2}]));
}

#[test]
fn string_set_passes_through() {
    assert_eq!(decoded(json!({"SS": ["b", "a"]}), true), json!(["b", "a"]));
}

#[test]
fn byte_set_passes_base64_through() {
    assert_eq!(decoded(json!({"BS": ["aGk=", "eW8="]}), true), json!(["aGk=", "eW8="]));
}

#[test]
fn number_set_forced_and_unforced() {
    assert_eq!(decoded(json!({"NS": ["1", "2.5"]}), true), json!([1, 2.5]));
    assert_eq!(decoded(json!({"NS": ["1", "2.5"]}), false), json!(["1", "2.5"]));
}

#[test]
fn nested_map_numbers_are_always_typed() {
    let v = decoded(json!({"M": {"a": {"N": "3"}}}), false);
    assert_eq!(v, json!({"a": 3}));
    assert!(v["a"].is_i64());
}

#[test]
fn nested_map_number_sets_are_typed() {
    let v = decoded(json!({"M": {"scores": {"NS": ["1", "2"]}}}), false);
    assert_eq!(v, json!({"scores": [1, 2]}));
}

#[test]
fn map_preserves_field_order() {
    let v = decoded(
        json!({"M": {"z": {"S": "1"}, "a": {"S": "2"}, "m": {"S": "3"}}}),
        true,
    );
    let keys: Vec<&String> = v.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["z", "a", "m"]);
}

// ── Reserved names ───────────────────────────────────────────────

#[test]
fn reserved_top_level_name_is_escaped() {
    let v = decoded(json!({"M": {"_id": {"S": "x"}}}), true);
    assert_eq!(v, json!({"__id": "x"}));
}

#[test]
fn every_reserved_name_is_rewritten() {
    for name in RESERVED_FIELDS {
        let mut map = serde_json::Map::new();
        map.insert(name.to_string(), json!({"S": "v"}));
        let v = decoded(json!({ "M": map }), true);
        let object = v.as_object().unwrap();

        assert!(!object.contains_key(name), "{name} was not rewritten");
        let sanitized = sanitize_field_name(name).into_owned();
        assert_ne!(sanitized, name);
        assert_eq!(object.get(&sanitized), Some(&json!("v")));
    }
}

#[test]
fn reserved_names_in_nested_maps_are_escaped() {
    let v = decoded(json!({"M": {"meta": {"M": {"_type": {"S": "t"}}}}}), true);
    assert_eq!(v, json!({"meta": {"__type": "t"}}));
}

#[test]
fn reserved_looking_values_are_untouched() {
    let v = decoded(json!({"M": {"tags": {"SS": ["_id", "_source"]}, "k": {"S": "_id"}}}), true);
    assert_eq!(v, json!({"tags": ["_id", "_source"], "k": "_id"}));
}

#[test]
fn ordinary_names_pass_through() {
    let v = decoded(json!({"M": {"id": {"S": "1"}, "__id": {"S": "2"}, "type": {"S": "3"}}}), true);
    assert_eq!(v, json!({"id": "1", "__id": "2", "type": "3"}));
}

// ── decode_record ────────────────────────────────────────────────

#[test]
fn decode_record_builds_document() {
    let image: AttributeMap = serde_json::from_value(json!({
        "pk": {"S": "A"},
        "count": {"N": "10"},
        "price": {"N": "9.99"},
        "active": {"BOOL": true},
        "notes": {"NULL": true},
        "lines": {"L": [{"N": "1"}, {"M": {"sku": {"S": "X"}, "qty": {"N": "2"}}}]},
        "_source": {"S": "app"}
    }))
    .unwrap();

    let document = decode_record(&image).unwrap();
    assert_eq!(
        Value::Object(document),
        json!({
            "pk": "A",
            "count": 10,
            "price": 9.99,
            "active": true,
            "notes": null,
            "lines": ["1", {"sku": "X", "qty": 2}],
            "__source": "app"
        })
    );
}

#[test]
fn decode_record_of_empty_map() {
    let document = decode_record(&AttributeMap::new()).unwrap();
    assert!(document.is_empty());
}

// ── Failures ─────────────────────────────────────────────────────

#[test]
fn bad_number_fails_when_forced() {
    let err = decode(&TaggedValue::Number("12abc".into()), true).unwrap_err();
    assert!(matches!(err, DecodeError::NumericParseFailure(ref t) if t == "12abc"));
}

#[test]
fn bad_number_passes_when_unforced() {
    let v = decode(&TaggedValue::Number("12abc".into()), false).unwrap();
    assert_eq!(v, json!("12abc"));
}

#[test]
fn bad_number_inside_map_fails() {
    let err = decode_json(&json!({"M": {"n": {"N": "x"}}}), false).unwrap_err();
    assert!(matches!(err, DecodeError::NumericParseFailure(_)));
}

#[test]
fn bad_number_set_member_fails() {
    let err = decode_json(&json!({"NS": ["1", "two"]}), true).unwrap_err();
    assert!(matches!(err, DecodeError::NumericParseFailure(_)));
}

#[test]
fn non_finite_numbers_fail() {
    for text in ["NaN", "inf", "-infinity"] {
        assert!(matches!(
            parse_number(text).unwrap_err(),
            DecodeError::NumericParseFailure(_)
        ));
    }
}

#[test]
fn unsupported_tag_fails() {
    let err = decode_json(&json!({"B": "aGk="}), true).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Wire(streamdex_types::Error::UnsupportedTag(_))
    ));
}

// ── parse_number ─────────────────────────────────────────────────

#[test]
fn parse_number_prefers_integers() {
    assert!(parse_number("0").unwrap().is_i64());
    assert!(parse_number("9223372036854775807").unwrap().is_i64());
    assert!(parse_number("18446744073709551615").unwrap().is_u64());
    assert!(parse_number("1.0").unwrap().is_f64());
}

#[test]
fn parse_number_keeps_wide_integers_exact() {
    let v = parse_number("123456789012345678901234567890").unwrap();
    assert!(!v.is_f64());
    assert_eq!(v.to_string(), "123456789012345678901234567890");

    let negative = parse_number("-98765432109876543210987654321").unwrap();
    assert_eq!(negative.to_string(), "-98765432109876543210987654321");
}

#[test]
fn wide_integers_survive_in_documents() {
    let v = decoded(json!({"M": {"big": {"N": "99999999999999999999999999999999999999"}}}), false);
    assert_eq!(
        serde_json::to_string(&v).unwrap(),
        r#"{"big":99999999999999999999999999999999999999}"#
    );
}
