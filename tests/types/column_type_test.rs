use quarry::model::ColumnType;
use quarry::types::{decode_double, encode_double, ColumnTypeInfo, DbValue, NonFiniteTag, TypeError};

#[test]
fn test_every_type_has_a_physical_type() {
    for column_type in ColumnType::ALL {
        let info = ColumnTypeInfo::for_type(column_type);
        let size = info.requires_size().then_some(10);
        let sql = info.to_physical_type(size, None).unwrap();
        assert!(sql.ends_with("DEFAULT NULL"), "{:?}: {}", column_type, sql);
    }
}

#[test]
fn test_string_and_link_require_size() {
    for column_type in [ColumnType::String, ColumnType::Link] {
        let info = ColumnTypeInfo::for_type(column_type);
        assert_eq!(
            info.to_physical_type(None, None),
            Err(TypeError::MissingSize(column_type))
        );
    }
}

#[test]
fn test_string_physical_type_has_charset() {
    let info = ColumnTypeInfo::for_type(ColumnType::String);
    assert_eq!(
        info.to_physical_type(Some(50), None).unwrap(),
        "VARCHAR(50) CHARACTER SET utf8mb4 COLLATE utf8mb4_0900_ai_ci DEFAULT NULL"
    );
}

#[test]
fn test_default_cannot_inject() {
    let info = ColumnTypeInfo::for_type(ColumnType::Integer);
    assert!(matches!(
        info.to_physical_type(None, Some("1; DROP TABLE T1")),
        Err(TypeError::InvalidDefault { .. })
    ));

    let info = ColumnTypeInfo::for_type(ColumnType::String);
    let sql = info.to_physical_type(Some(30), Some("x'; DROP TABLE T1; --")).unwrap();
    assert!(sql.ends_with("DEFAULT 'x''; DROP TABLE T1; --'"), "{}", sql);
}

#[test]
fn test_parse_for_write() {
    let date = ColumnTypeInfo::for_type(ColumnType::Date);
    assert_eq!(
        date.parse_for_write("2021-01-01", None).unwrap(),
        DbValue::Long(1_609_459_200_000)
    );
    assert_eq!(date.parse_for_write("", None).unwrap(), DbValue::Null);

    let boolean = ColumnTypeInfo::for_type(ColumnType::Boolean);
    assert_eq!(boolean.parse_for_write("TRUE", None).unwrap(), DbValue::Bool(true));
    assert!(boolean.parse_for_write("yes", None).is_err());

    let entity = ColumnTypeInfo::for_type(ColumnType::EntityId);
    assert_eq!(entity.parse_for_write("syn123", None).unwrap(), DbValue::Long(123));

    let text = ColumnTypeInfo::for_type(ColumnType::String);
    assert_eq!(
        text.parse_for_write("abc", Some(2)),
        Err(TypeError::ValueTooLong {
            length: 3,
            max_size: 2
        })
    );
}

#[test]
fn test_parse_for_read() {
    let entity = ColumnTypeInfo::for_type(ColumnType::EntityId);
    assert_eq!(entity.parse_for_read(Some("123")).unwrap(), Some("syn123".to_string()));

    let boolean = ColumnTypeInfo::for_type(ColumnType::Boolean);
    assert_eq!(boolean.parse_for_read(Some("1")).unwrap(), Some("true".to_string()));
    assert_eq!(boolean.parse_for_read(None).unwrap(), None);
}

#[test]
fn test_non_finite_doubles() {
    assert_eq!(encode_double(f64::NAN), (DbValue::Null, Some(NonFiniteTag::NaN)));
    assert_eq!(
        encode_double(f64::INFINITY),
        (DbValue::Double(f64::MAX), Some(NonFiniteTag::Infinity))
    );
    assert_eq!(
        encode_double(f64::NEG_INFINITY),
        (DbValue::Double(f64::MIN), Some(NonFiniteTag::NegativeInfinity))
    );
    assert_eq!(encode_double(1.5), (DbValue::Double(1.5), None));

    assert_eq!(
        decode_double(Some("1.7976931348623157E308"), Some("Infinity")).unwrap(),
        Some("Infinity".to_string())
    );
    assert_eq!(decode_double(None, Some("NaN")).unwrap(), Some("NaN".to_string()));
    assert_eq!(decode_double(None, None).unwrap(), None);
}

/// Write a value, store its rendered bind, and read it back.
fn write_then_read(column_type: ColumnType, input: &str) -> Option<String> {
    let info = ColumnTypeInfo::for_type(column_type);
    let size = info.requires_size().then_some(50);
    let written = info.parse_for_write(input, size).unwrap();
    let stored = |value: &DbValue| (!value.is_null()).then(|| value.to_string());
    match written {
        DbValue::Double(d) => {
            let (value, tag) = encode_double(d);
            decode_double(stored(&value).as_deref(), tag.map(|t| t.as_str())).unwrap()
        }
        other => info.parse_for_read(stored(&other).as_deref()).unwrap(),
    }
}

#[test]
fn test_every_type_round_trips_to_normalized_text() {
    let cases = [
        (ColumnType::String, "it's a string", "it's a string"),
        (ColumnType::Double, "1.50", "1.5"),
        (ColumnType::Integer, " 42 ", "42"),
        (ColumnType::Boolean, "TRUE", "true"),
        (ColumnType::Date, "1970-01-02", "86400000"),
        (ColumnType::FileHandleId, "123", "123"),
        (ColumnType::EntityId, "syn9.2", "syn9"),
        (ColumnType::SubmissionId, "77", "77"),
        (ColumnType::EvaluationId, "88", "88"),
        (ColumnType::Link, "https://example.org/a?b=c", "https://example.org/a?b=c"),
        (ColumnType::LargeText, "line one\nline two", "line one\nline two"),
        (ColumnType::UserId, "3350396", "3350396"),
    ];
    assert_eq!(cases.len(), ColumnType::ALL.len());
    for column_type in ColumnType::ALL {
        let (_, input, expected) = cases
            .iter()
            .find(|(t, _, _)| *t == column_type)
            .unwrap_or_else(|| panic!("no case for {:?}", column_type));
        assert_eq!(
            write_then_read(column_type, input).as_deref(),
            Some(*expected),
            "{:?}",
            column_type
        );
    }
}

#[test]
fn test_non_finite_doubles_round_trip() {
    for (input, expected) in [("nan", "NaN"), ("+inf", "Infinity"), ("-∞", "-Infinity")] {
        assert_eq!(write_then_read(ColumnType::Double, input).as_deref(), Some(expected));
    }
}

#[test]
fn test_empty_value_reads_back_null() {
    for column_type in ColumnType::ALL {
        let info = ColumnTypeInfo::for_type(column_type);
        if info.is_string_type() {
            continue;
        }
        assert_eq!(write_then_read(column_type, ""), None, "{:?}", column_type);
    }
}
