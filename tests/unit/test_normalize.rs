use chrono::{NaiveDate, NaiveTime};
use transit_star::core::normalize::coerce::{
    parse_compact_timestamp, parse_day_first_date, parse_decimal, parse_integer,
    parse_time_of_day,
};
use transit_star::core::normalize::{decode, parse_extract, Coercion, Delimiter, Normalizer};
use transit_star_types::{SourceKind, Value};

fn normalizer() -> Normalizer {
    Normalizer::new(
        NaiveDate::from_ymd_opt(2026, 2, 2)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap(),
    )
}

#[test]
fn test_fractional_suffix_does_not_change_the_instant() {
    assert_eq!(
        parse_compact_timestamp("20260201010644.0"),
        parse_compact_timestamp("20260201010644")
    );
    assert!(parse_compact_timestamp("20260201010644").is_some());
    assert_eq!(parse_compact_timestamp("2026020101064"), None);
    assert_eq!(parse_compact_timestamp("20261301010644"), None);
}

#[test]
fn test_decimal_comma() {
    assert_eq!(parse_decimal("-43,9279"), Some(-43.9279));
    assert_eq!(parse_decimal("-43.9279"), Some(-43.9279));
    assert_eq!(parse_decimal("1.234,5"), Some(1234.5));
    assert_eq!(parse_decimal("1,234.5"), Some(1234.5));
    assert_eq!(parse_decimal("abc"), None);
    assert_eq!(parse_decimal("NaN"), None);
}

#[test]
fn test_day_first_dates() {
    let feb_first = NaiveDate::from_ymd_opt(2026, 2, 1);
    assert_eq!(parse_day_first_date("01/02/2026"), feb_first);
    assert_eq!(parse_day_first_date("01-02-2026"), feb_first);
    assert_eq!(parse_day_first_date("2026-02-01"), feb_first);
    assert_eq!(parse_day_first_date("01/02/2026 23:10"), feb_first);
    assert_eq!(parse_day_first_date("31/02/2026"), None);
    assert_eq!(parse_day_first_date("yesterday"), None);
}

#[test]
fn test_time_of_day() {
    assert_eq!(parse_time_of_day("09:30"), NaiveTime::from_hms_opt(9, 30, 0));
    assert_eq!(parse_time_of_day("09:30:15"), NaiveTime::from_hms_opt(9, 30, 15));
    assert_eq!(parse_time_of_day("25:00"), None);
}

#[test]
fn test_integers_accept_zero_fractions() {
    assert_eq!(parse_integer("1234"), Some(1234));
    assert_eq!(parse_integer("1234.0"), Some(1234));
    assert_eq!(parse_integer("1234,00"), Some(1234));
    assert_eq!(parse_integer("12.5"), None);
}

#[test]
fn test_unparseable_values_become_null() {
    assert_eq!(Coercion::DayFirstDate.apply(&Value::text("not a date")), Value::Null);
    assert_eq!(Coercion::CompactTimestamp.apply(&Value::text("x")), Value::Null);
    assert_eq!(Coercion::Decimal.apply(&Value::Null), Value::Null);
    assert_eq!(Coercion::Integer.apply(&Value::Int(7)), Value::Int(7));
}

#[test]
fn test_delimiter_detection() {
    assert_eq!(Delimiter::sniff("a;b;c\n1;2;3"), Delimiter::Semicolon);
    assert_eq!(Delimiter::sniff("a\tb\tc"), Delimiter::Tab);
    assert_eq!(Delimiter::sniff("a|b"), Delimiter::Pipe);
    assert_eq!(Delimiter::sniff("\"a;b\",c,d"), Delimiter::Comma);
    assert_eq!(Delimiter::sniff("single"), Delimiter::Comma);
}

#[test]
fn test_latin1_extract_is_decoded() {
    let bytes = b"VIAGEM;SA\xcdDA;VE\xcdCULO\n01/02/2026;09:30;1234\n";
    let raw = parse_extract(&decode(bytes)).unwrap();
    assert_eq!(raw.table.columns(), &["viagem", "saida", "veiculo"]);
}

#[test]
fn test_header_variants_classify_identically() {
    let upper = normalizer()
        .normalize_text("a.csv", "VIAGEM;SAIDA\n01/02/2026;09:30\n")
        .unwrap();
    let spaced = normalizer()
        .normalize_text("b.csv", " Viagem ; Saída \n01/02/2026;09:30\n")
        .unwrap();
    assert_eq!(upper.kind, SourceKind::ScheduledTrip);
    assert_eq!(spaced.kind, SourceKind::ScheduledTrip);
    assert_eq!(upper.table, spaced.table);
}

#[test]
fn test_row_with_bad_cells_is_kept() {
    let source = normalizer()
        .normalize_text("tr.csv", "EV,HR,LT,NV\n105,garbage,north,abc\n")
        .unwrap();
    assert_eq!(source.kind, SourceKind::VehiclePosition);
    assert_eq!(source.table.len(), 1);
    let row = &source.table.rows()[0];
    assert_eq!(row[0], Value::Int(105));
    assert_eq!(row[1], Value::Null);
    assert_eq!(row[2], Value::Null);
    assert_eq!(row[3], Value::Null);
    assert_eq!(source.report.coercion_nulls.values().sum::<usize>(), 3);
}

#[test]
fn test_canonical_headers_are_accepted_as_is() {
    let source = normalizer()
        .normalize_text("tr.csv", "event_code,event_time,line_code\n105,20260201093000,38\n")
        .unwrap();
    assert_eq!(source.kind, SourceKind::VehiclePosition);
    assert_eq!(
        source.table.rows()[0][1],
        Value::Timestamp(
            NaiveDate::from_ymd_opt(2026, 2, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap()
        )
    );
    assert_eq!(source.table.rows()[0][2], Value::Int(38));
}
