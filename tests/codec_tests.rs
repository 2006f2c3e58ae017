use chrono::NaiveDate;
use extf::core::codec::{self, FieldValue};
use extf::core::*;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn spec(label: &str) -> &'static FieldSpec {
    let index = position(&BUCHUNG_V9, label).unwrap();
    &BUCHUNG_V9[index]
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[test]
fn record_layout_bounds() {
    assert_eq!(BUCHUNG_V9.first().unwrap().label, "Umsatz (ohne Soll/Haben-Kz)");
    assert_eq!(BUCHUNG_V9.last().unwrap().label, "Datum Zuord. Steuerperiode");

    let required: Vec<&str> = BUCHUNG_V9
        .iter()
        .filter(|f| f.required)
        .map(|f| f.label)
        .collect();
    assert_eq!(
        required,
        [
            "Umsatz (ohne Soll/Haben-Kz)",
            "Soll/Haben-Kennzeichen",
            "Konto",
            "Gegenkonto (ohne BU-Schlüssel)",
            "Belegdatum"
        ]
    );
}

#[test]
fn record_labels_are_unique() {
    for (i, f) in BUCHUNG_V9.iter().enumerate() {
        assert_eq!(position(&BUCHUNG_V9, f.label), Some(i), "duplicate label {}", f.label);
    }
}

#[test]
fn header_layout_bounds() {
    assert_eq!(HEADER_V9[0].label, "DATEV-Format-KZ");
    assert_eq!(HEADER_V9[30].label, "Anwendungsinformation");
    assert_eq!(HEADER_V9[13].kind, FieldKind::Number { digits: 1, scale: 0 });
}

// ---------------------------------------------------------------------------
// Schema-driven decode/encode
// ---------------------------------------------------------------------------

#[test]
fn amount_column() {
    let umsatz = spec("Umsatz (ohne Soll/Haben-Kz)");
    assert_eq!(
        codec::decode(umsatz, "1234,50").unwrap(),
        Some(FieldValue::Number(dec!(1234.50)))
    );
    assert_eq!(
        codec::encode(umsatz, Some(&FieldValue::Number(dec!(7)))).unwrap(),
        "7,00"
    );
    for bad in ["12,5,6", "1.234,50", "-3,00", "01,00", "3,5", "3", ",50", "1 000,00"] {
        assert!(
            matches!(codec::decode(umsatz, bad), Err(DatevError::InvalidNumber { .. })),
            "{bad} should be rejected"
        );
    }
    assert!(matches!(
        codec::decode(umsatz, "12345678901,00"),
        Err(DatevError::FieldTooLong { max: 10, .. })
    ));
    assert!(matches!(
        codec::decode(umsatz, ""),
        Err(DatevError::MissingField { .. })
    ));
}

#[test]
fn lossy_scale_is_rejected() {
    let umsatz = spec("Umsatz (ohne Soll/Haben-Kz)");
    assert!(matches!(
        codec::encode(umsatz, Some(&FieldValue::Number(dec!(1.005)))),
        Err(DatevError::InvalidNumber { .. })
    ));
    // Trailing zeros beyond the scale are not a loss.
    assert_eq!(
        codec::encode(umsatz, Some(&FieldValue::Number(dec!(1.500)))).unwrap(),
        "1,50"
    );
}

#[test]
fn rate_column_has_six_places() {
    let kurs = spec("Kurs");
    assert_eq!(
        codec::decode(kurs, "1,234500").unwrap(),
        Some(FieldValue::Number(dec!(1.2345)))
    );
    assert!(codec::decode(kurs, "1,2345").is_err());
    assert_eq!(codec::decode(kurs, "").unwrap(), None);
}

#[test]
fn integer_column() {
    let stueck = spec("Stück");
    assert_eq!(
        codec::decode(stueck, "42").unwrap(),
        Some(FieldValue::Number(dec!(42)))
    );
    assert!(codec::decode(stueck, "42,0").is_err());
    assert!(matches!(
        codec::decode(stueck, "123456789"),
        Err(DatevError::FieldTooLong { max: 8, .. })
    ));
}

#[test]
fn date_columns() {
    let beleg = spec("Belegdatum");
    assert_eq!(
        codec::decode(beleg, "29022024").unwrap(),
        Some(FieldValue::Date(date(2024, 2, 29)))
    );
    for bad in ["29022023", "1503", "150321", "2021-03-15", "32012021", "15132021"] {
        assert!(
            matches!(codec::decode(beleg, bad), Err(DatevError::InvalidDate { .. })),
            "{bad} should be rejected"
        );
    }
    assert_eq!(
        codec::encode(beleg, Some(&FieldValue::Date(date(2021, 1, 5)))).unwrap(),
        "05012021"
    );

    let wj = &HEADER_V9[12];
    assert_eq!(
        codec::encode(wj, Some(&FieldValue::Date(date(2021, 1, 5)))).unwrap(),
        "20210105"
    );
}

#[test]
fn debit_credit_column() {
    let sh = spec("Soll/Haben-Kennzeichen");
    assert_eq!(codec::decode(sh, "S").unwrap(), Some(FieldValue::Text("S".into())));
    let err = codec::decode(sh, "s").unwrap_err();
    match err {
        DatevError::InvalidEnum { allowed, .. } => assert_eq!(allowed, ["S", "H"]),
        other => panic!("expected InvalidEnum, got {other:?}"),
    }
}

#[test]
fn account_columns() {
    let konto = spec("Konto");
    assert_eq!(
        codec::decode(konto, "00001200").unwrap(),
        Some(FieldValue::Text("00001200".into()))
    );
    assert!(matches!(
        codec::decode(konto, "12a"),
        Err(DatevError::InvalidNumber { .. })
    ));
    assert!(matches!(
        codec::decode(konto, "1234567890"),
        Err(DatevError::FieldTooLong { max: 9, .. })
    ));
}

#[test]
fn text_columns_count_characters() {
    let text = spec("Buchungstext");
    let umlauts = "ä".repeat(60);
    assert_eq!(
        codec::decode(text, &umlauts).unwrap(),
        Some(FieldValue::Text(umlauts.clone()))
    );
    assert!(matches!(
        codec::decode(text, &format!("{umlauts}x")),
        Err(DatevError::FieldTooLong { max: 60, .. })
    ));
    assert!(matches!(
        codec::encode(text, Some(&FieldValue::Text("Preis in ₽".into()))),
        Err(DatevError::Encoding(_))
    ));
    // The euro sign is part of Windows-1252.
    assert!(codec::encode(text, Some(&FieldValue::Text("100 €".into()))).is_ok());
}

#[test]
fn kind_mismatch_on_encode() {
    assert!(matches!(
        codec::encode(spec("Belegdatum"), Some(&FieldValue::Text("heute".into()))),
        Err(DatevError::SchemaMismatch(_))
    ));
}

#[test]
fn timestamp_column() {
    let erzeugt = &HEADER_V9[5];
    let at = date(2021, 2, 3).and_hms_milli_opt(4, 5, 6, 7).unwrap();
    assert_eq!(
        codec::encode(erzeugt, Some(&FieldValue::Timestamp(at))).unwrap(),
        "20210203040506007"
    );
    assert_eq!(
        codec::decode(erzeugt, "20210203040506007").unwrap(),
        Some(FieldValue::Timestamp(at))
    );
    assert!(codec::decode(erzeugt, "2021020304050600").is_err());
}

#[test]
fn errors_carry_field_names() {
    let err = codec::decode(spec("Skonto"), "abc").unwrap_err();
    assert_eq!(err.field(), Some("Skonto"));
    assert!(err.to_string().contains("Skonto"));

    let wrapped = err.at_record(4, Some(9));
    assert_eq!(wrapped.field(), Some("Skonto"));
    assert!(wrapped.to_string().starts_with("record 4 (line 9): "));
}
