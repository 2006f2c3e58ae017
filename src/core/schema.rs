//! Field catalogue of the EXTF Buchungsstapel layout.
//!
//! Each column of the metadata row and of the record rows is described by a
//! [`FieldSpec`]: the label DATEV uses for it, its semantic type with length
//! bounds, and whether it must be filled. Only format version 9 is known.

use super::error::DatevError;

/// The only Buchungsstapel format version this crate reads and writes.
pub const SUPPORTED_VERSION: u32 = 9;

/// Layout of a textual date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLayout {
    /// `TTMMJJJJ`, used in record rows.
    DayMonthYear,
    /// `JJJJMMTT`, used in the metadata row.
    YearMonthDay,
}

/// Semantic type of a column, with its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Betrag: non-negative decimal, sign carried elsewhere.
    Amount {
        /// Maximum number of integer digits.
        digits: u8,
        /// Exact number of fractional digits.
        scale: u8,
    },
    /// Zahl: non-negative number; `scale == 0` means integer.
    Number {
        /// Maximum number of integer digits.
        digits: u8,
        /// Exact number of fractional digits.
        scale: u8,
    },
    /// Konto: account number as a string of digits.
    Account {
        /// Maximum number of digits.
        digits: u8,
    },
    /// Free text of bounded length.
    Text {
        /// Maximum number of characters.
        max: u16,
    },
    /// One of a fixed set of literals, matched case-sensitively.
    Choice(&'static [&'static str]),
    /// Calendar date.
    Date(DateLayout),
    /// `JJJJMMTTHHMMSSFFF` timestamp with milliseconds.
    Timestamp,
}

/// Definition of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Column label as it appears in the column-name row.
    pub label: &'static str,
    /// Semantic type and bounds.
    pub kind: FieldKind,
    /// Whether an empty value is rejected.
    pub required: bool,
}

impl FieldSpec {
    /// Mark the field as required.
    const fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

const fn field(label: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        label,
        kind,
        required: false,
    }
}

const fn text(label: &'static str, max: u16) -> FieldSpec {
    field(label, FieldKind::Text { max })
}

const fn amount(label: &'static str, digits: u8) -> FieldSpec {
    field(label, FieldKind::Amount { digits, scale: 2 })
}

const fn number(label: &'static str, digits: u8, scale: u8) -> FieldSpec {
    field(label, FieldKind::Number { digits, scale })
}

const fn account(label: &'static str, digits: u8) -> FieldSpec {
    field(label, FieldKind::Account { digits })
}

const fn date(label: &'static str, layout: DateLayout) -> FieldSpec {
    field(label, FieldKind::Date(layout))
}

/// Soll/Haben literals.
pub const DEBIT_CREDIT_CODES: &[&str] = &["S", "H"];
/// DATEV-Format-KZ literals: `EXTF` for third-party exports, `DTVF` for DATEV's own.
pub const FORMAT_CODES: &[&str] = &["EXTF", "DTVF"];
const FLAG_CODES: &[&str] = &["0", "1"];

/// Metadata row (row 1) of version 9.
pub static HEADER_V9: [FieldSpec; 31] = [
    field("DATEV-Format-KZ", FieldKind::Choice(FORMAT_CODES)).required(),
    number("Versionsnummer", 3, 0).required(),
    number("Datenkategorie", 2, 0).required(),
    text("Formatname", 30).required(),
    number("Formatversion", 3, 0).required(),
    field("Erzeugt am", FieldKind::Timestamp),
    field("Importiert", FieldKind::Timestamp),
    text("Herkunft", 2),
    text("Exportiert von", 25),
    text("Importiert von", 25),
    number("Berater", 7, 0).required(),
    number("Mandant", 5, 0).required(),
    date("WJ-Beginn", DateLayout::YearMonthDay).required(),
    number("Sachkontenlänge", 1, 0).required(),
    date("Datum vom", DateLayout::YearMonthDay).required(),
    date("Datum bis", DateLayout::YearMonthDay).required(),
    text("Bezeichnung", 30),
    text("Diktatkürzel", 2),
    number("Buchungstyp", 1, 0),
    number("Rechnungslegungszweck", 2, 0),
    field("Festschreibung", FieldKind::Choice(FLAG_CODES)),
    text("WKZ", 3),
    // Carries the record count of the batch.
    number("reserviert", 5, 0),
    text("Derivatskennzeichen", 255),
    text("reserviert", 0),
    text("reserviert", 0),
    text("SKR", 2),
    number("Branchen-Lösungs-ID", 9, 0),
    text("reserviert", 0),
    text("reserviert", 0),
    text("Anwendungsinformation", 16),
];

/// Record rows (row 3 onwards) of version 9.
pub static BUCHUNG_V9: [FieldSpec; 116] = [
    amount("Umsatz (ohne Soll/Haben-Kz)", 10).required(),
    field("Soll/Haben-Kennzeichen", FieldKind::Choice(DEBIT_CREDIT_CODES)).required(),
    text("WKZ Umsatz", 3),
    number("Kurs", 4, 6),
    amount("Basis-Umsatz", 10),
    text("WKZ Basis-Umsatz", 3),
    account("Konto", 9).required(),
    account("Gegenkonto (ohne BU-Schlüssel)", 9).required(),
    text("BU-Schlüssel", 4),
    date("Belegdatum", DateLayout::DayMonthYear).required(),
    text("Belegfeld 1", 36),
    text("Belegfeld 2", 12),
    amount("Skonto", 8),
    text("Buchungstext", 60),
    number("Postensperre", 1, 0),
    text("Diverse Adressnummer", 9),
    number("Geschäftspartnerbank", 3, 0),
    number("Sachverhalt", 2, 0),
    number("Zinssperre", 1, 0),
    text("Beleglink", 210),
    text("Beleginfo - Art 1", 20),
    text("Beleginfo - Inhalt 1", 210),
    text("Beleginfo - Art 2", 20),
    text("Beleginfo - Inhalt 2", 210),
    text("Beleginfo - Art 3", 20),
    text("Beleginfo - Inhalt 3", 210),
    text("Beleginfo - Art 4", 20),
    text("Beleginfo - Inhalt 4", 210),
    text("Beleginfo - Art 5", 20),
    text("Beleginfo - Inhalt 5", 210),
    text("Beleginfo - Art 6", 20),
    text("Beleginfo - Inhalt 6", 210),
    text("Beleginfo - Art 7", 20),
    text("Beleginfo - Inhalt 7", 210),
    text("Beleginfo - Art 8", 20),
    text("Beleginfo - Inhalt 8", 210),
    text("KOST1 - Kostenstelle", 36),
    text("KOST2 - Kostenstelle", 36),
    number("Kost-Menge", 12, 4),
    text("EU-Land u. UStID", 15),
    number("EU-Steuersatz", 2, 2),
    text("Abw. Versteuerungsart", 1),
    number("Sachverhalt L+L", 3, 0),
    number("Funktionsergänzung L+L", 3, 0),
    number("BU 49 Hauptfunktionstyp", 1, 0),
    number("BU 49 Hauptfunktionsnummer", 2, 0),
    number("BU 49 Funktionsergänzung", 3, 0),
    text("Zusatzinformation - Art 1", 20),
    text("Zusatzinformation - Inhalt 1", 210),
    text("Zusatzinformation - Art 2", 20),
    text("Zusatzinformation - Inhalt 2", 210),
    text("Zusatzinformation - Art 3", 20),
    text("Zusatzinformation - Inhalt 3", 210),
    text("Zusatzinformation - Art 4", 20),
    text("Zusatzinformation - Inhalt 4", 210),
    text("Zusatzinformation - Art 5", 20),
    text("Zusatzinformation - Inhalt 5", 210),
    text("Zusatzinformation - Art 6", 20),
    text("Zusatzinformation - Inhalt 6", 210),
    text("Zusatzinformation - Art 7", 20),
    text("Zusatzinformation - Inhalt 7", 210),
    text("Zusatzinformation - Art 8", 20),
    text("Zusatzinformation - Inhalt 8", 210),
    text("Zusatzinformation - Art 9", 20),
    text("Zusatzinformation - Inhalt 9", 210),
    text("Zusatzinformation - Art 10", 20),
    text("Zusatzinformation - Inhalt 10", 210),
    text("Zusatzinformation - Art 11", 20),
    text("Zusatzinformation - Inhalt 11", 210),
    text("Zusatzinformation - Art 12", 20),
    text("Zusatzinformation - Inhalt 12", 210),
    text("Zusatzinformation - Art 13", 20),
    text("Zusatzinformation - Inhalt 13", 210),
    text("Zusatzinformation - Art 14", 20),
    text("Zusatzinformation - Inhalt 14", 210),
    text("Zusatzinformation - Art 15", 20),
    text("Zusatzinformation - Inhalt 15", 210),
    text("Zusatzinformation - Art 16", 20),
    text("Zusatzinformation - Inhalt 16", 210),
    text("Zusatzinformation - Art 17", 20),
    text("Zusatzinformation - Inhalt 17", 210),
    text("Zusatzinformation - Art 18", 20),
    text("Zusatzinformation - Inhalt 18", 210),
    text("Zusatzinformation - Art 19", 20),
    text("Zusatzinformation - Inhalt 19", 210),
    text("Zusatzinformation - Art 20", 20),
    text("Zusatzinformation - Inhalt 20", 210),
    number("Stück", 8, 0),
    number("Gewicht", 8, 2),
    number("Zahlweise", 2, 0),
    text("Forderungsart", 10),
    number("Veranlagungsjahr", 4, 0),
    date("Zugeordnete Fälligkeit", DateLayout::DayMonthYear),
    number("Skontotyp", 1, 0),
    text("Auftragsnummer", 30),
    text("Buchungstyp", 2),
    number("USt-Schlüssel (Anzahlungen)", 2, 0),
    text("EU-Land (Anzahlungen)", 2),
    number("Sachverhalt L+L (Anzahlungen)", 3, 0),
    number("EU-Steuersatz (Anzahlungen)", 2, 2),
    account("Erlöskonto (Anzahlungen)", 8),
    text("Herkunft-Kz", 2),
    text("Buchungs GUID", 36),
    date("KOST-Datum", DateLayout::DayMonthYear),
    text("SEPA-Mandatsreferenz", 35),
    number("Skontosperre", 1, 0),
    text("Gesellschaftername", 76),
    number("Beteiligtennummer", 4, 0),
    text("Identifikationsnummer", 11),
    text("Zeichnernummer", 20),
    date("Postensperre bis", DateLayout::DayMonthYear),
    text("Bezeichnung SoBil-Sachverhalt", 30),
    number("Kennzeichen SoBil-Buchung", 2, 0),
    number("Festschreibung", 1, 0),
    date("Leistungsdatum", DateLayout::DayMonthYear),
    date("Datum Zuord. Steuerperiode", DateLayout::DayMonthYear),
];

/// Record layout for `version`.
pub fn fields_for(version: u32) -> Result<&'static [FieldSpec], DatevError> {
    match version {
        SUPPORTED_VERSION => Ok(&BUCHUNG_V9),
        other => Err(DatevError::UnsupportedVersion(other)),
    }
}

/// Metadata row layout for `version`.
pub fn header_fields_for(version: u32) -> Result<&'static [FieldSpec], DatevError> {
    match version {
        SUPPORTED_VERSION => Ok(&HEADER_V9),
        other => Err(DatevError::UnsupportedVersion(other)),
    }
}

/// Position of the column labelled `label`.
pub fn position(fields: &[FieldSpec], label: &str) -> Option<usize> {
    fields.iter().position(|f| f.label == label)
}
