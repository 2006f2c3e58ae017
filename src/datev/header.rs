//! The two metadata rows of an EXTF file.

use std::ops::RangeInclusive;

use chrono::{Local, Months, NaiveDate, NaiveDateTime, SubsecRound};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::accounts::ChartOfAccounts;
use crate::core::codec;
use crate::core::{
    DatevError, FORMAT_CODES, FieldValue, HEADER_V9, SUPPORTED_VERSION, fields_for,
    header_fields_for,
};

/// Format name of the only supported data category.
pub const FORMAT_NAME: &str = "Buchungsstapel";
/// Datenkategorie of a Buchungsstapel.
pub const DATA_CATEGORY: u32 = 21;
/// Versionsnummer written by current DATEV interfaces.
pub const VERSION_NUMBER: u32 = 700;

// Column positions in the metadata row.
const FORMAT: usize = 0;
const VERSION: usize = 1;
const CATEGORY: usize = 2;
const NAME: usize = 3;
const FORMAT_VERSION: usize = 4;
const CREATED_AT: usize = 5;
const IMPORTED_AT: usize = 6;
const ORIGIN: usize = 7;
const EXPORTED_BY: usize = 8;
const IMPORTED_BY: usize = 9;
const ADVISOR: usize = 10;
const CLIENT: usize = 11;
const FISCAL_YEAR_START: usize = 12;
const ACCOUNT_LENGTH: usize = 13;
const PERIOD_START: usize = 14;
const PERIOD_END: usize = 15;
const DESCRIPTION: usize = 16;
const DICTATION_CODE: usize = 17;
const POSTING_TYPE: usize = 18;
const ACCOUNTING_PURPOSE: usize = 19;
const LOCKED: usize = 20;
const CURRENCY: usize = 21;
const RECORD_COUNT: usize = 22;
const DERIVATIVE_CODE: usize = 23;
const CHART: usize = 26;
const INDUSTRY_SOLUTION: usize = 27;
const APPLICATION_INFO: usize = 30;

/// DATEV-Format-KZ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatKind {
    /// `EXTF`: written by third-party software.
    Extf,
    /// `DTVF`: written by DATEV itself.
    Dtvf,
}

impl FormatKind {
    /// The four-letter code in the first metadata column.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Extf => "EXTF",
            Self::Dtvf => "DTVF",
        }
    }

    /// Parse `EXTF` or `DTVF`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "EXTF" => Some(Self::Extf),
            "DTVF" => Some(Self::Dtvf),
            _ => None,
        }
    }
}

/// Metadata of a Buchungsstapel (row 1 of the file).
///
/// The column-name row and the record count are not stored; both are derived
/// from the schema and the live record list whenever the header is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// DATEV-Format-KZ.
    pub format: FormatKind,
    /// Versionsnummer of the interface (700).
    pub version_number: u32,
    /// Datenkategorie (21 for Buchungsstapel).
    pub data_category: u32,
    /// Formatversion of the record layout; must be 9.
    pub format_version: u32,
    /// Erzeugt am.
    pub created_at: Option<NaiveDateTime>,
    /// Importiert (set by DATEV on import).
    pub imported_at: Option<NaiveDateTime>,
    /// Herkunft, max 2 chars.
    pub origin: Option<String>,
    /// Exportiert von, max 25 chars.
    pub exported_by: Option<String>,
    /// Importiert von, max 25 chars.
    pub imported_by: Option<String>,
    /// Beraternummer, 1001..=9999999.
    pub advisor_number: u32,
    /// Mandantennummer, 1..=99999.
    pub client_number: u32,
    /// Wirtschaftsjahr-Beginn.
    pub fiscal_year_start: NaiveDate,
    /// Sachkontenlänge: maximum digits of Konto and Gegenkonto, 1..=8.
    pub account_length: u8,
    /// Datum vom.
    pub period_start: NaiveDate,
    /// Datum bis.
    pub period_end: NaiveDate,
    /// Bezeichnung, max 30 chars.
    pub description: Option<String>,
    /// Diktatkürzel, max 2 chars.
    pub dictation_code: Option<String>,
    /// Buchungstyp: 1 = Finanzbuchführung, 2 = Jahresabschluss.
    pub posting_type: Option<u8>,
    /// Rechnungslegungszweck.
    pub accounting_purpose: Option<u8>,
    /// Festschreibung of the imported postings.
    pub locked: Option<bool>,
    /// WKZ, ISO 4217 currency code.
    pub currency: Option<String>,
    /// Derivatskennzeichen.
    pub derivative_code: Option<String>,
    /// SKR, two-digit chart of accounts identifier.
    pub chart: Option<String>,
    /// Branchen-Lösungs-ID.
    pub industry_solution_id: Option<u32>,
    /// Anwendungsinformation, max 16 chars.
    pub application_info: Option<String>,
}

impl Header {
    /// Interpret the metadata row and the column-name row.
    ///
    /// Returns the header and the record count declared in the metadata row,
    /// if it carries one.
    pub fn parse(
        meta: &[String],
        column_names: &[String],
    ) -> Result<(Self, Option<usize>), DatevError> {
        if meta.len() <= FORMAT_VERSION {
            return Err(DatevError::SchemaMismatch(format!(
                "metadata row has only {} fields",
                meta.len()
            )));
        }
        if !FORMAT_CODES.contains(&meta[FORMAT].as_str()) {
            return Err(DatevError::SchemaMismatch(format!(
                "'{}' is not a DATEV format identifier (expected EXTF or DTVF)",
                meta[FORMAT]
            )));
        }

        // Identity columns share one layout across all versions.
        let category = decode_u32(CATEGORY, &meta[CATEGORY])?;
        if category != DATA_CATEGORY || meta[NAME] != FORMAT_NAME {
            return Err(DatevError::SchemaMismatch(format!(
                "data category {category} ('{}') is not supported, only {DATA_CATEGORY} ('{FORMAT_NAME}')",
                meta[NAME]
            )));
        }
        let version = decode_u32(FORMAT_VERSION, &meta[FORMAT_VERSION])?;
        let layout = header_fields_for(version)?;
        let record_layout = fields_for(version)?;

        if meta.len() != layout.len() {
            return Err(DatevError::SchemaMismatch(format!(
                "metadata row has {} fields, version {version} declares {}",
                meta.len(),
                layout.len()
            )));
        }
        if column_names.len() != record_layout.len() {
            return Err(DatevError::SchemaMismatch(format!(
                "column-name row has {} columns, version {version} declares {}",
                column_names.len(),
                record_layout.len()
            )));
        }
        if let Some((i, (name, spec))) = column_names
            .iter()
            .zip(record_layout)
            .enumerate()
            .find(|(_, (name, spec))| !same_label(name, spec.label))
        {
            return Err(DatevError::SchemaMismatch(format!(
                "column {} is '{name}', version {version} expects '{}'",
                i + 1,
                spec.label
            )));
        }

        let values = meta
            .iter()
            .zip(layout)
            .map(|(raw, spec)| codec::decode(spec, raw))
            .collect::<Result<Vec<_>, _>>()?;
        let (header, declared) = Self::from_values(values)?;
        header.check_ranges()?;
        Ok((header, declared))
    }

    /// Produce the metadata row and the column-name row for `record_count` records.
    pub fn render(&self, record_count: usize) -> Result<(Vec<String>, Vec<String>), DatevError> {
        self.check_ranges()?;
        let layout = header_fields_for(self.format_version)?;
        let meta = layout
            .iter()
            .zip(self.to_values(record_count))
            .map(|(spec, value)| codec::encode(spec, value.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let columns = fields_for(self.format_version)?
            .iter()
            .map(|f| f.label.to_string())
            .collect();
        Ok((meta, columns))
    }

    /// Check ranges, the period and every field's bounds.
    pub fn validate(&self) -> Result<(), DatevError> {
        self.render(0).map(|_| ())
    }

    /// Whether `date` lies within Datum vom ..= Datum bis.
    pub fn in_period(&self, date: NaiveDate) -> bool {
        self.period_start <= date && date <= self.period_end
    }

    /// The SKR field as a known chart of accounts.
    pub fn chart_of_accounts(&self) -> Option<ChartOfAccounts> {
        self.chart.as_deref().and_then(ChartOfAccounts::from_code)
    }

    fn check_ranges(&self) -> Result<(), DatevError> {
        if self.format_version != SUPPORTED_VERSION {
            return Err(DatevError::UnsupportedVersion(self.format_version));
        }
        if self.data_category != DATA_CATEGORY {
            return Err(DatevError::SchemaMismatch(format!(
                "data category {} is not a Buchungsstapel",
                self.data_category
            )));
        }
        check_range(ADVISOR, self.advisor_number, 1001..=9_999_999)?;
        check_range(CLIENT, self.client_number, 1..=99_999)?;
        check_range(ACCOUNT_LENGTH, u32::from(self.account_length), 1..=8)?;
        if let Some(posting_type) = self.posting_type {
            check_range(POSTING_TYPE, u32::from(posting_type), 1..=2)?;
        }

        let fiscal_year_end = self
            .fiscal_year_start
            .checked_add_months(Months::new(12))
            .ok_or_else(|| invalid_date(FISCAL_YEAR_START, self.fiscal_year_start))?;
        let in_fiscal_year = |d: NaiveDate| self.fiscal_year_start <= d && d < fiscal_year_end;
        if !in_fiscal_year(self.period_start) {
            return Err(invalid_date(PERIOD_START, self.period_start));
        }
        if !in_fiscal_year(self.period_end) || self.period_end < self.period_start {
            return Err(invalid_date(PERIOD_END, self.period_end));
        }
        Ok(())
    }

    fn to_values(&self, record_count: usize) -> Vec<Option<FieldValue>> {
        let text = |s: &Option<String>| s.clone().filter(|s| !s.is_empty()).map(FieldValue::Text);
        let number = |n: u32| Some(FieldValue::Number(Decimal::from(n)));

        let mut values = vec![None; HEADER_V9.len()];
        values[FORMAT] = Some(FieldValue::Text(self.format.code().into()));
        values[VERSION] = number(self.version_number);
        values[CATEGORY] = number(self.data_category);
        values[NAME] = Some(FieldValue::Text(FORMAT_NAME.into()));
        values[FORMAT_VERSION] = number(self.format_version);
        values[CREATED_AT] = self.created_at.map(FieldValue::Timestamp);
        values[IMPORTED_AT] = self.imported_at.map(FieldValue::Timestamp);
        values[ORIGIN] = text(&self.origin);
        values[EXPORTED_BY] = text(&self.exported_by);
        values[IMPORTED_BY] = text(&self.imported_by);
        values[ADVISOR] = number(self.advisor_number);
        values[CLIENT] = number(self.client_number);
        values[FISCAL_YEAR_START] = Some(FieldValue::Date(self.fiscal_year_start));
        values[ACCOUNT_LENGTH] = number(u32::from(self.account_length));
        values[PERIOD_START] = Some(FieldValue::Date(self.period_start));
        values[PERIOD_END] = Some(FieldValue::Date(self.period_end));
        values[DESCRIPTION] = text(&self.description);
        values[DICTATION_CODE] = text(&self.dictation_code);
        values[POSTING_TYPE] = self.posting_type.and_then(|n| number(u32::from(n)));
        values[ACCOUNTING_PURPOSE] = self.accounting_purpose.and_then(|n| number(u32::from(n)));
        values[LOCKED] = self
            .locked
            .map(|locked| FieldValue::Text(if locked { "1" } else { "0" }.into()));
        values[CURRENCY] = text(&self.currency);
        values[RECORD_COUNT] = Some(FieldValue::Number(Decimal::from(record_count)));
        values[DERIVATIVE_CODE] = text(&self.derivative_code);
        values[CHART] = text(&self.chart);
        values[INDUSTRY_SOLUTION] = self.industry_solution_id.and_then(number);
        values[APPLICATION_INFO] = text(&self.application_info);
        values
    }

    /// Empty text is written as an absent field, so store it that way.
    fn clear_empty_text(&mut self) {
        for slot in [
            &mut self.origin,
            &mut self.exported_by,
            &mut self.imported_by,
            &mut self.description,
            &mut self.dictation_code,
            &mut self.currency,
            &mut self.derivative_code,
            &mut self.chart,
            &mut self.application_info,
        ] {
            if slot.as_deref() == Some("") {
                *slot = None;
            }
        }
    }

    fn from_values(mut values: Vec<Option<FieldValue>>) -> Result<(Self, Option<usize>), DatevError> {
        let v = &mut values;
        let format = take_text(v, FORMAT)
            .as_deref()
            .and_then(FormatKind::from_code)
            .ok_or(DatevError::MissingField {
                field: HEADER_V9[FORMAT].label,
            })?;
        let header = Self {
            format,
            version_number: required(take_u32(v, VERSION)?, VERSION)?,
            data_category: required(take_u32(v, CATEGORY)?, CATEGORY)?,
            format_version: required(take_u32(v, FORMAT_VERSION)?, FORMAT_VERSION)?,
            created_at: take_timestamp(v, CREATED_AT),
            imported_at: take_timestamp(v, IMPORTED_AT),
            origin: take_text(v, ORIGIN),
            exported_by: take_text(v, EXPORTED_BY),
            imported_by: take_text(v, IMPORTED_BY),
            advisor_number: required(take_u32(v, ADVISOR)?, ADVISOR)?,
            client_number: required(take_u32(v, CLIENT)?, CLIENT)?,
            fiscal_year_start: required(take_date(v, FISCAL_YEAR_START), FISCAL_YEAR_START)?,
            account_length: required(take_u8(v, ACCOUNT_LENGTH)?, ACCOUNT_LENGTH)?,
            period_start: required(take_date(v, PERIOD_START), PERIOD_START)?,
            period_end: required(take_date(v, PERIOD_END), PERIOD_END)?,
            description: take_text(v, DESCRIPTION),
            dictation_code: take_text(v, DICTATION_CODE),
            posting_type: take_u8(v, POSTING_TYPE)?,
            accounting_purpose: take_u8(v, ACCOUNTING_PURPOSE)?,
            locked: take_text(v, LOCKED).map(|flag| flag == "1"),
            currency: take_text(v, CURRENCY),
            derivative_code: take_text(v, DERIVATIVE_CODE),
            chart: take_text(v, CHART),
            industry_solution_id: take_u32(v, INDUSTRY_SOLUTION)?,
            application_info: take_text(v, APPLICATION_INFO),
        };
        let declared = take_u32(v, RECORD_COUNT)?.map(|n| n as usize);
        Ok((header, declared))
    }
}

/// Builder for [`Header`].
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use extf::datev::HeaderBuilder;
///
/// let header = HeaderBuilder::new(1001, 1, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap())
///     .account_length(4)
///     .description("Ausgangsrechnungen")
///     .build()
///     .unwrap();
/// assert_eq!(header.period_end, NaiveDate::from_ymd_opt(2021, 12, 31).unwrap());
/// ```
pub struct HeaderBuilder {
    header: Header,
}

impl HeaderBuilder {
    /// Start a header for one fiscal year; the period defaults to the whole year.
    pub fn new(advisor_number: u32, client_number: u32, fiscal_year_start: NaiveDate) -> Self {
        let period_end = fiscal_year_start
            .checked_add_months(Months::new(12))
            .and_then(|d| d.pred_opt())
            .unwrap_or(fiscal_year_start);
        Self {
            header: Header {
                format: FormatKind::Extf,
                version_number: VERSION_NUMBER,
                data_category: DATA_CATEGORY,
                format_version: SUPPORTED_VERSION,
                created_at: Some(Local::now().naive_local().trunc_subsecs(3)),
                imported_at: None,
                origin: None,
                exported_by: None,
                imported_by: None,
                advisor_number,
                client_number,
                fiscal_year_start,
                account_length: 4,
                period_start: fiscal_year_start,
                period_end,
                description: None,
                dictation_code: None,
                posting_type: Some(1),
                accounting_purpose: None,
                locked: None,
                currency: Some("EUR".into()),
                derivative_code: None,
                chart: None,
                industry_solution_id: None,
                application_info: None,
            },
        }
    }

    /// Set Datum vom / Datum bis.
    pub fn period(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.header.period_start = start;
        self.header.period_end = end;
        self
    }

    /// Set the G/L account length (Sachkontenlänge).
    pub fn account_length(mut self, len: u8) -> Self {
        self.header.account_length = len;
        self
    }

    /// Set the currency; records without "WKZ Umsatz" inherit it.
    pub fn currency(mut self, code: impl Into<String>) -> Self {
        self.header.currency = Some(code.into());
        self
    }

    /// Leave the WKZ field empty.
    pub fn without_currency(mut self) -> Self {
        self.header.currency = None;
        self
    }

    /// Set the batch description (max 30 chars).
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.header.description = Some(desc.into());
        self
    }

    /// Set the source identifier (max 2 chars).
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.header.origin = Some(origin.into());
        self
    }

    /// Set the "exported by" label (max 25 chars).
    pub fn exported_by(mut self, name: impl Into<String>) -> Self {
        self.header.exported_by = Some(name.into());
        self
    }

    /// Set the Diktatkürzel (max 2 chars).
    pub fn dictation_code(mut self, code: impl Into<String>) -> Self {
        self.header.dictation_code = Some(code.into());
        self
    }

    /// 1 = Finanzbuchführung (default), 2 = Jahresabschluss.
    pub fn posting_type(mut self, posting_type: u8) -> Self {
        self.header.posting_type = Some(posting_type);
        self
    }

    /// Set the Rechnungslegungszweck.
    pub fn accounting_purpose(mut self, purpose: u8) -> Self {
        self.header.accounting_purpose = Some(purpose);
        self
    }

    /// Lock postings on import (Festschreibung).
    pub fn lock_postings(mut self, lock: bool) -> Self {
        self.header.locked = Some(lock);
        self
    }

    /// Set the chart of accounts.
    pub fn chart(mut self, chart: ChartOfAccounts) -> Self {
        self.header.chart = Some(chart.code().into());
        self
    }

    /// Set the Anwendungsinformation (max 16 chars).
    pub fn application_info(mut self, info: impl Into<String>) -> Self {
        self.header.application_info = Some(info.into());
        self
    }

    /// Mark the file as written by DATEV (`DTVF`) instead of `EXTF`.
    pub fn format(mut self, format: FormatKind) -> Self {
        self.header.format = format;
        self
    }

    /// Override the creation timestamp (milliseconds precision).
    pub fn created_at(mut self, at: NaiveDateTime) -> Self {
        self.header.created_at = Some(at);
        self
    }

    /// Validate and build the header. Empty text options become `None`.
    pub fn build(mut self) -> Result<Header, DatevError> {
        self.header.clear_empty_text();
        self.header.validate()?;
        Ok(self.header)
    }
}

/// Column names compare with case and whitespace folded.
fn same_label(name: &str, label: &str) -> bool {
    let fold = |s: &str| {
        s.split_whitespace()
            .flat_map(str::chars)
            .flat_map(char::to_lowercase)
            .collect::<String>()
    };
    fold(name) == fold(label)
}

fn decode_u32(index: usize, raw: &str) -> Result<u32, DatevError> {
    let spec = &HEADER_V9[index];
    match codec::decode(spec, raw)? {
        Some(FieldValue::Number(d)) => to_u32(index, d),
        _ => Err(DatevError::MissingField { field: spec.label }),
    }
}

fn to_u32(index: usize, d: Decimal) -> Result<u32, DatevError> {
    d.to_u32().ok_or_else(|| DatevError::InvalidNumber {
        field: HEADER_V9[index].label,
        value: d.to_string(),
        message: "out of range".into(),
    })
}

fn take_text(values: &mut [Option<FieldValue>], index: usize) -> Option<String> {
    match values[index].take() {
        Some(FieldValue::Text(s)) => Some(s),
        _ => None,
    }
}

fn take_u32(values: &mut [Option<FieldValue>], index: usize) -> Result<Option<u32>, DatevError> {
    match values[index].take() {
        Some(FieldValue::Number(d)) => to_u32(index, d).map(Some),
        _ => Ok(None),
    }
}

fn take_u8(values: &mut [Option<FieldValue>], index: usize) -> Result<Option<u8>, DatevError> {
    take_u32(values, index)?
        .map(|n| {
            u8::try_from(n).map_err(|_| DatevError::InvalidNumber {
                field: HEADER_V9[index].label,
                value: n.to_string(),
                message: "out of range".into(),
            })
        })
        .transpose()
}

fn take_date(values: &mut [Option<FieldValue>], index: usize) -> Option<NaiveDate> {
    values[index].take().and_then(|v| v.as_date())
}

fn take_timestamp(values: &mut [Option<FieldValue>], index: usize) -> Option<NaiveDateTime> {
    values[index].take().and_then(|v| v.as_timestamp())
}

fn required<T>(value: Option<T>, index: usize) -> Result<T, DatevError> {
    value.ok_or(DatevError::MissingField {
        field: HEADER_V9[index].label,
    })
}

fn check_range(index: usize, value: u32, range: RangeInclusive<u32>) -> Result<(), DatevError> {
    if range.contains(&value) {
        return Ok(());
    }
    Err(DatevError::InvalidNumber {
        field: HEADER_V9[index].label,
        value: value.to_string(),
        message: format!("expected {}..={}", range.start(), range.end()),
    })
}

fn invalid_date(index: usize, date: NaiveDate) -> DatevError {
    DatevError::InvalidDate {
        field: HEADER_V9[index].label,
        value: date.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn header() -> Header {
        HeaderBuilder::new(1001, 1, date(2021, 1, 1))
            .created_at(date(2021, 2, 3).and_hms_milli_opt(10, 20, 30, 456).unwrap())
            .description("Test")
            .chart(ChartOfAccounts::SKR03)
            .build()
            .unwrap()
    }

    fn strings(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn builder_defaults() {
        let h = header();
        assert_eq!(h.format, FormatKind::Extf);
        assert_eq!(h.account_length, 4);
        assert_eq!(h.period_start, date(2021, 1, 1));
        assert_eq!(h.period_end, date(2021, 12, 31));
        assert_eq!(h.currency.as_deref(), Some("EUR"));
        assert_eq!(h.chart_of_accounts(), Some(ChartOfAccounts::SKR03));
    }

    #[test]
    fn render_metadata_row() {
        let (meta, columns) = header().render(2).unwrap();
        assert_eq!(meta.len(), 31);
        assert_eq!(columns.len(), 116);
        assert_eq!(
            &meta[..16],
            [
                "EXTF",
                "700",
                "21",
                "Buchungsstapel",
                "9",
                "20210203102030456",
                "",
                "",
                "",
                "",
                "1001",
                "1",
                "20210101",
                "4",
                "20210101",
                "20211231"
            ]
        );
        assert_eq!(meta[RECORD_COUNT], "2");
        assert_eq!(meta[CHART], "03");
        assert_eq!(columns[0], "Umsatz (ohne Soll/Haben-Kz)");
    }

    #[test]
    fn parse_rendered_rows() {
        let h = header();
        let (meta, columns) = h.render(7).unwrap();
        let (parsed, declared) = Header::parse(&meta, &columns).unwrap();
        assert_eq!(parsed, h);
        assert_eq!(declared, Some(7));
    }

    #[test]
    fn unsupported_version() {
        let (mut meta, columns) = header().render(0).unwrap();
        meta[FORMAT_VERSION] = "13".into();
        assert!(matches!(
            Header::parse(&meta, &columns),
            Err(DatevError::UnsupportedVersion(13))
        ));
    }

    #[test]
    fn wrong_identity() {
        let (mut meta, columns) = header().render(0).unwrap();
        meta[FORMAT] = "XTF".into();
        assert!(matches!(
            Header::parse(&meta, &columns),
            Err(DatevError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn other_category_rejected() {
        let (mut meta, columns) = header().render(0).unwrap();
        meta[CATEGORY] = "16".into();
        meta[NAME] = "Debitoren/Kreditoren".into();
        assert!(matches!(
            Header::parse(&meta, &columns),
            Err(DatevError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn column_count_mismatch() {
        let (meta, mut columns) = header().render(0).unwrap();
        columns.pop();
        assert!(matches!(
            Header::parse(&meta, &columns),
            Err(DatevError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn swapped_column_names_rejected() {
        let (meta, mut columns) = header().render(0).unwrap();
        columns.swap(6, 7);
        let err = Header::parse(&meta, &columns).unwrap_err();
        match err {
            DatevError::SchemaMismatch(message) => {
                assert!(message.contains("column 7"), "{message}");
                assert!(message.contains("'Gegenkonto (ohne BU-Schlüssel)'"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn column_names_fold_case_and_whitespace() {
        let (meta, mut columns) = header().render(0).unwrap();
        columns[0] = "UMSATZ  (ohne Soll/Haben-Kz) ".into();
        columns[6] = "konto".into();
        assert!(Header::parse(&meta, &columns).is_ok());

        columns[6] = "Kontonummer".into();
        assert!(matches!(
            Header::parse(&meta, &columns),
            Err(DatevError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn empty_text_options_read_back_as_absent() {
        let h = HeaderBuilder::new(1001, 1, date(2021, 1, 1))
            .created_at(date(2021, 2, 3).and_hms_opt(10, 20, 30).unwrap())
            .description("")
            .exported_by("")
            .build()
            .unwrap();
        assert_eq!(h.description, None);
        assert_eq!(h.exported_by, None);
        let (meta, columns) = h.render(0).unwrap();
        assert_eq!(Header::parse(&meta, &columns).unwrap().0, h);

        let mut edited = h.clone();
        edited.description = Some(String::new());
        let (meta, _) = edited.render(0).unwrap();
        assert_eq!(meta[DESCRIPTION], "");
    }

    #[test]
    fn short_metadata_row() {
        let meta = strings(&["EXTF", "700"]);
        assert!(matches!(
            Header::parse(&meta, &[]),
            Err(DatevError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn dtvf_accepted() {
        let h = HeaderBuilder::new(1001, 1, date(2021, 1, 1))
            .format(FormatKind::Dtvf)
            .build()
            .unwrap();
        let (meta, columns) = h.render(0).unwrap();
        assert_eq!(meta[0], "DTVF");
        assert_eq!(Header::parse(&meta, &columns).unwrap().0.format, FormatKind::Dtvf);
    }

    #[test]
    fn advisor_and_client_ranges() {
        let err = HeaderBuilder::new(1000, 1, date(2021, 1, 1)).build().unwrap_err();
        assert!(matches!(err, DatevError::InvalidNumber { field: "Berater", .. }));
        let err = HeaderBuilder::new(1001, 0, date(2021, 1, 1)).build().unwrap_err();
        assert!(matches!(err, DatevError::InvalidNumber { field: "Mandant", .. }));
    }

    #[test]
    fn account_length_range() {
        for len in [0, 9] {
            let err = HeaderBuilder::new(1001, 1, date(2021, 1, 1))
                .account_length(len)
                .build()
                .unwrap_err();
            assert!(matches!(
                err,
                DatevError::InvalidNumber {
                    field: "Sachkontenlänge",
                    ..
                }
            ));
        }
    }

    #[test]
    fn period_must_be_ordered_and_within_fiscal_year() {
        let reversed = HeaderBuilder::new(1001, 1, date(2021, 1, 1))
            .period(date(2021, 6, 1), date(2021, 5, 31))
            .build();
        assert!(matches!(reversed, Err(DatevError::InvalidDate { .. })));

        let beyond = HeaderBuilder::new(1001, 1, date(2021, 1, 1))
            .period(date(2021, 1, 1), date(2022, 1, 1))
            .build();
        assert!(matches!(beyond, Err(DatevError::InvalidDate { .. })));

        let broken_year = HeaderBuilder::new(1001, 1, date(2021, 7, 1))
            .period(date(2021, 7, 1), date(2022, 6, 30))
            .build();
        assert!(broken_year.is_ok());
    }

    #[test]
    fn description_too_long() {
        let err = HeaderBuilder::new(1001, 1, date(2021, 1, 1))
            .description("x".repeat(31))
            .build()
            .unwrap_err();
        assert!(matches!(err, DatevError::FieldTooLong { max: 30, .. }));
    }

    #[test]
    fn reserved_slot_must_be_empty() {
        let (mut meta, columns) = header().render(0).unwrap();
        meta[24] = "x".into();
        assert!(matches!(
            Header::parse(&meta, &columns),
            Err(DatevError::FieldTooLong { max: 0, .. })
        ));
    }
}
