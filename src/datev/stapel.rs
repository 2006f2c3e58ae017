//! The Buchungsstapel document: header plus ordered records.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::buchung::{ACCOUNT, Buchung, CONTRA_ACCOUNT, DOCUMENT_DATE};
use super::header::Header;
use crate::core::{
    BUCHUNG_V9, DatevError, FieldSpec, FieldValue, ValidationError, codec, fields_for, position,
};
use crate::text::{Dialect, RowReader, encoding, write_row};

/// Maximum number of records in one batch.
pub const MAX_RECORDS: usize = 99_999;

/// A Buchungsstapel: one header and its records in insertion order.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use extf::datev::{BuchungBuilder, Buchungsstapel, DebitCredit, HeaderBuilder};
/// use rust_decimal_macros::dec;
///
/// let header = HeaderBuilder::new(1001, 1, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap())
///     .build()
///     .unwrap();
/// let mut stapel = Buchungsstapel::new(header);
/// stapel
///     .add_buchung(
///         BuchungBuilder::new(
///             dec!(34.56),
///             DebitCredit::Soll,
///             "3333",
///             "1111",
///             NaiveDate::from_ymd_opt(2021, 5, 4).unwrap(),
///         )
///         .build(),
///     )
///     .unwrap();
///
/// let csv = stapel.render().unwrap();
/// let parsed = extf::datev::Buchungsstapel::parse_str(&csv).unwrap();
/// assert_eq!(parsed, stapel);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buchungsstapel {
    header: Header,
    records: Vec<Buchung>,
}

impl Buchungsstapel {
    /// An empty batch.
    pub fn new(header: Header) -> Self {
        Self {
            header,
            records: Vec::new(),
        }
    }

    /// The batch metadata.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Mutable header; changes are checked when the batch is rendered.
    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[Buchung] {
        &self.records
    }

    /// Unchecked access to the record list.
    ///
    /// Nothing is validated here; [`Buchungsstapel::render`] and
    /// [`Buchungsstapel::save`] check every record again.
    pub fn records_mut(&mut self) -> &mut Vec<Buchung> {
        &mut self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the batch holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Validate and append a record, returning its index.
    ///
    /// Empty text fields are stored as absent. A record without "WKZ Umsatz"
    /// takes the header currency. On error the record list is left unchanged.
    pub fn add_buchung(&mut self, mut buchung: Buchung) -> Result<usize, DatevError> {
        if self.records.len() >= MAX_RECORDS {
            return Err(DatevError::TooManyRecords { max: MAX_RECORDS });
        }
        buchung.clear_empty_text();
        if buchung.currency.is_none() {
            buchung.currency = self.header.currency.clone().filter(|c| !c.is_empty());
        }
        self.encode_record(&buchung)?;

        let index = self.records.len();
        self.warn_out_of_period(index, &buchung);
        self.records.push(buchung);
        debug!(index, "added Buchung");
        Ok(index)
    }

    /// Decode `(label, text)` pairs as they would appear in the file and
    /// append the resulting record.
    ///
    /// Unknown labels fail with [`DatevError::SchemaMismatch`].
    pub fn add_buchung_text(&mut self, fields: &[(&str, &str)]) -> Result<usize, DatevError> {
        let mut values = vec![None; BUCHUNG_V9.len()];
        for (label, raw) in fields {
            let index = position(&BUCHUNG_V9, label)
                .ok_or_else(|| DatevError::SchemaMismatch(format!("unknown column '{label}'")))?;
            values[index] = codec::decode(&BUCHUNG_V9[index], raw)?;
        }
        self.add_buchung(Buchung::from_values(values)?)
    }

    /// Every finding in the batch, including out-of-period posting dates.
    ///
    /// An empty result means [`Buchungsstapel::render`] will succeed.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut findings = Vec::new();
        if let Err(e) = self.header.validate() {
            let path = match e.field() {
                Some(field) => format!("header.{field}"),
                None => "header".to_string(),
            };
            findings.push(ValidationError::new(path, e.to_string()));
        }
        if self.records.len() > MAX_RECORDS {
            findings.push(ValidationError::new(
                "records",
                format!("{} records exceed the maximum of {MAX_RECORDS}", self.records.len()),
            ));
        }
        for (index, buchung) in self.records.iter().enumerate() {
            if let Err(e) = self.encode_record(buchung) {
                let path = match e.field() {
                    Some(field) => format!("records[{index}].{field}"),
                    None => format!("records[{index}]"),
                };
                findings.push(ValidationError::new(path, e.to_string()));
            }
            if !self.header.in_period(buchung.document_date) {
                findings.push(ValidationError::new(
                    format!("records[{index}].{}", BUCHUNG_V9[DOCUMENT_DATE].label),
                    format!(
                        "{} lies outside the period {} to {}",
                        buchung.document_date, self.header.period_start, self.header.period_end
                    ),
                ));
            }
        }
        findings
    }

    /// Render the batch as file text (before transcoding).
    ///
    /// The metadata row is regenerated from the current header and the live
    /// record count, and every record is checked again.
    pub fn render(&self) -> Result<String, DatevError> {
        if self.records.len() > MAX_RECORDS {
            return Err(DatevError::TooManyRecords { max: MAX_RECORDS });
        }
        let dialect = Dialect::for_version(self.header.format_version)?;
        let (meta, columns) = self.header.render(self.records.len())?;

        let mut out = String::new();
        write_row(&mut out, &meta, &dialect);
        write_row(&mut out, &columns, &dialect);
        for (index, buchung) in self.records.iter().enumerate() {
            let fields = self
                .encode_record(buchung)
                .map_err(|e| e.at_record(index, None))?;
            self.warn_out_of_period(index, buchung);
            write_row(&mut out, &fields, &dialect);
        }
        debug!(records = self.records.len(), chars = out.len(), "rendered Buchungsstapel");
        Ok(out)
    }

    /// Render and transcode to Windows-1252.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DatevError> {
        encoding::encode(&self.render()?)
    }

    /// Parse decoded file text.
    ///
    /// The first failing row aborts the parse; its error is wrapped in
    /// [`DatevError::Record`] with the record index and line.
    pub fn parse_str(input: &str) -> Result<Self, DatevError> {
        let mut rows = RowReader::new(input, Dialect::EXTF);
        let meta = rows
            .next()
            .transpose()?
            .ok_or_else(|| DatevError::SchemaMismatch("file is empty".into()))?;
        let columns = rows
            .next()
            .transpose()?
            .ok_or_else(|| DatevError::SchemaMismatch("column-name row is missing".into()))?;
        let (header, declared) = Header::parse(&meta.fields, &columns.fields)?;
        let layout = fields_for(header.format_version)?;
        debug!(format = header.format.code(), "parsed header");

        let mut stapel = Self::new(header);
        for (index, row) in rows.enumerate() {
            let row = row.map_err(|e| e.at_record(index, None))?;
            if index >= MAX_RECORDS {
                return Err(DatevError::TooManyRecords { max: MAX_RECORDS });
            }
            let buchung = decode_record(layout, &row.fields)
                .and_then(|b| stapel.check_account_lengths(&b).map(|()| b))
                .map_err(|e| e.at_record(index, Some(row.line)))?;
            stapel.warn_out_of_period(index, &buchung);
            stapel.records.push(buchung);
        }

        if let Some(declared) = declared {
            if declared != stapel.records.len() {
                return Err(DatevError::SchemaMismatch(format!(
                    "header declares {declared} records, file contains {}",
                    stapel.records.len()
                )));
            }
        }
        debug!(records = stapel.records.len(), "parsed records");
        Ok(stapel)
    }

    /// Transcode from Windows-1252 and parse.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DatevError> {
        Self::parse_str(&encoding::decode(bytes)?)
    }

    /// Read a batch from an EXTF file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatevError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        debug!(path = %path.display(), bytes = bytes.len(), "read EXTF file");
        let stapel = Self::from_bytes(&bytes)?;
        info!(path = %path.display(), records = stapel.len(), "loaded Buchungsstapel");
        Ok(stapel)
    }

    /// Write the batch to `path`, which must be named `EXTF_*.csv`.
    ///
    /// The whole file is rendered before the target is opened, so a
    /// validation failure never touches it.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DatevError> {
        let path = path.as_ref();
        check_file_name(path)?;
        let bytes = self.to_bytes()?;

        let mut file = File::create(path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        info!(
            path = %path.display(),
            records = self.records.len(),
            bytes = bytes.len(),
            "saved Buchungsstapel"
        );
        Ok(())
    }

    /// Suggested file name, e.g. `EXTF_Buchungsstapel_20210203_102030.csv`.
    ///
    /// Uses the header's creation time, or now if it has none.
    pub fn file_name(&self) -> String {
        let at = self
            .header
            .created_at
            .unwrap_or_else(|| Local::now().naive_local());
        format!("EXTF_Buchungsstapel_{}.csv", at.format("%Y%m%d_%H%M%S"))
    }

    fn encode_record(&self, buchung: &Buchung) -> Result<Vec<String>, DatevError> {
        let values = buchung.to_values()?;
        let fields = BUCHUNG_V9
            .iter()
            .zip(&values)
            .map(|(spec, value)| codec::encode(spec, value.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        self.check_account_lengths(buchung)?;
        Ok(fields)
    }

    /// Konto and Gegenkonto may not be longer than the Sachkontenlänge.
    fn check_account_lengths(&self, buchung: &Buchung) -> Result<(), DatevError> {
        let max = usize::from(self.header.account_length);
        for (index, account) in [
            (ACCOUNT, &buchung.account),
            (CONTRA_ACCOUNT, &buchung.contra_account),
        ] {
            if account.len() > max {
                return Err(DatevError::FieldTooLong {
                    field: BUCHUNG_V9[index].label,
                    value: account.clone(),
                    max,
                });
            }
        }
        Ok(())
    }

    fn warn_out_of_period(&self, index: usize, buchung: &Buchung) {
        if !self.header.in_period(buchung.document_date) {
            warn!(
                index,
                date = %buchung.document_date,
                period_start = %self.header.period_start,
                period_end = %self.header.period_end,
                "Belegdatum outside the header period"
            );
        }
    }
}

fn decode_record(layout: &[FieldSpec], fields: &[String]) -> Result<Buchung, DatevError> {
    if fields.len() != layout.len() {
        return Err(DatevError::SchemaMismatch(format!(
            "row has {} fields, expected {}",
            fields.len(),
            layout.len()
        )));
    }
    let values = layout
        .iter()
        .zip(fields)
        .map(|(spec, raw)| codec::decode(spec, raw))
        .collect::<Result<Vec<Option<FieldValue>>, _>>()?;
    Buchung::from_values(values)
}

fn check_file_name(path: &Path) -> Result<(), DatevError> {
    let valid = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with("EXTF_") && name.ends_with(".csv"));
    if valid {
        Ok(())
    } else {
        Err(DatevError::InvalidFileName(path.display().to_string()))
    }
}
