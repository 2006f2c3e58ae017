//! # extf
//!
//! Reading and writing DATEV "Buchungsstapel" batches in the EXTF
//! interchange format, version 9.
//!
//! Amounts are [`rust_decimal::Decimal`], never floating point. Every value
//! is checked against the column layout before it enters a batch, and the
//! header is regenerated from the live record list on every save.
//!
//! ## Layers
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`core`] | column layouts, type codecs, errors |
//! | [`text`] | delimited-text reader/writer, Windows-1252 transcoding |
//! | [`datev`] | header, records and the [`Buchungsstapel`] document |
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use extf::{Buchungsstapel, DatevError, HeaderBuilder};
//! use rust_decimal_macros::dec;
//!
//! let header = HeaderBuilder::new(1001, 1, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap())
//!     .build()
//!     .unwrap();
//! let mut stapel = Buchungsstapel::new(header);
//! stapel
//!     .add_buchung_text(&[
//!         ("Umsatz (ohne Soll/Haben-Kz)", "34,56"),
//!         ("Soll/Haben-Kennzeichen", "S"),
//!         ("Konto", "3333"),
//!         ("Gegenkonto (ohne BU-Schlüssel)", "1111"),
//!         ("Belegdatum", "04052021"),
//!     ])
//!     .unwrap();
//!
//! let err = stapel
//!     .add_buchung_text(&[("Umsatz (ohne Soll/Haben-Kz)", "12,5,6")])
//!     .unwrap_err();
//! assert!(matches!(err, DatevError::InvalidNumber { .. }));
//! assert_eq!(stapel.len(), 1);
//! ```

pub mod core;
pub mod datev;
pub mod text;

pub use crate::core::{DatevError, FieldValue, ValidationError};
pub use crate::datev::*;
