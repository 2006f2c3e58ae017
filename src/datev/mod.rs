//! DATEV Buchungsstapel (EXTF format version 9).
//!
//! [`Buchungsstapel`] is the document: a [`Header`] and the [`Buchung`]
//! records in the order they were added or read. Records are validated when
//! they are added, when a file is loaded and again when it is saved.
//!
//! # Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use extf::datev::*;
//! use rust_decimal_macros::dec;
//!
//! let header = HeaderBuilder::new(1001, 1, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap())
//!     .chart(ChartOfAccounts::SKR03)
//!     .build()
//!     .unwrap();
//! let mut stapel = Buchungsstapel::new(header);
//! stapel
//!     .add_buchung(
//!         BuchungBuilder::new(
//!             dec!(119.00),
//!             DebitCredit::Soll,
//!             "1400",
//!             "8400",
//!             NaiveDate::from_ymd_opt(2021, 3, 15).unwrap(),
//!         )
//!         .bu_key(BuSchluessel::UST_19)
//!         .document_number("RE-2021-001")
//!         .build(),
//!     )
//!     .unwrap();
//! stapel.save(stapel.file_name()).unwrap();
//! ```

mod accounts;
mod bu_key;
mod buchung;
mod header;
mod stapel;

pub use accounts::ChartOfAccounts;
pub use bu_key::BuSchluessel;
pub use buchung::{Buchung, BuchungBuilder, DebitCredit};
pub use header::{DATA_CATEGORY, FORMAT_NAME, FormatKind, Header, HeaderBuilder, VERSION_NUMBER};
pub use stapel::{Buchungsstapel, MAX_RECORDS};
