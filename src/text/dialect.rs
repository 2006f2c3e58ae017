use crate::core::{DatevError, SUPPORTED_VERSION};

/// Delimiter, quote and line terminator of a format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    /// Field separator.
    pub delimiter: char,
    /// Quote character; doubled inside a quoted field.
    pub quote: char,
    /// Row terminator written on output. Input accepts CRLF and LF.
    pub line_terminator: &'static str,
}

impl Dialect {
    /// The EXTF family dialect: `;`, `"` and CRLF.
    pub const EXTF: Self = Self {
        delimiter: ';',
        quote: '"',
        line_terminator: "\r\n",
    };

    /// Dialect for a declared format version.
    pub fn for_version(version: u32) -> Result<Self, DatevError> {
        match version {
            SUPPORTED_VERSION => Ok(Self::EXTF),
            other => Err(DatevError::UnsupportedVersion(other)),
        }
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::EXTF
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_9_dialect() {
        let d = Dialect::for_version(9).unwrap();
        assert_eq!(d.delimiter, ';');
        assert_eq!(d.quote, '"');
        assert_eq!(d.line_terminator, "\r\n");
    }

    #[test]
    fn unknown_version() {
        assert!(matches!(
            Dialect::for_version(12),
            Err(DatevError::UnsupportedVersion(12))
        ));
    }
}
