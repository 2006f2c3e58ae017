//! BU-Schlüssel (Buchungsschlüssel / tax posting keys) for DATEV.

use std::fmt;

use serde::{Deserialize, Serialize};

/// DATEV BU-Schlüssel (tax posting key).
///
/// Written to the "BU-Schlüssel" column of a record. When posting to an
/// Automatikkonto the key is left empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuSchluessel(pub u8);

impl BuSchluessel {
    /// USt 19% (output tax, standard rate).
    pub const UST_19: Self = Self(3);
    /// USt 7% (output tax, reduced rate).
    pub const UST_7: Self = Self(2);
    /// VSt 19% (input tax, standard rate).
    pub const VST_19: Self = Self(9);
    /// VSt 7% (input tax, reduced rate).
    pub const VST_7: Self = Self(8);
    /// Tax-free intra-community delivery.
    pub const EU_DELIVERY: Self = Self(10);
    /// Intra-community acquisition 19%.
    pub const EU_ACQUISITION_19: Self = Self(12);
    /// Intra-community acquisition 7%.
    pub const EU_ACQUISITION_7: Self = Self(13);
    /// Reverse charge §13b 19%.
    pub const REVERSE_CHARGE_19: Self = Self(44);
}

impl fmt::Display for BuSchluessel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_render_as_column_text() {
        assert_eq!(BuSchluessel::UST_19.to_string(), "3");
        assert_eq!(BuSchluessel::VST_7.to_string(), "8");
    }

    #[test]
    fn reverse_charge_renders_two_digits() {
        assert_eq!(BuSchluessel::REVERSE_CHARGE_19.to_string(), "44");
    }
}
