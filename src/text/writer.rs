use super::Dialect;

/// Whether `value` has to be quoted to survive a read.
pub fn needs_quotes(value: &str, dialect: &Dialect) -> bool {
    value
        .chars()
        .any(|c| c == dialect.delimiter || c == dialect.quote || c == '\r' || c == '\n')
}

/// Append one field, quoting only when necessary.
pub fn write_field(out: &mut String, value: &str, dialect: &Dialect) {
    if !needs_quotes(value, dialect) {
        out.push_str(value);
        return;
    }
    out.push(dialect.quote);
    for ch in value.chars() {
        if ch == dialect.quote {
            out.push(dialect.quote);
        }
        out.push(ch);
    }
    out.push(dialect.quote);
}

/// Append a full row including its terminator.
pub fn write_row<S: AsRef<str>>(out: &mut String, fields: &[S], dialect: &Dialect) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(dialect.delimiter);
        }
        write_field(out, field.as_ref(), dialect);
    }
    out.push_str(dialect.line_terminator);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::read_rows;

    fn row(fields: &[&str]) -> String {
        let mut out = String::new();
        write_row(&mut out, fields, &Dialect::EXTF);
        out
    }

    #[test]
    fn minimal_quoting() {
        assert_eq!(row(&["EXTF", "700", "", "Miete Büro"]), "EXTF;700;;Miete Büro\r\n");
    }

    #[test]
    fn quotes_only_when_needed() {
        assert_eq!(row(&["a;b"]), "\"a;b\"\r\n");
        assert_eq!(row(&["5\" Zoll"]), "\"5\"\" Zoll\"\r\n");
        assert_eq!(row(&["zwei\nZeilen", "x"]), "\"zwei\nZeilen\";x\r\n");
    }

    #[test]
    fn reader_reconstructs_fields() {
        let original = ["", "a;b", "\"", "\r\n", "plain", "\"\"x\"\""];
        let text = row(&original);
        let rows = read_rows(&text, Dialect::EXTF).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fields, original);
    }
}
