use std::iter::Peekable;
use std::str::Chars;

use tracing::debug;

use super::Dialect;
use crate::core::DatevError;

/// One tokenized row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Physical line (1-based) on which the row starts.
    pub line: usize,
    /// Unquoted field contents.
    pub fields: Vec<String>,
}

/// Streaming tokenizer over decoded file content.
///
/// Yields one [`Row`] per logical row. A quoted field may contain the
/// delimiter, doubled quotes and line breaks. Empty lines are skipped. After
/// the first error the reader yields nothing more.
pub struct RowReader<'a> {
    chars: Peekable<Chars<'a>>,
    dialect: Dialect,
    line: usize,
    done: bool,
}

impl<'a> RowReader<'a> {
    /// Read `input` from its first line.
    pub fn new(input: &'a str, dialect: Dialect) -> Self {
        Self {
            chars: input.chars().peekable(),
            dialect,
            line: 1,
            done: false,
        }
    }

    fn malformed(&self, message: &str) -> DatevError {
        DatevError::MalformedRow {
            line: self.line,
            message: message.to_string(),
        }
    }

    /// Read up to and including the next row terminator. `None` for an empty line.
    fn read_row(&mut self) -> Result<Option<Vec<String>>, DatevError> {
        let Dialect {
            delimiter, quote, ..
        } = self.dialect;
        let start_line = self.line;
        let mut fields = Vec::new();
        let mut field = String::new();
        let mut touched = false;
        let mut in_quotes = false;
        let mut after_quote = false;

        loop {
            let Some(c) = self.chars.next() else {
                if in_quotes {
                    return Err(DatevError::MalformedRow {
                        line: start_line,
                        message: "unterminated quoted field".into(),
                    });
                }
                fields.push(field);
                return Ok(Some(fields));
            };

            if in_quotes {
                if c == quote {
                    if self.chars.peek() == Some(&quote) {
                        self.chars.next();
                        field.push(quote);
                    } else {
                        in_quotes = false;
                        after_quote = true;
                    }
                } else {
                    if c == '\n' {
                        self.line += 1;
                    }
                    field.push(c);
                }
                continue;
            }

            if c == delimiter {
                fields.push(std::mem::take(&mut field));
                touched = true;
                after_quote = false;
            } else if c == '\n' || c == '\r' {
                if c == '\r' {
                    if self.chars.peek() != Some(&'\n') {
                        return Err(self.malformed("carriage return without line feed"));
                    }
                    self.chars.next();
                }
                self.line += 1;
                if !touched && field.is_empty() {
                    return Ok(None);
                }
                fields.push(field);
                return Ok(Some(fields));
            } else if c == quote {
                if after_quote || !field.is_empty() {
                    return Err(self.malformed("quote character inside an unquoted field"));
                }
                in_quotes = true;
                touched = true;
            } else {
                if after_quote {
                    return Err(self.malformed("unexpected character after closing quote"));
                }
                field.push(c);
                touched = true;
            }
        }
    }
}

impl Iterator for RowReader<'_> {
    type Item = Result<Row, DatevError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if self.chars.peek().is_none() {
                self.done = true;
                break;
            }
            let line = self.line;
            match self.read_row() {
                Ok(Some(fields)) => return Some(Ok(Row { line, fields })),
                Ok(None) => debug!(line, "skipping empty line"),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

/// Tokenize all rows of `input`.
pub fn read_rows(input: &str, dialect: Dialect) -> Result<Vec<Row>, DatevError> {
    RowReader::new(input, dialect).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(input: &str) -> Vec<Vec<String>> {
        read_rows(input, Dialect::EXTF)
            .unwrap()
            .into_iter()
            .map(|r| r.fields)
            .collect()
    }

    #[test]
    fn plain_and_quoted_fields() {
        assert_eq!(
            fields("\"EXTF\";700;;\"a;b\"\r\n"),
            vec![vec!["EXTF", "700", "", "a;b"]]
        );
    }

    #[test]
    fn doubled_quote_and_line_break() {
        assert_eq!(
            fields("\"say \"\"hi\"\"\";\"two\r\nlines\"\n1;2"),
            vec![vec!["say \"hi\"", "two\r\nlines"], vec!["1", "2"]]
        );
    }

    #[test]
    fn line_numbers_follow_physical_lines() {
        let rows = read_rows("a\n\"b\nc\"\nd\n", Dialect::EXTF).unwrap();
        let lines: Vec<usize> = rows.iter().map(|r| r.line).collect();
        assert_eq!(lines, [1, 2, 4]);
    }

    #[test]
    fn lf_and_crlf_accepted() {
        assert_eq!(fields("1;2\n3;4\r\n"), fields("1;2\r\n3;4"));
    }

    #[test]
    fn empty_lines_skipped() {
        assert_eq!(fields("1\r\n\r\n2\r\n\r\n").len(), 2);
    }

    #[test]
    fn trailing_delimiter_yields_empty_field() {
        assert_eq!(fields("1;\r\n"), vec![vec!["1", ""]]);
    }

    #[test]
    fn unterminated_quote() {
        let err = read_rows("1;2\r\n\"open;3\r\n4", Dialect::EXTF).unwrap_err();
        assert!(matches!(err, DatevError::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn stray_quotes() {
        assert!(read_rows("ab\"c\"", Dialect::EXTF).is_err());
        assert!(read_rows("\"ab\"c", Dialect::EXTF).is_err());
        assert!(read_rows("\"ab\"\"", Dialect::EXTF).is_err());
    }

    #[test]
    fn bare_carriage_return() {
        assert!(matches!(
            read_rows("1\r2", Dialect::EXTF),
            Err(DatevError::MalformedRow { .. })
        ));
    }

    #[test]
    fn stops_after_error() {
        let mut reader = RowReader::new("\"x\"y\n1;2\n", Dialect::EXTF);
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }
}
