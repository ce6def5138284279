//! Decoding of `mysql -B` output into records.
//!
//! The client prints a tab-separated header line followed by one
//! tab-separated line per row, with the literal `NULL` for SQL NULL.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::{value::ISO_FORMAT, CommandoError, Record, Result, ResultSet, Value};

/// Text printed by the client for SQL NULL.
pub const NULL_MARKER: &str = "NULL";

struct CastRule {
    pattern: Regex,
    convert: fn(&str) -> Option<Value>,
}

// Evaluated in order, first full match wins. A matching rule whose
// conversion fails leaves the field as text.
static CAST_RULES: LazyLock<Vec<CastRule>> = LazyLock::new(|| {
    vec![
        CastRule {
            pattern: Regex::new(r"^-?\d+$").expect("integer pattern"),
            convert: |field| field.parse::<i64>().ok().map(Value::Integer),
        },
        CastRule {
            pattern: Regex::new(r"^-?(\d+\.?\d*|\.\d+)([Ee][+-]?\d+)?$").expect("float pattern"),
            convert: |field| {
                field
                    .parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .map(Value::Float)
            },
        },
        CastRule {
            pattern: Regex::new(r"^\d{4}-\d\d-\d\d \d\d:\d\d:\d\d$").expect("timestamp pattern"),
            convert: |field| {
                NaiveDateTime::parse_from_str(field, ISO_FORMAT)
                    .ok()
                    .map(Value::Timestamp)
            },
        },
        CastRule {
            pattern: Regex::new(&format!("^{}$", regex::escape(NULL_MARKER)))
                .expect("null pattern"),
            convert: |_| Some(Value::Null),
        },
    ]
});

/// Controls how client output is turned into records.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodeOptions {
    /// Convert fields to integers, floats, timestamps and nulls.
    pub cast: bool,
    /// Reject rows whose field count differs from the header's.
    pub strict: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            cast: true,
            strict: false,
        }
    }
}

/// Decodes complete client output, leniently.
pub fn decode(raw: &str, cast: bool) -> Result<ResultSet> {
    decode_with(
        raw,
        &DecodeOptions {
            cast,
            strict: false,
        },
    )
}

/// Decodes client output captured as bytes; it must be UTF-8.
pub fn decode_bytes(raw: &[u8], cast: bool) -> Result<ResultSet> {
    let text = std::str::from_utf8(raw).map_err(|err| {
        // The valid prefix is UTF-8 by construction.
        let valid = std::str::from_utf8(&raw[..err.valid_up_to()]).unwrap_or_default();
        let skipped = match content_start(valid) {
            Some(start) => valid[..start].matches('\n').count(),
            None => valid.matches('\n').count(),
        };
        let line = valid.matches('\n').count() + 1 - skipped;
        CommandoError::MalformedTabularOutput {
            line,
            message: format!("output is not valid UTF-8: {err}"),
        }
    })?;
    decode(text, cast)
}

pub fn decode_with(raw: &str, options: &DecodeOptions) -> Result<ResultSet> {
    let mut lines = trim_blank_lines(raw)
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line));

    let header = match lines.next() {
        Some(header) if !header.trim().is_empty() => header,
        _ => return Ok(ResultSet::default()),
    };
    let columns: Vec<String> = header.split('\t').map(str::to_owned).collect();

    let mut records = Vec::new();
    for (index, line) in lines.enumerate() {
        let fields: Vec<&str> = line.split('\t').collect();
        if options.strict && fields.len() != columns.len() {
            return Err(CommandoError::MalformedTabularOutput {
                line: index + 2,
                message: format!(
                    "expected {} fields, found {}",
                    columns.len(),
                    fields.len()
                ),
            });
        }

        let mut record = Record::default();
        for (column, field) in columns.iter().zip(fields) {
            let value = if options.cast {
                cast(field)
            } else {
                Value::text(field)
            };
            record.insert(column, value);
        }
        records.push(record);
    }

    Ok(ResultSet::new(columns, records))
}

/// Converts a single field with the cast rules, falling back to text.
pub fn cast(field: &str) -> Value {
    CAST_RULES
        .iter()
        .find(|rule| rule.pattern.is_match(field))
        .and_then(|rule| (rule.convert)(field))
        .unwrap_or_else(|| Value::text(field))
}

// Byte offset of the first line holding a non-whitespace character.
fn content_start(raw: &str) -> Option<usize> {
    raw.char_indices()
        .scan(0usize, |line_start, (index, ch)| {
            let current = *line_start;
            if ch == '\n' {
                *line_start = index + 1;
            }
            Some((current, ch))
        })
        .find(|(_, ch)| !ch.is_whitespace())
        .map(|(line_start, _)| line_start)
}

// Drops whole blank lines at both ends; spaces and tabs inside the first
// and last lines are data.
fn trim_blank_lines(raw: &str) -> &str {
    let Some(start) = content_start(raw) else {
        return "";
    };

    let body = &raw[start..];
    let end = body
        .rfind(|ch: char| !ch.is_whitespace())
        .map(|index| {
            body[index..]
                .find('\n')
                .map_or(body.len(), |newline| index + newline)
        })
        .unwrap_or(0);
    &body[..end]
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::{decode, decode_bytes, decode_with, CommandoError, DecodeOptions, Value};

    use super::{cast, trim_blank_lines};

    fn timestamp(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> Value {
        let at = NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, mi, s))
            .expect("valid timestamp");
        Value::timestamp(at)
    }

    const TYPED_OUTPUT: &str =
        "i\tf\td\ts\n123\t1.23\t2014-03-29 11:18:00\ttest\n-456\t-1.2e-34\t2014-03-29 00:00:00\t 123";

    #[test]
    fn cast_rules_in_order() {
        assert_eq!(cast("1"), Value::integer(1));
        assert_eq!(cast("-0"), Value::integer(0));
        assert_eq!(cast("1.23"), Value::float(1.23));
        assert_eq!(cast("1.23e-45"), Value::float(1.23e-45));
        assert_eq!(cast("1E+5"), Value::float(1e5));
        assert_eq!(cast(".5"), Value::float(0.5));
        assert_eq!(cast("2."), Value::float(2.0));
        assert_eq!(cast("2014-03-29 11:18:00"), timestamp(2014, 3, 29, 11, 18, 0));
        assert_eq!(cast("NULL"), Value::Null);
        assert_eq!(cast("test"), Value::text("test"));
    }

    #[test]
    fn cast_keeps_ambiguous_fields_as_text() {
        for field in ["", "-", ".", "-.", "e5", " 123", "123 ", "1,5", "null", "0x1F"] {
            assert_eq!(cast(field), Value::text(field), "{field:?}");
        }
    }

    #[test]
    fn cast_keeps_unrepresentable_values_as_text() {
        assert_eq!(
            cast("18446744073709551615"),
            Value::text("18446744073709551615")
        );
        assert_eq!(cast("1e999"), Value::text("1e999"));
        assert_eq!(
            cast("0000-00-00 00:00:00"),
            Value::text("0000-00-00 00:00:00")
        );
        assert_eq!(cast("2014-03-29"), Value::text("2014-03-29"));
    }

    #[test]
    fn integer_round_trip() {
        for n in [0i64, 1, -1, 42, i64::MIN, i64::MAX] {
            let set = decode(&format!("n\n{n}\n"), true).expect("must decode");
            assert_eq!(set.len(), 1);
            assert_eq!(set.records()[0].get_i64("n"), Some(n));
        }
    }

    #[test]
    fn typed_rows_with_cast() {
        let set = decode(TYPED_OUTPUT, true).expect("must decode");
        assert_eq!(set.columns(), ["i", "f", "d", "s"]);
        assert_eq!(set.len(), 2);

        let first = &set.records()[0];
        assert_eq!(first.get("i"), Some(&Value::integer(123)));
        assert_eq!(first.get("f"), Some(&Value::float(1.23)));
        assert_eq!(first.get("d"), Some(&timestamp(2014, 3, 29, 11, 18, 0)));
        assert_eq!(first.get("s"), Some(&Value::text("test")));

        let second = &set.records()[1];
        assert_eq!(second.get("i"), Some(&Value::integer(-456)));
        assert_eq!(second.get("f"), Some(&Value::float(-1.2e-34)));
        assert_eq!(second.get("d"), Some(&timestamp(2014, 3, 29, 0, 0, 0)));
        assert_eq!(second.get("s"), Some(&Value::text(" 123")));
    }

    #[test]
    fn typed_rows_without_cast() {
        let set = decode(TYPED_OUTPUT, false).expect("must decode");
        let second = &set.records()[1];
        assert_eq!(second.get_text("i"), Some("-456"));
        assert_eq!(second.get_text("f"), Some("-1.2e-34"));
        assert_eq!(second.get_text("d"), Some("2014-03-29 00:00:00"));
        assert_eq!(second.get_text("s"), Some(" 123"));
    }

    #[test]
    fn null_marker_depends_on_cast() {
        let raw = "a\tb\nNULL\t\n";
        let typed = decode(raw, true).expect("must decode");
        assert!(typed.records()[0].is_null("a"));
        assert_eq!(typed.records()[0].get_text("b"), Some(""));

        let plain = decode(raw, false).expect("must decode");
        assert_eq!(plain.records()[0].get_text("a"), Some("NULL"));
        assert_eq!(plain.records()[0].get_text("b"), Some(""));
    }

    #[test]
    fn blank_output_is_empty() {
        for raw in ["", " ", "\n", "\n\n \t\n", "\r\n"] {
            let set = decode(raw, true).expect("must decode");
            assert!(set.is_empty(), "{raw:?}");
            assert!(set.columns().is_empty());
        }
    }

    #[test]
    fn header_only_is_empty() {
        let set = decode("\nDatabase\n\n", true).expect("must decode");
        assert!(set.is_empty());
        assert_eq!(set.columns(), ["Database"]);
    }

    #[test]
    fn crlf_line_endings() {
        let set = decode("id\tname\r\n1\tKit\r\n", true).expect("must decode");
        assert_eq!(set.records()[0].get_text("name"), Some("Kit"));
        assert_eq!(set.records()[0].get_i64("id"), Some(1));
    }

    #[test]
    fn trailing_empty_field_survives_trim() {
        let set = decode("a\tb\n1\t\n", false).expect("must decode");
        assert_eq!(set.records()[0].get_text("b"), Some(""));
    }

    #[test]
    fn short_and_long_rows_are_lenient() {
        let set = decode("a\tb\tc\n1\n1\t2\t3\t4", true).expect("must decode");
        let short = &set.records()[0];
        assert_eq!(short.len(), 1);
        assert!(!short.contains("b"));

        let long = &set.records()[1];
        assert_eq!(long.len(), 3);
        assert_eq!(long.get_i64("c"), Some(3));
    }

    #[test]
    fn strict_mode_rejects_ragged_rows() {
        let options = DecodeOptions {
            cast: true,
            strict: true,
        };
        let err = decode_with("a\tb\n1\t2\n3", &options).expect_err("must fail");
        match err {
            CommandoError::MalformedTabularOutput { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
        assert!(decode_with("a\tb\n1\t2\n", &options).is_ok());
    }

    #[test]
    fn duplicate_headers_overwrite() {
        let set = decode("id\tid\n1\t2", true).expect("must decode");
        assert_eq!(set.columns().len(), 2);
        let record = &set.records()[0];
        assert_eq!(record.len(), 1);
        assert_eq!(record.get_i64("id"), Some(2));
    }

    #[test]
    fn bytes_must_be_utf8() {
        let set = decode_bytes("name\nR\u{e9}glisse\n".as_bytes(), true).expect("must decode");
        assert_eq!(set.records()[0].get_text("name"), Some("Réglisse"));

        let err = decode_bytes(b"name\nR\xe9glisse\n", true).expect_err("must fail");
        match err {
            CommandoError::MalformedTabularOutput { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn utf8_error_line_ignores_leading_blank_lines() {
        let err = decode_bytes(b"\n\n \nname\nR\xe9glisse\n", true).expect_err("must fail");
        match err {
            CommandoError::MalformedTabularOutput { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }

        let options = DecodeOptions {
            cast: true,
            strict: true,
        };
        let err = decode_with("\n\n \na\tb\n1", &options).expect_err("must fail");
        match err {
            CommandoError::MalformedTabularOutput { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_interior_line_is_a_record() {
        let set = decode("a\tb\n1\t2\n\n3\t4", true).expect("must decode");
        assert_eq!(set.len(), 3);
        let blank = &set.records()[1];
        assert_eq!(blank.len(), 1);
        assert_eq!(blank.get_text("a"), Some(""));
        assert!(!blank.contains("b"));

        let single = decode("a\n1\n\n2", true).expect("must decode");
        assert_eq!(single.records()[1].get_text("a"), Some(""));
    }

    #[test]
    fn strict_mode_rejects_blank_interior_line() {
        let options = DecodeOptions {
            cast: true,
            strict: true,
        };
        let err = decode_with("a\tb\n1\t2\n\n3\t4", &options).expect_err("must fail");
        match err {
            CommandoError::MalformedTabularOutput { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
        assert!(decode_with("a\n1\n\n2", &options).is_ok());
    }

    #[test]
    fn trim_only_removes_blank_lines() {
        assert_eq!(trim_blank_lines("\n\n a\tb\t\n\n"), " a\tb\t");
        assert_eq!(trim_blank_lines("a\n\nb"), "a\n\nb");
        assert_eq!(trim_blank_lines(" \n\t"), "");
    }
}
