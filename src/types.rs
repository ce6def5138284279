use chrono::NaiveDateTime;

use crate::{CommandoError, Result, Value};

/// Column holding the identifier appended by
/// [`MysqlCommando::last_insert_id`](crate::MysqlCommando::last_insert_id).
pub(crate) const LAST_INSERT_ID_COLUMN: &str = "last_insert_id";

/// One decoded output row, keyed by column name in header order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Sets `name` to `value`; an existing column keeps its position.
    pub(crate) fn insert(&mut self, name: &str, value: Value) {
        match self.fields.iter_mut().find(|(column, _)| column == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name.to_owned(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name)?.as_i64()
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_f64()
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name)?.as_str()
    }

    pub fn get_timestamp(&self, name: &str) -> Option<NaiveDateTime> {
        self.get(name)?.as_timestamp()
    }

    /// `true` only when the column exists and holds SQL NULL.
    pub fn is_null(&self, name: &str) -> bool {
        self.get(name).is_some_and(Value::is_null)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(column, _)| column.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .map(|(column, value)| (column.as_str(), value))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut record = Record::default();
        for (name, value) in iter {
            record.insert(&name.into(), value);
        }
        record
    }
}

/// Rows decoded from one client invocation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultSet {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl ResultSet {
    pub(crate) fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    /// Header names as printed by the client, duplicates included.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Reads the auto-increment identifier from the trailing record.
    ///
    /// The value is taken from its `last_insert_id` column, or from its
    /// only column, and may be an integer or integer text. Errors report
    /// the line of that record, or the header line when there is none.
    pub fn last_insert_id(&self) -> Result<i64> {
        // Every line after the header decodes to exactly one record.
        let line = self.records.len() + 1;
        let record = self
            .records
            .last()
            .ok_or_else(|| malformed(line, "no row holds a last insert id"))?;
        let value = record
            .get(LAST_INSERT_ID_COLUMN)
            .or_else(|| match record.len() {
                1 => record.iter().next().map(|(_, value)| value),
                _ => None,
            })
            .ok_or_else(|| malformed(line, "missing last_insert_id column"))?;

        match value {
            Value::Integer(id) => Ok(*id),
            Value::Text(text) => text.trim().parse::<i64>().map_err(|err| {
                malformed(line, &format!("invalid last insert id '{text}': {err}"))
            }),
            other => Err(malformed(
                line,
                &format!("last insert id is {}", other.kind()),
            )),
        }
    }
}

impl IntoIterator for ResultSet {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn malformed(line: usize, message: &str) -> CommandoError {
    CommandoError::MalformedTabularOutput {
        line,
        message: message.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use crate::{CommandoError, Record, ResultSet, Value};

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn duplicate_column_overwrites_in_place() {
        let record = record(&[
            ("a", Value::integer(1)),
            ("b", Value::integer(2)),
            ("a", Value::integer(3)),
        ]);
        assert_eq!(record.len(), 2);
        assert_eq!(record.columns().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(record.get_i64("a"), Some(3));
    }

    #[test]
    fn typed_getters() {
        let record = record(&[
            ("id", Value::integer(1)),
            ("name", Value::text("Kit")),
            ("gone", Value::Null),
        ]);
        assert_eq!(record.get_i64("id"), Some(1));
        assert_eq!(record.get_text("name"), Some("Kit"));
        assert_eq!(record.get_text("id"), None);
        assert!(record.is_null("gone"));
        assert!(!record.is_null("missing"));
        assert!(!record.contains("missing"));
    }

    #[test]
    fn last_insert_id_from_named_column() {
        let set = ResultSet::new(
            vec!["last_insert_id".to_owned()],
            vec![record(&[("last_insert_id", Value::integer(42))])],
        );
        assert_eq!(set.last_insert_id().expect("must read id"), 42);
    }

    #[test]
    fn last_insert_id_from_single_text_column() {
        let set = ResultSet::new(
            vec!["id".to_owned()],
            vec![record(&[("id", Value::text("7"))])],
        );
        assert_eq!(set.last_insert_id().expect("must read id"), 7);
    }

    #[test]
    fn last_insert_id_requires_a_row() {
        let err = ResultSet::default().last_insert_id().expect_err("must fail");
        assert!(matches!(err, CommandoError::MalformedTabularOutput { .. }));

        let set = ResultSet::new(
            vec!["a".to_owned(), "b".to_owned()],
            vec![record(&[("a", Value::integer(1)), ("b", Value::integer(2))])],
        );
        let err = set.last_insert_id().expect_err("must fail");
        assert!(matches!(err, CommandoError::MalformedTabularOutput { .. }));
    }

    #[test]
    fn last_insert_id_error_points_at_last_row() {
        let set = crate::decode("id\tname\n1\tKit\n2\tRex", true).expect("must decode");
        match set.last_insert_id().expect_err("must fail") {
            CommandoError::MalformedTabularOutput { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }

        let set = crate::decode("last_insert_id\nabc", true).expect("must decode");
        match set.last_insert_id().expect_err("must fail") {
            CommandoError::MalformedTabularOutput { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }

        let header_only = crate::decode("last_insert_id\n", true).expect("must decode");
        match header_only.last_insert_id().expect_err("must fail") {
            CommandoError::MalformedTabularOutput { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {other}"),
        }
    }
}
