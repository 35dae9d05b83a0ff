use crate::DatabaseAdapterError;

/// One result row in text form, as the simple query protocol returns it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlRow {
    values: Vec<Option<String>>,
}

impl SqlRow {
    pub fn new(values: Vec<Option<String>>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Text of column `idx`; `None` for SQL NULL or an out of range index.
    pub fn get(&self, idx: usize) -> Option<&str> {
        self.values.get(idx).and_then(|v| v.as_deref())
    }

    pub fn get_i64(&self, idx: usize) -> Result<Option<i64>, DatabaseAdapterError> {
        if idx >= self.values.len() {
            return Err(DatabaseAdapterError::unexpected(format!(
                "column {} requested from a row of {} columns",
                idx,
                self.values.len()
            )));
        }
        self.get(idx)
            .map(|raw| {
                raw.trim().parse::<i64>().map_err(|e| {
                    DatabaseAdapterError::unexpected(format!(
                        "column {} value '{}' is not an integer: {e}",
                        idx, raw
                    ))
                })
            })
            .transpose()
    }
}

impl<S: Into<String>> FromIterator<Option<S>> for SqlRow {
    fn from_iter<I: IntoIterator<Item = Option<S>>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|v| v.map(Into::into)).collect())
    }
}
