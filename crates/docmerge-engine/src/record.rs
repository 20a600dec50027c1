use crate::error::MergeError;

/// One row of input data: an ordered field name → display string mapping.
///
/// Values are expected to be display-ready; the engine never formats
/// them. Field names are unique within a record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from `(field, value)` pairs, rejecting duplicate names.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, MergeError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (key, value) in pairs {
            record.push(key, value)?;
        }
        Ok(record)
    }

    /// Appends a field. Fails if the name is already present.
    pub fn push(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), MergeError> {
        let key = key.into();
        if self.get(&key).is_some() {
            return Err(MergeError::DuplicateField(key));
        }
        self.fields.push((key, value.into()));
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Restricts the record to `columns`, in the order given.
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Result<Record, MergeError> {
        let mut selected = Record::new();
        for column in columns {
            let column = column.as_ref();
            let value = self
                .get(column)
                .ok_or_else(|| MergeError::UnknownColumn(column.to_string()))?;
            selected.push(column, value)?;
        }
        Ok(selected)
    }
}
