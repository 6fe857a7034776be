//! Untyped bridge between a typed instance and its document.
//!
//! A [`Record`] holds one entry per field with scalars already in their
//! canonical text form. Derived `to_record` implementations fill it through
//! the `push_*` methods; derived `from_record` implementations drain it
//! through the typed accessors, which attach field paths and source lines to
//! any error.

use crate::error::{CodecError, FieldPath, Result};
use crate::schema::MarkdownSchema;
use crate::value::ScalarValue;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Option<String>),
    Object(Option<Record>),
    ScalarList(Vec<String>),
    ObjectList(Vec<Record>),
}

impl FieldValue {
    fn shape(&self) -> &'static str {
        match self {
            FieldValue::Scalar(_) => "a scalar",
            FieldValue::Object(_) => "an object",
            FieldValue::ScalarList(_) => "a list of values",
            FieldValue::ObjectList(_) => "a list of objects",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    name: &'static str,
    value: FieldValue,
    line: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<Entry>,
    line: Option<usize>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// A record read from the section whose header is on `line`.
    pub fn at_line(line: usize) -> Self {
        Self {
            entries: Vec::new(),
            line: Some(line),
        }
    }

    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub fn insert(&mut self, name: &'static str, value: FieldValue, line: Option<usize>) {
        self.entries.retain(|entry| entry.name != name);
        self.entries.push(Entry { name, value, line });
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn scalar_text(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            FieldValue::Scalar(text) => text.as_deref(),
            _ => None,
        }
    }

    pub fn push_scalar<S: ScalarValue>(&mut self, name: &'static str, value: &S) -> Result<()> {
        let text = value.to_text().map_err(|source| CodecError::Format {
            path: FieldPath::from(name),
            line: None,
            source,
        })?;
        self.insert(name, FieldValue::Scalar(Some(text)), None);
        Ok(())
    }

    pub fn push_optional_scalar<S: ScalarValue>(
        &mut self,
        name: &'static str,
        value: Option<&S>,
    ) -> Result<()> {
        match value {
            Some(value) => self.push_scalar(name, value),
            None => {
                self.insert(name, FieldValue::Scalar(None), None);
                Ok(())
            }
        }
    }

    pub fn push_object<T: MarkdownSchema>(&mut self, name: &'static str, value: &T) -> Result<()> {
        let record = value.to_record().map_err(|err| err.within(name))?;
        self.insert(name, FieldValue::Object(Some(record)), None);
        Ok(())
    }

    pub fn push_optional_object<T: MarkdownSchema>(
        &mut self,
        name: &'static str,
        value: Option<&T>,
    ) -> Result<()> {
        match value {
            Some(value) => self.push_object(name, value),
            None => {
                self.insert(name, FieldValue::Object(None), None);
                Ok(())
            }
        }
    }

    pub fn push_scalar_list<S: ScalarValue>(
        &mut self,
        name: &'static str,
        values: &[S],
    ) -> Result<()> {
        let texts = values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                value.to_text().map_err(|source| CodecError::Format {
                    path: FieldPath::from(format!("{name}[{index}]").as_str()),
                    line: None,
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.insert(name, FieldValue::ScalarList(texts), None);
        Ok(())
    }

    pub fn push_object_list<T: MarkdownSchema>(
        &mut self,
        name: &'static str,
        values: &[T],
    ) -> Result<()> {
        let records = values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                value
                    .to_record()
                    .map_err(|err| err.within(format!("{name}[{index}]")))
            })
            .collect::<Result<Vec<_>>>()?;
        self.insert(name, FieldValue::ObjectList(records), None);
        Ok(())
    }

    pub fn scalar<S: ScalarValue>(&mut self, name: &'static str) -> Result<S> {
        match self.optional_scalar(name)? {
            Some(value) => Ok(value),
            None => Err(self.missing(name, format!("`- {name}: <value>`"))),
        }
    }

    pub fn optional_scalar<S: ScalarValue>(&mut self, name: &'static str) -> Result<Option<S>> {
        let Some((value, line)) = self.take(name) else {
            return Ok(None);
        };
        match value {
            FieldValue::Scalar(None) => Ok(None),
            FieldValue::Scalar(Some(text)) => {
                S::from_text(&text)
                    .map(Some)
                    .map_err(|source| CodecError::Format {
                        path: FieldPath::from(name),
                        line,
                        source,
                    })
            }
            other => Err(self.mismatch(name, "a scalar", &other)),
        }
    }

    pub fn object<T: MarkdownSchema>(&mut self, name: &'static str) -> Result<T> {
        match self.optional_object(name)? {
            Some(value) => Ok(value),
            None => Err(self.missing(name, format!("a `{name}` section"))),
        }
    }

    pub fn optional_object<T: MarkdownSchema>(&mut self, name: &'static str) -> Result<Option<T>> {
        let Some((value, _)) = self.take(name) else {
            return Ok(None);
        };
        match value {
            FieldValue::Object(None) => Ok(None),
            FieldValue::Object(Some(record)) => T::from_record(record)
                .map(Some)
                .map_err(|err| err.within(name)),
            other => Err(self.mismatch(name, "an object", &other)),
        }
    }

    pub fn scalar_list<S: ScalarValue>(&mut self, name: &'static str) -> Result<Vec<S>> {
        let Some((value, line)) = self.take(name) else {
            return Err(self.missing(name, format!("a `{name}` section")));
        };
        match value {
            FieldValue::ScalarList(texts) => texts
                .iter()
                .enumerate()
                .map(|(index, text)| {
                    S::from_text(text).map_err(|source| CodecError::Format {
                        path: FieldPath::from(format!("{name}[{index}]").as_str()),
                        line: line.map(|line| line + index + 1),
                        source,
                    })
                })
                .collect(),
            other => Err(self.mismatch(name, "a list of values", &other)),
        }
    }

    /// Object arrays have no section of their own, so a missing entry is an
    /// empty list.
    pub fn object_list<T: MarkdownSchema>(&mut self, name: &'static str) -> Result<Vec<T>> {
        let Some((value, _)) = self.take(name) else {
            return Ok(Vec::new());
        };
        match value {
            FieldValue::ObjectList(records) => records
                .into_iter()
                .enumerate()
                .map(|(index, record)| {
                    T::from_record(record).map_err(|err| err.within(format!("{name}[{index}]")))
                })
                .collect(),
            other => Err(self.mismatch(name, "a list of objects", &other)),
        }
    }

    fn take(&mut self, name: &str) -> Option<(FieldValue, Option<usize>)> {
        let position = self.entries.iter().position(|entry| entry.name == name)?;
        let entry = self.entries.remove(position);
        Some((entry.value, entry.line))
    }

    fn missing(&self, name: &str, expected: String) -> CodecError {
        CodecError::MissingField {
            path: FieldPath::from(name),
            line: self.line.unwrap_or(0),
            expected,
        }
    }

    fn mismatch(&self, name: &str, expected: &str, found: &FieldValue) -> CodecError {
        CodecError::Grammar {
            path: FieldPath::from(name),
            line: self.line.unwrap_or(0),
            expected: expected.to_string(),
            found: found.shape().to_string(),
        }
    }
}
