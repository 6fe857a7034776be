use std::fmt;

use thiserror::Error;

use crate::value::ValueError;

/// Dotted location of a field inside a document, e.g. `Service.Endpoints[1].Route`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn root(type_name: &str) -> Self {
        Self(vec![type_name.to_string()])
    }

    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        Self(segments)
    }

    pub fn element(&self, name: &str, index: usize) -> Self {
        self.child(&format!("{name}[{index}]"))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    fn prepend(&mut self, segment: String) {
        self.0.insert(0, segment);
    }
}

impl From<&str> for FieldPath {
    fn from(segment: &str) -> Self {
        Self(vec![segment.to_string()])
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<document>");
        }
        f.write_str(&self.0.join("."))
    }
}

fn at_line(line: &Option<usize>) -> String {
    match line {
        Some(line) => format!(" at line {line}"),
        None => String::new(),
    }
}

/// Errors raised by the Markdown codec.
///
/// Every parse-time variant carries the 1-based line of the offending block
/// (for end-of-input errors, one past the last line) and the construct the
/// parser expected there.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("invalid value for `{path}`{}: {source}", at_line(.line))]
    Format {
        path: FieldPath,
        line: Option<usize>,
        source: ValueError,
    },

    #[error("line {line}: missing required field `{path}`, expected {expected}")]
    MissingField {
        path: FieldPath,
        line: usize,
        expected: String,
    },

    #[error("line {line} in `{path}`: expected {expected}, found {found:?}")]
    Grammar {
        path: FieldPath,
        line: usize,
        expected: String,
        found: String,
    },

    #[error(
        "line {line} in `{path}`: header {header:?} matches several fields: {}",
        .candidates.join(", ")
    )]
    AmbiguousField {
        path: FieldPath,
        line: usize,
        header: String,
        candidates: Vec<String>,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl CodecError {
    /// Prefixes the error's field path with the given segment.
    ///
    /// Used while unwinding out of nested records so that errors raised deep
    /// inside a document report their full path.
    pub fn within(mut self, segment: impl Into<String>) -> Self {
        match &mut self {
            CodecError::Format { path, .. }
            | CodecError::MissingField { path, .. }
            | CodecError::Grammar { path, .. }
            | CodecError::AmbiguousField { path, .. } => path.prepend(segment.into()),
            CodecError::Schema(_) => {}
        }
        self
    }

    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            CodecError::Format { path, .. }
            | CodecError::MissingField { path, .. }
            | CodecError::Grammar { path, .. }
            | CodecError::AmbiguousField { path, .. } => Some(path),
            CodecError::Schema(_) => None,
        }
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            CodecError::Format { line, .. } => *line,
            CodecError::MissingField { line, .. }
            | CodecError::Grammar { line, .. }
            | CodecError::AmbiguousField { line, .. } => Some(*line),
            CodecError::Schema(_) => None,
        }
    }
}

/// Configuration errors in a type's schema, detected before any document is
/// read or written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("`{type_name}` declares more than one header field: {}", .fields.join(", "))]
    MultipleHeaderFields {
        type_name: &'static str,
        fields: Vec<&'static str>,
    },

    #[error("header field `{type_name}.{field}` must be a scalar")]
    HeaderNotScalar {
        type_name: &'static str,
        field: &'static str,
    },

    #[error("`{type_name}` declares field `{field}` more than once")]
    DuplicateField {
        type_name: &'static str,
        field: &'static str,
    },

    #[error("field `{type_name}.{field}` has no element schema")]
    MissingElementSchema {
        type_name: &'static str,
        field: &'static str,
    },

    #[error("recursive schema: {}", .cycle.join(" -> "))]
    Recursive { cycle: Vec<&'static str> },

    #[error(
        "`{type_name}` has collections `{first}` and `{second}` whose element headers cannot be told apart"
    )]
    IndistinctCollections {
        type_name: &'static str,
        first: &'static str,
        second: &'static str,
    },

    #[error(
        "`{type_name}` fields `{first}` and `{second}` are both introduced by `{header}` sections"
    )]
    SharedSectionHeader {
        type_name: &'static str,
        header: &'static str,
        first: &'static str,
        second: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, CodecError>;
