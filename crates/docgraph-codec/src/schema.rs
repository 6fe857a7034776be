//! Per-type metadata driving both directions of the codec.
//!
//! A [`SchemaDescriptor`] is generated by `#[derive(MarkdownSchema)]`, built
//! once per type behind a `OnceLock` and never mutated afterwards. Nested
//! types are referenced through function pointers so that building one
//! descriptor never forces another, which keeps self-referencing types from
//! recursing at construction time; [`SchemaDescriptor::validate`] then walks
//! the graph with a visited set and rejects cycles.

use std::sync::OnceLock;

use crate::error::{Result, SchemaError};
use crate::record::Record;

pub type DescriptorFn = fn() -> &'static SchemaDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    NestedObject,
    ScalarArray,
    ObjectArray,
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub ignored: bool,
    pub is_header_source: bool,
    schema: Option<DescriptorFn>,
}

impl FieldDescriptor {
    const fn with_kind(name: &'static str, kind: FieldKind, schema: Option<DescriptorFn>) -> Self {
        Self {
            name,
            kind,
            required: true,
            ignored: false,
            is_header_source: false,
            schema,
        }
    }

    pub const fn scalar(name: &'static str) -> Self {
        Self::with_kind(name, FieldKind::Scalar, None)
    }

    pub const fn nested(name: &'static str, schema: DescriptorFn) -> Self {
        Self::with_kind(name, FieldKind::NestedObject, Some(schema))
    }

    pub const fn scalar_array(name: &'static str) -> Self {
        Self::with_kind(name, FieldKind::ScalarArray, None)
    }

    pub const fn object_array(name: &'static str, element: DescriptorFn) -> Self {
        Self::with_kind(name, FieldKind::ObjectArray, Some(element))
    }

    /// A field excluded from both directions. Its kind is irrelevant.
    pub const fn ignored(name: &'static str) -> Self {
        let mut field = Self::with_kind(name, FieldKind::Scalar, None);
        field.required = false;
        field.ignored = true;
        field
    }

    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub const fn header(mut self) -> Self {
        self.is_header_source = true;
        self
    }

    /// Descriptor of the nested object or of the array's element type.
    pub fn schema(&self) -> Option<&'static SchemaDescriptor> {
        self.schema.map(|schema| schema())
    }

    /// Whether a complete document may leave this field's section out.
    pub fn may_be_absent(&self) -> bool {
        match self.kind {
            FieldKind::NestedObject => !self.required,
            FieldKind::ObjectArray => true,
            FieldKind::Scalar | FieldKind::ScalarArray => false,
        }
    }

    /// Name of the element's header field, for object arrays whose elements
    /// are headed by that field's value.
    pub fn element_header_field(&self) -> Option<&'static str> {
        if self.kind != FieldKind::ObjectArray {
            return None;
        }
        self.schema()?.header_field().map(|field| field.name)
    }

    /// The header text that must introduce this field's section, when it is
    /// fixed by the schema alone.
    pub fn expected_header(&self) -> Option<&'static str> {
        match self.kind {
            FieldKind::Scalar => None,
            FieldKind::NestedObject | FieldKind::ScalarArray => Some(self.name),
            FieldKind::ObjectArray => match self.schema()?.element_pattern() {
                ElementPattern::Exact(text) => Some(text),
                ElementPattern::AnyHeaderValue => None,
            },
        }
    }
}

/// A type that can be written to and read from a Markdown document.
///
/// Implemented by `#[derive(MarkdownSchema)]`; hand-written implementations
/// must keep `descriptor` consistent with the entries `to_record` produces.
pub trait MarkdownSchema: Sized {
    fn descriptor() -> &'static SchemaDescriptor;

    fn to_record(&self) -> Result<Record>;

    fn from_record(record: Record) -> Result<Self>;
}

impl<T: MarkdownSchema> MarkdownSchema for Box<T> {
    fn descriptor() -> &'static SchemaDescriptor {
        T::descriptor()
    }

    fn to_record(&self) -> Result<Record> {
        (**self).to_record()
    }

    fn from_record(record: Record) -> Result<Self> {
        T::from_record(record).map(Box::new)
    }
}

/// How the sections of an object-array element are recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementPattern {
    /// Elements carry the type's title (or type name) as header.
    Exact(&'static str),
    /// Elements carry the value of their header field, which can be anything.
    AnyHeaderValue,
}

#[derive(Debug)]
pub struct SchemaDescriptor {
    type_name: &'static str,
    display_title: Option<&'static str>,
    fields: Vec<FieldDescriptor>,
    validation: OnceLock<std::result::Result<(), SchemaError>>,
}

impl SchemaDescriptor {
    pub fn new(type_name: &'static str, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            type_name,
            display_title: None,
            fields,
            validation: OnceLock::new(),
        }
    }

    pub fn with_title(mut self, title: &'static str) -> Self {
        self.display_title = Some(title);
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn display_title(&self) -> Option<&'static str> {
        self.display_title
    }

    /// All declared fields, ignored ones included, in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn active_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|field| !field.ignored)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.active_fields().find(|field| field.name == name)
    }

    pub fn scalar_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.active_fields().filter(|field| field.kind == FieldKind::Scalar)
    }

    pub fn header_field(&self) -> Option<&FieldDescriptor> {
        self.active_fields().find(|field| field.is_header_source)
    }

    /// Header of a document whose root is this type.
    pub fn root_header(&self) -> &'static str {
        self.display_title.unwrap_or(self.type_name)
    }

    /// Header of one element of an object array, given the element's record.
    pub fn element_header(&self, record: &Record) -> String {
        self.header_field()
            .and_then(|field| record.scalar_text(field.name))
            .map(str::to_string)
            .unwrap_or_else(|| self.root_header().to_string())
    }

    pub fn element_pattern(&self) -> ElementPattern {
        match self.header_field() {
            Some(_) => ElementPattern::AnyHeaderValue,
            None => ElementPattern::Exact(self.root_header()),
        }
    }

    /// Non-scalar fields in the order their sections appear in a document:
    /// nested objects, then scalar arrays, then object arrays, each group in
    /// declaration order.
    pub fn section_order(&self) -> Vec<&FieldDescriptor> {
        [
            FieldKind::NestedObject,
            FieldKind::ScalarArray,
            FieldKind::ObjectArray,
        ]
        .into_iter()
        .flat_map(|kind| self.active_fields().filter(move |field| field.kind == kind))
        .collect()
    }

    /// Checks this schema and everything reachable from it. The outcome is
    /// computed once and cached for the lifetime of the descriptor.
    pub fn validate(&'static self) -> Result<()> {
        self.validation
            .get_or_init(|| {
                let outcome = SchemaWalk::default().visit(self);
                if let Err(err) = &outcome {
                    log::warn!("schema `{}` rejected: {err}", self.type_name);
                }
                outcome
            })
            .clone()
            .map_err(Into::into)
    }

    fn check_local(&self) -> std::result::Result<(), SchemaError> {
        let headers: Vec<_> = self
            .active_fields()
            .filter(|field| field.is_header_source)
            .collect();
        if headers.len() > 1 {
            return Err(SchemaError::MultipleHeaderFields {
                type_name: self.type_name,
                fields: headers.iter().map(|field| field.name).collect(),
            });
        }
        if let Some(header) = headers.first()
            && header.kind != FieldKind::Scalar
        {
            return Err(SchemaError::HeaderNotScalar {
                type_name: self.type_name,
                field: header.name,
            });
        }

        let active: Vec<_> = self.active_fields().collect();
        for (index, field) in active.iter().enumerate() {
            if active[..index].iter().any(|earlier| earlier.name == field.name) {
                return Err(SchemaError::DuplicateField {
                    type_name: self.type_name,
                    field: field.name,
                });
            }
            let needs_schema = matches!(
                field.kind,
                FieldKind::NestedObject | FieldKind::ObjectArray
            );
            if needs_schema && field.schema.is_none() {
                return Err(SchemaError::MissingElementSchema {
                    type_name: self.type_name,
                    field: field.name,
                });
            }
        }

        let collections: Vec<_> = active
            .iter()
            .filter(|field| field.kind == FieldKind::ObjectArray)
            .filter_map(|field| Some((field.name, field.schema()?.element_pattern())))
            .collect();
        for (index, (second, pattern)) in collections.iter().enumerate() {
            if let Some((first, _)) = collections[..index]
                .iter()
                .find(|(_, earlier)| earlier == pattern)
            {
                return Err(SchemaError::IndistinctCollections {
                    type_name: self.type_name,
                    first: *first,
                    second: *second,
                });
            }
        }

        let fixed: Vec<_> = active
            .iter()
            .filter_map(|field| Some((field.name, field.expected_header()?)))
            .collect();
        for (index, (second, header)) in fixed.iter().enumerate() {
            if let Some((first, _)) = fixed[..index]
                .iter()
                .find(|(_, earlier)| earlier == header)
            {
                return Err(SchemaError::SharedSectionHeader {
                    type_name: self.type_name,
                    header: *header,
                    first: *first,
                    second: *second,
                });
            }
        }
        Ok(())
    }
}

/// Positions in `order`, at or after `cursor`, of the fields that could own a
/// child section headed `header`. `has_bullet(key, value)` tells whether the
/// section carries the bullet `- key: value`.
///
/// A field whose fixed header matches is a candidate. The object array with
/// header-field elements is one too when nothing matches exactly, or when the
/// exact match may be absent and the section also reads as one of its
/// elements. Both directions of the codec use this rule, so a document is
/// only written when it reads back into the same fields.
pub(crate) fn section_candidates(
    order: &[&FieldDescriptor],
    cursor: usize,
    header: &str,
    has_bullet: impl Fn(&str, &str) -> bool,
) -> Vec<usize> {
    let mut candidates: Vec<usize> = (cursor..order.len())
        .filter(|&index| order[index].expected_header() == Some(header))
        .collect();
    let Some(dynamic) =
        (cursor..order.len()).find(|&index| order[index].element_header_field().is_some())
    else {
        return candidates;
    };

    let reads_as_element = order[dynamic]
        .element_header_field()
        .is_some_and(|name| has_bullet(name, header));
    let also_dynamic = match candidates.as_slice() {
        [] => true,
        [exact] => order[*exact].may_be_absent() && reads_as_element,
        _ => false,
    };
    if also_dynamic {
        candidates.push(dynamic);
    }
    candidates
}

/// Depth-first walk over the schema graph.
#[derive(Default)]
struct SchemaWalk {
    stack: Vec<&'static SchemaDescriptor>,
    done: Vec<&'static SchemaDescriptor>,
}

impl SchemaWalk {
    fn visit(
        &mut self,
        descriptor: &'static SchemaDescriptor,
    ) -> std::result::Result<(), SchemaError> {
        if self.done.iter().any(|seen| std::ptr::eq(*seen, descriptor)) {
            return Ok(());
        }
        if let Some(position) = self
            .stack
            .iter()
            .position(|open| std::ptr::eq(*open, descriptor))
        {
            let mut cycle: Vec<_> = self.stack[position..]
                .iter()
                .map(|open| open.type_name)
                .collect();
            cycle.push(descriptor.type_name);
            return Err(SchemaError::Recursive { cycle });
        }

        descriptor.check_local()?;
        self.stack.push(descriptor);
        for field in descriptor.active_fields() {
            if let Some(child) = field.schema() {
                self.visit(child)?;
            }
        }
        self.stack.pop();
        self.done.push(descriptor);
        Ok(())
    }
}
