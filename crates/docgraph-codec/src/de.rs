//! Markdown to record, driven by the target schema.
//!
//! The parser never guesses a field's kind from the text. For each section it
//! asks the descriptor which scalars, nested objects and collections to
//! expect, matches bullets to scalar fields in declaration order and matches
//! child sections to fields in [`SchemaDescriptor::section_order`].

use crate::document::{Item, Section, tokenize};
use crate::error::{CodecError, FieldPath, Result, SchemaError};
use crate::record::{FieldValue, Record};
use crate::schema::{
    FieldDescriptor, FieldKind, MarkdownSchema, SchemaDescriptor, section_candidates,
};

/// Parses a complete document into `T`.
///
/// Either the whole document is valid and a fully built `T` is returned, or
/// the first violation is reported; nothing is partially populated.
pub fn from_markdown<T: MarkdownSchema>(text: &str) -> Result<T> {
    let descriptor = T::descriptor();
    descriptor.validate()?;

    let path = FieldPath::root(descriptor.type_name());
    let root = tokenize(text)
        .and_then(Section::build)
        .map_err(|err| err.within(descriptor.type_name()))?;

    let expected = descriptor.root_header();
    if root.text != expected {
        return Err(CodecError::Grammar {
            path,
            line: root.line,
            expected: format!("`# {expected}`"),
            found: format!("# {}", root.text),
        });
    }

    let record = read_section(descriptor, &root, &path)?;
    log::trace!("parsed `{}` document", descriptor.type_name());
    T::from_record(record).map_err(|err| err.within(descriptor.type_name()))
}

fn read_section(
    descriptor: &SchemaDescriptor,
    section: &Section,
    path: &FieldPath,
) -> Result<Record> {
    log::trace!("reading `{path}` from line {}", section.line);
    let mut record = Record::at_line(section.line);
    read_scalars(descriptor, section, path, &mut record)?;
    read_children(descriptor, section, path, &mut record)?;
    Ok(record)
}

/// Splits `Key: value`. A bare `Key:` has an empty value.
fn split_item(raw: &str) -> Option<(&str, &str)> {
    raw.split_once(": ")
        .or_else(|| raw.strip_suffix(':').map(|key| (key, "")))
}

fn read_scalars(
    descriptor: &SchemaDescriptor,
    section: &Section,
    path: &FieldPath,
    record: &mut Record,
) -> Result<()> {
    let fields: Vec<&FieldDescriptor> = descriptor.scalar_fields().collect();
    let mut cursor = 0;

    for Item { raw, line } in &section.items {
        let Some((key, value)) = split_item(raw) else {
            return Err(CodecError::Grammar {
                path: path.clone(),
                line: *line,
                expected: "a `- Key: value` bullet".to_string(),
                found: format!("- {raw}"),
            });
        };

        match fields[cursor..].iter().position(|field| field.name == key) {
            Some(offset) => {
                let field = fields[cursor + offset];
                record.insert(
                    field.name,
                    FieldValue::Scalar(Some(value.to_string())),
                    Some(*line),
                );
                cursor += offset + 1;
            }
            None => {
                let expected = if fields[..cursor].iter().any(|field| field.name == key) {
                    format!("`{key}` at most once and in declaration order")
                } else {
                    format!("one of the fields of `{}`", descriptor.type_name())
                };
                return Err(CodecError::Grammar {
                    path: path.child(key),
                    line: *line,
                    expected,
                    found: format!("- {raw}"),
                });
            }
        }
    }

    for field in fields {
        if record.contains(field.name) {
            continue;
        }
        if field.required {
            return Err(CodecError::MissingField {
                path: path.child(field.name),
                line: section.line,
                expected: format!("`- {}: <value>`", field.name),
            });
        }
        record.insert(field.name, FieldValue::Scalar(None), None);
    }
    Ok(())
}

fn read_children(
    descriptor: &SchemaDescriptor,
    section: &Section,
    path: &FieldPath,
    record: &mut Record,
) -> Result<()> {
    let order = descriptor.section_order();
    let mut assigned: Vec<Vec<&Section>> = vec![Vec::new(); order.len()];
    let mut cursor = 0;

    for child in &section.children {
        let slot = match_child(&order, cursor, child, path)?;
        assigned[slot].push(child);
        cursor = match order[slot].kind {
            FieldKind::ObjectArray => slot,
            _ => slot + 1,
        };
    }

    for (field, sections) in order.iter().zip(assigned) {
        let line = sections.first().map(|first| first.line);
        let value = match field.kind {
            FieldKind::NestedObject => match sections.first() {
                Some(nested) => {
                    let schema = element_schema(descriptor, field)?;
                    let nested = read_section(schema, nested, &path.child(field.name))?;
                    FieldValue::Object(Some(nested))
                }
                None if field.required => return Err(missing_section(field, section, path)),
                None => FieldValue::Object(None),
            },
            FieldKind::ScalarArray => match sections.first() {
                Some(list) => FieldValue::ScalarList(read_scalar_list(field, list, path)?),
                None => return Err(missing_section(field, section, path)),
            },
            FieldKind::ObjectArray => {
                let schema = element_schema(descriptor, field)?;
                let elements = sections
                    .iter()
                    .enumerate()
                    .map(|(index, element)| {
                        read_element(schema, element, &path.element(field.name, index))
                    })
                    .collect::<Result<Vec<_>>>()?;
                FieldValue::ObjectList(elements)
            }
            FieldKind::Scalar => continue,
        };
        record.insert(field.name, value, line);
    }
    Ok(())
}

/// Picks the field, at or after `cursor`, that owns the child section.
///
/// See [`section_candidates`]: one candidate selects it, several are
/// ambiguous and none is a grammar error.
fn match_child(
    order: &[&FieldDescriptor],
    cursor: usize,
    child: &Section,
    path: &FieldPath,
) -> Result<usize> {
    let has_bullet = |key: &str, value: &str| {
        child
            .items
            .iter()
            .filter_map(|item| split_item(&item.raw))
            .any(|bullet| bullet == (key, value))
    };

    match section_candidates(order, cursor, &child.text, has_bullet).as_slice() {
        [index] => Ok(*index),
        [] => {
            let expected: Vec<String> = order[cursor..]
                .iter()
                .map(|field| match field.expected_header() {
                    Some(text) => format!("`{text}`"),
                    None => format!("an element of `{}`", field.name),
                })
                .collect();
            Err(CodecError::Grammar {
                path: path.clone(),
                line: child.line,
                expected: if expected.is_empty() {
                    "no further sections".to_string()
                } else {
                    format!("a section header among {}", expected.join(", "))
                },
                found: format!("{} {}", "#".repeat(child.level), child.text),
            })
        }
        candidates => Err(CodecError::AmbiguousField {
            path: path.clone(),
            line: child.line,
            header: child.text.clone(),
            candidates: candidates
                .iter()
                .map(|&index| order[index].name.to_string())
                .collect(),
        }),
    }
}

fn read_scalar_list(
    field: &FieldDescriptor,
    list: &Section,
    path: &FieldPath,
) -> Result<Vec<String>> {
    if let Some(nested) = list.children.first() {
        return Err(CodecError::Grammar {
            path: path.child(field.name),
            line: nested.line,
            expected: format!("only `- value` bullets under `{}`", field.name),
            found: format!("{} {}", "#".repeat(nested.level), nested.text),
        });
    }
    Ok(list.items.iter().map(|item| item.raw.clone()).collect())
}

fn read_element(
    schema: &SchemaDescriptor,
    element: &Section,
    path: &FieldPath,
) -> Result<Record> {
    let record = read_section(schema, element, path)?;

    let expected = schema.element_header(&record);
    if element.text != expected {
        let path = match schema.header_field() {
            Some(field) => path.child(field.name),
            None => path.clone(),
        };
        return Err(CodecError::Grammar {
            path,
            line: element.line,
            expected: format!("a section headed `{expected}`"),
            found: element.text.clone(),
        });
    }
    Ok(record)
}

fn element_schema(
    descriptor: &SchemaDescriptor,
    field: &FieldDescriptor,
) -> Result<&'static SchemaDescriptor> {
    field.schema().ok_or_else(|| {
        SchemaError::MissingElementSchema {
            type_name: descriptor.type_name(),
            field: field.name,
        }
        .into()
    })
}

fn missing_section(field: &FieldDescriptor, section: &Section, path: &FieldPath) -> CodecError {
    CodecError::MissingField {
        path: path.child(field.name),
        line: section.end_line(),
        expected: format!("a `{} {}` section", "#".repeat(section.level + 1), field.name),
    }
}
