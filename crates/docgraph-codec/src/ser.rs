//! Record to Markdown.
//!
//! ```text
//! # CustomObj            <- root: display title or type name
//! - Id: 1                <- scalars in declaration order
//! - Name: SomeName
//!
//! ## Nested              <- nested object: the field's name
//! - Id: 2
//!
//! ## Names               <- scalar array: the field's name, keyless bullets
//! - A
//!
//! ## GET /users          <- object-array element: header field value,
//! - Route: GET /users       else display title, else type name
//! ```
//!
//! Every sub-section is preceded by exactly one blank line and the output
//! carries no trailing newline.

use crate::error::{CodecError, FieldPath, Result};
use crate::record::{FieldValue, Record};
use crate::schema::{
    FieldDescriptor, FieldKind, MarkdownSchema, SchemaDescriptor, section_candidates,
};

/// Serializes `value` into a complete document.
///
/// Fails with [`CodecError::AmbiguousField`] rather than write a section that
/// would read back into a different field, e.g. an element whose header value
/// equals the name of a sibling section.
pub fn to_markdown<T: MarkdownSchema>(value: &T) -> Result<String> {
    let descriptor = T::descriptor();
    descriptor.validate()?;

    let record = value
        .to_record()
        .map_err(|err| err.within(descriptor.type_name()))?;

    let mut emitter = Emitter::default();
    let path = FieldPath::root(descriptor.type_name());
    emitter.section(1, descriptor.root_header(), descriptor, &record, &path)?;
    log::trace!(
        "serialized `{}` into {} bytes",
        descriptor.type_name(),
        emitter.out.len()
    );
    Ok(emitter.out)
}

#[derive(Default)]
struct Emitter {
    out: String,
}

impl Emitter {
    /// Line the next header will land on.
    fn next_header_line(&self) -> usize {
        if self.out.is_empty() {
            1
        } else {
            self.out.matches('\n').count() + 3
        }
    }

    fn header(&mut self, level: usize, text: &str) {
        if !self.out.is_empty() {
            self.out.push_str("\n\n");
        }
        for _ in 0..level {
            self.out.push('#');
        }
        self.out.push(' ');
        self.out.push_str(text);
    }

    fn bullet(&mut self, text: &str) {
        self.out.push_str("\n- ");
        self.out.push_str(text);
    }

    fn section(
        &mut self,
        level: usize,
        header: &str,
        descriptor: &SchemaDescriptor,
        record: &Record,
        path: &FieldPath,
    ) -> Result<()> {
        self.header(level, header);

        for field in descriptor.scalar_fields() {
            if let Some(text) = record.scalar_text(field.name) {
                self.bullet(&format!("{}: {text}", field.name));
            }
        }

        let order = descriptor.section_order();
        let mut cursor = 0;
        for (slot, field) in order.iter().enumerate() {
            let Some(child) = field.schema() else {
                if field.kind == FieldKind::ScalarArray
                    && let Some(FieldValue::ScalarList(values)) = record.get(field.name)
                {
                    self.header(level + 1, field.name);
                    for value in values {
                        self.bullet(value);
                    }
                    cursor = slot + 1;
                }
                continue;
            };

            match record.get(field.name) {
                Some(FieldValue::Object(Some(nested))) => {
                    self.check_owner(&order, cursor, slot, field.name, nested, path)?;
                    let nested_path = path.child(field.name);
                    self.section(level + 1, field.name, child, nested, &nested_path)?;
                    cursor = slot + 1;
                }
                Some(FieldValue::ObjectList(elements)) => {
                    for (index, element) in elements.iter().enumerate() {
                        let header = child.element_header(element);
                        self.check_owner(&order, cursor, slot, &header, element, path)?;
                        let element_path = path.element(field.name, index);
                        self.section(level + 1, &header, child, element, &element_path)?;
                        cursor = slot;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Fails unless a parser sitting at `cursor` would hand a section headed
    /// `header` with `record`'s bullets to the field at `slot`, and to it alone.
    fn check_owner(
        &self,
        order: &[&FieldDescriptor],
        cursor: usize,
        slot: usize,
        header: &str,
        record: &Record,
        path: &FieldPath,
    ) -> Result<()> {
        let has_bullet = |key: &str, value: &str| record.scalar_text(key) == Some(value);
        let candidates = section_candidates(order, cursor, header, has_bullet);
        if candidates == [slot] {
            return Ok(());
        }

        let mut names = vec![order[slot].name.to_string()];
        names.extend(
            candidates
                .into_iter()
                .filter(|&index| index != slot)
                .map(|index| order[index].name.to_string()),
        );
        Err(CodecError::AmbiguousField {
            path: path.clone(),
            line: self.next_header_line(),
            header: header.to_string(),
            candidates: names,
        })
    }
}
