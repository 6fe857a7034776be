//! # docgraph-codec
//!
//! Converts typed object graphs to a narrow Markdown dialect and back,
//! driven by metadata generated with `#[derive(MarkdownSchema)]` instead of
//! hand-written formatting code.
//!
//! ```
//! use docgraph_codec::{MarkdownSchema, from_markdown, to_markdown};
//!
//! #[derive(MarkdownSchema, Debug, PartialEq)]
//! struct CustomObj {
//!     id: i32,
//!     name: String,
//!     is_some_flag: bool,
//! }
//!
//! let value = CustomObj { id: 1, name: "SomeName".into(), is_some_flag: true };
//! let markdown = to_markdown(&value).unwrap();
//!
//! assert_eq!(markdown, "# CustomObj\n- Id: 1\n- Name: SomeName\n- IsSomeFlag: True");
//! assert_eq!(from_markdown::<CustomObj>(&markdown).unwrap(), value);
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! serialize:  T --to_record--> Record --ser--> Markdown
//! parse:      Markdown --tokenize--> Blocks --build--> Sections
//!                      --de (schema walk)--> Record --from_record--> T
//! ```
//!
//! - [`value`]: canonical text for scalars (`True`/`False`, UUIDs, timestamps)
//! - [`schema`]: per-type descriptors and the header resolution rules
//! - [`record`]: the untyped field map both directions go through
//! - [`document`]: tokenizer and section tree
//! - [`ser`] / [`de`]: the two walks over a descriptor
//!
//! ## Derive attributes
//!
//! | Attribute | Where | Effect |
//! |---|---|---|
//! | `#[markdown(title = "...")]` | type | header used instead of the type name |
//! | `#[markdown(header)]` | field | value heads the section when the type is an array element |
//! | `#[markdown(ignore)]` | field | excluded from both directions, rebuilt with `Default` |
//! | `#[markdown(rename = "...")]` | field | name used in the document (default: PascalCase) |
//! | `#[markdown(scalar)]` / `#[markdown(object)]` | field | override kind inference |

extern crate self as docgraph_codec;

pub mod de;
pub mod document;
pub mod error;
pub mod record;
pub mod schema;
pub mod ser;
pub mod value;

pub use de::from_markdown;
pub use docgraph_codec_derive::MarkdownSchema;
pub use error::{CodecError, FieldPath, Result, SchemaError};
pub use record::{FieldValue, Record};
pub use schema::{
    DescriptorFn, ElementPattern, FieldDescriptor, FieldKind, MarkdownSchema, SchemaDescriptor,
};
pub use ser::to_markdown;
pub use value::{ScalarValue, ValueError};

#[cfg(test)]
mod tests;
