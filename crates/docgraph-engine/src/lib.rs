//! Documentation graph: services, endpoints, use cases and the relations
//! between them, stored as one Markdown file per document.

pub mod model;
pub mod store;

pub use model::{
    DocGraph, Edge, EdgeSource, Endpoint, Relation, RelationKind, Service, UseCase,
};
pub use store::{DocumentStore, Reformat, StoreError, StoredDocument};
