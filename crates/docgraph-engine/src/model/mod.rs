//! Documents making up a documentation graph.
//!
//! Each top-level type is one Markdown file. Relations point at other
//! documents by id and are resolved by [`DocGraph`].

mod graph;

use std::fmt;

use chrono::{DateTime, Utc};
use docgraph_codec::{MarkdownSchema, ScalarValue, ValueError};
use uuid::Uuid;

pub use graph::{DocGraph, Edge, EdgeSource};

#[derive(MarkdownSchema, Debug, Clone, PartialEq)]
#[markdown(title = "Service")]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub endpoints: Vec<Endpoint>,
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            owner: None,
            updated_at: Utc::now(),
            tags: Vec::new(),
            endpoints: Vec::new(),
        }
    }

    pub fn endpoint(&self, route: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|endpoint| endpoint.route == route)
    }
}

/// An operation exposed by a service, headed by its route (`GET /users`).
#[derive(MarkdownSchema, Debug, Clone, PartialEq)]
pub struct Endpoint {
    #[markdown(header)]
    pub route: String,
    pub summary: Option<String>,
    pub deprecated: bool,
    pub relations: Vec<Relation>,
}

impl Endpoint {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            summary: None,
            deprecated: false,
            relations: Vec::new(),
        }
    }
}

#[derive(MarkdownSchema, Debug, Clone, PartialEq)]
#[markdown(title = "Use Case")]
pub struct UseCase {
    pub id: Uuid,
    pub title: String,
    pub actor: Option<String>,
    pub description: Option<String>,
    pub steps: Vec<String>,
    pub relations: Vec<Relation>,
}

impl UseCase {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            actor: None,
            description: None,
            steps: Vec::new(),
            relations: Vec::new(),
        }
    }
}

/// A directed link to another document.
#[derive(MarkdownSchema, Debug, Clone, PartialEq)]
pub struct Relation {
    pub target: Uuid,
    #[markdown(scalar)]
    pub kind: RelationKind,
    pub note: Option<String>,
}

impl Relation {
    pub fn new(kind: RelationKind, target: Uuid) -> Self {
        Self {
            target,
            kind,
            note: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationKind {
    Calls,
    DependsOn,
    Implements,
    Documents,
}

impl RelationKind {
    pub const ALL: [RelationKind; 4] = [
        RelationKind::Calls,
        RelationKind::DependsOn,
        RelationKind::Implements,
        RelationKind::Documents,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::Calls => "Calls",
            RelationKind::DependsOn => "DependsOn",
            RelationKind::Implements => "Implements",
            RelationKind::Documents => "Documents",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ScalarValue for RelationKind {
    const EXPECTED: &'static str = "one of `Calls`, `DependsOn`, `Implements`, `Documents`";

    fn to_text(&self) -> Result<String, ValueError> {
        Ok(self.as_str().to_string())
    }

    fn from_text(text: &str) -> Result<Self, ValueError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == text)
            .ok_or_else(|| ValueError::new(Self::EXPECTED, text))
    }
}
