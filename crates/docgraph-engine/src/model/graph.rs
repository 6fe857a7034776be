use std::collections::HashMap;

use uuid::Uuid;

use super::{RelationKind, Service, UseCase};

/// Where a relation was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeSource {
    Endpoint { route: String },
    UseCase,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: Uuid,
    pub source: EdgeSource,
    pub to: Uuid,
    pub kind: RelationKind,
}

/// In-memory view over every loaded document.
#[derive(Debug, Clone, Default)]
pub struct DocGraph {
    services: Vec<Service>,
    use_cases: Vec<UseCase>,
    index: HashMap<Uuid, NodeIndex>,
}

#[derive(Debug, Clone, Copy)]
enum NodeIndex {
    Service(usize),
    UseCase(usize),
}

impl DocGraph {
    pub fn new(services: Vec<Service>, use_cases: Vec<UseCase>) -> Self {
        let mut graph = Self::default();
        for service in services {
            graph.add_service(service);
        }
        for use_case in use_cases {
            graph.add_use_case(use_case);
        }
        graph
    }

    /// Adds or replaces the service with the same id.
    pub fn add_service(&mut self, service: Service) {
        match self.index.get(&service.id) {
            Some(NodeIndex::Service(slot)) => self.services[*slot] = service,
            Some(NodeIndex::UseCase(_)) => {
                log::warn!("id {} is used by a service and a use case", service.id);
                self.push_service(service);
            }
            None => self.push_service(service),
        }
    }

    /// Adds or replaces the use case with the same id.
    pub fn add_use_case(&mut self, use_case: UseCase) {
        match self.index.get(&use_case.id) {
            Some(NodeIndex::UseCase(slot)) => self.use_cases[*slot] = use_case,
            Some(NodeIndex::Service(_)) => {
                log::warn!("id {} is used by a service and a use case", use_case.id);
                self.push_use_case(use_case);
            }
            None => self.push_use_case(use_case),
        }
    }

    fn push_service(&mut self, service: Service) {
        self.index
            .insert(service.id, NodeIndex::Service(self.services.len()));
        self.services.push(service);
    }

    fn push_use_case(&mut self, use_case: UseCase) {
        self.index
            .insert(use_case.id, NodeIndex::UseCase(self.use_cases.len()));
        self.use_cases.push(use_case);
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn use_cases(&self) -> &[UseCase] {
        &self.use_cases
    }

    pub fn service(&self, id: Uuid) -> Option<&Service> {
        match self.index.get(&id)? {
            NodeIndex::Service(slot) => self.services.get(*slot),
            NodeIndex::UseCase(_) => None,
        }
    }

    pub fn use_case(&self, id: Uuid) -> Option<&UseCase> {
        match self.index.get(&id)? {
            NodeIndex::UseCase(slot) => self.use_cases.get(*slot),
            NodeIndex::Service(_) => None,
        }
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.index.contains_key(&id)
    }

    /// Display name of a document: service name or use-case title.
    pub fn name_of(&self, id: Uuid) -> Option<&str> {
        self.service(id)
            .map(|service| service.name.as_str())
            .or_else(|| self.use_case(id).map(|use_case| use_case.title.as_str()))
    }

    /// Every relation in the graph, services first, in document order.
    pub fn relations(&self) -> Vec<Edge> {
        let from_endpoints = self.services.iter().flat_map(|service| {
            service.endpoints.iter().flat_map(move |endpoint| {
                endpoint.relations.iter().map(move |relation| Edge {
                    from: service.id,
                    source: EdgeSource::Endpoint {
                        route: endpoint.route.clone(),
                    },
                    to: relation.target,
                    kind: relation.kind,
                })
            })
        });
        let from_use_cases = self.use_cases.iter().flat_map(|use_case| {
            use_case.relations.iter().map(move |relation| Edge {
                from: use_case.id,
                source: EdgeSource::UseCase,
                to: relation.target,
                kind: relation.kind,
            })
        });
        from_endpoints.chain(from_use_cases).collect()
    }

    /// Relations whose target is not a known document.
    pub fn dangling_relations(&self) -> Vec<Edge> {
        self.relations()
            .into_iter()
            .filter(|edge| !self.contains(edge.to))
            .collect()
    }

    /// Relations pointing at `id`.
    pub fn incoming(&self, id: Uuid) -> Vec<Edge> {
        self.relations()
            .into_iter()
            .filter(|edge| edge.to == id)
            .collect()
    }
}
