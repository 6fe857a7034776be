//! Subcommands over a documents directory.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use docgraph_config::Config;
use docgraph_engine::{
    DocGraph, DocumentStore, Edge, EdgeSource, Reformat, Service, StoredDocument, UseCase,
};

/// Check, format and inspect a documentation graph stored as Markdown.
#[derive(Parser, Debug)]
#[command(name = "docgraph", version)]
pub struct Cli {
    /// Documents directory, overriding `docs_path` from the config file
    #[arg(long, global = true)]
    pub docs: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse every document and report invalid ones and dangling relations
    Check {
        /// Fail on relations to unknown documents
        #[arg(long)]
        strict: bool,
    },
    /// Rewrite documents in canonical form
    Fmt {
        /// Only report files that are not canonical
        #[arg(long)]
        check: bool,
    },
    /// List services, their endpoints and use cases
    List,
    /// Print the relations between documents
    Relations {
        /// Only relations whose target is unknown
        #[arg(long)]
        dangling: bool,
    },
}

impl Cli {
    pub fn run(self) -> Result<String> {
        let config = Config::resolve(self.docs)?;
        log::debug!("using documents at {}", config.docs_path.display());
        let store = DocumentStore::open(&config.docs_path)?;

        match self.command {
            Command::Check { strict } => check(&store, strict || config.strict_relations),
            Command::Fmt { check } => format_all(&store, check),
            Command::List => Ok(list(&store.load_graph()?)),
            Command::Relations { dangling } => {
                let graph = store.load_graph()?;
                let edges = if dangling {
                    graph.dangling_relations()
                } else {
                    graph.relations()
                };
                Ok(relations(&graph, &edges))
            }
        }
    }
}

/// Parses every document of type `D`, collecting one line per failure.
fn check_documents<D: StoredDocument>(
    store: &DocumentStore,
    problems: &mut Vec<String>,
) -> Result<usize> {
    let ids = store.list_ids::<D>()?;
    for id in &ids {
        if let Err(err) = store.load::<D>(*id) {
            problems.push(err.to_string());
        }
    }
    Ok(ids.len())
}

pub fn check(store: &DocumentStore, strict: bool) -> Result<String> {
    let mut problems = Vec::new();
    let documents = check_documents::<Service>(store, &mut problems)?
        + check_documents::<UseCase>(store, &mut problems)?;

    let mut out = String::new();
    for problem in &problems {
        writeln!(out, "error: {problem}")?;
    }
    if !problems.is_empty() {
        bail!("{out}{} of {documents} documents are invalid", problems.len());
    }

    let graph = store.load_graph()?;
    let dangling = graph.dangling_relations();
    for edge in &dangling {
        writeln!(out, "{}: {}", if strict { "error" } else { "warning" }, describe(&graph, edge))?;
    }
    if strict && !dangling.is_empty() {
        bail!("{out}{} relations point at unknown documents", dangling.len());
    }

    write!(out, "{documents} documents ok")?;
    Ok(out)
}

fn format_documents<D: StoredDocument>(
    store: &DocumentStore,
    check_only: bool,
    changed: &mut Vec<String>,
) -> Result<()> {
    for id in store.list_ids::<D>()? {
        let path = store.path_of::<D>(id);
        let needs_work = if check_only {
            !store.is_canonical::<D>(id)?
        } else {
            store.reformat::<D>(id)? == Reformat::Rewritten
        };
        if needs_work {
            changed.push(path.display().to_string());
        }
    }
    Ok(())
}

pub fn format_all(store: &DocumentStore, check_only: bool) -> Result<String> {
    let mut changed = Vec::new();
    format_documents::<Service>(store, check_only, &mut changed)?;
    format_documents::<UseCase>(store, check_only, &mut changed)?;

    if check_only && !changed.is_empty() {
        bail!("not canonical:\n{}", changed.join("\n"));
    }
    let mut out = String::new();
    for path in &changed {
        writeln!(out, "formatted {path}")?;
    }
    write!(out, "{} files rewritten", changed.len())?;
    Ok(out)
}

pub fn list(graph: &DocGraph) -> String {
    let mut out = String::new();
    for service in graph.services() {
        let _ = writeln!(out, "service {} {}", service.id, service.name);
        for endpoint in &service.endpoints {
            let marker = if endpoint.deprecated { " (deprecated)" } else { "" };
            let _ = writeln!(out, "  {}{marker}", endpoint.route);
        }
    }
    for use_case in graph.use_cases() {
        let _ = writeln!(out, "use case {} {}", use_case.id, use_case.title);
    }
    out.trim_end().to_string()
}

fn describe(graph: &DocGraph, edge: &Edge) -> String {
    let name = |id| graph.name_of(id).map(str::to_string).unwrap_or_else(|| id.to_string());
    let via = match &edge.source {
        EdgeSource::Endpoint { route } => format!(" [{route}]"),
        EdgeSource::UseCase => String::new(),
    };
    format!("{}{via} --{}--> {}", name(edge.from), edge.kind, name(edge.to))
}

pub fn relations(graph: &DocGraph, edges: &[Edge]) -> String {
    edges
        .iter()
        .map(|edge| describe(graph, edge))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use docgraph_engine::{Endpoint, Relation, RelationKind};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn create_test_store() -> (TempDir, DocumentStore, Service, UseCase) {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path()).unwrap();

        let mut billing = Service::new("Billing");
        let mut charge = Endpoint::new("POST /charges");
        charge.deprecated = true;
        charge
            .relations
            .push(Relation::new(RelationKind::DependsOn, Uuid::nil()));
        billing.endpoints.push(charge);
        let mut pay = UseCase::new("Pay an invoice");
        pay.relations
            .push(Relation::new(RelationKind::Documents, billing.id));

        store.save(&billing).unwrap();
        store.save(&pay).unwrap();
        (dir, store, billing, pay)
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_docs_flag() {
        let cli =
            Cli::try_parse_from(["docgraph", "check", "--strict", "--docs", "/tmp/docs"]).unwrap();

        assert_eq!(cli.docs, Some(PathBuf::from("/tmp/docs")));
        assert!(matches!(cli.command, Command::Check { strict: true }));
    }

    #[test]
    fn test_check_warns_about_dangling_relations() {
        let (_dir, store, _, _) = create_test_store();

        let out = check(&store, false).unwrap();

        assert_eq!(
            out,
            format!(
                "warning: Billing [POST /charges] --DependsOn--> {}\n2 documents ok",
                Uuid::nil()
            )
        );
    }

    #[test]
    fn test_check_strict_fails_on_dangling_relations() {
        let (_dir, store, _, _) = create_test_store();

        let err = check(&store, true).unwrap_err();

        assert!(err.to_string().ends_with("1 relations point at unknown documents"));
    }

    #[test]
    fn test_check_reports_invalid_documents() {
        let (_dir, store, billing, _) = create_test_store();
        std::fs::write(store.path_of::<Service>(billing.id), "# Service\n- Nope: 1\n").unwrap();

        let err = check(&store, false).unwrap_err();

        assert!(err.to_string().contains("1 of 2 documents are invalid"));
        assert!(err.to_string().starts_with("error: Invalid document"));
    }

    #[test]
    fn test_fmt_check_then_fix() {
        let (_dir, store, _, pay) = create_test_store();
        let path = store.path_of::<UseCase>(pay.id);
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, format!("{text}\n\n")).unwrap();

        let err = format_all(&store, true).unwrap_err();
        assert!(err.to_string().contains(&path.display().to_string()));

        let out = format_all(&store, false).unwrap();
        assert!(out.ends_with("1 files rewritten"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), text);
        assert_eq!(format_all(&store, true).unwrap(), "0 files rewritten");
    }

    #[test]
    fn test_list_and_relations_output() {
        let (_dir, store, billing, pay) = create_test_store();
        let graph = store.load_graph().unwrap();

        assert_eq!(
            list(&graph),
            format!(
                "service {} Billing\n  POST /charges (deprecated)\nuse case {} Pay an invoice",
                billing.id, pay.id
            )
        );
        assert_eq!(
            relations(&graph, &graph.dangling_relations()),
            format!("Billing [POST /charges] --DependsOn--> {}", Uuid::nil())
        );
        assert!(
            relations(&graph, &graph.relations())
                .ends_with("Pay an invoice --Documents--> Billing")
        );
    }
}
