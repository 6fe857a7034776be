use chrono::{DateTime, TimeZone, Utc};
use docgraph_codec::{CodecError, MarkdownSchema, from_markdown, to_markdown};
use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use uuid::Uuid;

#[derive(MarkdownSchema, Debug, Clone, PartialEq)]
#[markdown(title = "Release Plan")]
struct ReleasePlan {
    id: Uuid,
    version: String,
    frozen: bool,
    created_at: DateTime<Utc>,
    owner: Person,
    labels: Vec<String>,
    milestones: Vec<Milestone>,
    risks: Vec<Risk>,
}

#[derive(MarkdownSchema, Debug, Clone, PartialEq)]
struct Person {
    name: String,
    email: Option<String>,
}

#[derive(MarkdownSchema, Debug, Clone, PartialEq)]
struct Milestone {
    #[markdown(header)]
    title: String,
    due: Option<DateTime<Utc>>,
    tasks: Vec<String>,
}

#[derive(MarkdownSchema, Debug, Clone, PartialEq)]
struct Risk {
    severity: u8,
    note: String,
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}.md",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap()
}

#[test]
fn fixture_release_plan_parses() {
    let plan = from_markdown::<ReleasePlan>(&read_fixture("release_plan")).unwrap();

    assert_eq!(
        plan.id,
        Uuid::parse_str("5f1c2d3e-4a5b-4c6d-8e7f-9a0b1c2d3e4f").unwrap()
    );
    assert_eq!(plan.created_at, Utc.with_ymd_and_hms(2026, 1, 5, 9, 30, 0).unwrap());
    assert_eq!(plan.owner.email.as_deref(), Some("ada@example.com"));
    assert_eq!(plan.labels, vec!["backend", "q1"]);
    assert_eq!(plan.milestones.len(), 2);
    assert_eq!(plan.milestones[0].tasks, vec!["freeze api", "write notes: short ones"]);
    assert_eq!(plan.milestones[1].due, None);
    assert!(plan.milestones[1].tasks.is_empty());
    assert_eq!(
        plan.risks,
        vec![Risk {
            severity: 2,
            note: "migration window is short".to_string(),
        }]
    );
}

#[test]
fn fixture_release_plan_reserializes_unchanged() {
    let text = read_fixture("release_plan");

    let plan = from_markdown::<ReleasePlan>(&text).unwrap();

    assert_eq!(to_markdown(&plan).unwrap(), text.trim_end_matches('\n'));
}

#[test]
fn fixture_bad_due_date() {
    let err = from_markdown::<ReleasePlan>(&read_fixture("bad_due_date")).unwrap_err();

    assert!(matches!(err, CodecError::Format { line: Some(14), .. }), "{err:?}");
    assert_snapshot!(
        err.to_string(),
        @"invalid value for `ReleasePlan.Milestones[0].Due` at line 14: expected a UTC timestamp like 2024-01-31T09:30:00.000000000Z, found \"2026-02-01\""
    );
}

#[test]
fn fixture_sections_out_of_order() {
    let err = from_markdown::<ReleasePlan>(&read_fixture("sections_out_of_order")).unwrap_err();

    assert!(matches!(err, CodecError::MissingField { line: 11, .. }), "{err:?}");
    assert_eq!(err.path().unwrap().to_string(), "ReleasePlan.Owner");
}

#[test]
fn serialized_documents_parse_back_to_equal_values() {
    let plan = ReleasePlan {
        id: Uuid::new_v4(),
        version: "0.1.0".to_string(),
        frozen: true,
        created_at: Utc::now(),
        owner: Person {
            name: "Grace".to_string(),
            email: None,
        },
        labels: Vec::new(),
        milestones: vec![Milestone {
            title: "Alpha".to_string(),
            due: None,
            tasks: vec!["- leading dash".to_string(), "# not a header".to_string()],
        }],
        risks: Vec::new(),
    };

    let markdown = to_markdown(&plan).unwrap();
    let parsed = from_markdown::<ReleasePlan>(&markdown).unwrap();

    assert_eq!(parsed, plan);
    assert_eq!(to_markdown(&parsed).unwrap(), markdown);
}
