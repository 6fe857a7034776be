//! Behaviour of the codec end to end, on small derived types.


use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use rstest::rstest;
use uuid::Uuid;

use crate::{MarkdownSchema, from_markdown, to_markdown};

#[derive(MarkdownSchema, Debug, Clone, PartialEq)]
pub(crate) struct CustomObj {
    pub id: i32,
    pub name: String,
    pub is_some_flag: bool,
}

#[derive(MarkdownSchema, Debug, Clone, PartialEq)]
pub(crate) struct WithArray {
    pub items: Vec<CustomObj>,
}

#[derive(MarkdownSchema, Debug, Clone, PartialEq)]
pub(crate) struct ScalarArrays {
    pub names: Vec<String>,
    pub indexes: Vec<i32>,
    pub ids: Vec<Uuid>,
}

#[derive(MarkdownSchema, Debug, Clone, PartialEq)]
pub(crate) struct WithNested {
    pub id: i32,
    pub name: String,
    pub is_some_flag: bool,
    pub nested: CustomObj,
}

#[derive(MarkdownSchema, Debug, Clone, PartialEq)]
#[markdown(title = "Custom Title")]
pub(crate) struct Titled {
    pub id: i32,
}

#[derive(MarkdownSchema, Debug, Clone, PartialEq)]
pub(crate) struct TitleContexts {
    pub child: Titled,
    pub elements: Vec<Titled>,
}

#[derive(MarkdownSchema, Debug, Clone, PartialEq)]
pub(crate) struct Step {
    #[markdown(header)]
    pub name: String,
    pub order: u32,
}

#[derive(MarkdownSchema, Debug, Clone, PartialEq)]
pub(crate) struct Plan {
    pub steps: Vec<Step>,
    pub items: Vec<CustomObj>,
}

#[derive(MarkdownSchema, Debug, Clone, PartialEq, Default)]
pub(crate) struct Optionals {
    pub title: Option<String>,
    pub count: Option<i64>,
    pub child: Option<CustomObj>,
    #[markdown(ignore)]
    pub cache: Vec<String>,
    #[markdown(rename = "When")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Declared out of section order on purpose.
#[derive(MarkdownSchema, Debug, Clone, PartialEq)]
pub(crate) struct Shuffled {
    pub items: Vec<CustomObj>,
    pub tags: Vec<String>,
    pub name: String,
    pub nested: Option<CustomObj>,
}

#[derive(MarkdownSchema, Debug, Clone, PartialEq)]
pub(crate) struct Outer {
    pub label: String,
    pub inner: WithNested,
}

fn custom(id: i32, name: &str, flag: bool) -> CustomObj {
    CustomObj {
        id,
        name: name.to_string(),
        is_some_flag: flag,
    }
}

fn guid(text: &str) -> Uuid {
    Uuid::parse_str(text).unwrap()
}

#[test]
fn scalar_only_object() {
    let markdown = to_markdown(&custom(1, "SomeName", true)).unwrap();

    assert_eq!(markdown, "# CustomObj\n- Id: 1\n- Name: SomeName\n- IsSomeFlag: True");
}

#[test]
fn object_array_elements_are_sibling_sections() {
    let value = WithArray {
        items: vec![custom(1, "SomeName1", true), custom(2, "SomeName2", false)],
    };

    let markdown = to_markdown(&value).unwrap();

    assert_eq!(
        markdown,
        "# WithArray\n\
         \n\
         ## CustomObj\n\
         - Id: 1\n\
         - Name: SomeName1\n\
         - IsSomeFlag: True\n\
         \n\
         ## CustomObj\n\
         - Id: 2\n\
         - Name: SomeName2\n\
         - IsSomeFlag: False"
    );
    assert_eq!(from_markdown::<WithArray>(&markdown).unwrap(), value);
}

#[test]
fn scalar_arrays_use_keyless_bullets() {
    let value = ScalarArrays {
        names: vec!["A".to_string(), "B".to_string()],
        indexes: vec![1, 2],
        ids: vec![
            guid("0b8c7c3e-52f4-4f7e-9a53-6a4c1d2e3f40"),
            guid("9f2d1e0c-7b6a-4c5d-8e9f-0a1b2c3d4e5f"),
        ],
    };

    let markdown = to_markdown(&value).unwrap();

    assert_eq!(
        markdown,
        "# ScalarArrays\n\
         \n\
         ## Names\n\
         - A\n\
         - B\n\
         \n\
         ## Indexes\n\
         - 1\n\
         - 2\n\
         \n\
         ## Ids\n\
         - 0b8c7c3e-52f4-4f7e-9a53-6a4c1d2e3f40\n\
         - 9f2d1e0c-7b6a-4c5d-8e9f-0a1b2c3d4e5f"
    );
    assert_eq!(from_markdown::<ScalarArrays>(&markdown).unwrap(), value);
}

#[test]
fn nested_object_follows_scalars_after_blank_line() {
    let value = WithNested {
        id: 1,
        name: "SomeName".to_string(),
        is_some_flag: true,
        nested: custom(2, "Inner", false),
    };

    let markdown = to_markdown(&value).unwrap();

    assert_eq!(
        markdown,
        "# WithNested\n\
         - Id: 1\n\
         - Name: SomeName\n\
         - IsSomeFlag: True\n\
         \n\
         ## Nested\n\
         - Id: 2\n\
         - Name: Inner\n\
         - IsSomeFlag: False"
    );
    assert_eq!(from_markdown::<WithNested>(&markdown).unwrap(), value);
}

#[test]
fn header_text_depends_on_placement() {
    let value = TitleContexts {
        child: Titled { id: 1 },
        elements: vec![Titled { id: 2 }],
    };

    let markdown = to_markdown(&value).unwrap();

    assert_eq!(
        markdown,
        "# TitleContexts\n\n## Child\n- Id: 1\n\n## Custom Title\n- Id: 2"
    );
    assert_eq!(to_markdown(&Titled { id: 3 }).unwrap(), "# Custom Title\n- Id: 3");
    assert_eq!(from_markdown::<TitleContexts>(&markdown).unwrap(), value);
}

#[test]
fn header_field_value_heads_array_elements() {
    let value = Plan {
        steps: vec![
            Step {
                name: "Collect requirements".to_string(),
                order: 1,
            },
            Step {
                name: "Ship it".to_string(),
                order: 2,
            },
        ],
        items: vec![custom(7, "Seven", true)],
    };

    let markdown = to_markdown(&value).unwrap();

    assert_eq!(
        markdown,
        "# Plan\n\
         \n\
         ## Collect requirements\n\
         - Name: Collect requirements\n\
         - Order: 1\n\
         \n\
         ## Ship it\n\
         - Name: Ship it\n\
         - Order: 2\n\
         \n\
         ## CustomObj\n\
         - Id: 7\n\
         - Name: Seven\n\
         - IsSomeFlag: True"
    );
    assert_eq!(from_markdown::<Plan>(&markdown).unwrap(), value);
}

#[test]
fn absent_optionals_and_ignored_fields_leave_no_trace() {
    let value = Optionals {
        cache: vec!["never written".to_string()],
        ..Optionals::default()
    };

    let markdown = to_markdown(&value).unwrap();

    assert_eq!(markdown, "# Optionals");
    assert_eq!(from_markdown::<Optionals>(&markdown).unwrap(), Optionals::default());
}

#[test]
fn present_optionals_round_trip() {
    let value = Optionals {
        title: Some(String::new()),
        count: Some(-3),
        child: Some(custom(4, "Four", false)),
        cache: Vec::new(),
        updated_at: Some(Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap()),
    };

    let markdown = to_markdown(&value).unwrap();

    assert_eq!(
        markdown,
        "# Optionals\n\
         - Title: \n\
         - Count: -3\n\
         - When: 2025-03-14T15:09:26.000000000Z\n\
         \n\
         ## Child\n\
         - Id: 4\n\
         - Name: Four\n\
         - IsSomeFlag: False"
    );
    assert_eq!(from_markdown::<Optionals>(&markdown).unwrap(), value);
}

#[test]
fn sections_follow_kind_groups_not_declaration_order() {
    let value = Shuffled {
        items: vec![custom(1, "One", true)],
        tags: vec!["x".to_string()],
        name: "shuffled".to_string(),
        nested: Some(custom(2, "Two", false)),
    };

    let markdown = to_markdown(&value).unwrap();

    assert_eq!(
        markdown,
        "# Shuffled\n\
         - Name: shuffled\n\
         \n\
         ## Nested\n\
         - Id: 2\n\
         - Name: Two\n\
         - IsSomeFlag: False\n\
         \n\
         ## Tags\n\
         - x\n\
         \n\
         ## CustomObj\n\
         - Id: 1\n\
         - Name: One\n\
         - IsSomeFlag: True"
    );
    assert_eq!(from_markdown::<Shuffled>(&markdown).unwrap(), value);
}

#[test]
fn empty_collections_round_trip() {
    let arrays = ScalarArrays {
        names: Vec::new(),
        indexes: Vec::new(),
        ids: Vec::new(),
    };
    let objects = WithArray { items: Vec::new() };

    let arrays_md = to_markdown(&arrays).unwrap();
    let objects_md = to_markdown(&objects).unwrap();

    assert_eq!(arrays_md, "# ScalarArrays\n\n## Names\n\n## Indexes\n\n## Ids");
    assert_eq!(objects_md, "# WithArray");
    assert_eq!(from_markdown::<ScalarArrays>(&arrays_md).unwrap(), arrays);
    assert_eq!(from_markdown::<WithArray>(&objects_md).unwrap(), objects);
}

#[test]
fn deeper_nesting_increments_levels() {
    let value = Outer {
        label: "outer".to_string(),
        inner: WithNested {
            id: 1,
            name: "middle".to_string(),
            is_some_flag: false,
            nested: custom(2, "inner", true),
        },
    };

    let markdown = to_markdown(&value).unwrap();

    assert_eq!(
        markdown,
        "# Outer\n\
         - Label: outer\n\
         \n\
         ## Inner\n\
         - Id: 1\n\
         - Name: middle\n\
         - IsSomeFlag: False\n\
         \n\
         ### Nested\n\
         - Id: 2\n\
         - Name: inner\n\
         - IsSomeFlag: True"
    );
    assert_eq!(from_markdown::<Outer>(&markdown).unwrap(), value);
}

#[test]
fn values_with_colons_and_edge_whitespace_round_trip() {
    let value = WithArray {
        items: vec![custom(0, "key: value: more", true), custom(-1, "  padded  ", false)],
    };

    let markdown = to_markdown(&value).unwrap();

    assert_eq!(from_markdown::<WithArray>(&markdown).unwrap(), value);
}

#[test]
fn parser_tolerates_trailing_newlines_and_extra_blank_lines() {
    let text = "# WithNested\n- Id: 1\n- Name: n\n- IsSomeFlag: True\n\n\n## Nested\n- Id: 2\n- Name: m\n- IsSomeFlag: False\n\n";

    let parsed = from_markdown::<WithNested>(text).unwrap();

    assert_eq!(parsed.nested, custom(2, "m", false));
}

#[test]
fn bare_key_with_colon_is_an_empty_value() {
    let parsed = from_markdown::<CustomObj>("# CustomObj\n- Id: 1\n- Name:\n- IsSomeFlag: False").unwrap();

    assert_eq!(parsed.name, "");
}

#[rstest]
#[case::scalar_only(to_markdown(&custom(5, "five", false)).unwrap())]
#[case::arrays(to_markdown(&ScalarArrays { names: vec!["a".into()], indexes: vec![3], ids: vec![] }).unwrap())]
#[case::headers(to_markdown(&Plan { steps: vec![Step { name: "s".into(), order: 9 }], items: vec![] }).unwrap())]
fn reserialization_is_byte_identical(#[case] markdown: String) {
    let again = if markdown.starts_with("# CustomObj") {
        to_markdown(&from_markdown::<CustomObj>(&markdown).unwrap()).unwrap()
    } else if markdown.starts_with("# ScalarArrays") {
        to_markdown(&from_markdown::<ScalarArrays>(&markdown).unwrap()).unwrap()
    } else {
        to_markdown(&from_markdown::<Plan>(&markdown).unwrap()).unwrap()
    };

    assert_eq!(again, markdown);
}

#[test]
fn codec_is_usable_from_many_threads() {
    let value = Plan {
        steps: (0..20)
            .map(|order| Step {
                name: format!("step {order}"),
                order,
            })
            .collect(),
        items: vec![custom(1, "one", true)],
    };
    let expected = to_markdown(&value).unwrap();

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                let markdown = to_markdown(&value).unwrap();
                assert_eq!(markdown, expected);
                assert_eq!(from_markdown::<Plan>(&markdown).unwrap(), value);
            });
        }
    });
}
