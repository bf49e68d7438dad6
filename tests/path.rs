//! Tests for path expression parsing and resolution.
use serde_json::{Value, json};
use variableizer::error::{PathSyntaxError, ResolveError};
use variableizer::path::{FanOut, Location, PathExpr, Segment, Step, get, get_mut, resolve};

fn lit(key: &str) -> Segment {
    Segment::Literal(key.to_string())
}

fn node() -> Value {
    json!({
        "Identifier": "p1",
        "Parameters": {
            "Prompts": ["Welcome", "Press 1", { "Ssml": "<speak>Hi</speak>" }, "Goodbye"],
            "Attributes": { "Zeta": "z", "Alpha": "a", "Mid": "m" },
            "CallerId": { "Number": "+15551234567" }
        }
    })
}

#[test]
fn test_parse_dotted_path() {
    let path = PathExpr::parse("Parameters.CallerId.Number").unwrap();
    assert_eq!(
        path.segments(),
        &[lit("Parameters"), lit("CallerId"), lit("Number")]
    );
    assert!(!path.has_fan_out());
    assert_eq!(path.to_string(), "Parameters.CallerId.Number");
}

#[test]
fn test_parse_fan_out_and_indices() {
    let each = PathExpr::parse("Parameters.Prompts[]").unwrap();
    assert_eq!(
        each.segments(),
        &[lit("Parameters"), lit("Prompts"), Segment::EachElement]
    );
    assert!(each.has_fan_out());

    let wildcard = PathExpr::parse("Parameters.Attributes.*").unwrap();
    assert_eq!(wildcard.segments()[2], Segment::Wildcard);

    let bracket_wildcard = PathExpr::parse("Parameters.Attributes[*]").unwrap();
    assert_eq!(bracket_wildcard.segments()[2], Segment::Wildcard);

    let indexed = PathExpr::parse("Parameters.Prompts[2].Ssml").unwrap();
    assert_eq!(
        indexed.segments(),
        &[lit("Parameters"), lit("Prompts"), lit("2"), lit("Ssml")]
    );

    let nested = PathExpr::parse("Rows[][]").unwrap();
    assert_eq!(
        nested.segments(),
        &[lit("Rows"), Segment::EachElement, Segment::EachElement]
    );
}

#[test]
fn test_parse_errors() {
    assert_eq!(PathExpr::parse("  "), Err(PathSyntaxError::Empty));
    assert!(matches!(
        PathExpr::parse("a..b"),
        Err(PathSyntaxError::EmptySegment { position: 1, .. })
    ));
    assert!(matches!(
        PathExpr::parse(".a"),
        Err(PathSyntaxError::EmptySegment { position: 0, .. })
    ));
    assert!(matches!(
        PathExpr::parse("a."),
        Err(PathSyntaxError::EmptySegment { .. })
    ));
    assert!(matches!(
        PathExpr::parse("a[1"),
        Err(PathSyntaxError::UnclosedBracket { .. })
    ));
    assert!(matches!(
        PathExpr::parse("a[x]"),
        Err(PathSyntaxError::InvalidIndex { .. })
    ));
    assert!(matches!(
        PathExpr::parse("a[1]b"),
        Err(PathSyntaxError::TrailingCharacters { found: 'b', .. })
    ));
}

#[test]
fn test_resolve_literal_path() {
    let root = node();
    let path = PathExpr::parse("Parameters.CallerId.Number").unwrap();
    let locations = resolve(&root, &path).unwrap();

    assert_eq!(locations.len(), 1);
    assert!(locations[0].fan_out.is_empty());
    assert_eq!(locations[0].to_string(), "Parameters.CallerId.Number");
    assert_eq!(get(&root, &locations[0]), Some(&json!("+15551234567")));
}

#[test]
fn test_resolve_missing_key_yields_nothing() {
    let root = node();
    let path = PathExpr::parse("Parameters.Missing.Number").unwrap();
    assert_eq!(resolve(&root, &path), Ok(Vec::new()));

    let out_of_range = PathExpr::parse("Parameters.Prompts[9]").unwrap();
    assert_eq!(resolve(&root, &out_of_range), Ok(Vec::new()));
}

#[test]
fn test_resolve_numeric_literal_into_sequence() {
    let root = node();
    for text in ["Parameters.Prompts.1", "Parameters.Prompts[1]"] {
        let locations = resolve(&root, &PathExpr::parse(text).unwrap()).unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].steps.last(), Some(&Step::Index(1)));
        assert_eq!(get(&root, &locations[0]), Some(&json!("Press 1")));
    }
}

#[test]
fn test_resolve_each_element_preserves_order() {
    let root = node();
    let path = PathExpr::parse("Parameters.Prompts[]").unwrap();
    let locations = resolve(&root, &path).unwrap();

    assert_eq!(locations.len(), 4);
    let positions: Vec<_> = locations.iter().map(|l| l.fan_out.clone()).collect();
    assert_eq!(
        positions,
        (0..4).map(|i| vec![FanOut::Position(i)]).collect::<Vec<_>>()
    );
    assert_eq!(locations[3].to_string(), "Parameters.Prompts[3]");
}

#[test]
fn test_resolve_wildcard_follows_document_order() {
    let root = node();
    let path = PathExpr::parse("Parameters.Attributes.*").unwrap();
    let first = resolve(&root, &path).unwrap();
    let second = resolve(&root, &path).unwrap();

    let keys: Vec<_> = first
        .iter()
        .map(|l| match l.fan_out.as_slice() {
            [FanOut::Key(key)] => key.clone(),
            other => panic!("unexpected fan-out {:?}", other),
        })
        .collect();
    assert_eq!(keys, vec!["Zeta", "Alpha", "Mid"]);
    assert_eq!(first, second);
}

#[test]
fn test_resolve_scalar_descent_is_an_error() {
    let root = node();
    let path = PathExpr::parse("Parameters.CallerId.Number.Digits").unwrap();
    assert_eq!(
        resolve(&root, &path),
        Err(ResolveError::NotAContainer {
            position: 3,
            segment: "Digits".to_string(),
            found: "a string",
        })
    );
}

#[test]
fn test_resolve_scalar_below_fan_out_is_skipped() {
    let root = node();
    let path = PathExpr::parse("Parameters.Prompts[].Ssml").unwrap();
    let locations = resolve(&root, &path).unwrap();

    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0].to_string(), "Parameters.Prompts[2].Ssml");
    assert_eq!(locations[0].fan_out, vec![FanOut::Position(2)]);
}

#[test]
fn test_get_mut_writes_through_location() {
    let mut root = node();
    let path = PathExpr::parse("Parameters.Prompts[]").unwrap();
    let locations = resolve(&root, &path).unwrap();

    *get_mut(&mut root, &locations[0]).unwrap() = json!("${replaced}");
    assert_eq!(root["Parameters"]["Prompts"][0], "${replaced}");

    let stale = Location {
        steps: vec![Step::Key("Nope".to_string())],
        fan_out: Vec::new(),
    };
    assert!(get_mut(&mut root, &stale).is_none());
    assert_eq!(Location::root().to_string(), "<root>");
}
