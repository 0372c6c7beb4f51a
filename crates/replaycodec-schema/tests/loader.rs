//! Integration tests for the schema loader.

use replaycodec_schema::{load, transcode, Rendering, SchemaDocument, SchemaError};
use serde_json::json;

// =========================================================================
// Fixture
// =========================================================================

const FIXTURE: &str = r##"# Fixture protocol module.
# -*- coding: utf-8 -*-

typeinfos = [
    ('_int',[(0,7)]),  #0
    ('_blob',[(0,8)]),  #1
    ('_struct',[[('m_name',1,0),('m_id',0,1),]]),  #2
    ('_choice',[(0,2),{0:('m_small',0),1:('m_text',1)}]),  #3
]

# Event catalog
tracker_event_types = {
    0: (2, 'NNet.Replay.Tracker.SPlayerStatsEvent'),
    1: (3, "NNet.Replay.Tracker.SUnitBornEvent"),
}

quotes = ['it\'s', "say \"hi\"", 'back\\slash', "#not a comment"]
negative = -15
mixed = {'list': [1, [2, (3,)]], 'empty': [], 'tuple': ()}
replay_header_typeid = 2
"##;

fn reference() -> serde_json::Value {
    json!({
        "typeinfos": [
            ["_int", [[0, 7]]],
            ["_blob", [[0, 8]]],
            ["_struct", [[["m_name", 1, 0], ["m_id", 0, 1]]]],
            ["_choice", [[0, 2], {"0": ["m_small", 0], "1": ["m_text", 1]}]],
        ],
        "tracker_event_types": {
            "0": [2, "NNet.Replay.Tracker.SPlayerStatsEvent"],
            "1": [3, "NNet.Replay.Tracker.SUnitBornEvent"],
        },
        "quotes": ["it's", "say \"hi\"", "back\\slash", "#not a comment"],
        "negative": -15,
        "mixed": {"list": [1, [2, [3]]], "empty": [], "tuple": []},
        "replay_header_typeid": 2,
    })
}

// =========================================================================
// Round trip against a hand-built tree
// =========================================================================

#[test]
fn test_fixture_matches_reference_tree() {
    let doc = load(FIXTURE).unwrap();
    assert_eq!(doc.into_value(), reference());
}

#[test]
fn test_pretty_and_minified_parse_identically() {
    let minified = transcode(FIXTURE, Rendering::Minified).unwrap();
    let pretty = transcode(FIXTURE, Rendering::Pretty).unwrap();
    assert!(pretty.len() > minified.len());
    assert!(pretty.starts_with("{\n"));
    assert!(pretty.ends_with("\n}"));

    let a: serde_json::Value = serde_json::from_str(&minified).unwrap();
    let b: serde_json::Value = serde_json::from_str(&pretty).unwrap();
    assert_eq!(a, b);
}

// =========================================================================
// Idempotence through a generic serializer
// =========================================================================

#[test]
fn test_reloading_serialized_tree_is_idempotent() {
    let first = load(FIXTURE).unwrap();

    // Re-render each binding as `name = <json>`; JSON values are valid
    // literal syntax for the loader.
    let rendered: String = first
        .iter()
        .map(|(name, value)| format!("{name} = {}\n", serde_json::to_string(value).unwrap()))
        .collect();

    let second = load(&rendered).unwrap();
    assert_eq!(first, second);
}

// =========================================================================
// Error cases
// =========================================================================

#[test]
fn test_mismatched_nesting_is_rejected() {
    let err = load("typeinfos = [('_int', [(0, 7])]").unwrap_err();
    assert!(matches!(err, SchemaError::Mismatched { .. }));
    assert!(err.to_string().contains("syntax error"));
}

#[test]
fn test_unbalanced_source_is_rejected() {
    assert!(matches!(
        load("typeinfos = [").unwrap_err(),
        SchemaError::Unclosed(1)
    ));
}

#[test]
fn test_function_definitions_are_rejected() {
    let err = SchemaDocument::load("def decode(contents):\n    return 1\n").unwrap_err();
    assert!(matches!(err, SchemaError::Parse(_)));
}
