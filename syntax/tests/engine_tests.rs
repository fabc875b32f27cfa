//! End-to-end tests: declared manuals through expansion, matching, checking
//! and rendering.

use std::collections::HashSet;

use command_manual_core::{Classification, CommandManual, SubcommandManual, classify};
use command_manual_syntax::*;
use serde_json::json;

fn declared(value: serde_json::Value) -> CommandManual {
    match classify(&value) {
        Classification::Invalid(err) => panic!("invalid manual: {err}"),
        other => other.into_manual().unwrap(),
    }
}

fn proof() -> CommandManual {
    declared(json!({
        "name": "proof",
        "description": "Manage jump proofs.",
        "subcommands": [
            {
                "name": "get",
                "syntax": "::<prefix>proof get:: NAME $1{opt $2}[ USER $2]",
                "arguments": [
                    {"name": "jump name", "id": "name", "optional": false},
                    {"name": "user ID", "id": "user", "optional": true,
                     "further_constraint": {"type": "snowflake"}, "base_type": "USER"}
                ],
                "description": "Retrieves the link to a proof."
            },
            {
                "name": "set",
                "syntax": "::<prefix>proof set:: NAME $1 LINK $2{opt $3}[ NOTE $3]",
                "arguments": [
                    {"name": "jump name", "id": "name", "optional": false},
                    {"name": "link", "id": "link", "optional": false,
                     "further_constraint": {"type": "link", "domains": ["youtube.com", "youtu.be"]}},
                    {"name": "note", "id": "note", "optional": true,
                     "further_constraint": {"type": "text", "max_length": 20}}
                ],
                "description": "Attaches proof to one of your jumps."
            }
        ]
    }))
}

fn subcommands(manual: &CommandManual) -> Vec<&SubcommandManual> {
    manual.syntaxes()
}

#[test]
fn test_every_expansion_round_trips_through_the_matcher() {
    let manual = proof();
    for prefix in ["%", "!!", "bot "] {
        for sub in subcommands(&manual) {
            let matcher = SyntaxMatcher::compile(sub, prefix).unwrap();
            let syntaxes = expand(sub, &sub.syntax, prefix).unwrap();
            let optionals = sub.optional_indices().len();
            assert_eq!(syntaxes.len(), 1 << optionals);
            assert_eq!(syntaxes.iter().collect::<HashSet<_>>().len(), syntaxes.len());
            for syntax in &syntaxes {
                assert!(matcher.is_call(syntax), "{prefix:?}: {syntax} did not match");
            }

            let compact = sub.clone().compact();
            let syntaxes = expand(&compact, &compact.syntax, prefix).unwrap();
            assert_eq!(syntaxes.len(), 1);
            assert_eq!(syntaxes[0].matches("(optional:").count(), optionals);
            let matcher = SyntaxMatcher::compile(&compact, prefix).unwrap();
            assert!(matcher.is_call(&syntaxes[0]), "{prefix:?}: {} did not match", syntaxes[0]);
        }
    }
}

#[test]
fn test_bare_optional_argument_is_rejected_everywhere() {
    let manual = declared(json!({
        "name": "list",
        "syntax": "<prefix>tj list $1",
        "arguments": [{"name": "source", "id": "source", "optional": true}],
        "description": "Lists jumps."
    }));

    let issues = lint_manual(&manual);
    assert_eq!(issues.len(), 1);
    assert!(issues[0].to_string().contains("has no `{opt $1}` fragment"));

    let CommandManual::Simple(sub) = &manual else {
        panic!("expected a simple manual");
    };
    assert!(SyntaxMatcher::compile(sub, "%").is_err());
}

#[test]
fn test_message_flows_to_validated_arguments() {
    let CommandManual::Multifaceted(manual) = proof() else {
        panic!("expected multifaceted");
    };

    let SubcommandMatch::Matched {
        subcommand,
        arguments,
    } = first_matching_subcommand(
        &manual,
        "%",
        "%proof set name Moon Jump link https://www.youtube.com/watch?v=abc note first try",
    )
    else {
        panic!("expected a subcommand match");
    };
    assert_eq!(subcommand.name, "set");

    let validated = check(subcommand, &arguments).unwrap();
    assert_eq!(validated.text("name"), Some("Moon Jump"));
    assert_eq!(
        validated.text("link"),
        Some("https://www.youtube.com/watch?v=abc")
    );
    assert_eq!(validated.text("note"), Some("first try"));
}

#[test]
fn test_bad_values_produce_user_facing_reasons() {
    let CommandManual::Multifaceted(manual) = proof() else {
        panic!("expected multifaceted");
    };

    let SubcommandMatch::Matched {
        subcommand,
        arguments,
    } = first_matching_subcommand(&manual, "%", "%proof get NAME Moon USER someone")
    else {
        panic!("expected a subcommand match");
    };

    let failure = check(subcommand, &arguments).unwrap_err();
    assert_eq!(failure.information.len(), 1);
    assert!(failure.information[0].starts_with("argument \"user ID\""));
    assert!(failure.information[0].contains("someone"));
}

#[test]
fn test_attempted_subcommand_is_reported() {
    let CommandManual::Multifaceted(manual) = proof() else {
        panic!("expected multifaceted");
    };

    let SubcommandMatch::NoMatch { attempted, broken } =
        first_matching_subcommand(&manual, "%", "%proof set NAME Moon")
    else {
        panic!("expected no match");
    };
    assert_eq!(attempted.map(|s| s.name.as_str()), Some("set"));
    assert!(broken.is_empty());
    assert_eq!(determination_tag(attempted.unwrap(), "%").unwrap(), "%proof set");
}

#[test]
fn test_rendered_manual_lists_all_variants() {
    let text = render(&proof(), "%");
    assert!(text.starts_with("proof <get/set>\n    Description: Manage jump proofs.\n\n"));
    assert!(text.contains("        1. %proof get NAME <jump name>\n"));
    assert!(text.contains("        2. %proof get NAME <jump name> USER <user ID>\n"));
    assert!(text.contains("        2. %proof set NAME <jump name> LINK <link> NOTE <note>\n"));
    assert!(lint_manual(&proof()).is_empty());
}
