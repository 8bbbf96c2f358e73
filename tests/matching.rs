//! End-to-end matching behavior over the public API

use rstest::rstest;
use serde_json::json;
use twilight::twilight::{Action, NoMatchReason, SpacePolicy, Value, ValueKind};
use twilight::{Element, MatchRule, Twilight};

fn pair(space: SpacePolicy) -> Twilight {
    Twilight::new(vec![
        MatchRule::literal("A").space(space),
        MatchRule::literal("B"),
    ])
    .unwrap()
}

#[rstest]
#[case(SpacePolicy::Force, "A B", true)]
#[case(SpacePolicy::Force, "AB", false)]
#[case(SpacePolicy::NoSpace, "AB", true)]
#[case(SpacePolicy::NoSpace, "A B", false)]
#[case(SpacePolicy::Preserve, "AB", true)]
#[case(SpacePolicy::Preserve, "A B", true)]
#[case(SpacePolicy::Preserve, "A   B", true)]
fn test_space_policy(#[case] space: SpacePolicy, #[case] input: &str, #[case] expected: bool) {
    assert_eq!(pair(space).evaluate_str(input).is_match(), expected);
}

#[rstest]
#[case(SpacePolicy::Force, ".cmd", true)]
#[case(SpacePolicy::Force, ".cmd 1", true)]
#[case(SpacePolicy::Force, ".cmd1", false)]
#[case(SpacePolicy::NoSpace, ".cmd", true)]
#[case(SpacePolicy::NoSpace, ".cmd1", true)]
#[case(SpacePolicy::Preserve, ".cmd", true)]
#[case(SpacePolicy::Preserve, ".cmd 1", true)]
fn test_separator_before_absent_optional(
    #[case] space: SpacePolicy,
    #[case] input: &str,
    #[case] expected: bool,
) {
    let twilight = Twilight::new(vec![
        MatchRule::literal(".cmd").space(space),
        MatchRule::param("n").optional(),
    ])
    .unwrap();
    assert_eq!(twilight.evaluate_str(input).is_match(), expected);
}

#[rstest]
#[case("go home", Some("go"))]
#[case("home", None)]
fn test_leading_optional_rule(#[case] input: &str, #[case] verb: Option<&str>) {
    let twilight = Twilight::new(vec![
        MatchRule::literal("go").named("verb").space(SpacePolicy::Force).optional(),
        MatchRule::param("where"),
    ])
    .unwrap();
    let outcome = twilight.evaluate_str(input);
    let sparkle = outcome.sparkle().unwrap();
    assert_eq!(sparkle.value("verb").and_then(Value::as_str), verb);
    assert_eq!(sparkle.value("where").and_then(Value::as_str), Some("home"));
}

#[test]
fn test_trailing_whitespace_is_tolerated_but_leading_is_not() {
    let twilight = pair(SpacePolicy::Force);
    assert!(twilight.evaluate_str("A B  ").is_match());
    assert!(!twilight.evaluate_str(" A B").is_match());
}

#[rstest]
#[case("abc", "abc")]
#[case("ab", "ab")]
#[case("a", "a")]
fn test_union_prefers_longest_alternative(#[case] input: &str, #[case] expected: &str) {
    let twilight =
        Twilight::new(vec![MatchRule::union(["a", "ab", "abc"]).named("u")]).unwrap();
    let outcome = twilight.evaluate_str(input);
    let sparkle = outcome.sparkle().unwrap();
    assert_eq!(sparkle.value("u").and_then(Value::as_str), Some(expected));
}

#[test]
fn test_optional_param_absent_and_present() {
    let twilight = Twilight::new(vec![
        MatchRule::literal(".cmd"),
        MatchRule::param("n").optional(),
    ])
    .unwrap();

    let outcome = twilight.evaluate_str(".cmd");
    let sparkle = outcome.sparkle().unwrap();
    assert!(sparkle.contains("n"));
    assert!(!sparkle["n"].matched);

    let outcome = twilight.evaluate_str(".cmd 42");
    let sparkle = outcome.sparkle().unwrap();
    assert!(sparkle["n"].matched);
    assert_eq!(sparkle.value("n").and_then(Value::as_str), Some("42"));
}

#[test]
fn test_opaque_element_keeps_identity() {
    let at = Element::opaque("At", json!({"user": 42}));
    let twilight = Twilight::new(vec![
        MatchRule::literal(".ban"),
        MatchRule::element("At").named("target"),
        MatchRule::wildcard().named("reason"),
    ])
    .unwrap();
    let message = vec![Element::text(".ban "), at.clone(), Element::text(" too loud")];
    let outcome = twilight.evaluate(&message);
    let sparkle = outcome.sparkle().unwrap();
    let target = sparkle.value("target").and_then(Value::as_element).unwrap();
    assert!(target.same_identity(&at));
    assert_eq!(sparkle.value("reason").and_then(Value::as_str), Some("too loud"));
}

#[test]
fn test_text_cannot_forge_a_placeholder() {
    let twilight = Twilight::new(vec![
        MatchRule::element("At").named("target"),
    ])
    .unwrap();
    assert!(!twilight.evaluate_str("\u{2}0_At\u{3}").is_match());
}

#[test]
fn test_flag_defaults_when_absent() {
    let twilight = Twilight::new(vec![
        MatchRule::literal(".roll"),
        MatchRule::option(["--times", "-t"])
            .value_kind(ValueKind::Int)
            .default(1),
        MatchRule::option(["--secret", "-s"]).action(Action::StoreTrue),
    ])
    .unwrap();

    let outcome = twilight.evaluate_str(".roll");
    let sparkle = outcome.sparkle().unwrap();
    assert!(!sparkle["times"].matched);
    assert_eq!(sparkle.value("times"), Some(&Value::Int(1)));
    assert_eq!(sparkle.value("secret"), Some(&Value::Bool(false)));

    let outcome = twilight.evaluate_str(".roll --times=3 -s");
    let sparkle = outcome.sparkle().unwrap();
    assert!(sparkle["times"].matched);
    assert_eq!(sparkle.value("times"), Some(&Value::Int(3)));
    assert_eq!(sparkle.value("secret"), Some(&Value::Bool(true)));
}

#[rstest]
#[case(".roll --times x")]
#[case(".roll --times")]
#[case(".roll --unknown 1")]
#[case(".other --times 1")]
fn test_failures_expose_nothing(#[case] input: &str) {
    let twilight = Twilight::new(vec![
        MatchRule::literal(".roll"),
        MatchRule::option(["--times"]).value_kind(ValueKind::Int),
    ])
    .unwrap();
    let outcome = twilight.evaluate_str(input);
    assert!(outcome.sparkle().is_none());
    assert!(outcome.reason().is_some());
}

#[test]
fn test_unknown_flag_reason() {
    let twilight = Twilight::new(vec![
        MatchRule::literal("go"),
        MatchRule::param("where"),
        MatchRule::option(["--fast"]).action(Action::StoreTrue),
    ])
    .unwrap();
    let outcome = twilight.evaluate_str("go home --fast --slow");
    assert!(matches!(outcome.reason(), Some(NoMatchReason::UnknownFlag(_))));
}

#[test]
fn test_lazy_wildcard_leaves_flags_to_the_parser() {
    let twilight = Twilight::new(vec![
        MatchRule::literal("say"),
        MatchRule::wildcard().named("text"),
        MatchRule::option(["--loud"]).action(Action::StoreTrue),
    ])
    .unwrap();
    let outcome = twilight.evaluate_str("say hi there --loud");
    let sparkle = outcome.sparkle().unwrap();
    assert_eq!(sparkle.value("text").and_then(Value::as_str), Some("hi there"));
    assert_eq!(sparkle.value("loud"), Some(&Value::Bool(true)));
}

#[test]
fn test_greedy_wildcard_absorbs_flags() {
    let twilight = Twilight::new(vec![
        MatchRule::literal("say"),
        MatchRule::wildcard().greedy().named("text"),
        MatchRule::option(["--loud"]).action(Action::StoreTrue),
    ])
    .unwrap();
    let outcome = twilight.evaluate_str("say hi there --loud");
    let sparkle = outcome.sparkle().unwrap();
    assert_eq!(
        sparkle.value("text").and_then(Value::as_str),
        Some("hi there --loud")
    );
    assert!(!sparkle["loud"].matched);
    assert_eq!(sparkle.value("loud"), Some(&Value::Bool(false)));
}

#[test]
fn test_sparkle_serializes_to_json() {
    let twilight = Twilight::new(vec![
        MatchRule::literal(".cmd"),
        MatchRule::param("n"),
        MatchRule::option(["-v"]).action(Action::Count),
    ])
    .unwrap();
    let outcome = twilight.evaluate_str(".cmd 7 -v -v");
    let json = serde_json::to_value(outcome.sparkle().unwrap()).unwrap();
    assert_eq!(json["n"]["kind"], "regex");
    assert_eq!(json["n"]["matched"], true);
    assert_eq!(json["v"]["kind"], "arg");
    assert_eq!(json["v"]["result"], 2);
}
