//! Usage and help rendering

use twilight::twilight::{Action, ValueKind};
use twilight::{MatchRule, Twilight};

fn roll() -> Twilight {
    Twilight::new(vec![
        MatchRule::literal(".roll"),
        MatchRule::param("dice").help("Dice expression, e.g. 2d6"),
        MatchRule::option(["-s", "--secret"])
            .action(Action::StoreTrue)
            .help("Roll privately"),
        MatchRule::option(["--times"])
            .value_kind(ValueKind::Int)
            .default(1)
            .help("Repeat the roll"),
    ])
    .unwrap()
}

#[test]
fn test_usage_line() {
    insta::assert_snapshot!(roll().usage(), @"usage: .roll <dice> [-s] [--times TIMES]");
}

#[test]
fn test_help_aligns_rule_help() {
    insta::assert_snapshot!(roll().help(), @r"
usage: .roll <dice> [-s] [--times TIMES]
  <dice>         Dice expression, e.g. 2d6
  -s, --secret   Roll privately
  --times TIMES  Repeat the roll
");
}

#[test]
fn test_usage_shows_choices_and_optionals() {
    let twilight = Twilight::new(vec![
        MatchRule::literal(".mode"),
        MatchRule::union(["on", "off"]).optional(),
        MatchRule::option(["--level"])
            .value_kind(ValueKind::Int)
            .choices([1, 2, 3])
            .required(),
    ])
    .unwrap();
    insta::assert_snapshot!(twilight.usage(), @"usage: .mode [{on|off}] --level {1,2,3}");
}
