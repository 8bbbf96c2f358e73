//! Command-line interface for twilight
//! Loads rule files, then evaluates each message against them and prints the outcome as JSON.
//!
//! Usage:
//!   twilight --rules `<file>` [--rules `<file>`...] [MESSAGE]...   - Evaluate messages (stdin when none)
//!   twilight --rules `<file>` --usage                            - Print usage and help for the rules
//!
//! Opaque elements are written inline as `[kind]` or `[kind:payload]`; the payload is
//! read as JSON when it parses, otherwise as a string.

use clap::{Arg, ArgAction, Command};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{self, BufRead};
use tracing_subscriber::EnvFilter;
use twilight::twilight::config::Loader;
use twilight::{Element, Outcome, Twilight};

static INLINE_ELEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([A-Za-z][A-Za-z0-9_]*)(?::([^\]]*))?\]").expect("inline element pattern")
});

fn main() {
    init_logging();

    let matches = Command::new("twilight")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Match messages against a twilight rule list")
        .arg(
            Arg::new("rules")
                .long("rules")
                .short('r')
                .help("Rule file (TOML, JSON or YAML); later files override earlier ones")
                .action(ArgAction::Append)
                .required(true),
        )
        .arg(
            Arg::new("usage")
                .long("usage")
                .help("Print usage and help text for the rules, then exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("pretty")
                .long("pretty")
                .short('p')
                .help("Pretty-print JSON output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("message")
                .help("Messages to evaluate; read from stdin, one per line, when omitted")
                .num_args(0..)
                .index(1),
        )
        .get_matches();

    let mut loader = Loader::new();
    for path in matches.get_many::<String>("rules").into_iter().flatten() {
        loader = loader.with_file(path);
    }
    let twilight = match loader.build() {
        Ok(twilight) => twilight,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    if matches.get_flag("usage") {
        println!("{}", twilight.help());
        return;
    }

    let pretty = matches.get_flag("pretty");
    let mut any_matched = false;
    let messages: Vec<String> = match matches.get_many::<String>("message") {
        Some(values) => values.cloned().collect(),
        None => match io::stdin().lock().lines().collect::<Result<_, _>>() {
            Ok(lines) => lines,
            Err(e) => {
                eprintln!("Error reading stdin: {}", e);
                std::process::exit(2);
            }
        },
    };

    for message in &messages {
        any_matched |= handle_message(&twilight, message, pretty);
    }

    if !any_matched {
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Evaluate one line and print its outcome. Returns whether it matched.
fn handle_message(twilight: &Twilight, line: &str, pretty: bool) -> bool {
    let elements = parse_message(line);
    let outcome = twilight.evaluate(&elements);
    let report = match &outcome {
        Outcome::Matched(sparkle) => serde_json::json!({ "matched": true, "results": sparkle }),
        Outcome::NoMatch(reason) => {
            serde_json::json!({ "matched": false, "reason": reason.to_string() })
        }
    };
    let printed = if pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    };
    match printed {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: {}", e),
    }
    outcome.is_match()
}

/// Split a line into text runs and inline `[kind:payload]` elements.
fn parse_message(line: &str) -> Vec<Element> {
    let mut elements = Vec::new();
    let mut last = 0;
    for caps in INLINE_ELEMENT.captures_iter(line) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            elements.push(Element::text(&line[last..whole.start()]));
        }
        let kind = &caps[1];
        let payload = match caps.get(2) {
            Some(raw) => serde_json::from_str(raw.as_str())
                .unwrap_or_else(|_| serde_json::Value::String(raw.as_str().to_string())),
            None => serde_json::Value::Null,
        };
        elements.push(Element::opaque(kind, payload));
        last = whole.end();
    }
    if last < line.len() {
        elements.push(Element::text(&line[last..]));
    }
    elements
}
