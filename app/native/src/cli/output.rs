//! CLI output formatting utilities.
//!
//! Tables are built with `tabled` in the command modules; this module holds
//! the shared cell formatters and the colored JSON printer used by `--json`.

use std::fmt::Write as _;

use colored::Colorize;
use serde_json::Value;

const INDENT: &str = "  ";

/// Prints JSON with syntax highlighting.
///
/// Colors:
/// - Keys: Cyan
/// - Strings: Green
/// - Numbers: Yellow
/// - Booleans/Null: Magenta
pub fn print_highlighted_json(value: &Value) { println!("{}", render_json(value)); }

/// Renders a JSON value as pretty-printed, colored text.
#[must_use]
pub fn render_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0);
    out
}

fn write_value(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::Null => {
            let _ = write!(out, "{}", "null".magenta());
        }
        Value::Bool(b) => {
            let _ = write!(out, "{}", b.to_string().magenta());
        }
        Value::Number(n) => {
            let _ = write!(out, "{}", n.to_string().yellow());
        }
        Value::String(s) => {
            let _ = write!(out, "{}", quote(s).green());
        }
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                out.push_str(if i == 0 { "\n" } else { ",\n" });
                out.push_str(&INDENT.repeat(depth + 1));
                write_value(out, item, depth + 1);
            }
            out.push('\n');
            out.push_str(&INDENT.repeat(depth));
            out.push(']');
        }
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                out.push_str(if i == 0 { "\n" } else { ",\n" });
                out.push_str(&INDENT.repeat(depth + 1));
                let _ = write!(out, "{}: ", quote(key).cyan());
                write_value(out, item, depth + 1);
            }
            out.push('\n');
            out.push_str(&INDENT.repeat(depth));
            out.push('}');
        }
    }
}

fn quote(s: &str) -> String { Value::String(s.to_owned()).to_string() }

/// Truncates a string to a maximum number of characters, adding ellipsis if needed.
///
/// Counts characters, not bytes.
#[must_use]
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars <= 1 {
        return "…".to_string();
    }

    let mut kept: String = s.chars().take(max_chars - 1).collect();
    kept.push('…');
    kept
}

/// Formats a boolean as a colored check or cross.
#[must_use]
pub fn format_bool(value: bool) -> String {
    if value { "✓".green().to_string() } else { "✗".red().to_string() }
}
