//! Discover which fields the solver reports residuals for.

use std::sync::LazyLock;

use regex::Regex;

use super::types::FieldSet;

static SOLVING_FOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Solving for (\S+),").expect("valid regex"));

/// Prefix of the line that opens every solver step.
pub const TIME_MARKER: &str = "Time = ";

/// Collect the field names solved for in the first solver step.
///
/// Scanning starts at the first line beginning with `Time = ` and stops at the
/// second one. A log without any such line is scanned as a single block.
pub fn detect_fields(content: &str) -> FieldSet {
    let has_marker = content.lines().any(|line| line.starts_with(TIME_MARKER));

    let mut fields = Vec::new();
    let mut in_step = !has_marker;
    for line in content.lines() {
        if line.starts_with(TIME_MARKER) {
            if in_step && has_marker {
                break;
            }
            in_step = true;
        }
        if !in_step {
            continue;
        }
        if let Some(caps) = SOLVING_FOR.captures(line) {
            fields.push(caps[1].to_string());
        }
    }

    let fields: FieldSet = fields.into_iter().collect();
    log::debug!("Detected {} field(s): {:?}", fields.len(), fields.iter().map(|f| f.as_str()).collect::<Vec<_>>());
    fields
}
