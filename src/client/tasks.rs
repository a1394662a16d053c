//! Task-extraction heuristic.
//!
//! Best-effort, single-shot classifier: a leading verb from a fixed closed
//! set followed by whitespace marks the remainder as a task label. No
//! negation handling and no removal semantics; a non-match is a normal
//! outcome.

use std::sync::OnceLock;

use regex::Regex;

fn task_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:add|remember|do|create|go|get)\s(.+)$").expect("valid regex")
    })
}

/// Extract a candidate task from free text.
///
/// The input is lower-cased before matching, so the returned label is
/// lower-case regardless of the input's casing.
#[must_use]
pub fn extract_task(input: &str) -> Option<String> {
    let lowered = input.to_lowercase();
    let captures = task_pattern().captures(&lowered)?;
    let task = captures.get(1)?.as_str().trim();

    if task.is_empty() {
        None
    } else {
        Some(task.to_string())
    }
}

/// Record an extracted task into the list.
///
/// Appends when the extracted label is non-empty and not already present
/// (case-sensitive exact match). Returns whether the list changed.
pub fn record_task(tasks: &mut Vec<String>, input: &str) -> bool {
    match extract_task(input) {
        Some(task) if !tasks.contains(&task) => {
            tasks.push(task);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_verb_captures_remainder() {
        assert_eq!(extract_task("add buy milk"), Some("buy milk".to_string()));
        assert_eq!(extract_task("remember call bob"), Some("call bob".to_string()));
        assert_eq!(extract_task("go to the gym"), Some("to the gym".to_string()));
    }

    #[test]
    fn extraction_lower_cases_the_label() {
        // Matching runs on the lower-cased text, so the label comes out
        // lower-case even for shouted input.
        assert_eq!(extract_task("ADD Buy Milk"), Some("buy milk".to_string()));
    }

    #[test]
    fn non_matching_text_yields_nothing() {
        assert_eq!(extract_task("hello there"), None);
        assert_eq!(extract_task("what are my tasks?"), None);
        // Verb must lead the text
        assert_eq!(extract_task("please add buy milk"), None);
    }

    #[test]
    fn whitespace_only_remainder_yields_nothing() {
        assert_eq!(extract_task("add  "), None);
    }

    #[test]
    fn verb_alone_yields_nothing() {
        assert_eq!(extract_task("add"), None);
    }

    #[test]
    fn new_task_is_appended() {
        let mut tasks = vec!["call bob".to_string()];
        assert!(record_task(&mut tasks, "add buy milk"));
        assert_eq!(tasks, vec!["call bob", "buy milk"]);
    }

    #[test]
    fn duplicate_task_is_not_appended() {
        let mut tasks = vec!["buy milk".to_string()];
        assert!(!record_task(&mut tasks, "add buy milk"));
        assert_eq!(tasks, vec!["buy milk"]);
    }

    #[test]
    fn non_match_leaves_tasks_unchanged() {
        let mut tasks = vec!["buy milk".to_string()];
        assert!(!record_task(&mut tasks, "how are you?"));
        assert_eq!(tasks, vec!["buy milk"]);
    }
}
