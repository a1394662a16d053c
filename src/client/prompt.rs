//! Prompt augmentation.
//!
//! Prefixes each outgoing message with the current task list so the
//! stateless agent has minimal memory of tracked tasks without server-side
//! task storage.

/// Build the task-context prefix.
#[must_use]
pub fn task_context(tasks: &[String]) -> String {
    if tasks.is_empty() {
        "No tasks yet. ".to_string()
    } else {
        format!("Current tasks: {}. ", tasks.join(", "))
    }
}

/// Build the augmented message sent to the agent.
///
/// The task context reflects the list *after* extraction has possibly
/// appended to it.
#[must_use]
pub fn augment(tasks: &[String], input: &str) -> String {
    format!("{}\nUser: {}", task_context(tasks), input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_task_list_prefix() {
        assert_eq!(task_context(&[]), "No tasks yet. ");
    }

    #[test]
    fn tasks_are_joined_with_comma_space() {
        let tasks = vec!["buy milk".to_string(), "call bob".to_string()];
        assert_eq!(task_context(&tasks), "Current tasks: buy milk, call bob. ");
    }

    #[test]
    fn augmented_message_embeds_the_raw_input() {
        let tasks = vec!["buy milk".to_string()];
        assert_eq!(
            augment(&tasks, "what's next?"),
            "Current tasks: buy milk. \nUser: what's next?"
        );
    }
}
