use crate::model::Task;

/// Case-insensitive substring matcher over task title and description.
#[derive(Debug, Clone)]
pub struct TextMatcher {
    needle: String,
}

impl TextMatcher {
    /// Normalize a query string into a matcher. Returns `None` for blank inputs.
    #[must_use]
    pub fn new(query: &str) -> Option<Self> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            needle: trimmed.to_lowercase(),
        })
    }

    /// Determine whether the title or the description contains the query.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.matches_field(&task.title)
            || task
                .description
                .as_deref()
                .is_some_and(|description| self.matches_field(description))
    }

    fn matches_field(&self, value: &str) -> bool {
        value.to_lowercase().contains(&self.needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{ProjectId, TaskId, UserId};
    use crate::model::TaskDraft;
    use time::macros::datetime;

    fn task(title: &str, description: Option<&str>) -> Task {
        let draft = TaskDraft {
            description: description.map(str::to_owned),
            ..TaskDraft::new(title, ProjectId::inbox(), UserId::new())
        };
        Task::from_draft(TaskId::new(), draft, datetime!(2025-01-01 0:00 UTC), 0)
    }

    #[test]
    fn matcher_skips_blank_queries() {
        assert!(TextMatcher::new("").is_none());
        assert!(TextMatcher::new("   ").is_none());
        assert!(TextMatcher::new("\n").is_none());
    }

    #[test]
    fn matcher_checks_title_and_description() {
        let task = task("Fix login bug", Some("Token refresh expires too early"));

        let matcher = TextMatcher::new("LOGIN")
            .unwrap_or_else(|| panic!("matcher must exist for queries with content"));
        assert!(matcher.matches(&task));

        let matcher = TextMatcher::new(" refresh ")
            .unwrap_or_else(|| panic!("matcher must exist for queries with content"));
        assert!(matcher.matches(&task));

        let missing = TextMatcher::new("groceries")
            .unwrap_or_else(|| panic!("matcher must exist for queries with content"));
        assert!(!missing.matches(&task));
    }

    #[test]
    fn matcher_handles_missing_description_and_unicode() {
        let task = task("Überprüfung", None);
        let matcher = TextMatcher::new("ÜBER")
            .unwrap_or_else(|| panic!("matcher must exist for queries with content"));
        assert!(matcher.matches(&task));

        let matcher = TextMatcher::new("notes")
            .unwrap_or_else(|| panic!("matcher must exist for queries with content"));
        assert!(!matcher.matches(&task));
    }
}
