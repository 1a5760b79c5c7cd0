// src/commit_message.rs

/// Footer appended to every generated message.
pub const ATTRIBUTION_FOOTER: &str =
    "🤖 Generated with OCD\nCo-Authored-By: OCD System <noreply@ocd.local>";

/// The parts of a task-like record that go into a commit message.
#[derive(Debug, Clone, Default)]
pub struct CommitSubject<'a> {
    pub title: &'a str,
    pub raw_instructions: Option<&'a str>,
    pub labels: &'a [String],
    pub cycle_count: u32,
}

impl<'a> CommitSubject<'a> {
    pub fn titled(title: &'a str) -> Self {
        Self {
            title,
            ..Self::default()
        }
    }
}

/// Title, then each non-empty optional section separated by a blank line,
/// then the attribution footer.
pub fn generate_commit_message(subject: &CommitSubject<'_>) -> String {
    let mut message = subject.title.to_string();

    if let Some(instructions) = subject.raw_instructions.filter(|s| !s.is_empty()) {
        message.push_str("\n\n");
        message.push_str(instructions);
    }

    if !subject.labels.is_empty() {
        message.push_str("\n\nLabels: ");
        message.push_str(&subject.labels.join(", "));
    }

    if subject.cycle_count > 0 {
        message.push_str(&format!("\n\nCycles: {}", subject.cycle_count));
    }

    message.push_str("\n\n");
    message.push_str(ATTRIBUTION_FOOTER);
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_subject_keeps_section_order() {
        let labels = vec!["a".to_string(), "b".to_string()];
        let message = generate_commit_message(&CommitSubject {
            title: "Fix bug",
            raw_instructions: Some("Do X"),
            labels: &labels,
            cycle_count: 2,
        });

        assert_eq!(
            message,
            format!("Fix bug\n\nDo X\n\nLabels: a, b\n\nCycles: 2\n\n{ATTRIBUTION_FOOTER}")
        );
    }

    #[test]
    fn title_only_goes_straight_to_footer() {
        let message = generate_commit_message(&CommitSubject::titled("Fix bug"));
        assert_eq!(message, format!("Fix bug\n\n{ATTRIBUTION_FOOTER}"));
    }

    #[test]
    fn empty_instructions_and_zero_cycles_are_omitted() {
        let message = generate_commit_message(&CommitSubject {
            title: "Tidy",
            raw_instructions: Some(""),
            labels: &[],
            cycle_count: 0,
        });
        assert!(!message.contains("Cycles"));
        assert!(!message.contains("Labels"));
        assert!(message.starts_with("Tidy\n\n🤖"));
    }
}
