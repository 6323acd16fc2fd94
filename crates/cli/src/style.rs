//! Terminal styling for scan summaries and command output.

use console::Style;

/// Prefix `msg` with a coloured status mark.
fn marked(mark: &str, style: Style, msg: &str) -> String {
    format!("{} {}", style.apply_to(mark), msg)
}

/// `✓ msg` in green: a check that passed.
pub fn success(msg: &str) -> String {
    marked("✓", Style::new().green(), msg)
}

/// `✗ msg` in red: a failed check or missing sign-offs.
pub fn error(msg: &str) -> String {
    marked("✗", Style::new().red(), msg)
}

/// `⚠ msg` in yellow: something to look at that did not fail the run.
pub fn warn(msg: &str) -> String {
    marked("⚠", Style::new().yellow(), msg)
}

/// Section title, in bold.
pub fn header(msg: &str) -> String {
    Style::new().bold().apply_to(msg).to_string()
}

/// Secondary detail such as report file paths.
pub fn dim(msg: &str) -> String {
    Style::new().dim().apply_to(msg).to_string()
}

/// Verdict label for a commit or repository.
pub fn verdict(compliant: bool) -> String {
    let (label, colour) = if compliant {
        ("compliant", Style::new().green())
    } else {
        ("missing sign-off", Style::new().red())
    };
    colour.bold().apply_to(label).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marks_keep_message_text() {
        console::set_colors_enabled(false);
        assert_eq!(success("done"), "✓ done");
        assert_eq!(error("failed"), "✗ failed");
        assert_eq!(warn("careful"), "⚠ careful");
        assert_eq!(header("Summary"), "Summary");
        assert_eq!(verdict(true), "compliant");
        assert_eq!(verdict(false), "missing sign-off");
    }
}
