//! Human-readable error reports.

use std::fmt;

use crate::config::ImportConfig;
use crate::validation::RowError;

/// Renders validation errors one per line, capped.
///
/// ```rust
/// use arbor_import::report::ErrorReport;
/// use arbor_import::validation::RowError;
///
/// let errors = vec![RowError::at_row(3, "parent_id", Some("AREA-9"), "Parent not found")];
/// let report = ErrorReport::new(&errors);
/// assert_eq!(report.to_string(), "Row 3 [parent_id] \"AREA-9\": Parent not found");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ErrorReport<'a> {
    errors: &'a [RowError],
    max_errors: usize,
    value_width: usize,
}

impl<'a> ErrorReport<'a> {
    /// Creates a report with the default limits.
    pub fn new(errors: &'a [RowError]) -> Self {
        Self::with_config(errors, &ImportConfig::default())
    }

    /// Creates a report with the limits from `config`.
    pub fn with_config(errors: &'a [RowError], config: &ImportConfig) -> Self {
        Self {
            errors,
            max_errors: config.max_reported_errors,
            value_width: config.report_value_width,
        }
    }

    /// Number of errors not shown.
    pub fn hidden_count(&self) -> usize {
        self.errors.len().saturating_sub(self.max_errors)
    }

    /// The rendered lines, including the remainder line if any.
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .errors
            .iter()
            .take(self.max_errors)
            .map(|e| self.render(e))
            .collect();

        let hidden = self.hidden_count();
        if hidden > 0 {
            lines.push(format!("... and {} more error(s)", hidden));
        }
        lines
    }

    fn render(&self, error: &RowError) -> String {
        let location = match error.row {
            Some(row) => format!("Row {} [{}]", row, error.field),
            None => format!("General [{}]", error.field),
        };
        match &error.value {
            Some(value) => format!(
                "{} \"{}\": {}",
                location,
                truncate(value, self.value_width),
                error.message
            ),
            None => format!("{}: {}", location, error.message),
        }
    }
}

impl fmt::Display for ErrorReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}

/// Cuts `value` to `width` characters, marking the cut with `...`.
fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut cut: String = value.chars().take(width).collect();
        cut.push_str("...");
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_error(row: usize) -> RowError {
        RowError::at_row(row, "name", None, "Asset name is required")
    }

    #[test]
    fn test_row_and_general_lines() {
        let errors = vec![
            name_error(2),
            RowError::general("parent_id", "Circular reference detected: A -> B -> A"),
        ];
        assert_eq!(
            ErrorReport::new(&errors).lines(),
            vec![
                "Row 2 [name]: Asset name is required".to_string(),
                "General [parent_id]: Circular reference detected: A -> B -> A".to_string(),
            ]
        );
    }

    #[test]
    fn test_long_values_are_truncated() {
        let value = "x".repeat(150);
        let errors = vec![RowError::at_row(2, "parent_id", Some(&value), "not found")];
        let line = &ErrorReport::new(&errors).lines()[0];

        let expected = format!("Row 2 [parent_id] \"{}...\": not found", "x".repeat(100));
        assert_eq!(line, &expected);
    }

    #[test]
    fn test_truncation_counts_characters() {
        assert_eq!(truncate("ääää", 2), "ää...");
        assert_eq!(truncate("ää", 2), "ää");
    }

    #[test]
    fn test_cap_and_remainder() {
        let errors: Vec<RowError> = (2..30).map(name_error).collect();
        let report = ErrorReport::new(&errors);
        let lines = report.lines();

        assert_eq!(lines.len(), 21);
        assert_eq!(report.hidden_count(), 8);
        assert_eq!(lines[20], "... and 8 more error(s)");
    }

    #[test]
    fn test_custom_limits() {
        let config = ImportConfig {
            max_reported_errors: 1,
            report_value_width: 3,
            ..Default::default()
        };
        let errors = vec![
            RowError::at_row(2, "id", Some("ABCDEF"), "Duplicate"),
            name_error(3),
        ];
        let report = ErrorReport::with_config(&errors, &config);
        assert_eq!(
            report.to_string(),
            "Row 2 [id] \"ABC...\": Duplicate\n... and 1 more error(s)"
        );
    }
}
