//! Text rendering of aggregated problems
//!
//! Output uses Telegram's legacy Markdown: host names are wrapped in `*`
//! for bold. Problem lines are `\t{glyph} {age}    {description}`.

use crate::models::{AggregatedResult, ProblemRecord};

/// Placeholder sent instead of an empty message
pub const NOTHING_TO_SHOW: &str = "Nothing to show";

/// Glyphs indexed by severity, 0 (not classified) to 5 (disaster)
pub const SEVERITY_GLYPHS: [&str; 6] = [".!.", "🔵", "🟡", "🟠", "🔴", "‼️"];

/// Glyph shown for problems whose trigger is disabled
pub const DISABLED_GLYPH: &str = "⚫️";

const DESCRIPTION_PADDING: &str = "    ";

/// Rendering errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// Severity has no glyph
    #[error("severity {0} is outside 0..=5")]
    SeverityOutOfRange(u8),
}

/// Look up the glyph for a severity
pub fn severity_glyph(severity: u8) -> Result<&'static str, RenderError> {
    SEVERITY_GLYPHS
        .get(usize::from(severity))
        .copied()
        .ok_or(RenderError::SeverityOutOfRange(severity))
}

/// Renders [`AggregatedResult`]s as chat messages
#[derive(Debug, Clone, Copy, Default)]
pub struct Formatter {
    mark_disabled_triggers: bool,
}

impl Formatter {
    /// Formatter showing every problem with its severity glyph
    pub fn new() -> Self {
        Self::default()
    }

    /// Show problems of disabled triggers with [`DISABLED_GLYPH`]
    #[must_use]
    pub fn mark_disabled_triggers(mut self, enabled: bool) -> Self {
        self.mark_disabled_triggers = enabled;
        self
    }

    /// Render all hosts into one text, or [`NOTHING_TO_SHOW`] when empty
    pub fn render(&self, result: &AggregatedResult) -> Result<String, RenderError> {
        let mut out = String::new();
        for entry in result {
            if entry.problems.is_empty() {
                continue;
            }
            out.push_str(&self.render_host(&entry.host, &entry.problems)?);
        }

        if out.is_empty() {
            out.push_str(NOTHING_TO_SHOW);
        }
        Ok(out)
    }

    /// Render one message per host, or a single placeholder when empty
    pub fn render_messages(&self, result: &AggregatedResult) -> Result<Vec<String>, RenderError> {
        let messages = result
            .iter()
            .filter(|entry| !entry.problems.is_empty())
            .map(|entry| self.render_host(&entry.host, &entry.problems))
            .collect::<Result<Vec<_>, _>>()?;

        if messages.is_empty() {
            return Ok(vec![NOTHING_TO_SHOW.to_string()]);
        }
        Ok(messages)
    }

    /// Render the bold host header followed by one line per problem
    pub fn render_host(&self, host: &str, problems: &[ProblemRecord]) -> Result<String, RenderError> {
        let mut out = format!("*{host}* \n");
        for problem in problems {
            let glyph = self.glyph_for(problem)?;
            out.push('\t');
            out.push_str(glyph);
            out.push(' ');
            out.push_str(&problem.age_text);
            out.push_str(DESCRIPTION_PADDING);
            out.push_str(&problem.description);
            out.push('\n');
        }
        Ok(out)
    }

    fn glyph_for(&self, problem: &ProblemRecord) -> Result<&'static str, RenderError> {
        let glyph = severity_glyph(problem.severity)?;
        if self.mark_disabled_triggers && problem.trigger_status.is_disabled() {
            return Ok(DISABLED_GLYPH);
        }
        Ok(glyph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TriggerStatus;
    use pretty_assertions::assert_eq;

    fn record(description: &str, severity: u8, status: TriggerStatus) -> ProblemRecord {
        ProblemRecord {
            description: description.to_string(),
            age_text: "0d 1h 1m".to_string(),
            resolved: false,
            severity,
            trigger_status: status,
        }
    }

    #[test]
    fn test_glyph_table() {
        let glyphs: Vec<&str> = (0..=5).map(|s| severity_glyph(s).unwrap()).collect();
        assert_eq!(glyphs, vec![".!.", "🔵", "🟡", "🟠", "🔴", "‼️"]);
    }

    #[test]
    fn test_severity_six_is_out_of_range() {
        assert_eq!(severity_glyph(6), Err(RenderError::SeverityOutOfRange(6)));
        assert_eq!(
            severity_glyph(u8::MAX),
            Err(RenderError::SeverityOutOfRange(255))
        );
    }

    #[test]
    fn test_render_host_block() {
        let mut result = AggregatedResult::new();
        result.append("srv1", record("CPU high", 3, TriggerStatus::Enabled));
        result.append("srv1", record("Disk full", 5, TriggerStatus::Enabled));
        result.append("srv2", record("Ping lost", 4, TriggerStatus::Enabled));

        let text = Formatter::new().render(&result).unwrap();

        assert_eq!(
            text,
            "*srv1* \n\t🟠 0d 1h 1m    CPU high\n\t‼️ 0d 1h 1m    Disk full\n\
             *srv2* \n\t🔴 0d 1h 1m    Ping lost\n"
        );
    }

    #[test]
    fn test_empty_result_renders_placeholder() {
        let formatter = Formatter::new();
        let result = AggregatedResult::new();

        assert_eq!(formatter.render(&result).unwrap(), NOTHING_TO_SHOW);
        assert_eq!(
            formatter.render_messages(&result).unwrap(),
            vec![NOTHING_TO_SHOW.to_string()]
        );
    }

    #[test]
    fn test_one_message_per_host() {
        let mut result = AggregatedResult::new();
        result.append("srv1", record("CPU high", 3, TriggerStatus::Enabled));
        result.append("srv2", record("Ping lost", 4, TriggerStatus::Enabled));

        let messages = Formatter::new().render_messages(&result).unwrap();

        assert_eq!(
            messages,
            vec![
                "*srv1* \n\t🟠 0d 1h 1m    CPU high\n".to_string(),
                "*srv2* \n\t🔴 0d 1h 1m    Ping lost\n".to_string(),
            ]
        );
    }

    #[test]
    fn test_disabled_marker_only_when_requested() {
        let mut result = AggregatedResult::new();
        result.append("agent1", record("Agent down", 4, TriggerStatus::Disabled));

        let plain = Formatter::new().render(&result).unwrap();
        let marked = Formatter::new()
            .mark_disabled_triggers(true)
            .render(&result)
            .unwrap();

        assert_eq!(plain, "*agent1* \n\t🔴 0d 1h 1m    Agent down\n");
        assert_eq!(marked, "*agent1* \n\t⚫️ 0d 1h 1m    Agent down\n");
    }

    #[test]
    fn test_out_of_range_severity_fails_render() {
        let mut result = AggregatedResult::new();
        result.append("srv1", record("bogus", 6, TriggerStatus::Disabled));

        let formatter = Formatter::new().mark_disabled_triggers(true);
        assert_eq!(
            formatter.render(&result),
            Err(RenderError::SeverityOutOfRange(6))
        );
    }
}
