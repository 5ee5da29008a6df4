//! Console output formatter for orchestrator results

use colored::Colorize;
use conclave_domain::{AgentMessage, HistoryEntry, Response, ResponseMap, SystemStatus};
use serde_json::Value;

/// Formats orchestrator results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Force colors off (or back to terminal detection)
    pub fn set_color(enabled: bool) {
        if enabled {
            colored::control::unset_override();
        } else {
            colored::control::set_override(false);
        }
    }

    /// Format a single processed response
    pub fn format_response(response: &Response) -> String {
        let mut output = String::new();
        let agent = response.agent_name.as_deref().unwrap_or("unknown");

        match &response.error {
            Some(error) => {
                output.push_str(&format!("{} {}\n", "Error:".red().bold(), error));
            }
            None => {
                output.push_str(&format!(
                    "{}\n\n{}\n\n",
                    format!("── {} ──", agent).yellow().bold(),
                    response.content
                ));
            }
        }

        output.push_str(&format!(
            "{} {}\n",
            "Confidence:".cyan().bold(),
            Self::confidence(response.confidence)
        ));
        for (key, value) in &response.metadata {
            output.push_str(&format!("{} {}\n", format!("{}:", key).dimmed(), value));
        }
        output
    }

    /// Format a consensus map, one block per agent
    pub fn format_consensus(query: &str, responses: &ResponseMap) -> String {
        let mut output = Self::header("Consensus");
        output.push_str(&format!("{} {}\n", "Question:".cyan().bold(), query));

        if responses.is_empty() {
            output.push_str(&format!("\n{}\n", "No agents took part.".yellow()));
        }
        for (name, response) in responses {
            match &response.error {
                None => output.push_str(&format!(
                    "\n{} {}\n{}\n",
                    format!("── {} ──", name).yellow().bold(),
                    Self::confidence(response.confidence),
                    response.content
                )),
                Some(error) => output.push_str(&format!(
                    "\n{}\nError: {}\n",
                    format!("── {} ──", name).red().bold(),
                    error
                )),
            }
        }
        output
    }

    /// Format a query transcript; the final orchestrator synthesis is highlighted
    pub fn format_messages(messages: &[AgentMessage], synthesizer: &str) -> String {
        let mut output = Self::header("Responses");
        for message in messages {
            let title = format!("── {} ──", message.sender);
            let title = if message.sender == synthesizer {
                title.green().bold()
            } else if message.confidence == 0.0 {
                title.red().bold()
            } else {
                title.yellow().bold()
            };
            output.push_str(&format!(
                "\n{} {}\n{}\n",
                title,
                Self::confidence(message.confidence),
                message.content
            ));
        }
        output
    }

    pub fn format_status(status: &SystemStatus) -> String {
        let mut output = Self::header("Engine Status");
        let rows = [
            ("Initialized", status.initialized.to_string()),
            ("Consciousness", status.consciousness.to_string()),
            ("Fusion", status.fusion.to_string()),
            ("Learning mode", status.learning_mode.to_string()),
            ("Insights", status.insight_count.to_string()),
            ("Evolution level", format!("{:.1}", status.evolution_level)),
            ("History entries", status.history_len.to_string()),
            ("Agents", Self::list(&status.registered_agents)),
            ("Active", Self::list(&status.active_agents)),
        ];
        for (label, value) in rows {
            output.push_str(&format!("{:>16} {}\n", format!("{}:", label).cyan().bold(), value));
        }
        output
    }

    pub fn format_history(entries: &[HistoryEntry]) -> String {
        if entries.is_empty() {
            return format!("{}\n", "History is empty.".dimmed());
        }
        let mut output = Self::header("History");
        for (index, entry) in entries.iter().enumerate() {
            let event = match entry.get("event") {
                Some(Value::String(event)) => event.clone(),
                _ => "entry".to_string(),
            };
            let fields = entry
                .fields()
                .iter()
                .filter(|(key, _)| key.as_str() != "event")
                .map(|(key, value)| match value {
                    Value::String(s) => format!("{}={}", key, s),
                    other => format!("{}={}", key, other),
                })
                .collect::<Vec<_>>()
                .join(" ");
            output.push_str(&format!("{:>4} {} {}\n", index + 1, event.bold(), fields.dimmed()));
        }
        output
    }

    /// Format any serializable value as pretty JSON
    pub fn format_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    fn confidence(value: f32) -> String {
        let text = format!("({:.2})", value);
        if value >= 0.7 {
            text.green().to_string()
        } else if value >= 0.4 {
            text.yellow().to_string()
        } else {
            text.red().to_string()
        }
    }

    fn list(names: &[String]) -> String {
        if names.is_empty() {
            "-".to_string()
        } else {
            names.join(", ")
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("\n{}\n  {}\n{}\n", line.cyan(), title.cyan().bold(), line.cyan())
    }
}
