//! Progress reporting for collaboration rounds

use colored::Colorize;
use conclave_application::CollaborationProgress;
use conclave_domain::ConversationMode;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::{Mutex, PoisonError};

/// Reports collaboration progress with one bar per round
pub struct ProgressReporter {
    multi: MultiProgress,
    round_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            round_bar: Mutex::new(None),
        }
    }

    fn round_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn mode_display_name(mode: ConversationMode) -> &'static str {
        match mode {
            ConversationMode::TurnOrder => "Turn order",
            ConversationMode::FreeForm => "Free form",
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CollaborationProgress for ProgressReporter {
    fn on_collaboration_start(&self, mode: ConversationMode, total_agents: usize) {
        let pb = self.multi.add(ProgressBar::new(total_agents as u64));
        pb.set_style(Self::round_style());
        pb.set_prefix(Self::mode_display_name(mode));
        pb.set_message("Starting...");

        *self.round_bar.lock().unwrap_or_else(PoisonError::into_inner) = Some(pb);
    }

    fn on_agent_complete(&self, agent: &str, success: bool) {
        if let Some(pb) = self
            .round_bar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            let status = if success {
                format!("{} {}", "v".green(), agent)
            } else {
                format!("{} {}", "x".red(), agent)
            };
            pb.set_message(status);
            pb.inc(1);
        }
    }

    fn on_collaboration_complete(&self, mode: ConversationMode) {
        if let Some(pb) = self
            .round_bar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pb.finish_with_message(format!(
                "{} complete!",
                Self::mode_display_name(mode).green()
            ));
        }
    }
}
