//! CLI-specific progress handling for butterfly-graph
//!
//! One spinner for the whole run, relabelled as each pipeline stage starts.

use std::sync::Arc;
use std::time::Duration;

use butterfly_graph::{Stage, StageCallback};
use indicatif::{ProgressBar, ProgressStyle};

/// Creates a spinner for CLI display
pub fn create_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .expect("Failed to create progress style"),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn stage_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Read => "📖 Reading OSM records",
        Stage::Build => "🛣️  Building street graph",
        Stage::Extract => "🧭 Extracting largest component",
        Stage::Write => "💾 Writing JSON",
    }
}

/// Progress manager for a pipeline run
pub struct ProgressManager {
    pub pb: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(message: &str) -> Self {
        let pb = create_spinner();

        // Print initial message to stderr
        eprintln!("{message}");

        Self { pb }
    }

    /// Callback that relabels the spinner at each stage
    pub fn stage_callback(&self) -> StageCallback {
        let pb = self.pb.clone();
        Arc::new(move |stage: Stage| pb.set_message(stage_message(stage)))
    }

    pub fn finish(&self, message: &str) {
        self.pb.finish_with_message(message.to_string());
    }

    pub fn abandon(&self) {
        self.pb.abandon();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_spinner_template() {
        let pb = create_spinner();
        pb.set_message("working");
        assert_eq!(pb.message(), "working");
        pb.finish();
    }

    #[test]
    fn test_stage_callback_updates_message() {
        let manager = ProgressManager::new("Test run");
        let callback = manager.stage_callback();
        callback(Stage::Extract);
        assert_eq!(manager.pb.message(), stage_message(Stage::Extract));
        manager.finish("done");
    }
}
