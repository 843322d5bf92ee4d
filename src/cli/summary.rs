//! Summary command - append the run outcome to the step summary

use nix_autobump::error::Result;
use nix_autobump::outputs::ActionOutputs;
use nix_autobump::workflow;

/// Run the summary stage.
pub fn run_summary(update_result: &str, auto_merge: &str, has_updates: &str) -> Result<()> {
    let outputs = ActionOutputs::from_env();
    workflow::summary(&outputs, update_result, auto_merge, has_updates)
}
