//! Discover command - build the matrix of pending updates

use crate::cli::context::StageContext;
use nix_autobump::error::Result;
use nix_autobump::workflow::{self, parse_space_separated};

/// Run the discover stage with space-separated name filters.
pub fn run_discover(packages: &str, inputs: &str) -> Result<()> {
    let context = StageContext::new()?;
    let package_filter = parse_space_separated(packages);
    let input_filter = parse_space_separated(inputs);
    workflow::discover(
        &context.repo_root,
        &package_filter,
        &input_filter,
        &context.outputs,
    )?;
    Ok(())
}
