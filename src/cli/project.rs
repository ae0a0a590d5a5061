//! Project commands.

use crate::cli::{distributor, output};
use crate::core::config::Config;
use crate::error::Result;

/// Create a project.
pub fn create(config: &Config, id: &str) -> Result<()> {
    let project = distributor(config)?.create_project(id)?;
    output::success(&format!("created project {}", output::key(project.id.as_str())));
    Ok(())
}
