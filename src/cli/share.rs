//! Share commands.

use std::collections::BTreeMap;
use std::io::{self, IsTerminal};
use std::path::Path;

use dialoguer::Confirm;

use crate::cli::{distributor, output};
use crate::core::config::Config;
use crate::core::domain::{PerUserSecrets, ProjectId};
use crate::core::oracle::Credential;
use crate::error::{Error, Result};

/// Replace all per-user secrets of `project` from a JSON file.
///
/// Without `seal_for` the file already holds sealed per-user values. With it,
/// the file is a flat map of plaintexts sealed here for each listed user.
pub fn set(
    config: &Config,
    project: &str,
    file: &Path,
    seal_for: &[String],
    token: &str,
    yes: bool,
) -> Result<()> {
    let project = ProjectId::new(project)?;
    let requester = Credential::new(token);
    let distributor = distributor(config)?;

    let contents = std::fs::read_to_string(file)?;
    let secrets: PerUserSecrets = if seal_for.is_empty() {
        serde_json::from_str(&contents)?
    } else {
        let plaintexts: BTreeMap<String, String> = serde_json::from_str(&contents)?;
        distributor.seal_for_users(&plaintexts, seal_for)?
    };

    if !yes {
        if !io::stdin().is_terminal() {
            return Err(Error::Aborted(
                "replacing shared secrets needs confirmation; pass --yes".to_string(),
            ));
        }
        output::warn(&format!(
            "this replaces every shared secret of {}; users not listed lose access",
            output::key(project.as_str())
        ));
        let confirmed = Confirm::new()
            .with_prompt(format!("Share with {} user(s)?", secrets.len()))
            .default(false)
            .interact()?;
        if !confirmed {
            return Err(Error::Aborted("nothing changed".to_string()));
        }
    }

    let users = secrets.len();
    let values = secrets.value_count();
    distributor.set_per_user_secrets(&project, &requester, secrets)?;

    output::success(&format!(
        "shared {} value(s) with {} user(s) in {}",
        values,
        users,
        output::key(project.as_str())
    ));
    Ok(())
}

/// Print the per-user secrets of `project` as JSON.
pub fn get(config: &Config, project: &str, user: Option<&str>, token: &str) -> Result<()> {
    let project = ProjectId::new(project)?;
    let requester = Credential::new(token);
    let secrets = distributor(config)?.get_per_user_secrets(&project, &requester)?;

    let json = match user {
        Some(user) => {
            let mine = secrets.get(user).cloned().unwrap_or_default();
            serde_json::to_string_pretty(&mine)?
        }
        None => serde_json::to_string_pretty(&secrets)?,
    };
    println!("{}", json);
    Ok(())
}
