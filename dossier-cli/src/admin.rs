use std::path::Path;

use colored::Colorize;
use dossier_lib::{Repository, repository::RecvError};
use tracing::warn;

use crate::CliError;

/// Credential pair taken from the command line, checked against the
/// configured admin account before any mutation runs.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    pub fn require(&self, repo: &Repository) -> Result<(), CliError> {
        let (Some(username), Some(password)) = (&self.username, &self.password) else {
            return Err(CliError::Auth);
        };

        if repo.verify_admin(username, password) {
            Ok(())
        } else {
            Err(CliError::Auth)
        }
    }
}

/// Follow the stored collection: print the fresh snapshot on every local
/// mutation and on every change another process makes. Runs until Ctrl-C.
pub fn watch(repo: &Repository) -> Result<(), CliError> {
    let mut events = repo.subscribe();
    let _watcher = repo.watch();

    println!("Watching for profile changes, Ctrl-C to stop");

    loop {
        match events.blocking_recv() {
            Ok(event) => {
                let origin = match event.origin {
                    dossier_lib::repository::ChangeOrigin::Local => "local".green(),
                    dossier_lib::repository::ChangeOrigin::External => "external".yellow(),
                };
                let names = event
                    .profiles
                    .iter()
                    .map(|profile| profile.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");

                println!(
                    "[{origin}] {} profiles: {names}",
                    event.profiles.len()
                );
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "fell behind the event stream");
            }
            Err(RecvError::Closed) => break,
        }
    }

    Ok(())
}

/// Write the full collection to a JSON document. Admin-gated, like the
/// export button it stands in for.
pub fn export(repo: &Repository, output: &Path, auth: &Credentials) -> Result<(), CliError> {
    auth.require(repo)?;

    let count = repo.profiles()?.len();
    let document = repo.export_json()?;
    std::fs::write(output, document).map_err(CliError::Io)?;

    println!(
        "{} {count} profiles to {}",
        "Exported".green(),
        output.display()
    );

    Ok(())
}
