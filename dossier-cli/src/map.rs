use colored::Colorize;
use dossier_lib::Repository;

use crate::CliError;

/// Print every geo-tagged profile with its resolved signed coordinates and
/// a map link, plus the center the map view would open on.
pub fn handle(repo: &Repository) -> Result<(), CliError> {
    let located = repo.located_profiles()?;

    if located.is_empty() {
        println!("No profiles with coordinates");
        return Ok(());
    }

    if let Some(center) = repo.map_center()? {
        println!("{} {center}", "Map center:".dimmed());
    }

    for (profile, coordinates) in &located {
        println!(
            "{}  {coordinates}  https://www.google.com/maps?q={},{}",
            profile.name.bold(),
            coordinates.latitude,
            coordinates.longitude
        );
    }

    Ok(())
}
