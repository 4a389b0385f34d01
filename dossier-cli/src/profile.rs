use std::path::PathBuf;

use clap::{Args, Subcommand};
use colored::Colorize;
use dossier_lib::{
    Repository,
    repository::{
        Education, LatitudeDirection, LongitudeDirection, Profile, ProfileDraft,
        entities::read_data_url,
    },
};

use crate::{CliError, admin::Credentials};

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List profiles
    List {
        /// Only show profiles matching this term
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show a single profile summary
    Show { id: i64 },
    /// Add a new profile
    Add(FieldArgs),
    /// Edit an existing profile, replacing the given fields
    Edit {
        id: i64,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Remove a profile
    Remove { id: i64 },
}

#[derive(Args, Debug, Clone)]
pub struct FieldArgs {
    /// Full name
    #[arg(long)]
    name: Option<String>,
    /// Email address
    #[arg(long)]
    email: Option<String>,
    /// Phone number
    #[arg(long)]
    phone: Option<String>,
    /// Short bio
    #[arg(long)]
    bio: Option<String>,
    /// Latitude degree magnitude, no sign
    #[arg(long)]
    latitude: Option<String>,
    /// N or S
    #[arg(long)]
    latitude_direction: Option<String>,
    /// Longitude degree magnitude, no sign
    #[arg(long)]
    longitude: Option<String>,
    /// E or W
    #[arg(long)]
    longitude_direction: Option<String>,
    /// Path to an avatar image file, 5 MiB max
    #[arg(long)]
    image: Option<PathBuf>,
    /// Education: degree title
    #[arg(long)]
    degree: Option<String>,
    /// Education: institution name
    #[arg(long)]
    institution: Option<String>,
    /// Education: years attended, digits only
    #[arg(long)]
    years_attended: Option<String>,
    /// Education: field of study
    #[arg(long)]
    field_of_study: Option<String>,
    /// Education: grade
    #[arg(long)]
    grade: Option<String>,
}

pub fn handle(repo: &Repository, cmd: &Command, auth: &Credentials) -> Result<(), CliError> {
    match cmd {
        Command::List { search } => list(repo, search.as_deref()),
        Command::Show { id } => show(repo, *id),
        Command::Add(fields) => {
            auth.require(repo)?;
            add(repo, fields)
        }
        Command::Edit { id, fields } => {
            auth.require(repo)?;
            edit(repo, *id, fields)
        }
        Command::Remove { id } => {
            auth.require(repo)?;
            remove(repo, *id)
        }
    }
}

fn list(repo: &Repository, search: Option<&str>) -> Result<(), CliError> {
    let profiles = match search {
        Some(term) => repo.search(term)?,
        None => repo.profiles()?,
    };

    if profiles.is_empty() {
        println!("No profiles found");
        return Ok(());
    }

    for profile in &profiles {
        let mut line = format!("{}  {}  {}", profile.id, profile.name.bold(), profile.email);
        if let Some(coordinates) = profile.coordinates() {
            line.push_str(&format!("  ({coordinates})"));
        }
        println!("{line}");
    }

    Ok(())
}

fn show(repo: &Repository, id: i64) -> Result<(), CliError> {
    let profile = find(repo, id)?;

    println!("{}", profile.name.bold());
    field("Email", Some(&profile.email));
    field("Phone", profile.phone.as_deref());
    field("Bio", profile.bio.as_deref());
    field("Member since", Some(&profile.created_at));
    field("Status", Some(&profile.status));

    if let Some(coordinates) = profile.coordinates() {
        field("Location", Some(&coordinates.to_string()));
        field(
            "Map",
            Some(&format!(
                "https://www.google.com/maps?q={},{}",
                coordinates.latitude, coordinates.longitude
            )),
        );
    }

    if let Some(education) = &profile.education {
        println!("{}", "Education:".dimmed());
        field("  Degree", education.degree.as_deref());
        field("  Institution", education.institution.as_deref());
        field("  Years attended", education.years_attended.as_deref());
        field("  Field of study", education.field_of_study.as_deref());
        field("  Grade", education.grade.as_deref());
    }

    match &profile.image_url {
        Some(url) => field("Avatar", Some(&format!("data URL, {} bytes", url.len()))),
        None => field("Avatar", Some("none")),
    }

    Ok(())
}

fn add(repo: &Repository, fields: &FieldArgs) -> Result<(), CliError> {
    let draft = ProfileDraft {
        name: fields.name.clone().unwrap_or_default(),
        email: fields.email.clone().unwrap_or_default(),
        phone: fields.phone.clone(),
        bio: fields.bio.clone(),
        latitude_degree: fields.latitude.clone(),
        latitude_direction: parse_latitude_direction(fields)?,
        longitude_degree: fields.longitude.clone(),
        longitude_direction: parse_longitude_direction(fields)?,
        education: education_from(fields, None)?,
        image_url: image_from(fields)?,
    };

    let profiles = repo.add_profile(draft)?;

    println!(
        "{} ({} profiles total)",
        "Profile saved".green(),
        profiles.len()
    );

    Ok(())
}

fn edit(repo: &Repository, id: i64, fields: &FieldArgs) -> Result<(), CliError> {
    let mut profile = find(repo, id)?;

    if let Some(name) = &fields.name {
        profile.name = name.clone();
    }
    if let Some(email) = &fields.email {
        profile.email = email.clone();
    }
    if let Some(phone) = &fields.phone {
        profile.phone = Some(phone.clone());
    }
    if let Some(bio) = &fields.bio {
        profile.bio = Some(bio.clone());
    }
    if let Some(latitude) = &fields.latitude {
        profile.latitude_degree = Some(latitude.clone());
    }
    if let Some(direction) = parse_latitude_direction(fields)? {
        profile.latitude_direction = Some(direction);
    }
    if let Some(longitude) = &fields.longitude {
        profile.longitude_degree = Some(longitude.clone());
    }
    if let Some(direction) = parse_longitude_direction(fields)? {
        profile.longitude_direction = Some(direction);
    }
    if let Some(education) = education_from(fields, profile.education.take())? {
        profile.education = Some(education);
    }
    if let Some(image_url) = image_from(fields)? {
        profile.image_url = Some(image_url);
    }

    repo.edit_profile(profile)?;

    println!("{}", "Profile saved".green());

    Ok(())
}

fn remove(repo: &Repository, id: i64) -> Result<(), CliError> {
    repo.remove_profile(id)?;

    println!("{}", "Profile deleted".green());

    Ok(())
}

fn find(repo: &Repository, id: i64) -> Result<Profile, CliError> {
    repo.profiles()?
        .into_iter()
        .find(|profile| profile.id == id)
        .ok_or(CliError::NotFound(id))
}

fn field(label: &str, value: Option<&str>) {
    if let Some(value) = value {
        println!("{} {value}", format!("{label}:").dimmed());
    }
}

fn parse_latitude_direction(fields: &FieldArgs) -> Result<Option<LatitudeDirection>, CliError> {
    Ok(fields
        .latitude_direction
        .as_deref()
        .map(LatitudeDirection::parse)
        .transpose()?)
}

fn parse_longitude_direction(fields: &FieldArgs) -> Result<Option<LongitudeDirection>, CliError> {
    Ok(fields
        .longitude_direction
        .as_deref()
        .map(LongitudeDirection::parse)
        .transpose()?)
}

/// Fold the education flags into the (possibly pre-existing) education
/// record. Returns `None` when no education data is present at all.
fn education_from(
    fields: &FieldArgs,
    existing: Option<Education>,
) -> Result<Option<Education>, CliError> {
    if let Some(years) = &fields.years_attended
        && !years.chars().all(|c| c.is_ascii_digit())
    {
        return Err(CliError::Input(
            "years attended must contain digits only".to_string(),
        ));
    }

    let mut education = existing.unwrap_or_default();

    if let Some(degree) = &fields.degree {
        education.degree = Some(degree.clone());
    }
    if let Some(institution) = &fields.institution {
        education.institution = Some(institution.clone());
    }
    if let Some(years) = &fields.years_attended {
        education.years_attended = Some(years.clone());
    }
    if let Some(field_of_study) = &fields.field_of_study {
        education.field_of_study = Some(field_of_study.clone());
    }
    if let Some(grade) = &fields.grade {
        education.grade = Some(grade.clone());
    }

    Ok((!education.is_empty()).then_some(education))
}

fn image_from(fields: &FieldArgs) -> Result<Option<String>, CliError> {
    Ok(fields
        .image
        .as_deref()
        .map(read_data_url)
        .transpose()?)
}
