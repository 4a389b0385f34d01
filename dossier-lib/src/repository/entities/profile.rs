use std::fmt::{self, Display, Formatter};

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use strum::EnumString;

use crate::repository::entities::{Error, Result};

/// Status tag stamped onto every freshly created profile. Carried through
/// edits but not otherwise interpreted.
pub const ACTIVE_STATUS: &str = "active";

/// Hemisphere of a latitude magnitude. `S` negates the degree value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, strum::Display,
)]
#[strum(ascii_case_insensitive)]
pub enum LatitudeDirection {
    N,
    S,
}

/// Hemisphere of a longitude magnitude. `W` negates the degree value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, strum::Display,
)]
#[strum(ascii_case_insensitive)]
pub enum LongitudeDirection {
    E,
    W,
}

impl LatitudeDirection {
    /// Parse user input, accepting any casing of `n`/`s`.
    pub fn parse(input: &str) -> Result<Self> {
        input.trim().parse().map_err(|_| Error::InvalidDirection)
    }
}

impl LongitudeDirection {
    /// Parse user input, accepting any casing of `e`/`w`.
    pub fn parse(input: &str) -> Result<Self> {
        input.trim().parse().map_err(|_| Error::InvalidDirection)
    }
}

/// A signed coordinate pair resolved from a profile's degree/direction fields.
#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display)]
#[display("{latitude}, {longitude}")]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Optional education record nested inside a [`Profile`]. Every field is
/// independently optional.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    /// Digits-only string, validated at the input boundary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_attended: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_of_study: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
}

impl Education {
    pub fn is_empty(&self) -> bool {
        self.degree.is_none()
            && self.institution.is_none()
            && self.years_attended.is_none()
            && self.field_of_study.is_none()
            && self.grade.is_none()
    }
}

/// One directory entry.
///
/// Field names serialize in camelCase, which is the shape of the stored
/// document. `id` is assigned once at creation and is the identity key for
/// updates and removals; everything else is replaceable wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// Unsigned degree magnitude, kept as entered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude_degree: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude_direction: Option<LatitudeDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude_degree: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude_direction: Option<LongitudeDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<Education>,
    /// `data:<mime>;base64,` encoded avatar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: String,
    pub status: String,
}

impl Profile {
    /// Resolve the signed coordinate pair, if this profile has one.
    ///
    /// Both degree magnitudes must be present and numeric; a direction
    /// without its degree (or the other way around) counts as "no
    /// coordinates". A missing direction leaves the magnitude positive.
    pub fn coordinates(&self) -> Option<Coordinates> {
        let latitude: f64 = self.latitude_degree.as_deref()?.trim().parse().ok()?;
        let longitude: f64 = self.longitude_degree.as_deref()?.trim().parse().ok()?;

        let latitude = match self.latitude_direction {
            Some(LatitudeDirection::S) => -latitude,
            _ => latitude,
        };
        let longitude = match self.longitude_direction {
            Some(LongitudeDirection::W) => -longitude,
            _ => longitude,
        };

        Some(Coordinates {
            latitude,
            longitude,
        })
    }

    /// Case-insensitive substring match over the searchable fields: name,
    /// email, phone, bio, and the rendered coordinate fields.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    fn search_fields(&self) -> Vec<String> {
        let mut fields = vec![self.name.clone(), self.email.clone()];

        if let Some(phone) = &self.phone {
            fields.push(phone.clone());
        }
        if let Some(bio) = &self.bio {
            fields.push(bio.clone());
        }
        if let Some(degree) = &self.latitude_degree {
            fields.push(render_coordinate(degree, self.latitude_direction));
        }
        if let Some(degree) = &self.longitude_degree {
            fields.push(render_coordinate(degree, self.longitude_direction));
        }

        fields
    }
}

impl Display for Profile {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn render_coordinate(degree: &str, direction: Option<impl Display>) -> String {
    match direction {
        Some(direction) => format!("{degree}° {direction}"),
        None => format!("{degree}°"),
    }
}

/// Caller-supplied profile data before identity stamping.
///
/// The admin create flow fills one of these out; [`ProfileDraft::stamp`]
/// turns it into a [`Profile`] by assigning the id, the creation timestamp,
/// and the active status tag.
#[derive(Debug, Clone, Default)]
pub struct ProfileDraft {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub latitude_degree: Option<String>,
    pub latitude_direction: Option<LatitudeDirection>,
    pub longitude_degree: Option<String>,
    pub longitude_direction: Option<LongitudeDirection>,
    pub education: Option<Education>,
    pub image_url: Option<String>,
}

impl ProfileDraft {
    /// Stamp identity onto the draft, producing the persistable [`Profile`].
    ///
    /// The id is the current Unix timestamp in milliseconds. Collisions are
    /// only possible under clock anomalies or rapid programmatic calls and
    /// are not handled.
    pub fn stamp(self) -> Result<Profile> {
        if self.name.trim().is_empty() {
            return Err(Error::MissingField("name"));
        }
        if self.email.trim().is_empty() {
            return Err(Error::MissingField("email"));
        }

        Ok(Profile {
            id: Utc::now().timestamp_millis(),
            name: self.name,
            email: self.email,
            phone: self.phone,
            bio: self.bio,
            latitude_degree: self.latitude_degree,
            latitude_direction: self.latitude_direction,
            longitude_degree: self.longitude_degree,
            longitude_direction: self.longitude_direction,
            education: self.education,
            image_url: self.image_url,
            created_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            status: ACTIVE_STATUS.to_string(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn draft(name: &str, email: &str) -> ProfileDraft {
        ProfileDraft {
            name: name.to_string(),
            email: email.to_string(),
            ..ProfileDraft::default()
        }
    }

    #[test]
    fn test_stamp() {
        let profile = draft("Ada", "ada@example.com").stamp().unwrap();

        assert!(profile.id > 0);
        assert_eq!(profile.status, ACTIVE_STATUS);
        assert!(!profile.created_at.is_empty());
    }

    #[test]
    fn test_stamp_requires_name_and_email() {
        assert!(matches!(
            draft("", "ada@example.com").stamp(),
            Err(Error::MissingField("name"))
        ));
        assert!(matches!(
            draft("Ada", "   ").stamp(),
            Err(Error::MissingField("email"))
        ));
    }

    #[test]
    fn test_coordinates_signed_resolution() {
        let mut profile = draft("Ada", "ada@example.com").stamp().unwrap();
        profile.latitude_degree = Some("10".to_string());
        profile.latitude_direction = Some(LatitudeDirection::S);
        profile.longitude_degree = Some("20".to_string());
        profile.longitude_direction = Some(LongitudeDirection::E);

        let coordinates = profile.coordinates().unwrap();

        assert_eq!(coordinates.latitude, -10.0);
        assert_eq!(coordinates.longitude, 20.0);
    }

    #[test]
    fn test_coordinates_need_both_degrees() {
        let mut profile = draft("Ada", "ada@example.com").stamp().unwrap();
        profile.latitude_degree = Some("10".to_string());
        profile.longitude_direction = Some(LongitudeDirection::W);

        assert!(profile.coordinates().is_none());
    }

    #[test]
    fn test_coordinates_missing_direction_stays_positive() {
        let mut profile = draft("Ada", "ada@example.com").stamp().unwrap();
        profile.latitude_degree = Some("33.5".to_string());
        profile.longitude_degree = Some("151".to_string());

        let coordinates = profile.coordinates().unwrap();

        assert_eq!(coordinates.latitude, 33.5);
        assert_eq!(coordinates.longitude, 151.0);
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!(
            LatitudeDirection::parse("s").unwrap(),
            LatitudeDirection::S
        );
        assert_eq!(
            LongitudeDirection::parse(" W ").unwrap(),
            LongitudeDirection::W
        );
        assert!(matches!(
            LatitudeDirection::parse("E"),
            Err(Error::InvalidDirection)
        ));
    }

    #[test]
    fn test_matches_searchable_fields() {
        let mut profile = draft("Ada Lovelace", "ada@example.com")
            .stamp()
            .unwrap();
        profile.bio = Some("Analytical engines".to_string());
        profile.latitude_degree = Some("51".to_string());
        profile.latitude_direction = Some(LatitudeDirection::N);

        assert!(profile.matches("lovelace"));
        assert!(profile.matches("ANALYTICAL"));
        assert!(profile.matches("51° n"));
        assert!(!profile.matches("babbage"));
    }

    #[test]
    fn test_stored_document_shape() {
        let mut profile = draft("Ada", "ada@example.com").stamp().unwrap();
        profile.latitude_degree = Some("10".to_string());
        profile.education = Some(Education {
            field_of_study: Some("Mathematics".to_string()),
            ..Education::default()
        });

        let text = serde_json::to_string(&profile).unwrap();

        // The on-disk document keeps the historical camelCase field names.
        assert!(text.contains("\"latitudeDegree\""));
        assert!(text.contains("\"fieldOfStudy\""));
        assert!(text.contains("\"createdAt\""));
        // Absent optional fields are omitted entirely.
        assert!(!text.contains("imageUrl"));
    }
}
