//! Person domain model
//!
//! This module provides the Person entity: a real person, alive or dead,
//! together with the auxiliary rows a person owns (contact details, links,
//! sources, identifiers and other names).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::behaviors::{DateFrame, Dateframeable, Permalinkable, Timestampable, Timestamps};
use crate::choices::Gender;
use crate::error::ValidationErrors;
use crate::hooks::PreSave;
use crate::linked::linked_tables;
use crate::schema::{Entity, EntityKind};
use crate::validation::{
    check_email, check_max_length, check_optional_length, check_optional_url,
    check_partial_date, require_text, Validate, SHORT_TEXT_MAX, SUMMARY_MAX,
};

/// A real person, alive or dead.
///
/// People take part in organizations through memberships; the person does
/// not own those memberships, it is only referenced by them.
///
/// # Examples
///
/// ```
/// use popolo::{Gender, Person};
///
/// let person = Person::new("Jane Doe")
///     .with_gender(Gender::Female)
///     .with_birth_date("1970-05");
/// assert_eq!(person.slug.as_deref(), Some("jane-doe"));
/// assert_eq!(person.birth_date.as_deref(), Some("1970-05"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Unique identifier for the person
    pub id: Uuid,

    /// A person's preferred full name
    pub name: String,

    /// One or more family names
    pub family_name: Option<String>,

    /// One or more primary given names
    pub given_name: Option<String>,

    /// One or more secondary given names
    pub additional_name: Option<String>,

    /// One or more honorifics preceding a person's name
    pub honorific_prefix: Option<String>,

    /// One or more honorifics following a person's name
    pub honorific_suffix: Option<String>,

    /// One or more patronymic names
    pub patronymic_name: Option<String>,

    /// A name to use in a lexicographically ordered list
    pub sort_name: Option<String>,

    /// A preferred email address
    pub email: Option<String>,

    /// A gender
    pub gender: Option<Gender>,

    /// A date of birth (`YYYY[-MM[-DD]]`)
    pub birth_date: Option<String>,

    /// A date of death (`YYYY[-MM[-DD]]`)
    pub death_date: Option<String>,

    /// A one-line account of a person's life
    pub summary: Option<String>,

    /// An extended account of a person's life
    pub biography: Option<String>,

    /// A URL of a head shot
    pub image: Option<String>,

    /// URL-friendly slug derived from the name
    pub slug: Option<String>,

    #[serde(flatten)]
    pub date_frame: DateFrame,

    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Person {
    /// Creates a new person.
    ///
    /// The person is created with:
    /// - A newly generated UUID v7 ID
    /// - A slug derived from `name`
    /// - Current timestamp for created_at and updated_at
    /// - No other optional field set
    pub fn new(name: impl Into<String>) -> Self {
        let mut person = Self {
            id: Uuid::now_v7(),
            name: name.into(),
            family_name: None,
            given_name: None,
            additional_name: None,
            honorific_prefix: None,
            honorific_suffix: None,
            patronymic_name: None,
            sort_name: None,
            email: None,
            gender: None,
            birth_date: None,
            death_date: None,
            summary: None,
            biography: None,
            image: None,
            slug: None,
            date_frame: DateFrame::default(),
            timestamps: Timestamps::now(),
        };
        person.ensure_slug();
        person
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_birth_date(mut self, date: impl Into<String>) -> Self {
        self.birth_date = Some(date.into());
        self
    }

    pub fn with_death_date(mut self, date: impl Into<String>) -> Self {
        self.death_date = Some(date.into());
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Name used when sorting: `sort_name` if set, otherwise `name`.
    pub fn sorting_name(&self) -> &str {
        self.sort_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.name)
    }
}

impl Entity for Person {
    const KIND: EntityKind = EntityKind::Person;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Permalinkable for Person {
    fn slug_source(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn slug_slot(&mut self) -> &mut Option<String> {
        &mut self.slug
    }

    fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }
}

impl Timestampable for Person {
    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    fn timestamps_mut(&mut self) -> &mut Timestamps {
        &mut self.timestamps
    }
}

impl Dateframeable for Person {
    fn date_frame(&self) -> &DateFrame {
        &self.date_frame
    }

    fn date_frame_mut(&mut self) -> &mut DateFrame {
        &mut self.date_frame
    }
}

impl Validate for Person {
    fn model_name(&self) -> &'static str {
        "Person"
    }

    fn clean_fields(&self, errors: &mut ValidationErrors) {
        require_text(errors, "name", &self.name);
        check_max_length(errors, "name", &self.name, SHORT_TEXT_MAX);

        let names = [
            ("family_name", &self.family_name),
            ("given_name", &self.given_name),
            ("additional_name", &self.additional_name),
            ("honorific_prefix", &self.honorific_prefix),
            ("honorific_suffix", &self.honorific_suffix),
            ("patronymic_name", &self.patronymic_name),
            ("sort_name", &self.sort_name),
        ];
        for (field, value) in names {
            check_optional_length(errors, field, value.as_deref(), SHORT_TEXT_MAX);
        }

        check_email(errors, "email", self.email.as_deref());
        check_partial_date(errors, "birth_date", self.birth_date.as_deref());
        check_partial_date(errors, "death_date", self.death_date.as_deref());
        check_optional_length(errors, "summary", self.summary.as_deref(), SUMMARY_MAX);
        check_optional_url(errors, "image", self.image.as_deref());
        self.clean_slug(errors);
        self.date_frame.clean_fields(errors);
    }
}

impl PreSave for Person {
    fn pre_save(&mut self, now: DateTime<Utc>) {
        self.timestamps.touch(now);
        self.ensure_slug();
    }
}

linked_tables!(Person, person {
    contact_details: PersonContactDetail,
    links: PersonLink,
    sources: PersonSource,
    identifiers: PersonIdentifier,
    other_names: PersonOtherName,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choices::ContactType;
    use crate::linked::{ContactDetail, LinkedRecord, OtherName};

    #[test]
    fn test_person_creation() {
        let person = Person::new("Jane Doe");

        assert_eq!(person.name, "Jane Doe");
        assert_eq!(person.slug.as_deref(), Some("jane-doe"));
        assert_eq!(person.timestamps.created_at, person.timestamps.updated_at);
        assert!(person.full_clean().is_ok());
    }

    #[test]
    fn test_birth_and_death_date_shape() {
        let person = Person::new("Jane Doe")
            .with_birth_date("12 May 1950")
            .with_death_date("1990-2-3");
        let errors = person.full_clean().unwrap_err();

        assert!(errors.has_error("birth_date", "invalid_birth_date"));
        assert!(errors.has_error("death_date", "invalid_death_date"));
    }

    #[test]
    fn test_calendar_validity_not_checked() {
        let person = Person::new("Jane Doe").with_death_date("1990-02-30");
        assert!(person.full_clean().is_ok());
    }

    #[test]
    fn test_all_failures_reported_together() {
        let mut person = Person::new("")
            .with_email("not-an-email")
            .with_image("head shot");
        person.family_name = Some("x".repeat(SHORT_TEXT_MAX + 1));
        person.date_frame = DateFrame::new(Some("2001".into()), Some("2000".into()));

        let errors = person.full_clean().unwrap_err();
        assert_eq!(errors.model, "Person");
        assert!(errors.has_error("name", "blank"));
        assert!(errors.has_error("slug", "blank"));
        assert!(errors.has_error("email", "invalid"));
        assert!(errors.has_error("image", "invalid"));
        assert!(errors.has_error("family_name", "max_length"));
        assert!(errors.has_error("end_date", "date_range"));
    }

    #[test]
    fn test_pre_save_keeps_existing_slug() {
        let mut person = Person::new("Jane Doe");
        person.name = "Jane Smith".into();
        let later = person.timestamps.created_at + chrono::Duration::seconds(1);
        person.pre_save(later);

        assert_eq!(person.slug.as_deref(), Some("jane-doe"));
        assert_eq!(person.timestamps.updated_at, later);
    }

    #[test]
    fn test_sorting_name() {
        let mut person = Person::new("Jane Doe");
        assert_eq!(person.sorting_name(), "Jane Doe");
        person.sort_name = Some("Doe, Jane".into());
        assert_eq!(person.sorting_name(), "Doe, Jane");
    }

    #[test]
    fn test_generated_rows() {
        let person = Person::new("Jane Doe");
        let row = PersonContactDetail::new(
            person.id,
            ContactDetail::new(ContactType::Phone, "+1 555 0100"),
        );

        assert_eq!(row.person, person.id);
        assert_eq!(row.owner_ref(), person.entity_ref());
        assert_eq!(PersonContactDetail::owner_field(), "person");
        assert_eq!(PersonContactDetail::related_name(), "contact_details");
        assert_eq!(PersonOtherName::related_name(), "other_names");
        assert_eq!(row.model_name(), "PersonContactDetail");
        assert!(row.full_clean().is_ok());

        let orphan = PersonOtherName::new(Uuid::nil(), OtherName::new("J. Doe"));
        assert!(orphan.full_clean().unwrap_err().has_error("person", "null"));
    }

    #[test]
    fn test_generated_row_serialization() {
        let person = Person::new("Jane Doe");
        let row = PersonContactDetail::new(
            person.id,
            ContactDetail::new(ContactType::Email, "jane@example.org"),
        );

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["person"], serde_json::json!(person.id));
        assert_eq!(json["contact_type"], "email");
        assert_eq!(json["value"], "jane@example.org");
        assert!(json.get("info").is_none());

        let back: PersonContactDetail = serde_json::from_value(json).unwrap();
        assert_eq!(back, row);
    }
}
