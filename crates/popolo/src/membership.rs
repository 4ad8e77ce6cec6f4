//! Membership domain model
//!
//! A membership links a person to an organization, optionally through a
//! post, over a period of time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::behaviors::{DateFrame, Dateframeable, Permalinkable, Timestampable, Timestamps};
use crate::error::ValidationErrors;
use crate::hooks::PreSave;
use crate::linked::linked_tables;
use crate::schema::{Entity, EntityKind};
use crate::validation::{check_optional_length, require_reference, Validate, SHORT_TEXT_MAX};

/// A relationship between a person and an organization.
///
/// The person, the organization and the organization on whose behalf the
/// person acts are all required. Relations are optional in the struct so
/// that records received from outside can be checked and rejected with a
/// field-level error instead of failing to deserialize.
///
/// # Examples
///
/// ```
/// use popolo::{Membership, Organization, Person, Validate};
///
/// let person = Person::new("Jane Doe");
/// let party = Organization::new("Green Party");
/// let council = Organization::new("City Council");
///
/// let membership = Membership::new(person.id, council.id, party.id)
///     .with_role("Councillor")
///     .valid_between(Some("2019-05"), None);
/// assert!(membership.full_clean().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    /// Unique membership ID
    pub id: Uuid,

    /// A label describing the membership
    pub label: Option<String>,

    /// The role that the person fulfills in the organization
    pub role: Option<String>,

    /// The person who is a party to the relationship
    pub person: Option<Uuid>,

    /// The organization that is a party to the relationship
    pub organization: Option<Uuid>,

    /// The organization on whose behalf the person is a party to the relationship
    pub on_behalf_of: Option<Uuid>,

    /// The post held by the person in the organization through this membership
    pub post: Option<Uuid>,

    /// URL-friendly slug derived from the label, when there is one
    pub slug: Option<String>,

    #[serde(flatten)]
    pub date_frame: DateFrame,

    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Membership {
    /// Creates a new membership.
    ///
    /// # Arguments
    ///
    /// * `person` - The member
    /// * `organization` - The organization the person is a member of
    /// * `on_behalf_of` - The organization the person represents
    pub fn new(person: Uuid, organization: Uuid, on_behalf_of: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            label: None,
            role: None,
            person: Some(person),
            organization: Some(organization),
            on_behalf_of: Some(on_behalf_of),
            post: None,
            slug: None,
            date_frame: DateFrame::default(),
            timestamps: Timestamps::now(),
        }
    }

    /// Set the label; the slug is derived from it if none exists yet.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self.ensure_slug();
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Hold a post through this membership.
    pub fn with_post(mut self, post: Uuid) -> Self {
        self.post = Some(post);
        self
    }

    /// Restrict the period of the membership.
    pub fn valid_between(mut self, start: Option<&str>, end: Option<&str>) -> Self {
        self.date_frame = DateFrame::new(start.map(Into::into), end.map(Into::into));
        self
    }
}

impl Entity for Membership {
    const KIND: EntityKind = EntityKind::Membership;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Permalinkable for Membership {
    fn slug_source(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn slug_slot(&mut self) -> &mut Option<String> {
        &mut self.slug
    }

    fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    fn requires_slug(&self) -> bool {
        false
    }
}

impl Timestampable for Membership {
    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    fn timestamps_mut(&mut self) -> &mut Timestamps {
        &mut self.timestamps
    }
}

impl Dateframeable for Membership {
    fn date_frame(&self) -> &DateFrame {
        &self.date_frame
    }

    fn date_frame_mut(&mut self) -> &mut DateFrame {
        &mut self.date_frame
    }
}

impl Validate for Membership {
    fn model_name(&self) -> &'static str {
        "Membership"
    }

    fn clean_fields(&self, errors: &mut ValidationErrors) {
        check_optional_length(errors, "label", self.label.as_deref(), SHORT_TEXT_MAX);
        check_optional_length(errors, "role", self.role.as_deref(), SHORT_TEXT_MAX);
        require_reference(errors, "person", self.person);
        require_reference(errors, "organization", self.organization);
        require_reference(errors, "on_behalf_of", self.on_behalf_of);
        self.clean_slug(errors);
        self.date_frame.clean_fields(errors);
    }
}

impl PreSave for Membership {
    fn pre_save(&mut self, now: DateTime<Utc>) {
        self.timestamps.touch(now);
        self.ensure_slug();
    }
}

linked_tables!(Membership, membership {
    contact_details: MembershipContactDetail,
    links: MembershipLink,
    sources: MembershipSource,
});
