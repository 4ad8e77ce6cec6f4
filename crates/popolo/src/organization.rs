//! Organization domain model
//!
//! This module provides the Organization entity. Organizations form a tree
//! through their optional parent, hold posts and are a party to memberships.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::behaviors::{DateFrame, Dateframeable, Permalinkable, Timestampable, Timestamps};
use crate::error::ValidationErrors;
use crate::hooks::PreSave;
use crate::linked::linked_tables;
use crate::schema::{Entity, EntityKind};
use crate::validation::{
    check_max_length, check_optional_length, check_partial_date, require_text, Validate,
    SHORT_TEXT_MAX,
};

/// A group with a common purpose or reason for existence that goes beyond
/// the set of people belonging to it.
///
/// # Architecture
///
/// ```text
/// Organization
///   ├─ Children (via parent)
///   ├─ Posts
///   ├─ Memberships (as organization or on behalf of)
///   └─ Contact details, links, sources, identifiers, other names
/// ```
///
/// # Examples
///
/// ```
/// use popolo::Organization;
///
/// let parliament = Organization::new("National Parliament").founded("1848-11-06");
/// let committee = Organization::new("Finance Committee")
///     .with_classification("committee")
///     .with_parent(parliament.id);
/// assert_eq!(committee.parent, Some(parliament.id));
/// assert_eq!(committee.slug.as_deref(), Some("finance-committee"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    /// Unique identifier for the organization
    pub id: Uuid,

    /// A primary name, e.g. a legally recognized name
    pub name: String,

    /// An organization category, e.g. committee
    pub classification: Option<String>,

    /// The organization that contains this organization
    pub parent: Option<Uuid>,

    /// A date of dissolution (`YYYY[-MM[-DD]]`)
    pub dissolution_date: Option<String>,

    /// A date of founding (`YYYY[-MM[-DD]]`)
    pub founding_date: Option<String>,

    /// URL-friendly slug derived from the name
    pub slug: Option<String>,

    #[serde(flatten)]
    pub date_frame: DateFrame,

    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Organization {
    /// Creates a new top-level organization.
    ///
    /// The organization is created with:
    /// - A newly generated UUID v7 ID
    /// - A slug derived from `name`
    /// - No parent
    /// - Current timestamp for created_at and updated_at
    pub fn new(name: impl Into<String>) -> Self {
        let mut organization = Self {
            id: Uuid::now_v7(),
            name: name.into(),
            classification: None,
            parent: None,
            dissolution_date: None,
            founding_date: None,
            slug: None,
            date_frame: DateFrame::default(),
            timestamps: Timestamps::now(),
        };
        organization.ensure_slug();
        organization
    }

    pub fn with_classification(mut self, classification: impl Into<String>) -> Self {
        self.classification = Some(classification.into());
        self
    }

    /// Place the organization under another one.
    pub fn with_parent(mut self, parent: Uuid) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn founded(mut self, date: impl Into<String>) -> Self {
        self.founding_date = Some(date.into());
        self
    }

    pub fn dissolved(mut self, date: impl Into<String>) -> Self {
        self.dissolution_date = Some(date.into());
        self
    }

    /// Whether the organization sits at the top of its hierarchy.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Whether a dissolution date has been recorded.
    pub fn is_dissolved(&self) -> bool {
        self.dissolution_date.as_deref().is_some_and(|d| !d.is_empty())
    }
}

impl Entity for Organization {
    const KIND: EntityKind = EntityKind::Organization;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Permalinkable for Organization {
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

impl Timestampable for Organization {
    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    fn timestamps_mut(&mut self) -> &mut Timestamps {
        &mut self.timestamps
    }
}

impl Dateframeable for Organization {
    fn date_frame(&self) -> &DateFrame {
        &self.date_frame
    }

    fn date_frame_mut(&mut self) -> &mut DateFrame {
        &mut self.date_frame
    }
}

impl Validate for Organization {
    fn model_name(&self) -> &'static str {
        "Organization"
    }

    fn clean_fields(&self, errors: &mut ValidationErrors) {
        require_text(errors, "name", &self.name);
        check_max_length(errors, "name", &self.name, SHORT_TEXT_MAX);
        check_optional_length(
            errors,
            "classification",
            self.classification.as_deref(),
            SHORT_TEXT_MAX,
        );
        check_partial_date(errors, "dissolution_date", self.dissolution_date.as_deref());
        check_partial_date(errors, "founding_date", self.founding_date.as_deref());
        self.clean_slug(errors);
        self.date_frame.clean_fields(errors);
    }
}

impl PreSave for Organization {
    fn pre_save(&mut self, now: DateTime<Utc>) {
        self.timestamps.touch(now);
        self.ensure_slug();
    }
}

linked_tables!(Organization, organization {
    contact_details: OrganizationContactDetail,
    links: OrganizationLink,
    sources: OrganizationSource,
    identifiers: OrganizationIdentifier,
    other_names: OrganizationOtherName,
});
