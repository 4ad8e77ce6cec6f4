//! Post domain model
//!
//! A post is a position that exists independently of the person holding it.
//! Every post belongs to exactly one organization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::behaviors::{DateFrame, Dateframeable, Permalinkable, Timestampable, Timestamps};
use crate::error::ValidationErrors;
use crate::hooks::PreSave;
use crate::linked::linked_tables;
use crate::schema::{Entity, EntityKind};
use crate::validation::{
    check_max_length, check_optional_length, require_reference, require_text, Validate,
    SHORT_TEXT_MAX,
};

/// A position within an organization.
///
/// # Examples
///
/// ```
/// use popolo::{Organization, Post};
///
/// let org = Organization::new("City Council");
/// let post = Post::new(org.id, "Chairperson").with_role("Chair");
/// assert_eq!(post.organization, Some(org.id));
/// assert_eq!(post.slug.as_deref(), Some("chairperson"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier for the post
    pub id: Uuid,

    /// A label describing the post
    pub label: String,

    /// The function that the holder of the post fulfills
    pub role: Option<String>,

    /// The organization in which the post is held (required)
    pub organization: Option<Uuid>,

    /// URL-friendly slug derived from the label
    pub slug: Option<String>,

    #[serde(flatten)]
    pub date_frame: DateFrame,

    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Post {
    /// Creates a new post in an organization.
    ///
    /// # Arguments
    ///
    /// * `organization` - The organization the post belongs to
    /// * `label` - Label of the post; the slug is derived from it
    pub fn new(organization: Uuid, label: impl Into<String>) -> Self {
        let mut post = Self {
            id: Uuid::now_v7(),
            label: label.into(),
            role: None,
            organization: Some(organization),
            slug: None,
            date_frame: DateFrame::default(),
            timestamps: Timestamps::now(),
        };
        post.ensure_slug();
        post
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}

impl Entity for Post {
    const KIND: EntityKind = EntityKind::Post;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Permalinkable for Post {
    fn slug_source(&self) -> Option<&str> {
        Some(&self.label)
    }

    fn slug_slot(&mut self) -> &mut Option<String> {
        &mut self.slug
    }

    fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }
}

impl Timestampable for Post {
    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    fn timestamps_mut(&mut self) -> &mut Timestamps {
        &mut self.timestamps
    }
}

impl Dateframeable for Post {
    fn date_frame(&self) -> &DateFrame {
        &self.date_frame
    }

    fn date_frame_mut(&mut self) -> &mut DateFrame {
        &mut self.date_frame
    }
}

impl Validate for Post {
    fn model_name(&self) -> &'static str {
        "Post"
    }

    fn clean_fields(&self, errors: &mut ValidationErrors) {
        require_text(errors, "label", &self.label);
        check_max_length(errors, "label", &self.label, SHORT_TEXT_MAX);
        check_optional_length(errors, "role", self.role.as_deref(), SHORT_TEXT_MAX);
        require_reference(errors, "organization", self.organization);
        self.clean_slug(errors);
        self.date_frame.clean_fields(errors);
    }
}

impl PreSave for Post {
    fn pre_save(&mut self, now: DateTime<Utc>) {
        self.timestamps.touch(now);
        self.ensure_slug();
    }
}

linked_tables!(Post, post {
    contact_details: PostContactDetail,
    links: PostLink,
    sources: PostSource,
});
