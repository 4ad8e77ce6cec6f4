//! Reusable record capabilities
//!
//! Entities are composed from three independent capabilities:
//!
//! - [`Timestamps`] / [`Timestampable`]: creation and last-modification times
//! - [`DateFrame`] / [`Dateframeable`]: the interval during which a record is valid
//! - [`Permalinkable`]: a stable slug derived from a designated source field
//!
//! Each one embeds its own fields and validates them without knowledge of the
//! others.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::dates::PartialDate;
use crate::error::ValidationErrors;
use crate::validation::{check_max_length, check_partial_date, SLUG_MAX};

static SLUG_STRIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s-]").expect("valid slug strip regex"));
static SLUG_HYPHENATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-\s]+").expect("valid slug hyphenate regex"));

/// Creation and modification times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last saved
    pub updated_at: DateTime<Utc>,
}

impl Timestamps {
    /// Both times set to now.
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the record as modified at `at`.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at.max(self.created_at);
    }
}

impl Default for Timestamps {
    fn default() -> Self {
        Self::now()
    }
}

/// Records that carry [`Timestamps`].
pub trait Timestampable {
    fn timestamps(&self) -> &Timestamps;
    fn timestamps_mut(&mut self) -> &mut Timestamps;
}

/// Validity interval of a record.
///
/// Both ends are optional partial dates. When both are present the start
/// must not come after the end, compared at the coarser precision of the two.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFrame {
    /// The date when the validity of the item starts
    pub start_date: Option<String>,

    /// The date when the validity of the item ends
    pub end_date: Option<String>,
}

impl DateFrame {
    /// Frame with the given ends.
    pub fn new(start_date: Option<String>, end_date: Option<String>) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    /// Check both ends and their order.
    pub fn clean_fields(&self, errors: &mut ValidationErrors) {
        check_partial_date(errors, "start_date", self.start_date.as_deref());
        check_partial_date(errors, "end_date", self.end_date.as_deref());

        let start = self.start_date.as_deref().and_then(|s| s.parse::<PartialDate>().ok());
        let end = self.end_date.as_deref().and_then(|s| s.parse::<PartialDate>().ok());
        if let (Some(start), Some(end)) = (start, end) {
            if start.cmp_coarse(&end) == Ordering::Greater {
                errors.add(
                    "end_date",
                    "date_range",
                    format!("end date {} precedes start date {}", end, start),
                );
            }
        }
    }
}

/// Records that carry a [`DateFrame`].
pub trait Dateframeable {
    fn date_frame(&self) -> &DateFrame;
    fn date_frame_mut(&mut self) -> &mut DateFrame;
}

/// Records addressable by a slug derived from one of their fields.
///
/// The slug is derived only while it is empty, so a record keeps its
/// permalink when the source field is later edited.
pub trait Permalinkable {
    /// Field the slug is derived from.
    fn slug_source(&self) -> Option<&str>;

    /// Storage for the slug.
    fn slug_slot(&mut self) -> &mut Option<String>;

    /// Current slug.
    fn slug(&self) -> Option<&str>;

    /// Whether a record without a slug is invalid.
    fn requires_slug(&self) -> bool {
        true
    }

    /// Fill an empty slug from the slug source.
    ///
    /// Lowercasing can lengthen text, so the derived slug is cut to
    /// [`SLUG_MAX`] characters.
    fn ensure_slug(&mut self) {
        let derived = match self.slug() {
            Some(slug) if !slug.is_empty() => return,
            _ => self
                .slug_source()
                .map(|source| truncate_slug(&slugify(source)))
                .filter(|s| !s.is_empty()),
        };
        *self.slug_slot() = derived;
    }

    /// Check the slug is present when required and not too long.
    fn clean_slug(&self, errors: &mut ValidationErrors) {
        match self.slug() {
            Some(slug) if !slug.is_empty() => {
                check_max_length(errors, "slug", slug, SLUG_MAX);
                if slugify(slug) != slug {
                    errors.add("slug", "invalid", "Enter a valid slug.");
                }
            }
            _ if self.requires_slug() => errors.add(
                "slug",
                "blank",
                "A slug could not be derived: the slug source is blank.",
            ),
            _ => {}
        }
    }
}

/// Convert text to a URL-friendly slug.
///
/// Characters that are neither word characters, whitespace nor hyphens are
/// dropped, the rest is lowercased and runs of whitespace or hyphens become a
/// single `-`.
///
/// ```
/// use popolo::behaviors::slugify;
///
/// assert_eq!(slugify("Jane Doe"), "jane-doe");
/// assert_eq!(slugify("  Chair -- Person! "), "chair-person");
/// ```
pub fn slugify(value: &str) -> String {
    let stripped = SLUG_STRIP_RE.replace_all(value, "");
    let lowered = stripped.trim().to_lowercase();
    SLUG_HYPHENATE_RE
        .replace_all(&lowered, "-")
        .trim_matches(|c| c == '-' || c == '_')
        .to_string()
}

/// Cut a slug to [`SLUG_MAX`] characters without leaving a trailing separator.
fn truncate_slug(slug: &str) -> String {
    match slug.char_indices().nth(SLUG_MAX) {
        Some((end, _)) => slug[..end].trim_end_matches(['-', '_']).to_string(),
        None => slug.to_string(),
    }
}
