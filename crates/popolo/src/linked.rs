//! Auxiliary information attached to entities
//!
//! Every entity owns contact details, links and sources; people and
//! organizations also own identifiers and other names. The payloads are
//! defined once here. Each owner module then declares its concrete row types
//! with [`linked_tables!`], which produces one struct per owner and kind
//! (`PersonContactDetail`, `PostLink`, ...) carrying a mandatory
//! back-reference named after the owner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::behaviors::{DateFrame, Dateframeable, Timestampable, Timestamps};
use crate::choices::ContactType;
use crate::error::ValidationErrors;
use crate::hooks::PreSave;
use crate::schema::{Entity, EntityRef, LinkedInfoKind};
use crate::validation::{
    check_max_length, check_optional_length, check_url, require_text, Validate, LONG_NOTE_MAX,
    SHORT_TEXT_MAX,
};

/// A means of contacting an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactDetail {
    /// A human-readable label for the contact detail
    pub label: Option<String>,

    /// A type of medium, e.g. 'fax' or 'email'
    pub contact_type: ContactType,

    /// A value, e.g. a phone number or email address
    pub value: String,

    /// A note, e.g. for grouping contact details by physical location
    pub note: Option<String>,

    #[serde(flatten)]
    pub date_frame: DateFrame,

    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl ContactDetail {
    pub fn new(contact_type: ContactType, value: impl Into<String>) -> Self {
        Self {
            label: None,
            contact_type,
            value: value.into(),
            note: None,
            date_frame: DateFrame::default(),
            timestamps: Timestamps::now(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Restrict the validity of the contact detail.
    pub fn valid_between(mut self, start: Option<&str>, end: Option<&str>) -> Self {
        self.date_frame = DateFrame::new(start.map(Into::into), end.map(Into::into));
        self
    }
}

impl Validate for ContactDetail {
    fn model_name(&self) -> &'static str {
        "ContactDetail"
    }

    fn clean_fields(&self, errors: &mut ValidationErrors) {
        check_optional_length(errors, "label", self.label.as_deref(), SHORT_TEXT_MAX);
        require_text(errors, "value", &self.value);
        check_max_length(errors, "value", &self.value, SHORT_TEXT_MAX);
        check_optional_length(errors, "note", self.note.as_deref(), SHORT_TEXT_MAX);
        self.date_frame.clean_fields(errors);
    }
}

impl Timestampable for ContactDetail {
    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    fn timestamps_mut(&mut self) -> &mut Timestamps {
        &mut self.timestamps
    }
}

impl Dateframeable for ContactDetail {
    fn date_frame(&self) -> &DateFrame {
        &self.date_frame
    }

    fn date_frame_mut(&mut self) -> &mut DateFrame {
        &mut self.date_frame
    }
}

/// A URL. Used for both links and sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// A URL
    pub url: String,

    /// A note, e.g. 'Wikipedia page'
    pub note: Option<String>,
}

impl Link {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

impl Validate for Link {
    fn model_name(&self) -> &'static str {
        "Link"
    }

    fn clean_fields(&self, errors: &mut ValidationErrors) {
        require_text(errors, "url", &self.url);
        check_url(errors, "url", &self.url);
        check_optional_length(errors, "note", self.note.as_deref(), SHORT_TEXT_MAX);
    }
}

/// An issued identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    /// An issued identifier, e.g. a DUNS number
    pub identifier: String,

    /// An identifier scheme, e.g. DUNS
    pub scheme: Option<String>,
}

impl Identifier {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            scheme: None,
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }
}

impl Validate for Identifier {
    fn model_name(&self) -> &'static str {
        "Identifier"
    }

    fn clean_fields(&self, errors: &mut ValidationErrors) {
        require_text(errors, "identifier", &self.identifier);
        check_max_length(errors, "identifier", &self.identifier, SHORT_TEXT_MAX);
        check_optional_length(errors, "scheme", self.scheme.as_deref(), SHORT_TEXT_MAX);
    }
}

/// An alternate or former name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherName {
    /// An alternate or former name
    pub name: String,

    /// A note, e.g. 'Birth name'
    pub note: Option<String>,

    #[serde(flatten)]
    pub date_frame: DateFrame,
}

impl OtherName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            note: None,
            date_frame: DateFrame::default(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Restrict the period in which the name was used.
    pub fn valid_between(mut self, start: Option<&str>, end: Option<&str>) -> Self {
        self.date_frame = DateFrame::new(start.map(Into::into), end.map(Into::into));
        self
    }
}

impl Validate for OtherName {
    fn model_name(&self) -> &'static str {
        "OtherName"
    }

    fn clean_fields(&self, errors: &mut ValidationErrors) {
        require_text(errors, "name", &self.name);
        check_max_length(errors, "name", &self.name, SHORT_TEXT_MAX);
        check_optional_length(errors, "note", self.note.as_deref(), LONG_NOTE_MAX);
        self.date_frame.clean_fields(errors);
    }
}

impl Dateframeable for OtherName {
    fn date_frame(&self) -> &DateFrame {
        &self.date_frame
    }

    fn date_frame_mut(&mut self) -> &mut DateFrame {
        &mut self.date_frame
    }
}

/// Any auxiliary payload, as held by a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkedInfo {
    ContactDetail(ContactDetail),
    Link(Link),
    Identifier(Identifier),
    OtherName(OtherName),
}

impl From<ContactDetail> for LinkedInfo {
    fn from(value: ContactDetail) -> Self {
        Self::ContactDetail(value)
    }
}

impl From<Link> for LinkedInfo {
    fn from(value: Link) -> Self {
        Self::Link(value)
    }
}

impl From<Identifier> for LinkedInfo {
    fn from(value: Identifier) -> Self {
        Self::Identifier(value)
    }
}

impl From<OtherName> for LinkedInfo {
    fn from(value: OtherName) -> Self {
        Self::OtherName(value)
    }
}

/// A payload type that can be stored as [`LinkedInfo`].
pub trait LinkedPayload: Validate + Clone + Into<LinkedInfo> + Send + Sync + 'static {
    /// Refresh timestamps, for payloads that have them.
    fn touch(&mut self, _now: DateTime<Utc>) {}

    /// Borrow the payload back out of a stored value.
    fn from_info(info: &LinkedInfo) -> Option<&Self>;
}

impl LinkedPayload for ContactDetail {
    fn touch(&mut self, now: DateTime<Utc>) {
        self.timestamps.touch(now);
    }

    fn from_info(info: &LinkedInfo) -> Option<&Self> {
        match info {
            LinkedInfo::ContactDetail(value) => Some(value),
            _ => None,
        }
    }
}

impl LinkedPayload for Link {
    fn from_info(info: &LinkedInfo) -> Option<&Self> {
        match info {
            LinkedInfo::Link(value) => Some(value),
            _ => None,
        }
    }
}

impl LinkedPayload for Identifier {
    fn from_info(info: &LinkedInfo) -> Option<&Self> {
        match info {
            LinkedInfo::Identifier(value) => Some(value),
            _ => None,
        }
    }
}

impl LinkedPayload for OtherName {
    fn from_info(info: &LinkedInfo) -> Option<&Self> {
        match info {
            LinkedInfo::OtherName(value) => Some(value),
            _ => None,
        }
    }
}

/// A concrete auxiliary row bound to one owner.
///
/// Implemented by the types [`linked_tables!`] generates; the owner field of
/// each type is named after the owner (`person`, `organization`, ...).
pub trait LinkedRecord: PreSave + Clone + Send + Sync + 'static {
    /// Entity that owns rows of this type.
    type Owner: Entity;

    /// Payload carried by the row.
    type Info: LinkedPayload;

    /// Auxiliary kind.
    const KIND: LinkedInfoKind;

    fn id(&self) -> Uuid;

    /// Id of the owning record.
    fn owner_id(&self) -> Uuid;

    fn info(&self) -> &Self::Info;

    /// Reassemble a row from stored parts.
    fn from_parts(id: Uuid, owner_id: Uuid, info: Self::Info) -> Self;

    /// Typed reference to the owner.
    fn owner_ref(&self) -> EntityRef {
        EntityRef::new(<Self::Owner as Entity>::KIND, self.owner_id())
    }

    /// Name of the back-reference field.
    fn owner_field() -> &'static str {
        <Self::Owner as Entity>::KIND.link_name()
    }

    /// Name of the owner's collection accessor.
    fn related_name() -> &'static str {
        Self::KIND.related_name()
    }
}

/// Declare one auxiliary row type.
macro_rules! linked_record {
    ($name:ident, $what:literal, $owner:ty, $owner_field:ident, $payload:ty, $kind:expr) => {
        #[doc = concat!($what, " of a [`", stringify!($owner), "`].")]
        #[derive(Debug, Clone, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $name {
            /// Unique identifier
            pub id: ::uuid::Uuid,

            /// Owning record
            pub $owner_field: ::uuid::Uuid,

            #[serde(flatten)]
            pub info: $payload,
        }

        impl $name {
            #[doc = concat!("Attach a new row to a [`", stringify!($owner), "`].")]
            pub fn new($owner_field: ::uuid::Uuid, info: $payload) -> Self {
                Self {
                    id: ::uuid::Uuid::now_v7(),
                    $owner_field,
                    info,
                }
            }
        }

        impl $crate::validation::Validate for $name {
            fn model_name(&self) -> &'static str {
                stringify!($name)
            }

            fn clean_fields(&self, errors: &mut $crate::error::ValidationErrors) {
                $crate::validation::require_reference(
                    errors,
                    stringify!($owner_field),
                    Some(self.$owner_field),
                );
                $crate::validation::Validate::clean_fields(&self.info, errors);
            }
        }

        impl $crate::hooks::PreSave for $name {
            fn pre_save(&mut self, now: ::chrono::DateTime<::chrono::Utc>) {
                $crate::linked::LinkedPayload::touch(&mut self.info, now);
            }
        }

        impl $crate::linked::LinkedRecord for $name {
            type Owner = $owner;
            type Info = $payload;
            const KIND: $crate::schema::LinkedInfoKind = $kind;

            fn id(&self) -> ::uuid::Uuid {
                self.id
            }

            fn owner_id(&self) -> ::uuid::Uuid {
                self.$owner_field
            }

            fn info(&self) -> &$payload {
                &self.info
            }

            fn from_parts(id: ::uuid::Uuid, owner_id: ::uuid::Uuid, info: $payload) -> Self {
                Self {
                    id,
                    $owner_field: owner_id,
                    info,
                }
            }
        }
    };
}

/// Declare the auxiliary row types of an owner.
///
/// The identifier and other-name entries are given only for owners that
/// carry extra information.
macro_rules! linked_tables {
    ($owner:ty, $owner_field:ident {
        contact_details: $contact:ident,
        links: $link:ident,
        sources: $source:ident
        $(, identifiers: $identifier:ident, other_names: $other_name:ident)?
        $(,)?
    }) => {
        $crate::linked::linked_record!(
            $contact,
            "Contact detail",
            $owner,
            $owner_field,
            $crate::linked::ContactDetail,
            $crate::schema::LinkedInfoKind::ContactDetail
        );
        $crate::linked::linked_record!(
            $link,
            "Link",
            $owner,
            $owner_field,
            $crate::linked::Link,
            $crate::schema::LinkedInfoKind::Link
        );
        $crate::linked::linked_record!(
            $source,
            "Source",
            $owner,
            $owner_field,
            $crate::linked::Link,
            $crate::schema::LinkedInfoKind::Source
        );
        $(
            $crate::linked::linked_record!(
                $identifier,
                "Identifier",
                $owner,
                $owner_field,
                $crate::linked::Identifier,
                $crate::schema::LinkedInfoKind::Identifier
            );
            $crate::linked::linked_record!(
                $other_name,
                "Other name",
                $owner,
                $owner_field,
                $crate::linked::OtherName,
                $crate::schema::LinkedInfoKind::OtherName
            );
        )?
    };
}

pub(crate) use linked_record;
pub(crate) use linked_tables;
