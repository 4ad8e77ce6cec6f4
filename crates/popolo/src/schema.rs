//! Table-driven schema descriptor
//!
//! This module describes the persisted layout: one table per entity plus the
//! auxiliary tables generated for each owner. Foreign keys are expressed as
//! `<app>.<Model>` paths, so a [`Schema`] can only be built once the host
//! application binding is known.
//!
//! ```text
//! Person ─┬─ PersonContactDetail   (person → contact_details)
//!         ├─ PersonLink            (person → links)
//!         ├─ PersonSource          (person → sources)
//!         ├─ PersonIdentifier      (person → identifiers)
//!         └─ PersonOtherName       (person → other_names)
//! Post ───┬─ PostContactDetail
//!         ├─ PostLink
//!         └─ PostSource
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::config::PopoloConfig;
use crate::error::ConfigError;
use crate::validation::{
    CONTACT_TYPE_MAX, DATE_MAX, EMAIL_MAX, LONG_NOTE_MAX, SHORT_TEXT_MAX, SLUG_MAX, SUMMARY_MAX,
    URL_MAX,
};

/// The four Popolo entities.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Person,
    Organization,
    Post,
    Membership,
}

impl EntityKind {
    /// Every entity, in definition order.
    pub const ALL: [EntityKind; 4] = [
        Self::Person,
        Self::Organization,
        Self::Post,
        Self::Membership,
    ];

    /// Model name (e.g. "Person").
    pub fn name(&self) -> &'static str {
        match self {
            Self::Person => "Person",
            Self::Organization => "Organization",
            Self::Post => "Post",
            Self::Membership => "Membership",
        }
    }

    /// Lowercase name, used as the back-reference field of auxiliary rows.
    pub fn link_name(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Organization => "organization",
            Self::Post => "post",
            Self::Membership => "membership",
        }
    }

    /// Whether the entity also gets identifier and other-name tables.
    pub fn has_extra_info(&self) -> bool {
        matches!(self, Self::Person | Self::Organization)
    }

    /// Auxiliary tables generated for this entity.
    pub fn linked_kinds(&self) -> &'static [LinkedInfoKind] {
        if self.has_extra_info() {
            &LinkedInfoKind::ALL
        } else {
            &LinkedInfoKind::COMMON
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kinds of auxiliary information attached to an entity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LinkedInfoKind {
    ContactDetail,
    Link,
    Source,
    Identifier,
    OtherName,
}

impl LinkedInfoKind {
    /// Common kinds first, extra-info kinds last.
    pub const ALL: [LinkedInfoKind; 5] = [
        Self::ContactDetail,
        Self::Link,
        Self::Source,
        Self::Identifier,
        Self::OtherName,
    ];

    /// Kinds every entity gets.
    pub const COMMON: [LinkedInfoKind; 3] = [Self::ContactDetail, Self::Link, Self::Source];

    /// Suffix of the generated table name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ContactDetail => "ContactDetail",
            Self::Link => "Link",
            Self::Source => "Source",
            Self::Identifier => "Identifier",
            Self::OtherName => "OtherName",
        }
    }

    /// Collection accessor on the owner.
    pub fn related_name(&self) -> &'static str {
        match self {
            Self::ContactDetail => "contact_details",
            Self::Link => "links",
            Self::Source => "sources",
            Self::Identifier => "identifiers",
            Self::OtherName => "other_names",
        }
    }

    /// Whether rows of this kind carry a validity interval.
    pub fn is_dateframeable(&self) -> bool {
        matches!(self, Self::ContactDetail | Self::OtherName)
    }

    /// Whether rows of this kind carry timestamps.
    pub fn is_timestampable(&self) -> bool {
        matches!(self, Self::ContactDetail)
    }

    fn fields(&self) -> &'static [FieldDef] {
        match self {
            Self::ContactDetail => CONTACT_DETAIL_FIELDS,
            Self::Link | Self::Source => LINK_FIELDS,
            Self::Identifier => IDENTIFIER_FIELDS,
            Self::OtherName => OTHER_NAME_FIELDS,
        }
    }
}

/// Reference to a stored entity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: Uuid,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: Uuid) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.link_name(), self.id)
    }
}

/// An identifiable Popolo entity.
pub trait Entity {
    /// Which entity this is.
    const KIND: EntityKind;

    /// Primary key.
    fn id(&self) -> Uuid;

    /// Typed reference to this record.
    fn entity_ref(&self) -> EntityRef {
        EntityRef::new(Self::KIND, self.id())
    }
}

/// Storage type of a column.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Uuid,
    Char,
    Text,
    Slug,
    Email,
    Url,
    Integer,
    Choice,
    PartialDate,
    DateTime,
}

/// A column of a table.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub field_type: FieldType,
    pub max_length: Option<usize>,
    pub nullable: bool,
}

impl FieldDef {
    const fn required(name: &'static str, field_type: FieldType, max_length: usize) -> Self {
        Self {
            name,
            field_type,
            max_length: Some(max_length),
            nullable: false,
        }
    }

    const fn optional(name: &'static str, field_type: FieldType, max_length: usize) -> Self {
        Self {
            name,
            field_type,
            max_length: Some(max_length),
            nullable: true,
        }
    }

    const fn unbounded(name: &'static str, field_type: FieldType, nullable: bool) -> Self {
        Self {
            name,
            field_type,
            max_length: None,
            nullable,
        }
    }
}

/// A foreign key column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    /// Column name
    pub field: &'static str,

    /// Referenced model path (`<app>.<Model>`)
    pub target: String,

    /// Accessor on the referenced model for the reverse relation
    pub related_name: &'static str,

    /// Whether the column may be null
    pub nullable: bool,
}

/// One concrete table of the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDef {
    /// Model name (e.g. "Person", "PersonContactDetail")
    pub name: String,

    /// Qualified model path in the host application
    pub model_path: String,

    /// Entity the table stores, or owns the table for auxiliary tables
    pub entity: EntityKind,

    /// Auxiliary kind, `None` for entity tables
    pub linked: Option<LinkedInfoKind>,

    /// Plain columns
    pub fields: Vec<FieldDef>,

    /// Foreign key columns
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableDef {
    /// Look up a plain column.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a foreign key column.
    pub fn foreign_key(&self, field: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.field == field)
    }
}

const ID_FIELD: FieldDef = FieldDef::unbounded("id", FieldType::Uuid, false);

const DATE_FRAME_FIELDS: &[FieldDef] = &[
    FieldDef::optional("start_date", FieldType::PartialDate, DATE_MAX),
    FieldDef::optional("end_date", FieldType::PartialDate, DATE_MAX),
];

const TIMESTAMP_FIELDS: &[FieldDef] = &[
    FieldDef::unbounded("created_at", FieldType::DateTime, false),
    FieldDef::unbounded("updated_at", FieldType::DateTime, false),
];

const PERSON_FIELDS: &[FieldDef] = &[
    FieldDef::required("name", FieldType::Char, SHORT_TEXT_MAX),
    FieldDef::optional("family_name", FieldType::Char, SHORT_TEXT_MAX),
    FieldDef::optional("given_name", FieldType::Char, SHORT_TEXT_MAX),
    FieldDef::optional("additional_name", FieldType::Char, SHORT_TEXT_MAX),
    FieldDef::optional("honorific_prefix", FieldType::Char, SHORT_TEXT_MAX),
    FieldDef::optional("honorific_suffix", FieldType::Char, SHORT_TEXT_MAX),
    FieldDef::optional("patronymic_name", FieldType::Char, SHORT_TEXT_MAX),
    FieldDef::optional("sort_name", FieldType::Char, SHORT_TEXT_MAX),
    FieldDef::optional("email", FieldType::Email, EMAIL_MAX),
    FieldDef::unbounded("gender", FieldType::Integer, true),
    FieldDef::optional("birth_date", FieldType::PartialDate, DATE_MAX),
    FieldDef::optional("death_date", FieldType::PartialDate, DATE_MAX),
    FieldDef::optional("summary", FieldType::Char, SUMMARY_MAX),
    FieldDef::unbounded("biography", FieldType::Text, true),
    FieldDef::optional("image", FieldType::Url, URL_MAX),
    FieldDef::required("slug", FieldType::Slug, SLUG_MAX),
];

const ORGANIZATION_FIELDS: &[FieldDef] = &[
    FieldDef::required("name", FieldType::Char, SHORT_TEXT_MAX),
    FieldDef::optional("classification", FieldType::Char, SHORT_TEXT_MAX),
    FieldDef::optional("dissolution_date", FieldType::PartialDate, DATE_MAX),
    FieldDef::optional("founding_date", FieldType::PartialDate, DATE_MAX),
    FieldDef::required("slug", FieldType::Slug, SLUG_MAX),
];

const POST_FIELDS: &[FieldDef] = &[
    FieldDef::required("label", FieldType::Char, SHORT_TEXT_MAX),
    FieldDef::optional("role", FieldType::Char, SHORT_TEXT_MAX),
    FieldDef::required("slug", FieldType::Slug, SLUG_MAX),
];

const MEMBERSHIP_FIELDS: &[FieldDef] = &[
    FieldDef::optional("label", FieldType::Char, SHORT_TEXT_MAX),
    FieldDef::optional("role", FieldType::Char, SHORT_TEXT_MAX),
    FieldDef::optional("slug", FieldType::Slug, SLUG_MAX),
];

const CONTACT_DETAIL_FIELDS: &[FieldDef] = &[
    FieldDef::optional("label", FieldType::Char, SHORT_TEXT_MAX),
    FieldDef::required("contact_type", FieldType::Choice, CONTACT_TYPE_MAX),
    FieldDef::required("value", FieldType::Char, SHORT_TEXT_MAX),
    FieldDef::optional("note", FieldType::Char, SHORT_TEXT_MAX),
];

const LINK_FIELDS: &[FieldDef] = &[
    FieldDef::required("url", FieldType::Url, URL_MAX),
    FieldDef::optional("note", FieldType::Char, SHORT_TEXT_MAX),
];

const IDENTIFIER_FIELDS: &[FieldDef] = &[
    FieldDef::required("identifier", FieldType::Char, SHORT_TEXT_MAX),
    FieldDef::optional("scheme", FieldType::Char, SHORT_TEXT_MAX),
];

const OTHER_NAME_FIELDS: &[FieldDef] = &[
    FieldDef::required("name", FieldType::Char, SHORT_TEXT_MAX),
    FieldDef::optional("note", FieldType::Char, LONG_NOTE_MAX),
];

/// The complete persisted layout, bound to a host application.
#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    /// Application owning the concrete tables
    pub app_name: String,

    /// Entity tables followed by their auxiliary tables
    pub tables: Vec<TableDef>,
}

impl Schema {
    /// Build the schema for a host application.
    ///
    /// # Errors
    ///
    /// Fails when the binding is missing or malformed; no table is produced
    /// in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use popolo::{PopoloConfig, Schema};
    ///
    /// let schema = Schema::build(&PopoloConfig::new("civic")).unwrap();
    /// let table = schema.table("PersonContactDetail").unwrap();
    /// let owner = table.foreign_key("person").unwrap();
    /// assert_eq!(owner.target, "civic.Person");
    /// assert_eq!(owner.related_name, "contact_details");
    /// ```
    pub fn build(config: &PopoloConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut tables = Vec::new();
        for entity in EntityKind::ALL {
            tables.push(entity_table(config, entity));
            for kind in entity.linked_kinds() {
                tables.push(linked_table(config, entity, *kind));
            }
        }

        tracing::debug!(
            app = %config.app_name,
            tables = tables.len(),
            "Built Popolo schema"
        );

        Ok(Self {
            app_name: config.app_name.clone(),
            tables,
        })
    }

    /// Build the schema from `POPOLO_APP_NAME`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::build(&PopoloConfig::from_env()?)
    }

    /// Look up a table by model name.
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Auxiliary tables owned by an entity.
    pub fn linked_tables(&self, owner: EntityKind) -> impl Iterator<Item = &TableDef> + '_ {
        self.tables
            .iter()
            .filter(move |t| t.entity == owner && t.linked.is_some())
    }
}

fn entity_table(config: &PopoloConfig, entity: EntityKind) -> TableDef {
    let own_fields = match entity {
        EntityKind::Person => PERSON_FIELDS,
        EntityKind::Organization => ORGANIZATION_FIELDS,
        EntityKind::Post => POST_FIELDS,
        EntityKind::Membership => MEMBERSHIP_FIELDS,
    };

    let fk = |field, target: EntityKind, related_name, nullable| ForeignKey {
        field,
        target: config.model_path(target.name()),
        related_name,
        nullable,
    };
    let foreign_keys = match entity {
        EntityKind::Person => Vec::new(),
        EntityKind::Organization => {
            vec![fk("parent", EntityKind::Organization, "children", true)]
        }
        EntityKind::Post => vec![fk("organization", EntityKind::Organization, "posts", false)],
        EntityKind::Membership => vec![
            fk("person", EntityKind::Person, "memberships", false),
            fk("organization", EntityKind::Organization, "memberships", false),
            fk(
                "on_behalf_of",
                EntityKind::Organization,
                "memberships_on_behalf_of",
                false,
            ),
            fk("post", EntityKind::Post, "memberships", true),
        ],
    };

    TableDef {
        name: entity.name().to_string(),
        model_path: config.model_path(entity.name()),
        entity,
        linked: None,
        fields: compose_fields(&[own_fields, DATE_FRAME_FIELDS, TIMESTAMP_FIELDS]),
        foreign_keys,
    }
}

fn linked_table(config: &PopoloConfig, owner: EntityKind, kind: LinkedInfoKind) -> TableDef {
    let name = format!("{}{}", owner.name(), kind.name());

    let mut parts = vec![kind.fields()];
    if kind.is_dateframeable() {
        parts.push(DATE_FRAME_FIELDS);
    }
    if kind.is_timestampable() {
        parts.push(TIMESTAMP_FIELDS);
    }

    TableDef {
        model_path: config.model_path(&name),
        name,
        entity: owner,
        linked: Some(kind),
        fields: compose_fields(&parts),
        foreign_keys: vec![ForeignKey {
            field: owner.link_name(),
            target: config.model_path(owner.name()),
            related_name: kind.related_name(),
            nullable: false,
        }],
    }
}

fn compose_fields(parts: &[&[FieldDef]]) -> Vec<FieldDef> {
    std::iter::once(ID_FIELD)
        .chain(parts.iter().flat_map(|part| part.iter().copied()))
        .collect()
}
