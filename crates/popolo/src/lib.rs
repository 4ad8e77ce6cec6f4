//! # Popolo
//!
//! This crate provides the Popolo civic data schema: people, organizations,
//! posts and memberships, together with the auxiliary information each of
//! them owns (contact details, links, sources, identifiers, other names).
//!
//! ## Overview
//!
//! The popolo crate handles:
//! - **Entities**: [`Person`], [`Organization`], [`Post`], [`Membership`]
//! - **Auxiliary rows**: one concrete type per owner and kind
//!   (`PersonContactDetail`, `OrganizationIdentifier`, `PostSource`, ...)
//! - **Behaviors**: timestamps, validity date frames and slugs, shared by
//!   every entity
//! - **Validation**: field constraints and partial dates (`YYYY[-MM[-DD]]`),
//!   enforced before every save
//! - **Schema**: the table layout and foreign keys, bound to a host
//!   application through [`PopoloConfig`]
//! - **Store**: the [`PopoloStore`] and [`LinkedStore`] traits and an in-memory
//!   implementation
//!
//! ## Architecture
//!
//! ```text
//! Organization ─┬─ parent ─→ Organization (children)
//!               └─ Posts
//!
//! Membership ─┬─ person ───────→ Person
//!             ├─ organization ─→ Organization
//!             ├─ on_behalf_of ─→ Organization
//!             └─ post ─────────→ Post (optional)
//!
//! Person, Organization ─→ contact_details, links, sources,
//!                         identifiers, other_names
//! Post, Membership ─────→ contact_details, links, sources
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use popolo::{Membership, MemoryStore, Organization, Person, PopoloStore, Post};
//!
//! # async fn run() -> popolo::PopoloResult<()> {
//! let store = MemoryStore::new();
//!
//! let parliament = store.save_organization(Organization::new("Parliament")).await?;
//! let jane = store.save_person(Person::new("Jane Doe")).await?;
//! let chair = store.save_post(Post::new(parliament.id, "Chairperson")).await?;
//!
//! let membership = Membership::new(jane.id, parliament.id, parliament.id).with_post(chair.id);
//! store.save_membership(membership).await?;
//!
//! assert_eq!(store.memberships_of_person(jane.id).await.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! The schema is bound to a host application named by the
//! `POPOLO_APP_NAME` environment variable (see [`PopoloConfig::from_env`]).
//! Building a [`Schema`] without it fails with [`ConfigError::MissingSetting`].

pub mod behaviors;
pub mod choices;
pub mod config;
pub mod dates;
pub mod error;
pub mod hooks;
pub mod linked;
pub mod membership;
pub mod organization;
pub mod person;
pub mod post;
pub mod schema;
pub mod store;
pub mod validation;

// Re-export main types for convenience
pub use behaviors::{
    slugify, DateFrame, Dateframeable, Permalinkable, Timestampable, Timestamps,
};
pub use choices::{ContactType, Gender};
pub use config::{PopoloConfig, APP_NAME_VAR};
pub use dates::{is_partial_date, PartialDate, PartialDateError};
pub use error::{ConfigError, FieldError, PopoloError, PopoloResult, ValidationErrors};
pub use hooks::{prepare_for_save, prepare_for_save_at, PreSave};
pub use linked::{ContactDetail, Identifier, Link, LinkedInfo, LinkedPayload, LinkedRecord, OtherName};
pub use membership::{
    Membership, MembershipContactDetail, MembershipLink, MembershipSource,
};
pub use organization::{
    Organization, OrganizationContactDetail, OrganizationIdentifier, OrganizationLink,
    OrganizationOtherName, OrganizationSource,
};
pub use person::{
    Person, PersonContactDetail, PersonIdentifier, PersonLink, PersonOtherName, PersonSource,
};
pub use post::{Post, PostContactDetail, PostLink, PostSource};
pub use schema::{
    Entity, EntityKind, EntityRef, FieldDef, FieldType, ForeignKey, LinkedInfoKind, Schema,
    TableDef,
};
pub use store::{LinkedStore, MemoryStore, PopoloStore, StoreStats};
pub use validation::Validate;
