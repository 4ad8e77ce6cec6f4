//! Persistence layer
//!
//! This module provides the [`PopoloStore`] abstraction and an in-memory
//! implementation. Every save runs the pre-save hook (timestamps, slug,
//! full validation) and then the referential checks before anything is
//! written; a rejected save leaves the store untouched.
//!
//! Deletes cascade the way relational foreign keys do: removing a record
//! removes its auxiliary rows and every record that cannot exist without it.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::behaviors::Permalinkable;
use crate::error::{PopoloError, PopoloResult};
use crate::hooks::{prepare_for_save, PreSave};
use crate::linked::{LinkedInfo, LinkedPayload, LinkedRecord};
use crate::membership::Membership;
use crate::organization::Organization;
use crate::person::Person;
use crate::post::Post;
use crate::schema::{Entity, EntityKind, EntityRef, LinkedInfoKind};

/// Store trait for validated persistence of Popolo records.
#[async_trait]
pub trait PopoloStore: Send + Sync {
    /// Validate and insert or replace a person.
    async fn save_person(&self, person: Person) -> PopoloResult<Person>;

    /// Validate and insert or replace an organization.
    ///
    /// The parent, when set, must already exist.
    async fn save_organization(&self, organization: Organization) -> PopoloResult<Organization>;

    /// Validate and insert or replace a post. Its organization must exist.
    async fn save_post(&self, post: Post) -> PopoloResult<Post>;

    /// Validate and insert or replace a membership.
    ///
    /// Person, organization, on-behalf-of organization and (when set) post
    /// must all exist.
    async fn save_membership(&self, membership: Membership) -> PopoloResult<Membership>;

    async fn get_person(&self, id: Uuid) -> Option<Person>;
    async fn get_organization(&self, id: Uuid) -> Option<Organization>;
    async fn get_post(&self, id: Uuid) -> Option<Post>;
    async fn get_membership(&self, id: Uuid) -> Option<Membership>;

    async fn person_by_slug(&self, slug: &str) -> Option<Person>;
    async fn organization_by_slug(&self, slug: &str) -> Option<Organization>;
    async fn post_by_slug(&self, slug: &str) -> Option<Post>;

    /// Delete a person with its auxiliary rows and memberships.
    async fn delete_person(&self, id: Uuid) -> PopoloResult<()>;

    /// Delete an organization with its auxiliary rows, descendant
    /// organizations, posts and memberships.
    async fn delete_organization(&self, id: Uuid) -> PopoloResult<()>;

    /// Delete a post with its auxiliary rows and the memberships holding it.
    async fn delete_post(&self, id: Uuid) -> PopoloResult<()>;

    /// Delete a membership with its auxiliary rows.
    async fn delete_membership(&self, id: Uuid) -> PopoloResult<()>;

    /// Memberships in which the person takes part.
    async fn memberships_of_person(&self, person: Uuid) -> Vec<Membership>;

    /// Memberships of an organization.
    async fn memberships_of_organization(&self, organization: Uuid) -> Vec<Membership>;

    /// Memberships held on behalf of an organization.
    async fn memberships_on_behalf_of(&self, organization: Uuid) -> Vec<Membership>;

    /// Memberships through which a post is held.
    async fn memberships_of_post(&self, post: Uuid) -> Vec<Membership>;

    /// Posts of an organization.
    async fn posts_of_organization(&self, organization: Uuid) -> Vec<Post>;

    /// Direct children of an organization.
    async fn children_of_organization(&self, organization: Uuid) -> Vec<Organization>;

    /// Store statistics.
    async fn stats(&self) -> StoreStats;
}

/// Typed access to auxiliary rows.
///
/// Kept apart from [`PopoloStore`] because its methods are generic over the
/// row type, which would stop the entity store from being held as
/// `Arc<dyn PopoloStore>`.
#[async_trait]
pub trait LinkedStore: PopoloStore {
    /// Validate and attach an auxiliary row to its owner, which must exist.
    ///
    /// Re-adding a row replaces it. An id already used by a row of another
    /// auxiliary table is rejected with [`PopoloError::IdConflict`].
    async fn add_linked<R: LinkedRecord>(&self, row: R) -> PopoloResult<R>;

    /// Auxiliary rows of one type owned by a record (the owner's
    /// `contact_details`, `links`, ... collection).
    async fn linked<R: LinkedRecord>(&self, owner: Uuid) -> Vec<R>;

    /// Remove a single auxiliary row.
    async fn remove_linked<R: LinkedRecord>(&self, id: Uuid) -> PopoloResult<()>;
}

/// Row counts per table family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub persons: usize,
    pub organizations: usize,
    pub posts: usize,
    pub memberships: usize,
    /// Auxiliary rows of every kind and owner
    pub linked_rows: usize,
}

struct LinkedRow {
    kind: LinkedInfoKind,
    owner: EntityRef,
    info: LinkedInfo,
}

impl LinkedRow {
    /// Whether the row lives in the table of `R`.
    fn is_a<R: LinkedRecord>(&self) -> bool {
        self.kind == R::KIND && self.owner.kind == <R::Owner as Entity>::KIND
    }

    fn model(&self) -> String {
        format!("{}{}", self.owner.kind.name(), self.kind.name())
    }
}

#[derive(Default)]
struct Tables {
    persons: HashMap<Uuid, Person>,
    organizations: HashMap<Uuid, Organization>,
    posts: HashMap<Uuid, Post>,
    memberships: HashMap<Uuid, Membership>,
    linked: HashMap<Uuid, LinkedRow>,
}

impl Tables {
    fn contains(&self, target: EntityRef) -> bool {
        match target.kind {
            EntityKind::Person => self.persons.contains_key(&target.id),
            EntityKind::Organization => self.organizations.contains_key(&target.id),
            EntityKind::Post => self.posts.contains_key(&target.id),
            EntityKind::Membership => self.memberships.contains_key(&target.id),
        }
    }

    fn check_reference(&self, field: &str, kind: EntityKind, id: Option<Uuid>) -> PopoloResult<()> {
        match id {
            Some(id) if !self.contains(EntityRef::new(kind, id)) => {
                tracing::warn!(field, %kind, %id, "Rejected save: unknown reference");
                Err(PopoloError::UnknownReference {
                    field: field.to_string(),
                    kind,
                    id,
                })
            }
            _ => Ok(()),
        }
    }

    fn remove_linked_of(&mut self, owner: EntityRef) {
        self.linked.retain(|_, row| row.owner != owner);
    }

    fn remove_membership(&mut self, id: Uuid) {
        if self.memberships.remove(&id).is_some() {
            self.remove_linked_of(EntityRef::new(EntityKind::Membership, id));
        }
    }

    fn remove_memberships_where(&mut self, predicate: impl Fn(&Membership) -> bool) {
        let doomed: Vec<Uuid> = self
            .memberships
            .values()
            .filter(|m| predicate(m))
            .map(|m| m.id)
            .collect();
        for id in doomed {
            self.remove_membership(id);
        }
    }

    fn remove_post(&mut self, id: Uuid) {
        if self.posts.remove(&id).is_some() {
            self.remove_linked_of(EntityRef::new(EntityKind::Post, id));
            self.remove_memberships_where(|m| m.post == Some(id));
        }
    }

    fn remove_person(&mut self, id: Uuid) {
        if self.persons.remove(&id).is_some() {
            self.remove_linked_of(EntityRef::new(EntityKind::Person, id));
            self.remove_memberships_where(|m| m.person == Some(id));
        }
    }

    /// The organization and every organization below it.
    fn subtree(&self, root: Uuid) -> HashSet<Uuid> {
        let mut found = HashSet::from([root]);
        let mut frontier = vec![root];
        while let Some(current) = frontier.pop() {
            for org in self.organizations.values() {
                if org.parent == Some(current) && found.insert(org.id) {
                    frontier.push(org.id);
                }
            }
        }
        found
    }

    fn remove_organization(&mut self, id: Uuid) {
        let doomed = self.subtree(id);

        let posts: Vec<Uuid> = self
            .posts
            .values()
            .filter(|p| p.organization.is_some_and(|o| doomed.contains(&o)))
            .map(|p| p.id)
            .collect();
        for post in posts {
            self.remove_post(post);
        }

        self.remove_memberships_where(|m| {
            m.organization.is_some_and(|o| doomed.contains(&o))
                || m.on_behalf_of.is_some_and(|o| doomed.contains(&o))
        });

        for org in doomed {
            self.organizations.remove(&org);
            self.remove_linked_of(EntityRef::new(EntityKind::Organization, org));
        }
    }
}

/// Run the pre-save hook, logging rejections.
fn prepare<T: PreSave>(record: &mut T) -> PopoloResult<()> {
    prepare_for_save(record).map_err(|errors| {
        tracing::warn!(
            model = %errors.model,
            failures = errors.errors.len(),
            "Rejected save: validation failed"
        );
        PopoloError::from(errors)
    })
}

/// Reject a slug already held by another record of the same kind.
///
/// Records without a slug (unlabelled memberships) never conflict.
fn check_unique_slug<T>(existing: &HashMap<Uuid, T>, record: &T) -> PopoloResult<()>
where
    T: Entity + Permalinkable,
{
    let Some(slug) = record.slug() else {
        return Ok(());
    };
    let taken = existing
        .values()
        .any(|other| other.id() != record.id() && other.slug() == Some(slug));
    if taken {
        tracing::warn!(kind = %T::KIND, slug, "Rejected save: duplicate slug");
        return Err(PopoloError::DuplicateSlug {
            kind: T::KIND,
            slug: slug.to_string(),
        });
    }
    Ok(())
}

fn by_slug<T: Permalinkable + Clone>(map: &HashMap<Uuid, T>, slug: &str) -> Option<T> {
    map.values().find(|r| r.slug() == Some(slug)).cloned()
}

fn sorted<T: Entity>(mut records: Vec<T>) -> Vec<T> {
    records.sort_by_key(|r| r.id());
    records
}

fn linked_model<R: LinkedRecord>() -> String {
    format!("{}{}", <R::Owner as Entity>::KIND.name(), R::KIND.name())
}

/// In-memory store implementation.
///
/// Suitable for tests and single-process use. A host application backed by
/// a database implements [`PopoloStore`] over its own tables and reuses
/// [`prepare_for_save`] for the pre-save step.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PopoloStore for MemoryStore {
    async fn save_person(&self, mut person: Person) -> PopoloResult<Person> {
        prepare(&mut person)?;

        let mut tables = self.tables.write().await;
        check_unique_slug(&tables.persons, &person)?;
        tables.persons.insert(person.id, person.clone());

        tracing::debug!(person_id = %person.id, slug = ?person.slug, "Saved person");
        Ok(person)
    }

    async fn save_organization(&self, mut organization: Organization) -> PopoloResult<Organization> {
        prepare(&mut organization)?;

        let mut tables = self.tables.write().await;
        tables.check_reference("parent", EntityKind::Organization, organization.parent)?;
        check_unique_slug(&tables.organizations, &organization)?;
        tables
            .organizations
            .insert(organization.id, organization.clone());

        tracing::debug!(
            organization_id = %organization.id,
            slug = ?organization.slug,
            "Saved organization"
        );
        Ok(organization)
    }

    async fn save_post(&self, mut post: Post) -> PopoloResult<Post> {
        prepare(&mut post)?;

        let mut tables = self.tables.write().await;
        tables.check_reference("organization", EntityKind::Organization, post.organization)?;
        check_unique_slug(&tables.posts, &post)?;
        tables.posts.insert(post.id, post.clone());

        tracing::debug!(post_id = %post.id, slug = ?post.slug, "Saved post");
        Ok(post)
    }

    async fn save_membership(&self, mut membership: Membership) -> PopoloResult<Membership> {
        prepare(&mut membership)?;

        let mut tables = self.tables.write().await;
        tables.check_reference("person", EntityKind::Person, membership.person)?;
        tables.check_reference("organization", EntityKind::Organization, membership.organization)?;
        tables.check_reference("on_behalf_of", EntityKind::Organization, membership.on_behalf_of)?;
        tables.check_reference("post", EntityKind::Post, membership.post)?;
        check_unique_slug(&tables.memberships, &membership)?;
        tables.memberships.insert(membership.id, membership.clone());

        tracing::debug!(membership_id = %membership.id, "Saved membership");
        Ok(membership)
    }

    async fn get_person(&self, id: Uuid) -> Option<Person> {
        self.tables.read().await.persons.get(&id).cloned()
    }

    async fn get_organization(&self, id: Uuid) -> Option<Organization> {
        self.tables.read().await.organizations.get(&id).cloned()
    }

    async fn get_post(&self, id: Uuid) -> Option<Post> {
        self.tables.read().await.posts.get(&id).cloned()
    }

    async fn get_membership(&self, id: Uuid) -> Option<Membership> {
        self.tables.read().await.memberships.get(&id).cloned()
    }

    async fn person_by_slug(&self, slug: &str) -> Option<Person> {
        by_slug(&self.tables.read().await.persons, slug)
    }

    async fn organization_by_slug(&self, slug: &str) -> Option<Organization> {
        by_slug(&self.tables.read().await.organizations, slug)
    }

    async fn post_by_slug(&self, slug: &str) -> Option<Post> {
        by_slug(&self.tables.read().await.posts, slug)
    }

    async fn delete_person(&self, id: Uuid) -> PopoloResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.persons.contains_key(&id) {
            return Err(PopoloError::NotFound {
                model: EntityKind::Person.name().to_string(),
                id,
            });
        }
        tables.remove_person(id);
        tracing::debug!(person_id = %id, "Deleted person");
        Ok(())
    }

    async fn delete_organization(&self, id: Uuid) -> PopoloResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.organizations.contains_key(&id) {
            return Err(PopoloError::NotFound {
                model: EntityKind::Organization.name().to_string(),
                id,
            });
        }
        tables.remove_organization(id);
        tracing::debug!(organization_id = %id, "Deleted organization");
        Ok(())
    }

    async fn delete_post(&self, id: Uuid) -> PopoloResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&id) {
            return Err(PopoloError::NotFound {
                model: EntityKind::Post.name().to_string(),
                id,
            });
        }
        tables.remove_post(id);
        tracing::debug!(post_id = %id, "Deleted post");
        Ok(())
    }

    async fn delete_membership(&self, id: Uuid) -> PopoloResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.memberships.contains_key(&id) {
            return Err(PopoloError::NotFound {
                model: EntityKind::Membership.name().to_string(),
                id,
            });
        }
        tables.remove_membership(id);
        tracing::debug!(membership_id = %id, "Deleted membership");
        Ok(())
    }

    async fn memberships_of_person(&self, person: Uuid) -> Vec<Membership> {
        let tables = self.tables.read().await;
        sorted(
            tables
                .memberships
                .values()
                .filter(|m| m.person == Some(person))
                .cloned()
                .collect(),
        )
    }

    async fn memberships_of_organization(&self, organization: Uuid) -> Vec<Membership> {
        let tables = self.tables.read().await;
        sorted(
            tables
                .memberships
                .values()
                .filter(|m| m.organization == Some(organization))
                .cloned()
                .collect(),
        )
    }

    async fn memberships_on_behalf_of(&self, organization: Uuid) -> Vec<Membership> {
        let tables = self.tables.read().await;
        sorted(
            tables
                .memberships
                .values()
                .filter(|m| m.on_behalf_of == Some(organization))
                .cloned()
                .collect(),
        )
    }

    async fn memberships_of_post(&self, post: Uuid) -> Vec<Membership> {
        let tables = self.tables.read().await;
        sorted(
            tables
                .memberships
                .values()
                .filter(|m| m.post == Some(post))
                .cloned()
                .collect(),
        )
    }

    async fn posts_of_organization(&self, organization: Uuid) -> Vec<Post> {
        let tables = self.tables.read().await;
        sorted(
            tables
                .posts
                .values()
                .filter(|p| p.organization == Some(organization))
                .cloned()
                .collect(),
        )
    }

    async fn children_of_organization(&self, organization: Uuid) -> Vec<Organization> {
        let tables = self.tables.read().await;
        sorted(
            tables
                .organizations
                .values()
                .filter(|o| o.parent == Some(organization))
                .cloned()
                .collect(),
        )
    }

    async fn stats(&self) -> StoreStats {
        let tables = self.tables.read().await;
        StoreStats {
            persons: tables.persons.len(),
            organizations: tables.organizations.len(),
            posts: tables.posts.len(),
            memberships: tables.memberships.len(),
            linked_rows: tables.linked.len(),
        }
    }
}

#[async_trait]
impl LinkedStore for MemoryStore {
    async fn add_linked<R: LinkedRecord>(&self, mut row: R) -> PopoloResult<R> {
        prepare(&mut row)?;

        let owner = row.owner_ref();
        let mut tables = self.tables.write().await;
        tables.check_reference(R::owner_field(), owner.kind, Some(owner.id))?;
        if let Some(existing) = tables.linked.get(&row.id()).filter(|r| !r.is_a::<R>()) {
            let model = existing.model();
            tracing::warn!(
                row_id = %row.id(),
                existing = %model,
                "Rejected save: id belongs to another auxiliary table"
            );
            return Err(PopoloError::IdConflict { model, id: row.id() });
        }
        tables.linked.insert(
            row.id(),
            LinkedRow {
                kind: R::KIND,
                owner,
                info: row.info().clone().into(),
            },
        );

        tracing::debug!(
            row_id = %row.id(),
            owner = %owner,
            collection = R::related_name(),
            "Attached linked row"
        );
        Ok(row)
    }

    async fn linked<R: LinkedRecord>(&self, owner: Uuid) -> Vec<R> {
        let owner_ref = EntityRef::new(<R::Owner as Entity>::KIND, owner);
        let tables = self.tables.read().await;
        let mut rows: Vec<R> = tables
            .linked
            .iter()
            .filter(|(_, row)| row.kind == R::KIND && row.owner == owner_ref)
            .filter_map(|(id, row)| {
                <R::Info as LinkedPayload>::from_info(&row.info)
                    .map(|info| R::from_parts(*id, owner, info.clone()))
            })
            .collect();
        rows.sort_by_key(|r| r.id());
        rows
    }

    async fn remove_linked<R: LinkedRecord>(&self, id: Uuid) -> PopoloResult<()> {
        let mut tables = self.tables.write().await;
        let matches = tables.linked.get(&id).is_some_and(LinkedRow::is_a::<R>);
        if !matches {
            return Err(PopoloError::NotFound {
                model: linked_model::<R>(),
                id,
            });
        }
        tables.linked.remove(&id);
        tracing::debug!(row_id = %id, collection = R::related_name(), "Removed linked row");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_fills_slug_and_touches() {
        let store = MemoryStore::new();
        let mut person = Person::new("Jane Doe");
        person.slug = None;
        let created = person.timestamps.created_at;

        let saved = store.save_person(person).await.unwrap();
        assert_eq!(saved.slug.as_deref(), Some("jane-doe"));
        assert!(saved.timestamps.updated_at >= created);
        assert_eq!(store.get_person(saved.id).await, Some(saved));
    }

    #[tokio::test]
    async fn test_rejected_save_leaves_store_untouched() {
        let store = MemoryStore::new();
        let org = Organization::new("Acme").founded("1999-1");

        let err = store.save_organization(org).await.unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(err
            .validation_errors()
            .unwrap()
            .has_error("founding_date", "invalid_founding_date"));
        assert_eq!(store.stats().await, StoreStats::default());
    }

    #[tokio::test]
    async fn test_duplicate_slug() {
        let store = MemoryStore::new();
        store.save_person(Person::new("Jane Doe")).await.unwrap();

        let err = store.save_person(Person::new("Jane  Doe")).await.unwrap_err();
        assert!(matches!(
            err,
            PopoloError::DuplicateSlug { kind: EntityKind::Person, ref slug } if slug == "jane-doe"
        ));
    }

    #[tokio::test]
    async fn test_resave_same_record_keeps_slug() {
        let store = MemoryStore::new();
        let mut person = store.save_person(Person::new("Jane Doe")).await.unwrap();
        person.name = "Jane Smith".into();

        let person = store.save_person(person).await.unwrap();
        assert_eq!(person.slug.as_deref(), Some("jane-doe"));
        assert_eq!(store.stats().await.persons, 1);
        assert!(store.person_by_slug("jane-doe").await.is_some());
        assert!(store.person_by_slug("jane-smith").await.is_none());
    }

    #[tokio::test]
    async fn test_organization_parent_must_exist() {
        let store = MemoryStore::new();
        let orphan = Organization::new("Subcommittee").with_parent(Uuid::now_v7());

        let err = store.save_organization(orphan).await.unwrap_err();
        assert!(matches!(
            err,
            PopoloError::UnknownReference { ref field, kind: EntityKind::Organization, .. } if field == "parent"
        ));
    }

    #[tokio::test]
    async fn test_subtree_deletion() {
        let store = MemoryStore::new();
        let root = store.save_organization(Organization::new("Parliament")).await.unwrap();
        let child = store
            .save_organization(Organization::new("Committee").with_parent(root.id))
            .await
            .unwrap();
        let grandchild = store
            .save_organization(Organization::new("Subcommittee").with_parent(child.id))
            .await
            .unwrap();
        let other = store.save_organization(Organization::new("Senate")).await.unwrap();

        assert_eq!(store.children_of_organization(root.id).await, vec![child.clone()]);

        store.delete_organization(child.id).await.unwrap();
        assert!(store.get_organization(grandchild.id).await.is_none());
        assert!(store.get_organization(root.id).await.is_some());
        assert!(store.get_organization(other.id).await.is_some());
        assert!(store.children_of_organization(root.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_store_behind_trait_object() {
        let store: Arc<dyn PopoloStore> = Arc::new(MemoryStore::new());
        let person = store.save_person(Person::new("Jane Doe")).await.unwrap();

        assert_eq!(store.stats().await.persons, 1);
        assert_eq!(store.get_person(person.id).await, Some(person));
    }

    #[tokio::test]
    async fn test_delete_missing_record() {
        let store = MemoryStore::new();
        let id = Uuid::now_v7();
        let err = store.delete_post(id).await.unwrap_err();
        assert!(matches!(err, PopoloError::NotFound { ref model, id: missing } if model == "Post" && missing == id));
    }
}
