//! End-to-end tests for the save pipeline and cascading deletes.
//!
//! These tests drive the in-memory store the way a host application would:
//! build records, save them, attach auxiliary rows and delete owners,
//! checking at every step what ends up persisted.
//!
//! Scenarios:
//! 1. Slug derivation on save
//! 2. Required membership parties
//! 3. Partial-date shape checks (calendar validity is not checked)
//! 4. Orphan auxiliary rows
//! 5. Cascades from person, organization and post deletes
//! 6. Row ids shared across auxiliary tables

use popolo::{
    ContactDetail, ContactType, EntityKind, Identifier, Link, LinkedRecord, LinkedStore, Membership,
    MembershipSource, MemoryStore, Organization, OrganizationIdentifier, OrganizationLink,
    OtherName, Person, PersonContactDetail, PersonOtherName, PopoloError, PopoloStore, Post,
    PostLink, StoreStats,
};
use uuid::Uuid;

/// A parliament with one post, one person holding it and one party.
struct Fixture {
    store: MemoryStore,
    parliament: Organization,
    party: Organization,
    chair: Post,
    jane: Person,
    membership: Membership,
}

impl Fixture {
    async fn new() -> Self {
        let store = MemoryStore::new();
        let parliament = store
            .save_organization(Organization::new("Parliament").with_classification("legislature"))
            .await
            .unwrap();
        let party = store
            .save_organization(Organization::new("Green Party").with_classification("party"))
            .await
            .unwrap();
        let chair = store
            .save_post(Post::new(parliament.id, "Chairperson").with_role("Chair"))
            .await
            .unwrap();
        let jane = store.save_person(Person::new("Jane Doe")).await.unwrap();
        let membership = store
            .save_membership(
                Membership::new(jane.id, parliament.id, party.id)
                    .with_post(chair.id)
                    .with_label("Chair of Parliament")
                    .valid_between(Some("2019-05"), None),
            )
            .await
            .unwrap();

        Self {
            store,
            parliament,
            party,
            chair,
            jane,
            membership,
        }
    }
}

#[tokio::test]
async fn test_slugs_derived_on_save() {
    let fx = Fixture::new().await;

    assert_eq!(fx.jane.slug.as_deref(), Some("jane-doe"));
    assert_eq!(fx.chair.slug.as_deref(), Some("chairperson"));
    assert_eq!(fx.membership.slug.as_deref(), Some("chair-of-parliament"));

    let found = fx.store.person_by_slug("jane-doe").await.unwrap();
    assert_eq!(found.id, fx.jane.id);
    let found = fx.store.post_by_slug("chairperson").await.unwrap();
    assert_eq!(found.id, fx.chair.id);
    let found = fx.store.organization_by_slug("green-party").await.unwrap();
    assert_eq!(found.id, fx.party.id);
}

#[tokio::test]
async fn test_membership_parties_required() {
    let fx = Fixture::new().await;

    let mut membership = Membership::new(fx.jane.id, fx.parliament.id, fx.party.id);
    membership.on_behalf_of = None;
    let err = fx.store.save_membership(membership).await.unwrap_err();
    let errors = err.validation_errors().unwrap();
    assert_eq!(errors.model, "Membership");
    assert!(errors.has_error("on_behalf_of", "null"));

    let mut membership = Membership::new(fx.jane.id, fx.parliament.id, fx.party.id);
    membership.person = None;
    membership.organization = None;
    let err = fx.store.save_membership(membership).await.unwrap_err();
    let errors = err.validation_errors().unwrap();
    assert!(errors.has_error("person", "null"));
    assert!(errors.has_error("organization", "null"));

    assert_eq!(fx.store.stats().await.memberships, 1);
}

#[tokio::test]
async fn test_membership_references_must_exist() {
    let fx = Fixture::new().await;
    let ghost = Uuid::now_v7();

    let err = fx
        .store
        .save_membership(Membership::new(ghost, fx.parliament.id, fx.party.id))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PopoloError::UnknownReference { ref field, kind: EntityKind::Person, id } if field == "person" && id == ghost
    ));

    let err = fx
        .store
        .save_membership(Membership::new(fx.jane.id, fx.parliament.id, fx.party.id).with_post(ghost))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "UNKNOWN_REFERENCE");
}

#[tokio::test]
async fn test_partial_dates() {
    let store = MemoryStore::new();

    // Shape only: an impossible calendar day is accepted.
    let person = store
        .save_person(Person::new("Jane Doe").with_death_date("1990-02-30"))
        .await
        .unwrap();
    assert_eq!(person.death_date.as_deref(), Some("1990-02-30"));

    for good in ["2001", "2001-07", "2001-07-15"] {
        let org = Organization::new(format!("Org {}", good)).founded(good);
        assert!(store.save_organization(org).await.is_ok(), "{} rejected", good);
    }

    for bad in ["01-07-2001", "2001/07/15", "2001-7", "July 2001", "20011"] {
        let org = Organization::new(format!("Bad {}", bad)).founded(bad);
        let err = store.save_organization(org).await.unwrap_err();
        assert!(
            err.validation_errors()
                .unwrap()
                .has_error("founding_date", "invalid_founding_date"),
            "{} accepted",
            bad
        );
    }
}

#[tokio::test]
async fn test_date_frame_order() {
    let fx = Fixture::new().await;

    let reversed = Membership::new(fx.jane.id, fx.parliament.id, fx.party.id)
        .valid_between(Some("2020-01-01"), Some("2019"));
    let err = fx.store.save_membership(reversed).await.unwrap_err();
    assert!(err.validation_errors().unwrap().has_error("end_date", "date_range"));

    // Same year at different precision is not a reversal.
    let coarse = Membership::new(fx.jane.id, fx.parliament.id, fx.party.id)
        .valid_between(Some("2020-05"), Some("2020"));
    assert!(fx.store.save_membership(coarse).await.is_ok());
}

#[tokio::test]
async fn test_linked_rows_require_owner() {
    let store = MemoryStore::new();
    let orphan = PersonContactDetail::new(
        Uuid::now_v7(),
        ContactDetail::new(ContactType::Phone, "+1 555 0100"),
    );

    let err = store.add_linked(orphan).await.unwrap_err();
    assert!(matches!(
        err,
        PopoloError::UnknownReference { ref field, kind: EntityKind::Person, .. } if field == "person"
    ));
    assert_eq!(store.stats().await.linked_rows, 0);

    let nil_owner = PostLink::new(Uuid::nil(), Link::new("https://example.org"));
    let err = store.add_linked(nil_owner).await.unwrap_err();
    assert!(err.validation_errors().unwrap().has_error("post", "null"));
}

#[tokio::test]
async fn test_linked_collections() {
    let fx = Fixture::new().await;

    let phone = fx
        .store
        .add_linked(PersonContactDetail::new(
            fx.jane.id,
            ContactDetail::new(ContactType::Phone, "+1 555 0100").with_label("Office"),
        ))
        .await
        .unwrap();
    fx.store
        .add_linked(PersonOtherName::new(
            fx.jane.id,
            OtherName::new("Jane Roe").with_note("Birth name"),
        ))
        .await
        .unwrap();
    fx.store
        .add_linked(OrganizationIdentifier::new(
            fx.parliament.id,
            Identifier::new("Q11204").with_scheme("wikidata"),
        ))
        .await
        .unwrap();

    let contacts: Vec<PersonContactDetail> = fx.store.linked(fx.jane.id).await;
    assert_eq!(contacts, vec![phone.clone()]);
    assert_eq!(contacts[0].info.contact_type.label(), "Telephone");

    let names: Vec<PersonOtherName> = fx.store.linked(fx.jane.id).await;
    assert_eq!(names.len(), 1);
    assert_eq!(names[0].info.name, "Jane Roe");

    // Links and sources share a payload but are separate collections.
    fx.store
        .add_linked(OrganizationLink::new(
            fx.parliament.id,
            Link::new("https://parliament.example.org"),
        ))
        .await
        .unwrap();
    let sources: Vec<popolo::OrganizationSource> = fx.store.linked(fx.parliament.id).await;
    assert!(sources.is_empty());

    fx.store
        .remove_linked::<PersonContactDetail>(phone.id)
        .await
        .unwrap();
    let contacts: Vec<PersonContactDetail> = fx.store.linked(fx.jane.id).await;
    assert!(contacts.is_empty());

    let err = fx
        .store
        .remove_linked::<PersonContactDetail>(phone.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PopoloError::NotFound { ref model, .. } if model == "PersonContactDetail"
    ));
}

#[tokio::test]
async fn test_delete_person_cascades() {
    let fx = Fixture::new().await;
    fx.store
        .add_linked(PersonOtherName::new(fx.jane.id, OtherName::new("Jane Roe")))
        .await
        .unwrap();
    fx.store
        .add_linked(MembershipSource::new(
            fx.membership.id,
            Link::new("https://example.org/minutes"),
        ))
        .await
        .unwrap();

    fx.store.delete_person(fx.jane.id).await.unwrap();

    assert!(fx.store.get_person(fx.jane.id).await.is_none());
    assert!(fx.store.get_membership(fx.membership.id).await.is_none());
    assert!(fx.store.memberships_of_post(fx.chair.id).await.is_empty());
    let names: Vec<PersonOtherName> = fx.store.linked(fx.jane.id).await;
    assert!(names.is_empty());

    let stats = fx.store.stats().await;
    assert_eq!(stats.linked_rows, 0);
    assert_eq!(stats.organizations, 2);
    assert_eq!(stats.posts, 1);
}

#[tokio::test]
async fn test_delete_organization_cascades() {
    let fx = Fixture::new().await;
    let committee = fx
        .store
        .save_organization(Organization::new("Budget Committee").with_parent(fx.parliament.id))
        .await
        .unwrap();
    let seat = fx
        .store
        .save_post(Post::new(committee.id, "Rapporteur"))
        .await
        .unwrap();
    fx.store
        .add_linked(PostLink::new(seat.id, Link::new("https://example.org/seat")))
        .await
        .unwrap();
    fx.store
        .add_linked(OrganizationLink::new(
            committee.id,
            Link::new("https://example.org/committee"),
        ))
        .await
        .unwrap();

    assert_eq!(
        fx.store.posts_of_organization(fx.parliament.id).await,
        vec![fx.chair.clone()]
    );
    assert_eq!(
        fx.store.memberships_on_behalf_of(fx.party.id).await,
        vec![fx.membership.clone()]
    );

    fx.store.delete_organization(fx.parliament.id).await.unwrap();

    assert_eq!(
        fx.store.stats().await,
        StoreStats {
            persons: 1,
            organizations: 1,
            posts: 0,
            memberships: 0,
            linked_rows: 0,
        }
    );
    assert!(fx.store.get_organization(committee.id).await.is_none());
    assert!(fx.store.get_organization(fx.party.id).await.is_some());
}

#[tokio::test]
async fn test_delete_party_removes_memberships_on_its_behalf() {
    let fx = Fixture::new().await;

    fx.store.delete_organization(fx.party.id).await.unwrap();

    assert!(fx.store.memberships_of_organization(fx.parliament.id).await.is_empty());
    assert!(fx.store.get_post(fx.chair.id).await.is_some());
}

#[tokio::test]
async fn test_delete_post_keeps_organization() {
    let fx = Fixture::new().await;

    fx.store.delete_post(fx.chair.id).await.unwrap();

    assert!(fx.store.get_membership(fx.membership.id).await.is_none());
    assert!(fx.store.get_organization(fx.parliament.id).await.is_some());
    assert!(fx.store.memberships_of_person(fx.jane.id).await.is_empty());
}

#[tokio::test]
async fn test_delete_membership() {
    let fx = Fixture::new().await;
    let source = fx
        .store
        .add_linked(MembershipSource::new(
            fx.membership.id,
            Link::new("https://example.org/gazette"),
        ))
        .await
        .unwrap();
    assert_eq!(source.owner_id(), fx.membership.id);

    fx.store.delete_membership(fx.membership.id).await.unwrap();
    assert_eq!(fx.store.stats().await.linked_rows, 0);

    let err = fx.store.delete_membership(fx.membership.id).await.unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");
}

#[tokio::test]
async fn test_duplicate_membership_label() {
    let fx = Fixture::new().await;

    let again = Membership::new(fx.jane.id, fx.parliament.id, fx.party.id)
        .with_label("Chair of Parliament");
    let err = fx.store.save_membership(again).await.unwrap_err();
    assert!(matches!(
        err,
        PopoloError::DuplicateSlug { kind: EntityKind::Membership, .. }
    ));

    // Unlabelled memberships have no slug and never conflict.
    for _ in 0..2 {
        let plain = Membership::new(fx.jane.id, fx.parliament.id, fx.party.id);
        assert!(fx.store.save_membership(plain).await.is_ok());
    }
}

#[tokio::test]
async fn test_linked_row_id_reused_by_another_table() {
    let fx = Fixture::new().await;
    let phone = fx
        .store
        .add_linked(PersonContactDetail::new(
            fx.jane.id,
            ContactDetail::new(ContactType::Phone, "+1 555 0100"),
        ))
        .await
        .unwrap();

    let clash = PostLink::from_parts(phone.id, fx.chair.id, Link::new("https://example.org/chair"));
    let err = fx.store.add_linked(clash).await.unwrap_err();
    assert_eq!(err.error_code(), "ID_CONFLICT");
    assert!(matches!(
        err,
        PopoloError::IdConflict { ref model, id } if model == "PersonContactDetail" && id == phone.id
    ));

    let contacts: Vec<PersonContactDetail> = fx.store.linked(fx.jane.id).await;
    assert_eq!(contacts, vec![phone.clone()]);
    let links: Vec<PostLink> = fx.store.linked(fx.chair.id).await;
    assert!(links.is_empty());

    // Same table: the row is replaced.
    let updated = PersonContactDetail::from_parts(
        phone.id,
        fx.jane.id,
        ContactDetail::new(ContactType::Mobile, "+1 555 0199"),
    );
    fx.store.add_linked(updated).await.unwrap();
    let contacts: Vec<PersonContactDetail> = fx.store.linked(fx.jane.id).await;
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].info.contact_type, ContactType::Mobile);
    assert_eq!(fx.store.stats().await.linked_rows, 1);
}
