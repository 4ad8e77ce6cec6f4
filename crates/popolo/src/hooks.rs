//! Pre-save hook
//!
//! The persistence layer calls [`prepare_for_save`] on every record before
//! writing it. The hook refreshes derived state (timestamps, slug) and then
//! runs full validation; a record that fails is never written.

use chrono::{DateTime, Utc};

use crate::error::ValidationErrors;
use crate::validation::Validate;

/// Derived-state refresh run before validation.
pub trait PreSave: Validate {
    /// Update timestamps and any derived fields as of `now`.
    fn pre_save(&mut self, now: DateTime<Utc>);
}

/// Refresh derived state, then validate.
///
/// # Errors
///
/// Returns every violated constraint when the record is invalid.
pub fn prepare_for_save<T: PreSave>(record: &mut T) -> Result<(), ValidationErrors> {
    prepare_for_save_at(record, Utc::now())
}

/// [`prepare_for_save`] with an explicit clock.
pub fn prepare_for_save_at<T: PreSave>(
    record: &mut T,
    now: DateTime<Utc>,
) -> Result<(), ValidationErrors> {
    record.pre_save(now);
    record.full_clean()
}
