//! Environment-driven schema binding.
//!
//! Kept in its own test binary because it mutates process environment.

use popolo::{ConfigError, PopoloConfig, Schema, APP_NAME_VAR};

#[test]
fn test_schema_from_env() {
    std::env::remove_var(APP_NAME_VAR);
    let err = Schema::from_env().unwrap_err();
    assert_eq!(err, ConfigError::MissingSetting(APP_NAME_VAR.to_string()));
    assert!(err
        .to_string()
        .contains("to point to your Popolo application"));

    std::env::set_var(APP_NAME_VAR, "civic.data");
    assert!(matches!(
        PopoloConfig::from_env(),
        Err(ConfigError::InvalidValue { .. })
    ));

    std::env::set_var(APP_NAME_VAR, "civic");
    let schema = Schema::from_env().unwrap();
    assert_eq!(schema.app_name, "civic");

    let memberships = schema.table("Membership").unwrap();
    let on_behalf_of = memberships.foreign_key("on_behalf_of").unwrap();
    assert_eq!(on_behalf_of.target, "civic.Organization");
    assert_eq!(on_behalf_of.related_name, "memberships_on_behalf_of");

    std::env::remove_var(APP_NAME_VAR);
}
