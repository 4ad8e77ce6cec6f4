//! Enumerated field values
//!
//! This module defines the closed value sets used by Popolo fields: a
//! person's gender and the medium of a contact detail.

use serde::{Deserialize, Serialize};

/// A person's gender.
///
/// Persisted as an integer code: female is 0, male is 1.
///
/// # Examples
///
/// ```
/// use popolo::Gender;
///
/// assert_eq!(Gender::parse("Female"), Some(Gender::Female));
/// assert_eq!(Gender::Male.code(), 1);
/// assert_eq!(Gender::from_code(0), Some(Gender::Female));
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    /// Female
    Female = 0,

    /// Male
    Male = 1,
}

impl Gender {
    /// Persisted integer code.
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Look up a gender by persisted code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Female),
            1 => Some(Self::Male),
            _ => None,
        }
    }

    /// Parse gender from string representation (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "female" => Some(Self::Female),
            "male" => Some(Self::Male),
            _ => None,
        }
    }

    /// Lowercase string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Female => "female",
            Self::Male => "male",
        }
    }
}

/// The medium of a contact detail.
///
/// # Examples
///
/// ```
/// use popolo::ContactType;
///
/// let kind = ContactType::parse("MAIL").unwrap();
/// assert_eq!(kind.as_str(), "mail");
/// assert_eq!(kind.label(), "Snail mail");
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContactType {
    Fax,
    Phone,
    Mobile,
    Email,
    /// Postal address
    Mail,
    Twitter,
    Facebook,
}

impl ContactType {
    /// Every contact type, in declaration order.
    pub const ALL: [ContactType; 7] = [
        Self::Fax,
        Self::Phone,
        Self::Mobile,
        Self::Email,
        Self::Mail,
        Self::Twitter,
        Self::Facebook,
    ];

    /// Parse contact type from string representation (case-insensitive).
    ///
    /// # Returns
    ///
    /// `Some(ContactType)` if valid, `None` otherwise
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fax" => Some(Self::Fax),
            "phone" => Some(Self::Phone),
            "mobile" => Some(Self::Mobile),
            "email" => Some(Self::Email),
            "mail" => Some(Self::Mail),
            "twitter" => Some(Self::Twitter),
            "facebook" => Some(Self::Facebook),
            _ => None,
        }
    }

    /// Persisted code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fax => "fax",
            Self::Phone => "phone",
            Self::Mobile => "mobile",
            Self::Email => "email",
            Self::Mail => "mail",
            Self::Twitter => "twitter",
            Self::Facebook => "facebook",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fax => "Fax",
            Self::Phone => "Telephone",
            Self::Mobile => "Mobile",
            Self::Email => "Email",
            Self::Mail => "Snail mail",
            Self::Twitter => "Twitter",
            Self::Facebook => "Facebook",
        }
    }
}
