// Contact book - ordered emergency contacts with optional JSON persistence
// Follows the same pattern as the trigger store for file-based persistence

use crate::util::{load_json, save_json_atomic, PersistError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use uuid::Uuid;

/// Shortest accepted phone number (digits only)
const MIN_PHONE_DIGITS: usize = 7;

/// Longest accepted phone number, the E.164 maximum
const MAX_PHONE_DIGITS: usize = 15;

/// An emergency contact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Name shown to the user
    pub display_name: String,
    /// Normalized phone number: optional leading `+`, then digits only
    pub phone_number: String,
}

/// Error types for contact book operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContactError {
    /// Phone number failed digit/length validation
    #[error("Invalid phone number: {0:?}")]
    InvalidPhoneNumber(String),
    /// Display name was blank
    #[error("Contact name cannot be empty")]
    EmptyName,
    /// No contact with this ID
    #[error("Contact with ID {0} not found")]
    NotFound(String),
    /// Reading or writing the contact file failed
    #[error(transparent)]
    Persistence(#[from] PersistError),
}

/// Validate and normalize a raw phone number.
///
/// Spaces, dashes, dots and parentheses are stripped. A single leading `+` is
/// kept. What remains must be 7 to 15 ASCII digits.
pub fn normalize_phone_number(raw: &str) -> Result<String, ContactError> {
    let invalid = || ContactError::InvalidPhoneNumber(raw.to_string());

    let stripped: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    let (prefix, digits) = match stripped.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", stripped.as_str()),
    };

    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len())
        || !digits.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    Ok(format!("{}{}", prefix, digits))
}

fn validate_saved(saved: Vec<Contact>) -> Vec<Contact> {
    let mut seen = HashSet::new();
    let mut contacts = Vec::with_capacity(saved.len());

    for contact in saved {
        let id = contact.id.trim();
        if id.is_empty() {
            crate::warn!("[contacts] Dropping saved contact without an ID");
            continue;
        }
        if seen.contains(id) {
            crate::warn!("[contacts] Dropping saved contact with duplicate ID {}", id);
            continue;
        }

        let display_name = contact.display_name.trim();
        if display_name.is_empty() {
            crate::warn!("[contacts] Dropping saved contact {}: empty name", id);
            continue;
        }
        let phone_number = match normalize_phone_number(&contact.phone_number) {
            Ok(phone_number) => phone_number,
            Err(e) => {
                crate::warn!("[contacts] Dropping saved contact {}: {}", id, e);
                continue;
            }
        };

        seen.insert(id.to_string());
        contacts.push(Contact {
            id: id.to_string(),
            display_name: display_name.to_string(),
            phone_number,
        });
    }

    contacts
}

/// Store for emergency contacts, kept in insertion order
#[derive(Debug, Default)]
pub struct ContactBook {
    contacts: Vec<Contact>,
    /// Persistence file; `None` keeps contacts in memory only
    path: Option<PathBuf>,
}

impl ContactBook {
    /// Create an empty in-memory contact book
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a contact book backed by `path`, loading saved contacts
    ///
    /// Saved entries go through the same checks as `add`. Entries with a
    /// blank name, an invalid phone number, a blank ID or an ID already seen
    /// are dropped with a warning; the rest are kept with normalized numbers.
    pub fn with_path(path: PathBuf) -> Result<Self, ContactError> {
        let saved: Vec<Contact> = load_json(&path)?.unwrap_or_default();
        let contacts = validate_saved(saved);
        crate::info!("[contacts] Loaded {} emergency contacts", contacts.len());
        Ok(Self {
            contacts,
            path: Some(path),
        })
    }

    /// Add a contact
    ///
    /// Adding the same name and number twice returns the existing contact
    /// instead of creating a duplicate.
    #[must_use = "this returns a Result that should be handled"]
    pub fn add(&mut self, name: &str, phone_number: &str) -> Result<Contact, ContactError> {
        let display_name = name.trim();
        if display_name.is_empty() {
            return Err(ContactError::EmptyName);
        }
        let phone_number = normalize_phone_number(phone_number)?;

        if let Some(existing) = self
            .contacts
            .iter()
            .find(|c| c.display_name == display_name && c.phone_number == phone_number)
        {
            crate::debug!("[contacts] Contact {} already present", existing.id);
            return Ok(existing.clone());
        }

        let contact = Contact {
            id: Uuid::new_v4().to_string(),
            display_name: display_name.to_string(),
            phone_number,
        };

        self.contacts.push(contact.clone());
        if let Err(e) = self.save() {
            self.contacts.pop();
            return Err(e);
        }

        crate::info!(
            "[contacts] Added contact {} ({})",
            contact.id,
            contact.display_name
        );
        Ok(contact)
    }

    /// Remove a contact by ID
    #[must_use = "this returns a Result that should be handled"]
    pub fn remove(&mut self, id: &str) -> Result<Contact, ContactError> {
        let index = self
            .contacts
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| ContactError::NotFound(id.to_string()))?;

        let removed = self.contacts.remove(index);
        if let Err(e) = self.save() {
            self.contacts.insert(index, removed);
            return Err(e);
        }

        crate::info!("[contacts] Removed contact {}", id);
        Ok(removed)
    }

    /// All contacts in insertion order
    pub fn list(&self) -> Vec<Contact> {
        self.contacts.clone()
    }

    /// Get a contact by ID
    pub fn get(&self, id: &str) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    fn save(&self) -> Result<(), ContactError> {
        if let Some(path) = &self.path {
            save_json_atomic(path, &self.contacts)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "book_test.rs"]
mod tests;
