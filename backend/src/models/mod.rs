//! Domain models shared by the directory, mailer and job runner.

use serde::{Deserialize, Serialize};

/// A company that can receive an application email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Stable identifier used by the picker and the job request
    pub id: String,
    /// Display name, used in progress events
    pub company: String,
    /// Destination address
    pub email: String,
}

impl Recipient {
    pub fn new(id: impl Into<String>, company: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            company: company.into(),
            email: email.into(),
        }
    }
}

/// The person applying, used to compose every outgoing email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderProfile {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Free-text paragraph inserted in the body
    #[serde(default)]
    pub pitch: Option<String>,
}

impl SenderProfile {
    /// Name shown in subjects and signatures; falls back to the address.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

impl Default for SenderProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: "applicant@example.com".to_string(),
            phone: None,
            pitch: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_email() {
        let mut sender = SenderProfile {
            name: "  ".into(),
            email: "thandi@example.com".into(),
            phone: None,
            pitch: None,
        };
        assert_eq!(sender.display_name(), "thandi@example.com");

        sender.name = "Thandi Mokoena".into();
        assert_eq!(sender.display_name(), "Thandi Mokoena");
    }
}
