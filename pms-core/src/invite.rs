//! Invitation mail drafts.
//!
//! Nothing is sent from the server. The admin's mail client opens the
//! returned `mailto:` URL with subject and body already filled in.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

use crate::error::ValidationError;

/// Characters left as-is by browser `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub const INVITE_SUBJECT: &str = "[Project Management System] Access granted";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailDraft {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub mailto_url: String,
}

impl MailDraft {
    /// Draft telling `email` that their account may now sign in.
    pub fn invitation(email: &str) -> Self {
        let subject = INVITE_SUBJECT.to_string();
        let body = format!(
            "Hi,\n\nYour account ({email}) has been added to the project management system.\nSign in directly with it to get started."
        );
        let mailto_url = format!(
            "mailto:{}?subject={}&body={}",
            email,
            utf8_percent_encode(&subject, COMPONENT),
            utf8_percent_encode(&body, COMPONENT),
        );

        Self {
            to: email.to_string(),
            subject,
            body,
            mailto_url,
        }
    }
}

/// Trims and lowercases an e-mail address, rejecting anything without a
/// non-empty local part and domain.
pub fn normalize_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
        {
            Ok(email)
        }
        _ => Err(ValidationError::InvalidEmail(raw.trim().to_string())),
    }
}

/// Display name given to invited users: the part before `@`.
pub fn username_for(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailto_url_is_component_encoded() {
        let draft = MailDraft::invitation("amy@school.edu.tw");
        assert!(draft
            .mailto_url
            .starts_with("mailto:amy@school.edu.tw?subject=%5BProject%20Management%20System%5D%20Access%20granted&body=Hi%2C%0A%0AYour%20account%20(amy%40school.edu.tw)"));
        assert!(!draft.mailto_url.contains(' '));
        assert!(draft.body.contains("amy@school.edu.tw"));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Amy@School.EDU.tw ").unwrap(), "amy@school.edu.tw");
        assert!(matches!(normalize_email("amy"), Err(ValidationError::InvalidEmail(_))));
        assert!(normalize_email("@school.edu.tw").is_err());
        assert!(normalize_email("a@b@c").is_err());
    }

    #[test]
    fn test_username_is_local_part() {
        assert_eq!(username_for("ken.lin@firm.tw"), "ken.lin");
    }
}
