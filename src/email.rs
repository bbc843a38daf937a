//! A validated email address used to identify users when logging in.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::Error;

/// An email address that has passed basic validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Create and validate an email address.
    ///
    /// Surrounding whitespace is removed and the address is lowercased so that
    /// the same address always maps to the same user.
    ///
    /// # Errors
    ///
    /// This function will return [Error::InvalidEmail] if `raw_email` does not
    /// have exactly one '@' with text on either side and a dot in the domain.
    pub fn new(raw_email: &str) -> Result<Self, Error> {
        let email = raw_email.trim().to_lowercase();

        let is_valid = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && domain.contains('.')
                    && !email.contains(char::is_whitespace)
            }
            None => false,
        };

        if is_valid {
            Ok(Self(email))
        } else {
            Err(Error::InvalidEmail(raw_email.to_owned()))
        }
    }

    /// Create a new `Email` without any validation.
    ///
    /// The caller should ensure that `raw_email` is a correctly formatted email address.
    /// For emails coming from the user (e.g., via the REST API), this function should **not** be used, instead use the checked version.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if an incorrectly formatted email is provided it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(raw_email: &str) -> Self {
        Self(raw_email.to_owned())
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod email_tests {
    use crate::{Email, Error};

    #[test]
    fn create_email_success() {
        let email = Email::new("foo@bar.baz");

        assert_eq!(email, Ok(Email::new_unchecked("foo@bar.baz")));
    }

    #[test]
    fn create_email_normalises_case_and_whitespace() {
        let email = Email::new("  Foo@Bar.BAZ ").unwrap();

        assert_eq!(email.as_ref(), "foo@bar.baz");
    }

    #[test]
    fn create_email_fails_with_no_at_symbol() {
        let email = Email::new("foobar.baz");

        assert_eq!(email, Err(Error::InvalidEmail("foobar.baz".to_owned())));
    }

    #[test]
    fn create_email_fails_with_two_at_symbols() {
        assert!(matches!(
            Email::new("foo@bar@baz.qux"),
            Err(Error::InvalidEmail(_))
        ));
    }

    #[test]
    fn create_email_fails_with_empty_parts() {
        assert!(matches!(Email::new("@bar.baz"), Err(Error::InvalidEmail(_))));
        assert!(matches!(Email::new("foo@"), Err(Error::InvalidEmail(_))));
        assert!(matches!(Email::new("foo@bar"), Err(Error::InvalidEmail(_))));
    }
}
