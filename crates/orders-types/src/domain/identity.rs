use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::validation::{is_valid_email, is_valid_phone, ValidationErrors};

pub const MIN_PASSWORD_LEN: usize = 6;

/// A registered user as the credential store keeps it.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub person_name: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub refresh_token: Option<String>,
    pub refresh_token_expiration: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("refresh_token_expiration", &self.refresh_token_expiration)
            .finish_non_exhaustive()
    }
}

impl Identity {
    pub fn new(registration: &Registration, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            person_name: registration.person_name.clone(),
            username: registration.username.clone(),
            email: registration.email.clone(),
            phone: registration.phone.clone(),
            password_hash,
            refresh_token: None,
            refresh_token_expiration: None,
            created_at: Utc::now(),
        }
    }

    pub fn set_refresh_token(&mut self, token: String, expires_at: DateTime<Utc>) {
        self.refresh_token = Some(token);
        self.refresh_token_expiration = Some(expires_at);
    }
}

/// Validated sign-up input. The password is still plaintext here and is
/// only ever turned into a hash before reaching a store.
#[derive(Clone)]
pub struct Registration {
    pub person_name: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

impl Registration {
    pub fn new(
        person_name: Option<&str>,
        username: Option<&str>,
        phone: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
        confirm_password: Option<&str>,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let person_name = errors.required("personName", person_name);
        let username = errors.required("userName", username);
        let phone = errors.required("phone", phone);
        if let Some(p) = phone {
            if !is_valid_phone(p) {
                errors.add("phone", "phone must be a valid phone number");
            }
        }
        let email = errors.required("email", email);
        if let Some(e) = email {
            if !is_valid_email(e) {
                errors.add("email", "email must be a valid email address");
            }
        }
        // Passwords are used verbatim, never trimmed.
        let password = password.filter(|p| !p.is_empty());
        match password {
            None => errors.add("password", "password is required"),
            Some(p) if p.chars().count() < MIN_PASSWORD_LEN => errors.add(
                "password",
                format!("password must be at least {MIN_PASSWORD_LEN} characters long"),
            ),
            Some(_) => {}
        }
        match confirm_password.filter(|p| !p.is_empty()) {
            None => errors.add("confirmPassword", "confirmPassword is required"),
            Some(c) if Some(c) != password => {
                errors.add("confirmPassword", "confirmPassword must match password")
            }
            Some(_) => {}
        }

        match (person_name, username, phone, email, password) {
            (Some(person_name), Some(username), Some(phone), Some(email), Some(password))
                if errors.is_empty() =>
            {
                Ok(Self {
                    person_name: person_name.to_string(),
                    username: username.to_string(),
                    email: email.to_string(),
                    phone: phone.to_string(),
                    password: password.to_string(),
                })
            }
            _ => Err(errors),
        }
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: Option<&str>, password: Option<&str>) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let username = errors.required("username", username);
        let password = password.filter(|p| !p.is_empty());
        if password.is_none() {
            errors.add("password", "password is required");
        }
        match (username, password) {
            (Some(username), Some(password)) if errors.is_empty() => Ok(Self {
                username: username.to_string(),
                password: password.to_string(),
            }),
            _ => Err(errors),
        }
    }
}

/// Token pair handed to a client after register, login or refresh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationResponse {
    pub person_name: String,
    pub email: String,
    pub access_token: String,
    pub access_token_expiration: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expiration: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(confirm: &str) -> Result<Registration, ValidationErrors> {
        Registration::new(
            Some("Alice Liddell"),
            Some("alice"),
            Some("+44 20 7946 0958"),
            Some("alice@example.com"),
            Some("s3cret!"),
            Some(confirm),
        )
    }

    #[test]
    fn valid_registration() {
        let reg = register("s3cret!").unwrap();
        assert_eq!(reg.username, "alice");
        assert_eq!(reg.password, "s3cret!");
    }

    #[test]
    fn confirm_password_must_match() {
        let err = register("other!").err().unwrap();
        assert_eq!(err.errors().len(), 1);
        assert!(err.has_field("confirmPassword"));
    }

    #[test]
    fn reports_all_missing_fields() {
        let err = Registration::new(None, None, None, None, None, None).err().unwrap();
        for field in [
            "personName",
            "userName",
            "phone",
            "email",
            "password",
            "confirmPassword",
        ] {
            assert!(err.has_field(field), "missing {field}");
        }
    }

    #[test]
    fn rejects_malformed_contact_details_and_short_password() {
        let err = Registration::new(
            Some("Bob"),
            Some("bob"),
            Some("12"),
            Some("bob-at-example"),
            Some("abc"),
            Some("abc"),
        )
        .err().unwrap();
        assert!(err.has_field("phone"));
        assert!(err.has_field("email"));
        assert!(err.has_field("password"));
    }

    #[test]
    fn credentials_require_both_fields() {
        assert!(Credentials::new(Some("alice"), Some("pw")).is_ok());
        let err = Credentials::new(Some(" "), None).err().unwrap();
        assert!(err.has_field("username"));
        assert!(err.has_field("password"));
    }

    #[test]
    fn debug_hides_secrets() {
        let reg = register("s3cret!").unwrap();
        let mut identity = Identity::new(&reg, "$argon2id$hash".into());
        identity.set_refresh_token("refresh-value".into(), Utc::now());
        let printed = format!("{identity:?}");
        assert!(!printed.contains("argon2id"));
        assert!(!printed.contains("refresh-value"));
    }
}
