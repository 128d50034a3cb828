//! Input validation for the registration, profile and product forms.
//!
//! All checks run before any request is sent. The backend validates again;
//! these rules only save a round trip and give clearer messages.

use chrono::NaiveDate;
use mercado_core::{BirthDate, Email};
use secrecy::{ExposeSecret, SecretString};

use crate::error::ValidationError;
use crate::models::{ProductInput, RegisterRequest};

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 6;

fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}

/// Sign-up form as entered by the user.
#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: SecretString,
    pub address: String,
    /// `YYYY-MM-DD`.
    pub birth_date: String,
}

impl RegistrationForm {
    /// Validate the form against `today` and build the register request.
    ///
    /// Checks, in order: first name, last name, email shape, password length,
    /// address, then birth date format, not-in-future and minimum age.
    ///
    /// # Errors
    ///
    /// Returns the first rule the form breaks.
    pub fn validate(&self, today: NaiveDate) -> Result<RegisterRequest, ValidationError> {
        require(&self.first_name, "first name")?;
        require(&self.last_name, "last name")?;
        let email = Email::parse(self.email.trim())?;

        if self.password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ValidationError::PasswordTooShort {
                min: MIN_PASSWORD_LENGTH,
            });
        }

        require(&self.address, "address")?;

        let birth_date = BirthDate::parse(self.birth_date.trim())?;
        birth_date.validate_for_registration(today)?;

        Ok(RegisterRequest {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: email.into_inner(),
            password: self.password.clone(),
            address: self.address.trim().to_string(),
            birth_date,
        })
    }
}

/// Editable profile fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileChanges {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
}

impl ProfileChanges {
    /// All three fields must be non-blank.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Required`] naming the first blank field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.first_name, "first name")?;
        require(&self.last_name, "last name")?;
        require(&self.address, "address")
    }
}

impl ProductInput {
    /// Product form rules: name, image URL and description non-blank, price
    /// above zero, stock not negative.
    ///
    /// # Errors
    ///
    /// Returns the first rule the input breaks.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.name, "name")?;
        if !self.price.is_positive() {
            return Err(ValidationError::NonPositivePrice);
        }
        if self.stock < 0 {
            return Err(ValidationError::NegativeStock);
        }
        require(&self.image_url, "image URL")?;
        require(&self.description, "description")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mercado_core::{BirthDateError, EmailError, Price};

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn form() -> RegistrationForm {
        RegistrationForm {
            first_name: "Ana".to_string(),
            last_name: "Diaz".to_string(),
            email: "ana@example.com".to_string(),
            password: SecretString::from("secreto"),
            address: "Calle 1".to_string(),
            birth_date: "1990-05-04".to_string(),
        }
    }

    fn shirt() -> ProductInput {
        ProductInput {
            name: "Shirt".to_string(),
            price: Price::from_units(10),
            image_url: "u".to_string(),
            stock: 5,
            description: "d".to_string(),
        }
    }

    #[test]
    fn test_valid_registration_builds_request() {
        let request = form().validate(today()).unwrap();
        assert_eq!(request.email, "ana@example.com");
        assert_eq!(request.birth_date.to_string(), "1990-05-04");
    }

    #[test]
    fn test_registration_rules_in_order() {
        let mut f = form();
        f.first_name = "  ".to_string();
        assert_eq!(
            f.validate(today()).unwrap_err(),
            ValidationError::Required("first name")
        );

        let mut f = form();
        f.email = "ana@localhost".to_string();
        assert_eq!(
            f.validate(today()).unwrap_err(),
            ValidationError::Email(EmailError::InvalidDomain)
        );

        let mut f = form();
        f.password = SecretString::from("12345");
        assert_eq!(
            f.validate(today()).unwrap_err(),
            ValidationError::PasswordTooShort { min: 6 }
        );

        let mut f = form();
        f.birth_date = "04/05/1990".to_string();
        assert_eq!(
            f.validate(today()).unwrap_err(),
            ValidationError::BirthDate(BirthDateError::Format)
        );

        let mut f = form();
        f.birth_date = "2015-01-01".to_string();
        assert_eq!(
            f.validate(today()).unwrap_err(),
            ValidationError::BirthDate(BirthDateError::TooYoung { min: 13 })
        );
    }

    #[test]
    fn test_profile_changes_require_all_fields() {
        let changes = ProfileChanges {
            first_name: "Ana".to_string(),
            last_name: "Diaz".to_string(),
            address: String::new(),
        };
        assert_eq!(
            changes.validate().unwrap_err(),
            ValidationError::Required("address")
        );
    }

    #[test]
    fn test_product_rules() {
        assert!(shirt().validate().is_ok());

        let mut p = shirt();
        p.name = String::new();
        assert_eq!(p.validate().unwrap_err(), ValidationError::Required("name"));

        let mut p = shirt();
        p.price = Price::ZERO;
        assert_eq!(p.validate().unwrap_err(), ValidationError::NonPositivePrice);

        let mut p = shirt();
        p.stock = -1;
        assert_eq!(p.validate().unwrap_err(), ValidationError::NegativeStock);

        let mut p = shirt();
        p.description = " ".to_string();
        assert_eq!(
            p.validate().unwrap_err(),
            ValidationError::Required("description")
        );
    }
}
