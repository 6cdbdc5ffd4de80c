use argon2::Config as Argon2Config;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    auth::Rights,
    common::AccountId,
    db::account::{Account, NewAccount},
};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Login credentials, received from a user.
#[derive(Clone, Deserialize, Serialize)]
pub struct Credentials {
    pub student_number: String,
    pub password: String,
}

/// A student's self-registration. The password is in plaintext and is never
/// stored directly.
#[derive(Clone, Deserialize, Serialize)]
pub struct Registration {
    pub student_number: String,
    pub first_name: String,
    pub last_name: String,
    pub department: String,
    pub password: String,
}

impl Registration {
    /// Validate the registration and hash the password, producing a new account
    /// with the given rights.
    pub fn into_account(self, role: Rights) -> Result<NewAccount> {
        let required = [
            &self.student_number,
            &self.first_name,
            &self.last_name,
            &self.department,
        ];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(Error::BadRequest(
                "Please fill in all required fields".to_string(),
            ));
        }
        if self.password.len() < MIN_PASSWORD_LENGTH {
            return Err(Error::BadRequest(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        Ok(NewAccount {
            student_number: self.student_number.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            department: self.department.trim().to_string(),
            role,
            password_hash: hash_password(&self.password)?,
            has_voted: false,
            created_at: Utc::now(),
        })
    }
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    // 16 bytes is recommended for password hashing:
    //  https://en.wikipedia.org/wiki/Argon2
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill(&mut salt);
    Ok(argon2::hash_encoded(
        password.as_bytes(),
        &salt,
        &Argon2Config::default(),
    )?)
}

/// API-friendly view of an account. Never includes the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDesc {
    pub id: AccountId,
    pub student_number: String,
    pub first_name: String,
    pub last_name: String,
    pub department: String,
    pub role: Rights,
    pub has_voted: bool,
}

impl From<Account> for AccountDesc {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            student_number: account.account.student_number,
            first_name: account.account.first_name,
            last_name: account.account.last_name,
            department: account.account.department,
            role: account.account.role,
            has_voted: account.account.has_voted,
        }
    }
}
