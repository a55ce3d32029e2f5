// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User repository.
//!
//! Emails are stored lowercase and indexed in `users_by_email`; mobile numbers
//! are indexed verbatim in `users_by_mobile`. Both indexes are unique.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    next_id, read_row, Database, QueryTimer, StorageError, StorageResult, StoredCompany,
    COMPANIES, COMPANIES_BY_OWNER, USERS, USERS_BY_EMAIL, USERS_BY_MOBILE,
};

pub const EMAIL_CONSTRAINT: &str = "users_email_key";
pub const MOBILE_CONSTRAINT: &str = "users_mobile_no_key";

/// Signup type recorded for email/password registrations.
pub const SIGNUP_TYPE_EMAIL: &str = "e";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Gender {
    #[serde(rename = "m")]
    Male,
    #[serde(rename = "f")]
    Female,
    #[serde(rename = "o")]
    Other,
}

impl Gender {
    /// Parse the single-letter wire code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "m" => Some(Gender::Male),
            "f" => Some(Gender::Female),
            "o" => Some(Gender::Other),
            _ => None,
        }
    }
}

/// User row as persisted. Never serialized to clients directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: u64,
    pub email: String,
    /// Argon2id PHC string
    pub password_hash: String,
    pub full_name: String,
    pub gender: Gender,
    pub mobile_no: String,
    pub is_mobile_verified: bool,
    pub is_email_verified: bool,
    pub signup_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`UserRepository::create`]. The password is hashed before storage.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub gender: Gender,
    pub mobile_no: String,
    pub signup_type: String,
}

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub gender: Option<Gender>,
    pub mobile_no: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.gender.is_none() && self.mobile_no.is_none()
    }
}

/// Hash a plaintext password with Argon2id and a random salt.
pub fn hash_password(password: &str) -> StorageResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StorageError::PasswordHash(e.to_string()))
}

/// Check a plaintext password against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Repository for user rows.
pub struct UserRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn find_by_id(&self, id: u64) -> StorageResult<Option<StoredUser>> {
        let _timer = QueryTimer::start("users.find_by_id");
        let read_txn = self.db.redb().begin_read()?;
        let users = read_txn.open_table(USERS)?;
        read_row(&users, id)
    }

    pub fn find_by_email(&self, email: &str) -> StorageResult<Option<StoredUser>> {
        let _timer = QueryTimer::start("users.find_by_email");
        let read_txn = self.db.redb().begin_read()?;
        let index = read_txn.open_table(USERS_BY_EMAIL)?;
        let Some(id) = index.get(email.to_lowercase().as_str())?.map(|v| v.value()) else {
            return Ok(None);
        };
        let users = read_txn.open_table(USERS)?;
        read_row(&users, id)
    }

    pub fn find_by_mobile(&self, mobile_no: &str) -> StorageResult<Option<StoredUser>> {
        let _timer = QueryTimer::start("users.find_by_mobile");
        let read_txn = self.db.redb().begin_read()?;
        let index = read_txn.open_table(USERS_BY_MOBILE)?;
        let Some(id) = index.get(mobile_no)?.map(|v| v.value()) else {
            return Ok(None);
        };
        let users = read_txn.open_table(USERS)?;
        read_row(&users, id)
    }

    /// Load a user together with their company profile, if any.
    pub fn find_with_company(
        &self,
        id: u64,
    ) -> StorageResult<Option<(StoredUser, Option<StoredCompany>)>> {
        let _timer = QueryTimer::start("users.find_with_company");
        let read_txn = self.db.redb().begin_read()?;
        let users = read_txn.open_table(USERS)?;
        let Some(user) = read_row::<StoredUser>(&users, id)? else {
            return Ok(None);
        };

        let owners = read_txn.open_table(COMPANIES_BY_OWNER)?;
        let company = match owners.get(id)?.map(|v| v.value()) {
            Some(company_id) => {
                let companies = read_txn.open_table(COMPANIES)?;
                read_row(&companies, company_id)?
            }
            None => None,
        };
        Ok(Some((user, company)))
    }

    /// Insert a new user.
    ///
    /// # Errors
    /// `StorageError::UniqueViolation` if the email or mobile number is taken.
    pub fn create(&self, new: NewUser) -> StorageResult<StoredUser> {
        let password_hash = hash_password(&new.password)?;

        let _timer = QueryTimer::start("users.create");
        let email = new.email.to_lowercase();
        let now = Utc::now();

        let write_txn = self.db.redb().begin_write()?;
        let user = {
            let mut by_email = write_txn.open_table(USERS_BY_EMAIL)?;
            if by_email.get(email.as_str())?.is_some() {
                return Err(StorageError::UniqueViolation {
                    constraint: EMAIL_CONSTRAINT,
                });
            }
            let mut by_mobile = write_txn.open_table(USERS_BY_MOBILE)?;
            if by_mobile.get(new.mobile_no.as_str())?.is_some() {
                return Err(StorageError::UniqueViolation {
                    constraint: MOBILE_CONSTRAINT,
                });
            }

            let id = next_id(&write_txn, "users")?;
            let user = StoredUser {
                id,
                email,
                password_hash,
                full_name: new.full_name,
                gender: new.gender,
                mobile_no: new.mobile_no,
                is_mobile_verified: false,
                is_email_verified: false,
                signup_type: new.signup_type,
                created_at: now,
                updated_at: now,
            };

            let json = serde_json::to_vec(&user)?;
            let mut users = write_txn.open_table(USERS)?;
            users.insert(id, json.as_slice())?;
            by_email.insert(user.email.as_str(), id)?;
            by_mobile.insert(user.mobile_no.as_str(), id)?;
            user
        };
        write_txn.commit()?;

        tracing::info!(user_id = user.id, "User created");
        Ok(user)
    }

    pub fn update_email_verification(&self, id: u64, verified: bool) -> StorageResult<StoredUser> {
        let _timer = QueryTimer::start("users.update_email_verification");
        self.modify(id, |user| user.is_email_verified = verified)
    }

    pub fn update_mobile_verification(&self, id: u64, verified: bool) -> StorageResult<StoredUser> {
        let _timer = QueryTimer::start("users.update_mobile_verification");
        self.modify(id, |user| user.is_mobile_verified = verified)
    }

    /// Replace the stored password hash.
    pub fn update_password(&self, id: u64, new_password: &str) -> StorageResult<()> {
        let password_hash = hash_password(new_password)?;
        let _timer = QueryTimer::start("users.update_password");
        self.modify(id, move |user| user.password_hash = password_hash)?;
        Ok(())
    }

    /// Apply profile changes. A changed mobile number must still be unique.
    pub fn update_profile(&self, id: u64, changes: ProfileChanges) -> StorageResult<StoredUser> {
        let _timer = QueryTimer::start("users.update_profile");

        let write_txn = self.db.redb().begin_write()?;
        let user = {
            let mut users = write_txn.open_table(USERS)?;
            let Some(mut user) = read_row::<StoredUser>(&users, id)? else {
                return Err(StorageError::NotFound(format!("User {id}")));
            };

            if let Some(mobile_no) = changes.mobile_no {
                if mobile_no != user.mobile_no {
                    let mut by_mobile = write_txn.open_table(USERS_BY_MOBILE)?;
                    if by_mobile.get(mobile_no.as_str())?.is_some() {
                        return Err(StorageError::UniqueViolation {
                            constraint: MOBILE_CONSTRAINT,
                        });
                    }
                    by_mobile.remove(user.mobile_no.as_str())?;
                    by_mobile.insert(mobile_no.as_str(), id)?;
                    user.mobile_no = mobile_no;
                }
            }
            if let Some(full_name) = changes.full_name {
                user.full_name = full_name;
            }
            if let Some(gender) = changes.gender {
                user.gender = gender;
            }
            user.updated_at = Utc::now();

            let json = serde_json::to_vec(&user)?;
            users.insert(id, json.as_slice())?;
            user
        };
        write_txn.commit()?;
        Ok(user)
    }

    /// Delete a user and their company profile. Returns `false` if absent.
    #[cfg(test)]
    pub fn delete(&self, id: u64) -> StorageResult<bool> {
        let _timer = QueryTimer::start("users.delete");

        let write_txn = self.db.redb().begin_write()?;
        let deleted = {
            let mut users = write_txn.open_table(USERS)?;
            let Some(user) = read_row::<StoredUser>(&users, id)? else {
                return Ok(false);
            };
            users.remove(id)?;
            write_txn
                .open_table(USERS_BY_EMAIL)?
                .remove(user.email.as_str())?;
            write_txn
                .open_table(USERS_BY_MOBILE)?
                .remove(user.mobile_no.as_str())?;

            let mut owners = write_txn.open_table(COMPANIES_BY_OWNER)?;
            let company_id = owners.remove(id)?.map(|v| v.value());
            if let Some(company_id) = company_id {
                write_txn.open_table(COMPANIES)?.remove(company_id)?;
            }
            true
        };
        write_txn.commit()?;

        tracing::info!(user_id = id, "User deleted");
        Ok(deleted)
    }

    /// Read-modify-write of a single user row.
    fn modify<F>(&self, id: u64, apply: F) -> StorageResult<StoredUser>
    where
        F: FnOnce(&mut StoredUser),
    {
        let write_txn = self.db.redb().begin_write()?;
        let user = {
            let mut users = write_txn.open_table(USERS)?;
            let Some(mut user) = read_row::<StoredUser>(&users, id)? else {
                return Err(StorageError::NotFound(format!("User {id}")));
            };
            apply(&mut user);
            user.updated_at = Utc::now();

            let json = serde_json::to_vec(&user)?;
            users.insert(id, json.as_slice())?;
            user
        };
        write_txn.commit()?;
        Ok(user)
    }
}
