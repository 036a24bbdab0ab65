// HomeLib - Home Book Collection Manager
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Authenticated identity
//!
//! A `Session` is obtained by logging in and is passed explicitly to the
//! operations that depend on who is acting: admin-only actions and
//! authoring reviews.

use crate::error::{LibraryError, Result};
use crate::storage::models::{NewReview, User};
use crate::storage::users;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// The user logged in for the remainder of an interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: User,
}

impl Session {
    /// Log in with a username and password
    ///
    /// Returns `Ok(None)` when the username is unknown or the password does
    /// not match.
    ///
    /// # Errors
    /// - `InvalidInput` if the username or password is empty
    pub async fn login(pool: &SqlitePool, username: &str, password: &str) -> Result<Option<Self>> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(LibraryError::invalid_input(
                "username and password are required",
            ));
        }

        match users::find_user_by_username(pool, username).await? {
            Some(user) if user.password == password => {
                info!(user_id = user.user_id, admin = user.is_admin, "user logged in");
                Ok(Some(Self { user }))
            }
            _ => {
                warn!(username, "login rejected");
                Ok(None)
            }
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn user_id(&self) -> i64 {
        self.user.user_id
    }

    pub fn is_admin(&self) -> bool {
        self.user.is_admin
    }

    /// Fail with `PermissionDenied` unless the session user is an administrator
    pub fn require_admin(&self) -> Result<()> {
        if self.user.is_admin {
            Ok(())
        } else {
            Err(LibraryError::permission_denied(
                "administrator rights required",
            ))
        }
    }

    /// Start a review of `book_id` written by the session user
    pub fn new_review(&self, book_id: i64, rating: i32) -> NewReview {
        NewReview::new(book_id, self.user.user_id, rating)
    }
}
