// HomeLib - Home Book Collection Manager
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! User storage operations
//!
//! Accounts are both login identities and the borrowers/reviewers referenced
//! by loans and reviews. Passwords are stored and compared as plain text.

use crate::error::{LibraryError, Result};
use crate::session::Session;
use crate::storage::models::{NewUser, User};
use sqlx::SqlitePool;
use tracing::{info, instrument, warn};

/// List all users ordered by full name
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM Users ORDER BY full_name, user_id")
        .fetch_all(pool)
        .await?;

    Ok(users)
}

pub async fn find_user_by_id(pool: &SqlitePool, user_id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM Users WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Find a user by exact username
///
/// Used by login. Matching is case-sensitive.
pub async fn find_user_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM Users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Insert a new user
///
/// # Arguments
/// * `pool` - Database connection pool
/// * `user` - Account to create; `username` must be unused
///
/// # Returns
/// The generated user_id
pub async fn insert_user(pool: &SqlitePool, user: &NewUser) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO Users (username, password, full_name, is_admin, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.password)
    .bind(&user.full_name)
    .bind(user.is_admin)
    .bind(user.created_at)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Update an existing user
///
/// `created_at` is never rewritten.
pub async fn update_user(pool: &SqlitePool, user: &User) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE Users SET
            username = ?, password = ?, full_name = ?, is_admin = ?
        WHERE user_id = ?
        "#,
    )
    .bind(&user.username)
    .bind(&user.password)
    .bind(&user.full_name)
    .bind(user.is_admin)
    .bind(user.user_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a user on behalf of an administrator
///
/// Only the account row is removed. The user's loans and reviews are kept,
/// so reading statistics and book status do not change.
///
/// # Errors
/// - `PermissionDenied` if the session is not an administrator
/// - `PermissionDenied` if the session tries to delete its own account
#[instrument(skip(pool, session), fields(actor = session.user_id()))]
pub async fn delete_user(pool: &SqlitePool, session: &Session, user_id: i64) -> Result<()> {
    if let Err(e) = session.require_admin() {
        warn!("user deletion refused for non-administrator");
        return Err(e);
    }

    if session.user_id() == user_id {
        warn!("administrator attempted to delete their own account");
        return Err(LibraryError::permission_denied(
            "an administrator cannot delete their own account",
        ));
    }

    let deleted = sqlx::query("DELETE FROM Users WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    if deleted.rows_affected() > 0 {
        info!("deleted user");
    }

    Ok(())
}
