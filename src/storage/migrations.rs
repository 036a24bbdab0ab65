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


//! Database migrations
//!
//! This module creates the library schema and seeds a fresh database.
//!
//! # Migration Strategy
//! Migrations are plain SQL executed at runtime and tracked in `_migrations`,
//! so no database connection is needed at build time.
//!
//! 1. `initial_schema` - the seven library tables
//! 2. `seed_defaults` - default accounts, genres, authors, locations and books

use crate::error::Result;
use sqlx::{Executor, SqlitePool};
use tracing::info;

/// Run all database migrations
///
/// Migrations are tracked in the `_migrations` table.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    create_migrations_table(pool).await?;

    run_migration(pool, 1, "initial_schema", create_initial_schema(pool)).await?;
    run_migration(pool, 2, "seed_defaults", seed_defaults(pool)).await?;

    Ok(())
}

/// Create migrations tracking table
async fn create_migrations_table(pool: &SqlitePool) -> Result<()> {
    pool.execute(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .await?;

    Ok(())
}

/// Run a single migration if it hasn't been applied yet
async fn run_migration(
    pool: &SqlitePool,
    id: i32,
    name: &str,
    migration_fn: impl std::future::Future<Output = Result<()>>,
) -> Result<()> {
    let applied: Option<i32> = sqlx::query_scalar("SELECT id FROM _migrations WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    if applied.is_some() {
        return Ok(());
    }

    migration_fn.await?;

    sqlx::query("INSERT INTO _migrations (id, name) VALUES (?, ?)")
        .bind(id)
        .bind(name)
        .execute(pool)
        .await?;

    info!(id, name, "applied database migration");
    Ok(())
}

/// Create initial database schema
///
/// Optional text columns are `NOT NULL DEFAULT ''` so an absent value reads
/// back as an empty string. Optional numbers, dates and references are
/// nullable.
async fn create_initial_schema(pool: &SqlitePool) -> Result<()> {
    pool.execute(
        r#"
-- ============================================================================
-- PEOPLE
-- ============================================================================

CREATE TABLE IF NOT EXISTS Users (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,          -- plaintext, compared verbatim at login
    full_name TEXT NOT NULL DEFAULT '',
    is_admin INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS Authors (
    author_id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL DEFAULT '',
    last_name TEXT NOT NULL,
    biography TEXT NOT NULL DEFAULT '',
    birth_date TEXT,                 -- ISO 8601 date (YYYY-MM-DD)
    country TEXT NOT NULL DEFAULT ''
);

-- ============================================================================
-- REFERENCE DATA
-- ============================================================================

CREATE TABLE IF NOT EXISTS Genres (
    genre_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT ''
);

-- Location names are deliberately not unique
CREATE TABLE IF NOT EXISTS Locations (
    location_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    room TEXT NOT NULL DEFAULT '',
    shelf TEXT NOT NULL DEFAULT ''
);

-- ============================================================================
-- CATALOG
-- ============================================================================

-- status is maintained by the loan lifecycle, not by a constraint.
-- foreign_keys is off: the ON DELETE actions document intent, and the
-- delete functions in storage::queries perform them.
CREATE TABLE IF NOT EXISTS Books (
    book_id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    isbn TEXT NOT NULL DEFAULT '',
    publication_year INTEGER,
    publisher TEXT NOT NULL DEFAULT '',
    page_count INTEGER,
    description TEXT NOT NULL DEFAULT '',
    cover_image_path TEXT NOT NULL DEFAULT '',
    author_id INTEGER,
    genre_id INTEGER,
    location_id INTEGER,
    status TEXT NOT NULL DEFAULT 'Available',
    date_added TEXT NOT NULL,
    FOREIGN KEY (author_id) REFERENCES Authors(author_id) ON DELETE SET NULL,
    FOREIGN KEY (genre_id) REFERENCES Genres(genre_id) ON DELETE SET NULL,
    FOREIGN KEY (location_id) REFERENCES Locations(location_id) ON DELETE SET NULL
);

-- ============================================================================
-- CIRCULATION
-- ============================================================================

-- A loan is active while return_date IS NULL. Loans and reviews are kept
-- when their book or user is deleted.
CREATE TABLE IF NOT EXISTS Loans (
    loan_id INTEGER PRIMARY KEY AUTOINCREMENT,
    book_id INTEGER NOT NULL,
    borrower_id INTEGER NOT NULL,
    loan_date TEXT NOT NULL,
    due_date TEXT,
    return_date TEXT,
    notes TEXT NOT NULL DEFAULT '',
    FOREIGN KEY (book_id) REFERENCES Books(book_id),
    FOREIGN KEY (borrower_id) REFERENCES Users(user_id)
);

CREATE TABLE IF NOT EXISTS Reviews (
    review_id INTEGER PRIMARY KEY AUTOINCREMENT,
    book_id INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    rating INTEGER NOT NULL CHECK(rating >= 1 AND rating <= 5),
    review_text TEXT NOT NULL DEFAULT '',
    review_date TEXT NOT NULL,
    is_read INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (book_id) REFERENCES Books(book_id),
    FOREIGN KEY (user_id) REFERENCES Users(user_id)
);

-- ============================================================================
-- INDEXES
-- ============================================================================

CREATE INDEX IF NOT EXISTS idx_books_title ON Books(title COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS idx_books_genre ON Books(genre_id);
CREATE INDEX IF NOT EXISTS idx_books_author ON Books(author_id);
CREATE INDEX IF NOT EXISTS idx_books_location ON Books(location_id);
CREATE INDEX IF NOT EXISTS idx_loans_book ON Loans(book_id);
CREATE INDEX IF NOT EXISTS idx_loans_borrower ON Loans(borrower_id);
CREATE INDEX IF NOT EXISTS idx_loans_loan_date ON Loans(loan_date);
CREATE INDEX IF NOT EXISTS idx_reviews_book ON Reviews(book_id);
CREATE INDEX IF NOT EXISTS idx_reviews_user ON Reviews(user_id);
CREATE INDEX IF NOT EXISTS idx_reviews_review_date ON Reviews(review_date);
        "#,
    )
    .await?;

    Ok(())
}

/// Seed a fresh database with the default catalog
///
/// Books look their author, genre and location up by name so the seed does
/// not depend on generated keys.
async fn seed_defaults(pool: &SqlitePool) -> Result<()> {
    pool.execute(
        r#"
-- Accounts: one administrator, two family members
INSERT INTO Users (username, password, full_name, is_admin, created_at) VALUES
    ('admin', 'admin123', 'Administrator', 1, datetime('now', 'localtime')),
    ('user1', 'user123', 'Ivan Petrov', 0, datetime('now', 'localtime')),
    ('user2', 'user123', 'Maria Petrova', 0, datetime('now', 'localtime'));

INSERT INTO Genres (name, description) VALUES
    ('Fiction', ''),
    ('Science Fiction', ''),
    ('Mystery', ''),
    ('Romance', ''),
    ('Biography', ''),
    ('History', ''),
    ('Science', ''),
    ('Children''s Literature', ''),
    ('Poetry', ''),
    ('Classics', '');

INSERT INTO Authors (first_name, last_name, country) VALUES
    ('Fyodor', 'Dostoevsky', 'Russia'),
    ('Leo', 'Tolstoy', 'Russia'),
    ('Alexander', 'Pushkin', 'Russia'),
    ('Anton', 'Chekhov', 'Russia'),
    ('Mikhail', 'Bulgakov', 'Russia');

INSERT INTO Locations (name, description, room, shelf) VALUES
    ('Living Room - Bookcase 1', 'Main bookcase', 'Living Room', 'Bookcase 1'),
    ('Bedroom - Shelf 1', 'Shelf by the bed', 'Bedroom', 'Shelf 1'),
    ('Study - Bookcase 2', 'Home office', 'Study', 'Bookcase 2');

INSERT INTO Books (title, isbn, publication_year, publisher, author_id, genre_id, location_id, status, date_added)
SELECT 'Crime and Punishment', '978-5-17-982654-1', 1866, 'AST',
    (SELECT author_id FROM Authors WHERE last_name = 'Dostoevsky'),
    (SELECT genre_id FROM Genres WHERE name = 'Classics'),
    (SELECT location_id FROM Locations WHERE name = 'Living Room - Bookcase 1'),
    'Available', datetime('now', 'localtime');

INSERT INTO Books (title, isbn, publication_year, publisher, author_id, genre_id, location_id, status, date_added)
SELECT 'War and Peace', '978-5-17-982655-8', 1869, 'AST',
    (SELECT author_id FROM Authors WHERE last_name = 'Tolstoy'),
    (SELECT genre_id FROM Genres WHERE name = 'Classics'),
    (SELECT location_id FROM Locations WHERE name = 'Living Room - Bookcase 1'),
    'Available', datetime('now', 'localtime');

INSERT INTO Books (title, isbn, publication_year, publisher, author_id, genre_id, location_id, status, date_added)
SELECT 'Eugene Onegin', '978-5-17-982656-5', 1833, 'AST',
    (SELECT author_id FROM Authors WHERE last_name = 'Pushkin'),
    (SELECT genre_id FROM Genres WHERE name = 'Poetry'),
    (SELECT location_id FROM Locations WHERE name = 'Bedroom - Shelf 1'),
    'Available', datetime('now', 'localtime');

INSERT INTO Books (title, isbn, publication_year, publisher, author_id, genre_id, location_id, status, date_added)
SELECT 'The Master and Margarita', '978-5-17-982657-2', 1967, 'AST',
    (SELECT author_id FROM Authors WHERE last_name = 'Bulgakov'),
    (SELECT genre_id FROM Genres WHERE name = 'Fiction'),
    (SELECT location_id FROM Locations WHERE name = 'Living Room - Bookcase 1'),
    'Available', datetime('now', 'localtime');
        "#,
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::storage::database::Database;

    async fn count(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(db.pool())
            .await
            .expect("Failed to count rows")
    }

    #[tokio::test]
    async fn test_migrations() {
        let db = Database::new_in_memory()
            .await
            .expect("Failed to create database");

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_migrations' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .expect("Failed to query tables");

        let expected_tables = vec![
            "Authors", "Books", "Genres", "Loans", "Locations", "Reviews", "Users",
        ];

        assert_eq!(tables, expected_tables, "Missing or extra tables");
    }

    #[tokio::test]
    async fn test_seed_data() {
        let db = Database::new_in_memory()
            .await
            .expect("Failed to create database");

        assert_eq!(count(&db, "Users").await, 3);
        assert_eq!(count(&db, "Genres").await, 10);
        assert_eq!(count(&db, "Authors").await, 5);
        assert_eq!(count(&db, "Locations").await, 3);
        assert_eq!(count(&db, "Books").await, 4);
        assert_eq!(count(&db, "Loans").await, 0);
        assert_eq!(count(&db, "Reviews").await, 0);

        let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Users WHERE is_admin = 1")
            .fetch_one(db.pool())
            .await
            .expect("Failed to count admins");
        assert_eq!(admins, 1);

        let unlinked: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM Books WHERE author_id IS NULL OR genre_id IS NULL OR location_id IS NULL",
        )
        .fetch_one(db.pool())
        .await
        .expect("Failed to check seed references");
        assert_eq!(unlinked, 0, "Seed books should reference seeded rows");
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = Database::new_in_memory()
            .await
            .expect("Failed to create database");

        db.migrate().await.expect("Second migration run should succeed");

        assert_eq!(count(&db, "Genres").await, 10, "Seed must not run twice");
        assert_eq!(count(&db, "_migrations").await, 2);
    }

    #[tokio::test]
    async fn test_references_are_not_enforced() {
        let db = Database::new_in_memory()
            .await
            .expect("Failed to create database");

        let fk_enabled: i32 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .expect("Failed to check foreign keys");
        assert_eq!(fk_enabled, 0);

        sqlx::query(
            "INSERT INTO Loans (book_id, borrower_id, loan_date) VALUES (9999, 9999, '2024-01-01')",
        )
        .execute(db.pool())
        .await
        .expect("Dangling references are accepted");
        assert_eq!(count(&db, "Loans").await, 1);
    }
}
