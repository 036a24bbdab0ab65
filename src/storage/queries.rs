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


//! Catalog query functions
//!
//! Repository functions for authors, genres, locations and books. Users,
//! loans and reviews live in their own modules because their writes carry
//! side effects.
//!
//! # Query Patterns
//! - One free function per operation, taking the pool first
//! - `find_*` returns `Ok(None)` for a key that matches no row
//! - `update_*` on a key that matches no row changes nothing
//! - Book reads go through `BookView` so display names come from joins

use crate::error::Result;
use crate::storage::models::*;
use sqlx::SqlitePool;
use tracing::debug;

/// Select list and joins producing a `BookView`
///
/// Missing references yield empty names. Shared with `storage::search`.
pub(crate) const BOOK_VIEW_SELECT: &str = r#"
        SELECT
            b.*,
            COALESCE(TRIM(a.first_name || ' ' || a.last_name), '') AS author_name,
            COALESCE(g.name, '') AS genre_name,
            COALESCE(l.name, '') AS location_name
        FROM Books b
        LEFT JOIN Authors a ON b.author_id = a.author_id
        LEFT JOIN Genres g ON b.genre_id = g.genre_id
        LEFT JOIN Locations l ON b.location_id = l.location_id
"#;

/// Delete a reference row and clear the matching column on Books
///
/// The key column of `table` has the same name as the Books column that
/// references it. Both names are literals, never user input.
async fn delete_referenced(pool: &SqlitePool, table: &str, column: &str, id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;

    let cleared = sqlx::query(&format!("UPDATE Books SET {} = NULL WHERE {} = ?", column, column))
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(&format!("DELETE FROM {} WHERE {} = ?", table, column))
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    debug!(table, id, books_cleared = cleared.rows_affected(), "deleted reference row");
    Ok(())
}

// ============================================================================
// AUTHOR QUERIES
// ============================================================================

/// List authors ordered by last name, then first name
pub async fn list_authors(pool: &SqlitePool) -> Result<Vec<Author>> {
    let authors = sqlx::query_as::<_, Author>(
        "SELECT * FROM Authors ORDER BY last_name, first_name, author_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(authors)
}

pub async fn find_author_by_id(pool: &SqlitePool, author_id: i64) -> Result<Option<Author>> {
    let author = sqlx::query_as::<_, Author>("SELECT * FROM Authors WHERE author_id = ?")
        .bind(author_id)
        .fetch_optional(pool)
        .await?;

    Ok(author)
}

/// Insert a new author
///
/// Returns the author_id of the inserted author.
pub async fn insert_author(pool: &SqlitePool, author: &NewAuthor) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO Authors (first_name, last_name, biography, birth_date, country)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&author.first_name)
    .bind(&author.last_name)
    .bind(&author.biography)
    .bind(author.birth_date)
    .bind(&author.country)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn update_author(pool: &SqlitePool, author: &Author) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE Authors SET
            first_name = ?, last_name = ?, biography = ?, birth_date = ?, country = ?
        WHERE author_id = ?
        "#,
    )
    .bind(&author.first_name)
    .bind(&author.last_name)
    .bind(&author.biography)
    .bind(author.birth_date)
    .bind(&author.country)
    .bind(author.author_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete an author
///
/// Books written by the author are kept with their author cleared.
pub async fn delete_author(pool: &SqlitePool, author_id: i64) -> Result<()> {
    delete_referenced(pool, "Authors", "author_id", author_id).await
}

// ============================================================================
// GENRE QUERIES
// ============================================================================

pub async fn list_genres(pool: &SqlitePool) -> Result<Vec<Genre>> {
    let genres = sqlx::query_as::<_, Genre>("SELECT * FROM Genres ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(genres)
}

pub async fn find_genre_by_id(pool: &SqlitePool, genre_id: i64) -> Result<Option<Genre>> {
    let genre = sqlx::query_as::<_, Genre>("SELECT * FROM Genres WHERE genre_id = ?")
        .bind(genre_id)
        .fetch_optional(pool)
        .await?;

    Ok(genre)
}

/// Insert a new genre
///
/// Fails with a constraint violation if the name is already taken.
pub async fn insert_genre(pool: &SqlitePool, genre: &NewGenre) -> Result<i64> {
    let result = sqlx::query("INSERT INTO Genres (name, description) VALUES (?, ?)")
        .bind(&genre.name)
        .bind(&genre.description)
        .execute(pool)
        .await?;

    Ok(result.last_insert_rowid())
}

pub async fn update_genre(pool: &SqlitePool, genre: &Genre) -> Result<()> {
    sqlx::query("UPDATE Genres SET name = ?, description = ? WHERE genre_id = ?")
        .bind(&genre.name)
        .bind(&genre.description)
        .bind(genre.genre_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Delete a genre, clearing it from any books
pub async fn delete_genre(pool: &SqlitePool, genre_id: i64) -> Result<()> {
    delete_referenced(pool, "Genres", "genre_id", genre_id).await
}

// ============================================================================
// LOCATION QUERIES
// ============================================================================

pub async fn list_locations(pool: &SqlitePool) -> Result<Vec<Location>> {
    let locations =
        sqlx::query_as::<_, Location>("SELECT * FROM Locations ORDER BY name, location_id")
            .fetch_all(pool)
            .await?;

    Ok(locations)
}

pub async fn find_location_by_id(pool: &SqlitePool, location_id: i64) -> Result<Option<Location>> {
    let location = sqlx::query_as::<_, Location>("SELECT * FROM Locations WHERE location_id = ?")
        .bind(location_id)
        .fetch_optional(pool)
        .await?;

    Ok(location)
}

pub async fn insert_location(pool: &SqlitePool, location: &NewLocation) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO Locations (name, description, room, shelf) VALUES (?, ?, ?, ?)",
    )
    .bind(&location.name)
    .bind(&location.description)
    .bind(&location.room)
    .bind(&location.shelf)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn update_location(pool: &SqlitePool, location: &Location) -> Result<()> {
    sqlx::query(
        "UPDATE Locations SET name = ?, description = ?, room = ?, shelf = ? WHERE location_id = ?",
    )
    .bind(&location.name)
    .bind(&location.description)
    .bind(&location.room)
    .bind(&location.shelf)
    .bind(location.location_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a location, clearing it from any books
pub async fn delete_location(pool: &SqlitePool, location_id: i64) -> Result<()> {
    delete_referenced(pool, "Locations", "location_id", location_id).await
}

// ============================================================================
// BOOK QUERIES
// ============================================================================

/// List all books with display names, ordered by title (case-insensitive)
pub async fn list_books(pool: &SqlitePool) -> Result<Vec<BookView>> {
    let sql = format!("{} ORDER BY b.title COLLATE NOCASE, b.book_id", BOOK_VIEW_SELECT);
    let books = sqlx::query_as::<_, BookView>(&sql).fetch_all(pool).await?;

    Ok(books)
}

/// Find book by ID
pub async fn find_book_by_id(pool: &SqlitePool, book_id: i64) -> Result<Option<BookView>> {
    let sql = format!("{} WHERE b.book_id = ?", BOOK_VIEW_SELECT);
    let book = sqlx::query_as::<_, BookView>(&sql)
        .bind(book_id)
        .fetch_optional(pool)
        .await?;

    Ok(book)
}

/// Count total books
pub async fn count_books(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Books")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Insert a new book
///
/// Returns the book_id of the inserted book.
pub async fn insert_book(pool: &SqlitePool, book: &NewBook) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO Books (
            title, isbn, publication_year, publisher, page_count,
            description, cover_image_path, author_id, genre_id, location_id,
            status, date_added
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&book.title)
    .bind(&book.isbn)
    .bind(book.publication_year)
    .bind(&book.publisher)
    .bind(book.page_count)
    .bind(&book.description)
    .bind(&book.cover_image_path)
    .bind(book.author_id)
    .bind(book.genre_id)
    .bind(book.location_id)
    .bind(book.status.as_str())
    .bind(book.date_added)
    .execute(pool)
    .await?;

    let book_id = result.last_insert_rowid();
    debug!(book_id, title = %book.title, "inserted book");

    Ok(book_id)
}

/// Update an existing book
///
/// Status is written as given. The loan lifecycle overwrites it again on the
/// next loan change.
///
/// # Errors
/// - `InvalidInput` if `status` is not a known `BookStatus`
pub async fn update_book(pool: &SqlitePool, book: &Book) -> Result<()> {
    let status: BookStatus = book.status.parse()?;

    sqlx::query(
        r#"
        UPDATE Books SET
            title = ?, isbn = ?, publication_year = ?, publisher = ?, page_count = ?,
            description = ?, cover_image_path = ?, author_id = ?, genre_id = ?,
            location_id = ?, status = ?
        WHERE book_id = ?
        "#,
    )
    .bind(&book.title)
    .bind(&book.isbn)
    .bind(book.publication_year)
    .bind(&book.publisher)
    .bind(book.page_count)
    .bind(&book.description)
    .bind(&book.cover_image_path)
    .bind(book.author_id)
    .bind(book.genre_id)
    .bind(book.location_id)
    .bind(status.as_str())
    .bind(book.book_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a book
///
/// Its loans and reviews are kept and still count towards statistics.
pub async fn delete_book(pool: &SqlitePool, book_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM Books WHERE book_id = ?")
        .bind(book_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::Database;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_insert_and_find_book() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        let mut new_book = NewBook::new("Dune".to_string());
        new_book.isbn = "978-0441013593".to_string();
        new_book.publication_year = Some(1965);

        let book_id = insert_book(db.pool(), &new_book).await.expect("Failed to insert book");
        assert!(book_id > 0);

        let found = find_book_by_id(db.pool(), book_id)
            .await
            .expect("Failed to find book")
            .expect("Book should exist");

        assert_eq!(found.book.title, "Dune");
        assert_eq!(found.book.publication_year, Some(1965));
        assert_eq!(found.book.page_count, None);
        assert_eq!(found.book.author_id, None);
        assert_eq!(found.book.get_status(), BookStatus::Available);
        assert_eq!(found.book.date_added, new_book.date_added);
        assert_eq!(found.author_name, "");
        assert_eq!(found.genre_name, "");
    }

    #[tokio::test]
    async fn test_find_missing_book_is_none() {
        let db = Database::new_in_memory().await.expect("Failed to create database");
        let found = find_book_by_id(db.pool(), 9999).await.expect("Query failed");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_book_view_resolves_names() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        let author_id = insert_author(
            db.pool(),
            &NewAuthor::new("Frank".to_string(), "Herbert".to_string()),
        )
        .await
        .expect("Failed to insert author");
        let genre_id = insert_genre(db.pool(), &NewGenre::new("Space Opera".to_string()))
            .await
            .expect("Failed to insert genre");

        let mut new_book = NewBook::new("Dune".to_string());
        new_book.author_id = Some(author_id);
        new_book.genre_id = Some(genre_id);
        let book_id = insert_book(db.pool(), &new_book).await.expect("Failed to insert book");

        let view = find_book_by_id(db.pool(), book_id).await.unwrap().unwrap();
        assert_eq!(view.author_name, "Frank Herbert");
        assert_eq!(view.genre_name, "Space Opera");
        assert_eq!(view.location_name, "");

        // Deleting the author clears the reference instead of dangling
        delete_author(db.pool(), author_id).await.expect("Failed to delete author");
        let view = find_book_by_id(db.pool(), book_id).await.unwrap().unwrap();
        assert_eq!(view.book.author_id, None);
        assert_eq!(view.author_name, "");
    }

    #[tokio::test]
    async fn test_update_book_and_absent_key() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        let book_id = insert_book(db.pool(), &NewBook::new("Draft".to_string()))
            .await
            .expect("Failed to insert book");

        let mut book = find_book_by_id(db.pool(), book_id).await.unwrap().unwrap().book;
        book.title = "Final".to_string();
        book.page_count = Some(412);
        update_book(db.pool(), &book).await.expect("Failed to update book");

        let stored = find_book_by_id(db.pool(), book_id).await.unwrap().unwrap().book;
        assert_eq!(stored, book);

        let before = count_books(db.pool()).await.unwrap();
        book.book_id = 9999;
        update_book(db.pool(), &book).await.expect("Update of absent key should succeed");
        assert_eq!(count_books(db.pool()).await.unwrap(), before);
        assert!(find_book_by_id(db.pool(), 9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_book_rejects_unknown_status() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        let book_id = insert_book(db.pool(), &NewBook::new("Chapaev and Void".to_string()))
            .await
            .unwrap();
        let mut book = find_book_by_id(db.pool(), book_id).await.unwrap().unwrap().book;

        book.status = "Lost".to_string();
        let err = update_book(db.pool(), &book).await.expect_err("Unknown status should fail");
        assert!(matches!(err, crate::error::LibraryError::InvalidInput(_)));

        book.status = "loaned".to_string();
        update_book(db.pool(), &book).await.expect("Known status in any case is accepted");
        let stored = find_book_by_id(db.pool(), book_id).await.unwrap().unwrap().book;
        assert_eq!(stored.status, "Loaned");
    }

    #[tokio::test]
    async fn test_update_author_and_genre_absent_key() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        let authors_before = list_authors(db.pool()).await.unwrap();
        let mut author = authors_before[0].clone();
        author.author_id = 9999;
        author.last_name = "Nobody".to_string();
        update_author(db.pool(), &author).await.expect("Update of absent key should succeed");
        assert_eq!(list_authors(db.pool()).await.unwrap(), authors_before);
        assert!(find_author_by_id(db.pool(), 9999).await.unwrap().is_none());

        let genres_before = list_genres(db.pool()).await.unwrap();
        let ghost = Genre {
            genre_id: 9999,
            name: "Nonexistent".to_string(),
            description: String::new(),
        };
        update_genre(db.pool(), &ghost).await.expect("Update of absent key should succeed");
        assert_eq!(list_genres(db.pool()).await.unwrap(), genres_before);
        assert!(find_genre_by_id(db.pool(), 9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_genre_and_location_clear_books() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        let genre_id = insert_genre(db.pool(), &NewGenre::new("Essays".to_string())).await.unwrap();
        let location_id = insert_location(db.pool(), &NewLocation::new("Kitchen".to_string()))
            .await
            .unwrap();
        let mut new_book = NewBook::new("Notes".to_string());
        new_book.genre_id = Some(genre_id);
        new_book.location_id = Some(location_id);
        let book_id = insert_book(db.pool(), &new_book).await.unwrap();

        delete_genre(db.pool(), genre_id).await.unwrap();
        delete_location(db.pool(), location_id).await.unwrap();

        assert!(find_genre_by_id(db.pool(), genre_id).await.unwrap().is_none());
        let view = find_book_by_id(db.pool(), book_id).await.unwrap().unwrap();
        assert_eq!(view.book.genre_id, None);
        assert_eq!(view.book.location_id, None);
        assert_eq!(view.genre_name, "");
        assert_eq!(view.location_name, "");
    }

    #[tokio::test]
    async fn test_list_books_ordered_by_title() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        insert_book(db.pool(), &NewBook::new("zebra tales".to_string())).await.unwrap();
        insert_book(db.pool(), &NewBook::new("Anna Karenina".to_string())).await.unwrap();

        let titles: Vec<String> = list_books(db.pool())
            .await
            .expect("Failed to list books")
            .into_iter()
            .map(|b| b.book.title.to_ascii_lowercase())
            .collect();

        let mut sorted = titles.clone();
        sorted.sort();
        assert_eq!(titles, sorted);
        assert_eq!(titles.first().map(String::as_str), Some("anna karenina"));
        assert_eq!(titles.last().map(String::as_str), Some("zebra tales"));
    }

    #[tokio::test]
    async fn test_author_round_trip_and_ordering() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        let mut new_author = NewAuthor::new("Arkady".to_string(), "Strugatsky".to_string());
        new_author.birth_date = NaiveDate::from_ymd_opt(1925, 8, 28);
        let arkady = insert_author(db.pool(), &new_author).await.unwrap();
        let boris = insert_author(
            db.pool(),
            &NewAuthor::new("Boris".to_string(), "Strugatsky".to_string()),
        )
        .await
        .unwrap();

        let stored = find_author_by_id(db.pool(), arkady).await.unwrap().unwrap();
        assert_eq!(stored.birth_date, new_author.birth_date);
        assert_eq!(stored.biography, "");

        let authors = list_authors(db.pool()).await.unwrap();
        let keys: Vec<(String, String)> = authors
            .iter()
            .map(|a| (a.last_name.clone(), a.first_name.clone()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);

        let pos_a = authors.iter().position(|a| a.author_id == arkady).unwrap();
        let pos_b = authors.iter().position(|a| a.author_id == boris).unwrap();
        assert!(pos_a < pos_b);
    }

    #[tokio::test]
    async fn test_duplicate_genre_is_constraint_violation() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        let err = insert_genre(db.pool(), &NewGenre::new("Poetry".to_string()))
            .await
            .expect_err("Duplicate genre should fail");
        assert!(err.is_constraint_violation());
    }

    #[tokio::test]
    async fn test_location_crud() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        let mut new_location = NewLocation::new("Attic - Box 3".to_string());
        new_location.room = "Attic".to_string();
        let location_id = insert_location(db.pool(), &new_location).await.unwrap();

        let mut location = find_location_by_id(db.pool(), location_id).await.unwrap().unwrap();
        assert_eq!(location.room, "Attic");
        assert_eq!(location.shelf, "");

        location.shelf = "Box 3".to_string();
        update_location(db.pool(), &location).await.unwrap();
        assert_eq!(
            find_location_by_id(db.pool(), location_id).await.unwrap(),
            Some(location)
        );

        delete_location(db.pool(), location_id).await.unwrap();
        assert!(find_location_by_id(db.pool(), location_id).await.unwrap().is_none());

        let names: Vec<String> = list_locations(db.pool())
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
