//! Database models for HomeLib
//!
//! Three shapes per entity:
//! - the persisted record (`Book`, `Loan`, ...) that mirrors its table row
//! - an insert record (`NewBook`, `NewLoan`, ...) without the generated key
//! - for books, loans and reviews, a read-only display view (`BookView`, ...)
//!   carrying names resolved through joins. Views are never written back.
//!
//! # SQLite Adaptations
//! - Book status stored as the text `Available` / `Loaned`
//! - Timestamps stored as TEXT `YYYY-MM-DD HH:MM:SS` (local time)
//! - Calendar dates stored as TEXT `YYYY-MM-DD`
//! - Booleans stored as integers

use chrono::{Local, NaiveDate, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Current local time truncated to whole seconds
///
/// Used for every defaulted timestamp so values round-trip through the
/// database unchanged.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

// ============================================================================
// ENUMS
// ============================================================================

/// Availability of a book
///
/// Denormalised onto the book row and kept up to date by the loan lifecycle
/// in `storage::loans`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookStatus {
    Available,
    Loaned,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "Available",
            BookStatus::Loaned => "Loaned",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookStatus {
    type Err = crate::error::LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(BookStatus::Available),
            "loaned" => Ok(BookStatus::Loaned),
            other => Err(crate::error::LibraryError::invalid_input(format!(
                "Unknown book status '{}'",
                other
            ))),
        }
    }
}

// ============================================================================
// PEOPLE
// ============================================================================

/// Library account; also the borrower of loans and the author of reviews
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
}

/// Author of books. Duplicates are allowed.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Author {
    pub author_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub biography: String,
    #[sqlx(default)]
    pub birth_date: Option<NaiveDate>,
    pub country: String,
}

impl Author {
    /// "Last First", trimmed when the first name is empty
    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
            .trim()
            .to_string()
    }
}

// ============================================================================
// REFERENCE DATA
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Genre {
    pub genre_id: i64,
    pub name: String,
    pub description: String,
}

/// Physical place a book is kept (room + shelf)
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Location {
    pub location_id: i64,
    pub name: String,
    pub description: String,
    pub room: String,
    pub shelf: String,
}

// ============================================================================
// CATALOG
// ============================================================================

/// Book entity as stored in the `Books` table
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Book {
    pub book_id: i64,
    pub title: String,
    pub isbn: String,
    #[sqlx(default)]
    pub publication_year: Option<i32>,
    pub publisher: String,
    #[sqlx(default)]
    pub page_count: Option<i32>,
    pub description: String,
    pub cover_image_path: String,
    #[sqlx(default)]
    pub author_id: Option<i64>,
    #[sqlx(default)]
    pub genre_id: Option<i64>,
    #[sqlx(default)]
    pub location_id: Option<i64>,
    pub status: String, // BookStatus as text
    pub date_added: NaiveDateTime,
}

impl Book {
    /// Get status as enum
    ///
    /// Unrecognised text (hand-edited databases) reads as `Available`.
    pub fn get_status(&self) -> BookStatus {
        self.status.parse().unwrap_or(BookStatus::Available)
    }
}

/// Book with author, genre and location names resolved for display
///
/// Missing references (never set, or nulled when the referenced row was
/// deleted) read as empty names.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct BookView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub book: Book,
    pub author_name: String,
    pub genre_name: String,
    pub location_name: String,
}

// ============================================================================
// CIRCULATION
// ============================================================================

/// A book lent to a user
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Loan {
    pub loan_id: i64,
    pub book_id: i64,
    pub borrower_id: i64,
    pub loan_date: NaiveDateTime,
    #[sqlx(default)]
    pub due_date: Option<NaiveDate>,
    #[sqlx(default)]
    pub return_date: Option<NaiveDate>,
    pub notes: String,
}

impl Loan {
    /// A loan is active until it has a return date
    pub fn is_active(&self) -> bool {
        self.return_date.is_none()
    }

    /// Active and past its due date as of `today`
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_active() && self.due_date.map_or(false, |due| due < today)
    }
}

/// Loan with book title and borrower name resolved for display
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LoanView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub loan: Loan,
    pub book_title: String,
    pub borrower_name: String,
}

/// A user's rating (1-5) and notes on a book
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Review {
    pub review_id: i64,
    pub book_id: i64,
    pub user_id: i64,
    pub rating: i32,
    pub review_text: String,
    pub review_date: NaiveDateTime,
    pub is_read: bool,
}

/// Review with book title and reviewer name resolved for display
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ReviewView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub review: Review,
    pub book_title: String,
    pub user_name: String,
}

// ============================================================================
// NEW RECORD STRUCTS (for inserts)
// ============================================================================

/// New user record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
}

impl NewUser {
    pub fn new(username: String, password: String, full_name: String) -> Self {
        Self {
            username,
            password,
            full_name,
            is_admin: false,
            created_at: now(),
        }
    }
}

/// New author record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuthor {
    pub first_name: String,
    pub last_name: String,
    pub biography: String,
    pub birth_date: Option<NaiveDate>,
    pub country: String,
}

impl NewAuthor {
    pub fn new(first_name: String, last_name: String) -> Self {
        Self {
            first_name,
            last_name,
            biography: String::new(),
            birth_date: None,
            country: String::new(),
        }
    }
}

/// New genre record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGenre {
    pub name: String,
    pub description: String,
}

impl NewGenre {
    pub fn new(name: String) -> Self {
        Self {
            name,
            description: String::new(),
        }
    }
}

/// New location record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLocation {
    pub name: String,
    pub description: String,
    pub room: String,
    pub shelf: String,
}

impl NewLocation {
    pub fn new(name: String) -> Self {
        Self {
            name,
            description: String::new(),
            room: String::new(),
            shelf: String::new(),
        }
    }
}

/// New book record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub isbn: String,
    pub publication_year: Option<i32>,
    pub publisher: String,
    pub page_count: Option<i32>,
    pub description: String,
    pub cover_image_path: String,
    pub author_id: Option<i64>,
    pub genre_id: Option<i64>,
    pub location_id: Option<i64>,
    pub status: BookStatus,
    pub date_added: NaiveDateTime,
}

impl NewBook {
    pub fn new(title: String) -> Self {
        Self {
            title,
            isbn: String::new(),
            publication_year: None,
            publisher: String::new(),
            page_count: None,
            description: String::new(),
            cover_image_path: String::new(),
            author_id: None,
            genre_id: None,
            location_id: None,
            status: BookStatus::Available,
            date_added: now(),
        }
    }
}

/// New loan record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLoan {
    pub book_id: i64,
    pub borrower_id: i64,
    pub loan_date: NaiveDateTime,
    pub due_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub notes: String,
}

impl NewLoan {
    pub fn new(book_id: i64, borrower_id: i64) -> Self {
        Self {
            book_id,
            borrower_id,
            loan_date: now(),
            due_date: None,
            return_date: None,
            notes: String::new(),
        }
    }
}

/// New review record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReview {
    pub book_id: i64,
    pub user_id: i64,
    pub rating: i32,
    pub review_text: String,
    pub review_date: NaiveDateTime,
    pub is_read: bool,
}

impl NewReview {
    pub fn new(book_id: i64, user_id: i64, rating: i32) -> Self {
        Self {
            book_id,
            user_id,
            rating,
            review_text: String::new(),
            review_date: now(),
            is_read: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loan(due: Option<NaiveDate>, returned: Option<NaiveDate>) -> Loan {
        Loan {
            loan_id: 1,
            book_id: 1,
            borrower_id: 1,
            loan_date: now(),
            due_date: due,
            return_date: returned,
            notes: String::new(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_book_status_parsing() {
        assert_eq!("Available".parse::<BookStatus>().unwrap(), BookStatus::Available);
        assert_eq!(" loaned ".parse::<BookStatus>().unwrap(), BookStatus::Loaned);
        assert!("Lost".parse::<BookStatus>().is_err());
        assert_eq!(BookStatus::Loaned.to_string(), "Loaned");
    }

    #[test]
    fn test_author_full_name() {
        let mut author = Author {
            author_id: 1,
            first_name: "Leo".to_string(),
            last_name: "Tolstoy".to_string(),
            biography: String::new(),
            birth_date: None,
            country: String::new(),
        };
        assert_eq!(author.full_name(), "Tolstoy Leo");

        author.first_name.clear();
        assert_eq!(author.full_name(), "Tolstoy");
    }

    #[test]
    fn test_loan_overdue() {
        let today = date(2024, 3, 10);

        assert!(loan(Some(date(2024, 3, 9)), None).is_overdue(today));
        assert!(!loan(Some(date(2024, 3, 10)), None).is_overdue(today));
        assert!(!loan(None, None).is_overdue(today));

        let returned = loan(Some(date(2024, 3, 1)), Some(date(2024, 3, 5)));
        assert!(!returned.is_active());
        assert!(!returned.is_overdue(today));
    }

    #[test]
    fn test_now_has_whole_seconds() {
        assert_eq!(now().and_utc().timestamp_subsec_nanos(), 0);
    }
}
