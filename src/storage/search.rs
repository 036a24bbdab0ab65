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


//! Book search
//!
//! A `BookFilter` holds optional criteria. Each present criterion becomes one
//! `Clause`, and the clauses are combined with `AND`. An empty filter returns
//! every book. Results are ordered by title (case-insensitive).
//!
//! # Usage Example
//! ```no_run
//! use homelib_core::storage::{search::{search_books, BookFilter}, BookStatus, Database};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new("./library.db").await?;
//! let filter = BookFilter::new()
//!     .text("tolstoy")
//!     .status(BookStatus::Available)
//!     .has_review(false);
//! let books = search_books(db.pool(), &filter).await?;
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use crate::storage::models::{BookStatus, BookView};
use crate::storage::queries::BOOK_VIEW_SELECT;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

/// Optional search criteria, all combined conjunctively
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookFilter {
    /// Case-insensitive substring of title, author first/last name or ISBN
    pub text: Option<String>,
    pub genre_id: Option<i64>,
    pub status: Option<BookStatus>,
    /// Exact publication year
    pub year: Option<i32>,
    /// `true`: at least one review, `false`: none
    pub has_review: Option<bool>,
}

impl BookFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn genre_id(mut self, genre_id: i64) -> Self {
        self.genre_id = Some(genre_id);
        self
    }

    pub fn status(mut self, status: BookStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn has_review(mut self, has_review: bool) -> Self {
        self.has_review = Some(has_review);
        self
    }

    /// Translate the present criteria into predicates
    ///
    /// Whitespace-only text is ignored. Other text is matched as given.
    fn clauses(&self) -> Vec<Clause> {
        let mut clauses = Vec::new();

        if let Some(text) = self.text.as_deref().filter(|t| !t.trim().is_empty()) {
            clauses.push(Clause::Text(like_pattern(text)));
        }
        if let Some(genre_id) = self.genre_id {
            clauses.push(Clause::Genre(genre_id));
        }
        if let Some(status) = self.status {
            clauses.push(Clause::Status(status));
        }
        if let Some(year) = self.year {
            clauses.push(Clause::Year(year));
        }
        if let Some(has_review) = self.has_review {
            clauses.push(Clause::HasReview(has_review));
        }

        clauses
    }
}

/// One search predicate
#[derive(Debug, Clone, PartialEq, Eq)]
enum Clause {
    /// Escaped `LIKE` pattern
    Text(String),
    Genre(i64),
    Status(BookStatus),
    Year(i32),
    HasReview(bool),
}

impl Clause {
    fn push_to(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            Clause::Text(pattern) => {
                qb.push("(b.title LIKE ");
                qb.push_bind(pattern.clone());
                qb.push(" ESCAPE '\\' OR a.first_name LIKE ");
                qb.push_bind(pattern.clone());
                qb.push(" ESCAPE '\\' OR a.last_name LIKE ");
                qb.push_bind(pattern.clone());
                qb.push(" ESCAPE '\\' OR b.isbn LIKE ");
                qb.push_bind(pattern.clone());
                qb.push(" ESCAPE '\\')");
            }
            Clause::Genre(genre_id) => {
                qb.push("b.genre_id = ");
                qb.push_bind(*genre_id);
            }
            Clause::Status(status) => {
                qb.push("b.status = ");
                qb.push_bind(status.as_str());
            }
            Clause::Year(year) => {
                qb.push("b.publication_year = ");
                qb.push_bind(*year);
            }
            Clause::HasReview(true) => {
                qb.push("EXISTS (SELECT 1 FROM Reviews r WHERE r.book_id = b.book_id)");
            }
            Clause::HasReview(false) => {
                qb.push("NOT EXISTS (SELECT 1 FROM Reviews r WHERE r.book_id = b.book_id)");
            }
        }
    }
}

/// Wrap text in `%...%`, escaping LIKE wildcards so they match literally
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Search books matching every criterion in `filter`
///
/// Each book appears at most once. SQLite's `LIKE` folds ASCII letters
/// only, so non-ASCII text matches case-sensitively.
pub async fn search_books(pool: &SqlitePool, filter: &BookFilter) -> Result<Vec<BookView>> {
    let clauses = filter.clauses();

    let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(BOOK_VIEW_SELECT);
    for (i, clause) in clauses.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        clause.push_to(&mut qb);
    }
    qb.push(" ORDER BY b.title COLLATE NOCASE, b.book_id");

    let books = qb.build_query_as::<BookView>().fetch_all(pool).await?;

    debug!(clauses = clauses.len(), results = books.len(), "book search");
    Ok(books)
}
