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


//! Database storage and models
//!
//! This module handles all database operations using SQLite via sqlx.
//!
//! # Database Schema
//! - Users: accounts, borrowers and reviewers
//! - Authors, Genres, Locations: reference data for books
//! - Books: catalog entries with a denormalised availability status
//! - Loans: books lent to users
//! - Reviews: ratings (1-5) and read flags
//!
//! # Modules
//! - `queries` - authors, genres, locations and books
//! - `users`, `loans`, `reviews` - the remaining entities
//! - `search` - filtered book lookup
//! - `statistics` - aggregate counts
//!
//! # Usage Example
//! ```no_run
//! use homelib_core::storage::{Database, queries, loans, models::{NewBook, NewLoan}};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new("./library.db").await?;
//!
//! let book_id = queries::insert_book(db.pool(), &NewBook::new("Dune".to_string())).await?;
//! loans::insert_loan(db.pool(), &NewLoan::new(book_id, 2)).await?;
//!
//! let book = queries::find_book_by_id(db.pool(), book_id).await?;
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod loans;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod reviews;
pub mod search;
pub mod statistics;
pub mod users;

// Re-export commonly used types
pub use database::Database;
pub use models::{
    Author, Book, BookStatus, BookView, Genre, Loan, LoanView, Location, NewAuthor, NewBook,
    NewGenre, NewLoan, NewLocation, NewReview, NewUser, Review, ReviewView, User,
};
pub use search::BookFilter;
pub use statistics::GenreCount;
