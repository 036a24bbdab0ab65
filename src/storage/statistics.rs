// HomeLib - Home Book Collection Manager
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Collection statistics
//!
//! Read-only aggregates over books and reviews. "Reading" counts reviews
//! whose read flag is set, bucketed by review date.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use std::collections::BTreeMap;

/// Number of books in one genre
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct GenreCount {
    pub genre_id: i64,
    pub name: String,
    pub book_count: i64,
}

/// Book count for every genre, largest first
///
/// Genres without books are included with a count of 0. Ties are broken by
/// genre name.
pub async fn genre_counts(pool: &SqlitePool) -> Result<Vec<GenreCount>> {
    let counts = sqlx::query_as::<_, GenreCount>(
        r#"
        SELECT g.genre_id, g.name, COUNT(b.book_id) AS book_count
        FROM Genres g
        LEFT JOIN Books b ON b.genre_id = g.genre_id
        GROUP BY g.genre_id, g.name
        ORDER BY book_count DESC, g.name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(counts)
}

/// Number of reviews per rating; keys 1 through 5 are always present
pub async fn rating_histogram(pool: &SqlitePool) -> Result<BTreeMap<i32, i64>> {
    let rows: Vec<(i32, i64)> =
        sqlx::query_as("SELECT rating, COUNT(*) FROM Reviews GROUP BY rating")
            .fetch_all(pool)
            .await?;

    let mut histogram: BTreeMap<i32, i64> = (1..=5).map(|rating| (rating, 0)).collect();
    histogram.extend(rows);

    Ok(histogram)
}

/// Read reviews in `year`, keyed by two-digit month (`"01"`..`"12"`)
///
/// Months without read reviews are absent; see `fill_months`.
pub async fn reading_by_month(pool: &SqlitePool, year: i32) -> Result<BTreeMap<String, i64>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT strftime('%m', review_date) AS month, COUNT(*)
        FROM Reviews
        WHERE is_read = 1 AND strftime('%Y', review_date) = ?
        GROUP BY month
        "#,
    )
    .bind(format!("{:04}", year))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().collect())
}

/// Zero-fill a `reading_by_month` result into twelve `(month, count)` pairs
pub fn fill_months(raw: &BTreeMap<String, i64>) -> Vec<(u32, i64)> {
    (1..=12)
        .map(|month| {
            let key = format!("{:02}", month);
            (month, raw.get(&key).copied().unwrap_or(0))
        })
        .collect()
}

/// Read reviews per calendar year, across all years
pub async fn reading_by_year(pool: &SqlitePool) -> Result<BTreeMap<i32, i64>> {
    let rows: Vec<(i32, i64)> = sqlx::query_as(
        r#"
        SELECT CAST(strftime('%Y', review_date) AS INTEGER) AS year, COUNT(*)
        FROM Reviews
        WHERE is_read = 1
        GROUP BY year
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::Database;
    use crate::storage::models::{NewBook, NewReview};
    use crate::storage::{queries, reviews, users};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(20, 15, 0)
            .unwrap()
    }

    async fn add_review(db: &Database, book_id: i64, rating: i32, date: NaiveDateTime, read: bool) {
        let user_id = users::find_user_by_username(db.pool(), "user1")
            .await
            .unwrap()
            .unwrap()
            .user_id;
        let mut review = NewReview::new(book_id, user_id, rating);
        review.review_date = date;
        review.is_read = read;
        reviews::insert_review(db.pool(), &review).await.expect("Failed to insert review");
    }

    #[tokio::test]
    async fn test_empty_histogram_is_zero_filled() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        let histogram = rating_histogram(db.pool()).await.unwrap();
        let expected: BTreeMap<i32, i64> = (1..=5).map(|r| (r, 0)).collect();
        assert_eq!(histogram, expected);
    }

    #[tokio::test]
    async fn test_histogram_counts() {
        let db = Database::new_in_memory().await.expect("Failed to create database");
        let book_id = queries::insert_book(db.pool(), &NewBook::new("Oblomov".to_string()))
            .await
            .unwrap();

        add_review(&db, book_id, 5, at(2024, 1, 1), true).await;
        add_review(&db, book_id, 5, at(2024, 1, 2), false).await;
        add_review(&db, book_id, 2, at(2024, 1, 3), true).await;

        let histogram = rating_histogram(db.pool()).await.unwrap();
        assert_eq!(histogram.len(), 5);
        assert_eq!(histogram[&5], 2);
        assert_eq!(histogram[&2], 1);
        assert_eq!(histogram[&1], 0);
    }

    #[tokio::test]
    async fn test_genre_counts_include_empty_genres() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        let counts = genre_counts(db.pool()).await.unwrap();
        assert_eq!(counts.len(), 10);

        // Seeded catalog: two Classics, one Poetry, one Fiction
        assert_eq!(counts[0].name, "Classics");
        assert_eq!(counts[0].book_count, 2);
        assert!(counts.iter().any(|c| c.name == "Mystery" && c.book_count == 0));

        let values: Vec<i64> = counts.iter().map(|c| c.book_count).collect();
        let mut sorted = values.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(values, sorted);
    }

    #[tokio::test]
    async fn test_reading_by_month_and_year() {
        let db = Database::new_in_memory().await.expect("Failed to create database");
        let book_id = queries::insert_book(db.pool(), &NewBook::new("Oblomov".to_string()))
            .await
            .unwrap();

        add_review(&db, book_id, 4, at(2024, 3, 14), true).await;
        add_review(&db, book_id, 3, at(2024, 3, 20), false).await;
        add_review(&db, book_id, 3, at(2023, 11, 2), true).await;

        let raw = reading_by_month(db.pool(), 2024).await.unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw.get("03"), Some(&1));

        let filled = fill_months(&raw);
        assert_eq!(filled.len(), 12);
        assert_eq!(filled[2], (3, 1));
        assert!(filled.iter().filter(|(m, _)| *m != 3).all(|(_, c)| *c == 0));

        let by_year = reading_by_year(db.pool()).await.unwrap();
        assert_eq!(by_year.get(&2024), Some(&1));
        assert_eq!(by_year.get(&2023), Some(&1));
        assert_eq!(by_year.len(), 2);
    }

    #[test]
    fn test_fill_months_without_data() {
        let filled = fill_months(&BTreeMap::new());
        assert_eq!(filled.first(), Some(&(1, 0)));
        assert_eq!(filled.last(), Some(&(12, 0)));
    }
}
