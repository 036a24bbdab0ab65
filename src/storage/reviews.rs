// HomeLib - Home Book Collection Manager
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Review storage operations
//!
//! Ratings outside 1-5 are rejected by a CHECK constraint and surface as
//! `LibraryError::SqlxError` (see `LibraryError::is_constraint_violation`).

use crate::error::Result;
use crate::storage::models::{NewReview, Review, ReviewView};
use sqlx::SqlitePool;

const REVIEW_VIEW_SELECT: &str = r#"
        SELECT
            r.*,
            COALESCE(b.title, '') AS book_title,
            COALESCE(u.full_name, '') AS user_name
        FROM Reviews r
        LEFT JOIN Books b ON r.book_id = b.book_id
        LEFT JOIN Users u ON r.user_id = u.user_id
"#;

/// List all reviews, most recent first
pub async fn list_reviews(pool: &SqlitePool) -> Result<Vec<ReviewView>> {
    let sql = format!(
        "{} ORDER BY r.review_date DESC, r.review_id DESC",
        REVIEW_VIEW_SELECT
    );
    let reviews = sqlx::query_as::<_, ReviewView>(&sql).fetch_all(pool).await?;

    Ok(reviews)
}

/// List the reviews of one book, most recent first
pub async fn list_reviews_by_book(pool: &SqlitePool, book_id: i64) -> Result<Vec<ReviewView>> {
    let sql = format!(
        "{} WHERE r.book_id = ? ORDER BY r.review_date DESC, r.review_id DESC",
        REVIEW_VIEW_SELECT
    );
    let reviews = sqlx::query_as::<_, ReviewView>(&sql)
        .bind(book_id)
        .fetch_all(pool)
        .await?;

    Ok(reviews)
}

pub async fn find_review_by_id(pool: &SqlitePool, review_id: i64) -> Result<Option<ReviewView>> {
    let sql = format!("{} WHERE r.review_id = ?", REVIEW_VIEW_SELECT);
    let review = sqlx::query_as::<_, ReviewView>(&sql)
        .bind(review_id)
        .fetch_optional(pool)
        .await?;

    Ok(review)
}

pub async fn insert_review(pool: &SqlitePool, review: &NewReview) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO Reviews (book_id, user_id, rating, review_text, review_date, is_read)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(review.book_id)
    .bind(review.user_id)
    .bind(review.rating)
    .bind(&review.review_text)
    .bind(review.review_date)
    .bind(review.is_read)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn update_review(pool: &SqlitePool, review: &Review) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE Reviews SET
            book_id = ?, user_id = ?, rating = ?, review_text = ?,
            review_date = ?, is_read = ?
        WHERE review_id = ?
        "#,
    )
    .bind(review.book_id)
    .bind(review.user_id)
    .bind(review.rating)
    .bind(&review.review_text)
    .bind(review.review_date)
    .bind(review.is_read)
    .bind(review.review_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete_review(pool: &SqlitePool, review_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM Reviews WHERE review_id = ?")
        .bind(review_id)
        .execute(pool)
        .await?;

    Ok(())
}
