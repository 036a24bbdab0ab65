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


//! Loan storage and the book status lifecycle
//!
//! A book's `status` column follows its loans procedurally:
//!
//! | Operation      | Effect on the book                               |
//! |----------------|--------------------------------------------------|
//! | `insert_loan`  | set to `Loaned`                                  |
//! | `update_loan`  | set to `Available` if the return date is now set |
//! | `delete_loan`  | set to `Available`                               |
//!
//! Other loans of the same book are not consulted. When two active loans
//! exist for one book, the status is whatever the last operation wrote.
//!
//! Every operation that touches both tables runs in a single transaction.

use crate::error::Result;
use crate::storage::models::{BookStatus, Loan, LoanView, NewLoan};
use chrono::NaiveDate;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, instrument};

const LOAN_VIEW_SELECT: &str = r#"
        SELECT
            l.*,
            COALESCE(b.title, '') AS book_title,
            COALESCE(u.full_name, '') AS borrower_name
        FROM Loans l
        LEFT JOIN Books b ON l.book_id = b.book_id
        LEFT JOIN Users u ON l.borrower_id = u.user_id
"#;

async fn set_book_status(
    tx: &mut Transaction<'_, Sqlite>,
    book_id: i64,
    status: BookStatus,
) -> Result<()> {
    sqlx::query("UPDATE Books SET status = ? WHERE book_id = ?")
        .bind(status.as_str())
        .bind(book_id)
        .execute(&mut **tx)
        .await?;

    debug!(book_id, status = %status, "book status changed");
    Ok(())
}

// ============================================================================
// READS
// ============================================================================

/// List all loans, most recent first
pub async fn list_loans(pool: &SqlitePool) -> Result<Vec<LoanView>> {
    let sql = format!("{} ORDER BY l.loan_date DESC, l.loan_id DESC", LOAN_VIEW_SELECT);
    let loans = sqlx::query_as::<_, LoanView>(&sql).fetch_all(pool).await?;

    Ok(loans)
}

/// List loans without a return date, most recent first
pub async fn list_active_loans(pool: &SqlitePool) -> Result<Vec<LoanView>> {
    let sql = format!(
        "{} WHERE l.return_date IS NULL ORDER BY l.loan_date DESC, l.loan_id DESC",
        LOAN_VIEW_SELECT
    );
    let loans = sqlx::query_as::<_, LoanView>(&sql).fetch_all(pool).await?;

    Ok(loans)
}

/// List active loans whose due date is before `today`, oldest due date first
pub async fn list_overdue_loans(pool: &SqlitePool, today: NaiveDate) -> Result<Vec<LoanView>> {
    let sql = format!(
        r#"{}
        WHERE l.return_date IS NULL AND l.due_date IS NOT NULL AND l.due_date < ?
        ORDER BY l.due_date, l.loan_id
        "#,
        LOAN_VIEW_SELECT
    );
    let loans = sqlx::query_as::<_, LoanView>(&sql)
        .bind(today)
        .fetch_all(pool)
        .await?;

    Ok(loans)
}

pub async fn find_loan_by_id(pool: &SqlitePool, loan_id: i64) -> Result<Option<LoanView>> {
    let sql = format!("{} WHERE l.loan_id = ?", LOAN_VIEW_SELECT);
    let loan = sqlx::query_as::<_, LoanView>(&sql)
        .bind(loan_id)
        .fetch_optional(pool)
        .await?;

    Ok(loan)
}

// ============================================================================
// LIFECYCLE
// ============================================================================

/// Record a new loan and mark the book as loaned
///
/// A book that is already loaned is not rejected.
///
/// # Returns
/// The generated loan_id
#[instrument(skip(pool, loan), fields(book_id = loan.book_id, borrower_id = loan.borrower_id))]
pub async fn insert_loan(pool: &SqlitePool, loan: &NewLoan) -> Result<i64> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO Loans (book_id, borrower_id, loan_date, due_date, return_date, notes)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(loan.book_id)
    .bind(loan.borrower_id)
    .bind(loan.loan_date)
    .bind(loan.due_date)
    .bind(loan.return_date)
    .bind(&loan.notes)
    .execute(&mut *tx)
    .await?;

    set_book_status(&mut tx, loan.book_id, BookStatus::Loaned).await?;

    tx.commit().await?;

    let loan_id = result.last_insert_rowid();
    info!(loan_id, "book lent");
    Ok(loan_id)
}

/// Persist changes to a loan
///
/// If the stored loan now has a return date, its book is marked available.
/// Clearing the return date leaves the book status alone. A loan_id that
/// matches no row changes nothing.
#[instrument(skip(pool, loan), fields(loan_id = loan.loan_id))]
pub async fn update_loan(pool: &SqlitePool, loan: &Loan) -> Result<()> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE Loans SET
            book_id = ?, borrower_id = ?, loan_date = ?, due_date = ?,
            return_date = ?, notes = ?
        WHERE loan_id = ?
        "#,
    )
    .bind(loan.book_id)
    .bind(loan.borrower_id)
    .bind(loan.loan_date)
    .bind(loan.due_date)
    .bind(loan.return_date)
    .bind(&loan.notes)
    .bind(loan.loan_id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        debug!("no such loan, nothing updated");
        return Ok(());
    }

    if loan.return_date.is_some() {
        set_book_status(&mut tx, loan.book_id, BookStatus::Available).await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Mark an active loan as returned on `date`
///
/// Convenience over `update_loan`. Returns `false` if the loan does not
/// exist.
pub async fn return_loan(pool: &SqlitePool, loan_id: i64, date: NaiveDate) -> Result<bool> {
    let Some(view) = find_loan_by_id(pool, loan_id).await? else {
        return Ok(false);
    };

    let mut loan = view.loan;
    loan.return_date = Some(date);
    update_loan(pool, &loan).await?;

    Ok(true)
}

/// Delete a loan and mark its book as available
///
/// The book is marked available even when other active loans for it remain.
/// A loan_id that matches no row changes nothing.
#[instrument(skip(pool))]
pub async fn delete_loan(pool: &SqlitePool, loan_id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;

    let book_id: Option<i64> = sqlx::query_scalar("SELECT book_id FROM Loans WHERE loan_id = ?")
        .bind(loan_id)
        .fetch_optional(&mut *tx)
        .await?;

    let Some(book_id) = book_id else {
        debug!("no such loan, nothing deleted");
        return Ok(());
    };

    sqlx::query("DELETE FROM Loans WHERE loan_id = ?")
        .bind(loan_id)
        .execute(&mut *tx)
        .await?;

    set_book_status(&mut tx, book_id, BookStatus::Available).await?;

    tx.commit().await?;

    info!(book_id, "loan deleted");
    Ok(())
}
