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


use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use homelib_core::storage::{loans, search, statistics, BookStatus, NewLoan};
use homelib_core::{Config, Database, Session};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "homelib-cli")]
#[command(about = "HomeLib CLI - Desktop testing tool", long_about = None)]
struct Cli {
    /// Database file (overrides HOMELIB_DATABASE)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create and seed the database if it does not exist
    Init,
    /// Search the catalog
    Books {
        /// Substring of title, author or ISBN
        #[arg(short, long)]
        text: Option<String>,
        #[arg(short, long)]
        genre: Option<i64>,
        /// Available or Loaned
        #[arg(short, long)]
        status: Option<BookStatus>,
        /// Publication year
        #[arg(short, long)]
        year: Option<i32>,
        /// Only books with (true) or without (false) reviews
        #[arg(long)]
        reviewed: Option<bool>,
    },
    /// List loans
    Loans {
        /// Only loans that have not been returned
        #[arg(long)]
        active: bool,
        /// Only active loans past their due date
        #[arg(long, conflicts_with = "active")]
        overdue: bool,
    },
    /// Lend a book to a user
    Lend {
        #[arg(short, long)]
        book: i64,
        #[arg(short, long)]
        user: i64,
        /// Due date (YYYY-MM-DD)
        #[arg(short, long)]
        due: Option<NaiveDate>,
        #[arg(short, long, default_value = "")]
        notes: String,
    },
    /// Mark a loan as returned
    Return {
        #[arg(short, long)]
        loan: i64,
        /// Return date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Show collection statistics
    Stats {
        #[command(subcommand)]
        report: StatsReport,
    },
    /// Check a username and password
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum StatsReport {
    /// Books per genre
    Genres,
    /// Reviews per rating
    Ratings,
    /// Books read per month of a year
    Months {
        #[arg(short, long)]
        year: i32,
    },
    /// Books read per year
    Years,
}

fn print<T: Serialize>(json: bool, value: &T, text: impl FnOnce(&T)) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        text(value);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let path = cli.database.unwrap_or(config.database_path);
    let db = Database::new(&path)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    let pool = db.pool();
    let json = cli.json;

    match cli.command {
        Commands::Init => {
            let ok = db.check_integrity().await?;
            println!(
                "Library database ready at {} (integrity: {})",
                path.display(),
                if ok { "ok" } else { "FAILED" }
            );
        }
        Commands::Books {
            text,
            genre,
            status,
            year,
            reviewed,
        } => {
            let filter = search::BookFilter {
                text,
                genre_id: genre,
                status,
                year,
                has_review: reviewed,
            };
            let books = search::search_books(pool, &filter).await?;
            print(json, &books, |books| {
                for view in books {
                    println!(
                        "{:>4}  {:<40} {:<25} {:<10} {}",
                        view.book.book_id,
                        view.book.title,
                        view.author_name,
                        view.book.status,
                        view.book.publication_year.map(|y| y.to_string()).unwrap_or_default()
                    );
                }
                println!("{} book(s)", books.len());
            })?;
        }
        Commands::Loans { active, overdue } => {
            let today = Local::now().date_naive();
            let loans = if overdue {
                loans::list_overdue_loans(pool, today).await?
            } else if active {
                loans::list_active_loans(pool).await?
            } else {
                loans::list_loans(pool).await?
            };
            print(json, &loans, |loans| {
                for view in loans {
                    let state = match view.loan.return_date {
                        Some(date) => format!("returned {}", date),
                        None if view.loan.is_overdue(today) => "OVERDUE".to_string(),
                        None => "out".to_string(),
                    };
                    println!(
                        "{:>4}  {:<40} {:<20} {}  {}",
                        view.loan.loan_id,
                        view.book_title,
                        view.borrower_name,
                        view.loan.loan_date.date(),
                        state
                    );
                }
            })?;
        }
        Commands::Lend {
            book,
            user,
            due,
            notes,
        } => {
            let mut loan = NewLoan::new(book, user);
            loan.due_date = due;
            loan.notes = notes;
            let loan_id = loans::insert_loan(pool, &loan)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("Created loan {}", loan_id);
        }
        Commands::Return { loan, date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            if !loans::return_loan(pool, loan, date).await? {
                bail!("No loan with id {}", loan);
            }
            println!("Loan {} returned on {}", loan, date);
        }
        Commands::Stats { report } => match report {
            StatsReport::Genres => {
                let counts = statistics::genre_counts(pool).await?;
                print(json, &counts, |counts| {
                    for c in counts {
                        println!("{:<30} {}", c.name, c.book_count);
                    }
                })?;
            }
            StatsReport::Ratings => {
                let histogram = statistics::rating_histogram(pool).await?;
                print(json, &histogram, |histogram| {
                    for (rating, count) in histogram {
                        println!("{} {:<20} {}", rating, "*".repeat(*rating as usize), count);
                    }
                })?;
            }
            StatsReport::Months { year } => {
                let raw = statistics::reading_by_month(pool, year).await?;
                let months = statistics::fill_months(&raw);
                print(json, &months, |months| {
                    for (month, count) in months {
                        println!("{}-{:02}  {}", year, month, count);
                    }
                })?;
            }
            StatsReport::Years => {
                let years = statistics::reading_by_year(pool).await?;
                print(json, &years, |years| {
                    for (year, count) in years {
                        println!("{}  {}", year, count);
                    }
                })?;
            }
        },
        Commands::Login { username, password } => {
            match Session::login(pool, &username, &password).await? {
                Some(session) => println!(
                    "Logged in as {} ({}){}",
                    session.user().full_name,
                    session.user().username,
                    if session.is_admin() { " [admin]" } else { "" }
                ),
                None => bail!("Invalid username or password"),
            }
        }
    }

    db.close().await?;
    Ok(())
}
