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


//! HomeLib core: data layer for a home book collection
//!
//! Catalog, loans, reviews and statistics over a single local SQLite file.
//! Logging goes through `tracing`; installing a subscriber is left to the
//! embedding application (see the `homelib-cli` binary).

pub mod config;
pub mod error;
pub mod session;
pub mod storage;

pub use config::Config;
pub use error::{LibraryError, Result};
pub use session::Session;
pub use storage::Database;
