//! # till-db: Ledger Store
//!
//! SQLite persistence for cash sessions, cash movements, sales and the
//! company/operator records the cash desk reads.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Till Data Flow                                   │
//! │                                                                         │
//! │  CashDesk::close(identity, count, justification, credential)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     till-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  session.rs   │    │  (embedded)  │  │   │
//! │  │   │               │    │  movement.rs  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│  sale.rs      │    │ 001_initial_ │  │   │
//! │  │   │ begin() ──────┼──► │  company.rs   │    │   schema.sql │  │   │
//! │  │   │ LedgerTx      │    │               │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  │   <platform data dir>/till.db                                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`ledger`] - Multi-statement ledger transactions
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use till_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/till.db")).await?;
//!
//! let session = db.sessions().find_open_for_operator("op-1").await?;
//! let movements = db.movements().list_for_session(&session.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use ledger::LedgerTransaction;
pub use pool::{Database, DbConfig};

pub use repository::{
    CompanyRepository, MovementRepository, SaleRepository, SessionClosure, SessionRepository,
};
