//! # till-core: Pure Cash-Desk Logic
//!
//! This crate holds the financial rules of the cash desk as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Till Architecture                                │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 till-engine (CashDesk)                          │   │
//! │  │    open, record_movement, exchange, preview_close, close        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ till-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │  balance  │  │  closing  │  │authorizat.│  │   │
//! │  │   │   Money   │  │ Balances  │  │ Breakdown │  │ Credential│  │   │
//! │  │   │           │  │           │  │ Divergence│  │  Source   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    till-db (Ledger Store)                       │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Ledger records (CashSession, CashMovement, Sale, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`balance`] - Theoretical balances from the raw ledger
//! - [`closing`] - Declared vs expected breakdown and close requirements
//! - [`authorization`] - Manager credential resolution and Argon2 verification
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use till_core::money::Money;
//! use till_core::closing::has_divergence;
//!
//! let expected: Money = "150.00".parse().unwrap();
//! let declared: Money = "150,00".parse().unwrap();
//!
//! assert!(!has_divergence(declared - expected));
//! assert!(has_divergence(Money::from_cents(-1)));
//!
//! // A drawer holds no fraction of a cent
//! assert!("149.991".parse::<Money>().is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod authorization;
pub mod balance;
pub mod closing;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use authorization::{Argon2Settings, CredentialSource, CredentialVerifier, SecretHasher};
pub use balance::{compute_expected_balances, Balances, MovementTotals, SaleTotals};
pub use closing::{ClosingBreakdown, DeclaredCount};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum characters in a movement description.
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// Maximum characters in a closing justification.
pub const MAX_JUSTIFICATION_LEN: usize = 500;

/// Shortest accepted manager authorization secret.
pub const MIN_AUTHORIZATION_SECRET_LEN: usize = 4;
