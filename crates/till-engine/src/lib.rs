//! # till-engine: Cash Desk Engine
//!
//! Opens and closes cash sessions, records manual movements and tender
//! exchanges, and gates a divergent close behind a justification and a
//! manager credential.
//!
//! ## Operation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cash Desk Lifecycle                              │
//! │                                                                         │
//! │   open(float) ──► OPEN ──┬── record_withdrawal / record_deposit         │
//! │                          ├── exchange_electronic_for_cash               │
//! │                          ├── get_status / preview_close (read-only)     │
//! │                          │                                              │
//! │                          └── close(count, justification?, credential?)  │
//! │                                   │                                     │
//! │                    recompute ─► divergence? ─► gate ─► CLOSED           │
//! │                                                                         │
//! │   Every balance is recomputed from the ledger. Nothing is cached.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`desk`] - `CashDesk`: open, status, preview, close
//! - [`movement`] - Manual withdrawals and deposits
//! - [`exchange`] - Electronic-for-cash tender exchange
//! - [`review`] - Company-wide overviews and secret administration
//! - [`gate`] - Manager credential resolution and verification
//! - [`identity`] - Caller identity
//! - [`config`] - `till.toml` + environment configuration
//! - [`error`] - Engine error taxonomy
//!
//! ## Usage
//!
//! ```rust,ignore
//! use till_engine::{CashDesk, CloseRequest, EngineConfig, Identity};
//!
//! let config = EngineConfig::load(None)?;
//! till_engine::init_tracing(&config.logging.filter);
//! let desk = CashDesk::from_config(&config).await?;
//!
//! let me = Identity::new("op-1", "company-1");
//! desk.open(&me, "100.00".parse()?).await?;
//! let preview = desk.preview_close(&me, count).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod desk;
pub mod error;
pub mod exchange;
pub mod gate;
pub mod identity;
pub mod movement;
pub mod review;

#[cfg(test)]
pub(crate) mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, EngineConfig};
pub use desk::{CashDesk, CloseRequest, ClosedSession, SessionStatusView};
pub use error::{EngineError, EngineResult, ErrorCode, ErrorPayload};
pub use exchange::ExchangeReceipt;
pub use gate::AuthorizationGate;
pub use identity::Identity;
pub use review::{ClosedSessionSummary, OpenSessionOverview};

use tracing_subscriber::EnvFilter;

/// Log filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "info,till=debug,sqlx=warn";

/// Initializes the tracing subscriber for structured logging.
///
/// `RUST_LOG` wins over `filter`. Safe to call more than once; later calls
/// are ignored.
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
