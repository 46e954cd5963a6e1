//! # EasyPOS Store
//!
//! Persistence layer for the EasyPOS point-of-sale system: three
//! interchangeable storage engines behind one [`Backend`] trait, a
//! configuration-driven [`Store`] dispatcher, and a shared error taxonomy.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         EASYPOS STORE                           │
//! │                                                                 │
//! │   config ──► dispatcher (Store) ──► Backend (trait)             │
//! │                                        │                        │
//! │                    ┌───────────────────┼──────────────────┐     │
//! │                    ▼                   ▼                  ▼     │
//! │                 sqlite             docstore            remote   │
//! │              (embedded,         (atomic batched     (sequential │
//! │               native tx)          commit)            REST)     │
//! │                                                                 │
//! │   error ── one StoreError taxonomy across all of the above      │
//! │   http  ── shared status-code mapping for the remote engines    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entity types and the pure checkout/reporting logic live in
//! [`easypos_core`]; this crate only moves them in and out of storage.

pub mod backend;
pub mod config;
pub mod dispatcher;
pub mod docstore;
pub mod error;
mod http;
pub mod remote;
pub mod sqlite;

pub use backend::Backend;
pub use config::{AppConfig, BackendKind, DocStoreConfig, RemoteDbConfig, SqliteConfig};
pub use dispatcher::Store;
pub use docstore::DocStoreBackend;
pub use error::{StoreError, StoreResult};
pub use remote::RemoteDbBackend;
pub use sqlite::{DbConfig, SqliteBackend};
