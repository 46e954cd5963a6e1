//! # easypos-core: Pure Business Logic for EasyPOS
//!
//! The heart of EasyPOS: checkout math, report aggregation and the entity
//! types every storage backend shares. Zero I/O: everything here is a pure
//! function over values, which keeps it fully testable and backend-agnostic.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  UI shell (cart, checkout, stats screens)                       │
//! │       │                                                         │
//! │  ┌────▼────────────────────────────────────────────────────┐    │
//! │  │            ★ easypos-core (THIS CRATE) ★                │    │
//! │  │   types · checkout · report · error                     │    │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                     │    │
//! │  └────┬────────────────────────────────────────────────────┘    │
//! │       │                                                         │
//! │  ┌────▼────────────────────────────────────────────────────┐    │
//! │  │  easypos-store: Backend trait + sqlite/docstore/remote  │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Product, Transaction, Discount, ...)
//! - [`checkout`] - Cart math and sale assembly
//! - [`report`] - Revenue-by-day, top products, sales summary
//! - [`error`] - Domain error types

pub mod checkout;
pub mod error;
pub mod report;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use types::*;
