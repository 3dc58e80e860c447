//! # Klare Core Architecture
//!
//! Klare is the **UI-agnostic offline-first core** of a personal
//! development app: local persistence, per-domain state containers, and
//! reconciliation against a remote row store. There is no UI code here;
//! any client (mobile shell, web shell, test harness) drives the same
//! API.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  App Facade (app.rs)                                        │
//! │  - Assembles containers over one storage root               │
//! │  - Startup health check, reset, load_all/save_all           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  State Containers (state/*.rs)                              │
//! │  - One container per domain slice                           │
//! │  - Rehydrate from storage, reconcile with the remote store  │
//! │  - Write-through persistence on every mutation              │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                       │
//!                    ▼                       ▼
//! ┌───────────────────────────┐ ┌───────────────────────────────┐
//! │  Storage Layer (storage/) │ │  Remote Boundary (remote/)    │
//! │  - Dual-engine facade     │ │  - Row-oriented query trait   │
//! │  - Fast redb engine,      │ │  - REST and in-memory         │
//! │    file fallback engine   │ │    implementations            │
//! │  - Diagnostics & repair   │ │                               │
//! └───────────────────────────┘ └───────────────────────────────┘
//! ```
//!
//! ## Key Principles
//!
//! - **Local persistence is best-effort.** The storage facade swallows
//!   engine errors; losing persistence never takes the app down, it
//!   just degrades to in-memory state.
//! - **The server is authoritative.** Rehydrated local state is a
//!   cache; once remote rows arrive they overwrite it.
//! - **No hidden coupling.** Containers know their own storage key and
//!   nothing about each other; local and remote writes are independent
//!   and never transactional.
//!
//! ## Module Overview
//!
//! - [`app`]: the assembled core, the entry point for clients
//! - [`state`]: container machinery and the per-domain containers
//! - [`storage`]: dual-engine key-value facade, diagnostics, repair
//! - [`remote`]: remote row store trait, REST and in-memory clients
//! - [`reflection`]: append-only coaching reflection history
//! - [`model`]: domain types shared across layers
//! - [`config`]: app configuration file
//! - [`error`]: error types

pub mod app;
pub mod config;
pub mod error;
pub mod model;
pub mod reflection;
pub mod remote;
pub mod state;
pub mod storage;
