//! # Contract Review
//!
//! Clause analysis and compliance checking for contracts.
//!
//! A contract (PDF or plain text) is normalized, split into overlapping
//! chunks, embedded and stored as a per-document vector index. The index
//! then answers two questions: what do the clauses say (language-model
//! analysis of retrieved chunks), and which required clauses are missing
//! (similarity matching against a checklist).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────────────┐   ┌─────────────┐
//! │ extract  │──▶│ normalize ▶ chunk  │──▶│ VectorIndex │──▶ IndexStore
//! │ PDF/text │   │ ▶ embed            │   │ (generation)│    (SQLite)
//! └──────────┘   └────────────────────┘   └──────┬──────┘
//!                                                │
//!                              ┌─────────────────┤
//!                              ▼                 ▼
//!                        ┌──────────┐     ┌────────────┐
//!                        │ analyze  │     │ compliance │
//!                        │  (LLM)   │     │ (checklist)│
//!                        └──────────┘     └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! crev init
//! crev ingest contract.pdf
//! crev check my_checklist.json
//! crev serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration |
//! | [`error`] | Error taxonomy |
//! | [`models`] | Core data types |
//! | [`extract`] | PDF / text extraction |
//! | [`normalize`] | Text cleanup |
//! | [`chunk`] | Overlapping text splitter |
//! | [`embedding`] | Embedding providers |
//! | [`index`] | Per-document vector index |
//! | [`store`] | Atomic index storage |
//! | [`llm`] | Language-model adapters |
//! | [`analyze`] | Clause analyzer |
//! | [`compliance`] | Checklist matching |
//! | [`service`] | Ingest and check flows |
//! | [`server`] | HTTP server |

pub mod analyze;
pub mod chunk;
pub mod compliance;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod index;
pub mod llm;
pub mod migrate;
pub mod models;
pub mod normalize;
pub mod prompts;
pub mod server;
pub mod service;
pub mod store;
