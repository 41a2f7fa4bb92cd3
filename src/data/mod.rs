//! Data access layer — one module per source.
//!
//! - **sheets** — Google Sheets values API client and the `Table` snapshot.
//! - **staff** — staff tracker CSV.
//! - **cameras** — per-site camera worksheets.
//! - **doors** — door worksheets (per-site tabs, normalized headers).

pub mod cameras;
pub mod doors;
pub mod sheets;
pub mod staff;
