//! Restaurant order service.
//!
//! Orders and their line items are created atomically, read back as a
//! unit, and move through a small status lifecycle. Changes are reported
//! best-effort to a logging collaborator.
//!
//! Layers, bottom up:
//! - [`storage`]: the `orders`/`order_items` tables behind [`storage::OrderStore`]
//! - [`repository`]: validation, totals and notifications
//! - [`handlers`]: the axum HTTP/JSON API

pub mod config;
pub mod handlers;
pub mod model;
pub mod notify;
pub mod repository;
pub mod storage;
pub mod utils;
