//! # HTTP Routes
//!
//! ```text
//! /clients                    POST, GET                 CLIENT permissions
//! /clients/{document}         GET, PUT, PATCH, DELETE
//! /products                   POST, GET                 PRODUCT permissions
//! /products/{id}              GET, PUT, PATCH, DELETE
//! /products/healthcheck       GET                       open
//! /transactions               POST, GET                 TRANSACTION permissions
//! /transactions/{id}          GET, PUT, PATCH, DELETE
//! /transactions/{id}/report   GET (id = json | pdf)     VIEW_TRANSACTION
//! ```
//!
//! Each module returns a router whose routes sit behind
//! [`require_permission`](crate::auth::require_permission) for its resource.

pub mod clients;
pub mod products;
pub mod transactions;
