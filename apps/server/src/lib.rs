//! IFC LCA server library.
//!
//! Computes life-cycle indicators (GWP, UBP, PENRE) for building elements
//! extracted from IFC models. Materials are matched against the KBOB, EC3
//! and OpenEPD catalogs and project totals are kept current on every change.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
