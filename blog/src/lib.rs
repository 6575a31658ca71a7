//! # blog
//!
//! The blog back-office: categories, tags and posts managed through two
//! admin sites over one shared store.
//!
//! ## Modules
//!
//! - [`models`] - The Category, Tag and Post models
//! - [`admin`] - Admin registrations: the staff site and the "my page" site
//! - [`app`] - Application assembly, bootstrap and demo data
//! - [`config`] - Settings resolution for the binary
//! - [`command`] - Management command framework
//! - [`commands`] - The `serve`, `check` and `createuser` subcommands

pub mod admin;
pub mod app;
pub mod command;
pub mod commands;
pub mod config;
pub mod models;

pub use app::BlogApp;
