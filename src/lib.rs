//! Blogicum - A small blogging platform
//!
//! Users write posts filed under categories and locations, publish them
//! immediately or on a schedule, and comment on each other's posts.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
