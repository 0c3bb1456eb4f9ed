//! Kavya - portfolio and content site for a performing poet
//!
//! This library provides poems, recorded performances, events and books,
//! a small admin API to manage them, and the server-rendered public pages.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod web;
