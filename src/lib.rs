//! # hackathon-finder
//!
//! A small web application that asks a web-search enabled LLM for current
//! hackathons, normalizes the JSON it returns and keeps the results in a
//! SQLite database, browsable as HTML pages or through a JSON API.
//!
//! ## Pipeline
//!
//! ```text
//!   query ──▶ llm::extract ──▶ normalize ──▶ db (upsert by natural key) ──▶ api
//!            (provider call)   (drop invalid,
//!                               stamp, derive status)
//! ```
//!
//! Each search is a single request/response cycle. The provider is called
//! once per search with no retries; if it fails, nothing is written.
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration (bind address, database URL, LLM settings)
//! - [`models`] - The `Hackathon` record, its enums, natural key, and request/response types
//! - [`llm`] - Provider adapter for Gemini (Google Search grounding) and OpenAI-compatible APIs
//! - [`normalize`] - JSON extraction from provider text and record normalization
//! - [`db`] - SQLite collection with upsert-by-natural-key
//! - [`pipeline`] - One search end to end
//! - [`scheduler`] - Optional periodic refresh with the default query
//! - [`api`] - Axum routes for the HTML pages and JSON API
//! - [`views`] - HTML rendering
//! - [`state`] - Shared application state handed to handlers

pub mod api;
pub mod config;
pub mod db;
pub mod llm;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod scheduler;
pub mod state;
pub mod views;
