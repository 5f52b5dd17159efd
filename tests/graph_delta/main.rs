//! Integration tests for graph delta construction and application.

mod construct;
mod models;
