//! Remediation handler for App Engine applications running without
//! Identity-Aware Proxy: forces internal-only ingress on the app's services
//! and keeps the matching Security Command Center finding in step.

pub mod appengine;
pub mod auth;
pub mod classify;
pub mod config;
pub mod error;
pub mod event;
pub mod findings;
pub mod handler;
pub mod http;
pub mod types;
