//! Physique Scan - Pose-Based Physique Scoring and Progress Tracking
//!
//! A Rust library that turns 33-point pose landmark sets into physique
//! scores, tracks progress against a per-user baseline scan, and derives
//! simple diet and training plans.
//!
//! # Features
//!
//! - Male physique scoring across seven categories with strong/growth areas
//! - Fail-soft body feature extraction for all genders
//! - Baseline establishment and score deltas for later scans
//! - SQLite persistence with pooling and busy retries
//! - Progression export to CSV and JSON

/// Body composition estimates and plan generation
pub mod composition;
/// Configuration management
pub mod config;
/// Database operations and connection pooling
pub mod db;
/// Error types
pub mod error;
/// Progression export
pub mod export;
/// Body feature extraction
pub mod features;
/// Planar geometry helpers
pub mod geometry;
/// Pose landmark indexing
pub mod landmarks;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Baseline proportions and score deltas
pub mod progression;
/// Repository pattern for data access
pub mod repository;
/// Database schema definitions
pub mod schema;
/// Physique scoring engine
pub mod scoring;
/// Analysis workflow
pub mod service;
/// Numeric helpers
pub mod utils;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use db::Database;
pub use error::{PhysiqueError, Result};
pub use models::{Category, Gender, Landmark, PhysiqueAnalysis, Scan, ScoreSet, ScoringOutcome};
pub use repository::{MemoryScanRepository, ScanRepository};
pub use scoring::score_physique;
pub use service::{AnalysisReport, AnalyzeRequest, PhysiqueService};
