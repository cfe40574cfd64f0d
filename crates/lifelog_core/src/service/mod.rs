//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod journal_service;
pub mod mind_map_service;
pub mod mood_service;
pub mod note_service;
pub mod task_service;
