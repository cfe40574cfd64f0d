//! Flutter bridge for the lifelog core.

pub mod api;
