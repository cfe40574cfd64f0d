//! Editor text helpers.

pub mod list_continuation;

pub use list_continuation::{apply_enter, continue_list, EnterEdit, ListContinuation};
