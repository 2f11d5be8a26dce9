//! The CV document model and everything that edits it.

pub mod defaults;
pub mod editor;
pub mod entries;
pub mod handlers;
pub mod models;
pub mod rich_text;
pub mod sections;
