//! Flashcard CRUD: list with pagination/sort/filter, batch create, edit with
//! source promotion, delete. Every operation is scoped to the owning user.

pub mod handlers;
pub mod requests;
pub mod service;
