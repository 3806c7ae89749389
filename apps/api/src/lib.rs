//! Flashcards API: AI-assisted flashcard generation, CRUD over persisted
//! cards, and the client-side study session state machine.

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod flashcards;
pub mod generation;
pub mod models;
pub mod openrouter;
pub mod routes;
pub mod state;
pub mod study;
