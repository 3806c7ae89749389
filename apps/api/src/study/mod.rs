//! Client-side study session: one pass through a shuffled deck of the user's
//! most recent flashcards, with self-assessed ratings that are not persisted.

pub mod http_source;
pub mod session;
