//! Chinese dictionary lookup front-end with a per-user saved-word list.

pub mod actions;
pub mod config;
pub mod count;
pub mod error;
pub mod gateway;
pub mod lookup;
pub mod model;
pub mod rest;
pub mod search;
pub mod selection;
pub mod store;

#[cfg(feature = "web")]
pub mod web;

pub use error::{DictionaryError, DictionaryResult};
pub use gateway::VocabGateway;
pub use lookup::{LookupClient, LookupQuery, LookupSource};
pub use model::{EntryDraft, EntryId, LookupResponse, LookupResult, VocabEntry};
pub use store::{MemoryStore, Session, VocabStore};
