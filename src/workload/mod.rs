//! The word count application run by the services.
//!
//! Mappers call [`wc::map`] on the text of one chunk, reducers and the master
//! fold partial results together with [`wc::reduce`].

pub mod wc;
