//! The library code for the `filmfeed` static site generator. A run can be
//! broken down into two distinct steps:
//!
//! 1. Ingesting feeds into article pages ([`crate::ingest`])
//! 2. Regenerating the listings from the article pages on disk
//!    ([`crate::index`] and [`crate::homepage`])
//!
//! The first step fetches every configured feed, normalizes the newest few
//! entries of each into [`entry::FeedEntry`] records, and renders every entry
//! that doesn't have a page yet ([`crate::article`]). Pages are keyed by a
//! slug derived from the entry's title and link ([`crate::slug`]), which is
//! what makes re-running over the same feeds a no-op.
//!
//! The second step doesn't care where the article pages came from: it lists
//! everything in the articles directory ([`crate::listing`]), writes an index
//! page with a card for each, and splices cards for the most recent few into
//! the homepage template.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod article;
pub mod build;
pub mod config;
pub mod entry;
pub mod homepage;
pub mod html;
pub mod index;
pub mod ingest;
pub mod listing;
pub mod slug;
pub mod template;
mod util;
