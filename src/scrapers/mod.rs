//! Network-facing readers for feeds and article pages.
//!
//! # Submodules
//!
//! | Module | Role |
//! |--------|------|
//! | [`http`] | [`Fetch`](http::Fetch) trait and the `reqwest` implementation |
//! | [`feed`] | RSS/Atom parsing into [`FeedEntry`](crate::models::FeedEntry) |
//! | [`article`] | Article page download and main-content extraction |
//!
//! Every function here reports failure through a typed error or an
//! explicit fallback value; none of them aborts the run.

pub mod article;
pub mod feed;
pub mod http;
