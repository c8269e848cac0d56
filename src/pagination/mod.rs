//! Pagination module
//!
//! Follows link-based pagination: every page points at the next one through
//! a `Link: <uri>; rel="next"` header.
//!
//! # Overview
//!
//! A [`Paginator`] names a collection (transport + first URI). Each call to
//! [`Paginator::pages`] opens an independent, forward-only [`Pages`] session
//! that fetches one page at a time, always bypassing the conditional cache.
//! The sequence ends exactly when a page carries no `next` link; a
//! non-success status fails it.

mod link;
mod pages;

pub use link::{next_link, parse_link_header, parse_links, Link};
pub use pages::{Pages, Paginator};
