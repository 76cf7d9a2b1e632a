//! URL handling for robots policy resolution
//!
//! Validates crawl targets and derives the per-site robots.txt location and
//! cache key from them.

mod site;

pub use site::{parse_site_url, robots_url, site_key};
