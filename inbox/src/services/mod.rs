//! Pure inbox logic (no I/O)
//!
//! - `filter`: view predicates over the working collection
//! - `pagination`: page cursor and page-number strip
//! - `selection`: global selection and page-level toggles
//! - `logger`: tracing setup

pub mod filter;
pub mod logger;
pub mod pagination;
pub mod selection;

pub use filter::{filter_view, unread_count};
pub use pagination::{page_links, total_pages, PageLink, Paginator};
pub use selection::{Selection, SelectionState};
