//! Article content observers.
//!
//! A [`ContentSource`] is the rendered body of an article. Observers
//! subscribe to its mutation signal and keep a derived value (reading time,
//! table of contents) up to date.

pub mod observer;
pub mod reading_time;
pub mod source;
pub mod toc;

pub use observer::{observe, Observation};
pub use reading_time::{observe_reading_time, ReadingTime, DEFAULT_WORDS_PER_MINUTE};
pub use source::{ArticleContent, Block, ContentSource, Heading};
pub use toc::{assign_heading_ids, observe_toc, slugify, TableOfContents, TocEntry};
