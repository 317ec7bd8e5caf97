//! Expands per-topic OpenAlex work partitions into work -> related-work
//! relations enriched with each side's publication date and primary topic.

pub mod common;
pub mod expand;
pub mod inspect;
pub mod partition;
pub mod reader;
