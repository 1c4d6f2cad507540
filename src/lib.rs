//! psylog — batch conversion of behavioral-experiment logs into CSV tables.
//!
//! The library walks an input tree for PsychoPy-style `.log` / `.log.gz` /
//! `.log.zst` files, parses each into an ordered sequence of timestamped
//! events, and writes one CSV per log under a mirrored output tree. Failure
//! is per file: one broken log never stops the batch, it just shows up as a
//! `failed` outcome in the returned summary.
//!
//! ```no_run
//! use psylog::{batch_parse, print_summary, BatchOptions};
//!
//! let options = BatchOptions::new("data/raw_beh", "data/parsed_beh");
//! let summary = batch_parse(&options)?;
//! print_summary(&summary);
//! # Ok::<(), psylog::ConvertError>(())
//! ```

pub mod batch;
pub mod convert;
pub mod decompression;
pub mod discovery;
pub mod error;
pub mod event;
pub mod parser;
pub mod report;

pub use batch::{batch_parse, BatchOptions, BatchSummary, ConversionOutcome, ConversionStatus};
pub use error::ConvertError;
pub use event::{Event, LineRecord, ParsedLog, SessionStamp};
pub use report::{print_summary, render_summary};
