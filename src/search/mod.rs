//! Batch donor search.
//!
//! - [`request`]: caller-facing search requests and their validation
//! - [`source`]: where donors come from
//! - [`runner`]: concurrent evaluation of a donor pool against one patient

pub mod request;
pub mod runner;
pub mod source;

pub use request::{RequestError, SearchRequest, ValidatedSearch};
pub use runner::{CancellationFlag, SearchConfig, SearchError, SearchOutcome, SearchRunner};
pub use source::{DonorPool, DonorSource, DonorSourceError};
