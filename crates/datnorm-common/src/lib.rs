//! datnorm common library
//!
//! Shared plumbing for the datnorm workspace members:
//!
//! - **Error Handling**: the [`CommonError`] type and [`Result`] alias
//! - **Logging**: `tracing` subscriber setup that keeps stdout free for output
//! - **Streams**: opening inputs and outputs given as paths or `-`
//!
//! # Example
//!
//! ```no_run
//! use datnorm_common::stream::{InputSource, LineStream};
//!
//! fn count_lines() -> datnorm_common::Result<usize> {
//!     let inputs = vec![InputSource::parse("uniprot_sprot.dat.gz")];
//!     let mut total = 0;
//!     for line in LineStream::open(&inputs)? {
//!         line?;
//!         total += 1;
//!     }
//!     Ok(total)
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod logging;
pub mod stream;

pub use error::{CommonError, Result};
