//! Ingestion of inbound mail.
//!
//! A protocol listener builds an [`Envelope`] and hands it to the
//! [`IngestPipeline`], which answers with a [`Delivery`] or a typed error
//! the listener turns into accept or reject.

mod envelope;
mod pipeline;

pub use envelope::Envelope;
pub use pipeline::{Delivery, IngestPipeline, Route};
