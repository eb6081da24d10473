//! Messages stored by the ingestion pipeline.

mod model;
mod repository;

pub use model::Message;
pub use repository::MessageRepository;
