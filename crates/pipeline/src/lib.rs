//! Clients for the hosted generative-model pipelines.
//!
//! Two flows are exposed, both single request/response calls with no
//! retry, streaming, or partial results:
//!
//! - [`ocr::extract_text`] -- base64 image (plus optional free-text
//!   instruction) in, extracted text and a confidence estimate out.
//! - [`enrich::enrich_note`] -- note content in, suggested title, tags,
//!   categories, summary, and confidence out.
//!
//! Both ride on [`client::GenerativeClient`], a thin [`reqwest`] wrapper
//! around the model's `generateContent` REST endpoint.

pub mod client;
pub mod enrich;
pub mod ocr;

pub use client::{GenerativeClient, Part, PipelineConfig, PipelineError};
pub use enrich::{enrich_note, EnrichRequest, NoteEnrichment};
pub use ocr::{extract_text, OcrRequest, OcrResult};
