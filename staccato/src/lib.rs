//! # Staccato
//!
//! Staccato is a streaming batch-construction pipeline for span-based
//! question answering. It reads three line-aligned streams of
//! pre-tokenized text (context, question, answer span), derives
//! per-token features (character ids, exact-match flags, normalized
//! term frequencies, shared-vocabulary indices), buckets examples by
//! question length, and yields padded, consistently shaped training
//! batches.
//!
//! ## Examples
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use staccato::{BatchGenerator, BatcherConfig, CharTable, SharedIndex, Vocabulary};
//!
//! let vocab = Vocabulary::new(["the", "cat", "sat", "on", "mat", "where", "did", "sit"]);
//! let chars = CharTable::default();
//! let shared = SharedIndex::new([(vocab.word_id("cat"), 0), (vocab.word_id("mat"), 1)]);
//!
//! let contexts = "the cat sat on the mat\n";
//! let questions = "where did the cat sit ?\n";
//! let answers = "3 5\n";
//!
//! let config = BatcherConfig {
//!     batch_size: 4,
//!     context_len: 10,
//!     question_len: 8,
//!     word_len: 6,
//!     ..Default::default()
//! };
//! let generator = BatchGenerator::from_readers(
//!     vocab,
//!     chars,
//!     shared,
//!     config,
//!     contexts.as_bytes(),
//!     questions.as_bytes(),
//!     answers.as_bytes(),
//! )?;
//!
//! for batch in generator {
//!     let batch = batch?;
//!     assert_eq!(batch.batch_size(), 1);
//!     assert_eq!(batch.context_ids()[0].len(), 10);
//!     assert_eq!(batch.context_mask()[0].iter().sum::<u32>(), 6);
//!     assert_eq!(batch.answer_tokens()[0], ["on", "the", "mat"]);
//! }
//! # Ok(())
//! # }
//! ```
#![deny(missing_docs)]

pub mod batch;
pub mod common;
pub mod config;
pub mod errors;
pub mod example;
pub mod features;
pub mod generator;
pub mod vocab;

pub use batch::Batch;
pub use config::BatcherConfig;
pub use example::Example;
pub use generator::BatchGenerator;
pub use vocab::{CharTable, SharedIndex, Vocabulary};

/// Version number of this library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
