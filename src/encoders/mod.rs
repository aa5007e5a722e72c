//! Tensor encodings of action sequences.
//!
//! The [`ActionSequenceEncoder`] owns frozen vocabulary tables for rules,
//! node types, and tokens, and maps an [`ActionSequence`] to the
//! fixed-width integer tensors a sequence/tree model consumes: per-step
//! action ids, parent pointers, depth, and ancestor adjacency. The mapping
//! is reversible: [`ActionSequenceEncoder::decode`] replays tensor rows
//! back into a grammar-checked sequence.
//!
//! Encoders serialize with serde so a training run can persist its
//! vocabulary snapshot alongside model checkpoints.
//!
//! # Example
//!
//! ```
//! use ndarray::s;
//! use sintetizar::actions::ActionSequence;
//! use sintetizar::asts::{Ast, Field, FieldValue, Leaf, Node};
//! use sintetizar::encoders::{ActionSequenceEncoder, Samples};
//!
//! let ast = Ast::Node(Node::new(
//!     "Circle",
//!     vec![Field::new(
//!         "r",
//!         "size",
//!         FieldValue::One(Ast::Leaf(Leaf::new("size", "1"))),
//!     )],
//! ));
//! let samples = Samples::from_asts(std::slice::from_ref(&ast));
//! let encoder = ActionSequenceEncoder::from_samples(&samples, 0);
//!
//! let sequence = ActionSequence::create(&ast)?;
//! let query: Vec<String> = Vec::new();
//! let action = encoder.encode_action(&sequence, &query).expect("all tokens sampled");
//! let decoded = encoder.decode(action.slice(s![..-1, 1..]), &query).expect("well-formed");
//! assert_eq!(decoded, sequence);
//! # Ok::<(), sintetizar::actions::InvalidActionError>(())
//! ```
//!
//! [`ActionSequence`]: crate::actions::ActionSequence

mod action_sequence_encoder;
mod samples;
mod vocabulary;

pub use action_sequence_encoder::{
    ActionOptions, ActionSequenceEncoder, CLOSE_ID, PADDING, UNKNOWN_ID,
};
pub use samples::Samples;
pub use vocabulary::Vocabulary;
