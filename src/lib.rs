//! Grammar-constrained program synthesis primitives.
//!
//! `sintetizar` linearizes domain ASTs into replayable action sequences,
//! encodes those sequences as the fixed-width integer tensors a neural
//! model consumes, and decodes model outputs back into executable
//! programs through grammar-aware search. Neural layers, datasets, and
//! concrete language frontends stay outside the crate, behind narrow
//! traits.
//!
//! # Architecture
//!
//! - [`asts`]: the grammar-typed AST value model.
//! - [`actions`]: rules, actions, and the mutable [`ActionSequence`]
//!   with its open-slot frontier.
//! - [`encoders`]: vocabulary tables and the tensor
//!   [`ActionSequenceEncoder`].
//! - [`languages`]: the parser/subtype boundary to concrete languages.
//! - [`samplers`]: grammar-constrained sampling and beam expansion with
//!   pluggable scoring.
//! - [`decoders`]: search drivers owning the termination loop.
//!
//! # Example
//!
//! Round-trip a program through the full pipeline: AST → action sequence
//! → tensors → decoded sequence → AST.
//!
//! ```
//! use ndarray::s;
//! use sintetizar::actions::ActionSequence;
//! use sintetizar::asts::{Ast, Field, FieldValue, Leaf, Node};
//! use sintetizar::encoders::{ActionSequenceEncoder, Samples};
//!
//! let ast = Ast::Node(Node::new(
//!     "Translation",
//!     vec![
//!         Field::new("x", "length", FieldValue::One(Ast::Leaf(Leaf::new("length", "2")))),
//!         Field::new(
//!             "child",
//!             "CSG",
//!             FieldValue::One(Ast::Node(Node::new(
//!                 "Circle",
//!                 vec![Field::new(
//!                     "r",
//!                     "size",
//!                     FieldValue::One(Ast::Leaf(Leaf::new("size", "1"))),
//!                 )],
//!             ))),
//!         ),
//!     ],
//! ));
//!
//! let samples = Samples::from_asts(std::slice::from_ref(&ast));
//! let encoder = ActionSequenceEncoder::from_samples(&samples, 0);
//!
//! let sequence = ActionSequence::create(&ast)?;
//! let query: Vec<String> = Vec::new();
//! let action = encoder.encode_action(&sequence, &query).expect("tokens are sampled");
//! let decoded = encoder.decode(action.slice(s![..-1, 1..]), &query).expect("valid rows");
//!
//! assert_eq!(decoded, sequence);
//! assert_eq!(decoded.generate()?, ast);
//! # Ok::<(), sintetizar::actions::InvalidActionError>(())
//! ```
//!
//! [`ActionSequence`]: actions::ActionSequence
//! [`ActionSequenceEncoder`]: encoders::ActionSequenceEncoder

pub mod actions;
pub mod asts;
pub mod decoders;
pub mod encoders;
pub mod languages;
pub mod samplers;

pub use actions::{
    Action, ActionSequence, ExpandTreeRule, InvalidActionError, NodeConstraint, NodeType, Rule,
    Token,
};
pub use asts::{Ast, Field, FieldValue, Leaf, Node};
pub use encoders::{ActionOptions, ActionSequenceEncoder, Samples};
pub use samplers::{
    ActionScorer, ActionSequenceSampler, DuplicatedSamplerState, Sampler, SamplerState,
    SamplerWithValueNetwork, SynthesisState, ValueNetwork,
};
