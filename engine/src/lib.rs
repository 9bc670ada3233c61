// mcc — Merkle Combinator Compiler
//
// Library root. Decodes binary combinator programs, infers their types,
// commits to them with Merkle roots, and bounds their execution cost.

pub mod bits;
pub mod cost;
pub mod dag;
pub mod decode;
pub mod dot;
pub mod encode;
pub mod error;
pub mod infer;
pub mod merkle;
pub mod pipeline;
pub mod types;
pub mod witness;
