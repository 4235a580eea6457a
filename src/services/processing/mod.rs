//! Flight log to template conversion pipeline
//!
//! Stages run strictly in order, each consuming the previous stage's output:
//! `loader` -> `normalize` -> `writer` -> `aggregate` -> `sanitize`.
//! The writer, aggregator and sanitizer all mutate the same [`grid::Grid`].

pub mod aggregate;
pub mod grid;
pub mod layout;
pub mod loader;
pub mod normalize;
pub mod sanitize;
pub mod value;
pub mod writer;
