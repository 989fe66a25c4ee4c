//! Grammar for the DBC interchange format
//!
//! Split in two layers: a character-level scanner yielding primitive tokens,
//! and the statement parser that classifies top-level sections.

mod scanner;
mod statement;

pub use statement::{
    parse, AttributeDefinition, AttributeValueType, CommentStmt, MessageStmt, SignalStmt,
    Statement,
};
