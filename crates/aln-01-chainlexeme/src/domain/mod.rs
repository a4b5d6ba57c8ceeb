//! Domain layer: document model, parser, validator, serializer and the
//! typed transaction.

pub mod builder;
pub mod chainlexeme;
pub mod document;
pub mod errors;
pub mod parser;
pub mod serializer;
pub mod validator;
pub mod value;
