#[cfg(test)]
extern crate quickcheck;

#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

mod ast;
mod codec;
mod error;
mod parser;
mod printer;
mod token;

pub use ast::{Binding, Clause, LiteralKind, Node, MAX_DEPTH};
pub use codec::{
    from_json, json_to_text, text_to_json, text_to_json_pretty, to_json, to_json_pretty,
};
pub use error::{Error, Result};
pub use parser::{parse, parse_document, parse_form, Parsed};
pub use printer::{render_document, to_lisp};
pub use token::{expand_function_quotes, expand_quoted_lists, has_open_string, tokenize, Token};
