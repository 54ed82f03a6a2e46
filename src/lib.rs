//! Incremental, indentation-sensitive parser for the `sat` surface syntax.
//!
//! The parser never blocks on I/O: callers acquire a writable region of the
//! internal buffer, fill it from whatever source they like, commit the
//! filled length, and step the state machine until it asks for more input
//! or hands back a completed top-level expression.
//!
//! # Example
//!
//! ```rust
//! use sat_syntax::{Parser, Status};
//!
//! let mut parser = Parser::new("root");
//! let input = b"a\n  b c\n";
//! let buf = parser.acquire_buffer(input.len()).unwrap();
//! buf[..input.len()].copy_from_slice(input);
//! parser.commit(input.len(), true);
//!
//! let mut rendered = Vec::new();
//! loop {
//!     match parser.step().unwrap() {
//!         Status::Ready => {
//!             while let Some(expr) = parser.next_result() {
//!                 rendered.push(expr.to_string());
//!             }
//!         }
//!         Status::More => unreachable!("all input was committed up front"),
//!         Status::Done => break,
//!     }
//! }
//! assert_eq!(rendered, vec!["a\n  b c".to_string()]);
//! ```

mod atom;
mod buffer;
mod error;
mod expr;
mod hash;
mod intern;
mod list;
mod scope;
mod parser;

pub use error::{ErrorKind, ParseError};
pub use expr::{Expr, ExprKind};
pub use atom::Atom;
pub use list::Iter;
pub use parser::{Parser, Status};
pub use scope::Namespace;
