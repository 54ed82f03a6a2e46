//! The incremental, indentation-sensitive parser: the tokenizer state
//! machine, the scope stack, and the public drive API.

use crate::atom::Atom;
use crate::buffer::Buffer;
use crate::error::ParseError;
use crate::expr::{Expr, ExprKind};
use crate::intern::{StrongSet, WeakSet};
use crate::list::SiblingChain;
use crate::scope::{Namespace, Scope, ScopeKind};
use std::rc::Rc;

const END_SENTINEL: &[u8] = b"__END__";

/// The outcome of a [`Parser::step`] call, folding the C-style
/// `{ERROR, RESULT, MORE, DONE}` contract into idiomatic Rust (`ERROR`
/// becomes `Err`). `Ready` stands in for the original `RESULT` to avoid
/// colliding with [`std::result::Result`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// At least one top-level expression is ready; drain with
    /// [`Parser::next_result`] until it returns `None`.
    Ready,
    /// More input is needed; acquire a buffer, fill it, and commit again.
    More,
    /// End-of-input was reached. No further results will ever appear.
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenizerState {
    Root,
    Comment,
    Linebreak,
    Name,
    Qualname,
    Assignment,
}

fn is_indent_byte(b: u8) -> bool {
    b == b' ' || b == b'\t' || b == 0xA0
}

fn is_control_byte(b: u8) -> bool {
    (b < 0x20 && b != b'\t' && b != b'\n') || (b >= 0x7F && b <= 0xA0 && b != 0xA0)
}

fn is_name_byte(b: u8) -> bool {
    b > 0x20
        && b != b'\\'
        && !(0x7F..=0xA0).contains(&b)
        && !matches!(b, b'(' | b')' | b'{' | b'}' | b';')
}

/// The incremental parser. Owns the growable input buffer, the scope
/// stack, the tokenizer state machine, and the FIFO of completed
/// top-level expressions.
pub struct Parser {
    buffer: Buffer,
    state: TokenizerState,
    prev_indent_level: i32,
    curr_indent_level: i32,
    pending_indent: u32,
    indent_char: Option<u8>,
    scopes: Vec<Scope>,
    results: SiblingChain<Expr>,
    symbols: WeakSet,
    root_ns: Rc<Namespace>,
    sentinel_reached: bool,
    done: bool,
}

impl Parser {
    /// A new parser whose root scope is a BLOCK at level 0, under the
    /// given namespace.
    ///
    /// The namespace name is retained through a throwaway [`StrongSet`],
    /// not the parser's own symbol table: a namespace must stay alive for
    /// the parser's whole lifetime regardless of whether any parsed symbol
    /// happens to share its text, so it cannot ride on the weak, ad hoc
    /// retention the symbol table gives ordinary tokens.
    pub fn new(root_namespace_name: &str) -> Parser {
        let mut retained = StrongSet::new();
        let ns_name = retained.get(root_namespace_name.as_bytes());
        let root_ns = Namespace::new(ns_name);
        Parser {
            buffer: Buffer::new(),
            state: TokenizerState::Linebreak,
            prev_indent_level: -1,
            curr_indent_level: 0,
            pending_indent: 0,
            indent_char: None,
            scopes: vec![Scope::new(ScopeKind::Block, 0, root_ns.clone())],
            results: SiblingChain::new(),
            symbols: WeakSet::new(),
            root_ns,
            sentinel_reached: false,
            done: false,
        }
    }

    /// The writable region callers fill before calling [`Parser::commit`].
    /// Guarantees at least `min_headroom` bytes (never less than 512, per
    /// spec.md §8 invariant 6).
    pub fn acquire_buffer(&mut self, min_headroom: usize) -> Result<&mut [u8], ParseError> {
        self.buffer.acquire(min_headroom)
    }

    /// Declares `n` bytes written into the region returned by the most
    /// recent [`Parser::acquire_buffer`] call, and optionally marks
    /// end-of-input.
    pub fn commit(&mut self, n: usize, end_of_input: bool) {
        self.buffer.commit(n, end_of_input);
    }

    /// Drive the state machine as far as the currently buffered bytes
    /// permit.
    pub fn step(&mut self) -> Result<Status, ParseError> {
        if self.done {
            return Ok(self.status_when_done());
        }
        loop {
            if !self.results.is_empty() {
                return Ok(Status::Ready);
            }
            if self.sentinel_reached || self.buffer.input_exhausted() {
                return self.finalize();
            }
            if self.buffer.at_end_of_data() {
                return Ok(Status::More);
            }
            self.consume_one()?;
        }
    }

    /// Remove and return the next completed top-level expression, if any.
    pub fn next_result(&mut self) -> Option<Expr> {
        self.results.pop_front().map(|b| *b)
    }

    fn status_when_done(&self) -> Status {
        if self.results.is_empty() {
            Status::Done
        } else {
            Status::Ready
        }
    }

    fn finalize(&mut self) -> Result<Status, ParseError> {
        if self.scopes.len() > 1 {
            self.curr_indent_level = 0;
            if self.prev_indent_level != -1 {
                // Unwind every still-open BLOCK exactly as a dedent to
                // column 0 would, then close the trailing top-level LIST
                // that unwind leaves open. A GROUP/INLINE_BLOCK left
                // unclosed by a missing `)`/`}` makes `dedent_to` fail;
                // that failure is swallowed here and surfaces uniformly
                // below as "unexpected end of input" instead of an
                // indentation error, since indentation was never the
                // problem.
                let _ = self.dedent_to(0);
                let _ = self.close_scope_expect(ScopeKind::List);
            }
            if self.scopes.len() > 1 {
                return Err(self.err_parse("unexpected end of input"));
            }
        }
        self.done = true;
        Ok(self.status_when_done())
    }

    fn consume_one(&mut self) -> Result<(), ParseError> {
        let b = self.buffer.peek().expect("caller checked at_end_of_data");
        match self.state {
            TokenizerState::Root => self.step_root(b),
            TokenizerState::Comment => self.step_comment(b),
            TokenizerState::Linebreak => self.step_linebreak(b),
            TokenizerState::Name => self.step_name(b),
            TokenizerState::Qualname => self.step_qualname(b),
            TokenizerState::Assignment => self.step_assignment(b),
        }
    }

    fn step_root(&mut self, b: u8) -> Result<(), ParseError> {
        match b {
            b'\n' => {
                self.buffer.advance();
                self.enter_linebreak();
            }
            b'#' => {
                self.buffer.advance();
                self.buffer.start_token();
                self.state = TokenizerState::Comment;
            }
            b'(' => {
                self.buffer.advance();
                self.push_bracket_scope(ScopeKind::Group);
            }
            b')' => {
                self.buffer.advance();
                self.handle_close_paren()?;
            }
            b'{' => {
                self.buffer.advance();
                self.push_bracket_scope(ScopeKind::InlineBlock);
            }
            b'}' => {
                self.buffer.advance();
                self.close_scope_expect(ScopeKind::List)?;
                self.close_scope_expect(ScopeKind::InlineBlock)?;
            }
            b';' => {
                self.buffer.advance();
                self.close_scope_expect(ScopeKind::List)?;
                self.push_list_at_current_level();
            }
            _ if is_name_byte(b) => {
                self.buffer.start_token();
                self.buffer.advance();
                self.state = TokenizerState::Name;
            }
            _ if b < 0x21 || is_control_byte(b) => {
                self.buffer.advance();
            }
            _ => return Err(self.err_parse("unexpected byte")),
        }
        Ok(())
    }

    fn step_name(&mut self, b: u8) -> Result<(), ParseError> {
        if b == b':' {
            self.buffer.advance();
            self.state = TokenizerState::Assignment;
        } else if is_name_byte(b) {
            self.buffer.advance();
        } else {
            self.emit_sym_or_sentinel()?;
            self.state = TokenizerState::Root;
        }
        Ok(())
    }

    fn step_assignment(&mut self, b: u8) -> Result<(), ParseError> {
        if b == b':' {
            return Err(self.err_syntax("extra `:`"));
        }
        if is_name_byte(b) {
            self.buffer.advance();
            self.state = TokenizerState::Qualname;
        } else {
            self.emit_assignment();
            self.state = TokenizerState::Root;
        }
        Ok(())
    }

    fn step_qualname(&mut self, b: u8) -> Result<(), ParseError> {
        if b == b':' {
            self.buffer.advance();
            self.state = TokenizerState::Assignment;
        } else if is_name_byte(b) {
            self.buffer.advance();
        } else {
            self.emit_qualified_sym();
            self.state = TokenizerState::Root;
        }
        Ok(())
    }

    fn step_comment(&mut self, b: u8) -> Result<(), ParseError> {
        if b == b'\n' {
            self.emit_comment();
            self.buffer.advance();
            self.enter_linebreak();
        } else {
            self.buffer.advance();
        }
        Ok(())
    }

    fn step_linebreak(&mut self, b: u8) -> Result<(), ParseError> {
        match b {
            b'\n' => {
                self.buffer.advance();
                self.enter_linebreak();
            }
            _ if is_indent_byte(b) => {
                self.check_indent_char(b)?;
                self.buffer.advance();
                self.pending_indent += 1;
            }
            b')' => {
                self.buffer.advance();
                self.handle_close_paren()?;
                self.state = TokenizerState::Root;
            }
            _ if is_control_byte(b) => {
                self.buffer.advance();
            }
            _ => {
                self.run_indent_handler()?;
                self.state = TokenizerState::Root;
            }
        }
        Ok(())
    }

    fn enter_linebreak(&mut self) {
        self.buffer.bump_line();
        self.buffer.set_line_start(self.buffer.pos());
        self.pending_indent = 0;
        self.state = TokenizerState::Linebreak;
    }

    fn check_indent_char(&mut self, b: u8) -> Result<(), ParseError> {
        match self.indent_char {
            None => {
                self.indent_char = Some(b);
                Ok(())
            }
            Some(c) if c == b => Ok(()),
            Some(_) => Err(self.err_indentation("mixed line indentation")),
        }
    }

    fn run_indent_handler(&mut self) -> Result<(), ParseError> {
        let curr = self.pending_indent as i32;
        self.curr_indent_level = curr;
        let prev = self.prev_indent_level;

        if prev == -1 {
            if curr != 0 {
                return Err(self.err_indentation("leading indentation on first line"));
            }
            self.push_list_at_current_level();
        } else if curr > prev {
            self.push_block_scope(curr);
            self.push_list_at_current_level();
        } else if curr < prev {
            self.dedent_to(curr)?;
            self.close_scope_expect(ScopeKind::List)?;
            self.push_list_at_current_level();
        } else {
            self.close_scope_expect(ScopeKind::List)?;
            self.push_list_at_current_level();
        }
        self.prev_indent_level = curr;
        Ok(())
    }

    /// Pop (LIST, BLOCK) pairs until the remaining top-of-stack's level
    /// equals `curr`, leaving that frame's LIST open for the caller to
    /// close itself (the LIST/BLOCK pairing mirrors `run_indent_handler`'s
    /// indent branch, so unwinding and growing the stack are symmetric).
    fn dedent_to(&mut self, curr: i32) -> Result<(), ParseError> {
        loop {
            self.close_scope_expect(ScopeKind::List)?;
            if self.scopes.len() == 1 {
                // Unwound straight back to the permanent root frame, which
                // is level 0 by definition; nothing left to close.
                return Ok(());
            }
            if self.scopes.last().map(Scope::kind) != Some(ScopeKind::Block) {
                // A GROUP or INLINE_BLOCK boundary sits where a BLOCK was
                // expected: indentation alone cannot unwind past a
                // bracketed scope.
                return Err(self.err_indentation("dedent matches no enclosing level"));
            }
            self.close_scope_expect(ScopeKind::Block)?;
            let top = self.scopes.last().expect("root frame always remains");
            if top.indent_level() == curr {
                return Ok(());
            }
            if top.indent_level() < curr {
                return Err(self.err_indentation("dedent matches no enclosing level"));
            }
        }
    }

    /// `)` encountered while the top-of-stack's parent is a BLOCK (rather
    /// than a GROUP): close the inner BLOCK first, then the usual
    /// LIST+GROUP pair (spec.md §4.6 "Group close inside a block").
    fn handle_close_paren(&mut self) -> Result<(), ParseError> {
        let len = self.scopes.len();
        if len >= 2 && self.scopes[len - 2].kind() == ScopeKind::Block {
            if len < 3 {
                return Err(self.err_syntax("stray `)`"));
            }
            self.curr_indent_level = self.scopes[len - 3].indent_level();
            self.close_scope_expect(ScopeKind::List)?;
            self.close_scope_expect(ScopeKind::Block)?;
            self.prev_indent_level = self.curr_indent_level;
        }
        self.close_scope_expect(ScopeKind::List)?;
        self.close_scope_expect(ScopeKind::Group)?;
        Ok(())
    }

    fn push_scope_at(&mut self, kind: ScopeKind, level: i32) {
        let ns = self
            .scopes
            .last()
            .map(Scope::namespace)
            .unwrap_or_else(|| self.root_ns.clone());
        self.scopes.push(Scope::new(kind, level, ns));
    }

    fn push_list_at_current_level(&mut self) {
        self.push_scope_at(ScopeKind::List, self.curr_indent_level);
    }

    fn push_block_scope(&mut self, level: i32) {
        self.push_scope_at(ScopeKind::Block, level);
    }

    fn push_bracket_scope(&mut self, kind: ScopeKind) {
        let level = self.scopes.last().map_or(0, |s| s.indent_level());
        self.push_scope_at(kind, level);
        self.push_scope_at(ScopeKind::List, level);
    }

    fn close_scope_expect(&mut self, kind: ScopeKind) -> Result<(), ParseError> {
        if self.scopes.last().map(Scope::kind) != Some(kind) {
            return Err(self.err_syntax("unbalanced scope close"));
        }
        let scope = self.scopes.pop().expect("checked above");
        self.attach_popped(scope);
        Ok(())
    }

    fn attach_popped(&mut self, scope: Scope) {
        if scope.is_empty() {
            return;
        }
        let kind: ExprKind = scope.kind().into();
        let head = scope.into_list();
        let expr = Box::new(Expr::new_list(kind, head));
        if self.scopes.len() <= 1 {
            self.results.push_back(expr);
        } else {
            self.scopes.last_mut().expect("checked above").append(expr);
        }
    }

    fn emit_sym_or_sentinel(&mut self) -> Result<(), ParseError> {
        let text = self.buffer.token_text();
        if text == END_SENTINEL {
            self.sentinel_reached = true;
            return Ok(());
        }
        let atom = self.symbols.get(text);
        self.append_text_expr(ExprKind::Sym, atom);
        Ok(())
    }

    fn emit_qualified_sym(&mut self) {
        let text = self.buffer.token_text();
        let atom = self.symbols.get(text);
        self.append_text_expr(ExprKind::Sym, atom);
    }

    fn emit_assignment(&mut self) {
        let full = self.buffer.token_text();
        let name = &full[..full.len() - 1];
        let atom = self.symbols.get(name);
        self.append_text_expr(ExprKind::Assignment, atom);
    }

    fn emit_comment(&mut self) {
        let text = self.buffer.token_text();
        let atom = Atom::owned_uninterned(text);
        self.append_text_expr(ExprKind::Comment, atom);
    }

    fn append_text_expr(&mut self, kind: ExprKind, text: Atom) {
        let expr = Box::new(Expr::new_text(kind, text));
        self.scopes
            .last_mut()
            .expect("root frame always remains")
            .append(expr);
    }

    fn err_parse(&self, message: &'static str) -> ParseError {
        ParseError::parse(self.buffer.line(), self.buffer.column(), message)
    }

    fn err_syntax(&self, message: &'static str) -> ParseError {
        ParseError::syntax(self.buffer.line(), self.buffer.column(), message)
    }

    fn err_indentation(&self, message: &'static str) -> ParseError {
        ParseError::indentation(self.buffer.line(), self.buffer.column(), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(input: &[u8]) -> Result<Vec<Expr>, ParseError> {
        let mut parser = Parser::new("root");
        let mut offset = 0;
        let mut results = Vec::new();
        loop {
            let chunk_len = (input.len() - offset).min(4096);
            let buf = parser.acquire_buffer(chunk_len.max(1)).unwrap();
            let n = chunk_len.min(buf.len());
            buf[..n].copy_from_slice(&input[offset..offset + n]);
            offset += n;
            parser.commit(n, offset >= input.len());
            loop {
                match parser.step()? {
                    Status::Ready => {
                        while let Some(e) = parser.next_result() {
                            results.push(e);
                        }
                    }
                    Status::More => break,
                    Status::Done => return Ok(results),
                }
            }
        }
    }

    fn parse_ok(input: &str) -> Vec<Expr> {
        parse_all(input.as_bytes()).unwrap()
    }

    #[test]
    fn scenario_1_single_list_of_syms() {
        let results = parse_ok("a b c\n");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].to_string(), "a b c");
    }

    #[test]
    fn scenario_2_indented_block() {
        let results = parse_ok("a\n  b c\n  d e\n");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].to_string(), "a\n  b c\n  d e");
    }

    #[test]
    fn scenario_3_semicolon_splits_into_two_top_level_lists() {
        let results = parse_ok("a b; c d\n");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].to_string(), "a b");
        assert_eq!(results[1].to_string(), "c d");
    }

    #[test]
    fn scenario_4_assignment_with_block_body() {
        let results = parse_ok("foo:\n  1 2\n");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].to_string(), "foo:\n  1 2");
    }

    #[test]
    fn scenario_5_group_closes_inner_block_first() {
        let results = parse_ok("a (b\n    c) d\n");
        assert_eq!(results.len(), 1);
        // The `)` closes the inner BLOCK before the GROUP; see DESIGN.md's
        // resolution of this scenario's exact nesting.
        assert_eq!(results[0].to_string(), "a (b\n  c) d");
    }

    #[test]
    fn group_close_resyncs_indent_level_for_following_lines() {
        let results = parse_ok("a (b\n    c)\nd\n");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].to_string(), "a (b\n  c)");
        assert_eq!(results[1].to_string(), "d");
    }

    #[test]
    fn scenario_6_mixed_indent_is_an_error() {
        let err = parse_all(b"a\n  b\na\n\t b\n").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Indentation);
    }

    #[test]
    fn scenario_7_end_sentinel_stops_reading() {
        let results = parse_ok("__END__\nignored\n");
        assert!(results.is_empty());
    }

    #[test]
    fn boundary_empty_input_is_done_with_no_results() {
        let results = parse_ok("");
        assert!(results.is_empty());
    }

    #[test]
    fn boundary_comment_only_input_yields_comment_nodes() {
        let results = parse_ok("# hi\n# bye\n");
        assert_eq!(results.len(), 2);
        for r in &results {
            assert_eq!(r.head().unwrap().kind(), ExprKind::Comment);
        }
    }

    #[test]
    fn boundary_token_straddling_two_fill_calls() {
        let mut parser = Parser::new("root");
        let first = b"foo ba";
        let buf = parser.acquire_buffer(first.len()).unwrap();
        buf[..first.len()].copy_from_slice(first);
        parser.commit(first.len(), false);
        loop {
            match parser.step().unwrap() {
                Status::More => break,
                Status::Ready => {
                    while parser.next_result().is_some() {}
                }
                Status::Done => panic!("unexpected Done before second fill"),
            }
        }

        let second = b"r baz";
        let buf = parser.acquire_buffer(second.len()).unwrap();
        buf[..second.len()].copy_from_slice(second);
        parser.commit(second.len(), true);
        let mut results = Vec::new();
        loop {
            match parser.step().unwrap() {
                Status::Ready => {
                    while let Some(e) = parser.next_result() {
                        results.push(e);
                    }
                }
                Status::More => continue,
                Status::Done => break,
            }
        }
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].to_string(), "foo bar baz");
    }

    #[test]
    fn invariant_acquire_buffer_always_has_low_water_mark_headroom() {
        let mut parser = Parser::new("root");
        let buf = parser.acquire_buffer(1).unwrap();
        assert!(buf.len() >= 512);
    }

    #[test]
    fn weak_set_dedups_symbols_within_a_parse() {
        let results = parse_ok("a a\n");
        assert_eq!(results.len(), 1);
        let head = results[0].head().unwrap();
        let second = head.next().unwrap();
        assert_eq!(head.text(), second.text());
    }

    #[test]
    fn unclosed_block_at_eof_is_still_recovered_into_a_result() {
        let results = parse_ok("a\n  b c\n");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].to_string(), "a\n  b c");
    }

    #[test]
    fn stray_close_paren_is_a_syntax_error() {
        let err = parse_all(b"a)\n").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Syntax);
    }
}
