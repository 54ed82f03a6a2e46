//! Scope frames and the namespace token forwarded through them.

use crate::atom::Atom;
use crate::expr::{Expr, ExprKind};
use crate::list::SiblingChain;
use std::rc::Rc;

/// The kind of a scope frame. Mirrors the list-shaped subset of
/// [`ExprKind`]: a frame's kind becomes the kind of the expression node it
/// produces when popped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScopeKind {
    List,
    Block,
    InlineBlock,
    Group,
}

impl From<ScopeKind> for ExprKind {
    fn from(kind: ScopeKind) -> ExprKind {
        match kind {
            ScopeKind::List => ExprKind::List,
            ScopeKind::Block => ExprKind::Block,
            ScopeKind::InlineBlock => ExprKind::InlineBlock,
            ScopeKind::Group => ExprKind::Group,
        }
    }
}

/// An opaque token forwarded down the scope stack. The parser's state
/// machine never inspects its contents; it exists so a future namespace
/// binder (out of scope for this crate) has something to attach meaning
/// to.
pub struct Namespace {
    name: Atom,
}

impl Namespace {
    pub(crate) fn new(name: Atom) -> Rc<Namespace> {
        Rc::new(Namespace { name })
    }

    pub fn name(&self) -> &Atom {
        &self.name
    }
}

/// A frame on the parser's scope stack: its kind, indentation level, the
/// namespace it was opened under, and the sibling chain being accumulated
/// for it.
pub(crate) struct Scope {
    kind: ScopeKind,
    indent_level: i32,
    ns: Rc<Namespace>,
    list: SiblingChain<Expr>,
}

impl Scope {
    pub(crate) fn new(kind: ScopeKind, indent_level: i32, ns: Rc<Namespace>) -> Scope {
        Scope {
            kind,
            indent_level,
            ns,
            list: SiblingChain::new(),
        }
    }

    pub(crate) fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub(crate) fn indent_level(&self) -> i32 {
        self.indent_level
    }

    pub(crate) fn namespace(&self) -> Rc<Namespace> {
        self.ns.clone()
    }

    pub(crate) fn append(&mut self, expr: Box<Expr>) {
        self.list.push_back(expr);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Consume the frame and hand back its accumulated sibling chain.
    pub(crate) fn into_list(self) -> Option<Box<Expr>> {
        self.list.into_head()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;

    fn root_ns() -> Rc<Namespace> {
        Namespace::new(Atom::from("root"))
    }

    #[test]
    fn new_scope_is_empty() {
        let scope = Scope::new(ScopeKind::List, 0, root_ns());
        assert!(scope.is_empty());
        assert!(scope.into_list().is_none());
    }

    #[test]
    fn append_accumulates_in_order() {
        let mut scope = Scope::new(ScopeKind::List, 0, root_ns());
        scope.append(Box::new(Expr::new_text(ExprKind::Sym, Atom::from("a"))));
        scope.append(Box::new(Expr::new_text(ExprKind::Sym, Atom::from("b"))));
        let head = scope.into_list().unwrap();
        assert_eq!(head.text().unwrap().as_str(), Some("a"));
        assert_eq!(head.next().unwrap().text().unwrap().as_str(), Some("b"));
    }

    #[test]
    fn namespace_is_forwarded_by_clone() {
        let ns = root_ns();
        let scope = Scope::new(ScopeKind::Block, 2, ns.clone());
        assert!(Rc::ptr_eq(&scope.namespace(), &ns));
    }

    #[test]
    fn scope_kind_maps_onto_matching_expr_kind() {
        assert_eq!(ExprKind::from(ScopeKind::Block), ExprKind::Block);
        assert_eq!(ExprKind::from(ScopeKind::InlineBlock), ExprKind::InlineBlock);
        assert_eq!(ExprKind::from(ScopeKind::Group), ExprKind::Group);
        assert_eq!(ExprKind::from(ScopeKind::List), ExprKind::List);
    }
}
