//! Expression nodes and the tree-grammar printer.

use crate::atom::Atom;
use crate::list::Linked;
use std::fmt;

/// The tag set an [`Expr`] carries. `List`, `Block`, `InlineBlock`, and
/// `Group` are list-shaped (they own a sibling chain via [`Expr::head`]);
/// `Comment`, `Sym`, `Atom`, and `Assignment` are string-shaped (they own
/// one interned string via [`Expr::text`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprKind {
    List,
    Block,
    InlineBlock,
    Group,
    Comment,
    Sym,
    /// Reserved tag; no code path in this crate constructs it (see
    /// DESIGN.md's resolution of the corresponding open question).
    Atom,
    Assignment,
}

impl ExprKind {
    fn is_list_shaped(self) -> bool {
        matches!(
            self,
            ExprKind::List | ExprKind::Block | ExprKind::InlineBlock | ExprKind::Group
        )
    }
}

#[derive(Debug)]
enum Payload {
    Children(Option<Box<Expr>>),
    Text(Atom),
}

/// A node in a parsed expression tree.
///
/// A node is either list-shaped (it owns a `head` sibling chain) or
/// string-shaped (it owns one [`Atom`]) — never both, enforced here by
/// construction through [`Expr::new_list`] and [`Expr::new_text`] rather
/// than by a runtime check, since `Payload` makes the other state
/// unrepresentable.
#[derive(Debug)]
pub struct Expr {
    kind: ExprKind,
    payload: Payload,
    next: Option<Box<Expr>>,
}

impl Expr {
    pub(crate) fn new_list(kind: ExprKind, head: Option<Box<Expr>>) -> Expr {
        debug_assert!(kind.is_list_shaped());
        Expr {
            kind,
            payload: Payload::Children(head),
            next: None,
        }
    }

    pub(crate) fn new_text(kind: ExprKind, text: Atom) -> Expr {
        debug_assert!(!kind.is_list_shaped());
        Expr {
            kind,
            payload: Payload::Text(text),
            next: None,
        }
    }

    pub fn kind(&self) -> ExprKind {
        self.kind
    }

    /// The first child, for a list-shaped node. `None` for string-shaped
    /// nodes, or for an empty list-shaped node.
    pub fn head(&self) -> Option<&Expr> {
        match &self.payload {
            Payload::Children(h) => h.as_deref(),
            Payload::Text(_) => None,
        }
    }

    /// The interned text, for a string-shaped node.
    pub fn text(&self) -> Option<&Atom> {
        match &self.payload {
            Payload::Text(a) => Some(a),
            Payload::Children(_) => None,
        }
    }

    /// The next sibling in this node's enclosing list.
    pub fn next(&self) -> Option<&Expr> {
        self.next.as_deref()
    }

    pub(crate) fn set_next(&mut self, next: Option<Box<Expr>>) {
        self.next = next;
    }

    /// Iterate this node's children (empty iterator for string-shaped
    /// nodes or a childless list-shaped node).
    pub fn children(&self) -> crate::list::Iter<'_, Expr> {
        crate::list::Iter::new(self.head())
    }
}

impl Linked for Expr {
    fn next(&self) -> Option<&Expr> {
        self.next.as_deref()
    }
    fn next_mut(&mut self) -> &mut Option<Box<Expr>> {
        &mut self.next
    }
}

impl Drop for Expr {
    fn drop(&mut self) {
        // Both the sibling chain (`next`) and the child chain (`head`) are
        // themselves `next`-linked chains of `Expr`, so a naive derived
        // `Drop` recurses once per node along both axes. A long LIST or a
        // deeply nested BLOCK could overflow the stack; unlink everything
        // onto an explicit work stack instead so each node's destructor
        // runs with both fields already empty.
        let mut pending: Vec<Box<Expr>> = Vec::new();
        if let Some(next) = self.next.take() {
            pending.push(next);
        }
        if let Payload::Children(head) = &mut self.payload {
            if let Some(head) = head.take() {
                pending.push(head);
            }
        }
        while let Some(mut node) = pending.pop() {
            if let Some(next) = node.next.take() {
                pending.push(next);
            }
            if let Payload::Children(head) = &mut node.payload {
                if let Some(head) = head.take() {
                    pending.push(head);
                }
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        print_expr(self, f, 0, true, None)
    }
}

/// Prints `e` and, recursively, its full sibling chain (`e.next()` and
/// beyond), per the tree grammar in spec.md §6:
///
/// ```text
/// Expr        ::= List | InlineBlock | Group | Comment | Sym | Atom | Assign
/// List        ::= Expr (" " Expr)*
/// Block       ::= ( INDENT List )+
/// InlineBlock ::= "{ " List ("; " List)* " }"
/// Group       ::= "(" List+ ")"
/// Comment     ::= "#" bytes
/// Sym         ::= name
/// Assign      ::= name ":"
/// ```
fn print_expr(
    e: &Expr,
    f: &mut fmt::Formatter<'_>,
    indent: usize,
    is_first: bool,
    parent: Option<ExprKind>,
) -> fmt::Result {
    match e.kind {
        ExprKind::Block => {
            print_siblings(e.head(), f, indent + 1, Some(ExprKind::Block))?;
        }
        ExprKind::InlineBlock => {
            if !is_first {
                write!(f, " ")?;
            }
            write!(f, "{{ ")?;
            print_siblings(e.head(), f, indent, Some(ExprKind::InlineBlock))?;
            write!(f, " }}")?;
        }
        ExprKind::Group => {
            if !is_first {
                write!(f, " ")?;
            }
            write!(f, "(")?;
            print_siblings(e.head(), f, indent, Some(ExprKind::Group))?;
            write!(f, ")")?;
        }
        ExprKind::List => {
            match parent {
                Some(ExprKind::InlineBlock) => {
                    if !is_first {
                        write!(f, "; ")?;
                    }
                }
                Some(ExprKind::Group) => {}
                _ => {
                    if indent > 0 || !is_first {
                        write!(f, "\n{:width$}", "", width = indent * 2)?;
                    }
                }
            }
            print_siblings(e.head(), f, indent, parent)?;
        }
        ExprKind::Comment => {
            if !is_first {
                write!(f, " ")?;
            }
            write!(f, "#")?;
            if let Some(text) = e.text() {
                write!(f, "{}", text)?;
            }
        }
        ExprKind::Sym | ExprKind::Atom => {
            if !is_first {
                write!(f, " ")?;
            }
            if let Some(text) = e.text() {
                write!(f, "{}", text)?;
            }
        }
        ExprKind::Assignment => {
            if !is_first {
                write!(f, " ")?;
            }
            if let Some(text) = e.text() {
                write!(f, "{}:", text)?;
            }
        }
    }
    if let Some(next) = e.next() {
        print_expr(next, f, indent, false, parent)?;
    }
    Ok(())
}

fn print_siblings(
    head: Option<&Expr>,
    f: &mut fmt::Formatter<'_>,
    indent: usize,
    parent: Option<ExprKind>,
) -> fmt::Result {
    if let Some(first) = head {
        print_expr(first, f, indent, true, parent)?;
    }
    Ok(())
}
