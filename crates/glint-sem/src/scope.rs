//! The Symbol Table (component C2): a scoped, nested mapping from
//! identifiers to `Declaration`s, plus the lookup order of §4.2.

use crate::hir::{Declaration, LabelId};
use glint_util::{DefId, FxHashMap, Idx, IndexVec, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RibId(pub u32);

impl Idx for RibId {
    fn from_usize(idx: usize) -> Self {
        RibId(idx as u32)
    }
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub struct Rib {
    pub bindings: FxHashMap<Symbol, DefId>,
    pub parent: Option<RibId>,
    pub kind: RibKind,
    pub is_unsafe: bool,
}

#[derive(Debug, Clone, Copy)]
pub enum RibKind {
    Module,
    Function,
    Block,
    Loop(Option<LabelId>),
}

/// Why a `declare` call was rejected.
#[derive(Debug)]
pub enum DeclareError {
    /// A binding with this name already exists in the same scope.
    DuplicateIdent(DefId),
    /// A non-variable declaration would shadow a binding visible from an
    /// enclosing scope; only variables may shadow.
    ShadowNotAllowed(DefId),
}

/// Scoped nested mapping from identifier to `Declaration` (component C2).
pub struct SymbolTable {
    pub ribs: IndexVec<RibId, Rib>,
    pub current: RibId,
    pub declarations: FxHashMap<DefId, Declaration>,
    /// Package-level imported-symbol map, consulted on a root-scope miss
    /// (§4.2 step 2).
    pub imported: FxHashMap<Symbol, DefId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut ribs = IndexVec::new();
        let root = ribs.push(Rib {
            bindings: FxHashMap::default(),
            parent: None,
            kind: RibKind::Module,
            is_unsafe: false,
        });
        Self {
            ribs,
            current: root,
            declarations: FxHashMap::default(),
            imported: FxHashMap::default(),
        }
    }

    pub fn enter_scope(&mut self, kind: RibKind) -> RibId {
        let is_unsafe = self.ribs[self.current].is_unsafe;
        let new_rib = self.ribs.push(Rib {
            bindings: FxHashMap::default(),
            parent: Some(self.current),
            kind,
            is_unsafe,
        });
        self.current = new_rib;
        new_rib
    }

    pub fn enter_unsafe_scope(&mut self, kind: RibKind) -> RibId {
        let rib = self.enter_scope(kind);
        self.ribs[rib].is_unsafe = true;
        rib
    }

    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.ribs[self.current].parent {
            self.current = parent;
        }
    }

    pub fn in_unsafe_scope(&self) -> bool {
        self.ribs[self.current].is_unsafe
    }

    /// Find the enclosing loop (innermost, or matching `label`), used to
    /// validate `break`/`continue` targets.
    pub fn enclosing_loop(&self, label: Option<LabelId>) -> Option<RibId> {
        let mut rib_id = self.current;
        loop {
            if let RibKind::Loop(rib_label) = self.ribs[rib_id].kind {
                match label {
                    None => return Some(rib_id),
                    Some(want) if Some(want) == rib_label => return Some(rib_id),
                    _ => {},
                }
            }
            rib_id = self.ribs[rib_id].parent?;
        }
    }

    /// Registers `decl` under `name` in the current scope, enforcing
    /// duplicate-ident and shadow-fail rules (§4.2).
    pub fn declare(&mut self, name: Symbol, decl: Declaration) -> Result<DefId, DeclareError> {
        if let Some(&existing) = self.ribs[self.current].bindings.get(&name) {
            return Err(DeclareError::DuplicateIdent(existing));
        }
        let is_variable = matches!(decl, Declaration::Variable(_));
        if !is_variable {
            if let Some(parent) = self.ribs[self.current].parent {
                if let Some(shadowed) = self.lookup_from(parent, name) {
                    return Err(DeclareError::ShadowNotAllowed(shadowed));
                }
            }
        }
        let def_id = decl.def_id();
        self.ribs[self.current].bindings.insert(name, def_id);
        self.declarations.insert(def_id, decl);
        Ok(def_id)
    }

    fn lookup_from(&self, start: RibId, name: Symbol) -> Option<DefId> {
        let mut rib_id = start;
        loop {
            if let Some(&def_id) = self.ribs[rib_id].bindings.get(&name) {
                return Some(def_id);
            }
            rib_id = self.ribs[rib_id].parent?;
        }
    }

    /// Resolve `name` to its `Declaration`, walking scopes innermost to
    /// root, then the imported-symbol map (built-ins are consulted
    /// separately by the caller per §4.2 step 3). Marks the declaration
    /// used (§2b).
    pub fn resolve(&self, name: Symbol) -> Option<&Declaration> {
        if let Some(def_id) = self.lookup_from(self.current, name) {
            let decl = &self.declarations[&def_id];
            decl.mark_used();
            return Some(decl);
        }
        if let Some(&def_id) = self.imported.get(&name) {
            let decl = &self.declarations[&def_id];
            decl.mark_used();
            return Some(decl);
        }
        None
    }

    pub fn declaration(&self, def_id: DefId) -> Option<&Declaration> {
        self.declarations.get(&def_id)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::VariableDecl;
    use glint_util::Span;
    use std::cell::Cell;

    fn var(def_id: DefId, name: Symbol) -> Declaration {
        Declaration::Variable(VariableDecl {
            def_id,
            name,
            span: Span::DUMMY,
            declared_ty: None,
            is_const: false,
            is_mutable: false,
            public: false,
            used: Cell::new(false),
        })
    }

    #[test]
    fn declare_and_resolve_same_scope() {
        let mut table = SymbolTable::new();
        let x = Symbol::intern("x");
        table.declare(x, var(DefId(1), x)).unwrap();
        assert!(table.resolve(x).is_some());
    }

    #[test]
    fn duplicate_in_same_scope_errors() {
        let mut table = SymbolTable::new();
        let x = Symbol::intern("x");
        table.declare(x, var(DefId(1), x)).unwrap();
        let err = table.declare(x, var(DefId(2), x)).unwrap_err();
        assert!(matches!(err, DeclareError::DuplicateIdent(_)));
    }

    #[test]
    fn variable_may_shadow_across_scopes() {
        let mut table = SymbolTable::new();
        let x = Symbol::intern("x");
        table.declare(x, var(DefId(1), x)).unwrap();
        table.enter_scope(RibKind::Block);
        assert!(table.declare(x, var(DefId(2), x)).is_ok());
    }

    #[test]
    fn resolve_walks_to_parent_after_exit() {
        let mut table = SymbolTable::new();
        let x = Symbol::intern("x");
        table.declare(x, var(DefId(1), x)).unwrap();
        table.enter_scope(RibKind::Block);
        table.exit_scope();
        assert!(table.resolve(x).is_some());
    }

    #[test]
    fn resolve_marks_used() {
        let mut table = SymbolTable::new();
        let x = Symbol::intern("x");
        table.declare(x, var(DefId(1), x)).unwrap();
        let decl = table.resolve(x).unwrap();
        assert!(decl.is_used());
    }

    #[test]
    fn unsafe_scope_inherits_into_nested_block() {
        let mut table = SymbolTable::new();
        table.enter_unsafe_scope(RibKind::Block);
        assert!(table.in_unsafe_scope());
        table.enter_scope(RibKind::Block);
        assert!(table.in_unsafe_scope());
    }
}
