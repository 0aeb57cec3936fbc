//! Name analysis - binds identifiers to declarations
//!
//! Analysis algorithm:
//! 1. Create one root scope for the program
//! 2. Walk declarations in order, declaring each name in the current scope
//! 3. Push a scope for every function body and `if`/`while` branch
//! 4. Resolve every identifier innermost-scope-first and record the symbol
//!    on the tree
//! 5. Resolve colon-access chains through struct field tables
//!
//! Errors go to the diagnostic sink as they are found; the traversal always
//! runs to completion.

use super::table::{DeclScope, FieldTable, SymbolTable, TableError};
use crate::ast::{Block, CallExpr, Decl, Expr, FnDecl, Ident, Position, Program, StructAccess, StructDecl, Stmt, TypeNode, VarDecl};
use crate::diagnostics::{DiagnosticKind, DiagnosticSink, Diagnostics};
use crate::symbol::Symbol;
use std::rc::Rc;

/// The pair of tables a declaration is analyzed against.
///
/// `current` receives the declaration and answers the duplicate check;
/// `outer` resolves the struct type a declaration names. Both are the same
/// table for top-level and block declarations. They differ only for the
/// fields of a struct, which are declared into the struct's own field table
/// while their types are resolved in the scope enclosing the struct.
pub enum DeclScopes<'a> {
    Same(&'a mut SymbolTable),
    Split {
        current: &'a mut FieldTable,
        outer: &'a SymbolTable,
    },
}

impl<'a> DeclScopes<'a> {
    pub fn outer(&self) -> &SymbolTable {
        match self {
            DeclScopes::Same(table) => &**table,
            DeclScopes::Split { outer, .. } => *outer,
        }
    }

    pub fn current(&mut self) -> &mut dyn DeclScope {
        match self {
            DeclScopes::Same(table) => &mut **table,
            DeclScopes::Split { current, .. } => &mut **current,
        }
    }

    /// The scoped table, when declarations go into it. Functions and
    /// structs can only be declared there.
    pub fn table(&mut self) -> Option<&mut SymbolTable> {
        match self {
            DeclScopes::Same(table) => Some(&mut **table),
            DeclScopes::Split { .. } => None,
        }
    }
}

/// Run name analysis over a program, collecting diagnostics.
pub fn analyze(program: &mut Program) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    NameAnalyzer::new(&mut diagnostics).analyze(program);
    diagnostics
}

/// Name analysis pass over one program.
pub struct NameAnalyzer<'a> {
    sink: &'a mut dyn DiagnosticSink,
    /// Pops that found no scope to remove
    underflows: usize,
}

impl<'a> NameAnalyzer<'a> {
    pub fn new(sink: &'a mut dyn DiagnosticSink) -> Self {
        Self { sink, underflows: 0 }
    }

    /// Number of scope pops that were ignored because no scope was active.
    pub fn underflows(&self) -> usize {
        self.underflows
    }

    /// Analyze a whole program against a fresh table.
    ///
    /// The table is dropped afterwards; only the symbols recorded on the
    /// tree remain.
    pub fn analyze(&mut self, program: &mut Program) {
        let mut table = SymbolTable::new();
        tracing::debug!("name analysis: {} top-level declarations", program.decls.len());
        self.analyze_decls(&mut program.decls, &mut DeclScopes::Same(&mut table));
    }

    fn report(&mut self, kind: DiagnosticKind, pos: Position) {
        self.sink.report(kind, pos);
    }

    pub fn enter_scope(&mut self, table: &mut SymbolTable) {
        table.push_scope();
        tracing::debug!("push scope (depth {})", table.depth());
    }

    /// Pop the innermost scope. Underflow is counted and logged, never
    /// reported as a diagnostic.
    pub fn leave_scope(&mut self, table: &mut SymbolTable) {
        match table.pop_scope() {
            Ok(()) => tracing::debug!("pop scope (depth {})", table.depth()),
            Err(err) => {
                self.underflows += 1;
                tracing::warn!("ignoring scope pop: {}", err);
            }
        }
    }

    /// Analyze a declaration list in order against `scopes`.
    ///
    /// Variables go into `scopes.current()`. Functions and structs need the
    /// scoped table; inside a struct body they are skipped.
    pub fn analyze_decls(&mut self, decls: &mut [Decl], scopes: &mut DeclScopes<'_>) {
        for decl in decls {
            match decl {
                Decl::Var(var) => {
                    self.analyze_var_decl(var, scopes);
                }
                Decl::Func(func) => match scopes.table() {
                    Some(table) => self.analyze_fn_decl(func, table),
                    None => tracing::warn!("skipping function '{}' inside a struct body", func.name.name),
                },
                Decl::Struct(def) => match scopes.table() {
                    Some(table) => self.analyze_struct_decl(def, table),
                    None => tracing::warn!("skipping struct '{}' inside a struct body", def.name.name),
                },
            }
        }
    }

    /// Analyze struct field declarations in order against `scopes`.
    pub fn analyze_fields(&mut self, fields: &[VarDecl], scopes: &mut DeclScopes<'_>) {
        for field in fields {
            self.analyze_var_decl(field, scopes);
        }
    }

    /// Declare a variable or struct field. Returns the new symbol, or `None`
    /// when nothing was declared.
    pub fn analyze_var_decl(&mut self, decl: &VarDecl, scopes: &mut DeclScopes<'_>) -> Option<Rc<Symbol>> {
        self.declare_typed(&decl.ty, &decl.name, scopes)
    }

    fn declare_typed(&mut self, ty: &TypeNode, name: &Ident, scopes: &mut DeclScopes<'_>) -> Option<Rc<Symbol>> {
        if ty.is_void() {
            self.report(DiagnosticKind::NonFunctionVoid, name.pos);
            return None;
        }

        let symbol = match ty {
            TypeNode::Struct(struct_name) => {
                let is_definition = scopes
                    .outer()
                    .lookup_global(&struct_name.name)
                    .ok()
                    .flatten()
                    .is_some_and(|sym| sym.as_struct_definition().is_some());
                if !is_definition {
                    self.report(DiagnosticKind::InvalidStructType, struct_name.pos);
                }
                Symbol::struct_instance(&struct_name.name)
            }
            _ => Symbol::plain(ty.descriptor()),
        };

        let current = scopes.current();
        if let Ok(Some(_)) = current.lookup_local(&name.name) {
            self.report(DiagnosticKind::MultiplyDeclared, name.pos);
            return None;
        }

        let symbol = Rc::new(symbol);
        match current.declare(&name.name, Rc::clone(&symbol)) {
            Ok(()) => {
                tracing::trace!("declared {} : {}", name.name, symbol);
                Some(symbol)
            }
            Err(TableError::DuplicateName(_)) => {
                self.report(DiagnosticKind::MultiplyDeclared, name.pos);
                None
            }
            Err(err) => {
                tracing::warn!("could not declare '{}': {}", name.name, err);
                None
            }
        }
    }

    /// Declare a function, then analyze its formals and body in a new scope.
    pub fn analyze_fn_decl(&mut self, decl: &mut FnDecl, table: &mut SymbolTable) {
        // Declared before the formals so the body can call it.
        let symbol = Rc::new(Symbol::function(decl.ret.descriptor()));
        match table.declare(&decl.name.name, Rc::clone(&symbol)) {
            Ok(()) => tracing::trace!("declared function {}", decl.name.name),
            Err(TableError::DuplicateName(_)) => self.report(DiagnosticKind::MultiplyDeclared, decl.name.pos),
            Err(err) => tracing::warn!("could not declare '{}': {}", decl.name.name, err),
        }

        self.enter_scope(table);

        let mut param_types = Vec::with_capacity(decl.formals.len());
        for formal in &decl.formals {
            self.declare_typed(&formal.ty, &formal.name, &mut DeclScopes::Same(&mut *table));
            param_types.push(formal.ty.descriptor().to_string());
        }
        if let Some(sig) = symbol.as_function() {
            sig.attach_params(param_types);
        }

        self.analyze_block(&mut decl.body, table);
        self.leave_scope(table);
    }

    /// Build the struct's field table and declare its definition in the
    /// enclosing scope.
    pub fn analyze_struct_decl(&mut self, decl: &StructDecl, table: &mut SymbolTable) {
        let duplicate = matches!(table.lookup_local(&decl.name.name), Ok(Some(_)));
        if duplicate {
            self.report(DiagnosticKind::MultiplyDeclared, decl.name.pos);
        }

        let mut fields = FieldTable::new();
        {
            let mut scopes = DeclScopes::Split {
                current: &mut fields,
                outer: &*table,
            };
            self.analyze_fields(&decl.fields, &mut scopes);
        }
        tracing::debug!("struct {} with {} fields", decl.name.name, fields.len());

        if duplicate {
            return;
        }
        match table.declare(&decl.name.name, Rc::new(Symbol::struct_definition(fields))) {
            Ok(()) => {}
            Err(TableError::DuplicateName(_)) => self.report(DiagnosticKind::MultiplyDeclared, decl.name.pos),
            Err(err) => tracing::warn!("could not declare '{}': {}", decl.name.name, err),
        }
    }

    /// Local declarations, then statements, in the innermost scope.
    fn analyze_block(&mut self, block: &mut Block, table: &mut SymbolTable) {
        self.analyze_decls(&mut block.decls, &mut DeclScopes::Same(&mut *table));
        for stmt in &mut block.stmts {
            self.analyze_stmt(stmt, table);
        }
    }

    fn analyze_scoped_block(&mut self, block: &mut Block, table: &mut SymbolTable) {
        self.enter_scope(table);
        self.analyze_block(block, table);
        self.leave_scope(table);
    }

    /// Analyze one statement. The scope depth of `table` is the same
    /// before and after.
    pub fn analyze_stmt(&mut self, stmt: &mut Stmt, table: &mut SymbolTable) {
        match stmt {
            Stmt::Assign(assign) => {
                self.analyze_expr(&mut assign.lhs, table);
                self.analyze_expr(&mut assign.rhs, table);
            }
            Stmt::PostInc(e) | Stmt::PostDec(e) | Stmt::Read(e) | Stmt::Write(e) => {
                self.analyze_expr(e, table);
            }
            Stmt::If { cond, body } | Stmt::While { cond, body } => {
                self.analyze_expr(cond, table);
                self.analyze_scoped_block(body, table);
            }
            Stmt::IfElse {
                cond,
                then_branch,
                else_branch,
            } => {
                self.analyze_expr(cond, table);
                self.analyze_scoped_block(then_branch, table);
                self.analyze_scoped_block(else_branch, table);
            }
            Stmt::Call(call) => self.analyze_call(call, table),
            Stmt::Return(e) => {
                if let Some(e) = e {
                    self.analyze_expr(e, table);
                }
            }
        }
    }

    pub fn analyze_expr(&mut self, expr: &mut Expr, table: &SymbolTable) {
        match expr {
            Expr::True(_) | Expr::False(_) | Expr::IntLit { .. } | Expr::StrLit { .. } => {}
            Expr::Id(ident) => self.resolve_ident(ident, table),
            Expr::Access(access) => self.analyze_access(access, table),
            Expr::Assign(assign) => {
                self.analyze_expr(&mut assign.lhs, table);
                self.analyze_expr(&mut assign.rhs, table);
            }
            Expr::Call(call) => self.analyze_call(call, table),
            Expr::Unary { operand, .. } => self.analyze_expr(operand, table),
            Expr::Binary { lhs, rhs, .. } => {
                self.analyze_expr(lhs, table);
                self.analyze_expr(rhs, table);
            }
        }
    }

    fn analyze_call(&mut self, call: &mut CallExpr, table: &SymbolTable) {
        self.resolve_ident(&mut call.callee, table);
        for arg in &mut call.args {
            self.analyze_expr(arg, table);
        }
    }

    fn resolve_ident(&mut self, ident: &mut Ident, table: &SymbolTable) {
        match table.lookup_global(&ident.name) {
            Ok(Some(symbol)) => {
                tracing::trace!("bound {} at {} to {}", ident.name, ident.pos, symbol);
                ident.symbol = Some(symbol);
            }
            Ok(None) => self.report(DiagnosticKind::Undeclared, ident.pos),
            Err(err) => tracing::warn!("cannot resolve '{}': {}", ident.name, err),
        }
    }

    /// Resolve `base:field`.
    fn analyze_access(&mut self, access: &mut StructAccess, table: &SymbolTable) {
        self.analyze_expr(&mut access.base, table);

        let Some(definition) = self.field_namespace(&access.base, access.field.pos, table) else {
            return;
        };
        let Some(def) = definition.as_struct_definition() else {
            return;
        };

        match def.fields().lookup_global(&access.field.name) {
            Some(field_symbol) => {
                if let Some(struct_name) = field_symbol.struct_name() {
                    access.symbol = table.lookup_global(struct_name).ok().flatten();
                }
                tracing::trace!("bound field {} at {} to {}", access.field.name, access.field.pos, field_symbol);
                access.field.symbol = Some(field_symbol);
            }
            None => self.report(DiagnosticKind::Undeclared, access.field.pos),
        }
    }

    /// Find the struct definition whose fields the base of an access
    /// selects from. Reports at most one diagnostic, and none when the base
    /// itself already failed to resolve.
    fn field_namespace(&mut self, base: &Expr, field_pos: Position, table: &SymbolTable) -> Option<Rc<Symbol>> {
        match base {
            Expr::Id(ident) => {
                // An unresolved base was already reported as undeclared.
                let symbol = ident.symbol()?;
                let definition = symbol
                    .struct_name()
                    .and_then(|name| table.lookup_global(name).ok().flatten())
                    .filter(|sym| sym.as_struct_definition().is_some());
                if definition.is_none() {
                    self.report(DiagnosticKind::ColonAccessOfNonStruct, ident.pos);
                }
                definition
            }
            Expr::Access(inner) => match &inner.symbol {
                Some(symbol) if symbol.as_struct_definition().is_some() => Some(Rc::clone(symbol)),
                Some(_) => {
                    self.report(DiagnosticKind::ColonAccessOfNonStruct, field_pos);
                    None
                }
                None => {
                    // An unbound inner field has been reported already.
                    if inner.field.is_bound() {
                        self.report(DiagnosticKind::InvalidStructFieldName, inner.pos());
                    }
                    None
                }
            },
            _ => {
                self.report(DiagnosticKind::ColonAccessOfNonStruct, field_pos);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AssignExpr, BinaryOp, FormalDecl, unbound_references, unparse};
    use crate::symbol::SymbolKind;

    fn ident(name: &str, line: u32, column: u32) -> Ident {
        Ident::new(name, line, column)
    }

    fn int_var(name: &str, line: u32) -> Decl {
        Decl::var(TypeNode::Integer, ident(name, line, 9))
    }

    fn struct_var(ty: &str, name: &str, line: u32) -> Decl {
        Decl::var(TypeNode::named(ident(ty, line, 8)), ident(name, line, 20))
    }

    fn struct_def(name: &str, line: u32, fields: Vec<VarDecl>) -> Decl {
        Decl::Struct(StructDecl::new(ident(name, line, 8), fields))
    }

    fn int_field(name: &str, line: u32) -> VarDecl {
        VarDecl::new(TypeNode::Integer, ident(name, line, 13))
    }

    fn struct_field(ty: &str, name: &str, line: u32) -> VarDecl {
        VarDecl::new(TypeNode::named(ident(ty, line, 12)), ident(name, line, 24))
    }

    fn func(ret: TypeNode, name: &str, line: u32, formals: Vec<FormalDecl>, decls: Vec<Decl>, stmts: Vec<Stmt>) -> Decl {
        Decl::Func(FnDecl::new(ret, ident(name, line, 6), formals, Block::new(decls, stmts)))
    }

    fn main_fn(line: u32, decls: Vec<Decl>, stmts: Vec<Stmt>) -> Decl {
        func(TypeNode::Void, "main", line, vec![], decls, stmts)
    }

    fn write(expr: Expr) -> Stmt {
        Stmt::Write(expr)
    }

    fn access(base: Expr, field: &str, line: u32, column: u32) -> Expr {
        Expr::access(base, ident(field, line, column))
    }

    /// `struct Point [ integer x. integer y. ]`
    fn point() -> Decl {
        struct_def("Point", 1, vec![int_field("x", 2), int_field("y", 3)])
    }

    /// The statements of the last function in the program.
    fn last_fn_stmts(program: &Program) -> &[Stmt] {
        match program.decls.last() {
            Some(Decl::Func(func)) => &func.body.stmts,
            other => panic!("expected a function, got {:?}", other),
        }
    }

    fn written(stmt: &Stmt) -> &Expr {
        match stmt {
            Stmt::Write(e) => e,
            other => panic!("expected a write statement, got {:?}", other),
        }
    }

    fn access_node(expr: &Expr) -> &StructAccess {
        match expr {
            Expr::Access(access) => access,
            other => panic!("expected a colon-access, got {:?}", other),
        }
    }

    fn fn_symbol(program: &Program, name: &str) -> Rc<Symbol> {
        // Resolve through a call site in the last function.
        for stmt in last_fn_stmts(program) {
            if let Stmt::Call(call) = stmt {
                if call.callee.name == name {
                    return call.callee.symbol().cloned().expect("callee bound");
                }
            }
        }
        panic!("no call to {}", name)
    }

    #[test]
    fn test_point_field_access() {
        let mut program = Program::new(vec![
            point(),
            struct_var("Point", "p", 5),
            main_fn(
                6,
                vec![],
                vec![
                    write(access(Expr::id("p", 7, 14), "x", 7, 16)),
                    write(access(Expr::id("p", 8, 14), "z", 8, 16)),
                ],
            ),
        ]);

        let diags = analyze(&mut program);

        assert_eq!(diags.kinds(), vec![DiagnosticKind::Undeclared]);
        assert_eq!(diags.entries()[0].pos, Position::new(8, 16));

        let stmts = last_fn_stmts(&program);
        let good = access_node(written(&stmts[0]));
        let base = good.base.symbol().expect("p bound");
        assert_eq!(base.kind(), SymbolKind::StructInstance);
        assert_eq!(base.struct_name(), Some("Point"));
        let field = good.field.symbol().expect("x bound");
        assert_eq!(field.kind(), SymbolKind::Plain);
        assert_eq!(field.descriptor(), "integer");
        assert!(good.symbol.is_none());

        let bad = access_node(written(&stmts[1]));
        assert!(bad.base.symbol().is_some());
        assert!(!bad.field.is_bound());
    }

    #[test]
    fn test_duplicate_keeps_first() {
        let mut program = Program::new(vec![
            int_var("x", 1),
            Decl::var(TypeNode::Boolean, ident("x", 2, 9)),
            main_fn(3, vec![], vec![write(Expr::id("x", 4, 14))]),
        ]);

        let diags = analyze(&mut program);

        assert_eq!(diags.kinds(), vec![DiagnosticKind::MultiplyDeclared]);
        assert_eq!(diags.entries()[0].pos, Position::new(2, 9));
        let x = written(&last_fn_stmts(&program)[0]).symbol().unwrap();
        assert_eq!(x.descriptor(), "integer");
    }

    #[test]
    fn test_void_variable_not_declared() {
        let mut program = Program::new(vec![
            Decl::var(TypeNode::Void, ident("v", 1, 6)),
            main_fn(2, vec![], vec![write(Expr::id("v", 3, 14))]),
        ]);

        let diags = analyze(&mut program);

        assert_eq!(
            diags.kinds(),
            vec![DiagnosticKind::NonFunctionVoid, DiagnosticKind::Undeclared]
        );
        assert_eq!(diags.entries()[0].pos, Position::new(1, 6));
    }

    #[test]
    fn test_function_signature_and_call() {
        let mut program = Program::new(vec![
            point(),
            struct_var("Point", "p", 5),
            func(
                TypeNode::Integer,
                "f",
                6,
                vec![FormalDecl::new(TypeNode::Integer, ident("a", 6, 19))],
                vec![],
                vec![Stmt::Return(Some(Expr::id("a", 7, 12)))],
            ),
            main_fn(
                9,
                vec![],
                vec![Stmt::Call(CallExpr::new(
                    ident("f", 10, 5),
                    vec![access(Expr::id("p", 10, 7), "x", 10, 9)],
                ))],
            ),
        ]);

        let diags = analyze(&mut program);
        assert!(diags.is_empty(), "{:?}", diags.entries());

        let f = fn_symbol(&program, "f");
        let sig = f.as_function().unwrap();
        assert_eq!(sig.return_type(), "integer");
        assert_eq!(sig.param_types(), ["integer"]);
        assert_eq!(f.descriptor(), "integer->integer");

        match &last_fn_stmts(&program)[0] {
            Stmt::Call(call) => {
                let arg = access_node(&call.args[0]);
                assert_eq!(arg.field.symbol().unwrap().descriptor(), "integer");
            }
            other => panic!("expected call, got {:?}", other),
        }
        assert!(unbound_references(&program).is_empty());
    }

    #[test]
    fn test_formals_rules() {
        let mut program = Program::new(vec![
            point(),
            func(
                TypeNode::Void,
                "g",
                5,
                vec![
                    FormalDecl::new(TypeNode::Integer, ident("a", 5, 15)),
                    FormalDecl::new(TypeNode::Boolean, ident("a", 5, 26)),
                    FormalDecl::new(TypeNode::Void, ident("b", 5, 34)),
                    FormalDecl::new(TypeNode::named(ident("Point", 5, 44)), ident("q", 5, 50)),
                ],
                vec![],
                vec![write(access(Expr::id("q", 6, 14), "y", 6, 16))],
            ),
            main_fn(8, vec![], vec![Stmt::Call(CallExpr::new(ident("g", 9, 5), vec![]))]),
        ]);

        let diags = analyze(&mut program);

        assert_eq!(
            diags.kinds(),
            vec![DiagnosticKind::MultiplyDeclared, DiagnosticKind::NonFunctionVoid]
        );
        let g = fn_symbol(&program, "g");
        assert_eq!(g.as_function().unwrap().param_types(), ["integer", "boolean", "void", "Point"]);
        assert!(unbound_references(&program).is_empty());
    }

    #[test]
    fn test_recursive_function_sees_itself() {
        let mut program = Program::new(vec![func(
            TypeNode::Integer,
            "fact",
            1,
            vec![FormalDecl::new(TypeNode::Integer, ident("n", 1, 22))],
            vec![],
            vec![Stmt::Return(Some(Expr::binary(
                BinaryOp::Mul,
                Expr::id("n", 2, 13),
                Expr::call(
                    ident("fact", 2, 17),
                    vec![Expr::binary(BinaryOp::Sub, Expr::id("n", 2, 22), Expr::int(1, 2, 26))],
                ),
            )))],
        )]);

        let diags = analyze(&mut program);
        assert!(diags.is_empty());
        assert!(unbound_references(&program).is_empty());
    }

    #[test]
    fn test_duplicate_function_and_struct() {
        let mut program = Program::new(vec![
            main_fn(1, vec![], vec![]),
            main_fn(2, vec![], vec![]),
            point(),
            struct_def("Point", 5, vec![int_field("z", 6)]),
            struct_def("Pair", 7, vec![int_field("a", 8), int_field("a", 9)]),
        ]);

        let diags = analyze(&mut program);

        assert_eq!(diags.count(DiagnosticKind::MultiplyDeclared), 3);
        let positions: Vec<Position> = diags.entries().iter().map(|d| d.pos).collect();
        assert_eq!(
            positions,
            vec![Position::new(2, 6), Position::new(5, 8), Position::new(9, 13)]
        );
    }

    #[test]
    fn test_shadowing_and_scope_exit() {
        // integer x.
        // void main[] [ boolean x. disp <- (x). if (TRUE) { integer y. disp <- (y). } disp <- (y). ]
        // void other[] [ disp <- (x). ]
        let mut program = Program::new(vec![
            int_var("x", 1),
            main_fn(
                2,
                vec![Decl::var(TypeNode::Boolean, ident("x", 3, 13))],
                vec![
                    write(Expr::id("x", 4, 14)),
                    Stmt::If {
                        cond: Expr::True(Position::new(5, 9)),
                        body: Block::new(vec![int_var("y", 6)], vec![write(Expr::id("y", 7, 18))]),
                    },
                    write(Expr::id("y", 9, 14)),
                ],
            ),
            func(TypeNode::Void, "other", 11, vec![], vec![], vec![write(Expr::id("x", 12, 14))]),
        ]);

        let diags = analyze(&mut program);

        assert_eq!(diags.kinds(), vec![DiagnosticKind::Undeclared]);
        assert_eq!(diags.entries()[0].pos, Position::new(9, 14));

        let main_stmts = match &program.decls[1] {
            Decl::Func(func) => &func.body.stmts,
            _ => unreachable!(),
        };
        assert_eq!(written(&main_stmts[0]).symbol().unwrap().descriptor(), "boolean");
        let other_x = written(&last_fn_stmts(&program)[0]).symbol().unwrap();
        assert_eq!(other_x.descriptor(), "integer");
    }

    #[test]
    fn test_fields_invisible_to_plain_lookup() {
        let mut program = Program::new(vec![
            point(),
            struct_var("Point", "p", 5),
            main_fn(6, vec![], vec![write(Expr::id("x", 7, 14))]),
        ]);

        let diags = analyze(&mut program);
        assert_eq!(diags.kinds(), vec![DiagnosticKind::Undeclared]);
    }

    /// `struct Inner [ integer c. ]  struct Outer [ struct Inner b. integer n. ]  struct Outer a.`
    fn nested_structs() -> Vec<Decl> {
        vec![
            struct_def("Inner", 1, vec![int_field("c", 2)]),
            struct_def("Outer", 4, vec![struct_field("Inner", "b", 5), int_field("n", 6)]),
            struct_var("Outer", "a", 8),
        ]
    }

    fn with_main(mut decls: Vec<Decl>, stmts: Vec<Stmt>) -> Program {
        decls.push(main_fn(10, vec![], stmts));
        Program::new(decls)
    }

    #[test]
    fn test_chained_access_resolves() {
        let chain = access(access(Expr::id("a", 11, 14), "b", 11, 16), "c", 11, 18);
        let mut program = with_main(nested_structs(), vec![write(chain)]);

        let diags = analyze(&mut program);
        assert!(diags.is_empty(), "{:?}", diags.entries());

        let outer = access_node(written(&last_fn_stmts(&program)[0]));
        let inner = access_node(&outer.base);
        assert_eq!(inner.field.symbol().unwrap().struct_name(), Some("Inner"));
        assert_eq!(inner.symbol.as_ref().unwrap().kind(), SymbolKind::StructDefinition);
        assert_eq!(outer.field.symbol().unwrap().descriptor(), "integer");
        assert!(unbound_references(&program).is_empty());
    }

    #[test]
    fn test_chain_stops_at_undeclared_segment() {
        let chain = access(access(Expr::id("a", 11, 14), "zz", 11, 16), "c", 11, 19);
        let mut program = with_main(nested_structs(), vec![write(chain)]);

        let diags = analyze(&mut program);

        assert_eq!(diags.kinds(), vec![DiagnosticKind::Undeclared]);
        assert_eq!(diags.entries()[0].pos, Position::new(11, 16));
        let outer = access_node(written(&last_fn_stmts(&program)[0]));
        assert!(!outer.field.is_bound());
    }

    #[test]
    fn test_chain_through_scalar_field() {
        let chain = access(access(Expr::id("a", 11, 14), "n", 11, 16), "c", 11, 18);
        let mut program = with_main(nested_structs(), vec![write(chain)]);

        let diags = analyze(&mut program);

        assert_eq!(diags.kinds(), vec![DiagnosticKind::InvalidStructFieldName]);
        assert_eq!(diags.entries()[0].pos, Position::new(11, 16));
    }

    #[test]
    fn test_undeclared_base_reports_once() {
        let chain = access(access(Expr::id("q", 11, 14), "b", 11, 16), "c", 11, 18);
        let mut program = with_main(nested_structs(), vec![write(chain)]);

        let diags = analyze(&mut program);

        assert_eq!(diags.kinds(), vec![DiagnosticKind::Undeclared]);
        assert_eq!(diags.entries()[0].pos, Position::new(11, 14));
    }

    #[test]
    fn test_colon_access_of_non_struct() {
        let mut program = with_main(
            vec![int_var("i", 1), main_fn(2, vec![], vec![])],
            vec![
                write(access(Expr::id("i", 11, 14), "x", 11, 16)),
                write(access(Expr::id("main", 12, 14), "x", 12, 19)),
            ],
        );

        let diags = analyze(&mut program);

        // `main` is declared twice here, so the second main is a duplicate.
        assert_eq!(diags.count(DiagnosticKind::ColonAccessOfNonStruct), 2);
        let colon: Vec<Position> = diags
            .entries()
            .iter()
            .filter(|d| d.kind == DiagnosticKind::ColonAccessOfNonStruct)
            .map(|d| d.pos)
            .collect();
        assert_eq!(colon, vec![Position::new(11, 14), Position::new(12, 14)]);
    }

    #[test]
    fn test_colon_access_on_call_result() {
        let base = Expr::call(ident("f", 11, 14), vec![]);
        let mut program = with_main(
            vec![func(TypeNode::Integer, "f", 1, vec![], vec![], vec![])],
            vec![write(access(base, "x", 11, 18))],
        );

        let diags = analyze(&mut program);
        assert_eq!(diags.kinds(), vec![DiagnosticKind::ColonAccessOfNonStruct]);
        assert_eq!(diags.entries()[0].pos, Position::new(11, 18));
    }

    #[test]
    fn test_invalid_struct_types() {
        let mut program = Program::new(vec![
            struct_var("Missing", "m", 1),
            int_var("NotAStruct", 2),
            struct_var("NotAStruct", "n", 3),
            main_fn(4, vec![], vec![write(access(Expr::id("m", 5, 14), "x", 5, 16))]),
        ]);

        let diags = analyze(&mut program);

        assert_eq!(
            diags.kinds(),
            vec![
                DiagnosticKind::InvalidStructType,
                DiagnosticKind::InvalidStructType,
                DiagnosticKind::ColonAccessOfNonStruct,
            ]
        );
        assert_eq!(diags.entries()[0].pos, Position::new(1, 8));
    }

    #[test]
    fn test_field_types_resolve_in_enclosing_scope() {
        // A field named like a struct type does not hide the type from
        // later fields of the same struct.
        let mut program = Program::new(vec![
            struct_def("Inner", 1, vec![int_field("c", 2)]),
            struct_def(
                "Outer",
                4,
                vec![int_field("Inner", 5), struct_field("Inner", "b", 6)],
            ),
        ]);

        let diags = analyze(&mut program);
        assert!(diags.is_empty(), "{:?}", diags.entries());
    }

    #[test]
    fn test_struct_cannot_name_itself() {
        let mut program = Program::new(vec![struct_def(
            "Node",
            1,
            vec![struct_field("Node", "next", 2)],
        )]);

        let diags = analyze(&mut program);
        assert_eq!(diags.kinds(), vec![DiagnosticKind::InvalidStructType]);
    }

    #[test]
    fn test_var_decl_with_split_scopes() {
        let mut diags = Diagnostics::new();
        let mut analyzer = NameAnalyzer::new(&mut diags);

        let mut outer = SymbolTable::new();
        outer
            .declare("Point", Rc::new(Symbol::struct_definition(FieldTable::new())))
            .unwrap();
        outer.declare("taken", Rc::new(Symbol::plain("integer"))).unwrap();

        let mut fields = FieldTable::new();
        {
            let mut scopes = DeclScopes::Split {
                current: &mut fields,
                outer: &outer,
            };
            // Duplicate checks run against the field table, not the outer scope.
            let taken = VarDecl::new(TypeNode::Integer, ident("taken", 1, 1));
            assert!(analyzer.analyze_var_decl(&taken, &mut scopes).is_some());

            let p = VarDecl::new(TypeNode::named(ident("Point", 2, 1)), ident("p", 2, 8));
            let sym = analyzer.analyze_var_decl(&p, &mut scopes).unwrap();
            assert_eq!(sym.struct_name(), Some("Point"));

            assert!(analyzer.analyze_var_decl(&taken, &mut scopes).is_none());
        }

        assert_eq!(fields.names().collect::<Vec<_>>(), vec!["taken", "p"]);
        assert!(outer.lookup_local("p").unwrap().is_none());
        drop(analyzer);
        assert_eq!(diags.kinds(), vec![DiagnosticKind::MultiplyDeclared]);
    }

    #[test]
    fn test_if_else_branches_are_siblings() {
        // if (TRUE) { integer k. } else { disp <- (k). integer j. }  disp <- (j).
        let mut stmt = Stmt::IfElse {
            cond: Expr::True(Position::new(1, 5)),
            then_branch: Block::new(vec![int_var("k", 2)], vec![]),
            else_branch: Block::new(vec![int_var("j", 4)], vec![write(Expr::id("k", 5, 14))]),
        };
        let mut after = write(Expr::id("j", 7, 10));

        let mut diags = Diagnostics::new();
        let mut analyzer = NameAnalyzer::new(&mut diags);
        let mut table = SymbolTable::new();

        analyzer.analyze_stmt(&mut stmt, &mut table);
        assert_eq!(table.depth(), 1);
        analyzer.analyze_stmt(&mut after, &mut table);
        assert_eq!(analyzer.underflows(), 0);
        drop(analyzer);

        let positions: Vec<Position> = diags.entries().iter().map(|d| d.pos).collect();
        assert_eq!(diags.kinds(), vec![DiagnosticKind::Undeclared, DiagnosticKind::Undeclared]);
        assert_eq!(positions, vec![Position::new(5, 14), Position::new(7, 10)]);
    }

    #[test]
    fn test_statement_depth_restored() {
        let mut table = SymbolTable::new();
        let mut diags = Diagnostics::new();
        let mut analyzer = NameAnalyzer::new(&mut diags);

        let mut stmts = vec![
            Stmt::While {
                cond: Expr::False(Position::new(1, 8)),
                body: Block::new(
                    vec![int_var("w", 2)],
                    vec![Stmt::If {
                        cond: Expr::id("w", 3, 9),
                        body: Block::default(),
                    }],
                ),
            },
            Stmt::Assign(AssignExpr::new(Expr::id("w", 5, 1), Expr::int(1, 5, 5))),
        ];
        for stmt in &mut stmts {
            analyzer.analyze_stmt(stmt, &mut table);
            assert_eq!(table.depth(), 1);
        }
        drop(analyzer);
        assert_eq!(diags.kinds(), vec![DiagnosticKind::Undeclared]);
    }

    #[test]
    fn test_underflow_is_silent() {
        let mut diags = Diagnostics::new();
        let mut analyzer = NameAnalyzer::new(&mut diags);
        let mut table = SymbolTable::empty();

        analyzer.leave_scope(&mut table);
        analyzer.leave_scope(&mut table);
        assert_eq!(analyzer.underflows(), 2);

        // Sibling constructs keep working once a scope exists again.
        analyzer.enter_scope(&mut table);
        let mut decls = vec![int_var("x", 1)];
        analyzer.analyze_decls(&mut decls, &mut DeclScopes::Same(&mut table));
        let mut stmt = write(Expr::id("x", 2, 10));
        analyzer.analyze_stmt(&mut stmt, &mut table);
        drop(analyzer);

        assert!(diags.is_empty());
        assert!(written(&stmt).symbol().is_some());
    }

    #[test]
    fn test_clean_program_binds_everything() {
        let mut program = with_main(
            nested_structs(),
            vec![
                Stmt::Read(access(Expr::id("a", 11, 14), "n", 11, 16)),
                Stmt::Assign(AssignExpr::new(
                    access(access(Expr::id("a", 12, 5), "b", 12, 7), "c", 12, 9),
                    Expr::binary(
                        BinaryOp::Add,
                        access(Expr::id("a", 12, 13), "n", 12, 15),
                        Expr::int(1, 12, 19),
                    ),
                )),
                Stmt::PostInc(access(Expr::id("a", 13, 5), "n", 13, 7)),
                Stmt::Call(CallExpr::new(ident("main", 14, 5), vec![])),
            ],
        );

        let diags = analyze(&mut program);
        assert!(diags.is_empty(), "{:?}", diags.entries());
        assert!(unbound_references(&program).is_empty());

        let text = unparse(&program, 4);
        assert!(text.contains("input -> a{Outer}:n{integer}."));
        assert!(text.contains("a{Outer}:b{Inner}:c{integer} = (a{Outer}:n{integer} + 1)."));
        assert!(text.contains("main{->void}()."));
    }

    #[test]
    fn test_nested_expressions_resolve() {
        use crate::ast::UnaryOp;

        // integer u.
        // void main[] [
        //     boolean w. integer d.
        //     disp <- ((^u)).  disp <- ((q = 1)).  disp <- ((^z)).
        //     d--.  e--.
        //     while (w) { }  while (k) { }
        //     u = (d = (-y)).
        // ]
        let mut program = Program::new(vec![
            int_var("u", 1),
            main_fn(
                2,
                vec![Decl::var(TypeNode::Boolean, ident("w", 3, 13)), int_var("d", 4)],
                vec![
                    write(Expr::unary(UnaryOp::Not, Expr::id("u", 5, 17))),
                    write(Expr::assign(Expr::id("q", 6, 16), Expr::int(1, 6, 20))),
                    write(Expr::unary(UnaryOp::Not, Expr::id("z", 7, 17))),
                    Stmt::PostDec(Expr::id("d", 8, 5)),
                    Stmt::PostDec(Expr::id("e", 9, 5)),
                    Stmt::While {
                        cond: Expr::id("w", 10, 12),
                        body: Block::default(),
                    },
                    Stmt::While {
                        cond: Expr::id("k", 11, 12),
                        body: Block::default(),
                    },
                    Stmt::Assign(AssignExpr::new(
                        Expr::id("u", 12, 5),
                        Expr::assign(
                            Expr::id("d", 12, 10),
                            Expr::unary(UnaryOp::Neg, Expr::id("y", 12, 16)),
                        ),
                    )),
                ],
            ),
        ]);

        let diags = analyze(&mut program);

        let undeclared = vec![
            Position::new(6, 16),
            Position::new(7, 17),
            Position::new(9, 5),
            Position::new(11, 12),
            Position::new(12, 16),
        ];
        assert!(diags.entries().iter().all(|d| d.kind == DiagnosticKind::Undeclared));
        let positions: Vec<Position> = diags.entries().iter().map(|d| d.pos).collect();
        assert_eq!(positions, undeclared);

        let unbound: Vec<Position> = unbound_references(&program).iter().map(|ident| ident.pos).collect();
        assert_eq!(unbound, undeclared);

        let text = unparse(&program, 4);
        assert!(text.contains("disp <- ((^u{integer}))."));
        assert!(text.contains("disp <- ((q = 1))."));
        assert!(text.contains("d{integer}--."));
        assert!(text.contains("while (w{boolean}) {"));
        assert!(text.contains("u{integer} = (d{integer} = (-y))."));
    }

    #[test]
    fn test_decl_list_with_split_scopes() {
        let mut diags = Diagnostics::new();
        let mut analyzer = NameAnalyzer::new(&mut diags);

        let outer = SymbolTable::new();
        let mut fields = FieldTable::new();
        let mut decls = vec![
            int_var("a", 1),
            Decl::var(TypeNode::Void, ident("b", 2, 6)),
            main_fn(3, vec![], vec![]),
            struct_def("Inner", 4, vec![]),
            int_var("a", 5),
        ];
        {
            let mut scopes = DeclScopes::Split {
                current: &mut fields,
                outer: &outer,
            };
            assert!(scopes.table().is_none());
            analyzer.analyze_decls(&mut decls, &mut scopes);
        }
        drop(analyzer);

        assert_eq!(fields.names().collect::<Vec<_>>(), vec!["a"]);
        assert!(outer.lookup_global("main").unwrap().is_none());
        assert!(outer.lookup_global("Inner").unwrap().is_none());
        assert_eq!(
            diags.kinds(),
            vec![DiagnosticKind::NonFunctionVoid, DiagnosticKind::MultiplyDeclared]
        );
        assert_eq!(diags.entries()[1].pos, Position::new(5, 9));
    }
}
