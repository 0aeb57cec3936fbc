//! Read-only traversal of a syntax tree.
//!
//! Visitors override the hooks they care about; [`walk_program`] drives
//! them over every identifier occurrence in source order.

use super::nodes::*;

/// How an identifier occurrence is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentRole {
    /// The name introduced by a declaration or formal
    Declaration,
    /// The struct name inside a `struct T` type
    TypeName,
    /// A use of a name: an expression identifier or a callee
    Reference,
    /// The field part of a colon-access
    Field,
}

impl IdentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentRole::Declaration => "declaration",
            IdentRole::TypeName => "type",
            IdentRole::Reference => "reference",
            IdentRole::Field => "field",
        }
    }

    /// Whether name analysis is expected to bind this occurrence.
    pub fn is_bindable(&self) -> bool {
        matches!(self, IdentRole::Reference | IdentRole::Field)
    }
}

pub trait Visitor<'ast> {
    fn visit_ident(&mut self, _ident: &'ast Ident, _role: IdentRole) {}

    /// Called after the access's base and field have been visited.
    fn visit_access(&mut self, _access: &'ast StructAccess) {}
}

pub fn walk_program<'ast, V: Visitor<'ast> + ?Sized>(program: &'ast Program, v: &mut V) {
    walk_decls(&program.decls, v);
}

fn walk_decls<'ast, V: Visitor<'ast> + ?Sized>(decls: &'ast [Decl], v: &mut V) {
    for decl in decls {
        match decl {
            Decl::Var(var) => walk_var(var, v),
            Decl::Func(func) => {
                walk_type(&func.ret, v);
                v.visit_ident(&func.name, IdentRole::Declaration);
                for formal in &func.formals {
                    walk_type(&formal.ty, v);
                    v.visit_ident(&formal.name, IdentRole::Declaration);
                }
                walk_block(&func.body, v);
            }
            Decl::Struct(def) => {
                v.visit_ident(&def.name, IdentRole::Declaration);
                for field in &def.fields {
                    walk_var(field, v);
                }
            }
        }
    }
}

fn walk_var<'ast, V: Visitor<'ast> + ?Sized>(var: &'ast VarDecl, v: &mut V) {
    walk_type(&var.ty, v);
    v.visit_ident(&var.name, IdentRole::Declaration);
}

fn walk_type<'ast, V: Visitor<'ast> + ?Sized>(ty: &'ast TypeNode, v: &mut V) {
    if let TypeNode::Struct(name) = ty {
        v.visit_ident(name, IdentRole::TypeName);
    }
}

fn walk_block<'ast, V: Visitor<'ast> + ?Sized>(block: &'ast Block, v: &mut V) {
    walk_decls(&block.decls, v);
    for stmt in &block.stmts {
        walk_stmt(stmt, v);
    }
}

fn walk_stmt<'ast, V: Visitor<'ast> + ?Sized>(stmt: &'ast Stmt, v: &mut V) {
    match stmt {
        Stmt::Assign(assign) => {
            walk_expr(&assign.lhs, v);
            walk_expr(&assign.rhs, v);
        }
        Stmt::PostInc(e) | Stmt::PostDec(e) | Stmt::Read(e) | Stmt::Write(e) => walk_expr(e, v),
        Stmt::If { cond, body } | Stmt::While { cond, body } => {
            walk_expr(cond, v);
            walk_block(body, v);
        }
        Stmt::IfElse {
            cond,
            then_branch,
            else_branch,
        } => {
            walk_expr(cond, v);
            walk_block(then_branch, v);
            walk_block(else_branch, v);
        }
        Stmt::Call(call) => walk_call(call, v),
        Stmt::Return(e) => {
            if let Some(e) = e {
                walk_expr(e, v);
            }
        }
    }
}

fn walk_call<'ast, V: Visitor<'ast> + ?Sized>(call: &'ast CallExpr, v: &mut V) {
    v.visit_ident(&call.callee, IdentRole::Reference);
    for arg in &call.args {
        walk_expr(arg, v);
    }
}

fn walk_expr<'ast, V: Visitor<'ast> + ?Sized>(expr: &'ast Expr, v: &mut V) {
    match expr {
        Expr::True(_) | Expr::False(_) | Expr::IntLit { .. } | Expr::StrLit { .. } => {}
        Expr::Id(ident) => v.visit_ident(ident, IdentRole::Reference),
        Expr::Access(access) => {
            walk_expr(&access.base, v);
            v.visit_ident(&access.field, IdentRole::Field);
            v.visit_access(access);
        }
        Expr::Assign(assign) => {
            walk_expr(&assign.lhs, v);
            walk_expr(&assign.rhs, v);
        }
        Expr::Call(call) => walk_call(call, v),
        Expr::Unary { operand, .. } => walk_expr(operand, v),
        Expr::Binary { lhs, rhs, .. } => {
            walk_expr(lhs, v);
            walk_expr(rhs, v);
        }
    }
}

/// Collects identifier occurrences in source order.
#[derive(Debug, Default)]
struct IdentCollector<'ast> {
    found: Vec<(&'ast Ident, IdentRole)>,
}

impl<'ast> Visitor<'ast> for IdentCollector<'ast> {
    fn visit_ident(&mut self, ident: &'ast Ident, role: IdentRole) {
        self.found.push((ident, role));
    }
}

/// Every identifier occurrence in the program with its role.
pub fn identifiers(program: &Program) -> Vec<(&Ident, IdentRole)> {
    let mut collector = IdentCollector::default();
    walk_program(program, &mut collector);
    collector.found
}

/// Reference and field occurrences that name analysis left unbound.
pub fn unbound_references(program: &Program) -> Vec<&Ident> {
    identifiers(program)
        .into_iter()
        .filter(|(ident, role)| role.is_bindable() && !ident.is_bound())
        .map(|(ident, _)| ident)
        .collect()
}
