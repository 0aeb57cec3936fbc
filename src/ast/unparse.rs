//! Pretty-printer for syntax trees.
//!
//! Produces deterministic source text mirroring the tree shape, which makes
//! it suitable for golden-output tests. Identifiers that name analysis bound
//! are followed by their symbol descriptor in braces, e.g. `x{integer}` or
//! `f{integer,boolean->void}`.

use super::nodes::*;

/// Render a program using `indent` spaces per nesting level.
pub fn unparse(program: &Program, indent: usize) -> String {
    let mut unparser = Unparser::new(indent);
    unparser.write_decls(&program.decls, 0);
    unparser.finish()
}

/// Render a single expression.
pub fn unparse_expr(expr: &Expr) -> String {
    let mut unparser = Unparser::new(0);
    unparser.write_expr(expr);
    unparser.finish()
}

/// Stateful writer accumulating the rendered text.
#[derive(Debug, Default)]
pub struct Unparser {
    buffer: String,
    unit: usize,
}

impl Unparser {
    pub fn new(unit: usize) -> Self {
        Self {
            buffer: String::new(),
            unit,
        }
    }

    pub fn finish(self) -> String {
        self.buffer
    }

    fn indent(&mut self, level: usize) {
        self.buffer.extend(std::iter::repeat_n(' ', level * self.unit));
    }

    fn push(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    pub fn write_decls(&mut self, decls: &[Decl], level: usize) {
        for decl in decls {
            match decl {
                Decl::Var(var) => self.write_var(var, level),
                Decl::Func(func) => self.write_fn(func, level),
                Decl::Struct(def) => self.write_struct(def, level),
            }
        }
    }

    fn write_var(&mut self, var: &VarDecl, level: usize) {
        self.indent(level);
        self.write_type(&var.ty);
        self.push(" ");
        self.write_ident(&var.name);
        self.push(".\n");
    }

    fn write_fn(&mut self, func: &FnDecl, level: usize) {
        self.indent(level);
        self.write_type(&func.ret);
        self.push(" ");
        self.write_ident(&func.name);
        self.push("[");
        for (i, formal) in func.formals.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.write_type(&formal.ty);
            self.push(" ");
            self.write_ident(&formal.name);
        }
        self.push("] [\n");
        self.write_block(&func.body, level + 1);
        self.indent(level);
        self.push("]\n\n");
    }

    fn write_struct(&mut self, def: &StructDecl, level: usize) {
        self.indent(level);
        self.push("struct ");
        self.write_ident(&def.name);
        self.push(" [\n");
        for field in &def.fields {
            self.write_var(field, level + 1);
        }
        self.indent(level);
        self.push("]\n\n");
    }

    fn write_type(&mut self, ty: &TypeNode) {
        match ty {
            TypeNode::Boolean => self.push("boolean"),
            TypeNode::Integer => self.push("integer"),
            TypeNode::Void => self.push("void"),
            TypeNode::Struct(name) => {
                self.push("struct ");
                self.write_ident(name);
            }
        }
    }

    fn write_block(&mut self, block: &Block, level: usize) {
        self.write_decls(&block.decls, level);
        for stmt in &block.stmts {
            self.write_stmt(stmt, level);
        }
    }

    fn write_braced(&mut self, block: &Block, level: usize) {
        self.push(" {\n");
        self.write_block(block, level + 1);
        self.indent(level);
        self.push("}\n");
    }

    fn write_stmt(&mut self, stmt: &Stmt, level: usize) {
        self.indent(level);
        match stmt {
            Stmt::Assign(assign) => {
                // Statement-level assignments are not parenthesized.
                self.write_expr(&assign.lhs);
                self.push(" = ");
                self.write_expr(&assign.rhs);
                self.push(".\n");
            }
            Stmt::PostInc(e) => {
                self.write_expr(e);
                self.push("++.\n");
            }
            Stmt::PostDec(e) => {
                self.write_expr(e);
                self.push("--.\n");
            }
            Stmt::If { cond, body } => {
                self.push("if (");
                self.write_expr(cond);
                self.push(")");
                self.write_braced(body, level);
            }
            Stmt::IfElse {
                cond,
                then_branch,
                else_branch,
            } => {
                self.push("if (");
                self.write_expr(cond);
                self.push(")");
                self.write_braced(then_branch, level);
                self.indent(level);
                self.push("else");
                self.write_braced(else_branch, level);
            }
            Stmt::While { cond, body } => {
                self.push("while (");
                self.write_expr(cond);
                self.push(")");
                self.write_braced(body, level);
            }
            Stmt::Read(e) => {
                self.push("input -> ");
                self.write_expr(e);
                self.push(".\n");
            }
            Stmt::Write(e) => {
                self.push("disp <- (");
                self.write_expr(e);
                self.push(").\n");
            }
            Stmt::Call(call) => {
                self.write_call(call);
                self.push(".\n");
            }
            Stmt::Return(e) => {
                self.push("return");
                if let Some(e) = e {
                    self.push(" ");
                    self.write_expr(e);
                }
                self.push(".\n");
            }
        }
    }

    fn write_ident(&mut self, ident: &Ident) {
        self.push(&ident.name);
        if let Some(symbol) = &ident.symbol {
            self.push("{");
            self.push(&symbol.descriptor());
            self.push("}");
        }
    }

    fn write_call(&mut self, call: &CallExpr) {
        self.write_ident(&call.callee);
        self.push("(");
        for (i, arg) in call.args.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.write_expr(arg);
        }
        self.push(")");
    }

    pub fn write_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::True(_) => self.push("TRUE"),
            Expr::False(_) => self.push("FALSE"),
            Expr::Id(ident) => self.write_ident(ident),
            Expr::IntLit { value, .. } => self.push(&value.to_string()),
            Expr::StrLit { value, .. } => self.push(value),
            Expr::Access(access) => {
                self.write_expr(&access.base);
                self.push(":");
                self.write_ident(&access.field);
            }
            Expr::Assign(assign) => {
                self.push("(");
                self.write_expr(&assign.lhs);
                self.push(" = ");
                self.write_expr(&assign.rhs);
                self.push(")");
            }
            Expr::Call(call) => self.write_call(call),
            Expr::Unary { op, operand } => {
                self.push("(");
                self.push(op.as_str());
                self.write_expr(operand);
                self.push(")");
            }
            Expr::Binary { op, lhs, rhs } => {
                self.push("(");
                self.write_expr(lhs);
                self.push(" ");
                self.push(op.as_str());
                self.push(" ");
                self.write_expr(rhs);
                self.push(")");
            }
        }
    }
}
