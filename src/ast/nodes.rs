//! Syntax tree node definitions for bach programs.
//!
//! The tree is produced once by the parser and owned exclusively by the
//! caller. Name analysis only writes symbol back-references into
//! [`Ident::symbol`] and [`StructAccess::symbol`]; everything else is
//! read-only after construction.
//!
//! All enums are externally tagged with snake_case names when serialized,
//! which is the JSON shape the command-line driver reads.

use crate::symbol::Symbol;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// A (line, column) source position, both 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// An identifier occurrence.
///
/// `symbol` is empty until name analysis binds the occurrence; it stays
/// empty when resolution failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub pos: Position,
    #[serde(skip)]
    pub symbol: Option<Rc<Symbol>>,
}

impl Ident {
    pub fn new(name: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            name: name.into(),
            pos: Position::new(line, column),
            symbol: None,
        }
    }

    /// The symbol this occurrence resolved to, if any.
    pub fn symbol(&self) -> Option<&Rc<Symbol>> {
        self.symbol.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.symbol.is_some()
    }
}

/// Root of a parsed program: the top-level declaration list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub decls: Vec<Decl>,
}

impl Program {
    pub fn new(decls: Vec<Decl>) -> Self {
        Self { decls }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decl {
    Var(VarDecl),
    Func(FnDecl),
    Struct(StructDecl),
}

impl Decl {
    pub fn var(ty: TypeNode, name: Ident) -> Self {
        Decl::Var(VarDecl::new(ty, name))
    }

    /// The declared name.
    pub fn name(&self) -> &Ident {
        match self {
            Decl::Var(decl) => &decl.name,
            Decl::Func(decl) => &decl.name,
            Decl::Struct(decl) => &decl.name,
        }
    }
}

/// `integer x.` or `struct Point p.`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarDecl {
    pub ty: TypeNode,
    pub name: Ident,
    /// Array size marker reserved by the grammar. Nothing reads it; arrays
    /// have no semantics yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl VarDecl {
    pub fn new(ty: TypeNode, name: Ident) -> Self {
        Self { ty, name, size: None }
    }
}

/// `integer f[integer a, boolean b] [ decls stmts ]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FnDecl {
    pub ret: TypeNode,
    pub name: Ident,
    #[serde(default)]
    pub formals: Vec<FormalDecl>,
    #[serde(default)]
    pub body: Block,
}

impl FnDecl {
    pub fn new(ret: TypeNode, name: Ident, formals: Vec<FormalDecl>, body: Block) -> Self {
        Self {
            ret,
            name,
            formals,
            body,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormalDecl {
    pub ty: TypeNode,
    pub name: Ident,
}

impl FormalDecl {
    pub fn new(ty: TypeNode, name: Ident) -> Self {
        Self { ty, name }
    }
}

/// `struct Point [ integer x. integer y. ]`
///
/// Fields are plain variable declarations; the grammar admits nothing else
/// inside a struct body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructDecl {
    pub name: Ident,
    pub fields: Vec<VarDecl>,
}

impl StructDecl {
    pub fn new(name: Ident, fields: Vec<VarDecl>) -> Self {
        Self { name, fields }
    }
}

/// Local declarations followed by statements: a function body or the body
/// of an `if`/`while` branch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub decls: Vec<Decl>,
    #[serde(default)]
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(decls: Vec<Decl>, stmts: Vec<Stmt>) -> Self {
        Self { decls, stmts }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeNode {
    Boolean,
    Integer,
    Void,
    /// A named struct type, `struct Point`.
    Struct(Ident),
}

impl TypeNode {
    pub fn named(name: Ident) -> Self {
        TypeNode::Struct(name)
    }

    /// Type descriptor recorded in symbols: the keyword, or the struct name.
    pub fn descriptor(&self) -> &str {
        match self {
            TypeNode::Boolean => "boolean",
            TypeNode::Integer => "integer",
            TypeNode::Void => "void",
            TypeNode::Struct(name) => &name.name,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeNode::Void)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    Assign(AssignExpr),
    PostInc(Expr),
    PostDec(Expr),
    If {
        cond: Expr,
        body: Block,
    },
    /// The two branches are siblings; neither is nested in the other.
    IfElse {
        cond: Expr,
        then_branch: Block,
        else_branch: Block,
    },
    While {
        cond: Expr,
        body: Block,
    },
    Read(Expr),
    Write(Expr),
    Call(CallExpr),
    Return(Option<Expr>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignExpr {
    pub lhs: Expr,
    pub rhs: Expr,
}

impl AssignExpr {
    pub fn new(lhs: Expr, rhs: Expr) -> Self {
        Self { lhs, rhs }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallExpr {
    pub callee: Ident,
    #[serde(default)]
    pub args: Vec<Expr>,
}

impl CallExpr {
    pub fn new(callee: Ident, args: Vec<Expr>) -> Self {
        Self { callee, args }
    }
}

/// `base:field`
///
/// `symbol` is the struct definition this access exposes for further
/// chaining. It is only set when `field` names a struct instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructAccess {
    pub base: Expr,
    pub field: Ident,
    #[serde(skip)]
    pub symbol: Option<Rc<Symbol>>,
}

impl StructAccess {
    pub fn new(base: Expr, field: Ident) -> Self {
        Self {
            base,
            field,
            symbol: None,
        }
    }

    /// Position used for diagnostics about this access: its field.
    pub fn pos(&self) -> Position {
        self.field.pos
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
    Neg,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Not => "^",
            UnaryOp::Neg => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,

    // Relational
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "^=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    True(Position),
    False(Position),
    Id(Ident),
    IntLit {
        value: i32,
        pos: Position,
    },
    StrLit {
        value: String,
        pos: Position,
    },
    Access(Box<StructAccess>),
    Assign(Box<AssignExpr>),
    Call(CallExpr),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn id(name: impl Into<String>, line: u32, column: u32) -> Self {
        Expr::Id(Ident::new(name, line, column))
    }

    pub fn int(value: i32, line: u32, column: u32) -> Self {
        Expr::IntLit {
            value,
            pos: Position::new(line, column),
        }
    }

    pub fn string(value: impl Into<String>, line: u32, column: u32) -> Self {
        Expr::StrLit {
            value: value.into(),
            pos: Position::new(line, column),
        }
    }

    pub fn access(base: Expr, field: Ident) -> Self {
        Expr::Access(Box::new(StructAccess::new(base, field)))
    }

    pub fn assign(lhs: Expr, rhs: Expr) -> Self {
        Expr::Assign(Box::new(AssignExpr::new(lhs, rhs)))
    }

    pub fn call(callee: Ident, args: Vec<Expr>) -> Self {
        Expr::Call(CallExpr::new(callee, args))
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// The symbol this expression exposes after analysis: an identifier's
    /// binding, or the struct definition a qualified access chains into.
    pub fn symbol(&self) -> Option<&Rc<Symbol>> {
        match self {
            Expr::Id(ident) => ident.symbol(),
            Expr::Access(access) => access.symbol.as_ref(),
            _ => None,
        }
    }
}
