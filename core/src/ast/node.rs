use serde::Serialize;

use crate::token::{NameClass, Token};

/// Parsed AST root for one source unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub statements: Vec<Stmt>,
}

impl Module {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }

    pub fn imports(&self) -> impl Iterator<Item = &ImportStmt> {
        self.statements.iter().filter_map(|stmt| match stmt {
            Stmt::Import(import) => Some(import),
            _ => None,
        })
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassStmt> {
        self.statements.iter().filter_map(|stmt| match stmt {
            Stmt::Class(class) => Some(class),
            _ => None,
        })
    }

    /// Top-level `var` declarations.
    pub fn variables(&self) -> impl Iterator<Item = &VarStmt> {
        self.statements.iter().filter_map(|stmt| match stmt {
            Stmt::Var(var) => Some(var),
            _ => None,
        })
    }
}

/// Statement nodes.
///
/// Grammar:
/// module     ::= (definition Line)* Eof
/// definition ::= class_stmt | import_stmt | var_stmt | statement
/// class_stmt ::= ['foreign'] 'class' Name ['is' Name] '{' method* '}'
/// import_stmt ::= 'import' String ['for' Name ['as' Name] {',' Name ['as' Name]}]
/// var_stmt   ::= 'var' Name ['=' expr]
/// statement  ::= if | while | for | 'return' [expr] | 'break' | 'continue' | block | expr
/// block      ::= '{' (definition Line)* '}'
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Import(ImportStmt),
    Class(ClassStmt),
    Var(VarStmt),
    Block(Vec<Stmt>),
    If {
        keyword: Token,
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        keyword: Token,
        condition: Expr,
        body: Box<Stmt>,
    },
    For {
        keyword: Token,
        variable: Token,
        iterator: Expr,
        body: Box<Stmt>,
    },
    Return {
        keyword: Token,
        value: Option<Expr>,
    },
    Break(Token),
    Continue(Token),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportStmt {
    /// The string literal as written, quotes included.
    pub path: Token,
    pub variables: Vec<ImportVariable>,
}

/// One `Name [as Alias]` entry of an import's `for` list.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportVariable {
    pub name: Token,
    pub alias: Option<Token>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassStmt {
    pub foreign: bool,
    pub name: Token,
    pub superclass: Option<Token>,
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarStmt {
    pub name: Token,
    pub initializer: Option<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MethodKind {
    /// `name`, `name(a, b)`
    Named,
    /// `name=(value)`
    Setter,
    /// `+(other)`, `-`, `!`, `is(other)` and friends
    Operator,
    /// `[a, b]`
    Subscript,
    /// `[a, b]=(value)`; the value is the last parameter
    SubscriptSetter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    /// The name token. For subscripts this is the opening `[`.
    pub name: Token,
    pub kind: MethodKind,
    /// `None` for getter-style signatures that carry no parameter list.
    pub parameters: Option<Vec<Token>>,
    pub is_construct: bool,
    pub is_foreign: bool,
    pub is_static: bool,
    /// Empty for foreign methods.
    pub body: Vec<Stmt>,
}

impl Method {
    /// Name as it appears in completions and signature lookups: setters end in
    /// `=`, subscripts are `[]` and `[]=`.
    pub fn display_name(&self) -> String {
        match self.kind {
            MethodKind::Named | MethodKind::Operator => self.name.text.clone(),
            MethodKind::Setter => format!("{}=", self.name.text),
            MethodKind::Subscript => "[]".to_string(),
            MethodKind::SubscriptSetter => "[]=".to_string(),
        }
    }

    pub fn parameter_names(&self) -> Vec<String> {
        self.parameters
            .iter()
            .flatten()
            .map(|p| p.text.clone())
            .collect()
    }
}

/// `{ |a, b| body }` passed after a call's arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockArgument {
    pub parameters: Vec<Token>,
    pub body: Vec<Stmt>,
}

/// Expression nodes. Literals keep their token; nothing is evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null(Token),
    Bool(Token),
    Num(Token),
    Str(Token),
    List {
        bracket: Token,
        elements: Vec<Expr>,
    },
    Map {
        brace: Token,
        entries: Vec<(Expr, Expr)>,
    },
    Field(Token),
    StaticField(Token),
    This(Token),
    /// `super`, `super.name(...)` or `super(...)`.
    Super {
        keyword: Token,
        name: Option<Token>,
        arguments: Option<Vec<Expr>>,
        block_argument: Option<BlockArgument>,
    },
    /// A bare name (`receiver` is `None`) or a method call on a receiver.
    Call {
        receiver: Option<Box<Expr>>,
        name: Token,
        arguments: Option<Vec<Expr>>,
        block_argument: Option<BlockArgument>,
    },
    Subscript {
        receiver: Box<Expr>,
        bracket: Token,
        arguments: Vec<Expr>,
    },
    Prefix {
        operator: Token,
        operand: Box<Expr>,
    },
    Infix {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    Grouping(Box<Expr>),
    Assignment {
        target: AssignTarget,
        value: Box<Expr>,
    },
}

/// What an assignment writes to, decided from the target's spelling when the
/// assignment is parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Local(Token),
    Field(Token),
    StaticField(Token),
    /// `receiver.name = value` or `receiver[i] = value`
    Setter(Box<Expr>),
}

impl AssignTarget {
    pub fn from_name(name: Token) -> Self {
        match name.name_class() {
            NameClass::Local => AssignTarget::Local(name),
            NameClass::Field => AssignTarget::Field(name),
            NameClass::StaticField => AssignTarget::StaticField(name),
        }
    }
}
