use std::fmt;

use crate::ast::{AssignTarget, ClassStmt, Expr, Method, Stmt};

use super::{Completion, CompletionKind};

/// Nodes visited per method body before the walk is abandoned.
pub const DEFAULT_WALK_BUDGET: usize = 10_000;

/// A method body the binding walk could not finish. Its bindings are dropped;
/// the rest of the index is unaffected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyWalkError {
    pub source: String,
    pub class: String,
    pub method: String,
    pub budget: usize,
}

impl fmt::Display for BodyWalkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "walking {}.{} in {} exceeded {} nodes",
            self.class, self.method, self.source, self.budget
        )
    }
}

impl std::error::Error for BodyWalkError {}

enum Node<'a> {
    Stmt(&'a Stmt),
    Expr(&'a Expr),
}

/// `var` names and field assignment targets reachable from `method`'s body,
/// block arguments included, in source order.
pub(crate) fn method_bindings(
    source: &str,
    class: &ClassStmt,
    method: &Method,
    budget: usize,
) -> Result<Vec<Completion>, BodyWalkError> {
    let mut bindings = Vec::new();
    // Children are pushed in reverse so they pop in source order.
    let mut stack: Vec<Node<'_>> = method.body.iter().rev().map(Node::Stmt).collect();
    let mut visited = 0usize;

    while let Some(node) = stack.pop() {
        visited += 1;
        if visited > budget {
            return Err(BodyWalkError {
                source: source.to_string(),
                class: class.name.text.clone(),
                method: method.display_name(),
                budget,
            });
        }

        match node {
            Node::Stmt(stmt) => push_stmt(stmt, &mut stack, &mut bindings),
            Node::Expr(expr) => push_expr(expr, &mut stack, &mut bindings),
        }
    }

    Ok(bindings)
}

fn push_block<'a>(body: &'a [Stmt], stack: &mut Vec<Node<'a>>) {
    stack.extend(body.iter().rev().map(Node::Stmt));
}

fn push_exprs<'a>(exprs: &'a [Expr], stack: &mut Vec<Node<'a>>) {
    stack.extend(exprs.iter().rev().map(Node::Expr));
}

fn push_stmt<'a>(stmt: &'a Stmt, stack: &mut Vec<Node<'a>>, bindings: &mut Vec<Completion>) {
    match stmt {
        Stmt::Var(var) => {
            bindings.push(Completion::new(&var.name.text, CompletionKind::Variable));
            if let Some(initializer) = &var.initializer {
                stack.push(Node::Expr(initializer));
            }
        }
        Stmt::Block(body) => push_block(body, stack),
        Stmt::If {
            condition,
            then_branch,
            else_branch,
            ..
        } => {
            if let Some(else_branch) = else_branch {
                stack.push(Node::Stmt(else_branch));
            }
            stack.push(Node::Stmt(then_branch));
            stack.push(Node::Expr(condition));
        }
        Stmt::While { condition, body, .. } => {
            stack.push(Node::Stmt(body));
            stack.push(Node::Expr(condition));
        }
        Stmt::For { iterator, body, .. } => {
            stack.push(Node::Stmt(body));
            stack.push(Node::Expr(iterator));
        }
        Stmt::Return { value, .. } => {
            if let Some(value) = value {
                stack.push(Node::Expr(value));
            }
        }
        Stmt::Expr(expr) => stack.push(Node::Expr(expr)),
        Stmt::Import(_) | Stmt::Class(_) | Stmt::Break(_) | Stmt::Continue(_) => {}
    }
}

fn push_expr<'a>(expr: &'a Expr, stack: &mut Vec<Node<'a>>, bindings: &mut Vec<Completion>) {
    match expr {
        Expr::Assignment { target, value } => {
            match target {
                AssignTarget::Field(name) | AssignTarget::StaticField(name) => {
                    bindings.push(Completion::new(&name.text, CompletionKind::Field));
                    stack.push(Node::Expr(value));
                }
                AssignTarget::Setter(setter) => {
                    stack.push(Node::Expr(value));
                    stack.push(Node::Expr(setter));
                }
                AssignTarget::Local(_) => stack.push(Node::Expr(value)),
            }
        }
        Expr::Call {
            receiver,
            arguments,
            block_argument,
            ..
        } => {
            if let Some(block) = block_argument {
                push_block(&block.body, stack);
            }
            if let Some(arguments) = arguments {
                push_exprs(arguments, stack);
            }
            if let Some(receiver) = receiver {
                stack.push(Node::Expr(receiver));
            }
        }
        Expr::Super {
            arguments,
            block_argument,
            ..
        } => {
            if let Some(block) = block_argument {
                push_block(&block.body, stack);
            }
            if let Some(arguments) = arguments {
                push_exprs(arguments, stack);
            }
        }
        Expr::Subscript { receiver, arguments, .. } => {
            push_exprs(arguments, stack);
            stack.push(Node::Expr(receiver));
        }
        Expr::List { elements, .. } => push_exprs(elements, stack),
        Expr::Map { entries, .. } => {
            for (key, value) in entries.iter().rev() {
                stack.push(Node::Expr(value));
                stack.push(Node::Expr(key));
            }
        }
        Expr::Prefix { operand, .. } => stack.push(Node::Expr(operand)),
        Expr::Infix { left, right, .. } => {
            stack.push(Node::Expr(right));
            stack.push(Node::Expr(left));
        }
        Expr::Conditional {
            condition,
            then_branch,
            else_branch,
        } => {
            stack.push(Node::Expr(else_branch));
            stack.push(Node::Expr(then_branch));
            stack.push(Node::Expr(condition));
        }
        Expr::Grouping(inner) => stack.push(Node::Expr(inner)),
        Expr::Null(_)
        | Expr::Bool(_)
        | Expr::Num(_)
        | Expr::Str(_)
        | Expr::Field(_)
        | Expr::StaticField(_)
        | Expr::This(_) => {}
    }
}
