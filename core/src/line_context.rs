//! Lexical, per-keystroke context for the text left of an edit cursor.
//!
//! Works on one line of possibly half-typed text without parsing it. The
//! answer is a heuristic and is never an error: an unclear prefix just yields
//! an empty chain.

use serde::Serialize;

use crate::token::{NameClass, Token, TokenKind, Tokenizer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainLink {
    pub text: String,
    pub column: u32,
    pub is_class_shaped: bool,
    pub is_instance_field: bool,
    pub is_static_field: bool,
}

impl ChainLink {
    fn from_token(token: &Token) -> Self {
        let class = token.name_class();
        Self {
            text: token.text.clone(),
            column: token.column,
            is_class_shaped: token.is_class_shaped(),
            is_instance_field: class == NameClass::Field,
            is_static_field: class == NameClass::StaticField,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineContext {
    /// The cursor sits inside an unclosed argument list.
    pub in_parameter_list: bool,
    /// Commas between the cursor and that list's `(`.
    pub active_parameter_index: usize,
    pub after_any_dot: bool,
    /// Names that follow a dot, in source order.
    pub identifier_chain: Vec<ChainLink>,
    #[serde(skip)]
    call_target: Option<String>,
}

impl LineContext {
    /// Method name directly before the unclosed `(`, for signature lookup.
    pub fn call_target(&self) -> Option<&str> {
        self.call_target.as_deref()
    }

    /// Last link of the chain, the receiver closest to the cursor.
    pub fn receiver(&self) -> Option<&ChainLink> {
        self.identifier_chain.last()
    }
}

pub fn analyze_line(text: &str, cursor_column: usize) -> LineContext {
    let tokens = Tokenizer::tokenize_prefix(text);
    let visible = tokens.iter().filter(|token| {
        (token.column as usize) <= cursor_column && !matches!(token.kind, TokenKind::Eof | TokenKind::Line)
    });

    let mut context = LineContext::default();
    let mut chain = Vec::new();
    // Closing parens seen and not yet matched, scanning right to left.
    let mut depth = 0usize;
    // The token to the right was a dot, so a name here joins the chain.
    let mut slot_open = false;
    let mut awaiting_target = false;

    for token in visible.rev() {
        if awaiting_target {
            awaiting_target = false;
            if token.kind == TokenKind::Name {
                context.call_target = Some(token.text.clone());
            }
        }

        match token.kind {
            TokenKind::RightParen => depth += 1,
            TokenKind::LeftParen if depth > 0 => depth -= 1,
            TokenKind::LeftParen => {
                if !context.in_parameter_list {
                    context.in_parameter_list = true;
                    awaiting_target = true;
                }
            }
            TokenKind::Comma if depth == 0 && !context.in_parameter_list => {
                context.active_parameter_index += 1;
            }
            TokenKind::Dot => context.after_any_dot = true,
            TokenKind::Name if slot_open && depth == 0 => chain.push(ChainLink::from_token(token)),
            _ => {}
        }
        slot_open = token.kind == TokenKind::Dot;
    }

    chain.reverse();
    context.identifier_chain = chain;
    context
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_receiver_call() {
        let ctx = analyze_line("Draw.rect(", 10);
        assert!(ctx.after_any_dot);
        assert!(ctx.in_parameter_list);
        assert_eq!(ctx.active_parameter_index, 0);
        assert_eq!(ctx.identifier_chain.len(), 1);
        let link = &ctx.identifier_chain[0];
        assert_eq!(link.text, "Draw");
        assert!(link.is_class_shaped);
        assert!(!link.is_instance_field && !link.is_static_field);
        assert_eq!(ctx.call_target(), Some("rect"));
    }

    #[test]
    fn test_active_parameter() {
        let ctx = analyze_line("foo.bar(1, 2, ", 14);
        assert_eq!(ctx.active_parameter_index, 2);
        assert!(ctx.in_parameter_list);
        assert_eq!(ctx.call_target(), Some("bar"));
    }

    #[test]
    fn test_tokens_after_cursor_are_ignored() {
        let ctx = analyze_line("foo.bar(1, 2, 3)", 8);
        assert_eq!(ctx.active_parameter_index, 0);
        assert!(ctx.in_parameter_list);
    }

    #[test]
    fn test_nested_call_commas_are_not_counted() {
        let ctx = analyze_line("draw(point(1, 2), ", 18);
        assert_eq!(ctx.active_parameter_index, 1);
        assert_eq!(ctx.call_target(), Some("draw"));
    }

    #[test]
    fn test_field_receivers() {
        let ctx = analyze_line("x = _canvas.", 12);
        assert!(ctx.after_any_dot);
        assert!(!ctx.in_parameter_list);
        assert!(ctx.receiver().unwrap().is_instance_field);

        let ctx = analyze_line("__cache.", 8);
        assert!(ctx.receiver().unwrap().is_static_field);
    }

    #[test]
    fn test_chain_in_source_order() {
        let ctx = analyze_line("a.Alpha.beta.", 13);
        let texts: Vec<&str> = ctx.identifier_chain.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "Alpha", "beta"]);
        assert_eq!(ctx.identifier_chain[1].column, 2);
    }

    #[test]
    fn test_no_dot_gives_empty_chain() {
        let ctx = analyze_line("var x = Dra", 11);
        assert!(!ctx.after_any_dot);
        assert!(ctx.identifier_chain.is_empty());
        assert_eq!(ctx.call_target(), None);
    }

    #[test]
    fn test_tolerates_lexical_garbage() {
        let ctx = analyze_line("Foo.bar($$$", 11);
        assert!(ctx.in_parameter_list);
        assert_eq!(ctx.identifier_chain[0].text, "Foo");

        let ctx = analyze_line("System.print(\"unterminated", 26);
        assert!(ctx.in_parameter_list);

        assert_eq!(analyze_line("", 0), LineContext::default());
    }

    #[test]
    fn test_only_names_directly_left_of_a_dot_are_captured() {
        let ctx = analyze_line("Foo + .", 7);
        assert!(ctx.after_any_dot);
        assert!(ctx.identifier_chain.is_empty());

        let ctx = analyze_line("list[0].", 8);
        assert!(ctx.after_any_dot);
        assert!(ctx.identifier_chain.is_empty());

        let ctx = analyze_line("f(a.b, c).", 10);
        assert!(ctx.identifier_chain.is_empty());

        let ctx = analyze_line("Draw.rect(x, y).", 16);
        let texts: Vec<&str> = ctx.identifier_chain.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["Draw"]);
    }

    #[test]
    fn test_cursor_past_line_end() {
        let ctx = analyze_line("Foo.", 100);
        assert!(ctx.after_any_dot);
        assert_eq!(ctx.identifier_chain.len(), 1);
    }
}
