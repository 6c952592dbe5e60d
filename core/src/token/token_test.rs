#[cfg(test)]
mod tests {
    use crate::token::{LexError, Lexer, NameClass, Position, TokenKind, Tokenizer};

    fn kinds(src: &str) -> Vec<TokenKind> {
        Tokenizer::tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn basic() {
        let tokens = Tokenizer::tokenize("Draw.rect(1, 2)").unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Draw", ".", "rect", "(", "1", ",", "2", ")", ""]);
        assert_eq!(
            kinds("Draw.rect(1, 2)"),
            vec![
                TokenKind::Name,
                TokenKind::Dot,
                TokenKind::Name,
                TokenKind::LeftParen,
                TokenKind::Number,
                TokenKind::Comma,
                TokenKind::Number,
                TokenKind::RightParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_positions() {
        let tokens = Tokenizer::tokenize("var x = 1\n  foo.bar").unwrap();
        let foo = tokens.iter().find(|t| t.text == "foo").unwrap();
        assert_eq!((foo.line, foo.column, foo.length), (2, 2, 3));
        let bar = tokens.iter().find(|t| t.text == "bar").unwrap();
        assert_eq!((bar.line, bar.column), (2, 6));
        assert_eq!(bar.offset, 16);
    }

    #[test]
    fn test_single_eof_one_past_end() {
        let tokens = Tokenizer::tokenize("abc").unwrap();
        assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::Eof).count(), 1);
        let eof = tokens.last().unwrap();
        assert_eq!(eof.kind, TokenKind::Eof);
        assert_eq!((eof.line, eof.column, eof.offset), (1, 3, 3));

        let empty = Tokenizer::tokenize("").unwrap();
        assert_eq!(empty.len(), 1);
        assert_eq!(empty[0].position(), Position::start());
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("class construct foreign static import var as"),
            vec![
                TokenKind::Class,
                TokenKind::Construct,
                TokenKind::Foreign,
                TokenKind::Static,
                TokenKind::Import,
                TokenKind::Var,
                TokenKind::As,
                TokenKind::Eof,
            ]
        );
        // Keyword prefixes stay names.
        assert_eq!(kinds("classy"), vec![TokenKind::Name, TokenKind::Eof]);
        assert!(TokenKind::While.is_keyword());
        assert!(!TokenKind::Name.is_keyword());
    }

    #[test]
    fn test_newlines_are_tokens() {
        assert_eq!(
            kinds("a\nb"),
            vec![TokenKind::Name, TokenKind::Line, TokenKind::Name, TokenKind::Eof]
        );
    }

    #[test]
    fn test_comments_are_trivia() {
        assert_eq!(
            kinds("a // trailing\n/* outer /* inner */ still */ b"),
            vec![TokenKind::Name, TokenKind::Line, TokenKind::Name, TokenKind::Eof]
        );
        assert_eq!(kinds("#!/usr/bin/wren\nx"), vec![TokenKind::Line, TokenKind::Name, TokenKind::Eof]);
    }

    #[test]
    fn test_numbers() {
        let tokens = Tokenizer::tokenize("0xFF 3.14 1e10 2.5e-3 7").unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["0xFF", "3.14", "1e10", "2.5e-3", "7", ""]);
    }

    #[test]
    fn test_range_and_method_on_number() {
        assert_eq!(
            kinds("1..2"),
            vec![TokenKind::Number, TokenKind::DotDot, TokenKind::Number, TokenKind::Eof]
        );
        assert_eq!(
            kinds("1...2"),
            vec![TokenKind::Number, TokenKind::DotDotDot, TokenKind::Number, TokenKind::Eof]
        );
        assert_eq!(
            kinds("1.abs"),
            vec![TokenKind::Number, TokenKind::Dot, TokenKind::Name, TokenKind::Eof]
        );
    }

    #[test]
    fn test_operators_longest_match() {
        assert_eq!(
            kinds("== != <= >= << >> && || = < > ! |"),
            vec![
                TokenKind::EqEq,
                TokenKind::BangEq,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::LtLt,
                TokenKind::GtGt,
                TokenKind::AmpAmp,
                TokenKind::PipePipe,
                TokenKind::Eq,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Bang,
                TokenKind::Pipe,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_strings_keep_quotes_and_interpolation() {
        let tokens = Tokenizer::tokenize(r#"import "lib/draw" "a %(b["k"]) c" "esc \" q""#).unwrap();
        assert_eq!(tokens[1].text, r#""lib/draw""#);
        assert_eq!(tokens[2].text, r#""a %(b["k"]) c""#);
        assert_eq!(tokens[3].text, r#""esc \" q""#);
        assert!(tokens[1..4].iter().all(|t| t.kind == TokenKind::String));
    }

    #[test]
    fn test_raw_string() {
        let tokens = Tokenizer::tokenize("\"\"\"raw \"quoted\"\n text\"\"\" x").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, "\"\"\"raw \"quoted\"\n text\"\"\"");
        assert_eq!((tokens[1].line, tokens[1].text.as_str()), (2, "x"));
    }

    #[test]
    fn test_unrecognized_character() {
        let err = Tokenizer::tokenize("var a = @").unwrap_err();
        assert_eq!(err, LexError::new("Unrecognized character '@'", Position::new(1, 8, 8)));
    }

    #[test]
    fn test_unterminated_constructs() {
        let err = Tokenizer::tokenize("x = \"open").unwrap_err();
        assert_eq!(err.position, Position::new(1, 4, 4));
        assert!(err.message.contains("Unterminated string"));

        let err = Tokenizer::tokenize("/* never closed").unwrap_err();
        assert_eq!(err.position, Position::start());
    }

    #[test]
    fn test_lexer_fuses_after_error() {
        let mut lexer = Lexer::new("a $ b");
        assert!(lexer.next().unwrap().is_ok());
        assert!(lexer.next().unwrap().is_err());
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_lexer_is_restartable() {
        let lexer = Lexer::new("foo.bar");
        let first: Vec<_> = lexer.clone().collect();
        let second: Vec<_> = lexer.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_prefix_stops_at_error() {
        let tokens = Tokenizer::tokenize_prefix("foo.bar $ baz");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["foo", ".", "bar"]);
    }

    #[test]
    fn test_name_classification() {
        let tokens = Tokenizer::tokenize("Foo foo _bar __baz").unwrap();
        assert!(tokens[0].is_class_shaped());
        assert!(!tokens[1].is_class_shaped());
        assert_eq!(tokens[1].name_class(), NameClass::Local);
        assert_eq!(tokens[2].name_class(), NameClass::Field);
        assert_eq!(tokens[3].name_class(), NameClass::StaticField);
    }

    #[test]
    fn test_reassembly_reproduces_text_modulo_trivia() {
        let src = "class Foo {\n  construct new(a, b) { _a = a }\n  bar { __count } // c\n}\n";
        let tokens = Tokenizer::tokenize(src).unwrap();
        let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
        let strip = |s: &str| -> String {
            s.split("//").next().unwrap_or_default().chars().filter(|c| !c.is_whitespace()).collect()
        };
        let without_trivia: String = src.lines().map(strip).collect();
        assert_eq!(joined.chars().filter(|c| !c.is_whitespace()).collect::<String>(), without_trivia);
    }
}
