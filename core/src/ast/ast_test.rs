#[cfg(test)]
mod test {
    use crate::{
        ast::{AssignTarget, Expr, MAX_NESTING, MethodKind, Parser, Stmt, parse_source},
        token::{Position, Tokenizer},
    };

    #[test]
    fn basic() {
        let tokens = Tokenizer::tokenize("class Foo { construct new(a, b) {} }").unwrap();
        let module = Parser::new(&tokens).parse().unwrap();

        assert_eq!(module.statements.len(), 1);
        let class = module.classes().next().unwrap();
        assert_eq!(class.name.text, "Foo");
        assert_eq!(class.methods.len(), 1);

        let method = &class.methods[0];
        assert_eq!(method.name.text, "new");
        assert!(method.is_construct);
        assert!(!method.is_static && !method.is_foreign);
        assert_eq!(method.parameter_names(), vec!["a", "b"]);
        assert!(method.body.is_empty());
    }

    #[test]
    fn test_method_modifiers_and_shapes() {
        let src = r#"
foreign class Canvas is Object {
  foreign static rect(x, y, w, h)
  static count { __count }
  width { _width }
  width=(value) { _width = value }
  [x, y] { _pixels[x] }
  [x, y]=(color) { _pixels[x] = color }
  +(other) { this }
  - { this }
  construct new() {}
}
"#;
        let module = parse_source(src).unwrap();
        let class = module.classes().next().unwrap();
        assert!(class.foreign);
        assert_eq!(class.superclass.as_ref().unwrap().text, "Object");

        let shapes: Vec<(String, MethodKind, Option<usize>)> = class
            .methods
            .iter()
            .map(|m| (m.display_name(), m.kind, m.parameters.as_ref().map(Vec::len)))
            .collect();
        assert_eq!(
            shapes,
            vec![
                ("rect".to_string(), MethodKind::Named, Some(4)),
                ("count".to_string(), MethodKind::Named, None),
                ("width".to_string(), MethodKind::Named, None),
                ("width=".to_string(), MethodKind::Setter, Some(1)),
                ("[]".to_string(), MethodKind::Subscript, Some(2)),
                ("[]=".to_string(), MethodKind::SubscriptSetter, Some(3)),
                ("+".to_string(), MethodKind::Operator, Some(1)),
                ("-".to_string(), MethodKind::Operator, None),
                ("new".to_string(), MethodKind::Named, Some(0)),
            ]
        );

        let rect = &class.methods[0];
        assert!(rect.is_foreign && rect.is_static);
        assert!(rect.body.is_empty());
    }

    #[test]
    fn test_import_keeps_literal() {
        let module = parse_source("import \"lib/draw\" for Draw, Color as C\nimport \"meta\"").unwrap();
        let imports: Vec<_> = module.imports().collect();
        assert_eq!(imports.len(), 2);
        assert_eq!(imports[0].path.text, "\"lib/draw\"");
        assert_eq!(imports[0].variables.len(), 2);
        assert_eq!(imports[0].variables[1].name.text, "Color");
        assert_eq!(imports[0].variables[1].alias.as_ref().unwrap().text, "C");
        assert!(imports[1].variables.is_empty());
    }

    #[test]
    fn test_assignment_targets() {
        let module = parse_source("x = 1\n_field = 2\n__shared = 3\nfoo.bar = 4\nlist[0] = 5").unwrap();
        let targets: Vec<&AssignTarget> = module
            .statements
            .iter()
            .map(|stmt| match stmt {
                Stmt::Expr(Expr::Assignment { target, .. }) => target,
                other => panic!("expected assignment, got {:?}", other),
            })
            .collect();

        assert!(matches!(targets[0], AssignTarget::Local(t) if t.text == "x"));
        assert!(matches!(targets[1], AssignTarget::Field(t) if t.text == "_field"));
        assert!(matches!(targets[2], AssignTarget::StaticField(t) if t.text == "__shared"));
        assert!(matches!(targets[3], AssignTarget::Setter(e) if matches!(**e, Expr::Call { .. })));
        assert!(matches!(targets[4], AssignTarget::Setter(e) if matches!(**e, Expr::Subscript { .. })));
    }

    #[test]
    fn test_invalid_assignment_target() {
        let err = parse_source("foo() = 1").unwrap_err();
        assert_eq!(err.position, Position::new(1, 6, 6));
    }

    #[test]
    fn test_block_argument() {
        let module = parse_source("list.each {|item, i|\n  var doubled = item * 2\n}").unwrap();
        let Stmt::Expr(Expr::Call {
            name, block_argument, ..
        }) = &module.statements[0]
        else {
            panic!("expected call statement");
        };
        assert_eq!(name.text, "each");
        let block = block_argument.as_ref().unwrap();
        let params: Vec<&str> = block.parameters.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(params, vec!["item", "i"]);
        assert!(matches!(&block.body[0], Stmt::Var(v) if v.name.text == "doubled"));
    }

    #[test]
    fn test_control_flow() {
        let src = r#"
var total = 0
for (i in 1..10) {
  if (i % 2 == 0) {
    total = total + i
  } else if (i > 7) break else {
    continue
  }
}
while (total > 0) total = total - 1
return total
"#;
        let module = parse_source(src).unwrap();
        assert_eq!(module.statements.len(), 4);
        assert!(matches!(module.statements[1], Stmt::For { .. }));
        assert!(matches!(module.statements[2], Stmt::While { .. }));
        assert!(matches!(&module.statements[3], Stmt::Return { value: Some(_), .. }));
    }

    #[test]
    fn test_else_on_next_line() {
        let module = parse_source("if (a) {\n  b\n}\nelse {\n  c\n}\nd").unwrap();
        assert_eq!(module.statements.len(), 2);
        assert!(matches!(&module.statements[0], Stmt::If { else_branch: Some(_), .. }));
    }

    #[test]
    fn test_literals_and_operators() {
        let src = "var m = {\"a\": [1, 2,], \"b\": null}\nvar t = a is Num && !b ? -1 : x..y";
        let module = parse_source(src).unwrap();
        let Stmt::Var(map) = &module.statements[0] else { panic!() };
        assert!(matches!(&map.initializer, Some(Expr::Map { entries, .. }) if entries.len() == 2));
        let Stmt::Var(cond) = &module.statements[1] else { panic!() };
        assert!(matches!(&cond.initializer, Some(Expr::Conditional { .. })));
    }

    #[test]
    fn test_precedence() {
        let module = parse_source("a + b * c").unwrap();
        let Stmt::Expr(Expr::Infix { operator, right, .. }) = &module.statements[0] else {
            panic!("expected infix");
        };
        assert_eq!(operator.text, "+");
        assert!(matches!(&**right, Expr::Infix { operator, .. } if operator.text == "*"));
    }

    #[test]
    fn test_chain_continues_on_next_line() {
        let module = parse_source("items\n  .where {|x| x > 1 }\n  .count").unwrap();
        assert_eq!(module.statements.len(), 1);
        assert!(matches!(&module.statements[0], Stmt::Expr(Expr::Call { name, .. }) if name.text == "count"));
    }

    #[test]
    fn test_super_and_this() {
        let src = "class B is A {\n  construct new(x) {\n    super(x)\n    super.init()\n    this.x = x\n  }\n}";
        let module = parse_source(src).unwrap();
        let body = &module.classes().next().unwrap().methods[0].body;
        assert_eq!(body.len(), 3);
        assert!(matches!(&body[0], Stmt::Expr(Expr::Super { name: None, arguments: Some(_), .. })));
    }

    #[test]
    fn test_attributes_are_skipped() {
        let module = parse_source("#doc = \"x\"\nclass A {\n  #!internal\n  foo {}\n}").unwrap();
        assert_eq!(module.classes().next().unwrap().methods.len(), 1);
    }

    #[test]
    fn test_stray_paren_fails_at_paren() {
        let err = parse_source("foo)").unwrap_err();
        assert_eq!(err.position, Position::new(1, 3, 3));
        assert_eq!(err.expected, "newline");
        assert_eq!(err.found, "')'");
    }

    #[test]
    fn test_unterminated_string_fails_at_string() {
        let err = parse_source("var s = \"abc").unwrap_err();
        assert_eq!(err.position, Position::new(1, 8, 8));
    }

    #[test]
    fn test_unclosed_class_body() {
        let err = parse_source("class Foo {\n  bar {}\n").unwrap_err();
        assert_eq!(err.found, "end of input");
    }

    #[test]
    fn test_positions_are_kept() {
        let module = parse_source("\n\nclass Foo {}").unwrap();
        let class = module.classes().next().unwrap();
        assert_eq!((class.name.line, class.name.column), (3, 6));
    }

    /// Runs `f` on a thread with the default 2 MiB stack of tokio workers and
    /// test threads.
    fn on_small_stack(f: impl FnOnce() + Send + 'static) {
        std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(f)
            .unwrap()
            .join()
            .unwrap();
    }

    #[test]
    fn test_nesting_budget() {
        on_small_stack(|| {
            let deep = format!("var x = {}1{}", "(".repeat(128), ")".repeat(128));
            let err = parse_source(&deep).unwrap_err();
            assert_eq!(err.expected, "shallower nesting");

            let deeper = format!("{}1{}", "(".repeat(MAX_NESTING * 4), ")".repeat(MAX_NESTING * 4));
            assert_eq!(parse_source(&deeper).unwrap_err().expected, "shallower nesting");

            let shallow = format!("var x = {}1{}", "(".repeat(40), ")".repeat(40));
            assert!(parse_source(&shallow).is_ok());
        });
    }

    #[test]
    fn test_nesting_budget_covers_collections_and_blocks() {
        on_small_stack(|| {
            let lists = format!("var x = {}1{}", "[".repeat(246), "]".repeat(246));
            assert_eq!(parse_source(&lists).unwrap_err().expected, "shallower nesting");

            let maps = format!("var x = {}1{}", "{1: ".repeat(200), "}".repeat(200));
            assert_eq!(parse_source(&maps).unwrap_err().expected, "shallower nesting");

            let blocks = format!("{}x{}", "f {\n".repeat(200), "\n}".repeat(200));
            assert_eq!(parse_source(&blocks).unwrap_err().expected, "shallower nesting");

            let prefixes = format!("var x = {}1", "-".repeat(300));
            assert_eq!(parse_source(&prefixes).unwrap_err().expected, "shallower nesting");
        });
    }
}
