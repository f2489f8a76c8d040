#[cfg(test)]
mod parser_tests {
    use rox::ast::{Expr, LiteralValue, Stmt};
    use rox::error::{Diagnostics, Reporter};
    use rox::parser::Parser;
    use rox::scanner::scan_tokens;
    use rox::token::TokenType;

    fn parse(source: &str) -> (Vec<Stmt>, Vec<String>) {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens(source, &mut diagnostics);
        let statements = Parser::new(&tokens, &mut diagnostics).parse();
        let messages = diagnostics.errors().iter().map(|e| e.to_string()).collect();
        (statements, messages)
    }

    fn parse_ok(source: &str) -> Vec<Stmt> {
        let (statements, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected diagnostics: {:?}", errors);
        statements
    }

    fn single_expr(source: &str) -> Expr {
        match parse_ok(source).remove(0) {
            Stmt::Expression(expr) => expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    fn is_number(expr: &Expr, expected: f64) -> bool {
        matches!(expr, Expr::Literal(LiteralValue::Number(n)) if *n == expected)
    }

    fn is_variable(expr: &Expr, expected: &str) -> bool {
        matches!(expr, Expr::Variable { name, .. } if name.lexeme == expected)
    }

    #[test]
    fn test_factor_binds_tighter_than_term() {
        let Expr::Binary {
            left,
            operator,
            right,
        } = single_expr("1 + 2 * 3;")
        else {
            panic!("expected binary");
        };

        assert_eq!(operator.token_type, TokenType::PLUS);
        assert!(is_number(&left, 1.0));
        assert!(matches!(
            *right,
            Expr::Binary { ref operator, .. } if operator.token_type == TokenType::STAR
        ));
    }

    #[test]
    fn test_comma_is_lowest_precedence() {
        let Expr::Binary {
            left,
            operator,
            right,
        } = single_expr("a = 1, b = 2;")
        else {
            panic!("expected comma sequence");
        };

        assert_eq!(operator.token_type, TokenType::COMMA);
        assert!(matches!(*left, Expr::Assign { ref name, .. } if name.lexeme == "a"));
        assert!(matches!(*right, Expr::Assign { ref name, .. } if name.lexeme == "b"));
    }

    #[test]
    fn test_ternary_is_right_associative() {
        let Expr::Ternary {
            condition,
            then_branch,
            else_branch,
            ..
        } = single_expr("a ? b : c ? d : e;")
        else {
            panic!("expected ternary");
        };

        assert!(is_variable(&condition, "a"));
        assert!(is_variable(&then_branch, "b"));
        assert!(matches!(*else_branch, Expr::Ternary { .. }));
    }

    #[test]
    fn test_ternary_sits_below_logical_or() {
        let Expr::Ternary { condition, .. } = single_expr("a or b ? 1 : 2;") else {
            panic!("expected ternary");
        };

        assert!(matches!(*condition, Expr::Logical { .. }));
    }

    #[test]
    fn test_assignment_is_right_associative() {
        let Expr::Assign { name, value, .. } = single_expr("a = b = 3;") else {
            panic!("expected assignment");
        };

        assert_eq!(name.lexeme, "a");
        assert!(matches!(*value, Expr::Assign { ref name, .. } if name.lexeme == "b"));
    }

    #[test]
    fn test_call_and_property_chain_left_to_right() {
        // a.b(1).c  →  Get(Call(Get(a, b), [1]), c)
        let Expr::Get { object, name } = single_expr("a.b(1).c;") else {
            panic!("expected get");
        };
        assert_eq!(name.lexeme, "c");

        let Expr::Call {
            callee, arguments, ..
        } = *object
        else {
            panic!("expected call");
        };
        assert_eq!(arguments.len(), 1);
        assert!(is_number(&arguments[0], 1.0));

        let Expr::Get { object, name } = *callee else {
            panic!("expected inner get");
        };
        assert_eq!(name.lexeme, "b");
        assert!(is_variable(&object, "a"));
    }

    #[test]
    fn test_commas_separate_call_arguments() {
        let Expr::Call { arguments, .. } = single_expr("f(1, 2, 3);") else {
            panic!("expected call");
        };

        assert_eq!(arguments.len(), 3);
    }

    #[test]
    fn test_property_assignment_becomes_set() {
        let expr = single_expr("point.x = 4;");

        assert!(matches!(expr, Expr::Set { ref name, .. } if name.lexeme == "x"));
    }

    #[test]
    fn test_for_desugars_into_block_and_while() {
        let statements = parse_ok("for (var i = 0; i < 3; i = i + 1) print i;");
        assert_eq!(statements.len(), 1);

        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected outer block");
        };
        assert!(matches!(&outer[0], Stmt::Var { name, .. } if name.lexeme == "i"));

        let Stmt::While { condition, body } = &outer[1] else {
            panic!("expected while");
        };
        assert!(matches!(condition, Expr::Binary { operator, .. } if operator.token_type == TokenType::LESS));

        let Stmt::Block(inner) = body.as_ref() else {
            panic!("expected body block");
        };
        assert!(matches!(inner[0], Stmt::Print(_)));
        assert!(matches!(inner[1], Stmt::Expression(Expr::Assign { .. })));
    }

    #[test]
    fn test_for_without_clauses_loops_on_true() {
        let statements = parse_ok("for (;;) {}");

        let Stmt::While { condition, body } = &statements[0] else {
            panic!("expected bare while");
        };
        assert!(matches!(condition, Expr::Literal(LiteralValue::True)));
        assert!(matches!(body.as_ref(), Stmt::Block(b) if b.is_empty()));
    }

    #[test]
    fn test_else_binds_to_nearest_if() {
        let statements = parse_ok("if (a) if (b) print 1; else print 2;");

        let Stmt::If {
            then_branch,
            else_branch,
            ..
        } = &statements[0]
        else {
            panic!("expected if");
        };

        assert!(else_branch.is_none());
        assert!(matches!(
            then_branch.as_ref(),
            Stmt::If {
                else_branch: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_declarations() {
        let statements = parse_ok(
            "var x; fun add(a, b) { return a + b; } class Point { init(x) {} len() {} }",
        );
        assert_eq!(statements.len(), 3);

        assert!(matches!(&statements[0], Stmt::Var { initializer: None, .. }));

        let Stmt::Function(add) = &statements[1] else {
            panic!("expected function");
        };
        assert_eq!(add.name.as_ref().map(|t| t.lexeme.as_str()), Some("add"));
        assert_eq!(add.arity(), 2);
        assert!(matches!(add.body[0], Stmt::Return { value: Some(_), .. }));

        let Stmt::Class { name, methods } = &statements[2] else {
            panic!("expected class");
        };
        assert_eq!(name.lexeme, "Point");
        let names: Vec<&str> = methods
            .iter()
            .filter_map(|m| m.name.as_ref())
            .map(|t| t.lexeme.as_str())
            .collect();
        assert_eq!(names, ["init", "len"]);
    }

    #[test]
    fn test_anonymous_function_literal() {
        let expr = single_expr("fun (a) { return a; };");

        let Expr::Function(declaration) = expr else {
            panic!("expected function literal");
        };
        assert!(declaration.name.is_none());
        assert_eq!(declaration.arity(), 1);
    }

    #[test]
    fn test_each_reference_gets_its_own_id() {
        let statements = parse_ok("a; a;");

        let ids: Vec<_> = statements
            .iter()
            .map(|stmt| match stmt {
                Stmt::Expression(Expr::Variable { id, .. }) => *id,
                other => panic!("expected variable, got {:?}", other),
            })
            .collect();

        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_missing_semicolon_reported_at_end() {
        let (statements, errors) = parse("print 1");

        assert!(statements.is_empty());
        assert_eq!(errors, ["[line 1] Error at end: Expect ';' after value."]);
    }

    #[test]
    fn test_recovers_and_reports_every_error() {
        let (statements, errors) = parse("var = 1;\nprint 2;\nvar x = ;\nprint 3;");

        assert_eq!(
            errors,
            [
                "[line 1] Error at '=': Expect variable name.",
                "[line 3] Error at ';': Expect expression.",
            ]
        );
        assert_eq!(statements.len(), 2);
        assert!(statements.iter().all(|s| matches!(s, Stmt::Print(_))));
    }

    #[test]
    fn test_error_inside_block_keeps_rest_of_block() {
        let (statements, errors) = parse("{ print ; print 1; }");

        assert_eq!(errors.len(), 1);
        assert!(matches!(&statements[0], Stmt::Block(body) if body.len() == 1));
    }

    #[test]
    fn test_invalid_assignment_target_is_not_fatal() {
        let (statements, errors) = parse("1 = 2; print 3;");

        assert_eq!(errors, ["[line 1] Error at '=': Invalid assignment target."]);
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_too_many_arguments_is_not_fatal() {
        let args = vec!["0"; 256].join(", ");
        let (statements, errors) = parse(&format!("f({});", args));

        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Can't have more than 255 arguments."));

        let Stmt::Expression(Expr::Call { arguments, .. }) = &statements[0] else {
            panic!("expected call to survive");
        };
        assert_eq!(arguments.len(), 256);
    }

    #[test]
    fn test_too_many_parameters_is_not_fatal() {
        let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
        let (statements, errors) = parse(&format!("fun f({}) {{}}", params.join(", ")));

        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Can't have more than 255 parameters."));
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_unterminated_ternary() {
        let (_, errors) = parse("print a ? b;");

        assert_eq!(
            errors,
            ["[line 1] Error at ';': Expect ':' after then branch of conditional expression."]
        );
    }

    #[test]
    fn test_line_only_diagnostic() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.parse_error_at_line(7, "Unexpected end of input.");

        let error = &diagnostics.errors()[0];
        assert_eq!(error.to_string(), "[line 7] Error: Unexpected end of input.");
        assert_eq!(error.line(), Some(7));
    }
}
