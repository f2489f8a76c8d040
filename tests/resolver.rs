#[cfg(test)]
mod resolver_tests {
    use rox::ast::{Expr, ExprId, Stmt};
    use rox::error::Diagnostics;
    use rox::interpreter::Interpreter;
    use rox::parser::Parser;
    use rox::resolver::Resolver;
    use rox::scanner::scan_tokens;

    struct Resolved {
        interpreter: Interpreter,
        statements: Vec<Stmt>,
        errors: Vec<String>,
    }

    fn resolve(source: &str) -> Resolved {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens(source, &mut diagnostics);
        let statements = Parser::new(&tokens, &mut diagnostics).parse();
        assert!(
            diagnostics.is_empty(),
            "parse failed: {:?}",
            diagnostics.errors()
        );

        let mut interpreter = Interpreter::with_output(Box::new(std::io::sink()));
        Resolver::new(&mut interpreter, &mut diagnostics).resolve(&statements);

        let errors = diagnostics.errors().iter().map(|e| e.to_string()).collect();

        Resolved {
            interpreter,
            statements,
            errors,
        }
    }

    /// Recorded depth of every `name` reference, in source order.
    fn depths(resolved: &Resolved, name: &str) -> Vec<Option<usize>> {
        let mut found = Vec::new();
        for stmt in &resolved.statements {
            collect_stmt(stmt, &mut found);
        }

        found
            .into_iter()
            .filter(|(lexeme, _)| lexeme == name)
            .map(|(_, id)| resolved.interpreter.local_depth(id))
            .collect()
    }

    fn collect_stmt(stmt: &Stmt, out: &mut Vec<(String, ExprId)>) {
        match stmt {
            Stmt::Expression(expr) | Stmt::Print(expr) => collect_expr(expr, out),
            Stmt::Var { initializer, .. } => {
                if let Some(expr) = initializer {
                    collect_expr(expr, out);
                }
            }
            Stmt::Block(body) => body.iter().for_each(|s| collect_stmt(s, out)),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                collect_expr(condition, out);
                collect_stmt(then_branch, out);
                if let Some(else_branch) = else_branch {
                    collect_stmt(else_branch, out);
                }
            }
            Stmt::While { condition, body } => {
                collect_expr(condition, out);
                collect_stmt(body, out);
            }
            Stmt::Function(declaration) => {
                declaration.body.iter().for_each(|s| collect_stmt(s, out))
            }
            Stmt::Return { value, .. } => {
                if let Some(expr) = value {
                    collect_expr(expr, out);
                }
            }
            Stmt::Class { methods, .. } => {
                for method in methods {
                    method.body.iter().for_each(|s| collect_stmt(s, out));
                }
            }
        }
    }

    fn collect_expr(expr: &Expr, out: &mut Vec<(String, ExprId)>) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Variable { id, name } => out.push((name.lexeme.clone(), *id)),
            Expr::This { id, keyword } => out.push((keyword.lexeme.clone(), *id)),
            Expr::Assign { id, name, value } => {
                collect_expr(value, out);
                out.push((name.lexeme.clone(), *id));
            }
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                collect_expr(left, out);
                collect_expr(right, out);
            }
            Expr::Unary { right, .. } => collect_expr(right, out),
            Expr::Grouping(inner) => collect_expr(inner, out),
            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                collect_expr(condition, out);
                collect_expr(then_branch, out);
                collect_expr(else_branch, out);
            }
            Expr::Call {
                callee, arguments, ..
            } => {
                collect_expr(callee, out);
                arguments.iter().for_each(|a| collect_expr(a, out));
            }
            Expr::Get { object, .. } => collect_expr(object, out),
            Expr::Set { object, value, .. } => {
                collect_expr(object, out);
                collect_expr(value, out);
            }
            Expr::Function(declaration) => {
                declaration.body.iter().for_each(|s| collect_stmt(s, out))
            }
        }
    }

    #[test]
    fn test_block_locals_record_their_depth() {
        let resolved = resolve("{ var a = 1; { var b = a; print b; } }");

        assert!(resolved.errors.is_empty(), "{:?}", resolved.errors);
        assert_eq!(depths(&resolved, "a"), [Some(1)]);
        assert_eq!(depths(&resolved, "b"), [Some(0)]);
    }

    #[test]
    fn test_globals_are_left_unrecorded() {
        let resolved = resolve("var g = 1; print g; g = 2;");

        assert!(resolved.errors.is_empty());
        assert_eq!(depths(&resolved, "g"), [None, None]);
    }

    #[test]
    fn test_closure_reaches_enclosing_function_scope() {
        let resolved = resolve(
            "fun outer() {
               var x = 1;
               fun inner() { return x; }
               return inner;
             }",
        );

        assert!(resolved.errors.is_empty(), "{:?}", resolved.errors);
        assert_eq!(depths(&resolved, "x"), [Some(1)]);
        assert_eq!(depths(&resolved, "inner"), [Some(0)]);
    }

    #[test]
    fn test_this_lives_one_scope_outside_the_method() {
        let resolved = resolve("class A { m() { return this; } }");

        assert!(resolved.errors.is_empty(), "{:?}", resolved.errors);
        assert_eq!(depths(&resolved, "this"), [Some(1)]);
    }

    #[test]
    fn test_desugared_for_loop_depths() {
        let resolved = resolve("for (var i = 0; i < 3; i = i + 1) print i;");

        assert!(resolved.errors.is_empty(), "{:?}", resolved.errors);
        // condition, print, then `i + 1` and the assignment inside the body block
        assert_eq!(depths(&resolved, "i"), [Some(0), Some(1), Some(1), Some(1)]);
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        let resolved = resolve("{ var a = 1; var a = 2; print a; }");

        assert_eq!(
            resolved.errors,
            ["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
    }

    #[test]
    fn test_redeclaring_a_global_is_fine() {
        let resolved = resolve("var a = 1; var a = 2; print a;");

        assert!(resolved.errors.is_empty());
    }

    #[test]
    fn test_read_in_own_initializer() {
        let resolved = resolve("var a = 1; { var a = a; }");

        assert_eq!(
            resolved.errors,
            ["[line 1] Error at 'a': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_return_outside_function() {
        let resolved = resolve("return 1;");

        assert_eq!(
            resolved.errors,
            ["[line 1] Error at 'return': Can't return from top-level code."]
        );
    }

    #[test]
    fn test_return_value_from_initializer() {
        let resolved = resolve("class A {\n  init() { return 1; }\n}");

        assert_eq!(
            resolved.errors,
            ["[line 2] Error at 'return': Can't return a value from an initializer."]
        );
    }

    #[test]
    fn test_bare_return_in_initializer_is_fine() {
        let resolved = resolve("class A { init() { return; } }");

        assert!(resolved.errors.is_empty(), "{:?}", resolved.errors);
    }

    #[test]
    fn test_this_outside_class() {
        let top_level = resolve("print this;");
        let in_function = resolve("fun f() { return this; }");

        let expected = ["[line 1] Error at 'this': Can't use 'this' outside of a class."];
        assert_eq!(top_level.errors, expected);
        assert_eq!(in_function.errors, expected);
    }

    #[test]
    fn test_unused_locals_sorted_by_line_then_name() {
        let resolved = resolve("{\n  var b;\n  var z; var a;\n}");

        assert_eq!(
            resolved.errors,
            [
                "[line 2] Error at 'b': Local variable 'b' is never used.",
                "[line 3] Error at 'a': Local variable 'a' is never used.",
                "[line 3] Error at 'z': Local variable 'z' is never used.",
            ]
        );
    }

    #[test]
    fn test_assignment_alone_is_not_a_use() {
        let resolved = resolve("{ var a; a = 1; }");

        assert_eq!(
            resolved.errors,
            ["[line 1] Error at 'a': Local variable 'a' is never used."]
        );
    }

    #[test]
    fn test_unused_parameter_is_reported() {
        let resolved = resolve("fun f(x) {}");

        assert_eq!(
            resolved.errors,
            ["[line 1] Error at 'x': Local variable 'x' is never used."]
        );
    }

    #[test]
    fn test_walk_continues_after_errors() {
        let resolved = resolve("return 1;\nprint this;");

        assert_eq!(resolved.errors.len(), 2);
        assert!(resolved.errors[1].starts_with("[line 2]"));
    }
}
