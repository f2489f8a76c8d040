#[cfg(test)]
mod environment_tests {
    use std::rc::Rc;

    use rox::environment::Environment;
    use rox::token::{Token, TokenType};
    use rox::value::Value;

    fn ident(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name, 1)
    }

    #[test]
    fn test_get_walks_the_chain() {
        let globals = Environment::new().into_ref();
        globals.borrow_mut().define("a", Value::from(1.0));

        let inner = Environment::with_enclosing(Rc::clone(&globals));

        assert_eq!(inner.get(&ident("a")).ok(), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_define_shadows_and_replaces() {
        let globals = Environment::new().into_ref();
        globals.borrow_mut().define("a", Value::from("outer"));

        let mut inner = Environment::with_enclosing(Rc::clone(&globals));
        inner.define("a", Value::from("inner"));
        inner.define("a", Value::from("again"));

        assert_eq!(inner.get(&ident("a")).ok(), Some(Value::from("again")));
        assert_eq!(globals.borrow().get(&ident("a")).ok(), Some(Value::from("outer")));
    }

    #[test]
    fn test_assign_updates_nearest_binding() {
        let globals = Environment::new().into_ref();
        globals.borrow_mut().define("a", Value::Nil);

        let mut inner = Environment::with_enclosing(Rc::clone(&globals));
        assert!(inner.assign(&ident("a"), Value::from(true)).is_ok());

        assert_eq!(globals.borrow().get(&ident("a")).ok(), Some(Value::Bool(true)));
    }

    #[test]
    fn test_undefined_variable() {
        let mut environment = Environment::new();

        let read = environment.get(&ident("nope")).map(|_| ());
        let write = environment.assign(&ident("nope"), Value::Nil);

        for result in [read, write] {
            let error = result.expect_err("name was never defined");
            assert_eq!(error.to_string(), "Undefined variable 'nope'.\n[line 1]");
        }
    }

    #[test]
    fn test_at_distance_skips_shadowing_scopes() {
        let globals = Environment::new().into_ref();
        globals.borrow_mut().define("x", Value::from("global"));

        let middle = Environment::with_enclosing(Rc::clone(&globals)).into_ref();
        middle.borrow_mut().define("x", Value::from("middle"));

        let mut inner = Environment::with_enclosing(Rc::clone(&middle));
        inner.define("x", Value::from("inner"));

        assert_eq!(inner.get_at(0, "x"), Value::from("inner"));
        assert_eq!(inner.get_at(1, "x"), Value::from("middle"));
        assert_eq!(inner.get_at(2, "x"), Value::from("global"));

        inner.assign_at(1, "x", Value::from(2.0));
        assert_eq!(middle.borrow().get_at(0, "x"), Value::Number(2.0));
        assert_eq!(globals.borrow().get_at(0, "x"), Value::from("global"));
    }

    #[test]
    #[should_panic(expected = "out of sync")]
    fn test_missing_resolved_binding_panics() {
        let environment = Environment::new();
        environment.get_at(0, "ghost");
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(-2.5).to_string(), "-2.5");
        assert_eq!(Value::Number(-0.0).to_string(), "-0");
        assert_eq!(Value::Nil.to_string(), "nil");
        assert_eq!(Value::Bool(false).to_string(), "false");
        assert_eq!(Value::from("text").to_string(), "text");
    }

    #[test]
    fn test_value_equality_across_kinds() {
        assert_ne!(Value::Nil, Value::Bool(false));
        assert_ne!(Value::Number(0.0), Value::Bool(false));
        assert_ne!(Value::from("1"), Value::Number(1.0));
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        assert_eq!(Value::Number(0.0), Value::Number(-0.0));
    }
}
