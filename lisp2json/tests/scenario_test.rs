use lisp2json::{
    json_to_text, parse, render_document, text_to_json, Binding, Clause, Error, Node,
    MAX_DEPTH,
};

fn parse_one(source: &str) -> Node {
    let mut nodes = parse(source).unwrap();

    assert_eq!(nodes.len(), 1, "{} should hold a single form", source);

    nodes.remove(0)
}

#[test]
fn call_with_numbers() {
    assert_eq!(
        parse_one("(+ 1 2)"),
        Node::call("+", vec![Node::number("1"), Node::number("2")])
    );
    assert_eq!(
        text_to_json("(+ 1 2)").unwrap(),
        r#"[{"cmd":"+","args":[{"lit":"1","type":"number"},{"lit":"2","type":"number"}]}]"#
    );
}

#[test]
fn quoted_list_is_a_list_call() {
    assert_eq!(
        parse_one("'(1 2 3)"),
        Node::call(
            "list",
            vec![Node::number("1"), Node::number("2"), Node::number("3")]
        )
    );
}

#[test]
fn let_round_trips_through_text() {
    let node = parse_one("(let ((x 1)) (+ x 1))");

    assert_eq!(
        node,
        Node::Let {
            bindings: vec![Binding {
                name: "x".to_string(),
                value: Node::number("1"),
            }],
            body: vec![Node::call("+", vec![Node::symbol("x"), Node::number("1")])],
        }
    );
    assert_eq!(node.to_string(), "(let ((x 1)) (+ x 1))");
}

#[test]
fn defun_collects_name_params_and_body() {
    assert_eq!(
        parse_one("(defun square (x) (* x x))"),
        Node::Defun {
            name: "square".to_string(),
            params: vec!["x".to_string()],
            body: vec![Node::call("*", vec![Node::symbol("x"), Node::symbol("x")])],
        }
    );
}

#[test]
fn cond_collects_clauses() {
    assert_eq!(
        parse_one("(cond ((= x 0) \"zero\") (t \"nonzero\"))"),
        Node::Cond(vec![
            Clause {
                condition: Node::call("=", vec![Node::symbol("x"), Node::number("0")]),
                consequents: vec![Node::string("zero")],
            },
            Clause {
                condition: Node::symbol("t"),
                consequents: vec![Node::string("nonzero")],
            },
        ])
    );
}

#[test]
fn unclosed_call_is_missing_a_paren() {
    match parse("(+ 1 2") {
        Err(Error::MissingClosingParen(_)) => (),
        other => panic!("expected a missing paren, got {:?}", other),
    }
    match text_to_json("(+ 1 2") {
        Err(err) => assert!(err.is_incomplete()),
        Ok(json) => panic!("unclosed input converted to {}", json),
    }
}

#[test]
fn quoted_list_survives_json() {
    let json = text_to_json("'(1 2)").unwrap();

    assert_eq!(json_to_text(&json).unwrap(), "'(1 2)");
}

#[test]
fn documents_survive_json_and_reparsing() {
    let sources = [
        "(+ 1 2)",
        "'(1 2 3)",
        "(let ((x 1)) (+ x 1))",
        "(let ((a 1) (b 2)) (print a) (print b))",
        "(defun square (x) (* x x))",
        "(defun greet (name) (print \"hi\") (print name))",
        "(cond ((= x 0) \"zero\") (t \"nonzero\"))",
        "(mapcar #'(lambda (x) (* x 2)) '(1 2))",
        "(funcall #'((f) x))",
        "(f)\n(g 1.50)\n\"str\"",
    ];

    for source in sources.iter() {
        let original = parse(source).unwrap();
        let text = json_to_text(&text_to_json(source).unwrap()).unwrap();

        assert_eq!(parse(&text).unwrap(), original, "{} came back as {}", source, text);
        assert_eq!(render_document(&original), text);
    }
}

#[test]
fn defun_documents_decode() {
    let json = r#"[{"cmd":"defun","args":[{"var":"f"},{"args":[{"var":"a"},{"var":"b"}]},{"args":[{"cmd":"+","args":[{"var":"a"},{"var":"b"}]}]}]}]"#;

    assert_eq!(json_to_text(json).unwrap(), "(defun f (a b) (+ a b))");
}

#[test]
fn multiple_documents_join_with_newlines() {
    let json = r#"[{"cmd":"f"},{"var":"x"},{"lit":"s","type":"string"}]"#;

    assert_eq!(json_to_text(json).unwrap(), "(f)\nx\n\"s\"");
}

#[test]
fn hundred_level_nesting_round_trips() {
    let source = format!("{}x{}", "(f ".repeat(100), ")".repeat(100));
    let json = text_to_json(&source).unwrap();

    assert_eq!(json_to_text(&json).unwrap(), source);
}

#[test]
fn runaway_nesting_is_an_error() {
    let source = "(".repeat(50_000);

    match parse(&source) {
        Err(Error::NestingTooDeep(limit)) => assert_eq!(limit, MAX_DEPTH),
        other => panic!("expected a nesting error, got {:?}", other),
    }
    match text_to_json(&source) {
        Err(err) => assert!(!err.is_incomplete()),
        Ok(json) => panic!("runaway nesting converted to {}", json),
    }
}
