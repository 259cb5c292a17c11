use std::fmt;

use crate::ast::{Binding, Clause, LiteralKind, Node};

fn write_joined(f: &mut fmt::Formatter<'_>, nodes: &[Node]) -> fmt::Result {
    for (index, node) in nodes.iter().enumerate() {
        if index > 0 {
            f.write_str(" ")?;
        }

        write!(f, "{}", node)?;
    }

    Ok(())
}

/// Writes each form with a leading space, for bodies trailing a header.
fn write_body(f: &mut fmt::Formatter<'_>, nodes: &[Node]) -> fmt::Result {
    for node in nodes {
        write!(f, " {}", node)?;
    }

    Ok(())
}

fn write_call(f: &mut fmt::Formatter<'_>, command: &str, args: &[Node]) -> fmt::Result {
    write!(f, "({}", command)?;
    write_body(f, args)?;
    f.write_str(")")
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {})", self.name, self.value)
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.condition)?;
        write_body(f, &self.consequents)?;
        f.write_str(")")
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Symbol(name) => f.write_str(name),
            Node::Literal {
                value,
                kind: LiteralKind::String,
            } => write!(f, "\"{}\"", value),
            Node::Literal {
                value,
                kind: LiteralKind::Number,
            } => f.write_str(value),
            Node::QuotedList(elements) => {
                f.write_str("'(")?;
                write_joined(f, elements)?;
                f.write_str(")")
            }
            Node::Call { command, args } if command == "list" => {
                f.write_str("'(")?;
                write_joined(f, args)?;
                f.write_str(")")
            }
            Node::Call { command, args } => write_call(f, command, args),
            // The target is written without sugar so the shorthand stays
            // one balanced `#'( ... )` span.
            Node::FunctionRef(target) => match target.as_ref() {
                Node::Group(elements) => {
                    f.write_str("#'(")?;
                    write_joined(f, elements)?;
                    f.write_str(")")
                }
                Node::Call { command, args } => {
                    f.write_str("#'")?;
                    write_call(f, command, args)
                }
                target => write!(f, "#'{}", target),
            },
            Node::Let { bindings, body } => {
                f.write_str("(let (")?;
                for (index, binding) in bindings.iter().enumerate() {
                    if index > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", binding)?;
                }
                f.write_str(")")?;
                write_body(f, body)?;
                f.write_str(")")
            }
            Node::Defun { name, params, body } => {
                write!(f, "(defun {} ({})", name, params.join(" "))?;
                write_body(f, body)?;
                f.write_str(")")
            }
            Node::Cond(clauses) => {
                f.write_str("(cond")?;
                for clause in clauses {
                    write!(f, " {}", clause)?;
                }
                f.write_str(")")
            }
            Node::Group(elements) => write_joined(f, elements),
        }
    }
}

pub fn to_lisp(node: &Node) -> String {
    node.to_string()
}

pub fn render_document(nodes: &[Node]) -> String {
    nodes
        .iter()
        .map(to_lisp)
        .collect::<Vec<String>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use crate::parser::parse;

    use super::*;

    fn reprint(source: &str) -> String {
        render_document(&parse(source).unwrap())
    }

    #[test]
    fn atoms_print_as_written() {
        assert_eq!(reprint("foo 12 1.50 \"a b\""), "foo\n12\n1.50\n\"a b\"");
    }

    #[test]
    fn calls_print_with_and_without_args() {
        assert_eq!(reprint("(f)"), "(f)");
        assert_eq!(reprint("(  +   1\n 2 )"), "(+ 1 2)");
    }

    #[test]
    fn list_calls_print_as_quoted_lists() {
        assert_eq!(reprint("'(1 2)"), "'(1 2)");
        assert_eq!(reprint("(list a '())"), "'(a '())");
        assert_eq!(
            Node::QuotedList(vec![Node::symbol("a"), Node::number("1")]).to_string(),
            "'(a 1)"
        );
    }

    #[test]
    fn function_refs_print_as_shorthand() {
        assert_eq!(reprint("#'(lambda (x) x)"), "#'(lambda (x) x)");
        assert_eq!(reprint("#'(list 1)"), "#'(list 1)");
        assert_eq!(reprint("#'()"), "#'()");
        assert_eq!(reprint("#'((f) x)"), "#'((f) x)");
        assert_eq!(
            Node::FunctionRef(Box::new(Node::symbol("car"))).to_string(),
            "#'car"
        );
    }

    #[test]
    fn special_forms_print_every_body_form() {
        assert_eq!(reprint("(let ((x 1)) (+ x 1))"), "(let ((x 1)) (+ x 1))");
        assert_eq!(
            reprint("(let ((a 1) (b 2))\n  (print a)\n  (print b))"),
            "(let ((a 1) (b 2)) (print a) (print b))"
        );
        assert_eq!(reprint("(let ())"), "(let ())");
        assert_eq!(
            reprint("(defun square (x) (* x x))"),
            "(defun square (x) (* x x))"
        );
        assert_eq!(reprint("(defun nop ())"), "(defun nop ())");
    }

    #[test]
    fn cond_prints_each_clause() {
        assert_eq!(
            reprint("(cond ((= x 0) \"zero\") (t \"nonzero\"))"),
            "(cond ((= x 0) \"zero\") (t \"nonzero\"))"
        );
        assert_eq!(reprint("(cond ((done)))"), "(cond ((done)))");
        assert_eq!(reprint("(cond)"), "(cond)");
    }

    #[test]
    fn groups_print_as_bare_sequences() {
        assert_eq!(reprint("()"), "");
        assert_eq!(reprint("((f) 1)"), "(f) 1");
    }
}
