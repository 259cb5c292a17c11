/// Deepest parenthesis nesting accepted by the parser and the JSON codec.
pub const MAX_DEPTH: usize = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiteralKind {
    String,
    Number,
}

impl LiteralKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LiteralKind::String => "string",
            LiteralKind::Number => "number",
        }
    }
}

/// One `(name value)` pair of a `let`.
#[derive(Clone, Debug, PartialEq)]
pub struct Binding {
    pub name: String,
    pub value: Node,
}

/// One `(condition consequent...)` clause of a `cond`.
#[derive(Clone, Debug, PartialEq)]
pub struct Clause {
    pub condition: Node,
    pub consequents: Vec<Node>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Symbol(String),
    Literal {
        value: String,
        kind: LiteralKind,
    },
    Call {
        command: String,
        args: Vec<Node>,
    },
    QuotedList(Vec<Node>),
    FunctionRef(Box<Node>),
    Let {
        bindings: Vec<Binding>,
        body: Vec<Node>,
    },
    Defun {
        name: String,
        params: Vec<String>,
        body: Vec<Node>,
    },
    Cond(Vec<Clause>),
    Group(Vec<Node>),
}

impl Node {
    pub fn symbol(name: impl Into<String>) -> Node {
        Node::Symbol(name.into())
    }

    pub fn string(value: impl Into<String>) -> Node {
        Node::Literal {
            value: value.into(),
            kind: LiteralKind::String,
        }
    }

    pub fn number(value: impl Into<String>) -> Node {
        Node::Literal {
            value: value.into(),
            kind: LiteralKind::Number,
        }
    }

    pub fn call(command: impl Into<String>, args: Vec<Node>) -> Node {
        Node::Call {
            command: command.into(),
            args,
        }
    }

    /// Parenthesis nesting of the form once tokenized, `0` for atoms.
    ///
    /// Matches the token nesting for parsed nodes and bounds the nesting
    /// of their printed text.
    pub fn depth(&self) -> usize {
        fn deepest<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> usize {
            nodes.into_iter().map(Node::depth).max().unwrap_or(0)
        }

        match self {
            Node::Symbol(_) | Node::Literal { .. } => 0,
            Node::Call { args: nodes, .. } | Node::QuotedList(nodes) | Node::Group(nodes) => {
                1 + deepest(nodes)
            }
            Node::FunctionRef(target) => 1 + target.depth(),
            Node::Let { bindings, body } => {
                let bindings = bindings
                    .iter()
                    .map(|binding| 2 + binding.value.depth())
                    .max()
                    .unwrap_or(1);

                1 + bindings.max(deepest(body))
            }
            Node::Defun { body, .. } => 1 + deepest(body).max(1),
            Node::Cond(clauses) => {
                1 + clauses
                    .iter()
                    .map(|clause| {
                        1 + clause
                            .condition
                            .depth()
                            .max(deepest(&clause.consequents))
                    })
                    .max()
                    .unwrap_or(0)
            }
        }
    }

    /// Canonicalizes `(function <form>)` into a function reference.
    ///
    /// Only parenthesized targets are retagged, since that is the only
    /// shape the `#'(` shorthand can produce.
    pub fn into_function_ref(self) -> Node {
        match self {
            Node::Call { command, mut args }
                if command == "function"
                    && args.len() == 1
                    && matches!(args[0], Node::Call { .. } | Node::Group(_)) =>
            {
                Node::FunctionRef(Box::new(args.remove(0)))
            }
            node => node,
        }
    }
}
