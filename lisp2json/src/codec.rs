//! JSON mapping of the AST.
//!
//! Every node travels as one object with optional `cmd`, `args`, `lit`,
//! `type` and `var` members. Absent members are omitted, never `null`:
//!
//! - `{"var":"x"}` is a symbol
//! - `{"lit":"1","type":"number"}` is a literal
//! - `{"cmd":"+","args":[...]}` is a call or a special form
//! - `{"args":[...]}` is a bare group, `{}` an empty one
//!
//! Both directions refuse documents nested deeper than [`MAX_DEPTH`].

use log::debug;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::ast::{Binding, Clause, LiteralKind, Node, MAX_DEPTH};
use crate::error::{Error, Result};
use crate::parser::parse;
use crate::printer::render_document;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct WireNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cmd: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    args: Vec<WireNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lit: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    var: Option<String>,
}

type Shape<T> = std::result::Result<T, String>;

impl WireNode {
    fn command(cmd: &str, args: Vec<WireNode>) -> WireNode {
        WireNode {
            cmd: Some(cmd.to_string()),
            args,
            ..WireNode::default()
        }
    }

    fn group(args: Vec<WireNode>) -> WireNode {
        WireNode {
            args,
            ..WireNode::default()
        }
    }

    fn var(name: &str, args: Vec<WireNode>) -> WireNode {
        WireNode {
            var: Some(name.to_string()),
            args,
            ..WireNode::default()
        }
    }

    fn is_group(&self) -> bool {
        self.cmd.is_none() && self.lit.is_none() && self.kind.is_none() && self.var.is_none()
    }

    fn into_group(self, construct: &str) -> Shape<Vec<WireNode>> {
        if self.is_group() {
            Ok(self.args)
        } else {
            Err(format!("{} must be an object holding only args", construct))
        }
    }

    fn into_name(self, construct: &str) -> Shape<String> {
        match self {
            WireNode {
                var: Some(name),
                cmd: None,
                lit: None,
                kind: None,
                args,
            } if args.is_empty() => Ok(name),
            _ => Err(format!("{} must be an object holding only var", construct)),
        }
    }

    fn into_binding(self) -> Shape<Binding> {
        match self {
            WireNode {
                var: Some(name),
                cmd: None,
                lit: None,
                kind: None,
                mut args,
            } if args.len() == 1 => Ok(Binding {
                name,
                value: args.remove(0).into_node()?,
            }),
            _ => Err("let binding must hold var and a single-value args".to_string()),
        }
    }

    fn into_clause(self) -> Shape<Clause> {
        let mut parts = self.into_group("cond clause")?.into_iter();
        let condition = parts
            .next()
            .ok_or_else(|| "cond clause has no condition".to_string())?
            .into_node()?;

        Ok(Clause {
            condition,
            consequents: decode_all(parts)?,
        })
    }

    fn into_node(self) -> Shape<Node> {
        match self {
            WireNode {
                lit: Some(value),
                kind,
                cmd: None,
                var: None,
                args,
            } if args.is_empty() => {
                let kind = match kind.as_deref() {
                    Some("string") if value.contains('"') => {
                        return Err(format!("string literal '{}' contains a quote", value))
                    }
                    Some("string") => LiteralKind::String,
                    Some("number") => LiteralKind::Number,
                    Some(other) => return Err(format!("unknown literal type '{}'", other)),
                    None => return Err(format!("literal '{}' has no type", value)),
                };

                Ok(Node::Literal { value, kind })
            }
            WireNode { lit: Some(_), .. } => {
                Err("lit cannot be combined with cmd, var or args".to_string())
            }
            WireNode { kind: Some(_), .. } => Err("type is only allowed alongside lit".to_string()),
            WireNode {
                var: Some(name),
                cmd: None,
                args,
                ..
            } => {
                if args.is_empty() {
                    Ok(Node::Symbol(name))
                } else {
                    Err(format!("var '{}' with args is only valid as a let binding", name))
                }
            }
            WireNode { var: Some(_), .. } => Err("var cannot be combined with cmd".to_string()),
            WireNode {
                cmd: Some(cmd),
                args,
                ..
            } => decode_command(cmd, args),
            WireNode { args, .. } => Ok(Node::Group(decode_all(args)?)),
        }
    }
}

fn decode_all(nodes: impl IntoIterator<Item = WireNode>) -> Shape<Vec<Node>> {
    nodes.into_iter().map(WireNode::into_node).collect()
}

fn decode_command(cmd: String, args: Vec<WireNode>) -> Shape<Node> {
    match cmd.as_str() {
        "" => Err("cmd must not be empty".to_string()),
        "let" => {
            let mut args = args.into_iter();
            let bindings = args
                .next()
                .ok_or_else(|| "let needs a bindings object".to_string())?
                .into_group("let bindings")?
                .into_iter()
                .map(WireNode::into_binding)
                .collect::<Shape<Vec<_>>>()?;

            Ok(Node::Let {
                bindings,
                body: decode_all(args)?,
            })
        }
        "defun" => {
            if args.len() != 3 {
                return Err(format!(
                    "defun needs name, arguments and body, got {} args",
                    args.len()
                ));
            }

            let mut args = args.into_iter();
            let (name, params, body) = match (args.next(), args.next(), args.next()) {
                (Some(name), Some(params), Some(body)) => (name, params, body),
                _ => return Err("defun needs name, arguments and body".to_string()),
            };

            Ok(Node::Defun {
                name: name.into_name("defun name")?,
                params: params
                    .into_group("defun arguments")?
                    .into_iter()
                    .map(|param| param.into_name("defun argument"))
                    .collect::<Shape<Vec<_>>>()?,
                body: decode_all(body.into_group("defun body")?)?,
            })
        }
        "cond" => Ok(Node::Cond(
            args.into_iter()
                .map(WireNode::into_clause)
                .collect::<Shape<Vec<_>>>()?,
        )),
        _ => Ok(Node::call(cmd, decode_all(args)?).into_function_ref()),
    }
}

fn encode_all(nodes: &[Node]) -> Vec<WireNode> {
    nodes.iter().map(WireNode::from).collect()
}

impl From<&Node> for WireNode {
    fn from(node: &Node) -> Self {
        match node {
            Node::Symbol(name) => WireNode::var(name, Vec::new()),
            Node::Literal { value, kind } => WireNode {
                lit: Some(value.clone()),
                kind: Some(kind.as_str().to_string()),
                ..WireNode::default()
            },
            Node::Call { command, args } => WireNode::command(command, encode_all(args)),
            Node::QuotedList(elements) => WireNode::command("list", encode_all(elements)),
            Node::FunctionRef(target) => {
                WireNode::command("function", vec![WireNode::from(target.as_ref())])
            }
            Node::Let { bindings, body } => {
                let mut args = vec![WireNode::group(
                    bindings
                        .iter()
                        .map(|binding| {
                            WireNode::var(&binding.name, vec![WireNode::from(&binding.value)])
                        })
                        .collect(),
                )];
                args.extend(body.iter().map(WireNode::from));

                WireNode::command("let", args)
            }
            Node::Defun { name, params, body } => WireNode::command(
                "defun",
                vec![
                    WireNode::var(name, Vec::new()),
                    WireNode::group(
                        params
                            .iter()
                            .map(|param| WireNode::var(param, Vec::new()))
                            .collect(),
                    ),
                    WireNode::group(encode_all(body)),
                ],
            ),
            Node::Cond(clauses) => WireNode::command(
                "cond",
                clauses
                    .iter()
                    .map(|clause| {
                        let mut parts = vec![WireNode::from(&clause.condition)];
                        parts.extend(clause.consequents.iter().map(WireNode::from));

                        WireNode::group(parts)
                    })
                    .collect(),
            ),
            Node::Group(elements) => WireNode::group(encode_all(elements)),
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        WireNode::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        WireNode::deserialize(deserializer)?
            .into_node()
            .map_err(de::Error::custom)
    }
}

// Deepest JSON nesting a node within MAX_DEPTH can encode to: a defun body
// sits two objects below its defun, plus the outer array.
const MAX_JSON_DEPTH: usize = 4 * MAX_DEPTH + 2;

fn ensure_depth(nodes: &[Node]) -> Result<()> {
    if nodes.iter().any(|node| node.depth() > MAX_DEPTH) {
        Err(Error::NestingTooDeep(MAX_DEPTH))
    } else {
        Ok(())
    }
}

/// Deepest array or object nesting in `source`, skipping string contents.
fn json_nesting(source: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0;
    let mut in_string = false;
    let mut escaped = false;

    for c in source.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => (),
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '[' | '{' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            ']' | '}' => depth = depth.saturating_sub(1),
            _ => (),
        }
    }

    deepest
}

pub fn to_json(nodes: &[Node]) -> Result<String> {
    ensure_depth(nodes)?;

    serde_json::to_string(nodes).map_err(Error::EncodeError)
}

pub fn to_json_pretty(nodes: &[Node]) -> Result<String> {
    ensure_depth(nodes)?;

    serde_json::to_string_pretty(nodes).map_err(Error::EncodeError)
}

/// Decodes a document; `null` is read as an empty one.
pub fn from_json(source: &str) -> Result<Vec<Node>> {
    // The pre-scan bounds recursion once serde_json's own limit is off.
    if json_nesting(source) > MAX_JSON_DEPTH {
        return Err(Error::NestingTooDeep(MAX_DEPTH));
    }

    let mut deserializer = serde_json::Deserializer::from_str(source);
    deserializer.disable_recursion_limit();

    let nodes: Option<Vec<Node>> =
        Deserialize::deserialize(&mut deserializer).map_err(Error::DecodeError)?;
    deserializer.end().map_err(Error::DecodeError)?;

    let nodes = nodes.unwrap_or_default();
    ensure_depth(&nodes)?;

    debug!("decoded {} top-level nodes", nodes.len());

    Ok(nodes)
}

pub fn text_to_json(source: &str) -> Result<String> {
    to_json(&parse(source)?)
}

pub fn text_to_json_pretty(source: &str) -> Result<String> {
    to_json_pretty(&parse(source)?)
}

pub fn json_to_text(source: &str) -> Result<String> {
    Ok(render_document(&from_json(source)?))
}
