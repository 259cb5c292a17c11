use log::debug;

use crate::ast::{Binding, Clause, Node, MAX_DEPTH};
use crate::error::{Error, Result};
use crate::token::{tokenize, Token};

/// Remaining tokens paired with the parsed output, the way nom orders it.
pub type Parsed<'t, O> = Result<(&'t [Token], O)>;

fn is_string_literal(token: &str) -> bool {
    token.len() >= 2 && token.starts_with('"') && token.ends_with('"')
}

fn is_numeric_literal(token: &str) -> bool {
    token.parse::<f64>().is_ok()
}

fn literal(token: &Token) -> Node {
    let text = token.as_str();

    if is_string_literal(text) {
        Node::string(&text[1..text.len() - 1])
    } else if is_numeric_literal(text) {
        Node::number(text)
    } else {
        Node::symbol(text)
    }
}

/// Consumes a `)` or reports which construct was left open.
fn close_paren<'t>(tokens: &'t [Token], construct: &str) -> Parsed<'t, ()> {
    match tokens.split_first() {
        Some((token, rest)) if token.is_close() => Ok((rest, ())),
        Some(_) => Err(Error::malformed(format!(
            "expected ')' to close {}",
            construct
        ))),
        None => Err(Error::missing_paren(construct)),
    }
}

fn open_paren<'t>(tokens: &'t [Token], construct: &str) -> Parsed<'t, ()> {
    match tokens.split_first() {
        Some((token, rest)) if token.is_open() => Ok((rest, ())),
        Some((token, _)) => Err(Error::malformed(format!(
            "{} must start with '(', found '{}'",
            construct, token
        ))),
        None => Err(Error::missing_paren(construct)),
    }
}

/// A bare name: any token that is not a parenthesis.
fn name<'t>(tokens: &'t [Token], construct: &str) -> Parsed<'t, String> {
    match tokens.split_first() {
        Some((token, rest)) if !token.is_paren() => Ok((rest, token.as_str().to_string())),
        Some((token, _)) => Err(Error::malformed(format!(
            "{} must be a symbol, found '{}'",
            construct, token
        ))),
        None => Err(Error::missing_paren(construct)),
    }
}

/// Whether the form whose `(` was just consumed is closed somewhere in `tokens`.
fn is_closed(tokens: &[Token]) -> bool {
    let mut depth = 1usize;

    for token in tokens {
        if token.is_open() {
            depth += 1;
        } else if token.is_close() {
            depth -= 1;

            if depth == 0 {
                return true;
            }
        }
    }

    false
}

fn ensure_arity(tokens: &[Token], form: &str, minimum: usize) -> Result<()> {
    if tokens.len() >= minimum {
        Ok(())
    } else if is_closed(tokens) {
        Err(Error::malformed(format!(
            "{} expects at least {} tokens, got {}",
            form,
            minimum,
            tokens.len()
        )))
    } else {
        Err(Error::missing_paren(format!("{} expression", form)))
    }
}

/// Parses forms up to, but not including, the next `)`.
fn forms_until_close<'t>(mut tokens: &'t [Token], construct: &str) -> Parsed<'t, Vec<Node>> {
    let mut forms = Vec::new();

    loop {
        match tokens.first() {
            None => return Err(Error::missing_paren(construct)),
            Some(token) if token.is_close() => return Ok((tokens, forms)),
            Some(_) => {
                let (rest, node) = form(tokens)?;

                forms.push(node);
                tokens = rest;
            }
        }
    }
}

fn binding(tokens: &[Token]) -> Parsed<Binding> {
    let (tokens, _) = open_paren(tokens, "let binding")?;
    let (tokens, name) = name(tokens, "let binding name")?;

    match tokens.first() {
        None => return Err(Error::missing_paren("let binding")),
        Some(token) if token.is_close() => {
            return Err(Error::malformed(format!(
                "let binding '{}' has no value",
                name
            )))
        }
        Some(_) => (),
    }

    let (tokens, value) = form(tokens)?;
    let (tokens, _) = close_paren(tokens, "let binding")?;

    Ok((tokens, Binding { name, value }))
}

fn bindings(tokens: &[Token]) -> Parsed<Vec<Binding>> {
    let (mut tokens, _) = open_paren(tokens, "let bindings")?;
    let mut bindings = Vec::new();

    loop {
        match tokens.first() {
            None => return Err(Error::missing_paren("let bindings")),
            Some(token) if token.is_close() => return Ok((&tokens[1..], bindings)),
            Some(_) => {
                let (rest, binding) = binding(tokens)?;

                bindings.push(binding);
                tokens = rest;
            }
        }
    }
}

/// `let` through its closing paren; `tokens` starts at the keyword.
fn let_form(tokens: &[Token]) -> Parsed<Node> {
    ensure_arity(tokens, "let", 4)?;

    let (tokens, bindings) = bindings(&tokens[1..])?;
    let (tokens, body) = forms_until_close(tokens, "let expression")?;
    let (tokens, _) = close_paren(tokens, "let expression")?;

    Ok((tokens, Node::Let { bindings, body }))
}

fn params(tokens: &[Token]) -> Parsed<Vec<String>> {
    let (mut tokens, _) = open_paren(tokens, "defun argument list")?;
    let mut params = Vec::new();

    loop {
        match tokens.split_first() {
            None => return Err(Error::missing_paren("defun argument list")),
            Some((token, rest)) if token.is_close() => return Ok((rest, params)),
            Some((token, _)) if token.is_open() => {
                return Err(Error::malformed(
                    "defun arguments must be plain symbols",
                ))
            }
            Some((token, rest)) => {
                params.push(token.as_str().to_string());
                tokens = rest;
            }
        }
    }
}

/// `defun` through its closing paren; `tokens` starts at the keyword.
fn defun_form(tokens: &[Token]) -> Parsed<Node> {
    ensure_arity(tokens, "defun", 4)?;

    let (tokens, name) = name(&tokens[1..], "defun name")?;
    let (tokens, params) = params(tokens)?;
    let (tokens, body) = forms_until_close(tokens, "defun expression")?;
    let (tokens, _) = close_paren(tokens, "defun expression")?;

    Ok((tokens, Node::Defun { name, params, body }))
}

fn clause(tokens: &[Token]) -> Parsed<Clause> {
    let (tokens, _) = open_paren(tokens, "cond clause")?;

    match tokens.first() {
        None => return Err(Error::missing_paren("cond clause")),
        Some(token) if token.is_close() => {
            return Err(Error::malformed("cond clause has no condition"))
        }
        Some(_) => (),
    }

    let (tokens, condition) = form(tokens)?;
    let (tokens, consequents) = forms_until_close(tokens, "cond clause")?;
    let (tokens, _) = close_paren(tokens, "cond clause")?;

    Ok((
        tokens,
        Clause {
            condition,
            consequents,
        },
    ))
}

/// `cond` through its closing paren; `tokens` starts at the keyword.
fn cond_form(tokens: &[Token]) -> Parsed<Node> {
    ensure_arity(tokens, "cond", 2)?;

    let mut tokens = &tokens[1..];
    let mut clauses = Vec::new();

    loop {
        match tokens.first() {
            None => return Err(Error::missing_paren("cond expression")),
            Some(token) if token.is_close() => return Ok((&tokens[1..], Node::Cond(clauses))),
            Some(_) => {
                let (rest, clause) = clause(tokens)?;

                clauses.push(clause);
                tokens = rest;
            }
        }
    }
}

fn application(tokens: &[Token]) -> Parsed<Node> {
    let (tokens, mut forms) = forms_until_close(tokens, "list")?;
    let (tokens, _) = close_paren(tokens, "list")?;

    let node = match forms.first() {
        Some(Node::Symbol(command)) => {
            let command = command.clone();

            Node::call(command, forms.split_off(1)).into_function_ref()
        }
        _ => Node::Group(forms),
    };

    Ok((tokens, node))
}

/// Compound form; `tokens` starts right after its `(`.
fn compound(tokens: &[Token]) -> Parsed<Node> {
    match tokens.first().map(Token::as_str) {
        Some("let") => let_form(tokens),
        Some("defun") => defun_form(tokens),
        Some("cond") => cond_form(tokens),
        _ => application(tokens),
    }
}

fn form(tokens: &[Token]) -> Parsed<Node> {
    match tokens.split_first() {
        None => Err(Error::UnexpectedEndOfInput),
        Some((token, rest)) if token.is_open() => compound(rest),
        Some((token, _)) if token.is_close() => Err(Error::UnexpectedCloseParen),
        Some((token, rest)) => Ok((rest, literal(token))),
    }
}

/// Deepest parenthesis nesting reached anywhere in `tokens`.
fn nesting(tokens: &[Token]) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0;

    for token in tokens {
        if token.is_open() {
            depth += 1;
            deepest = deepest.max(depth);
        } else if token.is_close() {
            depth = depth.saturating_sub(1);
        }
    }

    deepest
}

// Checked up front so recursion below stays bounded by MAX_DEPTH.
fn ensure_depth(tokens: &[Token]) -> Result<()> {
    if nesting(tokens) > MAX_DEPTH {
        Err(Error::NestingTooDeep(MAX_DEPTH))
    } else {
        Ok(())
    }
}

/// Parses one form from the front of `tokens`.
pub fn parse_form(tokens: &[Token]) -> Parsed<Node> {
    ensure_depth(tokens)?;
    form(tokens)
}

pub fn parse_document(mut tokens: &[Token]) -> Result<Vec<Node>> {
    ensure_depth(tokens)?;

    let mut nodes = Vec::new();

    while !tokens.is_empty() {
        let (rest, node) = form(tokens)?;

        nodes.push(node);
        tokens = rest;
    }

    debug!("parsed {} top-level forms", nodes.len());

    Ok(nodes)
}

pub fn parse(source: &str) -> Result<Vec<Node>> {
    parse_document(&tokenize(source))
}
