use std::fmt;

use lazy_static::lazy_static;
use log::trace;
use nom::{
    branch::alt,
    bytes::complete::{take_till, take_while, take_while1},
    character::complete::{char, one_of},
    combinator::{map, opt, recognize},
    error::{ErrorKind, ParseError},
    sequence::{preceded, tuple},
    IResult,
};
use regex::Regex;

const FUNCTION_PREFIX: &str = "(function ( ";
const FUNCTION_SUFFIX: &str = " ))";
const LIST_PREFIX: &str = "(list ";

lazy_static! {
    static ref FUNCTION_QUOTE: Regex = Regex::new(r"#'\(").unwrap();
    static ref QUOTED_LIST: Regex = Regex::new(r"'\(").unwrap();
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_open(&self) -> bool {
        self.0 == "("
    }

    pub fn is_close(&self) -> bool {
        self.0 == ")"
    }

    pub fn is_paren(&self) -> bool {
        self.is_open() || self.is_close()
    }
}

impl From<&str> for Token {
    fn from(text: &str) -> Self {
        Token(text.to_string())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_whitespace(ch: char) -> bool {
    ch == ' ' || ch == '\t' || ch == '\n' || ch == '\r'
}

fn is_atom_char(ch: char) -> bool {
    !(is_whitespace(ch) || ch == '(' || ch == ')' || ch == '"')
}

fn whitespace<'a, E: ParseError<&'a str>>(i: &'a str) -> IResult<&'a str, &'a str, E> {
    take_while(is_whitespace)(i)
}

fn paren<'a, E: ParseError<&'a str>>(i: &'a str) -> IResult<&'a str, Token, E> {
    map(recognize(one_of("()")), Token::from)(i)
}

// An unterminated string runs to the end of the input.
fn string_literal<'a, E: ParseError<&'a str>>(i: &'a str) -> IResult<&'a str, Token, E> {
    map(
        recognize(tuple((
            char('"'),
            take_till(|ch: char| ch == '"'),
            opt(char('"')),
        ))),
        Token::from,
    )(i)
}

fn atom<'a, E: ParseError<&'a str>>(i: &'a str) -> IResult<&'a str, Token, E> {
    map(take_while1(is_atom_char), Token::from)(i)
}

fn token<'a, E: ParseError<&'a str>>(i: &'a str) -> IResult<&'a str, Token, E> {
    preceded(whitespace, alt((paren, string_literal, atom)))(i)
}

/// Byte offset of the `)` closing a form whose `(` was just consumed.
fn matching_close(text: &str) -> Option<usize> {
    let mut depth = 1usize;

    for (index, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;

                if depth == 0 {
                    return Some(index);
                }
            }
            _ => (),
        }
    }

    None
}

/// Rewrites every balanced `#'( ... )` into `(function ( ... ))`.
///
/// Unbalanced shorthands are left as they are.
pub fn expand_function_quotes(source: &str) -> String {
    let mut text = source.to_string();
    let mut from = 0;

    while let Some(found) = FUNCTION_QUOTE.find_at(&text, from) {
        let start = found.start();
        let inner_start = found.end();

        match matching_close(&text[inner_start..]) {
            Some(offset) => {
                let close = inner_start + offset;
                let expanded = format!(
                    "{}{}{}",
                    FUNCTION_PREFIX,
                    &text[inner_start..close],
                    FUNCTION_SUFFIX
                );

                text.replace_range(start..=close, &expanded);
                from = start + FUNCTION_PREFIX.len();
            }
            None => {
                trace!("unbalanced function quote at byte {}", start);

                from = inner_start;
            }
        }
    }

    text
}

/// Rewrites every `'(` into `(list `, string contents included.
pub fn expand_quoted_lists(source: &str) -> String {
    QUOTED_LIST.replace_all(source, LIST_PREFIX).into_owned()
}

pub fn tokenize(source: &str) -> Vec<Token> {
    let expanded = expand_quoted_lists(&expand_function_quotes(source));
    let mut tokens = Vec::new();
    let mut rest = expanded.as_str();

    while let Ok((remaining, next)) = token::<(&str, ErrorKind)>(rest) {
        tokens.push(next);
        rest = remaining;
    }

    trace!("tokenized {} bytes into {} tokens", source.len(), tokens.len());

    tokens
}

/// Whether the last token of `source` is a string still waiting for its `"`.
pub fn has_open_string(source: &str) -> bool {
    tokenize(source).last().map_or(false, |token| {
        let text = token.as_str();

        text.starts_with('"') && (text.len() == 1 || !text.ends_with('"'))
    })
}

#[cfg(test)]
mod tests {
    use quickcheck::TestResult;

    use super::*;

    fn texts(source: &str) -> Vec<String> {
        tokenize(source)
            .into_iter()
            .map(|token| token.as_str().to_string())
            .collect()
    }

    #[test]
    fn parens_are_single_tokens() {
        assert_eq!(texts("(+ 1 2)"), vec!["(", "+", "1", "2", ")"]);
        assert_eq!(texts("((a))"), vec!["(", "(", "a", ")", ")"]);
    }

    #[test]
    fn whitespace_only_separates() {
        assert_eq!(texts(" a\tb\nc\r\n  "), vec!["a", "b", "c"]);
        assert!(texts("  \n\t").is_empty());
        assert!(texts("").is_empty());
    }

    #[test]
    fn strings_keep_their_quotes_and_spaces() {
        assert_eq!(
            texts("(print \"hello (world)\")"),
            vec!["(", "print", "\"hello (world)\"", ")"]
        );
    }

    #[test]
    fn quote_flushes_pending_atom() {
        assert_eq!(texts("abc\"def\"ghi"), vec!["abc", "\"def\"", "ghi"]);
    }

    #[test]
    fn unterminated_string_runs_to_end() {
        assert_eq!(texts("(a \"bc d"), vec!["(", "a", "\"bc d"]);
    }

    #[test]
    fn quoted_list_becomes_list_call() {
        assert_eq!(expand_quoted_lists("'(1 2 3)"), "(list 1 2 3)");
        assert_eq!(texts("'(1 '(2))"), vec!["(", "list", "1", "(", "list", "2", ")", ")"]);
    }

    #[test]
    fn quoted_list_rewrite_reaches_into_strings() {
        assert_eq!(expand_quoted_lists("\"it's '(x)\""), "\"it's (list x)\"");
    }

    #[test]
    fn function_quote_wraps_inner_text() {
        assert_eq!(
            expand_function_quotes("(mapcar #'(lambda (x) x) xs)"),
            "(mapcar (function ( lambda (x) x )) xs)"
        );
    }

    #[test]
    fn nested_function_quotes_expand() {
        assert_eq!(
            expand_function_quotes("#'(a #'(b))"),
            "(function ( a (function ( b )) ))"
        );
    }

    #[test]
    fn unbalanced_function_quote_is_left_alone() {
        assert_eq!(expand_function_quotes("#'(a (b)"), "#'(a (b)");
        assert_eq!(
            expand_function_quotes("#'(a #'(b)"),
            "#'(a (function ( b ))"
        );
    }

    #[test]
    fn function_quote_runs_before_quoted_list() {
        assert_eq!(
            texts("#'(f)"),
            vec!["(", "function", "(", "f", ")", ")"]
        );
    }

    #[test]
    fn function_quotes_expand_after_a_replacement() {
        assert_eq!(
            expand_function_quotes("(f #'(g) #'(h))"),
            "(f (function ( g )) (function ( h )))"
        );
    }

    #[test]
    fn open_strings_are_detected() {
        assert!(has_open_string("(print \""));
        assert!(has_open_string("(print \"hello"));
        assert!(!has_open_string("(print \"hello\")"));
        assert!(!has_open_string("(print \"\")"));
        assert!(!has_open_string("(print x"));
    }

    #[quickcheck]
    fn atoms_survive_tokenization(words: Vec<String>) -> TestResult {
        let atoms = words
            .into_iter()
            .filter(|word| !word.is_empty() && word.chars().all(is_atom_char))
            .collect::<Vec<_>>();

        if atoms.is_empty() {
            return TestResult::discard();
        }

        TestResult::from_bool(texts(&atoms.join(" ")) == atoms)
    }

    #[quickcheck]
    fn tokens_never_hold_unquoted_whitespace(text: String) -> bool {
        tokenize(&text).iter().all(|token| {
            token.as_str().starts_with('"') || !token.as_str().chars().any(is_whitespace)
        })
    }
}
