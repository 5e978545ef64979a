//! Call-site classification over the PHP syntax tree.
//!
//! A [`CallSite`] is the flattened view detectors work with: the call kind,
//! the callee name, the receiver shape and the argument list with literal
//! strings and literal option-map keys already resolved. Anything that is
//! not a plain literal is classified as `Other` and never guessed at.

use phf::phf_set;
use tree_sitter::Node;

use crate::parser::{line_of, ParsedFile};

/// HTTP verbs recognised as the first argument of a `request()` call.
static HTTP_VERBS: phf::Set<&'static str> = phf_set! {
    "GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS",
};

/// Check whether `value`, upper-cased, is a standard HTTP verb.
pub fn is_http_verb(value: &str) -> bool {
    HTTP_VERBS.contains(value.to_uppercase().as_str())
}

/// Free function call or method call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Function,
    Method,
}

/// The expression a method is invoked on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    /// A bare variable; holds the name without the leading `$`.
    Variable(String),
    /// A static call such as `HttpClient::create()`.
    StaticCall { class: String },
    /// Property fetches, nested calls, `new` expressions, dynamic names.
    Other,
}

/// The value passed in one argument slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentValue {
    /// A quoted string without interpolation.
    Literal(String),
    /// An array literal. Only keys that are literal strings are kept.
    OptionMap(Vec<String>),
    Other,
}

/// One argument of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    /// Set for PHP 8 named arguments (`timeout: 5`).
    pub name: Option<String>,
    pub value: ArgumentValue,
}

impl Argument {
    pub fn is_positional(&self) -> bool {
        self.name.is_none()
    }
}

/// A function or method invocation at a specific line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub kind: CallKind,
    /// Callee name as written, without a leading namespace separator.
    pub name: String,
    /// `None` for free functions.
    pub receiver: Option<Receiver>,
    pub arguments: Vec<Argument>,
    /// 1-based line the call expression starts on.
    pub line: usize,
}

impl CallSite {
    /// Classify `node` as a call site. Returns `None` for every other node,
    /// and for calls whose callee name is computed at runtime.
    pub fn from_node(node: Node<'_>, file: &ParsedFile) -> Option<Self> {
        match node.kind() {
            "function_call_expression" => Self::function_call(node, file),
            "member_call_expression" | "nullsafe_member_call_expression" => {
                Self::method_call(node, file)
            }
            _ => None,
        }
    }

    fn function_call(node: Node<'_>, file: &ParsedFile) -> Option<Self> {
        let callee = node.child_by_field_name("function")?;
        if !matches!(callee.kind(), "name" | "qualified_name") {
            return None;
        }

        Some(Self {
            kind: CallKind::Function,
            name: file.node_text(callee).trim_start_matches('\\').to_string(),
            receiver: None,
            arguments: parse_arguments(node, file),
            line: line_of(node),
        })
    }

    fn method_call(node: Node<'_>, file: &ParsedFile) -> Option<Self> {
        let name = node.child_by_field_name("name")?;
        if name.kind() != "name" {
            return None;
        }

        let receiver = node
            .child_by_field_name("object")
            .map(|object| classify_receiver(object, file))
            .unwrap_or(Receiver::Other);

        Some(Self {
            kind: CallKind::Method,
            name: file.node_text(name).to_string(),
            receiver: Some(receiver),
            arguments: parse_arguments(node, file),
            line: line_of(node),
        })
    }

    /// Free function call named `name`.
    pub fn is_function(&self, name: &str) -> bool {
        self.kind == CallKind::Function && self.name == name
    }

    /// Method call named `name`, on any receiver.
    pub fn is_method(&self, name: &str) -> bool {
        self.kind == CallKind::Method && self.name == name
    }

    /// Receiver variable name, when the receiver is a bare variable.
    pub fn receiver_variable(&self) -> Option<&str> {
        match &self.receiver {
            Some(Receiver::Variable(name)) => Some(name),
            _ => None,
        }
    }

    /// Class name of the receiver, when the receiver is a static call.
    pub fn receiver_static_class(&self) -> Option<&str> {
        match &self.receiver {
            Some(Receiver::StaticCall { class }) => Some(class),
            _ => None,
        }
    }

    /// First argument, if it is positional and a literal string.
    pub fn first_positional_literal(&self) -> Option<&str> {
        let first = self.arguments.first()?;
        if !first.is_positional() {
            return None;
        }
        match &first.value {
            ArgumentValue::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// Whether any argument is an option map holding the literal key `key`.
    pub fn has_option_key(&self, key: &str) -> bool {
        self.arguments.iter().any(|arg| match &arg.value {
            ArgumentValue::OptionMap(keys) => keys.iter().any(|k| k == key),
            _ => false,
        })
    }
}

fn classify_receiver(node: Node<'_>, file: &ParsedFile) -> Receiver {
    match node.kind() {
        "variable_name" => {
            Receiver::Variable(file.node_text(node).trim_start_matches('$').to_string())
        }
        "scoped_call_expression" => {
            let scope = node.child_by_field_name("scope");
            let name = node.child_by_field_name("name");
            match (scope, name) {
                (Some(scope), Some(name))
                    if matches!(scope.kind(), "name" | "qualified_name" | "relative_scope")
                        && name.kind() == "name" =>
                {
                    Receiver::StaticCall {
                        class: file.node_text(scope).trim_start_matches('\\').to_string(),
                    }
                }
                _ => Receiver::Other,
            }
        }
        _ => Receiver::Other,
    }
}

fn parse_arguments(call: Node<'_>, file: &ParsedFile) -> Vec<Argument> {
    let Some(arguments) = call.child_by_field_name("arguments") else {
        return Vec::new();
    };

    let mut cursor = arguments.walk();
    let nodes: Vec<Node> = arguments
        .named_children(&mut cursor)
        .filter(|n| n.kind() == "argument")
        .collect();

    nodes.into_iter().map(|n| parse_argument(n, file)).collect()
}

fn parse_argument(node: Node<'_>, file: &ParsedFile) -> Argument {
    let name_node = node.child_by_field_name("name");
    let name_id = name_node.map(|n| n.id());

    let mut cursor = node.walk();
    let value_node = node
        .named_children(&mut cursor)
        .filter(|n| Some(n.id()) != name_id && n.kind() != "reference_modifier")
        .last();

    let value = match value_node {
        Some(v) => classify_value(v, file),
        None => ArgumentValue::Other,
    };

    Argument {
        name: name_node.map(|n| file.node_text(n).to_string()),
        value,
    }
}

fn classify_value(node: Node<'_>, file: &ParsedFile) -> ArgumentValue {
    match node.kind() {
        "string" | "encapsed_string" => match string_literal(node, file) {
            Some(value) => ArgumentValue::Literal(value),
            None => ArgumentValue::Other,
        },
        "array_creation_expression" => ArgumentValue::OptionMap(option_keys(node, file)),
        _ => ArgumentValue::Other,
    }
}

/// Literal string keys of an array literal, in source order.
fn option_keys(array: Node<'_>, file: &ParsedFile) -> Vec<String> {
    let mut cursor = array.walk();
    let items: Vec<Node> = array
        .named_children(&mut cursor)
        .filter(|n| n.kind() == "array_element_initializer")
        .collect();

    items
        .into_iter()
        .filter_map(|item| element_key(item, file))
        .collect()
}

/// Key of a `key => value` element, if the key is a literal string.
fn element_key(item: Node<'_>, file: &ParsedFile) -> Option<String> {
    let mut cursor = item.walk();
    let children: Vec<Node> = item.children(&mut cursor).collect();

    let arrow = children.iter().position(|c| c.kind() == "=>")?;
    let key = children[..arrow].iter().rev().find(|c| c.is_named())?;

    match key.kind() {
        "string" | "encapsed_string" => string_literal(*key, file),
        _ => None,
    }
}

/// Decode a single- or double-quoted string that has no interpolation.
fn string_literal(node: Node<'_>, file: &ParsedFile) -> Option<String> {
    let mut cursor = node.walk();
    let interpolated = node.named_children(&mut cursor).any(|c| {
        !matches!(
            c.kind(),
            "string_content" | "string_value" | "string" | "escape_sequence"
        )
    });
    if interpolated {
        return None;
    }

    let text = file.node_text(node);
    let text = text
        .strip_prefix(|c: char| c == 'b' || c == 'B')
        .unwrap_or(text);

    let quote = text.chars().next()?;
    if !matches!(quote, '\'' | '"') || text.len() < 2 || !text.ends_with(quote) {
        return None;
    }
    let inner = &text[1..text.len() - 1];

    Some(if quote == '\'' {
        unescape_single(inner)
    } else {
        unescape_double(inner)
    })
}

fn unescape_single(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '\\' || next == '\'' {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Decode a double-quoted string body. `\x`, `\u{}` and octal escapes yield
/// raw bytes, which may not form valid UTF-8 on their own.
fn unescape_double(inner: &str) -> String {
    let mut out: Vec<u8> = Vec::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            push_char(&mut out, c);
            continue;
        }
        let Some(&next) = chars.peek() else {
            out.push(b'\\');
            continue;
        };
        let simple = match next {
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            'v' => Some('\u{0b}'),
            'e' => Some('\u{1b}'),
            'f' => Some('\u{0c}'),
            '\\' => Some('\\'),
            '$' => Some('$'),
            '"' => Some('"'),
            _ => None,
        };
        if let Some(d) = simple {
            chars.next();
            push_char(&mut out, d);
            continue;
        }

        match next {
            'x' => {
                let mut ahead = chars.clone();
                ahead.next();
                let digits = take_digits(&mut ahead, 16, 2);
                match u32::from_str_radix(&digits, 16) {
                    Ok(value) if !digits.is_empty() => {
                        chars = ahead;
                        out.push(value as u8);
                    }
                    _ => out.push(b'\\'),
                }
            }
            'u' => {
                let mut ahead = chars.clone();
                ahead.next();
                let decoded = if ahead.next_if_eq(&'{').is_some() {
                    let digits = take_digits(&mut ahead, 16, 6);
                    if ahead.next_if_eq(&'}').is_some() {
                        u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32)
                    } else {
                        None
                    }
                } else {
                    None
                };
                match decoded {
                    Some(d) => {
                        chars = ahead;
                        push_char(&mut out, d);
                    }
                    None => out.push(b'\\'),
                }
            }
            '0'..='7' => {
                let digits = take_digits(&mut chars, 8, 3);
                let value = u32::from_str_radix(&digits, 8).unwrap_or(0);
                out.push((value & 0xff) as u8);
            }
            _ => out.push(b'\\'),
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

/// Consume up to `max` digits in `radix`.
fn take_digits<I>(chars: &mut std::iter::Peekable<I>, radix: u32, max: usize) -> String
where
    I: Iterator<Item = char>,
{
    let mut digits = String::new();
    while digits.len() < max {
        match chars.next_if(|c| c.is_digit(radix)) {
            Some(d) => digits.push(d),
            None => break,
        }
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::walk::preorder;
    use crate::parser::PhpParser;

    fn call_sites(code: &str) -> Vec<CallSite> {
        let parsed = PhpParser::new()
            .parse("test.php", code.as_bytes().to_vec())
            .unwrap();
        let mut calls = Vec::new();
        preorder(&parsed, |node| {
            if let Some(call) = CallSite::from_node(node, &parsed) {
                calls.push(call);
            }
        });
        calls
    }

    #[test]
    fn test_function_call() {
        let calls = call_sites("<?php\n\\curl_exec($ch);\n");
        assert_eq!(calls.len(), 1);
        assert!(calls[0].is_function("curl_exec"));
        assert_eq!(calls[0].receiver, None);
        assert_eq!(calls[0].line, 2);
    }

    #[test]
    fn test_method_call_on_variable() {
        let calls = call_sites("<?php\n$client->get('https://x', ['timeout' => 10]);\n");
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert!(call.is_method("get"));
        assert_eq!(call.receiver_variable(), Some("client"));
        assert_eq!(call.first_positional_literal(), Some("https://x"));
        assert!(call.has_option_key("timeout"));
        assert!(!call.has_option_key("connect_timeout"));
    }

    #[test]
    fn test_static_factory_receiver() {
        let calls = call_sites("<?php\nHttpClient::create()->request('GET', $url);\n");
        // Static calls are not call sites of their own, only receivers.
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].receiver_static_class(), Some("HttpClient"));
        assert_eq!(
            calls[0].receiver,
            Some(Receiver::StaticCall {
                class: "HttpClient".to_string(),
            })
        );
    }

    #[test]
    fn test_property_receiver_is_other() {
        let calls = call_sites("<?php\n$this->client->get($url);\n");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].receiver, Some(Receiver::Other));
        assert_eq!(calls[0].receiver_variable(), None);
    }

    #[test]
    fn test_interpolated_string_is_not_literal() {
        let calls = call_sites("<?php\n$client->request(\"$verb\", $url);\n");
        assert_eq!(calls[0].first_positional_literal(), None);

        let calls = call_sites("<?php\n$client->request(\"post\", $url);\n");
        assert_eq!(calls[0].first_positional_literal(), Some("post"));
    }

    #[test]
    fn test_only_literal_keys_are_collected() {
        let calls =
            call_sites("<?php\n$client->get($url, [$key => 1, 'headers' => [], 'verify']);\n");
        assert_eq!(
            calls[0].arguments[1].value,
            ArgumentValue::OptionMap(vec!["headers".to_string()])
        );
    }

    #[test]
    fn test_http_verb_is_case_insensitive() {
        assert!(is_http_verb("get"));
        assert!(is_http_verb("Options"));
        assert!(!is_http_verb("FETCH"));
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape_single(r"it\'s \\ \n"), r"it's \ \n");
        assert_eq!(unescape_double(r#"a\tb\"c\q"#), "a\tb\"c\\q");
    }

    #[test]
    fn test_unescape_numeric_escapes() {
        assert_eq!(unescape_double(r"\x74imeout"), "timeout");
        assert_eq!(unescape_double(r"\u{74}imeout"), "timeout");
        assert_eq!(unescape_double(r"\164imeout"), "timeout");
        assert_eq!(unescape_double(r"\xzz \u74"), r"\xzz \u74");
    }

    #[test]
    fn test_escaped_option_key_is_decoded() {
        let calls = call_sites("<?php\n$client->get($url, [\"\\x74imeout\" => 5]);\n");
        assert!(calls[0].has_option_key("timeout"));
    }

    #[test]
    fn test_named_first_argument_is_not_positional() {
        let calls = call_sites("<?php\n$httpClient->request(method: 'GET', url: $u);\n");
        assert_eq!(calls[0].arguments[0].name.as_deref(), Some("method"));
        assert_eq!(calls[0].first_positional_literal(), None);
    }
}
