use std::borrow::Cow;

/// Length in bytes of the leading `[A-Za-z0-9_]` run of `text`.
pub(super) fn ident_len(text: &str) -> usize {
    text.bytes()
        .take_while(|byte| byte.is_ascii_alphanumeric() || *byte == b'_')
        .count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Token<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

/// Splits text into literal runs and `{key}` placeholders.
pub(super) struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Tokens<'a> {
    pub(super) fn new(text: &'a str) -> Self {
        Self { rest: text }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }

        let mut search = 0;
        while let Some(offset) = self.rest[search..].find('{') {
            let open = search + offset;
            if let Some(key_len) = placeholder_key_len(&self.rest[open..]) {
                if open > 0 {
                    let (text, rest) = self.rest.split_at(open);
                    self.rest = rest;
                    return Some(Token::Text(text));
                }

                let key = &self.rest[1..1 + key_len];
                self.rest = &self.rest[key_len + 2..];
                return Some(Token::Placeholder(key));
            }
            search = open + 1;
        }

        let text = self.rest;
        self.rest = "";
        Some(Token::Text(text))
    }
}

/// `text` starts with `{`; returns the key length when a well-formed `{key}` follows.
fn placeholder_key_len(text: &str) -> Option<usize> {
    let key_len = ident_len(&text[1..]);
    (key_len > 0 && text[1 + key_len..].starts_with('}')).then_some(key_len)
}

/// Append `text` to `out`, replacing each placeholder with what `resolve`
/// returns. `None` keeps the original `{key}` token.
pub(super) fn substitute<'d, F>(text: &str, out: &mut String, mut resolve: F)
where
    F: FnMut(&str) -> Option<Cow<'d, str>>,
{
    for token in Tokens::new(text) {
        match token {
            Token::Text(literal) => out.push_str(literal),
            Token::Placeholder(key) => match resolve(key) {
                Some(value) => out.push_str(&value),
                None => {
                    out.push('{');
                    out.push_str(key);
                    out.push('}');
                }
            },
        }
    }
}

/// Distinct placeholder keys in order of first appearance.
pub(super) fn placeholder_keys(text: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for token in Tokens::new(text) {
        if let Token::Placeholder(key) = token {
            if !keys.iter().any(|known| known == key) {
                keys.push(key.to_string());
            }
        }
    }
    keys
}
