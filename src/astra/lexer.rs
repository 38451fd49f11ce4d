// astra/lexer.rs
//! Tokenizer for the Lua subset used by astra.conf.
//!
//! Never fails: characters it does not understand become `Punct` tokens and an
//! unterminated string runs to the end of its line. The statement parser
//! decides what is usable.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    Str(String),
    /// Raw numeric literal text (`4095`, `0x1FFF`, `1.5`)
    Number(String),
    Punct(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

pub fn tokenize(src: &str) -> Vec<Token> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut idx = 0usize;
    let mut line = 1usize;

    while idx < chars.len() {
        let c = chars[idx];
        match c {
            '\n' => {
                line += 1;
                idx += 1;
            }
            c if c.is_whitespace() => idx += 1,
            '-' if chars.get(idx + 1) == Some(&'-') => {
                idx += 2;
                if let Some((body, end)) = long_bracket(&chars, idx) {
                    line += body.matches('\n').count();
                    idx = end;
                } else {
                    while idx < chars.len() && chars[idx] != '\n' {
                        idx += 1;
                    }
                }
            }
            '[' => match long_bracket(&chars, idx) {
                Some((body, end)) => {
                    let start_line = line;
                    line += body.matches('\n').count();
                    tokens.push(Token { kind: TokenKind::Str(body), line: start_line });
                    idx = end;
                }
                None => {
                    tokens.push(Token { kind: TokenKind::Punct('['), line });
                    idx += 1;
                }
            },
            '"' | '\'' => {
                let (text, end) = read_quoted(&chars, idx);
                tokens.push(Token { kind: TokenKind::Str(text), line });
                idx = end;
            }
            c if c.is_ascii_digit() => {
                let start = idx;
                while idx < chars.len() && (chars[idx].is_ascii_alphanumeric() || chars[idx] == '.') {
                    idx += 1;
                }
                let text: String = chars[start..idx].iter().collect();
                tokens.push(Token { kind: TokenKind::Number(text), line });
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = idx;
                while idx < chars.len() && (chars[idx].is_alphanumeric() || chars[idx] == '_') {
                    idx += 1;
                }
                let text: String = chars[start..idx].iter().collect();
                tokens.push(Token { kind: TokenKind::Ident(text), line });
            }
            other => {
                tokens.push(Token { kind: TokenKind::Punct(other), line });
                idx += 1;
            }
        }
    }

    tokens
}

/// `[[ ... ]]`, `[==[ ... ]==]` starting at `idx`. Returns body and index past the close.
fn long_bracket(chars: &[char], idx: usize) -> Option<(String, usize)> {
    if chars.get(idx) != Some(&'[') {
        return None;
    }
    let mut level = 0usize;
    let mut i = idx + 1;
    while chars.get(i) == Some(&'=') {
        level += 1;
        i += 1;
    }
    if chars.get(i) != Some(&'[') {
        return None;
    }
    let body_start = i + 1;

    let mut j = body_start;
    while j < chars.len() {
        if chars[j] == ']' {
            let mut k = j + 1;
            let mut eq = 0usize;
            while chars.get(k) == Some(&'=') {
                eq += 1;
                k += 1;
            }
            if eq == level && chars.get(k) == Some(&']') {
                let body: String = chars[body_start..j].iter().collect();
                return Some((body, k + 1));
            }
        }
        j += 1;
    }
    // unterminated: swallow the rest
    Some((chars[body_start..].iter().collect(), chars.len()))
}

/// Quoted string starting at the opening quote. Returns text and index past the close.
fn read_quoted(chars: &[char], idx: usize) -> (String, usize) {
    let quote = chars[idx];
    let mut out = String::new();
    let mut i = idx + 1;
    while i < chars.len() {
        match chars[i] {
            c if c == quote => return (out, i + 1),
            '\n' => return (out, i), // unterminated
            '\\' if i + 1 < chars.len() => {
                out.push(match chars[i + 1] {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => other,
                });
                i += 2;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    (out, i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_basic_statement() {
        let k = kinds(r#"decapA = make_t2mi_decap({ name = "Ch1", pid = 4095 })"#);
        assert_eq!(k[0], TokenKind::Ident("decapA".into()));
        assert_eq!(k[1], TokenKind::Punct('='));
        assert_eq!(k[2], TokenKind::Ident("make_t2mi_decap".into()));
        assert!(k.contains(&TokenKind::Str("Ch1".into())));
        assert!(k.contains(&TokenKind::Number("4095".into())));
    }

    #[test]
    fn test_comments_skipped_and_lines_counted() {
        let toks = tokenize("-- header\n--[[ block\ncomment ]]\nx = 1");
        assert_eq!(toks[0].kind, TokenKind::Ident("x".into()));
        assert_eq!(toks[0].line, 4);
    }

    #[test]
    fn test_escapes_and_single_quotes() {
        let k = kinds(r#"'it\'s' "a\"b" "tab\tx""#);
        assert_eq!(
            k,
            vec![
                TokenKind::Str("it's".into()),
                TokenKind::Str("a\"b".into()),
                TokenKind::Str("tab\tx".into()),
            ]
        );
    }

    #[test]
    fn test_long_string_and_hex() {
        let k = kinds("[==[raw ]] text]==] 0x1FFF");
        assert_eq!(k[0], TokenKind::Str("raw ]] text".into()));
        assert_eq!(k[1], TokenKind::Number("0x1FFF".into()));
    }

    #[test]
    fn test_unterminated_string_stops_at_line_end() {
        let toks = tokenize("\"open\nnext");
        assert_eq!(toks[0].kind, TokenKind::Str("open".into()));
        assert_eq!(toks[1].kind, TokenKind::Ident("next".into()));
        assert_eq!(toks[1].line, 2);
    }
}
