use logos::Logos;
use std::ops::Range;

/// Tokens of the KV3-like configuration format
#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token<'src> {
    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("=")]
    Equals,

    #[token(",")]
    Comma,

    #[token("true")]
    True,

    #[token("false")]
    False,

    // Bare keys and enum-like values. Dots are allowed so namespaced keys
    // such as "weapon.fire" stay one token.
    #[regex(r"[A-Za-z_][A-Za-z0-9_.]*")]
    Ident(&'src str),

    #[regex(r"-?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number(&'src str),

    // Slice includes the surrounding quotes; escapes are decoded by the parser.
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    String(&'src str),

    // Anything the lexer cannot classify; surfaced as a parse error.
    Error,
}

/// Tokenize source into spanned tokens. Unrecognized input becomes a single
/// `Token::Error` carrying its span, so the parser can report the position.
pub fn tokenize(source: &str) -> Vec<(Token<'_>, Range<usize>)> {
    Token::lexer(source)
        .spanned()
        .map(|(tok, span)| (tok.unwrap_or(Token::Error), span))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_pair() {
        let tokens = tokenize("name = \"kick\"");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].0, Token::Ident("name"));
        assert_eq!(tokens[1].0, Token::Equals);
        assert_eq!(tokens[2].0, Token::String("\"kick\""));
    }

    #[test]
    fn test_tokenize_skips_comments() {
        let tokens = tokenize("// header\nvolume = 0.5 // trailing\n");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[2].0, Token::Number("0.5"));
    }

    #[test]
    fn test_tokenize_containers() {
        let tokens = tokenize("files = [ \"a\", \"b\" ]");
        let kinds: Vec<_> = tokens.iter().map(|(t, _)| t.clone()).collect();
        assert!(matches!(kinds[2], Token::LBracket));
        assert!(matches!(kinds[4], Token::Comma));
        assert!(matches!(kinds[6], Token::RBracket));
    }

    #[test]
    fn test_tokenize_unterminated_string_is_error() {
        let tokens = tokenize("key = \"oops");
        assert!(tokens.iter().any(|(t, _)| matches!(t, Token::Error)));
    }
}
