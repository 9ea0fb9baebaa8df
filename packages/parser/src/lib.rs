pub mod ast;
pub mod error;
pub mod parser;
pub mod serializer;
pub mod tokenizer;

pub use ast::{Node, Value};
pub use error::{ParseError, ParseResult};
pub use parser::{parse, Parser};
pub use serializer::{serialize, Serializer};
pub use tokenizer::{tokenize, Token};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenizer_basic() {
        let source = "volume = 0.5";
        let tokens = tokenize(source);
        assert_eq!(tokens.len(), 3);
    }
}
