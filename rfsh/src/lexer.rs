//! Lexer for rfsh input lines
//!
//! Tokenizes one raw line into words and command separators. Quoting works
//! the POSIX way (single quotes literal, double quotes with `\"` and `\\`
//! escapes, backslash escapes outside quotes) but there is no expansion,
//! globbing, or redirection: a word is just a word.

use chumsky::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Word(String),
    Semicolon,
}

pub fn lexer() -> impl Parser<char, Vec<Token>, Error = Simple<char>> {
    let ws = filter(|c: &char| c.is_whitespace()).repeated();

    // Single quotes: everything literal up to the closing quote
    let sq_seg = just('\'')
        .ignore_then(filter(|c| *c != '\'').repeated())
        .then_ignore(just('\''))
        .collect::<String>();

    // Double quotes: \" and \\ are interpreted, other \X stay literal
    let dq_seg = just('"')
        .ignore_then(
            just('\\')
                .then(any())
                .map(|(_b, c): (char, char)| match c {
                    '"' => "\"".to_string(),
                    '\\' => "\\".to_string(),
                    _ => format!("\\{c}"),
                })
                .or(filter(|c: &char| *c != '"' && *c != '\\').map(|c: char| c.to_string()))
                .repeated(),
        )
        .then_ignore(just('"'))
        .map(|parts: Vec<String>| parts.concat());

    // Backslash-escape outside quotes: \X is literal X
    let escaped_char = just('\\').ignore_then(any()).map(|c: char| c.to_string());

    let word_char =
        filter(|c: &char| !c.is_whitespace() && !matches!(c, ';' | '"' | '\'' | '\\'));

    let bare_seg = escaped_char
        .or(word_char.map(|c: char| c.to_string()))
        .repeated()
        .at_least(1)
        .map(|parts: Vec<String>| parts.concat());

    // Adjacent segments with no whitespace between them join into one word
    let word = choice((bare_seg, sq_seg, dq_seg))
        .repeated()
        .at_least(1)
        .map(|segs: Vec<String>| Token::Word(segs.concat()));

    let token = just(';').to(Token::Semicolon).or(word);

    token.padded_by(ws).repeated().then_ignore(end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Token> {
        lexer().parse(input).unwrap()
    }

    fn word(s: &str) -> Token {
        Token::Word(s.to_string())
    }

    #[test]
    fn simple_command() {
        assert_eq!(lex("get file.txt"), vec![word("get"), word("file.txt")]);
    }

    #[test]
    fn double_quoted_word_keeps_spaces() {
        assert_eq!(
            lex("cd \"my dir\""),
            vec![word("cd"), word("my dir")]
        );
    }

    #[test]
    fn single_quotes_are_literal() {
        assert_eq!(lex("cat 'a;b'"), vec![word("cat"), word("a;b")]);
    }

    #[test]
    fn adjacent_segments_join() {
        assert_eq!(lex("ab'cd'\"ef\""), vec![word("abcdef")]);
    }

    #[test]
    fn semicolon_separates_commands() {
        assert_eq!(
            lex("pwd; cd /tmp ;ls"),
            vec![
                word("pwd"),
                Token::Semicolon,
                word("cd"),
                word("/tmp"),
                Token::Semicolon,
                word("ls"),
            ]
        );
    }

    #[test]
    fn backslash_escapes_space_and_quote() {
        assert_eq!(lex("rm a\\ b"), vec![word("rm"), word("a b")]);
        assert_eq!(lex("rm \\'x"), vec![word("rm"), word("'x")]);
    }

    #[test]
    fn empty_quoted_argument_survives() {
        assert_eq!(lex("cd ''"), vec![word("cd"), word("")]);
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        assert!(lexer().parse("cd 'oops").is_err());
        assert!(lexer().parse("cd \"oops").is_err());
    }
}
