//! Input decoding for the REPL
//!
//! The tokenizer operates on an ASCII-only surface. Before lexing, a raw
//! line is *armored*: every non-ASCII character is rewritten to
//! `{{<decimal codepoint>}}`, and so is every literal `{`, which keeps the
//! transform a bijection. After lexing, each word is disarmed back to its
//! original characters. A line containing arbitrary Unicode therefore
//! survives quoting and splitting without corruption.

use chumsky::Parser;

use crate::error::{ShellError, ShellResult};
use crate::lexer::{lexer, Token};

/// Escape non-ASCII characters (and `{`) as `{{<codepoint>}}`.
pub fn armor(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        if c.is_ascii() && c != '{' {
            out.push(c);
        } else {
            out.push_str(&format!("{{{{{}}}}}", c as u32));
        }
    }
    out
}

/// Reverse [`armor`]: decode `{{<codepoint>}}` sequences back to their
/// characters. Sequences that do not parse are kept literally; armored
/// input never produces them.
pub fn disarm(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        match tail.find("}}") {
            Some(end) if tail[..end].chars().all(|c| c.is_ascii_digit()) && end > 0 => {
                let decoded = tail[..end]
                    .parse::<u32>()
                    .ok()
                    .and_then(char::from_u32);
                match decoded {
                    Some(c) => out.push(c),
                    None => {
                        out.push_str("{{");
                        out.push_str(&tail[..end]);
                        out.push_str("}}");
                    }
                }
                rest = &tail[end + 2..];
            }
            _ => {
                out.push_str("{{");
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Tokenize one raw input line into commands (split on `;`), each a list
/// of argument words. Unicode round-trips losslessly per argument.
pub fn decode_line(line: &str) -> ShellResult<Vec<Vec<String>>> {
    let armored = armor(line);
    let tokens = lexer().parse(armored.as_str()).map_err(|errs| {
        let msg = errs
            .into_iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        ShellError::Input(msg)
    })?;

    let mut commands = Vec::new();
    let mut current = Vec::new();
    for token in tokens {
        match token {
            Token::Word(w) => current.push(disarm(&w)),
            Token::Semicolon => {
                if !current.is_empty() {
                    commands.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        commands.push(current);
    }
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through_armor() {
        assert_eq!(armor("ls -r /tmp"), "ls -r /tmp");
    }

    #[test]
    fn non_ascii_round_trips() {
        let line = "héllo wörld";
        assert_eq!(disarm(&armor(line)), line);
    }

    #[test]
    fn brace_round_trips() {
        // A literal "{{123}}" in the input must not decode as codepoint 123.
        let line = "echo {{123}}";
        assert_eq!(disarm(&armor(line)), line);
    }

    #[test]
    fn armor_is_ascii_only() {
        assert!(armor("日本語 path").is_ascii());
    }

    #[test]
    fn mixed_tokens_split_correctly() {
        let cmds = decode_line("get Ünïcode.txt lokal").unwrap();
        assert_eq!(
            cmds,
            vec![vec![
                "get".to_string(),
                "Ünïcode.txt".to_string(),
                "lokal".to_string()
            ]]
        );
    }

    #[test]
    fn quoted_unicode_survives_splitting() {
        let cmds = decode_line("cd '日本 語'").unwrap();
        assert_eq!(cmds, vec![vec!["cd".to_string(), "日本 語".to_string()]]);
    }

    #[test]
    fn semicolons_split_commands() {
        let cmds = decode_line("pwd; ls /a ; ;").unwrap();
        assert_eq!(
            cmds,
            vec![
                vec!["pwd".to_string()],
                vec!["ls".to_string(), "/a".to_string()]
            ]
        );
    }

    #[test]
    fn unterminated_quote_is_rejected() {
        assert!(decode_line("cd 'oops").is_err());
    }

    #[test]
    fn empty_line_is_no_commands() {
        assert!(decode_line("").unwrap().is_empty());
        assert!(decode_line("   ").unwrap().is_empty());
    }
}
