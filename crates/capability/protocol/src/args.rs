//! 写请求参数分词
//!
//! 规则与 shell 相近：空白分隔参数；双引号内保留空白；
//! 反斜杠转义下一个字符。引号内的反斜杠只有在紧跟双引号时才起转义作用。

/// 将原始字节（UTF-8，非法序列按替换字符处理）拆分为参数列表。
pub fn tokenize(bytes: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    let mut tokens = Vec::new();
    let mut buffer = String::new();
    let mut inside_quote = false;
    let mut pending_escape = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if (inside_quote && chars.peek() != Some(&'"')) || pending_escape {
                    buffer.push('\\');
                } else {
                    pending_escape = true;
                    continue;
                }
            }
            '"' => {
                if pending_escape {
                    buffer.push('"');
                } else {
                    inside_quote = !inside_quote;
                }
            }
            c if c.is_whitespace() => {
                if pending_escape || inside_quote {
                    buffer.push(c);
                } else if !buffer.is_empty() {
                    tokens.push(std::mem::take(&mut buffer));
                }
            }
            c => buffer.push(c),
        }
        pending_escape = false;
    }

    if !buffer.is_empty() {
        tokens.push(buffer);
    }
    tokens
}

/// [`tokenize`] 的逆操作：转义空白、双引号与反斜杠后以单个空格拼接。
///
/// 空参数无法表示，会被跳过。
pub fn quote_arguments<S: AsRef<str>>(arguments: &[S]) -> Vec<u8> {
    let mut out = String::new();
    for argument in arguments.iter().map(AsRef::as_ref) {
        if argument.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        for c in argument.chars() {
            if c == '\\' || c == '"' || c.is_whitespace() {
                out.push('\\');
            }
            out.push(c);
        }
    }
    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<String> {
        tokenize(input.as_bytes())
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(tokens("").is_empty());
        assert!(tokens("   \t ").is_empty());
    }

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(tokens("ABC DEF"), vec!["ABC", "DEF"]);
        assert_eq!(tokens("  ABC    DEF  "), vec!["ABC", "DEF"]);
        assert_eq!(tokens("ABC\tDEF\nGHI"), vec!["ABC", "DEF", "GHI"]);
    }

    #[test]
    fn quotes_group_whitespace() {
        assert_eq!(tokens(r#""ABC DEF" GHI"#), vec!["ABC DEF", "GHI"]);
        assert_eq!(tokens(r#""A  B""#), vec!["A  B"]);
        assert_eq!(tokens(r#"ab"cd ef"gh"#), vec!["abcd efgh"]);
    }

    #[test]
    fn backslash_escapes_next_character() {
        assert_eq!(tokens(r"ABC\ DEF"), vec!["ABC DEF"]);
        assert_eq!(tokens(r"ABC\\ DEF"), vec![r"ABC\", "DEF"]);
        assert_eq!(tokens(r#"\"quoted\""#), vec![r#""quoted""#]);
    }

    #[test]
    fn backslash_inside_quotes() {
        assert_eq!(tokens(r#""L\"MN""#), vec![r#"L"MN"#]);
        assert_eq!(tokens(r#""C:\temp""#), vec![r"C:\temp"]);
        assert_eq!(tokens("\"abc\\"), vec![r"abc\"]);
    }

    #[test]
    fn empty_quotes_are_dropped() {
        assert_eq!(tokens(r#"a "" b"#), vec!["a", "b"]);
    }

    #[test]
    fn quoting_is_reversible() {
        let arguments = ["on", "two words", r#"say "hi""#, r"back\slash\", "tab\there"];
        assert_eq!(tokenize(&quote_arguments(&arguments)), arguments);
        assert_eq!(quote_arguments(&["a b", "c"]), br"a\ b c".to_vec());
        assert_eq!(quote_arguments(&["", "x"]), b"x".to_vec());
    }
}
