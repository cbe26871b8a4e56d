//! American Soundex over normalized name tokens.
//!
//! Spelling variants that sound alike (`Smith`/`Smyth`, `Robert`/`Rupert`)
//! collapse to the same four-character code.

const CODE_LEN: usize = 4;

fn digit(c: char) -> Option<char> {
    match c {
        'b' | 'f' | 'p' | 'v' => Some('1'),
        'c' | 'g' | 'j' | 'k' | 'q' | 's' | 'x' | 'z' => Some('2'),
        'd' | 't' => Some('3'),
        'l' => Some('4'),
        'm' | 'n' => Some('5'),
        'r' => Some('6'),
        _ => None,
    }
}

/// Soundex code of one token, `None` if the token has no ASCII letters
pub(crate) fn soundex(token: &str) -> Option<String> {
    let mut letters = token
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase());

    let first = letters.next()?;
    let mut code = String::with_capacity(CODE_LEN);
    code.push(first.to_ascii_uppercase());
    let mut last = digit(first);

    for c in letters {
        if code.len() == CODE_LEN {
            break;
        }
        match c {
            // h and w do not separate letters with the same code
            'h' | 'w' => {}
            _ => {
                let d = digit(c);
                if let Some(d) = d {
                    if last != Some(d) {
                        code.push(d);
                    }
                }
                last = d;
            }
        }
    }

    while code.len() < CODE_LEN {
        code.push('0');
    }
    Some(code)
}

/// Phonetic code per whitespace token, in token order.
///
/// Tokens without Latin letters keep their normalized form so names in
/// other scripts still produce a stable, comparable code.
pub(crate) fn encode_tokens(normalized: &str) -> Vec<String> {
    normalized
        .split_whitespace()
        .map(|token| soundex(token).unwrap_or_else(|| token.to_string()))
        .collect()
}
