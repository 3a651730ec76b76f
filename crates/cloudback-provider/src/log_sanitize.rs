const MAX_REMOTE_TEXT_CHARS: usize = 512;

/// Makes text received from the remote side safe to embed in errors and log
/// lines: ANSI CSI/OSC sequences and control characters are dropped, tabs and
/// newlines collapse to spaces, and the result is capped.
pub fn sanitize_remote_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len().min(MAX_REMOTE_TEXT_CHARS));
    let mut chars = input.chars().peekable();
    let mut count = 0usize;

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            match chars.next() {
                Some('[') => {
                    // CSI ends at the first final byte.
                    for n in chars.by_ref() {
                        if ('@'..='~').contains(&n) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    // OSC ends at BEL or ESC \.
                    while let Some(n) = chars.next() {
                        if n == '\x07' {
                            break;
                        }
                        if n == '\x1b' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            }
            continue;
        }

        let c = match c {
            '\t' | '\n' | '\r' => ' ',
            c if c.is_control() || is_bidi_control(c) => continue,
            c => c,
        };
        if c == ' ' && out.ends_with(' ') {
            continue;
        }
        if count == MAX_REMOTE_TEXT_CHARS {
            out.push_str(" ...[truncated]");
            break;
        }
        out.push(c);
        count += 1;
    }

    out.trim().to_string()
}

fn is_bidi_control(c: char) -> bool {
    c == '\u{061C}'
        || c == '\u{200E}'
        || c == '\u{200F}'
        || ('\u{202A}'..='\u{202E}').contains(&c)
        || ('\u{2066}'..='\u{2069}').contains(&c)
}
