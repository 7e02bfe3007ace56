use std::borrow::Cow;

/// Decodes an HTML entity reference starting at `&`.
///
/// Handles the named entities that show up in practice in feed descriptions
/// (`&amp;` `&lt;` `&gt;` `&quot;` `&apos;` `&nbsp;`) plus decimal numeric
/// references like `&#8217;`. Returns the decoded character and the byte
/// length of the reference consumed, or `None` if the input is not a
/// recognizable entity (in which case the `&` should pass through verbatim).
fn decode_entity(s: &str) -> Option<(char, usize)> {
    // Real entities are short; only look a few bytes ahead for the ';'.
    // The position of an ASCII ';' is always a char boundary.
    let window = &s.as_bytes()[1..s.len().min(10)];
    let end = window.iter().position(|&b| b == b';')? + 1;
    let name = &s[1..end];
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        _ => {
            let digits = name.strip_prefix('#')?;
            let code: u32 = digits.parse().ok()?;
            char::from_u32(code)?
        }
    };
    Some((c, end + 1))
}

/// A tag lexed out of an HTML fragment: its lowercased name and whether it
/// was a closing tag (`</p>`). Attributes and self-closing slashes are
/// discarded — the transforms below only dispatch on the name.
struct Tag {
    name: String,
    closing: bool,
}

/// Lexes a tag starting at `<`, returning the tag and bytes consumed.
/// An unterminated `<` (no `>` before end of input) is not a tag.
fn lex_tag(s: &str) -> Option<(Tag, usize)> {
    let end = s.find('>')?;
    let mut inner = s[1..end].trim();
    let closing = inner.starts_with('/');
    if closing {
        inner = inner[1..].trim_start();
    }
    let name = inner
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    Some((Tag { name, closing }, end + 1))
}

fn is_heading(name: &str) -> bool {
    name.len() == 2 && name.starts_with('h') && name[1..].chars().all(|c| c.is_ascii_digit())
}

/// Converts an HTML fragment to plain text.
///
/// `<br>` and `</p>` become newlines, closing headings become paragraph
/// breaks, every other tag is stripped, and common entities are decoded.
/// Deterministic on its input; no side effects.
pub fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(i) = rest.find(['<', '&']) {
        out.push_str(&rest[..i]);
        rest = &rest[i..];
        if rest.starts_with('<') {
            if let Some((tag, len)) = lex_tag(rest) {
                match tag.name.as_str() {
                    "br" => out.push('\n'),
                    "p" if tag.closing => out.push('\n'),
                    name if is_heading(name) && tag.closing => out.push_str("\n\n"),
                    _ => {}
                }
                rest = &rest[len..];
            } else {
                out.push('<');
                rest = &rest[1..];
            }
        } else if let Some((c, len)) = decode_entity(rest) {
            out.push(c);
            rest = &rest[len..];
        } else {
            out.push('&');
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    out
}

/// Converts an HTML fragment to a constrained display-markup subset.
///
/// The output contains only `<b>`, `<i>` and newlines:
/// - `<strong>`/`<b>` → `<b>`, `<em>`/`<i>` → `<i>`
/// - headings → bold, with a paragraph break after the closing tag
/// - `<br>` and `</p>` → newline
/// - all other tags stripped
///
/// Text content is entity-decoded and then re-escaped, so markup characters
/// originating from the feed's text can never be interpreted as tags by the
/// display layer.
pub fn html_to_markup(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(i) = rest.find(['<', '&']) {
        push_escaped(&mut out, &rest[..i]);
        rest = &rest[i..];
        if rest.starts_with('<') {
            if let Some((tag, len)) = lex_tag(rest) {
                match tag.name.as_str() {
                    "br" => out.push('\n'),
                    "p" if tag.closing => out.push('\n'),
                    "strong" | "b" => out.push_str(if tag.closing { "</b>" } else { "<b>" }),
                    "em" | "i" => out.push_str(if tag.closing { "</i>" } else { "<i>" }),
                    name if is_heading(name) => {
                        if tag.closing {
                            out.push_str("</b>\n\n");
                        } else {
                            out.push_str("<b>");
                        }
                    }
                    _ => {}
                }
                rest = &rest[len..];
            } else {
                out.push_str("&lt;");
                rest = &rest[1..];
            }
        } else if let Some((c, len)) = decode_entity(rest) {
            push_escaped_char(&mut out, c);
            rest = &rest[len..];
        } else {
            out.push_str("&amp;");
            rest = &rest[1..];
        }
    }
    push_escaped(&mut out, rest);
    out
}

fn push_escaped(out: &mut String, s: &str) {
    for c in s.chars() {
        push_escaped_char(out, c);
    }
}

fn push_escaped_char(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        _ => out.push(c),
    }
}

/// Truncates a string to at most `max_chars` characters, on a char boundary.
///
/// Returns `Cow::Borrowed` when the string already fits (the common case —
/// no allocation). Truncation counts `char`s, not bytes, so multi-byte
/// content is never cut mid-codepoint.
pub fn truncate_chars(s: &str, max_chars: usize) -> Cow<'_, str> {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => Cow::Owned(s[..idx].to_string()),
        None => Cow::Borrowed(s),
    }
}
