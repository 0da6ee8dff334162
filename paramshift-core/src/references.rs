//! Qualified reference rewriting (`params.id` -> `id`)

use std::borrow::Cow;

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Replace every standalone `<param>.<field>` in `text` with `<field>`
///
/// An occurrence is standalone when it is not preceded by an identifier
/// character or `.` and not followed by an identifier character, so
/// `searchParams.id`, `ctx.params.id` and `params.idx` are left alone.
pub fn rewrite_references<'a>(text: &'a str, param: &str, field: &str) -> Cow<'a, str> {
    let needle = format!("{}.{}", param, field);
    if !text.contains(needle.as_str()) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, _) in text.match_indices(needle.as_str()) {
        if start < cursor {
            continue;
        }
        let end = start + needle.len();
        let before_ok = text[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !is_ident_char(c) && c != '.');
        let after_ok = text[end..].chars().next().map_or(true, |c| !is_ident_char(c));
        if before_ok && after_ok {
            out.push_str(&text[cursor..start]);
            out.push_str(field);
            cursor = end;
        }
    }

    if cursor == 0 {
        return Cow::Borrowed(text);
    }
    out.push_str(&text[cursor..]);
    Cow::Owned(out)
}

/// Whether `text` holds at least one standalone `<param>.<field>`
pub fn contains_reference(text: &str, param: &str, field: &str) -> bool {
    matches!(rewrite_references(text, param, field), Cow::Owned(_))
}
