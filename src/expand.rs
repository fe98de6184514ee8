use crate::env::EnvStore;
use crate::model::Env;

/// First variable reference within a decoded value: an optional escaping
/// backslash, `$`, and a name either bare or brace-wrapped. Both braces are
/// individually optional, so `${NAME` and `$NAME}` count as references too.
struct Reference {
    /// Span start, including the escaping backslash when present.
    start: usize,
    /// Span end, past the closing brace when present.
    end: usize,
    name_start: usize,
    name_end: usize,
    escaped: bool,
}

fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_uppercase() || byte.is_ascii_digit() || byte == b'_'
}

fn find_reference(value: &str) -> Option<Reference> {
    let bytes = value.as_bytes();
    let mut idx = 0;

    while idx < bytes.len() {
        if bytes[idx] != b'$' {
            idx += 1;
            continue;
        }

        let mut cursor = idx + 1;
        if cursor < bytes.len() && bytes[cursor] == b'{' {
            cursor += 1;
        }

        let name_start = cursor;
        while cursor < bytes.len() && is_name_byte(bytes[cursor]) {
            cursor += 1;
        }
        if cursor == name_start {
            // A bare `$` or `${` with no name is not a reference.
            idx += 1;
            continue;
        }
        let name_end = cursor;

        if cursor < bytes.len() && bytes[cursor] == b'}' {
            cursor += 1;
        }

        let escaped = idx > 0 && bytes[idx - 1] == b'\\';
        return Some(Reference {
            start: if escaped { idx - 1 } else { idx },
            end: cursor,
            name_start,
            name_end,
            escaped,
        });
    }

    None
}

/// Substitute the first variable reference in `value`.
///
/// An escaped reference is neutralized: the backslash is dropped and the
/// `$name` text kept literally. Otherwise the name is resolved from the Env
/// accumulated so far, falling back to the store; an unresolved name expands
/// to the empty string. Exactly one substitution is performed, with no
/// re-expansion of the result.
pub(crate) fn expand(value: &str, env: &Env, store: &EnvStore) -> String {
    let Some(reference) = find_reference(value) else {
        return value.to_owned();
    };

    let name = &value[reference.name_start..reference.name_end];
    let replacement = if reference.escaped {
        value[reference.start + 1..reference.end].to_owned()
    } else {
        env.get(name)
            .cloned()
            .or_else(|| store.get(name))
            .unwrap_or_default()
    };

    let mut out =
        String::with_capacity(value.len() - (reference.end - reference.start) + replacement.len());
    out.push_str(&value[..reference.start]);
    out.push_str(&replacement);
    out.push_str(&value[reference.end..]);
    out
}
