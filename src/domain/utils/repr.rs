/// Join the items' string forms with `", "`, as Python prints container contents.
pub fn comma_separated<I>(items: I) -> String
where
    I: IntoIterator,
    I::Item: ToString,
{
    items
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The `repr()` of a bytes literal: printable ASCII as is, everything else escaped.
pub fn bytes_repr(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 3);
    out.push_str("b'");
    for &byte in bytes {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\'"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(byte as char),
            _ => out.push_str(&format!("\\x{byte:02x}")),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes() {
        assert_eq!(bytes_repr(b"plugin"), "b'plugin'");
        assert_eq!(bytes_repr(b"it's\n\x00\xff"), "b'it\\'s\\n\\x00\\xff'");
        assert_eq!(comma_separated([1, 2, 3]), "1, 2, 3");
        assert_eq!(comma_separated(Vec::<String>::new()), "");
    }
}
