use std::borrow::Cow;

/// Left-pad `text` with spaces to `width` characters. Longer text is returned unchanged.
pub fn pad_start(text: &str, width: usize) -> Cow<'_, str> {
    let len = text.chars().count();
    if len >= width {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + width - len);
    out.extend(std::iter::repeat_n(' ', width - len));
    out.push_str(text);
    Cow::Owned(out)
}

/// Right-pad `text` with spaces to `width` characters. Longer text is returned unchanged.
pub fn pad_end(text: &str, width: usize) -> Cow<'_, str> {
    let len = text.chars().count();
    if len >= width {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + width - len);
    out.push_str(text);
    out.extend(std::iter::repeat_n(' ', width - len));
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_by_characters() {
        assert_eq!(pad_start("3.14", 5), " 3.14");
        assert_eq!(pad_end("\u{e9}", 3), "\u{e9}  ");
        assert!(matches!(pad_end("abcdef", 3), Cow::Borrowed("abcdef")));
    }
}
