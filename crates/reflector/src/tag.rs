//! Struct field tags
//!
//! A tag string is a sequence of `key:"value"` groups separated by spaces.
//! Values are double-quoted and may contain backslash escapes. Parsing stops
//! at the first malformed group; the groups before it are kept.

use std::slice;

/// One `key:"value"` group
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    name: String,
    value: String,
}

impl Tag {
    /// Build a tag
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Key
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unquoted value
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Tags of a field, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(Vec<Tag>);

impl Tags {
    /// Parse a raw tag string
    pub fn parse(raw: &str) -> Self {
        let mut tags = Vec::new();
        let mut rest = raw.as_bytes();

        loop {
            while let [b' ', tail @ ..] = rest {
                rest = tail;
            }
            if rest.is_empty() {
                break;
            }

            let key_len = rest
                .iter()
                .take_while(|&&b| b > b' ' && b != b':' && b != b'"' && b != 0x7f)
                .count();
            if key_len == 0
                || rest.get(key_len) != Some(&b':')
                || rest.get(key_len + 1) != Some(&b'"')
            {
                break;
            }
            let name = &rest[..key_len];
            rest = &rest[key_len + 1..];

            let Some(end) = closing_quote(rest) else {
                break;
            };
            let Some(value) = unquote(&rest[1..end]) else {
                break;
            };
            rest = &rest[end + 1..];

            tags.push(Tag {
                name: String::from_utf8_lossy(name).into_owned(),
                value,
            });
        }

        Tags(tags)
    }

    /// First tag with the given key
    pub fn find(&self, name: &str) -> Option<&Tag> {
        self.0.iter().find(|tag| tag.name == name)
    }

    /// Whether a tag with the given key exists
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Number of tags
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no tags
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in declaration order
    pub fn iter(&self) -> slice::Iter<'_, Tag> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = &'a Tag;
    type IntoIter = slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Index of the quote closing the string that opens at `quoted[0]`
fn closing_quote(quoted: &[u8]) -> Option<usize> {
    let mut i = 1;
    while i < quoted.len() {
        match quoted[i] {
            b'"' => return Some(i),
            b'\\' => i += 2,
            _ => i += 1,
        }
    }
    None
}

/// Decode the body of a double-quoted string
fn unquote(body: &[u8]) -> Option<String> {
    let mut out = Vec::with_capacity(body.len());
    let mut i = 0;

    while i < body.len() {
        let b = body[i];
        if b == b'\n' {
            return None;
        }
        if b != b'\\' {
            out.push(b);
            i += 1;
            continue;
        }

        let escape = *body.get(i + 1)?;
        i += 2;
        match escape {
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'v' => out.push(0x0b),
            b'\\' => out.push(b'\\'),
            b'"' => out.push(b'"'),
            b'x' => {
                out.push(u8::try_from(hex(body.get(i..i + 2)?)?).ok()?);
                i += 2;
            }
            b'u' | b'U' => {
                let width = if escape == b'u' { 4 } else { 8 };
                let c = char::from_u32(hex(body.get(i..i + width)?)?)?;
                let mut buf = [0; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                i += width;
            }
            b'0'..=b'7' => {
                let digits = body.get(i - 1..i + 2)?;
                let mut v: u32 = 0;
                for &d in digits {
                    if !(b'0'..=b'7').contains(&d) {
                        return None;
                    }
                    v = v * 8 + u32::from(d - b'0');
                }
                out.push(u8::try_from(v).ok()?);
                i += 2;
            }
            _ => return None,
        }
    }

    String::from_utf8(out).ok()
}

fn hex(digits: &[u8]) -> Option<u32> {
    let text = std::str::from_utf8(digits).ok()?;
    u32::from_str_radix(text, 16).ok()
}
