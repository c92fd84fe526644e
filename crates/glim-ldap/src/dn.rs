//! Distinguished names (RFC 4514), single-valued RDNs only.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid DN syntax: {0}")]
pub struct DnError(String);

/// One `attr=value` component. The attribute type is stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rdn {
    pub attr: String,
    pub value: String,
}

impl Rdn {
    pub fn new(attr: &str, value: impl Into<String>) -> Self {
        Self {
            attr: attr.to_ascii_lowercase(),
            value: value.into(),
        }
    }

    /// Attribute type and value compare without regard to case.
    pub fn matches(&self, other: &Rdn) -> bool {
        self.attr == other.attr && self.value.to_lowercase() == other.value.to_lowercase()
    }

    /// The value when the attribute type is `attr`.
    pub fn value_of(&self, attr: &str) -> Option<&str> {
        self.attr
            .eq_ignore_ascii_case(attr)
            .then_some(self.value.as_str())
    }
}

impl fmt::Display for Rdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.attr, escape_value(&self.value))
    }
}

/// A parsed DN, most specific RDN first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dn {
    rdns: Vec<Rdn>,
}

impl Dn {
    pub fn parse(input: &str) -> Result<Self, DnError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Self::default());
        }

        let mut rdns = Vec::new();
        for component in split_unescaped(input, ',')? {
            let (attr, value) = component
                .split_once('=')
                .ok_or_else(|| DnError(format!("missing '=' in '{component}'")))?;
            let attr = attr.trim();
            if attr.is_empty()
                || !attr
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            {
                return Err(DnError(format!("invalid attribute type '{attr}'")));
            }
            if split_unescaped(value, '+')?.len() > 1 {
                return Err(DnError("multi-valued RDNs are not supported".into()));
            }
            rdns.push(Rdn::new(attr, unescape_value(value.trim())?));
        }
        Ok(Self { rdns })
    }

    pub fn rdns(&self) -> &[Rdn] {
        &self.rdns
    }

    pub fn is_empty(&self) -> bool {
        self.rdns.is_empty()
    }

    /// A child DN with `rdn` prepended.
    pub fn child(&self, rdn: Rdn) -> Self {
        let mut rdns = Vec::with_capacity(self.rdns.len() + 1);
        rdns.push(rdn);
        rdns.extend(self.rdns.iter().cloned());
        Self { rdns }
    }

    /// The RDNs above `suffix`, or `None` when this DN is not below it.
    pub fn relative_to(&self, suffix: &Dn) -> Option<&[Rdn]> {
        let split = self.rdns.len().checked_sub(suffix.rdns.len())?;
        let (head, tail) = self.rdns.split_at(split);
        tail.iter()
            .zip(&suffix.rdns)
            .all(|(a, b)| a.matches(b))
            .then_some(head)
    }
}

impl fmt::Display for Dn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rdn) in self.rdns.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{rdn}")?;
        }
        Ok(())
    }
}

/// Escape a value for use inside an RDN.
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let last = value.chars().count().saturating_sub(1);
    for (i, c) in value.chars().enumerate() {
        let special = matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';')
            || (i == 0 && (c == '#' || c == ' '))
            || (i == last && c == ' ');
        if special {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn split_unescaped(input: &str, separator: char) -> Result<Vec<&str>, DnError> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == separator {
            parts.push(&input[start..i]);
            start = i + c.len_utf8();
        }
    }
    if escaped {
        return Err(DnError("trailing escape".into()));
    }
    parts.push(&input[start..]);
    Ok(parts)
}

fn unescape_value(value: &str) -> Result<String, DnError> {
    let mut bytes = Vec::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let Some(next) = chars.next() else {
            return Err(DnError("trailing escape".into()));
        };
        if next.is_ascii_hexdigit() {
            let low = chars
                .next()
                .filter(char::is_ascii_hexdigit)
                .ok_or_else(|| DnError("invalid hex escape".into()))?;
            let pair: String = [next, low].iter().collect();
            let byte = u8::from_str_radix(&pair, 16)
                .map_err(|_| DnError("invalid hex escape".into()))?;
            bytes.push(byte);
        } else {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(next.encode_utf8(&mut buf).as_bytes());
        }
    }
    String::from_utf8(bytes).map_err(|_| DnError("escaped value is not UTF-8".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let dn = Dn::parse("UID=saul, OU=Users,dc=example,dc=org").unwrap();
        assert_eq!(dn.rdns().len(), 4);
        assert_eq!(dn.rdns()[0], Rdn::new("uid", "saul"));
        assert_eq!(dn.to_string(), "uid=saul,ou=Users,dc=example,dc=org");
        assert!(Dn::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_escaped_values() {
        let dn = Dn::parse(r"cn=Goodman\, Saul,ou=Groups,dc=example,dc=org").unwrap();
        assert_eq!(dn.rdns()[0].value, "Goodman, Saul");
        assert_eq!(dn.rdns()[0].to_string(), r"cn=Goodman\, Saul");

        let dn = Dn::parse(r"cn=caf\C3\A9,dc=org").unwrap();
        assert_eq!(dn.rdns()[0].value, "café");
    }

    #[test]
    fn test_reject_invalid_syntax() {
        assert!(Dn::parse("saul").is_err());
        assert!(Dn::parse("=saul,dc=org").is_err());
        assert!(Dn::parse("cn=a+sn=b,dc=org").is_err());
        assert!(Dn::parse(r"cn=a\").is_err());
    }

    #[test]
    fn test_relative_to_suffix() {
        let suffix = Dn::parse("dc=example,dc=org").unwrap();
        let dn = Dn::parse("uid=kim,ou=users,DC=Example,DC=ORG").unwrap();
        let head = dn.relative_to(&suffix).unwrap();
        assert_eq!(head, &[Rdn::new("uid", "kim"), Rdn::new("ou", "users")]);

        assert_eq!(suffix.relative_to(&suffix).unwrap(), &[] as &[Rdn]);
        assert!(Dn::parse("dc=other,dc=org").unwrap().relative_to(&suffix).is_none());
        assert!(Dn::parse("dc=org").unwrap().relative_to(&suffix).is_none());
    }

    #[test]
    fn test_child() {
        let users = Dn::parse("ou=Users,dc=example,dc=org").unwrap();
        assert_eq!(
            users.child(Rdn::new("uid", "mike")).to_string(),
            "uid=mike,ou=Users,dc=example,dc=org"
        );
    }
}
