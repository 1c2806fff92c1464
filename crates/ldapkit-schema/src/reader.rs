//! Character-level reader for RFC 2252/4512 schema element definitions.
//!
//! Definitions have the shape
//! `( OID [NAME ...] [DESC '...'] [OBSOLETE] <keywords> [X-ext ...] )` and
//! are parsed one token at a time. Every failure carries the complete
//! definition so callers can surface a self-contained message.

use crate::error::{SchemaError, SchemaResult};

pub(crate) struct DefinitionReader<'a> {
    definition: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> DefinitionReader<'a> {
    pub(crate) fn new(definition: &'a str) -> Self {
        DefinitionReader {
            definition,
            chars: definition.chars().collect(),
            pos: 0,
        }
    }

    fn err(&self, message: impl Into<String>) -> SchemaError {
        SchemaError::invalid_definition(self.definition, message)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    pub(crate) fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.chars.len() - self.pos
    }

    /// Consume the opening parenthesis that starts every definition.
    pub(crate) fn expect_open_paren(&mut self) -> SchemaResult<()> {
        self.skip_whitespace();
        if self.remaining() == 0 {
            return Err(self.err("the definition is empty"));
        }
        match self.bump() {
            Some('(') => Ok(()),
            Some(c) => Err(self.err(format!(
                "expected an open parenthesis at position {} but found '{}'",
                self.pos - 1,
                c
            ))),
            None => Err(self.err("the definition is empty")),
        }
    }

    fn is_oid_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' || c == ';'
    }

    /// Read a numeric OID or descriptor name, optionally surrounded by
    /// single quotes.
    pub(crate) fn read_oid(&mut self) -> SchemaResult<String> {
        self.skip_whitespace();
        if self.peek() == Some('\'') {
            return self.read_quoted_string();
        }
        let start = self.pos;
        while matches!(self.peek(), Some(c) if Self::is_oid_char(c)) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.err(format!(
                "expected an OID or name at position {}",
                start
            )));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    /// Read an OID that may carry a `{len}` length suffix, which is parsed
    /// and discarded (no practical value length limit is imposed).
    pub(crate) fn read_oid_len(&mut self) -> SchemaResult<String> {
        let oid = self.read_oid()?;
        if self.peek() == Some('{') {
            self.pos += 1;
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.pos += 1;
            }
            if self.bump() != Some('}') {
                return Err(self.err("unterminated length suffix after syntax OID"));
            }
        }
        Ok(oid)
    }

    /// Read the next keyword token, or `None` once the closing parenthesis
    /// of the definition has been reached.
    pub(crate) fn read_token_name(&mut self) -> SchemaResult<Option<String>> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(self.err("unexpected end of definition: missing close parenthesis")),
            Some(')') => {
                self.pos += 1;
                Ok(None)
            }
            Some(_) => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if !c.is_whitespace() && c != ')') {
                    self.pos += 1;
                }
                Ok(Some(self.chars[start..self.pos].iter().collect()))
            }
        }
    }

    /// Read a string enclosed in single quotes.
    pub(crate) fn read_quoted_string(&mut self) -> SchemaResult<String> {
        self.skip_whitespace();
        if self.bump() != Some('\'') {
            return Err(self.err(format!(
                "expected a single-quoted string at position {}",
                self.pos
            )));
        }
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c != '\'') {
            self.pos += 1;
        }
        if self.peek().is_none() {
            return Err(self.err("unterminated quoted string"));
        }
        let value = self.chars[start..self.pos].iter().collect();
        self.pos += 1;
        Ok(value)
    }

    /// Read a NAME value: a single quoted descriptor or a parenthesized
    /// list of quoted descriptors.
    pub(crate) fn read_name_descriptors(&mut self) -> SchemaResult<Vec<String>> {
        self.skip_whitespace();
        if self.peek() == Some('(') {
            self.pos += 1;
            let mut names = Vec::new();
            loop {
                self.skip_whitespace();
                match self.peek() {
                    Some(')') => {
                        self.pos += 1;
                        break;
                    }
                    Some('\'') => names.push(self.read_quoted_string()?),
                    Some(c) => {
                        return Err(self.err(format!(
                            "expected a quoted name or close parenthesis but found '{c}'"
                        )))
                    }
                    None => return Err(self.err("unterminated name list")),
                }
            }
            if names.is_empty() {
                return Err(self.err("empty name list"));
            }
            Ok(names)
        } else {
            Ok(vec![self.read_quoted_string()?])
        }
    }

    /// Read an OID set: a single OID or a parenthesized `$`-separated list.
    pub(crate) fn read_oids(&mut self) -> SchemaResult<Vec<String>> {
        self.skip_whitespace();
        if self.peek() != Some('(') {
            return Ok(vec![self.read_oid()?]);
        }
        self.pos += 1;
        let mut oids = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(')') => {
                    self.pos += 1;
                    break;
                }
                Some('$') => {
                    self.pos += 1;
                }
                Some(_) => oids.push(self.read_oid()?),
                None => return Err(self.err("unterminated OID list")),
            }
        }
        if oids.is_empty() {
            return Err(self.err("empty OID list"));
        }
        Ok(oids)
    }

    /// Read a vendor extension value: a quoted string or a parenthesized
    /// list of quoted strings.
    pub(crate) fn read_extensions(&mut self) -> SchemaResult<Vec<String>> {
        self.skip_whitespace();
        if self.peek() != Some('(') {
            return Ok(vec![self.read_quoted_string()?]);
        }
        self.pos += 1;
        let mut values = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(')') => {
                    self.pos += 1;
                    break;
                }
                Some('\'') => values.push(self.read_quoted_string()?),
                Some(c) => {
                    return Err(self.err(format!(
                        "expected a quoted extension value but found '{c}'"
                    )))
                }
                None => return Err(self.err("unterminated extension value list")),
            }
        }
        Ok(values)
    }

    /// Read a DIT structure rule ID set: an integer or a parenthesized
    /// space-separated list of integers.
    pub(crate) fn read_rule_ids(&mut self) -> SchemaResult<Vec<u32>> {
        self.skip_whitespace();
        if self.peek() != Some('(') {
            return Ok(vec![self.read_rule_id()?]);
        }
        self.pos += 1;
        let mut ids = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(')') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => ids.push(self.read_rule_id()?),
                None => return Err(self.err("unterminated rule ID list")),
            }
        }
        if ids.is_empty() {
            return Err(self.err("empty rule ID list"));
        }
        Ok(ids)
    }

    /// Read a single DIT structure rule ID.
    pub(crate) fn read_rule_id(&mut self) -> SchemaResult<u32> {
        self.skip_whitespace();
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.err(format!(
                "expected a rule ID at position {start}"
            )));
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        digits
            .parse::<u32>()
            .map_err(|_| self.err(format!("rule ID {digits} is out of range")))
    }

    /// Read a bare word (used for USAGE values).
    pub(crate) fn read_word(&mut self) -> SchemaResult<String> {
        self.skip_whitespace();
        let start = self.pos;
        while matches!(self.peek(), Some(c) if !c.is_whitespace() && c != ')') {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.err(format!("expected a value at position {start}")));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }
}

/// True if the token names a vendor extension (`X-` followed by letters,
/// underscores or hyphens).
pub(crate) fn is_extension_token(token: &str) -> bool {
    token.len() > 2
        && token.starts_with("X-")
        && token[2..]
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_oid_and_names() {
        let mut r = DefinitionReader::new("( 2.5.4.3 NAME ( 'cn' 'commonName' ) )");
        r.expect_open_paren().unwrap();
        assert_eq!(r.read_oid().unwrap(), "2.5.4.3");
        assert_eq!(r.read_token_name().unwrap().as_deref(), Some("NAME"));
        assert_eq!(r.read_name_descriptors().unwrap(), vec!["cn", "commonName"]);
        assert_eq!(r.read_token_name().unwrap(), None);
    }

    #[test]
    fn test_read_single_name() {
        let mut r = DefinitionReader::new("'cn'");
        assert_eq!(r.read_name_descriptors().unwrap(), vec!["cn"]);
    }

    #[test]
    fn test_read_oid_len() {
        let mut r = DefinitionReader::new("1.3.6.1.4.1.1466.115.121.1.15{256}");
        assert_eq!(r.read_oid_len().unwrap(), "1.3.6.1.4.1.1466.115.121.1.15");
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_read_oid_set() {
        let mut r = DefinitionReader::new("( cn $ sn $ 2.5.4.0 )");
        assert_eq!(r.read_oids().unwrap(), vec!["cn", "sn", "2.5.4.0"]);
    }

    #[test]
    fn test_read_extensions_single_and_list() {
        let mut r = DefinitionReader::new("'single'");
        assert_eq!(r.read_extensions().unwrap(), vec!["single"]);

        let mut r = DefinitionReader::new("( 'one' 'two' )");
        assert_eq!(r.read_extensions().unwrap(), vec!["one", "two"]);
    }

    #[test]
    fn test_read_rule_ids() {
        let mut r = DefinitionReader::new("( 1 2 3 )");
        assert_eq!(r.read_rule_ids().unwrap(), vec![1, 2, 3]);

        let mut r = DefinitionReader::new("12");
        assert_eq!(r.read_rule_ids().unwrap(), vec![12]);
    }

    #[test]
    fn test_missing_open_paren() {
        let mut r = DefinitionReader::new("2.5.4.3 NAME 'cn'");
        assert!(r.expect_open_paren().is_err());
    }

    #[test]
    fn test_unterminated_definition() {
        let mut r = DefinitionReader::new("( 2.5.4.3 NAME 'cn'");
        r.expect_open_paren().unwrap();
        r.read_oid().unwrap();
        r.read_token_name().unwrap();
        r.read_name_descriptors().unwrap();
        assert!(r.read_token_name().is_err());
    }

    #[test]
    fn test_extension_token_classification() {
        assert!(is_extension_token("X-ORIGIN"));
        assert!(is_extension_token("X-SUBST"));
        assert!(is_extension_token("X-ENUM"));
        assert!(!is_extension_token("X-"));
        assert!(!is_extension_token("NAME"));
        assert!(!is_extension_token("X-ORIGIN2"));
    }
}
