//! Streaming reader for collection manifests.
//!
//! Manifests are machine-written by this engine, so the reader is a small
//! non-validating scanner rather than a general XML parser: it understands
//! the declaration, comments, start/empty/end element tags with
//! double-quoted attributes, and the five predefined entities. Anything
//! else is a malformed manifest.

use crate::error::{ExportError, ExportResult};

/// Attributes of one manifest element, in document order.
#[derive(Debug, Default, Clone)]
pub struct Attributes {
    items: Vec<(String, String)>,
}

impl Attributes {
    /// Look up an attribute value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.items.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    /// Iterate attributes in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// Visitor driven by [`parse_manifest`].
pub trait ManifestVisitor {
    /// An element started. `local` has any namespace prefix stripped.
    ///
    /// # Errors
    ///
    /// Errors propagate out of the parse.
    fn start_element(&mut self, local: &str, attributes: &Attributes) -> ExportResult<()>;

    /// An element ended.
    ///
    /// # Errors
    ///
    /// Errors propagate out of the parse.
    fn end_element(&mut self, local: &str) -> ExportResult<()> {
        let _ = local;
        Ok(())
    }
}

/// Parse manifest bytes, driving the visitor.
///
/// # Errors
///
/// Returns [`ExportError::Manifest`] on malformed input; visitor errors
/// propagate unchanged.
pub fn parse_manifest(input: &[u8], visitor: &mut dyn ManifestVisitor) -> ExportResult<()> {
    let text = std::str::from_utf8(input)
        .map_err(|e| ExportError::Manifest(format!("manifest is not UTF-8: {e}")))?;
    let mut parser = Parser { text, pos: 0 };
    let mut open: Vec<String> = Vec::new();

    loop {
        parser.skip_until_tag();
        if parser.at_end() {
            break;
        }
        if parser.eat("<?") {
            parser.skip_past("?>")?;
        } else if parser.eat("<!--") {
            parser.skip_past("-->")?;
        } else if parser.eat("</") {
            let name = parser.read_name()?;
            parser.skip_whitespace();
            parser.expect('>')?;
            let local = local_part(&name);
            match open.pop() {
                Some(expected) if expected == local => visitor.end_element(local)?,
                Some(expected) => {
                    return Err(ExportError::Manifest(format!(
                        "mismatched end tag: expected </{expected}>, found </{local}>"
                    )))
                }
                None => {
                    return Err(ExportError::Manifest(format!("unexpected end tag </{local}>")))
                }
            }
        } else if parser.eat("<") {
            let name = parser.read_name()?;
            let mut attributes = Attributes::default();
            loop {
                parser.skip_whitespace();
                if parser.eat("/>") {
                    let local = local_part(&name);
                    visitor.start_element(local, &attributes)?;
                    visitor.end_element(local)?;
                    break;
                }
                if parser.eat(">") {
                    let local = local_part(&name);
                    visitor.start_element(local, &attributes)?;
                    open.push(local.to_owned());
                    break;
                }
                let attr_name = parser.read_name()?;
                parser.skip_whitespace();
                parser.expect('=')?;
                parser.skip_whitespace();
                parser.expect('"')?;
                let value = parser.read_attr_value()?;
                attributes.items.push((attr_name.to_owned(), value));
            }
        } else {
            return Err(ExportError::Manifest("stray markup in manifest".to_owned()));
        }
    }

    if let Some(unclosed) = open.pop() {
        return Err(ExportError::Manifest(format!("unclosed element <{unclosed}>")));
    }
    Ok(())
}

fn local_part(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    /// Advance to the next `<`, ignoring intervening character data.
    fn skip_until_tag(&mut self) {
        match self.rest().find('<') {
            Some(idx) => self.pos += idx,
            None => self.pos = self.text.len(),
        }
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.text.len() - trimmed.len();
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, ch: char) -> ExportResult<()> {
        if self.rest().starts_with(ch) {
            self.pos += ch.len_utf8();
            Ok(())
        } else {
            Err(ExportError::Manifest(format!("expected {ch:?} at byte {}", self.pos)))
        }
    }

    fn skip_past(&mut self, token: &str) -> ExportResult<()> {
        match self.rest().find(token) {
            Some(idx) => {
                self.pos += idx + token.len();
                Ok(())
            }
            None => Err(ExportError::Manifest(format!("unterminated section, missing {token:?}"))),
        }
    }

    fn read_name(&mut self) -> ExportResult<&'a str> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '=' | '>' | '/' | '"'))
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(ExportError::Manifest(format!("expected a name at byte {}", self.pos)));
        }
        self.pos += end;
        Ok(&rest[..end])
    }

    fn read_attr_value(&mut self) -> ExportResult<String> {
        let rest = self.rest();
        let end = rest
            .find('"')
            .ok_or_else(|| ExportError::Manifest("unterminated attribute value".to_owned()))?;
        let raw = &rest[..end];
        self.pos += end + 1;
        decode_entities(raw)
    }
}

fn decode_entities(raw: &str) -> ExportResult<String> {
    if !raw.contains('&') {
        return Ok(raw.to_owned());
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];
        let end = rest
            .find(';')
            .ok_or_else(|| ExportError::Manifest(format!("unterminated entity in {raw:?}")))?;
        match &rest[..=end] {
            "&amp;" => out.push('&'),
            "&lt;" => out.push('<'),
            "&gt;" => out.push('>'),
            "&quot;" => out.push('"'),
            "&apos;" => out.push('\''),
            other => {
                return Err(ExportError::Manifest(format!("unknown entity {other:?}")));
            }
        }
        rest = &rest[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Collector {
        events: Vec<String>,
    }

    impl ManifestVisitor for Collector {
        fn start_element(&mut self, local: &str, attributes: &Attributes) -> ExportResult<()> {
            let attrs: Vec<String> =
                attributes.iter().map(|(n, v)| format!("{n}={v}")).collect();
            self.events.push(format!("<{local} {}", attrs.join(",")));
            Ok(())
        }

        fn end_element(&mut self, local: &str) -> ExportResult<()> {
            self.events.push(format!("</{local}"));
            Ok(())
        }
    }

    #[test]
    fn parses_typical_manifest() {
        let input = br#"<?xml version="1.0" encoding="UTF-8"?>
<collection xmlns="urn:test" name="/db/c" version="1">
  <resource name="a.xml" skip="no"/>
  <subcollection name="sub" filename="sub"/>
</collection>"#;
        let mut collector = Collector::default();
        parse_manifest(input, &mut collector).unwrap();
        assert_eq!(
            collector.events,
            vec![
                "<collection xmlns=urn:test,name=/db/c,version=1",
                "<resource name=a.xml,skip=no",
                "</resource",
                "<subcollection name=sub,filename=sub",
                "</subcollection",
                "</collection",
            ]
        );
    }

    #[test]
    fn decodes_entities() {
        let input = br#"<r name="a &amp; b &quot;c&quot;"/>"#;
        let mut collector = Collector::default();
        parse_manifest(input, &mut collector).unwrap();
        assert_eq!(collector.events[0], r#"<r name=a & b "c""#);
    }

    #[test]
    fn strips_element_prefixes() {
        let input = br#"<x:r xmlns:x="urn:t" x:a="1"></x:r>"#;
        let mut collector = Collector::default();
        parse_manifest(input, &mut collector).unwrap();
        assert_eq!(collector.events, vec!["<r xmlns:x=urn:t,x:a=1", "</r"]);
    }

    #[test]
    fn rejects_mismatched_tags() {
        let input = br#"<a><b></a></b>"#;
        let mut collector = Collector::default();
        assert!(matches!(
            parse_manifest(input, &mut collector),
            Err(ExportError::Manifest(_))
        ));
    }

    #[test]
    fn rejects_unclosed_elements() {
        let input = br#"<a><b></b>"#;
        let mut collector = Collector::default();
        assert!(parse_manifest(input, &mut collector).is_err());
    }

    #[test]
    fn skips_comments() {
        let input = br#"<!-- header --><r/><!-- footer -->"#;
        let mut collector = Collector::default();
        parse_manifest(input, &mut collector).unwrap();
        assert_eq!(collector.events, vec!["<r ", "</r"]);
    }
}
