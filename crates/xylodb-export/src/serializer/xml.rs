//! XML text rendering of receiver events.

use std::io::Write;

use xylodb_core::QName;

use crate::error::ExportResult;
use crate::serializer::{AttrList, Receiver};

/// Output settings for one serialized document.
#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    /// Indent child elements by two spaces per depth level.
    pub indent: bool,
    /// Suppress the XML declaration.
    pub omit_declaration: bool,
}

impl OutputOptions {
    /// Settings for resource payloads: declaration, no indent.
    #[must_use]
    pub const fn document() -> Self {
        Self { indent: false, omit_declaration: false }
    }

    /// Settings for collection manifests: declaration, indented.
    #[must_use]
    pub const fn manifest() -> Self {
        Self { indent: true, omit_declaration: false }
    }
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self::document()
    }
}

/// Per-open-element bookkeeping.
#[derive(Debug, Default)]
struct Level {
    has_child_elements: bool,
    has_text: bool,
}

/// Renders [`Receiver`] events as XML text over any [`Write`] sink.
///
/// Elements with no content are collapsed to the empty-element form. When
/// indenting, a child element is placed on its own line unless its parent
/// already received text content.
pub struct XmlSerializer<W: Write> {
    writer: W,
    options: OutputOptions,
    stack: Vec<Level>,
    tag_open: bool,
    pending_namespaces: Vec<(String, String)>,
}

impl<W: Write> XmlSerializer<W> {
    /// Create a serializer over `writer`.
    pub fn new(writer: W, options: OutputOptions) -> Self {
        Self { writer, options, stack: Vec::new(), tag_open: false, pending_namespaces: Vec::new() }
    }

    /// Recover the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn close_pending_tag(&mut self) -> ExportResult<()> {
        if self.tag_open {
            self.writer.write_all(b">")?;
            self.tag_open = false;
        }
        Ok(())
    }

    fn write_indent(&mut self) -> ExportResult<()> {
        self.writer.write_all(b"\n")?;
        for _ in 0..self.stack.len() {
            self.writer.write_all(b"  ")?;
        }
        Ok(())
    }

    fn indent_for_child(&mut self) -> ExportResult<()> {
        let suppressed = self.stack.last().is_some_and(|l| l.has_text);
        if self.options.indent && !suppressed {
            self.write_indent()?;
        }
        Ok(())
    }

    fn write_escaped_text(&mut self, text: &str) -> ExportResult<()> {
        for ch in text.chars() {
            match ch {
                '&' => self.writer.write_all(b"&amp;")?,
                '<' => self.writer.write_all(b"&lt;")?,
                '>' => self.writer.write_all(b"&gt;")?,
                _ => write!(self.writer, "{ch}")?,
            }
        }
        Ok(())
    }

    fn write_escaped_attr(&mut self, value: &str) -> ExportResult<()> {
        for ch in value.chars() {
            match ch {
                '&' => self.writer.write_all(b"&amp;")?,
                '<' => self.writer.write_all(b"&lt;")?,
                '"' => self.writer.write_all(b"&quot;")?,
                _ => write!(self.writer, "{ch}")?,
            }
        }
        Ok(())
    }
}

impl<W: Write> Receiver for XmlSerializer<W> {
    fn start_document(&mut self) -> ExportResult<()> {
        if !self.options.omit_declaration {
            self.writer.write_all(br#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
            if self.options.indent {
                self.writer.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    fn end_document(&mut self) -> ExportResult<()> {
        if self.options.indent {
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) -> ExportResult<()> {
        self.pending_namespaces.push((prefix.to_owned(), uri.to_owned()));
        Ok(())
    }

    fn end_prefix_mapping(&mut self, _prefix: &str) -> ExportResult<()> {
        Ok(())
    }

    fn start_element(&mut self, name: &QName, attributes: &AttrList) -> ExportResult<()> {
        self.close_pending_tag()?;
        if let Some(parent) = self.stack.last_mut() {
            parent.has_child_elements = true;
        }
        if !self.stack.is_empty() {
            self.indent_for_child()?;
        }
        write!(self.writer, "<{}", name.qualified())?;
        let pending = std::mem::take(&mut self.pending_namespaces);
        for (prefix, uri) in &pending {
            if prefix.is_empty() {
                self.writer.write_all(b" xmlns=\"")?;
            } else {
                write!(self.writer, " xmlns:{prefix}=\"")?;
            }
            self.write_escaped_attr(uri)?;
            self.writer.write_all(b"\"")?;
        }
        for (attr_name, value) in attributes.iter() {
            write!(self.writer, " {}=\"", attr_name.qualified())?;
            self.write_escaped_attr(value)?;
            self.writer.write_all(b"\"")?;
        }
        self.tag_open = true;
        self.stack.push(Level::default());
        Ok(())
    }

    fn end_element(&mut self, name: &QName) -> ExportResult<()> {
        let level = self.stack.pop().unwrap_or_default();
        if self.tag_open {
            self.writer.write_all(b"/>")?;
            self.tag_open = false;
        } else {
            if self.options.indent && level.has_child_elements && !level.has_text {
                self.write_indent()?;
            }
            write!(self.writer, "</{}>", name.qualified())?;
        }
        Ok(())
    }

    fn characters(&mut self, text: &str) -> ExportResult<()> {
        self.close_pending_tag()?;
        if let Some(level) = self.stack.last_mut() {
            level.has_text = true;
        }
        self.write_escaped_text(text)
    }

    fn cdata_section(&mut self, text: &str) -> ExportResult<()> {
        self.close_pending_tag()?;
        if let Some(level) = self.stack.last_mut() {
            level.has_text = true;
        }
        self.writer.write_all(b"<![CDATA[")?;
        self.writer.write_all(text.as_bytes())?;
        self.writer.write_all(b"]]>")?;
        Ok(())
    }

    fn comment(&mut self, text: &str) -> ExportResult<()> {
        self.close_pending_tag()?;
        if !self.stack.is_empty() {
            self.indent_for_child()?;
        }
        write!(self.writer, "<!--{text}-->")?;
        Ok(())
    }

    fn processing_instruction(&mut self, target: &str, data: &str) -> ExportResult<()> {
        self.close_pending_tag()?;
        if !self.stack.is_empty() {
            self.indent_for_child()?;
        }
        if data.is_empty() {
            write!(self.writer, "<?{target}?>")?;
        } else {
            write!(self.writer, "<?{target} {data}?>")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(options: OutputOptions, f: impl FnOnce(&mut XmlSerializer<&mut Vec<u8>>)) -> String {
        let mut buf = Vec::new();
        let mut ser = XmlSerializer::new(&mut buf, options);
        f(&mut ser);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn empty_element_collapses() {
        let out = render(OutputOptions::document(), |ser| {
            ser.start_document().unwrap();
            ser.start_element(&QName::new("r"), &AttrList::new()).unwrap();
            ser.end_element(&QName::new("r")).unwrap();
            ser.end_document().unwrap();
        });
        assert_eq!(out, r#"<?xml version="1.0" encoding="UTF-8"?><r/>"#);
    }

    #[test]
    fn text_and_attributes_escaped() {
        let out = render(OutputOptions::document(), |ser| {
            ser.start_document().unwrap();
            let mut attrs = AttrList::new();
            attrs.add(QName::new("q"), r#"a"b<c"#);
            ser.start_element(&QName::new("r"), &attrs).unwrap();
            ser.characters("x < y & z").unwrap();
            ser.end_element(&QName::new("r")).unwrap();
            ser.end_document().unwrap();
        });
        assert_eq!(
            out,
            r#"<?xml version="1.0" encoding="UTF-8"?><r q="a&quot;b&lt;c">x &lt; y &amp; z</r>"#
        );
    }

    #[test]
    fn default_namespace_rendered() {
        let out = render(OutputOptions::document(), |ser| {
            ser.start_document().unwrap();
            ser.start_prefix_mapping("", "urn:test").unwrap();
            ser.start_element(&QName::namespaced("r", "urn:test"), &AttrList::new()).unwrap();
            ser.end_element(&QName::namespaced("r", "urn:test")).unwrap();
            ser.end_prefix_mapping("").unwrap();
            ser.end_document().unwrap();
        });
        assert_eq!(out, r#"<?xml version="1.0" encoding="UTF-8"?><r xmlns="urn:test"/>"#);
    }

    #[test]
    fn prefixed_namespace_rendered() {
        let out = render(OutputOptions::document(), |ser| {
            ser.start_document().unwrap();
            ser.start_prefix_mapping("p", "urn:test").unwrap();
            let name = QName::prefixed("p", "r", "urn:test");
            ser.start_element(&name, &AttrList::new()).unwrap();
            ser.characters("hi").unwrap();
            ser.end_element(&name).unwrap();
            ser.end_prefix_mapping("p").unwrap();
            ser.end_document().unwrap();
        });
        assert_eq!(
            out,
            r#"<?xml version="1.0" encoding="UTF-8"?><p:r xmlns:p="urn:test">hi</p:r>"#
        );
    }

    #[test]
    fn manifest_indentation() {
        let out = render(OutputOptions::manifest(), |ser| {
            ser.start_document().unwrap();
            ser.start_element(&QName::new("collection"), &AttrList::new()).unwrap();
            ser.start_element(&QName::new("resource"), &AttrList::new()).unwrap();
            ser.end_element(&QName::new("resource")).unwrap();
            ser.start_element(&QName::new("subcollection"), &AttrList::new()).unwrap();
            ser.end_element(&QName::new("subcollection")).unwrap();
            ser.end_element(&QName::new("collection")).unwrap();
            ser.end_document().unwrap();
        });
        let expected = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                        <collection>\n  <resource/>\n  <subcollection/>\n</collection>\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn comment_and_pi() {
        let out = render(OutputOptions::document(), |ser| {
            ser.start_document().unwrap();
            ser.comment(" note ").unwrap();
            ser.processing_instruction("xml-stylesheet", "href=\"s.css\"").unwrap();
            ser.start_element(&QName::new("r"), &AttrList::new()).unwrap();
            ser.cdata_section("1 < 2").unwrap();
            ser.end_element(&QName::new("r")).unwrap();
            ser.end_document().unwrap();
        });
        assert_eq!(
            out,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><!-- note -->\
             <?xml-stylesheet href=\"s.css\"?><r><![CDATA[1 < 2]]></r>"
        );
    }
}
