//! Rendering stored node trees as receiver events.
//!
//! The broker's pull readers yield one [`StreamEvent`] at a time over an
//! index-backed subtree; this module turns those into the SAX-style
//! [`Receiver`] sequence without ever materializing a document.

use xylodb_core::Document;

use crate::broker::{NodeKind, StorageBroker, StreamEvent, XmlStreamReader};
use crate::error::ExportResult;
use crate::serializer::{AttrList, Receiver};

/// Stream one document's node tree to `receiver`.
///
/// Document framing (`start_document`/`end_document`) is the caller's job;
/// reader-level document events are suppressed. For each element,
/// `start_prefix_mapping` events precede `start_element` for every prefix
/// newly declared there, and `end_prefix_mapping` events follow
/// `end_element` in the same order. Top-level comment and
/// processing-instruction children are single-event streams.
///
/// # Errors
///
/// Propagates broker read failures and receiver write failures.
pub fn write_document<B, R>(broker: &B, doc: &Document, receiver: &mut R) -> ExportResult<()>
where
    B: StorageBroker + ?Sized,
    R: Receiver + ?Sized,
{
    for node in broker.document_nodes(doc)? {
        let mut reader = broker.xml_stream_reader(doc, &node)?;
        // prefixes declared per open element, reset for every top-level child
        let mut declared: Vec<Vec<String>> = Vec::new();
        let single_event =
            matches!(node.kind, NodeKind::Comment | NodeKind::ProcessingInstruction);

        while let Some(event) = reader.next_event()? {
            match event {
                StreamEvent::StartDocument | StreamEvent::EndDocument => continue,
                StreamEvent::StartElement { name, attributes, namespaces } => {
                    for ns in &namespaces {
                        receiver.start_prefix_mapping(&ns.prefix, &ns.uri)?;
                    }
                    let mut attrs = AttrList::new();
                    for attribute in attributes {
                        attrs.add(attribute.name, attribute.value);
                    }
                    receiver.start_element(&name, &attrs)?;
                    declared.push(namespaces.into_iter().map(|ns| ns.prefix).collect());
                }
                StreamEvent::EndElement { name } => {
                    receiver.end_element(&name)?;
                    if let Some(prefixes) = declared.pop() {
                        for prefix in prefixes {
                            receiver.end_prefix_mapping(&prefix)?;
                        }
                    }
                }
                StreamEvent::Characters(text) => receiver.characters(&text)?,
                StreamEvent::Cdata(text) => receiver.cdata_section(&text)?,
                StreamEvent::Comment(text) => receiver.comment(&text)?,
                StreamEvent::ProcessingInstruction { target, data } => {
                    receiver.processing_instruction(&target, &data)?;
                }
            }
            if single_event {
                break;
            }
        }
    }
    Ok(())
}
