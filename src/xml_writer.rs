//! Cursor → XML Serialisierung.
//!
//! Schreibt die Events eines [`Decoder`] als XML 1.0 Text. Namespace-Deklarationen
//! und Präfixe werden so übernommen, wie sie im Fast-Infoset-Dokument stehen.
//!
//! Eine DOCTYPE-Deklaration trägt in Fast Infoset keinen Wurzelnamen; sie wird
//! daher erst vor dem ersten Start-Tag geschrieben.

use std::io::Write;

use crate::byte_cursor::ByteSource;
use crate::decoder::{Cursor, Decoder};
use crate::error::{Error, Result};
use crate::event::{EventKind, ProcessingInstruction};

/// Serialisiert ein komplettes Dokument und gibt den Writer zurück.
pub fn write_document<S: ByteSource, W: Write>(decoder: &mut Decoder<S>, writer: W) -> Result<W> {
    decoder.read_header()?;
    let mut xml = XmlWriter::new(writer);
    xml.write_declaration(decoder)?;
    loop {
        let kind = decoder.advance()?;
        xml.process(decoder, kind)?;
        if kind == EventKind::EndDocument {
            break;
        }
    }
    xml.finish()
}

/// Serialisiert ein komplettes Dokument als String.
pub fn document_to_string<S: ByteSource>(decoder: &mut Decoder<S>) -> Result<String> {
    let bytes = write_document(decoder, Vec::new())?;
    String::from_utf8(bytes).map_err(|_| Error::InvalidCharacter("serialized XML is not UTF-8".into()))
}

/// Schreibt einen String als Bytes in den Writer.
#[inline]
fn put(writer: &mut impl Write, s: &str) -> Result<()> {
    writer.write_all(s.as_bytes())?;
    Ok(())
}

/// XML-Escaping mit memchr3: sucht drei Zeichen gleichzeitig und ersetzt sie.
/// Blöcke ohne Escape-Zeichen werden in einem Stück geschrieben.
fn write_escaped_memchr3(
    w: &mut impl Write,
    s: &str,
    needle: [u8; 3],
    replacement: [&[u8]; 3],
) -> Result<()> {
    let bytes = s.as_bytes();
    let mut start = 0;
    while let Some(offset) = memchr::memchr3(needle[0], needle[1], needle[2], &bytes[start..]) {
        let pos = start + offset;
        w.write_all(&bytes[start..pos])?;
        let replace = match bytes[pos] {
            b if b == needle[0] => replacement[0],
            b if b == needle[1] => replacement[1],
            _ => replacement[2],
        };
        w.write_all(replace)?;
        start = pos + 1;
    }
    w.write_all(&bytes[start..])?;
    Ok(())
}

/// Text-Inhalt: & < > → &amp; &lt; &gt;
fn write_escaped_text(w: &mut impl Write, s: &str) -> Result<()> {
    write_escaped_memchr3(w, s, [b'&', b'<', b'>'], [b"&amp;", b"&lt;", b"&gt;"])
}

/// Attribut-Werte: & < " → &amp; &lt; &quot;
fn write_escaped_attr(w: &mut impl Write, s: &str) -> Result<()> {
    write_escaped_memchr3(w, s, [b'&', b'<', b'"'], [b"&amp;", b"&lt;", b"&quot;"])
}

fn write_comment(w: &mut impl Write, text: &str) -> Result<()> {
    if text.contains("--") || text.ends_with('-') {
        return Err(Error::malformed("comment text contains '--' or ends with '-'"));
    }
    put(w, "<!--")?;
    put(w, text)?;
    put(w, "-->")
}

fn write_pi(w: &mut impl Write, target: &str, data: &str) -> Result<()> {
    if data.contains("?>") {
        return Err(Error::malformed("processing instruction data contains '?>'"));
    }
    put(w, "<?")?;
    put(w, target)?;
    if !data.is_empty() {
        put(w, " ")?;
        put(w, data)?;
    }
    put(w, "?>")
}

/// `]]>` kann nicht in einem CDATA-Abschnitt stehen, dann wird escaped.
fn write_cdata(w: &mut impl Write, text: &str) -> Result<()> {
    if memchr::memmem::find(text.as_bytes(), b"]]>").is_some() {
        return write_escaped_text(w, text);
    }
    put(w, "<![CDATA[")?;
    put(w, text)?;
    put(w, "]]>")
}

fn write_quoted(w: &mut impl Write, value: &str) -> Result<()> {
    put(w, "\"")?;
    write_escaped_attr(w, value)?;
    put(w, "\"")
}

/// DOCTYPE-Daten bis zum ersten Start-Tag.
#[derive(Debug, Default)]
struct PendingDoctype {
    system_id: Option<String>,
    public_id: Option<String>,
    instructions: Vec<ProcessingInstruction>,
}

/// Streaming XML writer driven by decoder events.
pub struct XmlWriter<W: Write> {
    writer: W,
    /// Start-Tag ist offen (`<a x="1"` ohne `>`).
    start_open: bool,
    doctype: Option<PendingDoctype>,
}

impl<W: Write> XmlWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            start_open: false,
            doctype: None,
        }
    }

    /// Schreibt `<?xml ...?>`, wenn der Header Version oder Standalone trägt.
    pub fn write_declaration<S: ByteSource>(&mut self, decoder: &Decoder<S>) -> Result<()> {
        let version = decoder.xml_version();
        let standalone = decoder.standalone();
        if version.is_none() && standalone.is_none() {
            return Ok(());
        }
        put(&mut self.writer, "<?xml version=\"")?;
        put(&mut self.writer, version.unwrap_or("1.0"))?;
        put(&mut self.writer, "\" encoding=\"")?;
        put(&mut self.writer, decoder.encoding())?;
        put(&mut self.writer, "\"")?;
        if let Some(standalone) = standalone {
            put(&mut self.writer, if standalone { " standalone=\"yes\"" } else { " standalone=\"no\"" })?;
        }
        put(&mut self.writer, "?>")
    }

    /// Schreibt das aktuelle Event des Decoders.
    pub fn process<S: ByteSource>(&mut self, decoder: &Decoder<S>, kind: EventKind) -> Result<()> {
        match kind {
            EventKind::StartDocument => {}
            EventKind::EndDocument => {
                self.close_start()?;
                self.flush_doctype(None)?;
            }
            EventKind::StartElement => {
                self.close_start()?;
                let name = decoder.name()?;
                self.flush_doctype(Some(&name.raw))?;
                put(&mut self.writer, "<")?;
                put(&mut self.writer, &name.raw)?;
                for i in 0..decoder.namespace_count()? {
                    let binding = decoder.namespace_at(i)?;
                    if binding.prefix.is_empty() {
                        put(&mut self.writer, " xmlns=")?;
                    } else {
                        put(&mut self.writer, " xmlns:")?;
                        put(&mut self.writer, &binding.prefix)?;
                        put(&mut self.writer, "=")?;
                    }
                    write_quoted(&mut self.writer, &binding.uri)?;
                }
                for i in 0..decoder.attribute_count()? {
                    let attribute = decoder.attribute_at(i)?;
                    put(&mut self.writer, " ")?;
                    put(&mut self.writer, &attribute.name.raw)?;
                    put(&mut self.writer, "=")?;
                    write_quoted(&mut self.writer, attribute.value())?;
                }
                self.start_open = true;
            }
            EventKind::EndElement => {
                if self.start_open {
                    self.start_open = false;
                    put(&mut self.writer, "/>")?;
                } else {
                    put(&mut self.writer, "</")?;
                    put(&mut self.writer, &decoder.name()?.raw)?;
                    put(&mut self.writer, ">")?;
                }
            }
            EventKind::Characters => {
                self.close_start()?;
                write_escaped_text(&mut self.writer, decoder.text()?)?;
            }
            EventKind::Cdata => {
                self.close_start()?;
                write_cdata(&mut self.writer, decoder.text()?)?;
            }
            EventKind::Comment => {
                self.close_start()?;
                write_comment(&mut self.writer, decoder.text()?)?;
            }
            EventKind::ProcessingInstruction => {
                self.close_start()?;
                write_pi(&mut self.writer, decoder.pi_target()?, decoder.pi_data()?)?;
            }
            EventKind::EntityReference => {
                self.close_start()?;
                put(&mut self.writer, "&")?;
                put(&mut self.writer, decoder.local_name()?)?;
                put(&mut self.writer, ";")?;
            }
            EventKind::Dtd => {
                self.doctype = Some(PendingDoctype {
                    system_id: decoder.dtd_system_id()?.map(str::to_owned),
                    public_id: decoder.dtd_public_id()?.map(str::to_owned),
                    instructions: decoder.dtd_instructions()?.to_vec(),
                });
            }
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn close_start(&mut self) -> Result<()> {
        if self.start_open {
            self.start_open = false;
            put(&mut self.writer, ">")?;
        }
        Ok(())
    }

    /// Ohne Wurzelelement wird die Deklaration verworfen.
    fn flush_doctype(&mut self, root: Option<&str>) -> Result<()> {
        let Some(doctype) = self.doctype.take() else {
            return Ok(());
        };
        let Some(root) = root else {
            return Ok(());
        };
        put(&mut self.writer, "<!DOCTYPE ")?;
        put(&mut self.writer, root)?;
        match (&doctype.public_id, &doctype.system_id) {
            (Some(public), system) => {
                put(&mut self.writer, " PUBLIC ")?;
                write_quoted(&mut self.writer, public)?;
                put(&mut self.writer, " ")?;
                write_quoted(&mut self.writer, system.as_deref().unwrap_or(""))?;
            }
            (None, Some(system)) => {
                put(&mut self.writer, " SYSTEM ")?;
                write_quoted(&mut self.writer, system)?;
            }
            (None, None) => {}
        }
        if !doctype.instructions.is_empty() {
            put(&mut self.writer, " [")?;
            for pi in &doctype.instructions {
                write_pi(&mut self.writer, &pi.target, &pi.data)?;
            }
            put(&mut self.writer, "]")?;
        }
        put(&mut self.writer, ">")
    }
}
