// Fast-Infoset-Dokumente für die Integrationstests, Byte für Byte gebaut.
//
// Wird per `include!` eingebunden. Keine Imports nötig.

/// Binärer Header ohne optionale Teile.
#[allow(dead_code)]
const FI_HEADER: [u8; 5] = [0xE0, 0x00, 0x00, 0x01, 0x00];

/// Länge ab dem 2. Bit (Identifying Strings, C.22).
#[allow(dead_code)]
fn push_length_on_second_bit(out: &mut Vec<u8>, len: usize, flags: u8) {
    match len {
        1..=64 => out.push(flags | (len - 1) as u8),
        65..=320 => out.extend_from_slice(&[flags | 0x40, (len - 65) as u8]),
        _ => {
            out.push(flags | 0x60);
            out.extend_from_slice(&((len - 321) as u32).to_be_bytes());
        }
    }
}

/// Länge ab dem 5. Bit (Non-Identifying Strings, C.23).
#[allow(dead_code)]
fn push_length_on_fifth_bit(out: &mut Vec<u8>, len: usize, flags: u8) {
    match len {
        1..=8 => out.push(flags | (len - 1) as u8),
        9..=264 => out.extend_from_slice(&[flags | 0x08, (len - 9) as u8]),
        _ => {
            out.push(flags | 0x0C);
            out.extend_from_slice(&((len - 265) as u32).to_be_bytes());
        }
    }
}

/// Länge ab dem 7. Bit (Character Chunks, C.24).
#[allow(dead_code)]
fn push_length_on_seventh_bit(out: &mut Vec<u8>, len: usize, flags: u8) {
    match len {
        1..=2 => out.push(flags | (len - 1) as u8),
        3..=258 => out.extend_from_slice(&[flags | 0x02, (len - 3) as u8]),
        _ => {
            out.push(flags | 0x03);
            out.extend_from_slice(&((len - 259) as u32).to_be_bytes());
        }
    }
}

/// Builder für FI-Dokumente mit literalen Namen.
#[allow(dead_code)]
struct Fi {
    bytes: Vec<u8>,
}

#[allow(dead_code)]
impl Fi {
    fn new() -> Self {
        Self { bytes: FI_HEADER.to_vec() }
    }

    fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    fn literal(mut self, s: &str) -> Self {
        push_length_on_second_bit(&mut self.bytes, s.len(), 0x00);
        self.bytes.extend_from_slice(s.as_bytes());
        self
    }

    /// Element ohne Namespace und ohne Attribute.
    fn start(self, local: &str) -> Self {
        self.raw(&[0x3C]).literal(local)
    }

    /// Element ohne Namespace, Attribute folgen.
    fn start_with_attributes(self, local: &str) -> Self {
        self.raw(&[0x7C]).literal(local)
    }

    fn attribute(mut self, local: &str, value: &str) -> Self {
        self.bytes.push(0x78);
        self = self.literal(local);
        if value.is_empty() {
            return self.raw(&[0xFF]);
        }
        push_length_on_fifth_bit(&mut self.bytes, value.len(), 0x00);
        self.bytes.extend_from_slice(value.as_bytes());
        self
    }

    fn text(mut self, s: &str) -> Self {
        push_length_on_seventh_bit(&mut self.bytes, s.len(), 0x80);
        self.bytes.extend_from_slice(s.as_bytes());
        self
    }

    /// Character Chunk mit Encoding Algorithm `id`.
    fn algorithm(mut self, id: u8, data: &[u8]) -> Self {
        self.bytes.push(0x8C | (id >> 6));
        push_length_on_seventh_bit(&mut self.bytes, data.len(), (id & 0x3F) << 2);
        self.bytes.extend_from_slice(data);
        self
    }

    /// Wie `algorithm`, der Text kommt zusätzlich in die Content-Tabelle.
    fn added_algorithm(mut self, id: u8, data: &[u8]) -> Self {
        self.bytes.push(0x9C | (id >> 6));
        push_length_on_seventh_bit(&mut self.bytes, data.len(), (id & 0x3F) << 2);
        self.bytes.extend_from_slice(data);
        self
    }

    /// Character Chunk per Index (0..16) aus der Content-Tabelle.
    fn chunk_index(self, index: u8) -> Self {
        self.raw(&[0xA0 | index])
    }

    fn comment(mut self, s: &str) -> Self {
        self.bytes.push(0xE2);
        push_length_on_fifth_bit(&mut self.bytes, s.len(), 0x00);
        self.bytes.extend_from_slice(s.as_bytes());
        self
    }

    fn pi(mut self, target: &str, data: &str) -> Self {
        self.bytes.push(0xE1);
        self = self.literal(target);
        push_length_on_fifth_bit(&mut self.bytes, data.len(), 0x00);
        self.bytes.extend_from_slice(data.as_bytes());
        self
    }

    /// Terminator: schließt ein Element (oder die Attributliste).
    fn end(self) -> Self {
        self.raw(&[0xF0])
    }

    fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

/// Eine Zeile pro Event, für Vergleiche ganzer Dokumente.
#[allow(dead_code)]
fn trace<C: finset::Cursor>(cursor: &mut C) -> finset::Result<Vec<String>> {
    use finset::EventKind;
    let mut lines = Vec::new();
    loop {
        let kind = cursor.advance()?;
        let line = match kind {
            EventKind::StartElement => {
                let mut line = format!("SE {} d{}", cursor.name()?, cursor.depth());
                for i in 0..cursor.namespace_count()? {
                    let ns = cursor.namespace_at(i)?;
                    line.push_str(&format!(" xmlns:{}={}", ns.prefix, ns.uri));
                }
                for i in 0..cursor.attribute_count()? {
                    let at = cursor.attribute_at(i)?;
                    line.push_str(&format!(" @{}={}", at.name, at.value()));
                }
                line
            }
            EventKind::EndElement => format!("EE {} d{}", cursor.name()?, cursor.depth()),
            EventKind::Characters => format!("CH {}", cursor.text()?),
            EventKind::Cdata => format!("CD {}", cursor.text()?),
            EventKind::Comment => format!("CM {}", cursor.text()?),
            EventKind::ProcessingInstruction => format!("PI {} {}", cursor.pi_target()?, cursor.pi_data()?),
            EventKind::EntityReference => format!("ER {}", cursor.local_name()?),
            other => other.as_str().to_string(),
        };
        lines.push(line);
        if kind == EventKind::EndDocument {
            return Ok(lines);
        }
    }
}
