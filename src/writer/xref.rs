//! Cross-reference table builder.
//!
//! The xref table maps object numbers to byte offsets in the PDF file,
//! enabling random access to PDF objects. The writer records each
//! object's offset at the moment it is emitted and renders the table
//! at the end of the file.

use crate::object::Object;
use crate::writer::serializer::ObjectSerializer;
use std::io::Write;

/// Write-side cross-reference table.
///
/// Offsets must be recorded in ascending object-id order starting at 1;
/// object 0 is the conventional free-list head.
#[derive(Debug, Clone, Default)]
pub struct XRefBuilder {
    /// Byte offsets indexed by object id - 1.
    offsets: Vec<u64>,
}

impl XRefBuilder {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the byte offset of the next object.
    ///
    /// Returns the object id the entry corresponds to.
    pub fn record(&mut self, offset: u64) -> u32 {
        self.offsets.push(offset);
        self.offsets.len() as u32
    }

    /// Number of recorded objects (excluding the free object 0).
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether any objects have been recorded.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Render the xref section, trailer and file terminator.
    ///
    /// `xref_offset` is the byte position at which this section begins;
    /// `root` is the id of the document catalog and `info` the id of
    /// the optional information dictionary.
    pub fn render<W: Write>(
        &self,
        w: &mut W,
        xref_offset: u64,
        root: u32,
        info: Option<u32>,
    ) -> std::io::Result<()> {
        write!(w, "xref\n0 {}\n", self.offsets.len() + 1)?;
        write!(w, "0000000000 65535 f \n")?;
        for offset in &self.offsets {
            write!(w, "{:010} 00000 n \n", offset)?;
        }

        let mut entries = vec![
            ("Size", Object::Integer(self.offsets.len() as i64 + 1)),
            ("Root", Object::reference(root)),
        ];
        if let Some(info) = info {
            entries.push(("Info", Object::reference(info)));
        }
        let trailer = Object::dict(entries);
        write!(w, "trailer\n")?;
        w.write_all(&ObjectSerializer::new().serialize(&trailer))?;
        write!(w, "\nstartxref\n{}\n%%EOF\n", xref_offset)
    }
}
