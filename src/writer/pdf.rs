//! Streaming PDF file writer.
//!
//! Writes a complete PDF file in a single pass: header, numbered
//! indirect objects (recording each byte offset as it goes), then the
//! cross-reference table and trailer. The writer enforces a strict
//! state machine; calls out of order are programming errors and
//! poison the writer.

use crate::error::{Error, Result};
use crate::object::Object;
use crate::writer::serializer::ObjectSerializer;
use crate::writer::xref::XRefBuilder;
use std::io::Write;

/// Writer lifecycle states.
///
/// Valid transitions: `Open → WritingHeader → WritingObjects →
/// WritingXRef → Closed`. `WritingHeader` and `WritingXRef` are only
/// observable mid-call; a failed write leaves the writer in them,
/// poisoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Open,
    WritingHeader,
    WritingObjects,
    WritingXRef,
    Closed,
}

/// Compress data for a `/FlateDecode` stream.
pub fn compress_data(data: &[u8]) -> std::io::Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Streaming serializer for a single PDF file.
///
/// Object ids are assigned by the caller and must be emitted in
/// ascending order starting at 1; the writer verifies this so the
/// cross-reference table can be built incrementally.
pub struct PdfWriter<W: Write> {
    sink: W,
    offset: u64,
    state: WriterState,
    xref: XRefBuilder,
    serializer: ObjectSerializer,
    /// Set when a sink write fails; every later call errors.
    poisoned: bool,
}

impl<W: Write> PdfWriter<W> {
    /// PDF header: version line plus a comment with four bytes above
    /// 0x7F, marking the file as binary for transfer programs.
    const HEADER: &'static [u8] = b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n";

    /// Create a writer over the given sink.
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            offset: 0,
            state: WriterState::Open,
            xref: XRefBuilder::new(),
            serializer: ObjectSerializer::new(),
            poisoned: false,
        }
    }

    /// Write the file header. Must be the first call.
    pub fn begin(&mut self) -> Result<()> {
        self.check_usable()?;
        if self.state != WriterState::Open {
            return Err(Error::InternalState("begin() requires an open writer"));
        }
        self.state = WriterState::WritingHeader;
        self.write_all(Self::HEADER)?;
        self.state = WriterState::WritingObjects;
        Ok(())
    }

    /// Emit one indirect object.
    ///
    /// `id` must be exactly one greater than the previously emitted id
    /// (ids start at 1); the current byte offset is recorded in the
    /// cross-reference table.
    pub fn write_object(&mut self, id: u32, obj: &Object) -> Result<()> {
        self.check_usable()?;
        if self.state != WriterState::WritingObjects {
            return Err(Error::InternalState("write_object() outside body section"));
        }
        if id != self.xref.len() as u32 + 1 {
            return Err(Error::InternalState("object ids must be emitted in order"));
        }
        self.xref.record(self.offset);
        let bytes = self.serializer.serialize_indirect(id, obj);
        self.write_all(&bytes)
    }

    /// Write the cross-reference table and trailer, then close.
    pub fn finish(&mut self, root: u32) -> Result<()> {
        self.finish_with_info(root, None)
    }

    /// Like [`finish`](Self::finish), also referencing an information
    /// dictionary from the trailer.
    pub fn finish_with_info(&mut self, root: u32, info: Option<u32>) -> Result<()> {
        self.check_usable()?;
        if self.state != WriterState::WritingObjects {
            return Err(Error::InternalState("finish() requires emitted objects"));
        }
        self.state = WriterState::WritingXRef;
        let mut buf = Vec::new();
        self.xref
            .render(&mut buf, self.offset, root, info)
            .expect("writing to Vec cannot fail");
        self.write_all(&buf)?;
        self.sink.flush()?;
        self.state = WriterState::Closed;
        log::debug!("wrote PDF: {} objects, {} bytes", self.xref.len(), self.offset);
        Ok(())
    }

    /// Number of objects emitted so far.
    pub fn objects_written(&self) -> usize {
        self.xref.len()
    }

    /// Current byte offset in the output.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn check_usable(&self) -> Result<()> {
        if self.poisoned {
            return Err(Error::InternalState("writer poisoned by an earlier IO error"));
        }
        Ok(())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        if let Err(e) = self.sink.write_all(bytes) {
            self.poisoned = true;
            return Err(e.into());
        }
        self.offset += bytes.len() as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_then_objects_then_xref() {
        let mut out = Vec::new();
        let mut w = PdfWriter::new(&mut out);
        w.begin().unwrap();
        w.write_object(1, &Object::dict(vec![("Type", Object::name("Catalog"))]))
            .unwrap();
        w.finish(1).unwrap();

        let s = String::from_utf8_lossy(&out);
        assert!(s.starts_with("%PDF-1.7\n"));
        assert!(s.contains("1 0 obj"));
        assert!(s.contains("xref\n0 2\n"));
        assert!(s.ends_with("%%EOF\n"));
    }

    #[test]
    fn test_offsets_match_emission_positions() {
        let mut out = Vec::new();
        let mut w = PdfWriter::new(&mut out);
        w.begin().unwrap();
        let first_offset = w.offset();
        w.write_object(1, &Object::Integer(1)).unwrap();
        let second_offset = w.offset();
        w.write_object(2, &Object::Integer(2)).unwrap();
        w.finish(1).unwrap();

        let s = String::from_utf8_lossy(&out);
        assert!(s.contains(&format!("{:010} 00000 n", first_offset)));
        assert!(s.contains(&format!("{:010} 00000 n", second_offset)));
        // Offsets point at the start of "N 0 obj".
        assert!(s[first_offset as usize..].starts_with("1 0 obj"));
        assert!(s[second_offset as usize..].starts_with("2 0 obj"));
    }

    #[test]
    fn test_out_of_order_emit_is_internal_state_error() {
        let mut out = Vec::new();
        let mut w = PdfWriter::new(&mut out);
        assert!(matches!(
            w.write_object(1, &Object::Null),
            Err(Error::InternalState(_))
        ));
        w.begin().unwrap();
        assert!(matches!(
            w.write_object(5, &Object::Null),
            Err(Error::InternalState(_))
        ));
    }

    #[test]
    fn test_double_begin_rejected() {
        let mut out = Vec::new();
        let mut w = PdfWriter::new(&mut out);
        w.begin().unwrap();
        assert!(matches!(w.begin(), Err(Error::InternalState(_))));
    }

    #[test]
    fn test_io_error_poisons_writer() {
        struct FailingSink;
        impl Write for FailingSink {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut w = PdfWriter::new(FailingSink);
        assert!(matches!(w.begin(), Err(Error::Io(_))));
        // Every later call reports the poisoned state.
        assert!(matches!(
            w.write_object(1, &Object::Null),
            Err(Error::InternalState(_))
        ));
        assert!(matches!(w.finish(1), Err(Error::InternalState(_))));
    }

    #[test]
    fn test_compress_data_round_trip() {
        let data = b"BT /F1 12 Tf ET".repeat(20);
        let compressed = compress_data(&data).unwrap();
        assert!(compressed.len() < data.len());

        use std::io::Read;
        let mut decoder = flate2::read::ZlibDecoder::new(&compressed[..]);
        let mut restored = Vec::new();
        decoder.read_to_end(&mut restored).unwrap();
        assert_eq!(restored, data);
    }
}
