//! PDF object serialization.
//!
//! Serializes PDF objects to their byte representation according to
//! PDF specification ISO 32000-1:2008. Output is deterministic:
//! dictionary keys are sorted, and real numbers have a fixed format
//! (at most four fractional digits, trailing zeros trimmed, `-0`
//! normalized to `0`).

use crate::object::Object;
use std::collections::HashMap;
use std::io::Write;

/// Serializer for PDF objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectSerializer;

impl ObjectSerializer {
    /// Create a new object serializer.
    pub fn new() -> Self {
        Self
    }

    /// Serialize an object to bytes.
    pub fn serialize(&self, obj: &Object) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_object(&mut buf, obj)
            .expect("writing to Vec cannot fail");
        buf
    }

    /// Serialize an indirect object definition.
    ///
    /// Format: `{id} 0 obj\n{object}\nendobj\n`
    pub fn serialize_indirect(&self, id: u32, obj: &Object) -> Vec<u8> {
        let mut buf = Vec::new();
        writeln!(buf, "{} 0 obj", id).expect("writing to Vec cannot fail");
        self.write_object(&mut buf, obj)
            .expect("writing to Vec cannot fail");
        write!(buf, "\nendobj\n").expect("writing to Vec cannot fail");
        buf
    }

    /// Write an object to a buffer.
    fn write_object<W: Write>(&self, w: &mut W, obj: &Object) -> std::io::Result<()> {
        match obj {
            Object::Null => write!(w, "null"),
            Object::Boolean(b) => write!(w, "{}", if *b { "true" } else { "false" }),
            Object::Integer(i) => write!(w, "{}", i),
            Object::Real(r) => write!(w, "{}", format_real(*r)),
            Object::String(s) => self.write_string(w, s),
            Object::Name(n) => self.write_name(w, n),
            Object::Array(arr) => self.write_array(w, arr),
            Object::Dictionary(dict) => self.write_dictionary(w, dict),
            Object::Stream { dict, data } => self.write_stream(w, dict, data),
            Object::Reference(r) => write!(w, "{} 0 R", r.id),
        }
    }

    /// Write a PDF string.
    ///
    /// Uses literal string syntax `(...)` with `\(`, `\)` and `\\`
    /// escaped, or hex string syntax `<...>` for binary data.
    fn write_string<W: Write>(&self, w: &mut W, data: &[u8]) -> std::io::Result<()> {
        let is_printable = data
            .iter()
            .all(|&b| b == b'\n' || b == b'\r' || b == b'\t' || (0x20..=0x7E).contains(&b));

        if is_printable {
            write!(w, "(")?;
            for &byte in data {
                match byte {
                    b'(' => write!(w, "\\(")?,
                    b')' => write!(w, "\\)")?,
                    b'\\' => write!(w, "\\\\")?,
                    _ => w.write_all(&[byte])?,
                }
            }
            write!(w, ")")
        } else {
            write!(w, "<")?;
            for byte in data {
                write!(w, "{:02X}", byte)?;
            }
            write!(w, ">")
        }
    }

    /// Write a PDF name.
    ///
    /// Names start with `/`; bytes outside the regular range are
    /// escaped as `#xx` per PDF32000-1:2008 (7.3.5).
    fn write_name<W: Write>(&self, w: &mut W, name: &str) -> std::io::Result<()> {
        write!(w, "/")?;
        for byte in name.bytes() {
            match byte {
                b'#' | 0x00..=0x20 | 0x7F..=0xFF | b'/' | b'(' | b')' | b'<' | b'>' | b'['
                | b']' | b'{' | b'}' | b'%' => {
                    write!(w, "#{:02X}", byte)?;
                },
                _ => w.write_all(&[byte])?,
            }
        }
        Ok(())
    }

    /// Write a PDF array.
    fn write_array<W: Write>(&self, w: &mut W, arr: &[Object]) -> std::io::Result<()> {
        write!(w, "[")?;
        for (i, obj) in arr.iter().enumerate() {
            if i > 0 {
                write!(w, " ")?;
            }
            self.write_object(w, obj)?;
        }
        write!(w, "]")
    }

    /// Write a PDF dictionary with sorted keys.
    fn write_dictionary<W: Write>(
        &self,
        w: &mut W,
        dict: &HashMap<String, Object>,
    ) -> std::io::Result<()> {
        write!(w, "<<")?;

        let mut keys: Vec<_> = dict.keys().collect();
        keys.sort();

        for key in keys {
            if let Some(value) = dict.get(key) {
                write!(w, "\n")?;
                self.write_name(w, key)?;
                write!(w, " ")?;
                self.write_object(w, value)?;
            }
        }

        if !dict.is_empty() {
            writeln!(w)?;
        }
        write!(w, ">>")
    }

    /// Write a PDF stream, adding the `/Length` entry.
    fn write_stream<W: Write>(
        &self,
        w: &mut W,
        dict: &HashMap<String, Object>,
        data: &[u8],
    ) -> std::io::Result<()> {
        let mut dict_with_length = dict.clone();
        dict_with_length.insert("Length".to_string(), Object::Integer(data.len() as i64));

        self.write_dictionary(w, &dict_with_length)?;
        write!(w, "\nstream\n")?;
        w.write_all(data)?;
        write!(w, "\nendstream")
    }
}

/// Format a real number per the writer's rules: at most four fractional
/// digits, trailing zeros trimmed, `-0` normalized to `0`.
pub fn format_real(value: f64) -> String {
    if !value.is_finite() {
        // NaN/infinity are not representable in PDF syntax; the layout
        // code never produces them in emitted coordinates.
        return "0".to_string();
    }
    let rounded = (value * 10_000.0).round() / 10_000.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    if rounded.fract() == 0.0 {
        return format!("{}", rounded as i64);
    }
    let formatted = format!("{:.4}", rounded);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectRef;

    fn to_string(obj: &Object) -> String {
        String::from_utf8_lossy(&ObjectSerializer::new().serialize(obj)).to_string()
    }

    #[test]
    fn test_serialize_primitives() {
        assert_eq!(to_string(&Object::Null), "null");
        assert_eq!(to_string(&Object::Boolean(true)), "true");
        assert_eq!(to_string(&Object::Integer(-123)), "-123");
    }

    #[test]
    fn test_format_real_trims_zeros() {
        assert_eq!(format_real(1.0), "1");
        assert_eq!(format_real(0.5), "0.5");
        assert_eq!(format_real(12.3400), "12.34");
        assert_eq!(format_real(3.14159), "3.1416");
    }

    #[test]
    fn test_format_real_negative_zero() {
        assert_eq!(format_real(-0.0), "0");
        assert_eq!(format_real(-0.00001), "0");
    }

    #[test]
    fn test_serialize_string_escaping() {
        assert_eq!(to_string(&Object::string("Hello")), "(Hello)");
        assert_eq!(to_string(&Object::string("a(b)c")), "(a\\(b\\)c)");
        assert_eq!(to_string(&Object::string("a\\b")), "(a\\\\b)");
    }

    #[test]
    fn test_serialize_binary_string_as_hex() {
        assert_eq!(to_string(&Object::String(vec![0x00, 0xFF, 0x80])), "<00FF80>");
    }

    #[test]
    fn test_serialize_name() {
        assert_eq!(to_string(&Object::name("Type")), "/Type");
        assert_eq!(to_string(&Object::name("A B")), "/A#20B");
    }

    #[test]
    fn test_serialize_array() {
        let arr = Object::Array(vec![Object::Integer(1), Object::Integer(2)]);
        assert_eq!(to_string(&arr), "[1 2]");
    }

    #[test]
    fn test_serialize_dictionary_sorted() {
        let dict = Object::dict(vec![
            ("Type", Object::name("Page")),
            ("Count", Object::Integer(1)),
        ]);
        let s = to_string(&dict);
        // Keys are sorted: Count before Type.
        assert!(s.find("/Count").unwrap() < s.find("/Type").unwrap());
    }

    #[test]
    fn test_serialize_stream_length() {
        let stream = Object::stream(vec![], &b"stream data"[..]);
        let s = to_string(&stream);
        assert!(s.contains("/Length 11"));
        assert!(s.contains("stream\nstream data\nendstream"));
    }

    #[test]
    fn test_serialize_indirect() {
        let bytes = ObjectSerializer::new().serialize_indirect(1, &Object::Integer(42));
        let s = String::from_utf8_lossy(&bytes);
        assert!(s.starts_with("1 0 obj\n"));
        assert!(s.ends_with("endobj\n"));
    }

    #[test]
    fn test_serialize_reference() {
        assert_eq!(to_string(&Object::Reference(ObjectRef::new(7))), "7 0 R");
    }
}
