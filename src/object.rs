//! PDF object types.
//!
//! The indirect-object model the writer serializes. Dictionaries are
//! plain key/value maps; keys are written in sorted order so identical
//! inputs always produce identical bytes.

use std::collections::HashMap;

/// PDF object representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f64),
    /// String (byte array)
    String(Vec<u8>),
    /// Name (written with a leading /)
    Name(String),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary (key-value pairs)
    Dictionary(HashMap<String, Object>),
    /// Stream (dictionary + data)
    Stream {
        /// Stream dictionary (without /Length, added at serialization)
        dict: HashMap<String, Object>,
        /// Stream data, already encoded with whatever filter the
        /// dictionary declares
        data: bytes::Bytes,
    },
    /// Indirect object reference
    Reference(ObjectRef),
}

/// Reference to an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Object number
    pub id: u32,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(id: u32) -> Self {
        Self { id }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} 0 R", self.id)
    }
}

impl Object {
    /// Create a Name object.
    pub fn name(s: impl Into<String>) -> Object {
        Object::Name(s.into())
    }

    /// Create a String object from text.
    pub fn string(s: impl AsRef<str>) -> Object {
        Object::String(s.as_ref().as_bytes().to_vec())
    }

    /// Create a Reference object.
    pub fn reference(id: u32) -> Object {
        Object::Reference(ObjectRef::new(id))
    }

    /// Create a Dictionary object from entries.
    pub fn dict(entries: Vec<(&str, Object)>) -> Object {
        Object::Dictionary(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    /// Create a Stream object from a dictionary and data.
    pub fn stream(entries: Vec<(&str, Object)>, data: impl Into<bytes::Bytes>) -> Object {
        Object::Stream {
            dict: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            data: data.into(),
        }
    }

    /// Create an Array of references from object ids.
    pub fn ref_array(ids: impl IntoIterator<Item = u32>) -> Object {
        Object::Array(ids.into_iter().map(Object::reference).collect())
    }

    /// A rectangle array `[llx lly urx ury]`.
    pub fn rect(llx: f64, lly: f64, urx: f64, ury: f64) -> Object {
        Object::Array(vec![
            Object::Real(llx),
            Object::Real(lly),
            Object::Real(urx),
            Object::Real(ury),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_ref_display() {
        assert_eq!(ObjectRef::new(10).to_string(), "10 0 R");
    }

    #[test]
    fn test_dict_helper() {
        let obj = Object::dict(vec![("Type", Object::name("Page"))]);
        match obj {
            Object::Dictionary(d) => {
                assert_eq!(d.get("Type"), Some(&Object::Name("Page".into())));
            },
            _ => panic!("expected dictionary"),
        }
    }

    #[test]
    fn test_ref_array() {
        let obj = Object::ref_array([1, 2, 3]);
        match obj {
            Object::Array(items) => assert_eq!(items.len(), 3),
            _ => panic!("expected array"),
        }
    }
}
