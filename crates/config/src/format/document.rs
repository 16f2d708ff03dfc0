//! In-memory snapshot of a configuration target.
//!
//! Responsibilities:
//! - Capture any `Serialize` value as a `Document` tree without loss
//!   (non-finite floats and 128-bit integers included).
//! - Keep struct levels apart from map levels so key folding can be limited
//!   to struct fields.
//! - Replay a `Document` into any `Deserialize` type.
//!
//! Does NOT handle:
//! - Merging decoded file content (see `merge.rs`).

use std::fmt::Display;

use serde::de::{
    self, DeserializeSeed, Deserializer, EnumAccess, MapAccess, SeqAccess, Unexpected,
    VariantAccess, Visitor,
};
use serde::ser::{self, Serialize};
use serde::forward_to_deserialize_any;
use thiserror::Error;

/// A serde value tree.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Document {
    Unit,
    None,
    Some(Box<Document>),
    Bool(bool),
    I64(i64),
    U64(u64),
    I128(i128),
    U128(u128),
    F64(f64),
    Char(char),
    String(String),
    Bytes(Vec<u8>),
    Seq(Vec<Document>),
    /// Entries of a map type, keyed by any serializable key.
    Map(Vec<(Document, Document)>),
    /// Fields of a struct, by serialized field name.
    Struct(Vec<(String, Document)>),
    /// An enum variant and its content (`None` for unit variants).
    Variant(String, Option<Box<Document>>),
}

#[derive(Debug, Error)]
#[error("{0}")]
pub(crate) struct DocumentError(String);

impl ser::Error for DocumentError {
    fn custom<T: Display>(msg: T) -> Self {
        Self(msg.to_string())
    }
}

impl de::Error for DocumentError {
    fn custom<T: Display>(msg: T) -> Self {
        Self(msg.to_string())
    }
}

impl Document {
    /// Capture `value`.
    pub(crate) fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, DocumentError> {
        value.serialize(DocumentSerializer)
    }

    /// Convert a decoded file document.
    pub(crate) fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Document::None,
            serde_json::Value::Bool(b) => Document::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Document::U64(u)
                } else if let Some(i) = n.as_i64() {
                    Document::I64(i)
                } else {
                    Document::F64(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Document::String(s),
            serde_json::Value::Array(items) => {
                Document::Seq(items.into_iter().map(Document::from_json).collect())
            }
            serde_json::Value::Object(entries) => Document::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (Document::String(k), Document::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Whether the document has fields or entries at its root.
    pub(crate) fn is_keyed(&self) -> bool {
        matches!(self, Document::Struct(_) | Document::Map(_))
    }

    /// The textual form of a map key, as it would appear in a file.
    pub(crate) fn key_text(&self) -> Option<String> {
        match self {
            Document::String(s) => Some(s.clone()),
            Document::Bool(b) => Some(b.to_string()),
            Document::I64(i) => Some(i.to_string()),
            Document::U64(u) => Some(u.to_string()),
            Document::I128(i) => Some(i.to_string()),
            Document::U128(u) => Some(u.to_string()),
            Document::Char(c) => Some(c.to_string()),
            Document::Variant(name, None) => Some(name.clone()),
            _ => None,
        }
    }

    fn unexpected(&self) -> Unexpected<'_> {
        match self {
            Document::Unit => Unexpected::Unit,
            Document::None => Unexpected::Option,
            Document::Some(_) => Unexpected::Option,
            Document::Bool(b) => Unexpected::Bool(*b),
            Document::I64(i) => Unexpected::Signed(*i),
            Document::U64(u) => Unexpected::Unsigned(*u),
            Document::I128(_) | Document::U128(_) => Unexpected::Other("128-bit integer"),
            Document::F64(f) => Unexpected::Float(*f),
            Document::Char(c) => Unexpected::Char(*c),
            Document::String(s) => Unexpected::Str(s),
            Document::Bytes(b) => Unexpected::Bytes(b),
            Document::Seq(_) => Unexpected::Seq,
            Document::Map(_) | Document::Struct(_) => Unexpected::Map,
            Document::Variant(..) => Unexpected::Enum,
        }
    }
}

// =============================================================================
// Serialization
// =============================================================================

struct DocumentSerializer;

impl ser::Serializer for DocumentSerializer {
    type Ok = Document;
    type Error = DocumentError;
    type SerializeSeq = SerializeItems;
    type SerializeTuple = SerializeItems;
    type SerializeTupleStruct = SerializeItems;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeEntries;
    type SerializeStruct = SerializeFields;
    type SerializeStructVariant = SerializeStructVariant;

    fn serialize_bool(self, v: bool) -> Result<Document, DocumentError> {
        Ok(Document::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Document, DocumentError> {
        Ok(Document::I64(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Result<Document, DocumentError> {
        Ok(Document::I64(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Result<Document, DocumentError> {
        Ok(Document::I64(v.into()))
    }

    fn serialize_i64(self, v: i64) -> Result<Document, DocumentError> {
        Ok(Document::I64(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Document, DocumentError> {
        Ok(i64::try_from(v).map_or(Document::I128(v), Document::I64))
    }

    fn serialize_u8(self, v: u8) -> Result<Document, DocumentError> {
        Ok(Document::U64(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Result<Document, DocumentError> {
        Ok(Document::U64(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<Document, DocumentError> {
        Ok(Document::U64(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Result<Document, DocumentError> {
        Ok(Document::U64(v))
    }

    fn serialize_u128(self, v: u128) -> Result<Document, DocumentError> {
        Ok(u64::try_from(v).map_or(Document::U128(v), Document::U64))
    }

    fn serialize_f32(self, v: f32) -> Result<Document, DocumentError> {
        Ok(Document::F64(v.into()))
    }

    fn serialize_f64(self, v: f64) -> Result<Document, DocumentError> {
        Ok(Document::F64(v))
    }

    fn serialize_char(self, v: char) -> Result<Document, DocumentError> {
        Ok(Document::Char(v))
    }

    fn serialize_str(self, v: &str) -> Result<Document, DocumentError> {
        Ok(Document::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Document, DocumentError> {
        Ok(Document::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Document, DocumentError> {
        Ok(Document::None)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Document, DocumentError> {
        Ok(Document::Some(Box::new(value.serialize(self)?)))
    }

    fn serialize_unit(self) -> Result<Document, DocumentError> {
        Ok(Document::Unit)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Document, DocumentError> {
        Ok(Document::Unit)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Document, DocumentError> {
        Ok(Document::Variant(variant.to_string(), None))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Document, DocumentError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Document, DocumentError> {
        Ok(Document::Variant(
            variant.to_string(),
            Some(Box::new(value.serialize(self)?)),
        ))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeItems, DocumentError> {
        Ok(SerializeItems {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeItems, DocumentError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SerializeItems, DocumentError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeTupleVariant, DocumentError> {
        Ok(SerializeTupleVariant {
            variant,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeEntries, DocumentError> {
        Ok(SerializeEntries {
            entries: Vec::with_capacity(len.unwrap_or(0)),
            next_key: None,
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SerializeFields, DocumentError> {
        Ok(SerializeFields {
            fields: Vec::with_capacity(len),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeStructVariant, DocumentError> {
        Ok(SerializeStructVariant {
            variant,
            fields: Vec::with_capacity(len),
        })
    }
}

struct SerializeItems {
    items: Vec<Document>,
}

impl ser::SerializeSeq for SerializeItems {
    type Ok = Document;
    type Error = DocumentError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), DocumentError> {
        self.items.push(Document::from_serialize(value)?);
        Ok(())
    }

    fn end(self) -> Result<Document, DocumentError> {
        Ok(Document::Seq(self.items))
    }
}

impl ser::SerializeTuple for SerializeItems {
    type Ok = Document;
    type Error = DocumentError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), DocumentError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Document, DocumentError> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeItems {
    type Ok = Document;
    type Error = DocumentError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), DocumentError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Document, DocumentError> {
        ser::SerializeSeq::end(self)
    }
}

struct SerializeTupleVariant {
    variant: &'static str,
    items: Vec<Document>,
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = Document;
    type Error = DocumentError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), DocumentError> {
        self.items.push(Document::from_serialize(value)?);
        Ok(())
    }

    fn end(self) -> Result<Document, DocumentError> {
        Ok(Document::Variant(
            self.variant.to_string(),
            Some(Box::new(Document::Seq(self.items))),
        ))
    }
}

struct SerializeEntries {
    entries: Vec<(Document, Document)>,
    next_key: Option<Document>,
}

impl ser::SerializeMap for SerializeEntries {
    type Ok = Document;
    type Error = DocumentError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), DocumentError> {
        self.next_key = Some(Document::from_serialize(key)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), DocumentError> {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| <DocumentError as ser::Error>::custom("map value without a key"))?;
        self.entries.push((key, Document::from_serialize(value)?));
        Ok(())
    }

    fn end(self) -> Result<Document, DocumentError> {
        Ok(Document::Map(self.entries))
    }
}

struct SerializeFields {
    fields: Vec<(String, Document)>,
}

impl ser::SerializeStruct for SerializeFields {
    type Ok = Document;
    type Error = DocumentError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), DocumentError> {
        self.fields
            .push((key.to_string(), Document::from_serialize(value)?));
        Ok(())
    }

    fn end(self) -> Result<Document, DocumentError> {
        Ok(Document::Struct(self.fields))
    }
}

struct SerializeStructVariant {
    variant: &'static str,
    fields: Vec<(String, Document)>,
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = Document;
    type Error = DocumentError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), DocumentError> {
        self.fields
            .push((key.to_string(), Document::from_serialize(value)?));
        Ok(())
    }

    fn end(self) -> Result<Document, DocumentError> {
        Ok(Document::Variant(
            self.variant.to_string(),
            Some(Box::new(Document::Struct(self.fields))),
        ))
    }
}

// =============================================================================
// Deserialization
// =============================================================================

impl<'de> Deserializer<'de> for Document {
    type Error = DocumentError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DocumentError> {
        match self {
            Document::Unit => visitor.visit_unit(),
            Document::None => visitor.visit_none(),
            Document::Some(inner) => visitor.visit_some(*inner),
            Document::Bool(b) => visitor.visit_bool(b),
            Document::I64(i) => visitor.visit_i64(i),
            Document::U64(u) => visitor.visit_u64(u),
            Document::I128(i) => visitor.visit_i128(i),
            Document::U128(u) => visitor.visit_u128(u),
            Document::F64(f) => visitor.visit_f64(f),
            Document::Char(c) => visitor.visit_char(c),
            Document::String(s) => visitor.visit_string(s),
            Document::Bytes(b) => visitor.visit_byte_buf(b),
            Document::Seq(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            Document::Map(entries) => visitor.visit_map(MapDeserializer::new(entries)),
            Document::Struct(fields) => visitor.visit_map(MapDeserializer::new(
                fields
                    .into_iter()
                    .map(|(name, value)| (Document::String(name), value))
                    .collect(),
            )),
            Document::Variant(variant, content) => visitor.visit_enum(EnumDeserializer {
                variant,
                content: content.map(|c| *c),
            }),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DocumentError> {
        match self {
            Document::None | Document::Unit => visitor.visit_none(),
            Document::Some(inner) => visitor.visit_some(*inner),
            other => visitor.visit_some(other),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DocumentError> {
        match self {
            Document::None | Document::Unit => visitor.visit_unit(),
            other => other.deserialize_any(visitor),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DocumentError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DocumentError> {
        let (variant, content) = match self {
            Document::Variant(variant, content) => (variant, content.map(|c| *c)),
            Document::String(variant) => (variant, None),
            Document::Map(mut entries) if entries.len() == 1 => {
                let (key, value) = entries.remove(0);
                match key {
                    Document::String(variant) => (variant, Some(value)),
                    other => {
                        return Err(de::Error::invalid_type(other.unexpected(), &"variant name"));
                    }
                }
            }
            Document::Struct(mut fields) if fields.len() == 1 => {
                let (variant, value) = fields.remove(0);
                (variant, Some(value))
            }
            other => return Err(de::Error::invalid_type(other.unexpected(), &"enum")),
        };
        visitor.visit_enum(EnumDeserializer { variant, content })
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit_struct seq tuple tuple_struct map struct identifier
        ignored_any
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Document>,
}

impl SeqDeserializer {
    fn new(items: Vec<Document>) -> Self {
        Self {
            iter: items.into_iter(),
        }
    }
}

impl<'de> SeqAccess<'de> for SeqDeserializer {
    type Error = DocumentError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, DocumentError> {
        self.iter.next().map(|item| seed.deserialize(item)).transpose()
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer {
    iter: std::vec::IntoIter<(Document, Document)>,
    value: Option<Document>,
}

impl MapDeserializer {
    fn new(entries: Vec<(Document, Document)>) -> Self {
        Self {
            iter: entries.into_iter(),
            value: None,
        }
    }
}

impl<'de> MapAccess<'de> for MapDeserializer {
    type Error = DocumentError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, DocumentError> {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(MapKey(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> Result<V::Value, DocumentError> {
        match self.value.take() {
            Some(value) => seed.deserialize(value),
            None => Err(de::Error::custom("map value requested before its key")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

/// A map key; string keys from files also deserialize into numeric and bool keys.
struct MapKey(Document);

macro_rules! deserialize_parsed_key {
    ($($method:ident => $visit:ident),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DocumentError> {
                match self.0 {
                    Document::String(s) => match s.parse() {
                        Ok(parsed) => visitor.$visit(parsed),
                        Err(_) => Err(de::Error::invalid_value(Unexpected::Str(&s), &visitor)),
                    },
                    other => other.$method(visitor),
                }
            }
        )*
    };
}

impl<'de> Deserializer<'de> for MapKey {
    type Error = DocumentError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DocumentError> {
        self.0.deserialize_any(visitor)
    }

    deserialize_parsed_key!(
        deserialize_bool => visit_bool,
        deserialize_i8 => visit_i8,
        deserialize_i16 => visit_i16,
        deserialize_i32 => visit_i32,
        deserialize_i64 => visit_i64,
        deserialize_i128 => visit_i128,
        deserialize_u8 => visit_u8,
        deserialize_u16 => visit_u16,
        deserialize_u32 => visit_u32,
        deserialize_u64 => visit_u64,
        deserialize_u128 => visit_u128,
    );

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DocumentError> {
        self.0.deserialize_option(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DocumentError> {
        self.0.deserialize_newtype_struct(name, visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DocumentError> {
        self.0.deserialize_enum(name, variants, visitor)
    }

    forward_to_deserialize_any! {
        f32 f64 char str string bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

struct EnumDeserializer {
    variant: String,
    content: Option<Document>,
}

impl<'de> EnumAccess<'de> for EnumDeserializer {
    type Error = DocumentError;
    type Variant = VariantDeserializer;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, VariantDeserializer), DocumentError> {
        let variant = seed.deserialize(Document::String(self.variant))?;
        Ok((
            variant,
            VariantDeserializer {
                content: self.content,
            },
        ))
    }
}

struct VariantDeserializer {
    content: Option<Document>,
}

impl<'de> VariantAccess<'de> for VariantDeserializer {
    type Error = DocumentError;

    fn unit_variant(self) -> Result<(), DocumentError> {
        match self.content {
            None | Some(Document::Unit) | Some(Document::None) => Ok(()),
            Some(other) => Err(de::Error::invalid_type(other.unexpected(), &"unit variant")),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(
        self,
        seed: T,
    ) -> Result<T::Value, DocumentError> {
        match self.content {
            Some(content) => seed.deserialize(content),
            None => Err(de::Error::invalid_type(
                Unexpected::UnitVariant,
                &"newtype variant",
            )),
        }
    }

    fn tuple_variant<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DocumentError> {
        match self.content {
            Some(Document::Seq(items)) => visitor.visit_seq(SeqDeserializer::new(items)),
            Some(other) => Err(de::Error::invalid_type(other.unexpected(), &"tuple variant")),
            None => Err(de::Error::invalid_type(
                Unexpected::UnitVariant,
                &"tuple variant",
            )),
        }
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DocumentError> {
        match self.content {
            Some(content) if content.is_keyed() => content.deserialize_any(visitor),
            Some(other) => Err(de::Error::invalid_type(other.unexpected(), &"struct variant")),
            None => Err(de::Error::invalid_type(
                Unexpected::UnitVariant,
                &"struct variant",
            )),
        }
    }
}
