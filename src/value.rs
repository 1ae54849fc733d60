use crate::AssetPath;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::cmp::Ordering;

/// A number as written in an asset document. Integer vs float is kept so an
/// untouched `3` is not rewritten as `3.0`.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetNumber {
    I64(i64),
    U64(u64),
    F64(f64),
}

impl AssetNumber {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AssetNumber::I64(v) => Some(*v),
            AssetNumber::U64(v) => i64::try_from(*v).ok(),
            AssetNumber::F64(_) => None,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            AssetNumber::I64(v) => *v as f64,
            AssetNumber::U64(v) => *v as f64,
            AssetNumber::F64(v) => *v,
        }
    }

    fn write_json5(&self, out: &mut String) {
        match self {
            AssetNumber::I64(v) => out.push_str(&v.to_string()),
            AssetNumber::U64(v) => out.push_str(&v.to_string()),
            AssetNumber::F64(v) => {
                if v.is_nan() {
                    out.push_str("NaN");
                } else if v.is_infinite() {
                    out.push_str(if v.is_sign_negative() {
                        "-Infinity"
                    } else {
                        "Infinity"
                    });
                } else {
                    let mut buf = ryu::Buffer::new();
                    out.push_str(buf.format(*v));
                }
            }
        }
    }
}

impl Serialize for AssetNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AssetNumber::I64(v) => serializer.serialize_i64(*v),
            AssetNumber::U64(v) => serializer.serialize_u64(*v),
            AssetNumber::F64(v) => serializer.serialize_f64(*v),
        }
    }
}

/// Untyped asset document value (JSON5 subset). The reflection layer turns these
/// into [`FieldValue`]s using the declared field kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetValue {
    Null,
    Bool(bool),
    Number(AssetNumber),
    String(String),
    Array(Vec<AssetValue>),
    Object(IndexMap<String, AssetValue>),
}

impl AssetValue {
    pub fn as_object(&self) -> Option<&IndexMap<String, AssetValue>> {
        match self {
            AssetValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AssetValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AssetValue::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&AssetValue> {
        self.as_object().and_then(|m| m.get(key))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AssetValue::Null => "null",
            AssetValue::Bool(_) => "bool",
            AssetValue::Number(_) => "number",
            AssetValue::String(_) => "string",
            AssetValue::Array(_) => "array",
            AssetValue::Object(_) => "object",
        }
    }

    pub fn parse_json5(text: &str) -> anyhow::Result<AssetValue> {
        Ok(json5::from_str::<AssetValue>(text)?)
    }

    /// 4-space indented, keys always quoted, trailing newline.
    pub fn to_json5_pretty(&self) -> String {
        let mut out = String::new();
        self.write_json5(&mut out, 0, true);
        out.push('\n');
        out
    }

    pub fn to_json5_compact(&self) -> String {
        let mut out = String::new();
        self.write_json5(&mut out, 0, false);
        out
    }

    fn write_json5(&self, out: &mut String, indent: usize, pretty: bool) {
        match self {
            AssetValue::Null => out.push_str("null"),
            AssetValue::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
            AssetValue::Number(n) => n.write_json5(out),
            AssetValue::String(s) => write_escaped_string(out, s),
            AssetValue::Array(values) => {
                out.push('[');
                write_items(out, indent, pretty, values.iter(), |out, v, indent| {
                    v.write_json5(out, indent, pretty)
                });
                out.push(']');
            }
            AssetValue::Object(map) => {
                out.push('{');
                write_items(out, indent, pretty, map.iter(), |out, (k, v), indent| {
                    write_escaped_string(out, k);
                    out.push(':');
                    if pretty {
                        out.push(' ');
                    }
                    v.write_json5(out, indent, pretty);
                });
                out.push('}');
            }
        }
    }

    /// Rough heap footprint of this value, used by the default memory meter.
    pub fn approximate_size(&self) -> u64 {
        let own = std::mem::size_of::<AssetValue>() as u64;
        own + match self {
            AssetValue::String(s) => s.capacity() as u64,
            AssetValue::Array(values) => values.iter().map(AssetValue::approximate_size).sum(),
            AssetValue::Object(map) => map
                .iter()
                .map(|(k, v)| k.capacity() as u64 + v.approximate_size())
                .sum(),
            _ => 0,
        }
    }
}

fn write_items<I, T>(
    out: &mut String,
    indent: usize,
    pretty: bool,
    items: I,
    mut write_one: impl FnMut(&mut String, T, usize),
) where
    I: ExactSizeIterator<Item = T>,
{
    let len = items.len();
    if pretty && len > 0 {
        out.push('\n');
    }
    for (i, item) in items.enumerate() {
        if pretty {
            out.push_str(&" ".repeat(indent + 4));
        } else if i > 0 {
            out.push(' ');
        }
        write_one(out, item, indent + 4);
        if i + 1 != len {
            out.push(',');
        }
        if pretty {
            out.push('\n');
        }
    }
    if pretty && len > 0 {
        out.push_str(&" ".repeat(indent));
    }
}

fn write_escaped_string(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write as _;
                write!(out, "\\u{:04X}", c as u32).ok();
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

impl Serialize for AssetValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AssetValue::Null => serializer.serialize_unit(),
            AssetValue::Bool(v) => serializer.serialize_bool(*v),
            AssetValue::Number(n) => n.serialize(serializer),
            AssetValue::String(s) => serializer.serialize_str(s),
            AssetValue::Array(values) => values.serialize(serializer),
            AssetValue::Object(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for AssetValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> de::Visitor<'de> for ValueVisitor {
            type Value = AssetValue;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a JSON5 value")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(AssetValue::Null)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(AssetValue::Null)
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(AssetValue::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(AssetValue::Number(AssetNumber::I64(v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(AssetValue::Number(AssetNumber::U64(v)))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(AssetValue::Number(AssetNumber::F64(v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(AssetValue::String(v.to_owned()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(AssetValue::String(v))
            }

            fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut values = Vec::new();
                while let Some(value) = seq.next_element::<AssetValue>()? {
                    values.push(value);
                }
                Ok(AssetValue::Array(values))
            }

            fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut values = IndexMap::new();
                while let Some((key, value)) = map.next_entry::<String, AssetValue>()? {
                    values.insert(key, value);
                }
                Ok(AssetValue::Object(values))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

/// Declared kind of a field. Anything the schema names that is not one of the
/// scalar/reference kinds is `Opaque`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Integer,
    Boolean,
    Float,
    String,
    Color,
    Reference,
    Opaque,
}

impl ValueKind {
    /// Classifies a schema kind string. Unknown strings yield `None`; callers
    /// fall back to `Opaque`.
    pub fn classify(kind: &str) -> Option<ValueKind> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" | "i32" | "i64" => Some(ValueKind::Integer),
            "bool" | "boolean" => Some(ValueKind::Boolean),
            "float" | "f32" | "f64" | "number" => Some(ValueKind::Float),
            "string" | "str" | "text" => Some(ValueKind::String),
            "color" | "colour" => Some(ValueKind::Color),
            "ref" | "reference" => Some(ValueKind::Reference),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ValueKind::Integer => "int",
            ValueKind::Boolean => "bool",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Color => "color",
            ValueKind::Reference => "ref",
            ValueKind::Opaque => "opaque",
        }
    }
}

/// Linear RGBA color, channels nominally in `[0, 1]` (HDR colors may exceed 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for Rgba {
    fn default() -> Self {
        Self {
            r: 1.0,
            g: 1.0,
            b: 1.0,
            a: 1.0,
        }
    }
}

impl Rgba {
    pub fn channel_sum(&self) -> f32 {
        self.r + self.g + self.b + self.a
    }

    fn from_asset(value: &AssetValue) -> Option<Self> {
        match value {
            AssetValue::Object(map) => {
                let ch = |k: &str, default: f32| {
                    map.get(k)
                        .and_then(AssetValue::as_f64)
                        .map(|v| v as f32)
                        .unwrap_or(default)
                };
                Some(Self {
                    r: ch("r", 0.0),
                    g: ch("g", 0.0),
                    b: ch("b", 0.0),
                    a: ch("a", 1.0),
                })
            }
            AssetValue::Array(values) if values.len() >= 3 => {
                let ch = |i: usize, default: f32| {
                    values
                        .get(i)
                        .and_then(AssetValue::as_f64)
                        .map(|v| v as f32)
                        .unwrap_or(default)
                };
                Some(Self {
                    r: ch(0, 0.0),
                    g: ch(1, 0.0),
                    b: ch(2, 0.0),
                    a: ch(3, 1.0),
                })
            }
            _ => None,
        }
    }

    fn to_asset(self) -> AssetValue {
        let mut map = IndexMap::new();
        for (k, v) in [("r", self.r), ("g", self.g), ("b", self.b), ("a", self.a)] {
            map.insert(
                k.to_string(),
                AssetValue::Number(AssetNumber::F64(f64::from(v))),
            );
        }
        AssetValue::Object(map)
    }
}

/// A typed field value as read through the reflection provider.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Boolean(bool),
    Float(f64),
    String(String),
    Color(Rgba),
    Reference(Option<AssetPath>),
    Opaque(AssetValue),
}

impl FieldValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            FieldValue::Integer(_) => ValueKind::Integer,
            FieldValue::Boolean(_) => ValueKind::Boolean,
            FieldValue::Float(_) => ValueKind::Float,
            FieldValue::String(_) => ValueKind::String,
            FieldValue::Color(_) => ValueKind::Color,
            FieldValue::Reference(_) => ValueKind::Reference,
            FieldValue::Opaque(_) => ValueKind::Opaque,
        }
    }

    pub fn default_for(kind: ValueKind) -> FieldValue {
        match kind {
            ValueKind::Integer => FieldValue::Integer(0),
            ValueKind::Boolean => FieldValue::Boolean(false),
            ValueKind::Float => FieldValue::Float(0.0),
            ValueKind::String => FieldValue::String(String::new()),
            ValueKind::Color => FieldValue::Color(Rgba::default()),
            ValueKind::Reference => FieldValue::Reference(None),
            ValueKind::Opaque => FieldValue::Opaque(AssetValue::Null),
        }
    }

    /// Interprets a stored document value as `kind`. Missing or mismatched
    /// values read as the kind's default.
    pub fn from_asset(kind: ValueKind, value: Option<&AssetValue>) -> FieldValue {
        let Some(value) = value else {
            return FieldValue::default_for(kind);
        };
        let typed = match (kind, value) {
            (ValueKind::Integer, AssetValue::Number(n)) => n
                .as_i64()
                .or_else(|| {
                    let f = n.as_f64();
                    f.is_finite().then_some(f as i64)
                })
                .map(FieldValue::Integer),
            (ValueKind::Boolean, AssetValue::Bool(b)) => Some(FieldValue::Boolean(*b)),
            (ValueKind::Float, AssetValue::Number(n)) => Some(FieldValue::Float(n.as_f64())),
            (ValueKind::String, AssetValue::String(s)) => Some(FieldValue::String(s.clone())),
            (ValueKind::Color, v) => Rgba::from_asset(v).map(FieldValue::Color),
            (ValueKind::Reference, AssetValue::String(s)) if !s.trim().is_empty() => {
                Some(FieldValue::Reference(Some(AssetPath::new(s.trim()))))
            }
            (ValueKind::Reference, AssetValue::Null) => Some(FieldValue::Reference(None)),
            (ValueKind::Opaque, v) => Some(FieldValue::Opaque(v.clone())),
            _ => None,
        };
        typed.unwrap_or_else(|| FieldValue::default_for(kind))
    }

    pub fn to_asset(&self) -> AssetValue {
        match self {
            FieldValue::Integer(v) => AssetValue::Number(AssetNumber::I64(*v)),
            FieldValue::Boolean(v) => AssetValue::Bool(*v),
            FieldValue::Float(v) => AssetValue::Number(AssetNumber::F64(*v)),
            FieldValue::String(s) => AssetValue::String(s.clone()),
            FieldValue::Color(c) => c.to_asset(),
            FieldValue::Reference(Some(p)) => AssetValue::String(p.to_string()),
            FieldValue::Reference(None) => AssetValue::Null,
            FieldValue::Opaque(v) => v.clone(),
        }
    }

    /// Ordering used by the sort engine. `None` when the two values have no
    /// natural order (opaque values, or mismatched kinds).
    pub fn sort_cmp(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
            (FieldValue::Float(a), FieldValue::Float(b)) => Some(a.total_cmp(b)),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => Some(a.cmp(b)),
            (FieldValue::String(a), FieldValue::String(b)) => Some(a.cmp(b)),
            (FieldValue::Color(a), FieldValue::Color(b)) => {
                Some(a.channel_sum().total_cmp(&b.channel_sum()))
            }
            (FieldValue::Reference(a), FieldValue::Reference(b)) => {
                let name = |p: &Option<AssetPath>| {
                    p.as_ref().map(|p| p.file_stem().to_string()).unwrap_or_default()
                };
                Some(name(a).cmp(&name(b)))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AssetNumber, AssetValue, FieldValue, Rgba, ValueKind};
    use crate::AssetPath;
    use std::cmp::Ordering;

    #[test]
    fn parse_json5_keeps_integer_vs_float() {
        let v = AssetValue::parse_json5("{ a: 3, b: 3.5, c: -1 }").unwrap();
        assert!(matches!(v.get("a"), Some(AssetValue::Number(n)) if n.as_i64() == Some(3)));
        assert_eq!(v.get("b"), Some(&AssetValue::Number(AssetNumber::F64(3.5))));
        assert!(matches!(v.get("c"), Some(AssetValue::Number(n)) if n.as_i64() == Some(-1)));
    }

    #[test]
    fn pretty_output_reparses_to_same_value() {
        let text = r#"{ "$type": "Weapon", damage: 10, tint: { r: 1, g: 0.5, b: 0, a: 1 }, tags: ["a", "b"], empty: {} }"#;
        let v = AssetValue::parse_json5(text).unwrap();
        let pretty = v.to_json5_pretty();
        assert!(pretty.starts_with("{\n    \"$type\": \"Weapon\",\n"));
        assert_eq!(AssetValue::parse_json5(&pretty).unwrap(), v);
    }

    #[test]
    fn classify_unknown_kind_is_none() {
        assert_eq!(ValueKind::classify("Int"), Some(ValueKind::Integer));
        assert_eq!(ValueKind::classify(" color "), Some(ValueKind::Color));
        assert_eq!(ValueKind::classify("Vector3"), None);
    }

    #[test]
    fn mismatched_values_read_as_default() {
        let s = AssetValue::String("x".to_string());
        assert_eq!(
            FieldValue::from_asset(ValueKind::Integer, Some(&s)),
            FieldValue::Integer(0)
        );
        assert_eq!(
            FieldValue::from_asset(ValueKind::Color, None),
            FieldValue::Color(Rgba::default())
        );
        assert_eq!(
            FieldValue::from_asset(ValueKind::Reference, Some(&s)),
            FieldValue::Reference(Some(AssetPath::new("x")))
        );
    }

    #[test]
    fn color_reads_object_and_array_forms() {
        let obj = AssetValue::parse_json5("{ r: 1, g: 0.5, b: 0 }").unwrap();
        let arr = AssetValue::parse_json5("[1, 0.5, 0, 0.25]").unwrap();
        assert_eq!(
            FieldValue::from_asset(ValueKind::Color, Some(&obj)),
            FieldValue::Color(Rgba {
                r: 1.0,
                g: 0.5,
                b: 0.0,
                a: 1.0
            })
        );
        let FieldValue::Color(c) = FieldValue::from_asset(ValueKind::Color, Some(&arr)) else {
            panic!("expected color");
        };
        assert_eq!(c.channel_sum(), 1.75);
    }

    #[test]
    fn sort_cmp_orders_by_kind_rules() {
        assert_eq!(
            FieldValue::Boolean(false).sort_cmp(&FieldValue::Boolean(true)),
            Some(Ordering::Less)
        );
        assert_eq!(
            FieldValue::String("b".into()).sort_cmp(&FieldValue::String("B".into())),
            Some(Ordering::Greater)
        );
        assert_eq!(
            FieldValue::Reference(None)
                .sort_cmp(&FieldValue::Reference(Some(AssetPath::new("W/Axe.asset")))),
            Some(Ordering::Less)
        );
        assert_eq!(
            FieldValue::Opaque(AssetValue::Null).sort_cmp(&FieldValue::Opaque(AssetValue::Null)),
            None
        );
    }
}
