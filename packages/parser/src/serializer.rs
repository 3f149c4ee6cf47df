use crate::schema::{FieldSchema, FieldType};
use crate::value::{FieldValue, Message, Value};
use std::fmt::Write;

/// Serializer converts a message back to canonical text
///
/// Output is deterministic: set fields in field-number order, one element
/// per line for repeated fields, nested messages as indented blocks.
/// Parsing the output and serializing again yields the same text.
pub struct Serializer {
    indent_level: usize,
    indent_string: String,
}

impl Serializer {
    pub fn new() -> Self {
        Self {
            indent_level: 0,
            indent_string: "  ".to_string(), // 2 spaces
        }
    }

    pub fn with_indent(indent: &str) -> Self {
        Self {
            indent_level: 0,
            indent_string: indent.to_string(),
        }
    }

    /// Serialize a message body (no enclosing braces)
    pub fn serialize(&mut self, message: &Message) -> String {
        let mut output = String::new();
        self.serialize_message(message, &mut output);
        output
    }

    fn serialize_message(&mut self, message: &Message, output: &mut String) {
        for (field, value) in message.fields() {
            match value {
                FieldValue::Single(value) => self.serialize_field(field, value, output),
                FieldValue::Repeated(values) => {
                    for value in values {
                        self.serialize_field(field, value, output);
                    }
                }
            }
        }
    }

    fn serialize_field(&mut self, field: &FieldSchema, value: &Value, output: &mut String) {
        self.write_indent(output);
        output.push_str(&field.name);

        match value {
            Value::Message(nested) => {
                output.push_str(" {\n");
                self.indent_level += 1;
                self.serialize_message(nested, output);
                self.indent_level -= 1;
                self.write_indent(output);
                output.push_str("}\n");
            }
            scalar => {
                output.push_str(": ");
                write_scalar(&field.ty, scalar, output);
                output.push('\n');
            }
        }
    }

    fn write_indent(&self, output: &mut String) {
        for _ in 0..self.indent_level {
            output.push_str(&self.indent_string);
        }
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

fn write_scalar(ty: &FieldType, value: &Value, output: &mut String) {
    match value {
        Value::Int(v) => {
            let _ = write!(output, "{}", v);
        }
        Value::UInt(v) => {
            let _ = write!(output, "{}", v);
        }
        Value::Bool(v) => output.push_str(if *v { "true" } else { "false" }),
        Value::Enum(name) => output.push_str(name),
        Value::String(s) => write_quoted(s, output),
        Value::Float(v) => write_float(*v, matches!(ty, FieldType::Float), output),
        Value::Message(_) => {}
    }
}

/// Shortest text that parses back to the same value
fn write_float(v: f64, single_precision: bool, output: &mut String) {
    if v.is_nan() {
        output.push_str("nan");
    } else if v.is_infinite() {
        output.push_str(if v > 0.0 { "inf" } else { "-inf" });
    } else if single_precision {
        let _ = write!(output, "{:?}", v as f32);
    } else {
        let _ = write!(output, "{:?}", v);
    }
}

fn write_quoted(s: &str, output: &mut String) {
    output.push('"');
    for byte in s.bytes() {
        match byte {
            b'\n' => output.push_str("\\n"),
            b'\r' => output.push_str("\\r"),
            b'\t' => output.push_str("\\t"),
            0x07 => output.push_str("\\a"),
            0x08 => output.push_str("\\b"),
            0x0b => output.push_str("\\v"),
            0x0c => output.push_str("\\f"),
            b'\\' => output.push_str("\\\\"),
            b'\'' => output.push_str("\\'"),
            b'"' => output.push_str("\\\""),
            0x20..=0x7e => output.push(byte as char),
            other => {
                let _ = write!(output, "\\{:03o}", other);
            }
        }
    }
    output.push('"');
}

/// Convenience function to serialize a message to canonical text
pub fn serialize(message: &Message) -> String {
    Serializer::new().serialize(message)
}
