//! A minimal XML-RPC `methodCall` / `methodResponse` codec.
//!
//! PyPI's legacy mirroring API only ever exchanges a handful of value
//! shapes (`int`, `string`, `array`, `struct`), so this is not a general
//! XML-RPC implementation — it covers exactly what
//! `list_packages_with_serial` and `changelog_since_serial` need, built on
//! top of `quick-xml`'s event reader/writer the same way the rest of this
//! workspace builds small wire codecs on top of one general-purpose crate
//! rather than hand-rolling XML handling from raw string splitting.

use crate::error::{CoreError, Result};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// A decoded XML-RPC value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    String(String),
    Boolean(bool),
    Array(Vec<Value>),
    Struct(Vec<(String, Value)>),
}

impl Value {
    /// Extracts an `i64`, if this value is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Extracts a `&str`, if this value is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the element slice, if this value is an `Array`.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Extracts the member slice, if this value is a `Struct`.
    pub fn as_struct(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Struct(members) => Some(members),
            _ => None,
        }
    }
}

/// Encodes a `methodCall` request for `method` with the given positional
/// `params`.
pub fn encode_method_call(method: &str, params: &[Value]) -> String {
    let mut writer = Writer::new(Vec::new());

    write_start(&mut writer, "methodCall");
    write_text_elem(&mut writer, "methodName", method);
    write_start(&mut writer, "params");
    for param in params {
        write_start(&mut writer, "param");
        write_value(&mut writer, param);
        write_end(&mut writer, "param");
    }
    write_end(&mut writer, "params");
    write_end(&mut writer, "methodCall");

    String::from_utf8(writer.into_inner()).expect("xml writer produces valid utf-8")
}

/// Parses a `methodResponse` body, returning the single `Value` it carries.
///
/// Returns `Err(CoreError::XmlRpc)` if the response is a `<fault>` or is
/// otherwise malformed — mirroring the "never raises, caller decides what
/// absent means" contract the XML-RPC client builds on top of this codec.
pub fn parse_method_response(xml: &str) -> Result<Value> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut events = Vec::new();
    loop {
        match reader
            .read_event()
            .map_err(|e| CoreError::xmlrpc(e.to_string()))?
        {
            Event::Eof => break,
            ev => events.push(ev.into_owned()),
        }
    }

    let mut pos = 0;
    expect_start(&events, &mut pos, "methodResponse")?;

    if peek_is_start(&events, pos, "fault") {
        pos += 1;
        expect_start(&events, &mut pos, "value")?;
        let fault = parse_value(&events, &mut pos)?;
        let message = fault
            .as_struct()
            .and_then(|members| members.iter().find(|(k, _)| k == "faultString"))
            .and_then(|(_, v)| v.as_str())
            .unwrap_or("unknown fault")
            .to_string();
        return Err(CoreError::xmlrpc(format!("fault response: {message}")));
    }

    expect_start(&events, &mut pos, "params")?;
    expect_start(&events, &mut pos, "param")?;
    expect_start(&events, &mut pos, "value")?;
    let value = parse_value(&events, &mut pos)?;

    Ok(value)
}

fn write_start(writer: &mut Writer<Vec<u8>>, name: &str) {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .expect("write to in-memory buffer cannot fail");
}

fn write_end(writer: &mut Writer<Vec<u8>>, name: &str) {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .expect("write to in-memory buffer cannot fail");
}

fn write_text_elem(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) {
    write_start(writer, name);
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .expect("write to in-memory buffer cannot fail");
    write_end(writer, name);
}

fn write_value(writer: &mut Writer<Vec<u8>>, value: &Value) {
    write_start(writer, "value");
    match value {
        Value::Int(n) => write_text_elem(writer, "int", &n.to_string()),
        Value::String(s) => write_text_elem(writer, "string", s),
        Value::Boolean(b) => write_text_elem(writer, "boolean", if *b { "1" } else { "0" }),
        Value::Array(items) => {
            write_start(writer, "array");
            write_start(writer, "data");
            for item in items {
                write_value(writer, item);
            }
            write_end(writer, "data");
            write_end(writer, "array");
        }
        Value::Struct(members) => {
            write_start(writer, "struct");
            for (name, member_value) in members {
                write_start(writer, "member");
                write_text_elem(writer, "name", name);
                write_value(writer, member_value);
                write_end(writer, "member");
            }
            write_end(writer, "struct");
        }
    }
    write_end(writer, "value");
}

fn tag_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn peek_is_start(events: &[Event<'static>], pos: usize, name: &str) -> bool {
    matches!(events.get(pos), Some(Event::Start(s)) if tag_name(s) == name)
}

fn expect_start(events: &[Event<'static>], pos: &mut usize, name: &str) -> Result<()> {
    match events.get(*pos) {
        Some(Event::Start(s)) if tag_name(s) == name => {
            *pos += 1;
            Ok(())
        }
        other => Err(CoreError::xmlrpc(format!(
            "expected <{name}>, found {other:?}"
        ))),
    }
}

fn expect_end(events: &[Event<'static>], pos: &mut usize, name: &str) -> Result<()> {
    match events.get(*pos) {
        Some(Event::End(e)) if String::from_utf8_lossy(e.name().as_ref()) == name => {
            *pos += 1;
            Ok(())
        }
        other => Err(CoreError::xmlrpc(format!(
            "expected </{name}>, found {other:?}"
        ))),
    }
}

fn read_text(events: &[Event<'static>], pos: &mut usize) -> Result<String> {
    match events.get(*pos) {
        Some(Event::Text(t)) => {
            *pos += 1;
            Ok(t.unescape()
                .map_err(|e| CoreError::xmlrpc(e.to_string()))?
                .into_owned())
        }
        _ => Ok(String::new()),
    }
}

/// Parses the contents of a `<value>` element, assuming the opening
/// `<value>` tag has already been consumed.
fn parse_value(events: &[Event<'static>], pos: &mut usize) -> Result<Value> {
    let value = match events.get(*pos) {
        Some(Event::Text(_)) | Some(Event::End(_)) => {
            // Bare text inside <value> with no typed child defaults to string.
            let text = read_text(events, pos)?;
            Value::String(text)
        }
        Some(Event::Start(s)) => {
            let name = tag_name(s);
            *pos += 1;
            match name.as_str() {
                "int" | "i4" | "i8" => {
                    let text = read_text(events, pos)?;
                    expect_end(events, pos, &name)?;
                    let n = text
                        .trim()
                        .parse::<i64>()
                        .map_err(|e| CoreError::xmlrpc(format!("invalid int {text:?}: {e}")))?;
                    return finish_value(events, pos, Value::Int(n));
                }
                "string" => {
                    let text = read_text(events, pos)?;
                    expect_end(events, pos, "string")?;
                    return finish_value(events, pos, Value::String(text));
                }
                "boolean" => {
                    let text = read_text(events, pos)?;
                    expect_end(events, pos, "boolean")?;
                    return finish_value(events, pos, Value::Boolean(text.trim() == "1"));
                }
                "array" => {
                    expect_start(events, pos, "data")?;
                    let mut items = Vec::new();
                    while peek_is_start(events, *pos, "value") {
                        expect_start(events, pos, "value")?;
                        items.push(parse_value(events, pos)?);
                    }
                    expect_end(events, pos, "data")?;
                    expect_end(events, pos, "array")?;
                    return finish_value(events, pos, Value::Array(items));
                }
                "struct" => {
                    let mut members = Vec::new();
                    while peek_is_start(events, *pos, "member") {
                        expect_start(events, pos, "member")?;
                        expect_start(events, pos, "name")?;
                        let member_name = read_text(events, pos)?;
                        expect_end(events, pos, "name")?;
                        expect_start(events, pos, "value")?;
                        let member_value = parse_value(events, pos)?;
                        expect_end(events, pos, "member")?;
                        members.push((member_name, member_value));
                    }
                    expect_end(events, pos, "struct")?;
                    return finish_value(events, pos, Value::Struct(members));
                }
                other => {
                    return Err(CoreError::xmlrpc(format!("unsupported value type <{other}>")));
                }
            }
        }
        other => {
            return Err(CoreError::xmlrpc(format!(
                "unexpected event while parsing value: {other:?}"
            )));
        }
    };
    finish_value(events, pos, value)
}

fn finish_value(events: &[Event<'static>], pos: &mut usize, value: Value) -> Result<Value> {
    expect_end(events, pos, "value")?;
    Ok(value)
}
