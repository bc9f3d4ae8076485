//! XML-RPC documents as serde types, written and read by quick-xml.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use quick_xml::{de, se};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{BridgeError, BridgeResult};

const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

#[derive(Debug, Serialize)]
#[serde(rename = "methodCall")]
struct MethodCall<'a> {
    #[serde(rename = "methodName")]
    method_name: &'a str,
    params: Params,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Params {
    #[serde(default)]
    param: Vec<Param>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Param {
    value: XmlValue,
}

#[derive(Debug, Deserialize)]
struct MethodResponse {
    #[serde(rename = "$value")]
    outcome: Outcome,
}

#[derive(Debug, Deserialize)]
enum Outcome {
    #[serde(rename = "params")]
    Params(Params),
    #[serde(rename = "fault")]
    Fault(Param),
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlValue {
    #[serde(rename = "$value", default)]
    typed: Typed,
}

/// One `<value>` payload, chosen by its element name
#[derive(Debug, Serialize, Deserialize)]
enum Typed {
    #[serde(rename = "int", alias = "i4")]
    Int(i64),
    #[serde(rename = "i8")]
    Long(i64),
    #[serde(rename = "boolean")]
    Boolean(#[serde(with = "boolean")] bool),
    #[serde(rename = "string")]
    String(String),
    #[serde(rename = "double")]
    Double(f64),
    #[serde(rename = "dateTime.iso8601")]
    DateTime(String),
    #[serde(rename = "base64")]
    Base64(String),
    #[serde(rename = "array")]
    Array { data: ArrayData },
    #[serde(rename = "struct")]
    Struct {
        #[serde(default)]
        member: Vec<Member>,
    },
    #[serde(rename = "nil")]
    Nil,
    /// Untyped `<value>text</value>`, a string by definition
    #[serde(rename = "$text")]
    Text(String),
}

impl Default for Typed {
    fn default() -> Self {
        Typed::Text(String::new())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ArrayData {
    #[serde(default)]
    value: Vec<XmlValue>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Member {
    name: String,
    value: XmlValue,
}

/// XML-RPC booleans are written as `1`/`0`
mod boolean {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        bool::deserialize(deserializer)
    }
}

fn malformed(e: impl std::fmt::Display) -> BridgeError {
    BridgeError::protocol(format!("malformed XML-RPC document: {}", e))
}

impl From<&Value> for XmlValue {
    fn from(value: &Value) -> Self {
        let typed = match value {
            Value::Null => Typed::Nil,
            Value::Bool(b) => Typed::Boolean(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) if i32::try_from(i).is_ok() => Typed::Int(i),
                Some(i) => Typed::Long(i),
                None => Typed::Double(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => Typed::String(s.clone()),
            Value::Array(items) => Typed::Array {
                data: ArrayData {
                    value: items.iter().map(XmlValue::from).collect(),
                },
            },
            Value::Object(members) => Typed::Struct {
                member: members
                    .iter()
                    .map(|(name, value)| Member {
                        name: name.clone(),
                        value: value.into(),
                    })
                    .collect(),
            },
        };
        XmlValue { typed }
    }
}

impl XmlValue {
    fn into_json(self) -> BridgeResult<Value> {
        Ok(match self.typed {
            Typed::Int(i) | Typed::Long(i) => Value::from(i),
            Typed::Boolean(b) => Value::Bool(b),
            Typed::String(s) | Typed::Text(s) | Typed::DateTime(s) => Value::String(s),
            Typed::Double(d) => Number::from_f64(d)
                .map(Value::Number)
                .ok_or_else(|| malformed(format!("non-finite double {}", d)))?,
            Typed::Base64(text) => decode_base64(&text)?,
            Typed::Array { data } => Value::Array(
                data.value
                    .into_iter()
                    .map(XmlValue::into_json)
                    .collect::<BridgeResult<_>>()?,
            ),
            Typed::Struct { member } => {
                let mut members = Map::new();
                for Member { name, value } in member {
                    members.insert(name, value.into_json()?);
                }
                Value::Object(members)
            }
            Typed::Nil => Value::Null,
        })
    }
}

/// UTF-8 payloads become strings, anything else a list of byte values
fn decode_base64(text: &str) -> BridgeResult<Value> {
    let compact: String = text.split_whitespace().collect();
    let bytes = STANDARD.decode(compact).map_err(malformed)?;
    Ok(match String::from_utf8(bytes) {
        Ok(s) => Value::String(s),
        Err(e) => Value::Array(e.into_bytes().into_iter().map(Value::from).collect()),
    })
}

/// Encode a `<methodCall>` document
pub fn encode_call(method: &str, params: &[Value]) -> BridgeResult<String> {
    let call = MethodCall {
        method_name: method,
        params: Params {
            param: params
                .iter()
                .map(|value| Param {
                    value: value.into(),
                })
                .collect(),
        },
    };
    let body = se::to_string(&call).map_err(malformed)?;
    Ok(format!("{}{}", DECLARATION, body))
}

/// Decode a `<methodResponse>` document; a `<fault>` becomes [`BridgeError::Fault`]
pub fn decode_response(xml: &str) -> BridgeResult<Value> {
    let response: MethodResponse = de::from_str(xml).map_err(malformed)?;
    match response.outcome {
        Outcome::Fault(Param { value }) => {
            let detail = value.into_json()?;
            let code = detail.get("faultCode").and_then(Value::as_i64).unwrap_or(0);
            let message = detail
                .get("faultString")
                .and_then(Value::as_str)
                .unwrap_or("unknown fault")
                .to_string();
            Err(BridgeError::Fault { code, message })
        }
        Outcome::Params(params) => match params.param.into_iter().next() {
            Some(Param { value }) => value.into_json(),
            None => Ok(Value::Null),
        },
    }
}
