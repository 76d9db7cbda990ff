use std::{fmt, str::FromStr};

use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const MIN_TIMEOUT_MS: u64 = 1_000;
pub const MAX_TIMEOUT_MS: u64 = 60_000;

#[derive(Clone, Copy, Serialize, Debug, Deserialize, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
    OPTIONS,
    HEAD,
}

impl HttpMethod {
    /// Only these methods get the body text attached on dispatch.
    pub fn carries_body(&self) -> bool {
        matches!(self, HttpMethod::POST | HttpMethod::PUT | HttpMethod::PATCH)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct HttpMethodParseError(pub String);

impl fmt::Display for HttpMethodParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported http method '{}'", self.0)
    }
}

impl std::error::Error for HttpMethodParseError {}

impl FromStr for HttpMethod {
    type Err = HttpMethodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::GET),
            "POST" => Ok(HttpMethod::POST),
            "PUT" => Ok(HttpMethod::PUT),
            "PATCH" => Ok(HttpMethod::PATCH),
            "DELETE" => Ok(HttpMethod::DELETE),
            "OPTIONS" => Ok(HttpMethod::OPTIONS),
            "HEAD" => Ok(HttpMethod::HEAD),
            _ => Err(HttpMethodParseError(s.to_string())),
        }
    }
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Debug)]
pub struct RequestHeader {
    pub key: String,
    pub value: String,
}

/// Ordered header list. Names keep the casing they were given but lookups
/// and replacement ignore case. Serializes as a JSON object in list order.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct RequestHeaders(pub Vec<RequestHeader>);

impl RequestHeaders {
    pub fn new() -> Self {
        RequestHeaders(Vec::new())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self
            .0
            .iter()
            .find(|h| h.key.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Sets `name` to `value`. An existing entry with the same name (any case)
    /// is replaced in place and takes the new casing.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|h| h.key.eq_ignore_ascii_case(&name)) {
            Some(existing) => {
                existing.key = name;
                existing.value = value;
            }
            None => self.0.push(RequestHeader { key: name, value }),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RequestHeader> {
        self.0.iter()
    }
}

impl FromIterator<(String, String)> for RequestHeaders {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut h = RequestHeaders::new();
        for (k, v) in iter {
            h.insert(k, v);
        }
        h
    }
}

impl<'a> IntoIterator for &'a RequestHeaders {
    type Item = &'a RequestHeader;
    type IntoIter = std::slice::Iter<'a, RequestHeader>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for RequestHeaders {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for header in &self.0 {
            map.serialize_entry(&header.key, &header.value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RequestHeaders {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HeadersVisitor;

        impl<'de> Visitor<'de> for HeadersVisitor {
            type Value = RequestHeaders;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of header names to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut headers = RequestHeaders::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    headers.0.push(RequestHeader { key, value });
                }
                Ok(headers)
            }
        }

        deserializer.deserialize_map(HeadersVisitor)
    }
}

fn enabled_by_default() -> bool {
    true
}

/// One header row as typed into the request form.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct HeaderEntry {
    pub key: String,
    pub value: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl HeaderEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        HeaderEntry {
            key: key.into(),
            value: value.into(),
            enabled: true,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct QueryParam {
    pub key: String,
    pub value: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl QueryParam {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        QueryParam {
            key: key.into(),
            value: value.into(),
            enabled: true,
        }
    }

    pub fn disabled(key: impl Into<String>, value: impl Into<String>) -> Self {
        QueryParam {
            enabled: false,
            ..QueryParam::new(key, value)
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    None,
    Bearer(String),
    Basic(String),
    ApiKey(String),
}

/// Raw request intent collected by the client before normalization.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRequestInput {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: Vec<HeaderEntry>,
    #[serde(default)]
    pub params: Vec<QueryParam>,
    #[serde(default)]
    pub auth: AuthMode,
    pub body: Option<String>,
    pub timeout_ms: Option<u64>,
}

/// Fully resolved outbound request, ready for `ApiHub::execute`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub url: String,
    pub headers: RequestHeaders,
    pub body_text: Option<String>,
    pub timeout_ms: u64,
}
