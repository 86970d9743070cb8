// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Construction of map/reduce job descriptions.
//!
//! This is request-building glue, not part of the collection core: a
//! [`MapReduce`] job collects inputs and an ordered list of query phases,
//! then serializes to the JSON shape the server executes. It shares no
//! state with the map tree; both simply end up as requests against the
//! same database.
//!
//! ```rust
//! use crmap::mapred::{Function, MapReduce, Phase};
//!
//! let job = MapReduce::new()
//!     .add("goog", "2010-04-12")
//!     .add("goog", "2010-04-13")
//!     .phase(Phase::map(Function::source("function(v){ return [v]; }")).keep(true))
//!     .timeout(50_000);
//!
//! let body = job.to_json().to_string();
//! assert!(body.contains("\"inputs\":"));
//! assert!(body.contains("\"query\":"));
//! ```
use serde_json::{Map, Value, json};
use std::{error, fmt};

/// Percent-escapes a bucket or key for inclusion in job inputs.
///
/// Unreserved characters (alphanumerics and `-`, `_`, `.`, `~`) pass
/// through; everything else becomes `%XX` with uppercase hex.
pub fn escape(input: &str) -> String {
    use std::fmt::Write;

    let mut escaped = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                escaped.push(byte as char);
            }
            _ => write!(escaped, "%{byte:02X}").expect("writing to a String cannot fail"),
        }
    }
    escaped
}

/// One bucket/key input, with optional key data passed through to the
/// first phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub bucket: String,
    pub key: String,
    pub keydata: Option<Value>,
}

/// The inputs of a [`MapReduce`] job.
#[derive(Debug, Clone, PartialEq)]
pub enum Inputs {
    /// Every key in one bucket.
    Bucket(String),
    /// An explicit list of bucket/key pairs.
    Pairs(Vec<Input>),
    /// Every key in a bucket that passes the given key filters.
    Filtered { bucket: String, filters: Vec<Value> },
    /// The keys matched by a secondary-index query.
    Index {
        bucket: String,
        index: String,
        query: IndexQuery,
    },
}

impl Default for Inputs {
    fn default() -> Self {
        Self::Pairs(Vec::new())
    }
}

/// A value a secondary index is queried with.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexValue {
    Int(i64),
    Bin(String),
}

impl From<i64> for IndexValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for IndexValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<&str> for IndexValue {
    fn from(value: &str) -> Self {
        Self::Bin(value.to_string())
    }
}

impl From<String> for IndexValue {
    fn from(value: String) -> Self {
        Self::Bin(value)
    }
}

impl IndexValue {
    fn to_json(&self) -> Value {
        match self {
            Self::Int(v) => (*v).into(),
            Self::Bin(v) => v.clone().into(),
        }
    }
}

/// A secondary-index query: exact match or an inclusive range.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexQuery {
    Eq(IndexValue),
    Range { start: IndexValue, end: IndexValue },
}

impl IndexQuery {
    pub fn eq(value: impl Into<IndexValue>) -> Self {
        Self::Eq(value.into())
    }

    /// An inclusive range query. Both endpoints must be the same type of
    /// index value.
    pub fn range(
        start: impl Into<IndexValue>,
        end: impl Into<IndexValue>,
    ) -> Result<Self, MapReduceError> {
        let start = start.into();
        let end = end.into();
        match (&start, &end) {
            (IndexValue::Int(_), IndexValue::Int(_)) | (IndexValue::Bin(_), IndexValue::Bin(_)) => {
                Ok(Self::Range { start, end })
            }
            _ => Err(MapReduceError::MixedIndexRange),
        }
    }
}

/// The function a map or reduce phase runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Function {
    /// JavaScript source.
    Source(String),
    /// A named built-in JavaScript function, e.g. `Riak.mapValues`.
    Named(String),
    /// An Erlang module/function pair.
    Erlang { module: String, function: String },
}

impl Function {
    pub fn source(source: impl Into<String>) -> Self {
        Self::Source(source.into())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn erlang(module: impl Into<String>, function: impl Into<String>) -> Self {
        Self::Erlang {
            module: module.into(),
            function: function.into(),
        }
    }

    fn language(&self) -> &'static str {
        match self {
            Self::Source(_) | Self::Named(_) => "javascript",
            Self::Erlang { .. } => "erlang",
        }
    }
}

/// Infers source vs. named form: anything that reads like a function
/// definition is source, the rest is a name.
impl From<&str> for Function {
    fn from(value: &str) -> Self {
        if value.trim_start().starts_with("function") {
            Self::Source(value.to_string())
        } else {
            Self::Named(value.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum PhaseKind {
    Map(Function),
    Reduce(Function),
    Link {
        bucket: Option<String>,
        tag: Option<String>,
    },
}

/// One phase of a [`MapReduce`] query.
#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    kind: PhaseKind,
    keep: bool,
    arg: Option<Value>,
}

impl Phase {
    pub fn map(function: impl Into<Function>) -> Self {
        Self {
            kind: PhaseKind::Map(function.into()),
            keep: false,
            arg: None,
        }
    }

    pub fn reduce(function: impl Into<Function>) -> Self {
        Self {
            kind: PhaseKind::Reduce(function.into()),
            keep: false,
            arg: None,
        }
    }

    /// A link-walking phase. `None` matches any bucket or tag.
    pub fn link(bucket: Option<String>, tag: Option<String>) -> Self {
        Self {
            kind: PhaseKind::Link { bucket, tag },
            keep: false,
            arg: None,
        }
    }

    /// Whether this phase's output is returned to the client.
    pub fn keep(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    /// A static argument passed to the phase function.
    pub fn arg(mut self, arg: Value) -> Self {
        self.arg = Some(arg);
        self
    }

    fn to_json(&self) -> Value {
        match &self.kind {
            PhaseKind::Map(function) | PhaseKind::Reduce(function) => {
                let mut body = Map::new();
                body.insert("language".to_string(), function.language().into());
                match function {
                    Function::Source(source) => {
                        body.insert("source".to_string(), source.clone().into());
                    }
                    Function::Named(name) => {
                        body.insert("name".to_string(), name.clone().into());
                    }
                    Function::Erlang { module, function } => {
                        body.insert("module".to_string(), module.clone().into());
                        body.insert("function".to_string(), function.clone().into());
                    }
                }
                body.insert("keep".to_string(), self.keep.into());
                if let Some(arg) = &self.arg {
                    body.insert("arg".to_string(), arg.clone());
                }
                let wrapper = if matches!(&self.kind, PhaseKind::Map(_)) {
                    "map"
                } else {
                    "reduce"
                };
                json!({ wrapper: body })
            }
            PhaseKind::Link { bucket, tag } => {
                let mut body = Map::new();
                body.insert(
                    "bucket".to_string(),
                    bucket.clone().unwrap_or_else(|| "_".to_string()).into(),
                );
                body.insert(
                    "tag".to_string(),
                    tag.clone().unwrap_or_else(|| "_".to_string()).into(),
                );
                body.insert("keep".to_string(), self.keep.into());
                json!({ "link": body })
            }
        }
    }
}

/// A map/reduce job under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapReduce {
    inputs: Inputs,
    query: Vec<Phase>,
    timeout: Option<u64>,
}

impl MapReduce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses every key of `bucket` as the input. Replaces any inputs added
    /// so far.
    pub fn bucket(mut self, bucket: &str) -> Self {
        self.inputs = Inputs::Bucket(escape(bucket));
        self
    }

    /// Adds one bucket/key pair to the inputs. Bucket and key are escaped.
    pub fn add(self, bucket: &str, key: &str) -> Self {
        self.push_input(Input {
            bucket: escape(bucket),
            key: escape(key),
            keydata: None,
        })
    }

    /// Adds a bucket/key pair with key data, passed through to the first
    /// phase unescaped.
    pub fn add_with(self, bucket: &str, key: &str, keydata: Value) -> Self {
        self.push_input(Input {
            bucket: escape(bucket),
            key: escape(key),
            keydata: Some(keydata),
        })
    }

    fn push_input(mut self, input: Input) -> Self {
        match &mut self.inputs {
            Inputs::Pairs(pairs) => pairs.push(input),
            _ => self.inputs = Inputs::Pairs(vec![input]),
        }
        self
    }

    /// Uses `bucket` filtered by the given key filters as the input.
    pub fn filter(mut self, bucket: &str, filters: Vec<Value>) -> Self {
        self.inputs = Inputs::Filtered {
            bucket: bucket.to_string(),
            filters,
        };
        self
    }

    /// Uses a secondary-index query on `bucket` as the input.
    pub fn index(mut self, bucket: &str, index: &str, query: IndexQuery) -> Self {
        self.inputs = Inputs::Index {
            bucket: bucket.to_string(),
            index: index.to_string(),
            query,
        };
        self
    }

    /// Appends a phase to the query.
    pub fn phase(mut self, phase: Phase) -> Self {
        self.query.push(phase);
        self
    }

    /// Appends a map phase with default options.
    pub fn map(self, function: impl Into<Function>) -> Self {
        self.phase(Phase::map(function))
    }

    /// Appends a reduce phase with default options.
    pub fn reduce(self, function: impl Into<Function>) -> Self {
        self.phase(Phase::reduce(function))
    }

    /// Appends a link phase with default options.
    pub fn link(self, bucket: Option<String>, tag: Option<String>) -> Self {
        self.phase(Phase::link(bucket, tag))
    }

    /// Sets the job timeout in milliseconds.
    pub fn timeout(mut self, milliseconds: u64) -> Self {
        self.timeout = Some(milliseconds);
        self
    }

    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    pub fn query(&self) -> &[Phase] {
        &self.query
    }

    /// The JSON job body submitted to the server.
    pub fn to_json(&self) -> Value {
        let inputs = match &self.inputs {
            Inputs::Bucket(bucket) => bucket.clone().into(),
            Inputs::Pairs(pairs) => pairs
                .iter()
                .map(|input| {
                    let mut pair = vec![
                        Value::from(input.bucket.clone()),
                        Value::from(input.key.clone()),
                    ];
                    if let Some(keydata) = &input.keydata {
                        pair.push(keydata.clone());
                    }
                    Value::from(pair)
                })
                .collect(),
            Inputs::Filtered { bucket, filters } => json!({
                "bucket": bucket,
                "key_filters": filters,
            }),
            Inputs::Index {
                bucket,
                index,
                query,
            } => match query {
                IndexQuery::Eq(value) => json!({
                    "bucket": bucket,
                    "index": index,
                    "key": value.to_json(),
                }),
                IndexQuery::Range { start, end } => json!({
                    "bucket": bucket,
                    "index": index,
                    "start": start.to_json(),
                    "end": end.to_json(),
                }),
            },
        };

        let mut job = Map::new();
        job.insert("inputs".to_string(), inputs);
        job.insert(
            "query".to_string(),
            self.query.iter().map(Phase::to_json).collect(),
        );
        if let Some(timeout) = self.timeout {
            job.insert("timeout".to_string(), timeout.into());
        }
        Value::Object(job)
    }
}

/// Errors building a map/reduce job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapReduceError {
    /// A secondary-index range mixed integer and binary endpoints.
    MixedIndexRange,
}

impl fmt::Display for MapReduceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MixedIndexRange => {
                write!(f, "index range endpoints must share one value type")
            }
        }
    }
}

impl error::Error for MapReduceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let mr = MapReduce::new();
        assert_eq!(mr.inputs(), &Inputs::Pairs(Vec::new()));
        assert!(mr.query().is_empty());
    }

    #[test]
    fn escape_leaves_unreserved_and_encodes_the_rest() {
        assert_eq!(escape("docs"), "docs");
        assert_eq!(escape("[foo]"), "%5Bfoo%5D");
        assert_eq!(escape("(bar)"), "%28bar%29");
        assert_eq!(escape("a b"), "a%20b");
    }

    #[test]
    fn pairs_are_escaped_but_keydata_is_not() {
        let mr = MapReduce::new().add_with("[foo]", "(bar)", "[]()".into());
        match mr.inputs() {
            Inputs::Pairs(pairs) => {
                assert_eq!(pairs[0].bucket, "%5Bfoo%5D");
                assert_eq!(pairs[0].key, "%28bar%29");
                assert_eq!(pairs[0].keydata, Some("[]()".into()));
            }
            other => panic!("unexpected inputs {other:?}"),
        }
    }

    #[test]
    fn whole_bucket_input_is_just_the_name() {
        let mr = MapReduce::new().add("foo", "bar").bucket("docs");
        assert_eq!(mr.to_json()["inputs"], json!("docs"));
    }

    #[test]
    fn multiple_pairs_emit_nested_arrays() {
        let mr = MapReduce::new()
            .add_with("foo", "bar", json!(1000))
            .add("foo", "baz");
        assert_eq!(
            mr.to_json()["inputs"],
            json!([["foo", "bar", 1000], ["foo", "baz"]]),
        );
    }

    #[test]
    fn key_filters_describe_the_bucket() {
        let mr = MapReduce::new().filter(
            "foo",
            vec![
                json!(["tokenize", "-", 3]),
                json!(["string_to_int"]),
                json!(["between", 2009, 2010]),
            ],
        );
        assert_eq!(
            mr.to_json()["inputs"],
            json!({
                "bucket": "foo",
                "key_filters": [
                    ["tokenize", "-", 3],
                    ["string_to_int"],
                    ["between", 2009, 2010],
                ],
            }),
        );
    }

    #[test]
    fn index_equality_and_range_inputs() {
        let mr = MapReduce::new().index("foo", "email_bin", IndexQuery::eq("sean@example.com"));
        assert_eq!(
            mr.to_json()["inputs"],
            json!({ "bucket": "foo", "index": "email_bin", "key": "sean@example.com" }),
        );

        let mr = MapReduce::new().index(
            "foo",
            "rank_int",
            IndexQuery::range(10, 20).unwrap(),
        );
        assert_eq!(
            mr.to_json()["inputs"],
            json!({ "bucket": "foo", "index": "rank_int", "start": 10, "end": 20 }),
        );
    }

    #[test]
    fn mixed_range_endpoints_are_rejected() {
        assert_eq!(
            IndexQuery::range(10, "z").unwrap_err(),
            MapReduceError::MixedIndexRange,
        );
    }

    #[test]
    fn function_inference_splits_source_from_names() {
        assert_eq!(
            Function::from("function(){}"),
            Function::Source("function(){}".to_string()),
        );
        assert_eq!(
            Function::from("Riak.mapValues"),
            Function::Named("Riak.mapValues".to_string()),
        );
    }

    #[test]
    fn map_phase_bodies_carry_language_and_source() {
        let mr = MapReduce::new().map("function(){}");
        assert_eq!(
            mr.to_json()["query"],
            json!([{ "map": {
                "language": "javascript",
                "source": "function(){}",
                "keep": false,
            }}]),
        );
    }

    #[test]
    fn erlang_phases_carry_module_and_function() {
        let mr = MapReduce::new().phase(
            Phase::reduce(Function::erlang("riak_kv_mapreduce", "reduce_sum")).arg(json!([1000])),
        );
        assert_eq!(
            mr.to_json()["query"],
            json!([{ "reduce": {
                "language": "erlang",
                "module": "riak_kv_mapreduce",
                "function": "reduce_sum",
                "keep": false,
                "arg": [1000],
            }}]),
        );
    }

    #[test]
    fn link_phases_default_to_wildcards() {
        let mr = MapReduce::new().link(None, Some("next".to_string()));
        assert_eq!(
            mr.to_json()["query"],
            json!([{ "link": { "bucket": "_", "tag": "next", "keep": false } }]),
        );
    }

    #[test]
    fn timeout_appears_only_when_set() {
        let mr = MapReduce::new();
        assert!(mr.to_json().get("timeout").is_none());
        let mr = mr.timeout(50_000);
        assert_eq!(mr.to_json()["timeout"], json!(50_000));
    }

    #[test]
    fn keep_marks_phase_output() {
        let mr = MapReduce::new().phase(Phase::map(Function::named("Riak.mapValues")).keep(true));
        assert_eq!(mr.to_json()["query"][0]["map"]["keep"], json!(true));
    }
}
