//! Immutable catalog of operation descriptors and the relevance-ranked search
//! over it.
//!
//! Matching is plain: both the query and each descriptor's
//! `name summary tags` haystack are lower-cased with every non-alphanumeric
//! run collapsed to one space, and a descriptor scores one point per query
//! token found as a substring of its haystack. No stemming, no field weights.

use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};
use serde_with::skip_serializing_none;
use std::collections::HashSet;

pub const MAX_SEARCH_LIMIT: i64 = 50;

const SEARCH_HINT: &str =
    "Use detail='name' for minimal context; detail='full' only when implementing a call.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgKind {
    #[serde(rename = "string")]
    Str,
    #[serde(rename = "integer")]
    Int,
    #[serde(rename = "boolean")]
    Bool,
    #[serde(rename = "string_list")]
    StrList,
    Object,
}

impl ArgKind {
    fn json_schema(self) -> Value {
        match self {
            ArgKind::Str => json!({"type": "string"}),
            ArgKind::Int => json!({"type": "integer"}),
            ArgKind::Bool => json!({"type": "boolean"}),
            ArgKind::StrList => json!({"type": "array", "items": {"type": "string"}}),
            ArgKind::Object => json!({"type": "object"}),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArgType {
    #[serde(rename = "type")]
    pub kind: ArgKind,
    pub optional: bool,
}

/// Parameter name to type, in declaration order. Documentation only; handlers
/// do their own decoding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgSpec(Vec<(&'static str, ArgType)>);

impl ArgSpec {
    pub fn iter(&self) -> impl Iterator<Item = &(&'static str, ArgType)> {
        self.0.iter()
    }

    /// JSON Schema object advertised as a tool's `inputSchema`.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for (name, ty) in &self.0 {
            properties.insert((*name).to_string(), ty.kind.json_schema());
            if !ty.optional {
                required.push(Value::from(*name));
            }
        }
        json!({"type": "object", "properties": properties, "required": required})
    }
}

impl Serialize for ArgSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, ty) in &self.0 {
            map.serialize_entry(name, ty)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityDescriptor {
    pub name: &'static str,
    pub summary: &'static str,
    pub tags: &'static [&'static str],
    pub args: ArgSpec,
    pub returns: &'static str,
    pub example: Value,
    pub typical_bytes: u32,
}

impl CapabilityDescriptor {
    pub fn new(name: &'static str, summary: &'static str) -> Self {
        Self {
            name,
            summary,
            tags: &[],
            args: ArgSpec::default(),
            returns: "object",
            example: json!({}),
            typical_bytes: 500,
        }
    }

    pub fn tags(mut self, tags: &'static [&'static str]) -> Self {
        self.tags = tags;
        self
    }

    pub fn arg(mut self, name: &'static str, kind: ArgKind) -> Self {
        self.args.0.push((name, ArgType { kind, optional: false }));
        self
    }

    pub fn optional(mut self, name: &'static str, kind: ArgKind) -> Self {
        self.args.0.push((name, ArgType { kind, optional: true }));
        self
    }

    pub fn returns(mut self, returns: &'static str) -> Self {
        self.returns = returns;
        self
    }

    pub fn example(mut self, example: Value) -> Self {
        self.example = example;
        self
    }

    pub fn typical_bytes(mut self, bytes: u32) -> Self {
        self.typical_bytes = bytes;
        self
    }

    fn view(&self, detail: DetailLevel) -> CapabilityView<'_> {
        let summary = detail >= DetailLevel::Summary;
        let full = detail == DetailLevel::Full;
        CapabilityView {
            name: self.name,
            summary: summary.then_some(self.summary),
            tags: summary.then_some(self.tags),
            args: full.then_some(&self.args),
            returns: full.then_some(self.returns),
            example: full.then_some(&self.example),
            typical_bytes: full.then_some(self.typical_bytes),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Name,
    #[default]
    Summary,
    Full,
}

#[skip_serializing_none]
#[derive(Debug, PartialEq, Serialize)]
pub struct CapabilityView<'a> {
    pub name: &'a str,
    pub summary: Option<&'a str>,
    pub tags: Option<&'a [&'static str]>,
    pub args: Option<&'a ArgSpec>,
    pub returns: Option<&'a str>,
    pub example: Option<&'a Value>,
    pub typical_bytes: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SearchResult<'a> {
    pub matches: Vec<CapabilityView<'a>>,
    pub count: usize,
    pub hint: &'static str,
}

struct Entry {
    descriptor: CapabilityDescriptor,
    haystack: String,
}

/// Read-only after construction; entries are kept sorted by name.
pub struct Catalog {
    entries: Vec<Entry>,
}

impl Catalog {
    pub fn new(descriptors: Vec<CapabilityDescriptor>) -> anyhow::Result<Self> {
        let mut seen = HashSet::new();
        for d in &descriptors {
            if !seen.insert(d.name) {
                anyhow::bail!("duplicate capability name: {}", d.name);
            }
        }
        let mut entries: Vec<Entry> = descriptors
            .into_iter()
            .map(|descriptor| {
                let haystack = normalize(&format!(
                    "{} {} {}",
                    descriptor.name,
                    descriptor.summary,
                    descriptor.tags.join(" ")
                ));
                Entry { descriptor, haystack }
            })
            .collect();
        entries.sort_by(|a, b| a.descriptor.name.cmp(b.descriptor.name));
        Ok(Self { entries })
    }

    pub fn get(&self, name: &str) -> Option<&CapabilityDescriptor> {
        self.entries
            .binary_search_by(|e| e.descriptor.name.cmp(name))
            .ok()
            .map(|i| &self.entries[i].descriptor)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CapabilityDescriptor> {
        self.entries.iter().map(|e| &e.descriptor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn search(&self, query: &str, detail: DetailLevel, limit: i64) -> SearchResult<'_> {
        let limit = clamp_limit(limit, MAX_SEARCH_LIMIT);
        let selected: Vec<&CapabilityDescriptor> = if query.trim().is_empty() {
            self.iter().take(limit).collect()
        } else {
            let normalized = normalize(query);
            let tokens: Vec<&str> = normalized.split_whitespace().collect();
            let mut scored: Vec<(usize, &CapabilityDescriptor)> = self
                .entries
                .iter()
                .map(|e| (score(&tokens, &e.haystack), &e.descriptor))
                .filter(|(s, _)| *s > 0)
                .collect();
            scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.name.cmp(b.1.name)));
            scored.into_iter().take(limit).map(|(_, d)| d).collect()
        };
        let matches: Vec<CapabilityView<'_>> = selected.into_iter().map(|d| d.view(detail)).collect();
        SearchResult {
            count: matches.len(),
            matches,
            hint: SEARCH_HINT,
        }
    }
}

/// Clamp any requested limit into `[1, max]`.
pub fn clamp_limit(limit: i64, max: i64) -> usize {
    limit.clamp(1, max) as usize
}

/// Lower-case and collapse every non-alphanumeric run to a single space.
pub fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else if !out.ends_with(' ') {
            out.push(' ');
        }
    }
    out.trim().to_string()
}

/// One point per token present in the haystack; repeated tokens count again.
pub fn score(tokens: &[&str], haystack: &str) -> usize {
    tokens.iter().filter(|t| haystack.contains(*t)).count()
}
