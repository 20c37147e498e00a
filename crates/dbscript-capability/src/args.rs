//! Positional-argument normalization.
//!
//! Operations take a single named-parameter object, but agents call methods
//! the way they would call any function: `readQuery("SELECT 1")`,
//! `describeTable("users", "mydb")`, `insertRows("users", rows, {ignore:
//! true})`. The rules here convert an ordered argument list into the object
//! the operation expects, driven by a per-method [`MethodArgSpec`].
//!
//! Normalization never fails: any shape without a configured mapping
//! degrades to a pass-through, so rejection (if any) always comes from the
//! operation's own input validation.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

/// Fallback keys used when a primitive argument arrives for a method with no
/// configured first parameter. The value is duplicated under a query-like and
/// a name-like key so the operation's own validation selects the one it
/// expects.
const FALLBACK_KEYS: [&str; 2] = ["query", "name"];

/// Call-time argument mapping for one method.
#[derive(Debug, Clone, Default)]
pub struct MethodArgSpec {
    /// Key a single primitive argument maps to.
    pub first_key: Option<String>,
    /// Key a leading array argument is wrapped under.
    pub array_key: Option<String>,
    /// Ordered keys for multi-argument calls.
    pub positional: Vec<String>,
}

impl MethodArgSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn first(mut self, key: impl Into<String>) -> Self {
        self.first_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn array(mut self, key: impl Into<String>) -> Self {
        self.array_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn positional<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.positional = keys.into_iter().map(Into::into).collect();
        self
    }

    /// The key a lone primitive argument maps to: the explicit first key,
    /// falling back to the first positional key.
    fn primitive_key(&self) -> Option<&str> {
        self.first_key
            .as_deref()
            .or_else(|| self.positional.first().map(String::as_str))
    }
}

/// Per-method argument conventions, keyed by canonical method name.
#[derive(Debug, Clone, Default)]
pub struct CallConventions {
    specs: BTreeMap<String, MethodArgSpec>,
}

impl CallConventions {
    /// An empty table: every call degrades to pass-through.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the spec for one method.
    pub fn insert(&mut self, method: impl Into<String>, spec: MethodArgSpec) {
        self.specs.insert(method.into(), spec);
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, method: impl Into<String>, spec: MethodArgSpec) -> Self {
        self.insert(method, spec);
        self
    }

    /// Look up the spec for a canonical method name.
    #[must_use]
    pub fn spec(&self, method: &str) -> Option<&MethodArgSpec> {
        self.specs.get(method)
    }

    /// Conventions for the stock database call surface.
    #[must_use]
    pub fn defaults() -> Self {
        Self::new()
            .with("readQuery", MethodArgSpec::new().first("query"))
            .with("writeQuery", MethodArgSpec::new().first("query"))
            .with(
                "explainQuery",
                MethodArgSpec::new().positional(["query", "format"]),
            )
            .with("listTables", MethodArgSpec::new().first("database"))
            .with(
                "describeTable",
                MethodArgSpec::new().positional(["table", "database"]),
            )
            .with("optimizeTable", MethodArgSpec::new().first("table"))
            .with(
                "insertRows",
                MethodArgSpec::new().array("rows").positional(["table", "rows"]),
            )
            .with("batchExecute", MethodArgSpec::new().array("statements"))
            .with(
                "createIndex",
                MethodArgSpec::new().positional(["table", "columns", "name"]),
            )
    }
}

/// Whether a value is a plain object (not an array, not a primitive).
fn is_plain_object(value: &Value) -> bool {
    value.is_object()
}

/// Convert ordered call arguments into the named-parameter object the
/// operation expects. See the module docs for the rule table.
#[must_use]
pub fn normalize(spec: Option<&MethodArgSpec>, args: &[Value]) -> Value {
    match args {
        // No arguments: empty parameter object.
        [] => json!({}),

        // One plain object: pass through unchanged.
        [only] if is_plain_object(only) => only.clone(),

        // One array: wrap under the configured key, else pass through.
        [only] if only.is_array() => match spec.and_then(|s| s.array_key.as_deref()) {
            Some(key) => json!({ key: only }),
            None => only.clone(),
        },

        // One primitive: map to the first configured parameter name, else
        // duplicate under the fallback keys.
        [only] if only.is_string() || only.is_number() => {
            match spec.and_then(MethodArgSpec::primitive_key) {
                Some(key) => json!({ key: only }),
                None => {
                    let mut object = Map::new();
                    for key in FALLBACK_KEYS {
                        object.insert(key.to_string(), only.clone());
                    }
                    Value::Object(object)
                }
            }
        }

        // Two or more arguments, leading array with a configured wrap key:
        // wrap the array, then merge a trailing options object if present.
        [first, rest @ ..]
            if first.is_array() && spec.is_some_and(|s| s.array_key.is_some()) =>
        {
            let key = spec
                .and_then(|s| s.array_key.clone())
                .unwrap_or_default();
            let mut object = Map::new();
            object.insert(key, first.clone());
            if let Some(Value::Object(options)) = rest.last() {
                for (k, v) in options {
                    object.insert(k.clone(), v.clone());
                }
            }
            Value::Object(object)
        }

        // Two or more arguments with an ordered multi-key mapping: assign
        // positionally; a trailing plain object beyond the mapped keys, or
        // one whose keys overlap them, is merged as options instead of
        // consumed positionally.
        _ if spec.is_some_and(|s| !s.positional.is_empty()) => {
            let keys = spec.map(|s| s.positional.as_slice()).unwrap_or_default();

            let mut positional = args;
            let mut options: Option<&Map<String, Value>> = None;
            if let Some(Value::Object(last)) = args.last() {
                let beyond_mapping = args.len() > keys.len();
                let overlaps = last.keys().any(|k| keys.iter().any(|key| key == k));
                if beyond_mapping || overlaps {
                    options = Some(last);
                    positional = &args[..args.len() - 1];
                }
            }

            let mut object = Map::new();
            for (value, key) in positional.iter().zip(keys) {
                object.insert(key.clone(), value.clone());
            }
            if let Some(options) = options {
                for (k, v) in options {
                    object.insert(k.clone(), v.clone());
                }
            }
            Value::Object(object)
        }

        // No mapping at all: defer to the operation's own validation.
        [first, ..] => first.clone(),
    }
}
