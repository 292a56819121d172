//! Argument extraction for tool calls
//!
//! Callers are chat assistants, so arguments arrive loosely typed: numbers
//! as strings, booleans as `"true"`. These helpers accept the obvious
//! spellings and reject everything else with [`ToolError::InvalidArgument`].

use super::catalog::FilterSpec;
use crate::error::ToolError;
use crate::store::query::{clamp_limit, DEFAULT_LIMIT};
use crate::store::{ContentFilter, FilterValue, Matcher};
use serde_json::{Map, Value};

pub struct ToolArgs<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> ToolArgs<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    /// Present and non-null argument
    fn get(&self, name: &str) -> Option<&'a Value> {
        self.map.get(name).filter(|v| !v.is_null())
    }

    /// String argument; numbers and booleans are accepted in their JSON spelling.
    /// Blank strings count as absent.
    pub fn optional_str(&self, name: &str) -> Result<Option<String>, ToolError> {
        let text = match self.get(name) {
            None => return Ok(None),
            Some(Value::String(s)) => s.trim().to_string(),
            Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
            Some(_) => return Err(ToolError::invalid(name, "expected a string")),
        };

        Ok((!text.is_empty()).then_some(text))
    }

    pub fn optional_i64(&self, name: &str) -> Result<Option<i64>, ToolError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .map(Some)
                .ok_or_else(|| ToolError::invalid(name, "expected an integer")),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| ToolError::invalid(name, format!("expected an integer, got \"{}\"", s))),
            Some(_) => Err(ToolError::invalid(name, "expected an integer")),
        }
    }

    pub fn optional_bool(&self, name: &str) -> Result<Option<bool>, ToolError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::Number(n)) if n.as_i64() == Some(1) => Ok(Some(true)),
            Some(Value::Number(n)) if n.as_i64() == Some(0) => Ok(Some(false)),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(Some(true)),
                "false" | "0" | "no" => Ok(Some(false)),
                "" => Ok(None),
                _ => Err(ToolError::invalid(name, format!("expected a boolean, got \"{}\"", s))),
            },
            Some(_) => Err(ToolError::invalid(name, "expected a boolean")),
        }
    }

    /// Row limit: default 50, silently clamped to 1..=100
    pub fn limit(&self) -> Result<usize, ToolError> {
        Ok(match self.optional_i64("limit")? {
            None => DEFAULT_LIMIT,
            Some(n) if n < 1 => 1,
            Some(n) => clamp_limit(usize::try_from(n).unwrap_or(usize::MAX)),
        })
    }

    /// Build the content filter for `spec` if its argument was supplied
    pub fn content_filter(&self, spec: &FilterSpec) -> Result<Option<ContentFilter>, ToolError> {
        let value = match spec.matcher {
            Matcher::NumberEq => self.optional_i64(spec.param)?.map(FilterValue::Integer),
            Matcher::Bool => self.optional_bool(spec.param)?.map(FilterValue::Bool),
            Matcher::Exact | Matcher::ExactIgnoreCase | Matcher::Contains => {
                self.optional_str(spec.param)?.map(FilterValue::Text)
            }
        };

        Ok(value.map(|value| ContentFilter::new(spec.path, spec.matcher, value)))
    }
}
