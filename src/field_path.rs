//! [`FieldPath`]: a dotted/bracketed path parser and navigator over nested
//! messages, repeated indices, and map keys.

use crate::error::WireError;
use crate::message::DynamicMessage;
use crate::value::Value;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Field(String),
    Index(String, usize),
    Key(String, String),
}

/// A parsed path, reusable across multiple `get`/`set`/`clear`/`has` calls
/// against different root messages of compatible shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// Parses `path` per the grammar:
    /// `path := segment ("." segment)*`, `segment := name | name "[" index "]" | name "[" quoted "]"`.
    /// Dots inside quoted map keys and inside bracketed indices do not
    /// split segments.
    pub fn parse(path: &str) -> Result<FieldPath, WireError> {
        if path.is_empty() {
            return Err(WireError::validation(path, "empty field path"));
        }
        let mut segments = Vec::new();
        for raw in split_on_unquoted_dots(path) {
            segments.push(parse_segment(&raw)?);
        }
        Ok(FieldPath { segments })
    }

    pub fn get<'a>(&self, root: &'a DynamicMessage) -> Option<&'a Value> {
        let (container, last) = self.navigate(root)?;
        match last {
            Segment::Field(name) => container.get(name),
            Segment::Index(name, index) => match container.get(name) {
                Some(Value::Repeated(items)) => items.get(*index),
                _ => None,
            },
            Segment::Key(name, key) => match container.get(name) {
                Some(Value::Map(entries)) => entries.get(key),
                _ => None,
            },
        }
    }

    pub fn has(&self, root: &DynamicMessage) -> bool {
        match self.navigate(root) {
            Some((container, Segment::Field(name))) => container.has(name),
            Some((container, Segment::Index(name, index))) => matches!(
                container.get(name),
                Some(Value::Repeated(items)) if *index < items.len()
            ),
            Some((container, Segment::Key(name, key))) => matches!(
                container.get(name),
                Some(Value::Map(entries)) if entries.contains_key(key)
            ),
            None => false,
        }
    }

    pub fn set(&self, root: &mut DynamicMessage, value: Value) -> Result<(), WireError> {
        let container = self.navigate_mut_auto_create(root)?;
        let last = self.segments.last().expect("parse rejects empty paths");
        match last {
            Segment::Field(name) => container.set(name, value),
            Segment::Index(name, index) => {
                let mut items = match container.get(name) {
                    Some(Value::Repeated(items)) => items.clone(),
                    _ => {
                        return Err(WireError::validation(name, "field is not repeated"));
                    }
                };
                let slot = items
                    .get_mut(*index)
                    .ok_or_else(|| WireError::validation(name, "index out of range"))?;
                *slot = value;
                container.set(name, Value::Repeated(items))
            }
            Segment::Key(name, key) => {
                let mut entries = match container.get(name) {
                    Some(Value::Map(entries)) => entries.clone(),
                    None => std::collections::BTreeMap::new(),
                    _ => {
                        return Err(WireError::validation(name, "field is not a map"));
                    }
                };
                entries.insert(key.clone(), value);
                container.set(name, Value::Map(entries))
            }
        }
    }

    pub fn clear(&self, root: &mut DynamicMessage) -> Result<(), WireError> {
        let Some(container) = self.navigate_mut(root) else {
            return Ok(());
        };
        let last = self.segments.last().expect("parse rejects empty paths");
        match last {
            Segment::Field(name) => {
                container.clear(name);
                Ok(())
            }
            Segment::Index(name, index) => {
                let Some(Value::Repeated(items)) = container.get(name) else {
                    return Ok(());
                };
                let mut items = items.clone();
                if *index < items.len() {
                    items.remove(*index);
                }
                container.set(name, Value::Repeated(items))
            }
            Segment::Key(name, key) => {
                let Some(Value::Map(entries)) = container.get(name) else {
                    return Ok(());
                };
                let mut entries = entries.clone();
                entries.remove(key);
                container.set(name, Value::Map(entries))
            }
        }
    }

    /// Resolves every segment but the last, requiring each intermediate
    /// value to be a `Message`. Returns `None` if any hop fails.
    fn navigate<'a>(&self, root: &'a DynamicMessage) -> Option<(&'a DynamicMessage, &Segment)> {
        let mut current = root;
        for segment in &self.segments[..self.segments.len() - 1] {
            let next = match segment {
                Segment::Field(name) => current.get(name),
                Segment::Index(name, index) => match current.get(name) {
                    Some(Value::Repeated(items)) => items.get(*index),
                    _ => None,
                },
                Segment::Key(name, key) => match current.get(name) {
                    Some(Value::Map(entries)) => entries.get(key),
                    _ => None,
                },
            }?;
            match next {
                Value::Message(m) => current = m,
                _ => return None,
            }
        }
        Some((current, self.segments.last().unwrap()))
    }

    fn navigate_mut<'a>(&self, root: &'a mut DynamicMessage) -> Option<&'a mut DynamicMessage> {
        let mut current = root;
        for segment in &self.segments[..self.segments.len() - 1] {
            let next = match segment {
                Segment::Field(name) => current.get(name),
                Segment::Index(name, index) => match current.get(name) {
                    Some(Value::Repeated(items)) => items.get(*index),
                    _ => None,
                },
                Segment::Key(name, key) => match current.get(name) {
                    Some(Value::Map(entries)) => entries.get(key),
                    _ => None,
                },
            };
            match next {
                Some(Value::Message(_)) => {}
                _ => return None,
            }
            let name = match segment {
                Segment::Field(name) | Segment::Index(name, _) | Segment::Key(name, _) => name,
            };
            let Some(Value::Message(m)) = current.get_mut_field(name) else {
                return None;
            };
            current = m;
        }
        Some(current)
    }

    /// Like `navigate_mut`, but auto-creates missing intermediate singular
    /// message fields (never repeated/map elements), matching `set`'s rule.
    fn navigate_mut_auto_create<'a>(
        &self,
        root: &'a mut DynamicMessage,
    ) -> Result<&'a mut DynamicMessage, WireError> {
        let mut current = root;
        for segment in &self.segments[..self.segments.len() - 1] {
            match segment {
                Segment::Field(name) => {
                    if current.get(name).is_none() {
                        let field = current
                            .descriptor()
                            .field_by_name(name)
                            .ok_or_else(|| WireError::validation(name, "unknown field"))?;
                        let target = field.message_type().ok_or_else(|| {
                            WireError::validation(name, "cannot auto-create non-message field")
                        })?;
                        current.set(
                            name,
                            Value::Message(DynamicMessage::new(target.clone())),
                        )?;
                    }
                    let Some(Value::Message(m)) = current.get_mut_field(name) else {
                        return Err(WireError::type_mismatch(name, "message", "non-message"));
                    };
                    current = m;
                }
                Segment::Index(name, index) => {
                    let Some(Value::Repeated(items)) = current.get(name) else {
                        return Err(WireError::validation(name, "repeated element not auto-created"));
                    };
                    if *index >= items.len() {
                        return Err(WireError::validation(name, "index out of range"));
                    }
                    let Some(Value::Repeated(items_mut)) = current.get_mut_field(name) else {
                        return Err(WireError::validation(name, "repeated element not auto-created"));
                    };
                    let Some(Value::Message(m)) = items_mut.get_mut(*index) else {
                        return Err(WireError::type_mismatch(name, "message", "non-message element"));
                    };
                    current = m;
                }
                Segment::Key(name, key) => {
                    let Some(Value::Map(entries)) = current.get(name) else {
                        return Err(WireError::validation(name, "map entry not auto-created"));
                    };
                    if !entries.contains_key(key) {
                        return Err(WireError::validation(name, "map entry not auto-created"));
                    }
                    let Some(Value::Map(entries_mut)) = current.get_mut_field(name) else {
                        return Err(WireError::validation(name, "map entry not auto-created"));
                    };
                    let Some(Value::Message(m)) = entries_mut.get_mut(key) else {
                        return Err(WireError::type_mismatch(name, "message", "non-message entry"));
                    };
                    current = m;
                }
            }
        }
        Ok(current)
    }
}

fn split_on_unquoted_dots(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;
    let mut quote: Option<char> = None;
    for ch in path.chars() {
        match ch {
            '\'' | '"' if in_brackets => {
                if quote == Some(ch) {
                    quote = None;
                } else if quote.is_none() {
                    quote = Some(ch);
                }
                current.push(ch);
            }
            '[' => {
                in_brackets = true;
                current.push(ch);
            }
            ']' if quote.is_none() => {
                in_brackets = false;
                current.push(ch);
            }
            '.' if !in_brackets && quote.is_none() => {
                segments.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    segments.push(current);
    segments
}

fn parse_segment(raw: &str) -> Result<Segment, WireError> {
    let Some(bracket_start) = raw.find('[') else {
        if raw.is_empty() {
            return Err(WireError::validation(raw, "empty path segment"));
        }
        return Ok(Segment::Field(raw.to_string()));
    };
    if !raw.ends_with(']') {
        return Err(WireError::validation(raw, "unterminated bracket segment"));
    }
    let name = &raw[..bracket_start];
    if name.is_empty() {
        return Err(WireError::validation(raw, "empty field name before bracket"));
    }
    let inner = &raw[bracket_start + 1..raw.len() - 1];
    if let Some(quoted) = unquote(inner) {
        Ok(Segment::Key(name.to_string(), quoted))
    } else if inner.chars().all(|c| c.is_ascii_digit()) && !inner.is_empty() {
        let index: usize = inner
            .parse()
            .map_err(|_| WireError::validation(raw, "index out of range"))?;
        Ok(Segment::Index(name.to_string(), index))
    } else {
        Err(WireError::validation(raw, "malformed bracket segment"))
    }
}

fn unquote(inner: &str) -> Option<String> {
    let bytes = inner.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'\'' || first == b'"') && first == last {
            return Some(inner[1..inner.len() - 1].to_string());
        }
    }
    None
}
