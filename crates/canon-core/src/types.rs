use crate::error::{DedupError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Type alias for embedding vectors
pub type Embedding = Vec<f32>;

/// A named thing extracted from a document.
///
/// Entities carry no identifier of their own. Two records are the same
/// real-world entity only if a similarity strategy says so.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    /// Surface name as extracted. May be empty or oddly cased; never repaired.
    pub name: String,

    /// Type or category, e.g. "City", "Person".
    pub label: String,

    /// Optional free-text description from the extractor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Arbitrary key-value metadata. Carried through untouched.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl Entity {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Entity {
            name: name.into(),
            label: label.into(),
            description: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// A directed, typed edge between two entities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fact {
    /// Shared reference to the subject entity.
    pub subject: Arc<Entity>,

    /// Relationship name, e.g. "capitalOf".
    pub predicate: String,

    /// Shared reference to the object entity.
    pub object: Arc<Entity>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl Fact {
    pub fn new(
        subject: impl Into<Arc<Entity>>,
        predicate: impl Into<String>,
        object: impl Into<Arc<Entity>>,
    ) -> Self {
        Fact {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            metadata: HashMap::new(),
        }
    }

    /// Same predicate and metadata, new endpoints.
    pub fn with_endpoints(&self, subject: Arc<Entity>, object: Arc<Entity>) -> Self {
        Fact {
            subject,
            predicate: self.predicate.clone(),
            object,
            metadata: self.metadata.clone(),
        }
    }
}

/// Ordered entities. Order is discovery order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EntityList {
    pub entities: Vec<Arc<Entity>>,
}

impl EntityList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entity: impl Into<Arc<Entity>>) {
        self.entities.push(entity.into());
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Entity>> {
        self.entities.iter()
    }
}

impl From<Vec<Entity>> for EntityList {
    fn from(entities: Vec<Entity>) -> Self {
        EntityList {
            entities: entities.into_iter().map(Arc::new).collect(),
        }
    }
}

impl From<Vec<Arc<Entity>>> for EntityList {
    fn from(entities: Vec<Arc<Entity>>) -> Self {
        EntityList { entities }
    }
}

impl FromIterator<Entity> for EntityList {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        EntityList {
            entities: iter.into_iter().map(Arc::new).collect(),
        }
    }
}

/// Ordered facts. Deduplication never reorders or drops them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FactList {
    pub facts: Vec<Fact>,
}

impl FactList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fact: Fact) {
        self.facts.push(fact);
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Fact> {
        self.facts.iter()
    }

    /// Every endpoint in reference order: subject then object, fact by fact.
    pub fn endpoints(&self) -> impl Iterator<Item = &Arc<Entity>> + '_ {
        self.facts
            .iter()
            .flat_map(|fact| [&fact.subject, &fact.object])
    }
}

impl From<Vec<Fact>> for FactList {
    fn from(facts: Vec<Fact>) -> Self {
        FactList { facts }
    }
}

impl FromIterator<Fact> for FactList {
    fn from_iter<I: IntoIterator<Item = Fact>>(iter: I) -> Self {
        FactList {
            facts: iter.into_iter().collect(),
        }
    }
}

/// What a deduplication call accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum DedupInput {
    Entities(EntityList),
    Facts(FactList),
}

impl DedupInput {
    /// Interpret a JSON document as an entity or fact batch.
    ///
    /// Accepts `{"entities": [...]}` or `{"facts": [...]}`. Anything else,
    /// including a bare array, is rejected.
    pub fn from_json(value: Value) -> Result<Self> {
        let mut object = match value {
            Value::Object(object) => object,
            other => {
                return Err(DedupError::UnsupportedInput(format!(
                    "expected an object with an `entities` or `facts` array, got {}",
                    json_kind(&other)
                )))
            }
        };

        match (object.remove("entities"), object.remove("facts")) {
            (Some(entities), None) => Ok(DedupInput::Entities(EntityList {
                entities: serde_json::from_value(entities)?,
            })),
            (None, Some(facts)) => Ok(DedupInput::Facts(FactList {
                facts: serde_json::from_value(facts)?,
            })),
            (Some(_), Some(_)) => Err(DedupInput::ambiguous()),
            (None, None) => Err(DedupError::UnsupportedInput(
                "object has neither an `entities` nor a `facts` field".to_string(),
            )),
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Self::from_json(serde_json::from_str(s)?)
    }

    pub fn len(&self) -> usize {
        match self {
            DedupInput::Entities(list) => list.len(),
            DedupInput::Facts(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ambiguous() -> DedupError {
        DedupError::UnsupportedInput(
            "object has both `entities` and `facts`; send one batch at a time".to_string(),
        )
    }
}

impl From<EntityList> for DedupInput {
    fn from(list: EntityList) -> Self {
        DedupInput::Entities(list)
    }
}

impl From<FactList> for DedupInput {
    fn from(list: FactList) -> Self {
        DedupInput::Facts(list)
    }
}

/// Result of a deduplication call. Always the same variant as the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DedupOutput {
    Entities(EntityList),
    Facts(FactList),
}

impl DedupOutput {
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn into_entities(self) -> Option<EntityList> {
        match self {
            DedupOutput::Entities(list) => Some(list),
            DedupOutput::Facts(_) => None,
        }
    }

    pub fn into_facts(self) -> Option<FactList> {
        match self {
            DedupOutput::Facts(list) => Some(list),
            DedupOutput::Entities(_) => None,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a JSON array",
        Value::Object(_) => "an object",
    }
}
