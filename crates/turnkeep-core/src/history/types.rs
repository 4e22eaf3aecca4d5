//! Message history data types.
//!
//! # Data Model Overview
//!
//! A stored turn carries its flat text plus an optional rich payload:
//!
//! ```text
//! StoredRecord { id, role, content, aiPayload }
//!                                   │
//!                                   ├── null                          # flat text only
//!                                   ├── { sdkVersion, messages: [..] } # current envelope
//!                                   └── [ Message, .. ]                # legacy array
//! ```
//!
//! Each `Message` holds either a plain string or an ordered list of typed
//! `Part`s. Parts may carry provider-namespaced options:
//!
//! ```text
//! { "type": "reasoning", "text": "..",
//!   "providerOptions": { "openai": { "itemId": "rs_..", "reasoningEncryptedContent": ".." } } }
//! ```
//!
//! # Design Principles
//!
//! - **Pass-through**: keys this layer does not inspect are kept and re-emitted
//! - **Open vocabulary**: unknown part types and provider namespaces survive
//! - **Backward compatibility**: legacy field names are accepted on read

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Envelope version tag written by the current SDK.
pub const AI_MESSAGES_SDK_VERSION: &str = "ai@v5";

/// Provider-options key holding a stateful per-turn item reference.
pub const ITEM_ID_KEY: &str = "itemId";

/// Provider-options key holding an encrypted reasoning continuation token.
pub const REASONING_ENCRYPTED_CONTENT_KEY: &str = "reasoningEncryptedContent";

// ============================================================================
// Role
// ============================================================================

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    /// Carries tool-result parts back to the model.
    Tool,
}

impl Role {
    /// Parse a wire role string. Returns `None` for anything unrecognized.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            "system" => Some(Role::System),
            "tool" => Some(Role::Tool),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Tool => "tool",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Provider Options
// ============================================================================

/// Provider-namespaced metadata attached to a part.
///
/// Maps a namespace (`openai`, `azure`, an app-internal name, ...) to an
/// opaque value bag. Only `itemId` and `reasoningEncryptedContent` have
/// typed accessors; everything else is carried through as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderOptions(Map<String, Value>);

impl ProviderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bag for a namespace, if present and an object.
    pub fn namespace(&self, namespace: &str) -> Option<&Map<String, Value>> {
        self.0.get(namespace).and_then(Value::as_object)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// The `itemId` issued by a stateful provider session.
    pub fn item_id(&self, namespace: &str) -> Option<&str> {
        self.string_field(namespace, ITEM_ID_KEY)
    }

    /// The encrypted reasoning continuation token.
    pub fn reasoning_encrypted_content(&self, namespace: &str) -> Option<&str> {
        self.string_field(namespace, REASONING_ENCRYPTED_CONTENT_KEY)
    }

    /// Set `key` inside `namespace`, creating the bag if needed.
    ///
    /// A non-object value already stored under `namespace` is replaced.
    pub fn insert(&mut self, namespace: &str, key: &str, value: impl Into<Value>) {
        let bag = self
            .0
            .entry(namespace.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !bag.is_object() {
            *bag = Value::Object(Map::new());
        }
        if let Value::Object(map) = bag {
            map.insert(key.to_string(), value.into());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Remove `itemId` from every namespace bag.
    ///
    /// A bag emptied by the removal is dropped. Bags that were already empty,
    /// or that are not objects, are left alone. Returns how many ids were removed.
    pub fn remove_item_ids(&mut self) -> usize {
        let mut removed = 0;
        let mut emptied = Vec::new();

        for (namespace, value) in self.0.iter_mut() {
            if let Value::Object(bag) = value {
                if bag.remove(ITEM_ID_KEY).is_some() {
                    removed += 1;
                    if bag.is_empty() {
                        emptied.push(namespace.clone());
                    }
                }
            }
        }

        for namespace in emptied {
            self.0.remove(&namespace);
        }

        removed
    }

    fn string_field(&self, namespace: &str, key: &str) -> Option<&str> {
        self.namespace(namespace)
            .and_then(|bag| bag.get(key))
            .and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for ProviderOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// ============================================================================
// Parts
// ============================================================================

/// The `type` discriminator of a content part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PartKind {
    Text,
    ToolCall,
    ToolResult,
    Reasoning,
    /// Any part type this layer does not know about; kept verbatim.
    Other(String),
}

impl PartKind {
    pub fn as_str(&self) -> &str {
        match self {
            PartKind::Text => "text",
            PartKind::ToolCall => "tool-call",
            PartKind::ToolResult => "tool-result",
            PartKind::Reasoning => "reasoning",
            PartKind::Other(kind) => kind,
        }
    }
}

impl From<String> for PartKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "text" => PartKind::Text,
            "tool-call" => PartKind::ToolCall,
            "tool-result" => PartKind::ToolResult,
            "reasoning" => PartKind::Reasoning,
            _ => PartKind::Other(value),
        }
    }
}

impl From<&str> for PartKind {
    fn from(value: &str) -> Self {
        PartKind::from(value.to_string())
    }
}

impl Serialize for PartKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PartKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(PartKind::from)
    }
}

/// One typed fragment of a message's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(rename = "type")]
    pub kind: PartKind,

    /// Provider-namespaced options.
    #[serde(
        rename = "providerOptions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub provider_options: Option<ProviderOptions>,

    /// Legacy field: providerMetadata (same shape as providerOptions).
    #[serde(
        rename = "providerMetadata",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub provider_metadata: Option<ProviderOptions>,

    /// Every other key (`text`, `toolCallId`, `input`, `output`, ...).
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Part {
    pub fn new(kind: impl Into<PartKind>) -> Self {
        Self {
            kind: kind.into(),
            provider_options: None,
            provider_metadata: None,
            fields: Map::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(PartKind::Text).with_field("text", text.into())
    }

    pub fn reasoning(text: impl Into<String>) -> Self {
        Self::new(PartKind::Reasoning).with_field("text", text.into())
    }

    pub fn tool_call(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        input: Value,
    ) -> Self {
        Self::new(PartKind::ToolCall)
            .with_field("toolCallId", tool_call_id.into())
            .with_field("toolName", tool_name.into())
            .with_field("input", input)
    }

    pub fn tool_result(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        output: Value,
    ) -> Self {
        Self::new(PartKind::ToolResult)
            .with_field("toolCallId", tool_call_id.into())
            .with_field("toolName", tool_name.into())
            .with_field("output", output)
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn with_provider_option(
        mut self,
        namespace: &str,
        key: &str,
        value: impl Into<Value>,
    ) -> Self {
        self.provider_options
            .get_or_insert_with(ProviderOptions::new)
            .insert(namespace, key, value);
        self
    }

    pub fn is_reasoning(&self) -> bool {
        self.kind == PartKind::Reasoning
    }

    /// The `text` field, for part types that carry one.
    pub fn text_value(&self) -> Option<&str> {
        self.fields.get("text").and_then(Value::as_str)
    }

    /// `itemId` for a namespace, checking providerOptions before the legacy field.
    pub fn item_id(&self, namespace: &str) -> Option<&str> {
        self.option_bags().find_map(|options| options.item_id(namespace))
    }

    pub fn reasoning_encrypted_content(&self, namespace: &str) -> Option<&str> {
        self.option_bags()
            .find_map(|options| options.reasoning_encrypted_content(namespace))
    }

    fn option_bags(&self) -> impl Iterator<Item = &ProviderOptions> {
        self.provider_options
            .iter()
            .chain(self.provider_metadata.iter())
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Message content: a plain string or an ordered part sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Parts(Vec<Part>),
}

impl Content {
    pub fn parts(&self) -> Option<&[Part]> {
        match self {
            Content::Parts(parts) => Some(parts.as_slice()),
            Content::Text(_) => None,
        }
    }
}

/// A single message in the provider wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Content,

    /// Any additional top-level keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Content::Text(content.into()),
            extra: Map::new(),
        }
    }

    pub fn parts(role: Role, parts: Vec<Part>) -> Self {
        Self {
            role,
            content: Content::Parts(parts),
            extra: Map::new(),
        }
    }

    /// Flat text for the record's `content` column.
    ///
    /// String content is returned as-is; for parts, the `text` of every
    /// `text` part is joined with newlines.
    pub fn flat_text(&self) -> String {
        match &self.content {
            Content::Text(text) => text.clone(),
            Content::Parts(parts) => parts
                .iter()
                .filter(|part| part.kind == PartKind::Text)
                .filter_map(Part::text_value)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

// ============================================================================
// Envelope and Stored Record
// ============================================================================

/// The versioned rich payload stored alongside a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub sdk_version: String,
    pub messages: Vec<Message>,
}

impl Envelope {
    pub fn new(sdk_version: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            sdk_version: sdk_version.into(),
            messages,
        }
    }
}

/// A persisted turn, as handed over by the storage layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub id: i64,

    pub role: Role,

    /// Flat text fallback.
    #[serde(default)]
    pub content: String,

    /// Raw rich payload. Legacy column name: aiMessagesJson.
    #[serde(default, alias = "aiMessagesJson")]
    pub ai_payload: Option<Value>,
}

impl StoredRecord {
    /// The single message synthesized when no payload can be trusted.
    pub fn fallback_message(&self) -> Message {
        Message::text(self.role, self.content.clone())
    }
}

// ============================================================================
// TESTS
// ============================================================================
