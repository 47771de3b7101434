use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of a shareable building block.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Agent,
    Rule,
    Hook,
}

impl ResourceType {
    pub const ALL: [ResourceType; 3] = [Self::Agent, Self::Rule, Self::Hook];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Rule => "rule",
            Self::Hook => "hook",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "agent" => Some(Self::Agent),
            "rule" => Some(Self::Rule),
            "hook" => Some(Self::Hook),
            _ => None,
        }
    }
}

/// A typed pointer into the resource arena.
///
/// Assignments and dependency edges hold only references, never copies, so an
/// edit to a resource is seen by every project that uses it. References order
/// by id first, which is the canonical order for resolution output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub id: i64,
}

impl ResourceRef {
    pub fn new(resource_type: ResourceType, id: i64) -> Self {
        Self { resource_type, id }
    }

    pub fn agent(id: i64) -> Self {
        Self::new(ResourceType::Agent, id)
    }

    pub fn rule(id: i64) -> Self {
        Self::new(ResourceType::Rule, id)
    }

    pub fn hook(id: i64) -> Self {
        Self::new(ResourceType::Hook, id)
    }

    /// Parse the `type:id` form used on the command line, e.g. `rule:12`.
    pub fn parse(s: &str) -> Option<Self> {
        let (kind, id) = s.split_once(':')?;
        let resource_type = ResourceType::from_str(kind.trim())?;
        let id = id.trim().parse().ok()?;
        Some(Self::new(resource_type, id))
    }
}

impl Ord for ResourceRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id
            .cmp(&other.id)
            .then(self.resource_type.cmp(&other.resource_type))
    }
}

impl PartialOrd for ResourceRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource_type.as_str(), self.id)
    }
}

/// An unordered pair of resources, used for conflict overrides.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourcePair {
    pub first: ResourceRef,
    pub second: ResourceRef,
}

impl ResourcePair {
    /// Build a pair in canonical order so `(a, b)` and `(b, a)` compare equal.
    pub fn new(a: ResourceRef, b: ResourceRef) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }
}

/// A reusable agent, rule or hook definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub content: ResourceContent,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    pub fn resource_type(&self) -> ResourceType {
        self.content.resource_type()
    }

    pub fn reference(&self) -> ResourceRef {
        ResourceRef::new(self.resource_type(), self.id)
    }
}

/// Type-specific payload of a resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResourceContent {
    Agent(AgentSpec),
    Rule(RuleSpec),
    Hook(HookSpec),
}

impl ResourceContent {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Self::Agent(_) => ResourceType::Agent,
            Self::Rule(_) => ResourceType::Rule,
            Self::Hook(_) => ResourceType::Hook,
        }
    }

    /// Check the fields every resource of this type must carry.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Agent(agent) => {
                if agent.role.trim().is_empty() {
                    return Err("agent role must not be empty".to_string());
                }
            }
            Self::Rule(rule) => {
                if rule.text.trim().is_empty() {
                    return Err("rule text must not be empty".to_string());
                }
                if rule.category.trim().is_empty() {
                    return Err("rule category must not be empty".to_string());
                }
            }
            Self::Hook(hook) => {
                if hook.action.trim().is_empty() {
                    return Err("hook action must not be empty".to_string());
                }
                if hook.timeout_secs == Some(0) {
                    return Err("hook timeout must be positive".to_string());
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentSpec {
    /// What the agent is for, e.g. "code reviewer".
    pub role: String,
    /// Communication style, e.g. "terse".
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    /// System prompt body rendered into the agent file.
    #[serde(default)]
    pub instructions: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RuleSpec {
    pub text: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HookSpec {
    pub trigger: HookTrigger,
    /// Tool name pattern the trigger is limited to, if any.
    #[serde(default)]
    pub matcher: Option<String>,
    /// The command the host runs. Never executed here.
    pub action: String,
    #[serde(default)]
    pub timeout_secs: Option<u32>,
}

/// The lifecycle event a hook is declared for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HookTrigger {
    PreToolUse,
    PostToolUse,
    UserPromptSubmit,
    SessionStart,
    Stop,
}

impl HookTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreToolUse => "pre_tool_use",
            Self::PostToolUse => "post_tool_use",
            Self::UserPromptSubmit => "user_prompt_submit",
            Self::SessionStart => "session_start",
            Self::Stop => "stop",
        }
    }
}

/// Input for creating a new resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResourceInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub content: ResourceContent,
}

impl CreateResourceInput {
    /// Rules shared by manual creation and provider suggestions.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("resource name must not be empty".to_string());
        }
        self.content.validate()
    }
}

/// Input for updating a resource. The content variant cannot change type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateResourceInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub content: Option<ResourceContent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refs_order_by_id_before_type() {
        let mut refs = vec![ResourceRef::rule(3), ResourceRef::agent(7), ResourceRef::hook(1)];
        refs.sort();
        assert_eq!(
            refs,
            vec![ResourceRef::hook(1), ResourceRef::rule(3), ResourceRef::agent(7)]
        );
    }

    #[test]
    fn test_parse_reference() {
        assert_eq!(ResourceRef::parse("rule:12"), Some(ResourceRef::rule(12)));
        assert_eq!(ResourceRef::parse("widget:1"), None);
        assert_eq!(ResourceRef::parse("agent"), None);
    }

    #[test]
    fn test_pair_is_unordered() {
        let a = ResourceRef::rule(1);
        let b = ResourceRef::rule(2);
        assert_eq!(ResourcePair::new(a, b), ResourcePair::new(b, a));
    }

    #[test]
    fn test_validate_rejects_blank_rule_text() {
        let content = ResourceContent::Rule(RuleSpec {
            text: "  ".to_string(),
            category: "style".to_string(),
        });
        assert!(content.validate().is_err());
    }

    #[test]
    fn test_content_serializes_with_type_tag() {
        let content = ResourceContent::Agent(AgentSpec {
            role: "reviewer".to_string(),
            ..Default::default()
        });
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["type"], "agent");
        assert_eq!(json["role"], "reviewer");
    }
}
