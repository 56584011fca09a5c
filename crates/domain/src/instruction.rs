use crate::errors::DomainError;
use crate::matching::Pattern;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// 運送会社固有の出荷属性（呼び出し側にそのまま返される）
pub type Attributes = Map<String, Value>;

/// 出荷指示: パターンと、マッチした場合に適用する属性の組
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    #[serde(default)]
    pub pattern: RulePattern,
    #[serde(default)]
    pub attributes: Attributes,
}

impl Instruction {
    pub fn is_malformed(&self) -> bool {
        matches!(self.pattern, RulePattern::Malformed(_))
    }
}

/// 指示のパターン部分
///
/// `null` は空のパターン（すべてにマッチ）として読む。
/// オブジェクト以外の値は指示リスト全体を壊さず、その指示だけがマッチしなくなる。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RulePattern {
    Fields(Pattern),
    Malformed(Value),
}

impl RulePattern {
    pub fn matches(&self, subject: &Value) -> bool {
        match self {
            RulePattern::Fields(pattern) => pattern.matches(subject),
            RulePattern::Malformed(_) => false,
        }
    }
}

impl Default for RulePattern {
    fn default() -> Self {
        RulePattern::Fields(Pattern::default())
    }
}

impl From<Pattern> for RulePattern {
    fn from(pattern: Pattern) -> Self {
        RulePattern::Fields(pattern)
    }
}

impl<'de> Deserialize<'de> for RulePattern {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Null => RulePattern::default(),
            Value::Object(_) => match Pattern::deserialize(&value) {
                Ok(pattern) => RulePattern::Fields(pattern),
                Err(_) => RulePattern::Malformed(value),
            },
            other => RulePattern::Malformed(other),
        })
    }
}

/// 指示リストを先頭から走査し、最初にマッチした指示の属性を返す
///
/// 優先度や競合検出はなく、リストの順序がそのまま優先順位になる。
/// どれにもマッチしない場合は `DomainError::InstructionNotFound`。
pub fn find_instruction<'a>(
    instructions: &'a [Instruction],
    subject: &Value,
) -> Result<&'a Attributes, DomainError> {
    instructions
        .iter()
        .find(|instruction| instruction.pattern.matches(subject))
        .map(|instruction| &instruction.attributes)
        .ok_or(DomainError::InstructionNotFound(instructions.len()))
}
