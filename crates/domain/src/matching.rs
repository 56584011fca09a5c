use crate::errors::DomainError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// パターンの1フィールド分の制約
///
/// JSON 上の表現:
/// - 配列 → `OneOf`（メンバーシップ判定、順序は無関係）
/// - オブジェクト → `Nested`（再帰的にパターン照合）
/// - それ以外のスカラー → `Equals`（値の等価判定）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Constraint {
    OneOf(Vec<Value>),
    Nested(Pattern),
    Equals(Value),
}

impl Constraint {
    /// 対象の値がこの制約を満たすか判定
    pub fn satisfied_by(&self, actual: &Value) -> bool {
        match self {
            // 空の配列は何にもマッチしない
            Constraint::OneOf(options) => options.iter().any(|option| values_equal(option, actual)),
            Constraint::Nested(pattern) => pattern.matches(actual),
            Constraint::Equals(expected) => values_equal(expected, actual),
        }
    }
}

/// 出荷レコードに対する構造パターン
///
/// パターンに含まれるフィールドだけを検査する部分一致述語。
/// 対象側の余分なフィールドは無視される。
///
/// 前提条件: パターンは非循環であること（JSON から構築する限り常に成立）。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pattern(BTreeMap<String, Constraint>);

impl Pattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON 値からパターンを作成（トップレベルはオブジェクト必須）
    pub fn from_value(value: Value) -> Result<Self, DomainError> {
        if !value.is_object() {
            return Err(DomainError::Validation(format!(
                "Pattern must be a JSON object, got: {value}"
            )));
        }
        serde_json::from_value(value).map_err(|e| DomainError::Validation(e.to_string()))
    }

    /// 制約を追加（ビルダー形式）
    pub fn with(mut self, field: impl Into<String>, constraint: Constraint) -> Self {
        self.0.insert(field.into(), constraint);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 対象がパターンを満たすか判定
    ///
    /// 全フィールドの論理積。空のパターンは常に true。
    /// 対象に存在しないフィールドは `null` として扱うため、
    /// パターンが明示的に `null` を期待しない限り不一致となる。
    /// 対象がオブジェクトでない場合（`null` やスカラー）も同様。
    pub fn matches(&self, subject: &Value) -> bool {
        self.0.iter().all(|(field, constraint)| {
            let actual = subject.get(field.as_str()).unwrap_or(&Value::Null);
            constraint.satisfied_by(actual)
        })
    }
}

/// `matches(subject, pattern)` の関数形式
pub fn pattern_matches(subject: &Value, pattern: &Pattern) -> bool {
    pattern.matches(subject)
}

/// 値の等価判定。数値は数値として比較する（`1` と `1.0` は等しい）
fn values_equal(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(a), Value::Number(b)) => a == b || a.as_f64() == b.as_f64(),
        _ => expected == actual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pattern(value: Value) -> Pattern {
        Pattern::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_pattern_matches_anything() {
        let empty = Pattern::new();
        assert!(empty.matches(&json!({"a": 1})));
        assert!(empty.matches(&json!({})));
        assert!(empty.matches(&Value::Null));
        assert!(empty.matches(&json!("scalar")));
    }

    #[test]
    fn test_scalar_equality() {
        assert!(pattern_matches(&json!({"a": 1}), &pattern(json!({"a": 1}))));
        assert!(!pattern_matches(&json!({"a": 1}), &pattern(json!({"a": 2}))));
        assert!(pattern_matches(
            &json!({"carrier": "DF"}),
            &pattern(json!({"carrier": "DF"}))
        ));
        assert!(!pattern_matches(
            &json!({"flag": true}),
            &pattern(json!({"flag": false}))
        ));
    }

    #[test]
    fn test_numbers_compare_by_value() {
        assert!(pattern_matches(&json!({"w": 1.0}), &pattern(json!({"w": 1}))));
        assert!(pattern_matches(&json!({"w": 2}), &pattern(json!({"w": [1.0, 2.0]}))));
    }

    #[test]
    fn test_membership() {
        let p = pattern(json!({"a": ["X", "Y"]}));
        assert!(p.matches(&json!({"a": "X"})));
        assert!(p.matches(&json!({"a": "Y"})));
        assert!(!p.matches(&json!({"a": "Z"})));
        assert!(!pattern(json!({"a": []})).matches(&json!({"a": "X"})));
    }

    #[test]
    fn test_nested_pattern() {
        let p = pattern(json!({"addr": {"country": "DK"}}));
        assert!(p.matches(&json!({"addr": {"country": "DK"}})));
        assert!(!p.matches(&json!({"addr": {"country": "SE"}})));
    }

    #[test]
    fn test_nested_membership() {
        let p = pattern(json!({"deliveryAddress": {"countryCode": ["DK", "SE", "NO"]}}));
        assert!(p.matches(&json!({"deliveryAddress": {"countryCode": "NO", "postalCode": "0150"}})));
        assert!(!p.matches(&json!({"deliveryAddress": {"countryCode": "DE"}})));
    }

    #[test]
    fn test_extra_subject_fields_are_ignored() {
        assert!(pattern(json!({"a": 1})).matches(&json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_missing_field_does_not_match() {
        assert!(!pattern(json!({"a": 1})).matches(&json!({})));
        assert!(!pattern(json!({"a": {"x": 1}})).matches(&json!({})));
        assert!(!pattern(json!({"a": ["X"]})).matches(&json!({})));
    }

    #[test]
    fn test_missing_field_matches_explicit_null() {
        assert!(pattern(json!({"sellerId": null})).matches(&json!({"shipmentNumber": "S1"})));
        assert!(pattern(json!({"sellerId": null})).matches(&json!({"sellerId": null})));
        assert!(!pattern(json!({"sellerId": null})).matches(&json!({"sellerId": 7})));
    }

    #[test]
    fn test_empty_nested_pattern_matches_absent_field() {
        assert!(pattern(json!({"a": {}})).matches(&json!({})));
    }

    #[test]
    fn test_shape_mismatch_is_no_match() {
        // 対象がオブジェクト、パターンがスカラー
        assert!(!pattern(json!({"addr": "DK"})).matches(&json!({"addr": {"country": "DK"}})));
        // 対象がスカラー、パターンがオブジェクト
        assert!(!pattern(json!({"addr": {"country": "DK"}})).matches(&json!({"addr": "DK"})));
        // 対象が配列
        assert!(!pattern(json!({"tags": "a"})).matches(&json!({"tags": ["a"]})));
    }

    #[test]
    fn test_all_fields_must_match() {
        let p = pattern(json!({"a": 1, "b": {"c": ["x", "y"]}}));
        assert!(p.matches(&json!({"a": 1, "b": {"c": "y"}})));
        assert!(!p.matches(&json!({"a": 1, "b": {"c": "z"}})));
        assert!(!p.matches(&json!({"a": 2, "b": {"c": "y"}})));
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        assert!(Pattern::from_value(json!([1, 2])).is_err());
        assert!(Pattern::from_value(json!("DK")).is_err());
    }

    #[test]
    fn test_deserialized_constraint_kinds() {
        let p = pattern(json!({"a": 1, "b": ["x"], "c": {"d": null}}));
        let expected = Pattern::new()
            .with("a", Constraint::Equals(json!(1)))
            .with("b", Constraint::OneOf(vec![json!("x")]))
            .with("c", Constraint::Nested(Pattern::new().with("d", Constraint::Equals(Value::Null))));
        assert_eq!(p, expected);
    }

    #[test]
    fn test_matching_is_repeatable_and_pure() {
        let subject = json!({"a": {"b": "X"}, "c": 3});
        let p = pattern(json!({"a": {"b": ["X", "Y"]}}));
        let subject_before = subject.clone();
        let pattern_before = p.clone();

        let first = p.matches(&subject);
        let second = p.matches(&subject);

        assert!(first);
        assert_eq!(first, second);
        assert_eq!(subject, subject_before);
        assert_eq!(p, pattern_before);
    }
}
