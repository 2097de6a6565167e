//! # レンダリングコンテキスト
//!
//! テンプレートに渡すコンテキストを JSON にシリアライズ可能な形へ正規化する。
//!
//! ## 設計方針
//!
//! - **明示的なビジタ**: 値の種類を [`ContextValue`] で表現し、エンティティ参照だけを
//!   フラットなマッピングに変換する。プリミティブはそのまま残す
//! - **フラット化の形式**: エンティティは `{"pk": .., "model": .., ...fields}` になる。
//!   テンプレートから `{{ author.name }}` のように参照するには十分な形
//!
//! ## 使用例
//!
//! ```rust
//! use notiflow_domain::context::{ContextValue, Entity, normalize_context};
//! use serde_json::{Map, Value, json};
//!
//! struct Author {
//!     id:   i64,
//!     name: String,
//! }
//!
//! impl Entity for Author {
//!     fn model_label(&self) -> String {
//!         "sample.author".to_string()
//!     }
//!
//!     fn primary_key(&self) -> Value {
//!         json!(self.id)
//!     }
//!
//!     fn fields(&self) -> Map<String, Value> {
//!         let mut fields = Map::new();
//!         fields.insert("name".to_string(), json!(self.name));
//!         fields
//!     }
//! }
//!
//! let author = Author { id: 7, name: "Ann".to_string() };
//! let context = normalize_context([
//!     ("greeting", ContextValue::from("Hello")),
//!     ("author", ContextValue::entity(&author)),
//! ]);
//!
//! assert_eq!(
//!     serde_json::Value::Object(context),
//!     json!({
//!         "greeting": "Hello",
//!         "author": {"pk": 7, "model": "sample.author", "name": "Ann"},
//!     })
//! );
//! ```

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// テンプレートに渡すコンテキスト（正規化済み）
pub type TemplateContext = Map<String, Value>;

/// コンテキストに埋め込めるエンティティ
///
/// 任意のエンティティを「識別子 + 主キー + 型タグ」を持つフラットなマッピングに
/// 変換できることだけを要求する。
pub trait Entity {
    /// 型タグ（例: `"auth.user"`）
    fn model_label(&self) -> String;

    /// 主キー
    fn primary_key(&self) -> Value;

    /// 主キー以外のフィールド
    fn fields(&self) -> Map<String, Value>;
}

/// エンティティのスナップショット
///
/// 正規化の時点でエンティティから取り出した値。元のエンティティへの参照は持たない。
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySnapshot {
    pub model:  String,
    pub pk:     Value,
    pub fields: Map<String, Value>,
}

impl EntitySnapshot {
    pub fn of<E: Entity + ?Sized>(entity: &E) -> Self {
        Self {
            model:  entity.model_label(),
            pk:     entity.primary_key(),
            fields: entity.fields(),
        }
    }

    /// フィールドをトップレベルに昇格させたマッピングに変換する
    ///
    /// `pk` / `model` と同名のフィールドがあればフィールド側が優先される。
    pub fn into_dictionary(self) -> Map<String, Value> {
        let mut dictionary = Map::new();
        dictionary.insert("pk".to_string(), self.pk);
        dictionary.insert("model".to_string(), Value::String(self.model));
        dictionary.extend(self.fields);
        dictionary
    }
}

/// 正規化前のコンテキスト値
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    /// そのままシリアライズできる値
    Plain(Value),
    /// エンティティ参照
    Entity(EntitySnapshot),
    /// ネストしたマッピング
    Map(BTreeMap<String, ContextValue>),
    /// リスト
    List(Vec<ContextValue>),
}

impl ContextValue {
    pub fn entity<E: Entity + ?Sized>(entity: &E) -> Self {
        Self::Entity(EntitySnapshot::of(entity))
    }

    /// JSON 値に変換する（再帰的にエンティティをフラット化する）
    pub fn into_value(self) -> Value {
        match self {
            Self::Plain(value) => value,
            Self::Entity(snapshot) => Value::Object(snapshot.into_dictionary()),
            Self::Map(map) => Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, value.into_value()))
                    .collect(),
            ),
            Self::List(items) => Value::Array(items.into_iter().map(Self::into_value).collect()),
        }
    }
}

impl From<Value> for ContextValue {
    fn from(value: Value) -> Self {
        Self::Plain(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        Self::Plain(Value::String(value.to_string()))
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        Self::Plain(Value::String(value))
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        Self::Plain(Value::from(value))
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        Self::Plain(Value::Bool(value))
    }
}

impl From<EntitySnapshot> for ContextValue {
    fn from(snapshot: EntitySnapshot) -> Self {
        Self::Entity(snapshot)
    }
}

impl From<Vec<ContextValue>> for ContextValue {
    fn from(items: Vec<ContextValue>) -> Self {
        Self::List(items)
    }
}

/// コンテキストを正規化する
///
/// エンティティ参照を含む値だけが変換され、それ以外は入力のまま残る。
pub fn normalize_context<I, K>(data: I) -> TemplateContext
where
    I: IntoIterator<Item = (K, ContextValue)>,
    K: Into<String>,
{
    data.into_iter()
        .map(|(key, value)| (key.into(), value.into_value()))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    struct User {
        id:       i64,
        username: String,
        email:    String,
    }

    impl Entity for User {
        fn model_label(&self) -> String {
            "auth.user".to_string()
        }

        fn primary_key(&self) -> Value {
            json!(self.id)
        }

        fn fields(&self) -> Map<String, Value> {
            let mut fields = Map::new();
            fields.insert("username".to_string(), json!(self.username));
            fields.insert("email".to_string(), json!(self.email));
            fields
        }
    }

    fn make_user() -> User {
        User {
            id:       934,
            username: "ann".to_string(),
            email:    "ann@example.com".to_string(),
        }
    }

    #[test]
    fn エンティティはフィールドを昇格したマッピングになる() {
        let dictionary = EntitySnapshot::of(&make_user()).into_dictionary();

        assert_eq!(
            Value::Object(dictionary),
            json!({
                "pk": 934,
                "model": "auth.user",
                "username": "ann",
                "email": "ann@example.com",
            })
        );
    }

    #[test]
    fn プリミティブはそのまま残る() {
        let context = normalize_context([
            ("i", ContextValue::from(27_i64)),
            ("s", ContextValue::from("Foo")),
            ("flag", ContextValue::from(true)),
        ]);

        assert_eq!(
            Value::Object(context),
            json!({"i": 27, "s": "Foo", "flag": true})
        );
    }

    #[test]
    fn ネストしたエンティティも再帰的に変換される() {
        let user = make_user();
        let mut nested = BTreeMap::new();
        nested.insert("owner".to_string(), ContextValue::entity(&user));
        nested.insert("label".to_string(), ContextValue::from("team"));

        let context = normalize_context([
            ("team", ContextValue::Map(nested)),
            (
                "members",
                ContextValue::List(vec![ContextValue::entity(&user), ContextValue::from(1_i64)]),
            ),
        ]);

        assert_eq!(context["team"]["owner"]["pk"], json!(934));
        assert_eq!(context["team"]["label"], json!("team"));
        assert_eq!(context["members"][0]["model"], json!("auth.user"));
        assert_eq!(context["members"][1], json!(1));
    }
}
