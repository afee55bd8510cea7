//! JSON Patch (RFC 6902)
//!
//! 补丁文档反序列化为带标签的操作列表，逐条作用在实体的内存副本上。
//! 对象成员名按大小写不敏感匹配。

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// 单条补丁操作
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
    Move { from: String, path: String },
    Copy { from: String, path: String },
    Test { path: String, value: Value },
}

impl PatchOperation {
    /// 操作的目标路径
    pub fn path(&self) -> &str {
        match self {
            PatchOperation::Add { path, .. }
            | PatchOperation::Remove { path }
            | PatchOperation::Replace { path, .. }
            | PatchOperation::Move { path, .. }
            | PatchOperation::Copy { path, .. }
            | PatchOperation::Test { path, .. } => path,
        }
    }
}

/// 补丁文档
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchDocument(pub Vec<PatchOperation>);

/// 补丁应用错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("La ruta '{0}' no es válida.")]
    InvalidPath(String),

    #[error("No se encontró la ubicación de destino '{0}'.")]
    PathNotFound(String),

    #[error("La prueba de la ruta '{0}' no coincide con el valor actual.")]
    TestFailed(String),
}

impl PatchError {
    /// 出错的路径
    pub fn path(&self) -> &str {
        match self {
            PatchError::InvalidPath(p) | PatchError::PathNotFound(p) | PatchError::TestFailed(p) => p,
        }
    }
}

impl PatchDocument {
    pub fn operations(&self) -> &[PatchOperation] {
        &self.0
    }

    /// 按顺序应用全部操作，遇到第一个错误即停止
    pub fn apply(&self, doc: &mut Value) -> Result<(), PatchError> {
        for operation in &self.0 {
            apply_operation(doc, operation)?;
        }
        Ok(())
    }
}

fn apply_operation(doc: &mut Value, operation: &PatchOperation) -> Result<(), PatchError> {
    match operation {
        PatchOperation::Add { path, value } => add(doc, path, value.clone()),
        PatchOperation::Remove { path } => remove(doc, path).map(|_| ()),
        PatchOperation::Replace { path, value } => {
            let target = resolve_mut(doc, path)?;
            *target = value.clone();
            Ok(())
        }
        PatchOperation::Move { from, path } => {
            if path.starts_with(&format!("{}/", from)) {
                return Err(PatchError::InvalidPath(path.clone()));
            }
            let value = remove(doc, from)?;
            add(doc, path, value)
        }
        PatchOperation::Copy { from, path } => {
            let value = resolve_mut(doc, from)?.clone();
            add(doc, path, value)
        }
        PatchOperation::Test { path, value } => {
            if *resolve_mut(doc, path)? == *value {
                Ok(())
            } else {
                Err(PatchError::TestFailed(path.clone()))
            }
        }
    }
}

/// 拆分 JSON Pointer 并还原转义（`~1` -> `/`，`~0` -> `~`）
fn tokens(path: &str) -> Result<Vec<String>, PatchError> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    if !path.starts_with('/') {
        return Err(PatchError::InvalidPath(path.to_string()));
    }
    Ok(path[1..]
        .split('/')
        .map(|t| t.replace("~1", "/").replace("~0", "~"))
        .collect())
}

/// 在对象中查找成员名，先精确匹配再忽略大小写
fn member_key(map: &serde_json::Map<String, Value>, token: &str) -> Option<String> {
    if map.contains_key(token) {
        return Some(token.to_string());
    }
    map.keys().find(|k| k.eq_ignore_ascii_case(token)).cloned()
}

fn array_index(token: &str, len: usize, path: &str) -> Result<usize, PatchError> {
    let index: usize = token
        .parse()
        .map_err(|_| PatchError::InvalidPath(path.to_string()))?;
    if index >= len {
        return Err(PatchError::PathNotFound(path.to_string()));
    }
    Ok(index)
}

fn resolve_mut<'a>(doc: &'a mut Value, path: &str) -> Result<&'a mut Value, PatchError> {
    let mut current = doc;
    for token in tokens(path)? {
        current = step_mut(current, &token, path)?;
    }
    Ok(current)
}

fn step_mut<'a>(value: &'a mut Value, token: &str, path: &str) -> Result<&'a mut Value, PatchError> {
    match value {
        Value::Object(map) => {
            let key = member_key(map, token).ok_or_else(|| PatchError::PathNotFound(path.to_string()))?;
            map.get_mut(&key).ok_or_else(|| PatchError::PathNotFound(path.to_string()))
        }
        Value::Array(items) => {
            let index = array_index(token, items.len(), path)?;
            Ok(&mut items[index])
        }
        _ => Err(PatchError::PathNotFound(path.to_string())),
    }
}

/// 返回父节点和最后一个路径片段
fn parent_mut<'a>(doc: &'a mut Value, path: &str) -> Result<(&'a mut Value, String), PatchError> {
    let mut segments = tokens(path)?;
    let last = segments
        .pop()
        .ok_or_else(|| PatchError::InvalidPath(path.to_string()))?;
    let mut current = doc;
    for token in &segments {
        current = step_mut(current, token, path)?;
    }
    Ok((current, last))
}

fn add(doc: &mut Value, path: &str, value: Value) -> Result<(), PatchError> {
    if path.is_empty() {
        *doc = value;
        return Ok(());
    }
    let (parent, last) = parent_mut(doc, path)?;
    match parent {
        Value::Object(map) => {
            let key = member_key(map, &last).unwrap_or(last);
            map.insert(key, value);
            Ok(())
        }
        Value::Array(items) => {
            if last == "-" {
                items.push(value);
                return Ok(());
            }
            let index: usize = last
                .parse()
                .map_err(|_| PatchError::InvalidPath(path.to_string()))?;
            if index > items.len() {
                return Err(PatchError::PathNotFound(path.to_string()));
            }
            items.insert(index, value);
            Ok(())
        }
        _ => Err(PatchError::PathNotFound(path.to_string())),
    }
}

fn remove(doc: &mut Value, path: &str) -> Result<Value, PatchError> {
    let (parent, last) = parent_mut(doc, path)?;
    match parent {
        Value::Object(map) => {
            let key = member_key(map, &last).ok_or_else(|| PatchError::PathNotFound(path.to_string()))?;
            map.remove(&key).ok_or_else(|| PatchError::PathNotFound(path.to_string()))
        }
        Value::Array(items) => {
            let index = array_index(&last, items.len(), path)?;
            Ok(items.remove(index))
        }
        _ => Err(PatchError::PathNotFound(path.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(ops: Value) -> PatchDocument {
        serde_json::from_value(ops).unwrap()
    }

    #[test]
    fn test_deserialize_tagged_operations() {
        let doc = document(json!([
            {"op": "replace", "path": "/nombres", "value": "Ana"},
            {"op": "remove", "path": "/codigo"},
            {"op": "move", "from": "/a", "path": "/b"}
        ]));
        assert_eq!(doc.operations().len(), 3);
        assert_eq!(doc.operations()[1], PatchOperation::Remove { path: "/codigo".to_string() });
        assert_eq!(doc.operations()[2].path(), "/b");
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        let result: Result<PatchDocument, _> =
            serde_json::from_value(json!([{"op": "merge", "path": "/x", "value": 1}]));
        assert!(result.is_err());
    }

    #[test]
    fn test_replace_is_case_insensitive() {
        let mut value = json!({"nombres": "Ana", "apellidos": "Pérez"});
        document(json!([{"op": "replace", "path": "/Nombres", "value": "Luisa"}]))
            .apply(&mut value)
            .unwrap();
        assert_eq!(value, json!({"nombres": "Luisa", "apellidos": "Pérez"}));
    }

    #[test]
    fn test_replace_missing_member_fails() {
        let mut value = json!({"nombres": "Ana"});
        let err = document(json!([{"op": "replace", "path": "/telefono", "value": "1"}]))
            .apply(&mut value)
            .unwrap_err();
        assert_eq!(err, PatchError::PathNotFound("/telefono".to_string()));
        assert_eq!(err.path(), "/telefono");
    }

    #[test]
    fn test_add_remove_and_arrays() {
        let mut value = json!({"tags": ["a", "c"]});
        document(json!([
            {"op": "add", "path": "/tags/1", "value": "b"},
            {"op": "add", "path": "/tags/-", "value": "d"},
            {"op": "remove", "path": "/tags/0"},
            {"op": "add", "path": "/nuevo", "value": true}
        ]))
        .apply(&mut value)
        .unwrap();
        assert_eq!(value, json!({"tags": ["b", "c", "d"], "nuevo": true}));
    }

    #[test]
    fn test_move_copy_and_test() {
        let mut value = json!({"a": 1, "b": {"c": 2}});
        document(json!([
            {"op": "copy", "from": "/b/c", "path": "/d"},
            {"op": "move", "from": "/a", "path": "/b/a"},
            {"op": "test", "path": "/d", "value": 2}
        ]))
        .apply(&mut value)
        .unwrap();
        assert_eq!(value, json!({"b": {"c": 2, "a": 1}, "d": 2}));
    }

    #[test]
    fn test_failed_test_operation() {
        let mut value = json!({"codigo": "EST0000001"});
        let err = document(json!([{"op": "test", "path": "/codigo", "value": "X"}]))
            .apply(&mut value)
            .unwrap_err();
        assert!(matches!(err, PatchError::TestFailed(_)));
    }

    #[test]
    fn test_escaped_pointer_tokens() {
        let mut value = json!({"a/b": 1, "m~n": 2});
        document(json!([
            {"op": "replace", "path": "/a~1b", "value": 10},
            {"op": "remove", "path": "/m~0n"}
        ]))
        .apply(&mut value)
        .unwrap();
        assert_eq!(value, json!({"a/b": 10}));
    }

    #[test]
    fn test_path_without_leading_slash_is_invalid() {
        let mut value = json!({"nombres": "Ana"});
        let err = document(json!([{"op": "remove", "path": "nombres"}]))
            .apply(&mut value)
            .unwrap_err();
        assert!(matches!(err, PatchError::InvalidPath(_)));
    }

    #[test]
    fn test_move_into_own_child_is_invalid() {
        let mut value = json!({"a": {"b": 1}});
        let err = document(json!([{"op": "move", "from": "/a", "path": "/a/b/c"}]))
            .apply(&mut value)
            .unwrap_err();
        assert!(matches!(err, PatchError::InvalidPath(_)));
    }
}
