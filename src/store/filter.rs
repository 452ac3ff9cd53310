use serde_json::{Map, Value};

/// 单个过滤条件，字段名使用持久化后的 camelCase 名称
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Eq(String, Value),
    In(String, Vec<Value>),
}

/// 文档过滤器，所有条件之间为 AND 关系
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Eq(field.into(), value.into()));
        self
    }

    /// 空字符串视为未提供，不加入条件
    pub fn eq_if_present(self, field: impl Into<String>, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => self.eq(field, v),
            _ => self,
        }
    }

    /// 批量多键查询：字段值落在给定集合中即匹配
    pub fn is_in<V: Into<Value>>(
        mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.clauses.push(Clause::In(field.into(), values));
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn matches(&self, doc: &Map<String, Value>) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::Eq(field, value) => doc.get(field) == Some(value),
            Clause::In(field, values) => doc
                .get(field)
                .is_some_and(|actual| values.iter().any(|v| v == actual)),
        })
    }
}
