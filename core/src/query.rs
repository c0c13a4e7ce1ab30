//! Query string builder for the content API's bracket-notation grammar.
//!
//! # Design
//! `QueryBuilder` accumulates `(key, value)` pairs. Keys are kept raw
//! (`filters[name][$eq]`) and values are percent-encoded as they are added,
//! so rendering is a plain join. Every method appends; nothing already
//! rendered is rewritten, with one exception: a wildcard populate and
//! structured populate clauses cannot coexist, so applying one removes the
//! other and the last one applied wins.
//!
//! `parse_query` and `stringify_query` convert between the rendered form
//! and a `serde_json::Value` tree. They are used to compare queries
//! semantically, independent of key order and array notation.

use serde_json::{Map, Value};

use crate::encoding::{decode_component, encode_query_value};

/// Comparison operators understood by the filter grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Eq,
    Eqi,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    NotIn,
    Contains,
    NotContains,
    Containsi,
    NotContainsi,
    Null,
    NotNull,
    Between,
    StartsWith,
    EndsWith,
}

impl FilterOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Eqi => "eqi",
            FilterOperator::Ne => "ne",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "notIn",
            FilterOperator::Contains => "contains",
            FilterOperator::NotContains => "notContains",
            FilterOperator::Containsi => "containsi",
            FilterOperator::NotContainsi => "notContainsi",
            FilterOperator::Null => "null",
            FilterOperator::NotNull => "notNull",
            FilterOperator::Between => "between",
            FilterOperator::StartsWith => "startsWith",
            FilterOperator::EndsWith => "endsWith",
        }
    }
}

/// Right-hand side of a filter. `Many` renders one clause per element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    One(String),
    Many(Vec<String>),
}

impl FilterValue {
    fn items(&self) -> &[String] {
        match self {
            FilterValue::One(v) => std::slice::from_ref(v),
            FilterValue::Many(vs) => vs,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::One(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        FilterValue::One(v)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        FilterValue::One(v.to_string())
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        FilterValue::One(v.to_string())
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        FilterValue::One(v.to_string())
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        FilterValue::One(v.to_string())
    }
}

impl<T: ToString> From<Vec<T>> for FilterValue {
    fn from(vs: Vec<T>) -> Self {
        FilterValue::Many(vs.iter().map(ToString::to_string).collect())
    }
}

impl<T: ToString> From<&[T]> for FilterValue {
    fn from(vs: &[T]) -> Self {
        FilterValue::Many(vs.iter().map(ToString::to_string).collect())
    }
}

/// One filter clause. `path` has a single segment for plain field filters
/// and several for relation filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub path: Vec<String>,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

impl Filter {
    /// Filter on a field of the collection itself. Dots are not split.
    pub fn new(field: &str, operator: FilterOperator, value: impl Into<FilterValue>) -> Self {
        Self {
            path: vec![field.to_string()],
            operator,
            value: value.into(),
        }
    }

    /// Filter through relations, e.g. `"category.parent.slug"`.
    pub fn deep(path: &str, operator: FilterOperator, value: impl Into<FilterValue>) -> Self {
        Self {
            path: path.split('.').map(str::to_string).collect(),
            operator,
            value: value.into(),
        }
    }

    fn key(&self) -> String {
        let mut key = String::from("filters");
        for segment in &self.path {
            key.push('[');
            key.push_str(segment);
            key.push(']');
        }
        key.push_str("[$");
        key.push_str(self.operator.as_str());
        key.push(']');
        key
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub order: Option<SortOrder>,
}

impl Sort {
    pub fn by(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: None,
        }
    }

    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: Some(SortOrder::Asc),
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: Some(SortOrder::Desc),
        }
    }

    fn render(&self) -> String {
        match self.order {
            Some(order) => format!("{}:{}", self.field, order.as_str()),
            None => self.field.clone(),
        }
    }
}

/// A named child under a deep populate path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulateChild {
    pub key: String,
    /// `None` populates every field of the child.
    pub fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopulateChildren {
    /// Populate every relation one level below the path.
    All,
    Only(Vec<PopulateChild>),
}

/// Populate an n-level relation path such as `"author.company"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulateDeep {
    pub path: String,
    pub fields: Vec<String>,
    pub children: Option<PopulateChildren>,
}

impl PopulateDeep {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            fields: Vec::new(),
            children: None,
        }
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn children(mut self, children: PopulateChildren) -> Self {
        self.children = Some(children);
        self
    }
}

/// Relation population for a request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Populate {
    None,
    /// `populate=*`: one level of every relation.
    #[default]
    All,
    Relations(Vec<String>),
    With {
        relation: String,
        fields: Vec<String>,
        level2: bool,
    },
    Deep(Vec<PopulateDeep>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationState {
    Live,
    Preview,
}

impl PublicationState {
    pub fn as_str(self) -> &'static str {
        match self {
            PublicationState::Live => "live",
            PublicationState::Preview => "preview",
        }
    }
}

const WILDCARD: &str = "%2A";

/// Chainable, cumulative query string builder.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryBuilder {
    path: String,
    pairs: Vec<(String, String)>,
}

impl QueryBuilder {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            pairs: Vec::new(),
        }
    }

    fn push(&mut self, key: String, raw_value: &str) {
        self.pairs.push((key, encode_query_value(raw_value)));
    }

    fn count_indexed(&self, root: &str) -> usize {
        let prefix = format!("{root}[");
        self.pairs
            .iter()
            .filter(|(k, _)| {
                k.strip_prefix(&prefix)
                    .and_then(|rest| rest.strip_suffix(']'))
                    .is_some_and(|idx| !idx.is_empty() && idx.bytes().all(|b| b.is_ascii_digit()))
            })
            .count()
    }

    pub fn filter(mut self, field: &str, operator: FilterOperator, value: impl Into<FilterValue>) -> Self {
        self.push_filter(&Filter::new(field, operator, value));
        self
    }

    /// Relation filter; `path` is dot separated.
    pub fn filter_deep(mut self, path: &str, operator: FilterOperator, value: impl Into<FilterValue>) -> Self {
        self.push_filter(&Filter::deep(path, operator, value));
        self
    }

    pub fn filters(mut self, filters: &[Filter]) -> Self {
        for filter in filters {
            self.push_filter(filter);
        }
        self
    }

    fn push_filter(&mut self, filter: &Filter) {
        let key = filter.key();
        for value in filter.value.items() {
            self.push(key.clone(), value);
        }
    }

    pub fn equal_to(self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.filter(field, FilterOperator::Eq, value)
    }

    pub fn not_equal_to(self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.filter(field, FilterOperator::Ne, value)
    }

    pub fn less_than(self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.filter(field, FilterOperator::Lt, value)
    }

    pub fn less_than_or_equal_to(self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.filter(field, FilterOperator::Lte, value)
    }

    pub fn greater_than(self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.filter(field, FilterOperator::Gt, value)
    }

    pub fn greater_than_or_equal_to(self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.filter(field, FilterOperator::Gte, value)
    }

    pub fn contains_case_sensitive(self, field: &str, value: &str) -> Self {
        self.filter(field, FilterOperator::Contains, value)
    }

    pub fn not_contains_case_sensitive(self, field: &str, value: &str) -> Self {
        self.filter(field, FilterOperator::NotContains, value)
    }

    /// Case-insensitive substring match.
    pub fn contains(self, field: &str, value: &str) -> Self {
        self.filter(field, FilterOperator::Containsi, value)
    }

    pub fn not_contains(self, field: &str, value: &str) -> Self {
        self.filter(field, FilterOperator::NotContainsi, value)
    }

    pub fn is_null(self, field: &str) -> Self {
        self.filter(field, FilterOperator::Null, true)
    }

    pub fn is_not_null(self, field: &str) -> Self {
        self.filter(field, FilterOperator::NotNull, true)
    }

    pub fn between(self, field: &str, low: impl ToString, high: impl ToString) -> Self {
        self.filter(
            field,
            FilterOperator::Between,
            FilterValue::Many(vec![low.to_string(), high.to_string()]),
        )
    }

    pub fn starts_with(self, field: &str, value: &str) -> Self {
        self.filter(field, FilterOperator::StartsWith, value)
    }

    pub fn ends_with(self, field: &str, value: &str) -> Self {
        self.filter(field, FilterOperator::EndsWith, value)
    }

    /// Restrict to the given record ids (`filters[id][$in]` per id).
    pub fn select_ids<T: ToString>(self, ids: &[T]) -> Self {
        self.filter("id", FilterOperator::In, ids)
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let start = self.count_indexed("fields");
        for (i, field) in fields.into_iter().enumerate() {
            self.push(format!("fields[{}]", start + i), field.as_ref());
        }
        self
    }

    pub fn sort(mut self, sort: &[Sort]) -> Self {
        let start = self.count_indexed("sort");
        for (i, s) in sort.iter().enumerate() {
            self.push(format!("sort[{}]", start + i), &s.render());
        }
        self
    }

    fn clear_wildcard_populate(&mut self) {
        self.pairs.retain(|(k, _)| k != "populate");
    }

    /// `populate=*`. Drops any structured populate clauses already added.
    pub fn populate_all(mut self) -> Self {
        self.pairs
            .retain(|(k, _)| k != "populate" && !k.starts_with("populate["));
        self.pairs.push(("populate".to_string(), WILDCARD.to_string()));
        self
    }

    pub fn populate_relations<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.clear_wildcard_populate();
        let start = self.count_indexed("populate");
        for (i, relation) in relations.into_iter().enumerate() {
            self.push(format!("populate[{}]", start + i), relation.as_ref());
        }
        self
    }

    /// Populate one relation, optionally restricted to `fields`, and with
    /// `level2` one more level of every relation below it.
    pub fn populate_with<S: AsRef<str>>(mut self, relation: &str, fields: &[S], level2: bool) -> Self {
        self.clear_wildcard_populate();
        let prefix = format!("populate[{relation}]");
        for (i, field) in fields.iter().enumerate() {
            self.push(format!("{prefix}[fields][{i}]"), field.as_ref());
        }
        if level2 {
            self.pairs
                .push((format!("{prefix}[populate]"), WILDCARD.to_string()));
        }
        if fields.is_empty() && !level2 {
            self.push(prefix, "true");
        }
        self
    }

    pub fn populate_deep(mut self, entries: &[PopulateDeep]) -> Self {
        self.clear_wildcard_populate();
        for entry in entries {
            let mut prefix = String::new();
            for (i, segment) in entry.path.split('.').enumerate() {
                if i == 0 {
                    prefix.push_str(&format!("populate[{segment}]"));
                } else {
                    prefix.push_str(&format!("[populate][{segment}]"));
                }
            }
            for (i, field) in entry.fields.iter().enumerate() {
                self.push(format!("{prefix}[fields][{i}]"), field);
            }
            match &entry.children {
                Some(PopulateChildren::All) => {
                    self.pairs
                        .push((format!("{prefix}[populate]"), WILDCARD.to_string()));
                }
                Some(PopulateChildren::Only(children)) => {
                    for child in children {
                        let child_prefix = format!("{prefix}[populate][{}]", child.key);
                        match &child.fields {
                            None => self.pairs.push((child_prefix, WILDCARD.to_string())),
                            Some(fields) => {
                                for (i, field) in fields.iter().enumerate() {
                                    self.push(format!("{child_prefix}[fields][{i}]"), field);
                                }
                            }
                        }
                    }
                }
                None => {}
            }
            if entry.fields.is_empty() && entry.children.is_none() {
                self.push(prefix, "true");
            }
        }
        self
    }

    pub fn populate(self, populate: &Populate) -> Self {
        match populate {
            Populate::None => self,
            Populate::All => self.populate_all(),
            Populate::Relations(relations) => self.populate_relations(relations),
            Populate::With {
                relation,
                fields,
                level2,
            } => self.populate_with(relation, fields.as_slice(), *level2),
            Populate::Deep(entries) => self.populate_deep(entries),
        }
    }

    pub fn paginate(mut self, page: u32, page_size: u32) -> Self {
        self.push("pagination[page]".to_string(), &page.to_string());
        self.push("pagination[pageSize]".to_string(), &page_size.to_string());
        self
    }

    pub fn paginate_by_offset(mut self, start: u32, limit: u32) -> Self {
        self.push("pagination[start]".to_string(), &start.to_string());
        self.push("pagination[limit]".to_string(), &limit.to_string());
        self
    }

    pub fn publication_state(mut self, state: PublicationState) -> Self {
        self.push("publicationState".to_string(), state.as_str());
        self
    }

    /// Drafts and published entries.
    pub fn with_draft(self) -> Self {
        self.publication_state(PublicationState::Preview)
    }

    /// Drafts only.
    pub fn only_draft(self) -> Self {
        self.with_draft().is_null("publishedAt")
    }

    pub fn locale(mut self, code: &str) -> Self {
        self.push("locale".to_string(), code);
        self
    }

    pub fn query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Path with the query appended. A path that already carries a query
    /// is continued with `&`.
    pub fn build(&self) -> String {
        let query = self.query_string();
        if query.is_empty() {
            return self.path.clone();
        }
        if self.path.ends_with('?') || self.path.ends_with('&') {
            format!("{}{query}", self.path)
        } else if self.path.contains('?') {
            format!("{}&{query}", self.path)
        } else {
            format!("{}?{query}", self.path)
        }
    }
}

/// Parse a bracket-notation query string into a tree.
///
/// Anything before a `?` is ignored. Repeated leaf keys collect into an
/// array, and objects whose keys are all indices become arrays.
pub fn parse_query(input: &str) -> Value {
    let query = match input.split_once('?') {
        Some((_, q)) => q,
        None => input,
    };
    let mut root = Map::new();
    for part in query.split('&').filter(|p| !p.is_empty()) {
        let (raw_key, raw_value) = part.split_once('=').unwrap_or((part, ""));
        let key = decode_component(&raw_key.replace('+', " "));
        let value = decode_component(&raw_value.replace('+', " "));
        insert_path(&mut root, &split_key(&key), Value::String(value));
    }
    normalize(Value::Object(root))
}

fn split_key(key: &str) -> Vec<String> {
    let Some(open) = key.find('[') else {
        return vec![key.to_string()];
    };
    let mut segments = vec![key[..open].to_string()];
    let mut rest = &key[open..];
    while let Some(stripped) = rest.strip_prefix('[') {
        match stripped.find(']') {
            Some(close) => {
                segments.push(stripped[..close].to_string());
                rest = &stripped[close + 1..];
            }
            None => {
                segments.push(rest.to_string());
                rest = "";
            }
        }
    }
    if !rest.is_empty() {
        segments.push(rest.to_string());
    }
    segments
}

fn insert_path(node: &mut Map<String, Value>, path: &[String], value: Value) {
    let Some((head, tail)) = path.split_first() else {
        return;
    };
    if tail.is_empty() {
        match node.get_mut(head) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let previous = existing.take();
                *existing = Value::Array(vec![previous, value]);
            }
            None => {
                node.insert(head.clone(), value);
            }
        }
        return;
    }
    let child = node
        .entry(head.clone())
        .or_insert_with(|| Value::Object(Map::new()));
    if !child.is_object() {
        *child = Value::Object(Map::new());
    }
    if let Value::Object(map) = child {
        insert_path(map, tail, value);
    }
}

fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let all_indices = !map.is_empty() && map.keys().all(|k| k.parse::<usize>().is_ok());
            if all_indices {
                let mut items: Vec<(usize, Value)> = map
                    .into_iter()
                    .filter_map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, normalize(v))))
                    .collect();
                items.sort_by_key(|(i, _)| *i);
                Value::Array(items.into_iter().map(|(_, v)| v).collect())
            } else {
                Value::Object(map.into_iter().map(|(k, v)| (k, normalize(v))).collect())
            }
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        other => other,
    }
}

/// Render a tree produced by `parse_query` back into a query string.
pub fn stringify_query(tree: &Value) -> String {
    let mut pairs = Vec::new();
    if let Value::Object(map) = tree {
        for (key, value) in map {
            flatten_into(key.clone(), value, &mut pairs);
        }
    }
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn flatten_into(prefix: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(format!("{prefix}[{key}]"), child, out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                flatten_into(format!("{prefix}[{i}]"), child, out);
            }
        }
        Value::String(s) => out.push((prefix, encode_query_value(s))),
        Value::Null => out.push((prefix, String::new())),
        other => out.push((prefix, encode_query_value(&other.to_string()))),
    }
}
