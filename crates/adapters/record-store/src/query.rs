//! 查询条件求值 (内存实现使用)

use std::cmp::Ordering;

use hse_ports::{
    Condition, ConditionGroup, FetchQuery, GroupOperator, ID_FIELD, Operator, Record,
    SortDirection,
};
use serde_json::Value;

/// 记录是否满足查询的全部条件
pub(crate) fn matches(record: &Record, query: &FetchQuery) -> bool {
    query.conditions.iter().all(|c| matches_condition(record, c))
        && query.groups.iter().all(|g| matches_group(record, g))
}

fn matches_group(record: &Record, group: &ConditionGroup) -> bool {
    match group.operator {
        GroupOperator::And => group.conditions.iter().all(|c| matches_condition(record, c)),
        GroupOperator::Or => group.conditions.iter().any(|c| matches_condition(record, c)),
    }
}

fn matches_condition(record: &Record, condition: &Condition) -> bool {
    let field = record.get(&condition.field_name).unwrap_or(&Value::Null);
    match condition.operator {
        Operator::EqualTo => condition.values.iter().any(|v| loosely_equal(field, v)),
        Operator::NotEqualTo => !condition.values.iter().any(|v| loosely_equal(field, v)),
        Operator::Contains => {
            let haystack = scalar_text(field).to_lowercase();
            condition
                .values
                .iter()
                .any(|v| haystack.contains(&scalar_text(v).to_lowercase()))
        }
        Operator::GreaterThan => condition
            .values
            .first()
            .is_some_and(|v| compare(field, v) == Ordering::Greater),
        Operator::LessThan => condition
            .values
            .first()
            .is_some_and(|v| compare(field, v) == Ordering::Less),
        Operator::HasValue => has_value(field),
    }
}

/// 展开关联对象 `{"Id": 7, ..}` 为其主键
fn unwrap_lookup(value: &Value) -> &Value {
    match value {
        Value::Object(obj) => obj.get(ID_FIELD).unwrap_or(value),
        _ => value,
    }
}

fn scalar_text(value: &Value) -> String {
    match unwrap_lookup(value) {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn loosely_equal(left: &Value, right: &Value) -> bool {
    let (left, right) = (unwrap_lookup(left), unwrap_lookup(right));
    if left.is_null() || right.is_null() {
        return left.is_null() && right.is_null();
    }
    match (as_number(left), as_number(right)) {
        (Some(a), Some(b)) => a == b,
        _ => scalar_text(left) == scalar_text(right),
    }
}

fn has_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

/// 排序比较：空值最前，数字按数值，其余按文本
pub(crate) fn compare(left: &Value, right: &Value) -> Ordering {
    let (left, right) = (unwrap_lookup(left), unwrap_lookup(right));
    match (has_value(left), has_value(right)) {
        (false, false) => return Ordering::Equal,
        (false, true) => return Ordering::Less,
        (true, false) => return Ordering::Greater,
        (true, true) => {}
    }
    match (as_number(left), as_number(right)) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => scalar_text(left).cmp(&scalar_text(right)),
    }
}

/// 按 `orderBy` 排序，未指定时按主键升序
pub(crate) fn sort(records: &mut [Record], query: &FetchQuery) {
    records.sort_by(|a, b| {
        for order in &query.order_by {
            let left = a.get(&order.field_name).unwrap_or(&Value::Null);
            let right = b.get(&order.field_name).unwrap_or(&Value::Null);
            let ordering = match order.direction {
                SortDirection::Asc => compare(left, right),
                SortDirection::Desc => compare(right, left),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        let left = a.get(ID_FIELD).unwrap_or(&Value::Null);
        let right = b.get(ID_FIELD).unwrap_or(&Value::Null);
        compare(left, right)
    });
}

/// 字段投影，`Id` 始终返回，缺失字段返回 `null`
pub(crate) fn project(record: &Record, fields: &[String]) -> Record {
    if fields.is_empty() {
        return record.clone();
    }
    let mut projected = Record::new();
    if let Some(id) = record.get(ID_FIELD) {
        projected.insert(ID_FIELD.to_string(), id.clone());
    }
    for field in fields {
        projected.insert(
            field.clone(),
            record.get(field).cloned().unwrap_or(Value::Null),
        );
    }
    projected
}
