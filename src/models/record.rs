//! # 结果记录
//!
//! 最终结果是由字符串键到带类型值的有序映射。属性值可以是标量、
//! 向量或 (值, 单位, 不确定度) 三元组，序列化为 kebab-case 的 JSON 对象：
//!
//! ```text
//! "vacancy-migration-energy": {
//!     "source-value": 0.643, "source-unit": "eV", "source-std-uncert-value": 0.0012
//! }
//! ```
//!
//! ## 依赖关系
//! - 被 `vacancy/pipeline.rs` 构造
//! - 被 `report/` 输出

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

pub const UNIT_ENERGY: &str = "eV";
pub const UNIT_LENGTH: &str = "angstrom";
pub const UNIT_ANGLE: &str = "degree";
pub const UNIT_PRESSURE: &str = "GPa";

/// 记录中的原始值
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecordValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    FloatList(Vec<f64>),
    TextList(Vec<String>),
    Matrix(Vec<Vec<f64>>),
}

/// 带可选单位与不确定度的属性值
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PropertyValue {
    pub source_value: RecordValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_std_uncert_value: Option<f64>,
}

impl PropertyValue {
    pub fn new(value: RecordValue) -> Self {
        PropertyValue {
            source_value: value,
            source_unit: None,
            source_std_uncert_value: None,
        }
    }

    pub fn with_unit(value: RecordValue, unit: &str) -> Self {
        PropertyValue {
            source_value: value,
            source_unit: Some(unit.to_string()),
            source_std_uncert_value: None,
        }
    }

    pub fn measured(value: f64, unit: &str, uncertainty: f64) -> Self {
        PropertyValue {
            source_value: RecordValue::Float(value),
            source_unit: Some(unit.to_string()),
            source_std_uncert_value: Some(uncertainty),
        }
    }
}

/// 记录条目
#[derive(Debug, Clone, PartialEq)]
pub enum RecordEntry {
    /// 直接写出的值（如 property-id）
    Plain(RecordValue),
    /// 属性值对象
    Property(PropertyValue),
}

impl Serialize for RecordEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            RecordEntry::Plain(v) => v.serialize(serializer),
            RecordEntry::Property(p) => p.serialize(serializer),
        }
    }
}

/// 有序结果记录
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRecord {
    entries: Vec<(String, RecordEntry)>,
}

impl ResultRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入纯值；已存在的键被覆盖并保持原位置
    pub fn plain(&mut self, key: &str, value: RecordValue) -> &mut Self {
        self.insert(key, RecordEntry::Plain(value))
    }

    /// 写入属性值
    pub fn property(&mut self, key: &str, value: PropertyValue) -> &mut Self {
        self.insert(key, RecordEntry::Property(value))
    }

    fn insert(&mut self, key: &str, entry: RecordEntry) -> &mut Self {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = entry,
            None => self.entries.push((key.to_string(), entry)),
        }
        self
    }

    /// 合并另一记录的全部条目
    pub fn extend(&mut self, other: &ResultRecord) -> &mut Self {
        for (key, entry) in &other.entries {
            self.insert(key, entry.clone());
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&RecordEntry> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, e)| e)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl Serialize for ResultRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_preserves_insertion_order() {
        let mut record = ResultRecord::new();
        record
            .plain("property-id", RecordValue::Text("p".into()))
            .plain("instance-id", RecordValue::Int(1))
            .property("energy", PropertyValue::measured(0.5, UNIT_ENERGY, 0.01));

        let json = serde_json::to_string(&record).unwrap();
        let id = json.find("property-id").unwrap();
        let inst = json.find("instance-id").unwrap();
        let energy = json.find("energy").unwrap();
        assert!(id < inst && inst < energy);
    }

    #[test]
    fn test_property_serialization() {
        let value = PropertyValue::measured(0.5, UNIT_ENERGY, 0.01);
        let json = serde_json::to_value(&value).unwrap();

        assert_eq!(json["source-value"], 0.5);
        assert_eq!(json["source-unit"], "eV");
        assert_eq!(json["source-std-uncert-value"], 0.01);

        let bare = serde_json::to_value(PropertyValue::new(RecordValue::Int(1))).unwrap();
        assert!(bare.get("source-unit").is_none());
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut record = ResultRecord::new();
        record
            .plain("a", RecordValue::Int(1))
            .plain("b", RecordValue::Int(2))
            .plain("a", RecordValue::Int(3));

        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(record.get("a"), Some(&RecordEntry::Plain(RecordValue::Int(3))));
    }
}
