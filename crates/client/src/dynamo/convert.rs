//! Conversion between core items and DynamoDB SDK attribute maps.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue as SdkValue;
use wpsnapshots_core::store::attributes::TOMBSTONE_ATTRIBUTE;
use wpsnapshots_core::store::{AttributeValue, Item, ScanFilter};
use wpsnapshots_core::{Error, StoreFailure};

/// Server-side form of [`ScanFilter::matches`].
pub(crate) const FILTER_EXPRESSION: &str = "contains(#project, :needle) OR #id = :needle";

pub(crate) fn to_sdk(value: &AttributeValue) -> SdkValue {
    match value {
        AttributeValue::S(s) => SdkValue::S(s.clone()),
        AttributeValue::N(n) => SdkValue::N(n.clone()),
        AttributeValue::Bool(b) => SdkValue::Bool(*b),
        AttributeValue::L(items) => SdkValue::L(items.iter().map(to_sdk).collect()),
        AttributeValue::M(map) => SdkValue::M(map.iter().map(|(k, v)| (k.clone(), to_sdk(v))).collect()),
    }
}

pub(crate) fn from_sdk(value: SdkValue) -> Result<AttributeValue, Error> {
    Ok(match value {
        SdkValue::S(s) => AttributeValue::S(s),
        SdkValue::N(n) => AttributeValue::N(n),
        SdkValue::Bool(b) => AttributeValue::Bool(b),
        SdkValue::L(items) => AttributeValue::L(items.into_iter().map(from_sdk).collect::<Result<_, _>>()?),
        SdkValue::M(map) => AttributeValue::M(
            map.into_iter()
                .map(|(k, v)| from_sdk(v).map(|v| (k, v)))
                .collect::<Result<_, _>>()?,
        ),
        other => {
            return Err(Error::Store(StoreFailure::malformed(format!("unsupported attribute type: {other:?}"))));
        }
    })
}

pub(crate) fn item_to_sdk(item: &Item) -> HashMap<String, SdkValue> {
    item.iter().map(|(k, v)| (k.clone(), to_sdk(v))).collect()
}

/// Convert a returned item. A tombstone marker of any type is kept as a marker.
pub(crate) fn item_from_sdk(map: HashMap<String, SdkValue>) -> Result<Item, Error> {
    let mut item = Item::new();
    for (key, value) in map {
        let value = if key == TOMBSTONE_ATTRIBUTE {
            from_sdk(value).unwrap_or(AttributeValue::Bool(true))
        } else {
            from_sdk(value)?
        };
        item.insert(key, value);
    }
    Ok(item)
}

/// Attribute names and values referenced by [`FILTER_EXPRESSION`].
pub(crate) fn filter_bindings(filter: &ScanFilter) -> (HashMap<String, String>, HashMap<String, SdkValue>) {
    let names = HashMap::from([
        ("#project".to_string(), "project".to_string()),
        ("#id".to_string(), "id".to_string()),
    ]);
    let values = HashMap::from([(":needle".to_string(), SdkValue::S(filter.needle().to_string()))]);
    (names, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use wpsnapshots_core::store::attributes::{marshal, unmarshal};
    use wpsnapshots_core::{SiteDescriptor, SnapshotRecord};

    fn record() -> SnapshotRecord {
        SnapshotRecord {
            id: "abc123".into(),
            project: "acme".into(),
            repository: "main".into(),
            time: 1_700_000_000,
            description: String::new(),
            author: "jo".into(),
            multisite: true,
            sites: vec![SiteDescriptor { url: "http://a.test".into(), blog_id: 1, domain: "a.test".into() }],
            table_prefix: "wp_".into(),
            subdomain_install: false,
            size: 99,
            wp_version: "6.5".into(),
        }
    }

    #[test]
    fn test_record_survives_sdk_conversion() {
        let item = marshal(&record());
        let sdk = item_to_sdk(&item);
        assert_eq!(sdk.get("time"), Some(&SdkValue::N("1700000000".into())));
        assert_eq!(sdk.get("multisite"), Some(&SdkValue::Bool(true)));

        let back = item_from_sdk(sdk).unwrap();
        assert_eq!(back, item);
        assert_eq!(unmarshal(&back).unwrap(), record());
    }

    #[test]
    fn test_nested_map_conversion() {
        let mut inner = BTreeMap::new();
        inner.insert("k".to_string(), AttributeValue::L(vec![AttributeValue::N("1".into())]));
        let value = AttributeValue::M(inner);
        assert_eq!(from_sdk(to_sdk(&value)).unwrap(), value);
    }

    #[test]
    fn test_unsupported_types_rejected() {
        assert!(from_sdk(SdkValue::Ss(vec!["a".into()])).is_err());
        assert!(from_sdk(SdkValue::Null(true)).is_err());
    }

    #[test]
    fn test_tombstone_of_any_type_is_kept() {
        let map = HashMap::from([
            ("id".to_string(), SdkValue::S("x1".into())),
            (TOMBSTONE_ATTRIBUTE.to_string(), SdkValue::Null(true)),
        ]);
        let item = item_from_sdk(map).unwrap();
        assert!(wpsnapshots_core::store::attributes::is_tombstone(&item));
    }

    #[test]
    fn test_filter_bindings() {
        let (names, values) = filter_bindings(&ScanFilter::new("Acme"));
        assert_eq!(names["#project"], "project");
        assert_eq!(names["#id"], "id");
        assert_eq!(values[":needle"], SdkValue::S("acme".into()));
        for placeholder in names.keys().chain(values.keys()) {
            assert!(FILTER_EXPRESSION.contains(placeholder.as_str()));
        }
    }
}
