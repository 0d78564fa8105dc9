//! Typed item attributes and the record <-> item mapping.
//!
//! Items use the key-value store's attribute typing (string, number, bool,
//! list, map) and serialize in its JSON wire shape, e.g. `{"S": "abc"}` or
//! `{"N": "42"}`. The mapping to [`SnapshotRecord`] is exhaustive in both
//! directions: unknown, missing or mistyped attributes are rejected.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StoreFailure;
use crate::record::{SiteDescriptor, SnapshotRecord};
use crate::Error;

/// Attribute that marks an item as a failed write. Readers treat it as absent.
pub const TOMBSTONE_ATTRIBUTE: &str = "error";

/// Hash key attribute of every snapshot table.
pub const HASH_KEY: &str = "id";

const RECORD_ATTRIBUTES: &[&str] = &[
    "id",
    "project",
    "repository",
    "time",
    "description",
    "author",
    "multisite",
    "sites",
    "table_prefix",
    "subdomain_install",
    "size",
    "wp_version",
];

const SITE_ATTRIBUTES: &[&str] = &["url", "blog_id", "domain"];

/// A single wire-typed attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    S(String),
    /// Numbers travel as their decimal string form.
    N(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    L(Vec<AttributeValue>),
    M(BTreeMap<String, AttributeValue>),
}

impl AttributeValue {
    fn kind(&self) -> &'static str {
        match self {
            AttributeValue::S(_) => "S",
            AttributeValue::N(_) => "N",
            AttributeValue::Bool(_) => "BOOL",
            AttributeValue::L(_) => "L",
            AttributeValue::M(_) => "M",
        }
    }

    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s),
            _ => None,
        }
    }
}

/// One stored item: attribute name to value.
pub type Item = BTreeMap<String, AttributeValue>;

/// Whether an item carries the failure marker.
pub fn is_tombstone(item: &Item) -> bool {
    item.contains_key(TOMBSTONE_ATTRIBUTE)
}

/// The hash key of an item, if it has a string `id`.
pub fn item_id(item: &Item) -> Option<&str> {
    item.get(HASH_KEY).and_then(AttributeValue::as_s)
}

pub fn marshal(record: &SnapshotRecord) -> Item {
    let mut item = Item::new();
    item.insert("id".into(), AttributeValue::S(record.id.clone()));
    item.insert("project".into(), AttributeValue::S(record.project.clone()));
    item.insert("repository".into(), AttributeValue::S(record.repository.clone()));
    item.insert("time".into(), AttributeValue::N(record.time.to_string()));
    item.insert("description".into(), AttributeValue::S(record.description.clone()));
    item.insert("author".into(), AttributeValue::S(record.author.clone()));
    item.insert("multisite".into(), AttributeValue::Bool(record.multisite));
    item.insert("sites".into(), AttributeValue::L(record.sites.iter().map(marshal_site).collect()));
    item.insert("table_prefix".into(), AttributeValue::S(record.table_prefix.clone()));
    item.insert("subdomain_install".into(), AttributeValue::Bool(record.subdomain_install));
    item.insert("size".into(), AttributeValue::N(record.size.to_string()));
    item.insert("wp_version".into(), AttributeValue::S(record.wp_version.clone()));
    item
}

fn marshal_site(site: &SiteDescriptor) -> AttributeValue {
    let mut map = BTreeMap::new();
    map.insert("url".into(), AttributeValue::S(site.url.clone()));
    map.insert("blog_id".into(), AttributeValue::N(site.blog_id.to_string()));
    map.insert("domain".into(), AttributeValue::S(site.domain.clone()));
    AttributeValue::M(map)
}

pub fn unmarshal(item: &Item) -> Result<SnapshotRecord, Error> {
    let fields = Fields::new(item, "snapshot", RECORD_ATTRIBUTES)?;
    Ok(SnapshotRecord {
        id: fields.string("id")?,
        project: fields.string("project")?,
        repository: fields.string("repository")?,
        time: fields.number("time")?,
        description: fields.string("description")?,
        author: fields.string("author")?,
        multisite: fields.boolean("multisite")?,
        sites: fields.list("sites")?.iter().map(unmarshal_site).collect::<Result<_, _>>()?,
        table_prefix: fields.string("table_prefix")?,
        subdomain_install: fields.boolean("subdomain_install")?,
        size: fields.number("size")?,
        wp_version: fields.string("wp_version")?,
    })
}

fn unmarshal_site(value: &AttributeValue) -> Result<SiteDescriptor, Error> {
    let AttributeValue::M(map) = value else {
        return Err(malformed(format!("site entry: expected M, found {}", value.kind())));
    };
    let fields = Fields::new(map, "site", SITE_ATTRIBUTES)?;
    Ok(SiteDescriptor {
        url: fields.string("url")?,
        blog_id: fields.number("blog_id")?,
        domain: fields.string("domain")?,
    })
}

fn malformed(reason: String) -> Error {
    Error::Store(StoreFailure::malformed(reason))
}

/// Typed accessors over an attribute map that has no unknown keys.
struct Fields<'a> {
    map: &'a BTreeMap<String, AttributeValue>,
    context: &'static str,
}

impl<'a> Fields<'a> {
    fn new(
        map: &'a BTreeMap<String, AttributeValue>, context: &'static str, known: &[&str],
    ) -> Result<Self, Error> {
        if let Some(unknown) = map.keys().find(|k| !known.contains(&k.as_str())) {
            return Err(malformed(format!("{context}: unknown attribute {unknown:?}")));
        }
        Ok(Self { map, context })
    }

    fn get(&self, key: &str) -> Result<&'a AttributeValue, Error> {
        self.map
            .get(key)
            .ok_or_else(|| malformed(format!("{}: missing attribute {key:?}", self.context)))
    }

    fn mistyped(&self, key: &str, expected: &str, found: &AttributeValue) -> Error {
        malformed(format!("{}: attribute {key:?} expected {expected}, found {}", self.context, found.kind()))
    }

    fn string(&self, key: &str) -> Result<String, Error> {
        match self.get(key)? {
            AttributeValue::S(s) => Ok(s.clone()),
            other => Err(self.mistyped(key, "S", other)),
        }
    }

    fn number<T: FromStr>(&self, key: &str) -> Result<T, Error> {
        match self.get(key)? {
            AttributeValue::N(n) => n
                .parse()
                .map_err(|_| malformed(format!("{}: attribute {key:?} is not a valid number: {n:?}", self.context))),
            other => Err(self.mistyped(key, "N", other)),
        }
    }

    fn boolean(&self, key: &str) -> Result<bool, Error> {
        match self.get(key)? {
            AttributeValue::Bool(b) => Ok(*b),
            other => Err(self.mistyped(key, "BOOL", other)),
        }
    }

    fn list(&self, key: &str) -> Result<&'a [AttributeValue], Error> {
        match self.get(key)? {
            AttributeValue::L(items) => Ok(items),
            other => Err(self.mistyped(key, "L", other)),
        }
    }
}
