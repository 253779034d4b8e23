// document system attributes
pub const DOC_KEY: &str = "_key";
pub const DOC_ID: &str = "_id";
pub const DOC_REV: &str = "_rev";
pub const DOC_FROM: &str = "_from";
pub const DOC_TO: &str = "_to";

// annotation sentinels
pub const UNSET: i64 = -1;
pub const UNSET_THRESHOLD: f64 = -1.0;

// database defaults
pub const DEFAULT_DATABASE: &str = "_system";
pub const ID_SEPARATOR: &str = "/";

// index type names
pub const HASH_INDEX: &str = "hash";
pub const SKIPLIST_INDEX: &str = "skiplist";
pub const PERSISTENT_INDEX: &str = "persistent";
pub const GEO_INDEX: &str = "geo";
pub const FULLTEXT_INDEX: &str = "fulltext";
