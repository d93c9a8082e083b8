use log::debug;
use serde::{Deserialize, Serialize};

/// A versioned, closed set of body-part names for one costume revision.
///
/// Part indices into a [`crate::show::Show`] are positions in `parts`;
/// the names only appear on the wire (hardware export) and in logs.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub name: String,
    pub parts: Vec<String>,
}

impl Schema {
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn part_name(&self, index: usize) -> &str {
        self.parts
            .get(index)
            .map(|s| s.as_str())
            .unwrap_or("unknown")
    }
}

/// Get the statically-defined costume schemas known to the system. The
/// list is built at compile time from the JSON definitions in the
/// `schemas` folder; these are concatenated into `all_schemas.json` by
/// the build script.
pub fn load_all_schemas() -> Vec<Schema> {
    let all_schemas_json = include_str!("../all_schemas.json");
    let all_schemas = serde_json::from_str::<Vec<Schema>>(all_schemas_json)
        .expect("failed to parse all_schemas JSON");

    debug!("Loaded {} costume schemas", all_schemas.len());
    all_schemas
}

/// Pick the schema revision matching a given part count, the only
/// version marker old dumps carry.
pub fn schema_for_part_count(count: usize) -> Option<Schema> {
    load_all_schemas()
        .into_iter()
        .find(|s| s.part_count() == count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn all_revisions_are_present() {
        let schemas = load_all_schemas();
        let counts: Vec<usize> = schemas.iter().map(|s| s.part_count()).collect();
        assert_eq!(counts, vec![9, 14, 15]);
    }

    #[test]
    fn lookup_by_part_count() {
        let schema = schema_for_part_count(14).unwrap();
        assert_eq!(schema.name, "suit-v2");
        assert_eq!(schema.part_name(0), "hat");
        assert_eq!(schema.part_name(13), "shoeR");
        assert_eq!(schema.part_name(99), "unknown");
        assert!(schema_for_part_count(3).is_none());
    }
}
