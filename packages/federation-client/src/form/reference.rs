use std::collections::HashMap;

/// Lookup tables for derived fields: source field → selected value → derived value.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    tables: HashMap<String, HashMap<String, String>>,
}

/// A club in the fixed reference list, with the federation it belongs to.
#[derive(Debug, Clone)]
pub struct ClubReference {
    pub id: String,
    pub name: String,
    pub federation_name: String,
}

impl ReferenceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(
        mut self,
        source_field: impl Into<String>,
        key: impl Into<String>,
        derived: impl Into<String>,
    ) -> Self {
        self.insert(source_field, key, derived);
        self
    }

    pub fn insert(
        &mut self,
        source_field: impl Into<String>,
        key: impl Into<String>,
        derived: impl Into<String>,
    ) {
        self.tables
            .entry(source_field.into())
            .or_default()
            .insert(key.into(), derived.into());
    }

    /// Club list keyed for the member profile's `parent_club_id → federation_name`.
    pub fn from_clubs(clubs: impl IntoIterator<Item = ClubReference>) -> Self {
        let mut data = Self::new();
        for club in clubs {
            data.insert("parent_club_id", club.id, club.federation_name);
        }
        data
    }

    pub fn lookup(&self, source_field: &str, key: &str) -> Option<&str> {
        self.tables
            .get(source_field)?
            .get(key.trim())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_source_and_key() {
        let data = ReferenceData::from_clubs([ClubReference {
            id: "12".into(),
            name: "Club Deportivo Quito".into(),
            federation_name: "Federación Deportiva de Pichincha".into(),
        }]);

        assert_eq!(
            data.lookup("parent_club_id", " 12 "),
            Some("Federación Deportiva de Pichincha")
        );
        assert_eq!(data.lookup("parent_club_id", "13"), None);
        assert_eq!(data.lookup("parent_league_id", "12"), None);
    }
}
