use crate::model::TableModel;
use crate::table::PrimaryKey;

/// Set differences between typed values and primary keys
pub trait TableModelMethods: TableModel {
    /// Values whose primary key is not among `keys`
    fn left_diff(values: Vec<Self>, keys: &[PrimaryKey]) -> Vec<Self> {
        values
            .into_iter()
            .filter(|value| !keys.contains(&value.primary_key()))
            .collect()
    }

    /// Keys that no value in `values` carries
    fn right_diff(values: &[Self], keys: Vec<PrimaryKey>) -> Vec<PrimaryKey> {
        let value_keys: Vec<PrimaryKey> = values.iter().map(TableModel::primary_key).collect();

        keys.into_iter()
            .filter(|key| !value_keys.contains(key))
            .collect()
    }
}

impl<T> TableModelMethods for T where T: TableModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::KeyValue;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Song {
        artist: String,
        title: String,
    }

    impl TableModel for Song {
        const TABLE: &'static str = "songs";
        const PARTITION_KEY: &'static str = "artist";
        const SORT_KEY: Option<&'static str> = Some("title");

        fn partition_key(&self) -> KeyValue {
            self.artist.as_str().into()
        }

        fn sort_key(&self) -> Option<KeyValue> {
            Some(self.title.as_str().into())
        }
    }

    fn song(artist: &str, title: &str) -> Song {
        Song {
            artist: artist.to_string(),
            title: title.to_string(),
        }
    }

    fn key(artist: &str, title: &str) -> PrimaryKey {
        PrimaryKey::new(artist).with_sort(title)
    }

    #[test]
    fn test_left_diff() {
        let values = vec![
            song("Bowie", "Heroes"),
            song("Bowie", "Low"),
            song("Eno", "Apollo"),
        ];
        let keys = [key("Bowie", "Heroes"), key("Bowie", "Low")];

        let diff = Song::left_diff(values, &keys);
        assert_eq!(diff, vec![song("Eno", "Apollo")]);
    }

    #[test]
    fn test_left_diff_sort_key_matters() {
        let values = vec![song("Bowie", "Heroes")];
        let keys = [PrimaryKey::new("Bowie")];

        assert_eq!(Song::left_diff(values, &keys).len(), 1);
    }

    #[test]
    fn test_right_diff() {
        let values = [song("Bowie", "Heroes")];
        let keys = vec![key("Bowie", "Heroes"), key("Bowie", "Low"), key("Eno", "Apollo")];

        let diff = Song::right_diff(&values, keys);
        assert_eq!(diff, vec![key("Bowie", "Low"), key("Eno", "Apollo")]);
    }

    #[test]
    fn test_right_diff_empty() {
        let values = [song("Bowie", "Heroes")];
        assert!(Song::right_diff(&values, vec![key("Bowie", "Heroes")]).is_empty());
    }
}
