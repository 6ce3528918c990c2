use std::collections::HashMap;

use crate::treewalk::{utils::HashKey, DomainResult, TreewalkValue};

/// An insertion-ordered mapping. Entries live in a vector and the hash index points into it.
#[derive(Default, Debug, Clone)]
pub struct Dict {
    entries: Vec<(TreewalkValue, TreewalkValue)>,
    index: HashMap<HashKey, usize>,
}

impl PartialEq for Dict {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.entries.iter().all(|(key, value)| {
                matches!(other.get(key), Ok(Some(ref other_value)) if other_value == value)
            })
    }
}

impl Dict {
    pub fn from_items(items: Vec<(TreewalkValue, TreewalkValue)>) -> DomainResult<Self> {
        let mut dict = Dict::default();
        for (k, v) in items {
            dict.insert(k, v)?;
        }
        Ok(dict)
    }

    /// Insert or overwrite. An overwritten key keeps its original position.
    pub fn insert(&mut self, key: TreewalkValue, value: TreewalkValue) -> DomainResult<()> {
        let hashed = HashKey::try_from(&key)?;
        match self.index.get(&hashed) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(hashed, self.entries.len());
                self.entries.push((key, value));
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &TreewalkValue) -> DomainResult<Option<TreewalkValue>> {
        let hashed = HashKey::try_from(key)?;
        Ok(self.index.get(&hashed).map(|&i| self.entries[i].1.clone()))
    }

    pub fn get_str(&self, key: &str) -> Option<TreewalkValue> {
        self.index
            .get(&HashKey::Str(key.to_string()))
            .map(|&i| self.entries[i].1.clone())
    }

    pub fn contains(&self, key: &TreewalkValue) -> DomainResult<bool> {
        Ok(self.index.contains_key(&HashKey::try_from(key)?))
    }

    pub fn remove(&mut self, key: &TreewalkValue) -> DomainResult<Option<TreewalkValue>> {
        let hashed = HashKey::try_from(key)?;
        let Some(position) = self.index.remove(&hashed) else {
            return Ok(None);
        };
        let (_, value) = self.entries.remove(position);
        for i in self.index.values_mut() {
            if *i > position {
                *i -= 1;
            }
        }
        Ok(Some(value))
    }

    pub fn pop_last(&mut self) -> Option<(TreewalkValue, TreewalkValue)> {
        let (key, value) = self.entries.pop()?;
        if let Ok(hashed) = HashKey::try_from(&key) {
            self.index.remove(&hashed);
        }
        Some((key, value))
    }

    pub fn extend(&mut self, other: &Dict) -> DomainResult<()> {
        for (key, value) in other.iter() {
            self.insert(key.clone(), value.clone())?;
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TreewalkValue, &TreewalkValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> Vec<TreewalkValue> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn values(&self) -> Vec<TreewalkValue> {
        self.entries.iter().map(|(_, v)| v.clone()).collect()
    }

    pub fn items(&self) -> Vec<(TreewalkValue, TreewalkValue)> {
        self.entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(value: &str) -> TreewalkValue {
        TreewalkValue::Str(value.to_string())
    }

    #[test]
    fn insertion_order() {
        let mut dict = Dict::default();
        dict.insert(s("b"), TreewalkValue::Int(1)).unwrap();
        dict.insert(s("a"), TreewalkValue::Int(2)).unwrap();
        dict.insert(s("b"), TreewalkValue::Int(3)).unwrap();

        assert_eq!(dict.keys(), vec![s("b"), s("a")]);
        assert_eq!(dict.get(&s("b")).unwrap(), Some(TreewalkValue::Int(3)));
    }

    #[test]
    fn remove_reindexes() {
        let mut dict = Dict::from_items(vec![
            (s("a"), TreewalkValue::Int(1)),
            (s("b"), TreewalkValue::Int(2)),
            (s("c"), TreewalkValue::Int(3)),
        ])
        .unwrap();

        assert_eq!(dict.remove(&s("a")).unwrap(), Some(TreewalkValue::Int(1)));
        assert_eq!(dict.get(&s("c")).unwrap(), Some(TreewalkValue::Int(3)));
        assert_eq!(dict.remove(&s("a")).unwrap(), None);
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn unhashable_key() {
        let mut dict = Dict::default();
        let e = dict
            .insert(TreewalkValue::new_list(vec![]), TreewalkValue::None)
            .unwrap_err();
        assert_eq!(e.message(), "unhashable type: 'list'");
    }
}
