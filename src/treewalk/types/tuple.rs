use crate::treewalk::TreewalkValue;

#[derive(Default, Debug, PartialEq, Clone)]
pub struct Tuple {
    items: Vec<TreewalkValue>,
}

impl Tuple {
    pub fn new(items: Vec<TreewalkValue>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<TreewalkValue> {
        self.items.get(index).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TreewalkValue> {
        self.items.iter()
    }

    pub fn items(&self) -> &[TreewalkValue] {
        &self.items
    }

    pub fn to_vec(&self) -> Vec<TreewalkValue> {
        self.items.clone()
    }
}

impl From<Vec<TreewalkValue>> for Tuple {
    fn from(items: Vec<TreewalkValue>) -> Self {
        Self::new(items)
    }
}
