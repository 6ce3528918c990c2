use crate::treewalk::TreewalkValue;

#[derive(Default, Debug, PartialEq, Clone)]
pub struct List {
    items: Vec<TreewalkValue>,
}

impl List {
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

    /// `index` must be in bounds.
    pub fn set(&mut self, index: usize, value: TreewalkValue) {
        self.items[index] = value;
    }

    pub fn append(&mut self, item: TreewalkValue) {
        self.items.push(item)
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = TreewalkValue>) {
        self.items.extend(items)
    }

    /// Insert before `index`, clamping to the ends of the list as Python does.
    pub fn insert(&mut self, index: i64, item: TreewalkValue) {
        let len = self.items.len() as i64;
        let index = if index < 0 { (len + index).max(0) } else { index.min(len) };
        self.items.insert(index as usize, item);
    }

    pub fn remove_at(&mut self, index: usize) -> TreewalkValue {
        self.items.remove(index)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn reverse(&mut self) {
        self.items.reverse();
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

    pub fn replace(&mut self, items: Vec<TreewalkValue>) {
        self.items = items;
    }
}

impl From<Vec<TreewalkValue>> for List {
    fn from(items: Vec<TreewalkValue>) -> Self {
        Self::new(items)
    }
}
