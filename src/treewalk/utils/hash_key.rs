use crate::treewalk::{types::Exception, DomainResult, TreewalkValue};

/// The hashable projection of a value, used to index dicts. Values that compare equal in Python
/// produce equal keys, so `1`, `1.0` and `True` collide the way they do in CPython.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    None,
    Ellipsis,
    Int(i64),
    Float(u64),
    Str(String),
    Bytes(Vec<u8>),
    Tuple(Vec<HashKey>),
    Identity(usize),
}

impl TryFrom<&TreewalkValue> for HashKey {
    type Error = Exception;

    fn try_from(value: &TreewalkValue) -> DomainResult<Self> {
        let key = match value {
            TreewalkValue::None => HashKey::None,
            TreewalkValue::Ellipsis => HashKey::Ellipsis,
            TreewalkValue::Bool(b) => HashKey::Int(*b as i64),
            TreewalkValue::Int(i) => HashKey::Int(*i),
            TreewalkValue::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                HashKey::Int(*f as i64)
            }
            TreewalkValue::Float(f) => HashKey::Float(f.to_bits()),
            TreewalkValue::Str(s) => HashKey::Str(s.clone()),
            TreewalkValue::Bytes(b) => HashKey::Bytes(b.clone()),
            TreewalkValue::Tuple(t) => HashKey::Tuple(
                t.iter()
                    .map(HashKey::try_from)
                    .collect::<DomainResult<Vec<_>>>()?,
            ),
            TreewalkValue::List(_) | TreewalkValue::Dict(_) | TreewalkValue::Slice(_) => {
                return Err(Exception::type_error_unhashable(&value.type_name()))
            }
            other => HashKey::Identity(other.identity()),
        };
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_keys_collide() {
        let one = HashKey::try_from(&TreewalkValue::Int(1)).unwrap();
        assert_eq!(HashKey::try_from(&TreewalkValue::Float(1.0)).unwrap(), one);
        assert_eq!(HashKey::try_from(&TreewalkValue::Bool(true)).unwrap(), one);
        assert_ne!(HashKey::try_from(&TreewalkValue::Float(1.5)).unwrap(), one);
    }

    #[test]
    fn unhashable() {
        let list = TreewalkValue::new_list(vec![]);
        let e = HashKey::try_from(&list).unwrap_err();
        assert_eq!(e.message(), "unhashable type: 'list'");
    }
}
