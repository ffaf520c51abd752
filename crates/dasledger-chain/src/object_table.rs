//! Typed object tables.
//!
//! Each table owns the objects of one kind, keyed by a sequential id. Ids
//! are never reused, so a removed object's id keeps resolving to
//! `UnknownObject`.

use std::collections::BTreeMap;

use dasledger_types::{LedgerError, ObjectId, ObjectInstance, Result};

#[derive(Debug, Clone)]
pub struct ObjectTable<K, V> {
    objects: BTreeMap<K, V>,
    next_instance: u64,
}

impl<K, V> Default for ObjectTable<K, V> {
    fn default() -> Self {
        Self {
            objects: BTreeMap::new(),
            next_instance: 0,
        }
    }
}

impl<K, V> ObjectTable<K, V>
where
    K: ObjectInstance + Into<ObjectId>,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next `create` will assign.
    #[must_use]
    pub fn next_id(&self) -> K {
        K::from_instance(self.next_instance)
    }

    /// Create an object under a fresh id built by `init`.
    pub fn create(&mut self, init: impl FnOnce(K) -> V) -> K {
        let id = self.next_id();
        self.next_instance += 1;
        self.objects.insert(id, init(id));
        id
    }

    pub fn get(&self, id: K) -> Result<&V> {
        self.objects
            .get(&id)
            .ok_or_else(|| LedgerError::UnknownObject(id.into()))
    }

    /// Mutate an existing object in place.
    pub fn modify<T>(&mut self, id: K, f: impl FnOnce(&mut V) -> T) -> Result<T> {
        self.objects
            .get_mut(&id)
            .map(f)
            .ok_or_else(|| LedgerError::UnknownObject(id.into()))
    }

    pub fn remove(&mut self, id: K) -> Result<V> {
        self.objects
            .remove(&id)
            .ok_or_else(|| LedgerError::UnknownObject(id.into()))
    }

    /// Put a removed object back under its old id.
    pub(crate) fn restore(&mut self, id: K, object: V) {
        self.objects.insert(id, object);
    }

    /// Undo the most recent `create`, handing its id out again.
    pub(crate) fn rewind(&mut self, id: K) -> Result<V> {
        let object = self.remove(id)?;
        self.next_instance = id.instance();
        Ok(object)
    }

    /// All objects in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.objects.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use dasledger_types::AccountId;

    use super::*;

    #[test]
    fn ids_are_sequential_and_never_reused() {
        let mut table: ObjectTable<AccountId, &str> = ObjectTable::new();
        let a = table.create(|_| "a");
        let b = table.create(|_| "b");
        assert_eq!((a, b), (AccountId(0), AccountId(1)));

        table.remove(a).unwrap();
        let c = table.create(|_| "c");
        assert_eq!(c, AccountId(2));
        assert!(matches!(
            table.get(a),
            Err(LedgerError::UnknownObject(ObjectId::Account(AccountId(0))))
        ));
    }

    #[test]
    fn modify_in_place() {
        let mut table: ObjectTable<AccountId, i64> = ObjectTable::new();
        let id = table.create(|_| 1);
        let doubled = table.modify(id, |v| {
            *v *= 2;
            *v
        });
        assert_eq!(doubled.unwrap(), 2);
        assert!(table.modify(AccountId(9), |_| ()).is_err());
    }

    #[test]
    fn rewind_reissues_the_id_and_restore_revives_it() {
        let mut table: ObjectTable<AccountId, &str> = ObjectTable::new();
        let a = table.create(|_| "a");
        let b = table.create(|_| "b");
        assert_eq!(table.rewind(b).unwrap(), "b");
        assert_eq!(table.next_id(), b);

        let gone = table.remove(a).unwrap();
        table.restore(a, gone);
        assert_eq!(*table.get(a).unwrap(), "a");
        assert_eq!(table.create(|_| "c"), b);
    }

    #[test]
    fn init_sees_its_own_id() {
        let mut table: ObjectTable<AccountId, AccountId> = ObjectTable::new();
        let id = table.create(|id| id);
        assert_eq!(*table.get(id).unwrap(), id);
        assert_eq!(table.len(), 1);
    }
}
