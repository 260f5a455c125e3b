//! Lookups memoized for the lifetime of a single operation.
//!
//! A context is created at the start of a service call and dropped when it returns, so two
//! operations never share cached rows.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;

use super::accounts::{display_name, Account, UserId};
use super::offers::domain::{Offer, OfferId};
use super::store::{MarketplaceStore, RepositoryError};

/// Argument-keyed cache; failed lookups are not cached.
#[derive(Debug)]
pub struct Memo<K, V> {
    entries: RefCell<HashMap<K, V>>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Memo<K, V> {
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &K,
        load: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.entries.borrow().get(key) {
            return Ok(value.clone());
        }
        let value = load()?;
        self.entries.borrow_mut().insert(key.clone(), value.clone());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

pub struct OperationContext<'a, S: ?Sized> {
    store: &'a S,
    accounts: Memo<UserId, Option<Account>>,
    offers: Memo<OfferId, Option<Offer>>,
}

impl<'a, S: MarketplaceStore + ?Sized> OperationContext<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            accounts: Memo::default(),
            offers: Memo::default(),
        }
    }

    pub fn account(&self, id: &UserId) -> Result<Option<Account>, RepositoryError> {
        self.accounts
            .get_or_try_insert_with(id, || self.store.account(id))
    }

    pub fn offer(&self, id: &OfferId) -> Result<Option<Offer>, RepositoryError> {
        self.offers.get_or_try_insert_with(id, || self.store.fetch_offer(id))
    }

    pub fn display_name(&self, id: &UserId) -> Result<String, RepositoryError> {
        Ok(display_name(self.account(id)?.as_ref(), id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::accounts::UserRole;
    use crate::marketplace::store::InMemoryMarketplaceStore;
    use std::cell::Cell;

    #[test]
    fn memo_loads_each_key_once() {
        let memo: Memo<&'static str, u32> = Memo::default();
        let calls = Cell::new(0);
        for _ in 0..3 {
            let value = memo
                .get_or_try_insert_with(&"a", || {
                    calls.set(calls.get() + 1);
                    Ok::<_, ()>(7)
                })
                .expect("loads");
            assert_eq!(value, 7);
        }
        assert_eq!(calls.get(), 1);
        assert_eq!(memo.len(), 1);
    }

    #[test]
    fn memo_does_not_cache_failures() {
        let memo: Memo<u8, u8> = Memo::default();
        assert!(memo.get_or_try_insert_with(&1, || Err("down")).is_err());
        assert!(memo.is_empty());
        assert_eq!(memo.get_or_try_insert_with(&1, || Ok::<_, &str>(2)), Ok(2));
    }

    #[test]
    fn context_names_known_and_unknown_accounts() {
        let store = InMemoryMarketplaceStore::new();
        store
            .upsert_account(Account::new("store-1", UserRole::Store, "Epicerie du Port"))
            .expect("seed");
        let context = OperationContext::new(&store);
        assert_eq!(
            context.display_name(&UserId::new("store-1")).expect("lookup"),
            "Epicerie du Port"
        );
        assert_eq!(
            context.display_name(&UserId::new("ghost")).expect("lookup"),
            "ghost"
        );
    }
}
