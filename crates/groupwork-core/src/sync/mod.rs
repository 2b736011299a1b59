//! Optimistic client-side synchronization.
//!
//! [`OptimisticCollection`] applies a mutation to the local view before the
//! backend confirms it, then either reconciles with the authoritative record
//! or rolls back. Readers observe the collection through a `watch` channel,
//! so the optimistic state is visible while the remote call is in flight.
//!
//! Every mutation path rolls back on failure, including task board moves.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::api::{ApiError, ApiResult};

/// An entity with a stable identity inside a collection.
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Clone + Eq + fmt::Display + Send + Sync;

    fn id(&self) -> &Self::Id;
}

/// Accessor pair for the single field a mutation changes.
pub struct Field<T, V> {
    name: &'static str,
    get: fn(&T) -> V,
    set: fn(&mut T, V),
}

impl<T, V> Field<T, V> {
    pub const fn new(name: &'static str, get: fn(&T) -> V, set: fn(&mut T, V)) -> Self {
        Self { name, get, set }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T, V> Clone for Field<T, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, V> Copy for Field<T, V> {}

/// How a mutation ended.
#[derive(Debug)]
pub enum MutationOutcome<T> {
    /// Nothing to do: the target was absent or the request was a no-op.
    /// No remote call was issued.
    Skipped,
    /// The backend acknowledged without a body; the optimistic value stands.
    Confirmed,
    /// The backend returned the authoritative record, which replaced ours.
    Reconciled(T),
    /// The remote call failed and local state was restored.
    RolledBack(ApiError),
}

impl<T> MutationOutcome<T> {
    /// Whether the change is now part of local state.
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Reconciled(_))
    }

    pub const fn error(&self) -> Option<&ApiError> {
        match self {
            Self::RolledBack(error) => Some(error),
            _ => None,
        }
    }
}

/// Observable in-memory collection with optimistic mutations.
pub struct OptimisticCollection<T> {
    state: Arc<watch::Sender<Vec<T>>>,
}

impl<T> Clone for OptimisticCollection<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Entity> Default for OptimisticCollection<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: Entity> OptimisticCollection<T> {
    pub fn new(items: Vec<T>) -> Self {
        let (state, _) = watch::channel(items);
        Self {
            state: Arc::new(state),
        }
    }

    /// Current contents.
    pub fn snapshot(&self) -> Vec<T> {
        self.state.borrow().clone()
    }

    pub fn get(&self, id: &T::Id) -> Option<T> {
        self.state.borrow().iter().find(|item| item.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    /// Count entities matching a predicate without cloning.
    pub fn count_where(&self, predicate: impl Fn(&T) -> bool) -> usize {
        self.state.borrow().iter().filter(|item| predicate(item)).count()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<T>> {
        self.state.subscribe()
    }

    /// Install a freshly fetched collection.
    pub fn replace_all(&self, items: Vec<T>) {
        self.state.send_replace(items);
    }

    /// Append an entity confirmed by the backend.
    pub fn push(&self, item: T) {
        self.state.send_modify(|items| items.push(item));
    }

    /// Optimistically set one field on one entity.
    ///
    /// On failure only that field of that entity is restored; everything
    /// else, including ordering, is left as it is at that moment.
    pub async fn mutate_one<V, F, Fut>(
        &self,
        id: &T::Id,
        field: Field<T, V>,
        value: V,
        remote: F,
    ) -> MutationOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<Option<T>>>,
    {
        let mut previous = None;
        self.state.send_if_modified(|items| {
            let Some(item) = items.iter_mut().find(|item| item.id() == id) else {
                return false;
            };
            previous = Some((field.get)(item));
            (field.set)(item, value);
            true
        });

        let Some(previous) = previous else {
            tracing::debug!("Skipping {} update for absent entity {id}", field.name);
            return MutationOutcome::Skipped;
        };

        let rollback = Rollback::new(&self.state, move |items: &mut Vec<T>| {
            items
                .iter_mut()
                .find(|item| item.id() == id)
                .map(|item| (field.set)(item, previous))
                .is_some()
        });

        match remote().await {
            Ok(Some(record)) => {
                rollback.disarm();
                self.replace_record(id, record.clone());
                MutationOutcome::Reconciled(record)
            }
            Ok(None) => {
                rollback.disarm();
                MutationOutcome::Confirmed
            }
            Err(error) => {
                tracing::warn!(
                    "Rolling back {} on {id} after failed update: {error}",
                    field.name
                );
                rollback.restore();
                MutationOutcome::RolledBack(error)
            }
        }
    }

    /// Optimistically set one field on every entity matching `predicate`.
    ///
    /// On failure the whole pre-mutation collection is restored verbatim.
    pub async fn mutate_all<V, P, F, Fut>(
        &self,
        predicate: P,
        field: Field<T, V>,
        value: V,
        remote: F,
    ) -> MutationOutcome<Vec<T>>
    where
        V: Clone,
        P: Fn(&T) -> bool,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<Option<Vec<T>>>>,
    {
        let snapshot = self.snapshot();
        self.state.send_if_modified(|items| {
            let mut changed = false;
            for item in items.iter_mut().filter(|item| predicate(item)) {
                (field.set)(item, value.clone());
                changed = true;
            }
            changed
        });

        let restored = snapshot.len();
        let rollback = Rollback::new(&self.state, move |items: &mut Vec<T>| {
            *items = snapshot;
            true
        });

        match remote().await {
            Ok(Some(records)) => {
                rollback.disarm();
                self.replace_all(records.clone());
                MutationOutcome::Reconciled(records)
            }
            Ok(None) => {
                rollback.disarm();
                MutationOutcome::Confirmed
            }
            Err(error) => {
                tracing::warn!(
                    "Restoring {restored} entities after failed bulk {} update: {error}",
                    field.name
                );
                rollback.restore();
                MutationOutcome::RolledBack(error)
            }
        }
    }

    /// Optimistically remove one entity; on failure it is re-inserted at its
    /// original position.
    pub async fn remove_one<F, Fut>(&self, id: &T::Id, remote: F) -> MutationOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<()>>,
    {
        let mut removed = None;
        self.state.send_if_modified(|items| {
            let Some(index) = items.iter().position(|item| item.id() == id) else {
                return false;
            };
            removed = Some((index, items.remove(index)));
            true
        });

        let Some((index, item)) = removed else {
            tracing::debug!("Skipping removal of absent entity {id}");
            return MutationOutcome::Skipped;
        };

        let rollback = Rollback::new(&self.state, move |items: &mut Vec<T>| {
            let index = index.min(items.len());
            items.insert(index, item);
            true
        });

        match remote().await {
            Ok(()) => {
                rollback.disarm();
                MutationOutcome::Confirmed
            }
            Err(error) => {
                tracing::warn!("Restoring {id} after failed removal: {error}");
                rollback.restore();
                MutationOutcome::RolledBack(error)
            }
        }
    }

    fn replace_record(&self, id: &T::Id, record: T) {
        self.state.send_if_modified(|items| {
            items
                .iter_mut()
                .find(|item| item.id() == id)
                .map(|item| *item = record)
                .is_some()
        });
    }
}

/// Undo for an optimistic write.
///
/// Restores on drop unless disarmed: a mutation future dropped before the
/// backend answers leaves the collection in its pre-mutation state.
struct Rollback<'a, T, F>
where
    F: FnOnce(&mut Vec<T>) -> bool,
{
    state: &'a watch::Sender<Vec<T>>,
    undo: Option<F>,
}

impl<'a, T, F> Rollback<'a, T, F>
where
    F: FnOnce(&mut Vec<T>) -> bool,
{
    fn new(state: &'a watch::Sender<Vec<T>>, undo: F) -> Self {
        Self {
            state,
            undo: Some(undo),
        }
    }

    /// The remote call settled; keep the current state.
    fn disarm(mut self) {
        self.undo = None;
    }

    fn restore(mut self) {
        if let Some(undo) = self.undo.take() {
            self.state.send_if_modified(undo);
        }
    }
}

impl<T, F> Drop for Rollback<'_, T, F>
where
    F: FnOnce(&mut Vec<T>) -> bool,
{
    fn drop(&mut self) {
        if let Some(undo) = self.undo.take() {
            tracing::debug!("Mutation cancelled before the backend answered; restoring");
            self.state.send_if_modified(undo);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::pending;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use tokio::time::timeout;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Item {
        id: u32,
        done: bool,
        revision: u32,
    }

    impl Entity for Item {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.id
        }
    }

    fn done_field() -> Field<Item, bool> {
        Field::new(
            "done",
            |item: &Item| item.done,
            |item: &mut Item, done| item.done = done,
        )
    }

    fn items() -> Vec<Item> {
        (1..=3)
            .map(|id| Item {
                id,
                done: false,
                revision: 0,
            })
            .collect()
    }

    fn failure() -> ApiError {
        ApiError::Rejected("boom".to_string())
    }

    #[tokio::test]
    async fn failed_single_mutation_restores_target_only() {
        let collection = OptimisticCollection::new(items());
        let before = collection.snapshot();

        let outcome = collection
            .mutate_one(&2, done_field(), true, || async { Err(failure()) })
            .await;

        assert!(matches!(outcome, MutationOutcome::RolledBack(_)));
        assert_eq!(collection.snapshot(), before);
    }

    #[tokio::test]
    async fn optimistic_value_is_visible_while_in_flight() {
        let collection = OptimisticCollection::new(items());
        let observer = collection.clone();

        let outcome = collection
            .mutate_one(&1, done_field(), true, || async move {
                assert!(observer.get(&1).unwrap().done);
                assert!(!observer.get(&2).unwrap().done);
                Ok(None)
            })
            .await;

        assert!(matches!(outcome, MutationOutcome::Confirmed));
        assert!(collection.get(&1).unwrap().done);
    }

    #[tokio::test]
    async fn authoritative_record_replaces_whole_entity() {
        let collection = OptimisticCollection::new(items());
        let server = Item {
            id: 3,
            done: true,
            revision: 7,
        };

        let outcome = collection
            .mutate_one(&3, done_field(), true, || {
                let server = server.clone();
                async move { Ok(Some(server)) }
            })
            .await;

        assert!(matches!(outcome, MutationOutcome::Reconciled(_)));
        assert_eq!(collection.get(&3), Some(server));
        assert_eq!(collection.get(&1).unwrap().revision, 0);
    }

    #[tokio::test]
    async fn absent_target_is_skipped_without_remote_call() {
        let collection = OptimisticCollection::new(items());
        let calls = AtomicUsize::new(0);

        let outcome = collection
            .mutate_one(&99, done_field(), true, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(None) }
            })
            .await;

        assert!(matches!(outcome, MutationOutcome::Skipped));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(collection.snapshot(), items());
    }

    #[tokio::test]
    async fn failed_bulk_mutation_restores_snapshot() {
        let mut initial = items();
        initial[1].done = true;
        let collection = OptimisticCollection::new(initial.clone());

        let outcome = collection
            .mutate_all(|item| !item.done, done_field(), true, || async {
                Err(failure())
            })
            .await;

        assert!(outcome.error().is_some());
        assert_eq!(collection.snapshot(), initial);
    }

    #[tokio::test]
    async fn bulk_mutation_without_body_keeps_optimistic_state() {
        let collection = OptimisticCollection::new(items());

        let outcome = collection
            .mutate_all(|item| !item.done, done_field(), true, || async { Ok(None) })
            .await;

        assert!(outcome.is_applied());
        assert_eq!(collection.count_where(|item| item.done), 3);
    }

    #[tokio::test]
    async fn failed_removal_reinserts_at_original_index() {
        let collection = OptimisticCollection::new(items());

        let outcome = collection
            .remove_one(&2, || async { Err(failure()) })
            .await;

        assert!(matches!(outcome, MutationOutcome::RolledBack(_)));
        assert_eq!(collection.snapshot(), items());
    }

    #[tokio::test]
    async fn confirmed_removal_drops_entity() {
        let collection = OptimisticCollection::new(items());

        let outcome = collection.remove_one(&1, || async { Ok(()) }).await;

        assert!(outcome.is_applied());
        let ids: Vec<u32> = collection.snapshot().iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_single_mutation_restores_field() {
        let collection = OptimisticCollection::new(items());

        let result = timeout(
            Duration::from_millis(20),
            collection.mutate_one(&1, done_field(), true, pending::<ApiResult<Option<Item>>>),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(collection.snapshot(), items());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_bulk_mutation_restores_snapshot() {
        let collection = OptimisticCollection::new(items());

        let result = timeout(
            Duration::from_millis(20),
            collection.mutate_all(
                |item| !item.done,
                done_field(),
                true,
                pending::<ApiResult<Option<Vec<Item>>>>,
            ),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(collection.snapshot(), items());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_removal_reinserts_entity() {
        let collection = OptimisticCollection::new(items());
        let observer = collection.clone();

        let task = tokio::spawn(async move {
            observer.remove_one(&2, pending::<ApiResult<()>>).await
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(collection.len(), 2);

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        assert_eq!(collection.snapshot(), items());
    }

    #[tokio::test]
    async fn settled_mutation_is_not_undone_on_drop() {
        let collection = OptimisticCollection::new(items());

        let outcome = collection
            .mutate_one(&1, done_field(), true, || async { Ok(None) })
            .await;
        assert!(outcome.is_applied());
        assert!(collection.get(&1).unwrap().done);
    }

    #[tokio::test]
    async fn subscribers_are_notified_of_optimistic_change() {
        let collection = OptimisticCollection::new(items());
        let mut receiver = collection.subscribe();
        receiver.borrow_and_update();

        collection
            .mutate_one(&1, done_field(), true, || async { Ok(None) })
            .await;

        assert!(receiver.has_changed().unwrap());
    }
}
