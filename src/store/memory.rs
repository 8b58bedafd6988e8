//! In-memory entity store
//!
//! Reference implementation of [`TwinStore`] used by tests, benchmarks and the
//! demo binary. Layout follows an adjacency-list graph store:
//! - twins: TwinId -> Twin (insertion ordered, so paging is stable)
//! - relationships: RelationshipId -> Relationship
//! - outgoing / incoming: TwinId -> Vec<RelationshipId>
//! - model_index: ModelId -> twins of exactly that model
//! - model_extends: ModelId -> direct base models, for non-exact model matching
//!
//! Relationships are not validated on insert: a relationship may point at a
//! twin that does not exist, which is how dangling edges are reproduced.

use super::{ModelQuery, Page, StoreError, StoreResult, TwinStore};
use crate::graph::relation;
use crate::traversal::CancellationToken;
use crate::twin::{ModelId, Relationship, RelationshipId, Twin, TwinId};
use async_trait::async_trait;
use indexmap::{IndexMap, IndexSet};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

/// Number of calls served per store operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCallCounts {
    pub get_twin: usize,
    pub get_twins_by_ids: usize,
    pub get_twins_by_model: usize,
    pub outgoing: usize,
    pub incoming: usize,
}

impl StoreCallCounts {
    pub fn total(&self) -> usize {
        self.get_twin
            + self.get_twins_by_ids
            + self.get_twins_by_model
            + self.outgoing
            + self.incoming
    }
}

#[derive(Debug, Default)]
struct CallCounters {
    get_twin: AtomicUsize,
    get_twins_by_ids: AtomicUsize,
    get_twins_by_model: AtomicUsize,
    outgoing: AtomicUsize,
    incoming: AtomicUsize,
}

impl CallCounters {
    fn snapshot(&self) -> StoreCallCounts {
        StoreCallCounts {
            get_twin: self.get_twin.load(Ordering::Relaxed),
            get_twins_by_ids: self.get_twins_by_ids.load(Ordering::Relaxed),
            get_twins_by_model: self.get_twins_by_model.load(Ordering::Relaxed),
            outgoing: self.outgoing.load(Ordering::Relaxed),
            incoming: self.incoming.load(Ordering::Relaxed),
        }
    }
}

/// In-memory twin and relationship storage
#[derive(Debug, Default)]
pub struct InMemoryTwinStore {
    twins: IndexMap<TwinId, Twin>,
    relationships: IndexMap<RelationshipId, Relationship>,
    outgoing: HashMap<TwinId, Vec<RelationshipId>>,
    incoming: HashMap<TwinId, Vec<RelationshipId>>,
    model_index: HashMap<ModelId, IndexSet<TwinId>>,
    model_extends: HashMap<ModelId, Vec<ModelId>>,

    /// Twins whose relationship lookups fail with `Unavailable`
    failures: HashMap<TwinId, String>,
    latency: Option<Duration>,
    cancel: Option<CancellationToken>,
    calls: CallCounters,
}

impl InMemoryTwinStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a twin, returning the previous version
    pub fn add_twin(&mut self, twin: Twin) -> Option<Twin> {
        let previous = self.twins.insert(twin.id.clone(), twin.clone());
        if let Some(old) = &previous {
            if let Some(ids) = self.model_index.get_mut(&old.model_id) {
                ids.shift_remove(&old.id);
            }
        }
        self.model_index
            .entry(twin.model_id.clone())
            .or_default()
            .insert(twin.id);
        previous
    }

    /// Insert a relationship; endpoints are not required to exist
    pub fn add_relationship(&mut self, relationship: Relationship) {
        if let Some(old) = self.relationships.shift_remove(&relationship.id) {
            self.unlink(&old);
        }
        self.outgoing
            .entry(relationship.source_id.clone())
            .or_default()
            .push(relationship.id.clone());
        self.incoming
            .entry(relationship.target_id.clone())
            .or_default()
            .push(relationship.id.clone());
        self.relationships.insert(relationship.id.clone(), relationship);
    }

    /// Insert a relationship with a generated id (`{source}-{name}-{target}`)
    pub fn relate(
        &mut self,
        source: impl Into<TwinId>,
        name: &str,
        target: impl Into<TwinId>,
    ) -> RelationshipId {
        let source = source.into();
        let target = target.into();
        let id = RelationshipId::new(format!("{}-{}-{}", source, name, target));
        self.add_relationship(Relationship::new(id.clone(), source, name, target));
        id
    }

    /// Remove a relationship by id
    pub fn remove_relationship(&mut self, id: &RelationshipId) -> Option<Relationship> {
        let removed = self.relationships.shift_remove(id)?;
        self.unlink(&removed);
        Some(removed)
    }

    /// Declare that `model` extends `base` (used by non-exact model queries)
    pub fn add_model_extends(&mut self, model: impl Into<ModelId>, base: impl Into<ModelId>) {
        let bases = self.model_extends.entry(model.into()).or_default();
        let base = base.into();
        if !bases.contains(&base) {
            bases.push(base);
        }
    }

    /// Make every store call touching `twin_id` fail with `Unavailable`
    pub fn fail_on(&mut self, twin_id: impl Into<TwinId>, message: impl Into<String>) {
        self.failures.insert(twin_id.into(), message.into());
    }

    /// Delay every store call, letting concurrent callers interleave
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail calls with `Cancelled` once `token` is cancelled, including calls
    /// still waiting out their latency
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn twin_count(&self) -> usize {
        self.twins.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn contains_twin(&self, id: &TwinId) -> bool {
        self.twins.contains_key(id)
    }

    /// Snapshot of how many calls each operation has served
    pub fn call_counts(&self) -> StoreCallCounts {
        self.calls.snapshot()
    }

    fn unlink(&mut self, relationship: &Relationship) {
        if let Some(ids) = self.outgoing.get_mut(&relationship.source_id) {
            ids.retain(|id| id != &relationship.id);
        }
        if let Some(ids) = self.incoming.get_mut(&relationship.target_id) {
            ids.retain(|id| id != &relationship.id);
        }
    }

    async fn enter(&self, counter: &AtomicUsize, twin_id: Option<&TwinId>) -> StoreResult<()> {
        counter.fetch_add(1, Ordering::Relaxed);

        if let Some(latency) = self.latency {
            match &self.cancel {
                Some(token) => {
                    tokio::select! {
                        _ = token.cancelled() => return Err(StoreError::Cancelled),
                        _ = tokio::time::sleep(latency) => {}
                    }
                }
                None => tokio::time::sleep(latency).await,
            }
        }
        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Err(StoreError::Cancelled);
        }
        if let Some(message) = twin_id.and_then(|id| self.failures.get(id)) {
            return Err(StoreError::Unavailable(message.clone()));
        }
        Ok(())
    }

    /// `model` equals `target` or transitively extends it
    fn model_matches(&self, model: &ModelId, target: &ModelId) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![model];

        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(bases) = self.model_extends.get(current) {
                stack.extend(bases.iter());
            }
        }
        false
    }

    /// `twin` is `location` or is contained in it through physical relationships
    fn is_within(&self, twin: &TwinId, location: &TwinId) -> bool {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([twin]);

        while let Some(current) = queue.pop_front() {
            if current == location {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            for rel_id in self.outgoing.get(current).into_iter().flatten() {
                if let Some(rel) = self.relationships.get(rel_id) {
                    if relation::is_physical_containment(&rel.name) {
                        queue.push_back(&rel.target_id);
                    }
                }
            }
        }
        false
    }

    /// Twins of the queried models, in store insertion order
    ///
    /// Candidates come from the model index: the queried ids themselves for an
    /// exact match, otherwise every indexed model extending one of them.
    fn matching_twins(&self, query: &ModelQuery) -> Vec<&Twin> {
        let mut positions: Vec<usize> = self
            .model_index
            .iter()
            .filter(|(model, _)| {
                query.model_ids.iter().any(|target| {
                    if query.exact_match {
                        *model == target
                    } else {
                        self.model_matches(model, target)
                    }
                })
            })
            .flat_map(|(_, ids)| ids.iter())
            .filter_map(|id| self.twins.get_index_of(id))
            .collect();
        positions.sort_unstable();

        positions
            .into_iter()
            .filter_map(|position| self.twins.get_index(position).map(|(_, twin)| twin))
            .filter(|twin| match &query.location_id {
                Some(location) => self.is_within(&twin.id, location),
                None => true,
            })
            .collect()
    }

    fn relationships_for(
        &self,
        index: &HashMap<TwinId, Vec<RelationshipId>>,
        twin_id: &TwinId,
    ) -> Vec<Relationship> {
        index
            .get(twin_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.relationships.get(id))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TwinStore for InMemoryTwinStore {
    async fn get_twin(&self, id: &TwinId) -> StoreResult<Twin> {
        self.enter(&self.calls.get_twin, Some(id)).await?;
        self.twins
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn get_twins_by_ids(&self, ids: &[TwinId]) -> StoreResult<Page<Twin>> {
        self.enter(&self.calls.get_twins_by_ids, None).await?;
        let mut unique = HashSet::new();
        let twins = ids
            .iter()
            .filter(|id| unique.insert(*id))
            .filter_map(|id| self.twins.get(id))
            .cloned()
            .collect();
        Ok(Page::last(twins))
    }

    async fn get_twins_by_model(
        &self,
        query: &ModelQuery,
        continuation_token: Option<&str>,
    ) -> StoreResult<Page<Twin>> {
        self.enter(&self.calls.get_twins_by_model, None).await?;

        let offset = match continuation_token {
            Some(token) => token.parse::<usize>().map_err(|_| {
                StoreError::Unavailable(format!("invalid continuation token: {}", token))
            })?,
            None => 0,
        };
        let page_size = query.page_size.max(1);
        let matching = self.matching_twins(query);
        let end = (offset + page_size).min(matching.len());
        let content: Vec<Twin> = matching
            .get(offset..end)
            .unwrap_or_default()
            .iter()
            .map(|twin| (*twin).clone())
            .collect();
        let continuation_token = (end < matching.len()).then(|| end.to_string());

        debug!(
            "Model query {:?} returned {} twins (offset {}, more: {})",
            query.model_ids,
            content.len(),
            offset,
            continuation_token.is_some()
        );
        Ok(Page::new(content, continuation_token))
    }

    async fn get_outgoing_relationships(
        &self,
        twin_id: &TwinId,
        name: Option<&str>,
    ) -> StoreResult<Vec<Relationship>> {
        self.enter(&self.calls.outgoing, Some(twin_id)).await?;
        let mut relationships = self.relationships_for(&self.outgoing, twin_id);
        if let Some(name) = name {
            relationships.retain(|rel| rel.is_named(name));
        }
        Ok(relationships)
    }

    async fn get_incoming_relationships(&self, twin_id: &TwinId) -> StoreResult<Vec<Relationship>> {
        self.enter(&self.calls.incoming, Some(twin_id)).await?;
        Ok(self.relationships_for(&self.incoming, twin_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::collect_all_pages;

    const FLOOR: &str = "dtmi:com:willowinc:Floor;1";
    const ROOM: &str = "dtmi:com:willowinc:Room;1";
    const SPACE: &str = "dtmi:com:willowinc:Space;1";

    fn create_store() -> InMemoryTwinStore {
        let mut store = InMemoryTwinStore::new();
        store.add_twin(Twin::new("building", "dtmi:com:willowinc:Building;1"));
        store.add_twin(Twin::new("floor-1", FLOOR));
        store.add_twin(Twin::new("room-1", ROOM));
        store.add_twin(Twin::new("room-2", ROOM));
        store.add_model_extends(ROOM, SPACE);
        store.relate("floor-1", "isPartOf", "building");
        store.relate("room-1", "locatedIn", "floor-1");
        store
    }

    #[tokio::test]
    async fn test_get_twin_and_not_found() {
        let store = create_store();
        let twin = store.get_twin(&TwinId::new("room-1")).await.unwrap();
        assert_eq!(twin.model_id, ModelId::new(ROOM));

        let missing = store.get_twin(&TwinId::new("nope")).await;
        assert_eq!(missing, Err(StoreError::NotFound(TwinId::new("nope"))));
        assert_eq!(store.call_counts().get_twin, 2);
    }

    #[tokio::test]
    async fn test_relationship_directions() {
        let store = create_store();
        let floor = TwinId::new("floor-1");

        let outgoing = store.get_outgoing_relationships(&floor, None).await.unwrap();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].target_id, TwinId::new("building"));

        let incoming = store.get_incoming_relationships(&floor).await.unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].source_id, TwinId::new("room-1"));

        let filtered = store
            .get_outgoing_relationships(&floor, Some("locatedIn"))
            .await
            .unwrap();
        assert!(filtered.is_empty());
    }

    #[tokio::test]
    async fn test_dangling_relationship_is_stored() {
        let mut store = create_store();
        store.relate("room-2", "isPartOf", "ghost");
        assert_eq!(store.relationship_count(), 3);

        let outgoing = store
            .get_outgoing_relationships(&TwinId::new("room-2"), None)
            .await
            .unwrap();
        assert_eq!(outgoing[0].target_id, TwinId::new("ghost"));
        assert!(!store.contains_twin(&TwinId::new("ghost")));
    }

    #[tokio::test]
    async fn test_exact_and_inherited_model_match() {
        let store = create_store();

        let exact = ModelQuery::new(vec![ModelId::new(SPACE)], true, 10);
        let page = store.get_twins_by_model(&exact, None).await.unwrap();
        assert!(page.content.is_empty());

        let inherited = ModelQuery::new(vec![ModelId::new(SPACE)], false, 10);
        let page = store.get_twins_by_model(&inherited, None).await.unwrap();
        assert_eq!(page.content.len(), 2);
    }

    #[tokio::test]
    async fn test_location_filter() {
        let store = create_store();
        let query = ModelQuery::new(vec![ModelId::new(ROOM)], true, 10).with_location("building");
        let page = store.get_twins_by_model(&query, None).await.unwrap();

        // room-2 has no containment path to the building
        let ids: Vec<_> = page.content.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["room-1"]);
    }

    #[tokio::test]
    async fn test_paging() {
        let mut store = InMemoryTwinStore::new();
        for i in 0..7 {
            store.add_twin(Twin::new(format!("room-{}", i), ROOM));
        }
        let query = ModelQuery::new(vec![ModelId::new(ROOM)], true, 3);

        let first = store.get_twins_by_model(&query, None).await.unwrap();
        assert_eq!(first.content.len(), 3);
        assert_eq!(first.continuation_token.as_deref(), Some("3"));

        let all = collect_all_pages(|token| {
            let query = query.clone();
            let store = &store;
            async move { store.get_twins_by_model(&query, token.as_deref()).await }
        })
        .await
        .unwrap();
        assert_eq!(all.len(), 7);
        assert_eq!(all[6].id, TwinId::new("room-6"));
    }

    #[tokio::test]
    async fn test_fail_on_and_cancel() {
        let mut store = create_store();
        store.fail_on("floor-1", "throttled");
        let err = store
            .get_incoming_relationships(&TwinId::new("floor-1"))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Unavailable("throttled".to_string()));

        let token = CancellationToken::new();
        let store = create_store().with_cancel_token(token.clone());
        assert!(store.get_twin(&TwinId::new("room-1")).await.is_ok());
        token.cancel();
        assert_eq!(
            store.get_twin(&TwinId::new("room-1")).await,
            Err(StoreError::Cancelled)
        );
    }

    #[test]
    fn test_replace_twin_updates_model_index() {
        let mut store = create_store();
        let previous = store.add_twin(Twin::new("room-2", FLOOR));
        assert!(previous.is_some());
        assert!(!store.model_index[&ModelId::new(ROOM)].contains(&TwinId::new("room-2")));
        assert!(store.model_index[&ModelId::new(FLOOR)].contains(&TwinId::new("room-2")));
    }

    #[tokio::test]
    async fn test_model_query_keeps_insertion_order_across_models() {
        let mut store = create_store();
        store.add_twin(Twin::new("floor-2", FLOOR));
        // Replaced twins move to their new model without changing position
        store.add_twin(Twin::new("room-1", FLOOR));

        let query = ModelQuery::new(vec![ModelId::new(FLOOR), ModelId::new(SPACE)], false, 10);
        let page = store.get_twins_by_model(&query, None).await.unwrap();
        let ids: Vec<_> = page.content.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["floor-1", "room-1", "room-2", "floor-2"]);
    }

    #[tokio::test]
    async fn test_cancel_cuts_latency_short() {
        let token = CancellationToken::new();
        let store = create_store()
            .with_latency(Duration::from_secs(30))
            .with_cancel_token(token.clone());

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            store.get_twin(&TwinId::new("room-1")),
        )
        .await
        .unwrap();
        assert_eq!(result, Err(StoreError::Cancelled));
    }

    #[test]
    fn test_remove_relationship() {
        let mut store = create_store();
        let id = store.relate("room-2", "locatedIn", "floor-1");
        assert!(store.remove_relationship(&id).is_some());
        assert_eq!(store.incoming[&TwinId::new("floor-1")].len(), 1);
    }
}
