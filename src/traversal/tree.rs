//! Tree Builder
//!
//! Level-synchronous breadth-first traversal from a set of root twins. Each
//! wave expands all of its twins concurrently (bounded by
//! `max_concurrency`), and the next wave starts only once every task of the
//! current one has finished. Tasks only read state produced by earlier waves;
//! their results are merged at the barrier in wave order, which keeps the
//! resulting forest independent of task completion order. A wave is raced
//! against the cancellation token as a whole.
//!
//! A twin's parent is the target of its first followed outgoing relationship,
//! ordered by relationship id. Incoming relationships discover neighbours but
//! never set a parent.

use super::cancel::{until_cancelled, CancellationToken};
use super::forest::TwinForest;
use crate::config::TraversalConfig;
use crate::error::TraversalResult;
use crate::store::{StoreResult, TwinStore};
use crate::twin::{ModelId, Relationship, Twin, TwinId};
use futures::future::try_join_all;
use futures::stream::{self, StreamExt, TryStreamExt};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

/// Which relationships a tree build follows and which twins it keeps expanding
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeFilter {
    /// Relationship names followed from source to target
    pub outgoing: Vec<String>,
    /// Relationship names followed from target back to source
    pub incoming: Vec<String>,
    /// Models admitted into later waves; empty admits every model
    pub child_models: Vec<ModelId>,
}

impl TreeFilter {
    pub fn new<O, I>(outgoing: O, incoming: I) -> Self
    where
        O: IntoIterator,
        O::Item: Into<String>,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        TreeFilter {
            outgoing: outgoing.into_iter().map(Into::into).collect(),
            incoming: incoming.into_iter().map(Into::into).collect(),
            child_models: Vec::new(),
        }
    }

    pub fn with_child_models<M>(mut self, models: M) -> Self
    where
        M: IntoIterator,
        M::Item: Into<ModelId>,
    {
        self.child_models = models.into_iter().map(Into::into).collect();
        self
    }

    /// No relationship names in either direction
    pub fn follows_nothing(&self) -> bool {
        self.outgoing.is_empty() && self.incoming.is_empty()
    }

    pub fn admits(&self, model: &ModelId) -> bool {
        self.child_models.is_empty() || self.child_models.contains(model)
    }

    /// Name filter passed to the store when exactly one outgoing name is followed
    fn outgoing_hint(&self) -> Option<&str> {
        match self.outgoing.as_slice() {
            [name] => Some(name.as_str()),
            _ => None,
        }
    }
}

/// What one task learned about one twin of the wave
#[derive(Debug, Default)]
struct Expansion {
    parent_id: Option<TwinId>,
    /// Unseen neighbours over followed relationships, without duplicates
    discovered: Vec<Twin>,
}

/// Wave-parallel builder of a [`TwinForest`]
pub struct TreeBuilder<'a, S: TwinStore + ?Sized> {
    store: &'a S,
    config: &'a TraversalConfig,
    cancel: Option<CancellationToken>,
}

impl<'a, S: TwinStore + ?Sized> TreeBuilder<'a, S> {
    pub fn new(store: &'a S, config: &'a TraversalConfig) -> Self {
        Self {
            store,
            config,
            cancel: None,
        }
    }

    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Traverse from `roots` and return every processed twin with its parent
    ///
    /// Roots are always processed; the child-model restriction applies to
    /// discovered neighbours only. A dangling relationship endpoint fails the
    /// whole build with `NotFound`.
    pub async fn build(
        &self,
        roots: Vec<Twin>,
        filter: &TreeFilter,
    ) -> TraversalResult<TwinForest> {
        let mut forest = TwinForest::new();
        let mut seen: FxHashSet<TwinId> = FxHashSet::default();
        let mut known: FxHashMap<TwinId, Twin> = FxHashMap::default();

        let mut unique = FxHashSet::default();
        let mut wave: Vec<Twin> = roots
            .into_iter()
            .filter(|twin| unique.insert(twin.id.clone()))
            .collect();
        let mut depth = 0usize;

        while !wave.is_empty() {
            for twin in &wave {
                seen.insert(twin.id.clone());
                known.entry(twin.id.clone()).or_insert_with(|| twin.clone());
            }

            let mut expansions: Vec<(usize, Expansion)> = {
                let (seen, known) = (&seen, &known);
                let tasks = stream::iter(wave.iter().enumerate())
                    .map(move |(index, twin)| async move {
                        self.expand(twin, filter, seen, known)
                            .await
                            .map(|expansion| (index, expansion))
                    })
                    .buffer_unordered(self.config.max_concurrency.max(1))
                    .try_collect::<Vec<_>>();
                until_cancelled(self.cancel.as_ref(), tasks).await?
            };
            expansions.sort_by_key(|(index, _)| *index);

            let processed = wave.len();
            let mut next = Vec::new();
            let mut admitted = FxHashSet::default();

            for (twin, (_, expansion)) in wave.into_iter().zip(expansions) {
                for neighbour in expansion.discovered {
                    known
                        .entry(neighbour.id.clone())
                        .or_insert_with(|| neighbour.clone());
                    if seen.contains(&neighbour.id) || admitted.contains(&neighbour.id) {
                        continue;
                    }
                    if !filter.admits(&neighbour.model_id) {
                        continue;
                    }
                    admitted.insert(neighbour.id.clone());
                    next.push(neighbour);
                }
                forest.insert(twin, expansion.parent_id);
            }

            debug!(
                "Tree wave {}: processed {} twins, admitted {} for the next wave",
                depth,
                processed,
                next.len()
            );
            depth += 1;
            wave = next;
        }

        forest.link_children();
        debug!("Tree built with {} twins over {} waves", forest.len(), depth);
        Ok(forest)
    }

    async fn expand(
        &self,
        twin: &Twin,
        filter: &TreeFilter,
        seen: &FxHashSet<TwinId>,
        known: &FxHashMap<TwinId, Twin>,
    ) -> TraversalResult<Expansion> {
        let (outgoing, incoming) = futures::try_join!(
            self.followed_outgoing(&twin.id, filter),
            self.followed_incoming(&twin.id, filter),
        )?;

        let parent_id = outgoing.first().map(|rel| rel.target_id.clone());

        let mut unique = FxHashSet::default();
        let neighbours: Vec<&TwinId> = outgoing
            .iter()
            .map(|rel| &rel.target_id)
            .chain(incoming.iter().map(|rel| &rel.source_id))
            .filter(|id| !seen.contains(*id) && unique.insert(*id))
            .collect();

        let discovered =
            try_join_all(neighbours.into_iter().map(|id| self.resolve(id, known))).await?;

        Ok(Expansion {
            parent_id,
            discovered,
        })
    }

    /// Outgoing relationships with a followed name, ordered by relationship id
    async fn followed_outgoing(
        &self,
        twin_id: &TwinId,
        filter: &TreeFilter,
    ) -> StoreResult<Vec<Relationship>> {
        if filter.outgoing.is_empty() {
            return Ok(Vec::new());
        }
        let mut relationships = self
            .store
            .get_outgoing_relationships(twin_id, filter.outgoing_hint())
            .await?;
        relationships.retain(|rel| filter.outgoing.contains(&rel.name));
        relationships.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(relationships)
    }

    async fn followed_incoming(
        &self,
        twin_id: &TwinId,
        filter: &TreeFilter,
    ) -> StoreResult<Vec<Relationship>> {
        if filter.incoming.is_empty() {
            return Ok(Vec::new());
        }
        let mut relationships = self.store.get_incoming_relationships(twin_id).await?;
        relationships.retain(|rel| filter.incoming.contains(&rel.name));
        relationships.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(relationships)
    }

    async fn resolve(&self, id: &TwinId, known: &FxHashMap<TwinId, Twin>) -> StoreResult<Twin> {
        match known.get(id) {
            Some(twin) => Ok(twin.clone()),
            None => self.store.get_twin(id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TraversalError;
    use crate::store::InMemoryTwinStore;
    use std::time::{Duration, Instant};

    const LEVEL: &str = "dtmi:com:willowinc:Level;1";
    const ROOM: &str = "dtmi:com:willowinc:Room;1";
    const SENSOR: &str = "dtmi:com:willowinc:TemperatureSensor;1";

    fn building() -> InMemoryTwinStore {
        let mut store = InMemoryTwinStore::new();
        store.add_twin(Twin::new("level", LEVEL));
        store.add_twin(Twin::new("room-1", ROOM));
        store.add_twin(Twin::new("room-2", ROOM));
        store.add_twin(Twin::new("sensor", SENSOR));
        store.relate("room-1", "isPartOf", "level");
        store.relate("room-2", "isPartOf", "level");
        store.relate("sensor", "locatedIn", "room-1");
        store
    }

    async fn roots(store: &InMemoryTwinStore, ids: &[&str]) -> Vec<Twin> {
        let ids: Vec<TwinId> = ids.iter().map(|id| TwinId::new(*id)).collect();
        store.get_twins_by_ids(&ids).await.unwrap().content
    }

    #[test]
    fn test_filter() {
        let filter = TreeFilter::new(["isPartOf"], Vec::<String>::new()).with_child_models([ROOM]);
        assert_eq!(filter.outgoing_hint(), Some("isPartOf"));
        assert!(filter.admits(&ModelId::new(ROOM)));
        assert!(!filter.admits(&ModelId::new(SENSOR)));
        assert!(!filter.follows_nothing());
        assert!(TreeFilter::default().follows_nothing());
        assert_eq!(TreeFilter::new(["a", "b"], ["c"]).outgoing_hint(), None);
    }

    #[tokio::test]
    async fn test_outgoing_sets_parent() {
        let store = building();
        let config = TraversalConfig::default();
        let filter = TreeFilter::new(["isPartOf", "locatedIn"], Vec::<String>::new());

        let forest = TreeBuilder::new(&store, &config)
            .build(roots(&store, &["sensor"]).await, &filter)
            .await
            .unwrap();

        // sensor -> room-1 -> level, discovered bottom-up
        assert_eq!(forest.len(), 3);
        assert_eq!(forest.get(&"sensor".into()).unwrap().parent_id, Some(TwinId::new("room-1")));
        assert_eq!(forest.get(&"room-1".into()).unwrap().parent_id, Some(TwinId::new("level")));
        assert_eq!(forest.roots(), vec![TwinId::new("level")]);
    }

    #[tokio::test]
    async fn test_incoming_discovers_without_parent() {
        let store = building();
        let config = TraversalConfig::default();
        let filter = TreeFilter::new(Vec::<String>::new(), ["isPartOf", "locatedIn"]);

        let forest = TreeBuilder::new(&store, &config)
            .build(roots(&store, &["level"]).await, &filter)
            .await
            .unwrap();

        assert_eq!(forest.len(), 4);
        assert!(forest.nodes().all(|node| node.parent_id.is_none()));
    }

    #[tokio::test]
    async fn test_child_models_stop_expansion() {
        let store = building();
        let config = TraversalConfig::default();
        let filter =
            TreeFilter::new(["isPartOf"], ["isPartOf", "locatedIn"]).with_child_models([ROOM]);

        let forest = TreeBuilder::new(&store, &config)
            .build(roots(&store, &["level"]).await, &filter)
            .await
            .unwrap();

        // Sensors are discovered from room-1 but never admitted
        assert!(forest.contains(&"room-1".into()));
        assert!(forest.contains(&"room-2".into()));
        assert!(!forest.contains(&"sensor".into()));
        assert_eq!(forest.get(&"level".into()).unwrap().children.len(), 2);
    }

    #[tokio::test]
    async fn test_parent_tie_break_by_relationship_id() {
        let mut store = InMemoryTwinStore::new();
        for (id, model) in [("room", ROOM), ("zone-b", ROOM), ("zone-a", ROOM)] {
            store.add_twin(Twin::new(id, model));
        }
        store.add_relationship(Relationship::new("r2", "room", "isPartOf", "zone-a"));
        store.add_relationship(Relationship::new("r1", "room", "isPartOf", "zone-b"));

        let config = TraversalConfig::default();
        let filter = TreeFilter::new(["isPartOf"], Vec::<String>::new());
        for _ in 0..3 {
            let forest = TreeBuilder::new(&store, &config)
                .build(roots(&store, &["room"]).await, &filter)
                .await
                .unwrap();
            assert_eq!(forest.get(&"room".into()).unwrap().parent_id, Some(TwinId::new("zone-b")));
        }
    }

    #[tokio::test]
    async fn test_dangling_target_is_fatal() {
        let mut store = building();
        store.relate("level", "isPartOf", "ghost-building");
        let config = TraversalConfig::default();
        let filter = TreeFilter::new(["isPartOf"], Vec::<String>::new());

        let err = TreeBuilder::new(&store, &config)
            .build(roots(&store, &["room-1"]).await, &filter)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_cancel_interrupts_running_wave() {
        let store = building();
        let wave = roots(&store, &["room-1", "room-2"]).await;
        let store = store.with_latency(Duration::from_secs(30));
        let config = TraversalConfig::default();
        let filter = TreeFilter::new(["isPartOf"], Vec::<String>::new());

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let started = Instant::now();
        let err = TreeBuilder::new(&store, &config)
            .with_cancel_token(token)
            .build(wave, &filter)
            .await
            .unwrap_err();
        assert_eq!(err, TraversalError::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
