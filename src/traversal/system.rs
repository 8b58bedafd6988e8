//! Semantic Graph Builder
//!
//! Builds the dependency graph around a set of seed twins. Traversal is a
//! breadth-first worklist where each entry carries the [`TraversalMode`] it
//! was reached through, and the mode decides which relationships of the twin
//! are turned into statements and followed:
//!
//! | mode              | fetched  | followed names                        | statement            |
//! |-------------------|----------|---------------------------------------|----------------------|
//! | `Feeds`           | outgoing | `isFedBy`                             | target feeds current |
//! | `IsFedBy`         | incoming | `isFedBy`                             | current feeds source |
//! | `PhysicalGreater` | outgoing | `isPartOf`, `locatedIn`, `includedIn` | target name current  |
//! | `Default`         | both     | see [`SystemGraphBuilder`]            |                      |
//! | `IsCapabilityOf`  | both     | as `Default`, without `hostedBy`      |                      |
//!
//! The queue is owned by one task and entries are processed one at a time;
//! only the store calls for a single entry run concurrently. Those calls are
//! raced against the cancellation token, so a cancelled build returns without
//! waiting for them.

use super::cancel::{until_cancelled, CancellationToken};
use super::mode::TraversalMode;
use crate::config::TraversalConfig;
use crate::error::{TraversalError, TraversalResult};
use crate::graph::relation::{
    is_physical_containment, FEEDS, HOSTED_BY, IS_CAPABILITY_OF, IS_FED_BY, IS_PART_OF, LOCATED_IN,
};
use crate::graph::{RelationLabel, TwinGraph};
use crate::store::{collect_all_pages, ModelQuery, StoreError, TwinStore};
use crate::twin::{Relationship, Twin, TwinId};
use futures::future::try_join_all;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Why a semantic graph build stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The queue ran empty
    Exhausted,
    /// `max_iterations` dequeues were reached; the graph is partial
    IterationCap,
}

/// Result of a semantic graph build
#[derive(Debug)]
pub struct SystemGraph {
    pub graph: TwinGraph,
    /// Twins that were dequeued for the first time and expanded
    pub expanded: usize,
    /// Largest distance from a seed among expanded twins
    pub max_distance: u32,
    pub termination: Termination,
}

impl SystemGraph {
    pub fn is_complete(&self) -> bool {
        self.termination == Termination::Exhausted
    }

    pub fn into_graph(self) -> TwinGraph {
        self.graph
    }
}

#[derive(Debug, Clone)]
struct QueueEntry {
    twin_id: TwinId,
    distance: u32,
    mode: TraversalMode,
}

/// Per-call state; nothing survives the call
#[derive(Debug, Default)]
struct TraversalState {
    graph: TwinGraph,
    queue: VecDeque<QueueEntry>,
    seen: FxHashSet<TwinId>,
    /// Every twin fetched during this call, so each id resolves to one instance
    arena: FxHashMap<TwinId, Twin>,
}

/// Mode-tagged breadth-first builder of a [`TwinGraph`]
///
/// In the `Default` and `IsCapabilityOf` modes, outgoing relationships are
/// handled as follows:
/// - `isPartOf` / `locatedIn`: statement current -> target; the target is
///   re-expanded in `Default` mode when its model is a pass-through zone,
///   otherwise it climbs in `PhysicalGreater` mode
/// - `isFedBy`: flipped to target `feeds` current; target continues in `Feeds`
/// - `isCapabilityOf`: statement current -> target; target continues in `IsCapabilityOf`
/// - `hostedBy` reached through a capability is not followed back
/// - anything else is ignored
///
/// Incoming relationships always produce a statement source -> current
/// (`isFedBy` becomes `feeds`). `isFedBy` sources continue in `IsFedBy`
/// (or `Default` for pass-through zones), `isCapabilityOf` sources continue in
/// `IsCapabilityOf`, and an `isPartOf` into an occupancy zone requeues the
/// zone itself in `Default` mode. Other incoming names are recorded but not
/// followed.
pub struct SystemGraphBuilder<'a, S: TwinStore + ?Sized> {
    store: &'a S,
    config: &'a TraversalConfig,
    cancel: Option<CancellationToken>,
}

impl<'a, S: TwinStore + ?Sized> SystemGraphBuilder<'a, S> {
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

    /// Traverse from `seeds` and return the accumulated graph
    ///
    /// Seeds may contain the configured sentinel, which is replaced by every
    /// twin of the top-level models. Any store error aborts the build.
    pub async fn build(&self, seeds: &[TwinId]) -> TraversalResult<SystemGraph> {
        let mut state = TraversalState::default();
        let seeds = until_cancelled(
            self.cancel.as_ref(),
            self.resolve_seeds(seeds, &mut state.arena),
        )
        .await?;
        info!("Building system graph from {} seed twins", seeds.len());

        for twin_id in seeds {
            state.queue.push_back(QueueEntry {
                twin_id,
                distance: 0,
                mode: TraversalMode::Default,
            });
        }

        let mut dequeued = 0usize;
        let mut expanded = 0usize;
        let mut max_distance = 0u32;
        let mut termination = Termination::Exhausted;

        while let Some(entry) = state.queue.pop_front() {
            if dequeued >= self.config.max_iterations {
                warn!(
                    "Graph traversal hit traversal limit of {} ({} entries left in queue)",
                    self.config.max_iterations,
                    state.queue.len() + 1
                );
                termination = Termination::IterationCap;
                break;
            }
            dequeued += 1;

            if !state.seen.insert(entry.twin_id.clone()) {
                continue;
            }

            until_cancelled(self.cancel.as_ref(), self.expand(&mut state, &entry)).await?;
            expanded += 1;
            max_distance = max_distance.max(entry.distance);
        }

        info!(
            "System graph built: {} statements over {} twins, {} expanded, max distance {}",
            state.graph.len(),
            state.graph.node_count(),
            expanded,
            max_distance
        );

        Ok(SystemGraph {
            graph: state.graph,
            expanded,
            max_distance,
            termination,
        })
    }

    /// Replace the sentinel with every twin of each top-level model
    async fn resolve_seeds(
        &self,
        seeds: &[TwinId],
        arena: &mut FxHashMap<TwinId, Twin>,
    ) -> TraversalResult<Vec<TwinId>> {
        let sentinel = self.config.all_sentinel.as_str();
        let mut resolved: Vec<TwinId> = seeds
            .iter()
            .filter(|id| id.as_str() != sentinel)
            .cloned()
            .collect();

        if resolved.len() == seeds.len() {
            return Ok(resolved);
        }

        for model in &self.config.top_level_models {
            let query = ModelQuery::new(vec![model.clone()], false, self.config.page_size);
            let query = &query;
            let store = self.store;
            let twins = collect_all_pages(move |token| async move {
                store.get_twins_by_model(query, token.as_deref()).await
            })
            .await?;
            debug!("Sentinel resolved {} twins of {}", twins.len(), model);
            for twin in twins {
                resolved.push(twin.id.clone());
                arena.entry(twin.id.clone()).or_insert(twin);
            }
        }

        Ok(resolved)
    }

    /// Resolve the entry's twin and apply the rules of the mode it was reached in
    async fn expand(&self, state: &mut TraversalState, entry: &QueueEntry) -> TraversalResult<()> {
        let current = self.resolve(&mut state.arena, &entry.twin_id).await?;
        let distance = entry.distance;
        debug!(
            "Expanding {} at distance {} in {} mode",
            current.id, distance, entry.mode
        );

        match entry.mode {
            TraversalMode::Feeds => self.expand_feeds(state, &current, distance).await,
            TraversalMode::IsFedBy => self.expand_fed_by(state, &current, distance).await,
            TraversalMode::PhysicalGreater => {
                self.expand_physical_greater(state, &current, distance).await
            }
            TraversalMode::Default | TraversalMode::IsCapabilityOf => {
                self.expand_unrestricted(state, &current, distance, entry.mode)
                    .await
            }
        }
    }

    async fn resolve(
        &self,
        arena: &mut FxHashMap<TwinId, Twin>,
        id: &TwinId,
    ) -> TraversalResult<Twin> {
        if let Some(twin) = arena.get(id) {
            return Ok(twin.clone());
        }
        let twin = self.store.get_twin(id).await?;
        arena.insert(id.clone(), twin.clone());
        Ok(twin)
    }

    /// Fetch every twin in `ids` not yet in the arena, concurrently
    async fn prefetch<'r>(
        &self,
        arena: &mut FxHashMap<TwinId, Twin>,
        ids: impl IntoIterator<Item = &'r TwinId>,
    ) -> TraversalResult<()> {
        let mut unique = FxHashSet::default();
        let missing: Vec<&TwinId> = ids
            .into_iter()
            .filter(|id| !arena.contains_key(*id) && unique.insert(*id))
            .collect();

        if missing.is_empty() {
            return Ok(());
        }

        let twins = try_join_all(missing.iter().map(|id| self.store.get_twin(id))).await?;
        for (id, twin) in missing.into_iter().zip(twins) {
            arena.insert(id.clone(), twin);
        }
        Ok(())
    }

    async fn expand_feeds(
        &self,
        state: &mut TraversalState,
        current: &Twin,
        distance: u32,
    ) -> TraversalResult<()> {
        let relationships: Vec<Relationship> = self
            .store
            .get_outgoing_relationships(&current.id, Some(IS_FED_BY))
            .await?
            .into_iter()
            .filter(|rel| rel.is_named(IS_FED_BY))
            .collect();
        self.prefetch(&mut state.arena, relationships.iter().map(|rel| &rel.target_id))
            .await?;

        for rel in &relationships {
            let target = lookup(&state.arena, &rel.target_id)?;
            state
                .graph
                .add_statement_from(target, RelationLabel::get(FEEDS), current, rel);
            enqueue(&mut state.queue, &rel.target_id, distance, TraversalMode::Feeds);
        }
        Ok(())
    }

    async fn expand_fed_by(
        &self,
        state: &mut TraversalState,
        current: &Twin,
        distance: u32,
    ) -> TraversalResult<()> {
        let relationships: Vec<Relationship> = self
            .store
            .get_incoming_relationships(&current.id)
            .await?
            .into_iter()
            .filter(|rel| rel.is_named(IS_FED_BY))
            .collect();
        self.prefetch(&mut state.arena, relationships.iter().map(|rel| &rel.source_id))
            .await?;

        for rel in &relationships {
            let source = lookup(&state.arena, &rel.source_id)?;
            state
                .graph
                .add_statement_from(current, RelationLabel::get(FEEDS), source, rel);
            enqueue(&mut state.queue, &rel.source_id, distance, TraversalMode::IsFedBy);
        }
        Ok(())
    }

    async fn expand_physical_greater(
        &self,
        state: &mut TraversalState,
        current: &Twin,
        distance: u32,
    ) -> TraversalResult<()> {
        let relationships: Vec<Relationship> = self
            .store
            .get_outgoing_relationships(&current.id, None)
            .await?
            .into_iter()
            .filter(|rel| is_physical_containment(&rel.name))
            .collect();
        self.prefetch(&mut state.arena, relationships.iter().map(|rel| &rel.target_id))
            .await?;

        for rel in &relationships {
            let target = lookup(&state.arena, &rel.target_id)?;
            state
                .graph
                .add_statement_from(target, RelationLabel::get(&rel.name), current, rel);
            enqueue(
                &mut state.queue,
                &rel.target_id,
                distance,
                TraversalMode::PhysicalGreater,
            );
        }
        Ok(())
    }

    async fn expand_unrestricted(
        &self,
        state: &mut TraversalState,
        current: &Twin,
        distance: u32,
        mode: TraversalMode,
    ) -> TraversalResult<()> {
        let (outgoing, incoming) = futures::try_join!(
            self.store.get_outgoing_relationships(&current.id, None),
            self.store.get_incoming_relationships(&current.id),
        )?;

        self.prefetch(
            &mut state.arena,
            outgoing
                .iter()
                .filter(|rel| follows_outgoing(&rel.name))
                .map(|rel| &rel.target_id)
                .chain(incoming.iter().map(|rel| &rel.source_id)),
        )
        .await?;

        for rel in &outgoing {
            match rel.name.as_str() {
                IS_PART_OF | LOCATED_IN => {
                    let target = lookup(&state.arena, &rel.target_id)?;
                    state
                        .graph
                        .add_statement_from(current, RelationLabel::get(&rel.name), target, rel);
                    let next = if self.config.is_pass_through(&target.model_id) {
                        TraversalMode::Default
                    } else {
                        TraversalMode::PhysicalGreater
                    };
                    enqueue(&mut state.queue, &rel.target_id, distance, next);
                }
                IS_FED_BY => {
                    let target = lookup(&state.arena, &rel.target_id)?;
                    state
                        .graph
                        .add_statement_from(target, RelationLabel::get(FEEDS), current, rel);
                    enqueue(&mut state.queue, &rel.target_id, distance, TraversalMode::Feeds);
                }
                IS_CAPABILITY_OF => {
                    let target = lookup(&state.arena, &rel.target_id)?;
                    let label = RelationLabel::get(IS_CAPABILITY_OF);
                    state.graph.add_statement_from(current, label, target, rel);
                    enqueue(
                        &mut state.queue,
                        &rel.target_id,
                        distance,
                        TraversalMode::IsCapabilityOf,
                    );
                }
                HOSTED_BY if mode == TraversalMode::IsCapabilityOf => {
                    debug!("Not following {} back to host {}", current.id, rel.target_id);
                }
                _ => {}
            }
        }

        for rel in &incoming {
            let source = lookup(&state.arena, &rel.source_id)?;
            match rel.name.as_str() {
                IS_FED_BY => {
                    state
                        .graph
                        .add_statement_from(source, RelationLabel::get(FEEDS), current, rel);
                    let next = if self.config.is_pass_through(&source.model_id) {
                        TraversalMode::Default
                    } else {
                        TraversalMode::IsFedBy
                    };
                    enqueue(&mut state.queue, &rel.source_id, distance, next);
                }
                IS_CAPABILITY_OF => {
                    let label = RelationLabel::get(IS_CAPABILITY_OF);
                    state.graph.add_statement_from(source, label, current, rel);
                    // Usually leads straight back here; `seen` stops the re-expansion
                    enqueue(
                        &mut state.queue,
                        &rel.source_id,
                        distance,
                        TraversalMode::IsCapabilityOf,
                    );
                }
                IS_PART_OF => {
                    state
                        .graph
                        .add_statement_from(source, RelationLabel::get(IS_PART_OF), current, rel);
                    if self.config.is_occupancy_zone(&current.model_id) {
                        enqueue(&mut state.queue, &current.id, distance, TraversalMode::Default);
                    }
                }
                name => {
                    state
                        .graph
                        .add_statement_from(source, RelationLabel::get(name), current, rel);
                }
            }
        }
        Ok(())
    }
}

/// Outgoing names the unrestricted modes turn into statements
fn follows_outgoing(name: &str) -> bool {
    matches!(name, IS_PART_OF | LOCATED_IN | IS_FED_BY | IS_CAPABILITY_OF)
}

fn lookup<'s>(arena: &'s FxHashMap<TwinId, Twin>, id: &TwinId) -> TraversalResult<&'s Twin> {
    arena
        .get(id)
        .ok_or_else(|| TraversalError::Store(StoreError::NotFound(id.clone())))
}

fn enqueue(queue: &mut VecDeque<QueueEntry>, twin_id: &TwinId, distance: u32, mode: TraversalMode) {
    queue.push_back(QueueEntry {
        twin_id: twin_id.clone(),
        distance: distance + 1,
        mode,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HVAC_ZONE_MODEL, OCCUPANCY_ZONE_MODEL};
    use crate::store::InMemoryTwinStore;
    use std::time::{Duration, Instant};

    const AHU: &str = "dtmi:com:willowinc:AirHandlingUnit;1";
    const VAV: &str = "dtmi:com:willowinc:VAVBox;1";
    const ROOM: &str = "dtmi:com:willowinc:Room;1";
    const LEVEL: &str = "dtmi:com:willowinc:Level;1";
    const SENSOR: &str = "dtmi:com:willowinc:TemperatureSensor;1";
    const BUILDING: &str = "dtmi:com:willowinc:Building;1";

    fn store_with(twins: &[(&str, &str)], rels: &[(&str, &str, &str)]) -> InMemoryTwinStore {
        let mut store = InMemoryTwinStore::new();
        for (id, model) in twins {
            store.add_twin(Twin::new(*id, *model));
        }
        for (source, name, target) in rels {
            store.relate(*source, *name, *target);
        }
        store
    }

    async fn build(store: &InMemoryTwinStore, seeds: &[&str]) -> SystemGraph {
        let config = TraversalConfig::default();
        let seeds: Vec<TwinId> = seeds.iter().map(|s| TwinId::new(*s)).collect();
        SystemGraphBuilder::new(store, &config).build(&seeds).await.unwrap()
    }

    #[tokio::test]
    async fn test_outgoing_fed_by_is_flipped_and_followed() {
        let store = store_with(
            &[("vav", VAV), ("ahu", AHU), ("chiller", AHU)],
            &[("vav", "isFedBy", "ahu"), ("ahu", "isFedBy", "chiller")],
        );
        let result = build(&store, &["vav"]).await;

        assert!(result.graph.contains(&"ahu".into(), "feeds", &"vav".into()));
        assert!(result.graph.contains(&"chiller".into(), "feeds", &"ahu".into()));
        assert!(!result.graph.contains(&"vav".into(), "isFedBy", &"ahu".into()));
        assert_eq!(result.graph.len(), 2);
        assert_eq!(result.max_distance, 2);
        assert!(result.is_complete());
    }

    #[tokio::test]
    async fn test_physical_greater_climbs_with_stored_names() {
        let store = store_with(
            &[
                ("sensor", SENSOR),
                ("room", ROOM),
                ("level", LEVEL),
                ("building", BUILDING),
            ],
            &[
                ("sensor", "locatedIn", "room"),
                ("room", "isPartOf", "level"),
                ("level", "includedIn", "building"),
            ],
        );
        let result = build(&store, &["sensor"]).await;

        // The seed's own edge keeps its direction, the climb is reversed
        assert!(result.graph.contains(&"sensor".into(), "locatedIn", &"room".into()));
        assert!(result.graph.contains(&"level".into(), "isPartOf", &"room".into()));
        assert!(result.graph.contains(&"building".into(), "includedIn", &"level".into()));
        assert_eq!(result.graph.len(), 3);
    }

    #[tokio::test]
    async fn test_pass_through_zone_is_reexpanded() {
        let store = store_with(
            &[("vav", VAV), ("zone", HVAC_ZONE_MODEL), ("ahu", AHU), ("room", ROOM)],
            &[
                ("vav", "isPartOf", "zone"),
                ("zone", "isFedBy", "ahu"),
                ("room", "locatedIn", "zone"),
            ],
        );
        let result = build(&store, &["vav"]).await;

        // Zone expanded in Default mode: its isFedBy and incoming edges are seen
        assert!(result.graph.contains(&"ahu".into(), "feeds", &"zone".into()));
        assert!(result.graph.contains(&"room".into(), "locatedIn", &"zone".into()));
    }

    #[tokio::test]
    async fn test_non_zone_parent_only_climbs() {
        let store = store_with(
            &[("vav", VAV), ("room", ROOM), ("ahu", AHU)],
            &[("vav", "isPartOf", "room"), ("room", "isFedBy", "ahu")],
        );
        let result = build(&store, &["vav"]).await;

        assert!(result.graph.contains(&"vav".into(), "isPartOf", &"room".into()));
        // PhysicalGreater does not look at isFedBy
        assert!(!result.graph.contains(&"ahu".into(), "feeds", &"room".into()));
        assert_eq!(result.graph.len(), 1);
    }

    #[tokio::test]
    async fn test_incoming_rules() {
        let store = store_with(
            &[
                ("ahu", AHU),
                ("vav", VAV),
                ("point", SENSOR),
                ("doc", "dtmi:com:willowinc:Document;1"),
                ("other", ROOM),
            ],
            &[
                ("vav", "isFedBy", "ahu"),
                ("point", "isCapabilityOf", "ahu"),
                ("doc", "documents", "ahu"),
                ("other", "documents", "doc"),
            ],
        );
        let result = build(&store, &["ahu"]).await;

        assert!(result.graph.contains(&"vav".into(), "feeds", &"ahu".into()));
        assert!(result.graph.contains(&"point".into(), "isCapabilityOf", &"ahu".into()));
        assert!(result.graph.contains(&"doc".into(), "documents", &"ahu".into()));
        // Unknown incoming names are recorded, never followed
        assert!(!result.graph.contains(&"other".into(), "documents", &"doc".into()));
    }

    #[tokio::test]
    async fn test_capability_does_not_follow_host() {
        let store = store_with(
            &[("point", SENSOR), ("ahu", AHU), ("connector", "dtmi:com:willowinc:Connector;1")],
            &[("point", "isCapabilityOf", "ahu"), ("point", "hostedBy", "connector")],
        );
        let result = build(&store, &["ahu"]).await;

        assert!(result.graph.contains(&"point".into(), "isCapabilityOf", &"ahu".into()));
        assert!(result.graph.twin(&"connector".into()).is_none());
    }

    #[tokio::test]
    async fn test_occupancy_zone_self_requeue_is_harmless() {
        let store = store_with(
            &[("zone", OCCUPANCY_ZONE_MODEL), ("sensor", SENSOR)],
            &[("sensor", "isPartOf", "zone")],
        );
        let result = build(&store, &["zone"]).await;

        assert!(result.graph.contains(&"sensor".into(), "isPartOf", &"zone".into()));
        assert_eq!(result.expanded, 1);
        assert!(result.is_complete());
    }

    #[tokio::test]
    async fn test_iteration_cap() {
        let mut store = InMemoryTwinStore::new();
        for i in 0..50 {
            store.add_twin(Twin::new(format!("n{}", i), AHU));
        }
        for i in 0..49 {
            store.relate(format!("n{}", i), "isFedBy", format!("n{}", i + 1));
        }

        let config = TraversalConfig::default().with_max_iterations(5);
        let result = SystemGraphBuilder::new(&store, &config)
            .build(&[TwinId::new("n0")])
            .await
            .unwrap();

        assert_eq!(result.termination, Termination::IterationCap);
        assert_eq!(result.expanded, 5);
        assert!(!result.is_complete());
        assert_eq!(result.graph.len(), 5);
    }

    #[tokio::test]
    async fn test_fed_by_mode_walks_downstream() {
        let store = store_with(
            &[("a", AHU), ("b", AHU), ("c", VAV)],
            &[("b", "isFedBy", "a"), ("c", "isFedBy", "b")],
        );
        let result = build(&store, &["a"]).await;

        // a is Default: its incoming isFedBy from b reports b feeds a
        assert!(result.graph.contains(&"b".into(), "feeds", &"a".into()));
        // b is expanded in IsFedBy mode: current feeds the downstream source
        assert!(result.graph.contains(&"b".into(), "feeds", &"c".into()));
        assert!(!result.graph.contains(&"c".into(), "feeds", &"b".into()));
        assert_eq!(result.graph.len(), 2);
        assert_eq!(result.expanded, 3);
        assert_eq!(result.max_distance, 2);
    }

    #[tokio::test]
    async fn test_sentinel_reads_every_page() {
        let mut store = InMemoryTwinStore::new();
        for i in 0..5 {
            store.add_twin(Twin::new(format!("bld-{}", i), BUILDING));
        }
        let config = TraversalConfig {
            page_size: 2,
            ..TraversalConfig::default()
        };

        let result = SystemGraphBuilder::new(&store, &config)
            .build(&[TwinId::new("all")])
            .await
            .unwrap();
        assert_eq!(result.expanded, 5);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_slow_store_call() {
        let token = CancellationToken::new();
        let store = store_with(&[("a", AHU)], &[]).with_latency(Duration::from_secs(30));
        let config = TraversalConfig::default();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let started = Instant::now();
        let err = SystemGraphBuilder::new(&store, &config)
            .with_cancel_token(token)
            .build(&[TwinId::new("a")])
            .await
            .unwrap_err();
        assert_eq!(err, TraversalError::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let store = store_with(&[("a", AHU)], &[]);
        let config = TraversalConfig::default();
        let token = CancellationToken::new();
        token.cancel();

        let err = SystemGraphBuilder::new(&store, &config)
            .with_cancel_token(token)
            .build(&[TwinId::new("a")])
            .await
            .unwrap_err();
        assert_eq!(err, TraversalError::Cancelled);
    }
}
