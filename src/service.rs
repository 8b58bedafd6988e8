//! Query facade over the traversal engines
//!
//! [`TwinService`] is what the surrounding application calls: two tree
//! queries that differ only in how roots are chosen and which part of the
//! forest is returned, and the semantic system graph. Tree results are
//! ordered by twin name at every level.

use crate::config::TraversalConfig;
use crate::error::{TraversalError, TraversalResult};
use crate::graph::TwinGraph;
use crate::store::{collect_all_pages, ModelQuery, TwinStore};
use crate::traversal::cancel::until_cancelled;
use crate::traversal::forest::sort_tree_nodes;
use crate::traversal::{
    CancellationToken, NestedTwin, SystemGraph, SystemGraphBuilder, TreeBuilder, TreeFilter,
    TwinForest,
};
use crate::twin::{ModelId, Twin, TwinId};
use std::sync::Arc;
use tracing::info;

/// Tree and system graph queries against one entity store
pub struct TwinService<S: TwinStore + ?Sized> {
    store: Arc<S>,
    config: TraversalConfig,
    cancel: Option<CancellationToken>,
}

impl<S: TwinStore + ?Sized> TwinService<S> {
    pub fn new(store: Arc<S>, config: TraversalConfig) -> Self {
        Self {
            store,
            config,
            cancel: None,
        }
    }

    pub fn with_default_config(store: Arc<S>) -> Self {
        Self::new(store, TraversalConfig::default())
    }

    /// Cancel every traversal started through this service once `token` fires
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &TraversalConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Descendants of the given twins
    ///
    /// Returns the trees whose parent is one of `root_ids`, i.e. the direct
    /// children of the requested scope with their own subtrees. With no
    /// relationship names at all the resolved roots come back as single-node
    /// trees. Unknown ids are skipped; if none resolve the result is empty.
    pub async fn trees_by_ids(
        &self,
        root_ids: &[TwinId],
        child_model_ids: &[ModelId],
        outgoing: &[String],
        incoming: &[String],
    ) -> TraversalResult<Vec<NestedTwin>> {
        info!(
            "Get tree for twins {:?}, outgoing {:?}, incoming {:?}, child models {:?}",
            root_ids, outgoing, incoming, child_model_ids
        );
        if root_ids.is_empty() {
            return Err(TraversalError::InvalidRequest(
                "at least one root twin id is required".to_string(),
            ));
        }

        let roots = until_cancelled(self.cancel.as_ref(), self.store.get_twins_by_ids(root_ids))
            .await?
            .content;
        if roots.is_empty() {
            return Ok(Vec::new());
        }

        let filter = tree_filter(child_model_ids, outgoing, incoming);
        if filter.follows_nothing() {
            return Ok(sorted(single_nodes(roots)));
        }

        let forest = self.build_forest(roots, &filter).await?;
        Ok(sorted(forest.nested_all(&forest.children_of(root_ids))))
    }

    /// Full rooted trees starting from every twin of the given models
    ///
    /// Roots are paged out of the store until exhausted. Only nodes without a
    /// parent are returned, each with its whole subtree.
    pub async fn trees_by_models(
        &self,
        root_model_ids: &[ModelId],
        child_model_ids: &[ModelId],
        outgoing: &[String],
        incoming: &[String],
        exact_model_match: bool,
    ) -> TraversalResult<Vec<NestedTwin>> {
        info!(
            "Get tree for models {:?} (exact: {}), outgoing {:?}, incoming {:?}, child models {:?}",
            root_model_ids, exact_model_match, outgoing, incoming, child_model_ids
        );
        if root_model_ids.is_empty() {
            return Err(TraversalError::InvalidRequest(
                "at least one root model id is required".to_string(),
            ));
        }

        let query = ModelQuery::new(
            root_model_ids.to_vec(),
            exact_model_match,
            self.config.page_size,
        );
        let store = self.store.as_ref();
        let query = &query;
        let pages = collect_all_pages(move |token| async move {
            store.get_twins_by_model(query, token.as_deref()).await
        });
        let roots = until_cancelled(self.cancel.as_ref(), pages).await?;
        if roots.is_empty() {
            return Ok(Vec::new());
        }

        let filter = tree_filter(child_model_ids, outgoing, incoming);
        if filter.follows_nothing() {
            return Ok(sorted(single_nodes(roots)));
        }

        let forest = self.build_forest(roots, &filter).await?;
        Ok(sorted(forest.nested_all(&forest.roots())))
    }

    /// Semantic graph around `seed_ids`; the configured sentinel expands to
    /// every twin of the top-level models
    pub async fn build_system_graph(&self, seed_ids: &[TwinId]) -> TraversalResult<TwinGraph> {
        Ok(self.system_graph(seed_ids).await?.into_graph())
    }

    /// Like [`build_system_graph`](Self::build_system_graph), keeping the
    /// traversal statistics and the termination reason
    pub async fn system_graph(&self, seed_ids: &[TwinId]) -> TraversalResult<SystemGraph> {
        info!("Get system graph for {:?}", seed_ids);
        let mut builder = SystemGraphBuilder::new(self.store.as_ref(), &self.config);
        if let Some(token) = &self.cancel {
            builder = builder.with_cancel_token(token.clone());
        }
        builder.build(seed_ids).await
    }

    async fn build_forest(
        &self,
        roots: Vec<Twin>,
        filter: &TreeFilter,
    ) -> TraversalResult<TwinForest> {
        let mut builder = TreeBuilder::new(self.store.as_ref(), &self.config);
        if let Some(token) = &self.cancel {
            builder = builder.with_cancel_token(token.clone());
        }
        builder.build(roots, filter).await
    }
}

fn tree_filter(
    child_model_ids: &[ModelId],
    outgoing: &[String],
    incoming: &[String],
) -> TreeFilter {
    TreeFilter {
        outgoing: outgoing.to_vec(),
        incoming: incoming.to_vec(),
        child_models: child_model_ids.to_vec(),
    }
}

fn sorted(mut trees: Vec<NestedTwin>) -> Vec<NestedTwin> {
    sort_tree_nodes(&mut trees);
    trees
}

fn single_nodes(roots: Vec<Twin>) -> Vec<NestedTwin> {
    roots
        .into_iter()
        .map(|twin| NestedTwin {
            twin,
            parent_id: None,
            children: Vec::new(),
        })
        .collect()
}
