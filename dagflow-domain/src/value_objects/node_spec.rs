// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Node Spec
//!
//! The frozen declaration of a single DAG node: its id, its declared
//! dependencies, the stage it runs, and how much it costs to run. Built
//! once by the caller (or the sweep expander) and handed to
//! [`crate::aggregates::dag::DagBuilder`], never mutated afterward.

use crate::stage::Stage;
use crate::state::{DagState, State};
use crate::value_objects::node_resources::NodeResources;
use std::fmt;
use std::sync::Arc;

/// Chooses a single input state for a node with more than one dependency,
/// when the caller does not want the default fan-in container behaviour
/// of exposing every dependency's state via [`DagState`].
pub type InputSelector<S> = Arc<dyn Fn(&DagState<S>) -> S + Send + Sync>;

/// A node's immutable specification within a [`crate::aggregates::dag::Dag`].
#[derive(Clone)]
pub struct NodeSpec<S: State> {
    pub id: String,
    pub deps: Vec<String>,
    pub op_name: String,
    pub version: String,
    pub stage: Arc<dyn Stage<S>>,
    pub resources: NodeResources,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub input_selector: Option<InputSelector<S>>,
}

impl<S: State> fmt::Debug for NodeSpec<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSpec")
            .field("id", &self.id)
            .field("deps", &self.deps)
            .field("op_name", &self.op_name)
            .field("version", &self.version)
            .field("resources", &self.resources)
            .finish()
    }
}

impl<S: State> NodeSpec<S> {
    pub fn new(
        id: impl Into<String>,
        deps: Vec<String>,
        op_name: impl Into<String>,
        version: impl Into<String>,
        stage: Arc<dyn Stage<S>>,
    ) -> Self {
        Self {
            id: id.into(),
            deps,
            op_name: op_name.into(),
            version: version.into(),
            stage,
            resources: NodeResources::default(),
            metadata: serde_json::Map::new(),
            input_selector: None,
        }
    }

    pub fn with_resources(mut self, resources: NodeResources) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_input_selector(mut self, selector: InputSelector<S>) -> Self {
        self.input_selector = Some(selector);
        self
    }
}
