use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::{DumpConfig, EmissionOrder};
use crate::constraints::{Deferrable, FkAction, ForeignKey};
use crate::error::{Error, Result};
use crate::schema::{DatabaseSchema, table_key};

/// Directed foreign key edge between two qualified tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKeyEdge {
    /// Table declaring the constraint.
    pub from_table: String,
    pub columns: Vec<String>,
    /// Table being referenced.
    pub to_table: String,
    pub referenced_columns: Vec<String>,
    pub name: Option<String>,
    pub on_update: FkAction,
    pub on_delete: FkAction,
    pub deferrable: Deferrable,
}

impl ForeignKeyEdge {
    pub fn from_foreign_key(from_table: impl Into<String>, fk: &ForeignKey) -> Self {
        Self {
            from_table: from_table.into(),
            columns: fk.columns.clone(),
            to_table: table_key(&fk.referenced_schema, &fk.referenced_table),
            referenced_columns: fk.referenced_columns.clone(),
            name: fk.name.clone(),
            on_update: fk.on_update,
            on_delete: fk.on_delete,
            deferrable: fk.deferrable,
        }
    }

    /// Self references (e.g. `parent_id`) never take part in cycle breaking.
    pub fn is_self_reference(&self) -> bool {
        self.from_table == self.to_table
    }
}

/// Emission plan for a schema dump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DumpPlan {
    /// Every table, in emission order.
    pub tables: Vec<String>,
    /// Foreign keys declared inside their own table definition, keyed by `from_table`.
    pub inline: BTreeMap<String, Vec<ForeignKeyEdge>>,
    /// Foreign keys emitted after all tables, keyed by `to_table`.
    pub deferred: BTreeMap<String, Vec<ForeignKeyEdge>>,
}

impl DumpPlan {
    pub fn inline_for(&self, table: &str) -> &[ForeignKeyEdge] {
        self.inline.get(table).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn deferred_for(&self, table: &str) -> &[ForeignKeyEdge] {
        self.deferred.get(table).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn inline_count(&self) -> usize {
        self.inline.values().map(Vec::len).sum()
    }

    pub fn deferred_count(&self) -> usize {
        self.deferred.values().map(Vec::len).sum()
    }

    /// Deferred edges flattened in trailer order.
    pub fn deferred_edges(&self) -> impl Iterator<Item = &ForeignKeyEdge> {
        self.deferred.values().flatten()
    }
}

/// Qualified keys of every table in the schema.
pub fn table_keys(schema: &DatabaseSchema) -> BTreeSet<String> {
    schema.tables().map(|(key, _)| key).collect()
}

/// Flatten every foreign key constraint in the schema into graph edges.
pub fn collect_edges(schema: &DatabaseSchema) -> Vec<ForeignKeyEdge> {
    schema
        .tables()
        .flat_map(|(key, table)| {
            table
                .foreign_keys()
                .map(move |fk| ForeignKeyEdge::from_foreign_key(key.clone(), fk))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Plan a dump of the whole schema using the configured emission order.
pub fn plan_dump(schema: &DatabaseSchema, config: &DumpConfig) -> Result<DumpPlan> {
    let mut tables = BTreeSet::new();
    for (key, _) in schema.tables() {
        if tables.contains(&key) {
            return Err(Error::InvalidSchema(format!("ambiguous table key: {key}")));
        }
        tables.insert(key);
    }
    let edges = collect_edges(schema);

    tracing::debug!(
        event = "plan_started",
        tables = tables.len(),
        edges = edges.len()
    );

    let plan = plan_edges(&tables, edges, config.order)?;

    tracing::debug!(
        event = "plan_finished",
        inline = plan.inline_count(),
        deferred = plan.deferred_count()
    );

    Ok(plan)
}

/// Partition `edges` into inline and deferred sets so that the inline edges are acyclic.
///
/// Each cyclic strongly connected component is broken at its lexicographically
/// smallest table: that table's edges into the component are deferred, and the
/// components are recomputed until none remain. Self references stay inline.
pub fn plan_edges(
    tables: &BTreeSet<String>,
    edges: Vec<ForeignKeyEdge>,
    order: EmissionOrder,
) -> Result<DumpPlan> {
    for edge in &edges {
        for endpoint in [&edge.from_table, &edge.to_table] {
            if !tables.contains(endpoint) {
                return Err(Error::DanglingReference(endpoint.clone()));
            }
        }
    }

    let limit = edges.len();
    let mut inline: BTreeMap<String, Vec<ForeignKeyEdge>> = BTreeMap::new();
    for edge in edges {
        inline.entry(edge.from_table.clone()).or_default().push(edge);
    }
    for list in inline.values_mut() {
        list.sort_by(compare_edges);
    }

    let mut deferred: BTreeMap<String, Vec<ForeignKeyEdge>> = BTreeMap::new();
    let mut rounds = 0;

    loop {
        let cyclic = cyclic_components(&dependency_graph(tables, inline.values().flatten()));
        if cyclic.is_empty() {
            break;
        }
        if rounds >= limit {
            return Err(Error::UnresolvableCycle(cyclic.into_iter().flatten().collect()));
        }
        rounds += 1;

        for component in cyclic {
            // Components come back sorted, so the first member is the breaker.
            let breaker = &component[0];
            let members: BTreeSet<&str> = component.iter().map(String::as_str).collect();
            let Some(list) = inline.get_mut(breaker) else {
                continue;
            };

            let (moved, kept): (Vec<_>, Vec<_>) =
                std::mem::take(list).into_iter().partition(|edge| {
                    !edge.is_self_reference() && members.contains(edge.to_table.as_str())
                });
            *list = kept;

            tracing::debug!(
                event = "cycle_broken",
                breaker = %breaker,
                component = ?component,
                deferred = moved.len()
            );

            for edge in moved {
                deferred.entry(edge.to_table.clone()).or_default().push(edge);
            }
        }
    }

    inline.retain(|_, list| !list.is_empty());
    for list in deferred.values_mut() {
        list.sort_by(|left, right| {
            left.from_table
                .cmp(&right.from_table)
                .then_with(|| compare_edges(left, right))
        });
    }

    let tables = match order {
        EmissionOrder::Alphabetical => tables.iter().cloned().collect(),
        EmissionOrder::Topological => {
            let graph = dependency_graph(tables, inline.values().flatten());
            toposort(&graph).map_err(Error::UnresolvableCycle)?
        }
    };

    Ok(DumpPlan {
        tables,
        inline,
        deferred,
    })
}

/// Strongly connected components with more than one table, each sorted by name.
pub fn find_cycles(tables: &BTreeSet<String>, edges: &[ForeignKeyEdge]) -> Vec<Vec<String>> {
    cyclic_components(&dependency_graph(tables, edges))
}

fn compare_edges(left: &ForeignKeyEdge, right: &ForeignKeyEdge) -> Ordering {
    left.columns
        .cmp(&right.columns)
        .then_with(|| left.name.cmp(&right.name))
        .then_with(|| left.to_table.cmp(&right.to_table))
        .then_with(|| left.referenced_columns.cmp(&right.referenced_columns))
        .then_with(|| left.on_update.cmp(&right.on_update))
        .then_with(|| left.on_delete.cmp(&right.on_delete))
        .then_with(|| left.deferrable.cmp(&right.deferrable))
}

/// Table -> tables it depends on, ignoring self references.
fn dependency_graph<'a>(
    tables: &BTreeSet<String>,
    edges: impl IntoIterator<Item = &'a ForeignKeyEdge>,
) -> BTreeMap<String, BTreeSet<String>> {
    let mut graph: BTreeMap<String, BTreeSet<String>> = tables
        .iter()
        .map(|table| (table.clone(), BTreeSet::new()))
        .collect();

    for edge in edges {
        if !edge.is_self_reference() {
            graph
                .entry(edge.from_table.clone())
                .or_default()
                .insert(edge.to_table.clone());
        }
    }

    graph
}

fn cyclic_components(graph: &BTreeMap<String, BTreeSet<String>>) -> Vec<Vec<String>> {
    let mut cyclic: Vec<Vec<String>> = strongly_connected(graph)
        .into_iter()
        .filter(|component| component.len() > 1)
        .collect();
    cyclic.sort();
    cyclic
}

/// Tarjan's algorithm with an explicit call stack.
fn strongly_connected(graph: &BTreeMap<String, BTreeSet<String>>) -> Vec<Vec<String>> {
    let names: Vec<&String> = graph.keys().collect();
    let ids: BTreeMap<&str, usize> = names
        .iter()
        .enumerate()
        .map(|(id, name)| (name.as_str(), id))
        .collect();
    let adjacency: Vec<Vec<usize>> = graph
        .values()
        .map(|targets| {
            targets
                .iter()
                .filter_map(|target| ids.get(target.as_str()).copied())
                .collect()
        })
        .collect();

    let count = names.len();
    let mut index: Vec<Option<usize>> = vec![None; count];
    let mut low_link = vec![0usize; count];
    let mut on_stack = vec![false; count];
    let mut stack: Vec<usize> = Vec::new();
    let mut call: Vec<(usize, usize)> = Vec::new();
    let mut next_index = 0usize;
    let mut components = Vec::new();

    for root in 0..count {
        if index[root].is_some() {
            continue;
        }

        index[root] = Some(next_index);
        low_link[root] = next_index;
        next_index += 1;
        stack.push(root);
        on_stack[root] = true;
        call.push((root, 0));

        while let Some(frame) = call.last_mut() {
            let node = frame.0;

            if let Some(&next) = adjacency[node].get(frame.1) {
                frame.1 += 1;
                match index[next] {
                    None => {
                        index[next] = Some(next_index);
                        low_link[next] = next_index;
                        next_index += 1;
                        stack.push(next);
                        on_stack[next] = true;
                        call.push((next, 0));
                    }
                    Some(next_idx) if on_stack[next] => {
                        low_link[node] = low_link[node].min(next_idx);
                    }
                    Some(_) => {}
                }
                continue;
            }

            call.pop();
            if let Some(&(parent, _)) = call.last() {
                low_link[parent] = low_link[parent].min(low_link[node]);
            }

            if index[node] == Some(low_link[node]) {
                let mut component = Vec::new();
                while let Some(member) = stack.pop() {
                    on_stack[member] = false;
                    component.push(names[member].clone());
                    if member == node {
                        break;
                    }
                }
                component.sort();
                components.push(component);
            }
        }
    }

    components
}

/// Kahn's algorithm: dependencies first, ties broken by name. `Err` carries the
/// tables left on a cycle.
fn toposort(
    graph: &BTreeMap<String, BTreeSet<String>>,
) -> std::result::Result<Vec<String>, Vec<String>> {
    let mut dependents: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut pending: BTreeMap<&str, usize> = BTreeMap::new();

    for (node, dependencies) in graph {
        pending.insert(node.as_str(), dependencies.len());
        for dependency in dependencies {
            dependents
                .entry(dependency.as_str())
                .or_default()
                .insert(node.as_str());
        }
    }

    let mut ready: BTreeSet<&str> = pending
        .iter()
        .filter_map(|(node, count)| if *count == 0 { Some(*node) } else { None })
        .collect();

    let mut order = Vec::with_capacity(graph.len());

    while let Some(node) = ready.pop_first() {
        order.push(node.to_string());

        if let Some(targets) = dependents.get(node) {
            for target in targets {
                if let Some(count) = pending.get_mut(target) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(*target);
                    }
                }
            }
        }
    }

    if order.len() == graph.len() {
        Ok(order)
    } else {
        Err(pending
            .into_iter()
            .filter_map(|(node, count)| if count > 0 { Some(node.to_string()) } else { None })
            .collect())
    }
}
