use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use crate::config::ExclusionPolicy;
use crate::configuration::TaskSelection;
use crate::error::GraphError;
use crate::project::{ProjectModel, ResourceId, Task, TaskAction, TaskPath, PATH_SEPARATOR};
use crate::selection::TaskArg;

/// A task as scheduled in one build.
#[derive(Clone)]
pub struct TaskNode {
    pub path: TaskPath,
    /// Indices of the nodes this one depends on.
    pub dependencies: Vec<usize>,
    pub resources: Vec<ResourceId>,
    pub action: Arc<dyn TaskAction>,
    pub args: Vec<TaskArg>,
}

impl std::fmt::Debug for TaskNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskNode")
            .field("path", &self.path)
            .field("dependencies", &self.dependencies)
            .field("resources", &self.resources)
            .field("args", &self.args)
            .finish()
    }
}

/// Task dependency graph (DAG) for one build invocation.
///
/// Nodes are stored in insertion order: depth-first post-order from the selected tasks,
/// in selection order, visiting dependencies in declaration order. Every dependency
/// therefore precedes its dependents.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: Vec<TaskNode>,
    index: HashMap<TaskPath, usize>,
    /// Reverse edges: node -> nodes that depend on it
    dependents: Vec<Vec<usize>>,
    stages: Vec<Vec<usize>>,
    retained_exclusions: Vec<TaskPath>,
}

impl TaskGraph {
    /// Computes the transitive closure of `selection` over `model`.
    ///
    /// Fails on the first unresolvable dependency or cycle. Excluded tasks are never
    /// roots; one still required by another task is kept or rejected per `policy`.
    pub fn build(
        model: &ProjectModel,
        selection: &TaskSelection,
        policy: ExclusionPolicy,
    ) -> Result<Self, GraphError> {
        let mut builder = GraphBuilder {
            model,
            excluded: &selection.excluded,
            policy,
            args: selection
                .tasks
                .iter()
                .map(|t| (t.path.clone(), t.args.clone()))
                .collect(),
            nodes: Vec::new(),
            index: HashMap::new(),
            path: Vec::new(),
            on_path: HashSet::new(),
            retained: Vec::new(),
        };

        for selected in &selection.tasks {
            if selection.excluded.contains(&selected.path) {
                continue;
            }
            builder.visit(&selected.path)?;
        }

        let GraphBuilder {
            nodes,
            index,
            retained,
            ..
        } = builder;

        let mut dependents = vec![Vec::new(); nodes.len()];
        for (idx, node) in nodes.iter().enumerate() {
            for &dep in &node.dependencies {
                dependents[dep].push(idx);
            }
        }

        let mut graph = Self {
            nodes,
            index,
            dependents,
            stages: Vec::new(),
            retained_exclusions: retained,
        };
        graph.stages = graph.topological_stages();
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[TaskNode] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> Option<&TaskNode> {
        self.nodes.get(idx)
    }

    pub fn index_of(&self, path: &TaskPath) -> Option<usize> {
        self.index.get(path).copied()
    }

    pub fn contains(&self, path: &TaskPath) -> bool {
        self.index.contains_key(path)
    }

    pub fn dependents(&self, idx: usize) -> &[usize] {
        self.dependents.get(idx).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Kahn levels: every node's dependencies are in earlier stages.
    pub fn stages(&self) -> &[Vec<usize>] {
        &self.stages
    }

    pub fn stage_paths(&self) -> Vec<Vec<String>> {
        self.stages
            .iter()
            .map(|stage| {
                stage
                    .iter()
                    .map(|&i| self.nodes[i].path.to_string())
                    .collect()
            })
            .collect()
    }

    /// Deterministic topological order: stages flattened, ties by insertion order.
    pub fn plan_order(&self) -> Vec<usize> {
        self.stages.iter().flatten().copied().collect()
    }

    pub fn plan_paths(&self) -> Vec<&TaskPath> {
        self.plan_order()
            .into_iter()
            .map(|i| &self.nodes[i].path)
            .collect()
    }

    /// Excluded tasks kept because a non-excluded task depends on them.
    pub fn retained_exclusions(&self) -> &[TaskPath] {
        &self.retained_exclusions
    }

    /// Topological sort using Kahn's algorithm
    ///
    /// O(V + E). Nodes are already in a valid order, so every node is processed.
    fn topological_stages(&self) -> Vec<Vec<usize>> {
        let mut in_degree: Vec<usize> = self.nodes.iter().map(|n| n.dependencies.len()).collect();

        let mut stages = Vec::new();
        let mut current: Vec<usize> = (0..self.nodes.len())
            .filter(|&i| in_degree[i] == 0)
            .collect();

        while !current.is_empty() {
            let mut next = Vec::new();
            for &idx in &current {
                for &dependent in &self.dependents[idx] {
                    in_degree[dependent] -= 1;
                    if in_degree[dependent] == 0 {
                        next.push(dependent);
                    }
                }
            }
            // insertion order doubles as the tie-breaker
            next.sort_unstable();
            stages.push(std::mem::replace(&mut current, next));
        }
        stages
    }
}

struct GraphBuilder<'a> {
    model: &'a ProjectModel,
    excluded: &'a BTreeSet<TaskPath>,
    policy: ExclusionPolicy,
    args: HashMap<TaskPath, Vec<TaskArg>>,
    nodes: Vec<TaskNode>,
    index: HashMap<TaskPath, usize>,
    /// Current DFS path, for cycle reporting.
    path: Vec<TaskPath>,
    on_path: HashSet<TaskPath>,
    retained: Vec<TaskPath>,
}

/// A task whose dependencies are being walked; `cursor` is the next one to visit.
struct Frame<'a> {
    path: TaskPath,
    task: &'a Task,
    cursor: usize,
    dependencies: Vec<usize>,
}

impl<'a> GraphBuilder<'a> {
    /// Adds `root` and its dependency closure in post-order.
    ///
    /// Iterative with an explicit frame stack, so chain depth is bounded by memory only.
    fn visit(&mut self, root: &TaskPath) -> Result<(), GraphError> {
        if self.index.contains_key(root) {
            return Ok(());
        }
        let mut stack = vec![self.enter(root, None)?];

        while let Some(frame) = stack.last_mut() {
            let task = frame.task;
            if let Some(raw) = task.dependencies().get(frame.cursor) {
                frame.cursor += 1;
                let dep = resolve_dependency(self.model, task, raw)?;
                if let Some(&idx) = self.index.get(&dep) {
                    if !frame.dependencies.contains(&idx) {
                        frame.dependencies.push(idx);
                    }
                    continue;
                }
                if self.on_path.contains(&dep) {
                    return Err(self.cycle_through(&dep));
                }
                let required_by = frame.path.clone();
                let next = self.enter(&dep, Some(&required_by))?;
                stack.push(next);
                continue;
            }

            let Some(done) = stack.pop() else { break };
            let idx = self.finish(done);
            if let Some(parent) = stack.last_mut() {
                if !parent.dependencies.contains(&idx) {
                    parent.dependencies.push(idx);
                }
            }
        }
        Ok(())
    }

    fn enter(&mut self, path: &TaskPath, required_by: Option<&TaskPath>) -> Result<Frame<'a>, GraphError> {
        if let Some(required_by) = required_by {
            if self.excluded.contains(path) {
                self.check_exclusion(path, required_by)?;
            }
        }
        let model = self.model;
        let task = model
            .task(path)
            .ok_or_else(|| GraphError::UnknownDependency {
                task: required_by.unwrap_or(path).to_string(),
                dependency: path.to_string(),
            })?;

        self.path.push(path.clone());
        self.on_path.insert(path.clone());
        Ok(Frame {
            path: path.clone(),
            task,
            cursor: 0,
            dependencies: Vec::with_capacity(task.dependencies().len()),
        })
    }

    fn finish(&mut self, frame: Frame<'a>) -> usize {
        self.path.pop();
        self.on_path.remove(&frame.path);

        let idx = self.nodes.len();
        self.index.insert(frame.path.clone(), idx);
        self.nodes.push(TaskNode {
            args: self.args.remove(&frame.path).unwrap_or_default(),
            path: frame.path,
            dependencies: frame.dependencies,
            resources: frame.task.resources().to_vec(),
            action: frame.task.action(),
        });
        idx
    }

    /// `dep` is already on the current path: report the path slice from it, closed by `dep`.
    fn cycle_through(&self, dep: &TaskPath) -> GraphError {
        let pos = self.path.iter().position(|p| p == dep).unwrap_or(0);
        let mut cycle: Vec<String> = self.path[pos..].iter().map(ToString::to_string).collect();
        cycle.push(dep.to_string());
        GraphError::CircularDependency(cycle)
    }

    fn check_exclusion(&mut self, excluded: &TaskPath, required_by: &TaskPath) -> Result<(), GraphError> {
        match self.policy {
            ExclusionPolicy::Reject => Err(GraphError::ExcludedTaskRequired {
                excluded: excluded.to_string(),
                required_by: required_by.to_string(),
            }),
            ExclusionPolicy::Retain => {
                tracing::warn!(
                    task = %excluded,
                    required_by = %required_by,
                    "excluded task is still required and will run"
                );
                self.retained.push(excluded.clone());
                Ok(())
            }
        }
    }
}

/// `:lib:jar` is absolute; `compile` or `sub:compile` are relative to the declaring project.
fn resolve_dependency(model: &ProjectModel, task: &Task, raw: &str) -> Result<TaskPath, GraphError> {
    let unknown = || GraphError::UnknownDependency {
        task: task.path().to_string(),
        dependency: raw.to_string(),
    };
    let absolute = if raw.starts_with(PATH_SEPARATOR) {
        raw.to_string()
    } else if task.path().project().is_root() {
        format!("{PATH_SEPARATOR}{raw}")
    } else {
        format!("{}{PATH_SEPARATOR}{raw}", task.path().project())
    };
    let path = TaskPath::parse(&absolute).map_err(|_| unknown())?;
    if model.task(&path).is_none() {
        return Err(unknown());
    }
    Ok(path)
}
