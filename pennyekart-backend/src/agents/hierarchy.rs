//! Builds the agent forest shown in the tree view.
//!
//! Parents are resolved only within the rows passed in, so a filtered view
//! becomes a forest rather than an error: an agent whose parent is missing
//! from the input is a root. Construction uses an index arena and explicit
//! stacks, so it terminates on any input, including parent cycles left
//! behind by bad writes. Every input agent appears exactly once in the output.

use std::collections::HashMap;

use crate::models::{Agent, AgentNode, HierarchyView};

/// Build the forest for `agents`. Roots keep input order; children are
/// sorted by role rank, then name.
pub fn build_hierarchy(agents: &[Agent]) -> Vec<AgentNode> {
    let n = agents.len();

    let mut index: HashMap<&str, usize> = HashMap::with_capacity(n);
    for (i, agent) in agents.iter().enumerate() {
        index.entry(agent.id.as_str()).or_insert(i);
    }

    let parent_of: Vec<Option<usize>> = agents
        .iter()
        .enumerate()
        .map(|(i, agent)| {
            agent
                .parent_agent_id
                .as_deref()
                .and_then(|pid| index.get(pid).copied())
                .filter(|&p| p != i)
        })
        .collect();

    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, parent) in parent_of.iter().enumerate() {
        if let Some(p) = parent {
            children_of[*p].push(i);
        }
    }
    for children in children_of.iter_mut() {
        children.sort_by(|&a, &b| {
            let (a, b) = (&agents[a], &agents[b]);
            (a.role.rank(), &a.name).cmp(&(b.role.rank(), &b.name))
        });
    }

    // Pre-order walk from every root, recording the tree edges actually taken.
    let mut visited = vec![false; n];
    let mut preorder: Vec<usize> = Vec::with_capacity(n);
    let mut tree_children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut root_ids: Vec<usize> = Vec::new();

    let walk = |start: usize,
                visited: &mut [bool],
                preorder: &mut Vec<usize>,
                tree_children: &mut [Vec<usize>]| {
        let mut stack: Vec<(usize, Option<usize>)> = vec![(start, None)];
        while let Some((node, via)) = stack.pop() {
            if visited[node] {
                continue;
            }
            visited[node] = true;
            preorder.push(node);
            if let Some(p) = via {
                tree_children[p].push(node);
            }
            for &child in children_of[node].iter().rev() {
                if !visited[child] {
                    stack.push((child, Some(node)));
                }
            }
        }
    };

    for i in 0..n {
        if parent_of[i].is_none() {
            root_ids.push(i);
            walk(i, &mut visited, &mut preorder, &mut tree_children);
        }
    }

    // Anything left is on a parent cycle; break it at the first member seen.
    for i in 0..n {
        if !visited[i] {
            log::warn!(
                "Agent {} is on a parent cycle; showing it as a root",
                agents[i].id
            );
            root_ids.push(i);
            walk(i, &mut visited, &mut preorder, &mut tree_children);
        }
    }

    // Reverse pre-order: every child is finished before its parent.
    let mut built: Vec<Option<AgentNode>> = (0..n).map(|_| None).collect();
    for &node in preorder.iter().rev() {
        let children = tree_children[node]
            .iter()
            .filter_map(|&c| built[c].take())
            .collect();
        built[node] = Some(AgentNode {
            agent: agents[node].clone(),
            children,
        });
    }

    root_ids
        .into_iter()
        .filter_map(|r| built[r].take())
        .collect()
}

/// Forest plus the flat rows it was built from.
pub fn hierarchy_view(agents: Vec<Agent>) -> HierarchyView {
    let roots = build_hierarchy(&agents);
    HierarchyView { roots, agents }
}

/// Total nodes in a forest, descendants included.
pub fn count_nodes(roots: &[AgentNode]) -> usize {
    let mut count = 0;
    let mut stack: Vec<&AgentNode> = roots.iter().collect();
    while let Some(node) = stack.pop() {
        count += 1;
        stack.extend(node.children.iter());
    }
    count
}

/// Pre-order rows with their depth (roots at 0), for indented tables.
pub fn flatten(roots: &[AgentNode]) -> Vec<(usize, &Agent)> {
    let mut rows = Vec::new();
    let mut stack: Vec<(usize, &AgentNode)> = roots.iter().rev().map(|r| (0, r)).collect();
    while let Some((depth, node)) = stack.pop() {
        rows.push((depth, &node.agent));
        for child in node.children.iter().rev() {
            stack.push((depth + 1, child));
        }
    }
    rows
}
