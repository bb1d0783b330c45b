// Reachable free-area counting (flood fill) on a toroidal occupancy view

use std::collections::VecDeque;

use crate::grid::OccupancyView;
use crate::profile;
use crate::simple_profiler::Category;
use crate::types::{Coord, Direction};

/// Order in which the frontier is expanded. Only affects performance; the
/// count returned is identical for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    BreadthFirst,
    DepthFirst,
}

/// Counts free cells reachable from `start` with 4-connectivity and wrap.
///
/// The traversal always seeds at `start`; `start` itself is counted only if
/// it is free. This lets callers ask "how much room is left once I stand
/// here" by passing a view with `start` marked occupied. The view is never
/// mutated.
pub fn flood_fill<V: OccupancyView>(start: Coord, view: &V) -> usize {
    flood_fill_with(start, view, Traversal::BreadthFirst)
}

pub fn flood_fill_with<V: OccupancyView>(start: Coord, view: &V, order: Traversal) -> usize {
    profile!(Category::FloodFill, {
        let width = view.width();
        let start = view.wrap(start);
        let index = |c: Coord| (c.y * width + c.x) as usize;

        let mut visited = vec![false; (width * view.height()) as usize];
        let mut frontier = VecDeque::new();
        visited[index(start)] = true;
        frontier.push_back(start);

        let mut count = 0;
        if !view.is_occupied(start) {
            count += 1;
        }

        loop {
            let current = match order {
                Traversal::BreadthFirst => frontier.pop_front(),
                Traversal::DepthFirst => frontier.pop_back(),
            };
            let Some(current) = current else { break };

            for dir in Direction::all() {
                let next = view.step(current, dir);
                let idx = index(next);
                if visited[idx] || view.is_occupied(next) {
                    continue;
                }
                visited[idx] = true;
                count += 1;
                frontier.push_back(next);
            }
        }

        count
    })
}
