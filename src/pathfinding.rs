// A* shortest-path search on the toroidal grid
//
// Search nodes live in an arena and refer to their predecessor by index, so a
// path is rebuilt by walking indices backwards. The arena is cleared at the
// start of every search.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::grid::OccupancyView;
use crate::profile;
use crate::simple_profiler::Category;
use crate::types::{Coord, Direction};

/// One search node: coordinates, cost so far, heuristic, predecessor index
#[derive(Debug, Clone, Copy)]
struct PathNode {
    coord: Coord,
    g: u32,
    h: u32,
    parent: Option<usize>,
}

impl PathNode {
    fn cost(&self) -> u32 {
        self.g + self.h
    }
}

/// Frontier entry pointing into the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenEntry {
    cost: u32,
    seq: u64,
    node: usize,
}

/// Lowest total cost first, then earliest insertion
fn frontier_order(a: &OpenEntry, b: &OpenEntry) -> Ordering {
    a.cost.cmp(&b.cost).then(a.seq.cmp(&b.seq))
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap
        frontier_order(other, self)
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reusable A* planner. Holds scratch buffers only; no grid state.
#[derive(Debug, Default)]
pub struct PathPlanner {
    arena: Vec<PathNode>,
    closed: Vec<bool>,
    expanded: usize,
}

impl PathPlanner {
    pub fn new() -> Self {
        PathPlanner::default()
    }

    /// Number of cells expanded by the most recent search
    pub fn last_expanded(&self) -> usize {
        self.expanded
    }

    /// Finds a shortest path from `start` to `goal`, both inclusive.
    ///
    /// Returns an empty path when the goal cannot be reached. The start cell
    /// may be occupied (an agent stands on its own trace); every other cell
    /// on the path is free. Each cell is expanded at most once.
    pub fn find_path<V: OccupancyView>(&mut self, view: &V, start: Coord, goal: Coord) -> Vec<Coord> {
        profile!(Category::PathSearch, {
            let width = view.width();
            let start = view.wrap(start);
            let goal = view.wrap(goal);
            let index = |c: Coord| (c.y * width + c.x) as usize;

            self.arena.clear();
            self.closed.clear();
            self.closed.resize((width * view.height()) as usize, false);
            self.expanded = 0;

            let mut open = BinaryHeap::new();
            let mut seq = 0u64;

            let h = view.distance(start, goal) as u32;
            self.arena.push(PathNode {
                coord: start,
                g: 0,
                h,
                parent: None,
            });
            open.push(OpenEntry {
                cost: h,
                seq,
                node: 0,
            });

            while let Some(entry) = open.pop() {
                let current = self.arena[entry.node];

                if current.coord == goal {
                    return self.reconstruct(entry.node);
                }

                let idx = index(current.coord);
                if self.closed[idx] {
                    continue;
                }
                self.closed[idx] = true;
                self.expanded += 1;

                for dir in Direction::all() {
                    let next = view.step(current.coord, dir);
                    if self.closed[index(next)] || view.is_occupied(next) {
                        continue;
                    }
                    let node = PathNode {
                        coord: next,
                        g: current.g + 1,
                        h: view.distance(next, goal) as u32,
                        parent: Some(entry.node),
                    };
                    seq += 1;
                    self.arena.push(node);
                    open.push(OpenEntry {
                        cost: node.cost(),
                        seq,
                        node: self.arena.len() - 1,
                    });
                }
            }

            Vec::new()
        })
    }

    fn reconstruct(&self, mut node: usize) -> Vec<Coord> {
        let mut path = vec![self.arena[node].coord];
        while let Some(parent) = self.arena[node].parent {
            path.push(self.arena[parent].coord);
            node = parent;
        }
        path.reverse();
        path
    }
}

/// Direction of the first step along `path`, if it has one
pub fn first_step<V: OccupancyView>(view: &V, path: &[Coord]) -> Option<Direction> {
    match path {
        [from, to, ..] => view.direction_between(*from, *to),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    fn assert_valid_path(grid: &Grid, path: &[Coord]) {
        for pair in path.windows(2) {
            assert!(
                grid.direction_between(pair[0], pair[1]).is_some(),
                "{:?} -> {:?} is not a single step",
                pair[0],
                pair[1]
            );
        }
        for cell in path.iter().skip(1) {
            assert!(!grid.is_occupied(*cell), "path crosses occupied {:?}", cell);
        }
    }

    #[test]
    fn test_start_equals_goal() {
        let grid = Grid::new(8, 8);
        let mut planner = PathPlanner::new();
        assert_eq!(
            planner.find_path(&grid, Coord::new(3, 3), Coord::new(3, 3)),
            vec![Coord::new(3, 3)]
        );
    }

    #[test]
    fn test_straight_line_path() {
        let grid = Grid::new(8, 8);
        let mut planner = PathPlanner::new();
        let path = planner.find_path(&grid, Coord::new(1, 1), Coord::new(4, 1));
        assert_eq!(
            path,
            vec![
                Coord::new(1, 1),
                Coord::new(2, 1),
                Coord::new(3, 1),
                Coord::new(4, 1)
            ]
        );
        assert_eq!(first_step(&grid, &path), Some(Direction::Right));
    }

    #[test]
    fn test_path_uses_wrap_shortcut() {
        let grid = Grid::new(8, 8);
        let mut planner = PathPlanner::new();
        let path = planner.find_path(&grid, Coord::new(0, 3), Coord::new(7, 3));
        assert_eq!(path, vec![Coord::new(0, 3), Coord::new(7, 3)]);
        assert_eq!(first_step(&grid, &path), Some(Direction::Left));
    }

    #[test]
    fn test_path_detours_around_wall() {
        let mut grid = Grid::new(8, 8);
        // Wall at x=3 for y in 0..=5, gap at y=6 and y=7
        for y in 0..6 {
            grid.occupy(Coord::new(3, y));
        }
        let mut planner = PathPlanner::new();
        let path = planner.find_path(&grid, Coord::new(2, 2), Coord::new(4, 2));
        assert_valid_path(&grid, &path);
        assert_eq!(path.first(), Some(&Coord::new(2, 2)));
        assert_eq!(path.last(), Some(&Coord::new(4, 2)));
        // Leftwards round the torus (6 steps) beats the gap at y=7 (8 steps)
        assert_eq!(path.len(), 7);
    }

    #[test]
    fn test_path_uses_gap_when_torus_is_walled() {
        let mut grid = Grid::new(8, 8);
        for y in 0..6 {
            grid.occupy(Coord::new(3, y));
        }
        for y in 0..8 {
            grid.occupy(Coord::new(6, y));
        }
        let mut planner = PathPlanner::new();
        let path = planner.find_path(&grid, Coord::new(2, 2), Coord::new(4, 2));
        assert_valid_path(&grid, &path);
        // Up 3 through the wrap to y=7, right 2, down 3
        assert_eq!(path.len(), 9);
    }

    #[test]
    fn test_enclosed_goal_is_unreachable() {
        let mut grid = Grid::new(8, 8);
        let goal = Coord::new(5, 5);
        for dir in Direction::all() {
            grid.occupy(grid.step(goal, dir));
        }
        let mut planner = PathPlanner::new();
        assert!(planner.find_path(&grid, Coord::new(0, 0), goal).is_empty());
    }

    #[test]
    fn test_occupied_goal_is_unreachable() {
        let mut grid = Grid::new(8, 8);
        grid.occupy(Coord::new(2, 0));
        let mut planner = PathPlanner::new();
        assert!(planner
            .find_path(&grid, Coord::new(0, 0), Coord::new(2, 0))
            .is_empty());
    }

    #[test]
    fn test_occupied_start_can_still_leave() {
        let mut grid = Grid::new(8, 8);
        grid.occupy(Coord::new(0, 0));
        let mut planner = PathPlanner::new();
        let path = planner.find_path(&grid, Coord::new(0, 0), Coord::new(0, 2));
        assert_eq!(path.len(), 3);
        assert_valid_path(&grid, &path);
    }

    #[test]
    fn test_planner_is_reusable_across_searches() {
        let grid = Grid::new(8, 8);
        let mut planner = PathPlanner::new();
        let long = planner.find_path(&grid, Coord::new(0, 0), Coord::new(4, 4));
        assert_eq!(long.len(), 9);
        let short = planner.find_path(&grid, Coord::new(2, 2), Coord::new(2, 3));
        assert_eq!(short.len(), 2);
        assert!(planner.last_expanded() >= 1);
    }

    #[test]
    fn test_frontier_order_prefers_low_cost_then_insertion() {
        let a = OpenEntry { cost: 3, seq: 5, node: 0 };
        let b = OpenEntry { cost: 4, seq: 1, node: 1 };
        let c = OpenEntry { cost: 3, seq: 2, node: 2 };
        let mut heap = BinaryHeap::new();
        heap.push(a);
        heap.push(b);
        heap.push(c);
        assert_eq!(heap.pop().map(|e| e.node), Some(2));
        assert_eq!(heap.pop().map(|e| e.node), Some(0));
        assert_eq!(heap.pop().map(|e| e.node), Some(1));
    }
}
