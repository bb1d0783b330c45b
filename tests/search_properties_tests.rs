//! Flood fill and A* properties on small toroidal grids
//!
//! Random grids come from a seeded StdRng so every run sees the same boards.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use tron_engine::grid::{toroidal_distance, Grid, OccupancyView};
use tron_engine::pathfinding::{first_step, PathPlanner};
use tron_engine::reachability::{flood_fill, flood_fill_with, Traversal};
use tron_engine::types::{Coord, Direction};

fn random_grid(rng: &mut StdRng, width: i32, height: i32, density: f64) -> Grid {
    let mut grid = Grid::new(width, height);
    for y in 0..height {
        for x in 0..width {
            if rng.random_bool(density) {
                grid.occupy(Coord::new(x, y));
            }
        }
    }
    grid
}

/// Plain BFS step count from `start` to `goal` over free cells; `start` may be
/// occupied, as it may be for the planner
fn bfs_distance(grid: &Grid, start: Coord, goal: Coord) -> Option<usize> {
    let width = grid.width();
    let index = |c: Coord| (c.y * width + c.x) as usize;
    let mut dist = vec![usize::MAX; (width * grid.height()) as usize];
    let mut queue = VecDeque::new();
    dist[index(start)] = 0;
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        if current == goal {
            return Some(dist[index(current)]);
        }
        for dir in Direction::all() {
            let next = grid.step(current, dir);
            if dist[index(next)] != usize::MAX || grid.is_occupied(next) {
                continue;
            }
            dist[index(next)] = dist[index(current)] + 1;
            queue.push_back(next);
        }
    }
    None
}

#[test]
fn test_path_length_matches_toroidal_distance_on_empty_grid() {
    let grid = Grid::new(8, 8);
    let mut planner = PathPlanner::new();
    let cells: Vec<Coord> = grid.coords().collect();

    for &start in &cells {
        for &goal in &cells {
            let path = planner.find_path(&grid, start, goal);
            let expected = 1 + toroidal_distance(start, goal, 8, 8) as usize;
            assert_eq!(
                path.len(),
                expected,
                "path {:?} -> {:?} has wrong length",
                start,
                goal
            );
            assert_eq!(path.first(), Some(&start));
            assert_eq!(path.last(), Some(&goal));
        }
    }
}

#[test]
fn test_flood_fill_on_empty_grid_covers_everything() {
    for &(width, height) in &[(1, 1), (3, 7), (8, 8), (64, 64)] {
        let grid = Grid::new(width, height);
        for start in [
            Coord::new(0, 0),
            Coord::new(width - 1, height - 1),
            Coord::new(width / 2, height / 3),
        ] {
            assert_eq!(
                flood_fill(start, &grid),
                (width * height) as usize,
                "{}x{} from {:?}",
                width,
                height,
                start
            );
        }
    }
}

#[test]
fn test_flood_fill_is_independent_of_traversal_order() {
    let mut rng = StdRng::seed_from_u64(0x7e57);

    for _ in 0..200 {
        let width = rng.random_range(2..12);
        let height = rng.random_range(2..12);
        let density = rng.random_range(0.1..0.6);
        let grid = random_grid(&mut rng, width, height, density);
        let start = Coord::new(rng.random_range(0..width), rng.random_range(0..height));

        assert_eq!(
            flood_fill_with(start, &grid, Traversal::BreadthFirst),
            flood_fill_with(start, &grid, Traversal::DepthFirst),
            "traversal order changed the count on a {}x{} grid from {:?}",
            width,
            height,
            start
        );
    }
}

#[test]
fn test_flood_fill_never_counts_occupied_cells() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..100 {
        let grid = random_grid(&mut rng, 10, 10, 0.35);
        let free = 100 - grid.occupied_count();
        let start = Coord::new(rng.random_range(0..10), rng.random_range(0..10));
        assert!(flood_fill(start, &grid) <= free);
    }
}

#[test]
fn test_random_paths_are_valid_and_shortest() {
    let mut rng = StdRng::seed_from_u64(2025);
    let mut planner = PathPlanner::new();
    let mut reachable_pairs = 0;

    for _ in 0..300 {
        let grid = random_grid(&mut rng, 10, 10, 0.3);
        let start = Coord::new(rng.random_range(0..10), rng.random_range(0..10));
        let goal = Coord::new(rng.random_range(0..10), rng.random_range(0..10));

        let path = planner.find_path(&grid, start, goal);
        let shortest = bfs_distance(&grid, start, goal);

        let Some(steps) = shortest else {
            assert!(path.is_empty(), "found a path {:?} -> {:?} BFS cannot", start, goal);
            continue;
        };
        reachable_pairs += 1;

        assert_eq!(path.len(), steps + 1, "path {:?} -> {:?} is not shortest", start, goal);
        assert_eq!(path[0], start);
        assert_eq!(*path.last().unwrap(), goal);
        assert!(path.len() > toroidal_distance(start, goal, 10, 10) as usize);
        for pair in path.windows(2) {
            assert!(grid.direction_between(pair[0], pair[1]).is_some());
            assert!(!grid.is_occupied(pair[1]), "path crosses occupied {:?}", pair[1]);
        }
        if path.len() > 1 {
            assert!(first_step(&grid, &path).is_some());
        }
    }

    assert!(reachable_pairs > 50, "too few reachable pairs: {}", reachable_pairs);
}

#[test]
fn test_reachable_goal_always_has_a_path() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut planner = PathPlanner::new();

    for _ in 0..50 {
        let grid = random_grid(&mut rng, 8, 8, 0.3);
        let Some(start) = grid.coords().find(|&c| !grid.is_occupied(c)) else {
            continue;
        };
        let reachable = flood_fill(start, &grid);

        // Every free cell the planner reaches is part of start's region
        let found = grid
            .coords()
            .filter(|&goal| !planner.find_path(&grid, start, goal).is_empty())
            .count();
        assert_eq!(found, reachable);
    }
}
