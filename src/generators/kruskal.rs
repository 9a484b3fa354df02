use rand::{rngs::StdRng, seq::SliceRandom};

use super::{union_find::UnionFind, visit};
use crate::{
    control::Checkpoint,
    error::MazeError,
    maze::{Coord, Grid},
};

/// Wall edge between two adjacent cells
#[derive(Clone, Copy)]
struct Edge {
    cell1: Coord,
    cell2: Coord,
}

pub fn randomized_kruskal(
    grid: &Grid,
    rng: &mut StdRng,
    ctl: &dyn Checkpoint,
) -> Result<(), MazeError> {
    let (width, height) = (grid.width(), grid.height());
    let target = grid.len() - 1;

    // Collect all possible edges (walls between adjacent cells)
    let mut edges: Vec<Edge> = (0..height)
        .flat_map(|row| (0..width).map(move |col| (row, col)))
        .flat_map(|(row, col)| {
            [
                (col + 1 < width).then_some(Edge {
                    cell1: (row, col),
                    cell2: (row, col + 1),
                }),
                (row + 1 < height).then_some(Edge {
                    cell1: (row, col),
                    cell2: (row + 1, col),
                }),
            ]
        })
        .flatten()
        .collect();
    edges.shuffle(rng);

    if target == 0 {
        visit(grid, (0, 0));
        return ctl.checkpoint();
    }

    let mut sets = UnionFind::new(grid.len());
    let mut unions = 0;
    for edge in edges {
        let idx1 = grid.ravel_index(edge.cell1);
        let idx2 = grid.ravel_index(edge.cell2);

        // Only join cells that are not yet connected, so no cycles form
        if sets.union(idx1, idx2) {
            grid.connect(edge.cell1, edge.cell2);
            visit(grid, edge.cell1);
            visit(grid, edge.cell2);
            ctl.checkpoint()?;

            unions += 1;
            if unions == target {
                break;
            }
        }
    }
    Ok(())
}
