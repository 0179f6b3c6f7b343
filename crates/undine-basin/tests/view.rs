use undine_basin::{Basin, ViewOptions, cell_at, view_of_buf};
use undine_cells::{CellBuf, CellState, ChunkCoord, LiquidType};

fn water_at(buf: &mut CellBuf, x: usize, y: usize, z: usize, level: u8) {
    buf.set_liquid(x, y, z, LiquidType::Water, level);
}

fn basin_with_pair() -> Basin {
    let basin = Basin::new(4, 4, 4, ViewOptions::default());
    let mut a = CellBuf::new(ChunkCoord::new(0, 0, 0), 4, 4, 4).unwrap();
    water_at(&mut a, 3, 1, 2, 8);
    let mut b = CellBuf::new(ChunkCoord::new(1, 0, 0), 4, 4, 4).unwrap();
    water_at(&mut b, 0, 1, 2, 5);
    b.set_solid(1, 1, 2, true);
    basin.insert_chunk(a);
    basin.insert_chunk(b);
    basin
}

#[test]
fn neighbor_resolves_across_chunk_seam() {
    let basin = basin_with_pair();
    let view = basin.view(ChunkCoord::new(0, 0, 0)).unwrap();
    // One step east from the center chunk's east edge lands in chunk (1,0,0).
    let cell = view.neighbor(3, 1, 2, 1, 0, 0).unwrap();
    assert_eq!(cell.liquid, LiquidType::Water);
    assert_eq!(cell.level, 5);
    // Two steps is still resolvable through the same snapshot.
    let cell = view.neighbor(3, 1, 2, 2, 0, 0).unwrap();
    assert!(cell.solid);
}

#[test]
fn neighbor_unloaded_chunk_is_none() {
    let basin = basin_with_pair();
    let view = basin.view(ChunkCoord::new(0, 0, 0)).unwrap();
    // West of chunk (0,0,0) nothing is loaded.
    assert_eq!(view.neighbor(0, 1, 2, -1, 0, 0), None);
    // Below the loaded layer.
    assert_eq!(view.neighbor(0, 0, 0, 0, -1, 0), None);
    // In-chunk lookups still resolve.
    assert!(view.neighbor(3, 1, 2, -1, 0, 0).is_some());
}

#[test]
fn negative_coordinates_route_to_the_right_chunk() {
    let basin = Basin::new(4, 4, 4, ViewOptions::default());
    let mut west = CellBuf::new(ChunkCoord::new(-1, 0, 0), 4, 4, 4).unwrap();
    water_at(&mut west, 3, 0, 0, 7);
    basin.insert_chunk(west);
    basin.insert_chunk(CellBuf::new(ChunkCoord::new(0, 0, 0), 4, 4, 4).unwrap());

    let view = basin.view(ChunkCoord::new(0, 0, 0)).unwrap();
    let cell = view.neighbor(0, 0, 0, -1, 0, 0).unwrap();
    assert_eq!(cell.level, 7);
    assert_eq!(cell_at(&basin, -1, 0, 0).unwrap().level, 7);
}

#[test]
fn view_keeps_the_snapshot_it_was_taken_from() {
    let basin = basin_with_pair();
    let before = basin.view(ChunkCoord::new(0, 0, 0)).unwrap();
    assert!(basin.edit(ChunkCoord::new(0, 0, 0), |buf| {
        buf.set_liquid(3, 1, 2, LiquidType::None, 0);
    }));
    // The old view still sees the pre-edit cell.
    assert_eq!(before.cell(3, 1, 2).level, 8);
    let after = basin.view(ChunkCoord::new(0, 0, 0)).unwrap();
    assert_eq!(after.cell(3, 1, 2).level, 0);
}

#[test]
fn view_captures_options_at_creation() {
    let basin = basin_with_pair();
    let view = basin.view(ChunkCoord::new(0, 0, 0)).unwrap();
    basin.set_opts(ViewOptions {
        max_reveal_level: 1,
        fog_of_war: true,
    });
    assert_eq!(view.opts(), ViewOptions::default());
    let fresh = basin.view(ChunkCoord::new(0, 0, 0)).unwrap();
    assert_eq!(fresh.opts().max_reveal_level, 1);
    assert!(fresh.opts().fog_of_war);
}

#[test]
fn view_of_missing_chunk_is_none() {
    let basin = basin_with_pair();
    assert!(basin.view(ChunkCoord::new(9, 0, 0)).is_none());
}

#[test]
fn free_standing_view_has_no_neighbors() {
    let mut buf = CellBuf::new(ChunkCoord::new(0, 0, 0), 2, 2, 2).unwrap();
    buf.set_local(0, 0, 0, CellState::liquid(LiquidType::Lava, 8));
    let view = view_of_buf(buf, ViewOptions::default());
    assert_eq!(view.cell(0, 0, 0).liquid, LiquidType::Lava);
    assert_eq!(view.neighbor(0, 0, 0, -1, 0, 0), None);
    assert_eq!(view.neighbor(1, 1, 1, 1, 0, 0), None);
}

#[test]
fn chunk_coords_are_sorted() {
    let basin = Basin::new(2, 2, 2, ViewOptions::default());
    for (cx, cz) in [(2, 1), (0, 0), (1, 1), (0, 1)] {
        basin
            .insert_chunk(CellBuf::new(ChunkCoord::new(cx, 0, cz), 2, 2, 2).unwrap());
    }
    let coords = basin.chunk_coords();
    let mut sorted = coords.clone();
    sorted.sort_by_key(|c| (c.cy, c.cz, c.cx));
    assert_eq!(coords, sorted);
    assert_eq!(coords.len(), 4);
}
