use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use report_pdf::{PageGeometry, count_pages, pages_opened, place_blocks};

fn band(limit: f32, gap: f32) -> PageGeometry {
    PageGeometry {
        top: 0.0,
        limit,
        gap,
    }
}

#[test]
fn worked_example_fills_two_pages() {
    let geometry = band(205.0, 10.0);
    let heights = [100.0, 80.0, 90.0];

    assert_eq!(count_pages(&heights, &geometry), 2);
    let placed: Vec<(usize, f32)> = place_blocks(&heights, &geometry)
        .iter()
        .map(|p| (p.page, p.y))
        .collect();
    assert_eq!(placed, vec![(0, 0.0), (0, 110.0), (1, 0.0)]);
}

#[test]
fn estimate_matches_placement_for_random_sequences() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..500 {
        let geometry = PageGeometry {
            top: rng.gen_range(0.0..120.0),
            limit: rng.gen_range(300.0..900.0),
            gap: rng.gen_range(0.0..24.0),
        };
        let len = rng.gen_range(0..40);
        let heights: Vec<f32> = (0..len).map(|_| rng.gen_range(0.5..1200.0)).collect();

        let placements = place_blocks(&heights, &geometry);
        assert_eq!(
            count_pages(&heights, &geometry),
            pages_opened(&placements),
            "heights {heights:?} in {geometry:?}"
        );

        for (i, p) in placements.iter().enumerate() {
            assert_eq!(p.block, i);
            let first_on_page = i == 0 || placements[i - 1].page != p.page;
            if first_on_page {
                assert_eq!(p.y, geometry.top);
            } else {
                assert!(p.y + heights[i] <= geometry.limit);
            }
            if i > 0 {
                assert!(p.page == placements[i - 1].page || p.page == placements[i - 1].page + 1);
            }
        }
    }
}

#[test]
fn oversized_block_gets_its_own_page() {
    let geometry = band(500.0, 10.0);
    let heights = [120.0, 900.0, 60.0];
    let placements = place_blocks(&heights, &geometry);

    assert_eq!(placements[0].page, 0);
    assert_eq!(placements[1].page, 1);
    assert_eq!(placements[1].y, 0.0);
    assert_eq!(placements[2].page, 2);
    assert_eq!(count_pages(&heights, &geometry), 3);
}

#[test]
fn oversized_first_block_does_not_leave_an_empty_page() {
    let geometry = band(500.0, 10.0);
    let placements = place_blocks(&[900.0], &geometry);
    assert_eq!(placements[0].page, 0);
    assert_eq!(count_pages(&[900.0], &geometry), 1);
}

#[test]
fn no_blocks_no_pages() {
    let geometry = band(500.0, 10.0);
    assert_eq!(count_pages(&[], &geometry), 0);
    assert!(place_blocks(&[], &geometry).is_empty());
}
