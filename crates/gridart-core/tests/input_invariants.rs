use gridart_core::{AngleRange, Grid, InputEvent, InputState, Resolution};
use proptest::prelude::*;

fn event() -> impl Strategy<Value = InputEvent> {
    let value = prop_oneof![
        4 => -1e6f64..1e6,
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
    ];
    prop_oneof![
        (value.clone(), value.clone()).prop_map(|(x, y)| InputEvent::PointerMoved { x, y }),
        value.clone().prop_map(InputEvent::AngleChanged),
        value.prop_map(InputEvent::AngleNudged),
    ]
}

proptest! {
    #[test]
    fn angle_always_within_range(
        lo in -10.0f64..0.0,
        width in 0.1f64..20.0,
        events in proptest::collection::vec(event(), 0..64),
    ) {
        let range = AngleRange::new(lo, lo + width).unwrap();
        let state = InputState::new(range, (0.0, 0.0));
        let mut accepted = 0u64;
        for ev in events {
            if state.apply(ev) {
                accepted += 1;
            }
            let snap = state.snapshot();
            prop_assert!(
                range.contains(snap.angle),
                "angle {} outside {:?}",
                snap.angle,
                range
            );
            prop_assert!(snap.pointer.0.is_finite() && snap.pointer.1.is_finite());
        }
        prop_assert_eq!(state.snapshot().seq, accepted);
    }

    #[test]
    fn grid_shape_matches_resolution(rows in 1usize..64, cols in 1usize..64) {
        let grid = Grid::new(Resolution::new(rows, cols));
        prop_assert_eq!(grid.xs().dim(), (rows, cols));
        prop_assert_eq!(grid.ys().dim(), (rows, cols));
        let corner = ((cols - 1) as f64, (rows - 1) as f64);
        prop_assert_eq!(grid.base_coordinate(rows - 1, cols - 1), corner);
    }
}
