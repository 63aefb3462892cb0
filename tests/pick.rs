use rockview::pick::{self, PickEvent, PopupState, Tone};
use rockview::risk::RiskLevel;
use rockview::terrain::{self, RiskGrid, Terrain};

fn terrain(n: usize, with_risk: bool) -> Terrain {
    let dem: Vec<Vec<f32>> = (0..n).map(|_| vec![0.0; n]).collect();
    // Risk encodes the cell index so lookups are easy to check.
    let cells = (n * n) as f32;
    let risk: Vec<Vec<f32>> = (0..n)
        .map(|y| (0..n).map(|x| (y * n + x) as f32 / cells).collect())
        .collect();
    if with_risk {
        terrain::load(&dem, Some(&risk)).unwrap()
    } else {
        terrain::load(&dem, None).unwrap()
    }
}

#[test]
fn v_is_inverted() {
    let t = terrain(5, false);
    let p = pick::resolve_pick(0.0, 0.0, [0.0; 3], &t.elevation, None);
    assert_eq!((p.cell_x, p.cell_y), (0, 4));
    let p = pick::resolve_pick(1.0, 1.0, [0.0; 3], &t.elevation, None);
    assert_eq!((p.cell_x, p.cell_y), (4, 0));
}

#[test]
fn far_edges_are_clamped() {
    let t = terrain(4, false);
    for (u, v) in [(1.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.2, -0.3), (-0.5, 2.0)] {
        let p = pick::resolve_pick(u, v, [0.0; 3], &t.elevation, None);
        assert!(p.cell_x <= 3 && p.cell_y <= 3, "({u}, {v}) -> {p:?}");
    }
}

#[test]
fn floors_interior_coordinates() {
    let t = terrain(5, false);
    // u * 4 = 1.6 -> 1, (1 - 0.3) * 4 = 2.8 -> 2
    let p = pick::resolve_pick(0.4, 0.3, [1.0, 2.0, 3.0], &t.elevation, None);
    assert_eq!((p.cell_x, p.cell_y), (1, 2));
    assert_eq!(p.world_point, [1.0, 2.0, 3.0]);
}

#[test]
fn risk_lookup_uses_row_major_index() {
    let t = terrain(4, true);
    let p = pick::resolve_pick(1.0, 0.0, [0.0; 3], &t.elevation, t.risk.as_ref());
    // cell (3, 3) -> index 15
    assert_eq!(p.risk, Some(15.0 / 16.0));
}

#[test]
fn no_risk_grid_means_no_risk_field() {
    let t = terrain(3, false);
    let p = pick::resolve_pick(0.5, 0.5, [0.0; 3], &t.elevation, t.risk.as_ref());
    assert_eq!(p.risk, None);
    let json = serde_json::to_value(p).unwrap();
    assert!(json.get("risk").is_none());
    assert_eq!(json["cellX"], 1);
}

#[test]
fn event_decodes_from_renderer_shape() {
    let e: PickEvent =
        serde_json::from_str(r#"{"u": 0.25, "v": 0.75, "worldPoint": [1, 2, 3]}"#).unwrap();
    let t = terrain(5, true);
    let p = pick::resolve_event(&e, &t.elevation, t.risk.as_ref());
    assert_eq!((p.cell_x, p.cell_y), (1, 1));
}

#[test]
fn popup_lifecycle() {
    let t = terrain(3, true);
    let mut state = PopupState::new();
    assert!(state.current().is_none());

    let first = pick::resolve_pick(0.0, 1.0, [0.0; 3], &t.elevation, t.risk.as_ref());
    let popup = *state.interact(first).unwrap();
    assert_eq!(popup.title(), "Risk at (0, 0)");
    assert_eq!(popup.value_text(), "0.00");

    let second = pick::resolve_pick(1.0, 0.0, [0.0; 3], &t.elevation, t.risk.as_ref());
    state.interact(second);
    assert_eq!(state.current().map(|p| p.pick.cell_x), Some(2));

    state.dismiss();
    assert!(state.current().is_none());

    let bare = pick::resolve_pick(0.5, 0.5, [0.0; 3], &t.elevation, None);
    assert!(state.interact(bare).is_none());
}

#[test]
fn tones() {
    assert_eq!(Tone::for_risk(0.81), Tone::Red);
    assert_eq!(Tone::for_risk(0.8), Tone::Yellow);
    assert_eq!(Tone::for_risk(0.6), Tone::Green);
    assert_eq!(Tone::for_level(RiskLevel::Extreme), Tone::Red);
    assert_eq!(Tone::for_level(RiskLevel::High), Tone::Yellow);
    assert_eq!(Tone::for_level(RiskLevel::Moderate), Tone::Green);
    assert_eq!(Tone::Red.hex(), "#ff2222");
}

#[test]
fn overlay_of_other_size_yields_no_risk() {
    let t = terrain(4, false);
    let small = RiskGrid::new(2, vec![0.9; 4]).unwrap().0;
    let p = pick::resolve_pick(1.0 / 3.0 + 0.01, 1.0, [0.0; 3], &t.elevation, Some(&small));
    assert_eq!((p.cell_x, p.cell_y), (1, 0));
    assert!(p.risk.is_none());
}
