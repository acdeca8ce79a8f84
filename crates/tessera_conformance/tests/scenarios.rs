//! End-to-end placement scenarios on small hand-built devices.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tessera_conformance::Design;
use tessera_device::{Loc, Offset};
use tessera_diagnostics::DiagnosticCode;
use tessera_place::{
    BlockLocationStore, CutSpreader, GridOccupancy, PlaceError, Placement, StrictLegalizer,
};

// ---------------------------------------------------------------------------
// Full runs
// ---------------------------------------------------------------------------

#[test]
fn chain_on_three_type_grid() {
    let mut design = Design::striped(4, 4, 3).unwrap();
    design.chain(10);
    let initial = design.seed_placement(1).unwrap();
    let initial_hpwl = design.hpwl(&initial);

    let result = design.place(initial);
    let outcome = result.outcome.unwrap();

    assert_eq!(outcome.initial_hpwl, initial_hpwl);
    assert!(outcome.hpwl <= initial_hpwl);
    assert_eq!(design.hpwl(&result.placement), outcome.hpwl);
    assert_eq!(design.legality_violation(&result.placement), None);
}

#[test]
fn vertical_macro_pair_stays_adjacent() {
    let mut design = Design::uniform(4, 4, 1).unwrap();
    let blocks = design.chain(6);
    design
        .add_macro(&[
            (blocks[2], Offset::new(0, 0, 0)),
            (blocks[3], Offset::new(0, 1, 0)),
        ])
        .unwrap();
    let initial = design.seed_placement(8).unwrap();

    let result = design.place(initial);
    assert!(result.outcome.is_ok());

    let head = result.placement.loc(blocks[2]).unwrap();
    assert_eq!(result.placement.loc(blocks[3]), Some(Loc::new(head.x, head.y + 1, 0)));
    let others_on_macro = result
        .placement
        .iter()
        .filter(|(b, _)| *b != blocks[2] && *b != blocks[3])
        .any(|(_, loc)| loc.x == head.x && (loc.y == head.y || loc.y == head.y + 1));
    assert!(!others_on_macro);
}

#[test]
fn mixed_macros_and_fixed_blocks() {
    let mut design = Design::uniform(6, 6, 1).unwrap();
    let blocks = design.chain(16);
    design
        .add_macro(&[
            (blocks[4], Offset::new(0, 0, 0)),
            (blocks[5], Offset::new(1, 0, 0)),
            (blocks[6], Offset::new(2, 0, 0)),
        ])
        .unwrap();
    design
        .add_macro(&[
            (blocks[10], Offset::new(0, 0, 0)),
            (blocks[11], Offset::new(0, 1, 0)),
        ])
        .unwrap();
    let first = design.named("c0").unwrap();
    let last = design.named("c15").unwrap();
    assert_eq!((first, last), (blocks[0], blocks[15]));
    design.netlist.set_fixed(first, true);
    design.netlist.set_fixed(last, true);

    let mut initial = Placement::new(design.netlist.block_count());
    initial.set(blocks[0], Loc::new(0, 0, 0));
    initial.set(blocks[15], Loc::new(5, 5, 0));
    tessera_place::random_placement(&design.ctx(), &mut initial, &mut StdRng::seed_from_u64(3))
        .unwrap();

    let result = design.place(initial);
    assert!(result.outcome.is_ok());
    assert_eq!(design.legality_violation(&result.placement), None);
    assert_eq!(result.placement.loc(blocks[0]), Some(Loc::new(0, 0, 0)));
    assert_eq!(result.placement.loc(blocks[15]), Some(Loc::new(5, 5, 0)));
}

#[test]
fn oversubscribed_type_is_rejected_up_front() {
    let mut design = Design::striped(3, 1, 3).unwrap();
    let a = design.block("a", 0);
    let b = design.block("b", 0);
    design.connect(a, &[b]);

    assert!(matches!(
        design.seed_placement(0),
        Err(PlaceError::Infeasible { demand: 2, capacity: 1, .. })
    ));

    let result = design.place(Placement::new(2));
    assert!(matches!(result.outcome, Err(PlaceError::Infeasible { .. })));
    let e102: DiagnosticCode = "E102".parse().unwrap();
    assert_eq!(result.diagnostics[0].code, e102);
}

// ---------------------------------------------------------------------------
// Spreading and legalizing a degenerate solve
// ---------------------------------------------------------------------------

/// Three `t0` blocks solved onto the same cell of a device where `t0` only
/// lives in even columns, so the 2x2 neighborhood offers just two slots.
#[test]
fn stacked_blocks_are_spread_and_legalized() {
    let mut design = Design::striped(4, 2, 2).unwrap();
    let blocks: Vec<_> = (0..3).map(|i| design.block(&format!("s{i}"), 0)).collect();
    design.connect(blocks[0], &[blocks[1], blocks[2]]);
    let ctx = design.ctx();
    let t0 = design.types[0];

    let legal = {
        let mut p = Placement::new(3);
        p.set(blocks[0], Loc::new(0, 0, 0));
        p.set(blocks[1], Loc::new(0, 1, 0));
        p.set(blocks[2], Loc::new(2, 0, 0));
        p
    };
    let mut occ = GridOccupancy::from_placement(&ctx, &legal).unwrap();
    let mut store = BlockLocationStore::from_placement(&legal);
    for &b in &blocks {
        let loc = store.get_mut(b);
        loc.loc = Loc::new(0, 0, 0);
        loc.raw_x = 0.0;
        loc.raw_y = 0.0;
    }

    let mut spreader = CutSpreader::new(ctx, t0);
    let stats = spreader.cut_spread(&mut store, &blocks);
    assert_eq!(stats.unrelieved, 0);
    let grown = spreader.regions()[0];
    assert!(grown.n_tiles >= grown.n_blks);
    assert!(grown.bb.xmax >= 2);

    let legalizer = StrictLegalizer::new(ctx, t0);
    legalizer
        .strict_legalize(&mut store, &mut occ, &blocks, &mut StdRng::seed_from_u64(5))
        .unwrap();

    let mut slots: Vec<Loc> = blocks.iter().map(|b| occ.loc_of(*b).unwrap()).collect();
    assert!(slots.iter().all(|l| design.device.is_compatible(*l, t0)));
    slots.sort();
    slots.dedup();
    assert_eq!(slots.len(), 3);
}
