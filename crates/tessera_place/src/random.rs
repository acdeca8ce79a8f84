//! Seeded random initial placement.

use crate::context::PlacementContext;
use crate::error::PlaceError;
use crate::ids::BlockId;
use crate::occupancy::GridOccupancy;
use crate::placement::Placement;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;
use tessera_device::{BlockTypeId, Loc};

/// Completes `placement` by binding every unplaced block to a random free
/// compatible slot.
///
/// Blocks that already have a location keep it. Macros are placed first, at a
/// head position drawn uniformly from those where every member lands on a
/// free compatible slot.
pub fn random_placement(
    ctx: &PlacementContext<'_>,
    placement: &mut Placement,
    rng: &mut impl Rng,
) -> Result<(), PlaceError> {
    let netlist = ctx.netlist;
    let device = ctx.device;
    if placement.len() != netlist.block_count() {
        return Err(PlaceError::InvalidPlacement(format!(
            "placement covers {} blocks, netlist has {}",
            placement.len(),
            netlist.block_count()
        )));
    }

    let mut occ = GridOccupancy::new(device, netlist.block_count());
    for (block, loc) in placement.iter() {
        let name = &netlist.block(block).name;
        if !device.is_compatible(loc, netlist.block(block).block_type) {
            return Err(PlaceError::InvalidPlacement(format!(
                "block '{name}' at {loc} is on an incompatible slot"
            )));
        }
        if occ.block_at(loc).is_some() {
            return Err(PlaceError::InvalidPlacement(format!(
                "block '{name}' shares slot {loc}"
            )));
        }
        occ.bind(block, loc)?;
    }

    for m in ctx.macros.iter() {
        let placed = m.members.iter().filter(|mb| occ.is_placed(mb.block)).count();
        if placed == m.members.len() {
            continue;
        }
        if placed > 0 {
            return Err(PlaceError::InvalidPlacement(format!(
                "macro headed by '{}' is partially placed",
                netlist.block(m.head()).name
            )));
        }
        let head_type = netlist.block(m.head()).block_type;
        let candidates: Vec<Loc> = device
            .legal_locations(head_type)
            .into_iter()
            .filter(|&head| {
                m.members.iter().all(|mb| {
                    let target = head + mb.offset;
                    device.is_compatible(target, netlist.block(mb.block).block_type)
                        && occ.block_at(target).is_none()
                })
            })
            .collect();
        let Some(&head) = candidates.choose(rng) else {
            return Err(PlaceError::Infeasible {
                block_type: device.block_type_name(head_type).to_string(),
                demand: m.members.len(),
                capacity: 0,
            });
        };
        for mb in &m.members {
            occ.bind(mb.block, head + mb.offset)?;
        }
    }

    let mut pending: BTreeMap<BlockTypeId, Vec<BlockId>> = BTreeMap::new();
    for block in netlist.block_ids() {
        if !occ.is_placed(block) {
            pending
                .entry(netlist.block(block).block_type)
                .or_default()
                .push(block);
        }
    }
    for (block_type, blocks) in pending {
        let mut free: Vec<Loc> = device
            .legal_locations(block_type)
            .into_iter()
            .filter(|loc| occ.block_at(*loc).is_none())
            .collect();
        if free.len() < blocks.len() {
            return Err(PlaceError::Infeasible {
                block_type: device.block_type_name(block_type).to_string(),
                demand: blocks.len(),
                capacity: free.len(),
            });
        }
        free.shuffle(rng);
        for (block, loc) in blocks.into_iter().zip(free) {
            occ.bind(block, loc)?;
        }
    }

    *placement = occ.to_placement();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::Fixture;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn every_block_gets_a_distinct_slot() {
        let mut fx = Fixture::columns(4, 3, &[0]);
        fx.chain(6);
        let io = fx.io;
        fx.block("pad", io);
        let mut placement = Placement::new(fx.netlist.block_count());
        random_placement(&fx.ctx(), &mut placement, &mut StdRng::seed_from_u64(3)).unwrap();

        assert!(placement.is_fully_placed());
        assert!(GridOccupancy::from_placement(&fx.ctx(), &placement).is_ok());
    }

    #[test]
    fn placed_blocks_keep_their_slot() {
        let mut fx = Fixture::uniform(3, 3, 1);
        let blocks = fx.chain(4);
        fx.netlist.set_fixed(blocks[0], true);
        let mut placement = Placement::new(fx.netlist.block_count());
        placement.set(blocks[0], Loc::new(2, 2, 0));
        random_placement(&fx.ctx(), &mut placement, &mut StdRng::seed_from_u64(9)).unwrap();

        assert_eq!(placement.loc(blocks[0]), Some(Loc::new(2, 2, 0)));
        assert!(placement.is_fully_placed());
    }

    #[test]
    fn macros_land_rigidly() {
        let mut fx = Fixture::uniform(3, 3, 1);
        let blocks = fx.chain(5);
        fx.add_vertical_macro(&blocks[1..4]);
        let mut placement = Placement::new(fx.netlist.block_count());
        random_placement(&fx.ctx(), &mut placement, &mut StdRng::seed_from_u64(1)).unwrap();

        let head = placement.loc(blocks[1]).unwrap();
        assert_eq!(head.y, 0);
        assert_eq!(placement.loc(blocks[2]), Some(Loc::new(head.x, 1, 0)));
        assert_eq!(placement.loc(blocks[3]), Some(Loc::new(head.x, 2, 0)));
    }

    #[test]
    fn same_seed_same_placement() {
        let mut fx = Fixture::uniform(5, 5, 2);
        fx.chain(20);
        let run = |seed| {
            let mut placement = Placement::new(fx.netlist.block_count());
            random_placement(&fx.ctx(), &mut placement, &mut StdRng::seed_from_u64(seed))
                .unwrap();
            placement.iter().collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn too_few_slots_is_infeasible() {
        let mut fx = Fixture::uniform(2, 1, 1);
        fx.chain(3);
        let mut placement = Placement::new(fx.netlist.block_count());
        let err = random_placement(&fx.ctx(), &mut placement, &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(err, PlaceError::Infeasible { demand: 3, capacity: 2, .. }));
    }
}
