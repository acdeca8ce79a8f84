//! Up-front capacity check: every block type must fit on the device.

use crate::codes;
use crate::context::PlacementContext;
use crate::error::PlaceError;
use tessera_device::BlockTypeId;
use tessera_diagnostics::DiagnosticSink;

/// Compares, per block type, the number of blocks against the number of
/// compatible slots on the device.
///
/// Every shortfall is reported to `sink`; the first one is returned as
/// [`PlaceError::Infeasible`].
pub fn check_feasibility(
    ctx: &PlacementContext<'_>,
    sink: &DiagnosticSink,
) -> Result<(), PlaceError> {
    let device = ctx.device;
    let mut demand = vec![0usize; device.block_types().len()];
    for block in ctx.netlist.block_ids() {
        demand[ctx.netlist.block(block).block_type.index()] += 1;
    }

    let mut first = None;
    for (i, block_type) in device.block_types().iter().enumerate() {
        let needed = demand[i];
        if needed == 0 {
            continue;
        }
        let capacity = device
            .legal_locations(BlockTypeId::from_raw(i as u32))
            .len();
        if capacity >= needed {
            continue;
        }
        if capacity == 0 {
            sink.emit(codes::error_no_compatible_slot(&block_type.name, needed));
        } else {
            sink.emit(codes::error_capacity_exceeded(&block_type.name, needed, capacity));
        }
        first.get_or_insert(PlaceError::Infeasible {
            block_type: block_type.name.clone(),
            demand: needed,
            capacity,
        });
    }

    match first {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::{E101, E102};
    use crate::test_util::Fixture;

    #[test]
    fn fitting_design_passes() {
        let mut fx = Fixture::columns(3, 2, &[0]);
        fx.chain(4);
        let io = fx.io;
        fx.block("pad", io);
        let sink = DiagnosticSink::new();
        assert!(check_feasibility(&fx.ctx(), &sink).is_ok());
        assert!(!sink.has_errors());
    }

    #[test]
    fn too_many_blocks_is_infeasible() {
        let mut fx = Fixture::uniform(2, 2, 1);
        fx.chain(5);
        let sink = DiagnosticSink::new();
        let err = check_feasibility(&fx.ctx(), &sink).unwrap_err();
        match err {
            PlaceError::Infeasible {
                block_type,
                demand,
                capacity,
            } => {
                assert_eq!(block_type, "clb");
                assert_eq!(demand, 5);
                assert_eq!(capacity, 4);
            }
            other => panic!("unexpected error {other}"),
        }
        let diags = sink.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, E102);
    }

    #[test]
    fn missing_tile_type_is_reported() {
        let mut fx = Fixture::uniform(2, 2, 1);
        let io = fx.io;
        fx.block("pad", io);
        let sink = DiagnosticSink::new();
        assert!(check_feasibility(&fx.ctx(), &sink).is_err());
        assert_eq!(sink.diagnostics()[0].code, E101);
    }
}
