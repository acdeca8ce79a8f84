//! Text reports: the progress table, placement dumps and occupancy diagrams.

use crate::context::PlacementContext;
use crate::locations::BlockLocationStore;
use crate::placement::Placement;
use crate::placer::{IterationStats, RunStats};
use tessera_device::DeviceGrid;

const RULE: &str = "---- ------ ------ -------- ------- | ------ --------- ------ ------ ------ ------ -------- -------- --------";

/// Column header of the progress table.
pub fn status_header() -> String {
    [
        RULE,
        "Iter   Time   Iter     Best   Stall |    Run BlockType  Solve  Solve Spread  Legal   Solved   Spread    Legal",
        "              Time     hpwl         |   Time            Block   Time   Time   Time     hpwl     hpwl     hpwl",
        "      (sec)  (sec)                  |  (sec)              Num  (sec)  (sec)  (sec)                           ",
        RULE,
    ]
    .join("\n")
}

/// One progress-table row for a block-type run.
///
/// Types that were not spread show `-1` as spread HPWL.
pub fn run_row(stats: &RunStats) -> String {
    format!(
        "{:4} {:6.3}                         | {:6.3} {:>9} {:6} {:6.3} {:6.3} {:6.3} {:8} {:8} {:8}",
        stats.iteration,
        stats.elapsed,
        stats.run_time,
        stats.block_type,
        stats.solve_blocks,
        stats.solve_time,
        stats.spread_time,
        stats.legal_time,
        stats.solved_hpwl,
        stats.spread_hpwl.unwrap_or(-1),
        stats.legal_hpwl,
    )
}

/// The progress-table row closing an iteration.
pub fn iteration_row(stats: &IterationStats) -> String {
    format!(
        "{:4} {:6.3} {:6.3} {:8} {:7} |",
        stats.iteration, stats.elapsed, stats.iteration_time, stats.best_hpwl, stats.stalled
    )
}

/// Full dump of `placement`: one line per block, the total HPWL and the
/// occupancy diagram.
pub fn placement_report(ctx: &PlacementContext<'_>, placement: &Placement) -> String {
    let netlist = ctx.netlist;
    let device = ctx.device;
    let mut out = format!(
        "Array size: {} x {} logic blocks\n\n",
        device.width(),
        device.height()
    );
    out.push_str(&format!(
        "{:<25} {:<18} {:<5} {:<5} {:<10} {:<14} {:<8}\n",
        "block name", "logic block type", "x", "y", "subblk", "block number", "is_fixed"
    ));
    out.push_str(&format!(
        "{:<25} {:<18} {:<5} {:<5} {:<10} {:<14} {:<8}\n",
        "----------", "----------------", "--", "--", "------", "------------", "--------"
    ));
    for block in netlist.block_ids() {
        let b = netlist.block(block);
        let (x, y, sub) = match placement.loc(block) {
            Some(loc) => (loc.x.to_string(), loc.y.to_string(), loc.sub_tile.to_string()),
            None => ("-".into(), "-".into(), "-".into()),
        };
        out.push_str(&format!(
            "{:<25} {:<18} {:<5} {:<5} {:<10} #{:<13} {:<8}\n",
            b.name,
            device.block_type_name(b.block_type),
            x,
            y,
            sub,
            block.index(),
            b.is_fixed
        ));
    }

    let hpwl = BlockLocationStore::from_placement(placement).total_hpwl(netlist);
    out.push_str(&format!("\ntotal_HPWL: {hpwl}\n"));
    out.push_str("Occupancy diagram: \n");
    out.push_str(&overlap_grid(device, placement));
    out
}

/// ASCII grid with the number of placed blocks in every cell, row `y` per line.
pub fn overlap_grid(device: &DeviceGrid, placement: &Placement) -> String {
    let (width, height) = (device.width(), device.height());
    let mut counts = vec![0usize; (width * height).max(0) as usize];
    for (_, loc) in placement.iter() {
        if device.contains(loc.x, loc.y) {
            counts[(loc.y * width + loc.x) as usize] += 1;
        }
    }

    let rule = format!("{:4}{}\n", "", "-".repeat(5 * width.max(0) as usize + 2));
    let mut out = format!("{:5}", "");
    for x in 0..width {
        out.push_str(&format!("{x:<5}"));
    }
    out.push('\n');
    out.push_str(&rule);
    for y in 0..height {
        out.push_str(&format!("{y:<4}|"));
        for x in 0..width {
            out.push_str(&format!("{:<5}", counts[(y * width + x) as usize]));
        }
        out.push_str("|\n");
    }
    out.push_str(&rule);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legalizer::LegalizeStats;
    use crate::test_util::Fixture;
    use tessera_device::Loc;

    fn run_stats(spread_hpwl: Option<i64>) -> RunStats {
        RunStats {
            iteration: 3,
            elapsed: 1.5,
            run_time: 0.25,
            block_type: "clb".into(),
            solve_blocks: 42,
            solve_time: 0.1,
            spread_time: 0.05,
            legal_time: 0.1,
            solved_hpwl: 120,
            spread_hpwl,
            legal_hpwl: 160,
            spread: None,
            legalize: LegalizeStats::default(),
        }
    }

    #[test]
    fn header_lines_share_width() {
        let header = status_header();
        let lines: Vec<&str> = header.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines.iter().all(|l| l.len() == RULE.len()));
    }

    #[test]
    fn run_row_columns() {
        let row = run_row(&run_stats(Some(140)));
        assert!(row.starts_with("   3  1.500"));
        assert!(row.contains("|  0.250       clb     42"));
        assert!(row.ends_with("     120      140      160"));
    }

    #[test]
    fn unspread_run_shows_minus_one() {
        let row = run_row(&run_stats(None));
        assert!(row.ends_with("     120       -1      160"));
    }

    #[test]
    fn iteration_row_format() {
        let stats = IterationStats {
            iteration: 12,
            elapsed: 2.0,
            iteration_time: 0.125,
            legal_hpwl: 300,
            best_hpwl: 250,
            stalled: 4,
        };
        assert_eq!(iteration_row(&stats), "  12  2.000  0.125      250       4 |");
    }

    #[test]
    fn overlap_counts_per_cell() {
        let fx = Fixture::uniform(2, 2, 2);
        let mut placement = Placement::new(3);
        placement.set(crate::ids::BlockId::from_raw(0), Loc::new(0, 0, 0));
        placement.set(crate::ids::BlockId::from_raw(1), Loc::new(0, 0, 1));
        placement.set(crate::ids::BlockId::from_raw(2), Loc::new(1, 1, 0));
        let expected = "     0    1    \n    ------------\n0   |2    0    |\n1   |0    1    |\n    ------------\n";
        assert_eq!(overlap_grid(&fx.device, &placement), expected);
    }

    #[test]
    fn dump_lists_every_block() {
        let mut fx = Fixture::uniform(3, 1, 1);
        let blocks = fx.chain(3);
        fx.netlist.set_fixed(blocks[2], true);
        let placement = fx.placement(&[Loc::new(0, 0, 0), Loc::new(1, 0, 0), Loc::new(2, 0, 0)]);
        let text = placement_report(&fx.ctx(), &placement);

        assert!(text.starts_with("Array size: 3 x 1 logic blocks\n"));
        assert!(text.contains("#2"));
        assert!(text.contains("true"));
        assert!(text.contains("total_HPWL: 4\n"));
        assert!(text.contains("Occupancy diagram: \n"));
    }
}
