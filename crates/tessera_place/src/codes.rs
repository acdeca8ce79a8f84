//! Diagnostic codes and helper functions for placement errors, warnings and
//! progress notes.
//!
//! Error codes `E101`--`E104` reject the inputs before any block moves.
//! Warning codes `W201`--`W202` flag runs that continue with degraded
//! results. Placement codes `P301`--`P304` carry the progress table.

use tessera_config::ConfigError;
use tessera_diagnostics::{Category, Diagnostic, DiagnosticCode};

/// A block type has blocks but no compatible slot on the device.
pub const E101: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 101,
};

/// A block type has more blocks than compatible slots.
pub const E102: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 102,
};

/// The supplied placement is not legal.
pub const E103: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 103,
};

/// The placer settings are out of range.
pub const E104: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 104,
};

/// Overused regions remained after region growth stopped.
pub const W201: DiagnosticCode = DiagnosticCode {
    category: Category::Warning,
    number: 201,
};

/// No block is movable by the placer.
pub const W202: DiagnosticCode = DiagnosticCode {
    category: Category::Warning,
    number: 202,
};

/// Placement started.
pub const P301: DiagnosticCode = DiagnosticCode {
    category: Category::Placement,
    number: 301,
};

/// Statistics of one block-type run.
pub const P302: DiagnosticCode = DiagnosticCode {
    category: Category::Placement,
    number: 302,
};

/// Statistics of one outer iteration.
pub const P303: DiagnosticCode = DiagnosticCode {
    category: Category::Placement,
    number: 303,
};

/// Placement finished.
pub const P304: DiagnosticCode = DiagnosticCode {
    category: Category::Placement,
    number: 304,
};

/// Creates a diagnostic for a block type the device cannot host at all.
pub fn error_no_compatible_slot(block_type: &str, demand: usize) -> Diagnostic {
    Diagnostic::error(
        E101,
        format!("no slot on the device accepts block type `{block_type}` ({demand} blocks)"),
    )
    .with_help("choose a device with tiles for this block type")
}

/// Creates a diagnostic for a block type with more blocks than slots.
pub fn error_capacity_exceeded(block_type: &str, demand: usize, capacity: usize) -> Diagnostic {
    Diagnostic::error(
        E102,
        format!("block type `{block_type}` needs {demand} slots but the device offers {capacity}"),
    )
    .with_help("choose a larger device")
}

/// Creates a diagnostic for an illegal input placement.
pub fn error_invalid_placement(msg: &str) -> Diagnostic {
    Diagnostic::error(E103, format!("invalid placement: {msg}"))
}

/// Creates a diagnostic for settings that fail validation.
pub fn error_invalid_config(err: &ConfigError) -> Diagnostic {
    Diagnostic::error(E104, err.to_string()).with_help("check the values in `tessera.toml`")
}

/// Creates a warning for regions the spreader could not relieve.
pub fn warn_regions_overused(block_type: &str, count: usize) -> Diagnostic {
    Diagnostic::warning(
        W201,
        format!("{count} region(s) of block type `{block_type}` are still overused after growth"),
    )
    .with_note("legalization will move the excess blocks further from their solved positions")
}

/// Creates a warning for a netlist without movable blocks.
pub fn warn_nothing_to_place() -> Diagnostic {
    Diagnostic::warning(W202, "no movable block; keeping the initial placement")
}

/// Creates the note opening a placement run.
pub fn note_started(blocks: usize, hpwl: i64, header: String) -> Diagnostic {
    Diagnostic::note(
        P301,
        format!("analytic placement of {blocks} blocks, initial hpwl {hpwl}"),
    )
    .with_note(header)
}

/// Creates the note carrying one run row.
pub fn note_run(row: String) -> Diagnostic {
    Diagnostic::note(P302, row)
}

/// Creates the note carrying one iteration row.
pub fn note_iteration(row: String) -> Diagnostic {
    Diagnostic::note(P303, row)
}

/// Creates the note closing a placement run.
pub fn note_finished(iterations: usize, hpwl: i64) -> Diagnostic {
    Diagnostic::note(
        P304,
        format!("placement finished after {iterations} iterations, best hpwl {hpwl}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_diagnostics::Severity;

    #[test]
    fn code_formats() {
        assert_eq!(format!("{E101}"), "E101");
        assert_eq!(format!("{E103}"), "E103");
        assert_eq!(format!("{W201}"), "W201");
        assert_eq!(format!("{P304}"), "P304");
    }

    #[test]
    fn capacity_exceeded_diagnostic() {
        let d = error_capacity_exceeded("dsp", 5, 4);
        assert_eq!(d.code, E102);
        assert_eq!(d.severity, Severity::Error);
        assert!(d.message.contains("dsp"));
        assert!(d.message.contains("5"));
    }

    #[test]
    fn no_compatible_slot_has_help() {
        let d = error_no_compatible_slot("ram", 2);
        assert_eq!(d.code, E101);
        assert_eq!(d.help.len(), 1);
    }

    #[test]
    fn invalid_config_carries_the_reason() {
        let err = ConfigError::ValidationError("spreader.beta must be positive".into());
        let d = error_invalid_config(&err);
        assert_eq!(d.code, E104);
        assert_eq!(d.message, "validation error: spreader.beta must be positive");
    }

    #[test]
    fn overused_regions_is_warning() {
        let d = warn_regions_overused("clb", 3);
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(d.notes.len(), 1);
    }

    #[test]
    fn progress_rows_are_notes() {
        let d = note_run("   0  0.001 |".into());
        assert_eq!(d.code, P302);
        assert_eq!(d.severity, Severity::Note);
    }
}
