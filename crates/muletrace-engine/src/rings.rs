//! Global ring ID assignment.
//!
//! After all three detectors complete, every detected item is re-labelled
//! with a dense, 1-based `RING_###` sequence, walking cycles, then
//! smurfing, then shells. No id appears twice across detectors.

use muletrace_detect::types::{CycleResult, ShellResult, SmurfingResult};

/// Format a 1-based counter as `RING_###`.
#[must_use]
pub fn format_ring_id(counter: usize) -> String {
    format!("RING_{:03}", counter)
}

/// Re-number every detection into one dense global ring sequence.
pub fn assign_global_ring_ids(
    cycles: &mut [CycleResult],
    smurfing: &mut [SmurfingResult],
    shells: &mut [ShellResult],
) {
    let mut counter = 0usize;
    for cycle in cycles.iter_mut() {
        counter += 1;
        cycle.ring_id = format_ring_id(counter);
    }
    for smurf in smurfing.iter_mut() {
        counter += 1;
        smurf.ring_id = format_ring_id(counter);
    }
    for shell in shells.iter_mut() {
        counter += 1;
        shell.ring_id = format_ring_id(counter);
    }
}
