//! Kind tags of the built-in block set.

pub const AND: &str = "AND";
pub const INVERTER: &str = "INVERTER";
pub const OR: &str = "OR";
pub const SR_RESET: &str = "SR-RESET";
pub const SR_RESET_V: &str = "SR-RESET-V";
pub const SR_SET: &str = "SR-SET";
pub const SR_SET_V: &str = "SR-SET-V";
pub const SHORTCUT: &str = "SHORTCUT";
pub const SIGNAL: &str = "SIGNAL";
pub const TIMER_OFF: &str = "TIMER-OFF";
pub const TIMER_ON: &str = "TIMER-ON";
pub const TIMER_PULSE: &str = "TIMER-PULSE";

/// Kinds whose output depends only on current-tick inputs. They must run after
/// their sources every tick. Everything else, plugin kinds included, is
/// treated as state-holding for ordering purposes.
pub const COMBINATIONAL: [&str; 5] = [AND, OR, INVERTER, SHORTCUT, SIGNAL];

pub fn is_combinational(kind: &str) -> bool {
    COMBINATIONAL.contains(&kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latches_and_timers_are_state_holding() {
        for kind in [SR_RESET, SR_SET_V, TIMER_ON, TIMER_OFF, TIMER_PULSE, "PLUGIN"] {
            assert!(!is_combinational(kind), "{}", kind);
        }
        assert!(is_combinational(SHORTCUT));
    }
}
