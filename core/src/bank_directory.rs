//! Bank name inference for display.
//!
//! Known routing numbers resolve through the configured directory.
//! Unknown routing numbers get a deterministic fallback name keyed by
//! the routing number itself: a display convenience, not a real bank
//! lookup. The same routing number always maps to the same name.

use crate::config::DeskConfig;

pub fn infer_bank_name(config: &DeskConfig, routing_number: &str) -> String {
    if let Some(name) = config.known_banks.get(routing_number) {
        return name.clone();
    }
    let names = &config.fallback_bank_names;
    if names.is_empty() {
        return "Unknown Bank".to_string();
    }
    let idx = (routing_key(routing_number) % names.len() as u64) as usize;
    names[idx].clone()
}

/// Stable numeric key for a routing number string.
fn routing_key(routing_number: &str) -> u64 {
    routing_number
        .bytes()
        .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_routing_hits_directory() {
        let config = DeskConfig::default_test();
        assert_eq!(infer_bank_name(&config, "021000021"), "JPMorgan Chase");
    }

    #[test]
    fn fallback_is_deterministic() {
        let config = DeskConfig::default_test();
        let a = infer_bank_name(&config, "999999999");
        let b = infer_bank_name(&config, "999999999");
        assert_eq!(a, b);
        assert!(config.fallback_bank_names.contains(&a));
    }

    #[test]
    fn different_routings_can_differ() {
        let config = DeskConfig::default_test();
        let names: std::collections::HashSet<String> = (0..20)
            .map(|i| infer_bank_name(&config, &format!("{:09}", 100000000 + i * 7)))
            .collect();
        assert!(names.len() > 1, "fallback should spread across the list");
    }
}
