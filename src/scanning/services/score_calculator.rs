use crate::scanning::domain::{Severity, SeverityCounts};

/// Points deducted per finding of a tier
pub fn weight(severity: Severity) -> u32 {
    match severity {
        Severity::Critical => 25,
        Severity::High => 15,
        Severity::Medium => 7,
        Severity::Low => 3,
    }
}

/// `max(0, 100 - Σ weight(severity) × count(severity))`
pub fn security_score(counts: &SeverityCounts) -> u8 {
    let penalty = Severity::ALL.iter().fold(0u64, |acc, severity| {
        acc.saturating_add(
            u64::from(weight(*severity)).saturating_mul(counts.get(*severity) as u64),
        )
    });
    100u64.saturating_sub(penalty) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_scan_scores_100() {
        assert_eq!(security_score(&SeverityCounts::default()), 100);
    }

    #[test]
    fn test_mixed_counts() {
        let counts = SeverityCounts::new(1, 2, 0, 3);
        assert_eq!(security_score(&counts), 36);
    }

    #[test]
    fn test_floor_at_zero() {
        assert_eq!(security_score(&SeverityCounts::new(5, 0, 0, 0)), 0);
        assert_eq!(security_score(&SeverityCounts::new(usize::MAX, 1, 1, 1)), 0);
    }

    #[test]
    fn test_bounded_and_non_increasing() {
        for critical in 0..4 {
            for high in 0..5 {
                for medium in 0..6 {
                    for low in 0..8 {
                        let base = SeverityCounts::new(critical, high, medium, low);
                        let score = security_score(&base);
                        assert!(score <= 100);
                        for bumped in [
                            SeverityCounts::new(critical + 1, high, medium, low),
                            SeverityCounts::new(critical, high + 1, medium, low),
                            SeverityCounts::new(critical, high, medium + 1, low),
                            SeverityCounts::new(critical, high, medium, low + 1),
                        ] {
                            assert!(security_score(&bumped) <= score);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_order_independent() {
        let a: SeverityCounts = [Severity::Low, Severity::Critical, Severity::High]
            .into_iter()
            .collect();
        let b: SeverityCounts = [Severity::High, Severity::Low, Severity::Critical]
            .into_iter()
            .collect();
        assert_eq!(security_score(&a), security_score(&b));
        assert_eq!(security_score(&a), 57);
    }
}
