use crate::types::{Label, Verdict};

#[derive(Clone, Debug)]
pub struct MergedScore {
    pub label: Label,
    pub confidence: f64,
}

/// Merge verdicts by weighted vote.
///
/// Each `(verdict, trust_weight)` pair contributes `weight * confidence` to
/// its label's tally; the label with the highest tally wins, and ties break
/// toward the riskier label. The merged confidence is the weighted average
/// over the contributing verdicts.
///
/// `Unknown` verdicts carry no information and are excluded from both the
/// vote and the average; if nothing else remains the result is `Unknown`.
pub fn merge_verdicts(inputs: &[(Verdict, f64)]) -> MergedScore {
    let informative: Vec<&(Verdict, f64)> = inputs
        .iter()
        .filter(|(v, _)| v.label != Label::Unknown)
        .collect();

    if informative.is_empty() {
        return MergedScore {
            label: Label::Unknown,
            confidence: 0.0,
        };
    }

    let mut tallies: Vec<(Label, f64)> = Vec::new();
    for (verdict, weight) in &informative {
        let points = weight * verdict.confidence;
        match tallies.iter_mut().find(|(label, _)| *label == verdict.label) {
            Some((_, tally)) => *tally += points,
            None => tallies.push((verdict.label, points)),
        }
    }

    let label = tallies
        .iter()
        .max_by(|(la, a), (lb, b)| {
            a.partial_cmp(b)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(la.risk_rank().cmp(&lb.risk_rank()))
        })
        .map(|(label, _)| *label)
        .unwrap_or(Label::Unknown);

    let weight_total: f64 = informative.iter().map(|(_, w)| w).sum();
    let confidence = if weight_total > 0.0 {
        informative
            .iter()
            .map(|(v, w)| w * v.confidence)
            .sum::<f64>()
            / weight_total
    } else {
        0.0
    };

    MergedScore { label, confidence }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(label: Label, confidence: f64, source: &str) -> Verdict {
        Verdict {
            label,
            confidence,
            source: source.to_string(),
            raw: None,
        }
    }

    #[test]
    fn test_weighted_vote_prefers_heavier_provider() {
        // A: weight 2, malicious 0.9; B: weight 1, benign 0.8
        let inputs = vec![
            (verdict(Label::Malicious, 0.9, "a"), 2.0),
            (verdict(Label::Benign, 0.8, "b"), 1.0),
        ];

        let merged = merge_verdicts(&inputs);

        assert_eq!(merged.label, Label::Malicious);
        // (2*0.9 + 1*0.8) / 3
        assert!((merged.confidence - 0.8666).abs() < 0.001);
    }

    #[test]
    fn test_tie_breaks_toward_riskier_label() {
        let inputs = vec![
            (verdict(Label::Suspicious, 0.6, "a"), 1.0),
            (verdict(Label::Benign, 0.6, "b"), 1.0),
        ];

        let merged = merge_verdicts(&inputs);

        assert_eq!(merged.label, Label::Suspicious);
    }

    #[test]
    fn test_malicious_wins_three_way_tie() {
        let inputs = vec![
            (verdict(Label::Benign, 0.5, "a"), 1.0),
            (verdict(Label::Suspicious, 0.5, "b"), 1.0),
            (verdict(Label::Malicious, 0.5, "c"), 1.0),
        ];

        let merged = merge_verdicts(&inputs);

        assert_eq!(merged.label, Label::Malicious);
    }

    #[test]
    fn test_single_verdict_passes_through() {
        let inputs = vec![(verdict(Label::Benign, 0.7, "only"), 1.5)];

        let merged = merge_verdicts(&inputs);

        assert_eq!(merged.label, Label::Benign);
        assert!((merged.confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_unknowns_are_excluded() {
        let inputs = vec![
            (verdict(Label::Unknown, 0.0, "a"), 2.0),
            (verdict(Label::Benign, 0.8, "b"), 1.0),
        ];

        let merged = merge_verdicts(&inputs);

        assert_eq!(merged.label, Label::Benign);
        // Unknown weight must not dilute the average.
        assert!((merged.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_all_unknown_is_unknown() {
        let inputs = vec![
            (verdict(Label::Unknown, 0.0, "a"), 2.0),
            (verdict(Label::Unknown, 0.0, "b"), 1.0),
        ];

        let merged = merge_verdicts(&inputs);

        assert_eq!(merged.label, Label::Unknown);
        assert_eq!(merged.confidence, 0.0);
    }

    #[test]
    fn test_empty_input_is_unknown() {
        let merged = merge_verdicts(&[]);
        assert_eq!(merged.label, Label::Unknown);
    }

    #[test]
    fn test_accumulation_within_one_label() {
        // Two mid-confidence malicious votes outweigh one strong benign vote.
        let inputs = vec![
            (verdict(Label::Malicious, 0.5, "a"), 1.0),
            (verdict(Label::Malicious, 0.5, "b"), 1.0),
            (verdict(Label::Benign, 0.9, "c"), 1.0),
        ];

        let merged = merge_verdicts(&inputs);

        assert_eq!(merged.label, Label::Malicious);
    }
}
