//! Probability estimators over a [`CountSnapshot`].
//!
//! Every score is in natural-log space. Feature probabilities are smoothed
//! toward an assumed prior, combined by summing their logarithms, and added
//! to the log of the category prior.

use crate::analysis::extractor::FeatureSet;
use crate::classifier::Classification;
use crate::error::Result;
use crate::store::CountSnapshot;

/// `feature_count / category_count`, or 0.0 when the category is empty.
pub fn feature_probability(snapshot: &CountSnapshot, feature: &str, category: &str) -> f64 {
    let category_count = snapshot.category_count(category);
    if category_count == 0.0 {
        return 0.0;
    }
    snapshot.feature_count(feature, category) / category_count
}

/// Bayesian-averaged feature probability.
///
/// `(weight * assumed + total * basic) / (weight + total)`, where `total` is
/// the number of times the feature was seen across all categories. With no
/// evidence this is exactly `assumed`; as evidence grows it approaches the
/// raw [`feature_probability`].
pub fn weighted_probability(
    snapshot: &CountSnapshot,
    feature: &str,
    category: &str,
    weight: f64,
    assumed_probability: f64,
) -> f64 {
    let basic = feature_probability(snapshot, feature, category);
    let total = snapshot.feature_total(feature);
    (weight * assumed_probability + total * basic) / (weight + total)
}

/// Sum of `ln(weighted_probability)` over the distinct features.
pub fn document_log_score(
    snapshot: &CountSnapshot,
    features: &FeatureSet,
    category: &str,
    weight: f64,
    assumed_probability: f64,
) -> f64 {
    features
        .distinct()
        .map(|feature| {
            weighted_probability(snapshot, feature, category, weight, assumed_probability).ln()
        })
        .sum()
}

/// `ln(category_count / total_count)`; negative infinity for an unknown
/// category, `EmptyModel` when nothing has been trained.
pub fn log_prior(snapshot: &CountSnapshot, category: &str) -> Result<f64> {
    let total = snapshot.total_count()?;
    Ok((snapshot.category_count(category) / total).ln())
}

/// Pick the best of `scores` (given in category name order) and apply the
/// margin test.
///
/// The first highest score wins ties. The winner is rejected when any rival
/// satisfies `rival + ln(threshold) >= best`, which is the linear rule
/// `rival * threshold >= best` taken in log space.
pub fn decide<F>(scores: &[(String, f64)], threshold_of: F) -> Option<Classification>
where
    F: Fn(&str) -> f64,
{
    let (best_index, (best, best_score)) = scores
        .iter()
        .enumerate()
        .fold(None::<(usize, &(String, f64))>, |acc, (index, entry)| match acc {
            Some((_, (_, score))) if entry.1 <= *score => acc,
            _ => Some((index, entry)),
        })?;

    let margin = threshold_of(best).ln();
    let contested = scores
        .iter()
        .enumerate()
        .any(|(index, (_, score))| index != best_index && score + margin >= *best_score);

    Some(if contested {
        Classification::Undetermined
    } else {
        Classification::Category(best.clone())
    })
}
