use std::collections::HashSet;

use crate::models::Track;

/// Years before this are treated as an unknown era.
pub const MIN_PLAUSIBLE_YEAR: i32 = 1900;

/// Cosine similarity between two vectors.
///
/// Returns 0 for empty or mismatched vectors and for zero norms.
#[must_use]
pub fn cosine_sim(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let sim = dot / (norm_a * norm_b);
    if sim.is_finite() { sim } else { 0.0 }
}

/// Lowercased, trimmed genre names with blanks dropped.
#[must_use]
pub fn genre_set(genres: &[String]) -> HashSet<String> {
    genres
        .iter()
        .map(|g| g.trim().to_lowercase())
        .filter(|g| !g.is_empty())
        .collect()
}

/// Jaccard index of two genre sets. Zero if either is empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let inter = a.intersection(b).count();
    let union = a.union(b).count();
    inter as f64 / union as f64
}

/// Absolute year difference, or 0 when either year is missing or implausible.
#[must_use]
pub fn era_distance(a: &Track, b: &Track) -> f64 {
    match (a.year, b.year) {
        (Some(ya), Some(yb)) if ya >= MIN_PLAUSIBLE_YEAR && yb >= MIN_PLAUSIBLE_YEAR => {
            (f64::from(ya) - f64::from(yb)).abs()
        }
        _ => 0.0,
    }
}

/// Absolute popularity difference, missing popularity counting as 0.
#[must_use]
pub fn popularity_distance(a: &Track, b: &Track) -> f64 {
    let pa = a.popularity.unwrap_or(0);
    let pb = b.popularity.unwrap_or(0);
    (f64::from(pa) - f64::from(pb)).abs()
}

/// Exponential falloff `exp(-distance / max(1, decay))`.
#[must_use]
pub fn decay_sim(distance: f64, decay: f64) -> f64 {
    (-distance / decay.max(1.0)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_track(year: Option<i32>, popularity: Option<i32>) -> Track {
        Track {
            year,
            popularity,
            ..Track::default()
        }
    }

    fn genres(names: &[&str]) -> HashSet<String> {
        genre_set(&names.iter().map(|s| (*s).to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn test_cosine_identical_and_opposite() {
        let a = [1.0, -2.0, 0.5];
        let b = [-1.0, 2.0, -0.5];
        assert!((cosine_sim(&a, &a) - 1.0).abs() < 1e-12);
        assert!((cosine_sim(&a, &b) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_degenerate_inputs() {
        assert!(cosine_sim(&[], &[]).abs() < f64::EPSILON);
        assert!(cosine_sim(&[1.0, 2.0], &[1.0]).abs() < f64::EPSILON);
        assert!(cosine_sim(&[0.0, 0.0], &[1.0, 2.0]).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cosine_symmetric() {
        let a = [0.3, -1.2, 2.5, 0.0, 0.7];
        let b = [1.1, 0.4, -0.9, 3.3, -0.2];
        assert_eq!(cosine_sim(&a, &b).to_bits(), cosine_sim(&b, &a).to_bits());
    }

    #[test]
    fn test_jaccard_case_folding() {
        let a = genres(&["Rock", " indie "]);
        let b = genres(&["rock", "pop"]);
        assert!((jaccard(&a, &b) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_jaccard_empty_is_zero() {
        let a = genres(&["rock"]);
        assert!(jaccard(&a, &HashSet::new()).abs() < f64::EPSILON);
        assert!(jaccard(&HashSet::new(), &a).abs() < f64::EPSILON);
        assert!(jaccard(&genres(&["", "  "]), &a).abs() < f64::EPSILON);
    }

    #[test]
    fn test_era_distance() {
        let a = make_track(Some(1995), None);
        let b = make_track(Some(2005), None);
        assert!((era_distance(&a, &b) - 10.0).abs() < f64::EPSILON);
        assert!((decay_sim(10.0, 10.0) - (-1.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_era_unknown_is_zero_distance() {
        let a = make_track(Some(1995), None);
        assert!(era_distance(&a, &make_track(None, None)).abs() < f64::EPSILON);
        assert!(era_distance(&a, &make_track(Some(1850), None)).abs() < f64::EPSILON);
        assert!(era_distance(&make_track(Some(0), None), &a).abs() < f64::EPSILON);
    }

    #[test]
    fn test_popularity_distance_missing_is_zero() {
        let a = make_track(None, Some(70));
        let b = make_track(None, None);
        assert!((popularity_distance(&a, &b) - 70.0).abs() < f64::EPSILON);
        assert!((popularity_distance(&b, &a) - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_decay_floor_of_one() {
        // Decays below 1 behave like 1
        assert!((decay_sim(2.0, 0.0) - decay_sim(2.0, 1.0)).abs() < f64::EPSILON);
        assert!((decay_sim(0.0, 30.0) - 1.0).abs() < f64::EPSILON);
    }
}
