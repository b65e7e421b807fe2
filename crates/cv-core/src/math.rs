//! Pure functions over one or two complexity vectors.
//!
//! Nothing here touches session state. The scalar projection is the lossy
//! summary the whole crate is built to expose: `calculate_signal_loss`
//! reports which per-dimension improvements the scalar fails to reflect and
//! classifies how the signal was lost.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{
    COMPRESSION_RATIO, DISTANCE_WEIGHTS, EPSILON, PCA_BASIS, SIGNAL_THRESHOLD, WEIGHTED_SUM_BASIS,
};
use crate::dimension::Dimension;
use crate::error::{ComplexityError, Result};
use crate::vector::ComplexityVector;
use crate::weights::Weights;

// ---------------------------------------------------------------------------
// Scalar projection
// ---------------------------------------------------------------------------

/// Result of projecting a vector onto a single weighted scalar.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScalarAverage {
    pub value: f64,
    /// Set to the original weight sum when the weights had to be renormalized.
    pub renormalized_from: Option<f64>,
}

/// Weighted dot product of `vector` and `weights`.
///
/// Weights that do not sum to 1 (within epsilon) are divided by their true sum
/// before use. That is reported in the result and logged, never silent.
pub fn scalar_average(vector: &ComplexityVector, weights: &Weights) -> ScalarAverage {
    let (effective, renormalized_from) = if weights.is_normalized() {
        (*weights, None)
    } else {
        let sum = weights.sum();
        tracing::warn!(sum, "weights do not sum to 1; renormalizing");
        (weights.normalized(), Some(sum))
    };

    let value = Dimension::ALL
        .iter()
        .map(|&d| vector.get(d) * effective.get(d))
        .sum();

    ScalarAverage {
        value,
        renormalized_from,
    }
}

/// `scalar_average` over a raw weight slice, which must hold four valid weights.
pub fn scalar_average_raw(vector: &ComplexityVector, weights: &[f64]) -> Result<ScalarAverage> {
    let weights = Weights::from_slice(weights)?;
    Ok(scalar_average(vector, &weights))
}

// ---------------------------------------------------------------------------
// Improvement
// ---------------------------------------------------------------------------

/// New vector with `dimension` moved by `delta`, clamped into [0, 1].
pub fn apply_improvement(
    vector: &ComplexityVector,
    dimension: Dimension,
    delta: f64,
) -> Result<ComplexityVector> {
    if !delta.is_finite() {
        return Err(ComplexityError::InvalidDelta {
            dimension,
            value: delta,
        });
    }
    Ok(shift(vector, dimension, delta))
}

/// Infallible core of `apply_improvement` for callers holding a finite delta.
pub(crate) fn shift(
    vector: &ComplexityVector,
    dimension: Dimension,
    delta: f64,
) -> ComplexityVector {
    let mut components = vector.to_array();
    components[dimension.index()] += delta;
    ComplexityVector::saturating(components)
}

pub fn apply_improvement_by_key(
    vector: &ComplexityVector,
    key: &str,
    delta: f64,
) -> Result<ComplexityVector> {
    apply_improvement(vector, key.parse()?, delta)
}

// ---------------------------------------------------------------------------
// Signal loss
// ---------------------------------------------------------------------------

/// How a per-dimension improvement failed to show up in the scalar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LossType {
    /// Gains and losses offset each other; the scalar does not move.
    Cancellation,
    /// A gain coincides with a clearly falling scalar.
    Inversion,
    /// A gain with no offsetting loss that the scalar still cannot see.
    Invisibility,
    /// The scalar moves, but far less than the vector did.
    Compression,
    None,
}

impl LossType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cancellation => "cancellation",
            Self::Inversion => "inversion",
            Self::Invisibility => "invisibility",
            Self::Compression => "compression",
            Self::None => "none",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SignalLossReport {
    /// Sum of the improvements the scalar failed to reflect.
    pub total: f64,
    /// Lost amount per dimension, only for dimensions flagged as lost.
    pub lost: BTreeMap<Dimension, f64>,
    pub scalar_delta: f64,
    /// Raw `after - before` per dimension, unclamped.
    pub deltas: [f64; 4],
    pub has_loss: bool,
    pub loss_type: LossType,
    /// Original weight sum when the weights had to be renormalized.
    pub renormalized_from: Option<f64>,
}

/// Compare two states and report improvement the scalar projection hides.
///
/// A dimension that improved is flagged lost when the scalar barely moved
/// (`|scalar_delta| < SIGNAL_THRESHOLD`) or moved down.
pub fn calculate_signal_loss(
    before: &ComplexityVector,
    after: &ComplexityVector,
    weights: &Weights,
) -> SignalLossReport {
    let deltas = before.delta_to(after);

    // normalize once so both projections share one renormalization warning
    let renormalized_from = (!weights.is_normalized()).then(|| weights.sum());
    if let Some(sum) = renormalized_from {
        tracing::warn!(sum, "weights do not sum to 1; renormalizing");
    }
    let weights = weights.normalized();
    let scalar_delta =
        scalar_average(after, &weights).value - scalar_average(before, &weights).value;

    let invisible = scalar_delta.abs() < SIGNAL_THRESHOLD;
    let mut lost = BTreeMap::new();
    if invisible || scalar_delta < 0.0 {
        for dim in Dimension::ALL {
            let d = deltas[dim.index()];
            if d > EPSILON {
                lost.insert(dim, d);
            }
        }
    }
    let total: f64 = lost.values().sum();

    let loss_type = classify_loss(&deltas, scalar_delta);

    SignalLossReport {
        total,
        lost,
        scalar_delta,
        deltas,
        has_loss: total > 0.0,
        loss_type,
        renormalized_from,
    }
}

/// Ordered classification; the first matching rule wins.
fn classify_loss(deltas: &[f64; 4], scalar_delta: f64) -> LossType {
    let has_positive = deltas.iter().any(|&d| d > EPSILON);
    let has_negative = deltas.iter().any(|&d| d < -EPSILON);
    let flat = scalar_delta.abs() < SIGNAL_THRESHOLD;
    let delta_norm = deltas.iter().map(|d| d * d).sum::<f64>().sqrt();

    if has_positive && has_negative && flat {
        LossType::Cancellation
    } else if has_positive && scalar_delta <= -SIGNAL_THRESHOLD {
        LossType::Inversion
    } else if has_positive && flat {
        LossType::Invisibility
    } else if !flat
        && has_positive
        && has_negative
        && scalar_delta.abs() < COMPRESSION_RATIO * delta_norm
    {
        LossType::Compression
    } else {
        LossType::None
    }
}

// ---------------------------------------------------------------------------
// Pareto dominance
// ---------------------------------------------------------------------------

/// True when `a` is at least as large as `b` everywhere (within epsilon)
/// and strictly larger (beyond epsilon) somewhere.
pub fn dominates_components(a: &[f64], b: &[f64]) -> bool {
    let mut strictly_better = false;
    for (x, y) in a.iter().zip(b.iter()) {
        if *x < *y - EPSILON {
            return false;
        }
        if *x > *y + EPSILON {
            strictly_better = true;
        }
    }
    strictly_better
}

pub fn dominates(a: &ComplexityVector, b: &ComplexityVector) -> bool {
    dominates_components(a.as_ref(), b.as_ref())
}

/// Indices of the points no other point dominates, in input order.
pub fn pareto_indices<P: AsRef<[f64]>>(points: &[P]) -> Vec<usize> {
    (0..points.len())
        .filter(|&i| {
            !points
                .iter()
                .enumerate()
                .any(|(j, other)| {
                    j != i && dominates_components(other.as_ref(), points[i].as_ref())
                })
        })
        .collect()
}

/// A frontier member with its position in the input set.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ParetoPoint {
    pub index: usize,
    pub vector: ComplexityVector,
}

pub fn compute_pareto_frontier(vectors: &[ComplexityVector]) -> Vec<ParetoPoint> {
    pareto_indices(vectors)
        .into_iter()
        .map(|index| ParetoPoint {
            index,
            vector: vectors[index],
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Projection and distance
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProjectionMethod {
    DropGeometric,
    #[default]
    DropLast,
    SimplifiedPca,
    WeightedSum,
}

impl ProjectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DropGeometric => "drop-geom",
            Self::DropLast => "drop-last",
            Self::SimplifiedPca => "pca",
            Self::WeightedSum => "weighted",
        }
    }

    /// Unrecognized names fall back to `DropLast`.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "drop-geom" | "drop_geom" | "geom" => Self::DropGeometric,
            "pca" | "simplified-pca" => Self::SimplifiedPca,
            "weighted" | "weighted-sum" => Self::WeightedSum,
            _ => Self::DropLast,
        }
    }
}

/// Deterministic reduction to three coordinates for plotting.
pub fn project_to_3d(vector: &ComplexityVector, method: ProjectionMethod) -> [f64; 3] {
    let c = vector.to_array();
    match method {
        // geom is the last component, so both drops agree for this layout
        ProjectionMethod::DropGeometric | ProjectionMethod::DropLast => [c[0], c[1], c[2]],
        ProjectionMethod::SimplifiedPca => apply_basis(&PCA_BASIS, &c),
        ProjectionMethod::WeightedSum => apply_basis(&WEIGHTED_SUM_BASIS, &c),
    }
}

fn apply_basis(basis: &[[f64; 4]; 3], c: &[f64; 4]) -> [f64; 3] {
    basis.map(|row| row.iter().zip(c.iter()).map(|(w, x)| w * x).sum())
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    Manhattan,
    Chebyshev,
    WeightedEuclidean,
}

impl DistanceMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::Manhattan => "manhattan",
            Self::Chebyshev => "chebyshev",
            Self::WeightedEuclidean => "weighted",
        }
    }

    /// Unrecognized names fall back to `Euclidean`.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "manhattan" => Self::Manhattan,
            "chebyshev" => Self::Chebyshev,
            "weighted" | "weighted-euclidean" => Self::WeightedEuclidean,
            _ => Self::Euclidean,
        }
    }
}

pub fn compute_distance(a: &ComplexityVector, b: &ComplexityVector, metric: DistanceMetric) -> f64 {
    let d = a.delta_to(b);
    match metric {
        DistanceMetric::Euclidean => d.iter().map(|x| x * x).sum::<f64>().sqrt(),
        DistanceMetric::Manhattan => d.iter().map(|x| x.abs()).sum(),
        DistanceMetric::Chebyshev => d.iter().fold(0.0_f64, |m, x| m.max(x.abs())),
        DistanceMetric::WeightedEuclidean => d
            .iter()
            .zip(DISTANCE_WEIGHTS.iter())
            .map(|(x, w)| w * x * x)
            .sum::<f64>()
            .sqrt(),
    }
}

// ---------------------------------------------------------------------------
// Interpolation and sampling
// ---------------------------------------------------------------------------

/// Linear interpolation; `t` must lie in [0, 1].
pub fn interpolate(a: &ComplexityVector, b: &ComplexityVector, t: f64) -> Result<ComplexityVector> {
    if !(0.0..=1.0).contains(&t) {
        return Err(ComplexityError::InterpolationOutOfRange(t));
    }
    let (a, b) = (a.to_array(), b.to_array());
    Ok(ComplexityVector::saturating(std::array::from_fn(|i| {
        a[i] + t * (b[i] - a[i])
    })))
}

/// Uniformly random vector.
pub fn random_vector(rng: &mut impl Rng) -> ComplexityVector {
    ComplexityVector::saturating(std::array::from_fn(|_| rng.random::<f64>()))
}

pub fn random_vectors(n: usize, rng: &mut impl Rng) -> Vec<ComplexityVector> {
    (0..n).map(|_| random_vector(rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn v(a: f64, b: f64, c: f64, d: f64) -> ComplexityVector {
        ComplexityVector::new(a, b, c, d).unwrap()
    }

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    #[test]
    fn test_scalar_average_equal_weights() {
        let s = scalar_average(&v(0.8, 0.4, 0.6, 0.3), &Weights::equal());
        assert_abs_diff_eq!(s.value, 0.525, epsilon = 1e-12);
        assert!(s.renormalized_from.is_none());
    }

    #[test]
    fn test_scalar_average_renormalizes() {
        let w = Weights::new([2.0, 2.0, 2.0, 2.0]).unwrap();
        let s = scalar_average(&v(0.8, 0.4, 0.6, 0.3), &w);
        assert_abs_diff_eq!(s.value, 0.525, epsilon = 1e-12);
        assert_eq!(s.renormalized_from, Some(8.0));
    }

    #[test]
    fn test_scalar_average_raw_validates() {
        let vec = v(0.8, 0.4, 0.6, 0.3);
        assert!(scalar_average_raw(&vec, &[0.5, 0.5]).is_err());
        assert!(scalar_average_raw(&vec, &[0.5, 0.5, -0.5, 0.5]).is_err());
        let s = scalar_average_raw(&vec, &[1.0, 0.0, 0.0, 0.0]).unwrap();
        assert_abs_diff_eq!(s.value, 0.8);
    }

    #[test]
    fn test_apply_improvement_clamps() {
        let improved =
            apply_improvement(&v(0.8, 0.4, 0.6, 0.3), Dimension::Algorithmic, 0.2).unwrap();
        assert_eq!(improved, v(1.0, 0.4, 0.6, 0.3));

        let capped =
            apply_improvement(&v(0.9, 0.4, 0.6, 0.3), Dimension::Algorithmic, 0.5).unwrap();
        assert_eq!(capped.alg(), 1.0);
    }

    #[test]
    fn test_apply_improvement_unknown_key() {
        let err = apply_improvement_by_key(&v(0.8, 0.4, 0.6, 0.3), "topo", 0.1).unwrap_err();
        assert!(matches!(err, ComplexityError::UnknownDimension(_)));
    }

    #[test]
    fn test_apply_improvement_rejects_nan_delta() {
        assert!(apply_improvement(&v(0.5, 0.5, 0.5, 0.5), Dimension::Geometric, f64::NAN).is_err());
    }

    #[test]
    fn test_signal_loss_visible_gain_is_not_lost() {
        let before = v(0.5, 0.5, 0.5, 0.5);
        let after = v(0.7, 0.5, 0.5, 0.5);
        let report = calculate_signal_loss(&before, &after, &Weights::equal());

        assert_abs_diff_eq!(report.scalar_delta, 0.05, epsilon = 1e-12);
        assert!(!report.has_loss);
        assert!(report.lost.is_empty());
        assert_eq!(report.loss_type, LossType::None);
    }

    #[test]
    fn test_signal_loss_cancellation() {
        let before = v(0.5, 0.5, 0.5, 0.5);
        let after = v(0.65, 0.35, 0.5, 0.5);
        let report = calculate_signal_loss(&before, &after, &Weights::equal());

        assert!(report.scalar_delta.abs() < 1e-12);
        assert!(report.has_loss);
        assert_eq!(report.loss_type, LossType::Cancellation);
        assert_abs_diff_eq!(report.lost[&Dimension::Algorithmic], 0.15, epsilon = 1e-12);
        assert!(!report.lost.contains_key(&Dimension::Information));
        assert_abs_diff_eq!(report.total, 0.15, epsilon = 1e-12);
    }

    #[test]
    fn test_signal_loss_inversion() {
        let before = v(0.5, 0.5, 0.5, 0.5);
        let after = v(0.6, 0.2, 0.5, 0.5);
        let report = calculate_signal_loss(&before, &after, &Weights::equal());

        assert!(report.scalar_delta < -SIGNAL_THRESHOLD);
        assert_eq!(report.loss_type, LossType::Inversion);
        assert_abs_diff_eq!(report.total, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_signal_loss_invisibility() {
        let before = v(0.5, 0.5, 0.5, 0.5);
        let after = v(0.5, 0.5, 0.5, 0.52);
        let report = calculate_signal_loss(&before, &after, &Weights::equal());

        assert_eq!(report.loss_type, LossType::Invisibility);
        assert!(report.lost.contains_key(&Dimension::Geometric));
    }

    #[test]
    fn test_signal_loss_invisibility_under_zero_weight() {
        let weights = Weights::new([1.0, 0.0, 0.0, 0.0]).unwrap();
        let before = v(0.5, 0.5, 0.5, 0.5);
        let after = v(0.5, 0.9, 0.5, 0.5);
        let report = calculate_signal_loss(&before, &after, &weights);

        assert_eq!(report.loss_type, LossType::Invisibility);
        assert_abs_diff_eq!(report.total, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_signal_loss_compression() {
        let before = v(0.5, 0.5, 0.5, 0.5);
        let after = v(0.9, 0.3, 0.5, 0.5);
        let report = calculate_signal_loss(&before, &after, &Weights::equal());

        // scalar delta 0.05 against a raw delta norm of ~0.447
        assert!(report.scalar_delta >= SIGNAL_THRESHOLD);
        assert_eq!(report.loss_type, LossType::Compression);
        assert!(!report.has_loss);
    }

    #[test]
    fn test_signal_loss_renormalizes_once() {
        let before = ComplexityVector::new(0.5, 0.5, 0.5, 0.5).unwrap();
        let after = ComplexityVector::new(0.7, 0.5, 0.5, 0.5).unwrap();
        let raw = Weights::new([1.0, 1.0, 1.0, 1.0]).unwrap();

        let report = calculate_signal_loss(&before, &after, &raw);
        let reference = calculate_signal_loss(&before, &after, &Weights::equal());

        assert_eq!(report.renormalized_from, Some(4.0));
        assert_eq!(reference.renormalized_from, None);
        assert_abs_diff_eq!(report.scalar_delta, reference.scalar_delta, epsilon = 1e-12);
        assert_eq!(report.loss_type, reference.loss_type);
    }

    #[test]
    fn test_signal_loss_identical_states() {
        let a = v(0.3, 0.3, 0.3, 0.3);
        let report = calculate_signal_loss(&a, &a, &Weights::equal());
        assert_eq!(report.loss_type, LossType::None);
        assert!(!report.has_loss);
    }

    #[test]
    fn test_pareto_2d_tradeoffs_all_survive() {
        let points = vec![[0.8, 0.2], [0.2, 0.8], [0.5, 0.5]];
        assert_eq!(pareto_indices(&points), vec![0, 1, 2]);
    }

    #[test]
    fn test_pareto_2d_dominating_point_wins() {
        let points = vec![[0.8, 0.2], [0.2, 0.8], [0.5, 0.5], [0.9, 0.9]];
        assert_eq!(pareto_indices(&points), vec![3]);
    }

    #[test]
    fn test_pareto_duplicates_do_not_dominate_each_other() {
        let vs = vec![v(0.5, 0.5, 0.5, 0.5), v(0.5, 0.5, 0.5, 0.5)];
        let frontier = compute_pareto_frontier(&vs);
        assert_eq!(frontier.len(), 2);
    }

    #[test]
    fn test_pareto_frontier_keeps_indices() {
        let vs = vec![
            v(0.1, 0.1, 0.1, 0.1),
            v(0.9, 0.1, 0.5, 0.5),
            v(0.1, 0.9, 0.5, 0.5),
        ];
        let frontier = compute_pareto_frontier(&vs);
        let idx: Vec<usize> = frontier.iter().map(|p| p.index).collect();
        assert_eq!(idx, vec![1, 2]);
        assert_eq!(frontier[0].vector, vs[1]);
    }

    #[test]
    fn test_dominates_requires_strict_gain() {
        let a = v(0.5, 0.5, 0.5, 0.5);
        assert!(!dominates(&a, &a));
        assert!(dominates(&v(0.6, 0.5, 0.5, 0.5), &a));
        assert!(!dominates(&v(0.6, 0.4, 0.5, 0.5), &a));
    }

    #[test]
    fn test_projection_methods() {
        let vec = v(0.8, 0.4, 0.6, 0.3);
        assert_eq!(project_to_3d(&vec, ProjectionMethod::DropGeometric), [0.8, 0.4, 0.6]);
        assert_eq!(project_to_3d(&vec, ProjectionMethod::DropLast), [0.8, 0.4, 0.6]);

        let pca = project_to_3d(&vec, ProjectionMethod::SimplifiedPca);
        assert_abs_diff_eq!(pca[0], 1.05, epsilon = 1e-12);
        assert_abs_diff_eq!(pca[1], 0.35, epsilon = 1e-12);
        assert_abs_diff_eq!(pca[2], 0.15, epsilon = 1e-12);

        let ws = project_to_3d(&vec, ProjectionMethod::WeightedSum);
        assert_abs_diff_eq!(ws[0], 0.64, epsilon = 1e-12);
    }

    #[test]
    fn test_projection_unknown_falls_back() {
        assert_eq!(ProjectionMethod::from_str_lossy("tsne"), ProjectionMethod::DropLast);
        assert_eq!(ProjectionMethod::from_str_lossy("pca"), ProjectionMethod::SimplifiedPca);
    }

    #[test]
    fn test_distance_metrics() {
        let a = v(0.0, 0.0, 0.0, 0.0);
        let b = v(0.3, 0.4, 0.0, 0.0);
        assert_abs_diff_eq!(
            compute_distance(&a, &b, DistanceMetric::Euclidean),
            0.5,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            compute_distance(&a, &b, DistanceMetric::Manhattan),
            0.7,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            compute_distance(&a, &b, DistanceMetric::Chebyshev),
            0.4,
            epsilon = 1e-12
        );
        let weighted = (0.4 * 0.09 + 0.3 * 0.16_f64).sqrt();
        assert_abs_diff_eq!(
            compute_distance(&a, &b, DistanceMetric::WeightedEuclidean),
            weighted,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_distance_unknown_falls_back_to_euclidean() {
        assert_eq!(DistanceMetric::from_str_lossy("cosine"), DistanceMetric::Euclidean);
    }

    #[test]
    fn test_interpolate() {
        let a = v(0.0, 0.2, 0.4, 1.0);
        let b = v(1.0, 0.4, 0.4, 0.0);
        assert_eq!(interpolate(&a, &b, 0.0).unwrap(), a);
        assert_eq!(interpolate(&a, &b, 1.0).unwrap(), b);
        assert_eq!(interpolate(&a, &b, 0.5).unwrap(), v(0.5, 0.3, 0.4, 0.5));
    }

    #[test]
    fn test_interpolate_rejects_out_of_range() {
        let a = v(0.0, 0.0, 0.0, 0.0);
        assert!(matches!(
            interpolate(&a, &a, 1.5),
            Err(ComplexityError::InterpolationOutOfRange(_))
        ));
        assert!(interpolate(&a, &a, -0.1).is_err());
        assert!(interpolate(&a, &a, f64::NAN).is_err());
    }

    #[test]
    fn test_random_vectors_valid_and_seeded() {
        let a = random_vectors(50, &mut rng());
        let b = random_vectors(50, &mut rng());
        assert_eq!(a, b);
        for vec in &a {
            assert!(vec.to_array().iter().all(|c| (0.0..=1.0).contains(c)));
        }
    }
}
