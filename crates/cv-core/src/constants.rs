/// Default tolerance for component-wise vector comparison
pub const EPSILON: f64 = 1e-6;

/// Scalar deltas with magnitude below this are treated as "no visible change"
pub const SIGNAL_THRESHOLD: f64 = 0.01;

/// A vector whose component range is below this is considered balanced
pub const BALANCE_RANGE: f64 = 0.2;

/// Compression: scalar delta smaller than this fraction of the raw delta norm
pub const COMPRESSION_RATIO: f64 = 0.5;

/// Default bound on the undo history
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Equal weighting across the four dimensions
pub const DEFAULT_WEIGHTS: [f64; 4] = [0.25, 0.25, 0.25, 0.25];

/// Default per-dimension improvement step
pub const DEFAULT_DELTA: f64 = 0.1;

/// Starting vector for a fresh session: (alg, info, dyn, geom)
pub const DEFAULT_INITIAL: [f64; 4] = [0.8, 0.4, 0.6, 0.3];

/// Fixed weights for the weighted-euclidean distance metric
pub const DISTANCE_WEIGHTS: [f64; 4] = [0.4, 0.3, 0.2, 0.1];

/// Rows of the fixed "simplified PCA" projection matrix (3x4)
pub const PCA_BASIS: [[f64; 4]; 3] = [
    [0.5, 0.5, 0.5, 0.5],
    [0.5, -0.5, 0.5, -0.5],
    [0.5, 0.5, -0.5, -0.5],
];

/// Rows of the fixed weighted-sum projection matrix (3x4)
pub const WEIGHTED_SUM_BASIS: [[f64; 4]; 3] = [
    [0.6, 0.4, 0.0, 0.0],
    [0.0, 0.6, 0.4, 0.0],
    [0.0, 0.0, 0.6, 0.4],
];
