//! Barycentric Lagrange interpolation on arbitrary 1D node sets.
//!
//! For nodes x_0 < … < x_N the barycentric weights are
//! w_j = 1 / Π_{k≠j} (x_j − x_k), and
//! ℓ_j(x) = w_j / (x − x_j) · Π_k (x − x_k).
//!
//! The differentiation matrix D[i][j] = ℓ_j'(x_i) follows from the same
//! weights:
//! D[i][j] = (w_j / w_i) / (x_i − x_j) for i ≠ j, D[i][i] = −Σ_{j≠i} D[i][j].

use faer::Mat;

fn barycentric_weights(nodes: &[f64]) -> Vec<f64> {
    let n = nodes.len();
    let mut w = vec![1.0; n];
    for j in 0..n {
        for k in 0..n {
            if k != j {
                w[j] /= nodes[j] - nodes[k];
            }
        }
    }
    w
}

/// Evaluate all Lagrange basis polynomials at a point `x`.
///
/// Exact at the nodes themselves (returns a Kronecker delta there), which
/// matters for delta-function coefficients placed exactly on a node.
pub fn lagrange_values(nodes: &[f64], x: f64) -> Vec<f64> {
    let n = nodes.len();
    // On-node short circuit avoids 0/0 in the barycentric formula.
    for (j, &xj) in nodes.iter().enumerate() {
        if (x - xj).abs() < 1e-14 {
            let mut v = vec![0.0; n];
            v[j] = 1.0;
            return v;
        }
    }
    let w = barycentric_weights(nodes);
    let mut num = vec![0.0; n];
    let mut denom = 0.0;
    for j in 0..n {
        let t = w[j] / (x - nodes[j]);
        num[j] = t;
        denom += t;
    }
    num.iter().map(|&t| t / denom).collect()
}

/// Differentiation matrix D[i][j] = ℓ_j'(x_i) on the given nodes.
pub fn lagrange_derivative_matrix(nodes: &[f64]) -> Mat<f64> {
    let n = nodes.len();
    let w = barycentric_weights(nodes);
    let mut d = Mat::zeros(n, n);
    for i in 0..n {
        let mut row_sum = 0.0;
        for j in 0..n {
            if i != j {
                let v = (w[j] / w[i]) / (nodes[i] - nodes[j]);
                d[(i, j)] = v;
                row_sum += v;
            }
        }
        // Row sums of a differentiation matrix vanish (derivative of 1).
        d[(i, i)] = -row_sum;
    }
    d
}
