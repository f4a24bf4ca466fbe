//! Gauss-Lobatto-Legendre nodes and weights.
//!
//! The N+1 GLL nodes are the roots of (1 − x²) P'_N(x), endpoints
//! included. Collocating the basis on them makes the mass matrix
//! diagonal and keeps interpolation stable at high order, which is why
//! the tensor-product shapes build everything on these points.

use super::legendre::{legendre, legendre_and_derivative};
use std::f64::consts::PI;

const MAX_NEWTON_ITERATIONS: usize = 100;

/// GLL nodes for polynomial order N: N+1 points in [-1, 1] including
/// the endpoints. Interior roots are found by Newton iteration from
/// Chebyshev-Lobatto initial guesses; the update uses the identity
/// d/dx[(1 − x²) P'_N] = −N(N+1) P_N.
pub fn gauss_lobatto_nodes(order: usize) -> Vec<f64> {
    let n = order;
    if n == 0 {
        return vec![0.0];
    }
    if n == 1 {
        return vec![-1.0, 1.0];
    }

    let mut nodes: Vec<f64> = (0..=n).map(|j| -(PI * j as f64 / n as f64).cos()).collect();
    nodes[0] = -1.0;
    nodes[n] = 1.0;

    for node in nodes.iter_mut().take(n).skip(1) {
        let mut x = *node;
        for _ in 0..MAX_NEWTON_ITERATIONS {
            let (p, dp) = legendre_and_derivative(n, x);
            let update = (1.0 - x * x) * dp / (n as f64 * (n + 1) as f64 * p);
            x += update;
            if update.abs() < 1e-15 {
                break;
            }
        }
        *node = x;
    }
    nodes
}

/// GLL weights w_j = 2 / (N(N+1) P_N(x_j)²).
pub fn gauss_lobatto_weights(order: usize, nodes: &[f64]) -> Vec<f64> {
    let n = order;
    if n == 0 {
        return vec![2.0];
    }
    let denom = (n * (n + 1)) as f64;
    nodes
        .iter()
        .map(|&x| {
            let p = legendre(n, x);
            2.0 / (denom * p * p)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_and_count() {
        for order in 1..=9 {
            let nodes = gauss_lobatto_nodes(order);
            assert_eq!(nodes.len(), order + 1);
            assert!((nodes[0] + 1.0).abs() < 1e-15);
            assert!((nodes[order] - 1.0).abs() < 1e-15);
        }
    }

    #[test]
    fn test_interior_nodes_are_derivative_roots() {
        for order in 2..=9 {
            let nodes = gauss_lobatto_nodes(order);
            for j in 1..order {
                let (_, dp) = legendre_and_derivative(order, nodes[j]);
                assert!(dp.abs() < 1e-11, "order {} node {}: P' = {}", order, j, dp);
            }
        }
    }

    #[test]
    fn test_symmetry() {
        for order in 1..=8 {
            let nodes = gauss_lobatto_nodes(order);
            let weights = gauss_lobatto_weights(order, &nodes);
            let m = nodes.len();
            for i in 0..m / 2 {
                assert!((nodes[i] + nodes[m - 1 - i]).abs() < 1e-14);
                assert!((weights[i] - weights[m - 1 - i]).abs() < 1e-14);
            }
        }
    }

    #[test]
    fn test_weights_sum_to_interval_length() {
        for order in 1..=9 {
            let nodes = gauss_lobatto_nodes(order);
            let sum: f64 = gauss_lobatto_weights(order, &nodes).iter().sum();
            assert!((sum - 2.0).abs() < 1e-13, "order {}: {}", order, sum);
        }
    }

    #[test]
    fn test_exactness_to_degree_2n_minus_1() {
        for order in 1..=7 {
            let nodes = gauss_lobatto_nodes(order);
            let weights = gauss_lobatto_weights(order, &nodes);
            for k in 0..=(2 * order - 1) {
                let num: f64 = nodes
                    .iter()
                    .zip(weights.iter())
                    .map(|(&x, &w)| w * x.powi(k as i32))
                    .sum();
                let exact = if k % 2 == 0 { 2.0 / (k + 1) as f64 } else { 0.0 };
                assert!(
                    (num - exact).abs() < 1e-12,
                    "order {} degree {}: {} vs {}",
                    order,
                    k,
                    num,
                    exact
                );
            }
        }
    }

    #[test]
    fn test_known_order_two_rule() {
        let nodes = gauss_lobatto_nodes(2);
        let weights = gauss_lobatto_weights(2, &nodes);
        assert!(nodes[1].abs() < 1e-15);
        assert!((weights[0] - 1.0 / 3.0).abs() < 1e-14);
        assert!((weights[1] - 4.0 / 3.0).abs() < 1e-14);
    }
}
