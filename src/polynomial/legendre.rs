//! Legendre polynomial evaluation.
//!
//! Legendre polynomials P_n are orthogonal on [-1, 1] with weight 1:
//! ∫ P_m P_n dx = 2/(2n+1) δ_{mn}. The GLL node solver needs P_n and
//! P'_n together; everything is evaluated by the three-term recurrence
//! (n+1) P_{n+1}(x) = (2n+1) x P_n(x) − n P_{n-1}(x).

/// Evaluate P_n(x).
pub fn legendre(n: usize, x: f64) -> f64 {
    legendre_pair(n, x).0
}

/// Evaluate the derivative P'_n(x).
///
/// Away from the endpoints P'_n = n (x P_n − P_{n-1}) / (x² − 1); at
/// x = ±1 the limit is (±1)^{n+1} n(n+1)/2.
pub fn legendre_derivative(n: usize, x: f64) -> f64 {
    legendre_and_derivative(n, x).1
}

/// Evaluate P_n(x) and P'_n(x) with a single recurrence pass.
pub fn legendre_and_derivative(n: usize, x: f64) -> (f64, f64) {
    if n == 0 {
        return (1.0, 0.0);
    }
    let (p_n, p_nm1) = legendre_pair(n, x);
    let dp = if (x - 1.0).abs() < 1e-14 {
        (n * (n + 1)) as f64 / 2.0
    } else if (x + 1.0).abs() < 1e-14 {
        let sign = if n % 2 == 0 { -1.0 } else { 1.0 };
        sign * (n * (n + 1)) as f64 / 2.0
    } else {
        n as f64 * (x * p_n - p_nm1) / (x * x - 1.0)
    };
    (p_n, dp)
}

/// (P_n, P_{n-1}) by the three-term recurrence.
fn legendre_pair(n: usize, x: f64) -> (f64, f64) {
    if n == 0 {
        return (1.0, 1.0);
    }
    let mut p_prev = 1.0;
    let mut p_curr = x;
    for k in 1..n {
        let p_next = ((2 * k + 1) as f64 * x * p_curr - k as f64 * p_prev) / (k + 1) as f64;
        p_prev = p_curr;
        p_curr = p_next;
    }
    (p_curr, p_prev)
}
