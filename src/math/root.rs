//! Bisection root finding for monotone functions.

/// Result of a bisection search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracketed {
    pub root: f64,
    pub iterations: usize,
}

/// Find `x` in `[lo, hi]` with `f(x) = 0` for a non-decreasing `f`.
///
/// Returns `None` if the bracket does not contain a sign change
/// (`f(lo) > 0` or `f(hi) < 0`) or the inputs are not finite.
pub fn bisect<F>(f: F, lo: f64, hi: f64, tol: f64, max_iterations: usize) -> Option<Bracketed>
where
    F: Fn(f64) -> f64,
{
    if !(lo.is_finite() && hi.is_finite()) || hi < lo {
        return None;
    }
    let (mut a, mut b) = (lo, hi);
    let fa = f(a);
    let fb = f(b);
    if !(fa <= 0.0 && fb >= 0.0) {
        return None;
    }
    if fa == 0.0 {
        return Some(Bracketed { root: a, iterations: 0 });
    }

    for i in 0..max_iterations {
        let mid = 0.5 * (a + b);
        if (b - a) <= tol {
            return Some(Bracketed { root: mid, iterations: i });
        }
        if f(mid) < 0.0 {
            a = mid;
        } else {
            b = mid;
        }
    }

    Some(Bracketed {
        root: 0.5 * (a + b),
        iterations: max_iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_cube_root() {
        let r = bisect(|x| x * x * x - 8.0, 0.0, 10.0, 1e-10, 200).unwrap();
        assert!((r.root - 2.0).abs() < 1e-8);
    }

    #[test]
    fn rejects_unbracketed_interval() {
        assert!(bisect(|x| x + 1.0, 0.0, 10.0, 1e-10, 200).is_none());
        assert!(bisect(|x| x - 20.0, 0.0, 10.0, 1e-10, 200).is_none());
    }
}
