//! Composite Simpson quadrature.

/// Integrate `f` over `[a, b]` with `panels` Simpson panels (rounded up to even).
pub fn simpson<F>(f: F, a: f64, b: f64, panels: usize) -> f64
where
    F: Fn(f64) -> f64,
{
    if a == b {
        return 0.0;
    }
    let n = panels.max(2).next_multiple_of(2);
    let h = (b - a) / n as f64;

    let mut sum = f(a) + f(b);
    for i in 1..n {
        let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += weight * f(a + h * i as f64);
    }
    sum * h / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_for_cubics() {
        let v = simpson(|x| x * x * x - 2.0 * x + 1.0, 0.0, 2.0, 2);
        assert!((v - 2.0).abs() < 1e-12, "v={v}");
    }

    #[test]
    fn odd_panel_count_is_rounded_up() {
        let v = simpson(f64::sin, 0.0, std::f64::consts::PI, 31);
        assert!((v - 2.0).abs() < 1e-5);
        assert_eq!(simpson(f64::exp, 1.0, 1.0, 8), 0.0);
    }
}
