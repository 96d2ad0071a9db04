/// Short human-readable count for log lines: `950`, `12.5k`, `3.2M`.
pub fn human(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}k", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::human;

    #[test]
    fn scales() {
        assert_eq!(human(950), "950");
        assert_eq!(human(12_500), "12.5k");
        assert_eq!(human(500_000), "500.0k");
        assert_eq!(human(3_260_000), "3.3M");
    }
}
