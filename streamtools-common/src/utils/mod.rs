use std::time::Instant;

/// Formats the time elapsed since `instant`, e.g. `2min 4.051s` or `0.732s`.
pub fn get_formatted_elapsed_time(instant: Instant) -> String {
    let dur = instant.elapsed();
    let minutes = dur.as_secs() / 60;
    let sub_sec = dur.as_secs() % 60;
    let sub_milli = dur.subsec_millis();
    if minutes > 0 {
        return format!("{}min {}.{:03}s", minutes, sub_sec, sub_milli);
    }
    format!("{}.{:03}s", sub_sec, sub_milli)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_time_format() {
        let s = get_formatted_elapsed_time(Instant::now());
        assert!(s.ends_with('s'));
        assert!(!s.contains("min"), "Unexpected minutes in {}", s);
    }
}
