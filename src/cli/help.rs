/// Tracing filter for a `-v` count. Dependencies stay at `warn` until the
/// highest levels.
pub fn get_log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn,wdl_omics_run=info",
        1 => "warn,wdl_omics_run=debug",
        2 => "info,wdl_omics_run=trace",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_levels() {
        assert_eq!(get_log_level(0), "warn,wdl_omics_run=info");
        assert_eq!(get_log_level(1), "warn,wdl_omics_run=debug");
        assert_eq!(get_log_level(5), "trace");
    }
}
