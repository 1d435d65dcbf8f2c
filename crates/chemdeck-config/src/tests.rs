use super::*;
use pretty_assertions::assert_eq;
use std::io::Write;

#[test]
fn test_defaults_when_sections_missing() {
    let config = Config::from_toml("").unwrap();
    assert_eq!(config.server.port, 3001);
    assert_eq!(config.server.bind_addr(), "127.0.0.1:3001");
    assert_eq!(config.jobs.backend, JobBackend::Simulated);
    assert_eq!(config.jobs.delay_scale, 1.0);
    assert_eq!(config.viewer.default_representation, "cartoon");
    assert_eq!(config.uploads.max_upload_bytes, 50 * 1024 * 1024);
}

#[test]
fn test_partial_section_keeps_other_defaults() {
    let config = Config::from_toml(
        r#"
        [jobs]
        delay_scale = 0.5

        [sessions]
        ttl_secs = 60
        "#,
    )
    .unwrap();
    assert_eq!(config.jobs.delay_scale, 0.5);
    assert_eq!(config.jobs.poll_interval_ms, 500);
    assert_eq!(config.sessions.ttl(), Duration::from_secs(60));
    assert_eq!(config.sessions.sweep_interval_secs, 60);
}

#[test]
fn test_scaled_delay() {
    let jobs = JobsConfig { delay_scale: 0.5, ..Default::default() };
    assert_eq!(jobs.scaled_delay(Duration::from_secs(3)), Duration::from_millis(1500));
}

#[test]
fn test_http_backend_requires_url() {
    let err = Config::from_toml(
        r#"
        [jobs]
        backend = "http"
        "#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("backend_url"));

    let ok = Config::from_toml(
        r#"
        [jobs]
        backend = "http"
        backend_url = "http://localhost:8080"
        "#,
    )
    .unwrap();
    assert_eq!(ok.jobs.backend, JobBackend::Http);
}

#[test]
fn test_rejects_non_positive_delay_scale() {
    let err = Config::from_toml("[jobs]\ndelay_scale = 0.0\n").unwrap_err();
    assert!(matches!(err, ChemdeckError::Config(_)));
}

#[test]
fn test_rejects_huge_delay_scale() {
    let err = Config::from_toml("[jobs]\ndelay_scale = 1e20\n").unwrap_err();
    assert!(err.to_string().contains("delay_scale"));

    let jobs = JobsConfig { delay_scale: 1e20, ..Default::default() };
    assert_eq!(jobs.scaled_delay(Duration::from_secs(3)), Duration::MAX);
}

#[test]
fn test_rejects_zero_max_polls() {
    let err = Config::from_toml("[jobs]\nmax_polls = 0\n").unwrap_err();
    assert!(err.to_string().contains("max_polls"));
}

#[test]
fn test_rejects_zero_sweep_interval() {
    let err = Config::from_toml("[sessions]\nsweep_interval_secs = 0\n").unwrap_err();
    assert!(matches!(err, ChemdeckError::Config(ref m) if m.contains("sweep_interval_secs")));
}

#[test]
fn test_rejects_malformed_toml() {
    let err = Config::from_toml("[server\nport = 1").unwrap_err();
    assert!(matches!(err, ChemdeckError::Config(_)));
}

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[server]\nport = 8088\nhost = \"0.0.0.0\"").unwrap();
    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.server.bind_addr(), "0.0.0.0:8088");
}
