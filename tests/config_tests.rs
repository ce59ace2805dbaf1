use lanwatch::config::{Overrides, ScanConfig};
use lanwatch::report::ReportFormat;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_defaults() {
    let config = ScanConfig::default();
    assert_eq!(config.subnet, None);
    assert_eq!(config.oui_path, PathBuf::from("mac-vendors.txt"));
    assert_eq!(config.tcp_connect_timeout(), Duration::from_millis(500));
    assert_eq!(config.ping_timeout(), Duration::from_secs(1));
    assert_eq!(config.report_format, ReportFormat::Table);
    assert!(config.ports.contains(&22));
}

#[test]
fn test_partial_file_keeps_defaults() {
    let config = ScanConfig::from_json(
        r#"{ "subnet": "192.168.1.0/24", "ports": [22, 80, 443], "report_format": "csv" }"#,
    )
    .unwrap();
    assert_eq!(config.subnet.as_deref(), Some("192.168.1.0/24"));
    assert_eq!(config.ports, vec![22, 80, 443]);
    assert_eq!(config.report_format, ReportFormat::Csv);
    assert_eq!(config.max_concurrent_scans, 64);
    assert_eq!(config.latency_threshold_ms, 200.0);
}

#[test]
fn test_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "oui_path": "/opt/oui.txt", "max_concurrent_scans": 8 }}"#).unwrap();

    let config = ScanConfig::from_file(file.path()).unwrap();
    assert_eq!(config.oui_path, PathBuf::from("/opt/oui.txt"));
    assert_eq!(config.concurrency(), 8);
}

#[test]
fn test_malformed_file_is_an_error() {
    assert!(ScanConfig::from_json("{ \"ports\": \"all\" }").is_err());
}

#[test]
fn test_range_override_beats_ip() {
    let mut config = ScanConfig::default();
    config.apply(&Overrides {
        range: Some("10.0.0.0/24".to_string()),
        ip: Some("10.0.0.9".parse().unwrap()),
        ..Overrides::default()
    });
    assert_eq!(config.subnet.as_deref(), Some("10.0.0.0/24"));
}

#[test]
fn test_ip_override_is_single_host() {
    let mut config = ScanConfig::default();
    config.apply(&Overrides {
        ip: Some("10.0.0.9".parse().unwrap()),
        format: Some(ReportFormat::Json),
        jobs: Some(0),
        ..Overrides::default()
    });
    assert_eq!(config.subnet.as_deref(), Some("10.0.0.9/32"));
    assert_eq!(config.report_format, ReportFormat::Json);
    assert_eq!(config.max_concurrent_scans, 1);
}

#[test]
fn test_self_override_clears_subnet() {
    let mut config = ScanConfig {
        subnet: Some("10.0.0.0/24".to_string()),
        ..ScanConfig::default()
    };
    config.apply(&Overrides {
        self_scan: true,
        ..Overrides::default()
    });
    assert_eq!(config.subnet, None);
}

#[test]
fn test_legacy_key_names_are_honoured() {
    let config = ScanConfig::from_json(
        r#"{
            "ip_range": "10.0.0.0/24",
            "ports_to_check": [22],
            "latency_threshold": 50,
            "report_format": "html",
            "email": { "smtp_server": "mail.example.com" }
        }"#,
    )
    .unwrap();
    assert_eq!(config.subnet.as_deref(), Some("10.0.0.0/24"));
    assert_eq!(config.ports, vec![22]);
    assert_eq!(config.latency_threshold_ms, 50.0);
    assert_eq!(config.report_format, ReportFormat::Html);
}

#[test]
fn test_scan_interval() {
    assert_eq!(ScanConfig::default().scan_interval(), None);

    let config = ScanConfig::from_json(r#"{ "scan_interval_minutes": 15 }"#).unwrap();
    assert_eq!(config.scan_interval(), Some(Duration::from_secs(15 * 60)));

    let mut config = ScanConfig::default();
    config.apply(&Overrides {
        interval: Some(0),
        ..Overrides::default()
    });
    assert_eq!(config.scan_interval(), Some(Duration::from_secs(60)));
}
