use clap::Parser;
use sensible_server::config::{Cli, FileConfig, ServerConfig};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tempfile::tempdir;

fn cli(args: &[&str]) -> Cli {
    let mut argv = vec!["sensible-server"];
    argv.extend_from_slice(args);
    Cli::parse_from(argv)
}

#[test]
fn test_config_defaults_without_cgi() {
    let root = tempdir().unwrap();
    let cfg = ServerConfig::from_sources(&cli(&[root.path().to_str().unwrap()]), None).unwrap();

    assert!(!cfg.cgi_enabled);
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.bind_addr, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    assert_eq!(cfg.read_timeout, None);
    assert_eq!(cfg.cgi_timeout, Duration::from_secs(30));
    assert_eq!(cfg.document_root, root.path().canonicalize().unwrap());
}

#[test]
fn test_config_cgi_default_port() {
    let root = tempdir().unwrap();
    let cfg =
        ServerConfig::from_sources(&cli(&[root.path().to_str().unwrap(), "-c"]), None).unwrap();

    assert!(cfg.cgi_enabled);
    assert_eq!(cfg.port, 8000);
}

#[test]
fn test_config_document_root_is_absolute() {
    let root = tempdir().unwrap();
    std::fs::create_dir(root.path().join("site")).unwrap();
    let relative = root.path().join("site").join("..").join("site");

    let cfg = ServerConfig::new(&relative, false).unwrap();

    assert!(cfg.document_root.is_absolute());
    assert_eq!(cfg.document_root, root.path().join("site").canonicalize().unwrap());
}

#[test]
fn test_config_missing_document_root_fails() {
    let root = tempdir().unwrap();
    let missing = root.path().join("nope");

    let err = ServerConfig::new(&missing, false).unwrap_err();
    assert!(err.to_string().contains("No such directory"));
}

#[test]
fn test_config_document_root_must_be_directory() {
    let root = tempdir().unwrap();
    let file = root.path().join("file.txt");
    std::fs::write(&file, "x").unwrap();

    assert!(ServerConfig::new(&file, false).is_err());
}

#[test]
fn test_config_requires_document_root() {
    assert!(ServerConfig::from_sources(&cli(&[]), None).is_err());
}

#[test]
fn test_config_listen_overrides_defaults() {
    let root = tempdir().unwrap();
    let cfg = ServerConfig::from_sources(
        &cli(&[root.path().to_str().unwrap()]),
        Some("127.0.0.1:3000"),
    )
    .unwrap();

    assert_eq!(cfg.listen_addr().to_string(), "127.0.0.1:3000");
}

#[test]
fn test_config_cli_overrides_listen() {
    let root = tempdir().unwrap();
    let cfg = ServerConfig::from_sources(
        &cli(&[root.path().to_str().unwrap(), "--port", "9000"]),
        Some("127.0.0.1:3000"),
    )
    .unwrap();

    assert_eq!(cfg.listen_addr().to_string(), "127.0.0.1:9000");
}

#[test]
fn test_config_invalid_listen_fails() {
    let root = tempdir().unwrap();
    let result =
        ServerConfig::from_sources(&cli(&[root.path().to_str().unwrap()]), Some("not-an-addr"));

    assert!(result.is_err());
}

#[test]
fn test_config_file_layer() {
    let root = tempdir().unwrap();
    let file = root.path().join("server.yaml");
    std::fs::write(
        &file,
        format!(
            "document_root: {}\nenable_cgi: true\nbind: 127.0.0.1\nport: 4000\nread_timeout_secs: 5\ncgi_timeout_secs: 2\n",
            root.path().display()
        ),
    )
    .unwrap();

    let cfg =
        ServerConfig::from_sources(&cli(&["--config", file.to_str().unwrap()]), None).unwrap();

    assert!(cfg.cgi_enabled);
    assert_eq!(cfg.listen_addr().to_string(), "127.0.0.1:4000");
    assert_eq!(cfg.read_timeout, Some(Duration::from_secs(5)));
    assert_eq!(cfg.cgi_timeout, Duration::from_secs(2));
}

#[test]
fn test_config_cli_beats_file() {
    let root = tempdir().unwrap();
    let file = root.path().join("server.yaml");
    std::fs::write(&file, "port: 4000\ncgi_timeout_secs: 2\n").unwrap();

    let cfg = ServerConfig::from_sources(
        &cli(&[
            root.path().to_str().unwrap(),
            "--config",
            file.to_str().unwrap(),
            "-p",
            "4001",
            "--cgi-timeout",
            "7",
        ]),
        None,
    )
    .unwrap();

    assert_eq!(cfg.port, 4001);
    assert_eq!(cfg.cgi_timeout, Duration::from_secs(7));
}

#[test]
fn test_file_config_rejects_unknown_keys() {
    assert!(FileConfig::from_yaml("document_root: /tmp\nlisten: x\n").is_err());
}

#[test]
fn test_config_clone() {
    let root = tempdir().unwrap();
    let cfg1 = ServerConfig::new(root.path(), true).unwrap();
    let cfg2 = cfg1.clone();

    assert_eq!(cfg1.document_root, cfg2.document_root);
    assert_eq!(cfg1.port, cfg2.port);
}
