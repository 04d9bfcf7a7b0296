//! Integration tests for client construction with Docker discovery.

use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regclient::{ConfigHost, DockerPaths, LogFormat, LogLevel, LogSink, Opt, RegClient, TlsConf};
use tempfile::TempDir;

const CA_PEM: &str = "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n";

fn write_docker_config(dir: &Path, hosts: &[(&str, &str, &str)]) {
    let auths: serde_json::Map<String, serde_json::Value> = hosts
        .iter()
        .map(|(host, user, pass)| {
            (
                (*host).to_string(),
                serde_json::json!({ "auth": STANDARD.encode(format!("{user}:{pass}")) }),
            )
        })
        .collect();
    let config = serde_json::json!({ "auths": auths });
    std::fs::write(dir.join("config.json"), config.to_string()).unwrap();
}

fn write_cert(certs_dir: &Path, host: &str) {
    let host_dir = certs_dir.join(host);
    std::fs::create_dir_all(&host_dir).unwrap();
    std::fs::write(host_dir.join("ca.crt"), CA_PEM).unwrap();
}

struct Fixture {
    _dir: TempDir,
    paths: DockerPaths,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    write_docker_config(
        dir.path(),
        &[
            ("https://index.docker.io/v1/", "hubuser", "hubpass"),
            ("reg.example.com", "docker-user", "docker-pass"),
        ],
    );
    let certs = dir.path().join("certs.d");
    write_cert(&certs, "reg.example.com");
    write_cert(&certs, "localhost:5000");

    let paths = DockerPaths::new(Some(dir.path().join("config.json")), vec![certs]);
    Fixture { _dir: dir, paths }
}

#[test]
fn test_discovery_enabled() {
    let fx = fixture();
    let client =
        RegClient::with_docker_paths(vec![Opt::WithDockerCreds, Opt::WithDockerCerts], &fx.paths)
            .unwrap();

    let hub = client.host("index.docker.io").unwrap();
    assert_eq!(hub.user.as_deref(), Some("hubuser"));

    let reg = client.host("reg.example.com").unwrap();
    assert_eq!(reg.user.as_deref(), Some("docker-user"));
    assert_eq!(reg.reg_cert.as_deref(), Some(CA_PEM));

    let local = client.host("localhost:5000").unwrap();
    assert!(local.user.is_none());
    assert_eq!(local.reg_cert.as_deref(), Some(CA_PEM));
}

#[test]
fn test_discovery_disabled() {
    let fx = fixture();
    let client = RegClient::with_docker_paths(Vec::new(), &fx.paths).unwrap();
    assert_eq!(client.hosts().count(), 0);
}

#[test]
fn test_only_certificates() {
    let fx = fixture();
    let client = RegClient::with_docker_paths(vec![Opt::WithDockerCerts], &fx.paths).unwrap();

    assert!(client.host("docker.io").is_none());
    let reg = client.host("reg.example.com").unwrap();
    assert!(reg.user.is_none());
    assert!(reg.reg_cert.is_some());
}

#[test]
fn test_explicit_host_overrides_discovered() {
    let fx = fixture();
    let explicit = ConfigHost::new("reg.example.com")
        .with_credentials("explicit-user", "explicit-pass")
        .with_tls(TlsConf::Insecure);
    let client = RegClient::with_docker_paths(
        vec![
            Opt::WithLog(Arc::new(LogSink::new(LogLevel::Debug, LogFormat::Json))),
            Opt::WithDockerCreds,
            Opt::WithDockerCerts,
            Opt::WithConfigHosts(vec![explicit]),
        ],
        &fx.paths,
    )
    .unwrap();

    let reg = client.host("reg.example.com").unwrap();
    assert_eq!(reg.user.as_deref(), Some("explicit-user"));
    assert_eq!(reg.pass.as_deref(), Some("explicit-pass"));
    assert_eq!(reg.tls(), TlsConf::Insecure);
    // Fields the explicit record leaves unset keep their discovered value.
    assert_eq!(reg.reg_cert.as_deref(), Some(CA_PEM));
    assert_eq!(client.log().level, LogLevel::Debug);
}

#[test]
fn test_malformed_docker_config_does_not_fail() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.json"), "{{{").unwrap();
    let paths = DockerPaths::new(Some(dir.path().join("config.json")), Vec::new());

    let client = RegClient::with_docker_paths(
        vec![
            Opt::WithDockerCreds,
            Opt::WithConfigHosts(vec![ConfigHost::new("reg.example.com")]),
        ],
        &paths,
    )
    .unwrap();
    assert_eq!(client.hosts().count(), 1);
}
